mod schema;
pub mod from_row;
pub mod queries;

pub use schema::{init_audit_db, init_db};

use std::sync::Arc;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;

use crate::keycodec::KeyCodec;

pub type DbPool = Pool<SqliteConnectionManager>;

/// Application state holding database pools, the signing service, and
/// configuration consumed by handlers.
#[derive(Clone)]
pub struct AppState {
    /// Main database pool (customers, licenses, activations, releases)
    pub db: DbPool,
    /// Audit log database pool (separate file to isolate growth)
    pub audit: DbPool,
    /// License key signing/verification service, created once at startup
    pub codec: Arc<KeyCodec>,
    pub base_url: String,
    pub release_dir: String,
    pub admin_api_key: Option<String>,
    pub expiry_warning_days: i64,
    pub audit_log_enabled: bool,
}

pub fn create_pool(database_path: &str) -> Result<DbPool, r2d2::Error> {
    let manager = SqliteConnectionManager::file(database_path).with_init(|conn| {
        conn.busy_timeout(std::time::Duration::from_secs(5))?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")
    });
    Pool::builder().max_size(10).build(manager)
}
