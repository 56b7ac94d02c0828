use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_path: String,
    pub audit_database_path: String,
    /// Path to the Ed25519 signing key file (generated on first start)
    pub signing_key_path: String,
    /// Directory holding release artifacts served by the download endpoint
    pub release_dir: String,
    pub base_url: String,
    /// Bearer key guarding the /admin routes (unset = admin API disabled)
    pub admin_api_key: Option<String>,
    /// Days before expiry at which phone-home responses carry a warning
    pub expiry_warning_days: i64,
    pub audit_log_enabled: bool,
    pub dev_mode: bool,
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let dev_mode = env::var("RATCHET_ENV")
            .map(|v| v == "dev" || v == "development")
            .unwrap_or(false);

        let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port: u16 = env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(3000);

        let base_url =
            env::var("BASE_URL").unwrap_or_else(|_| format!("http://{}:{}", host, port));

        Self {
            host,
            port,
            database_path: env::var("DATABASE_PATH")
                .unwrap_or_else(|_| "ratchet.db".to_string()),
            audit_database_path: env::var("AUDIT_DATABASE_PATH")
                .unwrap_or_else(|_| "ratchet_audit.db".to_string()),
            signing_key_path: env::var("SIGNING_KEY_PATH")
                .unwrap_or_else(|_| "ratchet_signing.key".to_string()),
            release_dir: env::var("RELEASE_DIR").unwrap_or_else(|_| "releases".to_string()),
            base_url,
            admin_api_key: env::var("ADMIN_API_KEY").ok(),
            expiry_warning_days: env::var("EXPIRY_WARNING_DAYS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(14),
            audit_log_enabled: env::var("AUDIT_LOG_ENABLED")
                .map(|v| v != "false" && v != "0")
                .unwrap_or(true),
            dev_mode,
        }
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
