pub mod admin;
pub mod public;

use axum::Router;

use crate::db::AppState;

/// Build the full application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .merge(public::router())
        .nest("/admin", admin::router(state.clone()))
        .with_state(state)
}
