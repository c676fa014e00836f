pub mod handlers;
pub mod responses;

use axum::routing::get;
use axum::Router;

use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/sync/jobs/{jobName}", get(handlers::get_job))
        .route("/sync/jobs/{jobName}/runs", get(handlers::list_runs))
}
