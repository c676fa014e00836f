pub mod handlers;
pub mod responses;

use axum::routing::get;
use axum::Router;

use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/news", get(handlers::list_news))
        .route("/news/{newsId}", get(handlers::get_news))
        .route("/events", get(handlers::list_events))
}
