pub mod handlers;
pub mod requests;
pub mod responses;

use axum::routing::get;
use axum::Router;

use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/research-proposals/by-number/{number}",
            get(handlers::get_proposal_by_number),
        )
        .route(
            "/research-proposals/{proposalId}",
            get(handlers::get_proposal)
                .put(handlers::update_proposal)
                .delete(handlers::delete_proposal),
        )
        .route(
            "/teams/{teamId}/research-proposals",
            get(handlers::list_team_proposals).post(handlers::create_team_proposal),
        )
        .route(
            "/teams/{teamId}/research-proposals/{proposalId}",
            axum::routing::delete(handlers::delete_team_proposal),
        )
}
