use athena_common::error::AthenaError;
use athena_db::content::models::{NewsArticle, ResearchEvent};
use athena_db::table::TableRepository;
use axum::extract::{Path, State};
use axum::Json;

use crate::auth::authorize;
use crate::content::responses::{EventListResponse, NewsListResponse, NewsResponse};
use crate::error::ApiError;
use crate::extractors::Auth;
use crate::AppState;

/// Newest first.
pub async fn list_news(
    State(state): State<AppState>,
    Auth(ctx): Auth,
) -> Result<Json<NewsListResponse>, ApiError> {
    authorize(&state.policies.known_user, &ctx).await?;

    let mut data = state.news_repo.list(NewsArticle::PARTITION).await?;
    data.sort_by(|a, b| b.published_at.cmp(&a.published_at));
    let count = data.len();
    Ok(Json(NewsListResponse { data, count }))
}

pub async fn get_news(
    State(state): State<AppState>,
    Auth(ctx): Auth,
    Path(news_id): Path<String>,
) -> Result<Json<NewsResponse>, ApiError> {
    authorize(&state.policies.known_user, &ctx).await?;

    let data = state
        .news_repo
        .get(NewsArticle::PARTITION, &news_id)
        .await?
        .ok_or_else(|| AthenaError::NotFound(format!("news article {news_id}")))?;
    Ok(Json(NewsResponse { data }))
}

/// Soonest first.
pub async fn list_events(
    State(state): State<AppState>,
    Auth(ctx): Auth,
) -> Result<Json<EventListResponse>, ApiError> {
    authorize(&state.policies.known_user, &ctx).await?;

    let mut data = state.event_repo.list(ResearchEvent::PARTITION).await?;
    data.sort_by(|a, b| a.starts_at.cmp(&b.starts_at));
    let count = data.len();
    Ok(Json(EventListResponse { data, count }))
}
