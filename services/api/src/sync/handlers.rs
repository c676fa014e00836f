use athena_common::error::AthenaError;
use athena_db::audit::recorder::recent_runs;
use athena_db::sync::repositories::SyncJobRecordRepository;
use axum::extract::{Path, Query, State};
use axum::Json;

use crate::auth::authorize;
use crate::error::ApiError;
use crate::extractors::Auth;
use crate::sync::responses::{RunsQuery, SyncJobResponse, SyncRunsResponse};
use crate::AppState;

const DEFAULT_RUNS_LIMIT: usize = 20;
const MAX_RUNS_LIMIT: usize = 200;

pub async fn get_job(
    State(state): State<AppState>,
    Auth(ctx): Auth,
    Path(job_name): Path<String>,
) -> Result<Json<SyncJobResponse>, ApiError> {
    authorize(&state.policies.known_user, &ctx).await?;

    let data = state
        .sync_repo
        .get_record(&job_name)
        .await?
        .ok_or_else(|| AthenaError::NotFound(format!("sync job {job_name} has never run")))?;
    Ok(Json(SyncJobResponse { data }))
}

pub async fn list_runs(
    State(state): State<AppState>,
    Auth(ctx): Auth,
    Path(job_name): Path<String>,
    Query(query): Query<RunsQuery>,
) -> Result<Json<SyncRunsResponse>, ApiError> {
    authorize(&state.policies.known_user, &ctx).await?;

    let limit = query.limit.unwrap_or(DEFAULT_RUNS_LIMIT);
    if !(1..=MAX_RUNS_LIMIT).contains(&limit) {
        return Err(AthenaError::Validation(format!(
            "limit must be between 1 and {MAX_RUNS_LIMIT}"
        ))
        .into());
    }

    let data = recent_runs(state.audit_repo.as_ref(), &job_name, limit).await?;
    let count = data.len();
    Ok(Json(SyncRunsResponse { data, count }))
}
