use athena_common::error::AthenaError;
use athena_db::content::models::ResearchProposal;
use athena_db::table::TableRepository;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use uuid::Uuid;

use crate::auth::context::{AuthorizationContext, PROPOSAL_ID_ROUTE_KEY, TEAM_ID_ROUTE_KEY};
use crate::auth::authorize;
use crate::error::ApiError;
use crate::extractors::Auth;
use crate::proposals::requests::{CreateProposalRequest, UpdateProposalRequest};
use crate::proposals::responses::{ProposalListResponse, ProposalResponse};
use crate::AppState;

fn require_non_empty(field: &str, value: &str) -> Result<(), AthenaError> {
    if value.trim().is_empty() {
        return Err(AthenaError::Validation(format!("{field} must not be empty")));
    }
    Ok(())
}

fn route_id(ctx: &AuthorizationContext, key: &str) -> Result<Uuid, AthenaError> {
    ctx.route_guid(key)
        .ok_or_else(|| AthenaError::Validation(format!("{key} must be a GUID")))
}

fn caller(ctx: &AuthorizationContext) -> Result<Uuid, AthenaError> {
    ctx.caller_id()
        .ok_or_else(|| AthenaError::Forbidden("caller object id missing".to_string()))
}

async fn load(state: &AppState, id: Uuid) -> Result<ResearchProposal, AthenaError> {
    state
        .proposal_repo
        .get(ResearchProposal::PARTITION, &id.to_string())
        .await?
        .ok_or_else(|| AthenaError::NotFound(format!("research proposal {id}")))
}

/// A row that vanished after the policy check is reported as missing.
async fn remove(state: &AppState, id: Uuid) -> Result<(), AthenaError> {
    let deleted = state
        .proposal_repo
        .delete(ResearchProposal::PARTITION, &id.to_string())
        .await?;
    if !deleted {
        return Err(AthenaError::NotFound(format!("research proposal {id}")));
    }
    Ok(())
}

pub async fn get_proposal(
    State(state): State<AppState>,
    Auth(ctx): Auth,
) -> Result<Json<ProposalResponse>, ApiError> {
    authorize(&state.policies.known_user, &ctx).await?;

    let id = route_id(&ctx, PROPOSAL_ID_ROUTE_KEY)?;
    let data = load(&state, id).await?;
    Ok(Json(ProposalResponse { data }))
}

/// Proposal numbers are unique by convention only; duplicates answer 409.
pub async fn get_proposal_by_number(
    State(state): State<AppState>,
    Auth(ctx): Auth,
    Path(number): Path<String>,
) -> Result<Json<ProposalResponse>, ApiError> {
    authorize(&state.policies.known_user, &ctx).await?;

    let data = state
        .proposal_repo
        .find_single_by(ResearchProposal::PARTITION, "proposalNumber", &number)
        .await?
        .ok_or_else(|| AthenaError::NotFound(format!("research proposal number {number}")))?;
    Ok(Json(ProposalResponse { data }))
}

pub async fn update_proposal(
    State(state): State<AppState>,
    Auth(ctx): Auth,
    Json(body): Json<UpdateProposalRequest>,
) -> Result<Json<ProposalResponse>, ApiError> {
    authorize(&state.policies.resource_owner, &ctx).await?;
    require_non_empty("title", &body.title)?;
    require_non_empty("description", &body.description)?;

    let id = route_id(&ctx, PROPOSAL_ID_ROUTE_KEY)?;
    let mut proposal = load(&state, id).await?;
    proposal.title = body.title.trim().to_string();
    proposal.description = body.description;
    proposal.updated_at = Utc::now();

    let data = state.proposal_repo.upsert(proposal).await?;
    Ok(Json(ProposalResponse { data }))
}

pub async fn delete_proposal(
    State(state): State<AppState>,
    Auth(ctx): Auth,
) -> Result<StatusCode, ApiError> {
    authorize(&state.policies.resource_owner, &ctx).await?;

    let id = route_id(&ctx, PROPOSAL_ID_ROUTE_KEY)?;
    remove(&state, id).await?;
    tracing::info!(proposal_id = %id, "research proposal deleted by owner");
    Ok(StatusCode::NO_CONTENT)
}

/// Newest first.
pub async fn list_team_proposals(
    State(state): State<AppState>,
    Auth(ctx): Auth,
) -> Result<Json<ProposalListResponse>, ApiError> {
    authorize(&state.policies.team_member, &ctx).await?;

    let team_id = route_id(&ctx, TEAM_ID_ROUTE_KEY)?;
    let mut data = state
        .proposal_repo
        .find_by(ResearchProposal::PARTITION, "teamId", &team_id.to_string())
        .await?;
    data.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    let count = data.len();
    Ok(Json(ProposalListResponse { data, count }))
}

pub async fn create_team_proposal(
    State(state): State<AppState>,
    Auth(ctx): Auth,
    Json(body): Json<CreateProposalRequest>,
) -> Result<(StatusCode, Json<ProposalResponse>), ApiError> {
    authorize(&state.policies.team_member, &ctx).await?;
    require_non_empty("proposalNumber", &body.proposal_number)?;
    require_non_empty("title", &body.title)?;
    require_non_empty("description", &body.description)?;

    let team_id = route_id(&ctx, TEAM_ID_ROUTE_KEY)?;
    let now = Utc::now();
    let proposal = ResearchProposal {
        id: Uuid::new_v4(),
        proposal_number: body.proposal_number.trim().to_string(),
        team_id,
        title: body.title.trim().to_string(),
        description: body.description,
        created_by_object_id: caller(&ctx)?,
        created_at: now,
        updated_at: now,
    };

    let data = state.proposal_repo.insert(proposal).await?;
    tracing::info!(proposal_id = %data.id, %team_id, "research proposal created");
    Ok((StatusCode::CREATED, Json(ProposalResponse { data })))
}

pub async fn delete_team_proposal(
    State(state): State<AppState>,
    Auth(ctx): Auth,
) -> Result<StatusCode, ApiError> {
    authorize(&state.policies.team_owner, &ctx).await?;

    let team_id = route_id(&ctx, TEAM_ID_ROUTE_KEY)?;
    let id = route_id(&ctx, PROPOSAL_ID_ROUTE_KEY)?;
    let proposal = load(&state, id).await?;
    if proposal.team_id != team_id {
        return Err(AthenaError::NotFound(format!(
            "research proposal {id} in team {team_id}"
        ))
        .into());
    }

    remove(&state, id).await?;
    tracing::info!(proposal_id = %id, %team_id, "research proposal deleted by team owner");
    Ok(StatusCode::NO_CONTENT)
}
