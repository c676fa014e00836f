use std::sync::Arc;

use async_trait::async_trait;
use athena_common::error::{AthenaError, AthenaResult};
use athena_db::content::models::ResearchProposal;
use athena_db::table::TableRepository;

use crate::auth::context::{
    AuthorizationContext, AuthorizationOutcome, PROPOSAL_ID_ROUTE_KEY, TEAM_ID_ROUTE_KEY,
};
use crate::auth::directory::TeamDirectory;

#[async_trait]
pub trait AuthorizationHandler: Send + Sync {
    fn policy(&self) -> &'static str;

    /// Upstream lookup failures are returned as errors, not as denials.
    async fn handle(&self, ctx: &AuthorizationContext) -> AthenaResult<AuthorizationOutcome>;
}

/// Run one policy and turn anything but `Succeeded` into `Forbidden`.
pub async fn authorize<H>(handler: &H, ctx: &AuthorizationContext) -> AthenaResult<()>
where
    H: AuthorizationHandler + ?Sized,
{
    let outcome = handler.handle(ctx).await?;
    if outcome.is_allowed() {
        Ok(())
    } else {
        tracing::debug!(policy = handler.policy(), ?outcome, "authorization denied");
        Err(AthenaError::Forbidden(format!(
            "{} requirement not satisfied",
            handler.policy()
        )))
    }
}

/// The caller must present a valid object id.
pub struct MustBeKnownUser;

#[async_trait]
impl AuthorizationHandler for MustBeKnownUser {
    fn policy(&self) -> &'static str {
        "MustBeKnownUser"
    }

    async fn handle(&self, ctx: &AuthorizationContext) -> AthenaResult<AuthorizationOutcome> {
        Ok(match ctx.caller_id() {
            Some(_) => AuthorizationOutcome::Succeeded,
            None => AuthorizationOutcome::Failed,
        })
    }
}

/// The caller must have created the research proposal named by the `proposalId` route value.
pub struct MustBeResourceOwner {
    proposals: Arc<dyn TableRepository<ResearchProposal>>,
}

impl MustBeResourceOwner {
    pub fn new(proposals: Arc<dyn TableRepository<ResearchProposal>>) -> Self {
        Self { proposals }
    }
}

#[async_trait]
impl AuthorizationHandler for MustBeResourceOwner {
    fn policy(&self) -> &'static str {
        "MustBeResourceOwner"
    }

    async fn handle(&self, ctx: &AuthorizationContext) -> AthenaResult<AuthorizationOutcome> {
        let (Some(proposal_id), Some(caller)) =
            (ctx.route_guid(PROPOSAL_ID_ROUTE_KEY), ctx.caller_id())
        else {
            return Ok(AuthorizationOutcome::NotHandled);
        };

        let proposal = self
            .proposals
            .get(ResearchProposal::PARTITION, &proposal_id.to_string())
            .await?;

        Ok(match proposal {
            Some(p) if p.created_by_object_id == caller => AuthorizationOutcome::Succeeded,
            _ => AuthorizationOutcome::NotHandled,
        })
    }
}

/// The caller must belong to the team named by the `teamId` route value.
pub struct MustBeTeamMember {
    directory: Arc<dyn TeamDirectory>,
}

impl MustBeTeamMember {
    pub fn new(directory: Arc<dyn TeamDirectory>) -> Self {
        Self { directory }
    }
}

#[async_trait]
impl AuthorizationHandler for MustBeTeamMember {
    fn policy(&self) -> &'static str {
        "MustBeTeamMember"
    }

    async fn handle(&self, ctx: &AuthorizationContext) -> AthenaResult<AuthorizationOutcome> {
        let (Some(team_id), Some(caller)) = (ctx.route_guid(TEAM_ID_ROUTE_KEY), ctx.caller_id())
        else {
            return Ok(AuthorizationOutcome::NotHandled);
        };

        Ok(if self.directory.is_member(team_id, caller).await? {
            AuthorizationOutcome::Succeeded
        } else {
            AuthorizationOutcome::NotHandled
        })
    }
}

/// The caller must own the team named by the `teamId` route value.
pub struct MustBeTeamOwner {
    directory: Arc<dyn TeamDirectory>,
}

impl MustBeTeamOwner {
    pub fn new(directory: Arc<dyn TeamDirectory>) -> Self {
        Self { directory }
    }
}

#[async_trait]
impl AuthorizationHandler for MustBeTeamOwner {
    fn policy(&self) -> &'static str {
        "MustBeTeamOwner"
    }

    async fn handle(&self, ctx: &AuthorizationContext) -> AthenaResult<AuthorizationOutcome> {
        let (Some(team_id), Some(caller)) = (ctx.route_guid(TEAM_ID_ROUTE_KEY), ctx.caller_id())
        else {
            return Ok(AuthorizationOutcome::NotHandled);
        };

        Ok(if self.directory.is_owner(team_id, caller).await? {
            AuthorizationOutcome::Succeeded
        } else {
            AuthorizationOutcome::NotHandled
        })
    }
}

/// Every policy the API enforces.
pub struct Policies {
    pub known_user: MustBeKnownUser,
    pub resource_owner: MustBeResourceOwner,
    pub team_member: MustBeTeamMember,
    pub team_owner: MustBeTeamOwner,
}

impl Policies {
    pub fn new(
        proposals: Arc<dyn TableRepository<ResearchProposal>>,
        directory: Arc<dyn TeamDirectory>,
    ) -> Self {
        Self {
            known_user: MustBeKnownUser,
            resource_owner: MustBeResourceOwner::new(proposals),
            team_member: MustBeTeamMember::new(Arc::clone(&directory)),
            team_owner: MustBeTeamOwner::new(directory),
        }
    }
}
