use std::time::Duration;

use async_trait::async_trait;
use athena_common::error::{AthenaError, AthenaResult};
use athena_config::get_var_or;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use uuid::Uuid;

/// Team membership lookups used by the team policies.
#[async_trait]
pub trait TeamDirectory: Send + Sync {
    async fn is_member(&self, team_id: Uuid, user_id: Uuid) -> AthenaResult<bool>;
    async fn is_owner(&self, team_id: Uuid, user_id: Uuid) -> AthenaResult<bool>;
}

/// Used when Graph is not configured: nobody belongs to any team.
pub struct NoTeamDirectory;

#[async_trait]
impl TeamDirectory for NoTeamDirectory {
    async fn is_member(&self, _team_id: Uuid, _user_id: Uuid) -> AthenaResult<bool> {
        Ok(false)
    }

    async fn is_owner(&self, _team_id: Uuid, _user_id: Uuid) -> AthenaResult<bool> {
        Ok(false)
    }
}

#[derive(Debug, Clone)]
pub struct GraphClientConfig {
    pub base_url: String,
    pub access_token: String,
    pub timeout_secs: u64,
}

const DEFAULT_TIMEOUT_SECS: u64 = 30;

impl GraphClientConfig {
    /// Returns `Ok(None)` when `GRAPH_ACCESS_TOKEN` is not set.
    pub fn from_env() -> AthenaResult<Option<Self>> {
        let Ok(access_token) = std::env::var("GRAPH_ACCESS_TOKEN") else {
            return Ok(None);
        };
        let timeout_secs = parse_timeout(std::env::var("GRAPH_TIMEOUT_SECS").ok().as_deref())?;

        Ok(Some(Self {
            base_url: get_var_or("GRAPH_BASE_URL", "https://graph.microsoft.com/v1.0"),
            access_token,
            timeout_secs,
        }))
    }
}

fn parse_timeout(raw: Option<&str>) -> AthenaResult<u64> {
    match raw {
        None => Ok(DEFAULT_TIMEOUT_SECS),
        Some(value) => match value.trim().parse::<u64>() {
            Ok(secs) if secs > 0 => Ok(secs),
            Ok(_) => Err(AthenaError::Config(
                "invalid GRAPH_TIMEOUT_SECS: must be positive".to_string(),
            )),
            Err(e) => Err(AthenaError::Config(format!("invalid GRAPH_TIMEOUT_SECS: {e}"))),
        },
    }
}

#[derive(Debug, thiserror::Error)]
pub enum GraphClientError {
    #[error("HTTP {status}: {body}")]
    HttpError { status: StatusCode, body: String },

    #[error("request failed: {0}")]
    RequestError(#[from] reqwest::Error),
}

impl From<GraphClientError> for AthenaError {
    fn from(err: GraphClientError) -> Self {
        AthenaError::Upstream(format!("graph: {err}"))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamMember {
    pub user_id: Option<String>,
    #[serde(default)]
    pub roles: Vec<String>,
}

impl TeamMember {
    fn is_user(&self, user_id: Uuid) -> bool {
        self.user_id
            .as_deref()
            .and_then(|id| Uuid::parse_str(id).ok())
            .is_some_and(|id| id == user_id)
    }

    fn is_owner(&self) -> bool {
        self.roles.iter().any(|r| r.eq_ignore_ascii_case("owner"))
    }
}

#[derive(Debug, Deserialize)]
struct MembersPage {
    #[serde(default)]
    value: Vec<TeamMember>,
    #[serde(rename = "@odata.nextLink")]
    next_link: Option<String>,
}

/// [`TeamDirectory`] backed by the Microsoft Graph `teams/{id}/members` endpoint.
/// Lookup failures are returned as-is; there is no retry.
#[derive(Clone)]
pub struct GraphTeamDirectory {
    client: Client,
    config: GraphClientConfig,
}

impl GraphTeamDirectory {
    pub fn new(config: GraphClientConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { client, config })
    }

    /// All members of a team, following `@odata.nextLink` pages.
    pub async fn members(&self, team_id: Uuid) -> Result<Vec<TeamMember>, GraphClientError> {
        let mut url = format!(
            "{}/teams/{team_id}/members",
            self.config.base_url.trim_end_matches('/')
        );
        let mut members = Vec::new();

        loop {
            let resp = self
                .client
                .get(&url)
                .bearer_auth(&self.config.access_token)
                .send()
                .await?;

            let status = resp.status();
            if !status.is_success() {
                let body = resp.text().await.unwrap_or_default();
                return Err(GraphClientError::HttpError { status, body });
            }

            let page: MembersPage = resp.json().await?;
            members.extend(page.value);

            match page.next_link {
                Some(next) => url = next,
                None => break,
            }
        }

        tracing::debug!(%team_id, count = members.len(), "fetched team members");
        Ok(members)
    }
}

#[async_trait]
impl TeamDirectory for GraphTeamDirectory {
    async fn is_member(&self, team_id: Uuid, user_id: Uuid) -> AthenaResult<bool> {
        let members = self.members(team_id).await?;
        Ok(members.iter().any(|m| m.is_user(user_id)))
    }

    async fn is_owner(&self, team_id: Uuid, user_id: Uuid) -> AthenaResult<bool> {
        let members = self.members(team_id).await?;
        Ok(members.iter().any(|m| m.is_user(user_id) && m.is_owner()))
    }
}
