use async_trait::async_trait;
use athena_common::error::{AthenaError, AthenaResult};
use uuid::Uuid;

use crate::auth::TeamDirectory;

/// Fixed team rosters for tests; `failing` answers every lookup with `Upstream`.
pub struct StaticTeamDirectory {
    members: Vec<(Uuid, Uuid)>,
    owners: Vec<(Uuid, Uuid)>,
    fail: bool,
}

impl StaticTeamDirectory {
    /// `member` and `owner` both belong to `team`; only `owner` owns it.
    pub fn new(team: Uuid, member: Uuid, owner: Uuid) -> Self {
        Self {
            members: vec![(team, member), (team, owner)],
            owners: vec![(team, owner)],
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            members: Vec::new(),
            owners: Vec::new(),
            fail: true,
        }
    }

    fn check(&self) -> AthenaResult<()> {
        if self.fail {
            return Err(AthenaError::Upstream("graph unavailable".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl TeamDirectory for StaticTeamDirectory {
    async fn is_member(&self, team_id: Uuid, user_id: Uuid) -> AthenaResult<bool> {
        self.check()?;
        Ok(self.members.contains(&(team_id, user_id)))
    }

    async fn is_owner(&self, team_id: Uuid, user_id: Uuid) -> AthenaResult<bool> {
        self.check()?;
        Ok(self.owners.contains(&(team_id, user_id)))
    }
}
