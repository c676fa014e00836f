use std::collections::HashMap;

use uuid::Uuid;

/// Header carrying the caller's Azure AD object id.
pub const CALLER_OBJECT_ID_HEADER: &str = "X-User-Object-Id";

pub const TEAM_ID_ROUTE_KEY: &str = "teamId";
pub const PROPOSAL_ID_ROUTE_KEY: &str = "proposalId";

#[derive(Debug, Clone, Default)]
pub struct AuthorizationContext {
    caller_object_id: Option<String>,
    route_values: HashMap<String, String>,
}

impl AuthorizationContext {
    pub fn new(caller_object_id: Option<String>, route_values: HashMap<String, String>) -> Self {
        Self {
            caller_object_id,
            route_values,
        }
    }

    /// The caller's object id, if present and a valid GUID.
    pub fn caller_id(&self) -> Option<Uuid> {
        self.caller_object_id
            .as_deref()
            .and_then(|raw| Uuid::parse_str(raw.trim()).ok())
    }

    pub fn route_value(&self, key: &str) -> Option<&str> {
        self.route_values.get(key).map(String::as_str)
    }

    /// A route value parsed as a GUID. Missing or malformed values are `None`.
    pub fn route_guid(&self, key: &str) -> Option<Uuid> {
        self.route_value(key)
            .and_then(|raw| Uuid::parse_str(raw).ok())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthorizationOutcome {
    Succeeded,
    /// Explicit denial; no other outcome can override it.
    Failed,
    /// The policy had nothing to say; the request is denied unless something else allows it.
    NotHandled,
}

impl AuthorizationOutcome {
    pub fn is_allowed(self) -> bool {
        matches!(self, AuthorizationOutcome::Succeeded)
    }
}
