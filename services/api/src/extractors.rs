use std::collections::HashMap;
use std::convert::Infallible;

use axum::extract::{FromRequestParts, RawPathParams};
use axum::http::request::Parts;

use crate::auth::context::{AuthorizationContext, CALLER_OBJECT_ID_HEADER};

/// Caller identity plus route values, ready for policy checks.
///
/// Never rejects: a missing header or unmatched path simply yields an empty
/// context and the policies decide.
pub struct Auth(pub AuthorizationContext);

impl<S: Send + Sync> FromRequestParts<S> for Auth {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let caller = parts
            .headers
            .get(CALLER_OBJECT_ID_HEADER)
            .map(|value| String::from_utf8_lossy(value.as_bytes()).into_owned());

        let route_values: HashMap<String, String> =
            match RawPathParams::from_request_parts(parts, state).await {
                Ok(params) => params
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
                Err(_) => HashMap::new(),
            };

        Ok(Auth(AuthorizationContext::new(caller, route_values)))
    }
}
