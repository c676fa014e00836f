//! Request authorization for the Teams tab.
//!
//! Each policy inspects an [`AuthorizationContext`] and answers with an
//! [`AuthorizationOutcome`]. Only `Succeeded` lets a request through; a policy
//! that cannot find what it needs in the route leaves the decision unmade,
//! which denies by default.

pub mod context;
pub mod directory;
pub mod policies;
#[cfg(test)]
pub mod testing;

pub use context::{AuthorizationContext, AuthorizationOutcome};
pub use directory::TeamDirectory;
pub use policies::{authorize, AuthorizationHandler, Policies};
