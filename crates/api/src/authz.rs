//! Route-level authorization guard.
//!
//! Handlers call [`require`] with their declared [`Operation`] before doing
//! any work; the decision itself lives in `taskgate-auth`.

use axum::response::Response;

use taskgate_auth::{IdentityContext, Operation};

use crate::app::errors;
use crate::context::CallerContext;

/// Authorize the caller for `operation`.
///
/// Returns the acting identity (if any) or a ready 401/403 response.
pub fn require(caller: &CallerContext, operation: Operation) -> Result<Option<&IdentityContext>, Response> {
    let identity = caller.identity();
    taskgate_auth::authorize_operation(identity, operation).map_err(errors::authz_error_to_response)?;
    Ok(identity)
}
