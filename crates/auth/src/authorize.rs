use serde::Serialize;
use thiserror::Error;

use crate::{IdentityContext, Role};

/// Minimum standing an operation demands from its caller.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "role", rename_all = "snake_case")]
pub enum Requirement {
    /// Anyone, authenticated or not.
    Anonymous,
    /// An authenticated, active identity whose role ranks at least this high.
    AtLeast(Role),
}

/// Every protected operation exposed by the service.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum Operation {
    #[serde(rename = "task.list")]
    ListTasks,
    #[serde(rename = "task.read")]
    ReadTask,
    #[serde(rename = "task.create")]
    CreateTask,
    #[serde(rename = "task.update")]
    UpdateTask,
    #[serde(rename = "task.delete")]
    DeleteTask,
    #[serde(rename = "profile.read")]
    ReadProfile,
    #[serde(rename = "profile.update")]
    UpdateProfile,
    #[serde(rename = "user.list")]
    ListUsers,
    #[serde(rename = "user.assign_role")]
    AssignRole,
    #[serde(rename = "user.set_active")]
    SetActive,
}

impl Operation {
    pub const ALL: [Operation; 10] = [
        Operation::ListTasks,
        Operation::ReadTask,
        Operation::CreateTask,
        Operation::UpdateTask,
        Operation::DeleteTask,
        Operation::ReadProfile,
        Operation::UpdateProfile,
        Operation::ListUsers,
        Operation::AssignRole,
        Operation::SetActive,
    ];

    pub fn requirement(self) -> Requirement {
        match self {
            Operation::ListTasks | Operation::ReadTask => Requirement::Anonymous,
            Operation::CreateTask | Operation::ReadProfile | Operation::UpdateProfile => {
                Requirement::AtLeast(Role::User)
            }
            Operation::UpdateTask | Operation::DeleteTask => Requirement::AtLeast(Role::Manager),
            Operation::ListUsers | Operation::AssignRole | Operation::SetActive => {
                Requirement::AtLeast(Role::Admin)
            }
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Operation::ListTasks => "task.list",
            Operation::ReadTask => "task.read",
            Operation::CreateTask => "task.create",
            Operation::UpdateTask => "task.update",
            Operation::DeleteTask => "task.delete",
            Operation::ReadProfile => "profile.read",
            Operation::UpdateProfile => "profile.update",
            Operation::ListUsers => "user.list",
            Operation::AssignRole => "user.assign_role",
            Operation::SetActive => "user.set_active",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.as_str() == s)
    }
}

impl core::fmt::Display for Operation {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    /// No identity was presented for an operation that needs one.
    #[error("authentication required")]
    AuthenticationRequired,

    #[error("forbidden: account is inactive")]
    Inactive,

    #[error("forbidden: role {actual} is below required {required}")]
    InsufficientRole { required: Role, actual: Role },
}

impl AuthzError {
    /// `true` for failures that mean "not authenticated" rather than "forbidden".
    pub fn is_authentication(&self) -> bool {
        matches!(self, AuthzError::AuthenticationRequired)
    }
}

/// Role policy: decide whether a caller may proceed.
///
/// - No IO
/// - No panics
/// - No memoization; evaluated per request
///
/// Inactive identities are denied for everything except anonymous
/// operations. Admin gets no bypass beyond its rank.
pub fn authorize(
    acting_role: Option<Role>,
    is_active: bool,
    requirement: Requirement,
) -> Result<(), AuthzError> {
    let required = match requirement {
        Requirement::Anonymous => return Ok(()),
        Requirement::AtLeast(role) => role,
    };

    let Some(actual) = acting_role else {
        return Err(AuthzError::AuthenticationRequired);
    };

    if !is_active {
        return Err(AuthzError::Inactive);
    }

    if actual.outranks_or_equals(required) {
        Ok(())
    } else {
        Err(AuthzError::InsufficientRole { required, actual })
    }
}

/// Allow-list form of the policy: the caller's role must appear in `permitted`.
///
/// Nothing is implied by rank here; a set that should admit admins must
/// name `Role::Admin`.
pub fn authorize_any_of(role: Role, is_active: bool, permitted: &[Role]) -> Result<(), AuthzError> {
    if !is_active {
        return Err(AuthzError::Inactive);
    }
    if permitted.contains(&role) {
        return Ok(());
    }
    let required = permitted
        .iter()
        .copied()
        .min_by_key(|r| r.rank())
        .unwrap_or(Role::Admin);
    Err(AuthzError::InsufficientRole { required, actual: role })
}

/// Authorize an optional request identity for a declared operation.
pub fn authorize_operation(
    identity: Option<&IdentityContext>,
    operation: Operation,
) -> Result<(), AuthzError> {
    let result = authorize(
        identity.map(|i| i.role),
        identity.is_some_and(|i| i.active),
        operation.requirement(),
    );

    if let Err(e) = &result {
        tracing::debug!(
            operation = operation.as_str(),
            user_id = ?identity.map(|i| i.user_id),
            error = %e,
            "authorization denied"
        );
    }

    result
}

// ─────────────────────────────────────────────────────────────────────────────
// Authorization Explanation (Audit Trail)
// ─────────────────────────────────────────────────────────────────────────────

/// Detailed explanation of an authorization decision.
#[derive(Debug, Clone, Serialize)]
pub struct AuthorizationExplanation {
    pub operation: Operation,
    pub requirement: Requirement,
    pub granted: bool,
    /// Human-readable reason for the decision.
    pub reason: String,
    pub caller: CallerState,
    pub denial_reason: Option<DenialReason>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CallerState {
    pub authenticated: bool,
    pub role: Option<Role>,
    pub rank: Option<u8>,
    pub active: Option<bool>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DenialReason {
    pub kind: DenialKind,
    pub message: String,
    pub suggestions: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DenialKind {
    Unauthenticated,
    InactiveAccount,
    InsufficientRole,
}

/// Explain why `authorize_operation` would allow or deny this caller.
pub fn explain_authorization(
    identity: Option<&IdentityContext>,
    operation: Operation,
) -> AuthorizationExplanation {
    let requirement = operation.requirement();
    let caller = CallerState {
        authenticated: identity.is_some(),
        role: identity.map(|i| i.role),
        rank: identity.map(|i| i.role.rank()),
        active: identity.map(|i| i.active),
    };

    match authorize_operation(identity, operation) {
        Ok(()) => {
            let reason = match (requirement, identity) {
                (Requirement::Anonymous, _) => {
                    format!("Operation '{operation}' is open to anonymous callers")
                }
                (Requirement::AtLeast(min), Some(i)) => {
                    format!("Role {} meets the minimum role {} for '{operation}'", i.role, min)
                }
                (Requirement::AtLeast(min), None) => format!("Minimum role {min} satisfied"),
            };
            AuthorizationExplanation {
                operation,
                requirement,
                granted: true,
                reason,
                caller,
                denial_reason: None,
            }
        }
        Err(err) => {
            let denial = match &err {
                AuthzError::AuthenticationRequired => DenialReason {
                    kind: DenialKind::Unauthenticated,
                    message: "No bearer token was presented".to_string(),
                    suggestions: vec![
                        "Log in and send the access token as 'Authorization: Bearer <token>'"
                            .to_string(),
                    ],
                },
                AuthzError::Inactive => DenialReason {
                    kind: DenialKind::InactiveAccount,
                    message: "The account was inactive when this token was issued".to_string(),
                    suggestions: vec![
                        "Ask an administrator to reactivate the account".to_string(),
                        "Refresh the access token after reactivation".to_string(),
                    ],
                },
                AuthzError::InsufficientRole { required, actual } => DenialReason {
                    kind: DenialKind::InsufficientRole,
                    message: format!("Role {actual} is below the required role {required}"),
                    suggestions: vec![
                        format!("Ask an administrator to assign role {required} or higher"),
                        "Refresh the access token after a role change".to_string(),
                    ],
                },
            };
            AuthorizationExplanation {
                operation,
                requirement,
                granted: false,
                reason: err.to_string(),
                caller,
                denial_reason: Some(denial),
            }
        }
    }
}
