use serde::{Deserialize, Serialize};

use taskgate_auth::{IdentityContext, Role};
use taskgate_core::UserId;

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    #[serde(default)]
    pub refresh: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AssignRoleRequest {
    pub role: String,
}

#[derive(Debug, Deserialize)]
pub struct SetActiveRequest {
    pub active: bool,
}

/// Raw list parameters; parsed by `TaskQuery::from_params`.
#[derive(Debug, Default, Deserialize)]
pub struct ListTasksParams {
    pub completed: Option<String>,
    pub search: Option<String>,
    pub cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ExplainQuery {
    pub operation: String,
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
pub struct WhoAmIResponse {
    pub user_id: UserId,
    pub email: String,
    pub role: Role,
    pub rank: u8,
    pub active: bool,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

impl From<&IdentityContext> for WhoAmIResponse {
    fn from(ctx: &IdentityContext) -> Self {
        Self {
            user_id: ctx.user_id,
            email: ctx.email.clone(),
            role: ctx.role,
            rank: ctx.role.rank(),
            active: ctx.active,
            first_name: ctx.first_name.clone(),
            last_name: ctx.last_name.clone(),
        }
    }
}
