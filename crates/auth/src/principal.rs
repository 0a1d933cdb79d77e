use serde::{Deserialize, Serialize};

use taskgate_core::UserId;

use crate::{Role, TokenClaims};

/// Acting identity for a single request.
///
/// Built from verified token claims only; the credential store is not
/// consulted, so `role` and `active` may lag behind the stored record until
/// the access token is re-minted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityContext {
    pub user_id: UserId,
    pub email: String,
    pub role: Role,
    pub active: bool,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

impl IdentityContext {
    pub fn from_claims(claims: &TokenClaims) -> Self {
        Self {
            user_id: claims.sub,
            email: claims.email.clone(),
            role: claims.role,
            active: claims.active,
            first_name: claims.first_name.clone(),
            last_name: claims.last_name.clone(),
        }
    }
}
