//! `taskgate-auth`: credentials, tokens and the role policy.
//!
//! This crate is decoupled from HTTP. Storage is reached through the
//! [`CredentialStore`] port; implementations live in `taskgate-infra`.

pub mod authorize;
pub mod claims;
pub mod gateway;
pub mod identity;
pub mod password;
pub mod principal;
pub mod roles;
pub mod store;
pub mod token;
pub mod validation;

pub use authorize::{
    authorize, authorize_any_of, authorize_operation, explain_authorization, AuthorizationExplanation, AuthzError,
    Operation, Requirement,
};
pub use claims::{validate_claims, TokenClaims, TokenError, TokenType, TokenValidationError};
pub use gateway::{AuthError, AuthGateway, AuthnError, LoginResponse, RefreshResponse, RegisterResponse};
pub use identity::{Identity, IdentityView, ProfileUpdate};
pub use password::{hash_password, verify_password, PasswordError, PasswordPolicy};
pub use principal::IdentityContext;
pub use roles::{Role, UnknownRole};
pub use store::{CredentialStore, StoreError};
pub use token::{TokenIssuer, TokenPair};
pub use validation::{FieldErrors, LoginRequest, RegisterRequest};
