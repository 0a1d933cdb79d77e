//! Auth gateway: the single entry point for credential and token handling.
//!
//! Every protected operation goes through [`AuthGateway::authorize_operation`]
//! with an explicit, claims-derived [`IdentityContext`] (or `None` for an
//! anonymous caller). There is no ambient "current user".

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use taskgate_core::UserId;

use crate::authorize::{authorize_operation, AuthzError, Operation};
use crate::claims::{TokenError, TokenType};
use crate::identity::{Identity, IdentityView, ProfileUpdate};
use crate::password::{hash_password, verify_password, PasswordPolicy};
use crate::store::{CredentialStore, StoreError};
use crate::token::TokenIssuer;
use crate::validation::{
    too_long, validate_registration, FieldErrors, LoginRequest, RegisterRequest, EMAIL_TAKEN,
    NAME_MAX_CHARS,
};
use crate::{IdentityContext, Role};

pub const REGISTERED_MESSAGE: &str =
    "User Created Successfully. Please Verify using OTP sent to your Email";

/// Authentication failures (HTTP 401 / credential 400 equivalents).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthnError {
    #[error("Invalid operation. Please provide email and password")]
    MissingCredentials,

    #[error("User does not exist")]
    UserNotFound,

    #[error("Invalid Password")]
    InvalidPassword,

    #[error(transparent)]
    Token(#[from] TokenError),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Field-scoped input problems; surfaced as-is, never retried.
    #[error("validation failed: {0}")]
    Validation(FieldErrors),

    #[error(transparent)]
    Authentication(#[from] AuthnError),

    #[error(transparent)]
    Authorization(#[from] AuthzError),

    /// Target of an administrative action does not exist.
    #[error("identity not found")]
    NotFound,

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<StoreError> for AuthError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::DuplicateEmail => AuthError::Validation(FieldErrors::single("email", EMAIL_TAKEN)),
            StoreError::NotFound => AuthError::NotFound,
            StoreError::Backend(msg) => AuthError::Internal(msg),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegisterResponse {
    pub message: String,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoginResponse {
    pub access: String,
    pub refresh: String,
    pub role: Role,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RefreshResponse {
    pub access: String,
}

#[derive(Clone)]
pub struct AuthGateway {
    store: Arc<dyn CredentialStore>,
    issuer: TokenIssuer,
    policy: PasswordPolicy,
}

impl AuthGateway {
    pub fn new(store: Arc<dyn CredentialStore>, issuer: TokenIssuer) -> Self {
        Self::with_policy(store, issuer, PasswordPolicy::default())
    }

    pub fn with_policy(store: Arc<dyn CredentialStore>, issuer: TokenIssuer, policy: PasswordPolicy) -> Self {
        Self { store, issuer, policy }
    }

    pub fn issuer(&self) -> &TokenIssuer {
        &self.issuer
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Credentials
    // ─────────────────────────────────────────────────────────────────────────

    /// Register a new identity with the default role.
    pub async fn register(&self, req: RegisterRequest) -> Result<RegisterResponse, AuthError> {
        let valid = validate_registration(&req, &self.policy).map_err(AuthError::Validation)?;

        if self.store.find_by_email(&valid.email).await?.is_some() {
            return Err(AuthError::Validation(FieldErrors::single("email", EMAIL_TAKEN)));
        }

        let password = valid.password;
        let password_hash = tokio::task::spawn_blocking(move || hash_password(&password))
            .await
            .map_err(|e| AuthError::Internal(format!("hashing task failed: {e}")))?
            .map_err(|e| AuthError::Internal(e.to_string()))?;

        let identity = Identity::register(
            &valid.email,
            password_hash,
            valid.first_name,
            valid.last_name,
            Utc::now(),
        );
        let identity = self.store.create_identity(identity).await?;

        tracing::info!(user_id = %identity.id, role = %identity.role, "identity registered");

        Ok(RegisterResponse {
            message: REGISTERED_MESSAGE.to_string(),
            status: "success".to_string(),
        })
    }

    /// Exchange email + password for a token pair.
    ///
    /// Unknown email and wrong password are reported distinctly.
    pub async fn login(&self, req: LoginRequest) -> Result<LoginResponse, AuthError> {
        let email = req.email.as_deref().map(str::trim).filter(|e| !e.is_empty());
        let password = req.password.filter(|p| !p.is_empty());
        let (Some(email), Some(password)) = (email, password) else {
            return Err(AuthnError::MissingCredentials.into());
        };

        let Some(identity) = self.store.find_by_email(email).await? else {
            tracing::info!("login rejected: unknown email");
            return Err(AuthnError::UserNotFound.into());
        };

        let candidate = identity.clone();
        let matches = tokio::task::spawn_blocking(move || verify_password(&candidate, &password))
            .await
            .map_err(|e| AuthError::Internal(format!("verification task failed: {e}")))?;
        if !matches {
            tracing::info!(user_id = %identity.id, "login rejected: invalid password");
            return Err(AuthnError::InvalidPassword.into());
        }

        let pair = self
            .issuer
            .issue_token_pair(&identity, Utc::now())
            .map_err(|e| AuthError::Internal(e.to_string()))?;

        tracing::info!(user_id = %identity.id, role = %identity.role, "login succeeded");

        Ok(LoginResponse {
            access: pair.access,
            refresh: pair.refresh,
            role: identity.role,
        })
    }

    /// Mint a new access token from a refresh token.
    ///
    /// The identity is reloaded so role and active-flag changes made since the
    /// refresh token was issued are reflected in the new access token.
    pub async fn refresh(&self, refresh_token: &str) -> Result<RefreshResponse, AuthError> {
        let now = Utc::now();
        let claims = self
            .issuer
            .verify(refresh_token, TokenType::Refresh, now)
            .map_err(AuthnError::from)?;

        let Some(identity) = self.store.find_by_id(claims.sub).await? else {
            return Err(AuthnError::UserNotFound.into());
        };

        let access = self
            .issuer
            .issue_access_token(&identity, now)
            .map_err(|e| AuthError::Internal(e.to_string()))?;

        tracing::debug!(user_id = %identity.id, "access token refreshed");

        Ok(RefreshResponse { access })
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Request authentication / authorization
    // ─────────────────────────────────────────────────────────────────────────

    /// Resolve an access token into the acting identity. Store is not consulted.
    pub fn authenticate_request(&self, token: &str) -> Result<IdentityContext, AuthnError> {
        self.authenticate_request_at(token, Utc::now())
    }

    pub fn authenticate_request_at(&self, token: &str, now: DateTime<Utc>) -> Result<IdentityContext, AuthnError> {
        let claims = self.issuer.verify(token, TokenType::Access, now)?;
        Ok(IdentityContext::from_claims(&claims))
    }

    pub fn authorize_operation(
        &self,
        identity: Option<&IdentityContext>,
        operation: Operation,
    ) -> Result<(), AuthzError> {
        authorize_operation(identity, operation)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Profile
    // ─────────────────────────────────────────────────────────────────────────

    pub async fn profile(&self, ctx: Option<&IdentityContext>) -> Result<IdentityView, AuthError> {
        let ctx = self.require(ctx, Operation::ReadProfile)?;
        Ok(self.load(ctx.user_id).await?.view())
    }

    pub async fn update_profile(
        &self,
        ctx: Option<&IdentityContext>,
        update: ProfileUpdate,
    ) -> Result<IdentityView, AuthError> {
        let ctx = self.require(ctx, Operation::UpdateProfile)?;

        let mut errors = FieldErrors::new();
        for (field, value) in [("first_name", &update.first_name), ("last_name", &update.last_name)] {
            if value.as_deref().is_some_and(|v| v.chars().count() > NAME_MAX_CHARS) {
                errors.add(field, too_long(NAME_MAX_CHARS));
            }
        }
        errors.into_result().map_err(AuthError::Validation)?;

        let mut identity = self.load(ctx.user_id).await?;
        identity.apply_profile(update, Utc::now());
        let identity = self.store.update(identity).await?;
        Ok(identity.view())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Administrative actions
    // ─────────────────────────────────────────────────────────────────────────

    pub async fn list_identities(&self, ctx: Option<&IdentityContext>) -> Result<Vec<IdentityView>, AuthError> {
        self.require(ctx, Operation::ListUsers)?;
        Ok(self.store.list().await?.iter().map(Identity::view).collect())
    }

    /// The only path that changes a role after registration.
    pub async fn assign_role(
        &self,
        ctx: Option<&IdentityContext>,
        target: UserId,
        role: Role,
    ) -> Result<IdentityView, AuthError> {
        let actor = self.require(ctx, Operation::AssignRole)?;

        let mut identity = self.load(target).await?;
        let previous = identity.role;
        identity.assign_role(role, Utc::now());
        let identity = self.store.update(identity).await?;

        tracing::info!(
            actor = %actor.user_id,
            user_id = %identity.id,
            from = %previous,
            to = %identity.role,
            "role assigned"
        );
        Ok(identity.view())
    }

    pub async fn set_active(
        &self,
        ctx: Option<&IdentityContext>,
        target: UserId,
        active: bool,
    ) -> Result<IdentityView, AuthError> {
        let actor = self.require(ctx, Operation::SetActive)?;

        let mut identity = self.load(target).await?;
        identity.set_active(active, Utc::now());
        let identity = self.store.update(identity).await?;

        tracing::info!(actor = %actor.user_id, user_id = %identity.id, active, "active flag changed");
        Ok(identity.view())
    }

    /// Make sure an active ADMIN with this email exists.
    ///
    /// Used at startup from operator-supplied credentials. An existing identity
    /// is promoted and reactivated; its password is left as is.
    pub async fn ensure_admin(&self, email: &str, password: &str) -> Result<IdentityView, AuthError> {
        let now = Utc::now();

        if let Some(mut identity) = self.store.find_by_email(email).await? {
            if identity.role != Role::Admin || !identity.active {
                identity.assign_role(Role::Admin, now);
                identity.set_active(true, now);
                identity = self.store.update(identity).await?;
                tracing::info!(user_id = %identity.id, "bootstrap admin promoted");
            }
            return Ok(identity.view());
        }

        let req = RegisterRequest {
            email: Some(email.to_string()),
            password: Some(password.to_string()),
            password2: Some(password.to_string()),
            first_name: None,
            last_name: None,
        };
        let valid = validate_registration(&req, &self.policy).map_err(AuthError::Validation)?;

        let password = valid.password;
        let password_hash = tokio::task::spawn_blocking(move || hash_password(&password))
            .await
            .map_err(|e| AuthError::Internal(format!("hashing task failed: {e}")))?
            .map_err(|e| AuthError::Internal(e.to_string()))?;

        let mut identity = Identity::register(&valid.email, password_hash, None, None, now);
        identity.assign_role(Role::Admin, now);
        let identity = self.store.create_identity(identity).await?;

        tracing::info!(user_id = %identity.id, "bootstrap admin created");
        Ok(identity.view())
    }

    fn require<'a>(
        &self,
        ctx: Option<&'a IdentityContext>,
        operation: Operation,
    ) -> Result<&'a IdentityContext, AuthError> {
        authorize_operation(ctx, operation)?;
        ctx.ok_or(AuthError::Authorization(AuthzError::AuthenticationRequired))
    }

    async fn load(&self, id: UserId) -> Result<Identity, AuthError> {
        self.store.find_by_id(id).await?.ok_or(AuthError::NotFound)
    }
}
