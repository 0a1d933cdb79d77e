//! Credential store port.
//!
//! Implementations live in `taskgate-infra` (in-memory and Postgres). Each is
//! expected to enforce the case-insensitive email uniqueness atomically.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use taskgate_core::UserId;

use crate::Identity;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("email is already registered")]
    DuplicateEmail,

    #[error("identity not found")]
    NotFound,

    #[error("store backend failure: {0}")]
    Backend(String),
}

#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Persist a new identity. Fails with `DuplicateEmail` on a case-insensitive clash.
    async fn create_identity(&self, identity: Identity) -> Result<Identity, StoreError>;

    /// Case-insensitive exact email lookup.
    async fn find_by_email(&self, email: &str) -> Result<Option<Identity>, StoreError>;

    async fn find_by_id(&self, id: UserId) -> Result<Option<Identity>, StoreError>;

    /// Replace a stored identity (matched by id).
    async fn update(&self, identity: Identity) -> Result<Identity, StoreError>;

    /// All identities, newest first.
    async fn list(&self) -> Result<Vec<Identity>, StoreError>;
}

#[async_trait]
impl<S> CredentialStore for Arc<S>
where
    S: CredentialStore + ?Sized,
{
    async fn create_identity(&self, identity: Identity) -> Result<Identity, StoreError> {
        (**self).create_identity(identity).await
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Identity>, StoreError> {
        (**self).find_by_email(email).await
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<Identity>, StoreError> {
        (**self).find_by_id(id).await
    }

    async fn update(&self, identity: Identity) -> Result<Identity, StoreError> {
        (**self).update(identity).await
    }

    async fn list(&self) -> Result<Vec<Identity>, StoreError> {
        (**self).list().await
    }
}
