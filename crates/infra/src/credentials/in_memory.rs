use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use taskgate_auth::identity::email_key;
use taskgate_auth::{CredentialStore, Identity, StoreError};
use taskgate_core::UserId;

#[derive(Debug, Default)]
struct Tables {
    by_id: HashMap<UserId, Identity>,
    /// Lowercased email -> id; the uniqueness index.
    by_email: HashMap<String, UserId>,
}

/// In-memory credential store.
///
/// Intended for tests/dev. Both maps sit behind one lock, so the email
/// uniqueness check and the insert are a single atomic step.
#[derive(Debug, Default)]
pub struct InMemoryCredentialStore {
    inner: RwLock<Tables>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned() -> StoreError {
    StoreError::Backend("credential store lock poisoned".to_string())
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn create_identity(&self, identity: Identity) -> Result<Identity, StoreError> {
        let mut tables = self.inner.write().map_err(|_| poisoned())?;
        let key = identity.email_key();
        if tables.by_email.contains_key(&key) {
            return Err(StoreError::DuplicateEmail);
        }
        tables.by_email.insert(key, identity.id);
        tables.by_id.insert(identity.id, identity.clone());
        Ok(identity)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Identity>, StoreError> {
        let tables = self.inner.read().map_err(|_| poisoned())?;
        Ok(tables
            .by_email
            .get(&email_key(email))
            .and_then(|id| tables.by_id.get(id))
            .cloned())
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<Identity>, StoreError> {
        let tables = self.inner.read().map_err(|_| poisoned())?;
        Ok(tables.by_id.get(&id).cloned())
    }

    async fn update(&self, identity: Identity) -> Result<Identity, StoreError> {
        let mut tables = self.inner.write().map_err(|_| poisoned())?;
        let Some(current) = tables.by_id.get(&identity.id) else {
            return Err(StoreError::NotFound);
        };

        let old_key = current.email_key();
        let new_key = identity.email_key();
        if old_key != new_key {
            if tables.by_email.contains_key(&new_key) {
                return Err(StoreError::DuplicateEmail);
            }
            tables.by_email.remove(&old_key);
            tables.by_email.insert(new_key, identity.id);
        }

        tables.by_id.insert(identity.id, identity.clone());
        Ok(identity)
    }

    async fn list(&self) -> Result<Vec<Identity>, StoreError> {
        let tables = self.inner.read().map_err(|_| poisoned())?;
        let mut all: Vec<Identity> = tables.by_id.values().cloned().collect();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));
        Ok(all)
    }
}
