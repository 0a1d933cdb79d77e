//! Identity records held by the credential store.
//!
//! An identity is created at registration with role `USER`, mutated by profile
//! updates and explicit administrative actions, and never hard-deleted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use taskgate_core::UserId;

use crate::Role;

/// Stored identity record.
#[derive(Clone, PartialEq, Eq)]
pub struct Identity {
    pub id: UserId,
    /// Email as registered (domain part lowercased).
    pub email: String,
    /// Argon2id PHC string. Never leaves the auth boundary.
    pub password_hash: String,
    pub role: Role,
    pub active: bool,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl core::fmt::Debug for Identity {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Identity")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("password_hash", &"<redacted>")
            .field("role", &self.role)
            .field("active", &self.active)
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("created_at", &self.created_at)
            .field("updated_at", &self.updated_at)
            .finish()
    }
}

impl Identity {
    /// Build a freshly registered identity: role `USER`, active. A missing
    /// first name falls back to the email's local part.
    pub fn register(
        email: &str,
        password_hash: String,
        first_name: Option<String>,
        last_name: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        let mut identity = Self {
            id: UserId::new(),
            email: normalize_email(email),
            password_hash,
            role: Role::default(),
            active: true,
            first_name: non_blank(first_name),
            last_name: non_blank(last_name),
            created_at: now,
            updated_at: now,
        };
        identity.fill_first_name();
        identity
    }

    fn fill_first_name(&mut self) {
        if self.first_name.is_none() {
            self.first_name = Some(self.email_local_part().to_string());
        }
    }

    /// Case-insensitive lookup key for this identity's email.
    pub fn email_key(&self) -> String {
        email_key(&self.email)
    }

    /// Apply a profile update. A blank first name falls back to the email's
    /// local part.
    pub fn apply_profile(&mut self, update: ProfileUpdate, now: DateTime<Utc>) {
        if let Some(first) = update.first_name {
            self.first_name = non_blank(Some(first));
        }
        if let Some(last) = update.last_name {
            self.last_name = non_blank(Some(last));
        }
        self.fill_first_name();
        self.updated_at = now;
    }

    pub fn assign_role(&mut self, role: Role, now: DateTime<Utc>) {
        self.role = role;
        self.updated_at = now;
    }

    pub fn set_active(&mut self, active: bool, now: DateTime<Utc>) {
        self.active = active;
        self.updated_at = now;
    }

    pub fn email_local_part(&self) -> &str {
        self.email.split('@').next().unwrap_or_default()
    }

    pub fn view(&self) -> IdentityView {
        IdentityView {
            id: self.id,
            email: self.email.clone(),
            role: self.role,
            active: self.active,
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Partial profile update. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

/// Public projection of an identity (no credential material).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityView {
    pub id: UserId,
    pub email: String,
    pub role: Role,
    pub active: bool,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Normalize an email for storage: trim, keep the local part, lowercase the domain.
pub fn normalize_email(raw: &str) -> String {
    let raw = raw.trim();
    match raw.rsplit_once('@') {
        Some((local, domain)) => format!("{}@{}", local, domain.to_lowercase()),
        None => raw.to_string(),
    }
}

/// Key used for case-insensitive email comparison.
pub fn email_key(raw: &str) -> String {
    raw.trim().to_lowercase()
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
