//! Password strength policy and one-way hashing.
//!
//! Plaintext passwords only ever flow through [`PasswordPolicy::validate`],
//! [`hash_password`] and [`verify_password`]. Hashes are argon2id PHC strings
//! with a random per-password salt.

use std::collections::HashSet;

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use rand::rngs::OsRng;
use thiserror::Error;

use crate::Identity;

const COMMON_PASSWORDS: &[&str] = &[
    "password", "password1", "password123", "123456", "12345678", "123456789",
    "1234567890", "qwerty", "qwerty123", "qwertyuiop", "abc123", "111111",
    "iloveyou", "admin", "admin123", "welcome", "welcome1", "letmein",
    "monkey", "dragon", "football", "baseball", "sunshine", "princess",
    "passw0rd", "p@ssw0rd", "trustno1", "superman", "master", "changeme",
    "testpass", "testpass123", "zaq12wsx", "1q2w3e4r", "starwars",
];

/// Minimum-complexity policy applied at registration.
#[derive(Debug, Clone)]
pub struct PasswordPolicy {
    pub min_length: usize,
    pub max_length: usize,
    pub disallow_all_numeric: bool,
    pub check_common_passwords: bool,
    /// Reject passwords containing the email's local part (when it has at
    /// least three characters).
    pub disallow_email_in_password: bool,
    pub blocked_passwords: HashSet<String>,
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self {
            min_length: 8,
            max_length: 128,
            disallow_all_numeric: true,
            check_common_passwords: true,
            disallow_email_in_password: true,
            blocked_passwords: HashSet::new(),
        }
    }
}

impl PasswordPolicy {
    /// Validate a candidate password, returning every rule it breaks.
    pub fn validate(&self, password: &str, email: Option<&str>) -> Result<(), Vec<PasswordError>> {
        let mut errors = Vec::new();
        let length = password.chars().count();

        if length < self.min_length {
            errors.push(PasswordError::TooShort { min: self.min_length });
        }
        if length > self.max_length {
            errors.push(PasswordError::TooLong { max: self.max_length });
        }

        let lowered = password.to_lowercase();
        if self.check_common_passwords
            && (COMMON_PASSWORDS.contains(&lowered.as_str()) || self.blocked_passwords.contains(&lowered))
        {
            errors.push(PasswordError::TooCommon);
        }
        if self.disallow_all_numeric && !password.is_empty() && password.chars().all(|c| c.is_ascii_digit()) {
            errors.push(PasswordError::EntirelyNumeric);
        }
        if let (true, Some(email)) = (self.disallow_email_in_password, email) {
            let local = email.split('@').next().unwrap_or_default().to_lowercase();
            if local.chars().count() >= 3 && lowered.contains(&local) {
                errors.push(PasswordError::SimilarToEmail);
            }
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PasswordError {
    #[error("This password is too short. It must contain at least {min} characters.")]
    TooShort { min: usize },

    #[error("This password is too long. It must contain at most {max} characters.")]
    TooLong { max: usize },

    #[error("This password is too common.")]
    TooCommon,

    #[error("This password is entirely numeric.")]
    EntirelyNumeric,

    #[error("The password is too similar to the email.")]
    SimilarToEmail,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("password hashing failed: {0}")]
pub struct HashError(pub String);

/// Hash a password with argon2id and a random salt.
///
/// CPU-bound; async callers should run it on a blocking thread.
pub fn hash_password(password: &str) -> Result<String, HashError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| HashError(e.to_string()))
}

/// Compare a plaintext password against an identity's stored hash.
///
/// An unparseable stored hash never verifies.
pub fn verify_password(identity: &Identity, password: &str) -> bool {
    PasswordHash::new(&identity.password_hash)
        .map(|parsed| Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn strong_password_passes_default_policy() {
        assert!(PasswordPolicy::default().validate("Str0ng!Pass", Some("u@test.com")).is_ok());
    }

    #[test]
    fn short_numeric_password_reports_every_rule() {
        let errors = PasswordPolicy::default().validate("1234", None).unwrap_err();
        assert!(errors.contains(&PasswordError::TooShort { min: 8 }));
        assert!(errors.contains(&PasswordError::EntirelyNumeric));
    }

    #[test]
    fn common_password_is_rejected_case_insensitively() {
        let errors = PasswordPolicy::default().validate("PassWord123", None).unwrap_err();
        assert_eq!(errors, vec![PasswordError::TooCommon]);
    }

    #[test]
    fn password_containing_email_local_part_is_rejected() {
        let errors = PasswordPolicy::default()
            .validate("xx-johnsmith-99", Some("JohnSmith@example.com"))
            .unwrap_err();
        assert_eq!(errors, vec![PasswordError::SimilarToEmail]);
    }

    #[test]
    fn messages_are_user_facing() {
        assert_eq!(
            PasswordError::TooShort { min: 8 }.to_string(),
            "This password is too short. It must contain at least 8 characters."
        );
    }

    #[test]
    fn hash_verifies_only_the_original_password() {
        let hash = hash_password("Str0ng!Pass").unwrap();
        assert!(hash.starts_with("$argon2id$"));

        let identity = Identity::register("u@test.com", hash, None, None, Utc::now());
        assert!(verify_password(&identity, "Str0ng!Pass"));
        assert!(!verify_password(&identity, "str0ng!pass"));
    }

    #[test]
    fn same_password_hashes_differently() {
        assert_ne!(hash_password("Str0ng!Pass").unwrap(), hash_password("Str0ng!Pass").unwrap());
    }

    #[test]
    fn corrupt_hash_never_verifies() {
        let identity = Identity::register("u@test.com", "not-a-phc".to_string(), None, None, Utc::now());
        assert!(!verify_password(&identity, "anything"));
    }
}
