//! Explicit input validation for registration and login payloads.

use serde::Deserialize;

pub use taskgate_core::validation::{too_long, REQUIRED};
pub use taskgate_core::FieldErrors;

use crate::PasswordPolicy;

pub const INVALID_EMAIL: &str = "Enter a valid email address.";
pub const PASSWORD_MISMATCH: &str = "Password fields didn't match.";
pub const EMAIL_TAKEN: &str = "Email is already taken.";
pub const NAME_MAX_CHARS: usize = 100;

/// Registration payload.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    /// Password confirmation.
    #[serde(default)]
    pub password2: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
}

/// Registration payload after field validation.
#[derive(Debug, Clone)]
pub struct ValidRegistration {
    pub email: String,
    pub password: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

/// Login payload.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

/// Validate everything about a registration that does not need the store.
///
/// Email uniqueness is checked afterwards by the gateway.
pub fn validate_registration(
    req: &RegisterRequest,
    policy: &PasswordPolicy,
) -> Result<ValidRegistration, FieldErrors> {
    let mut errors = FieldErrors::new();

    let email = present(req.email.as_deref());
    match email {
        None => errors.add("email", REQUIRED),
        Some(e) if !is_plausible_email(e) => errors.add("email", INVALID_EMAIL),
        Some(_) => {}
    }

    let password = req.password.as_deref().filter(|p| !p.is_empty());
    let password2 = req.password2.as_deref().filter(|p| !p.is_empty());
    if password.is_none() {
        errors.add("password", REQUIRED);
    }
    if password2.is_none() {
        errors.add("password2", REQUIRED);
    }

    if let (Some(p), Some(p2)) = (password, password2) {
        if p != p2 {
            errors.add("password", PASSWORD_MISMATCH);
        } else if let Err(problems) = policy.validate(p, email) {
            for problem in problems {
                errors.add("password", problem.to_string());
            }
        }
    }

    for (field, value) in [("first_name", &req.first_name), ("last_name", &req.last_name)] {
        if value.as_deref().is_some_and(|v| v.chars().count() > NAME_MAX_CHARS) {
            errors.add(field, too_long(NAME_MAX_CHARS));
        }
    }

    errors.into_result()?;

    Ok(ValidRegistration {
        email: email.unwrap_or_default().to_string(),
        password: password.unwrap_or_default().to_string(),
        first_name: req.first_name.clone(),
        last_name: req.last_name.clone(),
    })
}

fn present(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Structural email check: one `@`, non-empty local part, dotted domain, no spaces.
pub fn is_plausible_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn req(email: &str, password: &str, password2: &str) -> RegisterRequest {
        RegisterRequest {
            email: Some(email.to_string()),
            password: Some(password.to_string()),
            password2: Some(password2.to_string()),
            first_name: None,
            last_name: None,
        }
    }

    #[test]
    fn valid_registration_passes() {
        let ok = validate_registration(&req("u@test.com", "Str0ng!Pass", "Str0ng!Pass"), &PasswordPolicy::default())
            .unwrap();
        assert_eq!(ok.email, "u@test.com");
    }

    #[test]
    fn mismatch_is_reported_on_password_field() {
        let errors = validate_registration(&req("u@test.com", "Str0ng!Pass", "Other!Pass1"), &PasswordPolicy::default())
            .unwrap_err();
        assert_eq!(errors.get("password"), Some(&[PASSWORD_MISMATCH.to_string()][..]));
    }

    #[test]
    fn missing_fields_are_each_required() {
        let errors = validate_registration(&RegisterRequest::default(), &PasswordPolicy::default()).unwrap_err();
        let fields: Vec<&str> = errors.fields().collect();
        assert_eq!(fields, vec!["email", "password", "password2"]);
    }

    #[test]
    fn weak_password_lists_policy_messages() {
        let errors = validate_registration(&req("u@test.com", "123", "123"), &PasswordPolicy::default()).unwrap_err();
        let messages = errors.get("password").unwrap();
        assert!(messages.iter().any(|m| m.contains("too short")));
        assert!(messages.iter().any(|m| m.contains("entirely numeric")));
    }

    #[test]
    fn malformed_email_is_rejected() {
        for bad in ["plainaddress", "@no-local.com", "a@b", "a b@c.com", "a@b@c.com"] {
            assert!(!is_plausible_email(bad), "{bad} should be rejected");
        }
        assert!(is_plausible_email("A@B.com"));
    }
}
