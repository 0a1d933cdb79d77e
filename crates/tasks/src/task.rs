use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use taskgate_core::validation::{too_long, BLANK, REQUIRED};
use taskgate_core::{FieldErrors, TaskId};

pub const TITLE_MAX_CHARS: usize = 200;

/// A unit of work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    /// Unique, URL-friendly; fixed at creation.
    pub slug: String,
    pub title: String,
    pub description: Option<String>,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Create/replace payload.
///
/// On update, an absent `description` or `completed` keeps the stored value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskInput {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub completed: Option<bool>,
}

impl TaskInput {
    /// Returns the trimmed title when the payload is acceptable.
    pub fn validate(&self) -> Result<String, FieldErrors> {
        let mut errors = FieldErrors::new();

        let title = self.title.as_deref().map(str::trim);
        match title {
            None => errors.add("title", REQUIRED),
            Some("") => errors.add("title", BLANK),
            Some(t) if t.chars().count() > TITLE_MAX_CHARS => errors.add("title", too_long(TITLE_MAX_CHARS)),
            Some(_) => {}
        }

        errors.into_result()?;
        Ok(title.unwrap_or_default().to_string())
    }
}

impl Task {
    pub fn create(input: TaskInput, now: DateTime<Utc>) -> Result<Self, FieldErrors> {
        let title = input.validate()?;
        let id = TaskId::new();
        Ok(Self {
            slug: slug_for(&title, id),
            id,
            title,
            description: input.description,
            completed: input.completed.unwrap_or(false),
            created_at: now,
            updated_at: now,
        })
    }

    /// Replace title (and any provided optional fields). The slug is kept.
    pub fn apply(&mut self, input: TaskInput, now: DateTime<Utc>) -> Result<(), FieldErrors> {
        self.title = input.validate()?;
        if let Some(description) = input.description {
            self.description = Some(description);
        }
        if let Some(completed) = input.completed {
            self.completed = completed;
        }
        self.updated_at = now;
        Ok(())
    }

    /// Draw a fresh slug suffix, used when the previous one collided.
    pub fn reslug(&mut self) {
        self.slug = slug_for(&self.title, TaskId::new());
    }
}

/// `"{title}-{8 hex}"` slugified. The suffix comes from the random tail of a
/// fresh v7 uuid (the head is the timestamp).
fn slug_for(title: &str, entropy: TaskId) -> String {
    let hex = entropy.as_uuid().simple().to_string();
    slugify(&format!("{title}-{}", &hex[hex.len() - 8..]))
}

/// Lowercase, keep ASCII alphanumerics and `_`, collapse whitespace and
/// hyphen runs into a single `-`, drop everything else, trim `-`/`_` ends.
pub fn slugify(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut pending_dash = false;

    for c in input.chars() {
        if c.is_ascii_alphanumeric() || c == '_' {
            if pending_dash && !out.is_empty() {
                out.push('-');
            }
            pending_dash = false;
            out.push(c.to_ascii_lowercase());
        } else if c.is_whitespace() || c == '-' {
            pending_dash = true;
        }
    }

    out.trim_matches(|c| c == '-' || c == '_').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn input(title: &str) -> TaskInput {
        TaskInput {
            title: Some(title.to_string()),
            ..TaskInput::default()
        }
    }

    #[test]
    fn slugify_matches_expected_shapes() {
        assert_eq!(slugify("Write the Report"), "write-the-report");
        assert_eq!(slugify("  Fix: bug #42 -- now! "), "fix-bug-42-now");
        assert_eq!(slugify("snake_case stays"), "snake_case-stays");
        assert_eq!(slugify("¡Ünïcode!"), "ncode");
    }

    #[test]
    fn create_defaults_and_slug_suffix() {
        let task = Task::create(input("Write the Report"), Utc::now()).unwrap();
        assert!(!task.completed);
        assert_eq!(task.description, None);
        assert!(task.slug.starts_with("write-the-report-"));
        assert_eq!(task.slug.len(), "write-the-report-".len() + 8);
    }

    #[test]
    fn slugs_differ_for_identical_titles() {
        let a = Task::create(input("Same"), Utc::now()).unwrap();
        let b = Task::create(input("Same"), Utc::now()).unwrap();
        assert_ne!(a.slug, b.slug);
    }

    #[test]
    fn title_is_required_and_bounded() {
        let errors = TaskInput::default().validate().unwrap_err();
        assert_eq!(errors.get("title"), Some(&[REQUIRED.to_string()][..]));

        let errors = input("   ").validate().unwrap_err();
        assert_eq!(errors.get("title"), Some(&[BLANK.to_string()][..]));

        let long = "x".repeat(TITLE_MAX_CHARS + 1);
        assert!(input(&long).validate().is_err());
        assert!(input(&"x".repeat(TITLE_MAX_CHARS)).validate().is_ok());
    }

    #[test]
    fn apply_keeps_slug_and_unspecified_fields() {
        let created = Utc::now();
        let mut task = Task::create(
            TaskInput {
                title: Some("Old".into()),
                description: Some("details".into()),
                completed: Some(true),
            },
            created,
        )
        .unwrap();
        let slug = task.slug.clone();

        task.apply(input("New"), created + chrono::Duration::seconds(5)).unwrap();
        assert_eq!(task.title, "New");
        assert_eq!(task.slug, slug);
        assert_eq!(task.description.as_deref(), Some("details"));
        assert!(task.completed);
        assert!(task.updated_at > task.created_at);
    }

    proptest! {
        #[test]
        fn slugify_output_is_url_safe(s in ".{0,64}") {
            let slug = slugify(&s);
            prop_assert!(slug.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-'));
            prop_assert!(!slug.contains("--"));
            prop_assert!(!slug.starts_with('-') && !slug.ends_with('-'));
        }
    }
}
