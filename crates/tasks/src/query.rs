//! List filtering and pagination shapes.

use std::cmp::Ordering;

use serde::Serialize;

use taskgate_core::{FieldErrors, TaskId};

use crate::Task;

/// Rows per page.
pub const PAGE_SIZE: usize = 10;

pub const INVALID_CURSOR: &str = "Invalid cursor";

/// Row filter shared by listing and counting.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskFilter {
    pub completed: Option<bool>,
    /// Case-insensitive substring of title or description.
    pub search: Option<String>,
}

impl TaskFilter {
    pub fn completed(value: bool) -> Self {
        Self {
            completed: Some(value),
            search: None,
        }
    }

    pub fn matches(&self, task: &Task) -> bool {
        if self.completed.is_some_and(|c| c != task.completed) {
            return false;
        }
        match &self.search {
            None => true,
            Some(needle) => {
                let needle = needle.to_lowercase();
                task.title.to_lowercase().contains(&needle)
                    || task
                        .description
                        .as_deref()
                        .is_some_and(|d| d.to_lowercase().contains(&needle))
            }
        }
    }
}

/// A parsed list request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskQuery {
    pub filter: TaskFilter,
    /// Id of the last row of the previous page.
    pub cursor: Option<TaskId>,
}

impl TaskQuery {
    /// Build a query from raw query-string values.
    ///
    /// `completed` accepts `true`/`1` and `false`/`0` (any case); other values
    /// are ignored. An empty `search` is ignored. A cursor that is not an id is
    /// rejected.
    pub fn from_params(
        completed: Option<&str>,
        search: Option<&str>,
        cursor: Option<&str>,
    ) -> Result<Self, FieldErrors> {
        let cursor = match cursor.filter(|c| !c.is_empty()) {
            None => None,
            Some(raw) => Some(
                raw.parse::<TaskId>()
                    .map_err(|_| FieldErrors::single("cursor", INVALID_CURSOR))?,
            ),
        };

        Ok(Self {
            filter: TaskFilter {
                completed: completed.and_then(parse_completed),
                search: search.filter(|s| !s.is_empty()).map(str::to_string),
            },
            cursor,
        })
    }
}

fn parse_completed(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "true" | "1" => Some(true),
        "false" | "0" => Some(false),
        _ => None,
    }
}

/// Listing order: newest first, id descending as the tiebreak.
pub fn newest_first(a: &Task, b: &Task) -> Ordering {
    b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TaskSummary {
    pub total_tasks: u64,
    pub completed_tasks: u64,
    pub incomplete_tasks: u64,
    pub filtered_count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskPage {
    /// Cursor for the following page; absent on the last page.
    pub next: Option<TaskId>,
    pub results: Vec<Task>,
    pub task_summary: TaskSummary,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TaskInput;
    use chrono::Utc;

    fn task(title: &str, description: Option<&str>, completed: bool) -> Task {
        Task::create(
            TaskInput {
                title: Some(title.into()),
                description: description.map(Into::into),
                completed: Some(completed),
            },
            Utc::now(),
        )
        .unwrap()
    }

    #[test]
    fn completed_param_accepts_words_and_digits() {
        for (raw, want) in [("true", Some(true)), ("1", Some(true)), ("FALSE", Some(false)), ("0", Some(false)), ("yes", None)] {
            let q = TaskQuery::from_params(Some(raw), None, None).unwrap();
            assert_eq!(q.filter.completed, want, "{raw}");
        }
    }

    #[test]
    fn garbage_cursor_is_rejected() {
        let errors = TaskQuery::from_params(None, None, Some("nope")).unwrap_err();
        assert_eq!(errors.get("cursor"), Some(&[INVALID_CURSOR.to_string()][..]));
    }

    #[test]
    fn search_is_case_insensitive_over_title_and_description() {
        let filter = TaskFilter {
            completed: None,
            search: Some("REPORT".into()),
        };
        assert!(filter.matches(&task("weekly report", None, false)));
        assert!(filter.matches(&task("misc", Some("attach the Report"), false)));
        assert!(!filter.matches(&task("misc", None, false)));
    }

    #[test]
    fn filters_combine() {
        let filter = TaskFilter {
            completed: Some(true),
            search: Some("x".into()),
        };
        assert!(filter.matches(&task("x", None, true)));
        assert!(!filter.matches(&task("x", None, false)));
    }

    #[test]
    fn ordering_is_newest_first() {
        let older = task("a", None, false);
        let mut newer = task("b", None, false);
        newer.created_at = older.created_at + chrono::Duration::seconds(1);

        let mut rows = vec![older.clone(), newer.clone()];
        rows.sort_by(newest_first);
        assert_eq!(rows[0].id, newer.id);
    }
}
