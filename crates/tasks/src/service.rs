use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;

use taskgate_core::{DomainError, FieldErrors, TaskId};

use crate::query::INVALID_CURSOR;
use crate::store::KeysetCursor;
use crate::{Task, TaskFilter, TaskInput, TaskPage, TaskQuery, TaskStore, TaskSummary, PAGE_SIZE};

/// Attempts at drawing a non-colliding slug before giving up.
const SLUG_ATTEMPTS: usize = 3;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TaskError {
    #[error("validation failed: {0}")]
    Validation(FieldErrors),

    #[error("task not found")]
    NotFound,

    #[error("storage failure: {0}")]
    Storage(String),
}

impl From<DomainError> for TaskError {
    fn from(value: DomainError) -> Self {
        match value {
            DomainError::NotFound => TaskError::NotFound,
            DomainError::InvalidId(msg) => {
                TaskError::Validation(FieldErrors::single("non_field_errors", msg))
            }
            DomainError::Conflict(msg) | DomainError::Storage(msg) => TaskError::Storage(msg),
        }
    }
}

impl From<FieldErrors> for TaskError {
    fn from(value: FieldErrors) -> Self {
        TaskError::Validation(value)
    }
}

#[derive(Clone)]
pub struct TaskService {
    store: Arc<dyn TaskStore>,
}

impl TaskService {
    pub fn new(store: Arc<dyn TaskStore>) -> Self {
        Self { store }
    }

    pub async fn create(&self, input: TaskInput) -> Result<Task, TaskError> {
        self.create_at(input, Utc::now()).await
    }

    pub async fn create_at(&self, input: TaskInput, now: DateTime<Utc>) -> Result<Task, TaskError> {
        let mut task = Task::create(input, now)?;

        let mut attempt = 1;
        loop {
            match self.store.insert(task.clone()).await {
                Ok(stored) => {
                    tracing::info!(task_id = %stored.id, slug = %stored.slug, "task created");
                    return Ok(stored);
                }
                Err(DomainError::Conflict(msg)) if attempt < SLUG_ATTEMPTS => {
                    tracing::warn!(slug = %task.slug, %msg, "slug collision, redrawing");
                    task.reslug();
                    attempt += 1;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    pub async fn get(&self, id: TaskId) -> Result<Task, TaskError> {
        self.store.get(id).await?.ok_or(TaskError::NotFound)
    }

    /// Full replacement of the editable fields.
    pub async fn update(&self, id: TaskId, input: TaskInput) -> Result<Task, TaskError> {
        let mut task = self.get(id).await?;
        task.apply(input, Utc::now())?;
        let task = self.store.update(task).await?;
        tracing::info!(task_id = %task.id, completed = task.completed, "task updated");
        Ok(task)
    }

    pub async fn delete(&self, id: TaskId) -> Result<(), TaskError> {
        if !self.store.delete(id).await? {
            return Err(TaskError::NotFound);
        }
        tracing::info!(task_id = %id, "task deleted");
        Ok(())
    }

    /// One page of tasks plus whole-table and filtered counts.
    pub async fn list(&self, query: TaskQuery) -> Result<TaskPage, TaskError> {
        let after = match query.cursor {
            None => None,
            Some(id) => match self.store.get(id).await? {
                Some(task) => Some(KeysetCursor::of(&task)),
                None => return Err(TaskError::Validation(FieldErrors::single("cursor", INVALID_CURSOR))),
            },
        };

        let mut results = self.store.page(&query.filter, after, PAGE_SIZE + 1).await?;
        let next = if results.len() > PAGE_SIZE {
            results.truncate(PAGE_SIZE);
            results.last().map(|t| t.id)
        } else {
            None
        };

        let task_summary = TaskSummary {
            total_tasks: self.store.count(&TaskFilter::default()).await?,
            completed_tasks: self.store.count(&TaskFilter::completed(true)).await?,
            incomplete_tasks: self.store.count(&TaskFilter::completed(false)).await?,
            filtered_count: self.store.count(&query.filter).await?,
        };

        Ok(TaskPage {
            next,
            results,
            task_summary,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::RwLock;

    use async_trait::async_trait;
    use chrono::Duration;
    use taskgate_core::DomainResult;

    use crate::query::newest_first;

    #[derive(Default)]
    struct MemStore {
        rows: RwLock<HashMap<TaskId, Task>>,
    }

    #[async_trait]
    impl TaskStore for MemStore {
        async fn insert(&self, task: Task) -> DomainResult<Task> {
            let mut rows = self.rows.write().unwrap();
            if rows.values().any(|t| t.slug == task.slug) {
                return Err(DomainError::conflict("slug taken"));
            }
            rows.insert(task.id, task.clone());
            Ok(task)
        }

        async fn get(&self, id: TaskId) -> DomainResult<Option<Task>> {
            Ok(self.rows.read().unwrap().get(&id).cloned())
        }

        async fn update(&self, task: Task) -> DomainResult<Task> {
            let mut rows = self.rows.write().unwrap();
            let row = rows.get_mut(&task.id).ok_or(DomainError::NotFound)?;
            *row = task.clone();
            Ok(task)
        }

        async fn delete(&self, id: TaskId) -> DomainResult<bool> {
            Ok(self.rows.write().unwrap().remove(&id).is_some())
        }

        async fn page(&self, filter: &TaskFilter, after: Option<KeysetCursor>, limit: usize) -> DomainResult<Vec<Task>> {
            let mut rows: Vec<Task> = self
                .rows
                .read()
                .unwrap()
                .values()
                .filter(|t| filter.matches(t))
                .filter(|t| after.is_none_or(|c| c.precedes(t)))
                .cloned()
                .collect();
            rows.sort_by(newest_first);
            rows.truncate(limit);
            Ok(rows)
        }

        async fn count(&self, filter: &TaskFilter) -> DomainResult<u64> {
            Ok(self.rows.read().unwrap().values().filter(|t| filter.matches(t)).count() as u64)
        }
    }

    fn service() -> TaskService {
        TaskService::new(Arc::new(MemStore::default()))
    }

    fn input(title: &str, completed: bool) -> TaskInput {
        TaskInput {
            title: Some(title.into()),
            description: None,
            completed: Some(completed),
        }
    }

    async fn seed(service: &TaskService, n: usize) -> Vec<Task> {
        let base = Utc::now();
        let mut out = Vec::new();
        for i in 0..n {
            let task = service
                .create_at(input(&format!("task {i}"), i % 2 == 0), base + Duration::seconds(i as i64))
                .await
                .unwrap();
            out.push(task);
        }
        out
    }

    #[tokio::test]
    async fn crud_roundtrip() {
        let service = service();
        let task = service.create(input("Write docs", false)).await.unwrap();
        assert_eq!(service.get(task.id).await.unwrap(), task);

        let updated = service.update(task.id, input("Write more docs", true)).await.unwrap();
        assert_eq!(updated.slug, task.slug);
        assert!(updated.completed);

        service.delete(task.id).await.unwrap();
        assert_eq!(service.get(task.id).await, Err(TaskError::NotFound));
        assert_eq!(service.delete(task.id).await, Err(TaskError::NotFound));
    }

    #[tokio::test]
    async fn invalid_update_leaves_task_untouched() {
        let service = service();
        let task = service.create(input("Keep me", false)).await.unwrap();

        let err = service.update(task.id, TaskInput::default()).await.unwrap_err();
        assert!(matches!(err, TaskError::Validation(_)));
        assert_eq!(service.get(task.id).await.unwrap().title, "Keep me");
    }

    #[tokio::test]
    async fn pages_walk_newest_first_without_overlap() {
        let service = service();
        let seeded = seed(&service, 23).await;

        let first = service.list(TaskQuery::default()).await.unwrap();
        assert_eq!(first.results.len(), PAGE_SIZE);
        assert_eq!(first.results[0].id, seeded[22].id);

        let second = service
            .list(TaskQuery {
                cursor: first.next,
                ..TaskQuery::default()
            })
            .await
            .unwrap();
        assert_eq!(second.results[0].id, seeded[12].id);

        let third = service
            .list(TaskQuery {
                cursor: second.next,
                ..TaskQuery::default()
            })
            .await
            .unwrap();
        assert_eq!(third.results.len(), 3);
        assert_eq!(third.next, None);
    }

    #[tokio::test]
    async fn exact_page_has_no_next() {
        let service = service();
        seed(&service, PAGE_SIZE).await;
        let page = service.list(TaskQuery::default()).await.unwrap();
        assert_eq!(page.results.len(), PAGE_SIZE);
        assert_eq!(page.next, None);
    }

    #[tokio::test]
    async fn summary_counts_whole_table_and_filtered_rows() {
        let service = service();
        seed(&service, 5).await;

        let query = TaskQuery::from_params(Some("true"), None, None).unwrap();
        let page = service.list(query).await.unwrap();

        assert_eq!(
            page.task_summary,
            TaskSummary {
                total_tasks: 5,
                completed_tasks: 3,
                incomplete_tasks: 2,
                filtered_count: 3,
            }
        );
        assert!(page.results.iter().all(|t| t.completed));
    }

    #[tokio::test]
    async fn unknown_cursor_is_a_validation_error() {
        let service = service();
        let err = service
            .list(TaskQuery {
                cursor: Some(TaskId::new()),
                ..TaskQuery::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, TaskError::Validation(_)));
    }
}
