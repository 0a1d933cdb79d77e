//! Task persistence port.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use taskgate_core::{DomainResult, TaskId};

use crate::{Task, TaskFilter};

/// Position of a row in the newest-first listing order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeysetCursor {
    pub created_at: DateTime<Utc>,
    pub id: TaskId,
}

impl KeysetCursor {
    pub fn of(task: &Task) -> Self {
        Self {
            created_at: task.created_at,
            id: task.id,
        }
    }

    /// `true` when `task` is listed after this position.
    pub fn precedes(&self, task: &Task) -> bool {
        (task.created_at, task.id) < (self.created_at, self.id)
    }
}

#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Persist a new task. Fails with `Conflict` when the slug is taken.
    async fn insert(&self, task: Task) -> DomainResult<Task>;

    async fn get(&self, id: TaskId) -> DomainResult<Option<Task>>;

    /// Replace a stored task. Fails with `NotFound` if it does not exist.
    async fn update(&self, task: Task) -> DomainResult<Task>;

    /// Returns whether a row was removed.
    async fn delete(&self, id: TaskId) -> DomainResult<bool>;

    /// Up to `limit` matching rows in newest-first order, starting after `after`.
    async fn page(&self, filter: &TaskFilter, after: Option<KeysetCursor>, limit: usize) -> DomainResult<Vec<Task>>;

    async fn count(&self, filter: &TaskFilter) -> DomainResult<u64>;
}

#[async_trait]
impl<S> TaskStore for Arc<S>
where
    S: TaskStore + ?Sized,
{
    async fn insert(&self, task: Task) -> DomainResult<Task> {
        (**self).insert(task).await
    }

    async fn get(&self, id: TaskId) -> DomainResult<Option<Task>> {
        (**self).get(id).await
    }

    async fn update(&self, task: Task) -> DomainResult<Task> {
        (**self).update(task).await
    }

    async fn delete(&self, id: TaskId) -> DomainResult<bool> {
        (**self).delete(id).await
    }

    async fn page(&self, filter: &TaskFilter, after: Option<KeysetCursor>, limit: usize) -> DomainResult<Vec<Task>> {
        (**self).page(filter, after, limit).await
    }

    async fn count(&self, filter: &TaskFilter) -> DomainResult<u64> {
        (**self).count(filter).await
    }
}
