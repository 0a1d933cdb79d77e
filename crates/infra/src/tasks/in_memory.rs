use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use taskgate_core::{DomainError, DomainResult, TaskId};
use taskgate_tasks::query::newest_first;
use taskgate_tasks::{KeysetCursor, Task, TaskFilter, TaskStore};

/// In-memory task store for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryTaskStore {
    inner: RwLock<HashMap<TaskId, Task>>,
}

impl InMemoryTaskStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned() -> DomainError {
    DomainError::storage("task store lock poisoned")
}

#[async_trait]
impl TaskStore for InMemoryTaskStore {
    async fn insert(&self, task: Task) -> DomainResult<Task> {
        let mut map = self.inner.write().map_err(|_| poisoned())?;
        if map.values().any(|t| t.slug == task.slug) {
            return Err(DomainError::conflict(format!("slug {} already exists", task.slug)));
        }
        map.insert(task.id, task.clone());
        Ok(task)
    }

    async fn get(&self, id: TaskId) -> DomainResult<Option<Task>> {
        let map = self.inner.read().map_err(|_| poisoned())?;
        Ok(map.get(&id).cloned())
    }

    async fn update(&self, task: Task) -> DomainResult<Task> {
        let mut map = self.inner.write().map_err(|_| poisoned())?;
        let row = map.get_mut(&task.id).ok_or(DomainError::NotFound)?;
        *row = task.clone();
        Ok(task)
    }

    async fn delete(&self, id: TaskId) -> DomainResult<bool> {
        let mut map = self.inner.write().map_err(|_| poisoned())?;
        Ok(map.remove(&id).is_some())
    }

    async fn page(&self, filter: &TaskFilter, after: Option<KeysetCursor>, limit: usize) -> DomainResult<Vec<Task>> {
        let map = self.inner.read().map_err(|_| poisoned())?;
        let mut rows: Vec<Task> = map
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
        let map = self.inner.read().map_err(|_| poisoned())?;
        Ok(map.values().filter(|t| filter.matches(t)).count() as u64)
    }
}
