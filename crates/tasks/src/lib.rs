//! Task resource module.
//!
//! Plain CRUD over tasks plus filtered, cursor-paginated listing. Access
//! control is not decided here; callers authorize before invoking the service.

pub mod query;
pub mod service;
pub mod store;
pub mod task;

pub use query::{TaskFilter, TaskPage, TaskQuery, TaskSummary, PAGE_SIZE};
pub use service::{TaskError, TaskService};
pub use store::{KeysetCursor, TaskStore};
pub use task::{slugify, Task, TaskInput};
