//! Core domain logic for TaskDeck, a single-screen local task list.
//! This crate is the single source of truth for persistence and
//! view-state synchronization; rendering lives with the embedding view.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod state;

pub use db::{DbError, DbResult, TaskFilter, TaskStore, TaskWatch};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::task::{Priority, Task, TaskId, TaskValidationError};
pub use repo::task_repo::{RepoError, RepoResult, StoreTaskRepository, TaskRepository};
pub use state::task_list::{TaskListState, TaskObserver};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
