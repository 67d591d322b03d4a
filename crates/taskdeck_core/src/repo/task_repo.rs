//! Task repository contract and store-backed implementation.
//!
//! # Responsibility
//! - Delegate CRUD operations to the task store.
//! - Translate storage write failures into the single domain error kind
//!   the presentation layer handles uniformly.
//!
//! # Invariants
//! - Read operations and live queries are passed through unmodified.
//! - `update` on a missing id fails loudly with a message naming the id
//!   (policy decision recorded in DESIGN.md).

use crate::db::{DbError, DbResult, TaskFilter, TaskStore, TaskWatch};
use crate::model::task::{Priority, Task, TaskId};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

pub type RepoResult<T> = Result<T, RepoError>;

/// The one domain error the presentation layer sees for failed writes.
///
/// The presentation layer has no differentiated recovery strategy, so
/// I/O errors, constraint violations and missing rows all collapse into
/// a single kind carrying a display message.
#[derive(Debug)]
pub struct RepoError {
    message: String,
    source: Option<DbError>,
}

impl RepoError {
    fn storage(action: &str, source: DbError) -> Self {
        Self {
            message: format!("failed to {action}: {source}"),
            source: Some(source),
        }
    }

    fn missing_id(action: &str, id: TaskId) -> Self {
        Self {
            message: format!("cannot {action}: no stored task with id {id}"),
            source: None,
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.source
            .as_ref()
            .map(|err| err as &(dyn Error + 'static))
    }
}

/// Data-access contract for task persistence.
pub trait TaskRepository {
    fn insert(&self, task: &Task) -> RepoResult<TaskId>;
    fn update(&self, task: &Task) -> RepoResult<()>;
    fn delete(&self, task: &Task) -> RepoResult<()>;
    fn delete_completed(&self) -> RepoResult<usize>;
    fn delete_all(&self) -> RepoResult<()>;
    fn get_by_id(&self, id: TaskId) -> DbResult<Option<Task>>;
    fn list(&self, filter: &TaskFilter) -> DbResult<Vec<Task>>;
    fn watch_all(&self) -> TaskWatch;
    fn watch_by_status(&self, is_completed: bool) -> TaskWatch;
    fn watch_by_priority(&self, priority: Priority) -> TaskWatch;
}

/// Repository over a shared [`TaskStore`] handle.
#[derive(Clone)]
pub struct StoreTaskRepository {
    store: Arc<TaskStore>,
}

impl StoreTaskRepository {
    pub fn new(store: Arc<TaskStore>) -> Self {
        Self { store }
    }
}

impl TaskRepository for StoreTaskRepository {
    fn insert(&self, task: &Task) -> RepoResult<TaskId> {
        self.store
            .insert(task)
            .map_err(|err| RepoError::storage("insert task", err))
    }

    fn update(&self, task: &Task) -> RepoResult<()> {
        let changed = self
            .store
            .update(task)
            .map_err(|err| RepoError::storage("update task", err))?;

        if changed == 0 {
            return Err(RepoError::missing_id("update task", task.id));
        }
        Ok(())
    }

    fn delete(&self, task: &Task) -> RepoResult<()> {
        self.store
            .delete(task)
            .map_err(|err| RepoError::storage("delete task", err))
    }

    fn delete_completed(&self) -> RepoResult<usize> {
        self.store
            .delete_completed()
            .map_err(|err| RepoError::storage("delete completed tasks", err))
    }

    fn delete_all(&self) -> RepoResult<()> {
        self.store
            .delete_all()
            .map_err(|err| RepoError::storage("delete all tasks", err))
    }

    fn get_by_id(&self, id: TaskId) -> DbResult<Option<Task>> {
        self.store.get_by_id(id)
    }

    fn list(&self, filter: &TaskFilter) -> DbResult<Vec<Task>> {
        self.store.list(filter)
    }

    fn watch_all(&self) -> TaskWatch {
        self.store.watch(TaskFilter::All)
    }

    fn watch_by_status(&self, is_completed: bool) -> TaskWatch {
        self.store.watch(TaskFilter::Status(is_completed))
    }

    fn watch_by_priority(&self, priority: Priority) -> TaskWatch {
        self.store.watch(TaskFilter::Priority(priority))
    }
}
