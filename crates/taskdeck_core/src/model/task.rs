//! Task domain model.
//!
//! # Responsibility
//! - Define the single entity of the crate and its construction defaults.
//! - Provide the toggle-complete copy helper used by the state holder.
//!
//! # Invariants
//! - `id == UNASSIGNED_ID` until the storage layer assigns a real one.
//! - `created_at` is stamped once at construction and never changed by
//!   updates.
//! - `toggled()` flips `is_completed` and leaves every other field alone.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::{SystemTime, UNIX_EPOCH};

/// Storage-assigned row identifier.
///
/// Kept as a type alias to make semantic intent explicit in signatures.
pub type TaskId = i64;

/// Sentinel id for tasks that have not been persisted yet.
pub const UNASSIGNED_ID: TaskId = 0;

/// Urgency bucket for a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    #[default]
    Low,
    Medium,
    High,
}

/// Validation failure raised before a task reaches storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskValidationError {
    BlankTitle,
}

impl Display for TaskValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankTitle => write!(f, "task title must not be blank"),
        }
    }
}

impl Error for TaskValidationError {}

/// One to-do item.
///
/// The record is a plain value; the storage layer owns the persisted copy
/// and callers only ever hold transient snapshots of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Assigned by storage on insert; immutable afterwards.
    pub id: TaskId,
    /// Short user-visible text. Must not be blank when persisted.
    pub title: String,
    /// Optional free-form detail text.
    pub description: Option<String>,
    pub is_completed: bool,
    pub priority: Priority,
    /// Unix epoch milliseconds, stamped at construction.
    pub created_at: i64,
}

impl Task {
    /// Creates an unpersisted task with defaults and a fresh timestamp.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: UNASSIGNED_ID,
            title: title.into(),
            description: None,
            is_completed: false,
            priority: Priority::Low,
            created_at: now_epoch_ms(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    /// Returns a copy with `is_completed` inverted, all other fields kept.
    pub fn toggled(&self) -> Self {
        let mut copy = self.clone();
        copy.is_completed = !copy.is_completed;
        copy
    }

    /// Checks the invariants a task must satisfy before persistence.
    ///
    /// # Errors
    /// - `BlankTitle` when the title is empty or whitespace-only.
    pub fn validate(&self) -> Result<(), TaskValidationError> {
        if self.title.trim().is_empty() {
            return Err(TaskValidationError::BlankTitle);
        }
        Ok(())
    }
}

/// Current wall-clock time in Unix epoch milliseconds.
pub fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as i64)
        .unwrap_or(0)
}
