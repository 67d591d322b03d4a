//! Domain model for the task list.
//!
//! # Responsibility
//! - Define the canonical task record persisted by the storage layer.
//! - Keep validation rules next to the data they guard.
//!
//! # Invariants
//! - Every stored task is identified by a storage-assigned `TaskId`.
//! - A persisted task never carries a blank title.

pub mod task;
