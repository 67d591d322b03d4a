//! Repository layer over the task store.
//!
//! # Responsibility
//! - Define the data-access contract the presentation layer depends on.
//! - Collapse heterogeneous storage failures into one domain error.
//!
//! # Invariants
//! - Write failures are always re-raised as `RepoError` with a
//!   human-readable message.
//! - Reads and live queries pass through the storage layer unmodified.

pub mod task_repo;
