//! Presentation state holders.
//!
//! # Responsibility
//! - Turn fire-and-forget user intents into repository calls on a worker
//!   queue.
//! - Mirror the live task snapshot and transient error/success signals
//!   for a view to render.

pub mod task_list;
