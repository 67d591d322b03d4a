//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `taskdeck_core` linkage.
//! - Print the seeded task list from a throwaway in-memory store.

use std::sync::Arc;
use taskdeck_core::{StoreTaskRepository, TaskFilter, TaskRepository, TaskStore};

fn main() {
    println!("taskdeck_core version={}", taskdeck_core::core_version());

    let store = match TaskStore::open_in_memory() {
        Ok(store) => Arc::new(store),
        Err(err) => {
            eprintln!("failed to open in-memory store: {err}");
            std::process::exit(1);
        }
    };

    let repo = StoreTaskRepository::new(store);
    match repo.list(&TaskFilter::All) {
        Ok(tasks) => {
            println!("seeded tasks: {}", tasks.len());
            for task in tasks {
                println!("  [{}] {:?} {}", task.id, task.priority, task.title);
            }
        }
        Err(err) => {
            eprintln!("failed to list tasks: {err}");
            std::process::exit(1);
        }
    }
}
