//! Connection bootstrap for the task store.
//!
//! # Responsibility
//! - Open file or in-memory SQLite connections.
//! - Configure connection pragmas required by core behavior.
//! - Trigger schema migrations and first-creation seeding.
//!
//! # Invariants
//! - Returned stores have `foreign_keys=ON` and migrations fully applied.
//! - Seed tasks are inserted exactly once, when the schema is first
//!   created, never on reopen.

use super::migrations::apply_migrations;
use super::store::TaskStore;
use super::DbResult;
use crate::model::task::{Priority, Task};
use log::{error, info};
use rusqlite::Connection;
use std::path::Path;
use std::time::{Duration, Instant};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

impl TaskStore {
    /// Opens a SQLite database file and applies all pending migrations.
    ///
    /// # Side effects
    /// - Seeds example tasks when the store is created for the first time.
    /// - Emits `db_open` logging events with duration and status.
    pub fn open(path: impl AsRef<Path>) -> DbResult<Self> {
        Self::open_with(Connection::open(path), "file")
    }

    /// Opens an in-memory SQLite database and applies all pending
    /// migrations. Same contract as [`TaskStore::open`].
    pub fn open_in_memory() -> DbResult<Self> {
        Self::open_with(Connection::open_in_memory(), "memory")
    }

    fn open_with(opened: rusqlite::Result<Connection>, mode: &str) -> DbResult<Self> {
        let started_at = Instant::now();
        info!("event=db_open module=db status=start mode={mode}");

        let conn = match opened {
            Ok(conn) => conn,
            Err(err) => {
                error!(
                    "event=db_open module=db status=error mode={mode} duration_ms={} error_code=db_open_failed error={err}",
                    started_at.elapsed().as_millis()
                );
                return Err(err.into());
            }
        };

        match bootstrap(conn) {
            Ok(store) => {
                info!(
                    "event=db_open module=db status=ok mode={mode} duration_ms={}",
                    started_at.elapsed().as_millis()
                );
                Ok(store)
            }
            Err(err) => {
                error!(
                    "event=db_open module=db status=error mode={mode} duration_ms={} error_code=db_bootstrap_failed error={err}",
                    started_at.elapsed().as_millis()
                );
                Err(err)
            }
        }
    }
}

fn bootstrap(mut conn: Connection) -> DbResult<TaskStore> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(BUSY_TIMEOUT)?;
    let freshly_created = apply_migrations(&mut conn)?;

    let store = TaskStore::from_connection(conn);
    if freshly_created {
        seed_example_tasks(&store)?;
    }

    Ok(store)
}

fn seed_example_tasks(store: &TaskStore) -> DbResult<()> {
    let examples = [
        Task::new("Buy groceries")
            .with_description("Milk, bread, butter")
            .with_priority(Priority::Medium),
        Task::new("Study for exam")
            .with_description("Chapters 1-5")
            .with_priority(Priority::High),
        Task::new("Exercise").with_description("30 minutes of walking"),
    ];

    let count = examples.len();
    for task in examples {
        store.insert(&task)?;
    }

    info!("event=db_seed module=db status=ok count={count}");
    Ok(())
}
