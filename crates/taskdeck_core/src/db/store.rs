//! SQLite-backed task store.
//!
//! # Responsibility
//! - Provide CRUD operations over the canonical `tasks` table.
//! - Keep SQL details inside the storage boundary.
//! - Drive the publish/subscribe channel after each committed write.
//!
//! # Invariants
//! - `id` is assigned by SQLite on insert and never reused within a store.
//! - Snapshots are ordered by `created_at DESC, id DESC` (newest first,
//!   equal timestamps break toward later insertion).
//! - Watchers are notified only for writes that changed at least one row.

use crate::db::watch::{TaskFilter, TaskWatch};
use crate::db::{DbError, DbResult};
use crate::model::task::{Priority, Task, TaskId};
use log::warn;
use parking_lot::Mutex;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};
use std::sync::mpsc::Sender;

const TASK_SELECT_SQL: &str = "SELECT
    id,
    title,
    description,
    is_completed,
    priority,
    created_at
FROM tasks";

#[derive(Debug)]
struct Watcher {
    filter: TaskFilter,
    tx: Sender<Vec<Task>>,
}

/// Single-process task storage over one SQLite connection.
///
/// The store is constructed by the composition root and shared by handle
/// (`Arc<TaskStore>`); there is deliberately no process-wide singleton.
#[derive(Debug)]
pub struct TaskStore {
    conn: Mutex<Connection>,
    watchers: Mutex<Vec<Watcher>>,
}

impl TaskStore {
    pub(crate) fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
            watchers: Mutex::new(Vec::new()),
        }
    }

    /// Stores a new task and returns the assigned id.
    ///
    /// The `id` field of the passed task is ignored; SQLite assigns a
    /// fresh one.
    pub fn insert(&self, task: &Task) -> DbResult<TaskId> {
        let id = {
            let conn = self.conn.lock();
            conn.execute(
                "INSERT INTO tasks (title, description, is_completed, priority, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5);",
                params![
                    task.title.as_str(),
                    task.description.as_deref(),
                    bool_to_int(task.is_completed),
                    priority_to_db(task.priority),
                    task.created_at,
                ],
            )?;
            conn.last_insert_rowid()
        };

        self.notify_watchers();
        Ok(id)
    }

    /// Replaces the stored record matching `task.id`.
    ///
    /// Returns the number of rows changed; zero means no such id exists.
    /// Whether that is an error is a repository-level policy, not a
    /// storage one. `created_at` is deliberately not part of the SET list.
    pub fn update(&self, task: &Task) -> DbResult<usize> {
        let changed = {
            let conn = self.conn.lock();
            conn.execute(
                "UPDATE tasks
                 SET
                    title = ?1,
                    description = ?2,
                    is_completed = ?3,
                    priority = ?4
                 WHERE id = ?5;",
                params![
                    task.title.as_str(),
                    task.description.as_deref(),
                    bool_to_int(task.is_completed),
                    priority_to_db(task.priority),
                    task.id,
                ],
            )?
        };

        if changed > 0 {
            self.notify_watchers();
        }
        Ok(changed)
    }

    /// Removes the record matching `task.id`. Idempotent on missing ids.
    pub fn delete(&self, task: &Task) -> DbResult<()> {
        let changed = {
            let conn = self.conn.lock();
            conn.execute("DELETE FROM tasks WHERE id = ?1;", [task.id])?
        };

        if changed > 0 {
            self.notify_watchers();
        }
        Ok(())
    }

    /// Removes every completed task, returning how many were removed.
    pub fn delete_completed(&self) -> DbResult<usize> {
        let removed = {
            let conn = self.conn.lock();
            conn.execute("DELETE FROM tasks WHERE is_completed = 1;", [])?
        };

        if removed > 0 {
            self.notify_watchers();
        }
        Ok(removed)
    }

    /// Removes every stored task.
    pub fn delete_all(&self) -> DbResult<()> {
        let removed = {
            let conn = self.conn.lock();
            conn.execute("DELETE FROM tasks;", [])?
        };

        if removed > 0 {
            self.notify_watchers();
        }
        Ok(())
    }

    pub fn get_by_id(&self, id: TaskId) -> DbResult<Option<Task>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&format!("{TASK_SELECT_SQL} WHERE id = ?1;"))?;

        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_task_row(row)?));
        }

        Ok(None)
    }

    /// Returns the current snapshot matching `filter`, newest first.
    pub fn list(&self, filter: &TaskFilter) -> DbResult<Vec<Task>> {
        let mut sql = format!("{TASK_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        match filter {
            TaskFilter::All => {}
            TaskFilter::Status(is_completed) => {
                sql.push_str(" AND is_completed = ?");
                bind_values.push(Value::Integer(bool_to_int(*is_completed)));
            }
            TaskFilter::Priority(priority) => {
                sql.push_str(" AND priority = ?");
                bind_values.push(Value::Text(priority_to_db(*priority).to_string()));
            }
        }

        sql.push_str(" ORDER BY created_at DESC, id DESC");

        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut tasks = Vec::new();

        while let Some(row) = rows.next()? {
            tasks.push(parse_task_row(row)?);
        }

        Ok(tasks)
    }

    /// Subscribes a live query for `filter`.
    ///
    /// The current snapshot is delivered immediately; afterwards a full
    /// snapshot is re-emitted after every committed write.
    pub fn watch(&self, filter: TaskFilter) -> TaskWatch {
        let (tx, watch) = TaskWatch::channel();

        // The registry lock is held across the initial snapshot so no
        // write can commit between snapshotting and registration (lock
        // order watchers -> conn, same as notify_watchers).
        let mut watchers = self.watchers.lock();
        match self.list(&filter) {
            Ok(snapshot) => {
                let _ = tx.send(snapshot);
            }
            Err(err) => {
                warn!("event=watch_subscribe module=db status=error error={err}");
            }
        }

        watchers.push(Watcher { filter, tx });
        watch
    }

    /// Re-runs every registered filter and pushes fresh snapshots.
    ///
    /// Subscribers whose receiving end is gone are pruned here.
    fn notify_watchers(&self) {
        let mut watchers = self.watchers.lock();
        watchers.retain(|watcher| {
            let snapshot = match self.list(&watcher.filter) {
                Ok(snapshot) => snapshot,
                Err(err) => {
                    warn!("event=watch_notify module=db status=error error={err}");
                    return true;
                }
            };
            watcher.tx.send(snapshot).is_ok()
        });
    }

    #[cfg(test)]
    pub(crate) fn watcher_count(&self) -> usize {
        self.watchers.lock().len()
    }
}

fn parse_task_row(row: &Row<'_>) -> DbResult<Task> {
    let is_completed = match row.get::<_, i64>("is_completed")? {
        0 => false,
        1 => true,
        other => {
            return Err(DbError::InvalidData(format!(
                "invalid is_completed value `{other}` in tasks.is_completed"
            )));
        }
    };

    let priority_text: String = row.get("priority")?;
    let priority = parse_priority(&priority_text).ok_or_else(|| {
        DbError::InvalidData(format!(
            "invalid priority value `{priority_text}` in tasks.priority"
        ))
    })?;

    Ok(Task {
        id: row.get("id")?,
        title: row.get("title")?,
        description: row.get("description")?,
        is_completed,
        priority,
        created_at: row.get("created_at")?,
    })
}

fn priority_to_db(priority: Priority) -> &'static str {
    match priority {
        Priority::Low => "low",
        Priority::Medium => "medium",
        Priority::High => "high",
    }
}

fn parse_priority(value: &str) -> Option<Priority> {
    match value {
        "low" => Some(Priority::Low),
        "medium" => Some(Priority::Medium),
        "high" => Some(Priority::High),
        _ => None,
    }
}

fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}
