//! Task-list presentation state holder.
//!
//! # Responsibility
//! - Own the live task snapshot and the clearable error/success signals.
//! - Execute user intents asynchronously on a single worker queue bound
//!   to the holder's lifetime.
//! - Manage the live-query subscription with a detach grace window.
//!
//! # Invariants
//! - Intent methods never return errors to the caller; failures surface
//!   only through `last_error`.
//! - The live query is subscribed only while at least one observer is
//!   attached, plus a short grace window after the last one detaches.
//! - Dropping the holder shuts down and joins both background threads.

use crate::model::task::Task;
use crate::repo::task_repo::TaskRepository;
use log::error;
use parking_lot::Mutex;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::mpsc::{channel, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

/// How long the live subscription survives after the last observer
/// detaches. Guards against rapid detach/attach cycles; not a
/// correctness requirement.
pub const DETACH_GRACE: Duration = Duration::from_secs(5);

const WATCH_POLL: Duration = Duration::from_millis(50);

enum Command {
    Insert(Task),
    Update(Task),
    Delete(Task),
    ToggleComplete(Task),
    DeleteCompleted,
}

enum WatchControl {
    Attach,
    Detach,
    Shutdown,
}

#[derive(Default)]
struct Signals {
    tasks: Mutex<Vec<Task>>,
    last_error: Mutex<Option<String>>,
    last_success: Mutex<Option<String>>,
}

impl Signals {
    fn set_error(&self, message: impl Into<String>) {
        *self.last_error.lock() = Some(message.into());
    }

    fn set_success(&self, message: impl Into<String>) {
        *self.last_success.lock() = Some(message.into());
    }
}

/// RAII guard marking one attached view observer.
///
/// Dropping the guard detaches; the subscription itself is torn down
/// only after [`DETACH_GRACE`] with no observers.
pub struct TaskObserver {
    control: Sender<WatchControl>,
}

impl Drop for TaskObserver {
    fn drop(&mut self) {
        let _ = self.control.send(WatchControl::Detach);
    }
}

/// State holder behind the single task-list screen.
///
/// Owns two background threads: a worker draining the intent queue and a
/// watcher mirroring live snapshots into `tasks`.
pub struct TaskListState {
    signals: Arc<Signals>,
    commands: Option<Sender<Command>>,
    control: Sender<WatchControl>,
    worker: Option<JoinHandle<()>>,
    watcher: Option<JoinHandle<()>>,
}

impl TaskListState {
    pub fn new<R>(repo: R) -> Self
    where
        R: TaskRepository + Send + Sync + 'static,
    {
        Self::with_detach_grace(repo, DETACH_GRACE)
    }

    /// Like [`TaskListState::new`] with an explicit grace window. Tests
    /// use short windows to exercise teardown without multi-second waits.
    pub fn with_detach_grace<R>(repo: R, grace: Duration) -> Self
    where
        R: TaskRepository + Send + Sync + 'static,
    {
        let repo = Arc::new(repo);
        let signals = Arc::new(Signals::default());

        let (command_tx, command_rx) = channel();
        let worker_repo = Arc::clone(&repo);
        let worker_signals = Arc::clone(&signals);
        let worker =
            std::thread::spawn(move || worker_loop(worker_repo, worker_signals, command_rx));

        let (control_tx, control_rx) = channel();
        let watcher_signals = Arc::clone(&signals);
        let watcher =
            std::thread::spawn(move || watcher_loop(repo, watcher_signals, control_rx, grace));

        Self {
            signals,
            commands: Some(command_tx),
            control: control_tx,
            worker: Some(worker),
            watcher: Some(watcher),
        }
    }

    /// Registers a view observer and ensures the live query is running.
    pub fn attach(&self) -> TaskObserver {
        let _ = self.control.send(WatchControl::Attach);
        TaskObserver {
            control: self.control.clone(),
        }
    }

    /// Current live snapshot. Empty until the first emission arrives.
    pub fn tasks(&self) -> Vec<Task> {
        self.signals.tasks.lock().clone()
    }

    pub fn last_error(&self) -> Option<String> {
        self.signals.last_error.lock().clone()
    }

    pub fn last_success(&self) -> Option<String> {
        self.signals.last_success.lock().clone()
    }

    /// Clears the error signal. Views call this after displaying the
    /// message so it does not redisplay on re-delivery.
    pub fn clear_error(&self) {
        *self.signals.last_error.lock() = None;
    }

    pub fn clear_success(&self) {
        *self.signals.last_success.lock() = None;
    }

    /// Validates and queues an insert. A blank title sets `last_error`
    /// without touching storage.
    pub fn insert(&self, task: Task) {
        if let Err(err) = task.validate() {
            self.signals.set_error(err.to_string());
            return;
        }
        self.submit(Command::Insert(task));
    }

    pub fn update(&self, task: Task) {
        self.submit(Command::Update(task));
    }

    pub fn delete(&self, task: Task) {
        self.submit(Command::Delete(task));
    }

    /// Queues an update with `is_completed` inverted. Silent on success,
    /// error signal on failure.
    pub fn toggle_complete(&self, task: Task) {
        self.submit(Command::ToggleComplete(task));
    }

    pub fn delete_completed(&self) {
        self.submit(Command::DeleteCompleted);
    }

    fn submit(&self, command: Command) {
        // Send can only fail mid-teardown; the caller gets no signal
        // either way, matching the fire-and-forget contract.
        if let Some(commands) = &self.commands {
            let _ = commands.send(command);
        }
    }
}

impl Drop for TaskListState {
    fn drop(&mut self) {
        // Dropping the sender lets the worker drain queued commands and
        // exit; the watcher stops on the shutdown message.
        drop(self.commands.take());
        let _ = self.control.send(WatchControl::Shutdown);

        if let Some(handle) = self.worker.take() {
            let _ = handle.join();
        }
        if let Some(handle) = self.watcher.take() {
            let _ = handle.join();
        }
    }
}

fn worker_loop<R: TaskRepository>(
    repo: Arc<R>,
    signals: Arc<Signals>,
    commands: Receiver<Command>,
) {
    for command in commands {
        let outcome = catch_unwind(AssertUnwindSafe(|| {
            run_command(repo.as_ref(), &signals, command)
        }));
        if outcome.is_err() {
            error!("event=task_command module=state status=panic");
            signals.set_error("unexpected error while processing the task operation");
        }
    }
}

fn run_command<R: TaskRepository>(repo: &R, signals: &Signals, command: Command) {
    match command {
        Command::Insert(task) => match repo.insert(&task) {
            Ok(_) => signals.set_success("Task added"),
            Err(err) => signals.set_error(err.to_string()),
        },
        Command::Update(task) => match repo.update(&task) {
            Ok(()) => signals.set_success("Task updated"),
            Err(err) => signals.set_error(err.to_string()),
        },
        Command::Delete(task) => match repo.delete(&task) {
            Ok(()) => signals.set_success("Task deleted"),
            Err(err) => signals.set_error(err.to_string()),
        },
        Command::ToggleComplete(task) => {
            if let Err(err) = repo.update(&task.toggled()) {
                signals.set_error(err.to_string());
            }
        }
        Command::DeleteCompleted => match repo.delete_completed() {
            Ok(count) => signals.set_success(format!("Deleted {count} completed tasks")),
            Err(err) => signals.set_error(err.to_string()),
        },
    }
}

fn watcher_loop<R: TaskRepository>(
    repo: Arc<R>,
    signals: Arc<Signals>,
    control: Receiver<WatchControl>,
    grace: Duration,
) {
    let mut observers: usize = 0;

    'resubscribe: loop {
        while observers == 0 {
            match control.recv() {
                Ok(WatchControl::Attach) => observers += 1,
                Ok(WatchControl::Detach) => {}
                Ok(WatchControl::Shutdown) | Err(_) => return,
            }
        }

        let watch = repo.watch_all();
        let mut idle_since: Option<Instant> = None;

        loop {
            loop {
                match control.try_recv() {
                    Ok(WatchControl::Attach) => {
                        observers += 1;
                        idle_since = None;
                    }
                    Ok(WatchControl::Detach) => {
                        observers = observers.saturating_sub(1);
                        if observers == 0 {
                            idle_since = Some(Instant::now());
                        }
                    }
                    Ok(WatchControl::Shutdown) | Err(TryRecvError::Disconnected) => return,
                    Err(TryRecvError::Empty) => break,
                }
            }

            if let Some(since) = idle_since {
                if since.elapsed() >= grace {
                    // Grace expired with no observers: drop the
                    // subscription and wait for the next attach.
                    continue 'resubscribe;
                }
            }

            match watch.recv_timeout(WATCH_POLL) {
                Ok(snapshot) => *signals.tasks.lock() = snapshot,
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => continue 'resubscribe,
            }
        }
    }
}
