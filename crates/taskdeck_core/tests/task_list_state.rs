use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use taskdeck_core::{
    DbResult, Priority, RepoResult, StoreTaskRepository, Task, TaskFilter, TaskId, TaskListState,
    TaskRepository, TaskStore, TaskWatch,
};

fn fixture() -> (Arc<TaskStore>, TaskListState) {
    let store = Arc::new(TaskStore::open_in_memory().unwrap());
    store.delete_all().unwrap();
    let repo = StoreTaskRepository::new(Arc::clone(&store));
    (store, TaskListState::new(repo))
}

fn wait_until(what: &str, mut cond: impl FnMut() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        if cond() {
            return;
        }
        thread::sleep(Duration::from_millis(10));
    }
    panic!("timed out waiting for {what}");
}

#[test]
fn insert_sets_success_and_persists() {
    let (store, state) = fixture();

    state.insert(Task::new("write tests"));

    wait_until("insert success signal", || {
        state.last_success().as_deref() == Some("Task added")
    });
    assert_eq!(store.list(&TaskFilter::All).unwrap().len(), 1);
    assert!(state.last_error().is_none());
}

#[test]
fn blank_title_never_reaches_storage() {
    let (store, state) = fixture();

    state.insert(Task::new("   \t"));

    let error = state.last_error().expect("blank title must set an error");
    assert!(error.contains("blank"), "message was: {error}");

    // The intent was rejected before submission; give the worker a beat
    // and confirm nothing changed.
    thread::sleep(Duration::from_millis(100));
    assert!(store.list(&TaskFilter::All).unwrap().is_empty());
    assert!(state.last_success().is_none());
}

#[test]
fn attached_observer_sees_live_snapshot() {
    let (_store, state) = fixture();
    let _observer = state.attach();

    state.insert(Task::new("first"));
    wait_until("first task in snapshot", || state.tasks().len() == 1);

    state.insert(Task::new("second"));
    wait_until("second task in snapshot", || state.tasks().len() == 2);
    assert_eq!(state.tasks()[0].title, "second", "newest task lists first");
}

#[test]
fn snapshot_stays_empty_without_observers() {
    let (store, state) = fixture();

    state.insert(Task::new("invisible"));
    wait_until("insert success signal", || state.last_success().is_some());

    assert_eq!(store.list(&TaskFilter::All).unwrap().len(), 1);
    assert!(
        state.tasks().is_empty(),
        "live query must not run without an attached observer"
    );
}

#[test]
fn update_and_delete_report_success() {
    let (store, state) = fixture();

    let id = store.insert(&Task::new("draft")).unwrap();
    let mut task = store.get_by_id(id).unwrap().unwrap();

    task.title = "final".to_string();
    state.update(task.clone());
    wait_until("update success signal", || {
        state.last_success().as_deref() == Some("Task updated")
    });
    state.clear_success();

    state.delete(task);
    wait_until("delete success signal", || {
        state.last_success().as_deref() == Some("Task deleted")
    });
    assert!(store.get_by_id(id).unwrap().is_none());
}

#[test]
fn toggle_complete_is_silent_on_success() {
    let (store, state) = fixture();

    let id = store.insert(&Task::new("flip me")).unwrap();
    let task = store.get_by_id(id).unwrap().unwrap();

    state.toggle_complete(task);
    wait_until("toggle to apply", || {
        store.get_by_id(id).unwrap().unwrap().is_completed
    });
    assert!(state.last_success().is_none(), "toggle success is silent");
    assert!(state.last_error().is_none());
}

#[test]
fn toggle_complete_on_missing_id_sets_error() {
    let (_store, state) = fixture();

    let mut ghost = Task::new("ghost");
    ghost.id = 555;
    state.toggle_complete(ghost);

    wait_until("toggle error signal", || state.last_error().is_some());
    let error = state.last_error().unwrap();
    assert!(error.contains("555"), "message was: {error}");
}

#[test]
fn delete_completed_reports_removed_count() {
    let (store, state) = fixture();

    for title in ["done a", "done b"] {
        let id = store.insert(&Task::new(title)).unwrap();
        let task = store.get_by_id(id).unwrap().unwrap();
        store.update(&task.toggled()).unwrap();
    }
    store.insert(&Task::new("still open")).unwrap();

    state.delete_completed();
    wait_until("bulk delete success signal", || {
        state.last_success().as_deref() == Some("Deleted 2 completed tasks")
    });
    assert_eq!(store.list(&TaskFilter::All).unwrap().len(), 1);
}

#[test]
fn signals_are_clearable() {
    let (_store, state) = fixture();

    state.insert(Task::new(""));
    assert!(state.last_error().is_some());
    state.clear_error();
    assert!(state.last_error().is_none());

    state.insert(Task::new("real task"));
    wait_until("insert success signal", || state.last_success().is_some());
    state.clear_success();
    assert!(state.last_success().is_none());
}

/// Store-backed repository that panics on a marker title. Everything
/// else delegates, so the state holder runs against real storage.
struct ExplodingRepo {
    inner: StoreTaskRepository,
}

impl TaskRepository for ExplodingRepo {
    fn insert(&self, task: &Task) -> RepoResult<TaskId> {
        if task.title == "boom" {
            panic!("injected repository failure");
        }
        self.inner.insert(task)
    }

    fn update(&self, task: &Task) -> RepoResult<()> {
        self.inner.update(task)
    }

    fn delete(&self, task: &Task) -> RepoResult<()> {
        self.inner.delete(task)
    }

    fn delete_completed(&self) -> RepoResult<usize> {
        self.inner.delete_completed()
    }

    fn delete_all(&self) -> RepoResult<()> {
        self.inner.delete_all()
    }

    fn get_by_id(&self, id: TaskId) -> DbResult<Option<Task>> {
        self.inner.get_by_id(id)
    }

    fn list(&self, filter: &TaskFilter) -> DbResult<Vec<Task>> {
        self.inner.list(filter)
    }

    fn watch_all(&self) -> TaskWatch {
        self.inner.watch_all()
    }

    fn watch_by_status(&self, is_completed: bool) -> TaskWatch {
        self.inner.watch_by_status(is_completed)
    }

    fn watch_by_priority(&self, priority: Priority) -> TaskWatch {
        self.inner.watch_by_priority(priority)
    }
}

#[test]
fn panicking_command_sets_generic_error_and_worker_survives() {
    let store = Arc::new(TaskStore::open_in_memory().unwrap());
    store.delete_all().unwrap();
    let repo = ExplodingRepo {
        inner: StoreTaskRepository::new(Arc::clone(&store)),
    };
    let state = TaskListState::new(repo);

    state.insert(Task::new("boom"));
    wait_until("generic error signal", || state.last_error().is_some());
    let error = state.last_error().unwrap();
    assert!(error.contains("unexpected error"), "message was: {error}");
    assert!(store.list(&TaskFilter::All).unwrap().is_empty());

    // The worker outlives the panic and keeps draining the queue.
    state.insert(Task::new("after the bang"));
    wait_until("insert success signal", || {
        state.last_success().as_deref() == Some("Task added")
    });
    assert_eq!(store.list(&TaskFilter::All).unwrap().len(), 1);
}

#[test]
fn reattach_within_grace_reuses_live_subscription() {
    let store = Arc::new(TaskStore::open_in_memory().unwrap());
    store.delete_all().unwrap();
    let repo = StoreTaskRepository::new(Arc::clone(&store));
    let state = TaskListState::with_detach_grace(repo, Duration::from_secs(30));

    let observer = state.attach();
    store.insert(&Task::new("first")).unwrap();
    wait_until("snapshot while attached", || state.tasks().len() == 1);

    // Detach, but stay well inside the grace window: the subscription
    // keeps mirroring writes.
    drop(observer);
    store.insert(&Task::new("during grace")).unwrap();
    wait_until("snapshot during grace window", || state.tasks().len() == 2);

    // Re-attach reuses the live subscription; the snapshot is already
    // current and keeps tracking further writes.
    let _observer = state.attach();
    assert_eq!(state.tasks().len(), 2);
    store.insert(&Task::new("after re-attach")).unwrap();
    wait_until("snapshot after re-attach", || state.tasks().len() == 3);
}

#[test]
fn subscription_tears_down_after_detach_grace() {
    let store = Arc::new(TaskStore::open_in_memory().unwrap());
    store.delete_all().unwrap();
    let repo = StoreTaskRepository::new(Arc::clone(&store));
    let state = TaskListState::with_detach_grace(repo, Duration::from_millis(150));

    let observer = state.attach();
    store.insert(&Task::new("seen")).unwrap();
    wait_until("snapshot while attached", || state.tasks().len() == 1);

    drop(observer);
    thread::sleep(Duration::from_millis(600));

    // Grace expired: writes no longer reach the stale snapshot.
    store.insert(&Task::new("unseen")).unwrap();
    thread::sleep(Duration::from_millis(300));
    assert_eq!(state.tasks().len(), 1);

    // Re-attach after the window re-subscribes from scratch.
    let _observer = state.attach();
    wait_until("fresh snapshot after re-attach", || state.tasks().len() == 2);
}
