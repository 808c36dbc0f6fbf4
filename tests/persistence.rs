use chrono::{DateTime, NaiveDate, Utc};

use trackmaster::view::{last_log_per_task, partition_active, tracker_history};
use trackmaster::{Log, SqliteStore, StoreError, Task, TaskKind, TaskStatus, TaskStore};

fn at(s: &str) -> DateTime<Utc> {
    s.parse().unwrap()
}

fn db_path(dir: &tempfile::TempDir) -> String {
    dir.path()
        .join("trackmaster.db")
        .to_str()
        .unwrap()
        .to_string()
}

#[test]
fn tracker_scenario_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = db_path(&dir);

    {
        let store = SqliteStore::open(&path).unwrap();
        let mut tracker = Task::new("Drink water", TaskKind::Tracker, at("2023-12-31T12:00:00Z"));
        tracker.id = "t1".into();
        store.add_task(&tracker).unwrap();

        let mut l1 = Log::new("t1", at("2024-01-01T09:00:00Z"), "");
        l1.id = "L1".into();
        let mut l2 = Log::new("t1", at("2024-01-02T09:00:00Z"), "after run");
        l2.id = "L2".into();
        store.add_log(&l1).unwrap();
        store.add_log(&l2).unwrap();
    }

    // A fresh handle sees everything the first one wrote.
    let store = SqliteStore::open(&path).unwrap();
    let last = last_log_per_task(&store.list_all_logs().unwrap());
    assert_eq!(last["t1"], at("2024-01-02T09:00:00Z"));

    let days = tracker_history(&store, "t1", &Utc).unwrap();
    assert_eq!(days.len(), 2);
    assert_eq!(days[0].date, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
    assert_eq!(days[1].date, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
    assert!(days.iter().all(|d| d.logs.len() == 1));

    store.delete_task("t1").unwrap();
    drop(store);

    let store = SqliteStore::open(&path).unwrap();
    assert!(store.list_logs_for_task("t1").unwrap().is_empty());
    assert!(store.list_tasks().unwrap().is_empty());
}

#[test]
fn one_off_scenario() {
    let dir = tempfile::tempdir().unwrap();
    let store = SqliteStore::open(&db_path(&dir)).unwrap();

    let mut task = Task::new("Renew passport", TaskKind::OneOff, Utc::now());
    store.add_task(&task).unwrap();
    let items = partition_active(store.list_tasks().unwrap());
    assert_eq!(items.pending_one_off.len(), 1);
    assert_eq!(items.pending_one_off[0].id, task.id);

    task.status = TaskStatus::Done;
    task.done_at = Some(Utc::now());
    store.update_task(&task).unwrap();

    let items = partition_active(store.list_tasks().unwrap());
    assert!(items.pending_one_off.is_empty());
    assert!(items.trackers.is_empty());
}

#[test]
fn duplicate_ids_are_rejected_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let store = SqliteStore::open(&db_path(&dir)).unwrap();
    let task = Task::new("Once", TaskKind::OneOff, Utc::now());
    store.add_task(&task).unwrap();
    assert!(matches!(
        store.add_task(&task),
        Err(StoreError::DuplicateKey { .. })
    ));
    assert_eq!(store.list_tasks().unwrap(), vec![task]);
}
