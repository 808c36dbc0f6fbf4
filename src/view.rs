//! Read-only projections over the task and log collections.
//!
//! Everything here is recomputed from scratch on each reload; nothing is
//! cached between calls and nothing writes back to the store.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::Serialize;

use crate::error::StoreResult;
use crate::model::{Log, Task, TaskKind, TaskStatus};
use crate::store::TaskStore;

/// Map each task id to the timestamp of its latest log. Tasks without logs
/// have no entry. Equal timestamps keep whichever log was seen first, which
/// makes no observable difference since only the timestamp is returned.
pub fn last_log_per_task(logs: &[Log]) -> HashMap<String, DateTime<Utc>> {
    let mut latest: HashMap<String, DateTime<Utc>> = HashMap::new();
    for log in logs {
        match latest.get_mut(&log.task_id) {
            Some(ts) if log.timestamp > *ts => *ts = log.timestamp,
            Some(_) => {}
            None => {
                latest.insert(log.task_id.clone(), log.timestamp);
            }
        }
    }
    latest
}

/// Sort logs latest first; ties fall back to id so output is stable.
pub fn sort_latest_first(logs: &mut [Log]) {
    logs.sort_by(|a, b| {
        b.timestamp
            .cmp(&a.timestamp)
            .then_with(|| a.id.cmp(&b.id))
    });
}

/// Logs sharing one calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayGroup {
    pub date: NaiveDate,
    pub logs: Vec<Log>,
}

/// Partition logs by the calendar day of their timestamp in `tz`.
///
/// Groups appear in the order their day is first seen and each group keeps
/// the input order of its members, so a latest-first input yields
/// latest-day-first groups.
pub fn group_by_day<Tz: TimeZone>(logs: &[Log], tz: &Tz) -> Vec<DayGroup> {
    let mut groups: Vec<DayGroup> = Vec::new();
    let mut index: HashMap<NaiveDate, usize> = HashMap::new();
    for log in logs {
        let date = log.timestamp.with_timezone(tz).date_naive();
        match index.get(&date) {
            Some(&i) => groups[i].logs.push(log.clone()),
            None => {
                index.insert(date, groups.len());
                groups.push(DayGroup {
                    date,
                    logs: vec![log.clone()],
                });
            }
        }
    }
    groups
}

/// The default view: open one-off tasks and every tracker. Completed
/// one-off tasks appear in neither list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveItems {
    pub pending_one_off: Vec<Task>,
    pub trackers: Vec<Task>,
}

pub fn partition_active(tasks: Vec<Task>) -> ActiveItems {
    let mut items = ActiveItems::default();
    for task in tasks {
        match (task.kind, task.status) {
            (TaskKind::Tracker, _) => items.trackers.push(task),
            (TaskKind::OneOff, TaskStatus::Open) => items.pending_one_off.push(task),
            (TaskKind::OneOff, TaskStatus::Done) => {}
        }
    }
    items
}

/// Snapshot of everything the main screen shows.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Board {
    #[serde(flatten)]
    pub items: ActiveItems,
    pub last_logged: HashMap<String, DateTime<Utc>>,
}

impl Board {
    /// Re-read both collections and derive the board from them.
    pub fn load(store: &impl TaskStore) -> StoreResult<Self> {
        let tasks = store.list_tasks()?;
        let logs = store.list_all_logs()?;
        let mut items = partition_active(tasks);
        sort_by_creation(&mut items.pending_one_off);
        sort_by_creation(&mut items.trackers);
        Ok(Self {
            items,
            last_logged: last_log_per_task(&logs),
        })
    }

    pub fn last_logged(&self, task_id: &str) -> Option<DateTime<Utc>> {
        self.last_logged.get(task_id).copied()
    }
}

fn sort_by_creation(tasks: &mut [Task]) {
    tasks.sort_by(|a, b| {
        a.created_at
            .cmp(&b.created_at)
            .then_with(|| a.id.cmp(&b.id))
    });
}

/// One tracker's logs, latest first, grouped by day in `tz`.
pub fn tracker_history<Tz: TimeZone>(
    store: &impl TaskStore,
    task_id: &str,
    tz: &Tz,
) -> StoreResult<Vec<DayGroup>> {
    let mut logs = store.list_logs_for_task(task_id)?;
    sort_latest_first(&mut logs);
    Ok(group_by_day(&logs, tz))
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, FixedOffset};

    use super::*;
    use crate::store::SqliteStore;

    fn at(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    fn log(id: &str, task_id: &str, ts: &str) -> Log {
        Log {
            id: id.to_string(),
            task_id: task_id.to_string(),
            timestamp: at(ts),
            note: String::new(),
        }
    }

    fn task(id: &str, kind: TaskKind, status: TaskStatus, created: &str) -> Task {
        Task {
            id: id.to_string(),
            title: id.to_uppercase(),
            kind,
            status,
            created_at: at(created),
            done_at: None,
        }
    }

    #[test]
    fn last_log_picks_latest_regardless_of_order() {
        let logs = vec![
            log("b", "t1", "2024-01-02T09:00:00Z"),
            log("c", "t1", "2024-01-03T09:00:00Z"),
            log("a", "t1", "2024-01-01T09:00:00Z"),
            log("d", "t2", "2023-12-31T23:00:00Z"),
        ];
        let map = last_log_per_task(&logs);
        assert_eq!(map.len(), 2);
        assert_eq!(map["t1"], at("2024-01-03T09:00:00Z"));
        assert_eq!(map["t2"], at("2023-12-31T23:00:00Z"));
    }

    #[test]
    fn last_log_absent_for_unlogged_task() {
        let logs = vec![log("a", "t1", "2024-01-01T09:00:00Z")];
        let map = last_log_per_task(&logs);
        assert!(!map.contains_key("t2"));
        assert!(last_log_per_task(&[]).is_empty());
    }

    #[test]
    fn last_log_tie_returns_shared_timestamp() {
        let logs = vec![
            log("a", "t1", "2024-01-01T09:00:00Z"),
            log("b", "t1", "2024-01-01T09:00:00Z"),
        ];
        assert_eq!(last_log_per_task(&logs)["t1"], at("2024-01-01T09:00:00Z"));
    }

    #[test]
    fn grouping_partitions_into_distinct_days() {
        let mut logs = Vec::new();
        let base = at("2024-03-01T06:00:00Z");
        // 4 days, 3 logs each, spaced 4 hours apart within the day.
        for day in 0..4 {
            for slot in 0..3 {
                let ts = base + Duration::days(day) + Duration::hours(slot * 4);
                logs.push(Log {
                    id: format!("{day}-{slot}"),
                    task_id: "t1".into(),
                    timestamp: ts,
                    note: String::new(),
                });
            }
        }
        sort_latest_first(&mut logs);
        let groups = group_by_day(&logs, &Utc);

        assert_eq!(groups.len(), 4);
        assert_eq!(groups.iter().map(|g| g.logs.len()).sum::<usize>(), 12);
        for group in &groups {
            assert!(group
                .logs
                .iter()
                .all(|l| l.timestamp.date_naive() == group.date));
            assert!(group
                .logs
                .windows(2)
                .all(|w| w[0].timestamp >= w[1].timestamp));
        }
        let dates: Vec<_> = groups.iter().map(|g| g.date).collect();
        let mut sorted = dates.clone();
        sorted.sort_by(|a, b| b.cmp(a));
        assert_eq!(dates, sorted);
    }

    #[test]
    fn grouping_uses_given_timezone() {
        // 23:30 UTC is already the next day at UTC+2.
        let logs = vec![
            log("late", "t1", "2024-01-01T23:30:00Z"),
            log("early", "t1", "2024-01-01T08:00:00Z"),
        ];
        assert_eq!(group_by_day(&logs, &Utc).len(), 1);

        let plus_two = FixedOffset::east_opt(2 * 3600).unwrap();
        let groups = group_by_day(&logs, &plus_two);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].date, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
        assert_eq!(groups[1].date, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
    }

    #[test]
    fn partition_drops_done_one_offs() {
        let tasks = vec![
            task("open", TaskKind::OneOff, TaskStatus::Open, "2024-01-01T00:00:00Z"),
            task("done", TaskKind::OneOff, TaskStatus::Done, "2024-01-01T00:00:00Z"),
            task("habit", TaskKind::Tracker, TaskStatus::Open, "2024-01-01T00:00:00Z"),
            task("odd", TaskKind::Tracker, TaskStatus::Done, "2024-01-01T00:00:00Z"),
        ];
        let items = partition_active(tasks);
        let pending: Vec<_> = items.pending_one_off.iter().map(|t| t.id.as_str()).collect();
        let trackers: Vec<_> = items.trackers.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(pending, vec!["open"]);
        assert_eq!(trackers, vec!["habit", "odd"]);
    }

    #[test]
    fn board_reload_reflects_store() {
        let store = SqliteStore::open_in_memory().unwrap();
        store
            .add_task(&task("b", TaskKind::Tracker, TaskStatus::Open, "2024-01-02T00:00:00Z"))
            .unwrap();
        store
            .add_task(&task("a", TaskKind::Tracker, TaskStatus::Open, "2024-01-01T00:00:00Z"))
            .unwrap();
        store
            .add_task(&task("x", TaskKind::OneOff, TaskStatus::Open, "2024-01-01T00:00:00Z"))
            .unwrap();
        store.add_log(&log("l1", "b", "2024-01-05T10:00:00Z")).unwrap();

        let board = Board::load(&store).unwrap();
        let trackers: Vec<_> = board.items.trackers.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(trackers, vec!["a", "b"]);
        assert_eq!(board.items.pending_one_off.len(), 1);
        assert_eq!(board.last_logged("b"), Some(at("2024-01-05T10:00:00Z")));
        assert_eq!(board.last_logged("a"), None);
    }

    #[test]
    fn history_is_latest_first_by_day() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.add_log(&log("l1", "t1", "2024-01-01T09:00:00Z")).unwrap();
        store.add_log(&log("l2", "t1", "2024-01-02T09:00:00Z")).unwrap();
        store.add_log(&log("l3", "t1", "2024-01-02T18:00:00Z")).unwrap();
        store.add_log(&log("x", "t2", "2024-01-03T09:00:00Z")).unwrap();

        let days = tracker_history(&store, "t1", &Utc).unwrap();
        assert_eq!(days.len(), 2);
        assert_eq!(days[0].date, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
        let first: Vec<_> = days[0].logs.iter().map(|l| l.id.as_str()).collect();
        assert_eq!(first, vec!["l3", "l2"]);
        assert_eq!(days[1].logs.len(), 1);
    }
}
