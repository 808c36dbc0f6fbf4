use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use tracing::info;

use crate::model::{Log, Task, TaskKind, TaskStatus};
use crate::store::TaskStore;
use crate::validate::{normalize_note, validate_key, validate_title};

/// Pick the single record whose id equals `key`, or failing that the single
/// record whose id starts with it.
fn pick_by_key<T>(items: Vec<T>, key: &str, id_of: impl Fn(&T) -> &str, what: &str) -> Result<T> {
    let mut matches: Vec<T> = items
        .into_iter()
        .filter(|item| id_of(item).starts_with(key))
        .collect();
    if let Some(pos) = matches.iter().position(|item| id_of(item) == key) {
        return Ok(matches.swap_remove(pos));
    }
    match matches.len() {
        0 => bail!("{what} '{key}' not found"),
        1 => Ok(matches.remove(0)),
        n => bail!("{what} id prefix '{key}' is ambiguous ({n} matches)"),
    }
}

/// Look up a task by full id or unique id prefix.
pub fn resolve_task(store: &impl TaskStore, key: &str) -> Result<Task> {
    validate_key(key)?;
    if let Some(task) = store.get_task(key)? {
        return Ok(task);
    }
    pick_by_key(store.list_tasks()?, key, |t| t.id.as_str(), "task")
}

/// Look up a log by full id or unique id prefix.
pub fn resolve_log(store: &impl TaskStore, key: &str) -> Result<Log> {
    validate_key(key)?;
    if let Some(log) = store.get_log(key)? {
        return Ok(log);
    }
    pick_by_key(store.list_all_logs()?, key, |l| l.id.as_str(), "log")
}

/// Like [`resolve_task`], but only trackers qualify.
pub fn resolve_tracker(store: &impl TaskStore, key: &str) -> Result<Task> {
    let task = resolve_task(store, key)?;
    if !task.is_tracker() {
        bail!("'{}' is a one-off task, not a tracker", task.title);
    }
    Ok(task)
}

pub fn create_task(store: &impl TaskStore, title: &str, kind: TaskKind) -> Result<Task> {
    let title = validate_title(title)?;
    let task = Task::new(title, kind, Utc::now());
    store.add_task(&task)?;
    info!(task_id = %task.id, kind = %kind, "created task");
    Ok(task)
}

/// Mark a one-off task done. `done_at` is set once and never moved.
pub fn complete_task(store: &impl TaskStore, key: &str) -> Result<Task> {
    let mut task = resolve_task(store, key)?;
    if task.is_tracker() {
        bail!("'{}' is a tracker; log it instead of completing it", task.title);
    }
    if task.status == TaskStatus::Done {
        bail!("task '{}' is already done", task.title);
    }
    task.status = TaskStatus::Done;
    task.done_at = Some(Utc::now());
    store.update_task(&task)?;
    info!(task_id = %task.id, "completed task");
    Ok(task)
}

/// Delete a task together with all of its logs.
pub fn remove_task(store: &impl TaskStore, key: &str) -> Result<Task> {
    let task = resolve_task(store, key)?;
    store
        .delete_task(&task.id)
        .with_context(|| format!("failed to remove task '{}'", task.title))?;
    info!(task_id = %task.id, "removed task");
    Ok(task)
}

/// Append a log to a tracker. `at` defaults to now.
pub fn log_entry(
    store: &impl TaskStore,
    key: &str,
    note: &str,
    at: Option<DateTime<Utc>>,
) -> Result<Log> {
    let task = resolve_tracker(store, key)?;
    let log = Log::new(&task.id, at.unwrap_or_else(Utc::now), normalize_note(note));
    store.add_log(&log)?;
    info!(log_id = %log.id, task_id = %task.id, "logged tracker");
    Ok(log)
}

pub fn edit_log_note(store: &impl TaskStore, key: &str, note: &str) -> Result<Log> {
    let mut log = resolve_log(store, key)?;
    log.note = normalize_note(note);
    store.update_log(&log)?;
    Ok(log)
}

pub fn remove_log(store: &impl TaskStore, key: &str) -> Result<Log> {
    let log = resolve_log(store, key)?;
    store.delete_log(&log.id)?;
    info!(log_id = %log.id, "removed log");
    Ok(log)
}
