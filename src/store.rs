//! Durable storage for tasks and their logs.
//!
//! [`TaskStore`] is the only surface the rest of the crate uses to touch
//! persisted state. [`SqliteStore`] backs it with two tables and a
//! `task_id` index on `logs`; removing a task also removes its logs inside
//! the same transaction.

use rusqlite::{Connection, OptionalExtension, Row};
use tracing::debug;

use crate::db::{self, decode_time, encode_time};
use crate::error::{Collection, StoreError, StoreResult};
use crate::model::{Log, Task, TaskKind, TaskStatus};

/// Storage operations over the `tasks` and `logs` collections.
///
/// Listing methods return records in no particular order. Deletes of absent
/// ids are no-ops; inserts of existing ids fail with
/// [`StoreError::DuplicateKey`].
pub trait TaskStore {
    fn list_tasks(&self) -> StoreResult<Vec<Task>>;

    fn get_task(&self, id: &str) -> StoreResult<Option<Task>>;

    fn add_task(&self, task: &Task) -> StoreResult<()>;

    /// Replace the task with the same id, inserting it if absent.
    fn update_task(&self, task: &Task) -> StoreResult<()>;

    /// Remove the task and every log that references it.
    fn delete_task(&self, id: &str) -> StoreResult<()>;

    fn list_logs_for_task(&self, task_id: &str) -> StoreResult<Vec<Log>>;

    fn list_all_logs(&self) -> StoreResult<Vec<Log>>;

    fn get_log(&self, id: &str) -> StoreResult<Option<Log>>;

    fn add_log(&self, log: &Log) -> StoreResult<()>;

    /// Replace the log with the same id, inserting it if absent.
    fn update_log(&self, log: &Log) -> StoreResult<()>;

    fn delete_log(&self, id: &str) -> StoreResult<()>;

    /// Remove all logs of one task as a single transaction.
    fn delete_logs_for_task(&self, task_id: &str) -> StoreResult<()>;
}

const TASK_COLUMNS: &str = "id, title, kind, status, created_at, done_at";

const LOG_COLUMNS: &str = "id, task_id, timestamp, note";

const INSERT_TASK: &str = "
INSERT INTO tasks (id, title, kind, status, created_at, done_at)
VALUES (?1, ?2, ?3, ?4, ?5, ?6)
";

const UPSERT_TASK: &str = "
INSERT OR REPLACE INTO tasks (id, title, kind, status, created_at, done_at)
VALUES (?1, ?2, ?3, ?4, ?5, ?6)
";

const INSERT_LOG: &str = "
INSERT INTO logs (id, task_id, timestamp, note)
VALUES (?1, ?2, ?3, ?4)
";

const UPSERT_LOG: &str = "
INSERT OR REPLACE INTO logs (id, task_id, timestamp, note)
VALUES (?1, ?2, ?3, ?4)
";

fn conversion_error(idx: usize, value: &str, what: &str) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        idx,
        rusqlite::types::Type::Text,
        format!("invalid {what} '{value}'").into(),
    )
}

fn read_task_row(row: &Row) -> rusqlite::Result<Task> {
    let kind: String = row.get(2)?;
    let status: String = row.get(3)?;
    let created_at: String = row.get(4)?;
    let done_at: Option<String> = row.get(5)?;
    Ok(Task {
        id: row.get(0)?,
        title: row.get(1)?,
        kind: TaskKind::parse(&kind).ok_or_else(|| conversion_error(2, &kind, "task kind"))?,
        status: TaskStatus::parse(&status)
            .ok_or_else(|| conversion_error(3, &status, "task status"))?,
        created_at: decode_time(4, &created_at)?,
        done_at: done_at.map(|raw| decode_time(5, &raw)).transpose()?,
    })
}

fn read_log_row(row: &Row) -> rusqlite::Result<Log> {
    let timestamp: String = row.get(2)?;
    Ok(Log {
        id: row.get(0)?,
        task_id: row.get(1)?,
        timestamp: decode_time(2, &timestamp)?,
        note: row.get(3)?,
    })
}

fn write_task(conn: &Connection, sql: &str, task: &Task) -> rusqlite::Result<usize> {
    conn.execute(
        sql,
        rusqlite::params![
            task.id,
            task.title,
            task.kind.as_str(),
            task.status.as_str(),
            encode_time(&task.created_at),
            task.done_at.as_ref().map(encode_time),
        ],
    )
}

fn write_log(conn: &Connection, sql: &str, log: &Log) -> rusqlite::Result<usize> {
    conn.execute(
        sql,
        rusqlite::params![log.id, log.task_id, encode_time(&log.timestamp), log.note],
    )
}

fn count_logs(conn: &Connection, task_id: &str) -> rusqlite::Result<i64> {
    conn.query_row(
        "SELECT COUNT(*) FROM logs WHERE task_id = ?1",
        [task_id],
        |row| row.get(0),
    )
}

/// Delete a task's logs by id, then confirm through the index that none are
/// left. Runs on whatever transaction `conn` is inside; the caller commits.
fn purge_logs(conn: &Connection, task_id: &str) -> StoreResult<usize> {
    let ids: Vec<String> = {
        let mut stmt = conn.prepare_cached("SELECT id FROM logs WHERE task_id = ?1")?;
        let rows = stmt.query_map([task_id], |row| row.get(0))?;
        rows.collect::<rusqlite::Result<_>>()?
    };
    let mut removed = 0;
    {
        let mut stmt = conn.prepare_cached("DELETE FROM logs WHERE id = ?1")?;
        for id in &ids {
            removed += stmt.execute([id])?;
        }
    }
    let remaining = count_logs(conn, task_id)?;
    if remaining != 0 {
        return Err(StoreError::CascadeIncomplete {
            task_id: task_id.to_string(),
            remaining,
        });
    }
    Ok(removed)
}

/// SQLite-backed [`TaskStore`].
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open (creating if needed) the database at `path` and initialize the
    /// schema. The returned handle is ready for use.
    pub fn open(path: &str) -> StoreResult<Self> {
        let conn = db::open(path)?;
        db::init(&conn)?;
        debug!(path, "store opened");
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> StoreResult<Self> {
        Ok(Self {
            conn: db::open_memory()?,
        })
    }

    #[cfg(test)]
    fn connection(&self) -> &Connection {
        &self.conn
    }
}

impl TaskStore for SqliteStore {
    fn list_tasks(&self) -> StoreResult<Vec<Task>> {
        let mut stmt = self
            .conn
            .prepare_cached(&format!("SELECT {TASK_COLUMNS} FROM tasks"))?;
        let rows = stmt.query_map([], read_task_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    fn get_task(&self, id: &str) -> StoreResult<Option<Task>> {
        let task = self
            .conn
            .query_row(
                &format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = ?1"),
                [id],
                read_task_row,
            )
            .optional()?;
        Ok(task)
    }

    fn add_task(&self, task: &Task) -> StoreResult<()> {
        write_task(&self.conn, INSERT_TASK, task)
            .map_err(|e| StoreError::from_insert(e, Collection::Tasks, &task.id))?;
        debug!(task_id = %task.id, kind = %task.kind, "task added");
        Ok(())
    }

    fn update_task(&self, task: &Task) -> StoreResult<()> {
        write_task(&self.conn, UPSERT_TASK, task)?;
        debug!(task_id = %task.id, status = %task.status, "task updated");
        Ok(())
    }

    fn delete_task(&self, id: &str) -> StoreResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        let deleted = tx.execute("DELETE FROM tasks WHERE id = ?1", [id])?;
        let removed = purge_logs(&tx, id)?;
        tx.commit()?;
        debug!(task_id = %id, deleted, removed, "task deleted");
        Ok(())
    }

    fn list_logs_for_task(&self, task_id: &str) -> StoreResult<Vec<Log>> {
        let mut stmt = self
            .conn
            .prepare_cached(&format!("SELECT {LOG_COLUMNS} FROM logs WHERE task_id = ?1"))?;
        let rows = stmt.query_map([task_id], read_log_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    fn list_all_logs(&self) -> StoreResult<Vec<Log>> {
        let mut stmt = self
            .conn
            .prepare_cached(&format!("SELECT {LOG_COLUMNS} FROM logs"))?;
        let rows = stmt.query_map([], read_log_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    fn get_log(&self, id: &str) -> StoreResult<Option<Log>> {
        let log = self
            .conn
            .query_row(
                &format!("SELECT {LOG_COLUMNS} FROM logs WHERE id = ?1"),
                [id],
                read_log_row,
            )
            .optional()?;
        Ok(log)
    }

    fn add_log(&self, log: &Log) -> StoreResult<()> {
        write_log(&self.conn, INSERT_LOG, log)
            .map_err(|e| StoreError::from_insert(e, Collection::Logs, &log.id))?;
        debug!(log_id = %log.id, task_id = %log.task_id, "log added");
        Ok(())
    }

    fn update_log(&self, log: &Log) -> StoreResult<()> {
        write_log(&self.conn, UPSERT_LOG, log)?;
        debug!(log_id = %log.id, "log updated");
        Ok(())
    }

    fn delete_log(&self, id: &str) -> StoreResult<()> {
        let deleted = self.conn.execute("DELETE FROM logs WHERE id = ?1", [id])?;
        debug!(log_id = %id, deleted, "log deleted");
        Ok(())
    }

    fn delete_logs_for_task(&self, task_id: &str) -> StoreResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        let removed = purge_logs(&tx, task_id)?;
        tx.commit()?;
        debug!(task_id = %task_id, removed, "logs deleted");
        Ok(())
    }
}
