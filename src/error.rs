use std::fmt;

use thiserror::Error;

/// Logical collections held by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    Tasks,
    Logs,
}

impl Collection {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Tasks => "tasks",
            Self::Logs => "logs",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failures surfaced by [`crate::store::TaskStore`].
///
/// Deleting an absent record is not an error, so there is no `NotFound`.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{collection} already contains a record with id '{id}'")]
    DuplicateKey { collection: Collection, id: String },

    #[error("deleting logs of task '{task_id}' left {remaining} log(s) behind; nothing was removed")]
    CascadeIncomplete { task_id: String, remaining: i64 },

    #[error("database schema version {found} is newer than supported version {supported}")]
    IncompatibleSchema { found: i64, supported: i64 },

    #[error("storage unavailable: {0}")]
    StorageUnavailable(#[from] rusqlite::Error),
}

impl StoreError {
    /// Classify an insert failure: key collisions become `DuplicateKey`,
    /// everything else is a storage fault. `id` is the only unique column.
    pub(crate) fn from_insert(err: rusqlite::Error, collection: Collection, id: &str) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(e, _)
                if matches!(
                    e.extended_code,
                    rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
                        | rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                ) =>
            {
                Self::DuplicateKey {
                    collection,
                    id: id.to_string(),
                }
            }
            _ => Self::StorageUnavailable(err),
        }
    }
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;
