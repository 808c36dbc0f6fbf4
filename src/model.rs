use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    OneOff,
    Tracker,
}

impl TaskKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "one_off" => Some(Self::OneOff),
            "tracker" => Some(Self::Tracker),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::OneOff => "one_off",
            Self::Tracker => "tracker",
        }
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Open,
    Done,
}

impl TaskStatus {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "open" => Some(Self::Open),
            "done" => Some(Self::Done),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Done => "done",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: TaskKind,
    pub status: TaskStatus,
    pub created_at: DateTime<Utc>,
    pub done_at: Option<DateTime<Utc>>,
}

impl Task {
    /// Build a fresh open task with a newly generated id.
    pub fn new(title: impl Into<String>, kind: TaskKind, now: DateTime<Utc>) -> Self {
        Self {
            id: new_id(),
            title: title.into(),
            kind,
            status: TaskStatus::Open,
            created_at: now,
            done_at: None,
        }
    }

    pub fn is_tracker(&self) -> bool {
        self.kind == TaskKind::Tracker
    }

    /// Returns display icon: ~=tracker, x=done, .=open
    pub fn icon(&self) -> &'static str {
        match (self.kind, self.status) {
            (TaskKind::Tracker, _) => "~",
            (TaskKind::OneOff, TaskStatus::Done) => "x",
            (TaskKind::OneOff, TaskStatus::Open) => ".",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Log {
    pub id: String,
    pub task_id: String,
    pub timestamp: DateTime<Utc>,
    pub note: String,
}

impl Log {
    pub fn new(task_id: impl Into<String>, timestamp: DateTime<Utc>, note: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            task_id: task_id.into(),
            timestamp,
            note: note.into(),
        }
    }
}

/// Random v4 UUIDs; ids are never handed out twice, so a deleted task's id
/// does not come back.
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}
