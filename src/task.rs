//! Task data structure and status derivation.
//!
//! This module defines the `Task` record as it is persisted, together with the
//! pure functions that derive its display status from an explicit `now`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::fields::{Tab, TaskStatus};

/// Opaque task identifier, creation ordered.
pub type TaskId = u64;

/// A single to-do item.
///
/// Field names on disk are camelCase
/// (`{id, text, dueDate, completed, isDeleted}`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    pub text: String,
    #[serde(default, with = "iso_millis")]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub is_deleted: bool,
}

impl Task {
    /// Create a fresh, active, not completed task.
    pub fn new(id: TaskId, text: String, due_date: Option<DateTime<Utc>>) -> Self {
        Task {
            id,
            text,
            due_date,
            completed: false,
            is_deleted: false,
        }
    }
}

/// Derive the status of a task.
///
/// Completed short-circuits everything, so a completed task is never overdue.
pub fn status_of(task: &Task, now: DateTime<Utc>) -> TaskStatus {
    if task.completed {
        TaskStatus::Completed
    } else if task.due_date.is_some_and(|due| due < now) {
        TaskStatus::Overdue
    } else {
        TaskStatus::Pending
    }
}

/// Status label shown for a task in the given tab.
///
/// The trash view never labels a task overdue; it falls back to pending.
pub fn display_status(task: &Task, tab: Tab, now: DateTime<Utc>) -> TaskStatus {
    match (tab, status_of(task, now)) {
        (Tab::Trash, TaskStatus::Overdue) => TaskStatus::Pending,
        (_, status) => status,
    }
}

/// ISO-8601 UTC with millisecond precision, e.g. `2025-01-01T10:00:00.000Z`.
mod iso_millis {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(dt) => serializer.serialize_str(&dt.to_rfc3339_opts(SecondsFormat::Millis, true)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        match raw.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(s) => DateTime::parse_from_rfc3339(s)
                .map(|dt| Some(dt.with_timezone(&Utc)))
                .map_err(serde::de::Error::custom),
        }
    }
}
