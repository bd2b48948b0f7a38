//! Transient user feedback emitted by the task store.

use crate::fields::NotificationKind;

/// A fire-and-forget message for the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub kind: NotificationKind,
    pub message: String,
}

impl Notification {
    pub fn success(message: impl Into<String>) -> Self {
        Notification {
            kind: NotificationKind::Success,
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Notification {
            kind: NotificationKind::Info,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Notification {
            kind: NotificationKind::Error,
            message: message.into(),
        }
    }
}

pub const TASK_ADDED: &str = "Added new task!";
pub const TASK_UPDATED: &str = "Task updated!";
pub const MOVED_TO_TRASH: &str = "Moved to trash";
pub const TASK_RESTORED: &str = "Task restored!";
pub const DELETED_PERMANENTLY: &str = "Deleted permanently";
pub const TRASH_EMPTIED: &str = "Trash emptied";
