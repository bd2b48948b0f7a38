//! Enumerations shared between the store, the CLI and the TUI.
//!
//! Task status and the view tabs live here along with the notification kinds
//! the store emits for transient feedback.

use clap::ValueEnum;

/// Which partition of the collection a view shows.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq, Default)]
pub enum Tab {
    #[default]
    Active,
    Trash,
}

impl Tab {
    /// Whether a task with the given trashed flag belongs to this tab.
    pub fn includes(self, is_deleted: bool) -> bool {
        match self {
            Tab::Active => !is_deleted,
            Tab::Trash => is_deleted,
        }
    }

    /// The other tab.
    pub fn toggled(self) -> Self {
        match self {
            Tab::Active => Tab::Trash,
            Tab::Trash => Tab::Active,
        }
    }
}

/// Derived task status. Never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    Pending,
    Completed,
    Overdue,
}

/// Severity of a transient notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Success,
    Info,
    Error,
}

/// Format a tab for display.
pub fn format_tab(tab: Tab) -> &'static str {
    match tab {
        Tab::Active => "Tasks",
        Tab::Trash => "Trash",
    }
}

/// Format a task status badge for display.
pub fn format_status(s: TaskStatus) -> &'static str {
    match s {
        TaskStatus::Pending => "Pending",
        TaskStatus::Completed => "Checked",
        TaskStatus::Overdue => "Overdue",
    }
}

/// Page heading for a tab; the task tab carries the pending count.
pub fn format_heading(tab: Tab, pending: usize) -> String {
    match (tab, pending) {
        (Tab::Active, 0) => "My Tasks".to_string(),
        (Tab::Active, n) => format!("({n}) My Tasks"),
        (Tab::Trash, _) => "Trash".to_string(),
    }
}
