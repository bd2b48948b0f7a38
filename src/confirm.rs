//! Two-phase confirmation for destructive operations.
//!
//! Phase one records what would be destroyed as a small payload and exposes a
//! title and message for the prompt. Phase two runs the store operation only
//! when the user confirms. At most one request is outstanding; a new request
//! replaces the previous one.

use tracing::debug;

use crate::db::KeyValueStore;
use crate::error::StoreError;
use crate::store::TaskStore;
use crate::task::TaskId;

/// The destructive action awaiting confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingAction {
    DeleteForever { id: TaskId },
    EmptyTrash,
}

impl PendingAction {
    pub fn title(&self) -> &'static str {
        match self {
            PendingAction::DeleteForever { .. } => "Delete Task?",
            PendingAction::EmptyTrash => "Empty Trash?",
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            PendingAction::DeleteForever { .. } => {
                "Are you sure you want to delete this task permanently? This action cannot be undone."
            }
            PendingAction::EmptyTrash => {
                "Warning: This will permanently delete ALL tasks in the trash."
            }
        }
    }
}

/// Result of a confirmed action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmOutcome {
    /// `false` if the task was already gone.
    Deleted(bool),
    TrashEmptied(usize),
}

/// Holder for the single outstanding confirmation request.
#[derive(Debug, Default)]
pub struct Confirmation {
    pending: Option<PendingAction>,
}

impl Confirmation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask for confirmation, discarding any earlier unanswered request.
    pub fn request(&mut self, action: PendingAction) -> PendingAction {
        if let Some(previous) = self.pending.replace(action) {
            debug!(?previous, ?action, "replacing pending confirmation");
        }
        action
    }

    pub fn pending(&self) -> Option<PendingAction> {
        self.pending
    }

    /// Dismiss the request. The store is not touched.
    pub fn cancel(&mut self) -> Option<PendingAction> {
        self.pending.take()
    }

    /// Run the pending action once. Returns `None` if nothing was pending.
    pub fn confirm<S: KeyValueStore>(
        &mut self,
        store: &mut TaskStore<S>,
    ) -> Result<Option<ConfirmOutcome>, StoreError> {
        let Some(action) = self.pending.take() else {
            return Ok(None);
        };
        let outcome = match action {
            PendingAction::DeleteForever { id } => ConfirmOutcome::Deleted(store.delete_forever(id)?),
            PendingAction::EmptyTrash => ConfirmOutcome::TrashEmptied(store.empty_trash()?),
        };
        Ok(Some(outcome))
    }
}
