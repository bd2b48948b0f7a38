//! The task store: sole owner of the task collection.
//!
//! Every mutation is all-or-nothing against the in-memory collection and is
//! followed by a whole-collection write to the durable backend. A failed write
//! never undoes the mutation; the store stays dirty and the next write retries.

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::db::{load_tasks, save_tasks, KeyValueStore};
use crate::error::StoreError;
use crate::fields::Tab;
use crate::notify::{self, Notification};
use crate::task::{Task, TaskId};

/// In-memory task collection synchronised with a key-value backend.
#[derive(Debug)]
pub struct TaskStore<S: KeyValueStore> {
    backend: S,
    tasks: Vec<Task>,
    last_id: TaskId,
    notifications: Vec<Notification>,
    dirty: bool,
}

impl<S: KeyValueStore> TaskStore<S> {
    /// Load the collection from `backend`. Missing or corrupt data yields an empty store.
    pub fn open(backend: S) -> Self {
        let tasks = load_tasks(&backend);
        let last_id = tasks.iter().map(|t| t.id).max().unwrap_or(0);
        TaskStore {
            backend,
            tasks,
            last_id,
            notifications: Vec::new(),
            dirty: false,
        }
    }

    /// All tasks in storage order (most recently added first).
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn get(&self, id: TaskId) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    fn get_mut(&mut self, id: TaskId) -> Result<&mut Task, StoreError> {
        self.tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or(StoreError::NotFound(id))
    }

    pub fn backend(&self) -> &S {
        &self.backend
    }

    /// True while the latest state has not reached the backend.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Drain pending notifications, oldest first.
    pub fn take_notifications(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.notifications)
    }

    /// Active tasks not yet completed.
    pub fn pending_count(&self) -> usize {
        self.tasks
            .iter()
            .filter(|t| !t.is_deleted && !t.completed)
            .count()
    }

    pub fn trash_count(&self) -> usize {
        self.tasks.iter().filter(|t| t.is_deleted).count()
    }

    /// Create a task and put it at the front of the collection.
    pub fn add(&mut self, text: &str, due_date: Option<DateTime<Utc>>) -> Result<Task, StoreError> {
        let text = validate_text(text)?;
        let id = self.next_id(Utc::now());
        let task = Task::new(id, text, due_date);
        self.tasks.insert(0, task.clone());
        info!(id, "task added");
        self.persist();
        self.notify(Notification::success(notify::TASK_ADDED));
        Ok(task)
    }

    /// Replace text and due date of a task.
    pub fn edit(
        &mut self,
        id: TaskId,
        text: &str,
        due_date: Option<DateTime<Utc>>,
    ) -> Result<Task, StoreError> {
        if self.get(id).is_none() {
            return Err(StoreError::NotFound(id));
        }
        let text = validate_text(text)?;
        let task = self.get_mut(id)?;
        task.text = text;
        task.due_date = due_date;
        let updated = task.clone();
        info!(id, "task updated");
        self.persist();
        self.notify(Notification::success(notify::TASK_UPDATED));
        Ok(updated)
    }

    /// Flip the completed flag.
    pub fn toggle_complete(&mut self, id: TaskId) -> Result<Task, StoreError> {
        let task = self.get_mut(id)?;
        task.completed = !task.completed;
        let updated = task.clone();
        info!(id, completed = updated.completed, "task toggled");
        self.persist();
        Ok(updated)
    }

    /// Move a task to the trash. Completion and due date are kept.
    pub fn trash(&mut self, id: TaskId) -> Result<(), StoreError> {
        self.get_mut(id)?.is_deleted = true;
        info!(id, "task moved to trash");
        self.persist();
        self.notify(Notification::info(notify::MOVED_TO_TRASH));
        Ok(())
    }

    /// Bring a task back from the trash.
    pub fn restore(&mut self, id: TaskId) -> Result<(), StoreError> {
        self.get_mut(id)?.is_deleted = false;
        info!(id, "task restored");
        self.persist();
        self.notify(Notification::success(notify::TASK_RESTORED));
        Ok(())
    }

    /// Remove a task for good.
    ///
    /// Returns `false` without touching anything if the id is already gone.
    pub fn delete_forever(&mut self, id: TaskId) -> Result<bool, StoreError> {
        let Some(idx) = self.tasks.iter().position(|t| t.id == id) else {
            debug!(id, "delete of missing task ignored");
            return Ok(false);
        };
        self.tasks.remove(idx);
        info!(id, "task deleted permanently");
        self.persist();
        self.notify(Notification::success(notify::DELETED_PERMANENTLY));
        Ok(true)
    }

    /// Remove every trashed task, returning how many went.
    pub fn empty_trash(&mut self) -> Result<usize, StoreError> {
        let before = self.tasks.len();
        self.tasks.retain(|t| !t.is_deleted);
        let removed = before - self.tasks.len();
        info!(removed, "trash emptied");
        self.persist();
        self.notify(Notification::success(notify::TRASH_EMPTIED));
        Ok(removed)
    }

    /// Tasks visible in `tab`, earliest due date first, undated last.
    ///
    /// The sort is stable so equal keys keep collection order.
    pub fn list_view(&self, tab: Tab) -> Vec<&Task> {
        let mut view: Vec<&Task> = self
            .tasks
            .iter()
            .filter(|t| tab.includes(t.is_deleted))
            .collect();
        view.sort_by_key(|t| (t.due_date.is_none(), t.due_date));
        view
    }

    /// Retry writing the collection if the last write failed.
    pub fn flush(&mut self) -> Result<(), StoreError> {
        if self.dirty {
            save_tasks(&mut self.backend, &self.tasks)?;
            self.dirty = false;
        }
        Ok(())
    }

    /// Creation-ordered id, millisecond based while the clock moves forward.
    ///
    /// Once `last_id` is `TaskId::MAX` ordering is given up and the smallest
    /// free id is used instead.
    fn next_id(&mut self, now: DateTime<Utc>) -> TaskId {
        let Some(after_last) = self.last_id.checked_add(1) else {
            return self.smallest_free_id();
        };
        let millis = u64::try_from(now.timestamp_millis()).unwrap_or(0);
        let id = millis.max(after_last);
        self.last_id = id;
        id
    }

    fn smallest_free_id(&self) -> TaskId {
        let mut used: Vec<TaskId> = self.tasks.iter().map(|t| t.id).collect();
        used.sort_unstable();
        let mut candidate = 1;
        for id in used {
            if id == candidate {
                candidate += 1;
            } else if id > candidate {
                break;
            }
        }
        candidate
    }

    fn persist(&mut self) {
        match save_tasks(&mut self.backend, &self.tasks) {
            Ok(()) => self.dirty = false,
            Err(e) => {
                warn!(error = %e, "failed to save tasks, keeping in-memory state");
                self.dirty = true;
                self.notify(Notification::error(format!("Failed to save tasks: {e}")));
            }
        }
    }

    fn notify(&mut self, notification: Notification) {
        self.notifications.push(notification);
    }
}

fn validate_text(text: &str) -> Result<String, StoreError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(StoreError::EmptyText);
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{MemoryStore, STORAGE_KEY};
    use crate::fields::{NotificationKind, TaskStatus};
    use crate::task::status_of;
    use chrono::{Duration, TimeZone};

    fn store() -> TaskStore<MemoryStore> {
        TaskStore::open(MemoryStore::new())
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 5, 1, 12, 0, 0).unwrap()
    }

    fn ids(view: &[&Task]) -> Vec<TaskId> {
        view.iter().map(|t| t.id).collect()
    }

    #[test]
    fn add_rejects_empty_text() {
        let mut s = store();
        for text in ["", "   ", "\t\n"] {
            let err = s.add(text, Some(t0())).unwrap_err();
            assert!(matches!(err, StoreError::EmptyText));
        }
        assert!(s.tasks().is_empty());
        assert!(s.take_notifications().is_empty());
        assert_eq!(s.backend().raw(STORAGE_KEY), None);
    }

    #[test]
    fn add_creates_active_task_sorted_after_dated_ones() {
        let mut s = store();
        s.add("Dated", Some(t0())).unwrap();
        let milk = s.add("Buy milk", None).unwrap();
        assert_eq!(milk.text, "Buy milk");
        assert_eq!(milk.due_date, None);
        assert!(!milk.completed);
        assert!(!milk.is_deleted);

        let view = s.list_view(Tab::Active);
        assert_eq!(view.last().map(|t| t.id), Some(milk.id));
        assert_eq!(
            s.take_notifications(),
            vec![
                Notification::success(notify::TASK_ADDED),
                Notification::success(notify::TASK_ADDED)
            ]
        );
    }

    #[test]
    fn add_prepends_and_ids_are_unique_and_increasing() {
        let mut s = store();
        let a = s.add("a", None).unwrap();
        let b = s.add("b", None).unwrap();
        let c = s.add("c", None).unwrap();
        assert!(a.id < b.id && b.id < c.id);
        let order: Vec<TaskId> = s.tasks().iter().map(|t| t.id).collect();
        assert_eq!(order, vec![c.id, b.id, a.id]);
    }

    #[test]
    fn ids_keep_increasing_after_reload() {
        let mut s = store();
        let a = s.add("a", None).unwrap();
        let mut reopened = TaskStore::open(s.backend().clone());
        let b = reopened.add("b", None).unwrap();
        assert!(b.id > a.id);
    }

    #[test]
    fn add_after_maximum_id_on_disk_stays_unique() {
        let raw = format!(r#"[{{"id":{},"text":"x","dueDate":null}},{{"id":1,"text":"one"}}]"#, TaskId::MAX);
        let mut s = TaskStore::open(MemoryStore::with_value(STORAGE_KEY, &raw));
        let a = s.add("a", None).unwrap();
        let b = s.add("b", None).unwrap();
        assert_eq!(a.id, 2);
        assert_eq!(b.id, 3);
        let mut ids: Vec<TaskId> = s.tasks().iter().map(|t| t.id).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 4);
    }

    #[test]
    fn edit_replaces_text_and_due_date() {
        let mut s = store();
        let task = s.add("Draft", None).unwrap();
        s.take_notifications();
        let due = Some(t0() + Duration::days(1));
        let updated = s.edit(task.id, "  Final  ", due).unwrap();
        assert_eq!(updated.text, "Final");
        assert_eq!(updated.due_date, due);
        assert_eq!(s.get(task.id), Some(&updated));
        assert_eq!(
            s.take_notifications(),
            vec![Notification::success(notify::TASK_UPDATED)]
        );
    }

    #[test]
    fn edit_with_empty_text_leaves_task_unchanged() {
        let mut s = store();
        let task = s.add("Keep me", Some(t0())).unwrap();
        let err = s.edit(task.id, "  ", None).unwrap_err();
        assert!(err.is_validation());
        assert_eq!(s.get(task.id), Some(&task));
    }

    #[test]
    fn mutations_on_missing_id_are_not_found() {
        let mut s = store();
        assert!(s.edit(42, "x", None).unwrap_err().is_not_found());
        assert!(s.toggle_complete(42).unwrap_err().is_not_found());
        assert!(s.trash(42).unwrap_err().is_not_found());
        assert!(s.restore(42).unwrap_err().is_not_found());
        assert!(!s.delete_forever(42).unwrap());
        assert!(s.take_notifications().is_empty());
    }

    #[test]
    fn toggle_clears_overdue_status() {
        let mut s = store();
        let task = s.add("Late", Some(t0() - Duration::hours(1))).unwrap();
        assert_eq!(status_of(&task, t0()), TaskStatus::Overdue);
        let done = s.toggle_complete(task.id).unwrap();
        assert_eq!(status_of(&done, t0()), TaskStatus::Completed);
        let reopened = s.toggle_complete(task.id).unwrap();
        assert_eq!(status_of(&reopened, t0()), TaskStatus::Overdue);
    }

    #[test]
    fn trash_and_restore_round_trip_without_field_loss() {
        let mut s = store();
        let task = s.add("Round trip", Some(t0())).unwrap();
        let task = s.toggle_complete(task.id).unwrap();

        s.trash(task.id).unwrap();
        assert!(!ids(&s.list_view(Tab::Active)).contains(&task.id));
        assert!(ids(&s.list_view(Tab::Trash)).contains(&task.id));
        let trashed = s.get(task.id).unwrap();
        assert!(trashed.completed);
        assert_eq!(trashed.due_date, task.due_date);

        s.restore(task.id).unwrap();
        assert!(ids(&s.list_view(Tab::Active)).contains(&task.id));
        assert!(!ids(&s.list_view(Tab::Trash)).contains(&task.id));
        assert_eq!(s.get(task.id), Some(&task));
    }

    #[test]
    fn delete_forever_is_permanent() {
        let mut s = store();
        let task = s.add("Gone", None).unwrap();
        s.trash(task.id).unwrap();
        assert!(s.delete_forever(task.id).unwrap());
        assert!(s.restore(task.id).unwrap_err().is_not_found());
        assert!(s.list_view(Tab::Active).is_empty());
        assert!(s.list_view(Tab::Trash).is_empty());

        let reloaded = TaskStore::open(s.backend().clone());
        assert!(reloaded.get(task.id).is_none());
    }

    #[test]
    fn list_view_orders_by_due_date_with_undated_last() {
        let mut s = store();
        let plus1 = s.add("+1h", Some(t0() + Duration::hours(1))).unwrap();
        let plus3 = s.add("+3h", Some(t0() + Duration::hours(3))).unwrap();
        let none = s.add("none", None).unwrap();
        let minus1 = s.add("-1h", Some(t0() - Duration::hours(1))).unwrap();

        let view = s.list_view(Tab::Active);
        assert_eq!(ids(&view), vec![minus1.id, plus1.id, plus3.id, none.id]);
        assert_eq!(status_of(view[0], t0()), TaskStatus::Overdue);
        assert_eq!(status_of(view[2], t0()), TaskStatus::Pending);
    }

    #[test]
    fn list_view_ties_keep_collection_order() {
        let mut s = store();
        let first = s.add("first", None).unwrap();
        let second = s.add("second", None).unwrap();
        let same_a = s.add("a", Some(t0())).unwrap();
        let same_b = s.add("b", Some(t0())).unwrap();
        let view = s.list_view(Tab::Active);
        // Collection order is newest first.
        assert_eq!(ids(&view), vec![same_b.id, same_a.id, second.id, first.id]);
    }

    #[test]
    fn list_view_does_not_mutate() {
        let mut s = store();
        s.add("b", Some(t0() + Duration::hours(2))).unwrap();
        s.add("a", Some(t0() + Duration::hours(1))).unwrap();
        let before = s.tasks().to_vec();
        let _ = s.list_view(Tab::Active);
        let _ = s.list_view(Tab::Trash);
        assert_eq!(s.tasks(), before.as_slice());
    }

    #[test]
    fn empty_trash_removes_only_trashed() {
        let mut s = store();
        let keep = s.add("keep", None).unwrap();
        let t1 = s.add("t1", None).unwrap();
        let t2 = s.add("t2", None).unwrap();
        s.trash(t1.id).unwrap();
        s.trash(t2.id).unwrap();
        let later = s.add("later", None).unwrap();

        assert_eq!(s.empty_trash().unwrap(), 2);
        let remaining: Vec<TaskId> = s.tasks().iter().map(|t| t.id).collect();
        assert_eq!(remaining, vec![later.id, keep.id]);
        assert_eq!(s.trash_count(), 0);
        assert_eq!(s.empty_trash().unwrap(), 0);
    }

    #[test]
    fn every_mutation_is_persisted() {
        let mut s = store();
        let a = s.add("a", None).unwrap();
        let b = s.add("b", Some(t0())).unwrap();
        s.toggle_complete(a.id).unwrap();
        s.trash(b.id).unwrap();

        let reloaded = TaskStore::open(s.backend().clone());
        assert_eq!(reloaded.tasks(), s.tasks());
    }

    #[test]
    fn failed_write_keeps_memory_state_and_retries() {
        let mut s = store();
        let a = s.add("a", None).unwrap();
        s.take_notifications();

        let mut failing = s.backend().clone();
        failing.set_fail_writes(true);
        let mut s = TaskStore::open(failing);
        let b = s.add("b", None).unwrap();
        assert!(s.is_dirty());
        assert_eq!(s.tasks().len(), 2);
        let notes = s.take_notifications();
        assert_eq!(notes[0].kind, NotificationKind::Error);
        assert_eq!(notes[1], Notification::success(notify::TASK_ADDED));

        assert!(s.flush().is_err());
        s.backend.set_fail_writes(false);
        s.flush().unwrap();
        assert!(!s.is_dirty());

        let reloaded = TaskStore::open(s.backend().clone());
        let ids: Vec<TaskId> = reloaded.tasks().iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![b.id, a.id]);
    }

    #[test]
    fn counts() {
        let mut s = store();
        let a = s.add("a", None).unwrap();
        let b = s.add("b", None).unwrap();
        s.add("c", None).unwrap();
        s.toggle_complete(a.id).unwrap();
        s.trash(b.id).unwrap();
        assert_eq!(s.pending_count(), 1);
        assert_eq!(s.trash_count(), 1);
    }

    #[test]
    fn next_id_follows_clock_but_never_repeats() {
        let mut s = store();
        let id1 = s.next_id(t0());
        let id2 = s.next_id(t0());
        assert_eq!(id1, t0().timestamp_millis() as u64);
        assert_eq!(id2, id1 + 1);
        assert_eq!(s.next_id(t0() - Duration::days(1)), id1 + 2);
    }
}
