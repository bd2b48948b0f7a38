//! Add/edit form for a task: text and optional due date.

use chrono::{DateTime, Utc};

use crate::{
    due::{format_due_input, parse_due_input},
    error::StoreError,
    task::Task,
    tui::input::InputField,
};

/// Field order in the form.
pub const TEXT_FIELD: usize = 0;
pub const DUE_FIELD: usize = 1;
const FIELD_COUNT: usize = 2;

/// Task form for creating or editing a task.
#[derive(Debug, Default)]
pub struct TaskForm {
    pub text: InputField,
    pub due: InputField,
    pub current_field: usize,
    /// Due date of the task being edited and the text it was shown as.
    original_due: Option<(String, DateTime<Utc>)>,
}

impl TaskForm {
    /// Create an empty form.
    pub fn new() -> Self {
        let mut form = Self::default();
        form.update_active_field();
        form
    }

    /// Create a form pre-filled from an existing task.
    pub fn from_task(task: &Task) -> Self {
        let due_text = format_due_input(task.due_date);
        let mut form = TaskForm {
            text: InputField::with_value(&task.text),
            due: InputField::with_value(&due_text),
            current_field: TEXT_FIELD,
            original_due: task.due_date.map(|due| (due_text, due)),
        };
        form.update_active_field();
        form
    }

    pub fn next_field(&mut self) {
        self.current_field = (self.current_field + 1) % FIELD_COUNT;
        self.update_active_field();
    }

    pub fn prev_field(&mut self) {
        self.current_field = (self.current_field + FIELD_COUNT - 1) % FIELD_COUNT;
        self.update_active_field();
    }

    /// Mark only the current field as active.
    pub fn update_active_field(&mut self) {
        self.text.active = self.current_field == TEXT_FIELD;
        self.due.active = self.current_field == DUE_FIELD;
    }

    /// The field receiving keystrokes.
    pub fn current_mut(&mut self) -> &mut InputField {
        match self.current_field {
            DUE_FIELD => &mut self.due,
            _ => &mut self.text,
        }
    }

    pub fn current(&self) -> &InputField {
        match self.current_field {
            DUE_FIELD => &self.due,
            _ => &self.text,
        }
    }

    pub fn handle_char(&mut self, c: char) {
        self.current_mut().handle_char(c);
    }

    pub fn handle_backspace(&mut self) {
        self.current_mut().handle_backspace();
    }

    pub fn handle_delete(&mut self) {
        self.current_mut().handle_delete();
    }

    pub fn handle_left_right(&mut self, right: bool) {
        if right {
            self.current_mut().move_cursor_right();
        } else {
            self.current_mut().move_cursor_left();
        }
    }

    /// Validate the form into text and an absolute due date.
    ///
    /// An untouched due field yields the task's exact stored instant, not the
    /// minute-rounded value the field displays.
    pub fn parse(&self, now: DateTime<Utc>) -> Result<(String, Option<DateTime<Utc>>), StoreError> {
        if self.text.value.trim().is_empty() {
            return Err(StoreError::EmptyText);
        }
        let due = match &self.original_due {
            Some((shown, due)) if *shown == self.due.value => Some(*due),
            _ => parse_due_input(&self.due.value, now)?,
        };
        Ok((self.text.value.clone(), due))
    }
}
