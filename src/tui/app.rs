//! Main application logic for the terminal user interface.
//!
//! This module contains the `App` struct which manages the TUI state,
//! handles user input, renders the interface, and coordinates between
//! the task list, the add/edit form and the confirmation dialog. All task
//! changes go through the `TaskStore`; the app only holds view state.

use std::io;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use ratatui::{
    backend::Backend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState, Tabs, Wrap},
    Frame, Terminal,
};
use tracing::{debug, warn};

use crate::{
    confirm::{ConfirmOutcome, Confirmation, PendingAction},
    db::KeyValueStore,
    due::{format_due, format_due_relative},
    error::StoreError,
    fields::{format_heading, format_status, format_tab, NotificationKind, Tab, TaskStatus},
    notify::Notification,
    store::TaskStore,
    task::{display_status, TaskId},
    ticker::RefreshTicker,
    tui::{
        colors::{ACCENT_BLUE, DARK_RED, EMERALD, ROSE, SLATE},
        enums::{AppState, InputMode},
        task_form::{TaskForm, DUE_FIELD, TEXT_FIELD},
        utils::centered_rect,
    },
};

/// How long a toast stays in the status bar.
const TOAST_DURATION: Duration = Duration::from_secs(3);
/// Upper bound on how long we block waiting for a key.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// A notification on screen and when it appeared.
struct Toast {
    notification: Notification,
    shown_at: Instant,
}

/// Main application state for the terminal user interface.
pub struct App<S: KeyValueStore> {
    state: AppState,
    store: TaskStore<S>,
    tab: Tab,
    task_list_state: TableState,
    visible_tasks: Vec<TaskId>,
    selected_task: Option<TaskId>,
    task_form: TaskForm,
    input_mode: InputMode,
    status_message: String,
    toast: Option<Toast>,
    confirmation: Confirmation,
    ticker: RefreshTicker,
    now: DateTime<Utc>,
}

impl<S: KeyValueStore> App<S> {
    /// Create a new App over an opened store.
    pub fn new(store: TaskStore<S>, refresh: Duration) -> Self {
        let mut app = App {
            state: AppState::TaskList,
            store,
            tab: Tab::Active,
            task_list_state: TableState::default(),
            visible_tasks: Vec::new(),
            selected_task: None,
            task_form: TaskForm::new(),
            input_mode: InputMode::None,
            status_message: String::new(),
            toast: None,
            confirmation: Confirmation::new(),
            ticker: RefreshTicker::new(refresh, Instant::now()),
            now: Utc::now(),
        };
        app.update_visible_tasks();
        app
    }

    /// Recompute the visible list for the current tab, keeping the selection when possible.
    fn update_visible_tasks(&mut self) {
        let old_selected_id = self.selected_id();

        self.visible_tasks = self
            .store
            .list_view(self.tab)
            .iter()
            .map(|t| t.id)
            .collect();

        let restored = old_selected_id
            .and_then(|old_id| self.visible_tasks.iter().position(|&id| id == old_id));
        let fallback = self.task_list_state.selected().map(|idx| {
            idx.min(self.visible_tasks.len().saturating_sub(1))
        });
        self.task_list_state.select(if self.visible_tasks.is_empty() {
            None
        } else {
            restored.or(fallback).or(Some(0))
        });
    }

    fn selected_id(&self) -> Option<TaskId> {
        self.task_list_state
            .selected()
            .and_then(|idx| self.visible_tasks.get(idx))
            .copied()
    }

    fn select_task(&mut self, id: TaskId) {
        if let Some(idx) = self.visible_tasks.iter().position(|&t| t == id) {
            self.task_list_state.select(Some(idx));
        }
    }

    fn set_status_message(&mut self, msg: String) {
        self.status_message = msg;
    }

    fn clear_status_message(&mut self) {
        self.status_message.clear();
    }

    /// Sample the clock once for this evaluation pass.
    fn refresh_now(&mut self) {
        self.now = Utc::now();
    }

    /// Move store notifications into the toast slot; the newest wins.
    fn collect_notifications(&mut self, at: Instant) {
        for notification in self.store.take_notifications() {
            match notification.kind {
                NotificationKind::Error => warn!(text = %notification.message, "store reported an error"),
                _ => debug!(text = %notification.message, "notification"),
            }
            self.toast = Some(Toast {
                notification,
                shown_at: at,
            });
        }
    }

    fn expire_toast(&mut self, at: Instant) {
        if self
            .toast
            .as_ref()
            .is_some_and(|t| at.saturating_duration_since(t.shown_at) >= TOAST_DURATION)
        {
            self.toast = None;
        }
    }

    fn after_mutation(&mut self) {
        self.collect_notifications(Instant::now());
        self.update_visible_tasks();
    }

    fn report_error(&mut self, e: &StoreError) {
        if e.is_not_found() {
            self.update_visible_tasks();
        }
        let prefix = if e.is_validation() { "Invalid input" } else { "Error" };
        self.set_status_message(format!("{prefix}: {e}"));
    }

    fn switch_tab(&mut self, tab: Tab) {
        if self.tab != tab {
            self.tab = tab;
            self.task_list_state.select(None);
            self.update_visible_tasks();
        }
    }

    fn heading(&self) -> String {
        format_heading(self.tab, self.store.pending_count())
    }

    fn move_selection(&mut self, down: bool) {
        if self.visible_tasks.is_empty() {
            return;
        }
        let next = match self.task_list_state.selected() {
            Some(selected) if down => (selected + 1).min(self.visible_tasks.len() - 1),
            Some(selected) => selected.saturating_sub(1),
            None => 0,
        };
        self.task_list_state.select(Some(next));
    }

    /// Handle one key press. Returns true if the application should quit.
    pub fn handle_key(&mut self, key: KeyCode, modifiers: KeyModifiers) -> bool {
        self.clear_status_message();
        self.refresh_now();

        match self.state {
            AppState::TaskList => self.handle_task_list_input(key, modifiers),
            AppState::AddTask => self.handle_form_input(key, false),
            AppState::EditTask => self.handle_form_input(key, true),
            AppState::Help => self.handle_help_input(key),
            AppState::Confirm => self.handle_confirm_input(key),
        }
    }

    /// Handle keyboard input when in the task list view.
    fn handle_task_list_input(&mut self, key: KeyCode, modifiers: KeyModifiers) -> bool {
        match key {
            KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => return true,
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Tab | KeyCode::BackTab => self.switch_tab(self.tab.toggled()),
            KeyCode::Char('1') => self.switch_tab(Tab::Active),
            KeyCode::Char('2') => self.switch_tab(Tab::Trash),
            KeyCode::Up | KeyCode::Char('k') => self.move_selection(false),
            KeyCode::Down | KeyCode::Char('j') => self.move_selection(true),
            KeyCode::Char('h') | KeyCode::F(1) => self.state = AppState::Help,
            _ => match self.tab {
                Tab::Active => self.handle_active_tab_input(key),
                Tab::Trash => self.handle_trash_tab_input(key),
            },
        }
        false
    }

    fn handle_active_tab_input(&mut self, key: KeyCode) {
        match key {
            KeyCode::Char('a') => {
                self.task_form = TaskForm::new();
                self.state = AppState::AddTask;
                self.input_mode = InputMode::Text;
            }
            KeyCode::Char('e') => {
                let Some(task) = self.selected_id().and_then(|id| self.store.get(id)) else {
                    return;
                };
                if task.completed {
                    self.set_status_message("Completed tasks cannot be edited".to_string());
                    return;
                }
                self.selected_task = Some(task.id);
                self.task_form = TaskForm::from_task(task);
                self.state = AppState::EditTask;
                self.input_mode = InputMode::Text;
            }
            KeyCode::Char(' ') | KeyCode::Char('c') | KeyCode::Enter => {
                if let Some(id) = self.selected_id() {
                    if let Err(e) = self.store.toggle_complete(id) {
                        self.report_error(&e);
                    }
                    self.after_mutation();
                }
            }
            KeyCode::Char('d') | KeyCode::Delete => {
                if let Some(id) = self.selected_id() {
                    if let Err(e) = self.store.trash(id) {
                        self.report_error(&e);
                    }
                    self.after_mutation();
                }
            }
            _ => {}
        }
    }

    fn handle_trash_tab_input(&mut self, key: KeyCode) {
        match key {
            KeyCode::Char('r') => {
                if let Some(id) = self.selected_id() {
                    if let Err(e) = self.store.restore(id) {
                        self.report_error(&e);
                    }
                    self.after_mutation();
                }
            }
            KeyCode::Char('d') | KeyCode::Delete => {
                if let Some(id) = self.selected_id() {
                    self.confirmation.request(PendingAction::DeleteForever { id });
                    self.state = AppState::Confirm;
                }
            }
            KeyCode::Char('E') => {
                if self.store.trash_count() == 0 {
                    self.set_status_message("Trash is empty.".to_string());
                } else {
                    self.confirmation.request(PendingAction::EmptyTrash);
                    self.state = AppState::Confirm;
                }
            }
            _ => {}
        }
    }

    /// Handle keyboard input when in task creation or editing forms.
    fn handle_form_input(&mut self, key: KeyCode, is_edit: bool) -> bool {
        match key {
            KeyCode::Esc => {
                self.state = AppState::TaskList;
                self.input_mode = InputMode::None;
            }
            KeyCode::Tab | KeyCode::Down => self.task_form.next_field(),
            KeyCode::BackTab | KeyCode::Up => self.task_form.prev_field(),
            KeyCode::Left => self.task_form.handle_left_right(false),
            KeyCode::Right => self.task_form.handle_left_right(true),
            KeyCode::Backspace => self.task_form.handle_backspace(),
            KeyCode::Delete => self.task_form.handle_delete(),
            KeyCode::Enter => self.submit_form(is_edit),
            KeyCode::Char(c) => self.task_form.handle_char(c),
            _ => {}
        }
        false
    }

    /// Validate the form and hand it to the store. The form stays open on error.
    fn submit_form(&mut self, is_edit: bool) {
        let (text, due) = match self.task_form.parse(self.now) {
            Ok(parsed) => parsed,
            Err(StoreError::EmptyText) => {
                self.set_status_message("Task text is required".to_string());
                return;
            }
            Err(e) => {
                self.report_error(&e);
                return;
            }
        };

        let result = if is_edit {
            match self.selected_task {
                Some(id) => self.store.edit(id, &text, due),
                None => {
                    self.set_status_message("No task selected".to_string());
                    return;
                }
            }
        } else {
            self.store.add(&text, due)
        };

        match result {
            Ok(task) => {
                self.state = AppState::TaskList;
                self.input_mode = InputMode::None;
                self.after_mutation();
                self.select_task(task.id);
            }
            Err(e) => self.report_error(&e),
        }
    }

    /// Handle keyboard input in the confirmation dialog.
    fn handle_confirm_input(&mut self, key: KeyCode) -> bool {
        match key {
            KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                match self.confirmation.confirm(&mut self.store) {
                    Ok(Some(ConfirmOutcome::Deleted(false))) => {
                        self.set_status_message("Task was already deleted".to_string());
                    }
                    Ok(_) => {}
                    Err(e) => self.report_error(&e),
                }
                self.state = AppState::TaskList;
                self.after_mutation();
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                self.confirmation.cancel();
                self.state = AppState::TaskList;
            }
            _ => {}
        }
        false
    }

    fn handle_help_input(&mut self, key: KeyCode) -> bool {
        if matches!(key, KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('h')) {
            self.state = AppState::TaskList;
        }
        false
    }

    /// Poll for and handle keyboard events. Returns true if the application should quit.
    fn handle_input(&mut self) -> io::Result<bool> {
        let timeout = POLL_INTERVAL.min(self.ticker.remaining(Instant::now()));
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    return Ok(self.handle_key(key.code, key.modifiers));
                }
            }
        }
        Ok(false)
    }

    fn status_row(&self, task_id: TaskId) -> Option<Row<'static>> {
        let task = self.store.get(task_id)?;
        let status = display_status(task, self.tab, self.now);
        let style = match status {
            TaskStatus::Completed => Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::CROSSED_OUT),
            TaskStatus::Overdue => Style::default().fg(ROSE).add_modifier(Modifier::BOLD),
            TaskStatus::Pending => Style::default().fg(Color::White),
        };
        let relative = if task.completed {
            String::new()
        } else {
            format_due_relative(task.due_date, self.now)
        };
        Some(
            Row::new(vec![
                Cell::from(format_status(status)),
                Cell::from(format_due(task.due_date)),
                Cell::from(relative),
                Cell::from(task.text.clone()),
            ])
            .style(style),
        )
    }

    /// Render the heading, tab bar and task table.
    fn render_task_list(&mut self, f: &mut Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Heading
                Constraint::Length(3), // Tabs
                Constraint::Min(0),    // Table
            ])
            .split(area);

        let tab_color = match self.tab {
            Tab::Active => ACCENT_BLUE,
            Tab::Trash => DARK_RED,
        };

        let header_text = vec![Line::from(vec![
            Span::styled("TASK MANAGEMENT", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw("  "),
            Span::styled(
                self.heading(),
                Style::default().fg(Color::Cyan).add_modifier(Modifier::ITALIC),
            ),
        ])];
        let header_block = Paragraph::new(header_text)
            .block(Block::default().borders(Borders::ALL))
            .alignment(Alignment::Center);
        f.render_widget(header_block, chunks[0]);

        let titles = vec![
            format_tab(Tab::Active).to_string(),
            format!("{} ({})", format_tab(Tab::Trash), self.store.trash_count()),
        ];
        let selected_tab = match self.tab {
            Tab::Active => 0,
            Tab::Trash => 1,
        };
        let tabs = Tabs::new(titles)
            .select(selected_tab)
            .block(Block::default().borders(Borders::ALL))
            .highlight_style(Style::default().fg(tab_color).add_modifier(Modifier::BOLD));
        f.render_widget(tabs, chunks[1]);

        if self.visible_tasks.is_empty() {
            let placeholder = match self.tab {
                Tab::Active => "No tasks available.",
                Tab::Trash => "Trash is empty.",
            };
            let empty = Paragraph::new(vec![Line::from(""), Line::from(placeholder)])
                .style(Style::default().fg(Color::Gray))
                .alignment(Alignment::Center)
                .block(Block::default().borders(Borders::ALL));
            f.render_widget(empty, chunks[2]);
            return;
        }

        let header_cells = ["Status", "Due", "", "Task"]
            .iter()
            .map(|h| Cell::from(*h).style(Style::default().add_modifier(Modifier::BOLD)));
        let header = Row::new(header_cells)
            .style(Style::default().bg(tab_color).fg(Color::White))
            .height(1);

        let rows: Vec<Row> = self
            .visible_tasks
            .iter()
            .filter_map(|&id| self.status_row(id))
            .collect();

        let widths = [
            Constraint::Length(9),  // Status
            Constraint::Length(19), // Due
            Constraint::Length(10), // Relative
            Constraint::Min(20),    // Text
        ];

        let mut title = format!(
            "{} ({}) - Press 'h' for help",
            format_tab(self.tab),
            self.visible_tasks.len()
        );
        if self.tab == Tab::Trash {
            title.push_str(" - 'E' to empty trash");
        }

        let table = Table::new(rows, widths)
            .header(header)
            .block(Block::default().borders(Borders::ALL).title(title))
            .row_highlight_style(Style::default().bg(Color::Gray).fg(Color::Black))
            .highlight_symbol(">> ");

        f.render_stateful_widget(table, chunks[2], &mut self.task_list_state);
    }

    /// Render the add/edit form as a popup.
    fn render_task_form(&mut self, f: &mut Frame, area: Rect, is_edit: bool) {
        let area = centered_rect(60, 50, area);
        f.render_widget(Clear, area);

        let block = Block::default()
            .title(if is_edit { "Edit Task" } else { "Add Task" })
            .borders(Borders::ALL)
            .border_style(Style::default().fg(ACCENT_BLUE));
        let inner = block.inner(area);
        f.render_widget(block, area);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Text
                Constraint::Length(3), // Due
                Constraint::Min(1),    // Instructions
            ])
            .split(inner);

        let focus = |field: usize| {
            if self.task_form.current_field == field {
                Style::default().fg(ACCENT_BLUE)
            } else {
                Style::default()
            }
        };

        let text_input = Paragraph::new(self.task_form.text.value.as_str()).block(
            Block::default()
                .borders(Borders::ALL)
                .title("Task *")
                .border_style(focus(TEXT_FIELD)),
        );
        f.render_widget(text_input, chunks[0]);

        let due_input = Paragraph::new(self.task_form.due.value.as_str()).block(
            Block::default()
                .borders(Borders::ALL)
                .title("Due (optional)")
                .border_style(focus(DUE_FIELD)),
        );
        f.render_widget(due_input, chunks[1]);

        let instructions = Paragraph::new(vec![
            Line::from("Enter to save  Tab to switch field  Esc to cancel"),
            Line::from("Due: YYYY-MM-DD HH:MM, YYYY-MM-DD, today, tomorrow, in 3h, in 2d"),
        ])
        .style(Style::default().fg(Color::Gray))
        .wrap(Wrap { trim: true });
        f.render_widget(instructions, chunks[2]);

        if self.input_mode != InputMode::Text {
            return;
        }
        let chunk = if self.task_form.current_field == DUE_FIELD {
            chunks[1]
        } else {
            chunks[0]
        };
        let cursor = u16::try_from(self.task_form.current().cursor).unwrap_or(u16::MAX);
        f.set_cursor_position((
            chunk.x.saturating_add(cursor).saturating_add(1),
            chunk.y + 1,
        ));
    }

    /// Render the help screen with keyboard shortcuts.
    fn render_help(&mut self, f: &mut Frame, area: Rect) {
        let bold = Style::default().add_modifier(Modifier::BOLD);
        let help_text = vec![
            Line::from(vec![Span::styled("Task Manager Help", bold)]),
            Line::from(""),
            Line::from(vec![Span::styled("Everywhere in the list:", bold)]),
            Line::from("  Tab / 1 / 2  Switch between Tasks and Trash"),
            Line::from("  Up/k Down/j  Navigate tasks"),
            Line::from("  h/F1         Show this help"),
            Line::from("  q/Esc/Ctrl+C Quit"),
            Line::from(""),
            Line::from(vec![Span::styled("Tasks tab:", bold)]),
            Line::from("  a            Add new task"),
            Line::from("  e            Edit selected task (not when completed)"),
            Line::from("  Space/c      Toggle completed"),
            Line::from("  d/Delete     Move to trash"),
            Line::from(""),
            Line::from(vec![Span::styled("Trash tab:", bold)]),
            Line::from("  r            Restore selected task"),
            Line::from("  d/Delete     Delete permanently (asks first)"),
            Line::from("  E            Empty trash (asks first)"),
            Line::from(""),
            Line::from(vec![Span::styled("Due Date Formats:", bold)]),
            Line::from("  YYYY-MM-DD HH:MM  Specific time (e.g., 2025-12-25 18:00)"),
            Line::from("  YYYY-MM-DD        End of that day"),
            Line::from("  today, tomorrow   End of that day"),
            Line::from("  in 30m, in 3h, in 2d, in 1w"),
        ];

        let paragraph = Paragraph::new(help_text)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title("Help - Press Esc to return"),
            )
            .wrap(Wrap { trim: true });

        f.render_widget(paragraph, area);
    }

    /// Render the confirmation dialog for the pending destructive action.
    fn render_confirm(&mut self, f: &mut Frame, area: Rect) {
        let Some(action) = self.confirmation.pending() else {
            return;
        };
        let block = Block::default()
            .title(action.title())
            .borders(Borders::ALL)
            .style(Style::default().bg(DARK_RED));

        let area = centered_rect(50, 30, area);
        f.render_widget(Clear, area);

        let text = vec![
            Line::from(""),
            Line::from(vec![Span::styled(
                action.title(),
                Style::default().add_modifier(Modifier::BOLD),
            )]),
            Line::from(action.message()),
            Line::from(""),
            Line::from("Press 'y' to confirm, 'n' to cancel"),
        ];

        let paragraph = Paragraph::new(text)
            .block(block)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true });

        f.render_widget(paragraph, area);
    }

    /// Render the status bar: toast first, then status message, then key hints.
    fn render_status_bar(&mut self, f: &mut Frame, area: Rect) {
        let tab_color = match self.tab {
            Tab::Active => ACCENT_BLUE,
            Tab::Trash => DARK_RED,
        };

        let (text, style) = if let Some(toast) = &self.toast {
            let style = match toast.notification.kind {
                NotificationKind::Success => Style::default().bg(EMERALD).fg(SLATE),
                NotificationKind::Info => Style::default().bg(ACCENT_BLUE).fg(Color::White),
                NotificationKind::Error => Style::default().bg(ROSE).fg(Color::White),
            };
            (toast.notification.message.clone(), style)
        } else {
            let text = if !self.status_message.is_empty() {
                self.status_message.clone()
            } else {
                match self.state {
                    AppState::TaskList => match self.tab {
                        Tab::Active => "a Add  e Edit  Space Toggle  d Trash  Tab Trash view  h Help".to_string(),
                        Tab::Trash => "r Restore  d Delete  E Empty trash  Tab Tasks view  h Help".to_string(),
                    },
                    AppState::AddTask => "Add New Task".to_string(),
                    AppState::EditTask => "Edit Task".to_string(),
                    AppState::Help => "Help".to_string(),
                    AppState::Confirm => "Confirm Action".to_string(),
                }
            };
            (text, Style::default().bg(tab_color).fg(Color::White))
        };

        let status = Paragraph::new(text).style(style).alignment(Alignment::Left);
        f.render_widget(status, area);
    }

    /// Main render function that dispatches to appropriate view renderers.
    fn render(&mut self, f: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(1)].as_ref())
            .split(f.area());

        match self.state {
            AppState::TaskList => self.render_task_list(f, chunks[0]),
            AppState::AddTask => {
                self.render_task_list(f, chunks[0]);
                self.render_task_form(f, chunks[0], false);
            }
            AppState::EditTask => {
                self.render_task_list(f, chunks[0]);
                self.render_task_form(f, chunks[0], true);
            }
            AppState::Help => self.render_help(f, chunks[0]),
            AppState::Confirm => {
                self.render_task_list(f, chunks[0]);
                self.render_confirm(f, chunks[0]);
            }
        }

        self.render_status_bar(f, chunks[1]);
    }

    /// Time-driven work between key presses: re-sample `now` when the
    /// refresh ticker fires and drop an expired toast. Tasks are not touched.
    fn tick(&mut self, at: Instant) {
        if self.ticker.poll(at) {
            debug!(interval_secs = self.ticker.interval().as_secs(), "refresh tick");
            self.refresh_now();
        }
        self.expire_toast(at);
    }

    /// Main event loop for the TUI application.
    ///
    /// The refresh ticker only re-samples the clock; the next draw picks up
    /// any pending → overdue transitions.
    pub fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> io::Result<()> {
        loop {
            self.tick(Instant::now());

            terminal.draw(|f| self.render(f))?;

            if self.handle_input()? {
                break;
            }
        }
        if let Err(e) = self.store.flush() {
            warn!(error = %e, "unsaved changes could not be written on exit");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use chrono::Duration as ChronoDuration;
    use ratatui::backend::TestBackend;

    fn app() -> App<MemoryStore> {
        App::new(TaskStore::open(MemoryStore::new()), Duration::from_secs(60))
    }

    fn press(app: &mut App<MemoryStore>, key: KeyCode) -> bool {
        app.handle_key(key, KeyModifiers::NONE)
    }

    fn type_text(app: &mut App<MemoryStore>, text: &str) {
        for c in text.chars() {
            press(app, KeyCode::Char(c));
        }
    }

    fn add_task(app: &mut App<MemoryStore>, text: &str) -> TaskId {
        press(app, KeyCode::Char('a'));
        type_text(app, text);
        press(app, KeyCode::Enter);
        app.selected_id().expect("new task should be selected")
    }

    fn screen(app: &mut App<MemoryStore>) -> String {
        let mut terminal = Terminal::new(TestBackend::new(120, 30)).unwrap();
        terminal.draw(|f| app.render(f)).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect()
    }

    #[test]
    fn add_through_form() {
        let mut app = app();
        let id = add_task(&mut app, "Buy milk");
        assert_eq!(app.state, AppState::TaskList);
        assert_eq!(app.store.get(id).map(|t| t.text.as_str()), Some("Buy milk"));
        assert_eq!(
            app.toast.as_ref().map(|t| t.notification.message.as_str()),
            Some("Added new task!")
        );
        assert_eq!(app.heading(), "(1) My Tasks");
    }

    #[test]
    fn empty_submission_keeps_form_open() {
        let mut app = app();
        press(&mut app, KeyCode::Char('a'));
        type_text(&mut app, "   ");
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.state, AppState::AddTask);
        assert_eq!(app.status_message, "Task text is required");
        assert!(app.store.tasks().is_empty());
    }

    #[test]
    fn invalid_due_date_is_reported() {
        let mut app = app();
        press(&mut app, KeyCode::Char('a'));
        type_text(&mut app, "Report");
        press(&mut app, KeyCode::Tab);
        type_text(&mut app, "whenever");
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.state, AppState::AddTask);
        assert!(app.status_message.contains("invalid due date"));
        assert!(app.store.tasks().is_empty());
    }

    #[test]
    fn completed_tasks_cannot_be_edited() {
        let mut app = app();
        let id = add_task(&mut app, "Done soon");
        press(&mut app, KeyCode::Char(' '));
        assert!(app.store.get(id).unwrap().completed);
        press(&mut app, KeyCode::Char('e'));
        assert_eq!(app.state, AppState::TaskList);
        assert_eq!(app.status_message, "Completed tasks cannot be edited");
    }

    #[test]
    fn edit_replaces_text() {
        let mut app = app();
        let id = add_task(&mut app, "Draft");
        press(&mut app, KeyCode::Char('e'));
        assert_eq!(app.state, AppState::EditTask);
        type_text(&mut app, " v2");
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.store.get(id).unwrap().text, "Draft v2");
    }

    #[test]
    fn delete_forever_requires_confirmation() {
        let mut app = app();
        let id = add_task(&mut app, "Old");
        press(&mut app, KeyCode::Char('d'));
        assert!(app.store.get(id).unwrap().is_deleted);

        press(&mut app, KeyCode::Tab);
        assert_eq!(app.tab, Tab::Trash);
        press(&mut app, KeyCode::Char('d'));
        assert_eq!(app.state, AppState::Confirm);
        assert_eq!(app.confirmation.pending(), Some(PendingAction::DeleteForever { id }));

        press(&mut app, KeyCode::Char('n'));
        assert_eq!(app.state, AppState::TaskList);
        assert!(app.store.get(id).is_some());

        press(&mut app, KeyCode::Char('d'));
        press(&mut app, KeyCode::Char('y'));
        assert!(app.store.get(id).is_none());
        assert!(app.visible_tasks.is_empty());
    }

    #[test]
    fn restore_from_trash() {
        let mut app = app();
        let id = add_task(&mut app, "Oops");
        press(&mut app, KeyCode::Char('d'));
        press(&mut app, KeyCode::Char('2'));
        press(&mut app, KeyCode::Char('r'));
        assert!(!app.store.get(id).unwrap().is_deleted);
        assert!(app.visible_tasks.is_empty());
        press(&mut app, KeyCode::Char('1'));
        assert_eq!(app.visible_tasks, vec![id]);
    }

    #[test]
    fn empty_trash_only_offered_when_trash_has_items() {
        let mut app = app();
        press(&mut app, KeyCode::Tab);
        press(&mut app, KeyCode::Char('E'));
        assert_eq!(app.state, AppState::TaskList);
        assert_eq!(app.status_message, "Trash is empty.");

        press(&mut app, KeyCode::Tab);
        add_task(&mut app, "a");
        press(&mut app, KeyCode::Char('d'));
        add_task(&mut app, "b");
        press(&mut app, KeyCode::Char('d'));
        let keep = add_task(&mut app, "keep");

        press(&mut app, KeyCode::Tab);
        press(&mut app, KeyCode::Char('E'));
        assert_eq!(app.confirmation.pending(), Some(PendingAction::EmptyTrash));
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.store.tasks().len(), 1);
        assert!(app.store.get(keep).is_some());
    }

    #[test]
    fn toasts_expire() {
        let mut app = app();
        add_task(&mut app, "x");
        let shown = app.toast.as_ref().unwrap().shown_at;
        app.expire_toast(shown + Duration::from_secs(1));
        assert!(app.toast.is_some());
        app.expire_toast(shown + TOAST_DURATION);
        assert!(app.toast.is_none());
    }

    #[test]
    fn tick_turns_pending_row_overdue_without_input() {
        let mut app = App::new(TaskStore::open(MemoryStore::new()), Duration::from_secs(1));
        let start = Instant::now();
        app.ticker = RefreshTicker::new(Duration::from_secs(1), start);
        app.store.add("Call back", Some(Utc::now() - ChronoDuration::minutes(1))).unwrap();
        app.update_visible_tasks();
        app.now = Utc::now() - ChronoDuration::hours(1);
        let before = app.store.tasks().to_vec();

        let out = screen(&mut app);
        assert!(out.contains("Pending"));
        assert!(!out.contains("Overdue"));

        app.tick(start + Duration::from_millis(500));
        assert!(!screen(&mut app).contains("Overdue"));

        app.tick(start + Duration::from_secs(1));
        let out = screen(&mut app);
        assert!(out.contains("Overdue"));
        assert_eq!(app.store.tasks(), before.as_slice());
    }

    #[test]
    fn renders_placeholders_and_heading() {
        let mut app = app();
        let out = screen(&mut app);
        assert!(out.contains("My Tasks"));
        assert!(out.contains("No tasks available."));

        press(&mut app, KeyCode::Tab);
        let out = screen(&mut app);
        assert!(out.contains("Trash is empty."));
    }

    #[test]
    fn overdue_label_is_hidden_in_trash() {
        let mut app = app();
        let late = Utc::now() - ChronoDuration::hours(2);
        let task = app.store.add("Late report", Some(late)).unwrap();
        app.update_visible_tasks();
        assert!(screen(&mut app).contains("Overdue"));

        app.store.trash(task.id).unwrap();
        press(&mut app, KeyCode::Tab);
        let out = screen(&mut app);
        assert!(out.contains("Late report"));
        assert!(!out.contains("Overdue"));
    }
}
