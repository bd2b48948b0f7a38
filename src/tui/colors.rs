//! Color constants for the terminal user interface.

use ratatui::style::Color;

/// Header, active tab and form focus.
pub const ACCENT_BLUE: Color = Color::Rgb(37, 99, 235);
/// Overdue rows and badges.
pub const ROSE: Color = Color::Rgb(225, 29, 72);
/// Completed rows and success toasts.
pub const EMERALD: Color = Color::Rgb(16, 185, 129);
/// Trash tab and the confirm dialog.
pub const DARK_RED: Color = Color::Rgb(114, 0, 0);
/// Text on light backgrounds.
pub const SLATE: Color = Color::Rgb(20, 20, 20);
