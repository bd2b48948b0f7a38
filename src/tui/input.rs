//! Input field handling for the terminal user interface.

/// A single-line text input with a cursor measured in characters.
#[derive(Clone, Debug, Default)]
pub struct InputField {
    pub value: String,
    pub cursor: usize,
    pub active: bool,
}

impl InputField {
    /// Create an input field with initial text value, cursor at the end.
    pub fn with_value(value: &str) -> Self {
        Self {
            value: value.to_string(),
            cursor: value.chars().count(),
            active: false,
        }
    }

    fn byte_index(&self, char_idx: usize) -> usize {
        self.value
            .char_indices()
            .nth(char_idx)
            .map_or(self.value.len(), |(i, _)| i)
    }

    fn len_chars(&self) -> usize {
        self.value.chars().count()
    }

    /// Insert a character at the current cursor position.
    pub fn handle_char(&mut self, c: char) {
        let at = self.byte_index(self.cursor);
        self.value.insert(at, c);
        self.cursor += 1;
    }

    /// Delete the character before the cursor.
    pub fn handle_backspace(&mut self) {
        if self.cursor > 0 {
            let at = self.byte_index(self.cursor - 1);
            self.value.remove(at);
            self.cursor -= 1;
        }
    }

    /// Delete the character at the cursor position.
    pub fn handle_delete(&mut self) {
        if self.cursor < self.len_chars() {
            let at = self.byte_index(self.cursor);
            self.value.remove(at);
        }
    }

    pub fn move_cursor_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_cursor_right(&mut self) {
        if self.cursor < self.len_chars() {
            self.cursor += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edits_at_cursor() {
        let mut f = InputField::with_value("ac");
        f.move_cursor_left();
        f.handle_char('b');
        assert_eq!(f.value, "abc");
        assert_eq!(f.cursor, 2);
        f.handle_backspace();
        assert_eq!(f.value, "ac");
        f.handle_delete();
        assert_eq!(f.value, "a");
        f.handle_delete();
        assert_eq!(f.value, "a");
    }

    #[test]
    fn handles_multibyte_text() {
        let mut f = InputField::with_value("Mua sữa");
        assert_eq!(f.cursor, 7);
        f.handle_backspace();
        assert_eq!(f.value, "Mua sữ");
        f.move_cursor_left();
        f.handle_char('ữ');
        assert_eq!(f.value, "Mua sữữ");
        f.move_cursor_right();
        f.move_cursor_right();
        assert_eq!(f.cursor, 7);
    }
}
