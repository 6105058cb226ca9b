/// Single-line text field that only admits a decimal numeral: digits and
/// at most one decimal point. Edits happen at the cursor.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DecimalField {
    text: String,
    /// Cursor position in chars, `0..=len`.
    cursor: usize,
}

impl DecimalField {
    /// Field holding `text` with the cursor at the end.
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let cursor = text.chars().count();
        Self { text, cursor }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Replace the whole value; the cursor moves to the end.
    pub fn set_text(&mut self, text: impl Into<String>) {
        *self = Self::new(text);
    }

    fn len(&self) -> usize {
        self.text.chars().count()
    }

    fn byte_offset(&self, pos: usize) -> usize {
        self.text
            .char_indices()
            .nth(pos)
            .map(|(i, _)| i)
            .unwrap_or(self.text.len())
    }

    /// Insert `c` at the cursor if the filter admits it. Returns whether the
    /// character was accepted.
    pub fn insert(&mut self, c: char) -> bool {
        let admitted = c.is_ascii_digit() || (c == '.' && !self.text.contains('.'));
        if !admitted {
            return false;
        }
        let at = self.byte_offset(self.cursor);
        self.text.insert(at, c);
        self.cursor += 1;
        true
    }

    /// Delete the char before the cursor.
    pub fn backspace(&mut self) {
        if self.cursor == 0 {
            return;
        }
        self.cursor -= 1;
        let at = self.byte_offset(self.cursor);
        self.text.remove(at);
    }

    /// Delete the char under the cursor.
    pub fn delete(&mut self) {
        if self.cursor >= self.len() {
            return;
        }
        let at = self.byte_offset(self.cursor);
        self.text.remove(at);
    }

    pub fn move_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_right(&mut self) {
        self.cursor = (self.cursor + 1).min(self.len());
    }

    pub fn move_home(&mut self) {
        self.cursor = 0;
    }

    pub fn move_end(&mut self) {
        self.cursor = self.len();
    }
}
