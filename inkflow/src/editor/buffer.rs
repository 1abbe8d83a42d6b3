use tracing::debug;

use super::history::EditHistory;
use super::{Selection, TextFieldValue, byte_offset};

/// The editable document with undo/redo.
///
/// Every content edit snapshots the pre-edit value into the history first, which also
/// clears the redo stack.
#[derive(Debug, Default)]
pub struct TextBuffer {
    value: TextFieldValue,
    history: EditHistory,
}

impl TextBuffer {
    pub fn new(history_capacity: usize) -> Self {
        Self {
            value: TextFieldValue::default(),
            history: EditHistory::new(history_capacity),
        }
    }

    pub fn value(&self) -> &TextFieldValue {
        &self.value
    }

    pub fn text(&self) -> &str {
        &self.value.text
    }

    pub fn history(&self) -> &EditHistory {
        &self.history
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Replaces the whole value, e.g. after the user typed into the field.
    /// Selection-only changes are applied without a snapshot. The stored selection is
    /// clamped into the new text.
    pub fn replace_all(&mut self, new_value: TextFieldValue) -> bool {
        let text_changed = new_value.text != self.value.text;
        if text_changed {
            self.history.snapshot(&self.value);
        }
        self.value = new_value.normalized();
        text_changed
    }

    /// Splices `insert` over the current selection and collapses the cursor after it.
    pub fn insert_at_cursor(&mut self, insert: &str) {
        self.history.snapshot(&self.value);

        let text = &self.value.text;
        let (start, end) = self.value.selection.clamped(text.chars().count());
        let (start_byte, end_byte) = (byte_offset(text, start), byte_offset(text, end));

        let mut next = String::with_capacity(text.len() + insert.len());
        next.push_str(&text[..start_byte]);
        next.push_str(insert);
        next.push_str(&text[end_byte..]);

        let cursor = start + insert.chars().count();
        debug!(inserted_chars = insert.chars().count(), cursor, "inserted text at cursor");
        self.value = TextFieldValue::with_cursor(next, cursor);
    }

    /// Deletes the selection, or the character before a collapsed cursor.
    pub fn backspace(&mut self) -> bool {
        let text = &self.value.text;
        if text.is_empty() {
            return false;
        }
        let (start, end) = self.value.selection.clamped(text.chars().count());
        if end == 0 {
            return false;
        }

        self.history.snapshot(&self.value);

        let text = &self.value.text;
        let (from, to) = if start != end { (start, end) } else { (start - 1, start) };
        let (from_byte, to_byte) = (byte_offset(text, from), byte_offset(text, to));

        let mut next = String::with_capacity(text.len());
        next.push_str(&text[..from_byte]);
        next.push_str(&text[to_byte..]);
        self.value = TextFieldValue::with_cursor(next, from);
        true
    }

    pub fn clear_text(&mut self) -> bool {
        if self.value.text.is_empty() {
            return false;
        }
        self.history.snapshot(&self.value);
        self.value = TextFieldValue::new(String::new(), Selection::collapsed(0));
        true
    }

    pub fn undo(&mut self) -> bool {
        self.history.undo(&mut self.value)
    }

    pub fn redo(&mut self) -> bool {
        self.history.redo(&mut self.value)
    }
}
