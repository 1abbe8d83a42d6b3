pub mod buffer;
pub mod history;

pub use buffer::TextBuffer;
pub use history::{DEFAULT_HISTORY_CAPACITY, EditHistory};

/// Selection range in character positions. Values may arrive negative from
/// callers; they are clamped to 0 when applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Selection {
    pub start: isize,
    pub end: isize,
}

impl Selection {
    pub fn new(start: isize, end: isize) -> Self {
        Self { start, end }
    }

    pub fn collapsed(at: usize) -> Self {
        let at = isize::try_from(at).unwrap_or(isize::MAX);
        Self { start: at, end: at }
    }

    /// Ordered `(start, end)` clamped into `[0, len]`.
    pub fn clamped(&self, len: usize) -> (usize, usize) {
        let clamp = |value: isize| usize::try_from(value).unwrap_or(0).min(len);
        let (a, b) = (clamp(self.start), clamp(self.end));
        (a.min(b), a.max(b))
    }
}

/// The document: flat text plus one selection.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TextFieldValue {
    pub text: String,
    pub selection: Selection,
}

impl TextFieldValue {
    pub fn new(text: impl Into<String>, selection: Selection) -> Self {
        Self {
            text: text.into(),
            selection,
        }
    }

    pub fn with_cursor(text: impl Into<String>, cursor: usize) -> Self {
        Self::new(text, Selection::collapsed(cursor))
    }

    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    /// Same text with the selection ordered and clamped into `[0, char_len]`.
    pub fn normalized(mut self) -> Self {
        let (start, end) = self.selection.clamped(self.char_len());
        self.selection = Selection::new(
            isize::try_from(start).unwrap_or(isize::MAX),
            isize::try_from(end).unwrap_or(isize::MAX),
        );
        self
    }
}

/// Byte offset of the `char_index`-th character, or the text length past the end.
pub(crate) fn byte_offset(text: &str, char_index: usize) -> usize {
    text.char_indices()
        .nth(char_index)
        .map(|(offset, _)| offset)
        .unwrap_or(text.len())
}
