use std::collections::VecDeque;

use super::TextFieldValue;

pub const DEFAULT_HISTORY_CAPACITY: usize = 50;

/// Bounded undo/redo snapshot stacks. The top of each stack is the back of its deque;
/// the oldest snapshot is evicted from the front once capacity is exceeded.
#[derive(Debug)]
pub struct EditHistory {
    undo: VecDeque<TextFieldValue>,
    redo: VecDeque<TextFieldValue>,
    capacity: usize,
}

impl EditHistory {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            undo: VecDeque::with_capacity(capacity),
            redo: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    pub fn undo_len(&self) -> usize {
        self.undo.len()
    }

    pub fn redo_len(&self) -> usize {
        self.redo.len()
    }

    /// Records the pre-edit value and drops every redo entry.
    pub fn snapshot(&mut self, current: &TextFieldValue) {
        push_bounded(&mut self.undo, current.clone(), self.capacity);
        self.redo.clear();
    }

    /// Restores the most recent snapshot into `current`, moving the live value to redo.
    pub fn undo(&mut self, current: &mut TextFieldValue) -> bool {
        let Some(previous) = self.undo.pop_back() else {
            return false;
        };
        let live = std::mem::replace(current, previous);
        push_bounded(&mut self.redo, live, self.capacity);
        true
    }

    pub fn redo(&mut self, current: &mut TextFieldValue) -> bool {
        let Some(next) = self.redo.pop_back() else {
            return false;
        };
        let live = std::mem::replace(current, next);
        push_bounded(&mut self.undo, live, self.capacity);
        true
    }

    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
    }
}

impl Default for EditHistory {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}

fn push_bounded(stack: &mut VecDeque<TextFieldValue>, value: TextFieldValue, capacity: usize) {
    if stack.len() == capacity {
        stack.pop_front();
    }
    stack.push_back(value);
}
