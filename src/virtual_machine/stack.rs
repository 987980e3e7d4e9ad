//! Growable last-in-first-out stack of machine integers.

/// LIFO stack of `i64` values.
///
/// Popping or peeking an empty stack returns `None` and leaves it untouched;
/// the VM turns that into a runtime error.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Stack {
    data: Vec<i64>,
}

impl Stack {
    /// Creates an empty stack.
    pub fn new() -> Self {
        Self { data: Vec::new() }
    }

    /// Creates an empty stack with room for `capacity` values.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: Vec::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, value: i64) {
        self.data.push(value);
    }

    pub fn pop(&mut self) -> Option<i64> {
        self.data.pop()
    }

    /// Returns the most recently pushed value.
    pub fn top(&self) -> Option<i64> {
        self.data.last().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn clear(&mut self) {
        self.data.clear();
    }

    /// Values from bottom to top.
    pub fn as_slice(&self) -> &[i64] {
        &self.data
    }
}
