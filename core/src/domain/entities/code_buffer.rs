//! Fixed-width input buffer for a verification code.

use serde::{Deserialize, Serialize};

/// Number of digits in a verification code
pub const CODE_LENGTH: usize = 6;

/// Code input buffer: always `CODE_LENGTH` slots, each a digit or empty
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeBuffer {
    slots: [Option<char>; CODE_LENGTH],
}

impl CodeBuffer {
    /// Create an empty buffer
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a buffer from the first `CODE_LENGTH` digits of `text`.
    ///
    /// Non-digit characters are skipped, so pasted text like "123 456" fills
    /// all six slots.
    pub fn from_digits(text: &str) -> Self {
        let mut buffer = Self::new();
        buffer.fill_from(text);
        buffer
    }

    /// Set the slot at `index`. Returns `false` if `index` is out of range or
    /// `digit` is not an ASCII digit.
    pub fn set(&mut self, index: usize, digit: char) -> bool {
        if index >= CODE_LENGTH || !digit.is_ascii_digit() {
            return false;
        }
        self.slots[index] = Some(digit);
        true
    }

    /// Empty the slot at `index`
    pub fn clear_slot(&mut self, index: usize) -> bool {
        if index >= CODE_LENGTH {
            return false;
        }
        self.slots[index] = None;
        true
    }

    /// Replace the whole buffer with digits taken from `text`
    pub fn fill_from(&mut self, text: &str) {
        self.clear();
        for (slot, digit) in self
            .slots
            .iter_mut()
            .zip(text.chars().filter(|c| c.is_ascii_digit()))
        {
            *slot = Some(digit);
        }
    }

    /// Empty every slot
    pub fn clear(&mut self) {
        self.slots = [None; CODE_LENGTH];
    }

    /// Every slot holds a digit
    pub fn is_complete(&self) -> bool {
        self.slots.iter().all(Option::is_some)
    }

    /// No slot holds a digit
    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }

    /// Number of filled slots
    pub fn filled(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    /// Slot contents
    pub fn slots(&self) -> &[Option<char>; CODE_LENGTH] {
        &self.slots
    }

    /// The code, only when every slot is filled
    pub fn code(&self) -> Option<String> {
        if self.is_complete() {
            Some(self.slots.iter().flatten().collect())
        } else {
            None
        }
    }
}
