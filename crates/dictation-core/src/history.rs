//! Per-field history: undo entries, remembered forward operations and the command prefix.
//!
//! All three containers are bounded. When full, pushing a new entry evicts the oldest one.

use crate::operation::{Inverse, Op, write_list};
use std::collections::VecDeque;
use std::fmt;

/// Bounded stack of [`Inverse`] entries.
#[derive(Debug, Clone)]
pub struct UndoStack {
    entries: Vec<Inverse>,
    capacity: usize,
}

impl UndoStack {
    /// Create an empty stack holding at most `capacity` entries.
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Vec::new(),
            capacity,
        }
    }

    /// Push an inverse. No-op inverses are dropped; returns `true` if the entry was stored.
    pub fn push(&mut self, inverse: Inverse) -> bool {
        if inverse.is_no_op() || self.capacity == 0 {
            return false;
        }
        if self.entries.len() >= self.capacity {
            self.entries.remove(0);
        }
        tracing::debug!(%inverse, depth = self.entries.len() + 1, "push undo entry");
        self.entries.push(inverse);
        true
    }

    /// Pop the most recent entry.
    pub fn pop(&mut self) -> Option<Inverse> {
        self.entries.pop()
    }

    /// The most recent entry.
    pub fn peek(&self) -> Option<&Inverse> {
        self.entries.last()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if there is nothing to undo.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Maximum number of entries.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Drop all entries.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Entries, most recent first.
    pub fn iter(&self) -> impl Iterator<Item = &Inverse> {
        self.entries.iter().rev()
    }
}

impl fmt::Display for UndoStack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_list(f, self.iter())
    }
}

/// Bounded memory of successful forward operations, used by `combine` and `apply`.
#[derive(Debug, Clone)]
pub struct OpStack {
    ops: Vec<Op>,
    capacity: usize,
}

impl OpStack {
    /// Create an empty memory holding at most `capacity` operations.
    pub fn new(capacity: usize) -> Self {
        Self {
            ops: Vec::new(),
            capacity,
        }
    }

    /// Remember `op` as the last operation.
    pub fn push(&mut self, op: Op) {
        if self.capacity == 0 {
            return;
        }
        if self.ops.len() >= self.capacity {
            self.ops.remove(0);
        }
        self.ops.push(op);
    }

    /// The last operation.
    pub fn last(&self) -> Option<&Op> {
        self.ops.last()
    }

    /// Remove the last `n` operations and return them in execution order.
    ///
    /// Returns `None` (and removes nothing) if fewer than `n` are remembered.
    pub fn pop_n(&mut self, n: usize) -> Option<Vec<Op>> {
        let start = self.ops.len().checked_sub(n)?;
        Some(self.ops.split_off(start))
    }

    /// Number of remembered operations.
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// Returns `true` if no operation is remembered.
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Forget everything.
    pub fn clear(&mut self) {
        self.ops.clear();
    }

    /// Operations, most recent first.
    pub fn iter(&self) -> impl Iterator<Item = &Op> {
        self.ops.iter().rev()
    }
}

impl fmt::Display for OpStack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_list(f, self.iter())
    }
}

/// A literal utterance that may still turn out to be the start of a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PrefixEntry {
    /// The utterance after rewriting.
    pub(crate) text: String,
    /// Undo entries its commit pushed.
    pub(crate) undo_entries: usize,
}

/// The last few literal utterances, oldest first.
#[derive(Debug, Clone)]
pub(crate) struct CommandPrefix {
    entries: VecDeque<PrefixEntry>,
    capacity: usize,
}

impl CommandPrefix {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub(crate) fn push(&mut self, entry: PrefixEntry) {
        if self.capacity == 0 {
            return;
        }
        if self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }

    /// The last `size` entries joined with `utterance`, separated by single spaces.
    /// Empty entries are skipped.
    pub(crate) fn window(&self, size: usize, utterance: &str) -> String {
        let skip = self.entries.len().saturating_sub(size);
        let mut joined = String::new();
        for entry in self.entries.iter().skip(skip) {
            if entry.text.is_empty() {
                continue;
            }
            joined.push_str(&entry.text);
            joined.push(' ');
        }
        joined.push_str(utterance);
        joined
    }

    /// Undo entries pushed by the last `size` entries.
    pub(crate) fn undo_entries(&self, size: usize) -> usize {
        let skip = self.entries.len().saturating_sub(size);
        self.entries
            .iter()
            .skip(skip)
            .map(|entry| entry.undo_entries)
            .sum()
    }
}
