//! Undo log: an operation journal rather than state snapshots (spec §4.E).
//!
//! Each primitive text edit pushes one [`UndoEntry`]; entries are grouped
//! into batches by [`UndoLog::checkpoint`]. `undo` replays the most recent
//! batch's inverses in reverse order; `redo` replays the forward operations
//! of the most recently undone batch.

use core_text::{Buffer, Position};
use tracing::trace;

/// One primitive edit, as applied to the text tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    Insert,
    Delete,
}

/// {operation, position, runes_affected} (spec §3).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UndoEntry {
    pub operation: Operation,
    pub position: Position,
    pub runes_affected: String,
}

impl UndoEntry {
    pub fn insert(position: Position, runes_affected: impl Into<String>) -> Self {
        Self { operation: Operation::Insert, position, runes_affected: runes_affected.into() }
    }

    pub fn delete(position: Position, runes_affected: impl Into<String>) -> Self {
        Self { operation: Operation::Delete, position, runes_affected: runes_affected.into() }
    }

    /// The entry that exactly undoes this one.
    fn inverse(&self) -> Self {
        match self.operation {
            Operation::Insert => Self::delete(self.position, self.runes_affected.clone()),
            Operation::Delete => Self::insert(self.position, self.runes_affected.clone()),
        }
    }

    fn apply(&self, text: &mut Buffer) -> Position {
        match self.operation {
            Operation::Insert => {
                let _ = text.insert_str(self.position, &self.runes_affected);
                Position(self.position.rune_offset() + self.runes_affected.chars().count())
            }
            Operation::Delete => {
                let end = Position(self.position.rune_offset() + self.runes_affected.chars().count());
                let _ = text.delete_range(self.position, end);
                self.position
            }
        }
    }
}

/// A contiguous run of entries between two checkpoints.
type Batch = Vec<UndoEntry>;

#[derive(Default)]
pub struct UndoLog {
    undo_batches: Vec<Batch>,
    redo_batches: Vec<Batch>,
    current: Batch,
}

impl UndoLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn track_insert(&mut self, position: Position, runes: impl Into<String>) {
        self.current.push(UndoEntry::insert(position, runes));
    }

    pub fn track_delete(&mut self, position: Position, runes: impl Into<String>) {
        self.current.push(UndoEntry::delete(position, runes));
    }

    /// Close out the in-progress batch, if non-empty, and clear the redo
    /// stack (a fresh edit invalidates any previously undone future).
    pub fn checkpoint(&mut self) {
        if self.current.is_empty() {
            return;
        }
        let batch = std::mem::take(&mut self.current);
        trace!(target: "state.undo", entries = batch.len(), depth = self.undo_batches.len() + 1, "checkpoint");
        self.undo_batches.push(batch);
        self.redo_batches.clear();
    }

    /// Undo the most recent batch, applying inverses in reverse order.
    /// Returns the cursor position after the last inverse applied, or
    /// `None` if there was nothing to undo.
    pub fn undo(&mut self, text: &mut Buffer) -> Option<Position> {
        self.checkpoint();
        let batch = self.undo_batches.pop()?;
        let mut last = None;
        for entry in batch.iter().rev() {
            last = Some(entry.inverse().apply(text));
        }
        trace!(target: "state.undo", entries = batch.len(), remaining = self.undo_batches.len(), "undo");
        self.redo_batches.push(batch);
        last
    }

    /// Redo the most recently undone batch, replaying operations forward.
    pub fn redo(&mut self, text: &mut Buffer) -> Option<Position> {
        let batch = self.redo_batches.pop()?;
        let mut last = None;
        for entry in &batch {
            last = Some(entry.apply(text));
        }
        trace!(target: "state.undo", entries = batch.len(), remaining = self.redo_batches.len(), "redo");
        self.undo_batches.push(batch);
        last
    }

    pub fn undo_depth(&self) -> usize {
        self.undo_batches.len() + usize::from(!self.current.is_empty())
    }

    pub fn redo_depth(&self) -> usize {
        self.redo_batches.len()
    }
}
