//! Linear undo/redo log of full-tree snapshots.
//!
//! Structural edits record immediately; rapid content edits are coalesced by
//! the session (a debounced single `record`), so the log never grows one entry
//! per keystroke.

use crate::models::Block;

pub(crate) const HISTORY_MAX_ENTRIES: usize = 50;

#[derive(Clone, Debug, Default)]
pub(crate) struct EditHistory {
    entries: Vec<Vec<Block>>,
    index: usize,
}

impl EditHistory {
    /// Single-entry history seeded from a freshly loaded document.
    pub fn reset(&mut self, snapshot: Vec<Block>) {
        self.entries = vec![snapshot];
        self.index = 0;
    }

    /// Append a snapshot at the cursor, discarding any redo tail, and cap the
    /// log by dropping the oldest entries.
    pub fn record(&mut self, snapshot: Vec<Block>) {
        if !self.entries.is_empty() {
            self.entries.truncate(self.index + 1);
        }
        self.entries.push(snapshot);
        if self.entries.len() > HISTORY_MAX_ENTRIES {
            let drop_count = self.entries.len() - HISTORY_MAX_ENTRIES;
            self.entries.drain(0..drop_count);
        }
        self.index = self.entries.len() - 1;
    }

    pub fn can_undo(&self) -> bool {
        self.index > 0
    }

    pub fn can_redo(&self) -> bool {
        !self.entries.is_empty() && self.index + 1 < self.entries.len()
    }

    /// Step the cursor back and return a deep copy of that snapshot.
    pub fn undo(&mut self) -> Option<Vec<Block>> {
        if !self.can_undo() {
            return None;
        }
        self.index -= 1;
        Some(self.entries[self.index].clone())
    }

    pub fn redo(&mut self) -> Option<Vec<Block>> {
        if !self.can_redo() {
            return None;
        }
        self.index += 1;
        Some(self.entries[self.index].clone())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[cfg(test)]
    pub fn current(&self) -> Option<&Vec<Block>> {
        self.entries.get(self.index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Block, BlockType};

    fn tree(n: usize) -> Vec<Block> {
        (0..n).map(|_| Block::new(BlockType::Text)).collect()
    }

    #[test]
    fn test_reset_yields_single_entry() {
        let mut h = EditHistory::default();
        h.record(tree(1));
        h.record(tree(2));
        h.reset(tree(3));
        assert_eq!(h.len(), 1);
        assert!(!h.can_undo());
        assert!(!h.can_redo());
    }

    #[test]
    fn test_undo_redo_inverse() {
        let t0 = tree(1);
        let t1 = tree(2);

        let mut h = EditHistory::default();
        h.reset(t0.clone());
        h.record(t1.clone());

        assert_eq!(h.undo(), Some(t0.clone()));
        assert_eq!(h.redo(), Some(t1.clone()));
        assert!(h.redo().is_none());
    }

    #[test]
    fn test_record_after_undo_discards_redo_tail() {
        let mut h = EditHistory::default();
        h.reset(tree(0));
        h.record(tree(1));
        h.record(tree(2));
        h.undo().expect("undo to len-1");
        h.undo().expect("undo to len-0");

        let branch = tree(9);
        h.record(branch.clone());
        assert_eq!(h.len(), 2);
        assert!(h.redo().is_none());
        assert_eq!(h.current(), Some(&branch));
    }

    #[test]
    fn test_history_is_bounded_and_drops_oldest() {
        let oldest = tree(0);
        let mut h = EditHistory::default();
        h.reset(oldest.clone());

        for i in 1..=(HISTORY_MAX_ENTRIES + 10) {
            h.record(tree(i));
        }
        assert_eq!(h.len(), HISTORY_MAX_ENTRIES);

        // Walk all the way back: the oldest surviving entry is not the seed.
        let mut last = None;
        while h.can_undo() {
            last = h.undo();
        }
        let last = last.expect("walked back to the oldest entry");
        assert_ne!(last.len(), oldest.len());
        assert_eq!(last.len(), 11);
    }
}
