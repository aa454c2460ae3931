use crate::core::Selection;
use crate::ops::Op;

/// One undoable step: the ops that revert it plus the selections on either side.
#[derive(Debug, Clone)]
pub(crate) struct UndoRecord {
    pub(crate) inverse_ops: Vec<Op>,
    pub(crate) selection_before: Selection,
    pub(crate) selection_after: Selection,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Direction {
    Undo,
    Redo,
}

/// Bounded undo and redo stacks.
#[derive(Debug)]
pub(crate) struct History {
    undo: Vec<UndoRecord>,
    redo: Vec<UndoRecord>,
    limit: usize,
}

impl History {
    pub(crate) fn new(limit: usize) -> Self {
        Self {
            undo: Vec::new(),
            redo: Vec::new(),
            limit,
        }
    }

    pub(crate) fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
    }

    pub(crate) fn has(&self, direction: Direction) -> bool {
        !self.stack(direction).is_empty()
    }

    /// Records a fresh edit. Any redo branch is discarded and the oldest entry is
    /// dropped once the limit is exceeded.
    pub(crate) fn record(&mut self, entry: UndoRecord) {
        self.redo.clear();
        self.push(Direction::Undo, entry);
    }

    pub(crate) fn pop(&mut self, direction: Direction) -> Option<UndoRecord> {
        match direction {
            Direction::Undo => self.undo.pop(),
            Direction::Redo => self.redo.pop(),
        }
    }

    /// Files a replayed entry on the stack opposite to the one it came from.
    pub(crate) fn push_opposite(&mut self, from: Direction, entry: UndoRecord) {
        let to = match from {
            Direction::Undo => Direction::Redo,
            Direction::Redo => Direction::Undo,
        };
        self.push(to, entry);
    }

    fn push(&mut self, direction: Direction, entry: UndoRecord) {
        let limit = self.limit;
        let stack = match direction {
            Direction::Undo => &mut self.undo,
            Direction::Redo => &mut self.redo,
        };
        stack.push(entry);
        if stack.len() > limit {
            let excess = stack.len() - limit;
            stack.drain(..excess);
        }
    }

    fn stack(&self, direction: Direction) -> &[UndoRecord] {
        match direction {
            Direction::Undo => &self.undo,
            Direction::Redo => &self.redo,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Point;

    fn entry(n: usize) -> UndoRecord {
        let sel = Selection::collapsed(Point::new(vec![0, 0], n));
        UndoRecord {
            inverse_ops: Vec::new(),
            selection_before: sel.clone(),
            selection_after: sel,
        }
    }

    #[test]
    fn oldest_entries_fall_off_past_the_limit() {
        let mut history = History::new(2);
        for n in 0..3 {
            history.record(entry(n));
        }
        assert_eq!(history.pop(Direction::Undo).unwrap().selection_before.focus.offset, 2);
        assert_eq!(history.pop(Direction::Undo).unwrap().selection_before.focus.offset, 1);
        assert!(history.pop(Direction::Undo).is_none());
    }

    #[test]
    fn recording_discards_the_redo_branch() {
        let mut history = History::new(10);
        history.record(entry(0));
        let undone = history.pop(Direction::Undo).unwrap();
        history.push_opposite(Direction::Undo, undone);
        assert!(history.has(Direction::Redo));

        history.record(entry(1));
        assert!(!history.has(Direction::Redo));
    }
}
