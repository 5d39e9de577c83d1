//! Bounded linear history of move and resize commits

use crate::item::{ItemId, Span};
use std::collections::VecDeque;

/// Default number of entries kept before the oldest is evicted
pub const UNDO_LIMIT: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UndoKind {
    Move,
    Resize,
}

/// One committed change of a single item
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UndoAction {
    pub kind: UndoKind,
    pub item_id: ItemId,
    pub before: Span,
    pub after: Span,
}

#[derive(Debug, Clone)]
pub struct UndoLog {
    actions: VecDeque<UndoAction>,
    limit: usize,
}

impl Default for UndoLog {
    fn default() -> Self {
        Self::with_limit(UNDO_LIMIT)
    }
}

impl UndoLog {
    pub fn with_limit(limit: usize) -> Self {
        let limit = limit.max(1);
        Self {
            actions: VecDeque::with_capacity(limit),
            limit,
        }
    }

    /// Appends an action, evicting the oldest when full. Actions that changed
    /// nothing are ignored.
    pub fn push(&mut self, action: UndoAction) {
        if action.before == action.after {
            return;
        }
        if self.actions.len() == self.limit {
            self.actions.pop_front();
        }
        self.actions.push_back(action);
    }

    /// Removes and returns the most recent action
    pub fn pop(&mut self) -> Option<UndoAction> {
        self.actions.pop_back()
    }

    pub fn peek(&self) -> Option<&UndoAction> {
        self.actions.back()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn clear(&mut self) {
        self.actions.clear();
    }

    /// Oldest first
    pub fn iter(&self) -> impl Iterator<Item = &UndoAction> {
        self.actions.iter()
    }
}
