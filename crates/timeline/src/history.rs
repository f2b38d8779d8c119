//! Bounded undo/redo over timeline states.
//!
//! Every user-initiated mutation (reorder, label edit, soft delete) pushes
//! the previous state onto the past stack and clears the future stack.
//! Initial load and externally triggered reconciliations do not push.

use crate::entry::ProjectTimeline;

/// Maximum retained undo depth.
pub const HISTORY_CAP: usize = 50;

/// Past/future stacks for one project's timeline.
#[derive(Debug, Default)]
pub struct TimelineHistory {
    past: Vec<ProjectTimeline>,
    future: Vec<ProjectTimeline>,
}

impl TimelineHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the state that a user mutation is about to replace.
    pub fn push(&mut self, previous: ProjectTimeline) {
        self.past.push(previous);
        if self.past.len() > HISTORY_CAP {
            self.past.remove(0);
        }
        self.future.clear();
    }

    /// Step back: returns the state to restore, moving `current` onto the
    /// future stack. None when there is nothing to undo.
    pub fn undo(&mut self, current: ProjectTimeline) -> Option<ProjectTimeline> {
        let previous = self.past.pop()?;
        self.future.push(current);
        Some(previous)
    }

    /// Step forward: returns the state to restore, moving `current` onto
    /// the past stack. None when there is nothing to redo.
    pub fn redo(&mut self, current: ProjectTimeline) -> Option<ProjectTimeline> {
        let next = self.future.pop()?;
        self.past.push(current);
        Some(next)
    }

    pub fn can_undo(&self) -> bool {
        !self.past.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.future.is_empty()
    }

    pub fn depth(&self) -> usize {
        self.past.len()
    }
}
