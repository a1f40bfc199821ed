//! Linear undo/redo over [`TransformState`] snapshots.
//!
//! History is a single array of states plus a cursor at the current one.
//! Committing after an undo truncates the abandoned future, so there is
//! never more than one redo path, and every undone state stays reachable by
//! redo until the next commit. [`TransformHistory`] is the only way to
//! change the current state.

use log::debug;

use crate::{
    data::{Dataset, Row},
    group::GroupResult,
    pagination::{Page, PageCursor},
    pipeline::{TransformState, group_view, transform},
};

pub trait TransformHistory {
    fn current(&self) -> &TransformState;

    /// Records the current state and makes `next` current.
    fn commit(&mut self, next: TransformState);

    /// Steps back one state. Returns `false` when there is nothing to undo.
    fn undo(&mut self) -> bool;

    /// Steps forward one state. Returns `false` when there is nothing to redo.
    fn redo(&mut self) -> bool;

    fn can_undo(&self) -> bool;

    fn can_redo(&self) -> bool;

    fn reset(&mut self) {
        self.commit(TransformState::default());
    }
}

#[derive(Debug, Clone)]
pub struct History {
    /// Every reachable state; `states[position]` is current.
    states: Vec<TransformState>,
    position: usize,
    limit: Option<usize>,
}

impl Default for History {
    fn default() -> Self {
        Self::with_limit(None)
    }
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keeps at most `limit` undoable states, dropping the oldest first.
    pub fn with_limit(limit: Option<usize>) -> Self {
        Self {
            states: vec![TransformState::default()],
            position: 0,
            limit,
        }
    }

    /// Index of the last superseded state, `-1` when nothing can be undone.
    pub fn history_index(&self) -> isize {
        self.position as isize - 1
    }

    /// All recorded states, oldest first, including the current one.
    pub fn states(&self) -> &[TransformState] {
        &self.states
    }
}

impl TransformHistory for History {
    fn current(&self) -> &TransformState {
        &self.states[self.position]
    }

    fn commit(&mut self, next: TransformState) {
        self.states.truncate(self.position + 1);
        self.states.push(next);
        if let Some(limit) = self.limit {
            let overflow = self.states.len().saturating_sub(limit + 1);
            self.states.drain(..overflow);
        }
        self.position = self.states.len() - 1;
    }

    fn undo(&mut self) -> bool {
        if !self.can_undo() {
            return false;
        }
        self.position -= 1;
        true
    }

    fn redo(&mut self) -> bool {
        if !self.can_redo() {
            return false;
        }
        self.position += 1;
        true
    }

    fn can_undo(&self) -> bool {
        self.position > 0
    }

    fn can_redo(&self) -> bool {
        self.position + 1 < self.states.len()
    }
}

/// One open dataset with its transform history and table page.
///
/// The dataset is read-only; every view is derived from it and the
/// current state on demand.
#[derive(Debug, Clone)]
pub struct Session {
    dataset: Dataset,
    history: History,
    cursor: PageCursor,
}

impl Session {
    pub fn new(dataset: Dataset, page_size: usize, history_limit: Option<usize>) -> Self {
        Self {
            dataset,
            history: History::with_limit(history_limit),
            cursor: PageCursor::new(page_size),
        }
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn page_cursor(&self) -> &PageCursor {
        &self.cursor
    }

    /// Page navigation does not touch the transform state or history.
    pub fn page_cursor_mut(&mut self) -> &mut PageCursor {
        &mut self.cursor
    }

    pub fn rows(&self) -> Vec<&Row> {
        transform(&self.dataset.rows, self.history.current())
    }

    pub fn groups(&self) -> Vec<GroupResult<'_>> {
        group_view(&self.dataset.rows, self.history.current())
    }

    /// Runs `f` over the current page of the transformed rows.
    pub fn with_page<R>(&self, f: impl FnOnce(Page<'_, &Row>) -> R) -> R {
        let rows = self.rows();
        f(self.cursor.slice(&rows))
    }
}

impl TransformHistory for Session {
    fn current(&self) -> &TransformState {
        self.history.current()
    }

    fn commit(&mut self, next: TransformState) {
        debug!("Commit {next}");
        self.history.commit(next);
        self.cursor.reset();
    }

    fn undo(&mut self) -> bool {
        let changed = self.history.undo();
        if changed {
            debug!("Undo to {}", self.history.current());
            self.cursor.reset();
        }
        changed
    }

    fn redo(&mut self) -> bool {
        let changed = self.history.redo();
        if changed {
            debug!("Redo to {}", self.history.current());
            self.cursor.reset();
        }
        changed
    }

    fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    fn can_redo(&self) -> bool {
        self.history.can_redo()
    }
}
