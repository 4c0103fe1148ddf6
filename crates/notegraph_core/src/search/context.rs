//! Per-query options and scratch state.

use super::{SearchError, SearchResult};
use crate::model::note::{NoteId, NotePath, ROOT_NOTE_ID};
use std::collections::HashMap;

const DEFAULT_LIMIT: usize = 200;

/// Options controlling one query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchOptions {
    /// Best paths prefer this subtree.
    pub hoisted_note_id: NoteId,
    /// Restricts results to descendants of this note when set.
    pub ancestor_note_id: Option<NoteId>,
    /// Archived notes are excluded unless set.
    pub include_archived_notes: bool,
    /// Maximum number of hits returned by `search_notes`.
    pub limit: usize,
    /// Aborts the backward path search after this many visited frames.
    pub max_branch_visits: Option<usize>,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            hoisted_note_id: ROOT_NOTE_ID.to_string(),
            ancestor_note_id: None,
            include_archived_notes: false,
            limit: DEFAULT_LIMIT,
            max_branch_visits: None,
        }
    }
}

/// Mutable state shared by all expressions of one query.
#[derive(Debug, Clone, Default)]
pub struct SearchContext {
    options: SearchOptions,
    note_id_to_note_path: HashMap<NoteId, NotePath>,
    branch_visits: usize,
}

impl SearchContext {
    pub fn new(options: SearchOptions) -> Self {
        Self {
            options,
            note_id_to_note_path: HashMap::new(),
            branch_visits: 0,
        }
    }

    pub fn options(&self) -> &SearchOptions {
        &self.options
    }

    /// Records the justifying path of a match. The first registration wins.
    ///
    /// Returns `true` when the path was recorded.
    pub fn register_path(&mut self, note_id: &str, note_path: NotePath) -> bool {
        if self.note_id_to_note_path.contains_key(note_id) {
            return false;
        }
        self.note_id_to_note_path
            .insert(note_id.to_string(), note_path);
        true
    }

    /// Path recorded for a matched note.
    pub fn note_path(&self, note_id: &str) -> Option<&NotePath> {
        self.note_id_to_note_path.get(note_id)
    }

    pub fn note_paths(&self) -> &HashMap<NoteId, NotePath> {
        &self.note_id_to_note_path
    }

    /// Frames visited by backward path searches so far.
    pub fn branch_visits(&self) -> usize {
        self.branch_visits
    }

    /// Counts one visited frame, failing once the budget is exceeded.
    pub(crate) fn record_branch_visit(&mut self) -> SearchResult<()> {
        self.branch_visits += 1;
        match self.options.max_branch_visits {
            Some(limit) if self.branch_visits > limit => {
                Err(SearchError::BranchBudgetExceeded { limit })
            }
            _ => Ok(()),
        }
    }
}
