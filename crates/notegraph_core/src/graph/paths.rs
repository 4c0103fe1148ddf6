//! Note path enumeration and canonical best-path selection.
//!
//! # Responsibility
//! - Enumerate every root-to-note path through live branches.
//! - Order candidate paths by a total order and pick the first.
//!
//! # Invariants
//! - Path order: hoisted subtree first, then unarchived, then outside
//!   `_hidden`, then shorter, then lexicographically smaller id sequence.
//! - For an unchanged graph the same note always resolves to the same path.
//! - Unknown and orphaned notes have no paths.
//! - Archive flags are resolved at most once per note per selector.

use super::attributes::AttributeResolver;
use super::NoteGraph;
use crate::model::note::{NoteId, NotePath, HIDDEN_NOTE_ID, ROOT_NOTE_ID};
use std::cell::RefCell;
use std::collections::HashMap;

/// One candidate path with the facts used to rank it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotePathRecord {
    pub note_path: NotePath,
    pub is_in_hoisted_subtree: bool,
    /// Some note on the path is archived.
    pub is_archived: bool,
    /// Path runs through the `_hidden` system subtree.
    pub is_hidden: bool,
}

/// Deterministic path chooser over a [`NoteGraph`].
#[derive(Debug, Clone)]
pub struct NotePathSelector<'g> {
    graph: &'g NoteGraph,
    hoisted_note_id: NoteId,
    archived: RefCell<HashMap<NoteId, bool>>,
}

impl<'g> NotePathSelector<'g> {
    /// Selector hoisted at the graph root.
    pub fn new(graph: &'g NoteGraph) -> Self {
        Self {
            graph,
            hoisted_note_id: ROOT_NOTE_ID.to_string(),
            archived: RefCell::new(HashMap::new()),
        }
    }

    /// Prefers paths passing through `hoisted_note_id`.
    pub fn with_hoisted_note(mut self, hoisted_note_id: impl Into<NoteId>) -> Self {
        self.hoisted_note_id = hoisted_note_id.into();
        self
    }

    /// Every root-to-note path, unordered.
    pub fn all_note_paths(&self, note_id: &str) -> Vec<NotePath> {
        let mut memo = HashMap::new();
        self.paths_to(note_id, &mut memo)
    }

    /// Every root-to-note path, best first.
    pub fn sorted_note_paths(&self, note_id: &str) -> Vec<NotePathRecord> {
        let mut records = self
            .all_note_paths(note_id)
            .into_iter()
            .map(|note_path| {
                let is_archived = note_path.iter().any(|id| self.is_archived(id));
                NotePathRecord {
                    is_in_hoisted_subtree: note_path.contains(&self.hoisted_note_id),
                    is_hidden: note_path.iter().any(|id| id == HIDDEN_NOTE_ID),
                    is_archived,
                    note_path,
                }
            })
            .collect::<Vec<_>>();

        records.sort_by(|a, b| {
            b.is_in_hoisted_subtree
                .cmp(&a.is_in_hoisted_subtree)
                .then_with(|| a.is_archived.cmp(&b.is_archived))
                .then_with(|| a.is_hidden.cmp(&b.is_hidden))
                .then_with(|| a.note_path.len().cmp(&b.note_path.len()))
                .then_with(|| a.note_path.cmp(&b.note_path))
        });
        records
    }

    /// Canonical display path, or `None` when the note is unreachable.
    pub fn best_note_path(&self, note_id: &str) -> Option<NotePath> {
        self.sorted_note_paths(note_id)
            .into_iter()
            .next()
            .map(|record| record.note_path)
    }

    fn is_archived(&self, note_id: &str) -> bool {
        if let Some(&archived) = self.archived.borrow().get(note_id) {
            return archived;
        }
        let archived = AttributeResolver::new(self.graph).is_archived(note_id);
        self.archived
            .borrow_mut()
            .insert(note_id.to_string(), archived);
        archived
    }

    fn paths_to(&self, note_id: &str, memo: &mut HashMap<NoteId, Vec<NotePath>>) -> Vec<NotePath> {
        if let Some(paths) = memo.get(note_id) {
            return paths.clone();
        }
        if !self.graph.has_note(note_id) {
            return Vec::new();
        }

        let paths = if note_id == ROOT_NOTE_ID {
            vec![vec![ROOT_NOTE_ID.to_string()]]
        } else {
            let mut paths = Vec::new();
            for parent in self.graph.parents(note_id) {
                for mut path in self.paths_to(&parent.note_id, memo) {
                    path.push(note_id.to_string());
                    paths.push(path);
                }
            }
            paths
        };

        memo.insert(note_id.to_string(), paths.clone());
        paths
    }
}

impl NoteGraph {
    /// Best path of a note with the default (root) hoisting.
    pub fn best_note_path(&self, note_id: &str) -> Option<NotePath> {
        NotePathSelector::new(self).best_note_path(note_id)
    }
}
