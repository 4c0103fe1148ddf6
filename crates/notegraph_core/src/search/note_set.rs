//! Note set: the working result type of expression evaluation.
//!
//! # Invariants
//! - Each note id appears at most once.
//! - Enumeration follows first-insertion order.
//! - A path, once recorded for a note, is not replaced by later adds.

use crate::graph::NoteGraph;
use crate::model::note::{NoteId, NotePath};
use std::collections::HashMap;

/// Unique collection of note ids with optional justifying paths.
#[derive(Debug, Clone, Default)]
pub struct NoteSet {
    order: Vec<NoteId>,
    paths: HashMap<NoteId, Option<NotePath>>,
}

impl NoteSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every live note of the graph, ordered by id.
    pub fn all(graph: &NoteGraph) -> Self {
        let mut note_ids = graph
            .all_notes()
            .map(|note| note.note_id.clone())
            .collect::<Vec<_>>();
        note_ids.sort();
        Self::from_ids(note_ids)
    }

    pub fn from_ids<I, S>(note_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<NoteId>,
    {
        let mut set = Self::new();
        for note_id in note_ids {
            set.add(note_id);
        }
        set
    }

    /// Adds a note without a path. No-op when already present.
    pub fn add(&mut self, note_id: impl Into<NoteId>) {
        let note_id = note_id.into();
        if self.paths.contains_key(&note_id) {
            return;
        }
        self.order.push(note_id.clone());
        self.paths.insert(note_id, None);
    }

    /// Adds a note with its justifying path; fills a missing path of an
    /// existing entry but never replaces a recorded one.
    pub fn add_with_path(&mut self, note_id: impl Into<NoteId>, path: NotePath) {
        let note_id = note_id.into();
        match self.paths.get_mut(&note_id) {
            Some(slot) => {
                if slot.is_none() {
                    *slot = Some(path);
                }
            }
            None => {
                self.order.push(note_id.clone());
                self.paths.insert(note_id, Some(path));
            }
        }
    }

    pub fn has(&self, note_id: &str) -> bool {
        self.paths.contains_key(note_id)
    }

    /// Note ids in insertion order.
    pub fn notes(&self) -> impl Iterator<Item = &NoteId> {
        self.order.iter()
    }

    /// Justifying path recorded for a note.
    pub fn path(&self, note_id: &str) -> Option<&NotePath> {
        self.paths.get(note_id).and_then(Option::as_ref)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Notes present in both sets; order and paths follow `self`.
    pub fn intersect(&self, other: &NoteSet) -> NoteSet {
        self.retain_where(|note_id| other.has(note_id))
    }

    /// Notes of `self` missing from `other`.
    pub fn minus(&self, other: &NoteSet) -> NoteSet {
        self.retain_where(|note_id| !other.has(note_id))
    }

    /// Notes of either set; `self` entries come first.
    pub fn union(&self, other: &NoteSet) -> NoteSet {
        let mut merged = self.clone();
        merged.merge_in(other);
        merged
    }

    /// Adds every entry of `other` into `self`.
    pub fn merge_in(&mut self, other: &NoteSet) {
        for note_id in other.notes() {
            match other.path(note_id) {
                Some(path) => self.add_with_path(note_id.clone(), path.clone()),
                None => self.add(note_id.clone()),
            }
        }
    }

    fn retain_where(&self, keep: impl Fn(&str) -> bool) -> NoteSet {
        let mut result = NoteSet::new();
        for note_id in self.notes().filter(|note_id| keep(note_id)) {
            match self.path(note_id) {
                Some(path) => result.add_with_path(note_id.clone(), path.clone()),
                None => result.add(note_id.clone()),
            }
        }
        result
    }
}

impl PartialEq for NoteSet {
    /// Membership and paths; insertion order is not significant.
    fn eq(&self, other: &Self) -> bool {
        self.paths == other.paths
    }
}

impl Eq for NoteSet {}
