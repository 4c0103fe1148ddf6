//! Serializable graph snapshot used to seed a [`NoteGraph`].
//!
//! Snapshots are applied in dependency order: notes, then branches, then
//! attributes, so every patch sees its endpoints already present.

use super::{GraphResult, NoteGraph};
use crate::model::attribute::Attribute;
use crate::model::branch::{default_branch_id, Branch};
use crate::model::note::Note;
use serde::{Deserialize, Serialize};

/// Flat list of all graph entities.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphSnapshot {
    #[serde(default)]
    pub notes: Vec<Note>,
    #[serde(default)]
    pub branches: Vec<Branch>,
    #[serde(default)]
    pub attributes: Vec<Attribute>,
}

impl GraphSnapshot {
    /// Builds a graph from this snapshot.
    pub fn into_graph(self) -> GraphResult<NoteGraph> {
        NoteGraph::from_snapshot(self)
    }
}

impl NoteGraph {
    /// Builds a graph from a snapshot, rejecting inconsistent entities.
    pub fn from_snapshot(snapshot: GraphSnapshot) -> GraphResult<Self> {
        let mut graph = Self::new();
        for note in snapshot.notes {
            graph.upsert_note(note)?;
        }
        for mut branch in snapshot.branches {
            if branch.branch_id.trim().is_empty() {
                branch.branch_id = default_branch_id(&branch.parent_note_id, &branch.note_id);
            }
            graph.upsert_branch(branch)?;
        }
        for attribute in snapshot.attributes {
            graph.upsert_attribute(attribute)?;
        }
        Ok(graph)
    }

    /// Exports all entities, including soft-deleted ones, sorted by id.
    pub fn to_snapshot(&self) -> GraphSnapshot {
        let mut notes = self.notes.values().cloned().collect::<Vec<_>>();
        notes.sort_by(|a, b| a.note_id.cmp(&b.note_id));
        let mut branches = self.branches.values().cloned().collect::<Vec<_>>();
        branches.sort_by(|a, b| a.branch_id.cmp(&b.branch_id));
        let mut attributes = self.attributes.values().cloned().collect::<Vec<_>>();
        attributes.sort_by(|a, b| a.attribute_id.cmp(&b.attribute_id));
        GraphSnapshot {
            notes,
            branches,
            attributes,
        }
    }
}
