//! Branch domain model.
//!
//! A branch is one placement of a note under a parent. A note placed under
//! several parents is a clone.
//!
//! # Invariants
//! - At most one live branch exists per `(parent_note_id, note_id)` pair.
//! - `note_id != parent_note_id`.

use super::note::NoteId;
use super::{ensure_id, ValidationError};
use serde::{Deserialize, Serialize};

/// Stable identifier for branches.
pub type BranchId = String;

/// Directed parent -> child edge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Branch {
    /// Empty in snapshots means "derive from the endpoints".
    #[serde(default)]
    pub branch_id: BranchId,
    /// Child note.
    pub note_id: NoteId,
    pub parent_note_id: NoteId,
    /// Sibling order key within the parent.
    #[serde(default)]
    pub note_position: i64,
    #[serde(default)]
    pub prefix: Option<String>,
    #[serde(default)]
    pub is_expanded: bool,
    #[serde(default)]
    pub is_deleted: bool,
}

impl Branch {
    /// Creates a branch with the conventional `{parent}_{child}` id.
    pub fn new(parent_note_id: impl Into<NoteId>, note_id: impl Into<NoteId>) -> Self {
        let parent_note_id = parent_note_id.into();
        let note_id = note_id.into();
        Self {
            branch_id: default_branch_id(&parent_note_id, &note_id),
            note_id,
            parent_note_id,
            note_position: 0,
            prefix: None,
            is_expanded: false,
            is_deleted: false,
        }
    }

    pub fn with_position(mut self, note_position: i64) -> Self {
        self.note_position = note_position;
        self
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Prefix shown before the title, if any non-blank one is set.
    pub fn display_prefix(&self) -> Option<&str> {
        self.prefix
            .as_deref()
            .map(str::trim)
            .filter(|prefix| !prefix.is_empty())
    }

    pub fn is_active(&self) -> bool {
        !self.is_deleted
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        ensure_id(&self.branch_id, "branch")?;
        ensure_id(&self.note_id, "branch child note")?;
        ensure_id(&self.parent_note_id, "branch parent note")?;
        if self.note_id == self.parent_note_id {
            return Err(ValidationError::SelfParentBranch {
                note_id: self.note_id.clone(),
            });
        }
        Ok(())
    }
}

/// Conventional branch id for one parent/child pair.
pub fn default_branch_id(parent_note_id: &str, note_id: &str) -> BranchId {
    format!("{parent_note_id}_{note_id}")
}
