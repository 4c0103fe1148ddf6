//! Domain model for the in-memory note graph.
//!
//! # Responsibility
//! - Define the canonical note, branch and attribute records.
//! - Validate entity shape before it enters the graph store.
//!
//! # Invariants
//! - Every entity is identified by a stable, non-empty string id.
//! - Deletion is represented by soft-delete flags, not removal.
//! - Only the note with id [`note::ROOT_NOTE_ID`] may have zero parents.

pub mod attribute;
pub mod branch;
pub mod note;

use std::error::Error;
use std::fmt::{Display, Formatter};

/// Shape violations detected before an entity is accepted by the graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Identifier field is blank.
    EmptyId { entity: &'static str },
    /// Attribute name is empty or contains unsupported characters.
    InvalidAttributeName(String),
    /// Relation attribute has no target note id.
    EmptyRelationTarget { attribute_id: String },
    /// Branch points a note at itself.
    SelfParentBranch { note_id: String },
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyId { entity } => write!(f, "{entity} id must not be blank"),
            Self::InvalidAttributeName(name) => write!(f, "invalid attribute name `{name}`"),
            Self::EmptyRelationTarget { attribute_id } => {
                write!(f, "relation {attribute_id} has no target note")
            }
            Self::SelfParentBranch { note_id } => {
                write!(f, "note {note_id} cannot be its own parent")
            }
        }
    }
}

impl Error for ValidationError {}

pub(crate) fn ensure_id(value: &str, entity: &'static str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::EmptyId { entity });
    }
    Ok(())
}
