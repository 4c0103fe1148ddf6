//! Attribute domain model.
//!
//! # Responsibility
//! - Define labels (flag or value) and relations (pointer to another note).
//! - Validate attribute names.
//!
//! # Invariants
//! - An attribute is owned by exactly one note.
//! - `name` is immutable once created; renames are delete + create.
//! - A relation's `value` is the target note id.

use super::note::NoteId;
use super::{ensure_id, ValidationError};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

static ATTRIBUTE_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\p{L}\p{N}_:]+$").expect("valid attribute name regex"));

/// Stable identifier for attributes.
pub type AttributeId = String;

/// Relation name that makes the target a template of the owner.
pub const TEMPLATE_RELATION: &str = "template";
/// Relation name that copies the target's attributes like a template.
pub const INHERIT_RELATION: &str = "inherit";
/// Label marking a note as a template; never passed on to template users.
pub const TEMPLATE_LABEL: &str = "template";
/// Label marking a note (and, when inheritable, its subtree) as archived.
pub const ARCHIVED_LABEL: &str = "archived";

/// Attribute kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeKind {
    /// Flag or string value.
    Label,
    /// Pointer to another note.
    Relation,
}

impl AttributeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Label => "label",
            Self::Relation => "relation",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "label" => Some(Self::Label),
            "relation" => Some(Self::Relation),
            _ => None,
        }
    }

    /// Sigil used when rendering the attribute into flat text.
    fn sigil(self) -> char {
        match self {
            Self::Label => '#',
            Self::Relation => '~',
        }
    }
}

/// Typed key/value fact owned by one note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    pub attribute_id: AttributeId,
    /// Owning note.
    pub note_id: NoteId,
    /// Serialized as `type` to match external schema naming.
    #[serde(rename = "type")]
    pub kind: AttributeKind,
    pub name: String,
    #[serde(default)]
    pub value: String,
    /// Order among the owner's attributes.
    #[serde(default)]
    pub position: i64,
    /// Propagates to descendants when set.
    #[serde(default)]
    pub is_inheritable: bool,
    #[serde(default)]
    pub is_deleted: bool,
}

impl Attribute {
    /// Creates a label with a generated id.
    pub fn label(
        note_id: impl Into<NoteId>,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self::with_kind(AttributeKind::Label, note_id, name, value)
    }

    /// Creates a relation pointing at `target_note_id`.
    pub fn relation(
        note_id: impl Into<NoteId>,
        name: impl Into<String>,
        target_note_id: impl Into<NoteId>,
    ) -> Self {
        Self::with_kind(AttributeKind::Relation, note_id, name, target_note_id)
    }

    fn with_kind(
        kind: AttributeKind,
        note_id: impl Into<NoteId>,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            attribute_id: Uuid::new_v4().simple().to_string(),
            note_id: note_id.into(),
            kind,
            name: name.into(),
            value: value.into(),
            position: 0,
            is_inheritable: false,
            is_deleted: false,
        }
    }

    pub fn with_id(mut self, attribute_id: impl Into<AttributeId>) -> Self {
        self.attribute_id = attribute_id.into();
        self
    }

    pub fn with_position(mut self, position: i64) -> Self {
        self.position = position;
        self
    }

    /// Marks the attribute as propagating to descendants.
    pub fn inheritable(mut self) -> Self {
        self.is_inheritable = true;
        self
    }

    pub fn is_label(&self) -> bool {
        self.kind == AttributeKind::Label
    }

    pub fn is_relation(&self) -> bool {
        self.kind == AttributeKind::Relation
    }

    /// Whether this relation pulls in a template's attributes.
    pub fn is_template_relation(&self) -> bool {
        self.is_relation() && (self.name == TEMPLATE_RELATION || self.name == INHERIT_RELATION)
    }

    pub fn is_active(&self) -> bool {
        !self.is_deleted
    }

    /// `#name=value` / `~name=value` rendering used for flat text.
    pub fn flat_text(&self) -> String {
        if self.value.is_empty() {
            format!("{}{}", self.kind.sigil(), self.name)
        } else {
            format!("{}{}={}", self.kind.sigil(), self.name, self.value)
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        ensure_id(&self.attribute_id, "attribute")?;
        ensure_id(&self.note_id, "attribute owner note")?;
        if !ATTRIBUTE_NAME_RE.is_match(&self.name) {
            return Err(ValidationError::InvalidAttributeName(self.name.clone()));
        }
        if self.is_relation() && self.value.trim().is_empty() {
            return Err(ValidationError::EmptyRelationTarget {
                attribute_id: self.attribute_id.clone(),
            });
        }
        Ok(())
    }
}
