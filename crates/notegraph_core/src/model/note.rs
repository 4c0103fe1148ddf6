//! Note domain model.
//!
//! # Responsibility
//! - Define the graph vertex record and its type tag.
//! - Provide lifecycle helpers for soft-delete semantics.
//!
//! # Invariants
//! - `note_id` is stable and never reused for another note.
//! - `is_deleted` is the source of truth for tombstone state.
//! - `content` is opaque text supplied by the content store.

use super::{ensure_id, ValidationError};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier for notes.
pub type NoteId = String;

/// Root-to-note sequence of note ids, inclusive on both ends.
pub type NotePath = Vec<NoteId>;

/// Id of the designated graph root.
pub const ROOT_NOTE_ID: &str = "root";
/// Id of the system subtree that search paths should avoid.
pub const HIDDEN_NOTE_ID: &str = "_hidden";

const GENERATED_ID_LEN: usize = 12;

/// Content type tag of a note.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NoteType {
    #[default]
    Text,
    Code,
    Render,
    File,
    Image,
    Search,
    RelationMap,
    Book,
    NoteMap,
    Mermaid,
    Canvas,
    WebView,
    Launcher,
    Doc,
    ContentWidget,
    MindMap,
    AiChat,
}

impl NoteType {
    /// All supported note types.
    pub const ALL: [NoteType; 17] = [
        Self::Text,
        Self::Code,
        Self::Render,
        Self::File,
        Self::Image,
        Self::Search,
        Self::RelationMap,
        Self::Book,
        Self::NoteMap,
        Self::Mermaid,
        Self::Canvas,
        Self::WebView,
        Self::Launcher,
        Self::Doc,
        Self::ContentWidget,
        Self::MindMap,
        Self::AiChat,
    ];

    /// Stable wire name, also used as the searchable type tag.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Code => "code",
            Self::Render => "render",
            Self::File => "file",
            Self::Image => "image",
            Self::Search => "search",
            Self::RelationMap => "relationMap",
            Self::Book => "book",
            Self::NoteMap => "noteMap",
            Self::Mermaid => "mermaid",
            Self::Canvas => "canvas",
            Self::WebView => "webView",
            Self::Launcher => "launcher",
            Self::Doc => "doc",
            Self::ContentWidget => "contentWidget",
            Self::MindMap => "mindMap",
            Self::AiChat => "aiChat",
        }
    }

    /// MIME assigned to new notes of this type.
    pub fn default_mime(self) -> &'static str {
        match self {
            Self::Text => "text/html",
            Self::Code => "text/plain",
            Self::File => "application/octet-stream",
            Self::RelationMap | Self::Canvas | Self::MindMap | Self::AiChat => "application/json",
            Self::Mermaid => "text/vnd.mermaid",
            Self::Render
            | Self::Image
            | Self::Search
            | Self::Book
            | Self::NoteMap
            | Self::WebView
            | Self::Launcher
            | Self::Doc
            | Self::ContentWidget => "",
        }
    }

    /// Parses a wire name produced by [`NoteType::as_str`].
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == value)
    }
}

/// Graph vertex representing one unit of content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub note_id: NoteId,
    pub title: String,
    /// Serialized as `type` to match external schema naming.
    #[serde(rename = "type", default)]
    pub kind: NoteType,
    #[serde(default)]
    pub mime: String,
    /// Searchable rendering of the note body.
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub is_deleted: bool,
}

impl Note {
    /// Creates a text note with the type's default MIME.
    pub fn new(note_id: impl Into<NoteId>, title: impl Into<String>) -> Self {
        Self {
            note_id: note_id.into(),
            title: title.into(),
            kind: NoteType::Text,
            mime: NoteType::Text.default_mime().to_string(),
            content: String::new(),
            is_deleted: false,
        }
    }

    /// Creates a note with a freshly generated id.
    pub fn with_generated_id(title: impl Into<String>) -> Self {
        Self::new(new_note_id(), title)
    }

    /// Switches type and resets MIME to the type default.
    pub fn with_type(mut self, kind: NoteType) -> Self {
        self.kind = kind;
        self.mime = kind.default_mime().to_string();
        self
    }

    pub fn with_mime(mut self, mime: impl Into<String>) -> Self {
        self.mime = mime.into();
        self
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    /// Whether this is the designated graph root.
    pub fn is_root(&self) -> bool {
        self.note_id == ROOT_NOTE_ID
    }

    /// Marks this note as softly deleted.
    pub fn soft_delete(&mut self) {
        self.is_deleted = true;
    }

    /// Clears soft delete flag.
    pub fn restore(&mut self) {
        self.is_deleted = false;
    }

    pub fn is_active(&self) -> bool {
        !self.is_deleted
    }

    /// Checks record shape before it is accepted by the graph store.
    pub fn validate(&self) -> Result<(), ValidationError> {
        ensure_id(&self.note_id, "note")
    }
}

/// Generates a random 12-character note id.
pub fn new_note_id() -> NoteId {
    Uuid::new_v4()
        .simple()
        .to_string()
        .chars()
        .take(GENERATED_ID_LEN)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{new_note_id, Note, NoteType};

    #[test]
    fn note_type_wire_names_round_trip() {
        for kind in NoteType::ALL {
            assert_eq!(NoteType::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(NoteType::parse("spreadsheet"), None);
    }

    #[test]
    fn with_type_resets_mime() {
        let note = Note::new("n1", "Diagram").with_type(NoteType::Mermaid);
        assert_eq!(note.mime, "text/vnd.mermaid");
    }

    #[test]
    fn generated_ids_are_short_and_distinct() {
        let first = new_note_id();
        let second = new_note_id();
        assert_eq!(first.len(), 12);
        assert_ne!(first, second);
    }

    #[test]
    fn blank_id_fails_validation() {
        assert!(Note::new("  ", "x").validate().is_err());
    }
}
