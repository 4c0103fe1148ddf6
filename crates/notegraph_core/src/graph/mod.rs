//! In-memory note graph store.
//!
//! # Responsibility
//! - Own all notes, branches and attributes, indexed by id.
//! - Maintain reverse indexes (parents, children, owned attributes).
//! - Precompute per-note flat text for cheap search pre-filtering.
//! - Accept incremental patches from the mutation layer.
//!
//! # Invariants
//! - Read APIs never return soft-deleted entities.
//! - At most one live branch exists per parent/child pair.
//! - Live branches never form a cycle, whatever the liveness of their
//!   endpoints.
//! - Attribute names never change for a given attribute id.

pub mod attributes;
pub mod paths;
pub mod snapshot;

use crate::model::attribute::{Attribute, AttributeId};
use crate::model::branch::{Branch, BranchId};
use crate::model::note::{Note, NoteId, ROOT_NOTE_ID};
use crate::model::ValidationError;
use std::collections::{HashMap, HashSet};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub use attributes::AttributeResolver;
pub use paths::NotePathSelector;
pub use snapshot::GraphSnapshot;

/// Result type for graph patch operations.
pub type GraphResult<T> = Result<T, GraphError>;

/// Errors raised by the graph patch API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    /// Entity failed shape validation.
    Validation(ValidationError),
    /// Referenced note does not exist or is deleted.
    NoteNotFound(NoteId),
    /// Referenced branch does not exist.
    BranchNotFound(BranchId),
    /// Referenced attribute does not exist.
    AttributeNotFound(AttributeId),
    /// Another live branch already connects the same pair.
    DuplicateBranch {
        existing_branch_id: BranchId,
        parent_note_id: NoteId,
        note_id: NoteId,
    },
    /// Placing the note under the parent would create a cycle.
    CycleDetected {
        note_id: NoteId,
        parent_note_id: NoteId,
    },
    /// Attribute id is already registered under another name.
    AttributeRenamed {
        attribute_id: AttributeId,
        from: String,
        to: String,
    },
}

impl Display for GraphError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::NoteNotFound(id) => write!(f, "note not found: {id}"),
            Self::BranchNotFound(id) => write!(f, "branch not found: {id}"),
            Self::AttributeNotFound(id) => write!(f, "attribute not found: {id}"),
            Self::DuplicateBranch {
                existing_branch_id,
                parent_note_id,
                note_id,
            } => write!(
                f,
                "note {note_id} is already placed under {parent_note_id} by branch {existing_branch_id}"
            ),
            Self::CycleDetected {
                note_id,
                parent_note_id,
            } => write!(
                f,
                "placing note {note_id} under {parent_note_id} would create a cycle"
            ),
            Self::AttributeRenamed {
                attribute_id,
                from,
                to,
            } => write!(
                f,
                "attribute {attribute_id} cannot be renamed from `{from}` to `{to}`"
            ),
        }
    }
}

impl Error for GraphError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ValidationError> for GraphError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

/// Arena-style store of the whole note graph.
#[derive(Debug, Clone, Default)]
pub struct NoteGraph {
    notes: HashMap<NoteId, Note>,
    branches: HashMap<BranchId, Branch>,
    attributes: HashMap<AttributeId, Attribute>,
    /// child note id -> branch ids placing it (including deleted ones).
    parent_branch_ids: HashMap<NoteId, Vec<BranchId>>,
    /// parent note id -> branch ids below it (including deleted ones).
    child_branch_ids: HashMap<NoteId, Vec<BranchId>>,
    /// owner note id -> attribute ids (including deleted ones).
    owned_attribute_ids: HashMap<NoteId, Vec<AttributeId>>,
    flat_texts: HashMap<NoteId, String>,
}

impl NoteGraph {
    /// Creates an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads one live note by id.
    pub fn get_note(&self, note_id: &str) -> Option<&Note> {
        self.notes.get(note_id).filter(|note| note.is_active())
    }

    pub fn has_note(&self, note_id: &str) -> bool {
        self.get_note(note_id).is_some()
    }

    /// Iterates live notes in no particular order.
    pub fn all_notes(&self) -> impl Iterator<Item = &Note> {
        self.notes.values().filter(|note| note.is_active())
    }

    pub fn note_count(&self) -> usize {
        self.all_notes().count()
    }

    pub fn get_branch(&self, branch_id: &str) -> Option<&Branch> {
        self.branches.get(branch_id).filter(|branch| branch.is_active())
    }

    pub fn get_attribute(&self, attribute_id: &str) -> Option<&Attribute> {
        self.attributes
            .get(attribute_id)
            .filter(|attribute| attribute.is_active())
    }

    /// Live branches placing `note_id`, in parent order.
    ///
    /// Parents in system subtrees (`_` prefixed ids) sort last, then by id.
    pub fn parent_branches(&self, note_id: &str) -> Vec<&Branch> {
        let mut branches = self
            .parent_branch_ids
            .get(note_id)
            .into_iter()
            .flatten()
            .filter_map(|branch_id| self.get_branch(branch_id))
            .filter(|branch| self.has_note(&branch.parent_note_id))
            .collect::<Vec<_>>();
        branches.sort_by(|a, b| {
            let a_system = a.parent_note_id.starts_with('_');
            let b_system = b.parent_note_id.starts_with('_');
            a_system
                .cmp(&b_system)
                .then_with(|| a.parent_note_id.cmp(&b.parent_note_id))
        });
        branches
    }

    /// Live parent notes of `note_id`, in parent order.
    pub fn parents(&self, note_id: &str) -> Vec<&Note> {
        self.parent_branches(note_id)
            .into_iter()
            .filter_map(|branch| self.get_note(&branch.parent_note_id))
            .collect()
    }

    /// Live branches below `note_id`, ordered by `note_position ASC, note_id ASC`.
    pub fn child_branches(&self, note_id: &str) -> Vec<&Branch> {
        let mut branches = self
            .child_branch_ids
            .get(note_id)
            .into_iter()
            .flatten()
            .filter_map(|branch_id| self.get_branch(branch_id))
            .filter(|branch| self.has_note(&branch.note_id))
            .collect::<Vec<_>>();
        branches.sort_by(|a, b| {
            a.note_position
                .cmp(&b.note_position)
                .then_with(|| a.note_id.cmp(&b.note_id))
        });
        branches
    }

    pub fn children(&self, note_id: &str) -> Vec<&Note> {
        self.child_branches(note_id)
            .into_iter()
            .filter_map(|branch| self.get_note(&branch.note_id))
            .collect()
    }

    /// Live attributes owned by `note_id`, ordered by `position ASC, attribute_id ASC`.
    pub fn owned_attributes(&self, note_id: &str) -> Vec<&Attribute> {
        let mut attributes = self
            .owned_attribute_ids
            .get(note_id)
            .into_iter()
            .flatten()
            .filter_map(|attribute_id| self.get_attribute(attribute_id))
            .collect::<Vec<_>>();
        attributes.sort_by(|a, b| {
            a.position
                .cmp(&b.position)
                .then_with(|| a.attribute_id.cmp(&b.attribute_id))
        });
        attributes
    }

    /// Live branch connecting `parent_note_id` to `note_id`, if any.
    pub fn get_branch_from_child_and_parent(
        &self,
        note_id: &str,
        parent_note_id: &str,
    ) -> Option<&Branch> {
        self.parent_branch_ids
            .get(note_id)?
            .iter()
            .filter_map(|branch_id| self.get_branch(branch_id))
            .find(|branch| branch.parent_note_id == parent_note_id)
    }

    /// Title of `note_id` as displayed under `parent_note_id`.
    ///
    /// Branch prefixes render as `"{prefix} - {title}"`.
    pub fn note_title(&self, note_id: &str, parent_note_id: Option<&str>) -> Option<String> {
        let note = self.get_note(note_id)?;
        let prefix = parent_note_id
            .and_then(|parent| self.get_branch_from_child_and_parent(note_id, parent))
            .and_then(Branch::display_prefix);
        Some(match prefix {
            Some(prefix) => format!("{prefix} - {}", note.title),
            None => note.title.clone(),
        })
    }

    /// Precomputed lower-cased searchable text of a live note.
    pub fn flat_text(&self, note_id: &str) -> Option<&str> {
        if !self.has_note(note_id) {
            return None;
        }
        self.flat_texts.get(note_id).map(String::as_str)
    }

    /// Whether `ancestor_id` is reachable from `note_id` by walking parents.
    pub fn is_ancestor(&self, ancestor_id: &str, note_id: &str) -> bool {
        let mut visited = HashSet::new();
        let mut stack = vec![note_id.to_string()];
        while let Some(current) = stack.pop() {
            for branch in self.parent_branches(&current) {
                if branch.parent_note_id == ancestor_id {
                    return true;
                }
                if visited.insert(branch.parent_note_id.clone()) {
                    stack.push(branch.parent_note_id.clone());
                }
            }
        }
        false
    }

    /// Whether placing `note_id` under `candidate_parent_id` would create a cycle.
    ///
    /// Follows every live branch, including those whose endpoints are
    /// currently deleted: restoring such a note revives the branch.
    pub fn would_create_cycle(&self, note_id: &str, candidate_parent_id: &str) -> bool {
        if note_id == candidate_parent_id {
            return true;
        }
        let mut visited = HashSet::new();
        let mut stack = vec![candidate_parent_id];
        while let Some(current) = stack.pop() {
            let placing = self
                .parent_branch_ids
                .get(current)
                .into_iter()
                .flatten()
                .filter_map(|branch_id| self.get_branch(branch_id));
            for branch in placing {
                let parent = branch.parent_note_id.as_str();
                if parent == note_id {
                    return true;
                }
                if visited.insert(parent) {
                    stack.push(parent);
                }
            }
        }
        false
    }

    /// Inserts or replaces one note.
    ///
    /// Restoring a deleted note revives the live branches around it.
    pub fn upsert_note(&mut self, note: Note) -> GraphResult<()> {
        note.validate()?;
        let note_id = note.note_id.clone();
        self.notes.insert(note_id.clone(), note);
        self.refresh_flat_text(&note_id);
        self.refresh_children_flat_text(&note_id);
        Ok(())
    }

    /// Inserts or replaces one branch.
    ///
    /// # Errors
    /// - Endpoints must be live notes (for live branches).
    /// - A second live branch for the same pair is rejected.
    /// - A branch closing a cycle is rejected.
    pub fn upsert_branch(&mut self, branch: Branch) -> GraphResult<()> {
        branch.validate()?;

        if branch.is_active() {
            for note_id in [&branch.note_id, &branch.parent_note_id] {
                if !self.has_note(note_id) {
                    return Err(GraphError::NoteNotFound(note_id.clone()));
                }
            }
            if let Some(existing) =
                self.get_branch_from_child_and_parent(&branch.note_id, &branch.parent_note_id)
            {
                if existing.branch_id != branch.branch_id {
                    return Err(GraphError::DuplicateBranch {
                        existing_branch_id: existing.branch_id.clone(),
                        parent_note_id: branch.parent_note_id.clone(),
                        note_id: branch.note_id.clone(),
                    });
                }
            } else if self.would_create_cycle(&branch.note_id, &branch.parent_note_id) {
                return Err(GraphError::CycleDetected {
                    note_id: branch.note_id.clone(),
                    parent_note_id: branch.parent_note_id.clone(),
                });
            }
        }

        let previous_child = self.unindex_branch(&branch.branch_id);
        let branch_id = branch.branch_id.clone();
        let note_id = branch.note_id.clone();
        self.parent_branch_ids
            .entry(branch.note_id.clone())
            .or_default()
            .push(branch_id.clone());
        self.child_branch_ids
            .entry(branch.parent_note_id.clone())
            .or_default()
            .push(branch_id.clone());
        self.branches.insert(branch_id, branch);

        if let Some(previous_child) = previous_child {
            if previous_child != note_id {
                self.refresh_flat_text(&previous_child);
            }
        }
        self.refresh_flat_text(&note_id);
        Ok(())
    }

    /// Inserts or replaces one attribute.
    ///
    /// # Errors
    /// - The owner of a live attribute must be a live note.
    /// - An existing attribute id must keep its name.
    pub fn upsert_attribute(&mut self, attribute: Attribute) -> GraphResult<()> {
        attribute.validate()?;
        if attribute.is_active() && !self.has_note(&attribute.note_id) {
            return Err(GraphError::NoteNotFound(attribute.note_id.clone()));
        }
        if let Some(existing) = self.attributes.get(&attribute.attribute_id) {
            if existing.name != attribute.name {
                return Err(GraphError::AttributeRenamed {
                    attribute_id: attribute.attribute_id.clone(),
                    from: existing.name.clone(),
                    to: attribute.name.clone(),
                });
            }
        }

        let previous_owner = self.unindex_attribute(&attribute.attribute_id);
        let owner = attribute.note_id.clone();
        self.owned_attribute_ids
            .entry(owner.clone())
            .or_default()
            .push(attribute.attribute_id.clone());
        self.attributes
            .insert(attribute.attribute_id.clone(), attribute);

        if let Some(previous_owner) = previous_owner {
            if previous_owner != owner {
                self.refresh_flat_text(&previous_owner);
            }
        }
        self.refresh_flat_text(&owner);
        Ok(())
    }

    /// Soft-deletes one note. Branches and attributes are left to the caller.
    pub fn delete_note(&mut self, note_id: &str) -> GraphResult<()> {
        let note = self
            .notes
            .get_mut(note_id)
            .filter(|note| note.is_active())
            .ok_or_else(|| GraphError::NoteNotFound(note_id.to_string()))?;
        note.soft_delete();
        self.flat_texts.remove(note_id);
        self.refresh_children_flat_text(note_id);
        Ok(())
    }

    /// Soft-deletes one branch.
    pub fn delete_branch(&mut self, branch_id: &str) -> GraphResult<()> {
        let branch = self
            .branches
            .get_mut(branch_id)
            .filter(|branch| branch.is_active())
            .ok_or_else(|| GraphError::BranchNotFound(branch_id.to_string()))?;
        branch.is_deleted = true;
        let note_id = branch.note_id.clone();
        self.refresh_flat_text(&note_id);
        Ok(())
    }

    /// Soft-deletes one attribute.
    pub fn delete_attribute(&mut self, attribute_id: &str) -> GraphResult<()> {
        let attribute = self
            .attributes
            .get_mut(attribute_id)
            .filter(|attribute| attribute.is_active())
            .ok_or_else(|| GraphError::AttributeNotFound(attribute_id.to_string()))?;
        attribute.is_deleted = true;
        let owner = attribute.note_id.clone();
        self.refresh_flat_text(&owner);
        Ok(())
    }

    /// Ids of live notes other than root that have no live parent.
    pub fn orphan_note_ids(&self) -> Vec<NoteId> {
        let mut orphans = self
            .all_notes()
            .filter(|note| !note.is_root() && self.parent_branches(&note.note_id).is_empty())
            .map(|note| note.note_id.clone())
            .collect::<Vec<_>>();
        orphans.sort();
        orphans
    }

    /// Whether the designated root note is present.
    pub fn has_root(&self) -> bool {
        self.has_note(ROOT_NOTE_ID)
    }

    fn unindex_branch(&mut self, branch_id: &str) -> Option<NoteId> {
        let previous = self.branches.get(branch_id)?;
        let (child, parent) = (previous.note_id.clone(), previous.parent_note_id.clone());
        if let Some(ids) = self.parent_branch_ids.get_mut(&child) {
            ids.retain(|id| id != branch_id);
        }
        if let Some(ids) = self.child_branch_ids.get_mut(&parent) {
            ids.retain(|id| id != branch_id);
        }
        Some(child)
    }

    fn unindex_attribute(&mut self, attribute_id: &str) -> Option<NoteId> {
        let owner = self.attributes.get(attribute_id)?.note_id.clone();
        if let Some(ids) = self.owned_attribute_ids.get_mut(&owner) {
            ids.retain(|id| id != attribute_id);
        }
        Some(owner)
    }

    fn refresh_flat_text(&mut self, note_id: &str) {
        match self.build_flat_text(note_id) {
            Some(text) => {
                self.flat_texts.insert(note_id.to_string(), text);
            }
            None => {
                self.flat_texts.remove(note_id);
            }
        }
    }

    /// Child flat text carries branch prefixes, which depend on parent liveness.
    fn refresh_children_flat_text(&mut self, note_id: &str) {
        let child_ids = self
            .child_branch_ids
            .get(note_id)
            .into_iter()
            .flatten()
            .filter_map(|branch_id| self.branches.get(branch_id))
            .map(|branch| branch.note_id.clone())
            .collect::<Vec<_>>();
        for child_id in child_ids {
            self.refresh_flat_text(&child_id);
        }
    }

    fn build_flat_text(&self, note_id: &str) -> Option<String> {
        let note = self.get_note(note_id)?;
        let mut parts = vec![
            note.note_id.clone(),
            note.kind.as_str().to_string(),
            note.mime.clone(),
        ];
        for branch in self.parent_branches(note_id) {
            if let Some(prefix) = branch.display_prefix() {
                parts.push(prefix.to_string());
            }
        }
        parts.push(note.title.clone());
        for attribute in self.owned_attributes(note_id) {
            parts.push(attribute.flat_text());
        }
        if !note.content.is_empty() {
            parts.push(note.content.clone());
        }
        Some(parts.join(" ").to_lowercase())
    }
}
