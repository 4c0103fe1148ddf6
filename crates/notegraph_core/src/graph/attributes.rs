//! Attribute resolution: owned, inherited and effective attributes.
//!
//! # Responsibility
//! - Answer owned-attribute lookups by name.
//! - Compute attributes inherited from ancestors and templates.
//!
//! # Invariants
//! - Ancestors contribute only inheritable attributes.
//! - Templates (`~template` / `~inherit` targets) contribute all owned
//!   attributes except the `#template` marker.
//! - A closer definition of a `(kind, name)` shadows farther ones; at equal
//!   depth the first source in `(order key, note id)` order wins.
//! - Every `(note, source kind)` pair is expanded at most once.

use super::NoteGraph;
use crate::model::attribute::{Attribute, AttributeKind, ARCHIVED_LABEL, TEMPLATE_LABEL};
use crate::model::note::HIDDEN_NOTE_ID;
use std::collections::{HashMap, HashSet};

/// How an inherited attribute reached the note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum InheritanceSource {
    /// Inheritable attribute of an ancestor.
    Ancestor,
    /// Attribute of a template note.
    Template,
}

/// One attribute visible on a note through inheritance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InheritedAttribute<'g> {
    pub attribute: &'g Attribute,
    /// Note the attribute was found on.
    pub source_note_id: &'g str,
    /// Number of hops from the resolved note (parents and template links).
    pub depth: usize,
    pub source: InheritanceSource,
}

#[derive(Debug, Clone, Copy)]
struct Contributor<'g> {
    note_id: &'g str,
    source: InheritanceSource,
    order_key: i64,
}

/// Read-only attribute view over a [`NoteGraph`].
#[derive(Debug, Clone, Copy)]
pub struct AttributeResolver<'g> {
    graph: &'g NoteGraph,
}

impl<'g> AttributeResolver<'g> {
    pub fn new(graph: &'g NoteGraph) -> Self {
        Self { graph }
    }

    /// Live attributes owned by the note, in position order.
    pub fn owned_attributes(&self, note_id: &str) -> Vec<&'g Attribute> {
        self.graph.owned_attributes(note_id)
    }

    pub fn owned_labels(&self, note_id: &str, name: &str) -> Vec<&'g Attribute> {
        self.owned_named(note_id, AttributeKind::Label, name)
    }

    pub fn owned_relations(&self, note_id: &str, name: &str) -> Vec<&'g Attribute> {
        self.owned_named(note_id, AttributeKind::Relation, name)
    }

    /// Value of the first owned label with this name.
    pub fn owned_label_value(&self, note_id: &str, name: &str) -> Option<&'g str> {
        self.owned_labels(note_id, name)
            .first()
            .copied()
            .map(|attribute| attribute.value.as_str())
    }

    /// Attributes inherited from ancestors and templates, closest first.
    ///
    /// Names the note owns itself are never reported here.
    pub fn inherited_attributes(&self, note_id: &str) -> Vec<InheritedAttribute<'g>> {
        let Some(note) = self.graph.get_note(note_id) else {
            return Vec::new();
        };
        let note_id = note.note_id.as_str();

        let owned = self.graph.owned_attributes(note_id);
        let mut winners: HashMap<(AttributeKind, &'g str), (&'g str, InheritanceSource)> =
            HashMap::new();
        for &attribute in &owned {
            winners.insert(
                (attribute.kind, attribute.name.as_str()),
                (note_id, InheritanceSource::Template),
            );
        }

        let mut visited: HashSet<(&'g str, InheritanceSource)> = HashSet::new();
        visited.insert((note_id, InheritanceSource::Ancestor));
        visited.insert((note_id, InheritanceSource::Template));

        let mut inherited = Vec::new();
        let mut frontier = self.expand(note_id, &owned);
        let mut depth = 1;

        while !frontier.is_empty() {
            frontier.sort_by(|a, b| {
                a.order_key
                    .cmp(&b.order_key)
                    .then_with(|| a.note_id.cmp(b.note_id))
                    .then_with(|| a.source.cmp(&b.source))
            });

            let mut next = Vec::new();
            for contributor in frontier {
                if !visited.insert((contributor.note_id, contributor.source)) {
                    continue;
                }

                let contributed = self.contributed(contributor);
                for &attribute in &contributed {
                    let key = (attribute.kind, attribute.name.as_str());
                    let owner = (contributor.note_id, contributor.source);
                    match winners.get(&key) {
                        Some(winner) if *winner != owner => continue,
                        Some(_) => {}
                        None => {
                            winners.insert(key, owner);
                        }
                    }
                    inherited.push(InheritedAttribute {
                        attribute,
                        source_note_id: contributor.note_id,
                        depth,
                        source: contributor.source,
                    });
                }
                next.extend(self.expand(contributor.note_id, &contributed));
            }

            frontier = next;
            depth += 1;
        }

        inherited
    }

    /// Owned attributes followed by inherited ones not shadowed by them.
    pub fn effective_attributes(&self, note_id: &str) -> Vec<&'g Attribute> {
        let mut attributes = self.graph.owned_attributes(note_id);
        attributes.extend(
            self.inherited_attributes(note_id)
                .into_iter()
                .map(|inherited| inherited.attribute),
        );
        attributes
    }

    /// Effective attributes of one kind and name.
    pub fn effective_named(
        &self,
        note_id: &str,
        kind: AttributeKind,
        name: &str,
    ) -> Vec<&'g Attribute> {
        self.effective_attributes(note_id)
            .into_iter()
            .filter(|attribute| attribute.kind == kind && attribute.name == name)
            .collect()
    }

    /// Whether the note owns or inherits a label with this name.
    pub fn has_label(&self, note_id: &str, name: &str) -> bool {
        !self
            .effective_named(note_id, AttributeKind::Label, name)
            .is_empty()
    }

    /// Value of the closest label with this name.
    pub fn label_value(&self, note_id: &str, name: &str) -> Option<&'g str> {
        self.effective_named(note_id, AttributeKind::Label, name)
            .first()
            .copied()
            .map(|attribute| attribute.value.as_str())
    }

    pub fn is_archived(&self, note_id: &str) -> bool {
        self.has_label(note_id, ARCHIVED_LABEL)
    }

    fn owned_named(&self, note_id: &str, kind: AttributeKind, name: &str) -> Vec<&'g Attribute> {
        self.graph
            .owned_attributes(note_id)
            .into_iter()
            .filter(|attribute| attribute.kind == kind && attribute.name == name)
            .collect()
    }

    fn contributed(&self, contributor: Contributor<'g>) -> Vec<&'g Attribute> {
        self.graph
            .owned_attributes(contributor.note_id)
            .into_iter()
            .filter(|attribute| match contributor.source {
                InheritanceSource::Ancestor => attribute.is_inheritable,
                InheritanceSource::Template => {
                    !(attribute.is_label() && attribute.name == TEMPLATE_LABEL)
                }
            })
            .collect()
    }

    /// Sources one hop farther from `note_id`.
    fn expand(&self, note_id: &'g str, contributed: &[&'g Attribute]) -> Vec<Contributor<'g>> {
        let mut sources = Vec::new();
        if note_id != HIDDEN_NOTE_ID {
            for branch in self.graph.parent_branches(note_id) {
                sources.push(Contributor {
                    note_id: branch.parent_note_id.as_str(),
                    source: InheritanceSource::Ancestor,
                    order_key: branch.note_position,
                });
            }
        }
        for attribute in contributed {
            if !attribute.is_template_relation() {
                continue;
            }
            if let Some(template) = self.graph.get_note(&attribute.value) {
                sources.push(Contributor {
                    note_id: template.note_id.as_str(),
                    source: InheritanceSource::Template,
                    order_key: attribute.position,
                });
            }
        }
        sources
    }
}

impl NoteGraph {
    /// Attribute resolver borrowing this graph.
    pub fn attributes(&self) -> AttributeResolver<'_> {
        AttributeResolver::new(self)
    }
}
