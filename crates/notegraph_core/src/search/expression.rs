//! Search expression trees.
//!
//! # Responsibility
//! - Represent a parsed query as a closed tree of predicates.
//! - Evaluate the tree over an input note set.
//!
//! # Invariants
//! - The output of every node is a subset of its input.
//! - `And` feeds each child the previous child's output; `Or` and `Not`
//!   evaluate children on the node's own input.

use super::comparator::Comparator;
use super::context::SearchContext;
use super::flat_text::{ensure_known_notes, FlatTextSearch};
use super::note_set::NoteSet;
use super::tokens::{normalize, normalize_tokens};
use super::SearchResult;
use crate::graph::{AttributeResolver, NoteGraph};
use crate::model::attribute::AttributeKind;

/// Query predicate tree.
#[derive(Debug, Clone)]
pub enum Expression {
    /// Passes the input through.
    Everything,
    /// Token path matching over titles, tags and attributes. Tokens are
    /// normalized before matching.
    NoteFlatText { tokens: Vec<String> },
    /// Note owns or inherits an attribute of this kind and name.
    AttributeExists { kind: AttributeKind, name: String },
    /// Note has an effective label with this name whose value satisfies
    /// the comparator.
    LabelComparison { name: String, comparator: Comparator },
    And(Vec<Expression>),
    Or(Vec<Expression>),
    Not(Box<Expression>),
}

impl Expression {
    /// Flat-text node with normalized tokens.
    pub fn flat_text<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::NoteFlatText {
            tokens: normalize_tokens(tokens),
        }
    }

    pub fn label_exists(name: impl AsRef<str>) -> Self {
        Self::AttributeExists {
            kind: AttributeKind::Label,
            name: name.as_ref().trim().to_string(),
        }
    }

    pub fn relation_exists(name: impl AsRef<str>) -> Self {
        Self::AttributeExists {
            kind: AttributeKind::Relation,
            name: name.as_ref().trim().to_string(),
        }
    }

    /// Label comparison node, e.g. `#status = active`.
    ///
    /// # Errors
    /// - Unsupported operator or invalid `%=` pattern.
    pub fn label_comparison(
        name: impl AsRef<str>,
        operator: &str,
        operand: &str,
    ) -> SearchResult<Self> {
        Ok(Self::LabelComparison {
            name: name.as_ref().trim().to_string(),
            comparator: Comparator::parse(operator, operand)?,
        })
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(child: Expression) -> Self {
        Self::Not(Box::new(child))
    }

    /// Evaluates this tree over `input`.
    ///
    /// # Errors
    /// - `UnknownNote` when `input` names a note missing from the graph.
    /// - `BranchBudgetExceeded` when a flat-text node runs out of budget.
    pub fn evaluate(
        &self,
        graph: &NoteGraph,
        input: &NoteSet,
        context: &mut SearchContext,
    ) -> SearchResult<NoteSet> {
        ensure_known_notes(graph, input)?;
        self.execute(graph, input, context)
    }

    fn execute(
        &self,
        graph: &NoteGraph,
        input: &NoteSet,
        context: &mut SearchContext,
    ) -> SearchResult<NoteSet> {
        match self {
            Self::Everything => Ok(input.clone()),
            Self::NoteFlatText { tokens } => {
                FlatTextSearch::new(graph, tokens).execute(input, context)
            }
            Self::AttributeExists { kind, name } => {
                let resolver = graph.attributes();
                Ok(filter(input, |note_id| {
                    has_attribute(&resolver, note_id, *kind, name)
                }))
            }
            Self::LabelComparison { name, comparator } => {
                let resolver = graph.attributes();
                Ok(filter(input, |note_id| {
                    label_satisfies(&resolver, note_id, name, comparator)
                }))
            }
            Self::And(children) => {
                let mut current = input.clone();
                for child in children {
                    if current.is_empty() {
                        break;
                    }
                    current = child.execute(graph, &current, context)?;
                }
                Ok(current)
            }
            Self::Or(children) => {
                let mut merged = NoteSet::new();
                for child in children {
                    merged.merge_in(&child.execute(graph, input, context)?);
                }
                // Input enumeration order, paths from the children.
                let mut result = NoteSet::new();
                for note_id in input.notes().filter(|note_id| merged.has(note_id)) {
                    match merged.path(note_id) {
                        Some(path) => result.add_with_path(note_id.clone(), path.clone()),
                        None => result.add(note_id.clone()),
                    }
                }
                Ok(result)
            }
            Self::Not(child) => {
                let matched = child.execute(graph, input, context)?;
                Ok(input.minus(&matched))
            }
        }
    }
}

fn filter(input: &NoteSet, keep: impl Fn(&str) -> bool) -> NoteSet {
    input.intersect(&NoteSet::from_ids(
        input.notes().filter(|note_id| keep(note_id)).cloned(),
    ))
}

fn has_attribute(
    resolver: &AttributeResolver<'_>,
    note_id: &str,
    kind: AttributeKind,
    name: &str,
) -> bool {
    let name = normalize(name);
    resolver
        .effective_attributes(note_id)
        .into_iter()
        .any(|attribute| attribute.kind == kind && normalize(&attribute.name) == name)
}

fn label_satisfies(
    resolver: &AttributeResolver<'_>,
    note_id: &str,
    name: &str,
    comparator: &Comparator,
) -> bool {
    let name = normalize(name);
    resolver
        .effective_attributes(note_id)
        .into_iter()
        .filter(|attribute| attribute.is_label() && normalize(&attribute.name) == name)
        .any(|attribute| comparator.matches(&attribute.value))
}

#[cfg(test)]
mod tests {
    use super::Expression;
    use crate::graph::NoteGraph;
    use crate::model::attribute::Attribute;
    use crate::model::branch::Branch;
    use crate::model::note::Note;
    use crate::search::context::SearchContext;
    use crate::search::note_set::NoteSet;

    fn graph() -> NoteGraph {
        let mut graph = NoteGraph::new();
        graph.upsert_note(Note::new("root", "root")).unwrap();
        for (id, title) in [("a", "Alpha"), ("b", "Beta"), ("c", "Gamma")] {
            graph.upsert_note(Note::new(id, title)).unwrap();
            graph.upsert_branch(Branch::new("root", id)).unwrap();
        }
        graph
            .upsert_attribute(Attribute::label("a", "status", "active"))
            .unwrap();
        graph
            .upsert_attribute(Attribute::label("b", "status", "done"))
            .unwrap();
        graph
    }

    #[test]
    fn and_narrows_sequentially() {
        let graph = graph();
        let input = NoteSet::from_ids(["a", "b", "c"]);
        let expression = Expression::And(vec![
            Expression::label_exists("status"),
            Expression::label_comparison("status", "=", "active").unwrap(),
        ]);
        let result = expression
            .evaluate(&graph, &input, &mut SearchContext::default())
            .unwrap();
        assert_eq!(result, NoteSet::from_ids(["a"]));
    }

    #[test]
    fn or_and_not_stay_within_input() {
        let graph = graph();
        let input = NoteSet::from_ids(["c", "b", "a"]);
        let either = Expression::Or(vec![
            Expression::label_comparison("status", "=", "done").unwrap(),
            Expression::flat_text(["gamma"]),
        ]);
        let result = either
            .evaluate(&graph, &input, &mut SearchContext::default())
            .unwrap();
        assert_eq!(result.notes().cloned().collect::<Vec<_>>(), vec!["c", "b"]);

        let negated = Expression::not(Expression::label_exists("status"));
        let result = negated
            .evaluate(&graph, &input, &mut SearchContext::default())
            .unwrap();
        assert_eq!(result, NoteSet::from_ids(["c"]));
    }
}
