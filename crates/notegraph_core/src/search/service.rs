//! Query entry point producing display-ready hits.
//!
//! # Responsibility
//! - Turn raw query text into a flat-text expression over the scoped notes.
//! - Shape matches into hits carrying their justifying path and titles.
//!
//! # Invariants
//! - Archived notes are excluded unless explicitly requested.
//! - Hit ordering is deterministic: path length, lower-cased title, note id.

use super::context::{SearchContext, SearchOptions};
use super::expression::Expression;
use super::note_set::NoteSet;
use super::tokens::tokenize_query;
use super::SearchResult;
use crate::graph::{NoteGraph, NotePathSelector};
use crate::model::note::{NoteId, NotePath};
use log::info;
use std::time::Instant;

/// Single search hit returned by [`search_notes`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub note_id: NoteId,
    /// Title as displayed under the parent on `note_path`.
    pub title: String,
    pub note_path: NotePath,
    /// Display titles of every note on `note_path`, root first.
    pub path_titles: Vec<String>,
}

/// Searches the graph for notes matching every token of `raw_query`.
///
/// Returns an empty list for blank queries.
pub fn search_notes(
    graph: &NoteGraph,
    raw_query: &str,
    options: &SearchOptions,
) -> SearchResult<Vec<SearchHit>> {
    let tokens = tokenize_query(raw_query);
    if tokens.is_empty() || options.limit == 0 {
        return Ok(Vec::new());
    }

    let started_at = Instant::now();
    let input = scoped_notes(graph, options);
    let expression = Expression::NoteFlatText {
        tokens: tokens.clone(),
    };
    let mut context = SearchContext::new(options.clone());
    let matched = expression.evaluate(graph, &input, &mut context)?;

    let selector =
        NotePathSelector::new(graph).with_hoisted_note(options.hoisted_note_id.clone());
    let mut hits = matched
        .notes()
        .filter_map(|note_id| {
            let note_path = context
                .note_path(note_id)
                .or_else(|| matched.path(note_id))
                .cloned()
                .or_else(|| selector.best_note_path(note_id))?;
            Some(build_hit(graph, note_id, note_path))
        })
        .collect::<Vec<_>>();

    hits.sort_by(|a, b| {
        a.note_path
            .len()
            .cmp(&b.note_path.len())
            .then_with(|| a.title.to_lowercase().cmp(&b.title.to_lowercase()))
            .then_with(|| a.note_id.cmp(&b.note_id))
    });
    let total = hits.len();
    hits.truncate(options.limit);

    info!(
        "event=search_notes module=search status=ok tokens={} scoped={} matches={} returned={} branch_visits={} duration_ms={}",
        tokens.len(),
        input.len(),
        total,
        hits.len(),
        context.branch_visits(),
        started_at.elapsed().as_millis()
    );
    Ok(hits)
}

/// Live notes eligible for this query.
fn scoped_notes(graph: &NoteGraph, options: &SearchOptions) -> NoteSet {
    let resolver = graph.attributes();
    let all = NoteSet::all(graph);
    let scoped = all.notes().filter(|note_id| {
        if !options.include_archived_notes && resolver.is_archived(note_id) {
            return false;
        }
        match options.ancestor_note_id.as_deref() {
            Some(ancestor_id) => graph.is_ancestor(ancestor_id, note_id),
            None => true,
        }
    });
    NoteSet::from_ids(scoped.cloned())
}

fn build_hit(graph: &NoteGraph, note_id: &str, note_path: NotePath) -> SearchHit {
    let path_titles = note_path
        .iter()
        .enumerate()
        .map(|(index, id)| {
            let parent = index
                .checked_sub(1)
                .and_then(|parent_index| note_path.get(parent_index))
                .map(String::as_str);
            graph.note_title(id, parent).unwrap_or_else(|| id.clone())
        })
        .collect::<Vec<_>>();
    let title = path_titles
        .last()
        .cloned()
        .unwrap_or_else(|| note_id.to_string());

    SearchHit {
        note_id: note_id.to_string(),
        title,
        note_path,
        path_titles,
    }
}
