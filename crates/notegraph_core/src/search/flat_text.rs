//! Token path matching over note ancestor chains.
//!
//! # Responsibility
//! - Match every query token against a note's tags, owned attributes and
//!   the titles/attributes of the notes on some path toward the root.
//! - Report one justifying path per matched note.
//!
//! # Invariants
//! - A token is consumed at most once per explored path.
//! - The candidate itself must consume at least one token under a parent
//!   before that parent edge is explored.
//! - Exploration of a path stops as soon as all tokens are consumed.
//! - The first successful exploration of a note wins; later ones are ignored.
//! - Parents are explored in graph parent order, depth first.

use super::context::SearchContext;
use super::note_set::NoteSet;
use super::tokens::{normalize, normalize_tokens};
use super::{SearchError, SearchResult};
use crate::graph::{NoteGraph, NotePathSelector};
use crate::model::note::{Note, NotePath};
use log::{debug, warn};
use std::collections::HashMap;
use std::time::Instant;

/// One pending step of the backward search.
struct Frame<'g, 't> {
    /// Ancestor being entered.
    note_id: &'g str,
    remaining: Vec<&'t str>,
    /// Notes already walked, candidate first, nearest-to-root last.
    fragment: Vec<&'g str>,
}

/// Flat-text token matcher for one token list.
pub struct FlatTextSearch<'g> {
    graph: &'g NoteGraph,
    tokens: Vec<String>,
}

impl<'g> FlatTextSearch<'g> {
    /// Tokens are normalized here; blank ones are dropped.
    pub fn new(graph: &'g NoteGraph, tokens: &[String]) -> Self {
        Self {
            graph,
            tokens: normalize_tokens(tokens),
        }
    }

    /// Returns the notes of `input` explained by all tokens.
    ///
    /// # Errors
    /// - `UnknownNote` when `input` names a note missing from the graph.
    /// - `BranchBudgetExceeded` when the context budget runs out.
    pub fn execute(&self, input: &NoteSet, context: &mut SearchContext) -> SearchResult<NoteSet> {
        ensure_known_notes(self.graph, input)?;
        let started_at = Instant::now();
        let selector = NotePathSelector::new(self.graph)
            .with_hoisted_note(context.options().hoisted_note_id.clone());
        let mut best_paths: HashMap<&'g str, Option<NotePath>> = HashMap::new();
        let mut result = NoteSet::new();

        if self.tokens.is_empty() {
            for note_id in input.notes() {
                match selector.best_note_path(note_id) {
                    Some(path) => {
                        context.register_path(note_id, path.clone());
                        result.add_with_path(note_id.clone(), path);
                    }
                    None => result.add(note_id.clone()),
                }
            }
            return Ok(result);
        }

        let candidates = self.candidate_notes(input);
        let visits_before = context.branch_visits();

        for &note in &candidates {
            let note_id = note.note_id.as_str();

            if self.tokens.len() == 1 && note_id.to_lowercase() == self.tokens[0] {
                self.finish(&[note_id], &selector, &mut best_paths, &mut result, context);
                continue;
            }

            let all_tokens = self.tokens.iter().map(String::as_str).collect::<Vec<_>>();
            let tag_tokens = self.tokens_in_tags(note, &all_tokens);
            let mut frames = Vec::new();
            for parent in self.graph.parents(note_id) {
                let found =
                    self.with_title_tokens(note_id, &parent.note_id, &all_tokens, &tag_tokens);
                if found.is_empty() {
                    continue;
                }
                frames.push(Frame {
                    note_id: parent.note_id.as_str(),
                    remaining: subtract(&all_tokens, &found),
                    fragment: vec![note_id],
                });
            }

            if let Err(err) = self.search_towards_root(
                frames,
                &selector,
                &mut best_paths,
                &mut result,
                context,
            ) {
                warn!(
                    "event=search_eval module=search status=error expression=note_flat_text tokens={} branch_visits={} error={}",
                    self.tokens.len(),
                    context.branch_visits(),
                    err
                );
                return Err(err);
            }
        }

        debug!(
            "event=search_eval module=search status=ok expression=note_flat_text tokens={} input={} candidates={} matches={} branch_visits={} duration_ms={}",
            self.tokens.len(),
            input.len(),
            candidates.len(),
            result.len(),
            context.branch_visits() - visits_before,
            started_at.elapsed().as_millis()
        );
        Ok(result)
    }

    /// Input notes whose flat text contains at least one token.
    fn candidate_notes(&self, input: &NoteSet) -> Vec<&'g Note> {
        input
            .notes()
            .filter_map(|note_id| {
                let flat_text = self.graph.flat_text(note_id)?;
                self.tokens
                    .iter()
                    .any(|token| flat_text.contains(token.as_str()))
                    .then(|| self.graph.get_note(note_id))
                    .flatten()
            })
            .collect()
    }

    /// Depth-first walk of `frames`, visiting parents in graph order.
    fn search_towards_root<'t>(
        &self,
        frames: Vec<Frame<'g, 't>>,
        selector: &NotePathSelector<'g>,
        best_paths: &mut HashMap<&'g str, Option<NotePath>>,
        result: &mut NoteSet,
        context: &mut SearchContext,
    ) -> SearchResult<()> {
        let mut stack = frames;
        stack.reverse();

        while let Some(frame) = stack.pop() {
            context.record_branch_visit()?;

            if frame.remaining.is_empty() {
                if self.finish(&frame.fragment, selector, best_paths, result, context) {
                    // Every other frame belongs to the same, now matched, candidate.
                    return Ok(());
                }
                continue;
            }

            let Some(note) = self.graph.get_note(frame.note_id) else {
                continue;
            };
            if note.is_root() {
                continue;
            }
            let parents = self.graph.parents(frame.note_id);
            if parents.is_empty() {
                continue;
            }

            let tag_tokens = self.tokens_in_tags(note, &frame.remaining);
            let mut children = Vec::with_capacity(parents.len());
            for parent in parents {
                let found = self.with_title_tokens(
                    frame.note_id,
                    &parent.note_id,
                    &frame.remaining,
                    &tag_tokens,
                );
                let mut fragment = frame.fragment.clone();
                fragment.push(frame.note_id);
                children.push(Frame {
                    note_id: parent.note_id.as_str(),
                    remaining: subtract(&frame.remaining, &found),
                    fragment,
                });
            }
            stack.extend(children.into_iter().rev());
        }

        Ok(())
    }

    /// Registers a successful exploration. Returns `true` when the candidate
    /// is (now) part of the result.
    fn finish(
        &self,
        fragment: &[&'g str],
        selector: &NotePathSelector<'g>,
        best_paths: &mut HashMap<&'g str, Option<NotePath>>,
        result: &mut NoteSet,
        context: &mut SearchContext,
    ) -> bool {
        let (Some(&candidate), Some(&topmost)) = (fragment.first(), fragment.last()) else {
            return false;
        };
        if result.has(candidate) {
            return true;
        }

        // The topmost note consumed the last tokens; what lies above it does
        // not matter, so its own best path is used.
        let Some(mut path) = best_paths
            .entry(topmost)
            .or_insert_with(|| selector.best_note_path(topmost))
            .clone()
        else {
            return false;
        };
        path.extend(fragment.iter().rev().skip(1).map(|id| id.to_string()));

        context.register_path(candidate, path.clone());
        result.add_with_path(candidate, path);
        true
    }

    /// Tokens found in the note's type, MIME or owned attribute names/values.
    fn tokens_in_tags<'t>(&self, note: &Note, remaining: &[&'t str]) -> Vec<&'t str> {
        let kind = note.kind.as_str().to_lowercase();
        let mime = note.mime.to_lowercase();
        let attributes = self
            .graph
            .owned_attributes(&note.note_id)
            .into_iter()
            .map(|attribute| (normalize(&attribute.name), normalize(&attribute.value)))
            .collect::<Vec<_>>();

        remaining
            .iter()
            .copied()
            .filter(|token| {
                kind.contains(token)
                    || mime.contains(token)
                    || attributes
                        .iter()
                        .any(|(name, value)| name.contains(token) || value.contains(token))
            })
            .collect()
    }

    /// `tag_tokens` plus tokens found in the note's title under `parent_note_id`.
    fn with_title_tokens<'t>(
        &self,
        note_id: &str,
        parent_note_id: &str,
        remaining: &[&'t str],
        tag_tokens: &[&'t str],
    ) -> Vec<&'t str> {
        let title = self
            .graph
            .note_title(note_id, Some(parent_note_id))
            .map(|title| normalize(&title))
            .unwrap_or_default();
        remaining
            .iter()
            .copied()
            .filter(|token| tag_tokens.contains(token) || title.contains(token))
            .collect()
    }
}

/// Rejects input sets naming notes absent from the graph.
pub fn ensure_known_notes(graph: &NoteGraph, input: &NoteSet) -> SearchResult<()> {
    match input.notes().find(|note_id| !graph.has_note(note_id)) {
        Some(note_id) => Err(SearchError::UnknownNote(note_id.clone())),
        None => Ok(()),
    }
}

fn subtract<'t>(remaining: &[&'t str], found: &[&'t str]) -> Vec<&'t str> {
    remaining
        .iter()
        .copied()
        .filter(|token| !found.contains(token))
        .collect()
}
