//! Search over the in-memory note graph.
//!
//! # Responsibility
//! - Evaluate expression trees over note sets.
//! - Match free-text tokens against notes and their ancestor chains.
//! - Shape display-ready hits for result consumers.
//!
//! # Invariants
//! - Evaluation never mutates the graph.
//! - Matched notes get exactly one justifying path per query.

pub mod comparator;
pub mod context;
pub mod expression;
pub mod flat_text;
pub mod note_set;
pub mod service;
pub mod tokens;

use crate::model::note::NoteId;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Result type for search APIs.
pub type SearchResult<T> = Result<T, SearchError>;

/// Search-layer error for query building and evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchError {
    /// Input note set names a note missing from the graph.
    UnknownNote(NoteId),
    /// Comparison operator is not supported.
    InvalidOperator(String),
    /// `%=` operand is not a valid regular expression.
    InvalidRegex { pattern: String, message: String },
    /// Backward path search visited more frames than allowed.
    BranchBudgetExceeded { limit: usize },
}

impl Display for SearchError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownNote(id) => write!(f, "input note set contains unknown note {id}"),
            Self::InvalidOperator(operator) => {
                write!(f, "unsupported comparison operator `{operator}`")
            }
            Self::InvalidRegex { pattern, message } => {
                write!(f, "invalid regular expression `{pattern}`: {message}")
            }
            Self::BranchBudgetExceeded { limit } => {
                write!(f, "search aborted after visiting more than {limit} path branches")
            }
        }
    }
}

impl Error for SearchError {}
