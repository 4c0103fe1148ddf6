//! Core of the note graph: in-memory cache, attribute inheritance, note path
//! selection and token path search.
//!
//! The graph is rebuilt from the SQLite source of truth at startup and then
//! patched in place; all queries run against the cache.

pub mod db;
pub mod graph;
pub mod logging;
pub mod model;
pub mod repo;
pub mod search;

pub use graph::{
    AttributeResolver, GraphError, GraphResult, GraphSnapshot, NoteGraph, NotePathSelector,
};
pub use logging::{default_log_level, init_logging, LogConfig, LoggingError};
pub use model::attribute::{Attribute, AttributeKind};
pub use model::branch::Branch;
pub use model::note::{Note, NoteId, NotePath, NoteType, ROOT_NOTE_ID};
pub use model::ValidationError;
pub use repo::{load_graph, RepoError, RepoResult};
pub use search::context::{SearchContext, SearchOptions};
pub use search::expression::Expression;
pub use search::note_set::NoteSet;
pub use search::service::{search_notes, SearchHit};
pub use search::tokens::tokenize_query;
pub use search::{SearchError, SearchResult};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
