//! Read access to the source-of-truth database.
//!
//! # Responsibility
//! - Rebuild the in-memory note graph from persisted rows.
//!
//! # Invariants
//! - Read paths must reject invalid persisted state instead of masking it.
//! - Rows referencing notes that are not loaded are skipped, not guessed.

pub mod graph_repo;

pub use graph_repo::{load_graph, RepoError, RepoResult};
