//! Item picker search.
//!
//! # Responsibility
//! - Define the search contract consumed by the item picker.
//! - Provide an implementation over the local snapshot store's FTS5 index.
//!
//! # Invariants
//! - Results are deterministic, and raising `limit` never reorders earlier
//!   hits.

pub mod fts;

pub use fts::{ItemSearch, SearchError, SearchHit, SearchResult, SqliteItemSearch};
