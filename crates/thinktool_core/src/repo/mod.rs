//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define persistence contracts for graph snapshots.
//! - Isolate SQLite query details from the pure graph store.
//!
//! # Invariants
//! - Repositories only accept connections migrated to the latest schema.
//! - A saved snapshot loads back equal to the state that was saved.

pub mod snapshot_repo;

pub use snapshot_repo::{RepoError, RepoResult, SnapshotRepository, SqliteSnapshotRepository};
