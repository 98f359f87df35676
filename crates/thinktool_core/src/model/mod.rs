//! Item model shared by the graph store, persistence and sync layers.
//!
//! # Invariants
//! - Every item is identified by a stable `ItemId`; ids are never reused.
//! - The root item has the well-known id `"0"`.

pub mod item;
