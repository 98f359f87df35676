//! Graph-structured item store.
//!
//! # Responsibility
//! - Own the item set and the ordered parent->child edge set.
//! - Express every mutation as a new `State` value so snapshots stay cheap
//!   to keep around for diffing.
//!
//! # Invariants
//! - Both endpoints of an edge exist as items.
//! - A `(parent, child)` pair appears at most once.
//! - Edges never form a cycle; inserts that would close one are rejected.
//! - The root item always exists and cannot be destroyed.

use crate::model::item::ItemId;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod full_state;
mod state;

pub use full_state::{
    transform_full_state_into_state, transform_state_into_full_state, FullState, FullStateThing,
};
pub use state::{Edge, State};

/// Result type for graph store operations.
pub type GraphResult<T> = Result<T, GraphError>;

/// Errors from graph store operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    /// Referenced item does not exist.
    NotFound(ItemId),
    /// An item with this id already exists.
    AlreadyExists(ItemId),
    /// The `(parent, child)` edge already exists.
    DuplicateEdge { parent: ItemId, child: ItemId },
    /// Adding the edge would make `child` its own ancestor.
    CycleDetected { parent: ItemId, child: ItemId },
    /// The root item cannot be destroyed.
    RootProtected,
}

impl Display for GraphError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(id) => write!(f, "item not found: {id}"),
            Self::AlreadyExists(id) => write!(f, "item already exists: {id}"),
            Self::DuplicateEdge { parent, child } => {
                write!(f, "edge already exists: {parent} -> {child}")
            }
            Self::CycleDetected { parent, child } => {
                write!(f, "edge would create cycle: {parent} -> {child}")
            }
            Self::RootProtected => write!(f, "root item cannot be destroyed"),
        }
    }
}

impl Error for GraphError {}
