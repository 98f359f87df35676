//! Diff-based optimistic synchronization.
//!
//! # Responsibility
//! - Compute change sets between two graph snapshots.
//! - Translate change sets into tagged effects with correlation ids.
//! - Deliver queued effects to a remote store and fold responses back into
//!   the session.
//!
//! # Invariants
//! - Local state is never rolled back; a failed effect only marks the
//!   session disconnected.
//! - Effects sharing a label are delivered in production order.
//!
//! # See also
//! - graph: snapshots compared by `diff`.

use crate::graph::GraphError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod diff;
pub mod effect;
mod engine;
pub mod remote;

pub use diff::{apply_change_set, diff, diff_sessions, ChangeSet, ContentEdit, EdgeUpdate};
pub use effect::{CorrelationId, Effect, EffectQueue, QueuedEffect};
pub use engine::SyncEngine;
pub use remote::{RemoteError, RemoteStore, SyncResponse};

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors from the sync layer.
#[derive(Debug)]
pub enum SyncError {
    /// A change set could not be applied to the local graph.
    Graph(GraphError),
    /// Response for a correlation id that is not in flight.
    UnknownCorrelation(CorrelationId),
    /// Effect could not be encoded for the wire.
    Encode(serde_json::Error),
}

impl Display for SyncError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Graph(err) => write!(f, "{err}"),
            Self::UnknownCorrelation(id) => write!(f, "no effect in flight for correlation {id}"),
            Self::Encode(err) => write!(f, "effect encoding failed: {err}"),
        }
    }
}

impl Error for SyncError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Graph(err) => Some(err),
            Self::Encode(err) => Some(err),
            Self::UnknownCorrelation(_) => None,
        }
    }
}

impl From<GraphError> for SyncError {
    fn from(value: GraphError) -> Self {
        Self::Graph(value)
    }
}

impl From<serde_json::Error> for SyncError {
    fn from(value: serde_json::Error) -> Self {
        Self::Encode(value)
    }
}
