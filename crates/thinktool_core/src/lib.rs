//! Core domain logic for the Thinktool associative outliner.
//! This crate is the single source of truth for graph, projection and sync
//! invariants.

pub mod action;
pub mod config;
pub mod db;
pub mod graph;
pub mod logging;
pub mod model;
pub mod repo;
pub mod search;
pub mod session;
pub mod sync;
pub mod tree;

pub use action::{
    enabled, shortcut, ActionEngine, ActionError, ActionEvent, ActionName, ActionResult,
    ActiveEditor, InputRequest, Outcome, RequestId, Shortcut, Step,
};
pub use config::{ConfigError, CoreConfig, EngineConfig, LoggingConfig, SearchConfig, SyncConfig};
pub use db::{open_db, open_db_in_memory, DbError, DbResult};
pub use graph::{
    transform_full_state_into_state, transform_state_into_full_state, Edge, FullState,
    FullStateThing, GraphError, GraphResult, State,
};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::item::{Content, Item, ItemId, Segment, ROOT_ITEM_ID};
pub use repo::{RepoError, RepoResult, SnapshotRepository, SqliteSnapshotRepository};
pub use search::{ItemSearch, SearchError, SearchHit, SearchResult, SqliteItemSearch};
pub use session::{Session, SessionPatch, TutorialState};
pub use sync::{
    apply_change_set, diff, diff_sessions, ChangeSet, ContentEdit, CorrelationId, EdgeUpdate,
    Effect, EffectQueue, RemoteError, RemoteStore, SyncEngine, SyncError, SyncResponse,
    SyncResult,
};
pub use tree::{NodeRef, Selection, Tree, TreeError, TreeResult};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
