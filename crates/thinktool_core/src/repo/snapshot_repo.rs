//! Local snapshot persistence for graph state.
//!
//! # Responsibility
//! - Store every item with its content and searchable text.
//! - Store ordered edges with their positions.
//!
//! # Invariants
//! - `save_state` replaces the stored snapshot atomically.
//! - Edge order is restored by `position ASC, ordinal ASC`.

use crate::db::migrations::latest_version;
use crate::db::{table_exists, table_has_column, DbError};
use crate::graph::{GraphError, State};
use crate::model::item::{Content, ItemId};
use log::{error, info};
use rusqlite::{params, Connection, Transaction, TransactionBehavior};
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

/// Result type used by snapshot repository operations.
pub type RepoResult<T> = Result<T, RepoError>;

/// Errors from snapshot repository operations.
#[derive(Debug)]
pub enum RepoError {
    /// Underlying SQLite/bootstrap error.
    Db(DbError),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
    /// Stored rows do not form a valid graph.
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "snapshot repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "snapshot repository requires table `{table}`")
            }
            Self::MissingRequiredColumn { table, column } => write!(
                f,
                "snapshot repository requires column `{column}` in table `{table}`"
            ),
            Self::InvalidData(message) => write!(f, "invalid snapshot data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<GraphError> for RepoError {
    fn from(value: GraphError) -> Self {
        Self::InvalidData(value.to_string())
    }
}

/// Persistence contract for whole-graph snapshots.
pub trait SnapshotRepository {
    /// Replaces the stored snapshot with `state`.
    fn save_state(&self, state: &State) -> RepoResult<()>;
    /// Loads the stored snapshot; an empty store yields a fresh state.
    fn load_state(&self) -> RepoResult<State>;
}

/// SQLite-backed snapshot repository.
pub struct SqliteSnapshotRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteSnapshotRepository<'conn> {
    /// Creates repository from migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_snapshot_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl SnapshotRepository for SqliteSnapshotRepository<'_> {
    fn save_state(&self, state: &State) -> RepoResult<()> {
        let started_at = Instant::now();
        let result = save_snapshot(self.conn, state);
        match &result {
            Ok(items) => info!(
                "event=snapshot_save module=repo status=ok items={items} duration_ms={}",
                started_at.elapsed().as_millis()
            ),
            Err(err) => error!(
                "event=snapshot_save module=repo status=error duration_ms={} error={err}",
                started_at.elapsed().as_millis()
            ),
        }
        result.map(|_| ())
    }

    fn load_state(&self) -> RepoResult<State> {
        let started_at = Instant::now();
        let state = load_snapshot(self.conn).map_err(|err| {
            error!("event=snapshot_load module=repo status=error error={err}");
            err
        })?;
        info!(
            "event=snapshot_load module=repo status=ok items={} duration_ms={}",
            state.all_items().count(),
            started_at.elapsed().as_millis()
        );
        Ok(state)
    }
}

fn save_snapshot(conn: &Connection, state: &State) -> RepoResult<usize> {
    let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)?;

    let stored = {
        let mut stmt = tx.prepare("SELECT id FROM things;")?;
        let ids = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<BTreeSet<_>, _>>()?;
        ids
    };
    let live = state
        .all_items()
        .map(|id| id.as_str().to_string())
        .collect::<BTreeSet<_>>();
    for gone in stored.difference(&live) {
        tx.execute("DELETE FROM things WHERE id = ?1;", [gone])?;
    }

    let mut written = 0usize;
    for id in state.all_items() {
        let content = state.content(id).cloned().unwrap_or_default();
        let content_json = serde_json::to_string(&content)
            .map_err(|err| RepoError::InvalidData(format!("content of `{id}`: {err}")))?;
        tx.execute(
            "INSERT INTO things (id, content, text, created_at, updated_at)
             VALUES (?1, ?2, ?3, (strftime('%s', 'now') * 1000), (strftime('%s', 'now') * 1000))
             ON CONFLICT(id) DO UPDATE SET
                content = excluded.content,
                text = excluded.text,
                updated_at = excluded.updated_at
             WHERE things.content != excluded.content OR things.text != excluded.text;",
            params![id.as_str(), content_json, state.content_text(id)],
        )?;
        written += 1;
    }

    tx.execute("DELETE FROM connections;", [])?;
    let parents = state.parents_with_children().cloned().collect::<Vec<_>>();
    for parent in parents {
        for (ordinal, edge) in state.child_edges(&parent).into_iter().enumerate() {
            tx.execute(
                "INSERT INTO connections (parent_id, child_id, position, ordinal)
                 VALUES (?1, ?2, ?3, ?4);",
                params![
                    edge.parent.as_str(),
                    edge.child.as_str(),
                    edge.position,
                    ordinal as i64
                ],
            )?;
        }
    }

    tx.commit()?;
    Ok(written)
}

fn load_snapshot(conn: &Connection) -> RepoResult<State> {
    let mut state = State::new();

    let mut stmt = conn.prepare("SELECT id, content FROM things ORDER BY id ASC;")?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let id = ItemId::new(row.get::<_, String>(0)?);
        let content_json: String = row.get(1)?;
        let content: Content = serde_json::from_str(&content_json)
            .map_err(|err| RepoError::InvalidData(format!("content of `{id}`: {err}")))?;
        if !state.exists(&id) {
            state = state.create_with_id(id.clone())?;
        }
        state = state.set_content(&id, content)?;
    }

    let mut stmt = conn.prepare(
        "SELECT parent_id, child_id, position
         FROM connections
         ORDER BY parent_id ASC, position ASC, ordinal ASC;",
    )?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let parent = ItemId::new(row.get::<_, String>(0)?);
        let child = ItemId::new(row.get::<_, String>(1)?);
        let position: i64 = row.get(2)?;
        state = state.add_child(&parent, &child, position)?;
    }

    Ok(state)
}

fn ensure_snapshot_connection_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    for (table, columns) in [
        ("things", &["id", "content", "text", "created_at", "updated_at"][..]),
        ("connections", &["parent_id", "child_id", "position", "ordinal"][..]),
    ] {
        if !table_exists(conn, table)? {
            return Err(RepoError::MissingRequiredTable(table));
        }
        for &column in columns {
            if !table_has_column(conn, table, column)? {
                return Err(RepoError::MissingRequiredColumn { table, column });
            }
        }
    }
    Ok(())
}
