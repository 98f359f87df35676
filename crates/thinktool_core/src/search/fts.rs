//! SQLite FTS5-based item search.
//!
//! # Responsibility
//! - Provide prefix keyword search over item text.
//! - Return hits carrying the item id and its stored content.
//!
//! # Invariants
//! - Ordering is `bm25 ASC, id ASC`, so a larger limit extends the list
//!   without reordering it.
//! - Blank queries return no hits.

use crate::db::DbError;
use crate::model::item::{Content, ItemId};
use log::debug;
use rusqlite::{params, Connection, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Result type for search APIs.
pub type SearchResult<T> = Result<T, SearchError>;

/// Search-layer error for query parsing, DB interaction and result decoding.
#[derive(Debug)]
pub enum SearchError {
    /// Query text cannot be parsed by FTS5 syntax.
    InvalidQuery {
        query: String,
        message: String,
    },
    Db(DbError),
    InvalidData(String),
}

impl Display for SearchError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidQuery { query, message } => {
                write!(f, "invalid full-text query `{query}`: {message}")
            }
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid search row: {message}"),
        }
    }
}

impl Error for SearchError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::InvalidQuery { .. } | Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for SearchError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for SearchError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// One ranked search hit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub id: ItemId,
    pub content: Content,
}

/// Search collaborator used by the item picker.
pub trait ItemSearch {
    fn query(&self, text: &str, limit: u32) -> SearchResult<Vec<SearchHit>>;
}

/// FTS5 search over the `things_fts` index.
pub struct SqliteItemSearch<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteItemSearch<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl ItemSearch for SqliteItemSearch<'_> {
    fn query(&self, text: &str, limit: u32) -> SearchResult<Vec<SearchHit>> {
        let Some(match_expr) = build_match_expression(text) else {
            return Ok(Vec::new());
        };
        if limit == 0 {
            return Ok(Vec::new());
        }

        let mut stmt = self.conn.prepare(
            "SELECT things.id AS id, things.content AS content
             FROM things_fts
             JOIN things ON things.rowid = things_fts.rowid
             WHERE things_fts MATCH ?1
             ORDER BY bm25(things_fts) ASC, things.id ASC
             LIMIT ?2;",
        )?;
        let mut rows = stmt
            .query(params![match_expr, i64::from(limit)])
            .map_err(|err| map_query_error(err, &match_expr))?;
        let mut hits = Vec::new();
        while let Some(row) = rows
            .next()
            .map_err(|err| map_query_error(err, &match_expr))?
        {
            hits.push(parse_search_hit(row)?);
        }

        debug!(
            "event=item_search module=search status=ok terms={} limit={limit} hits={}",
            match_expr.split(" AND ").count(),
            hits.len()
        );
        Ok(hits)
    }
}

fn parse_search_hit(row: &Row<'_>) -> SearchResult<SearchHit> {
    let id = ItemId::new(row.get::<_, String>("id")?);
    let content_json: String = row.get("content")?;
    let content = serde_json::from_str(&content_json)
        .map_err(|err| SearchError::InvalidData(format!("content of `{id}`: {err}")))?;
    Ok(SearchHit { id, content })
}

// Every whitespace-separated term must match as a prefix.
fn build_match_expression(text: &str) -> Option<String> {
    let terms = text
        .split_whitespace()
        .map(escape_fts_term)
        .collect::<Vec<_>>();
    if terms.is_empty() {
        return None;
    }
    Some(terms.join(" AND "))
}

fn escape_fts_term(raw: &str) -> String {
    let escaped = raw.replace('"', "\"\"");
    format!("\"{escaped}\"*")
}

fn map_query_error(err: rusqlite::Error, query: &str) -> SearchError {
    if is_match_syntax_error(&err) {
        return SearchError::InvalidQuery {
            query: query.to_string(),
            message: err.to_string(),
        };
    }
    SearchError::Db(DbError::Sqlite(err))
}

fn is_match_syntax_error(err: &rusqlite::Error) -> bool {
    match err {
        rusqlite::Error::SqliteFailure(_, Some(message)) => {
            let msg = message.to_lowercase();
            (msg.contains("fts5") && msg.contains("syntax"))
                || msg.contains("malformed match expression")
                || msg.contains("unterminated")
        }
        _ => false,
    }
}
