//! Remote store contract.

use super::diff::EdgeUpdate;
use crate::model::item::{Content, ItemId};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Failure reported by a remote store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteError {
    pub code: String,
    pub message: String,
}

impl RemoteError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

impl Display for RemoteError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl Error for RemoteError {}

/// Continuation input for one effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncResponse {
    Ok,
    Error,
}

impl<E> From<Result<(), E>> for SyncResponse {
    fn from(value: Result<(), E>) -> Self {
        match value {
            Ok(()) => Self::Ok,
            Err(_) => Self::Error,
        }
    }
}

/// Server-side persistence as seen by the sync engine.
///
/// Implementations must be idempotent per call: the engine never retries,
/// but a caller may resend after reconnecting.
pub trait RemoteStore {
    fn delete_thing(&mut self, thing: &ItemId) -> Result<(), RemoteError>;

    fn update_things(&mut self, updates: &[EdgeUpdate]) -> Result<(), RemoteError>;

    fn set_content(&mut self, thing: &ItemId, content: &Content) -> Result<(), RemoteError>;

    fn tutorial_finished(&mut self, finished: bool) -> Result<(), RemoteError>;
}
