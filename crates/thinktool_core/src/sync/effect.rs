//! Tagged sync effects and the pending-effect queue.

use super::diff::{ChangeSet, EdgeUpdate};
use crate::model::item::{Content, ItemId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};
use std::fmt::{Display, Formatter};

/// Matches a remote response to the effect that caused it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CorrelationId(u64);

impl CorrelationId {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(self) -> u64 {
        self.0
    }
}

impl Display for CorrelationId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "corr#{}", self.0)
    }
}

/// Work for the remote store.
///
/// Leaf variants carry a correlation id; `Batch` and `Sequence` only group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Effect {
    DeleteThing {
        correlation: CorrelationId,
        thing: ItemId,
    },
    UpdateEdges {
        correlation: CorrelationId,
        updates: Vec<EdgeUpdate>,
    },
    SetContent {
        correlation: CorrelationId,
        thing: ItemId,
        content: Content,
    },
    TutorialFinished {
        correlation: CorrelationId,
        finished: bool,
    },
    /// Newer batches with the same label supersede pending ones.
    Batch { label: String, effect: Box<Effect> },
    Sequence { effects: Vec<Effect> },
}

impl Effect {
    /// Translates a change set: deletes first, then one edge update for all
    /// parents, then one labeled content write per item, then the tutorial
    /// flag. Returns `None` for an empty change set.
    pub fn from_change_set<F>(changes: &ChangeSet, mut next_id: F) -> Option<Effect>
    where
        F: FnMut() -> CorrelationId,
    {
        if changes.is_empty() {
            return None;
        }
        let mut effects = Vec::new();
        for thing in &changes.deleted {
            effects.push(Effect::DeleteThing {
                correlation: next_id(),
                thing: thing.clone(),
            });
        }
        if !changes.updated.is_empty() {
            effects.push(Effect::UpdateEdges {
                correlation: next_id(),
                updates: changes.updated.clone(),
            });
        }
        for edit in &changes.edited {
            effects.push(Effect::Batch {
                label: edit.thing.to_string(),
                effect: Box::new(Effect::SetContent {
                    correlation: next_id(),
                    thing: edit.thing.clone(),
                    content: edit.content.clone(),
                }),
            });
        }
        if let Some(finished) = changes.tutorial_finished {
            effects.push(Effect::TutorialFinished {
                correlation: next_id(),
                finished,
            });
        }
        Some(Effect::Sequence { effects })
    }

    pub fn correlation(&self) -> Option<CorrelationId> {
        match self {
            Self::DeleteThing { correlation, .. }
            | Self::UpdateEdges { correlation, .. }
            | Self::SetContent { correlation, .. }
            | Self::TutorialFinished { correlation, .. } => Some(*correlation),
            Self::Batch { .. } | Self::Sequence { .. } => None,
        }
    }

    /// Wire name of a leaf effect.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::DeleteThing { .. } => "delete-thing",
            Self::UpdateEdges { .. } => "update-edges",
            Self::SetContent { .. } => "set-content",
            Self::TutorialFinished { .. } => "tutorial-finished",
            Self::Batch { .. } => "batch",
            Self::Sequence { .. } => "sequence",
        }
    }
}

/// One leaf effect waiting to be sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueuedEffect {
    pub label: Option<String>,
    /// Production order among effects with the same label, starting at 1.
    pub sequence: u64,
    pub effect: Effect,
}

/// FIFO of unsent leaf effects with optional label coalescing.
#[derive(Debug, Clone, Default)]
pub struct EffectQueue {
    coalesce: bool,
    entries: VecDeque<QueuedEffect>,
    sequences: BTreeMap<String, u64>,
}

impl EffectQueue {
    pub fn new(coalesce: bool) -> Self {
        Self {
            coalesce,
            ..Self::default()
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &QueuedEffect> {
        self.entries.iter()
    }

    /// Flattens `effect` into the queue.
    ///
    /// Returns the correlation ids of pending effects that were superseded.
    pub fn push(&mut self, effect: Effect) -> Vec<CorrelationId> {
        let mut superseded = Vec::new();
        self.push_labeled(effect, None, &mut superseded);
        superseded
    }

    /// Removes the oldest entry. A label's sequence counter is dropped once
    /// nothing with that label is queued, so it restarts at 1.
    pub fn pop(&mut self) -> Option<QueuedEffect> {
        let popped = self.entries.pop_front()?;
        if let Some(label) = popped.label.as_ref() {
            if !self.entries.iter().any(|entry| entry.label.as_ref() == Some(label)) {
                self.sequences.remove(label);
            }
        }
        Some(popped)
    }

    fn push_labeled(
        &mut self,
        effect: Effect,
        label: Option<String>,
        superseded: &mut Vec<CorrelationId>,
    ) {
        match effect {
            Effect::Sequence { effects } => {
                for effect in effects {
                    self.push_labeled(effect, label.clone(), superseded);
                }
            }
            Effect::Batch { label, effect } => {
                self.push_labeled(*effect, Some(label), superseded);
            }
            leaf => {
                let sequence = match label.as_ref() {
                    Some(label) => {
                        let counter = self.sequences.entry(label.clone()).or_insert(0);
                        *counter += 1;
                        *counter
                    }
                    None => 0,
                };
                let queued = QueuedEffect {
                    label,
                    sequence,
                    effect: leaf,
                };
                if self.coalesce && queued.label.is_some() {
                    if let Some(slot) = self
                        .entries
                        .iter_mut()
                        .find(|entry| entry.label == queued.label)
                    {
                        superseded.extend(slot.effect.correlation());
                        *slot = queued;
                        return;
                    }
                }
                self.entries.push_back(queued);
            }
        }
    }
}
