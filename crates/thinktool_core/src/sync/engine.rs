//! Sync engine: plans effects from session changes and delivers them.

use super::diff::diff_sessions;
use super::effect::{CorrelationId, Effect, EffectQueue, QueuedEffect};
use super::remote::{RemoteStore, SyncResponse};
use super::{SyncError, SyncResult};
use crate::config::SyncConfig;
use crate::session::Session;
use log::{debug, info, warn};
use std::collections::BTreeMap;

/// Owns the pending-effect queue and the in-flight correlation table.
#[derive(Debug, Clone)]
pub struct SyncEngine {
    next_correlation: u64,
    queue: EffectQueue,
    in_flight: BTreeMap<CorrelationId, &'static str>,
}

impl Default for SyncEngine {
    fn default() -> Self {
        Self::new(&SyncConfig::default())
    }
}

impl SyncEngine {
    pub fn new(config: &SyncConfig) -> Self {
        Self {
            next_correlation: 1,
            queue: EffectQueue::new(config.coalesce_edits),
            in_flight: BTreeMap::new(),
        }
    }

    pub fn queue(&self) -> &EffectQueue {
        &self.queue
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    /// Diffs two sessions and translates the changes into one effect.
    pub fn plan(&mut self, previous: &Session, current: &Session) -> Option<Effect> {
        let changes = diff_sessions(previous, current);
        let next = &mut self.next_correlation;
        Effect::from_change_set(&changes, || {
            let id = CorrelationId::new(*next);
            *next += 1;
            id
        })
    }

    /// Plans and enqueues the effects for one session transition.
    pub fn on_update(&mut self, previous: &Session, current: &Session) -> Option<Effect> {
        let effect = self.plan(previous, current)?;
        self.enqueue(effect.clone());
        Some(effect)
    }

    pub fn enqueue(&mut self, effect: Effect) {
        let superseded = self.queue.push(effect);
        for correlation in superseded {
            debug!("event=sync_enqueue module=sync status=coalesced correlation={correlation}");
        }
        debug!(
            "event=sync_enqueue module=sync status=ok pending={}",
            self.queue.len()
        );
    }

    /// Dequeues the next effect and marks it in flight.
    ///
    /// For callers that deliver effects themselves and report back through
    /// [`SyncEngine::handle_response`].
    pub fn take_next(&mut self) -> Option<QueuedEffect> {
        let queued = self.queue.pop()?;
        if let Some(correlation) = queued.effect.correlation() {
            self.in_flight.insert(correlation, queued.effect.kind());
        }
        Some(queued)
    }

    /// Folds one remote response into `session`.
    ///
    /// `Ok` leaves the session as is; `Error` marks it disconnected. Local
    /// edits are kept either way.
    pub fn handle_response(
        &mut self,
        session: &Session,
        correlation: CorrelationId,
        response: SyncResponse,
    ) -> SyncResult<Session> {
        let kind = self
            .in_flight
            .remove(&correlation)
            .ok_or(SyncError::UnknownCorrelation(correlation))?;
        match response {
            SyncResponse::Ok => {
                debug!("event=sync_response module=sync status=ok effect={kind} correlation={correlation}");
                Ok(session.clone())
            }
            SyncResponse::Error => {
                warn!(
                    "event=sync_response module=sync status=error effect={kind} correlation={correlation} session=disconnected"
                );
                Ok(session.server_disconnected())
            }
        }
    }

    /// Sends queued effects until the queue drains or the session is
    /// disconnected. Effects left in the queue are kept for a later flush;
    /// the failed effect is not retried.
    pub fn flush(
        &mut self,
        session: &Session,
        remote: &mut dyn RemoteStore,
    ) -> SyncResult<Session> {
        let mut current = session.clone();
        let mut sent = 0usize;
        while !current.is_server_disconnected() {
            let Some(queued) = self.take_next() else {
                break;
            };
            let Some(correlation) = queued.effect.correlation() else {
                continue;
            };
            let result = match &queued.effect {
                Effect::DeleteThing { thing, .. } => remote.delete_thing(thing),
                Effect::UpdateEdges { updates, .. } => remote.update_things(updates),
                Effect::SetContent { thing, content, .. } => remote.set_content(thing, content),
                Effect::TutorialFinished { finished, .. } => remote.tutorial_finished(*finished),
                Effect::Batch { .. } | Effect::Sequence { .. } => Ok(()),
            };
            if let Err(err) = &result {
                warn!(
                    "event=sync_send module=sync status=error effect={} correlation={correlation} code={} message={}",
                    queued.effect.kind(),
                    err.code,
                    err.message
                );
            }
            current = self.handle_response(&current, correlation, result.into())?;
            sent += 1;
        }
        let status = if current.is_server_disconnected() {
            "disconnected"
        } else {
            "ok"
        };
        info!(
            "event=sync_flush module=sync status={status} sent={sent} pending={}",
            self.queue.len()
        );
        Ok(current)
    }

    /// Wire form of every pending effect, oldest first.
    pub fn pending_json(&self) -> SyncResult<String> {
        let effects: Vec<&Effect> = self.queue.iter().map(|entry| &entry.effect).collect();
        Ok(serde_json::to_string(&effects)?)
    }
}

#[cfg(test)]
mod tests {
    use super::SyncEngine;
    use crate::graph::State;
    use crate::model::item::ItemId;
    use crate::session::{Session, SessionPatch};
    use crate::sync::{CorrelationId, SyncError, SyncResponse};

    #[test]
    fn unknown_correlation_is_rejected() {
        let mut engine = SyncEngine::default();
        let session = Session::new(State::new()).unwrap();
        let err = engine
            .handle_response(&session, CorrelationId::new(42), SyncResponse::Ok)
            .unwrap_err();
        assert!(matches!(err, SyncError::UnknownCorrelation(id) if id == CorrelationId::new(42)));
    }

    #[test]
    fn on_update_queues_one_leaf_per_change() {
        let mut engine = SyncEngine::default();
        let before = Session::new(State::new()).unwrap();
        let (state, a) = before.state().create();
        let state = state.append_child(&ItemId::root(), &a).unwrap();
        let after = before.merge(SessionPatch::new().state(state));

        assert!(engine.on_update(&before, &after).is_some());
        let kinds: Vec<_> = engine.queue().iter().map(|entry| entry.effect.kind()).collect();
        assert_eq!(kinds, vec!["update-edges", "set-content"]);
        assert!(engine.on_update(&after, &after).is_none());
    }
}
