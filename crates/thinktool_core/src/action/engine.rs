//! Action execution over immutable sessions.
//!
//! Transitions that need a picker selection are split in two: `execute_on`
//! parks the action and returns an [`InputRequest`]; `provide_input` later
//! applies it to whatever session is current at that moment.

use super::{enabled, ActionError, ActionEvent, ActionName, ActionResult};
use crate::config::EngineConfig;
use crate::graph::{GraphError, State};
use crate::model::item::ItemId;
use crate::session::{Session, SessionPatch};
use crate::tree::{resolve_selection, NodeRef, Selection, Tree, TreeError};
use log::{error, info, warn};
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

/// Identifier of one outstanding input request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestId(u64);

impl Display for RequestId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "req#{}", self.0)
    }
}

/// Asks the item picker for a selection on behalf of a parked action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputRequest {
    pub id: RequestId,
    pub action: ActionName,
    pub target: Option<NodeRef>,
}

/// Result of starting an action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Done(Outcome),
    AwaitInput(InputRequest),
}

/// Text editor currently holding the caret, if the UI has one.
pub trait ActiveEditor {
    fn replace_selection_with_link(&mut self, target: &ItemId, text: &str);
}

/// Completed transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub session: Session,
    /// Item the active editor must splice a link to.
    pub insert_link: Option<ItemId>,
    pub events: Vec<ActionEvent>,
}

impl Outcome {
    fn unchanged(session: &Session) -> Self {
        Self {
            session: session.clone(),
            insert_link: None,
            events: Vec::new(),
        }
    }

    /// Performs the pending link splice, if any.
    ///
    /// Returns `Ok(false)` when there was nothing to insert.
    pub fn apply_link(&self, editor: Option<&mut dyn ActiveEditor>) -> ActionResult<bool> {
        let Some(target) = self.insert_link.as_ref() else {
            return Ok(false);
        };
        let editor = editor.ok_or(ActionError::ContractViolation {
            action: ActionName::InsertLink,
            missing: "an active editor",
        })?;
        let text = self.session.state().content_text(target);
        editor.replace_selection_with_link(target, &text);
        Ok(true)
    }
}

#[derive(Debug, Clone)]
struct PendingInput {
    action: ActionName,
    target: Option<NodeRef>,
    previously_focused: ItemId,
}

/// Runs actions and tracks actions parked on picker input.
#[derive(Debug, Clone)]
pub struct ActionEngine {
    undo_depth: usize,
    next_request: u64,
    pending: BTreeMap<RequestId, PendingInput>,
}

impl Default for ActionEngine {
    fn default() -> Self {
        Self::new(&EngineConfig::default())
    }
}

impl ActionEngine {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            undo_depth: config.undo_depth,
            next_request: 1,
            pending: BTreeMap::new(),
        }
    }

    /// Number of actions waiting for picker input.
    pub fn pending_inputs(&self) -> usize {
        self.pending.len()
    }

    /// Runs `action` on the focused node.
    ///
    /// # Errors
    /// - `PreconditionViolation` when the action is disabled in `session`.
    pub fn execute(&mut self, session: &Session, action: ActionName) -> ActionResult<Step> {
        if !enabled(session, action) {
            warn!("event=action_execute module=action status=skipped action={action} reason=disabled");
            return Err(ActionError::PreconditionViolation(action));
        }
        self.execute_on(session, action, session.tree().focused())
    }

    /// Runs `action` on an explicit target node.
    ///
    /// A disabled action only logs a warning here; callers that bypass the
    /// toolbar are trusted.
    pub fn execute_on(
        &mut self,
        session: &Session,
        action: ActionName,
        target: Option<NodeRef>,
    ) -> ActionResult<Step> {
        if !enabled(session, action) {
            warn!("event=action_execute module=action status=warning action={action} reason=not_enabled");
        }
        if action.requires_target() && target.is_none() {
            return Err(ActionError::ContractViolation {
                action,
                missing: "a target node",
            });
        }

        if action.needs_input() {
            let id = RequestId(self.next_request);
            self.next_request += 1;
            self.pending.insert(
                id,
                PendingInput {
                    action,
                    target,
                    previously_focused: session.tree().root_item().clone(),
                },
            );
            info!("event=action_input module=action status=start action={action} request={id}");
            return Ok(Step::AwaitInput(InputRequest { id, action, target }));
        }

        let outcome = self.run(session, action, target, None)?;
        Ok(Step::Done(outcome))
    }

    /// Resumes a parked action on `latest`, the session current at delivery.
    pub fn provide_input(
        &mut self,
        request: RequestId,
        latest: &Session,
        selection: Selection,
    ) -> ActionResult<Outcome> {
        let pending = self
            .pending
            .remove(&request)
            .ok_or(ActionError::UnknownRequest(request))?;
        info!(
            "event=action_input module=action status=ok action={} request={request}",
            pending.action
        );
        let action = pending.action;
        let target = pending.target;
        if let Some(node) = target.filter(|node| !latest.tree().contains(*node)) {
            warn!(
                "event=action_input module=action status=rejected action={action} request={request} reason=stale_target node={node}"
            );
            return Err(ActionError::Tree(TreeError::StaleNode(node)));
        }
        self.run(latest, action, target, Some((selection, pending.previously_focused)))
    }

    /// Abandons a parked action. The session is left untouched.
    pub fn cancel_input(&mut self, request: RequestId) -> ActionResult<()> {
        let pending = self
            .pending
            .remove(&request)
            .ok_or(ActionError::UnknownRequest(request))?;
        info!(
            "event=action_input module=action status=cancelled action={} request={request}",
            pending.action
        );
        Ok(())
    }

    fn run(
        &self,
        session: &Session,
        action: ActionName,
        target: Option<NodeRef>,
        input: Option<(Selection, ItemId)>,
    ) -> ActionResult<Outcome> {
        let mut outcome = match transition(session, action, target, input) {
            Ok(outcome) => outcome,
            Err(ActionError::Tree(TreeError::Graph(GraphError::DuplicateEdge { parent, child }))) => {
                warn!(
                    "event=action_execute module=action status=skipped action={action} reason=duplicate_edge parent={parent} child={child}"
                );
                return Ok(Outcome::unchanged(session));
            }
            Err(err) => {
                if err.is_fatal() {
                    error!("event=action_execute module=action status=error action={action} error={err}");
                } else {
                    warn!("event=action_execute module=action status=error action={action} error={err}");
                }
                return Err(err);
            }
        };

        if action != ActionName::Undo && outcome.session.state() != session.state() {
            outcome.session = outcome
                .session
                .record_undo(session.state().clone(), self.undo_depth);
        }
        if !outcome.events.is_empty() {
            let mut tutorial = outcome.session.tutorial().clone();
            for event in &outcome.events {
                tutorial = tutorial.action(event);
            }
            outcome.session = outcome.session.merge(SessionPatch::new().tutorial(tutorial));
        }
        info!(
            "event=action_execute module=action status=ok action={action} events={}",
            outcome.events.len()
        );
        Ok(outcome)
    }
}

fn require(action: ActionName, target: Option<NodeRef>) -> ActionResult<NodeRef> {
    target.ok_or(ActionError::ContractViolation {
        action,
        missing: "a target node",
    })
}

fn require_input(
    action: ActionName,
    input: Option<(Selection, ItemId)>,
) -> ActionResult<(Selection, ItemId)> {
    input.ok_or(ActionError::ContractViolation {
        action,
        missing: "a picker selection",
    })
}

fn done(session: Session, events: Vec<ActionEvent>) -> Outcome {
    Outcome {
        session,
        insert_link: None,
        events,
    }
}

fn structural(session: &Session, (state, tree): (State, Tree)) -> Session {
    session.merge(SessionPatch::new().state(state).tree(tree))
}

fn transition(
    session: &Session,
    action: ActionName,
    target: Option<NodeRef>,
    input: Option<(Selection, ItemId)>,
) -> ActionResult<Outcome> {
    let state = session.state();
    let tree = session.tree();

    let outcome = match action {
        ActionName::InsertSibling => {
            let (selection, _) = require_input(action, input)?;
            let edited = tree.insert_sibling_after(state, require(action, target)?, &selection)?;
            done(structural(session, edited), Vec::new())
        }
        ActionName::InsertChild => {
            let (selection, _) = require_input(action, input)?;
            let edited = tree.insert_child(state, require(action, target)?, &selection, 0)?;
            done(structural(session, edited), Vec::new())
        }
        ActionName::InsertParent => {
            let (selection, _) = require_input(action, input)?;
            let node = require(action, target)?;
            let child = tree.item(node)?.clone();
            let (state, tree) = tree.insert_parent(state, node, &selection)?;
            let parent = match tree.focused() {
                Some(focused) => tree.item(focused)?.clone(),
                None => child.clone(),
            };
            done(
                structural(session, (state, tree)),
                vec![ActionEvent::InsertedParent { child, parent }],
            )
        }
        ActionName::InsertLink => {
            let (selection, _) = require_input(action, input)?;
            let (state, linked) = resolve_selection(state, &selection)?;
            Outcome {
                session: session.merge(SessionPatch::new().state(state)),
                insert_link: Some(linked),
                events: vec![ActionEvent::LinkInserted],
            }
        }
        ActionName::Find => {
            let (selection, previously_focused) = require_input(action, input)?;
            let (state, thing) = resolve_selection(state, &selection)?;
            let tree = Tree::from_root(&state, &thing)?;
            done(
                session.merge(
                    SessionPatch::new()
                        .state(state)
                        .tree(tree)
                        .selected_thing(thing.clone()),
                ),
                vec![ActionEvent::Found {
                    previously_focused,
                    thing,
                }],
            )
        }
        ActionName::New => {
            let (state, tree, _) = match target {
                Some(node) => tree.create_sibling_after(state, node)?,
                None => tree.create_child(state, tree.root())?,
            };
            done(structural(session, (state, tree)), vec![ActionEvent::CreatedItem])
        }
        ActionName::NewBefore => {
            let (state, tree, _) = tree.create_sibling_before(state, require(action, target)?)?;
            done(structural(session, (state, tree)), vec![ActionEvent::CreatedItem])
        }
        ActionName::NewChild => {
            let (state, tree, _) = tree.create_child(state, require(action, target)?)?;
            done(structural(session, (state, tree)), vec![ActionEvent::CreatedItem])
        }
        ActionName::FocusUp => done(session.merge(SessionPatch::new().tree(tree.focus_up())), Vec::new()),
        ActionName::FocusDown => {
            done(session.merge(SessionPatch::new().tree(tree.focus_down())), Vec::new())
        }
        ActionName::Zoom => {
            let thing = tree.item(require(action, target)?)?.clone();
            let previously_focused = tree.root_item().clone();
            let zoomed = Tree::from_root(state, &thing)?;
            done(
                session.merge(SessionPatch::new().tree(zoomed).selected_thing(thing.clone())),
                vec![ActionEvent::Jump {
                    previously_focused,
                    thing,
                }],
            )
        }
        ActionName::Indent => moved(session, tree.indent(state, require(action, target)?)?),
        ActionName::Unindent => moved(session, tree.unindent(state, require(action, target)?)?),
        ActionName::Up => moved(session, tree.move_up(state, require(action, target)?)?),
        ActionName::Down => moved(session, tree.move_down(state, require(action, target)?)?),
        ActionName::Toggle => {
            let node = require(action, target)?;
            let thing = tree.item(node)?.clone();
            let toggled = tree.toggle(state, node)?;
            let expanded = toggled.is_expanded(node)?;
            done(
                session.merge(SessionPatch::new().tree(toggled)),
                vec![ActionEvent::ToggledItem { thing, expanded }],
            )
        }
        ActionName::Remove => {
            let edited = tree.remove(state, require(action, target)?)?;
            done(structural(session, edited), vec![ActionEvent::Removed])
        }
        ActionName::Destroy => {
            let edited = tree.remove_thing(state, require(action, target)?)?;
            done(structural(session, edited), vec![ActionEvent::Destroy])
        }
        ActionName::Tutorial => done(
            session.merge(SessionPatch::new().tutorial(session.tutorial().reset())),
            Vec::new(),
        ),
        ActionName::Changelog => done(
            session.merge(SessionPatch::new().changelog_shown(!session.changelog_shown())),
            Vec::new(),
        ),
        ActionName::Undo => match session.undo()? {
            Some(undone) => done(undone, Vec::new()),
            None => Outcome::unchanged(session),
        },
        ActionName::Home => {
            let home = Tree::from_root(state, &ItemId::root())?;
            done(
                session.merge(SessionPatch::new().tree(home).selected_thing(ItemId::root())),
                vec![ActionEvent::Home],
            )
        }
    };
    Ok(outcome)
}

fn moved(session: &Session, edited: (State, Tree)) -> Outcome {
    done(structural(session, edited), vec![ActionEvent::Moved])
}
