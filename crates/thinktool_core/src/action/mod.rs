//! User intents and their enablement rules.
//!
//! # Responsibility
//! - Define the closed set of actions exposed to UI collaborators.
//! - Decide whether an action may run in a given session.
//! - Classify action failures into ignorable and fatal ones.
//!
//! # Invariants
//! - `enabled` is pure and total over the action set.
//! - Only `ContractViolation` is fatal; everything else is reported and the
//!   session is left unchanged.

use crate::model::item::ItemId;
use crate::session::Session;
use crate::tree::TreeError;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

mod engine;
pub mod shortcut;

pub use engine::{ActionEngine, ActiveEditor, InputRequest, Outcome, RequestId, Step};
pub use shortcut::{shortcut, Modifiers, Shortcut, ShortcutCondition, Trigger};

/// Result type for action engine operations.
pub type ActionResult<T> = Result<T, ActionError>;

/// Named user intents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ActionName {
    InsertSibling,
    InsertChild,
    InsertParent,
    InsertLink,
    Find,
    New,
    NewBefore,
    NewChild,
    FocusUp,
    FocusDown,
    Zoom,
    Indent,
    Unindent,
    Up,
    Down,
    Toggle,
    Remove,
    Destroy,
    Tutorial,
    Changelog,
    Undo,
    Home,
}

impl ActionName {
    pub const ALL: [ActionName; 22] = [
        Self::InsertSibling,
        Self::InsertChild,
        Self::InsertParent,
        Self::InsertLink,
        Self::Find,
        Self::New,
        Self::NewBefore,
        Self::NewChild,
        Self::FocusUp,
        Self::FocusDown,
        Self::Zoom,
        Self::Indent,
        Self::Unindent,
        Self::Up,
        Self::Down,
        Self::Toggle,
        Self::Remove,
        Self::Destroy,
        Self::Tutorial,
        Self::Changelog,
        Self::Undo,
        Self::Home,
    ];

    /// Stable kebab-case name used by UI bindings and logs.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InsertSibling => "insert-sibling",
            Self::InsertChild => "insert-child",
            Self::InsertParent => "insert-parent",
            Self::InsertLink => "insert-link",
            Self::Find => "find",
            Self::New => "new",
            Self::NewBefore => "new-before",
            Self::NewChild => "new-child",
            Self::FocusUp => "focus-up",
            Self::FocusDown => "focus-down",
            Self::Zoom => "zoom",
            Self::Indent => "indent",
            Self::Unindent => "unindent",
            Self::Up => "up",
            Self::Down => "down",
            Self::Toggle => "toggle",
            Self::Remove => "remove",
            Self::Destroy => "destroy",
            Self::Tutorial => "tutorial",
            Self::Changelog => "changelog",
            Self::Undo => "undo",
            Self::Home => "home",
        }
    }

    /// Whether the transition first asks the item picker for a selection.
    pub fn needs_input(self) -> bool {
        matches!(
            self,
            Self::InsertSibling
                | Self::InsertChild
                | Self::InsertParent
                | Self::InsertLink
                | Self::Find
        )
    }

    fn requires_target(self) -> bool {
        !matches!(
            self,
            Self::Find | Self::New | Self::Changelog | Self::Undo | Self::Home | Self::Tutorial
        )
    }
}

impl Display for ActionName {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionName {
    type Err = ActionError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim();
        Self::ALL
            .into_iter()
            .find(|action| action.as_str() == normalized)
            .ok_or_else(|| ActionError::UnknownAction(normalized.to_string()))
    }
}

/// Whether `action` may run in `session`.
///
/// Always-enabled actions ignore focus; structural actions need a focused
/// node; `tutorial` is disabled while a tutorial is running.
pub fn enabled(session: &Session, action: ActionName) -> bool {
    match action {
        ActionName::Tutorial => !session.tutorial().is_active(),
        action if action.requires_target() => session.tree().focused().is_some(),
        _ => true,
    }
}

/// Semantic event emitted by structural transitions for the tutorial.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionEvent {
    CreatedItem,
    InsertedParent { child: ItemId, parent: ItemId },
    Jump { previously_focused: ItemId, thing: ItemId },
    Moved,
    Removed,
    Destroy,
    ToggledItem { thing: ItemId, expanded: bool },
    Home,
    Found { previously_focused: ItemId, thing: ItemId },
    LinkInserted,
}

impl ActionEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::CreatedItem => "created-item",
            Self::InsertedParent { .. } => "inserted-parent",
            Self::Jump { .. } => "jump",
            Self::Moved => "moved",
            Self::Removed => "removed",
            Self::Destroy => "destroy",
            Self::ToggledItem { .. } => "toggled-item",
            Self::Home => "home",
            Self::Found { .. } => "found",
            Self::LinkInserted => "link-inserted",
        }
    }
}

/// Errors from the action engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionError {
    /// Action invoked while disabled.
    PreconditionViolation(ActionName),
    /// A value the caller guaranteed to be present was missing.
    ContractViolation {
        action: ActionName,
        missing: &'static str,
    },
    /// No pending input request with this id.
    UnknownRequest(RequestId),
    /// Action name not in the closed action set.
    UnknownAction(String),
    /// Projection or graph failure during the transition.
    Tree(TreeError),
}

impl ActionError {
    /// Contract violations are programming errors and must not be ignored.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::ContractViolation { .. })
    }
}

impl Display for ActionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PreconditionViolation(action) => write!(f, "action `{action}` is not enabled"),
            Self::ContractViolation { action, missing } => {
                write!(f, "action `{action}` requires {missing}, but none was given")
            }
            Self::UnknownRequest(id) => write!(f, "no pending input request {id}"),
            Self::UnknownAction(name) => write!(f, "unknown action `{name}`"),
            Self::Tree(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ActionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Tree(err) => Some(err),
            _ => None,
        }
    }
}

impl From<TreeError> for ActionError {
    fn from(value: TreeError) -> Self {
        Self::Tree(value)
    }
}
