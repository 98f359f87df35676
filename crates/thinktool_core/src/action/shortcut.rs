//! Keyboard shortcut descriptors for actions.
//!
//! Descriptors are data only; binding them to real key events is the UI's job.

use super::ActionName;

/// Modifier keys of one shortcut.
///
/// `primary` is the platform's main modifier, `secondary` the extra one used
/// for structural moves, `ctrl_like` is Ctrl on every platform except macOS.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub primary: bool,
    pub secondary: bool,
    pub ctrl_like: bool,
}

/// What fires the shortcut.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Key(&'static str),
    /// Pointer gesture described in words.
    Special(&'static str),
}

/// Editor cursor position the shortcut is restricted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortcutCondition {
    FirstCharacter,
    FirstLine,
    LastLine,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shortcut {
    pub modifiers: Modifiers,
    pub trigger: Trigger,
    pub condition: Option<ShortcutCondition>,
}

/// Actions that have a keyboard binding, in toolbar order.
pub const ACTIONS_WITH_SHORTCUTS: &[ActionName] = &[
    ActionName::Indent,
    ActionName::Unindent,
    ActionName::Up,
    ActionName::Down,
    ActionName::Toggle,
    ActionName::FocusUp,
    ActionName::FocusDown,
    ActionName::NewChild,
    ActionName::NewBefore,
    ActionName::New,
    ActionName::Remove,
    ActionName::Destroy,
    ActionName::InsertChild,
    ActionName::InsertSibling,
    ActionName::InsertParent,
    ActionName::InsertLink,
];

const PRIMARY: Modifiers = Modifiers {
    primary: true,
    secondary: false,
    ctrl_like: false,
};

const STRUCTURAL: Modifiers = Modifiers {
    primary: true,
    secondary: true,
    ctrl_like: false,
};

const NONE: Modifiers = Modifiers {
    primary: false,
    secondary: false,
    ctrl_like: false,
};

/// Shortcut bound to `action`, if any.
pub fn shortcut(action: ActionName) -> Option<Shortcut> {
    let (modifiers, trigger, condition) = match action {
        ActionName::Find => (PRIMARY, Trigger::Key("f"), None),
        ActionName::Indent => (STRUCTURAL, Trigger::Key("ArrowRight"), None),
        ActionName::Unindent => (STRUCTURAL, Trigger::Key("ArrowLeft"), None),
        ActionName::Up => (STRUCTURAL, Trigger::Key("ArrowUp"), None),
        ActionName::Down => (STRUCTURAL, Trigger::Key("ArrowDown"), None),
        ActionName::NewChild => (PRIMARY, Trigger::Key("Enter"), None),
        ActionName::Remove => (PRIMARY, Trigger::Key("Backspace"), None),
        ActionName::Destroy => (PRIMARY, Trigger::Key("Delete"), None),
        ActionName::InsertChild => (PRIMARY, Trigger::Key("c"), None),
        ActionName::InsertParent => (PRIMARY, Trigger::Key("p"), None),
        ActionName::InsertSibling => (PRIMARY, Trigger::Key("s"), None),
        ActionName::InsertLink => (PRIMARY, Trigger::Key("l"), None),
        ActionName::Toggle => (NONE, Trigger::Key("Tab"), None),
        ActionName::Undo => (
            Modifiers {
                ctrl_like: true,
                ..NONE
            },
            Trigger::Key("z"),
            None,
        ),
        ActionName::New => (NONE, Trigger::Key("Enter"), None),
        ActionName::NewBefore => (
            NONE,
            Trigger::Key("Enter"),
            Some(ShortcutCondition::FirstCharacter),
        ),
        ActionName::FocusUp => (
            NONE,
            Trigger::Key("ArrowUp"),
            Some(ShortcutCondition::FirstLine),
        ),
        ActionName::FocusDown => (
            NONE,
            Trigger::Key("ArrowDown"),
            Some(ShortcutCondition::LastLine),
        ),
        ActionName::Zoom => (NONE, Trigger::Special("Middle click bullet"), None),
        ActionName::Tutorial | ActionName::Changelog | ActionName::Home => return None,
    };
    Some(Shortcut {
        modifiers,
        trigger,
        condition,
    })
}
