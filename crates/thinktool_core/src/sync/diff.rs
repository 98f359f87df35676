//! Change sets between graph snapshots.

use crate::graph::{GraphResult, State};
use crate::model::item::{Content, ItemId};
use crate::session::Session;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// New ordered child list of one parent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeUpdate {
    pub parent: ItemId,
    pub children: Vec<ItemId>,
}

/// New content of one item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentEdit {
    pub thing: ItemId,
    pub content: Content,
}

/// Differences between two snapshots. Every list is sorted by item id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeSet {
    pub deleted: Vec<ItemId>,
    pub updated: Vec<EdgeUpdate>,
    pub edited: Vec<ContentEdit>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tutorial_finished: Option<bool>,
}

impl ChangeSet {
    pub fn is_empty(&self) -> bool {
        self.deleted.is_empty()
            && self.updated.is_empty()
            && self.edited.is_empty()
            && self.tutorial_finished.is_none()
    }
}

/// Compares two graph snapshots.
///
/// - `deleted`: items of `old` missing from `new`.
/// - `updated`: parents present in `new` whose ordered child list changed.
/// - `edited`: items of `new` whose content changed, including new items.
pub fn diff(old: &State, new: &State) -> ChangeSet {
    let deleted = old
        .all_items()
        .filter(|id| !new.exists(id))
        .cloned()
        .collect();

    let parents: BTreeSet<&ItemId> = old
        .parents_with_children()
        .chain(new.parents_with_children())
        .collect();
    let updated = parents
        .into_iter()
        .filter(|parent| new.exists(parent))
        .filter_map(|parent| {
            let children = new.children(parent);
            (old.children(parent) != children).then(|| EdgeUpdate {
                parent: parent.clone(),
                children,
            })
        })
        .collect();

    let edited = new
        .all_items()
        .filter_map(|id| {
            let content = new.content(id)?;
            (old.content(id) != Some(content)).then(|| ContentEdit {
                thing: id.clone(),
                content: content.clone(),
            })
        })
        .collect();

    ChangeSet {
        deleted,
        updated,
        edited,
        tutorial_finished: None,
    }
}

/// Like [`diff`], also reporting a change of the tutorial's finished flag.
pub fn diff_sessions(old: &Session, new: &Session) -> ChangeSet {
    let mut changes = diff(old.state(), new.state());
    let finished = new.tutorial().is_finished();
    if old.tutorial().is_finished() != finished {
        changes.tutorial_finished = Some(finished);
    }
    changes
}

/// Applies a change set produced by [`diff`] to `state`.
///
/// Updated parents are cleared before their new lists are written, so an
/// edge moving between two updated parents never forms a transient cycle.
pub fn apply_change_set(state: &State, changes: &ChangeSet) -> GraphResult<State> {
    let mut next = state.clone();
    for id in &changes.deleted {
        if next.exists(id) {
            next = next.destroy(id)?;
        }
    }
    for edit in &changes.edited {
        if !next.exists(&edit.thing) {
            next = next.create_with_id(edit.thing.clone())?;
        }
        next = next.set_content(&edit.thing, edit.content.clone())?;
    }
    for update in &changes.updated {
        next = next.set_children(&update.parent, &[])?;
    }
    for update in &changes.updated {
        next = next.set_children(&update.parent, &update.children)?;
    }
    Ok(next)
}

#[cfg(test)]
mod tests {
    use super::{apply_change_set, diff, ContentEdit, EdgeUpdate};
    use crate::graph::State;
    use crate::model::item::{Content, ItemId};

    #[test]
    fn identical_snapshots_produce_an_empty_change_set() {
        let (state, a) = State::new().create();
        let state = state.append_child(&ItemId::root(), &a).unwrap();
        let changes = diff(&state, &state);
        assert!(changes.is_empty());
        assert_eq!(changes.tutorial_finished, None);
    }

    #[test]
    fn created_item_is_reported_as_edited_and_parent_as_updated() {
        let old = State::new();
        let (state, a) = old.create();
        let new = state.append_child(&ItemId::root(), &a).unwrap();
        let changes = diff(&old, &new);
        assert!(changes.deleted.is_empty());
        assert_eq!(
            changes.updated,
            vec![EdgeUpdate {
                parent: ItemId::root(),
                children: vec![a.clone()],
            }]
        );
        assert_eq!(
            changes.edited,
            vec![ContentEdit {
                thing: a,
                content: Content::empty(),
            }]
        );
    }

    #[test]
    fn swapping_parents_applies_without_transient_cycle() {
        let (state, x) = State::new().create();
        let (state, y) = state.create();
        let base = state
            .append_child(&ItemId::root(), &x)
            .unwrap()
            .append_child(&x, &y)
            .unwrap();
        let swapped = base
            .remove_child(&ItemId::root(), &x)
            .remove_child(&x, &y)
            .append_child(&ItemId::root(), &y)
            .unwrap()
            .append_child(&y, &x)
            .unwrap();

        let applied = apply_change_set(&base, &diff(&base, &swapped)).unwrap();
        assert!(diff(&applied, &swapped).is_empty());
    }
}
