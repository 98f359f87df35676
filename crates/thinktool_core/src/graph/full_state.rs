//! Full-state document used for bulk import/export.
//!
//! The remote authority answers an initial load with every item, its content
//! and its ordered children. Converting that document into a `State` goes
//! through the regular graph operations so the store invariants hold for
//! imported data too.

use super::{GraphError, GraphResult, State};
use crate::model::item::{Content, ItemId};
use serde::{Deserialize, Serialize};

/// Whole-graph document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FullState {
    pub things: Vec<FullStateThing>,
}

/// One item with its ordered children.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FullStateThing {
    pub name: ItemId,
    pub content: Content,
    #[serde(default)]
    pub children: Vec<ItemId>,
}

/// Builds a state from a full-state document.
///
/// # Errors
/// - `NotFound` when a child id is not declared as a thing.
/// - `DuplicateEdge` / `CycleDetected` for malformed child lists.
pub fn transform_full_state_into_state(document: &FullState) -> GraphResult<State> {
    let mut state = State::new();
    for thing in &document.things {
        if !state.exists(&thing.name) {
            state = state.create_with_id(thing.name.clone())?;
        }
        state = state.set_content(&thing.name, thing.content.clone())?;
    }
    for thing in &document.things {
        if thing.children.is_empty() {
            continue;
        }
        if let Some(missing) = thing.children.iter().find(|child| !state.exists(child)) {
            return Err(GraphError::NotFound(missing.clone()));
        }
        state = state.set_children(&thing.name, &thing.children)?;
    }
    Ok(state)
}

/// Exports every item of `state`, sorted by id.
pub fn transform_state_into_full_state(state: &State) -> FullState {
    FullState {
        things: state
            .all_items()
            .map(|id| FullStateThing {
                name: id.clone(),
                content: state.content(id).cloned().unwrap_or_default(),
                children: state.children(id),
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::{transform_full_state_into_state, transform_state_into_full_state, FullState};
    use crate::graph::GraphError;
    use crate::model::item::ItemId;

    #[test]
    fn full_state_json_round_trips_through_state() {
        let json = r#"{
            "things": [
                {"name": "0", "content": ["Root"], "children": ["a", "b"]},
                {"name": "a", "content": ["A links ", {"link": "b"}]},
                {"name": "b", "content": ["B"], "children": []}
            ]
        }"#;
        let document: FullState = serde_json::from_str(json).unwrap();
        let state = transform_full_state_into_state(&document).unwrap();

        assert_eq!(
            state.children(&ItemId::root()),
            vec![ItemId::new("a"), ItemId::new("b")]
        );
        assert_eq!(state.content_text(&ItemId::new("a")), "A links B");
        assert_eq!(transform_state_into_full_state(&state).things.len(), 3);

        let again = transform_full_state_into_state(&transform_state_into_full_state(&state))
            .unwrap();
        assert_eq!(again, state);
    }

    #[test]
    fn undeclared_child_is_rejected() {
        let json = r#"{"things": [{"name": "0", "content": [], "children": ["ghost"]}]}"#;
        let document: FullState = serde_json::from_str(json).unwrap();
        let err = transform_full_state_into_state(&document).unwrap_err();
        assert_eq!(err, GraphError::NotFound(ItemId::new("ghost")));
    }
}
