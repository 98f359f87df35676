use thinktool_core::{
    transform_full_state_into_state, transform_state_into_full_state, Content, FullState,
    GraphError, ItemId, State,
};

fn with_items(count: usize) -> (State, Vec<ItemId>) {
    let mut state = State::new();
    let mut ids = Vec::new();
    for _ in 0..count {
        let (next, id) = state.create();
        state = next;
        ids.push(id);
    }
    (state, ids)
}

#[test]
fn fresh_state_holds_only_the_root() {
    let state = State::new();
    assert!(state.exists(&ItemId::root()));
    assert_eq!(state.all_items().count(), 1);
    assert!(state.children(&ItemId::root()).is_empty());
}

#[test]
fn create_allocates_distinct_empty_items() {
    let (state, ids) = with_items(3);
    assert_eq!(state.all_items().count(), 4);
    assert_ne!(ids[0], ids[1]);
    assert_eq!(state.content(&ids[2]), Some(&Content::empty()));
}

#[test]
fn add_then_remove_child_restores_state() {
    let (state, ids) = with_items(2);
    let base = state.append_child(&ItemId::root(), &ids[0]).unwrap();
    let added = base.add_child(&ids[0], &ids[1], 7).unwrap();
    assert_eq!(added.children(&ids[0]), vec![ids[1].clone()]);
    assert_eq!(added.remove_child(&ids[0], &ids[1]), base);
}

#[test]
fn remove_of_missing_edge_is_a_no_op() {
    let (state, ids) = with_items(2);
    let removed = state.remove(&ids[0], &ids[1]);
    assert_eq!(removed, state);
    assert_eq!(removed.generation(), state.generation());
}

#[test]
fn equal_positions_keep_insertion_order() {
    let (state, ids) = with_items(3);
    let state = state
        .add_child(&ItemId::root(), &ids[0], 5)
        .unwrap()
        .add_child(&ItemId::root(), &ids[1], 1)
        .unwrap()
        .add_child(&ItemId::root(), &ids[2], 5)
        .unwrap();
    assert_eq!(
        state.children(&ItemId::root()),
        vec![ids[1].clone(), ids[0].clone(), ids[2].clone()]
    );
}

#[test]
fn edge_errors_are_reported() {
    let (state, ids) = with_items(2);
    let missing = ItemId::new("missing");
    assert_eq!(
        state.add_child(&ids[0], &missing, 0).unwrap_err(),
        GraphError::NotFound(missing.clone())
    );

    let linked = state.append_child(&ids[0], &ids[1]).unwrap();
    assert!(matches!(
        linked.append_child(&ids[0], &ids[1]),
        Err(GraphError::DuplicateEdge { .. })
    ));
    assert!(matches!(
        linked.append_child(&ids[1], &ids[0]),
        Err(GraphError::CycleDetected { .. })
    ));
    assert!(matches!(
        linked.append_child(&ids[1], &ids[1]),
        Err(GraphError::CycleDetected { .. })
    ));
}

#[test]
fn destroy_removes_item_from_every_parent() {
    let (state, ids) = with_items(3);
    let (a, b, x) = (&ids[0], &ids[1], &ids[2]);
    let state = state
        .append_child(&ItemId::root(), a)
        .unwrap()
        .append_child(&ItemId::root(), b)
        .unwrap()
        .append_child(a, x)
        .unwrap()
        .append_child(b, x)
        .unwrap();
    assert_eq!(state.parents(x).len(), 2);
    assert_eq!(state.other_parents(a, x), vec![b.clone()]);

    let destroyed = state.destroy(x).unwrap();
    assert!(!destroyed.exists(x));
    assert!(destroyed.children(a).is_empty());
    assert!(destroyed.children(b).is_empty());
    assert!(destroyed.generation() > state.generation());

    assert_eq!(
        destroyed.destroy(x).unwrap_err(),
        GraphError::NotFound(x.clone())
    );
    assert_eq!(
        destroyed.destroy(&ItemId::root()).unwrap_err(),
        GraphError::RootProtected
    );
}

#[test]
fn content_mutation_keeps_generation() {
    let (state, ids) = with_items(1);
    let edited = state.set_content(&ids[0], Content::text("Hello")).unwrap();
    assert_eq!(edited.generation(), state.generation());
    assert_eq!(edited.content_text(&ids[0]), "Hello");
    assert!(matches!(
        state.set_content(&ItemId::new("nope"), Content::empty()),
        Err(GraphError::NotFound(_))
    ));
}

#[test]
fn references_resolve_one_level_in_text() {
    let (state, ids) = with_items(2);
    let (target, source) = (&ids[0], &ids[1]);
    let state = state
        .set_content(target, Content::text("Milk"))
        .unwrap()
        .set_content(
            source,
            Content::parse_markup(&format!("Buy [[{target}]] today")),
        )
        .unwrap();

    assert_eq!(state.references(source), vec![target.clone()]);
    assert_eq!(state.backreferences(target), vec![source.clone()]);
    assert!(state.has_children_or_references(target));
    assert!(!state.has_children(target));
    assert_eq!(state.content_text(source), "Buy Milk today");
}

#[test]
fn full_state_document_round_trips() {
    let json = r#"{
        "things": [
            {"name": "0", "content": [], "children": ["a", "b"]},
            {"name": "a", "content": ["Hello ", {"link": "b"}], "children": ["b"]},
            {"name": "b", "content": ["World"]}
        ]
    }"#;
    let document: FullState = serde_json::from_str(json).unwrap();
    let state = transform_full_state_into_state(&document).unwrap();

    assert_eq!(
        state.children(&ItemId::root()),
        vec![ItemId::new("a"), ItemId::new("b")]
    );
    assert_eq!(state.parents(&ItemId::new("b")).len(), 2);
    assert_eq!(state.content_text(&ItemId::new("a")), "Hello World");

    let exported = transform_state_into_full_state(&state);
    let reimported = transform_full_state_into_state(&exported).unwrap();
    assert_eq!(reimported, state);
}
