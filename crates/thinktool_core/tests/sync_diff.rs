use thinktool_core::{
    apply_change_set, diff, diff_sessions, ChangeSet, Content, ContentEdit, EdgeUpdate, ItemId,
    Session, SessionPatch, State, TutorialState,
};

#[test]
fn identical_states_have_no_changes() {
    let (state, _) = outline();
    assert!(diff(&state, &state).is_empty());
    assert!(diff(&state, &state.with_fresh_generation()).is_empty());
}

#[test]
fn editing_a_created_item_reports_only_the_content() {
    let (state, a) = State::new().create();
    let created = state.append_child(&ItemId::root(), &a).unwrap();
    let edited = created.set_content(&a, Content::text("Hello")).unwrap();

    assert_eq!(
        diff(&created, &edited),
        ChangeSet {
            deleted: Vec::new(),
            updated: Vec::new(),
            edited: vec![ContentEdit {
                thing: a,
                content: Content::text("Hello"),
            }],
            tutorial_finished: None,
        }
    );
}

#[test]
fn new_item_is_reported_as_edge_update_and_content() {
    let before = State::new();
    let (state, a) = before.create();
    let after = state.append_child(&ItemId::root(), &a).unwrap();

    let changes = diff(&before, &after);

    assert!(changes.deleted.is_empty());
    assert_eq!(
        changes.updated,
        vec![EdgeUpdate {
            parent: ItemId::root(),
            children: vec![a.clone()],
        }]
    );
    assert_eq!(changes.edited.len(), 1);
    assert_eq!(changes.edited[0].thing, a);
}

#[test]
fn destroyed_item_is_deleted_and_parent_updated() {
    let (state, items) = outline();
    let destroyed = state.destroy(&items[1]).unwrap();

    let changes = diff(&state, &destroyed);

    assert_eq!(changes.deleted, vec![items[1].clone()]);
    assert_eq!(
        changes.updated,
        vec![EdgeUpdate {
            parent: ItemId::root(),
            children: vec![items[0].clone()],
        }]
    );
    assert!(changes.edited.is_empty());
}

#[test]
fn removing_last_child_reports_empty_list() {
    let (state, items) = outline();
    let (state, child) = state.create();
    let state = state.append_child(&items[0], &child).unwrap();
    let detached = state.remove_child(&items[0], &child);

    let changes = diff(&state, &detached);

    assert_eq!(
        changes.updated,
        vec![EdgeUpdate {
            parent: items[0].clone(),
            children: Vec::new(),
        }]
    );
}

#[test]
fn applying_a_diff_reproduces_the_target() {
    let (old, items) = outline();
    let (new, c) = old.create();
    let new = new
        .set_content(&c, Content::text("C"))
        .unwrap()
        .append_child(&items[0], &c)
        .unwrap()
        .reorder_child(&ItemId::root(), &items[1], 0)
        .unwrap()
        .set_content(&items[0], Content::text("A2"))
        .unwrap();

    let applied = apply_change_set(&old, &diff(&old, &new)).unwrap();

    assert!(diff(&applied, &new).is_empty());
    assert_eq!(applied.children(&ItemId::root()), new.children(&ItemId::root()));
    assert_eq!(applied.content_text(&items[0]), "A2");
}

#[test]
fn diffs_compose_when_applied_in_order() {
    let (s1, items) = outline();
    let s2 = s1.set_content(&items[1], Content::text("B2")).unwrap();
    let (s3, c) = s2.create();
    let s3 = s3.append_child(&items[1], &c).unwrap().destroy(&items[0]).unwrap();

    let stepwise = apply_change_set(&s1, &diff(&s1, &s2)).unwrap();
    let stepwise = apply_change_set(&stepwise, &diff(&s2, &s3)).unwrap();
    let direct = apply_change_set(&s1, &diff(&s1, &s3)).unwrap();

    assert!(diff(&stepwise, &s3).is_empty());
    assert!(diff(&direct, &s3).is_empty());
}

#[test]
fn finishing_the_tutorial_is_part_of_the_session_diff() {
    let before = Session::new(State::new()).unwrap();
    let running = before.merge(SessionPatch::new().tutorial(TutorialState::started()));
    assert!(diff_sessions(&before, &running).is_empty());

    let finished = running.merge(SessionPatch::new().tutorial(running.tutorial().finish()));
    let changes = diff_sessions(&running, &finished);

    assert_eq!(changes.tutorial_finished, Some(true));
    assert!(changes.edited.is_empty());
}

#[test]
fn change_set_json_uses_camel_case() {
    let changes = ChangeSet {
        tutorial_finished: Some(true),
        ..ChangeSet::default()
    };
    let json = serde_json::to_value(&changes).unwrap();
    assert_eq!(json["tutorialFinished"], serde_json::json!(true));
    assert!(json["deleted"].as_array().unwrap().is_empty());

    let omitted = serde_json::to_value(ChangeSet::default()).unwrap();
    assert!(omitted.get("tutorialFinished").is_none());
}

fn outline() -> (State, Vec<ItemId>) {
    let mut state = State::new();
    let mut items = Vec::new();
    for label in ["A", "B"] {
        let (next, id) = state.create();
        state = next
            .set_content(&id, Content::text(label))
            .unwrap()
            .append_child(&ItemId::root(), &id)
            .unwrap();
        items.push(id);
    }
    (state, items)
}
