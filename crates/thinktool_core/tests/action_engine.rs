use thinktool_core::{
    ActionEngine, ActionError, ActionEvent, ActionName, Content, ItemId, Outcome, Selection,
    Session, SessionPatch, State, Step, TreeError, TutorialState,
};

#[test]
fn input_is_applied_to_the_latest_session() {
    let mut engine = ActionEngine::default();
    let (session, items) = focused_session(&["A"], 0);

    let request = awaiting(engine.execute(&session, ActionName::InsertSibling).unwrap());
    assert_eq!(engine.pending_inputs(), 1);

    // The user keeps editing while the picker is open.
    let latest = done(engine.execute(&session, ActionName::New).unwrap()).session;
    let created = latest.state().children(&ItemId::root())[1].clone();

    let outcome = engine
        .provide_input(request.id, &latest, Selection::Create("Picked".to_string()))
        .unwrap();

    let children = outcome.session.state().children(&ItemId::root());
    assert_eq!(children.len(), 3);
    assert_eq!(children[0], items[0]);
    assert_eq!(outcome.session.state().content_text(&children[1]), "Picked");
    assert_eq!(children[2], created);
    assert_eq!(engine.pending_inputs(), 0);
}

#[test]
fn cancelled_input_leaves_no_trace() {
    let mut engine = ActionEngine::default();
    let (session, _) = focused_session(&["A"], 0);

    let request = awaiting(engine.execute(&session, ActionName::InsertChild).unwrap());
    engine.cancel_input(request.id).unwrap();

    assert_eq!(engine.pending_inputs(), 0);
    assert_eq!(
        engine
            .provide_input(request.id, &session, Selection::Create("late".to_string()))
            .unwrap_err(),
        ActionError::UnknownRequest(request.id)
    );
    assert_eq!(
        engine.cancel_input(request.id).unwrap_err(),
        ActionError::UnknownRequest(request.id)
    );
}

#[test]
fn disabled_action_is_a_precondition_violation() {
    let mut engine = ActionEngine::default();
    let (session, _) = unfocused_session(&["A"]);

    let err = engine.execute(&session, ActionName::Indent).unwrap_err();

    assert_eq!(err, ActionError::PreconditionViolation(ActionName::Indent));
    assert!(!err.is_fatal());
}

#[test]
fn missing_target_is_a_contract_violation() {
    let mut engine = ActionEngine::default();
    let (session, _) = unfocused_session(&["A"]);

    let err = engine
        .execute_on(&session, ActionName::Zoom, None)
        .unwrap_err();

    assert!(err.is_fatal());
    assert!(matches!(
        err,
        ActionError::ContractViolation {
            action: ActionName::Zoom,
            ..
        }
    ));
}

#[test]
fn insert_parent_reports_child_and_new_parent() {
    let mut engine = ActionEngine::default();
    let (session, items) = unfocused_session(&["A", "B"]);

    let request = awaiting(engine.execute(&session, ActionName::InsertParent).unwrap());
    let outcome = engine
        .provide_input(request.id, &session, Selection::Create("Group".to_string()))
        .unwrap();

    let state = outcome.session.state();
    let group = state.children(&ItemId::root())[1].clone();
    assert_eq!(state.children(&group), vec![items[1].clone()]);
    assert_eq!(
        outcome.events,
        vec![ActionEvent::InsertedParent {
            child: items[1].clone(),
            parent: group,
        }]
    );
}

#[test]
fn zoom_and_home_move_the_projection_root() {
    let mut engine = ActionEngine::default();
    let (session, items) = focused_session(&["A"], 0);

    let zoomed = done(engine.execute(&session, ActionName::Zoom).unwrap());
    assert_eq!(zoomed.session.tree().root_item(), &items[0]);
    assert_eq!(zoomed.session.selected_thing(), &items[0]);
    assert_eq!(
        zoomed.events,
        vec![ActionEvent::Jump {
            previously_focused: ItemId::root(),
            thing: items[0].clone(),
        }]
    );
    assert_eq!(zoomed.session.state(), session.state());

    let home = done(engine.execute(&zoomed.session, ActionName::Home).unwrap());
    assert_eq!(home.session.tree().root_item(), &ItemId::root());
    assert_eq!(home.events, vec![ActionEvent::Home]);
}

#[test]
fn input_for_a_node_dropped_by_zoom_is_rejected() {
    let mut engine = ActionEngine::default();
    let (session, items) = unfocused_session(&["A", "B"]);
    let (state, c) = session.state().create();
    let (state, d) = state.create();
    let state = state
        .append_child(&items[0], &c)
        .unwrap()
        .append_child(&items[0], &d)
        .unwrap();
    let session = Session::new(state).unwrap();
    let visible = session.tree().visible_nodes();
    let node_a = visible[0];
    let node_b = visible[1];
    let session = session.merge(SessionPatch::new().tree(session.tree().focus(node_b).unwrap()));

    let request = awaiting(engine.execute(&session, ActionName::InsertChild).unwrap());
    let zoomed = done(
        engine
            .execute_on(&session, ActionName::Zoom, Some(node_a))
            .unwrap(),
    )
    .session;
    assert!(!zoomed.tree().contains(node_b));

    let err = engine
        .provide_input(request.id, &zoomed, Selection::Create("X".to_string()))
        .unwrap_err();

    assert_eq!(err, ActionError::Tree(TreeError::StaleNode(node_b)));
    assert_eq!(engine.pending_inputs(), 0);
    assert!(zoomed.state().children(&d).is_empty());
    assert!(zoomed.state().children(&items[1]).is_empty());
}

#[test]
fn find_zooms_to_the_picked_item() {
    let mut engine = ActionEngine::default();
    let (session, items) = unfocused_session(&["A", "B"]);

    let request = awaiting(engine.execute(&session, ActionName::Find).unwrap());
    assert_eq!(request.target, None);
    let outcome = engine
        .provide_input(request.id, &session, Selection::Existing(items[1].clone()))
        .unwrap();

    assert_eq!(outcome.session.tree().root_item(), &items[1]);
    assert_eq!(outcome.session.selected_thing(), &items[1]);
    assert_eq!(
        outcome.events,
        vec![ActionEvent::Found {
            previously_focused: ItemId::root(),
            thing: items[1].clone(),
        }]
    );
}

#[test]
fn find_rejects_unknown_item() {
    let mut engine = ActionEngine::default();
    let (session, _) = unfocused_session(&["A"]);

    let request = awaiting(engine.execute(&session, ActionName::Find).unwrap());
    let err = engine
        .provide_input(request.id, &session, Selection::Existing(ItemId::new("nope")))
        .unwrap_err();

    assert!(matches!(err, ActionError::Tree(_)));
    assert!(!err.is_fatal());
}

#[test]
fn linking_an_existing_sibling_again_is_ignored() {
    let mut engine = ActionEngine::default();
    let (session, items) = focused_session(&["A", "B"], 0);

    let request = awaiting(engine.execute(&session, ActionName::InsertSibling).unwrap());
    let outcome = engine
        .provide_input(request.id, &session, Selection::Existing(items[1].clone()))
        .unwrap();

    assert_eq!(outcome.session, session);
    assert!(outcome.events.is_empty());
}

#[test]
fn undo_restores_the_previous_graph() {
    let mut engine = ActionEngine::default();
    let (session, items) = unfocused_session(&["A", "B"]);

    let indented = done(engine.execute(&session, ActionName::Indent).unwrap());
    assert_eq!(indented.events, vec![ActionEvent::Moved]);
    assert_eq!(indented.session.undo_depth(), 1);

    let undone = done(engine.execute(&indented.session, ActionName::Undo).unwrap());
    assert_eq!(undone.session.state(), session.state());
    assert!(undone.session.state().generation() > indented.session.state().generation());
    assert_eq!(undone.session.state().children(&ItemId::root()), items);
    assert_eq!(undone.session.undo_depth(), 0);

    let nothing = done(engine.execute(&undone.session, ActionName::Undo).unwrap());
    assert_eq!(nothing.session, undone.session);
}

#[test]
fn running_tutorial_observes_structural_events() {
    let mut engine = ActionEngine::default();
    let (session, _) = focused_session(&["A"], 0);

    let started = done(engine.execute(&session, ActionName::Tutorial).unwrap()).session;
    assert!(started.tutorial().is_active());
    assert_eq!(
        engine.execute(&started, ActionName::Tutorial).unwrap_err(),
        ActionError::PreconditionViolation(ActionName::Tutorial)
    );

    let created = done(engine.execute(&started, ActionName::New).unwrap()).session;
    assert_eq!(created.tutorial().observed(), &[ActionEvent::CreatedItem]);
    assert_eq!(created.tutorial(), &TutorialState::started().action(&ActionEvent::CreatedItem));
}

#[test]
fn toggle_reports_new_expansion() {
    let mut engine = ActionEngine::default();
    let (session, items) = focused_session(&["A"], 0);

    let outcome = done(engine.execute(&session, ActionName::Toggle).unwrap());

    assert_eq!(
        outcome.events,
        vec![ActionEvent::ToggledItem {
            thing: items[0].clone(),
            expanded: true,
        }]
    );
    assert_eq!(outcome.session.undo_depth(), 0);
}

fn unfocused_session(labels: &[&str]) -> (Session, Vec<ItemId>) {
    let mut state = State::new();
    let mut items = Vec::new();
    for label in labels {
        let (next, id) = state.create();
        state = next
            .set_content(&id, Content::text(*label))
            .unwrap()
            .append_child(&ItemId::root(), &id)
            .unwrap();
        items.push(id);
    }
    (Session::new(state).unwrap(), items)
}

fn focused_session(labels: &[&str], focus: usize) -> (Session, Vec<ItemId>) {
    let (session, items) = unfocused_session(labels);
    let node = session.tree().visible_nodes()[focus];
    let tree = session.tree().focus(node).unwrap();
    (session.merge(SessionPatch::new().tree(tree)), items)
}

fn done(step: Step) -> Outcome {
    match step {
        Step::Done(outcome) => outcome,
        Step::AwaitInput(request) => panic!("unexpected input request {request:?}"),
    }
}

fn awaiting(step: Step) -> thinktool_core::InputRequest {
    match step {
        Step::AwaitInput(request) => request,
        Step::Done(outcome) => panic!("expected input request, got events {:?}", outcome.events),
    }
}
