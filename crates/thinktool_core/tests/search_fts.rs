use thinktool_core::{
    open_db_in_memory, Content, ItemId, ItemSearch, SnapshotRepository, SqliteItemSearch,
    SqliteSnapshotRepository, State,
};

#[test]
fn search_matches_word_prefixes() {
    let conn = open_db_in_memory().unwrap();
    save(&conn, &["buy milk tomorrow", "call mom", "milkshake recipe"]);

    let hits = SqliteItemSearch::new(&conn).query("mil", 10).unwrap();

    let texts: Vec<String> = hits.iter().map(|hit| plain(&hit.content)).collect();
    assert_eq!(texts.len(), 2);
    assert!(texts.contains(&"buy milk tomorrow".to_string()));
    assert!(texts.contains(&"milkshake recipe".to_string()));
}

#[test]
fn every_term_must_match() {
    let conn = open_db_in_memory().unwrap();
    save(&conn, &["plan meeting agenda", "plan vacation", "meeting notes"]);

    let hits = SqliteItemSearch::new(&conn)
        .query("plan meet", 10)
        .unwrap();

    assert_eq!(hits.len(), 1);
    assert_eq!(plain(&hits[0].content), "plan meeting agenda");
}

#[test]
fn search_reflects_updated_content() {
    let conn = open_db_in_memory().unwrap();
    let (state, ids) = save(&conn, &["alpha text"]);
    let repo = SqliteSnapshotRepository::try_new(&conn).unwrap();
    let state = state.set_content(&ids[0], Content::text("beta text")).unwrap();
    repo.save_state(&state).unwrap();

    let search = SqliteItemSearch::new(&conn);
    assert!(search.query("alpha", 10).unwrap().is_empty());
    let hits = search.query("beta", 10).unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].id, ids[0]);
}

#[test]
fn destroyed_items_are_not_found() {
    let conn = open_db_in_memory().unwrap();
    let (state, ids) = save(&conn, &["ephemeral idea"]);
    let repo = SqliteSnapshotRepository::try_new(&conn).unwrap();
    repo.save_state(&state.destroy(&ids[0]).unwrap()).unwrap();

    assert!(SqliteItemSearch::new(&conn)
        .query("ephemeral", 10)
        .unwrap()
        .is_empty());
}

#[test]
fn blank_query_and_zero_limit_return_nothing() {
    let conn = open_db_in_memory().unwrap();
    save(&conn, &["anything"]);
    let search = SqliteItemSearch::new(&conn);

    assert!(search.query("   ", 10).unwrap().is_empty());
    assert!(search.query("any", 0).unwrap().is_empty());
}

#[test]
fn larger_limit_extends_the_same_ordering() {
    let conn = open_db_in_memory().unwrap();
    save(
        &conn,
        &["note one", "note two", "note three", "note four", "note five"],
    );
    let search = SqliteItemSearch::new(&conn);

    let short: Vec<ItemId> = search
        .query("note", 2)
        .unwrap()
        .into_iter()
        .map(|hit| hit.id)
        .collect();
    let long: Vec<ItemId> = search
        .query("note", 5)
        .unwrap()
        .into_iter()
        .map(|hit| hit.id)
        .collect();

    assert_eq!(short.len(), 2);
    assert_eq!(long.len(), 5);
    assert_eq!(&long[..2], &short[..]);
}

#[test]
fn quotes_in_query_are_treated_as_text() {
    let conn = open_db_in_memory().unwrap();
    save(&conn, &["say \"hi\" loudly"]);

    let result = SqliteItemSearch::new(&conn).query("\"hi", 10);

    assert!(result.is_ok());
}

fn save(conn: &rusqlite::Connection, texts: &[&str]) -> (State, Vec<ItemId>) {
    let mut state = State::new();
    let mut ids = Vec::new();
    for text in texts {
        let (next, id) = state.create();
        state = next
            .set_content(&id, Content::text(*text))
            .unwrap()
            .append_child(&ItemId::root(), &id)
            .unwrap();
        ids.push(id);
    }
    let repo = SqliteSnapshotRepository::try_new(conn).unwrap();
    repo.save_state(&state).unwrap();
    (state, ids)
}

fn plain(content: &Content) -> String {
    content.plain_text_with(|_| None)
}
