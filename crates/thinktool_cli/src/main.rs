//! CLI smoke entry point.
//!
//! # Responsibility
//! - Drive one scripted editing session through the core crate.
//! - Print the resulting outline and the sync traffic it produces.
//! - Persist the outline and run one prefix search against it.
//!
//! Usage: `thinktool_cli [DB_PATH] [--config CONFIG_JSON]`. Without a
//! database path the session runs against an in-memory store.

use serde_json::json;
use std::error::Error;
use thinktool_core::{
    init_logging, open_db, open_db_in_memory, ActionEngine, ActionName, Content, CoreConfig,
    EdgeUpdate, ItemId, ItemSearch, RemoteError, RemoteStore, Selection, Session, SessionPatch,
    SnapshotRepository, SqliteItemSearch, SqliteSnapshotRepository, Step, SyncEngine,
};

/// Remote store that prints every call as one JSON line.
struct PrintingRemote;

impl RemoteStore for PrintingRemote {
    fn delete_thing(&mut self, thing: &ItemId) -> Result<(), RemoteError> {
        println!("{}", json!({"effect": "delete-thing", "thing": thing}));
        Ok(())
    }

    fn update_things(&mut self, updates: &[EdgeUpdate]) -> Result<(), RemoteError> {
        println!("{}", json!({"effect": "update-edges", "updates": updates}));
        Ok(())
    }

    fn set_content(&mut self, thing: &ItemId, content: &Content) -> Result<(), RemoteError> {
        println!(
            "{}",
            json!({"effect": "set-content", "thing": thing, "content": content})
        );
        Ok(())
    }

    fn tutorial_finished(&mut self, finished: bool) -> Result<(), RemoteError> {
        println!("{}", json!({"effect": "tutorial-finished", "finished": finished}));
        Ok(())
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let mut db_path = None;
    let mut config_path = None;
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => config_path = args.next(),
            _ => db_path = Some(arg),
        }
    }

    let config = match config_path {
        Some(path) => CoreConfig::from_file(path)?,
        None => CoreConfig::default(),
    };
    if config.logging.log_dir.is_some() {
        init_logging(&config.logging)?;
    }

    let conn = match &db_path {
        Some(path) => open_db(path)?,
        None => open_db_in_memory()?,
    };
    let repo = SqliteSnapshotRepository::try_new(&conn)?;
    let state = repo.load_state()?;
    log::info!(
        "event=cli_start module=cli status=ok items={}",
        state.all_items().count()
    );

    let mut actions = ActionEngine::new(&config.engine);
    let mut sync = SyncEngine::new(&config.sync);
    let start = Session::new(state)?;

    let session = run_script(&mut actions, &start)?;
    sync.on_update(&start, &session);
    let session = sync.flush(&session, &mut PrintingRemote)?;

    print_outline(&session)?;
    println!(
        "thinktool_core version={} disconnected={}",
        thinktool_core::core_version(),
        session.is_server_disconnected()
    );

    repo.save_state(session.state())?;

    let hits = SqliteItemSearch::new(&conn).query("gro", config.search.page_size)?;
    for hit in hits {
        println!("search gro -> {} {}", hit.id, hit.content.to_markup());
    }
    Ok(())
}

fn run_script(actions: &mut ActionEngine, start: &Session) -> Result<Session, Box<dyn Error>> {
    let session = completed(actions.execute(start, ActionName::New)?)?;
    let session = edit_focused(&session, "Groceries")?;

    let session = completed(actions.execute(&session, ActionName::NewChild)?)?;
    let session = edit_focused(&session, "Milk")?;

    let Step::AwaitInput(request) = actions.execute(&session, ActionName::InsertSibling)? else {
        return Err("insert-sibling should ask for input".into());
    };
    let outcome = actions.provide_input(request.id, &session, Selection::Create("Bread".into()))?;
    Ok(outcome.session)
}

fn completed(step: Step) -> Result<Session, Box<dyn Error>> {
    match step {
        Step::Done(outcome) => Ok(outcome.session),
        Step::AwaitInput(request) => {
            Err(format!("action `{}` unexpectedly waits for input", request.action).into())
        }
    }
}

// Stands in for the text editor writing into the focused item.
fn edit_focused(session: &Session, text: &str) -> Result<Session, Box<dyn Error>> {
    let focused = session.tree().focused().ok_or("no focused item")?;
    let item = session.tree().item(focused)?.clone();
    let state = session
        .state()
        .set_content(&item, Content::parse_markup(text))?;
    Ok(session.merge(SessionPatch::new().state(state)))
}

fn print_outline(session: &Session) -> Result<(), Box<dyn Error>> {
    let tree = session.tree();
    for node in tree.visible_nodes() {
        let depth = tree.depth(node)?;
        let item = tree.item(node)?;
        println!(
            "{}- {}",
            "  ".repeat(depth.saturating_sub(1)),
            session.state().content_text(item)
        );
    }
    Ok(())
}
