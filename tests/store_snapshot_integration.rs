use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use geonote::{
    Category, Database, DateFilter, FixedClock, LiveQuery, Location, NewNote, NoteEdit, NoteId,
    NoteScope, NoteStore, QuerySpec, SortOption, UserId,
};
use time::OffsetDateTime;
use time::macros::datetime;

const NOW: OffsetDateTime = datetime!(2024-06-15 10:00 UTC);

fn store() -> Result<NoteStore> {
    Ok(NoteStore::with_clock(
        Database::in_memory()?,
        Arc::new(FixedClock(NOW)),
    )?)
}

fn note(user: &str, title: &str, city: &str) -> NewNote {
    NewNote::new(user, title, Location::at(0.0, 0.0).in_city(city, "Country"))
}

#[test]
fn live_query_tracks_inserts_edits_and_deletes() -> Result<()> {
    let store = store()?;
    let mut live = LiveQuery::new(
        store.subscribe(),
        NoteScope::User(UserId::from("alice")),
        QuerySpec {
            sort: SortOption::TitleAz,
            ..Default::default()
        },
    );

    let b = store.insert_note(note("alice", "Bistro", "Paris"))?;
    let a = store.insert_note(note("alice", "Atelier", "Paris"))?;
    store.insert_note(note("bob", "Aardvark", "Paris"))?;

    assert!(live.refresh());
    let titles: Vec<&str> = live.results(NOW).iter().map(|n| n.title()).collect();
    assert_eq!(titles, ["Atelier", "Bistro"]);

    store.update_note(
        a.id(),
        NoteEdit {
            title: Some("Zinc bar".to_string()),
            category: Some(Category::Food),
            ..Default::default()
        },
    )?;
    store.delete_note(b.id())?;

    assert!(live.refresh());
    let results = live.results(NOW);
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].title(), "Zinc bar");
    assert_eq!(results[0].category(), "Food");
    Ok(())
}

#[test]
fn favorite_toggle_reaches_favorites_only_view() -> Result<()> {
    let store = store()?;
    let noted = store.insert_note(note("alice", "Cafe", "Lyon"))?;
    let mut live = LiveQuery::new(
        store.subscribe(),
        NoteScope::All,
        QuerySpec {
            favorites_only: true,
            date_filter: DateFilter::Today,
            ..Default::default()
        },
    );
    assert!(live.results(NOW).is_empty());

    store.set_favorite(noted.id(), true)?;
    live.refresh();

    let results = live.results(NOW);
    assert_eq!(results.len(), 1);
    // Favoriting never touches the creation time.
    assert_eq!(results[0].timestamp(), NOW);
    Ok(())
}

#[test]
fn snapshot_is_not_mutated_by_queries() -> Result<()> {
    let store = store()?;
    for title in ["c", "a", "b"] {
        store.insert_note(note("alice", title, "Paris"))?;
    }
    let before: Vec<NoteId> = store.snapshot().iter().map(|n| n.id()).collect();

    let live = LiveQuery::new(
        store.subscribe(),
        NoteScope::All,
        QuerySpec {
            sort: SortOption::TitleAz,
            ..Default::default()
        },
    );
    let _ = live.results(NOW);

    let after: Vec<NoteId> = store.snapshot().iter().map(|n| n.id()).collect();
    assert_eq!(before, after);
    Ok(())
}

#[tokio::test]
async fn subscriber_in_another_task_sees_publishes() -> Result<()> {
    let store = store()?;
    let mut rx = store.subscribe();

    let watcher = tokio::spawn(async move {
        rx.changed().await.ok()?;
        let titles: Vec<String> = rx.borrow().iter().map(|n| n.title().to_string()).collect();
        Some(titles)
    });

    store.insert_note(note("alice", "Harbor", "Oslo"))?;

    let titles = tokio::time::timeout(Duration::from_secs(1), watcher)
        .await??
        .expect("sender dropped before publish");
    assert_eq!(titles, ["Harbor"]);
    Ok(())
}
