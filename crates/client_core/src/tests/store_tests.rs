use super::*;
use crate::test_support::{ids, task, touched};
use shared::domain::Priority;

#[test]
fn insert_prepends_newest_first() {
    let mut store = TaskStore::new();
    assert_eq!(store.insert(task("a", Priority::P1)), InsertOutcome::Inserted);
    assert_eq!(store.insert(task("b", Priority::P4)), InsertOutcome::Inserted);

    assert_eq!(ids(store.tasks()), vec!["b", "a"]);
}

#[test]
fn insert_of_known_id_replaces_in_place() {
    let mut store = TaskStore::new();
    let _ = store.insert(task("a", Priority::P1));
    let _ = store.insert(task("b", Priority::P2));

    let mut renamed = task("a", Priority::P1);
    renamed.task_name = "renamed".to_string();
    assert_eq!(store.insert(renamed), InsertOutcome::ReplacedExisting);

    assert_eq!(ids(store.tasks()), vec!["b", "a"]);
    assert_eq!(store.get(&TaskId::from("a")).map(|t| t.task_name.as_str()), Some("renamed"));
}

#[test]
fn replace_twice_is_idempotent() {
    let mut store = TaskStore::new();
    let _ = store.insert(task("a", Priority::P3));
    let _ = store.insert(task("b", Priority::P3));

    let mut edited = touched(task("a", Priority::P1), "2025-01-02T00:00:00Z");
    edited.assignee = Some("John".to_string());

    let id = TaskId::from("a");
    assert_eq!(store.replace(&id, edited.clone()), ReplaceOutcome::Replaced);
    let once = store.tasks().to_vec();
    assert_eq!(store.replace(&id, edited), ReplaceOutcome::Replaced);

    assert_eq!(store.tasks(), once.as_slice());
}

#[test]
fn replace_unknown_id_is_a_signaled_miss() {
    let mut store = TaskStore::new();
    let _ = store.insert(task("a", Priority::P2));
    let before = store.tasks().to_vec();

    let outcome = store.replace(&TaskId::from("zzz"), task("zzz", Priority::P1));

    assert_eq!(outcome, ReplaceOutcome::Missing);
    assert_eq!(store.tasks(), before.as_slice());
}

#[test]
fn replace_refuses_older_updated_at() {
    let mut store = TaskStore::new();
    let _ = store.insert(touched(task("a", Priority::P2), "2025-03-01T00:00:00Z"));

    let older = touched(task("a", Priority::P1), "2025-02-01T00:00:00Z");
    assert_eq!(store.replace(&TaskId::from("a"), older), ReplaceOutcome::Stale);
    assert_eq!(store.tasks()[0].priority, Priority::P2);
}

#[test]
fn remove_unknown_id_is_a_signaled_miss() {
    let mut store = TaskStore::new();
    let _ = store.insert(task("a", Priority::P2));

    assert_eq!(store.remove(&TaskId::from("b")), RemoveOutcome::Missing);
    assert_eq!(store.len(), 1);
    assert_eq!(store.remove(&TaskId::from("a")), RemoveOutcome::Removed);
    assert!(store.is_empty());
}

#[test]
fn hydrate_keeps_server_order_and_drops_duplicate_ids() {
    let mut store = TaskStore::new();
    let _ = store.insert(task("stale", Priority::P1));

    let since = store.revision();
    let count = store.hydrate(
        vec![
            task("x", Priority::P4),
            task("y", Priority::P1),
            task("x", Priority::P2),
        ],
        since,
    );

    assert_eq!(count, 2);
    assert_eq!(ids(store.tasks()), vec!["x", "y"]);
    assert_eq!(store.tasks()[0].priority, Priority::P4);
}

#[test]
fn hydrate_never_moves_updated_at_backwards() {
    let mut store = TaskStore::new();
    let _ = store.insert(task("a", Priority::P3));
    let since = store.revision();

    let edited = touched(task("a", Priority::P1), "2025-01-05T00:00:00Z");
    assert_eq!(store.replace(&TaskId::from("a"), edited.clone()), ReplaceOutcome::Replaced);
    store.hydrate(vec![task("a", Priority::P3), task("b", Priority::P2)], since);

    assert_eq!(ids(store.tasks()), vec!["a", "b"]);
    assert_eq!(store.get(&TaskId::from("a")), Some(&edited));
}

#[test]
fn hydrate_keeps_tasks_created_after_the_listing_was_requested() {
    let mut store = TaskStore::new();
    store.hydrate(vec![task("a", Priority::P2)], 0);
    let since = store.revision();

    let _ = store.insert(task("b", Priority::P1));
    let _ = store.insert(task("c", Priority::P1));
    store.hydrate(vec![task("a", Priority::P2), task("z", Priority::P4)], since);

    assert_eq!(ids(store.tasks()), vec!["c", "b", "a", "z"]);
}

#[test]
fn hydrate_does_not_resurrect_tasks_removed_after_the_request() {
    let mut store = TaskStore::new();
    store.hydrate(vec![task("a", Priority::P2), task("b", Priority::P2)], 0);
    let since = store.revision();

    assert_eq!(store.remove(&TaskId::from("a")), RemoveOutcome::Removed);
    store.hydrate(vec![task("a", Priority::P2), task("b", Priority::P2)], since);

    assert_eq!(ids(store.tasks()), vec!["b"]);
}

#[test]
fn later_listing_drops_tasks_gone_from_the_server() {
    let mut store = TaskStore::new();
    let _ = store.insert(task("a", Priority::P2));
    let _ = store.insert(task("b", Priority::P2));

    let since = store.revision();
    store.hydrate(vec![task("a", Priority::P2)], since);

    assert_eq!(ids(store.tasks()), vec!["a"]);
}
