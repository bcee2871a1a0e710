//! Property tests for task store ordering and filtering.
//!
//! Each case writes a generated task list to a fresh temp file, runs one
//! operation through the public `TaskStore` API, and checks the result
//! against a plain in-memory model of the same operation.

use chrono::{TimeZone, Utc};
use proptest::prelude::*;
use task_core::{Status, Task, TaskStore, TaskUpdate};
use tempfile::TempDir;

fn arb_status() -> impl Strategy<Value = Status> {
    prop_oneof![
        Just(Status::Todo),
        Just(Status::InProgress),
        Just(Status::Done),
    ]
}

/// Lists of up to 12 tasks with distinct ids `t0..tN`.
fn arb_tasks() -> impl Strategy<Value = Vec<Task>> {
    prop::collection::vec((arb_status(), "[a-z ]{0,12}"), 0..12).prop_map(|rows| {
        rows.into_iter()
            .enumerate()
            .map(|(n, (status, description))| {
                let ts = Utc
                    .timestamp_millis_opt(1_708_012_200_000 + n as i64)
                    .unwrap();
                let mut task = Task::new(format!("t{n}"), description, ts);
                task.status = status;
                task
            })
            .collect()
    })
}

fn seeded(tasks: &[Task]) -> (TempDir, TaskStore) {
    let dir = TempDir::new().expect("tempdir");
    let store = TaskStore::new(dir.path().join("tasks.json"));
    store.save(tasks).expect("seed save");
    (dir, store)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn delete_preserves_relative_order(tasks in arb_tasks(), pick in any::<prop::sample::Index>()) {
        prop_assume!(!tasks.is_empty());
        let victim = tasks[pick.index(tasks.len())].id.clone();
        let (_dir, store) = seeded(&tasks);

        store.delete(&victim).expect("delete");

        let expected: Vec<Task> = tasks.iter().filter(|t| t.id != victim).cloned().collect();
        prop_assert_eq!(store.load().expect("load"), expected);
    }

    #[test]
    fn status_filter_is_the_exact_ordered_subset(tasks in arb_tasks(), status in arb_status()) {
        let (_dir, store) = seeded(&tasks);

        let listed = store.list(Some(status.as_str())).expect("list");

        let expected: Vec<Task> = tasks.iter().filter(|t| t.status == status).cloned().collect();
        prop_assert_eq!(listed, expected);
    }

    #[test]
    fn unknown_id_is_a_no_op(tasks in arb_tasks(), status in arb_status()) {
        let (_dir, store) = seeded(&tasks);

        prop_assert!(store.update("missing", TaskUpdate::Status(status)).expect("update").is_none());
        prop_assert!(store.delete("missing").expect("delete").is_none());

        prop_assert_eq!(store.load().expect("load"), tasks);
    }

    #[test]
    fn add_appends_after_existing_tasks(tasks in arb_tasks(), description in "[a-z ]{0,20}") {
        let (_dir, store) = seeded(&tasks);

        let added = store.add(&description).expect("add");

        let loaded = store.load().expect("load");
        prop_assert_eq!(&loaded[..tasks.len()], &tasks[..]);
        prop_assert_eq!(loaded.last(), Some(&added));
        prop_assert_eq!(added.status, Status::Todo);
        prop_assert_eq!(added.created_at, added.updated_at);
    }
}
