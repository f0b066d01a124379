mod common;

use common::{category_path, segments};
use content_tree_core::{generate_unique_id, DocumentStore, MemoryDocumentStore};
use serde_json::json;

fn title_document(title: &str) -> content_tree_core::Document {
    match json!({ "title": title, "order": 0 }) {
        serde_json::Value::Object(map) => map,
        _ => unreachable!(),
    }
}

#[tokio::test]
async fn sequential_ids_for_same_title_follow_suffix_pattern() {
    let store = MemoryDocumentStore::new();
    let siblings = segments(&["categories"]);

    let mut ids = Vec::new();
    for _ in 0..4 {
        let id = generate_unique_id(&store, "Linear Equations", &siblings, 100)
            .await
            .unwrap();
        store
            .set(&category_path(&id), title_document("Linear Equations"))
            .await
            .unwrap();
        ids.push(id);
    }

    assert_eq!(
        ids,
        vec![
            "linear-equations",
            "linear-equations-1",
            "linear-equations-2",
            "linear-equations-3"
        ]
    );
}

#[tokio::test]
async fn generated_id_skips_every_existing_sibling() {
    let store = MemoryDocumentStore::new();
    for id in ["math", "math-1", "math-3"] {
        store
            .set(&category_path(id), title_document("Math"))
            .await
            .unwrap();
    }

    let id = generate_unique_id(&store, "Math", &segments(&["categories"]), 100)
        .await
        .unwrap();
    assert_eq!(id, "math-2");
}

#[tokio::test]
async fn siblings_in_other_collections_do_not_collide() {
    let store = MemoryDocumentStore::new();
    store
        .set(
            &segments(&["categories", "math", "children", "intro"]),
            title_document("Intro"),
        )
        .await
        .unwrap();

    let id = generate_unique_id(
        &store,
        "Intro",
        &segments(&["categories", "physics", "children"]),
        100,
    )
    .await
    .unwrap();
    assert_eq!(id, "intro");
}

#[tokio::test]
async fn exhausted_attempts_fall_back_to_timestamp_suffix() {
    let store = MemoryDocumentStore::new();
    for id in ["algebra", "algebra-1", "algebra-2"] {
        store
            .set(&category_path(id), title_document("Algebra"))
            .await
            .unwrap();
    }

    let id = generate_unique_id(&store, "Algebra", &segments(&["categories"]), 2)
        .await
        .unwrap();
    let suffix = id.strip_prefix("algebra-").unwrap();
    let millis: i64 = suffix.parse().unwrap();
    assert!(millis > 1_600_000_000_000);
    assert!(store.get(&category_path(&id)).await.unwrap().is_none());
}

#[tokio::test]
async fn title_without_safe_characters_uses_placeholder_base() {
    let store = MemoryDocumentStore::new();
    let id = generate_unique_id(&store, "???", &segments(&["categories"]), 100)
        .await
        .unwrap();
    assert_eq!(id, "untitled");
}
