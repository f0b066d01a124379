mod common;

use common::{
    category_path, flaky_service, memory_service, seed_chain, segments, topic_path, Op,
};
use content_tree_core::{
    ContentTreeError, DocumentStore, NewNode, NodeKind, NodeLevel, NodeRef, StoreError,
};
use serde_json::json;

#[tokio::test]
async fn empty_store_yields_empty_forest() {
    let service = memory_service();
    let tree = service.get_content_tree().await.unwrap();
    assert!(tree.is_empty());
}

#[tokio::test]
async fn three_level_chain_is_assembled() {
    let service = memory_service();
    let chain = seed_chain(&service, "Math", "Algebra", "Linear Equations").await;

    let tree = service.get_content_tree().await.unwrap();
    assert_eq!(tree.len(), 1);

    let math = &tree[0];
    assert_eq!(math.id(), "math");
    assert_eq!(math.kind, NodeKind::Category);
    assert!(math.content().is_none());

    let topics = math.children.as_ref().unwrap();
    assert_eq!(topics.len(), 1);
    let algebra = &topics[0];
    assert_eq!(algebra.id(), chain.topic);
    assert_eq!(algebra.kind, NodeKind::Topic);
    assert!(algebra.content().is_none());

    let leaves = algebra.children.as_ref().unwrap();
    assert_eq!(leaves.len(), 1);
    let leaf = &leaves[0];
    assert_eq!(leaf.id(), "linear-equations");
    assert_eq!(leaf.content(), Some("Body of Linear Equations"));
    assert!(leaf.children.is_none());
    assert_eq!(
        leaf.path(&service.config().layout),
        common::content_path("math", "algebra", "linear-equations")
    );
    assert_eq!(
        NodeLevel::from_path_len(leaf.path(&service.config().layout).len()),
        Some(NodeLevel::Content)
    );
}

#[tokio::test]
async fn siblings_are_sorted_by_order_field() {
    let service = memory_service();
    service
        .create_root_category(NewNode::titled("Zoology").with_order(0))
        .await
        .unwrap();
    service
        .create_root_category(NewNode::titled("Art").with_order(2))
        .await
        .unwrap();
    service
        .create_root_category(NewNode::titled("Math").with_order(1))
        .await
        .unwrap();
    for (title, order) in [("Late", 5), ("Early", 1)] {
        service
            .create_child("math", NewNode::titled(title).with_order(order), &category_path("math"))
            .await
            .unwrap();
    }

    let tree = service.get_content_tree().await.unwrap();
    let ids: Vec<&str> = tree.iter().map(|node| node.id()).collect();
    assert_eq!(ids, vec!["zoology", "math", "art"]);

    let topic_ids: Vec<&str> = tree[1]
        .children
        .as_ref()
        .unwrap()
        .iter()
        .map(|node| node.id())
        .collect();
    assert_eq!(topic_ids, vec!["early", "late"]);
}

#[tokio::test]
async fn failed_child_read_degrades_to_childless_node() {
    let service = flaky_service();
    seed_chain(&service, "Math", "Algebra", "Linear Equations").await;
    seed_chain(&service, "Physics", "Optics", "Lenses").await;

    let mut broken = category_path("math");
    broken.push("children".to_string());
    service.store().fail(Op::ListOrdered, broken.clone());
    service.store().fail(Op::ListUnordered, broken);

    let report = service.load_tree_with_report().await.unwrap();
    assert_eq!(report.roots.len(), 2);
    let math = report.roots.iter().find(|node| node.id() == "math").unwrap();
    assert!(math.children.is_none());
    let physics = report
        .roots
        .iter()
        .find(|node| node.id() == "physics")
        .unwrap();
    assert_eq!(physics.children.as_ref().unwrap().len(), 1);

    assert_eq!(report.degraded.len(), 1);
    assert_eq!(report.degraded[0].path, category_path("math"));
    assert!(matches!(report.degraded[0].error, StoreError::Unavailable(_)));
}

#[tokio::test]
async fn failed_topic_read_keeps_sibling_topics() {
    let service = flaky_service();
    let chain = seed_chain(&service, "Math", "Algebra", "Linear Equations").await;
    service
        .create_child(
            &chain.category,
            NewNode::titled("Geometry"),
            &category_path(&chain.category),
        )
        .await
        .unwrap();

    let mut broken = topic_path("math", "algebra");
    broken.push("children".to_string());
    service.store().fail(Op::ListOrdered, broken.clone());
    service.store().fail(Op::ListUnordered, broken);

    let tree = service.get_content_tree().await.unwrap();
    let topics = tree[0].children.as_ref().unwrap();
    assert_eq!(topics.len(), 2);
    let algebra = topics.iter().find(|node| node.id() == "algebra").unwrap();
    assert!(algebra.children.is_none());
    let geometry = topics.iter().find(|node| node.id() == "geometry").unwrap();
    assert_eq!(geometry.children.as_deref(), Some(&[][..]));
}

#[tokio::test]
async fn failed_ordered_query_falls_back_to_unordered_listing() {
    let service = flaky_service();
    seed_chain(&service, "Math", "Algebra", "Linear Equations").await;
    service
        .store()
        .fail(Op::ListOrdered, segments(&["categories"]));

    let report = service.load_tree_with_report().await.unwrap();
    assert_eq!(report.roots.len(), 1);
    assert!(report.degraded.is_empty());
    assert_eq!(report.roots[0].children.as_ref().unwrap().len(), 1);
}

#[tokio::test]
async fn root_listing_failure_is_an_error() {
    let service = flaky_service();
    seed_chain(&service, "Math", "Algebra", "Linear Equations").await;
    service
        .store()
        .fail(Op::ListOrdered, segments(&["categories"]));
    service
        .store()
        .fail(Op::ListUnordered, segments(&["categories"]));

    let err = service.get_content_tree().await.unwrap_err();
    assert!(matches!(err, ContentTreeError::Store(StoreError::Unavailable(_))));
}

#[tokio::test]
async fn legacy_documents_without_path_are_located_by_position() {
    let service = memory_service();
    let legacy = json!({ "title": "Legacy", "order": 0 });
    let legacy_topic = json!({ "title": "Old topic", "content": "" });
    let legacy_leaf = json!({ "title": "Old leaf", "content": "kept body" });
    for (path, value) in [
        (category_path("legacy"), legacy),
        (topic_path("legacy", "old-topic"), legacy_topic),
        (common::content_path("legacy", "old-topic", "old-leaf"), legacy_leaf),
    ] {
        let serde_json::Value::Object(document) = value else {
            unreachable!()
        };
        service.store().set(&path, document).await.unwrap();
    }

    let tree = service.get_content_tree().await.unwrap();
    let topic = &tree[0].children.as_ref().unwrap()[0];
    assert_eq!(topic.node_ref, NodeRef::topic("legacy", "old-topic"));
    assert_eq!(topic.kind, NodeKind::Topic);
    let leaf = &topic.children.as_ref().unwrap()[0];
    assert_eq!(leaf.node_ref, NodeRef::content("legacy", "old-topic", "old-leaf"));
    assert_eq!(leaf.content(), Some("kept body"));
}

#[tokio::test]
async fn malformed_documents_are_skipped_one_at_a_time() {
    let service = memory_service();
    seed_chain(&service, "Math", "Algebra", "Linear Equations").await;
    for (path, value) in [
        (category_path("legacy"), json!({ "title": "Legacy", "order": 1.5 })),
        (category_path("broken"), json!({ "title": ["not", "a", "title"] })),
        (topic_path("math", "untitled"), json!({ "title": null })),
        (topic_path("math", "garbled"), json!({ "title": 42, "order": 3 })),
    ] {
        let serde_json::Value::Object(document) = value else {
            unreachable!()
        };
        service.store().set(&path, document).await.unwrap();
    }

    let report = service.load_tree_with_report().await.unwrap();
    let root_ids: Vec<&str> = report.roots.iter().map(|node| node.id()).collect();
    assert_eq!(root_ids, vec!["math", "legacy"]);
    assert_eq!(report.roots[1].order, 1.5);

    let topics = report.roots[0].children.as_ref().unwrap();
    let topic_ids: Vec<&str> = topics.iter().map(|node| node.id()).collect();
    assert_eq!(topic_ids, vec!["algebra", "untitled"]);
    assert_eq!(topics[1].title, "");
    assert_eq!(topics[0].children.as_ref().unwrap().len(), 1);

    let mut skipped: Vec<Vec<String>> = report
        .degraded
        .iter()
        .map(|partial| partial.path.clone())
        .collect();
    skipped.sort();
    assert_eq!(skipped, vec![category_path("broken"), topic_path("math", "garbled")]);
    assert!(report
        .degraded
        .iter()
        .all(|partial| matches!(partial.error, StoreError::Serialization(_))));
}
