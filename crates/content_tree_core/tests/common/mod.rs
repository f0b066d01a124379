#![allow(dead_code)]

use async_trait::async_trait;
use content_tree_core::{
    ContentTreeService, Document, DocumentStore, MemoryDocumentStore, NewNode, StoreError,
    StoreResult,
};
use std::sync::{Arc, Mutex};

pub fn segments(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}

pub fn category_path(id: &str) -> Vec<String> {
    segments(&["categories", id])
}

pub fn topic_path(category: &str, id: &str) -> Vec<String> {
    segments(&["categories", category, "children", id])
}

pub fn content_path(category: &str, topic: &str, id: &str) -> Vec<String> {
    segments(&["categories", category, "children", topic, "children", id])
}

/// Store operations a `FlakyStore` can be told to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Get,
    Set,
    Update,
    Delete,
    ListOrdered,
    ListUnordered,
}

/// Memory store that fails chosen operations on chosen paths.
#[derive(Default)]
pub struct FlakyStore {
    inner: MemoryDocumentStore,
    rules: Mutex<Vec<(Op, Vec<String>)>>,
}

impl FlakyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fails `op` on exactly `path`.
    pub fn fail(&self, op: Op, path: Vec<String>) {
        self.rules.lock().unwrap().push((op, path));
    }

    pub fn heal(&self) {
        self.rules.lock().unwrap().clear();
    }

    pub fn inner(&self) -> &MemoryDocumentStore {
        &self.inner
    }

    fn check(&self, op: Op, path: &[String]) -> StoreResult<()> {
        let rules = self.rules.lock().unwrap();
        if rules
            .iter()
            .any(|(rule_op, rule_path)| *rule_op == op && rule_path.as_slice() == path)
        {
            return Err(StoreError::Unavailable(format!(
                "injected {op:?} failure at {}",
                path.join("/")
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for FlakyStore {
    async fn get(&self, path: &[String]) -> StoreResult<Option<Document>> {
        self.check(Op::Get, path)?;
        self.inner.get(path).await
    }

    async fn set(&self, path: &[String], data: Document) -> StoreResult<()> {
        self.check(Op::Set, path)?;
        self.inner.set(path, data).await
    }

    async fn update(&self, path: &[String], patch: Document) -> StoreResult<()> {
        self.check(Op::Update, path)?;
        self.inner.update(path, patch).await
    }

    async fn delete(&self, path: &[String]) -> StoreResult<()> {
        self.check(Op::Delete, path)?;
        self.inner.delete(path).await
    }

    async fn list(
        &self,
        collection: &[String],
        order_by: Option<&str>,
    ) -> StoreResult<Vec<(String, Document)>> {
        let op = if order_by.is_some() {
            Op::ListOrdered
        } else {
            Op::ListUnordered
        };
        self.check(op, collection)?;
        self.inner.list(collection, order_by).await
    }
}

pub fn memory_service() -> ContentTreeService<MemoryDocumentStore> {
    ContentTreeService::new(MemoryDocumentStore::new())
}

pub fn flaky_service() -> ContentTreeService<Arc<FlakyStore>> {
    ContentTreeService::new(Arc::new(FlakyStore::new()))
}

/// Ids of one seeded category -> topic -> content chain.
pub struct Chain {
    pub category: String,
    pub topic: String,
    pub content: String,
}

/// Creates `category > topic > content` through the service.
pub async fn seed_chain<S: DocumentStore>(
    service: &ContentTreeService<S>,
    category: &str,
    topic: &str,
    content: &str,
) -> Chain {
    let category_id = service
        .create_root_category(NewNode::titled(category))
        .await
        .unwrap();
    let topic_id = service
        .create_child(
            &category_id,
            NewNode::titled(topic),
            &category_path(&category_id),
        )
        .await
        .unwrap();
    let content_id = service
        .create_child(
            &topic_id,
            NewNode::titled(content).with_content(format!("Body of {content}")),
            &topic_path(&category_id, &topic_id),
        )
        .await
        .unwrap();
    Chain {
        category: category_id,
        topic: topic_id,
        content: content_id,
    }
}
