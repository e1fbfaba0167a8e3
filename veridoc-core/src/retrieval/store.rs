//! Document store contract.
//!
//! The persistent store of documents per collection lives outside this
//! crate; the retrieval index consumes it read-only through this trait.

use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// One stored document record.
#[derive(Debug, Clone)]
pub struct StoredDocument {
    pub id: String,
    pub name: String,
    pub content: String,
}

/// Read-only keyed store of documents per collection.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// All documents of one collection.
    async fn list_documents(&self, collection_id: &str) -> Result<Vec<StoredDocument>>;
}

/// In-memory store for tests and embedding hosts.
#[derive(Default)]
pub struct InMemoryDocumentStore {
    collections: RwLock<HashMap<String, Vec<StoredDocument>>>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, collection_id: &str, document: StoredDocument) {
        let mut collections = self.collections.write().await;
        collections
            .entry(collection_id.to_string())
            .or_default()
            .push(document);
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn list_documents(&self, collection_id: &str) -> Result<Vec<StoredDocument>> {
        let collections = self.collections.read().await;
        Ok(collections.get(collection_id).cloned().unwrap_or_default())
    }
}
