//! Semantic retrieval over document collections.
//!
//! The index lazily loads a collection from the document store, chunks
//! every document, and caches the chunk lists in memory per collection.
//! Chunk embeddings are generated on the first query that needs them,
//! fanned out through the concurrency controller so bulk embedding
//! never trips the external service's rate limits.

mod chunker;
mod embedder;
mod store;
mod types;

pub use chunker::Chunker;
pub use embedder::{cosine_similarity, Embedder, EmbedderError};
pub use store::{DocumentStore, InMemoryDocumentStore, StoredDocument};
pub use types::{ChunkMetadata, DocumentChunk, SearchResult};

use crate::config::Config;
use crate::limits::{BatchProcessor, SlidingWindowLimiter};
use crate::provider::Provider;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error("Embedder error: {0}")]
    Embedder(#[from] EmbedderError),

    #[error("document store error: {0}")]
    Store(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, RetrievalError>;

/// Per-collection chunk cache answering top-K semantic queries.
///
/// The cache is owned by the index instance (injected dependencies, no
/// process-wide state) and grows until explicitly invalidated: there is
/// no TTL or eviction policy, so hosts with churning collections should
/// call [`invalidate`](Self::invalidate) on document updates.
pub struct RetrievalIndex {
    store: Arc<dyn DocumentStore>,
    embedder: Embedder,
    chunker: Chunker,
    batch: BatchProcessor,
    cache: RwLock<HashMap<String, Vec<DocumentChunk>>>,
    default_top_k: usize,
}

impl RetrievalIndex {
    pub fn new(store: Arc<dyn DocumentStore>, embedder: Embedder, chunker: Chunker) -> Self {
        Self {
            store,
            embedder,
            chunker,
            batch: BatchProcessor::new(4),
            cache: RwLock::new(HashMap::new()),
            default_top_k: 5,
        }
    }

    /// Builds an index parameterized by the loaded configuration:
    /// embedding model, chunking geometry, concurrency limits, and top-K
    /// all come from their config sections.
    pub fn from_config(
        store: Arc<dyn DocumentStore>,
        provider: Arc<dyn Provider>,
        config: &Config,
    ) -> Self {
        let embedder = Embedder::new(provider, config.embedding.model.clone());
        let chunker = Chunker::new(config.chunking.chunk_size, config.chunking.chunk_overlap);
        Self::new(store, embedder, chunker)
            .with_limits(
                config.limits.max_concurrent,
                Some(Arc::new(config.limits.rate_limiter())),
            )
            .with_top_k(config.retrieval.top_k)
    }

    /// Bounds parallel embedding pressure against the external service.
    pub fn with_limits(
        mut self,
        max_concurrent: usize,
        limiter: Option<Arc<SlidingWindowLimiter>>,
    ) -> Self {
        let mut batch = BatchProcessor::new(max_concurrent);
        if let Some(limiter) = limiter {
            batch = batch.with_rate_limiter(limiter);
        }
        self.batch = batch;
        self
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.default_top_k = top_k.max(1);
        self
    }

    /// Returns the `top_k` most similar chunks of a collection, sorted
    /// by descending similarity.
    pub async fn search(
        &self,
        query: &str,
        collection_id: &str,
        top_k: Option<usize>,
    ) -> Result<Vec<SearchResult>> {
        let top_k = top_k.unwrap_or(self.default_top_k);
        self.ensure_loaded(collection_id).await?;

        let mut chunks = {
            let cache = self.cache.read().await;
            cache.get(collection_id).cloned().unwrap_or_default()
        };
        if chunks.is_empty() {
            debug!(collection_id, "collection has no chunks");
            return Ok(Vec::new());
        }

        self.fill_missing_embeddings(collection_id, &mut chunks)
            .await?;

        let query_embedding = self.embedder.embed(query).await?;
        debug!(
            collection_id,
            dimension = query_embedding.len(),
            "query embedding generated"
        );

        let mut results = Vec::with_capacity(chunks.len());
        for chunk in chunks {
            let Some(embedding) = chunk.embedding.as_deref() else {
                continue;
            };
            let similarity = cosine_similarity(&query_embedding, embedding)?;
            results.push(SearchResult { chunk, similarity });
        }

        results.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
        results.truncate(top_k);
        info!(collection_id, results = results.len(), "semantic search done");
        Ok(results)
    }

    /// Joins the top results into one source-attributed context block
    /// for downstream prompting. Empty when nothing matches.
    pub async fn context_block(
        &self,
        query: &str,
        collection_id: &str,
        top_k: Option<usize>,
    ) -> Result<String> {
        let results = self.search(query, collection_id, top_k).await?;
        if results.is_empty() {
            return Ok(String::new());
        }

        let mut context = String::from("Relevant context from the document collection:\n");
        for (i, result) in results.iter().enumerate() {
            context.push_str(&format!(
                "\n[{}] ({}) {}\n",
                i + 1,
                result.chunk.document_name,
                result.chunk.content
            ));
        }
        Ok(context)
    }

    /// Drops the cached chunks of one collection.
    pub async fn invalidate(&self, collection_id: &str) {
        let mut cache = self.cache.write().await;
        cache.remove(collection_id);
    }

    /// Drops every cached collection.
    pub async fn clear(&self) {
        let mut cache = self.cache.write().await;
        cache.clear();
    }

    /// Number of cached chunks for a collection.
    pub async fn chunk_count(&self, collection_id: &str) -> usize {
        let cache = self.cache.read().await;
        cache.get(collection_id).map_or(0, Vec::len)
    }

    async fn ensure_loaded(&self, collection_id: &str) -> Result<()> {
        {
            let cache = self.cache.read().await;
            if cache.contains_key(collection_id) {
                return Ok(());
            }
        }

        let documents = self.store.list_documents(collection_id).await?;
        let mut chunks = Vec::new();
        for document in &documents {
            chunks.extend(self.chunker.chunk(
                &document.id,
                &document.name,
                &document.content,
                collection_id,
            ));
        }
        info!(
            collection_id,
            documents = documents.len(),
            chunks = chunks.len(),
            "collection loaded into retrieval cache"
        );

        let mut cache = self.cache.write().await;
        // Another task may have loaded the collection meanwhile; keep
        // the first load.
        cache.entry(collection_id.to_string()).or_insert(chunks);
        Ok(())
    }

    /// Generates and caches embeddings for chunks that lack one.
    async fn fill_missing_embeddings(
        &self,
        collection_id: &str,
        chunks: &mut [DocumentChunk],
    ) -> Result<()> {
        let missing: Vec<(usize, String)> = chunks
            .iter()
            .enumerate()
            .filter(|(_, chunk)| chunk.embedding.is_none())
            .map(|(i, chunk)| (i, chunk.content.clone()))
            .collect();
        if missing.is_empty() {
            return Ok(());
        }
        debug!(collection_id, missing = missing.len(), "embedding chunks lazily");

        let embedder = &self.embedder;
        let embedded: Vec<(usize, Vec<f32>)> = self
            .batch
            .process_all(
                missing,
                |(index, content)| async move {
                    let vector = embedder.embed(&content).await?;
                    Ok::<_, EmbedderError>((index, vector))
                },
                |done, total| debug!(done, total, "chunk embedding progress"),
            )
            .await?;

        let mut cache = self.cache.write().await;
        let mut cached = cache.get_mut(collection_id);
        for (index, vector) in embedded {
            if let Some(cached_chunks) = cached.as_deref_mut() {
                if let Some(chunk) = cached_chunks.get_mut(index) {
                    // A concurrent query may have attached this embedding
                    // already; the first write wins.
                    if chunk.embedding.is_none() {
                        chunk.embedding = Some(vector.clone());
                    }
                }
            }
            chunks[index].embedding = Some(vector);
        }
        Ok(())
    }
}
