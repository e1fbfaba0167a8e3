//! Core types for the semantic-retrieval subsystem.

use serde::{Deserialize, Serialize};

/// A bounded, overlapping segment of a document's text.
///
/// Chunks are the unit of retrieval: each carries its source document
/// coordinates and, once a semantic query needs it, a lazily attached
/// embedding vector. All embeddings within one collection share the
/// same dimensionality.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentChunk {
    pub id: String,
    pub collection_id: String,
    pub document_id: String,
    pub document_name: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
    pub metadata: ChunkMetadata,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChunkMetadata {
    pub chunk_index: usize,
    pub total_chunks: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
}

/// A chunk matched by a semantic query, with its cosine similarity to
/// the query embedding.
///
/// Similarity ranges from -1.0 (opposite) through 0.0 (orthogonal) to
/// 1.0 (identical); text embeddings mostly land between 0.0 and 1.0.
/// Produced per query and never persisted.
#[derive(Debug, Clone)]
pub struct SearchResult {
    pub chunk: DocumentChunk,
    pub similarity: f32,
}
