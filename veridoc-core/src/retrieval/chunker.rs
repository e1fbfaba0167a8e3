//! Sentence-aware text chunking with overlap.
//!
//! Long document text is split at sentence boundaries into bounded
//! chunks. Each new chunk is seeded with the trailing words of the
//! previous one so semantic context survives the cut.

use super::types::{ChunkMetadata, DocumentChunk};

const DEFAULT_CHUNK_SIZE: usize = 1000;
const DEFAULT_OVERLAP: usize = 200;

/// Splits document text into overlapping, bounded-size chunks.
#[derive(Debug, Clone)]
pub struct Chunker {
    chunk_size: usize,
    overlap: usize,
}

impl Default for Chunker {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            overlap: DEFAULT_OVERLAP,
        }
    }
}

impl Chunker {
    pub fn new(chunk_size: usize, overlap: usize) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
            overlap,
        }
    }

    /// Chunks one document's text.
    ///
    /// Sentences accumulate into a running buffer; when the next
    /// sentence would push the buffer past the size threshold, the
    /// buffer is emitted and the next one is seeded with the emitted
    /// chunk's trailing words plus the triggering sentence.
    /// `total_chunks` is back-filled once the count is known.
    pub fn chunk(
        &self,
        document_id: &str,
        document_name: &str,
        text: &str,
        collection_id: &str,
    ) -> Vec<DocumentChunk> {
        // Sentences longer than the threshold (terminator-sparse text)
        // are hard-split at word boundaries first, so every piece fed
        // into the accumulator fits within one chunk.
        let mut pieces: Vec<String> = Vec::new();
        for sentence in split_sentences(text) {
            if sentence.len() > self.chunk_size {
                pieces.extend(split_oversized(sentence, self.chunk_size));
            } else {
                pieces.push(sentence.to_string());
            }
        }

        let mut bodies: Vec<String> = Vec::new();
        let mut current = String::new();

        for sentence in &pieces {
            let joined_len = if current.is_empty() {
                sentence.len()
            } else {
                current.len() + 1 + sentence.len()
            };

            if joined_len > self.chunk_size && !current.is_empty() {
                let tail = tail_by_words(&current, self.overlap);
                bodies.push(std::mem::take(&mut current));
                current = if tail.is_empty() {
                    sentence.to_string()
                } else {
                    format!("{tail} {sentence}")
                };
            } else {
                if !current.is_empty() {
                    current.push(' ');
                }
                current.push_str(sentence);
            }
        }
        if !current.trim().is_empty() {
            bodies.push(current);
        }

        let total = bodies.len();
        bodies
            .into_iter()
            .enumerate()
            .map(|(index, content)| DocumentChunk {
                id: format!("{document_id}_chunk_{index}"),
                collection_id: collection_id.to_string(),
                document_id: document_id.to_string(),
                document_name: document_name.to_string(),
                content,
                embedding: None,
                metadata: ChunkMetadata {
                    chunk_index: index,
                    total_chunks: total,
                    page: None,
                    section: None,
                },
            })
            .collect()
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn overlap(&self) -> usize {
        self.overlap
    }
}

/// Splits text into sentences at `.`, `!`, or `?` followed by
/// whitespace. Whatever remains without a terminator is its own
/// sentence.
fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let bytes = text.as_bytes();

    let mut i = 0;
    while i < bytes.len() {
        let is_terminator = matches!(bytes[i], b'.' | b'!' | b'?');
        let at_boundary = is_terminator
            && (i + 1 == bytes.len() || bytes[i + 1].is_ascii_whitespace());
        if at_boundary {
            let sentence = text[start..=i].trim();
            if !sentence.is_empty() {
                sentences.push(sentence);
            }
            start = i + 1;
        }
        i += 1;
    }

    let rest = text[start..].trim();
    if !rest.is_empty() {
        sentences.push(rest);
    }
    sentences
}

/// Splits an oversized sentence into word-bounded pieces of at most
/// `max_chars`. A single word longer than the limit is cut at character
/// boundaries as a last resort.
fn split_oversized(sentence: &str, max_chars: usize) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut current = String::new();

    for word in sentence.split_whitespace() {
        if word.len() > max_chars {
            if !current.is_empty() {
                pieces.push(std::mem::take(&mut current));
            }
            let mut chars = word.chars().peekable();
            while chars.peek().is_some() {
                pieces.push(chars.by_ref().take(max_chars).collect());
            }
            continue;
        }
        let extra = if current.is_empty() {
            word.len()
        } else {
            word.len() + 1
        };
        if current.len() + extra > max_chars && !current.is_empty() {
            pieces.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        pieces.push(current);
    }
    pieces
}

/// Trailing whole words of `text` totalling at most `max_chars`.
fn tail_by_words(text: &str, max_chars: usize) -> String {
    if max_chars == 0 {
        return String::new();
    }
    let mut taken: Vec<&str> = Vec::new();
    let mut length = 0;
    for word in text.split_whitespace().rev() {
        let extra = if taken.is_empty() {
            word.len()
        } else {
            word.len() + 1
        };
        if length + extra > max_chars {
            break;
        }
        taken.push(word);
        length += extra;
    }
    taken.reverse();
    taken.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn long_text(sentences: usize) -> String {
        (0..sentences)
            .map(|i| format!("Sentence number {i} talks about campaign deliverables and budgets."))
            .collect::<Vec<_>>()
            .join(" ")
    }

    #[test]
    fn short_text_yields_single_chunk() {
        let chunker = Chunker::default();
        let chunks = chunker.chunk("doc1", "order.txt", "One short sentence.", "col1");
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].content, "One short sentence.");
        assert_eq!(chunks[0].metadata.total_chunks, 1);
    }

    #[test]
    fn chunks_stay_within_size_plus_overlap() {
        let chunker = Chunker::new(200, 50);
        let text = long_text(40);
        let chunks = chunker.chunk("doc1", "order.txt", &text, "col1");
        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(
                chunk.content.len() <= 200 + 50 + 1,
                "chunk of {} chars exceeds bound",
                chunk.content.len()
            );
        }
    }

    #[test]
    fn consecutive_chunks_overlap() {
        let chunker = Chunker::new(200, 50);
        let text = long_text(40);
        let chunks = chunker.chunk("doc1", "order.txt", &text, "col1");
        for pair in chunks.windows(2) {
            let tail = tail_by_words(&pair[0].content, 50);
            assert!(
                pair[1].content.starts_with(&tail),
                "next chunk not seeded with previous tail"
            );
        }
    }

    #[test]
    fn every_sentence_lands_in_some_chunk() {
        let chunker = Chunker::new(150, 40);
        let text = long_text(25);
        let chunks = chunker.chunk("doc1", "order.txt", &text, "col1");
        for i in 0..25 {
            let needle = format!("Sentence number {i} ");
            assert!(
                chunks.iter().any(|c| c.content.contains(&needle)),
                "sentence {i} missing from all chunks"
            );
        }
    }

    #[test]
    fn total_chunks_is_backfilled() {
        let chunker = Chunker::new(120, 30);
        let chunks = chunker.chunk("doc1", "order.txt", &long_text(20), "col1");
        let total = chunks.len();
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.metadata.chunk_index, i);
            assert_eq!(chunk.metadata.total_chunks, total);
            assert_eq!(chunk.id, format!("doc1_chunk_{i}"));
        }
    }

    #[test]
    fn tail_respects_word_boundaries() {
        let tail = tail_by_words("alpha beta gamma delta", 11);
        assert_eq!(tail, "gamma delta");
    }

    #[test]
    fn terminator_sparse_text_stays_within_bound() {
        // One 3000-char run of words with no sentence terminator.
        let chunker = Chunker::new(200, 50);
        let text = "deliverable budget ".repeat(158);
        assert!(text.len() >= 3000);

        let chunks = chunker.chunk("doc1", "order.txt", text.trim(), "col1");
        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(
                chunk.content.len() <= 200 + 50 + 1,
                "chunk of {} chars exceeds bound",
                chunk.content.len()
            );
        }
        // Every word survives the hard split.
        let total_words: usize = chunks
            .iter()
            .map(|c| c.content.split_whitespace().count())
            .sum();
        assert!(total_words >= text.split_whitespace().count());
    }

    #[test]
    fn single_word_longer_than_chunk_is_cut() {
        let chunker = Chunker::new(100, 20);
        let text = "x".repeat(350);
        let chunks = chunker.chunk("doc1", "blob.txt", &text, "col1");
        assert!(!chunks.is_empty());
        for chunk in &chunks {
            assert!(chunk.content.len() <= 100 + 20 + 1);
        }
        let recombined: String = chunks
            .iter()
            .flat_map(|c| c.content.split_whitespace())
            .collect();
        assert!(recombined.len() >= 350);
    }
}
