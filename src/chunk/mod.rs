//! Text chunking with recursive separator preference
//!
//! This module handles splitting transcripts into overlapping chunks while:
//! - Preferring the highest-priority separator inside each window
//! - Keeping every chunk an exact substring of its document
//! - Numbering chunks across the whole ingestion run

mod boundaries;

pub use boundaries::*;

use crate::catalog::DocumentMetadata;
use crate::config::ChunkConfig;
use crate::loader::Document;
use blake3::Hasher;
use tracing::{debug, warn};

/// How far a chunk start may move back to avoid beginning mid-word
const WORD_SNAP_LOOKBACK: usize = 32;

/// A span of a document, in char indices
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextSpan {
    pub char_start: usize,
    pub char_end: usize,
}

impl TextSpan {
    pub fn len(&self) -> usize {
        self.char_end - self.char_start
    }

    pub fn is_empty(&self) -> bool {
        self.char_end == self.char_start
    }
}

/// A chunk of a transcript, ready to embed
#[derive(Debug, Clone)]
pub struct Chunk {
    /// Exact substring of the source document
    pub text: String,

    /// Source file name
    pub source: String,

    /// Metadata inherited from the document
    pub metadata: DocumentMetadata,

    /// Position in the full chunk set of this run (0-based)
    pub chunk_index: usize,

    /// Size of the full chunk set of this run
    pub total_chunks: usize,

    /// Char offset of the chunk in its source document
    pub start_index: usize,

    /// Blake3 hash of source, offset and text
    pub hash: String,
}

impl Chunk {
    /// Compute the hash for a chunk
    pub fn compute_hash(source: &str, start_index: usize, text: &str) -> String {
        let mut hasher = Hasher::new();
        hasher.update(source.as_bytes());
        hasher.update(&(start_index as u64).to_le_bytes());
        hasher.update(text.as_bytes());
        hasher.finalize().to_hex().to_string()
    }

    /// Length in chars
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// Split text into overlapping spans
pub fn split_text(text: &str, config: &ChunkConfig) -> Vec<TextSpan> {
    let chars: Vec<char> = text.chars().collect();
    let total = chars.len();
    if total == 0 {
        return Vec::new();
    }

    let max = config.max_chars.max(1);
    let overlap = config.overlap_chars.min(max - 1);
    let boundaries = Boundary::parse_all(&config.separators);
    let lookback = WORD_SNAP_LOOKBACK.min(max - overlap - 1);

    let mut spans = Vec::new();
    let mut start = 0;
    let mut prev_end = 0;

    loop {
        if total - start <= max {
            spans.push(TextSpan {
                char_start: start,
                char_end: total,
            });
            break;
        }

        let window_end = start + max;
        // the next chunk must reach past both the overlap and the previous chunk
        let min_end = (start + overlap).max(prev_end) + 1;

        let end = match find_split(&chars, &boundaries, start, window_end, min_end) {
            Some(end) => end,
            None => {
                let end = next_split(&chars, &boundaries, window_end).unwrap_or(total);
                warn!(
                    "Chunk at char {} has no split point within {} chars; keeping {} chars together",
                    start,
                    max,
                    end - start
                );
                end
            }
        };

        spans.push(TextSpan {
            char_start: start,
            char_end: end,
        });

        if end >= total {
            break;
        }

        prev_end = end;
        start = word_start_before(&chars, end - overlap, start, lookback);
    }

    spans
}

fn find_split(
    chars: &[char],
    boundaries: &[Boundary],
    start: usize,
    window_end: usize,
    min_end: usize,
) -> Option<usize> {
    boundaries.iter().find_map(|boundary| match boundary {
        Boundary::Separator(needle) => last_split(chars, needle, start, window_end, min_end),
        Boundary::Character => Some(window_end),
    })
}

/// Split one document into chunk texts with their char offsets
pub fn split_document(doc: &Document, config: &ChunkConfig) -> Vec<(usize, String)> {
    let spans = split_text(&doc.content, config);

    // char index -> byte offset, with one entry past the end
    let offsets: Vec<usize> = doc
        .content
        .char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(doc.content.len()))
        .collect();

    spans
        .iter()
        .map(|span| {
            let text = &doc.content[offsets[span.char_start]..offsets[span.char_end]];
            (span.char_start, text.to_string())
        })
        .collect()
}

/// Split every document and number the chunks across the whole set
pub fn split_documents(documents: &[Document], config: &ChunkConfig) -> Vec<Chunk> {
    let mut chunks = Vec::new();

    for doc in documents {
        let pieces = split_document(doc, config);
        debug!("{}: {} chunks", doc.source, pieces.len());

        for (start_index, text) in pieces {
            let hash = Chunk::compute_hash(&doc.source, start_index, &text);
            chunks.push(Chunk {
                text,
                source: doc.source.clone(),
                metadata: doc.metadata.clone(),
                chunk_index: 0,
                total_chunks: 0,
                start_index,
                hash,
            });
        }
    }

    // indices are global, so they can only be assigned once every document is split
    let total = chunks.len();
    for (i, chunk) in chunks.iter_mut().enumerate() {
        chunk.chunk_index = i;
        chunk.total_chunks = total;
    }

    chunks
}
