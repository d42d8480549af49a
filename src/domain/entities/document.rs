use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: Uuid,
    pub name: String,
    pub content_type: String,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Document {
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            content_type: "text/plain".to_string(),
            metadata: serde_json::json!({}),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_id(mut self, id: Uuid) -> Self {
        self.id = id;
        self
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = content_type.into();
        self
    }

    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = metadata;
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentChunk {
    pub id: Uuid,
    pub document_id: Uuid,
    pub content: String,
    pub chunk_index: usize,
    pub metadata: ChunkMetadata,
}

impl DocumentChunk {
    pub fn new(document_id: Uuid, content: impl Into<String>, chunk_index: usize) -> Self {
        Self {
            id: Uuid::new_v4(),
            document_id,
            content: content.into(),
            chunk_index,
            metadata: ChunkMetadata::default(),
        }
    }

    pub fn with_metadata(mut self, metadata: ChunkMetadata) -> Self {
        self.metadata = metadata;
        self
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChunkMetadata {
    pub source: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub chunk: DocumentChunk,
    pub score: f32,
}

/// Chunk sizing in bytes of UTF-8 text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1500,
            chunk_overlap: 200,
        }
    }
}

/// Splits content into overlapping chunks along paragraph boundaries.
///
/// Paragraphs are joined until adding the next one would exceed `chunk_size`,
/// then a new chunk starts. Paragraphs longer than `chunk_size` are first
/// broken on whitespace (and words longer than that on char boundaries).
/// Each new chunk is seeded with up to `chunk_overlap` bytes from the end of
/// the previous one, aligned to a word start, when that still fits.
/// Chunks are indexed sequentially from 0.
pub fn chunk_content(document_id: Uuid, content: &str, config: ChunkConfig) -> Vec<DocumentChunk> {
    let chunk_size = config.chunk_size.max(1);
    let overlap = config.chunk_overlap.min(chunk_size - 1);

    let pieces: Vec<String> = content
        .split("\n\n")
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .flat_map(|p| split_paragraph(p, chunk_size))
        .collect();

    let mut chunks = Vec::new();
    let mut current_chunk = String::new();

    for piece in pieces {
        let would_exceed =
            !current_chunk.is_empty() && current_chunk.len() + piece.len() + 2 > chunk_size;

        if would_exceed {
            let tail = overlap_tail(&current_chunk, overlap).to_string();
            chunks.push(DocumentChunk::new(document_id, &current_chunk, chunks.len()));
            current_chunk.clear();

            if !tail.is_empty() && tail.len() + piece.len() + 2 <= chunk_size {
                current_chunk.push_str(&tail);
            }
        }

        if !current_chunk.is_empty() {
            current_chunk.push_str("\n\n");
        }
        current_chunk.push_str(&piece);
    }

    if !current_chunk.is_empty() {
        let index = chunks.len();
        chunks.push(DocumentChunk::new(document_id, current_chunk, index));
    }

    chunks
}

fn split_paragraph(paragraph: &str, chunk_size: usize) -> Vec<String> {
    if paragraph.len() <= chunk_size {
        return vec![paragraph.to_string()];
    }

    let mut pieces = Vec::new();
    let mut current = String::new();

    for word in paragraph.split_whitespace() {
        for part in split_word(word, chunk_size) {
            if !current.is_empty() && current.len() + 1 + part.len() > chunk_size {
                pieces.push(std::mem::take(&mut current));
            }
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(part);
        }
    }

    if !current.is_empty() {
        pieces.push(current);
    }

    pieces
}

fn split_word(word: &str, chunk_size: usize) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut rest = word;

    while rest.len() > chunk_size {
        let mut end = chunk_size;
        while !rest.is_char_boundary(end) {
            end -= 1;
        }
        if end == 0 {
            // one char wider than the whole chunk
            end = rest.chars().next().map_or(rest.len(), char::len_utf8);
        }
        parts.push(&rest[..end]);
        rest = &rest[end..];
    }

    if !rest.is_empty() {
        parts.push(rest);
    }

    parts
}

fn overlap_tail(chunk: &str, overlap: usize) -> &str {
    if overlap == 0 {
        return "";
    }
    if chunk.len() <= overlap {
        return chunk;
    }

    let mut start = chunk.len() - overlap;
    while !chunk.is_char_boundary(start) {
        start += 1;
    }

    let mid_word = chunk[..start]
        .chars()
        .next_back()
        .is_some_and(|c| !c.is_whitespace());
    if mid_word {
        match chunk[start..].find(char::is_whitespace) {
            Some(offset) => start += offset,
            None => return "",
        }
    }

    chunk[start..].trim_start()
}
