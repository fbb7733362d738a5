//! Chunk payload stored alongside each embedding
//!
//! The index keeps metadata as a flat JSON object of scalars so that any
//! field can be matched with a single `json_extract` comparison. Tag lists
//! are joined on the way in and split again on the way out.

use crate::catalog::{join_tags, split_tags, DocumentMetadata};
use crate::chunk::Chunk;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkPayload {
    pub source: String,
    pub source_type: String,
    pub podcast_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub episode_number: Option<u32>,
    pub subject: String,
    pub company: String,
    pub industry: String,
    /// Delimiter-joined; use [`ChunkPayload::themes`] for the list
    pub themes: String,
    /// Delimiter-joined; use [`ChunkPayload::key_concepts`] for the list
    pub key_concepts: String,
    pub time_period: String,
    pub stage: String,
    pub chunk_index: usize,
    pub total_chunks: usize,
    pub start_index: usize,
    pub chunk_hash: String,
}

impl ChunkPayload {
    pub fn themes(&self) -> Vec<String> {
        split_tags(&self.themes)
    }

    pub fn key_concepts(&self) -> Vec<String> {
        split_tags(&self.key_concepts)
    }

    /// Rebuild the document metadata this payload was flattened from
    pub fn metadata(&self) -> DocumentMetadata {
        DocumentMetadata {
            source_type: self.source_type.clone(),
            podcast_name: self.podcast_name.clone(),
            episode_number: self.episode_number,
            subject: self.subject.clone(),
            company: self.company.clone(),
            industry: self.industry.clone(),
            themes: self.themes(),
            key_concepts: self.key_concepts(),
            time_period: self.time_period.clone(),
            stage: self.stage.clone(),
        }
    }
}

impl From<&Chunk> for ChunkPayload {
    fn from(chunk: &Chunk) -> Self {
        let meta = &chunk.metadata;
        Self {
            source: chunk.source.clone(),
            source_type: meta.source_type.clone(),
            podcast_name: meta.podcast_name.clone(),
            episode_number: meta.episode_number,
            subject: meta.subject.clone(),
            company: meta.company.clone(),
            industry: meta.industry.clone(),
            themes: join_tags(&meta.themes),
            key_concepts: join_tags(&meta.key_concepts),
            time_period: meta.time_period.clone(),
            stage: meta.stage.clone(),
            chunk_index: chunk.chunk_index,
            total_chunks: chunk.total_chunks,
            start_index: chunk.start_index,
            chunk_hash: chunk.hash.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use serde_json::Value;

    fn chunk() -> Chunk {
        let metadata = Catalog::builtin().unwrap().get("dyson.md").unwrap().clone();
        Chunk {
            text: "5,127 prototypes.".to_string(),
            source: "dyson.md".to_string(),
            metadata,
            chunk_index: 3,
            total_chunks: 9,
            start_index: 420,
            hash: "abc".to_string(),
        }
    }

    #[test]
    fn test_payload_is_flat_scalars() {
        let payload = ChunkPayload::from(&chunk());
        let value = serde_json::to_value(&payload).unwrap();
        let object = value.as_object().unwrap();

        assert!(object
            .values()
            .all(|v| !matches!(v, Value::Array(_) | Value::Object(_))));
        assert_eq!(object["episode_number"], Value::from(400));
        assert_eq!(
            object["themes"],
            Value::from("perseverance, product_obsession, iterative_design, total_control, differentiation, founder_led_sales")
        );
    }

    #[test]
    fn test_metadata_restored_from_payload() {
        let chunk = chunk();
        let payload = ChunkPayload::from(&chunk);
        let json = serde_json::to_string(&payload).unwrap();
        let back: ChunkPayload = serde_json::from_str(&json).unwrap();

        assert_eq!(back.metadata(), chunk.metadata);
        assert_eq!(back.themes()[1], "product_obsession");
        assert_eq!(back.chunk_index, 3);
    }
}
