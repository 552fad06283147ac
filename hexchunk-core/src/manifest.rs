use crate::error::{ChunkError, Result};
use crate::path_safety;
use crate::record::{load_json, store_json};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Manifest entry for one chunk artifact (no payload).
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ChunkSummary {
    /// Locator of the chunk artifact, relative to the manifest's directory.
    pub chunk_file: String,
    pub chunk_number: u64,
    pub total_chunks: u64,
    pub chunk_checksum: String,
}

/// Whole-file summary written once per split.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ManifestRecord {
    pub file_name: String,
    pub file_checksum: String,
    pub chunks: Vec<ChunkSummary>,
}

impl ManifestRecord {
    pub fn total_chunks(&self) -> u64 {
        self.chunks.len() as u64
    }

    /// Decode and validate a manifest artifact.
    pub fn load(path: &Path) -> Result<Self> {
        let m: ManifestRecord = load_json(path)?;
        m.validate(path)?;
        Ok(m)
    }

    pub fn store(&self, path: &Path) -> Result<()> {
        store_json(path, self)
    }

    /// Check the numbering contract: entries are exactly 1..=n in listed
    /// order and every entry agrees on n. Gaps, duplicates and reordering
    /// are all rejected rather than read as a shorter file.
    pub fn validate(&self, path: &Path) -> Result<()> {
        path_safety::validate_file_name(&self.file_name)
            .map_err(|e| ChunkError::malformed(path, format!("file_name: {e}")))?;
        if self.chunks.is_empty() {
            return Err(ChunkError::malformed(path, "manifest lists no chunks"));
        }
        let n = self.total_chunks();
        for (i, c) in self.chunks.iter().enumerate() {
            let expected = i as u64 + 1;
            if c.chunk_number != expected {
                return Err(ChunkError::malformed(
                    path,
                    format!("entry {} has chunk_number {}, expected {}", i, c.chunk_number, expected),
                ));
            }
            if c.total_chunks != n {
                return Err(ChunkError::malformed(
                    path,
                    format!("chunk {} claims total_chunks {}, manifest lists {}", expected, c.total_chunks, n),
                ));
            }
            if c.chunk_file.is_empty() {
                return Err(ChunkError::malformed(path, format!("chunk {expected} has empty chunk_file")));
            }
        }
        Ok(())
    }
}
