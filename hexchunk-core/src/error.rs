use std::path::{Path, PathBuf};

/// Failures surfaced by splitting, reassembly and verification.
#[derive(Debug, thiserror::Error)]
pub enum ChunkError {
    /// Source file, manifest or chunk artifact is missing, unreadable or not a regular file.
    #[error("input not found: {}", path.display())]
    InputNotFound { path: PathBuf },

    /// Rejected before any work starts (zero chunk size, empty source).
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// An artifact could not be decoded into the expected record shape,
    /// or its contents break the numbering contract.
    #[error("malformed artifact {}: {reason}", path.display())]
    MalformedArtifact { path: PathBuf, reason: String },

    /// A chunk's stored checksum disagrees with its payload or its manifest entry.
    #[error("chunk {chunk_number} integrity mismatch: expected {expected}, got {actual}")]
    ChunkIntegrityMismatch { chunk_number: u64, expected: String, actual: String },

    /// The reassembled bytes do not digest to the manifest's file checksum.
    #[error("file integrity mismatch: expected {expected}, got {actual}")]
    WholeFileIntegrityMismatch { expected: String, actual: String },

    /// A locator or file name from an artifact would escape its directory.
    #[error("unsafe path {}: {reason}", path.display())]
    UnsafePath { path: PathBuf, reason: String },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, ChunkError>;

impl ChunkError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        if matches!(source.kind(), std::io::ErrorKind::NotFound | std::io::ErrorKind::PermissionDenied) {
            return ChunkError::InputNotFound { path: path.to_path_buf() };
        }
        ChunkError::Io { path: path.to_path_buf(), source }
    }

    pub(crate) fn malformed(path: &Path, reason: impl Into<String>) -> Self {
        ChunkError::MalformedArtifact { path: path.to_path_buf(), reason: reason.into() }
    }

    pub(crate) fn unsafe_path(path: &Path, reason: impl Into<String>) -> Self {
        ChunkError::UnsafePath { path: path.to_path_buf(), reason: reason.into() }
    }
}
