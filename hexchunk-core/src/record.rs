use crate::checksum;
use crate::error::{ChunkError, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

/// One chunk of the source file, payload hex-encoded.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ChunkRecord {
    pub file_name: String,
    pub chunk_number: u64,
    pub total_chunks: u64,
    pub chunk_checksum: String,
    pub chunk_data: String,
}

impl ChunkRecord {
    /// Build a record for `payload`, digesting it on the way.
    pub fn new(file_name: &str, chunk_number: u64, total_chunks: u64, payload: &[u8]) -> Self {
        ChunkRecord {
            file_name: file_name.to_string(),
            chunk_number,
            total_chunks,
            chunk_checksum: checksum::digest(payload),
            chunk_data: hex::encode(payload),
        }
    }

    /// Decode the hex payload. `path` names the artifact in the error.
    pub fn payload(&self, path: &Path) -> Result<Vec<u8>> {
        hex::decode(&self.chunk_data)
            .map_err(|e| ChunkError::malformed(path, format!("chunk_data is not valid hex: {e}")))
    }

    pub fn load(path: &Path) -> Result<Self> {
        load_json(path)
    }

    pub fn store(&self, path: &Path) -> Result<()> {
        store_json(path, self)
    }
}

/// Decode a JSON artifact; shape errors become `MalformedArtifact`.
pub(crate) fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let f = File::open(path).map_err(|e| ChunkError::io(path, e))?;
    serde_json::from_reader(BufReader::new(f)).map_err(|e| {
        if e.is_io() {
            ChunkError::Io { path: path.to_path_buf(), source: e.into() }
        } else {
            ChunkError::malformed(path, e.to_string())
        }
    })
}

pub(crate) fn store_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let f = File::create(path).map_err(|e| ChunkError::io(path, e))?;
    let mut w = BufWriter::new(f);
    serde_json::to_writer_pretty(&mut w, value)
        .map_err(|e| ChunkError::Io { path: path.to_path_buf(), source: e.into() })?;
    w.flush().map_err(|e| ChunkError::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_record_carries_digest_and_hex() {
        let r = ChunkRecord::new("a.bin", 1, 2, &[0x00, 0xab, 0xff]);
        assert_eq!(r.chunk_data, "00abff");
        assert_eq!(r.chunk_checksum, checksum::digest(&[0x00, 0xab, 0xff]));
        assert_eq!(r.payload(Path::new("a")).unwrap(), vec![0x00, 0xab, 0xff]);
    }

    #[test]
    fn bad_hex_is_malformed() {
        let mut r = ChunkRecord::new("a.bin", 1, 1, b"xyz");
        r.chunk_data.push('z');
        let err = r.payload(Path::new("a.bin_01_01.json")).unwrap_err();
        assert!(matches!(err, ChunkError::MalformedArtifact { .. }), "{err}");
    }

    #[test]
    fn missing_field_rejected_at_decode() {
        let td = tempfile::tempdir().unwrap();
        let p = td.path().join("c.json");
        std::fs::write(&p, r#"{"file_name":"a","chunk_number":1,"total_chunks":1,"chunk_data":""}"#)
            .unwrap();
        let err = ChunkRecord::load(&p).unwrap_err();
        match err {
            ChunkError::MalformedArtifact { path, reason } => {
                assert_eq!(path, p);
                assert!(reason.contains("chunk_checksum"), "{reason}");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn unknown_field_rejected_at_decode() {
        let td = tempfile::tempdir().unwrap();
        let p = td.path().join("c.json");
        let mut v = serde_json::to_value(ChunkRecord::new("a", 1, 1, b"q")).unwrap();
        v["extra"] = serde_json::json!(true);
        std::fs::write(&p, v.to_string()).unwrap();
        assert!(matches!(ChunkRecord::load(&p), Err(ChunkError::MalformedArtifact { .. })));
    }

    #[test]
    fn missing_file_is_input_not_found() {
        let td = tempfile::tempdir().unwrap();
        let p = td.path().join("nope.json");
        assert!(matches!(ChunkRecord::load(&p), Err(ChunkError::InputNotFound { .. })));
    }
}
