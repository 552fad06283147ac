use crate::checksum::{self, Digester};
use crate::error::{ChunkError, Result};
use crate::manifest::ManifestRecord;
use crate::naming::reassembled_name;
use crate::path_safety::{self, PathPolicy};
use crate::record::ChunkRecord;
use std::fs::OpenOptions;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

#[derive(Clone, Debug, Default)]
pub struct ReassembleConfig {
    /// Directory for the reassembled file; defaults to the manifest's directory.
    pub output_dir: Option<PathBuf>,
    pub path_policy: PathPolicy,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FaultKind {
    /// The record's `chunk_checksum` does not match its own payload.
    PayloadDigest,
    /// The record's `chunk_checksum` differs from the manifest entry.
    ManifestDisagreement,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChunkFault {
    pub chunk_number: u64,
    pub path: PathBuf,
    pub kind: FaultKind,
    pub expected: String,
    pub actual: String,
}

/// Outcome of one pass over a manifest's chunks.
#[derive(Clone, Debug)]
pub struct IntegrityReport {
    pub file_name: String,
    pub total_chunks: u64,
    pub bytes: u64,
    pub expected_checksum: String,
    pub actual_checksum: String,
    pub chunk_faults: Vec<ChunkFault>,
    pub file_checksum_ok: bool,
    /// No chunk faults and the whole-file digest matched.
    pub verified: bool,
}

impl IntegrityReport {
    /// Turn a failed verification into the matching error; chunk faults
    /// take precedence over the whole-file mismatch.
    pub fn into_result(self) -> Result<Self> {
        if let Some(f) = self.chunk_faults.first() {
            return Err(ChunkError::ChunkIntegrityMismatch {
                chunk_number: f.chunk_number,
                expected: f.expected.clone(),
                actual: f.actual.clone(),
            });
        }
        if !self.file_checksum_ok {
            return Err(ChunkError::WholeFileIntegrityMismatch {
                expected: self.expected_checksum,
                actual: self.actual_checksum,
            });
        }
        Ok(self)
    }
}

#[derive(Clone, Debug)]
pub struct ReassembleReport {
    pub output_path: PathBuf,
    pub integrity: IntegrityReport,
}

impl ReassembleReport {
    pub fn verified(&self) -> bool {
        self.integrity.verified
    }
}

pub struct Reassembler;

impl Reassembler {
    /// Rebuild the file a manifest describes as `reassembled_<file_name>`.
    /// The output is kept even when verification fails.
    pub fn reassemble(manifest_path: &Path, cfg: &ReassembleConfig) -> Result<ReassembleReport> {
        let manifest = ManifestRecord::load(manifest_path)?;
        let out_dir = match &cfg.output_dir {
            Some(d) => d.clone(),
            None => manifest_dir(manifest_path).to_path_buf(),
        };
        std::fs::create_dir_all(&out_dir).map_err(|e| ChunkError::io(&out_dir, e))?;
        let output_path = out_dir.join(reassembled_name(&manifest.file_name));
        let partial_path = out_dir.join(format!("{}.partial", reassembled_name(&manifest.file_name)));

        // create_new: an existing file under the temporary name is left alone
        let f = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&partial_path)
            .map_err(|e| ChunkError::io(&partial_path, e))?;
        let mut w = BufWriter::new(f);
        let streamed = stream_chunks(manifest_path, &manifest, &mut w, &partial_path, cfg.path_policy)
            .and_then(|report| {
                w.flush().map_err(|e| ChunkError::io(&partial_path, e))?;
                Ok(report)
            });
        drop(w);
        let integrity = match streamed {
            Ok(r) => r,
            Err(e) => {
                let _ = std::fs::remove_file(&partial_path);
                return Err(e);
            }
        };
        std::fs::rename(&partial_path, &output_path).map_err(|e| ChunkError::io(&output_path, e))?;

        if integrity.verified {
            info!(output = %output_path.display(), bytes = integrity.bytes, "reassembly verified");
        } else {
            warn!(
                output = %output_path.display(),
                chunk_faults = integrity.chunk_faults.len(),
                file_checksum_ok = integrity.file_checksum_ok,
                "reassembly failed verification"
            );
        }
        Ok(ReassembleReport { output_path, integrity })
    }

    /// Stream the reassembled bytes into any writer.
    pub fn reassemble_into<W: Write>(
        manifest_path: &Path,
        out: &mut W,
        policy: PathPolicy,
    ) -> Result<IntegrityReport> {
        let manifest = ManifestRecord::load(manifest_path)?;
        stream_chunks(manifest_path, &manifest, out, Path::new("<output>"), policy)
    }

    /// Reassemble into memory.
    pub fn reassemble_to_vec(manifest_path: &Path, policy: PathPolicy) -> Result<(Vec<u8>, IntegrityReport)> {
        let mut buf = Vec::new();
        let report = Self::reassemble_into(manifest_path, &mut buf, policy)?;
        Ok((buf, report))
    }
}

pub(crate) fn manifest_dir(manifest_path: &Path) -> &Path {
    match manifest_path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    }
}

/// Walk the manifest in listed (= chunk-number) order, writing each payload
/// and digesting the concatenation. One chunk is resident at a time.
pub(crate) fn stream_chunks<W: Write>(
    manifest_path: &Path,
    manifest: &ManifestRecord,
    out: &mut W,
    out_label: &Path,
    policy: PathPolicy,
) -> Result<IntegrityReport> {
    let base = manifest_dir(manifest_path);
    let total = manifest.total_chunks();
    let mut digester = Digester::new();
    let mut faults = Vec::new();

    for summary in &manifest.chunks {
        let path = path_safety::validate_locator(base, &summary.chunk_file, policy)?;
        let record = ChunkRecord::load(&path)?;
        if record.file_name != manifest.file_name
            || record.chunk_number != summary.chunk_number
            || record.total_chunks != total
        {
            return Err(ChunkError::malformed(
                &path,
                format!(
                    "record is {} chunk {}/{}, manifest expects {} chunk {}/{}",
                    record.file_name,
                    record.chunk_number,
                    record.total_chunks,
                    manifest.file_name,
                    summary.chunk_number,
                    total
                ),
            ));
        }
        let payload = record.payload(&path)?;
        let actual = checksum::digest(&payload);
        if !checksum::checksums_match(&record.chunk_checksum, &actual) {
            warn!(chunk = summary.chunk_number, path = %path.display(), "chunk payload does not match its checksum");
            faults.push(ChunkFault {
                chunk_number: summary.chunk_number,
                path: path.clone(),
                kind: FaultKind::PayloadDigest,
                expected: record.chunk_checksum.clone(),
                actual,
            });
        }
        if !checksum::checksums_match(&summary.chunk_checksum, &record.chunk_checksum) {
            warn!(chunk = summary.chunk_number, path = %path.display(), "chunk checksum disagrees with manifest");
            faults.push(ChunkFault {
                chunk_number: summary.chunk_number,
                path: path.clone(),
                kind: FaultKind::ManifestDisagreement,
                expected: summary.chunk_checksum.clone(),
                actual: record.chunk_checksum.clone(),
            });
        }

        out.write_all(&payload).map_err(|e| ChunkError::io(out_label, e))?;
        digester.update(&payload);
        debug!(chunk = summary.chunk_number, len = payload.len(), "appended chunk");
    }

    let actual_checksum = digester.finalize_hex();
    let file_checksum_ok = checksum::checksums_match(&manifest.file_checksum, &actual_checksum);
    Ok(IntegrityReport {
        file_name: manifest.file_name.clone(),
        total_chunks: total,
        bytes: digester.len(),
        expected_checksum: manifest.file_checksum.clone(),
        actual_checksum,
        verified: faults.is_empty() && file_checksum_ok,
        chunk_faults: faults,
        file_checksum_ok,
    })
}
