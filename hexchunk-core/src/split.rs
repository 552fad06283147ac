use crate::checksum;
use crate::error::{ChunkError, Result};
use crate::manifest::{ChunkSummary, ManifestRecord};
use crate::naming::{chunk_name, manifest_name};
use crate::path_safety;
use crate::record::ChunkRecord;
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const BYTES_PER_MB: usize = 1024 * 1024;

#[derive(Clone, Debug)]
pub struct SplitConfig {
    /// Payload bytes per chunk; the last chunk holds the remainder.
    pub chunk_size: usize,
    /// Where chunk artifacts and the manifest are written.
    pub output_dir: PathBuf,
}

impl SplitConfig {
    pub fn new(chunk_size: usize, output_dir: impl Into<PathBuf>) -> Self {
        Self { chunk_size, output_dir: output_dir.into() }
    }

    /// Chunk size given in MiB.
    pub fn from_megabytes(mb: usize, output_dir: impl Into<PathBuf>) -> Result<Self> {
        let chunk_size = mb.checked_mul(BYTES_PER_MB).ok_or_else(|| {
            ChunkError::InvalidConfiguration(format!("chunk size of {mb} MB overflows"))
        })?;
        Ok(Self::new(chunk_size, output_dir))
    }
}

#[derive(Clone, Debug)]
pub struct SplitOutput {
    pub manifest: ManifestRecord,
    pub manifest_path: PathBuf,
    /// Chunk artifact paths in chunk-number order.
    pub chunk_paths: Vec<PathBuf>,
}

pub struct Splitter;

impl Splitter {
    pub fn split(source: &Path, cfg: &SplitConfig) -> Result<SplitOutput> {
        if cfg.chunk_size == 0 {
            return Err(ChunkError::InvalidConfiguration("chunk size must be positive".into()));
        }
        let meta = std::fs::metadata(source).map_err(|e| ChunkError::io(source, e))?;
        if !meta.is_file() {
            return Err(ChunkError::InputNotFound { path: source.to_path_buf() });
        }
        let file_size = meta.len();
        if file_size == 0 {
            return Err(ChunkError::InvalidConfiguration(format!(
                "{} is empty; nothing to chunk",
                source.display()
            )));
        }
        let file_name = source
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .ok_or_else(|| ChunkError::unsafe_path(source, "source has no file name"))?;
        path_safety::validate_file_name(&file_name)?;

        let chunk_size = cfg.chunk_size as u64;
        let total_chunks = file_size.div_ceil(chunk_size);
        info!(
            source = %source.display(),
            file_size,
            chunk_size,
            total_chunks,
            "splitting"
        );

        std::fs::create_dir_all(&cfg.output_dir)
            .map_err(|e| ChunkError::io(&cfg.output_dir, e))?;

        // 1) Sequential windows, one chunk resident at a time
        let f = File::open(source).map_err(|e| ChunkError::io(source, e))?;
        let mut reader = BufReader::new(f);
        // Never larger than the biggest window actually read
        let mut buf = vec![0u8; file_size.min(chunk_size) as usize];
        let mut remaining = file_size;
        let mut summaries = Vec::with_capacity(total_chunks as usize);
        let mut chunk_paths = Vec::with_capacity(total_chunks as usize);
        for chunk_number in 1..=total_chunks {
            let want = remaining.min(chunk_size) as usize;
            let n = read_window(&mut reader, &mut buf[..want]).map_err(|e| ChunkError::io(source, e))?;
            if n < want {
                return Err(ChunkError::Io {
                    path: source.to_path_buf(),
                    source: io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        format!("file shrank while reading chunk {chunk_number}"),
                    ),
                });
            }
            remaining -= n as u64;

            let record = ChunkRecord::new(&file_name, chunk_number, total_chunks, &buf[..n]);
            let name = chunk_name(&file_name, chunk_number, total_chunks);
            let path = cfg.output_dir.join(&name);
            record.store(&path)?;
            debug!(chunk_number, len = n, checksum = %record.chunk_checksum, path = %path.display(), "wrote chunk");

            summaries.push(ChunkSummary {
                chunk_file: name,
                chunk_number,
                total_chunks,
                chunk_checksum: record.chunk_checksum,
            });
            chunk_paths.push(path);
        }

        // 2) Whole-file digest from an independent second read
        let f = File::open(source).map_err(|e| ChunkError::io(source, e))?;
        let (file_checksum, digested) =
            checksum::digest_reader(BufReader::new(f)).map_err(|e| ChunkError::io(source, e))?;
        if digested != file_size {
            return Err(ChunkError::Io {
                path: source.to_path_buf(),
                source: io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("size changed during split: {file_size} then {digested} bytes"),
                ),
            });
        }

        // 3) Manifest last
        let manifest = ManifestRecord { file_name: file_name.clone(), file_checksum, chunks: summaries };
        let manifest_path = cfg.output_dir.join(manifest_name(&file_name));
        manifest.store(&manifest_path)?;
        info!(manifest = %manifest_path.display(), checksum = %manifest.file_checksum, "split complete");

        Ok(SplitOutput { manifest, manifest_path, chunk_paths })
    }
}

/// Fill `buf` unless EOF comes first; returns bytes read.
fn read_window<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
