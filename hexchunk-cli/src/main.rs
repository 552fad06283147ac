use anyhow::{bail, Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use hexchunk_core::path_safety::PathPolicy;
use hexchunk_core::reassemble::{IntegrityReport, ReassembleConfig, Reassembler};
use hexchunk_core::split::{SplitConfig, Splitter};

#[derive(Parser)]
#[command(
    name = "hexchunk",
    version,
    about = "Split files into checksummed JSON chunks and reassemble them",
    after_help = "Examples:\n  hexchunk chunk somefile.pdf 3\n  hexchunk reassemble somefile.pdf_metadata.json"
)]
struct Cli {
    /// More log output on stderr (-v debug, -vv trace); RUST_LOG overrides
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Split a file into JSON chunk records plus a metadata manifest
    Chunk {
        input: PathBuf,
        /// Chunk size in megabytes (MiB)
        #[arg(value_parser = clap::value_parser!(u64).range(1..=4096))]
        chunk_size_mb: u64,
        #[arg(long, default_value = ".")]
        output_dir: PathBuf,
    },
    /// Rebuild the original file from a manifest and verify its checksum
    Reassemble {
        manifest: PathBuf,
        /// Defaults to the manifest's directory
        #[arg(long)]
        output_dir: Option<PathBuf>,
        #[arg(long, default_value_t = false)]
        follow_symlinks: bool,
    },
    /// Check every chunk and the file checksum without writing output
    Verify {
        manifest: PathBuf,
        #[arg(long, default_value_t = false)]
        follow_symlinks: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose)?;
    match cli.cmd {
        Cmd::Chunk { input, chunk_size_mb, output_dir } => chunk(&input, chunk_size_mb, &output_dir),
        Cmd::Reassemble { manifest, output_dir, follow_symlinks } => {
            reassemble(&manifest, output_dir, PathPolicy { follow_symlinks })
        }
        Cmd::Verify { manifest, follow_symlinks } => verify(&manifest, PathPolicy { follow_symlinks }),
    }
}

fn init_tracing(verbose: u8) -> Result<()> {
    let default = match verbose {
        0 => "warn",
        1 => "hexchunk_core=debug,hexchunk=debug",
        _ => "trace",
    };
    let filter = match EnvFilter::try_from_default_env() {
        Ok(f) => f,
        Err(_) => EnvFilter::try_new(default)?,
    };
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
    Ok(())
}

fn chunk(input: &Path, chunk_size_mb: u64, output_dir: &Path) -> Result<()> {
    if !input.is_file() {
        bail!("file {} does not exist", input.display());
    }
    let mb = usize::try_from(chunk_size_mb).context("chunk size does not fit this platform")?;
    let cfg = SplitConfig::from_megabytes(mb, output_dir)?;
    debug!(?cfg, "split config");
    eprintln!(
        "Chunking file: {} into {} MB ({}-byte) chunks...",
        input.display(),
        chunk_size_mb,
        cfg.chunk_size
    );
    let out = Splitter::split(input, &cfg).with_context(|| format!("chunk {}", input.display()))?;
    println!(
        "Chunking complete. {} chunk(s). Metadata file: {}",
        out.manifest.total_chunks(),
        out.manifest_path.display()
    );
    Ok(())
}

fn reassemble(manifest: &Path, output_dir: Option<PathBuf>, policy: PathPolicy) -> Result<()> {
    if !manifest.is_file() {
        bail!("metadata file {} does not exist", manifest.display());
    }
    eprintln!("Reassembling file using metadata: {}...", manifest.display());
    let cfg = ReassembleConfig { output_dir, path_policy: policy };
    debug!(?cfg, "reassemble config");
    let report = Reassembler::reassemble(manifest, &cfg)
        .with_context(|| format!("reassemble {}", manifest.display()))?;
    print_faults(&report.integrity);
    if report.verified() {
        println!("Reassembly complete. Checksum verified. Output: {}", report.output_path.display());
        Ok(())
    } else {
        println!("Reassembly failed. Checksum mismatch. Output kept at {}", report.output_path.display());
        report.integrity.into_result()?;
        Ok(())
    }
}

fn verify(manifest: &Path, policy: PathPolicy) -> Result<()> {
    if !manifest.is_file() {
        bail!("metadata file {} does not exist", manifest.display());
    }
    let report = hexchunk_core::verify::verify(manifest, policy)
        .with_context(|| format!("verify {}", manifest.display()))?;
    print_faults(&report);
    eprintln!(
        "Chunks ok={}, bad={}; file checksum={}",
        report.total_chunks as usize - bad_chunk_count(&report),
        bad_chunk_count(&report),
        if report.file_checksum_ok { "OK" } else { "MISMATCH" }
    );
    if report.verified {
        println!("OK");
        Ok(())
    } else {
        println!("BAD");
        report.into_result()?;
        Ok(())
    }
}

fn bad_chunk_count(report: &IntegrityReport) -> usize {
    let mut nums: Vec<u64> = report.chunk_faults.iter().map(|f| f.chunk_number).collect();
    nums.dedup();
    nums.len()
}

fn print_faults(report: &IntegrityReport) {
    for f in &report.chunk_faults {
        eprintln!(
            "  chunk {} ({}): {:?} expected {} got {}",
            f.chunk_number,
            f.path.display(),
            f.kind,
            f.expected,
            f.actual
        );
    }
}
