//! Deterministic artifact names derived from the source file name.

/// Extension of every JSON artifact.
pub const ARTIFACT_EXT: &str = "json";

/// Prefix of the reassembled output file.
pub const REASSEMBLED_PREFIX: &str = "reassembled_";

/// Width chunk numbers are zero-padded to: the digit count of `total_chunks`,
/// never narrower than 2.
pub fn number_width(total_chunks: u64) -> usize {
    let mut digits = 1;
    let mut n = total_chunks / 10;
    while n > 0 {
        digits += 1;
        n /= 10;
    }
    digits.max(2)
}

/// `<file>_<n>_<total>.json`, e.g. `report.pdf_01_03.json`.
pub fn chunk_name(file_name: &str, chunk_number: u64, total_chunks: u64) -> String {
    let w = number_width(total_chunks);
    format!("{file_name}_{chunk_number:0w$}_{total_chunks:0w$}.{ARTIFACT_EXT}")
}

/// `<file>_metadata.json`
pub fn manifest_name(file_name: &str) -> String {
    format!("{file_name}_metadata.{ARTIFACT_EXT}")
}

/// `reassembled_<file>`
pub fn reassembled_name(file_name: &str) -> String {
    format!("{REASSEMBLED_PREFIX}{file_name}")
}
