//! BLAKE3 digests rendered as lowercase hex.

use std::io::{self, Read};

/// Hex length of every digest produced here.
pub const DIGEST_HEX_LEN: usize = blake3::OUT_LEN * 2;

/// Digest a byte slice. Defined for the empty slice.
pub fn digest(bytes: &[u8]) -> String {
    blake3::hash(bytes).to_hex().to_string()
}

/// Hex digests compare case-insensitively.
pub fn checksums_match(expected: &str, actual: &str) -> bool {
    expected.eq_ignore_ascii_case(actual)
}

/// Incremental digest; `finalize_hex` equals `digest` of everything fed in.
#[derive(Default, Clone)]
pub struct Digester {
    inner: blake3::Hasher,
    bytes: u64,
}

impl Digester {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, bytes: &[u8]) {
        self.inner.update(bytes);
        self.bytes += bytes.len() as u64;
    }

    /// Number of bytes digested so far.
    pub fn len(&self) -> u64 {
        self.bytes
    }

    pub fn is_empty(&self) -> bool {
        self.bytes == 0
    }

    pub fn finalize_hex(&self) -> String {
        self.inner.finalize().to_hex().to_string()
    }
}

/// Stream a reader to EOF through a `Digester`.
pub fn digest_reader<R: Read>(mut reader: R) -> io::Result<(String, u64)> {
    let mut d = Digester::new();
    let mut buf = vec![0u8; 64 * 1024];
    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        d.update(&buf[..n]);
    }
    Ok((d.finalize_hex(), d.len()))
}
