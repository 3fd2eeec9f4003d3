use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use crate::error::{Result, SubmitError};

/// Read size used when streaming artifacts through the hasher.
pub const CHUNK_SIZE: usize = 4096;

/// Content fingerprint of a single artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDigest {
    /// Lowercase hex-encoded SHA-256 of the file bytes.
    pub hex: String,

    /// Number of bytes fed to the hasher.
    pub size_bytes: u64,
}

impl FileDigest {
    /// Digest in the `sha256:<hex>` form stored on the ledger.
    pub fn prefixed(&self) -> String {
        format!("sha256:{}", self.hex)
    }
}

/// Compute the SHA-256 of a file without loading it into memory.
///
/// The identity depends **only** on the file bytes. Paths that do not
/// resolve to a regular file are rejected before any reading happens.
pub fn hash_file(path: &Path) -> Result<FileDigest> {
    if !path.is_file() {
        return Err(SubmitError::InputFileMissing {
            path: path.to_path_buf(),
        });
    }

    let io_err = |source| SubmitError::Io {
        path: path.to_path_buf(),
        source,
    };

    let mut reader = BufReader::new(File::open(path).map_err(io_err)?);
    let mut hasher = Sha256::new();
    let mut buf = [0u8; CHUNK_SIZE];
    let mut size_bytes = 0u64;

    loop {
        let n = reader.read(&mut buf).map_err(io_err)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
        size_bytes += n as u64;
    }

    Ok(FileDigest {
        hex: hex::encode(hasher.finalize()),
        size_bytes,
    })
}
