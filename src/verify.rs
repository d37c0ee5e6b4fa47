//! Checksums for written PDFs

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::warn;
use crate::error::{Error, Result};

/// Block size for streaming file contents into the digest
const HASH_BLOCK_SIZE: usize = 64 * 1024;

/// Lowercase hex MD5 digest of a file's contents, read in 64 KiB blocks
pub fn hash_file(path: &Path) -> Result<String> {
    if !path.is_file() {
        return Err(Error::FileNotFound(path.to_path_buf()));
    }

    let mut reader = BufReader::with_capacity(HASH_BLOCK_SIZE, File::open(path)?);
    let mut context = md5::Context::new();
    let mut block = vec![0u8; HASH_BLOCK_SIZE];

    loop {
        let read = reader.read(&mut block)?;
        if read == 0 {
            break;
        }
        context.consume(&block[..read]);
    }

    Ok(format!("{:x}", context.compute()))
}

/// Compare a file's MD5 digest against an expected hex digest
///
/// Returns `Ok(false)` and logs a warning when the digests differ.
pub fn verify_file(path: &Path, expected: &str) -> Result<bool> {
    let actual = hash_file(path)?;

    if actual.eq_ignore_ascii_case(expected.trim()) {
        Ok(true)
    } else {
        warn!(
            path = %path.display(),
            expected,
            actual = %actual,
            "file does not have the expected hash"
        );
        Ok(false)
    }
}
