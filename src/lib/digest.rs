//! Streaming SHA-256 digests and integrity checks.

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::Path;

use sha2::{Digest, Sha256};

use super::error::Error;

/// Read the source in bounded chunks so an arbitrarily large archive never has to fit
/// in memory at once.
const CHUNK_SIZE: usize = 64 * 1024;

/// Consume `source` to end-of-stream and return the lowercase hex SHA-256 of its contents.
pub fn hex_digest<R: Read>(source: &mut R) -> io::Result<String> {
    let mut hasher = Sha256::new();
    let mut chunk = vec![0u8; CHUNK_SIZE];
    loop {
        let n = source.read(&mut chunk)?;
        if n == 0 {
            break;
        }
        hasher.update(&chunk[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}

/// The digest of the file at `path`.
pub fn hex_digest_of_file<P: AsRef<Path>>(path: P) -> io::Result<String> {
    hex_digest(&mut File::open(path)?)
}

/// Check that the contents of `source` hash to `expected`, then seek back to the start
/// so the next consumer reads from offset zero. `path` is only used to label the error.
pub fn verify<R: Read + Seek>(source: &mut R, path: &Path, expected: &str) -> Result<(), Error> {
    tracing::info!("verifying SHA256 hash of {}", path.display());
    let actual = hex_digest(source)?;
    source.seek(SeekFrom::Start(0))?;
    if actual != expected {
        return Err(Error::HashMismatch {
            path: path.to_path_buf(),
            actual,
            expected: expected.to_owned(),
        });
    }
    Ok(())
}
