use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;
use tracing::error;

const CHUNK_SIZE: usize = 8 * 1024;

/// Stream the file through SHA-256 in 8 KiB chunks; returns lowercase hex.
pub fn hash_file(path: &Path) -> io::Result<String> {
    let file = File::open(path)?;
    let mut reader = BufReader::with_capacity(CHUNK_SIZE, file);
    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; CHUNK_SIZE];

    loop {
        let bytes_read = match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}

/// Like [`hash_file`], but any I/O failure is logged and yields an empty
/// string, which keeps the file out of exact-duplicate matching.
pub fn content_digest(path: &Path) -> String {
    match hash_file(path) {
        Ok(digest) => digest,
        Err(e) => {
            error!("SHA-256 failed for {}: {}", path.display(), e);
            String::new()
        }
    }
}
