use sha2::{Digest, Sha256};
use std::fmt;
use std::fs;
use std::io::{self, Read};
use std::path::Path;
use tracing::warn;

const CHUNK: usize = 8192;

/// Hex SHA-256 digest of a file's bytes.
///
/// The empty fingerprint is the sentinel for "could not be read".
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Hash everything `r` yields, reading in fixed-size chunks.
    pub fn of_reader<R: Read>(mut r: R) -> io::Result<Self> {
        let mut hasher = Sha256::new();
        let mut buf = [0u8; CHUNK];
        loop {
            let n = match r.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            hasher.update(&buf[..n]);
        }
        Ok(Self(hex::encode(hasher.finalize())))
    }

    /// Fingerprint a file, degrading to the empty sentinel (with a warning)
    /// when it cannot be opened or read.
    pub fn of_file(path: &Path) -> Self {
        match fs::File::open(path).and_then(Self::of_reader) {
            Ok(fp) => fp,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "cannot fingerprint file");
                Self::default()
            }
        }
    }

    pub fn is_unreadable(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A relative path and the fingerprint of the file it names under some root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    pub path: String,
    pub fingerprint: Fingerprint,
}

impl FileRecord {
    pub fn read(root: &Path, rel: &str) -> Self {
        Self {
            path: rel.to_string(),
            fingerprint: Fingerprint::of_file(&root.join(rel)),
        }
    }

    /// Same path, different content.
    pub fn differs_from(&self, other: &FileRecord) -> bool {
        self.path == other.path && self.fingerprint != other.fingerprint
    }
}
