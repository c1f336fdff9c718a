use crate::report::{Diagnostic, Reporter};
use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use std::fmt;
use std::fs::File;
use std::io::{self, BufReader};
use std::path::Path;

/// SHA-256 digest of a file's full contents.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentHash([u8; 32]);

impl ContentHash {
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentHash({})", self.to_hex())
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Hashes `path`, returning `None` when it cannot be read.
pub fn hash_file(path: &Path, reporter: &dyn Reporter) -> Option<ContentHash> {
    match try_hash_file(path) {
        Ok(hash) => Some(hash),
        Err(err) => {
            reporter.report(Diagnostic::HashFailed {
                path: path.to_path_buf(),
                reason: format!("{err:#}"),
            });
            None
        }
    }
}

fn try_hash_file(path: &Path) -> Result<ContentHash> {
    let file = File::open(path)
        .with_context(|| format!("ハッシュ対象を開けませんでした: {}", path.display()))?;
    let mut reader = BufReader::new(file);
    let mut hasher = Sha256::new();
    io::copy(&mut reader, &mut hasher)
        .with_context(|| format!("ハッシュ対象を読めませんでした: {}", path.display()))?;
    Ok(ContentHash(hasher.finalize().into()))
}

/// Unknown digests never compare equal, so an unreadable file is never a duplicate.
pub fn same_content(a: Option<ContentHash>, b: Option<ContentHash>) -> bool {
    matches!((a, b), (Some(a), Some(b)) if a == b)
}
