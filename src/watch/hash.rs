// src/watch/hash.rs

//! Content digests used to tell real edits from metadata-only events.

use std::collections::HashMap;
use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use blake3::Hasher;
use tracing::debug;

use crate::fs::FileSystem;

/// Compute the blake3 digest of a single file, as lowercase hex.
pub fn compute_file_hash(fs: &dyn FileSystem, path: &Path) -> Result<String> {
    let mut hasher = Hasher::new();
    let mut file = fs
        .open_read(path)
        .with_context(|| format!("opening file for hashing: {:?}", path))?;
    let mut buf = [0u8; 8192];
    loop {
        let n = file
            .read(&mut buf)
            .with_context(|| format!("reading file for hashing: {:?}", path))?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hasher.finalize().to_hex().to_string())
}

/// Last seen digest per path.
///
/// Lives as long as the watcher that owns it, across restarts, so returning
/// to an exercise does not count its unchanged contents as an edit.
#[derive(Debug, Default)]
pub struct DigestCache {
    digests: HashMap<PathBuf, String>,
}

impl DigestCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `digest` for `path`. Returns `true` if it differs from the
    /// previous one (or there was none).
    pub fn observe(&mut self, path: &Path, digest: String) -> bool {
        match self.digests.get(path) {
            Some(old) if *old == digest => false,
            _ => {
                debug!(?path, %digest, "content digest changed");
                self.digests.insert(path.to_path_buf(), digest);
                true
            }
        }
    }

    /// Hash `path` now and remember the digest without treating it as a change.
    pub fn seed(&mut self, fs: &dyn FileSystem, path: &Path) -> Result<()> {
        let digest = compute_file_hash(fs, path)?;
        self.digests.insert(path.to_path_buf(), digest);
        Ok(())
    }

    pub fn forget(&mut self, path: &Path) {
        self.digests.remove(path);
    }
}
