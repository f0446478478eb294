// src/exercise/discovery.rs

//! Locating exercise files under the exercises directory.

use std::path::{Path, PathBuf};

use globset::{Glob, GlobSet, GlobSetBuilder};
use tracing::debug;

use crate::errors::Result;
use crate::fs::FileSystem;

/// Compile the configured exercise pattern (e.g. `**/*.py`).
pub fn exercise_matcher(pattern: &str) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    builder.add(Glob::new(pattern)?);
    Ok(builder.build()?)
}

/// Return every file below `root` whose root-relative path matches
/// `matcher`, sorted by path.
///
/// Paths compare component by component, so all of `01_x/` sorts before
/// `02_y/` regardless of the file names inside.
pub fn discover_exercise_files(
    fs: &dyn FileSystem,
    root: &Path,
    matcher: &GlobSet,
) -> Result<Vec<PathBuf>> {
    let mut found = Vec::new();
    let mut stack = vec![root.to_path_buf()];

    while let Some(dir) = stack.pop() {
        for entry in fs.read_dir(&dir)? {
            if fs.is_dir(&entry) {
                stack.push(entry);
                continue;
            }

            let Ok(rel) = entry.strip_prefix(root) else {
                continue;
            };
            let rel = rel.to_string_lossy().replace('\\', "/");
            if matcher.is_match(&rel) {
                found.push(entry);
            }
        }
    }

    found.sort();
    debug!(count = found.len(), ?root, "discovered exercise files");
    Ok(found)
}
