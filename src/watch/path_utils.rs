// src/watch/path_utils.rs

//! Utility functions for path handling in the watcher.

use std::path::{Path, PathBuf};

/// Make `path` absolute against the current directory without touching the
/// filesystem.
pub fn absolute(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    match std::env::current_dir() {
        Ok(cwd) => cwd.join(path),
        Err(_) => path.to_path_buf(),
    }
}

/// Whether two paths name the same file.
///
/// - First compare the absolute forms directly.
/// - If that fails (e.g. symlinks or `/private/var` vs `/var` on macOS),
///   canonicalize both and compare again.
pub fn same_file(a: &Path, b: &Path) -> bool {
    let (a, b) = (absolute(a), absolute(b));
    if a == b {
        return true;
    }

    // Cheap reject before hitting the filesystem: different file names can
    // never canonicalize to the same file (the watcher does not follow
    // file-level symlinks).
    if a.file_name() != b.file_name() {
        return false;
    }

    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Directory to observe for `exercise`.
pub fn watch_dir(exercise: &Path) -> PathBuf {
    let exercise = absolute(exercise);
    match exercise.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}
