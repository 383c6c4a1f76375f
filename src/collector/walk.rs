//! Lexicographic, symlink-loop-safe file enumeration: a fixed
//! heavy-directory skip list plus a `visited: HashSet<canonical dir>` loop
//! guard, filtered by the Collector's `excludes` glob list.

use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use globset::{Glob, GlobSet, GlobSetBuilder};

use crate::spec::Spec;

const SKIPPED_DIRS: &[&str] = &["node_modules", ".git", "target", ".venv", "venv", "__pycache__", "dist", "build"];

pub fn build_exclude_set(patterns: &[String]) -> GlobSet {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        if let Ok(glob) = Glob::new(pattern) {
            builder.add(glob);
        }
    }
    builder.build().unwrap_or_else(|_| GlobSetBuilder::new().build().unwrap())
}

/// Walk `root`, returning every file `spec` wants collected, sorted
/// lexicographically (case-insensitive) within each directory.
pub fn gather_files(root: &Path, spec: &dyn Spec, excludes: &GlobSet) -> io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let mut visited = HashSet::new();
    walk_dir(root, spec, excludes, &mut visited, &mut files)?;
    files.sort();
    Ok(files)
}

fn walk_dir(dir: &Path, spec: &dyn Spec, excludes: &GlobSet, visited: &mut HashSet<PathBuf>, files: &mut Vec<PathBuf>) -> io::Result<()> {
    let dir_canon = dir.canonicalize()?;
    if !visited.insert(dir_canon.clone()) {
        return Ok(());
    }

    let mut entries: Vec<_> = fs::read_dir(&dir_canon)?
        .filter_map(Result::ok)
        .filter(|entry| {
            let name = entry.file_name();
            let name_str = name.to_string_lossy();
            !SKIPPED_DIRS.contains(&name_str.as_ref())
        })
        .collect();

    entries.sort_by(|a, b| a.file_name().to_string_lossy().to_lowercase().cmp(&b.file_name().to_string_lossy().to_lowercase()));

    for entry in entries {
        let path = entry.path();
        if excludes.is_match(&path) {
            continue;
        }
        let file_type = match entry.file_type() {
            Ok(ft) => ft,
            Err(_) => continue,
        };

        if file_type.is_dir() {
            walk_dir(&path, spec, excludes, visited, files)?;
        } else if file_type.is_symlink() {
            if let Ok(target) = fs::canonicalize(&path) {
                if target.is_file() && !spec.should_skip(&path) {
                    files.push(path);
                }
            }
        } else if !spec.should_skip(&path) {
            files.push(path);
        }
    }
    Ok(())
}
