use std::collections::{HashSet, VecDeque};
use std::path::{Path, PathBuf};

/// Breadth-first search for a file named `file_name` under `root`.
///
/// Entries are visited in name order, so the shallowest match wins and ties
/// break alphabetically. Directories listed in `prune` are not descended into.
/// Symlinked directories are followed once each (tracked by device/inode),
/// and nothing deeper than `max_depth` below `root` is read, so cyclic trees
/// terminate.
pub fn find_entry_point(
    root: &Path,
    file_name: &str,
    prune: &[PathBuf],
    max_depth: usize,
) -> Option<PathBuf> {
    let mut visited = HashSet::new();
    let mut queue = VecDeque::new();
    queue.push_back((root.to_path_buf(), 0usize));

    while let Some((dir, depth)) = queue.pop_front() {
        if let Some(id) = dir_id(&dir) {
            if !visited.insert(id) {
                continue;
            }
        }

        let mut entries: Vec<PathBuf> = match std::fs::read_dir(&dir) {
            Ok(rd) => rd.filter_map(|e| e.ok()).map(|e| e.path()).collect(),
            Err(e) => {
                tracing::debug!("skipping unreadable {}: {}", dir.display(), e);
                continue;
            }
        };
        entries.sort();

        let mut subdirs = Vec::new();
        for path in entries {
            // Follows symlinks; dangling links are skipped.
            let Ok(meta) = std::fs::metadata(&path) else {
                continue;
            };
            if meta.is_file() && path.file_name().is_some_and(|n| n == file_name) {
                tracing::info!("found {} at {}", file_name, path.display());
                return Some(path);
            }
            if meta.is_dir() && depth < max_depth && !prune.iter().any(|p| p == &path) {
                subdirs.push(path);
            }
        }
        queue.extend(subdirs.into_iter().map(|d| (d, depth + 1)));
    }

    tracing::info!("{} not found under {}", file_name, root.display());
    None
}

/// Importable module name for a Python entry file: its stem.
pub fn module_name(entry_point: &Path) -> Option<String> {
    entry_point
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .filter(|s| !s.is_empty())
}

#[cfg(unix)]
fn dir_id(dir: &Path) -> Option<(u64, u64)> {
    use std::os::unix::fs::MetadataExt;
    std::fs::metadata(dir).ok().map(|m| (m.dev(), m.ino()))
}

#[cfg(not(unix))]
fn dir_id(dir: &Path) -> Option<PathBuf> {
    dir.canonicalize().ok()
}
