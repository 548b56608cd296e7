//! Compose file discovery
//!
//! Bounded-depth walk over a set of root directories, collecting every
//! file whose name matches a recognized compose filename. Noise
//! directories and hidden directories are pruned without descending.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tracing::warn;
use walkdir::WalkDir;

/// Recognized compose filenames, matched case-insensitively
pub const COMPOSE_FILENAMES: &[&str] = &[
    "docker-compose.yml",
    "docker-compose.yaml",
    "compose.yml",
    "compose.yaml",
];

/// Directory names never descended into
pub const DEFAULT_EXCLUDES: &[&str] = &[
    "node_modules",
    ".git",
    "vendor",
    "__pycache__",
    ".venv",
    "venv",
];

/// Maximum recursion depth below a root (root itself is depth 0)
pub const DEFAULT_MAX_DEPTH: usize = 5;

/// A discovered compose file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComposeFileRef {
    /// Dense index within one catalog snapshot
    pub id: usize,
    /// Stable identifier, hex sha256 of the absolute path
    pub file_id: String,
    pub name: String,
    pub path: PathBuf,
    pub directory: PathBuf,
    pub size: u64,
    pub modified: DateTime<Utc>,
}

/// Compose file scanner
#[derive(Debug, Clone)]
pub struct Scanner {
    roots: Vec<PathBuf>,
    excludes: Vec<String>,
    max_depth: usize,
}

impl Scanner {
    /// Create a scanner over the given roots with default exclusions
    pub fn new(roots: Vec<PathBuf>) -> Self {
        Self {
            roots,
            excludes: DEFAULT_EXCLUDES.iter().map(|s| s.to_string()).collect(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Override the excluded directory names
    pub fn with_excludes(mut self, excludes: Vec<String>) -> Self {
        self.excludes = excludes;
        self
    }

    /// Override the maximum recursion depth
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Scan all roots in sequence and return the discovered files.
    ///
    /// A root that cannot be read logs a warning and is skipped;
    /// unreadable subtrees and unstattable files are dropped silently.
    /// IDs are a dense 0-based index over the concatenated results.
    pub fn scan(&self) -> Vec<ComposeFileRef> {
        let mut files = Vec::new();

        for root in &self.roots {
            if !root.is_dir() {
                warn!("Cannot scan {}: not a directory", root.display());
                continue;
            }
            self.scan_root(root, &mut files);
        }

        for (id, file) in files.iter_mut().enumerate() {
            file.id = id;
        }

        files
    }

    fn scan_root(&self, root: &Path, files: &mut Vec<ComposeFileRef>) {
        // max_depth counts directory levels below the root; walkdir's
        // depth is the component count relative to it, so a file at
        // level N has walkdir depth N + 1.
        let walker = WalkDir::new(root)
            .max_depth(self.max_depth + 1)
            .into_iter()
            .filter_entry(|entry| {
                if entry.depth() == 0 || !entry.file_type().is_dir() {
                    return true;
                }
                let name = entry.file_name().to_string_lossy();
                !name.starts_with('.') && !self.excludes.iter().any(|ex| ex == &*name)
            });

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                // Unreadable directory: skip the subtree, keep walking
                Err(_) => continue,
            };

            if !entry.file_type().is_file() {
                continue;
            }

            let name = entry.file_name().to_string_lossy().to_lowercase();
            if !COMPOSE_FILENAMES.contains(&name.as_str()) {
                continue;
            }

            let metadata = match entry.metadata() {
                Ok(metadata) => metadata,
                // Stat race: drop this file only
                Err(_) => continue,
            };

            let path = entry.path().to_path_buf();
            let directory = path
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| root.to_path_buf());
            let modified = metadata
                .modified()
                .map(DateTime::<Utc>::from)
                .unwrap_or_else(|_| Utc::now());

            files.push(ComposeFileRef {
                id: 0,
                file_id: file_id(&path),
                name: entry.file_name().to_string_lossy().to_string(),
                path,
                directory,
                size: metadata.len(),
                modified,
            });
        }
    }
}

/// Stable identifier for a file path, valid across rescans
fn file_id(path: &Path) -> String {
    let mut hasher = Sha256::new();
    hasher.update(path.to_string_lossy().as_bytes());
    hex_encode(&hasher.finalize())
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "services: {}\n").unwrap();
    }

    #[test]
    fn test_skips_excluded_and_hidden_directories() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();

        touch(&root.join("a/docker-compose.yml"));
        touch(&root.join("a/node_modules/docker-compose.yml"));
        touch(&root.join(".hidden/docker-compose.yaml"));

        let files = Scanner::new(vec![root.to_path_buf()]).scan();

        assert_eq!(files.len(), 1);
        assert_eq!(files[0].path, root.join("a/docker-compose.yml"));
        assert_eq!(files[0].id, 0);
    }

    #[test]
    fn test_matches_all_recognized_names_case_insensitively() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();

        touch(&root.join("one/docker-compose.yml"));
        touch(&root.join("two/compose.yaml"));
        touch(&root.join("three/Docker-Compose.YML"));
        touch(&root.join("four/README.md"));

        let mut files = Scanner::new(vec![root.to_path_buf()]).scan();
        files.sort_by(|a, b| a.path.cmp(&b.path));

        assert_eq!(files.len(), 3);
    }

    #[test]
    fn test_max_depth_bounds_descent() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();

        touch(&root.join("l1/l2/docker-compose.yml"));
        touch(&root.join("l1/l2/l3/docker-compose.yml"));

        let files = Scanner::new(vec![root.to_path_buf()])
            .with_max_depth(2)
            .scan();

        assert_eq!(files.len(), 1);
        assert_eq!(files[0].path, root.join("l1/l2/docker-compose.yml"));
    }

    #[test]
    fn test_unreadable_root_does_not_abort_other_roots() {
        let temp = TempDir::new().unwrap();
        let good = temp.path().join("good");
        touch(&good.join("docker-compose.yml"));

        let missing = temp.path().join("does-not-exist");
        let files = Scanner::new(vec![missing, good]).scan();

        assert_eq!(files.len(), 1);
    }

    #[test]
    fn test_ids_are_dense_over_all_roots() {
        let temp = TempDir::new().unwrap();
        let root_a = temp.path().join("ra");
        let root_b = temp.path().join("rb");
        touch(&root_a.join("x/docker-compose.yml"));
        touch(&root_b.join("y/compose.yml"));

        let files = Scanner::new(vec![root_a, root_b]).scan();

        let ids: Vec<usize> = files.iter().map(|f| f.id).collect();
        assert_eq!(ids, vec![0, 1]);
    }

    #[test]
    fn test_file_id_is_stable_across_scans() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        touch(&root.join("app/docker-compose.yml"));

        let scanner = Scanner::new(vec![root.to_path_buf()]);
        let first = scanner.scan();
        let second = scanner.scan();

        assert_eq!(first[0].file_id, second[0].file_id);
        assert_eq!(first[0].file_id.len(), 64);
    }
}
