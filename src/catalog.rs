//! In-memory catalog of discovered compose files
//!
//! Holds the most recent scan result as an immutable snapshot behind an
//! atomic swap. Readers clone the snapshot handle and are never exposed
//! to a partially-updated list; each replacement bumps a monotonic
//! version counter.

use crate::compose::ComposeFileRef;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

/// One immutable scan result
#[derive(Debug, Serialize)]
pub struct Snapshot {
    /// Discovered files, ids dense within this snapshot
    pub files: Vec<ComposeFileRef>,
    pub scanned_at: DateTime<Utc>,
    /// Monotonic over the life of the process
    pub version: u64,
}

/// Default staleness bound for cached scan results
pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

/// Process-wide catalog state
#[derive(Debug, Default)]
pub struct Catalog {
    snapshot: RwLock<Option<Arc<Snapshot>>>,
    next_version: AtomicU64,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the catalog wholesale with a fresh scan result
    pub fn replace(&self, files: Vec<ComposeFileRef>) -> Arc<Snapshot> {
        let snapshot = Arc::new(Snapshot {
            files,
            scanned_at: Utc::now(),
            version: self.next_version.fetch_add(1, Ordering::SeqCst),
        });

        // Lock poisoning only happens if a writer panicked; recover the
        // inner state either way since the snapshot itself is immutable.
        match self.snapshot.write() {
            Ok(mut guard) => *guard = Some(snapshot.clone()),
            Err(poisoned) => *poisoned.into_inner() = Some(snapshot.clone()),
        }

        snapshot
    }

    /// Current snapshot, if any scan has completed
    pub fn current(&self) -> Option<Arc<Snapshot>> {
        match self.snapshot.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Current snapshot only if it is both non-empty and younger than `ttl`
    pub fn fresh_within(&self, ttl: Duration) -> Option<Arc<Snapshot>> {
        let snapshot = self.current()?;
        if snapshot.files.is_empty() {
            return None;
        }
        let age = Utc::now().signed_duration_since(snapshot.scanned_at);
        if age.to_std().map(|age| age < ttl).unwrap_or(false) {
            Some(snapshot)
        } else {
            None
        }
    }

    /// Look up a file by its positional id in the current snapshot
    pub fn get(&self, id: usize) -> Option<ComposeFileRef> {
        self.current()?.files.get(id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn file_ref(id: usize, path: &str) -> ComposeFileRef {
        ComposeFileRef {
            id,
            file_id: format!("{:064}", id),
            name: "docker-compose.yml".to_string(),
            path: PathBuf::from(path),
            directory: PathBuf::from(path).parent().unwrap().to_path_buf(),
            size: 0,
            modified: Utc::now(),
        }
    }

    #[test]
    fn test_starts_empty() {
        let catalog = Catalog::new();
        assert!(catalog.current().is_none());
        assert!(catalog.get(0).is_none());
    }

    #[test]
    fn test_replace_is_wholesale_and_versioned() {
        let catalog = Catalog::new();

        let first = catalog.replace(vec![
            file_ref(0, "/srv/a/docker-compose.yml"),
            file_ref(1, "/srv/b/docker-compose.yml"),
        ]);
        let second = catalog.replace(vec![file_ref(0, "/srv/c/docker-compose.yml")]);

        assert!(second.version > first.version);
        assert_eq!(catalog.current().unwrap().files.len(), 1);
        // The old snapshot handle still reads consistently
        assert_eq!(first.files.len(), 2);
    }

    #[test]
    fn test_fresh_within_respects_ttl_and_emptiness() {
        let catalog = Catalog::new();
        assert!(catalog.fresh_within(DEFAULT_TTL).is_none());

        catalog.replace(Vec::new());
        assert!(catalog.fresh_within(DEFAULT_TTL).is_none());

        catalog.replace(vec![file_ref(0, "/srv/a/docker-compose.yml")]);
        assert!(catalog.fresh_within(DEFAULT_TTL).is_some());
        assert!(catalog.fresh_within(Duration::ZERO).is_none());
    }

    #[test]
    fn test_get_by_positional_id() {
        let catalog = Catalog::new();
        catalog.replace(vec![
            file_ref(0, "/srv/a/docker-compose.yml"),
            file_ref(1, "/srv/b/docker-compose.yml"),
        ]);

        assert_eq!(catalog.get(1).unwrap().path, PathBuf::from("/srv/b/docker-compose.yml"));
        assert!(catalog.get(2).is_none());
    }
}
