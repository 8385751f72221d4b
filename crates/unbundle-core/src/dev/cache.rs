//! Component descriptor hand-off cache.
//!
//! A component is requested twice: once for its script module, then again
//! (by the browser following the injected import) for its template module.
//! The script request parses the file and parks the descriptor here; the
//! template request takes it back out instead of parsing again.
//!
//! Entries are one-shot and stamped with the file's full-precision mtime and
//! size; an edit between the two requests invalidates the entry. Entries
//! expire after a TTL so abandoned ones do not accumulate.

use crate::sfc::SfcDescriptor;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{Duration, Instant, SystemTime};

/// How long a parked descriptor stays claimable.
pub const DEFAULT_TTL: Duration = Duration::from_secs(30);

/// File stamp for cache invalidation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FileStamp {
    /// Modification time at the platform's full precision.
    pub mtime: Option<SystemTime>,
    /// File size in bytes.
    pub size: u64,
}

impl FileStamp {
    /// Stamp a file by reading its metadata. `None` if it cannot be read.
    pub async fn read(path: &Path) -> Option<Self> {
        let meta = tokio::fs::metadata(path).await.ok()?;
        Some(Self {
            mtime: meta.modified().ok(),
            size: meta.len(),
        })
    }
}

#[derive(Debug)]
struct Entry {
    descriptor: SfcDescriptor,
    stamp: FileStamp,
    stored_at: Instant,
}

/// One-shot descriptor cache keyed by component file path.
#[derive(Debug)]
pub struct DescriptorCache {
    entries: Mutex<HashMap<PathBuf, Entry>>,
    ttl: Duration,
}

impl Default for DescriptorCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

impl DescriptorCache {
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    /// Park a descriptor parsed from the file state described by `stamp`.
    ///
    /// Replaces any earlier entry for the same path and drops expired ones.
    pub fn store(&self, path: PathBuf, stamp: FileStamp, descriptor: SfcDescriptor) {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        let ttl = self.ttl;
        entries.retain(|_, entry| entry.stored_at.elapsed() < ttl);
        entries.insert(
            path,
            Entry {
                descriptor,
                stamp,
                stored_at: Instant::now(),
            },
        );
    }

    /// Claim the descriptor for `path`.
    ///
    /// The entry is removed whether or not it is returned; it is returned
    /// only if it has not expired and `current` still matches its stamp.
    pub fn take(&self, path: &Path, current: &FileStamp) -> Option<SfcDescriptor> {
        let entry = self
            .entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(path)?;

        if entry.stored_at.elapsed() >= self.ttl || entry.stamp != *current {
            return None;
        }
        Some(entry.descriptor)
    }

    /// Number of parked descriptors, expired ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
