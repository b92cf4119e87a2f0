//! In-memory per-file unit cache for event-driven mode
//!
//! Keyed by file content digest: a repeated analyze skips re-parsing files
//! whose bytes are unchanged. Process-local only; cold runs (the default)
//! never consult it.

use crate::duplicates::FingerprintedUnit;
use crate::fingerprint::Digest;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

struct CacheSlot {
    content_digest: Digest,
    units: Vec<FingerprintedUnit>,
}

#[derive(Default)]
pub struct UnitCache {
    inner: Mutex<HashMap<PathBuf, CacheSlot>>,
}

impl UnitCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached units for `path`, only when the content digest still matches.
    pub fn get(&self, path: &Path, content_digest: Digest) -> Option<Vec<FingerprintedUnit>> {
        let inner = self.inner.lock().expect("unit cache poisoned");
        inner
            .get(path)
            .filter(|slot| slot.content_digest == content_digest)
            .map(|slot| slot.units.clone())
    }

    pub fn put(&self, path: &Path, content_digest: Digest, units: Vec<FingerprintedUnit>) {
        let mut inner = self.inner.lock().expect("unit cache poisoned");
        inner.insert(
            path.to_path_buf(),
            CacheSlot {
                content_digest,
                units,
            },
        );
    }

    pub fn clear(&self) {
        self.inner.lock().expect("unit cache poisoned").clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fingerprint::Fingerprint;
    use crate::unit::{CodeUnit, UnitKind};

    fn sample_units() -> Vec<FingerprintedUnit> {
        vec![FingerprintedUnit {
            unit: CodeUnit {
                kind: UnitKind::Function,
                name: "f".to_string(),
                language_id: "python".to_string(),
                file_path: PathBuf::from("a.py"),
                start_line: 1,
                end_line: 2,
                node_count: 7,
                source_text: "def f():\n    pass".to_string(),
                extracted_code: "def f(): pass".to_string(),
                block_type: None,
                parent_name: None,
            },
            fingerprint: Fingerprint {
                exact: Digest::of_bytes(b"x"),
                pattern: Digest::of_bytes(b"y"),
            },
        }]
    }

    #[test]
    fn test_hit_requires_matching_digest() {
        let cache = UnitCache::new();
        let path = PathBuf::from("a.py");
        let digest = Digest::of_bytes(b"content");
        cache.put(&path, digest, sample_units());

        assert!(cache.get(&path, digest).is_some());
        assert!(cache.get(&path, Digest::of_bytes(b"changed")).is_none());
        assert!(cache.get(&PathBuf::from("b.py"), digest).is_none());
    }

    #[test]
    fn test_clear() {
        let cache = UnitCache::new();
        let path = PathBuf::from("a.py");
        let digest = Digest::of_bytes(b"content");
        cache.put(&path, digest, sample_units());
        cache.clear();
        assert!(cache.get(&path, digest).is_none());
    }
}
