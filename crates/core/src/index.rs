//! Persistent fingerprint index and suppression store
//!
//! Everything lives in one metadata directory (default
//! `.metadata_astrograph/`): a length-prefixed record blob for index
//! entries, an append-only suppression log, a writer lock file, and the
//! report artifacts. On-disk state is the canonical owner across restarts.

use crate::duplicates::{ClusterKind, Thresholds};
use crate::fingerprint::{Digest, Fingerprint};
use crate::unit::{CodeUnit, UnitKind};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Default metadata directory name.
pub const DEFAULT_INDEX_DIR: &str = ".metadata_astrograph";

const INDEX_FILE: &str = "index.bin";
const SUPPRESSIONS_FILE: &str = "suppressions.jsonl";
const LOCK_FILE: &str = "lock";

const INDEX_MAGIC: [u8; 4] = *b"AGIX";
const INDEX_VERSION: u8 = 1;

/// Error types for index operations
#[derive(Error, Debug)]
pub enum IndexError {
    /// The on-disk blob is unreadable; the analyzer refuses to write over it.
    #[error("index corruption: {0}; delete the index directory and re-run analyze")]
    Corruption(String),

    /// Another writer holds the index lock.
    #[error("another analysis run holds the index lock: {0}")]
    ConcurrentRunRefused(PathBuf),

    #[error("index I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("index encoding error: {0}")]
    Encode(#[from] rmp_serde::encode::Error),
}

/// Persistent record of one code unit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexEntry {
    pub file_path: PathBuf,
    pub start_line: usize,
    pub end_line: usize,
    pub kind: UnitKind,
    pub name: String,
    pub language_id: String,
    pub node_count: usize,
    pub fingerprint: Fingerprint,
    /// Digest of the unit's raw source bytes; drives staleness.
    pub evidence_digest: Digest,
    #[serde(default)]
    pub block_type: Option<String>,
}

impl IndexEntry {
    pub fn from_unit(unit: &CodeUnit, fingerprint: Fingerprint) -> Self {
        Self {
            file_path: unit.file_path.clone(),
            start_line: unit.start_line,
            end_line: unit.end_line,
            kind: unit.kind,
            name: unit.name.clone(),
            language_id: unit.language_id.clone(),
            node_count: unit.node_count,
            fingerprint,
            evidence_digest: unit.evidence_digest(),
            block_type: unit.block_type.clone(),
        }
    }

    pub fn line_count(&self) -> usize {
        self.end_line.saturating_sub(self.start_line) + 1
    }

    pub fn location(&self) -> String {
        format!(
            "{}:{}-{}",
            self.file_path.display(),
            self.start_line,
            self.end_line
        )
    }
}

/// Per-file record in the index blob.
///
/// Serialized as a named map so future fields are ignored by older readers
/// (forward compatibility).
#[derive(Debug, Clone, Serialize, Deserialize)]
struct FileRecord {
    file_path: PathBuf,
    content_digest: Digest,
    entries: Vec<IndexEntry>,
}

/// A user-declared tolerance for one duplicate cluster
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Suppression {
    pub cluster_key: String,
    pub evidence_digests: Vec<Digest>,
    pub reason: String,
    pub created_at: DateTime<Utc>,
}

impl Suppression {
    /// A suppression covers a cluster when every member's current evidence
    /// digest is among those stored at suppress time.
    pub fn covers(&self, cluster_evidence: &[Digest]) -> bool {
        cluster_evidence
            .iter()
            .all(|digest| self.evidence_digests.contains(digest))
    }
}

/// A cluster reconstructed from persisted entries (cross-run reporting).
#[derive(Debug, Clone)]
pub struct IndexCluster {
    pub kind: ClusterKind,
    pub digest: Digest,
    pub entries: Vec<IndexEntry>,
}

impl IndexCluster {
    pub fn cluster_key(&self) -> String {
        format!("{}:{}", self.kind, self.digest)
    }

    pub fn evidence_digests(&self) -> Vec<Digest> {
        self.entries.iter().map(|e| e.evidence_digest).collect()
    }
}

/// Exclusive writer lock over the index directory.
///
/// Released on drop. Held for the whole duration of an analysis run so
/// readers observe either the pre-run or post-run state, never a mix.
pub struct IndexLock {
    path: PathBuf,
}

impl Drop for IndexLock {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.path);
    }
}

/// Durable storage of index entries and suppressions
pub struct IndexStore {
    dir: PathBuf,
    files: BTreeMap<PathBuf, FileRecord>,
    suppressions: Vec<Suppression>,
}

impl IndexStore {
    /// Open (or initialize) the store in `dir`, loading any persisted state.
    pub fn open(dir: &Path) -> Result<Self, IndexError> {
        fs::create_dir_all(dir)?;
        let mut store = Self {
            dir: dir.to_path_buf(),
            files: BTreeMap::new(),
            suppressions: Vec::new(),
        };
        store.load_index()?;
        store.load_suppressions()?;
        Ok(store)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Acquire the single-writer run lock; fails fast when another run holds
    /// it.
    pub fn acquire_lock(&self) -> Result<IndexLock, IndexError> {
        let path = self.dir.join(LOCK_FILE);
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(mut file) => {
                let _ = write!(file, "{}", std::process::id());
                Ok(IndexLock { path })
            }
            Err(err) if err.kind() == std::io::ErrorKind::AlreadyExists => {
                Err(IndexError::ConcurrentRunRefused(path))
            }
            Err(err) => Err(err.into()),
        }
    }

    // ── index entries ────────────────────────────────────────────────────

    /// Atomically replace the entries recorded for `file_path`.
    pub fn upsert(
        &mut self,
        file_path: &Path,
        content_digest: Digest,
        entries: Vec<IndexEntry>,
    ) -> Result<(), IndexError> {
        self.files.insert(
            file_path.to_path_buf(),
            FileRecord {
                file_path: file_path.to_path_buf(),
                content_digest,
                entries,
            },
        );
        self.persist_index()?;
        self.prune_stale_suppressions()?;
        Ok(())
    }

    /// Replace many file records in one persisted write.
    pub fn upsert_many(
        &mut self,
        records: Vec<(PathBuf, Digest, Vec<IndexEntry>)>,
    ) -> Result<(), IndexError> {
        for (file_path, content_digest, entries) in records {
            self.files.insert(
                file_path.clone(),
                FileRecord {
                    file_path,
                    content_digest,
                    entries,
                },
            );
        }
        self.persist_index()?;
        self.prune_stale_suppressions()?;
        Ok(())
    }

    /// Drop the record for a file that no longer exists.
    pub fn remove(&mut self, file_path: &Path) -> Result<(), IndexError> {
        if self.files.remove(file_path).is_some() {
            self.persist_index()?;
            self.prune_stale_suppressions()?;
        }
        Ok(())
    }

    /// Drop records for files that disappeared from disk. Files in `live`
    /// were just re-indexed and are always kept.
    pub fn remove_missing(&mut self, live: &HashSet<PathBuf>) -> Result<usize, IndexError> {
        let before = self.files.len();
        self.files
            .retain(|path, _| live.contains(path) || path.exists());
        let removed = before - self.files.len();
        if removed > 0 {
            self.persist_index()?;
            self.prune_stale_suppressions()?;
        }
        Ok(removed)
    }

    pub fn content_digest(&self, file_path: &Path) -> Option<Digest> {
        self.files.get(file_path).map(|r| r.content_digest)
    }

    /// All entries across all files, in path order.
    pub fn entries(&self) -> impl Iterator<Item = &IndexEntry> {
        self.files.values().flat_map(|record| record.entries.iter())
    }

    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    /// Reconstruct duplicate clusters from persisted fingerprints.
    pub fn lookup_clusters(&self, thresholds: &Thresholds) -> Vec<IndexCluster> {
        let mut exact: HashMap<Digest, Vec<&IndexEntry>> = HashMap::new();
        let mut pattern: HashMap<Digest, Vec<&IndexEntry>> = HashMap::new();
        let mut block: HashMap<Digest, Vec<&IndexEntry>> = HashMap::new();

        for entry in self.entries() {
            if entry.kind == UnitKind::Block {
                block.entry(entry.fingerprint.exact).or_default().push(entry);
            } else {
                exact.entry(entry.fingerprint.exact).or_default().push(entry);
                pattern
                    .entry(entry.fingerprint.pattern)
                    .or_default()
                    .push(entry);
            }
        }

        let mut clusters = Vec::new();
        collect_index_clusters(exact, ClusterKind::Exact, thresholds, &mut clusters);
        collect_index_clusters(pattern, ClusterKind::Pattern, thresholds, &mut clusters);
        collect_index_clusters(block, ClusterKind::Block, thresholds, &mut clusters);
        clusters.sort_by(|a, b| {
            a.kind
                .cmp(&b.kind)
                .then_with(|| a.digest.cmp(&b.digest))
        });
        clusters
    }

    // ── suppressions ─────────────────────────────────────────────────────

    pub fn add_suppression(
        &mut self,
        cluster_key: &str,
        evidence_digests: Vec<Digest>,
        reason: &str,
    ) -> Result<(), IndexError> {
        let suppression = Suppression {
            cluster_key: cluster_key.to_string(),
            evidence_digests,
            reason: reason.to_string(),
            created_at: Utc::now(),
        };
        self.append_suppression(&suppression)?;
        self.suppressions.push(suppression);
        Ok(())
    }

    /// Remove suppressions for a cluster key. Returns how many were removed.
    pub fn remove_suppression(&mut self, cluster_key: &str) -> Result<usize, IndexError> {
        let before = self.suppressions.len();
        self.suppressions.retain(|s| s.cluster_key != cluster_key);
        let removed = before - self.suppressions.len();
        if removed > 0 {
            self.rewrite_suppressions()?;
        }
        Ok(removed)
    }

    /// All recorded suppressions, active or not.
    pub fn list_suppressions(&self) -> &[Suppression] {
        &self.suppressions
    }

    /// Suppressions whose every evidence digest still exists in current
    /// entries.
    pub fn list_active_suppressions(&self) -> Vec<&Suppression> {
        let current = self.current_evidence_digests();
        self.suppressions
            .iter()
            .filter(|s| {
                s.evidence_digests
                    .iter()
                    .all(|digest| current.contains(digest))
            })
            .collect()
    }

    /// Drop suppressions whose evidence no longer matches any entry.
    /// Returns how many were pruned.
    pub fn prune_stale_suppressions(&mut self) -> Result<usize, IndexError> {
        let current = self.current_evidence_digests();
        let before = self.suppressions.len();
        self.suppressions.retain(|s| {
            s.evidence_digests
                .iter()
                .all(|digest| current.contains(digest))
        });
        let pruned = before - self.suppressions.len();
        if pruned > 0 {
            debug!(pruned, "pruned stale suppressions");
            self.rewrite_suppressions()?;
        }
        Ok(pruned)
    }

    fn current_evidence_digests(&self) -> HashSet<Digest> {
        self.entries().map(|entry| entry.evidence_digest).collect()
    }

    // ── persistence ──────────────────────────────────────────────────────

    fn index_path(&self) -> PathBuf {
        self.dir.join(INDEX_FILE)
    }

    fn suppressions_path(&self) -> PathBuf {
        self.dir.join(SUPPRESSIONS_FILE)
    }

    fn load_index(&mut self) -> Result<(), IndexError> {
        let path = self.index_path();
        if !path.exists() {
            return Ok(());
        }
        let data = fs::read(&path)?;
        if data.len() < 5 {
            return Err(IndexError::Corruption("truncated header".to_string()));
        }
        if data[..4] != INDEX_MAGIC {
            return Err(IndexError::Corruption("bad magic".to_string()));
        }
        if data[4] != INDEX_VERSION {
            return Err(IndexError::Corruption(format!(
                "unknown version {}",
                data[4]
            )));
        }

        let mut offset = 5;
        while offset < data.len() {
            if offset + 4 > data.len() {
                return Err(IndexError::Corruption(
                    "truncated record length".to_string(),
                ));
            }
            let len =
                u32::from_le_bytes(data[offset..offset + 4].try_into().unwrap()) as usize;
            offset += 4;
            if offset + len > data.len() {
                return Err(IndexError::Corruption(
                    "record length exceeds file size".to_string(),
                ));
            }
            let record: FileRecord = rmp_serde::from_slice(&data[offset..offset + len])
                .map_err(|e| IndexError::Corruption(format!("undecodable record: {}", e)))?;
            offset += len;
            self.files.insert(record.file_path.clone(), record);
        }
        Ok(())
    }

    fn persist_index(&self) -> Result<(), IndexError> {
        let mut buf = Vec::new();
        buf.extend_from_slice(&INDEX_MAGIC);
        buf.push(INDEX_VERSION);
        for record in self.files.values() {
            // Named maps keep unknown trailing fields readable by old code.
            let payload = rmp_serde::to_vec_named(record)?;
            buf.extend_from_slice(&(payload.len() as u32).to_le_bytes());
            buf.extend_from_slice(&payload);
        }

        // Write-then-rename so readers never see a half-written blob.
        let tmp = self.dir.join(format!("{}.tmp", INDEX_FILE));
        {
            let mut file = File::create(&tmp)?;
            file.write_all(&buf)?;
            file.sync_all()?;
        }
        fs::rename(&tmp, self.index_path())?;
        Ok(())
    }

    fn load_suppressions(&mut self) -> Result<(), IndexError> {
        let path = self.suppressions_path();
        if !path.exists() {
            return Ok(());
        }
        let contents = fs::read_to_string(&path)?;
        for line in contents.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            match serde_json::from_str::<Suppression>(line) {
                Ok(suppression) => self.suppressions.push(suppression),
                // A malformed log line loses one suppression, not the run.
                Err(err) => debug!(%err, "skipping malformed suppression line"),
            }
        }
        Ok(())
    }

    fn append_suppression(&self, suppression: &Suppression) -> Result<(), IndexError> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.suppressions_path())?;
        let line = serde_json::to_string(suppression)
            .map_err(|e| IndexError::Corruption(format!("unencodable suppression: {}", e)))?;
        writeln!(file, "{}", line)?;
        Ok(())
    }

    fn rewrite_suppressions(&self) -> Result<(), IndexError> {
        let tmp = self.dir.join(format!("{}.tmp", SUPPRESSIONS_FILE));
        {
            let mut file = File::create(&tmp)?;
            for suppression in &self.suppressions {
                let line = serde_json::to_string(suppression).map_err(|e| {
                    IndexError::Corruption(format!("unencodable suppression: {}", e))
                })?;
                writeln!(file, "{}", line)?;
            }
            file.sync_all()?;
        }
        fs::rename(&tmp, self.suppressions_path())?;
        Ok(())
    }
}

fn collect_index_clusters(
    groups: HashMap<Digest, Vec<&IndexEntry>>,
    kind: ClusterKind,
    thresholds: &Thresholds,
    out: &mut Vec<IndexCluster>,
) {
    for (digest, entries) in groups {
        if entries.len() < 2 {
            continue;
        }
        let significant = entries.iter().all(|entry| match kind {
            ClusterKind::Block => {
                entry.node_count >= thresholds.min_node_count_block
                    && entry.line_count() >= thresholds.min_block_lines
            }
            _ => entry.node_count >= thresholds.min_node_count_exact,
        });
        if !significant {
            continue;
        }
        let mut entries: Vec<IndexEntry> = entries.into_iter().cloned().collect();
        entries.sort_by(|a, b| {
            (&a.file_path, a.start_line, a.end_line).cmp(&(&b.file_path, b.start_line, b.end_line))
        });
        out.push(IndexCluster {
            kind,
            digest,
            entries,
        });
    }
}
