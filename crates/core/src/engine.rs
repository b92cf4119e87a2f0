//! Analysis orchestration: discovery, parallel extraction, clustering,
//! reporting, and the write/edit pre-create checks

use crate::cache::UnitCache;
use crate::config::AstrographConfig;
use crate::discovery::discover_files;
use crate::duplicates::{find_clusters, ClusterKind, DuplicateCluster, FingerprintedUnit, Thresholds};
use crate::fingerprint::{fingerprint_graph, Digest};
use crate::index::{IndexEntry, IndexError, IndexStore, Suppression};
use crate::plugin::{PluginError, PluginRegistry};
use crate::report::{write_report, ReportInput};
use crate::unit::UnitKind;
use rayon::prelude::*;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

/// Environment variable enabling event-driven mode (in-memory unit caching).
pub const EVENT_DRIVEN_ENV: &str = "ASTROGRAPH_EVENT_DRIVEN";

/// Node-count threshold applied by the write/edit pre-create checks.
pub const PRE_CREATE_MIN_NODE_COUNT: usize = 10;

/// Error types for engine operations
#[derive(Error, Debug)]
pub enum EngineError {
    #[error(transparent)]
    Index(#[from] IndexError),

    #[error(transparent)]
    Plugin(#[from] PluginError),

    #[error("analysis canceled")]
    Canceled,

    #[error("unknown cluster key: {0}")]
    UnknownCluster(String),

    #[error("edit target error: {0}")]
    EditTarget(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Options for one analysis run
#[derive(Debug, Clone)]
pub struct AnalysisOptions {
    /// Restrict to these language ids; `None` analyzes all registered.
    pub languages: Option<Vec<String>>,
    pub min_node_count_exact: usize,
    pub min_node_count_block: usize,
    pub min_block_lines: usize,
    pub include_blocks: bool,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            languages: None,
            min_node_count_exact: 5,
            min_node_count_block: 10,
            min_block_lines: 3,
            include_blocks: true,
        }
    }
}

impl AnalysisOptions {
    /// Options seeded from a config file.
    pub fn from_config(config: &AstrographConfig) -> Self {
        Self {
            languages: if config.general.languages.is_empty() {
                None
            } else {
                Some(config.general.languages.clone())
            },
            min_node_count_exact: config.analysis.min_node_count_exact,
            min_node_count_block: config.analysis.min_node_count_block,
            min_block_lines: config.analysis.min_block_lines,
            include_blocks: config.analysis.include_blocks,
        }
    }

    fn thresholds(&self) -> Thresholds {
        Thresholds {
            min_node_count_exact: self.min_node_count_exact,
            min_node_count_block: self.min_node_count_block,
            min_block_lines: self.min_block_lines,
        }
    }
}

/// Cooperative cancellation handle.
///
/// Checked between stages and between per-file work items; in-flight file
/// work may complete but its output is discarded. A canceled run neither
/// mutates the index nor writes a report.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_canceled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Counters and accumulated warnings for one run
#[derive(Debug, Clone, Default)]
pub struct AnalysisSummary {
    pub files_analyzed: usize,
    pub units_indexed: usize,
    pub exact_clusters: usize,
    pub pattern_clusters: usize,
    pub block_clusters: usize,
    pub suppressed_clusters: usize,
    /// Recovered per-file failures (parse errors, unreadable files).
    pub warnings: Vec<String>,
}

/// Result of a completed analysis run
#[derive(Debug, Clone)]
pub struct AnalysisOutcome {
    pub report_path: PathBuf,
    pub clusters: Vec<DuplicateCluster>,
    pub summary: AnalysisSummary,
}

/// One pre-create duplicate finding (not an error)
#[derive(Debug, Clone)]
pub struct PreCreateFinding {
    /// Exact findings block a write; pattern findings only warn.
    pub kind: ClusterKind,
    pub unit_name: String,
    pub unit_location: String,
    pub node_count: usize,
    pub digest: Digest,
    /// Locations of the already-indexed matches.
    pub existing: Vec<String>,
}

/// Result of a write or edit operation
#[derive(Debug, Clone)]
pub struct WriteOutcome {
    /// False when an exact duplicate blocked the mutation.
    pub applied: bool,
    pub findings: Vec<PreCreateFinding>,
}

/// Read the event-driven flag from the environment.
pub fn event_driven_from_env() -> bool {
    std::env::var(EVENT_DRIVEN_ENV)
        .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false)
}

struct FileOutcome {
    path: PathBuf,
    content_digest: Digest,
    units: Vec<FingerprintedUnit>,
    warning: Option<String>,
}

/// The analysis engine
///
/// Owns the plugin registry for its lifetime. Each instance is fully
/// isolated (no process-wide state), so tests construct throwaway engines
/// over temp directories.
pub struct AnalysisEngine {
    root: PathBuf,
    config: AstrographConfig,
    registry: PluginRegistry,
    event_driven: bool,
    cache: UnitCache,
}

impl AnalysisEngine {
    /// Engine over `root` with the default plugin set. Event-driven mode is
    /// taken from the environment.
    pub fn new(root: impl Into<PathBuf>, config: AstrographConfig) -> Self {
        let registry = PluginRegistry::with_max_block_depth(config.analysis.max_block_depth);
        Self {
            root: root.into(),
            config,
            registry,
            event_driven: event_driven_from_env(),
            cache: UnitCache::new(),
        }
    }

    /// Engine with a caller-supplied registry (custom or LSP-backed plugins).
    pub fn with_registry(
        root: impl Into<PathBuf>,
        config: AstrographConfig,
        registry: PluginRegistry,
    ) -> Self {
        Self {
            root: root.into(),
            config,
            registry,
            event_driven: event_driven_from_env(),
            cache: UnitCache::new(),
        }
    }

    /// Force event-driven mode on or off, overriding the environment.
    pub fn with_event_driven(mut self, enabled: bool) -> Self {
        self.event_driven = enabled;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &AstrographConfig {
        &self.config
    }

    pub fn registry(&self) -> &PluginRegistry {
        &self.registry
    }

    pub fn index_dir(&self) -> PathBuf {
        self.root.join(&self.config.index.dir)
    }

    // ── analyze ──────────────────────────────────────────────────────────

    /// Run a full analysis: discover, extract, fingerprint, cluster, filter
    /// suppressions, persist the index, and write a report artifact.
    pub fn analyze(
        &self,
        options: &AnalysisOptions,
        cancel: &CancelToken,
    ) -> Result<AnalysisOutcome, EngineError> {
        let mut store = IndexStore::open(&self.index_dir())?;
        let _lock = store.acquire_lock()?;

        let files = discover_files(
            &self.root,
            &self.registry,
            options.languages.as_deref(),
            &self.config.ignore.paths,
        )?;
        debug!(files = files.len(), "corpus discovered");

        if cancel.is_canceled() {
            return Err(EngineError::Canceled);
        }

        // Parse, extract, and fingerprint: embarrassingly parallel per file.
        // Workers only touch their own bytes; results are values.
        let outcomes: Vec<Option<FileOutcome>> = files
            .par_iter()
            .map(|file| {
                if cancel.is_canceled() {
                    return None;
                }
                Some(self.process_file(file))
            })
            .collect();

        if cancel.is_canceled() {
            return Err(EngineError::Canceled);
        }

        let mut warnings = Vec::new();
        let mut corpus: Vec<FingerprintedUnit> = Vec::new();
        let mut records: Vec<(PathBuf, Digest, Vec<IndexEntry>)> = Vec::new();
        let mut files_analyzed = 0usize;

        for outcome in outcomes.into_iter().flatten() {
            if let Some(warning) = outcome.warning {
                warnings.push(warning);
                continue;
            }
            files_analyzed += 1;

            let kept: Vec<FingerprintedUnit> = outcome
                .units
                .into_iter()
                .filter(|fu| options.include_blocks || fu.unit.kind != UnitKind::Block)
                .collect();

            let entries = kept
                .iter()
                .map(|fu| IndexEntry::from_unit(&fu.unit, fu.fingerprint))
                .collect();
            records.push((outcome.path, outcome.content_digest, entries));
            corpus.extend(kept);
        }
        warnings.sort();

        let clusters = find_clusters(&corpus, &options.thresholds());

        if cancel.is_canceled() {
            return Err(EngineError::Canceled);
        }

        // Suppression activity is judged against the fresh corpus: a
        // suppression applies only while every evidence digest it recorded
        // still names a live unit.
        let current_evidence: HashSet<Digest> =
            corpus.iter().map(|fu| fu.unit.evidence_digest()).collect();
        let active: Vec<&Suppression> = store
            .list_suppressions()
            .iter()
            .filter(|s| {
                s.evidence_digests
                    .iter()
                    .all(|digest| current_evidence.contains(digest))
            })
            .collect();

        let total_clusters = clusters.len();
        let clusters: Vec<DuplicateCluster> = clusters
            .into_iter()
            .filter(|cluster| {
                let evidence = cluster.evidence_digests();
                !active.iter().any(|s| s.covers(&evidence))
            })
            .collect();
        let suppressed_clusters = total_clusters - clusters.len();

        if cancel.is_canceled() {
            return Err(EngineError::Canceled);
        }

        // Single writer behind the run lock from here on.
        let units_indexed = corpus.len();
        let live: HashSet<PathBuf> = records.iter().map(|(path, _, _)| path.clone()).collect();
        store.upsert_many(records)?;
        let removed = store.remove_missing(&live)?;
        if removed > 0 {
            debug!(removed, "dropped index records for vanished files");
        }

        let summary = AnalysisSummary {
            files_analyzed,
            units_indexed,
            exact_clusters: count_kind(&clusters, ClusterKind::Exact),
            pattern_clusters: count_kind(&clusters, ClusterKind::Pattern),
            block_clusters: count_kind(&clusters, ClusterKind::Block),
            suppressed_clusters,
            warnings: warnings.clone(),
        };

        let report_path = write_report(
            store.dir(),
            &ReportInput {
                clusters: clusters.clone(),
                warnings,
                files_analyzed,
                units_indexed,
                suppressed_clusters,
            },
        )?;

        Ok(AnalysisOutcome {
            report_path,
            clusters,
            summary,
        })
    }

    fn process_file(&self, file: &Path) -> FileOutcome {
        let bytes = match std::fs::read(file) {
            Ok(bytes) => bytes,
            Err(err) => {
                return FileOutcome {
                    path: file.to_path_buf(),
                    content_digest: Digest::of_bytes(&[]),
                    units: Vec::new(),
                    warning: Some(format!("{}: {}", file.display(), err)),
                }
            }
        };
        let content_digest = Digest::of_bytes(&bytes);

        if self.event_driven {
            if let Some(units) = self.cache.get(file, content_digest) {
                return FileOutcome {
                    path: file.to_path_buf(),
                    content_digest,
                    units,
                    warning: None,
                };
            }
        }

        let Some(plugin) = self.registry.for_path(file) else {
            // Discovery pre-filters extensions, so this is unexpected but
            // not a failure: unsupported files are skipped silently.
            return FileOutcome {
                path: file.to_path_buf(),
                content_digest,
                units: Vec::new(),
                warning: None,
            };
        };

        let units = match plugin.extract_code_units(&bytes, file) {
            Ok(units) => units,
            Err(err) => {
                return FileOutcome {
                    path: file.to_path_buf(),
                    content_digest,
                    units: Vec::new(),
                    warning: Some(format!("{}: {}", file.display(), err)),
                }
            }
        };

        let units: Vec<FingerprintedUnit> = units
            .into_iter()
            .filter_map(|unit| match plugin.code_unit_to_ast_graph(&unit) {
                Ok(graph) => Some(FingerprintedUnit {
                    fingerprint: fingerprint_graph(&graph),
                    unit,
                }),
                Err(err) => {
                    warn!(unit = %unit.name, file = %file.display(), %err, "unit skipped");
                    None
                }
            })
            .collect();

        if self.event_driven {
            self.cache.put(file, content_digest, units.clone());
        }

        FileOutcome {
            path: file.to_path_buf(),
            content_digest,
            units,
            warning: None,
        }
    }

    // ── write / edit pre-create checks ───────────────────────────────────

    /// Check prospective content for duplicates against the persisted index.
    ///
    /// Findings are structured results, not errors; content that fails to
    /// parse yields no findings (work-in-progress code must not be blocked).
    pub fn check_content(
        &self,
        file_path: &Path,
        content: &str,
    ) -> Result<Vec<PreCreateFinding>, EngineError> {
        let Some(plugin) = self.registry.for_path(file_path) else {
            return Ok(Vec::new());
        };

        let units = match plugin.extract_code_units(content.as_bytes(), file_path) {
            Ok(units) => units,
            Err(PluginError::ParseFailure(err)) => {
                debug!(%err, "pre-create check skipped: content does not parse");
                return Ok(Vec::new());
            }
            Err(err) => return Err(err.into()),
        };

        let store = IndexStore::open(&self.index_dir())?;
        let active: Vec<Suppression> = store
            .list_active_suppressions()
            .into_iter()
            .cloned()
            .collect();

        let mut findings = Vec::new();
        for unit in units {
            if unit.node_count < PRE_CREATE_MIN_NODE_COUNT {
                continue;
            }
            let graph = plugin.code_unit_to_ast_graph(&unit)?;
            let fingerprint = fingerprint_graph(&graph);

            let mut exact_matches = Vec::new();
            let mut pattern_matches = Vec::new();
            for entry in store.entries() {
                // The file's own prior entries are not duplicates of itself.
                if entry.file_path == file_path {
                    continue;
                }
                if entry.fingerprint.exact == fingerprint.exact {
                    exact_matches.push(entry.location());
                } else if entry.fingerprint.pattern == fingerprint.pattern {
                    pattern_matches.push(entry.location());
                }
            }

            let unit_location = unit.location();
            if !exact_matches.is_empty() {
                let key = format!("{}:{}", ClusterKind::Exact, fingerprint.exact);
                if !active.iter().any(|s| s.cluster_key == key) {
                    findings.push(PreCreateFinding {
                        kind: ClusterKind::Exact,
                        unit_name: unit.name.clone(),
                        unit_location: unit_location.clone(),
                        node_count: unit.node_count,
                        digest: fingerprint.exact,
                        existing: exact_matches,
                    });
                }
            }
            if !pattern_matches.is_empty() {
                let key = format!("{}:{}", ClusterKind::Pattern, fingerprint.pattern);
                if !active.iter().any(|s| s.cluster_key == key) {
                    findings.push(PreCreateFinding {
                        kind: ClusterKind::Pattern,
                        unit_name: unit.name.clone(),
                        unit_location,
                        node_count: unit.node_count,
                        digest: fingerprint.pattern,
                        existing: pattern_matches,
                    });
                }
            }
        }

        Ok(findings)
    }

    /// Write `content` to `file_path` unless an exact duplicate of one of
    /// its units already exists elsewhere. Pattern findings warn but do not
    /// block.
    pub fn write(&self, file_path: &Path, content: &str) -> Result<WriteOutcome, EngineError> {
        let findings = self.check_content(file_path, content)?;
        if findings.iter().any(|f| f.kind == ClusterKind::Exact) {
            return Ok(WriteOutcome {
                applied: false,
                findings,
            });
        }

        if let Some(parent) = file_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(file_path, content)?;
        self.reindex_file(file_path, content)?;

        Ok(WriteOutcome {
            applied: true,
            findings,
        })
    }

    /// Replace a unique occurrence of `old_string` and run the same
    /// pre-create contract as [`write`](Self::write) on the resulting text.
    pub fn edit(
        &self,
        file_path: &Path,
        old_string: &str,
        new_string: &str,
    ) -> Result<WriteOutcome, EngineError> {
        let content = std::fs::read_to_string(file_path)?;
        match content.matches(old_string).count() {
            0 => {
                return Err(EngineError::EditTarget(format!(
                    "old_string not found in {}",
                    file_path.display()
                )))
            }
            1 => {}
            n => {
                return Err(EngineError::EditTarget(format!(
                    "old_string occurs {} times in {}; it must be unique",
                    n,
                    file_path.display()
                )))
            }
        }

        let new_content = content.replacen(old_string, new_string, 1);
        let findings = self.check_content(file_path, &new_content)?;
        if findings.iter().any(|f| f.kind == ClusterKind::Exact) {
            return Ok(WriteOutcome {
                applied: false,
                findings,
            });
        }

        std::fs::write(file_path, &new_content)?;
        self.reindex_file(file_path, &new_content)?;

        Ok(WriteOutcome {
            applied: true,
            findings,
        })
    }

    fn reindex_file(&self, file_path: &Path, content: &str) -> Result<(), EngineError> {
        let Some(plugin) = self.registry.for_path(file_path) else {
            return Ok(());
        };
        let units = match plugin.extract_code_units(content.as_bytes(), file_path) {
            Ok(units) => units,
            Err(PluginError::ParseFailure(_)) => Vec::new(),
            Err(err) => return Err(err.into()),
        };

        let mut entries = Vec::new();
        for unit in units {
            let graph = plugin.code_unit_to_ast_graph(&unit)?;
            entries.push(IndexEntry::from_unit(&unit, fingerprint_graph(&graph)));
        }

        let mut store = IndexStore::open(&self.index_dir())?;
        let _lock = store.acquire_lock()?;
        store.upsert(file_path, Digest::of_bytes(content.as_bytes()), entries)?;
        Ok(())
    }

    // ── suppressions ─────────────────────────────────────────────────────

    /// Suppress a cluster by its key (`<kind>:<digest>`, as printed in
    /// reports).
    pub fn suppress(&self, cluster_key: &str, reason: &str) -> Result<(), EngineError> {
        let mut store = IndexStore::open(&self.index_dir())?;
        let _lock = store.acquire_lock()?;

        let thresholds = Thresholds {
            min_node_count_exact: self.config.analysis.min_node_count_exact,
            min_node_count_block: self.config.analysis.min_node_count_block,
            min_block_lines: self.config.analysis.min_block_lines,
        };
        let cluster = store
            .lookup_clusters(&thresholds)
            .into_iter()
            .find(|cluster| cluster.cluster_key() == cluster_key)
            .ok_or_else(|| EngineError::UnknownCluster(cluster_key.to_string()))?;

        store.add_suppression(cluster_key, cluster.evidence_digests(), reason)?;
        Ok(())
    }

    /// Remove a suppression, making its cluster visible again.
    pub fn unsuppress(&self, cluster_key: &str) -> Result<(), EngineError> {
        let mut store = IndexStore::open(&self.index_dir())?;
        let _lock = store.acquire_lock()?;
        if store.remove_suppression(cluster_key)? == 0 {
            return Err(EngineError::UnknownCluster(cluster_key.to_string()));
        }
        Ok(())
    }

    pub fn list_suppressions(&self) -> Result<Vec<Suppression>, EngineError> {
        let store = IndexStore::open(&self.index_dir())?;
        Ok(store.list_suppressions().to_vec())
    }

    pub fn list_active_suppressions(&self) -> Result<Vec<Suppression>, EngineError> {
        let store = IndexStore::open(&self.index_dir())?;
        Ok(store
            .list_active_suppressions()
            .into_iter()
            .cloned()
            .collect())
    }

    // ── comparison ───────────────────────────────────────────────────────

    /// Whether two files have isomorphic structure (equal exact
    /// fingerprints over their full CST-derived graphs).
    pub fn files_isomorphic(&self, a: &Path, b: &Path) -> Result<bool, EngineError> {
        let fp_a = self.file_fingerprint(a)?;
        let fp_b = self.file_fingerprint(b)?;
        Ok(fp_a.exact == fp_b.exact)
    }

    fn file_fingerprint(&self, path: &Path) -> Result<crate::fingerprint::Fingerprint, EngineError> {
        let plugin = self.registry.for_path(path).ok_or_else(|| {
            PluginError::UnsupportedLanguage(path.display().to_string())
        })?;
        let bytes = std::fs::read(path)?;
        let graph = plugin.source_to_graph(&bytes)?;
        Ok(fingerprint_graph(&graph))
    }
}

fn count_kind(clusters: &[DuplicateCluster], kind: ClusterKind) -> usize {
    clusters.iter().filter(|c| c.kind == kind).count()
}
