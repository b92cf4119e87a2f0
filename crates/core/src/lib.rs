//! Astrograph Core - Structural Duplicate Detection Engine
//!
//! This crate provides the analysis engine behind astrograph:
//! - Language plugins that turn source bytes into labeled CST-derived graphs
//! - Canonical structural fingerprints, stable under identifier and literal
//!   renaming
//! - Duplicate discovery with significance thresholds and suppressions
//! - A persistent fingerprint index with staleness invalidation

pub mod cache;
pub mod config;
pub mod discovery;
pub mod duplicates;
pub mod engine;
pub mod fingerprint;
pub mod graph;
pub mod index;
pub mod plugin;
pub mod report;
pub mod unit;

pub use cache::UnitCache;
pub use config::AstrographConfig;
pub use discovery::discover_files;
pub use duplicates::{
    find_clusters, ClusterKind, DuplicateCluster, FingerprintedUnit, Thresholds,
};
pub use engine::{
    AnalysisEngine, AnalysisOptions, AnalysisOutcome, AnalysisSummary, CancelToken, EngineError,
    PreCreateFinding, WriteOutcome,
};
pub use fingerprint::{fingerprint_graph, Digest, Fingerprint};
pub use graph::{GraphNode, LabeledGraph, NodeId};
pub use index::{IndexEntry, IndexError, IndexStore, Suppression};
pub use plugin::{LanguagePlugin, PluginError, PluginRegistry};
pub use unit::{CodeUnit, UnitKind};

/// Astrograph version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
