//! Duplicate discovery: clustering fingerprinted units and applying
//! significance thresholds

use crate::fingerprint::{Digest, Fingerprint};
use crate::unit::{CodeUnit, UnitKind};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;

/// Language id reported for clusters whose members span languages.
pub const MIXED_LANGUAGE: &str = "mixed";

/// What a cluster's shared fingerprint means
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClusterKind {
    /// Function/class units sharing an exact fingerprint.
    Exact,
    /// Function/class units sharing a pattern fingerprint only.
    Pattern,
    /// Control-flow blocks sharing an exact fingerprint.
    Block,
}

impl fmt::Display for ClusterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClusterKind::Exact => write!(f, "exact"),
            ClusterKind::Pattern => write!(f, "pattern"),
            ClusterKind::Block => write!(f, "block"),
        }
    }
}

/// A code unit paired with its computed fingerprint.
#[derive(Debug, Clone)]
pub struct FingerprintedUnit {
    pub unit: CodeUnit,
    pub fingerprint: Fingerprint,
}

/// A set of two or more units sharing a fingerprint
#[derive(Debug, Clone)]
pub struct DuplicateCluster {
    pub kind: ClusterKind,
    pub digest: Digest,
    /// Common language id, or [`MIXED_LANGUAGE`].
    pub language_id: String,
    /// Representative subgraph size (members share structure, so sizes agree).
    pub node_count: usize,
    /// Representative line span.
    pub line_count: usize,
    /// Members sorted by `(file_path, start_line)`.
    pub units: Vec<CodeUnit>,
}

impl DuplicateCluster {
    /// Stable key used by suppress/unsuppress: `<kind>:<digest>`.
    pub fn cluster_key(&self) -> String {
        format!("{}:{}", self.kind, self.digest)
    }

    pub fn evidence_digests(&self) -> Vec<Digest> {
        self.units.iter().map(|u| u.evidence_digest()).collect()
    }

    fn member_key_set(&self) -> Vec<(UnitKind, String, usize, usize)> {
        let mut keys: Vec<_> = self
            .units
            .iter()
            .map(|u| {
                (
                    u.kind,
                    u.file_path.display().to_string(),
                    u.start_line,
                    u.end_line,
                )
            })
            .collect();
        keys.sort();
        keys
    }
}

/// Significance thresholds applied during clustering
#[derive(Debug, Clone, Copy)]
pub struct Thresholds {
    pub min_node_count_exact: usize,
    pub min_node_count_block: usize,
    pub min_block_lines: usize,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            min_node_count_exact: 5,
            min_node_count_block: 10,
            min_block_lines: 3,
        }
    }
}

/// Cluster fingerprinted units and apply significance thresholds.
///
/// Output ordering is a total deterministic function of the input corpus:
/// `(kind, descending node_count, first file_path, first start_line)`.
pub fn find_clusters(units: &[FingerprintedUnit], thresholds: &Thresholds) -> Vec<DuplicateCluster> {
    let mut clusters = Vec::new();

    let definitions: Vec<&FingerprintedUnit> = units
        .iter()
        .filter(|fu| fu.unit.kind != UnitKind::Block)
        .collect();
    let blocks: Vec<&FingerprintedUnit> = units
        .iter()
        .filter(|fu| fu.unit.kind == UnitKind::Block)
        .collect();

    let exact_clusters = group(
        &definitions,
        ClusterKind::Exact,
        |fu| fu.fingerprint.exact,
        |unit| unit.node_count >= thresholds.min_node_count_exact,
    );

    let pattern_clusters = group(
        &definitions,
        ClusterKind::Pattern,
        |fu| fu.fingerprint.pattern,
        |unit| unit.node_count >= thresholds.min_node_count_exact,
    );

    // A pattern cluster whose membership matches an exact cluster adds no
    // information; report only the exact one.
    let exact_memberships: HashSet<Vec<(UnitKind, String, usize, usize)>> = exact_clusters
        .iter()
        .map(DuplicateCluster::member_key_set)
        .collect();
    let pattern_clusters: Vec<DuplicateCluster> = pattern_clusters
        .into_iter()
        .filter(|cluster| !exact_memberships.contains(&cluster.member_key_set()))
        .collect();

    let block_clusters = group(
        &blocks,
        ClusterKind::Block,
        |fu| fu.fingerprint.exact,
        |unit| {
            unit.node_count >= thresholds.min_node_count_block
                && unit.line_count() >= thresholds.min_block_lines
        },
    );

    clusters.extend(exact_clusters);
    clusters.extend(pattern_clusters);
    clusters.extend(block_clusters);

    clusters.sort_by(|a, b| {
        a.kind
            .cmp(&b.kind)
            .then(b.node_count.cmp(&a.node_count))
            .then_with(|| first_location(a).cmp(&first_location(b)))
    });

    clusters
}

fn first_location(cluster: &DuplicateCluster) -> (String, usize) {
    cluster
        .units
        .first()
        .map(|u| (u.file_path.display().to_string(), u.start_line))
        .unwrap_or_default()
}

fn group(
    units: &[&FingerprintedUnit],
    kind: ClusterKind,
    digest_of: impl Fn(&FingerprintedUnit) -> Digest,
    significant: impl Fn(&CodeUnit) -> bool,
) -> Vec<DuplicateCluster> {
    let mut by_digest: HashMap<Digest, Vec<&CodeUnit>> = HashMap::new();
    for fu in units {
        by_digest.entry(digest_of(fu)).or_default().push(&fu.unit);
    }

    let mut clusters = Vec::new();
    for (digest, members) in by_digest {
        if members.len() < 2 {
            continue;
        }
        // Every member must clear the threshold, not just the representative.
        if !members.iter().all(|unit| significant(unit)) {
            continue;
        }

        let mut members: Vec<CodeUnit> = members.into_iter().cloned().collect();
        members.sort_by(|a, b| {
            (&a.file_path, a.start_line, a.end_line).cmp(&(&b.file_path, b.start_line, b.end_line))
        });

        let language_id = cluster_language(&members);
        let node_count = members[0].node_count;
        let line_count = members[0].line_count();

        clusters.push(DuplicateCluster {
            kind,
            digest,
            language_id,
            node_count,
            line_count,
            units: members,
        });
    }

    clusters
}

fn cluster_language(members: &[CodeUnit]) -> String {
    let first = &members[0].language_id;
    if members.iter().all(|u| &u.language_id == first) {
        first.clone()
    } else {
        MIXED_LANGUAGE.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fingerprint::Digest;
    use std::path::PathBuf;

    fn fp_unit(name: &str, file: &str, exact: &[u8], pattern: &[u8], nodes: usize) -> FingerprintedUnit {
        FingerprintedUnit {
            unit: CodeUnit {
                kind: UnitKind::Function,
                name: name.to_string(),
                language_id: "python".to_string(),
                file_path: PathBuf::from(file),
                start_line: 1,
                end_line: 3,
                node_count: nodes,
                source_text: format!("def {}(): pass", name),
                extracted_code: format!("def {}(): pass", name),
                block_type: None,
                parent_name: None,
            },
            fingerprint: Fingerprint {
                exact: Digest::of_bytes(exact),
                pattern: Digest::of_bytes(pattern),
            },
        }
    }

    #[test]
    fn test_singleton_groups_discarded() {
        let units = vec![
            fp_unit("a", "a.py", b"x", b"p", 9),
            fp_unit("b", "b.py", b"y", b"q", 9),
        ];
        assert!(find_clusters(&units, &Thresholds::default()).is_empty());
    }

    #[test]
    fn test_exact_pair_clusters_once() {
        let units = vec![
            fp_unit("a", "a.py", b"x", b"p", 9),
            fp_unit("b", "b.py", b"x", b"p", 9),
        ];
        let clusters = find_clusters(&units, &Thresholds::default());
        // Pattern cluster has identical membership and is elided.
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].kind, ClusterKind::Exact);
        assert_eq!(clusters[0].units.len(), 2);
    }

    #[test]
    fn test_pattern_only_cluster_reported() {
        let units = vec![
            fp_unit("a", "a.py", b"plus", b"p", 9),
            fp_unit("b", "b.py", b"minus", b"p", 9),
        ];
        let clusters = find_clusters(&units, &Thresholds::default());
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].kind, ClusterKind::Pattern);
    }

    #[test]
    fn test_threshold_excludes_small_units() {
        let units = vec![
            fp_unit("a", "a.py", b"x", b"p", 4),
            fp_unit("b", "b.py", b"x", b"p", 4),
        ];
        assert!(find_clusters(&units, &Thresholds::default()).is_empty());
    }

    #[test]
    fn test_mixed_language_tag() {
        let mut units = vec![
            fp_unit("a", "a.py", b"x", b"p", 9),
            fp_unit("b", "b.ts", b"x", b"p", 9),
        ];
        units[1].unit.language_id = "typescript".to_string();
        let clusters = find_clusters(&units, &Thresholds::default());
        assert_eq!(clusters[0].language_id, MIXED_LANGUAGE);
    }

    #[test]
    fn test_cluster_key_format() {
        let units = vec![
            fp_unit("a", "a.py", b"x", b"p", 9),
            fp_unit("b", "b.py", b"x", b"p", 9),
        ];
        let clusters = find_clusters(&units, &Thresholds::default());
        let key = clusters[0].cluster_key();
        assert!(key.starts_with("exact:"));
        assert_eq!(key.len(), "exact:".len() + 32);
    }
}
