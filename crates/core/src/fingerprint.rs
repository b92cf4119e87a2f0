//! Canonical structural fingerprints over labeled graphs
//!
//! A fingerprint is a bottom-up Merkle hash of the ordered label tree: node
//! ids never enter the hash, so two graphs with the same labels in the same
//! shape hash identically regardless of how they were built.

use crate::graph::{LabeledGraph, NodeId};
use serde::{Deserialize, Serialize};
use sha2::{Digest as _, Sha256};
use std::fmt;
use std::str::FromStr;

/// Width of a digest in bytes (SHA-256 truncated to 128 bits).
pub const DIGEST_LEN: usize = 16;

/// A fixed-width structural digest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Digest([u8; DIGEST_LEN]);

impl Digest {
    pub fn as_bytes(&self) -> &[u8; DIGEST_LEN] {
        &self.0
    }

    /// Digest of arbitrary bytes; used for evidence digests of unit source.
    pub fn of_bytes(bytes: &[u8]) -> Self {
        truncate(Sha256::digest(bytes))
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

/// Error parsing a digest from its hex form.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid digest: expected {} hex characters", DIGEST_LEN * 2)]
pub struct ParseDigestError;

impl FromStr for Digest {
    type Err = ParseDigestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != DIGEST_LEN * 2 {
            return Err(ParseDigestError);
        }
        let mut out = [0u8; DIGEST_LEN];
        for (i, chunk) in s.as_bytes().chunks(2).enumerate() {
            let hex = std::str::from_utf8(chunk).map_err(|_| ParseDigestError)?;
            out[i] = u8::from_str_radix(hex, 16).map_err(|_| ParseDigestError)?;
        }
        Ok(Digest(out))
    }
}

impl Serialize for Digest {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Digest {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// The exact/pattern digest pair computed for one code unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fingerprint {
    /// Operator identity preserved.
    pub exact: Digest,
    /// Operators collapsed to a generic class.
    pub pattern: Digest,
}

/// Sentinel digest for the empty graph.
pub fn empty_digest() -> Digest {
    Digest::of_bytes(b"empty")
}

/// Compute both fingerprints of a labeled graph in a single bottom-up pass.
///
/// For a node `n` with ordered children `c1..ck`,
/// `h(n) = sha256(label(n) || 0x00 || h(c1) || ... || h(ck))` truncated to
/// 128 bits. Only labels and child order participate; node ids do not.
pub fn fingerprint_graph(graph: &LabeledGraph) -> Fingerprint {
    let Some(root) = graph.root() else {
        let empty = empty_digest();
        return Fingerprint {
            exact: empty,
            pattern: empty,
        };
    };

    let mut hashes: Vec<Option<(Digest, Digest)>> = vec![None; graph.node_count()];

    // Post-order traversal with an explicit stack; CSTs for generated code
    // can be deep enough to overflow the call stack.
    let mut stack: Vec<(NodeId, bool)> = vec![(root, false)];
    while let Some((id, children_done)) = stack.pop() {
        if children_done {
            let node = graph.node(id).expect("node id from traversal");
            let children = graph.children(id);

            let mut exact = Sha256::new();
            exact.update(node.label().as_bytes());
            exact.update([0u8]);

            let mut pattern = Sha256::new();
            pattern.update(node.pattern_label().as_bytes());
            pattern.update([0u8]);

            for child in children {
                let (child_exact, child_pattern) =
                    hashes[child.index()].expect("children hashed before parent");
                exact.update(child_exact.as_bytes());
                pattern.update(child_pattern.as_bytes());
            }

            hashes[id.index()] = Some((truncate(exact.finalize()), truncate(pattern.finalize())));
        } else {
            stack.push((id, true));
            // Push in reverse so children are hashed in insertion order.
            for child in graph.children(id).into_iter().rev() {
                stack.push((child, false));
            }
        }
    }

    let (exact, pattern) = hashes[root.index()].expect("root hashed");
    Fingerprint { exact, pattern }
}

fn truncate(full: impl AsRef<[u8]>) -> Digest {
    let mut out = [0u8; DIGEST_LEN];
    out.copy_from_slice(&full.as_ref()[..DIGEST_LEN]);
    Digest(out)
}
