//! Labeled structural graphs derived from concrete syntax trees

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;

/// Unique identifier for a node in a labeled graph
pub type NodeId = NodeIndex;

/// A node in a labeled graph.
///
/// Carries the structural label used for exact fingerprinting and, where the
/// two differ (operator nodes), the normalized label used for pattern
/// fingerprinting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphNode {
    label: String,
    pattern_label: Option<String>,
}

impl GraphNode {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            pattern_label: None,
        }
    }

    pub fn with_pattern_label(label: impl Into<String>, pattern: impl Into<String>) -> Self {
        let label = label.into();
        let pattern = pattern.into();
        let pattern_label = if pattern == label {
            None
        } else {
            Some(pattern)
        };
        Self {
            label,
            pattern_label,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Label under operator normalization. Falls back to the exact label.
    pub fn pattern_label(&self) -> &str {
        self.pattern_label.as_deref().unwrap_or(&self.label)
    }
}

/// A directed, rooted, ordered graph of structural labels.
///
/// Derived from a CST, so always a tree: node 0 is the root, edges point from
/// parent to child, and the child order produced by the plugin is part of the
/// structural identity. Node ids are dense from 0 (nodes are never removed).
#[derive(Debug, Clone, Default)]
pub struct LabeledGraph {
    graph: DiGraph<GraphNode, ()>,
}

impl LabeledGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node. The first node added becomes the root.
    pub fn add_node(&mut self, node: GraphNode) -> NodeId {
        self.graph.add_node(node)
    }

    /// Append `child` to `parent`'s ordered child list.
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) {
        self.graph.add_edge(parent, child, ());
    }

    /// The designated root, `None` for the empty graph.
    pub fn root(&self) -> Option<NodeId> {
        if self.graph.node_count() == 0 {
            None
        } else {
            Some(NodeIndex::new(0))
        }
    }

    pub fn node(&self, id: NodeId) -> Option<&GraphNode> {
        self.graph.node_weight(id)
    }

    /// Children of `id` in insertion order.
    ///
    /// Petgraph yields neighbors in reverse order of edge addition, so the
    /// collected list is reversed to recover plugin insertion order.
    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        let mut out: Vec<NodeId> = self
            .graph
            .neighbors_directed(id, Direction::Outgoing)
            .collect();
        out.reverse();
        out
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// All nodes with their ids, in id order.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &GraphNode)> {
        self.graph
            .node_indices()
            .map(move |id| (id, &self.graph[id]))
    }

    /// Maximum root-to-leaf depth. The empty graph has depth 0, a single
    /// node has depth 1.
    pub fn depth(&self) -> usize {
        let Some(root) = self.root() else {
            return 0;
        };
        let mut max = 0;
        let mut stack = vec![(root, 1usize)];
        while let Some((id, depth)) = stack.pop() {
            max = max.max(depth);
            for child in self.children(id) {
                stack.push((child, depth + 1));
            }
        }
        max
    }
}
