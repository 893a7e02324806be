use std::fmt;
use std::str::FromStr;

use petgraph::graph::NodeIndex;
use rayon::prelude::*;

use crate::error::GeoAdjError;
use crate::graph::AdjacencyGraph;
use crate::metrics::{common_neighbors, triangles};

/// Structural node predicates used to select nodes for export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeProperty {
    /// Degree 4, no triangles, and at least 4 of the 6 neighbour pairs share
    /// more than one common neighbour: the middle of a window pane.
    Windowpaneish,
    /// At least 10 triangles and degree at least 10.
    HalfWheely,
}

impl NodeProperty {
    pub const ALL: [NodeProperty; 2] = [NodeProperty::Windowpaneish, NodeProperty::HalfWheely];

    /// Stable name, used as the output directory for exports filtered by this property.
    pub fn name(&self) -> &'static str {
        match self {
            NodeProperty::Windowpaneish => "windowpaneish",
            NodeProperty::HalfWheely => "half_wheely",
        }
    }

    pub fn holds(&self, graph: &AdjacencyGraph, node: NodeIndex) -> bool {
        match self {
            NodeProperty::Windowpaneish => is_windowpaneish(graph, node),
            NodeProperty::HalfWheely => is_half_wheely(graph, node),
        }
    }
}

impl fmt::Display for NodeProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for NodeProperty {
    type Err = GeoAdjError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_ascii_lowercase().replace('-', "_");
        NodeProperty::ALL
            .into_iter()
            .find(|property| property.name() == key)
            .ok_or_else(|| GeoAdjError::UnknownProperty(s.to_string()))
    }
}

pub fn is_windowpaneish(graph: &AdjacencyGraph, node: NodeIndex) -> bool {
    if graph.degree(node) != 4 {
        return false;
    }
    if triangles(graph, node) != 0 {
        return false;
    }
    let neighbors: Vec<NodeIndex> = graph.graph.neighbors(node).collect();
    let mut linked_pairs = 0;
    for (i, &first) in neighbors.iter().enumerate() {
        for &second in &neighbors[i + 1..] {
            if common_neighbors(graph, first, second) > 1 {
                linked_pairs += 1;
            }
        }
    }
    linked_pairs >= 4
}

pub fn is_half_wheely(graph: &AdjacencyGraph, node: NodeIndex) -> bool {
    graph.degree(node) >= 10 && triangles(graph, node) >= 10
}

/// Nodes satisfying `property`, in node order.
pub fn list_nodes(graph: &AdjacencyGraph, property: NodeProperty) -> Vec<NodeIndex> {
    let nodes: Vec<NodeIndex> = graph.graph.node_indices().collect();
    nodes
        .into_par_iter()
        .filter(|&node| property.holds(graph, node))
        .collect()
}
