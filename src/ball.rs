use std::collections::VecDeque;

use anyhow::Result;
use indexmap::{IndexMap, IndexSet};
use petgraph::algo::isomorphism::is_isomorphic_matching;
use petgraph::graph::{NodeIndex, UnGraph};
use serde::Serialize;

use crate::error::GeoAdjError;
use crate::graph::{AdjacencyGraph, NodeId};

pub const DEFAULT_RADIUS: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BallNode {
    /// Id of the node in the source graph.
    pub id: NodeId,
    pub center: bool,
}

pub type BallGraph = UnGraph<BallNode, ()>;

/// Pruned neighbourhood of a single node with its center marked.
#[derive(Debug, Clone)]
pub struct Ball {
    pub graph: BallGraph,
    pub center: NodeIndex,
}

impl Ball {
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn degree(&self, node: NodeIndex) -> usize {
        self.graph.neighbors(node).count()
    }

    pub fn center_id(&self) -> &NodeId {
        &self.graph[self.center].id
    }

    /// VF2 isomorphism test in which `center` must map onto `center`.
    pub fn is_isomorphic(&self, other: &Ball) -> bool {
        is_isomorphic_matching(
            &self.graph,
            &other.graph,
            |a: &BallNode, b: &BallNode| a.center == b.center,
            |_: &(), _: &()| true,
        )
    }

    pub fn to_record(&self) -> BallRecord {
        let nodes = self
            .graph
            .node_indices()
            .map(|idx| self.graph[idx].clone())
            .collect();
        let edges = self
            .graph
            .edge_indices()
            .filter_map(|edge| self.graph.edge_endpoints(edge))
            .map(|(a, b)| (a.index(), b.index()))
            .collect();
        BallRecord { nodes, edges }
    }
}

/// Serializable form of a ball: nodes in index order, edges as index pairs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BallRecord {
    pub nodes: Vec<BallNode>,
    pub edges: Vec<(usize, usize)>,
}

pub struct BallExtractor;

impl BallExtractor {
    /// Induced subgraph on every node within `radius` hops of `center`, with
    /// non-center degree-1 nodes removed until none remain.
    pub fn extract(graph: &AdjacencyGraph, center: NodeIndex, radius: usize) -> Result<Ball> {
        if graph.graph.node_weight(center).is_none() {
            return Err(GeoAdjError::UnknownNode(center.index().to_string()).into());
        }

        let within = nodes_within(graph, center, radius);
        let mut degrees: IndexMap<NodeIndex, usize> = within
            .iter()
            .map(|&node| {
                let degree = graph
                    .graph
                    .neighbors(node)
                    .filter(|neighbor| within.contains(neighbor))
                    .count();
                (node, degree)
            })
            .collect();

        let mut pending: Vec<NodeIndex> = degrees
            .iter()
            .filter(|(node, degree)| **node != center && **degree == 1)
            .map(|(node, _)| *node)
            .collect();
        while let Some(node) = pending.pop() {
            if degrees.get(&node) != Some(&1) {
                continue;
            }
            degrees.shift_remove(&node);
            for neighbor in graph.graph.neighbors(node) {
                if let Some(degree) = degrees.get_mut(&neighbor) {
                    *degree -= 1;
                    if neighbor != center && *degree == 1 {
                        pending.push(neighbor);
                    }
                }
            }
        }

        let mut ball = BallGraph::with_capacity(degrees.len(), degrees.len() * 2);
        let mut mapping: IndexMap<NodeIndex, NodeIndex> = IndexMap::with_capacity(degrees.len());
        for &node in degrees.keys() {
            let id = graph
                .node_id(node)
                .cloned()
                .unwrap_or_else(|| node.index().to_string());
            let local = ball.add_node(BallNode {
                id,
                center: node == center,
            });
            mapping.insert(node, local);
        }
        for (&node, &local) in &mapping {
            for neighbor in graph.graph.neighbors(node) {
                if neighbor <= node {
                    continue;
                }
                if let Some(&other) = mapping.get(&neighbor) {
                    ball.add_edge(local, other, ());
                }
            }
        }

        let center = mapping
            .get(&center)
            .copied()
            .ok_or_else(|| GeoAdjError::UnknownNode(center.index().to_string()))?;
        Ok(Ball {
            graph: ball,
            center,
        })
    }

    pub fn extract_by_id(graph: &AdjacencyGraph, id: &str, radius: usize) -> Result<Ball> {
        let center = graph
            .resolve(id)
            .ok_or_else(|| GeoAdjError::UnknownNode(id.to_string()))?;
        Self::extract(graph, center, radius)
    }
}

/// Breadth-first collection of nodes at hop distance `<= radius`, center first.
fn nodes_within(graph: &AdjacencyGraph, start: NodeIndex, radius: usize) -> IndexSet<NodeIndex> {
    let mut visited = IndexSet::new();
    let mut queue = VecDeque::new();
    visited.insert(start);
    queue.push_back((start, 0usize));

    while let Some((node, depth)) = queue.pop_front() {
        if depth >= radius {
            continue;
        }
        for neighbor in graph.graph.neighbors(node) {
            if visited.insert(neighbor) {
                queue.push_back((neighbor, depth + 1));
            }
        }
    }

    visited
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{EdgeAttributes, NodeAttributes};

    fn graph_from_edges(nodes: usize, edges: &[(usize, usize)]) -> AdjacencyGraph {
        let mut graph = AdjacencyGraph::new();
        let indices: Vec<NodeIndex> = (0..nodes)
            .map(|i| graph.add_node(format!("n{i}"), NodeAttributes::default()))
            .collect();
        for &(a, b) in edges {
            graph.add_edge(indices[a], indices[b], EdgeAttributes::default());
        }
        graph
    }

    fn grid(rows: usize, cols: usize) -> AdjacencyGraph {
        let mut edges = Vec::new();
        for r in 0..rows {
            for c in 0..cols {
                let idx = r * cols + c;
                if c + 1 < cols {
                    edges.push((idx, idx + 1));
                }
                if r + 1 < rows {
                    edges.push((idx, idx + cols));
                }
            }
        }
        graph_from_edges(rows * cols, &edges)
    }

    fn assert_pruned(ball: &Ball) {
        for idx in ball.graph.node_indices() {
            if idx != ball.center {
                assert_ne!(ball.degree(idx), 1, "leaf {:?} survived pruning", ball.graph[idx]);
            }
        }
    }

    #[test]
    fn center_is_the_only_marked_node() {
        let graph = grid(5, 5);
        for center in graph.graph.node_indices() {
            let ball = BallExtractor::extract(&graph, center, DEFAULT_RADIUS).expect("ball");
            let marked: Vec<_> = ball
                .graph
                .node_indices()
                .filter(|idx| ball.graph[*idx].center)
                .collect();
            assert_eq!(marked, vec![ball.center]);
            assert_eq!(ball.center_id(), graph.node_id(center).unwrap());
            assert_pruned(&ball);
        }
    }

    #[test]
    fn grid_ball_sizes_follow_position() {
        let graph = grid(5, 5);
        let size = |id: &str| {
            BallExtractor::extract_by_id(&graph, id, DEFAULT_RADIUS)
                .expect("ball")
                .node_count()
        };
        assert_eq!(size("n0"), 4, "corner keeps its 2x2 block");
        assert_eq!(size("n2"), 6, "edge keeps a 2x3 block");
        assert_eq!(size("n1"), 6);
        assert_eq!(size("n6"), 9, "interior keeps its 3x3 block");
        assert_eq!(size("n12"), 9);
    }

    #[test]
    fn pruning_reaches_a_fixed_point() {
        // Square 0-1-2-3 with a tail 3-4-5 hanging off; radius 3 reaches 5.
        let graph = graph_from_edges(6, &[(0, 1), (1, 2), (2, 3), (3, 0), (3, 4), (4, 5)]);
        let ball = BallExtractor::extract_by_id(&graph, "n0", 3).expect("ball");
        assert_eq!(ball.node_count(), 4);
        assert_eq!(ball.edge_count(), 4);
        assert_pruned(&ball);
    }

    #[test]
    fn pruning_can_collapse_a_path_onto_its_center() {
        let graph = graph_from_edges(3, &[(0, 1), (1, 2)]);
        let ball = BallExtractor::extract_by_id(&graph, "n0", DEFAULT_RADIUS).expect("ball");
        // n2 is pruned, which leaves n1 as a non-center leaf; it goes too.
        assert_eq!(ball.node_count(), 1);
        assert!(ball.graph[ball.center].center);
    }

    #[test]
    fn isolated_node_yields_single_node_ball() {
        let graph = graph_from_edges(2, &[]);
        let ball = BallExtractor::extract_by_id(&graph, "n1", DEFAULT_RADIUS).expect("ball");
        assert_eq!(ball.node_count(), 1);
        assert_eq!(ball.edge_count(), 0);
    }

    #[test]
    fn unknown_center_is_an_error() {
        let graph = grid(2, 2);
        let err = BallExtractor::extract_by_id(&graph, "missing", DEFAULT_RADIUS).unwrap_err();
        assert_eq!(
            err.downcast_ref::<GeoAdjError>(),
            Some(&GeoAdjError::UnknownNode("missing".to_string()))
        );
        assert!(BallExtractor::extract(&graph, NodeIndex::new(99), DEFAULT_RADIUS).is_err());
    }

    #[test]
    fn extraction_is_deterministic() {
        let graph = grid(6, 6);
        let first = BallExtractor::extract_by_id(&graph, "n14", DEFAULT_RADIUS).expect("ball");
        let second = BallExtractor::extract_by_id(&graph, "n14", DEFAULT_RADIUS).expect("ball");
        assert_eq!(first.to_record(), second.to_record());
        assert!(first.is_isomorphic(&second));
    }

    #[test]
    fn isomorphism_respects_center_label() {
        // Diamond: square 0-1-2-3 with chord 0-2. Radius 2 covers every node.
        let diamond = graph_from_edges(4, &[(0, 1), (1, 2), (2, 3), (3, 0), (0, 2)]);
        let ball = |id: &str| BallExtractor::extract_by_id(&diamond, id, 2).expect("ball");

        let chord_end = ball("n0");
        let other_chord_end = ball("n2");
        let side = ball("n1");
        assert_eq!(chord_end.node_count(), 4);
        assert_eq!(side.node_count(), 4);

        assert!(chord_end.is_isomorphic(&other_chord_end));
        assert!(side.is_isomorphic(&ball("n3")));
        assert!(
            !chord_end.is_isomorphic(&side),
            "same shape, but the centers sit on nodes of different degree"
        );
    }
}
