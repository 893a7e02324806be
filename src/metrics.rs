use std::collections::{BTreeMap, HashSet};

use petgraph::graph::NodeIndex;
use rayon::prelude::*;

use crate::graph::AdjacencyGraph;

/// Node degrees, largest first.
pub fn degree_sequence(graph: &AdjacencyGraph) -> Vec<usize> {
    let mut degrees: Vec<usize> = graph
        .graph
        .node_indices()
        .map(|node| graph.degree(node))
        .collect();
    degrees.sort_unstable_by(|a, b| b.cmp(a));
    degrees
}

/// Degree -> number of nodes with that degree.
pub fn degree_histogram(graph: &AdjacencyGraph) -> BTreeMap<usize, usize> {
    let mut histogram = BTreeMap::new();
    for node in graph.graph.node_indices() {
        *histogram.entry(graph.degree(node)).or_insert(0) += 1;
    }
    histogram
}

/// Number of triangles through `node`.
pub fn triangles(graph: &AdjacencyGraph, node: NodeIndex) -> usize {
    let neighbors: HashSet<NodeIndex> = graph.graph.neighbors(node).collect();
    let mut count = 0;
    for &neighbor in &neighbors {
        for second in graph.graph.neighbors(neighbor) {
            if second > neighbor && neighbors.contains(&second) {
                count += 1;
            }
        }
    }
    count
}

/// Local clustering coefficient; zero for nodes of degree below two.
pub fn clustering(graph: &AdjacencyGraph, node: NodeIndex) -> f64 {
    let degree = graph.degree(node);
    if degree < 2 {
        return 0.0;
    }
    let possible = degree * (degree - 1) / 2;
    triangles(graph, node) as f64 / possible as f64
}

/// Clustering coefficient of every node, in node order.
pub fn clustering_all(graph: &AdjacencyGraph) -> Vec<(NodeIndex, f64)> {
    let nodes: Vec<NodeIndex> = graph.graph.node_indices().collect();
    nodes
        .par_iter()
        .map(|&node| (node, clustering(graph, node)))
        .collect()
}

/// `(degree, clustering * (degree - 1) / 2)` per node, the series plotted by
/// the clustering scatter chart.
pub fn clustering_by_degree(graph: &AdjacencyGraph) -> Vec<(usize, f64)> {
    clustering_all(graph)
        .into_iter()
        .map(|(node, coefficient)| {
            let degree = graph.degree(node);
            let scale = degree.saturating_sub(1) as f64 / 2.0;
            (degree, coefficient * scale)
        })
        .collect()
}

pub fn common_neighbors(graph: &AdjacencyGraph, a: NodeIndex, b: NodeIndex) -> usize {
    let first: HashSet<NodeIndex> = graph.graph.neighbors(a).collect();
    graph
        .graph
        .neighbors(b)
        .filter(|node| first.contains(node))
        .count()
}

pub fn mean_clustering(graph: &AdjacencyGraph) -> f64 {
    let values = clustering_all(graph);
    if values.is_empty() {
        return 0.0;
    }
    values.iter().map(|(_, value)| value).sum::<f64>() / values.len() as f64
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

    fn wheel(spokes: usize) -> AdjacencyGraph {
        let mut edges = Vec::new();
        for i in 1..=spokes {
            edges.push((0, i));
            edges.push((i, if i == spokes { 1 } else { i + 1 }));
        }
        graph_from_edges(spokes + 1, &edges)
    }

    #[test]
    fn degree_histogram_counts_each_node_once() {
        let graph = wheel(5);
        let histogram = degree_histogram(&graph);
        assert_eq!(histogram.get(&5), Some(&1));
        assert_eq!(histogram.get(&3), Some(&5));
        assert_eq!(degree_sequence(&graph), vec![5, 3, 3, 3, 3, 3]);
    }

    #[test]
    fn wheel_hub_triangles_and_clustering() {
        let graph = wheel(6);
        let hub = NodeIndex::new(0);
        let rim = NodeIndex::new(1);
        assert_eq!(triangles(&graph, hub), 6);
        assert_eq!(triangles(&graph, rim), 2);
        assert!((clustering(&graph, hub) - 6.0 / 15.0).abs() < 1e-12);
        assert!((clustering(&graph, rim) - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn low_degree_nodes_have_zero_clustering() {
        let graph = graph_from_edges(3, &[(0, 1)]);
        assert_eq!(clustering(&graph, NodeIndex::new(0)), 0.0);
        assert_eq!(clustering(&graph, NodeIndex::new(2)), 0.0);
        assert_eq!(mean_clustering(&graph), 0.0);
    }

    #[test]
    fn clustering_by_degree_scales_to_triangles_per_degree() {
        let graph = wheel(6);
        let points = clustering_by_degree(&graph);
        assert_eq!(points.len(), 7);
        let (degree, value) = points[0];
        assert_eq!(degree, 6);
        // c * (d - 1) / 2 == triangles / d
        assert!((value - 1.0).abs() < 1e-12);
    }

    #[test]
    fn common_neighbors_of_opposite_square_corners() {
        let graph = graph_from_edges(4, &[(0, 1), (1, 2), (2, 3), (3, 0)]);
        assert_eq!(common_neighbors(&graph, NodeIndex::new(0), NodeIndex::new(2)), 2);
        assert_eq!(common_neighbors(&graph, NodeIndex::new(0), NodeIndex::new(1)), 0);
    }
}
