use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use petgraph::visit::NodeIndexable;

use crate::ball::Ball;

/// Sorted multiset of Weisfeiler-Lehman colors after `iterations` rounds.
///
/// Colors are hashes of (center flag, degree) refined by sorted neighbour
/// colors, so they are comparable across balls: isomorphic balls always share
/// a signature, while a shared signature proves nothing on its own.
pub fn wl_signature(ball: &Ball, iterations: usize) -> Vec<u64> {
    let graph = &ball.graph;
    let mut colors: Vec<u64> = graph
        .node_indices()
        .map(|node| {
            let mut hasher = DefaultHasher::new();
            graph[node].center.hash(&mut hasher);
            graph.neighbors(node).count().hash(&mut hasher);
            hasher.finish()
        })
        .collect();

    for _ in 0..iterations {
        colors = refine_colors(ball, &colors);
    }

    colors.sort_unstable();
    colors
}

fn refine_colors(ball: &Ball, colors: &[u64]) -> Vec<u64> {
    let graph = &ball.graph;
    graph
        .node_indices()
        .map(|node| {
            let mut neighbor_colors: Vec<u64> = graph
                .neighbors(node)
                .map(|neighbor| colors[graph.to_index(neighbor)])
                .collect();
            neighbor_colors.sort_unstable();

            let mut hasher = DefaultHasher::new();
            colors[graph.to_index(node)].hash(&mut hasher);
            neighbor_colors.hash(&mut hasher);
            hasher.finish()
        })
        .collect()
}
