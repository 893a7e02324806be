use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use anyhow::Result;
use log::{debug, info, trace};
use petgraph::graph::NodeIndex;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::ball::{Ball, BallExtractor, DEFAULT_RADIUS};
use crate::error::GeoAdjError;
use crate::graph::AdjacencyGraph;
use crate::wl::wl_signature;

/// Number of nodes whose balls are extracted in parallel before being classified.
const EXTRACTION_CHUNK: usize = 4096;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    pub radius: usize,
    /// Only balls with exactly this many nodes are classified; `None` accepts all.
    pub ball_size: Option<usize>,
    pub wl_iterations: usize,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            radius: DEFAULT_RADIUS,
            ball_size: Some(15),
            wl_iterations: 3,
        }
    }
}

impl ClassifierConfig {
    pub fn validate(&self) -> Result<(), GeoAdjError> {
        if self.radius == 0 {
            return Err(GeoAdjError::InvalidConfig(
                "classifier radius must be at least 1".to_string(),
            ));
        }
        if self.ball_size == Some(0) {
            return Err(GeoAdjError::InvalidConfig(
                "classifier ball_size must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn accepts(&self, ball: &Ball) -> bool {
        self.ball_size.map_or(true, |size| ball.node_count() == size)
    }
}

/// Isomorphism invariants of a ball. Unequal invariants rule out an isomorphism.
#[derive(Debug, Clone, PartialEq, Eq)]
struct BallInvariants {
    edge_count: usize,
    center_degree: usize,
    degrees: Vec<usize>,
    wl: Vec<u64>,
}

impl BallInvariants {
    fn compute(ball: &Ball, wl_iterations: usize) -> Self {
        let mut degrees: Vec<usize> = ball
            .graph
            .node_indices()
            .map(|node| ball.degree(node))
            .collect();
        degrees.sort_unstable();
        Self {
            edge_count: ball.edge_count(),
            center_degree: ball.degree(ball.center),
            degrees,
            wl: wl_signature(ball, wl_iterations),
        }
    }
}

#[derive(Debug, Clone)]
pub struct IsoClass {
    pub representative: Ball,
    pub members: usize,
    invariants: BallInvariants,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ClassifierStats {
    pub iso_tests: usize,
    pub invariant_rejects: usize,
}

/// Growing, ordered set of ball isomorphism classes.
///
/// Classes are only appended; index `i` always refers to the `i`-th ball that
/// matched no earlier class.
#[derive(Debug, Clone)]
pub struct IsoClassifier {
    config: ClassifierConfig,
    classes: Vec<IsoClass>,
    stats: ClassifierStats,
}

impl IsoClassifier {
    pub fn new(config: ClassifierConfig) -> Self {
        Self {
            config,
            classes: Vec::new(),
            stats: ClassifierStats::default(),
        }
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    pub fn classes(&self) -> &[IsoClass] {
        &self.classes
    }

    pub fn stats(&self) -> ClassifierStats {
        self.stats
    }

    /// Index of the first class isomorphic to `ball`, appending a new class if none is.
    pub fn assign(&mut self, ball: Ball) -> usize {
        let invariants = BallInvariants::compute(&ball, self.config.wl_iterations);
        for (idx, class) in self.classes.iter_mut().enumerate() {
            if class.invariants != invariants {
                self.stats.invariant_rejects += 1;
                trace!(
                    "Ball of {} differs from class {} by invariants",
                    ball.center_id(),
                    idx
                );
                continue;
            }
            self.stats.iso_tests += 1;
            if class.representative.is_isomorphic(&ball) {
                class.members += 1;
                return idx;
            }
        }

        let idx = self.classes.len();
        debug!(
            "New neighbourhood class {} from node {} (|V|={}, |E|={})",
            idx,
            ball.center_id(),
            ball.node_count(),
            ball.edge_count()
        );
        self.classes.push(IsoClass {
            representative: ball,
            members: 1,
            invariants,
        });
        idx
    }

    pub fn into_representatives(self) -> Vec<Ball> {
        self.classes
            .into_iter()
            .map(|class| class.representative)
            .collect()
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ClassificationSummary {
    pub visited: usize,
    pub classified: usize,
    pub skipped: usize,
    pub class_count: usize,
    /// Members per class, indexed by class.
    pub class_sizes: Vec<usize>,
    /// Ball size -> number of nodes whose ball had that size.
    pub ball_sizes: BTreeMap<usize, usize>,
    pub stats: ClassifierStats,
    #[serde(skip)]
    pub duration: Duration,
}

/// Label every qualifying node of `graph` with its neighbourhood class.
///
/// Nodes are visited in index order. Existing labels are cleared first and the
/// class representatives are stored in the graph metadata afterwards.
pub fn classify_graph(
    graph: &mut AdjacencyGraph,
    config: &ClassifierConfig,
) -> Result<ClassificationSummary> {
    config.validate()?;
    let start = Instant::now();
    graph.clear_classification();

    let nodes: Vec<NodeIndex> = graph.graph.node_indices().collect();
    let mut classifier = IsoClassifier::new(config.clone());
    let mut summary = ClassificationSummary::default();

    for chunk in nodes.chunks(EXTRACTION_CHUNK) {
        let balls: Vec<Ball> = {
            let source = &*graph;
            chunk
                .par_iter()
                .map(|&node| BallExtractor::extract(source, node, config.radius))
                .collect::<Result<_>>()?
        };

        for (&node, ball) in chunk.iter().zip(balls) {
            summary.visited += 1;
            *summary.ball_sizes.entry(ball.node_count()).or_insert(0) += 1;
            if !config.accepts(&ball) {
                summary.skipped += 1;
                continue;
            }
            let idx = classifier.assign(ball);
            graph.graph[node].nbhd_type = Some(idx);
            summary.classified += 1;
        }
    }

    summary.class_count = classifier.classes().len();
    summary.class_sizes = classifier.classes().iter().map(|class| class.members).collect();
    summary.stats = classifier.stats();
    graph.metadata.ball_iso_classes = classifier.into_representatives();
    summary.duration = start.elapsed();

    info!(
        "Classified {} of {} nodes into {} classes ({} skipped, {} iso tests, {} invariant rejects) in {:?}",
        summary.classified,
        summary.visited,
        summary.class_count,
        summary.skipped,
        summary.stats.iso_tests,
        summary.stats.invariant_rejects,
        summary.duration
    );
    Ok(summary)
}
