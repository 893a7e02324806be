use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use log::info;
use serde::Serialize;

use crate::ball::BallRecord;
use crate::classify::ClassificationSummary;
use crate::export::{ensure_parent, OutputLayout};
use crate::graph::{AdjacencyGraph, GraphWriter, NodeId};
use crate::regions::Geography;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeLabel {
    pub id: NodeId,
    pub geoid: Option<String>,
    pub nbhd_type: Option<usize>,
}

/// Everything one classification run produced for a graph, as written to
/// `iso_types/{st}_{geog}.json`.
#[derive(Debug, Clone, Serialize)]
pub struct ClassificationReport {
    pub state: String,
    pub geography: Geography,
    pub elapsed_ms: u128,
    pub summary: ClassificationSummary,
    /// One entry per node, in node order.
    pub labels: Vec<NodeLabel>,
    /// Representative ball of each class, indexed by class.
    pub classes: Vec<BallRecord>,
}

impl ClassificationReport {
    pub fn from_graph(graph: &AdjacencyGraph, summary: &ClassificationSummary) -> Result<Self> {
        let labels = graph
            .graph
            .node_indices()
            .map(|node| NodeLabel {
                id: graph.node_id(node).cloned().unwrap_or_default(),
                geoid: graph.graph[node].geoid.clone(),
                nbhd_type: graph.nbhd_type(node),
            })
            .collect();
        Ok(Self {
            state: graph.state_abbrev()?.to_string(),
            geography: graph.geography()?,
            elapsed_ms: summary.duration.as_millis(),
            summary: summary.clone(),
            labels,
            classes: graph
                .metadata
                .ball_iso_classes
                .iter()
                .map(|ball| ball.to_record())
                .collect(),
        })
    }
}

pub fn write_classification_report(
    graph: &AdjacencyGraph,
    summary: &ClassificationSummary,
    layout: &OutputLayout,
) -> Result<PathBuf> {
    let report = ClassificationReport::from_graph(graph, summary)?;
    let path = layout.classification_report(graph)?;
    ensure_parent(&path)?;
    let file = File::create(&path).with_context(|| format!("create report file {:?}", path))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, &report)
        .with_context(|| format!("serialize classification report to {:?}", path))?;
    writer.flush()?;
    info!(
        "Wrote {} classes for {} nodes to {:?}",
        report.classes.len(),
        report.labels.len(),
        path
    );
    Ok(path)
}

/// The graph with its `nbhd_type` labels and class representatives, in the
/// same adjacency JSON the loader reads.
pub fn write_annotated_graph(graph: &AdjacencyGraph, layout: &OutputLayout) -> Result<PathBuf> {
    let path = layout.annotated_graph(graph)?;
    GraphWriter::write_to_path(graph, &path)?;
    info!("Wrote annotated graph to {:?}", path);
    Ok(path)
}
