pub mod chart;
pub mod report;
pub mod table;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::graph::AdjacencyGraph;
use crate::predicates::NodeProperty;

pub use chart::{write_clustering_scatter, write_degree_histogram};
pub use report::{write_annotated_graph, write_classification_report, ClassificationReport};
pub use table::{write_degree_table, write_geoid_csv};

const DEFAULT_ROOT: &str = "output";

/// Where each export lands, relative to one output root.
#[derive(Debug, Clone)]
pub struct OutputLayout {
    root: PathBuf,
}

impl Default for OutputLayout {
    fn default() -> Self {
        Self::new(DEFAULT_ROOT)
    }
}

impl OutputLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn degree_histogram(&self, graph: &AdjacencyGraph) -> Result<PathBuf> {
        Ok(self
            .root
            .join("histograms/degree")
            .join(format!("{}.svg", graph.slug()?)))
    }

    pub fn clustering_scatter(&self, graph: &AdjacencyGraph) -> Result<PathBuf> {
        Ok(self
            .root
            .join("scatters/clustering")
            .join(format!("{}.svg", graph.slug()?)))
    }

    pub fn geoid_csv(&self, graph: &AdjacencyGraph, property: NodeProperty) -> Result<PathBuf> {
        Ok(self
            .root
            .join("csvs")
            .join(property.name())
            .join(format!("{}.csv", graph.slug()?)))
    }

    pub fn degree_table(&self, graph: &AdjacencyGraph, property: NodeProperty) -> Result<PathBuf> {
        Ok(self
            .root
            .join("tables")
            .join(property.name())
            .join(format!("{}.csv", graph.slug()?)))
    }

    pub fn classification_report(&self, graph: &AdjacencyGraph) -> Result<PathBuf> {
        Ok(self
            .root
            .join("iso_types")
            .join(format!("{}.json", graph.slug()?)))
    }

    pub fn annotated_graph(&self, graph: &AdjacencyGraph) -> Result<PathBuf> {
        Ok(self
            .root
            .join("graphs")
            .join(format!("{}.json", graph.slug()?)))
    }
}

pub(crate) fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("create output directory {:?}", parent))?;
    }
    Ok(())
}
