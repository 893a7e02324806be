use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::graph::{AdjacencyGraph, GraphLoader};
use crate::regions::{Geography, State};

const DEFAULT_ROOT: &str = "data";

/// Location of the per-state adjacency graphs:
/// `{root}/{geography}_graphs/{graph_code}_{state}.json`.
#[derive(Debug, Clone)]
pub struct DataLayout {
    root: PathBuf,
}

impl Default for DataLayout {
    fn default() -> Self {
        Self::new(DEFAULT_ROOT)
    }
}

impl DataLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn graph_path(&self, geography: Geography, state: &State) -> PathBuf {
        self.root
            .join(format!("{}_graphs", geography.name()))
            .join(format!(
                "{}_{}.json",
                geography.graph_code(),
                state.abbr_lower()
            ))
    }

    pub fn import_graph(
        &self,
        loader: &GraphLoader,
        geography: Geography,
        state: &State,
    ) -> Result<AdjacencyGraph> {
        let path = self.graph_path(geography, state);
        import_graph_from_path(loader, &path, geography, state)
    }
}

/// Load a graph file and record which geography and state it describes.
pub fn import_graph_from_path(
    loader: &GraphLoader,
    path: &Path,
    geography: Geography,
    state: &State,
) -> Result<AdjacencyGraph> {
    let mut graph = loader
        .from_path(path)
        .with_context(|| format!("import {} {} graph", state.abbr, geography))?;
    graph.metadata.geography = Some(geography);
    graph.metadata.state_abbrev = Some(state.abbr_lower());
    Ok(graph)
}
