use std::path::PathBuf;

use anyhow::Result;
use log::{error, info, warn};

use crate::datasets::{import_graph_from_path, DataLayout};
use crate::graph::{AdjacencyGraph, GraphLoader};
use crate::regions::{Geography, State};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchItem {
    pub state: &'static State,
    pub geography: Geography,
    pub path: PathBuf,
}

impl BatchItem {
    pub fn label(&self) -> String {
        format!("{} {}", self.state.abbr, self.geography)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchEntry {
    Available(BatchItem),
    Missing(BatchItem),
}

/// Lazy state-major walk over every (state, geography) pair.
///
/// File existence is checked when an entry is produced, not up front.
#[derive(Debug, Clone)]
pub struct BatchPlan {
    layout: DataLayout,
    states: Vec<&'static State>,
    geographies: Vec<Geography>,
    position: usize,
}

impl BatchPlan {
    pub fn new(
        layout: DataLayout,
        states: Vec<&'static State>,
        geographies: Vec<Geography>,
    ) -> Self {
        Self {
            layout,
            states,
            geographies,
            position: 0,
        }
    }

    /// Every state in the lookup table crossed with every geography.
    pub fn everything(layout: DataLayout) -> Self {
        Self::new(
            layout,
            State::all().iter().collect(),
            Geography::ALL.to_vec(),
        )
    }

    fn total(&self) -> usize {
        self.states.len() * self.geographies.len()
    }
}

impl Iterator for BatchPlan {
    type Item = BatchEntry;

    fn next(&mut self) -> Option<Self::Item> {
        if self.position >= self.total() {
            return None;
        }
        let state = self.states[self.position / self.geographies.len()];
        let geography = self.geographies[self.position % self.geographies.len()];
        self.position += 1;

        let path = self.layout.graph_path(geography, state);
        let item = BatchItem {
            state,
            geography,
            path,
        };
        Some(if item.path.is_file() {
            BatchEntry::Available(item)
        } else {
            BatchEntry::Missing(item)
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.total().saturating_sub(self.position);
        (remaining, Some(remaining))
    }
}

#[derive(Debug, Default)]
pub struct BatchReport {
    pub processed: Vec<String>,
    pub skipped: Vec<String>,
    pub failed: Vec<(String, String)>,
}

impl BatchReport {
    pub fn attempted(&self) -> usize {
        self.processed.len() + self.failed.len()
    }
}

/// Load each available graph in turn and hand it to `task`.
///
/// Missing files are skipped with a warning. A failing item is logged and
/// recorded; the batch moves on. Each graph is dropped before the next loads.
pub fn run_batch<F>(plan: BatchPlan, loader: &GraphLoader, mut task: F) -> BatchReport
where
    F: FnMut(&mut AdjacencyGraph) -> Result<()>,
{
    let mut report = BatchReport::default();
    for entry in plan {
        match entry {
            BatchEntry::Missing(item) => {
                warn!(
                    "No {} graph for {}, skipping",
                    item.geography, item.state.name
                );
                report.skipped.push(item.label());
            }
            BatchEntry::Available(item) => {
                let label = item.label();
                info!("{}", label);
                let outcome =
                    import_graph_from_path(loader, &item.path, item.geography, item.state)
                        .and_then(|mut graph| task(&mut graph));
                match outcome {
                    Ok(()) => report.processed.push(label),
                    Err(err) => {
                        error!("{}: {:#}", label, err);
                        report.failed.push((label, format!("{:#}", err)));
                    }
                }
            }
        }
    }
    info!(
        "Batch finished: {} processed, {} skipped, {} failed",
        report.processed.len(),
        report.skipped.len(),
        report.failed.len()
    );
    report
}
