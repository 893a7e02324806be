pub mod ball;
pub mod batch;
pub mod classify;
pub mod config;
pub mod datasets;
pub mod error;
pub mod export;
pub mod graph;
pub mod metrics;
pub mod predicates;
pub mod regions;
pub mod wl;

pub use ball::{Ball, BallExtractor, BallRecord, DEFAULT_RADIUS};
pub use batch::{run_batch, BatchEntry, BatchItem, BatchPlan, BatchReport};
pub use classify::{
    classify_graph, ClassificationSummary, ClassifierConfig, ClassifierStats, IsoClassifier,
};
pub use config::{AnalysisConfig, ChartConfig};
pub use datasets::{import_graph_from_path, DataLayout};
pub use error::GeoAdjError;
pub use export::{ClassificationReport, OutputLayout};
pub use graph::{AdjacencyGraph, GraphLoader, GraphWriter, NodeId};
pub use predicates::NodeProperty;
pub use regions::{Geography, State};
