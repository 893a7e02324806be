use thiserror::Error;

/// Recoverable failures raised by graph loading, ball extraction and export.
///
/// Library functions return `anyhow::Result`; these variants travel inside the
/// `anyhow::Error` so callers can `downcast_ref::<GeoAdjError>()` when they need
/// to react to a specific case.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GeoAdjError {
    #[error("node '{0}' not found in graph")]
    UnknownNode(String),

    #[error("unknown state '{0}'")]
    UnknownState(String),

    #[error("unknown geography '{0}'")]
    UnknownGeography(String),

    #[error("unknown node property '{0}'")]
    UnknownProperty(String),

    #[error("node '{0}' has no geographic identifier")]
    MissingGeoid(String),

    #[error("graph has no {0} metadata")]
    MissingMetadata(&'static str),

    #[error("malformed graph: {0}")]
    MalformedGraph(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
