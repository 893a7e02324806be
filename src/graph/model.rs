use indexmap::IndexMap;
use petgraph::graph::{NodeIndex, UnGraph};
use serde::{Deserialize, Serialize};

use crate::ball::Ball;
use crate::error::GeoAdjError;
use crate::regions::Geography;

pub type NodeId = String;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeAttributes {
    /// Geographic identifier, copied out of the first configured GEOID field.
    pub geoid: Option<String>,
    /// Neighbourhood isomorphism class assigned by the classifier.
    pub nbhd_type: Option<usize>,
    pub extra: IndexMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EdgeAttributes {
    pub extra: IndexMap<String, serde_json::Value>,
}

/// networkx `adjacency_data` layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawAdjacencyGraph {
    #[serde(default)]
    pub directed: bool,
    #[serde(default)]
    pub multigraph: bool,
    #[serde(default)]
    pub graph: serde_json::Value,
    pub nodes: Vec<RawNode>,
    pub adjacency: Vec<Vec<RawNeighbor>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawNode {
    pub id: serde_json::Value,
    #[serde(flatten)]
    pub attributes: IndexMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawNeighbor {
    pub id: serde_json::Value,
    #[serde(flatten)]
    pub attributes: IndexMap<String, serde_json::Value>,
}

pub type LabeledGraph = UnGraph<NodeAttributes, EdgeAttributes>;

#[derive(Debug, Clone, Default)]
pub struct GraphMetadata {
    pub geography: Option<Geography>,
    pub state_abbrev: Option<String>,
    /// Graph-level attributes from the source file, kept verbatim.
    pub attributes: serde_json::Value,
    /// Class representatives in discovery order; index = `nbhd_type`.
    pub ball_iso_classes: Vec<Ball>,
}

/// Undirected simple adjacency graph keyed by the source file's node ids.
#[derive(Debug, Clone, Default)]
pub struct AdjacencyGraph {
    pub graph: LabeledGraph,
    pub node_lookup: IndexMap<NodeId, NodeIndex>,
    pub reverse_lookup: IndexMap<NodeIndex, NodeId>,
    pub metadata: GraphMetadata,
}

impl AdjacencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(nodes: usize, edges: usize) -> Self {
        Self {
            graph: LabeledGraph::with_capacity(nodes, edges),
            node_lookup: IndexMap::with_capacity(nodes),
            reverse_lookup: IndexMap::with_capacity(nodes),
            metadata: GraphMetadata::default(),
        }
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Insert a node, or return the existing index if the id is already present.
    pub fn add_node(&mut self, id: impl Into<NodeId>, attributes: NodeAttributes) -> NodeIndex {
        let id = id.into();
        if let Some(idx) = self.node_lookup.get(&id) {
            return *idx;
        }
        let idx = self.graph.add_node(attributes);
        self.node_lookup.insert(id.clone(), idx);
        self.reverse_lookup.insert(idx, id);
        idx
    }

    /// Add an undirected edge. Self-loops and repeated edges are ignored;
    /// returns whether a new edge was inserted.
    pub fn add_edge(&mut self, a: NodeIndex, b: NodeIndex, attributes: EdgeAttributes) -> bool {
        if a == b || self.graph.find_edge(a, b).is_some() {
            return false;
        }
        self.graph.add_edge(a, b, attributes);
        true
    }

    pub fn resolve(&self, id: &str) -> Option<NodeIndex> {
        self.node_lookup.get(id).copied()
    }

    pub fn node_id(&self, idx: NodeIndex) -> Option<&NodeId> {
        self.reverse_lookup.get(&idx)
    }

    pub fn degree(&self, idx: NodeIndex) -> usize {
        self.graph.neighbors(idx).count()
    }

    pub fn nbhd_type(&self, idx: NodeIndex) -> Option<usize> {
        self.graph.node_weight(idx).and_then(|attrs| attrs.nbhd_type)
    }

    pub fn geoid(&self, idx: NodeIndex) -> Result<&str, GeoAdjError> {
        self.graph
            .node_weight(idx)
            .and_then(|attrs| attrs.geoid.as_deref())
            .ok_or_else(|| {
                let id = self
                    .node_id(idx)
                    .cloned()
                    .unwrap_or_else(|| idx.index().to_string());
                GeoAdjError::MissingGeoid(id)
            })
    }

    pub fn geography(&self) -> Result<Geography, GeoAdjError> {
        self.metadata
            .geography
            .ok_or(GeoAdjError::MissingMetadata("geography"))
    }

    pub fn state_abbrev(&self) -> Result<&str, GeoAdjError> {
        self.metadata
            .state_abbrev
            .as_deref()
            .ok_or(GeoAdjError::MissingMetadata("state"))
    }

    /// `{state}_{geography}`, the stem shared by every output file of this graph.
    pub fn slug(&self) -> Result<String, GeoAdjError> {
        Ok(format!("{}_{}", self.state_abbrev()?, self.geography()?))
    }

    /// Drop every `nbhd_type` label and any stored class representatives.
    pub fn clear_classification(&mut self) {
        for attrs in self.graph.node_weights_mut() {
            attrs.nbhd_type = None;
        }
        self.metadata.ball_iso_classes.clear();
    }
}
