use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use anyhow::{Context, Result};
use indexmap::IndexMap;
use log::debug;

use crate::error::GeoAdjError;
use crate::graph::model::{
    AdjacencyGraph, EdgeAttributes, GraphMetadata, NodeAttributes, NodeId, RawAdjacencyGraph,
};

pub const DEFAULT_GEOID_FIELDS: [&str; 2] = ["GEOID20", "GEOID"];
pub const NBHD_TYPE_FIELD: &str = "nbhd_type";

/// Turns networkx adjacency JSON into an [`AdjacencyGraph`].
#[derive(Debug, Clone)]
pub struct GraphLoader {
    geoid_fields: Vec<String>,
}

impl Default for GraphLoader {
    fn default() -> Self {
        Self::new(DEFAULT_GEOID_FIELDS.iter().map(|field| field.to_string()).collect())
    }
}

impl GraphLoader {
    /// `geoid_fields` are tried in order; the first present attribute becomes the node's GEOID.
    pub fn new(geoid_fields: Vec<String>) -> Self {
        Self { geoid_fields }
    }

    pub fn geoid_fields(&self) -> &[String] {
        &self.geoid_fields
    }

    pub fn from_json_str(&self, json: &str) -> Result<AdjacencyGraph> {
        let raw: RawAdjacencyGraph =
            serde_json::from_str(json).context("parse adjacency graph json")?;
        self.from_raw_graph(raw)
    }

    pub fn from_reader<R: Read>(&self, reader: R) -> Result<AdjacencyGraph> {
        let raw: RawAdjacencyGraph =
            serde_json::from_reader(reader).context("parse adjacency graph json")?;
        self.from_raw_graph(raw)
    }

    pub fn from_path(&self, path: &Path) -> Result<AdjacencyGraph> {
        let file = File::open(path).with_context(|| format!("open graph file {:?}", path))?;
        self.from_reader(BufReader::new(file))
            .with_context(|| format!("load graph from {:?}", path))
    }

    pub fn from_raw_graph(&self, raw: RawAdjacencyGraph) -> Result<AdjacencyGraph> {
        if raw.adjacency.len() > raw.nodes.len() {
            return Err(GeoAdjError::MalformedGraph(format!(
                "{} adjacency lists for {} nodes",
                raw.adjacency.len(),
                raw.nodes.len()
            ))
            .into());
        }
        if raw.directed || raw.multigraph {
            debug!(
                "Reading {} graph as simple undirected",
                if raw.directed { "directed" } else { "multi" }
            );
        }

        let edge_hint = raw.adjacency.iter().map(Vec::len).sum::<usize>() / 2;
        let mut graph = AdjacencyGraph::with_capacity(raw.nodes.len(), edge_hint);
        let mut order = Vec::with_capacity(raw.nodes.len());

        for raw_node in raw.nodes {
            let id = value_to_id(&raw_node.id);
            if graph.node_lookup.contains_key(&id) {
                return Err(GeoAdjError::MalformedGraph(format!("duplicate node id '{id}'")).into());
            }
            let mut attributes = raw_node.attributes;
            let nbhd_type = extract_nbhd_type(&mut attributes);
            let geoid = self.extract_geoid(&attributes);
            let idx = graph.add_node(
                id,
                NodeAttributes {
                    geoid,
                    nbhd_type,
                    extra: attributes,
                },
            );
            order.push(idx);
        }

        for (position, neighbors) in raw.adjacency.into_iter().enumerate() {
            let source = order[position];
            for neighbor in neighbors {
                let target_id = value_to_id(&neighbor.id);
                let target = graph
                    .resolve(&target_id)
                    .ok_or_else(|| GeoAdjError::UnknownNode(target_id.clone()))
                    .with_context(|| {
                        format!(
                            "adjacency list of node '{}'",
                            graph.node_id(source).map(String::as_str).unwrap_or("?")
                        )
                    })?;
                graph.add_edge(
                    source,
                    target,
                    EdgeAttributes {
                        extra: neighbor.attributes,
                    },
                );
            }
        }

        graph.metadata = GraphMetadata {
            attributes: raw.graph,
            ..GraphMetadata::default()
        };
        Ok(graph)
    }

    fn extract_geoid(&self, attrs: &IndexMap<String, serde_json::Value>) -> Option<String> {
        self.geoid_fields
            .iter()
            .find_map(|field| attrs.get(field).cloned().and_then(value_to_string))
    }
}

/// Stringify a JSON node id; networkx ids are commonly integers or strings.
pub fn value_to_id(value: &serde_json::Value) -> NodeId {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn extract_nbhd_type(attrs: &mut IndexMap<String, serde_json::Value>) -> Option<usize> {
    attrs
        .shift_remove(NBHD_TYPE_FIELD)
        .and_then(|value| match value {
            serde_json::Value::Number(num) => num.as_u64().map(|n| n as usize),
            serde_json::Value::String(s) => s.parse::<usize>().ok(),
            _ => None,
        })
}

fn value_to_string(value: serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) => Some(s),
        serde_json::Value::Number(num) => Some(num.to_string()),
        serde_json::Value::Bool(b) => Some(b.to_string()),
        serde_json::Value::Null => None,
        other => Some(other.to_string()),
    }
}
