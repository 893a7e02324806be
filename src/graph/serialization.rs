use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use indexmap::IndexMap;
use petgraph::visit::EdgeRef;
use serde_json::Value;

use crate::ball::BallRecord;
use crate::graph::construction::NBHD_TYPE_FIELD;
use crate::graph::model::{AdjacencyGraph, RawAdjacencyGraph, RawNeighbor, RawNode};

/// Helper for exporting graphs back to adjacency JSON compatible with the loader.
///
/// Node ids are written as strings. Graph metadata (geography, state and any
/// class representatives) is merged into the graph-level attribute object.
pub struct GraphWriter;

impl GraphWriter {
    pub fn to_raw_graph(graph: &AdjacencyGraph) -> RawAdjacencyGraph {
        let mut nodes = Vec::with_capacity(graph.node_count());
        let mut adjacency = Vec::with_capacity(graph.node_count());

        for (id, idx) in &graph.node_lookup {
            let attrs = &graph.graph[*idx];
            let mut attributes = attrs.extra.clone();
            if let Some(nbhd_type) = attrs.nbhd_type {
                attributes.insert(NBHD_TYPE_FIELD.to_string(), Value::from(nbhd_type));
            }
            nodes.push(RawNode {
                id: Value::String(id.clone()),
                attributes,
            });

            let neighbors = graph
                .graph
                .edges(*idx)
                .filter_map(|edge| {
                    let other = if edge.source() == *idx {
                        edge.target()
                    } else {
                        edge.source()
                    };
                    let other_id = graph.reverse_lookup.get(&other)?;
                    Some(RawNeighbor {
                        id: Value::String(other_id.clone()),
                        attributes: edge.weight().extra.clone(),
                    })
                })
                .collect();
            adjacency.push(neighbors);
        }

        RawAdjacencyGraph {
            directed: false,
            multigraph: false,
            graph: graph_attributes(graph),
            nodes,
            adjacency,
        }
    }

    pub fn to_json_string(graph: &AdjacencyGraph) -> Result<String> {
        let raw = Self::to_raw_graph(graph);
        Ok(serde_json::to_string(&raw)?)
    }

    pub fn write_to_path(graph: &AdjacencyGraph, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("create graph output directory {:?}", parent))?;
        }
        let file = File::create(path).with_context(|| format!("create graph file {:?}", path))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer(&mut writer, &Self::to_raw_graph(graph))
            .with_context(|| format!("serialize graph to {:?}", path))?;
        writer.flush()?;
        Ok(())
    }
}

fn graph_attributes(graph: &AdjacencyGraph) -> Value {
    let mut map: IndexMap<String, Value> = match &graph.metadata.attributes {
        Value::Object(object) => object
            .iter()
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect(),
        _ => IndexMap::new(),
    };
    if let Some(geography) = graph.metadata.geography {
        map.insert("geog".to_string(), Value::String(geography.to_string()));
    }
    if let Some(state) = &graph.metadata.state_abbrev {
        map.insert("state_abbrev".to_string(), Value::String(state.clone()));
    }
    if !graph.metadata.ball_iso_classes.is_empty() {
        let classes: Vec<BallRecord> = graph
            .metadata
            .ball_iso_classes
            .iter()
            .map(|ball| ball.to_record())
            .collect();
        map.insert(
            "ball_iso_classes".to_string(),
            serde_json::to_value(classes).unwrap_or(Value::Null),
        );
    }
    Value::Object(map.into_iter().collect())
}
