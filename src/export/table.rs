use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::info;

use crate::export::{ensure_parent, OutputLayout};
use crate::graph::AdjacencyGraph;
use crate::predicates::{list_nodes, NodeProperty};
use crate::regions::State;

/// One GEOID per row for every node satisfying `property`.
pub fn write_geoid_csv(
    graph: &AdjacencyGraph,
    property: NodeProperty,
    layout: &OutputLayout,
) -> Result<PathBuf> {
    let rows = list_nodes(graph, property)
        .into_iter()
        .map(|node| -> Result<Vec<String>> { Ok(vec![graph.geoid(node)?.to_string()]) })
        .collect::<Result<Vec<_>>>()?;
    let path = layout.geoid_csv(graph, property)?;
    write_rows(&path, None, &rows)?;
    info!("Wrote {} {} GEOIDs to {:?}", rows.len(), property, path);
    Ok(path)
}

/// `GEOID,degree` rows for every node satisfying `property`; the attribute
/// table to join onto the matching geometry layer.
pub fn write_degree_table(
    graph: &AdjacencyGraph,
    property: NodeProperty,
    layout: &OutputLayout,
) -> Result<PathBuf> {
    let rows = list_nodes(graph, property)
        .into_iter()
        .map(|node| -> Result<Vec<String>> {
            Ok(vec![
                graph.geoid(node)?.to_string(),
                graph.degree(node).to_string(),
            ])
        })
        .collect::<Result<Vec<_>>>()?;
    let path = layout.degree_table(graph, property)?;
    write_rows(&path, Some(&["GEOID", "degree"][..]), &rows)?;
    let layer = graph
        .geography()?
        .shapefile_stem(State::lookup(graph.state_abbrev()?)?);
    info!(
        "Wrote {} {} rows to {:?} (joins on GEOID with {})",
        rows.len(),
        property,
        path,
        layer
    );
    Ok(path)
}

fn write_rows(path: &Path, header: Option<&[&str]>, rows: &[Vec<String>]) -> Result<()> {
    ensure_parent(path)?;
    let file = File::create(path).with_context(|| format!("create csv file {:?}", path))?;
    let mut writer = BufWriter::new(file);
    if let Some(header) = header {
        write_record(&mut writer, header.iter().copied())?;
    }
    for row in rows {
        write_record(&mut writer, row.iter().map(String::as_str))?;
    }
    writer
        .flush()
        .with_context(|| format!("flush csv file {:?}", path))
}

fn write_record<'a, W: Write>(writer: &mut W, fields: impl Iterator<Item = &'a str>) -> Result<()> {
    let line: Vec<String> = fields.map(escape_field).collect();
    writeln!(writer, "{}", line.join(","))?;
    Ok(())
}

fn escape_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GeoAdjError;
    use crate::graph::{EdgeAttributes, NodeAttributes};
    use crate::regions::Geography;

    fn pane_graph(with_geoids: bool) -> AdjacencyGraph {
        let mut graph = AdjacencyGraph::new();
        let idx: Vec<_> = (0..9)
            .map(|i| {
                let attrs = NodeAttributes {
                    geoid: with_geoids.then(|| format!("44007{i:04}")),
                    ..NodeAttributes::default()
                };
                graph.add_node(i.to_string(), attrs)
            })
            .collect();
        for r in 0..3 {
            for c in 0..3 {
                let here = r * 3 + c;
                if c < 2 {
                    graph.add_edge(idx[here], idx[here + 1], EdgeAttributes::default());
                }
                if r < 2 {
                    graph.add_edge(idx[here], idx[here + 3], EdgeAttributes::default());
                }
            }
        }
        graph.metadata.state_abbrev = Some("ri".to_string());
        graph.metadata.geography = Some(Geography::Tract);
        graph
    }

    #[test]
    fn geoid_csv_lists_matching_nodes() {
        let dir = tempfile::tempdir().expect("tempdir");
        let layout = OutputLayout::new(dir.path());
        let path = write_geoid_csv(&pane_graph(true), NodeProperty::Windowpaneish, &layout)
            .expect("write csv");
        assert!(path.ends_with("csvs/windowpaneish/ri_tract.csv"));
        assert_eq!(std::fs::read_to_string(path).unwrap(), "440070004\n");
    }

    #[test]
    fn degree_table_has_header_and_degrees() {
        let dir = tempfile::tempdir().expect("tempdir");
        let layout = OutputLayout::new(dir.path());
        let path = write_degree_table(&pane_graph(true), NodeProperty::Windowpaneish, &layout)
            .expect("write table");
        assert_eq!(
            std::fs::read_to_string(path).unwrap(),
            "GEOID,degree\n440070004,4\n"
        );
    }

    #[test]
    fn missing_geoid_fails_the_export() {
        let dir = tempfile::tempdir().expect("tempdir");
        let layout = OutputLayout::new(dir.path());
        let err = write_geoid_csv(&pane_graph(false), NodeProperty::Windowpaneish, &layout)
            .unwrap_err();
        assert_eq!(
            err.downcast_ref::<GeoAdjError>(),
            Some(&GeoAdjError::MissingGeoid("4".to_string()))
        );
    }

    #[test]
    fn fields_with_separators_are_quoted() {
        assert_eq!(escape_field("plain"), "plain");
        assert_eq!(escape_field("a,b"), "\"a,b\"");
        assert_eq!(escape_field("say \"hi\""), "\"say \"\"hi\"\"\"");
    }
}
