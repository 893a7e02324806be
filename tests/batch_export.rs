use std::fs;

use anyhow::{Context, Result};
use geoadj::export::{write_classification_report, write_degree_histogram, write_geoid_csv};
use geoadj::{
    classify_graph, run_batch, AnalysisConfig, BatchPlan, DataLayout, Geography, GraphLoader,
    NodeProperty, OutputLayout, State,
};

/// 3x3 grid whose center is the only windowpane-like node.
const PANE_GRAPH: &str = r#"{
    "directed": false,
    "multigraph": false,
    "graph": {},
    "nodes": [
        {"id": 0, "GEOID": "500010"}, {"id": 1, "GEOID": "500011"}, {"id": 2, "GEOID": "500012"},
        {"id": 3, "GEOID": "500013"}, {"id": 4, "GEOID": "500014"}, {"id": 5, "GEOID": "500015"},
        {"id": 6, "GEOID": "500016"}, {"id": 7, "GEOID": "500017"}, {"id": 8, "GEOID": "500018"}
    ],
    "adjacency": [
        [{"id": 1}, {"id": 3}],
        [{"id": 0}, {"id": 2}, {"id": 4}],
        [{"id": 1}, {"id": 5}],
        [{"id": 0}, {"id": 4}, {"id": 6}],
        [{"id": 1}, {"id": 3}, {"id": 5}, {"id": 7}],
        [{"id": 2}, {"id": 4}, {"id": 8}],
        [{"id": 3}, {"id": 7}],
        [{"id": 4}, {"id": 6}, {"id": 8}],
        [{"id": 5}, {"id": 7}]
    ]
}"#;

fn write_input(layout: &DataLayout, geography: Geography, state: &str, body: &str) -> Result<()> {
    let path = layout.graph_path(geography, State::lookup(state)?);
    fs::create_dir_all(path.parent().context("graph path has a parent")?)?;
    fs::write(&path, body).with_context(|| format!("write {:?}", path))
}

fn states(keys: &[&str]) -> Result<Vec<&'static State>> {
    keys.iter()
        .map(|key| State::lookup(key).map_err(anyhow::Error::from))
        .collect()
}

#[test]
fn batch_skips_missing_records_failures_and_exports_the_rest() -> Result<()> {
    let data = tempfile::tempdir()?;
    let out = tempfile::tempdir()?;
    let layout = DataLayout::new(data.path());
    let output = OutputLayout::new(out.path());

    write_input(&layout, Geography::County, "VT", PANE_GRAPH)?;
    write_input(&layout, Geography::County, "NH", "{\"nodes\": [")?;

    let plan = BatchPlan::new(layout, states(&["VT", "NH", "ME"])?, vec![Geography::County]);
    let report = run_batch(plan, &GraphLoader::default(), |graph| {
        write_geoid_csv(graph, NodeProperty::Windowpaneish, &output)?;
        write_degree_histogram(graph, &output, &Default::default())?;
        Ok(())
    });

    assert_eq!(report.processed, vec!["VT county".to_string()]);
    assert_eq!(report.skipped, vec!["ME county".to_string()]);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].0, "NH county");
    assert_eq!(report.attempted(), 2);

    let csv = fs::read_to_string(out.path().join("csvs/windowpaneish/vt_county.csv"))?;
    assert_eq!(csv, "500014\n");
    assert!(out.path().join("histograms/degree/vt_county.svg").is_file());
    assert!(!out.path().join("csvs/windowpaneish/nh_county.csv").exists());
    Ok(())
}

#[test]
fn task_errors_do_not_stop_the_batch() -> Result<()> {
    let data = tempfile::tempdir()?;
    let layout = DataLayout::new(data.path());
    write_input(&layout, Geography::Tract, "VT", PANE_GRAPH)?;
    write_input(&layout, Geography::Tract, "RI", PANE_GRAPH)?;

    let mut seen = Vec::new();
    let plan = BatchPlan::new(layout, states(&["VT", "RI"])?, vec![Geography::Tract]);
    let report = run_batch(plan, &GraphLoader::default(), |graph| {
        let state = graph.state_abbrev()?.to_string();
        seen.push(state.clone());
        if state == "vt" {
            anyhow::bail!("refusing {}", state);
        }
        Ok(())
    });

    assert_eq!(seen, vec!["vt", "ri"]);
    assert_eq!(report.processed, vec!["RI tract".to_string()]);
    assert!(report.failed[0].1.contains("refusing vt"));
    Ok(())
}

#[test]
fn config_file_drives_a_classification_run() -> Result<()> {
    let data = tempfile::tempdir()?;
    let out = tempfile::tempdir()?;
    let config_path = data.path().join("geoadj.toml");
    fs::write(
        &config_path,
        format!(
            "data_dir = {:?}\noutput_dir = {:?}\ngeoid_fields = [\"GEOID\"]\n\n[classifier]\nball_size = 9\n",
            data.path().join("graphs"),
            out.path()
        ),
    )?;
    let config = AnalysisConfig::from_path(&config_path)?;
    assert_eq!(config.classifier.ball_size, Some(9));

    let layout = DataLayout::new(&config.data_dir);
    write_input(&layout, Geography::BlockGroup, "VT", PANE_GRAPH)?;
    let output = OutputLayout::new(&config.output_dir);

    let plan = BatchPlan::new(layout, states(&["VT"])?, vec![Geography::BlockGroup]);
    let report = run_batch(plan, &config.loader(), |graph| {
        let summary = classify_graph(graph, &config.classifier)?;
        assert_eq!(summary.classified, 1);
        write_classification_report(graph, &summary, &output)?;
        Ok(())
    });
    assert_eq!(report.processed.len(), 1);

    let report_path = out.path().join("iso_types/vt_blockgroup.json");
    let written: serde_json::Value = serde_json::from_str(&fs::read_to_string(report_path)?)?;
    assert_eq!(written["classes"].as_array().map(Vec::len), Some(1));
    assert_eq!(written["labels"][4]["nbhd_type"], 0);
    assert_eq!(written["labels"][0]["nbhd_type"], serde_json::Value::Null);
    Ok(())
}
