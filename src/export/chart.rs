use std::fmt::Write as _;
use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use log::info;

use crate::config::ChartConfig;
use crate::export::{ensure_parent, OutputLayout};
use crate::graph::AdjacencyGraph;
use crate::metrics::{clustering_by_degree, degree_histogram};

const MARGIN_LEFT: f64 = 70.0;
const MARGIN_RIGHT: f64 = 20.0;
const MARGIN_TOP: f64 = 40.0;
const MARGIN_BOTTOM: f64 = 60.0;
const Y_TICKS: usize = 5;
const BAR_WIDTH: f64 = 0.8;

/// Data-to-pixel mapping for one chart.
struct Frame {
    width: f64,
    height: f64,
    x_min: f64,
    x_max: f64,
    y_max: f64,
}

impl Frame {
    fn new(config: &ChartConfig, xs: impl Iterator<Item = f64> + Clone, y_max: f64) -> Self {
        let lo = xs.clone().fold(f64::INFINITY, f64::min);
        let hi = xs.fold(f64::NEG_INFINITY, f64::max);
        let (x_min, x_max) = if lo.is_finite() && hi.is_finite() {
            (lo - 1.0, hi + 1.0)
        } else {
            (0.0, 1.0)
        };
        Self {
            width: f64::from(config.width),
            height: f64::from(config.height),
            x_min,
            x_max,
            y_max: if y_max > 0.0 { y_max } else { 1.0 },
        }
    }

    fn inner_width(&self) -> f64 {
        (self.width - MARGIN_LEFT - MARGIN_RIGHT).max(1.0)
    }

    fn inner_height(&self) -> f64 {
        (self.height - MARGIN_TOP - MARGIN_BOTTOM).max(1.0)
    }

    fn x(&self, value: f64) -> f64 {
        MARGIN_LEFT + (value - self.x_min) / (self.x_max - self.x_min) * self.inner_width()
    }

    fn y(&self, value: f64) -> f64 {
        self.height - MARGIN_BOTTOM - value / self.y_max * self.inner_height()
    }

    fn x_scale(&self) -> f64 {
        self.inner_width() / (self.x_max - self.x_min)
    }

    fn open(&self, out: &mut String, title: &str, x_label: &str, y_label: &str) -> Result<()> {
        let (w, h) = (self.width, self.height);
        writeln!(
            out,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}" font-family="sans-serif" font-size="12">"#
        )?;
        writeln!(out, r#"<rect width="{w}" height="{h}" fill="white"/>"#)?;
        writeln!(
            out,
            r#"<text x="{}" y="{}" text-anchor="middle" font-size="16">{}</text>"#,
            w / 2.0,
            MARGIN_TOP / 2.0 + 6.0,
            escape(title)
        )?;
        let (left, bottom) = (MARGIN_LEFT, h - MARGIN_BOTTOM);
        writeln!(
            out,
            r#"<path d="M{left} {top} L{left} {bottom} L{right} {bottom}" stroke="black" fill="none"/>"#,
            top = MARGIN_TOP,
            right = w - MARGIN_RIGHT
        )?;
        for tick in 0..=Y_TICKS {
            let value = self.y_max * tick as f64 / Y_TICKS as f64;
            let y = self.y(value);
            writeln!(
                out,
                r#"<text x="{}" y="{}" text-anchor="end">{}</text>"#,
                left - 6.0,
                y + 4.0,
                format_tick(value)
            )?;
        }
        writeln!(
            out,
            r#"<text x="{}" y="{}" text-anchor="middle">{}</text>"#,
            left + self.inner_width() / 2.0,
            h - 15.0,
            escape(x_label)
        )?;
        writeln!(
            out,
            r#"<text x="18" y="{y}" text-anchor="middle" transform="rotate(-90 18 {y})">{}</text>"#,
            escape(y_label),
            y = MARGIN_TOP + self.inner_height() / 2.0
        )?;
        Ok(())
    }

    fn x_ticks(&self, out: &mut String, ticks: impl Iterator<Item = usize>) -> Result<()> {
        let baseline = self.height - MARGIN_BOTTOM;
        for tick in ticks {
            writeln!(
                out,
                r#"<text x="{}" y="{}" text-anchor="middle">{}</text>"#,
                self.x(tick as f64),
                baseline + 16.0,
                tick
            )?;
        }
        Ok(())
    }
}

fn format_tick(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        format!("{:.2}", value)
    }
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn chart_title(graph: &AdjacencyGraph, what: &str) -> Result<String> {
    Ok(format!(
        "{} {} {}",
        graph.state_abbrev()?.to_ascii_uppercase(),
        graph.geography()?.title(),
        what
    ))
}

/// Bar chart of node count per degree.
pub fn degree_histogram_svg(graph: &AdjacencyGraph, config: &ChartConfig) -> Result<String> {
    let histogram = degree_histogram(graph);
    let y_max = histogram.values().copied().max().unwrap_or(0) as f64;
    let frame = Frame::new(config, histogram.keys().map(|&d| d as f64), y_max);

    let mut out = String::new();
    frame.open(
        &mut out,
        &chart_title(graph, "Degree Histogram")?,
        "Degree",
        "Count",
    )?;
    let bar_width = BAR_WIDTH * frame.x_scale();
    let baseline = frame.y(0.0);
    for (&degree, &count) in &histogram {
        let top = frame.y(count as f64);
        writeln!(
            out,
            r#"<rect x="{:.2}" y="{:.2}" width="{:.2}" height="{:.2}" fill="blue"/>"#,
            frame.x(degree as f64) - bar_width / 2.0,
            top,
            bar_width,
            baseline - top
        )?;
    }
    frame.x_ticks(&mut out, histogram.keys().copied())?;
    out.push_str("</svg>\n");
    Ok(out)
}

/// Scatter of `clustering * (degree - 1) / 2` against degree, one point per node.
pub fn clustering_scatter_svg(graph: &AdjacencyGraph, config: &ChartConfig) -> Result<String> {
    let points = clustering_by_degree(graph);
    let y_max = points.iter().map(|&(_, y)| y).fold(0.0, f64::max);
    let frame = Frame::new(config, points.iter().map(|&(d, _)| d as f64), y_max);

    let mut out = String::new();
    frame.open(
        &mut out,
        &chart_title(graph, "Clustering By Degree")?,
        "Degree",
        "Clustering Coefficient",
    )?;
    for &(degree, value) in &points {
        writeln!(
            out,
            r#"<circle cx="{:.2}" cy="{:.2}" r="2.5" fill="steelblue"/>"#,
            frame.x(degree as f64),
            frame.y(value)
        )?;
    }
    let histogram = degree_histogram(graph);
    frame.x_ticks(&mut out, histogram.keys().copied())?;
    out.push_str("</svg>\n");
    Ok(out)
}

pub fn write_degree_histogram(
    graph: &AdjacencyGraph,
    layout: &OutputLayout,
    config: &ChartConfig,
) -> Result<PathBuf> {
    let path = layout.degree_histogram(graph)?;
    write_svg(&path, &degree_histogram_svg(graph, config)?)?;
    info!("Wrote degree histogram to {:?}", path);
    Ok(path)
}

pub fn write_clustering_scatter(
    graph: &AdjacencyGraph,
    layout: &OutputLayout,
    config: &ChartConfig,
) -> Result<PathBuf> {
    let path = layout.clustering_scatter(graph)?;
    write_svg(&path, &clustering_scatter_svg(graph, config)?)?;
    info!("Wrote clustering scatter to {:?}", path);
    Ok(path)
}

fn write_svg(path: &std::path::Path, svg: &str) -> Result<()> {
    ensure_parent(path)?;
    fs::write(path, svg).with_context(|| format!("write chart {:?}", path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{EdgeAttributes, NodeAttributes};
    use crate::regions::Geography;

    fn star(leaves: usize) -> AdjacencyGraph {
        let mut graph = AdjacencyGraph::new();
        let hub = graph.add_node("hub", NodeAttributes::default());
        for i in 0..leaves {
            let leaf = graph.add_node(format!("leaf{i}"), NodeAttributes::default());
            graph.add_edge(hub, leaf, EdgeAttributes::default());
        }
        graph.metadata.state_abbrev = Some("me".to_string());
        graph.metadata.geography = Some(Geography::County);
        graph
    }

    #[test]
    fn histogram_has_one_bar_per_degree() {
        let svg = degree_histogram_svg(&star(4), &ChartConfig::default()).expect("render");
        assert!(svg.starts_with("<svg"));
        assert!(svg.trim_end().ends_with("</svg>"));
        assert!(svg.contains("ME County Degree Histogram"));
        assert_eq!(svg.matches(r#"fill="blue""#).count(), 2);
    }

    #[test]
    fn scatter_has_one_point_per_node() {
        let svg = clustering_scatter_svg(&star(4), &ChartConfig::default()).expect("render");
        assert!(svg.contains("ME County Clustering By Degree"));
        assert_eq!(svg.matches("<circle").count(), 5);
    }

    #[test]
    fn charts_are_written_under_the_output_root() {
        let dir = tempfile::tempdir().expect("tempdir");
        let layout = OutputLayout::new(dir.path());
        let graph = star(3);
        let histogram = write_degree_histogram(&graph, &layout, &ChartConfig::default())
            .expect("write histogram");
        let scatter = write_clustering_scatter(&graph, &layout, &ChartConfig::default())
            .expect("write scatter");
        assert!(histogram.ends_with("histograms/degree/me_county.svg"));
        assert!(scatter.ends_with("scatters/clustering/me_county.svg"));
        assert!(histogram.is_file() && scatter.is_file());
    }

    #[test]
    fn empty_graph_still_renders() {
        let mut graph = AdjacencyGraph::new();
        graph.metadata.state_abbrev = Some("me".to_string());
        graph.metadata.geography = Some(Geography::Tract);
        let svg = degree_histogram_svg(&graph, &ChartConfig::default()).expect("render");
        assert!(!svg.contains("NaN"));
    }
}
