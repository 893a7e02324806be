use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::classify::ClassifierConfig;
use crate::error::GeoAdjError;
use crate::graph::construction::DEFAULT_GEOID_FIELDS;
use crate::graph::GraphLoader;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ChartConfig {
    pub width: u32,
    pub height: u32,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            width: 1500,
            height: 480,
        }
    }
}

/// Settings shared by every command. Every field has a default, so a TOML file
/// only needs the keys it changes.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub data_dir: PathBuf,
    pub output_dir: PathBuf,
    pub geoid_fields: Vec<String>,
    pub classifier: ClassifierConfig,
    pub chart: ChartConfig,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            output_dir: PathBuf::from("output"),
            geoid_fields: DEFAULT_GEOID_FIELDS.iter().map(|f| f.to_string()).collect(),
            classifier: ClassifierConfig::default(),
            chart: ChartConfig::default(),
        }
    }
}

impl AnalysisConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text).context("parse analysis config")?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let text =
            fs::read_to_string(path).with_context(|| format!("read config file {:?}", path))?;
        Self::from_toml_str(&text).with_context(|| format!("load config from {:?}", path))
    }

    pub fn validate(&self) -> Result<(), GeoAdjError> {
        if self.geoid_fields.is_empty() {
            return Err(GeoAdjError::InvalidConfig(
                "geoid_fields must name at least one attribute".to_string(),
            ));
        }
        if self.chart.width == 0 || self.chart.height == 0 {
            return Err(GeoAdjError::InvalidConfig(
                "chart dimensions must be positive".to_string(),
            ));
        }
        self.classifier.validate()
    }

    pub fn loader(&self) -> GraphLoader {
        GraphLoader::new(self.geoid_fields.clone())
    }
}
