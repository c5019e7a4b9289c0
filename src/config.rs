use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::aggregation::AggregationConfig;
use crate::error::{CoralError, Result};
use crate::loader::LoaderConfig;
use crate::visualization::ChartConfig;

/// Everything a pipeline run needs. Every section may be omitted from the
/// TOML file and falls back to its defaults.
///
/// ```toml
/// data_path = "data/coral_bleaching_data.csv"
/// output_dir = "charts"
///
/// [aggregation]
/// empty_year = "skip"
///
/// [chart]
/// map_first_year = 2005
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub data_path: PathBuf,
    pub output_dir: PathBuf,
    pub loader: LoaderConfig,
    pub aggregation: AggregationConfig,
    pub chart: ChartConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from("data/coral_bleaching_data.csv"),
            output_dir: PathBuf::from("charts"),
            loader: LoaderConfig::default(),
            aggregation: AggregationConfig::default(),
            chart: ChartConfig::default(),
        }
    }
}

impl Config {
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(contents).map_err(|e| CoralError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects values the renderers cannot use. NaN fails every check.
    pub fn validate(&self) -> Result<()> {
        let chart = &self.chart;
        if !(0.0..=1.0).contains(&chart.min_opacity) {
            return Err(CoralError::Config(format!(
                "chart.min_opacity must be within [0, 1], got {}",
                chart.min_opacity
            )));
        }
        if chart.opacity_scale.is_nan() || chart.opacity_scale <= 0.0 {
            return Err(CoralError::Config(format!(
                "chart.opacity_scale must be positive, got {}",
                chart.opacity_scale
            )));
        }
        Ok(())
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
            .map_err(|e| CoralError::Config(format!("{}: {e}", path.display())))
    }
}
