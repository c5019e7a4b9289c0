//! Load → aggregate → render for each of the three views.

use std::path::PathBuf;

use tracing::info;

use crate::aggregation::{average_sstas, freq_and_severity, to_points};
use crate::config::Config;
use crate::error::Result;
use crate::geo::normalize_years;
use crate::loader::{load_geo_table, load_severity_sstas, load_year_severities};
use crate::visualization::{render_correlation, render_freq_and_severity, render_map};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    /// Severity against average SSTA, with a trend line.
    Correlation,
    /// Per-year bleaching frequency and average severity.
    FrequencySeverity,
    /// Bleaching sites on a world map, one year at a time.
    Map,
}

impl View {
    pub const ALL: [View; 3] = [View::Correlation, View::FrequencySeverity, View::Map];

    pub fn file_stem(&self) -> &'static str {
        match self {
            View::Correlation => "correlation",
            View::FrequencySeverity => "freq_severity",
            View::Map => "map",
        }
    }
}

/// Produce the HTML for one view without touching the output directory.
pub fn render_view(view: View, config: &Config) -> Result<String> {
    let path = config.data_path.as_path();
    match view {
        View::Correlation => {
            let raw = load_severity_sstas(path, &config.loader)?;
            let averages = average_sstas(&raw)?;
            render_correlation(&to_points(&averages), &config.chart)
        }
        View::FrequencySeverity => {
            let raw = load_year_severities(path, &config.loader)?;
            let summary = freq_and_severity(&raw, &config.aggregation)?;
            render_freq_and_severity(&summary, &config.chart)
        }
        View::Map => {
            let table = load_geo_table(path, &config.loader)?;
            let normalized = normalize_years(&table)?;
            render_map(&normalized, config.aggregation.event_threshold, &config.chart)
        }
    }
}

/// Render one view and write it to `<output_dir>/<view>.html`.
///
/// Nothing is written if any stage fails.
pub fn run(view: View, config: &Config) -> Result<PathBuf> {
    let html = render_view(view, config)?;
    std::fs::create_dir_all(&config.output_dir)?;
    let out = config
        .output_dir
        .join(format!("{}.html", view.file_stem()));
    std::fs::write(&out, html)?;
    info!(view = view.file_stem(), path = %out.display(), "chart written");
    Ok(out)
}

/// Every view in order; stops at the first failure.
pub fn run_all(config: &Config) -> Result<Vec<PathBuf>> {
    View::ALL.iter().map(|&view| run(view, config)).collect()
}
