//! Coral bleaching analysis: load the observation CSV, aggregate it into
//! correlation, per-year and geographic views, and render each as HTML.

pub mod aggregation;
pub mod config;
pub mod error;
pub mod geo;
pub mod loader;
pub mod model;
pub mod pipeline;
pub mod schema;
pub mod visualization;

pub use aggregation::{
    average_sstas, freq_and_severity, mean, to_points, AggregationConfig, EmptyYearPolicy,
};
pub use config::Config;
pub use error::{CoralError, Result};
pub use geo::normalize_years;
pub use model::{
    GeoTable, PointSeries, SeverityToAverageSSTA, SeverityToSSTAs, YearSummary,
    YearToFrequencyAndSeverity, YearToSeverities,
};
pub use pipeline::View;
