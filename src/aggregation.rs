use std::collections::BTreeMap;

use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::{CoralError, Result};
use crate::model::{
    PointSeries, SeverityMap, SeverityToAverageSSTA, SeverityToSSTAs, YearSummary,
    YearToFrequencyAndSeverity, YearToSeverities,
};
use crate::schema::thresholds;

/// What to do with a year that passes the readings filter but has no
/// reading above the event threshold.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyYearPolicy {
    /// Abort with `EmptySequence`.
    #[default]
    Fail,
    /// Leave the year out of the summary.
    Skip,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AggregationConfig {
    /// Years with this many readings or fewer are dropped.
    pub min_year_readings: usize,
    /// Readings strictly above this count as bleaching events.
    pub event_threshold: f64,
    pub empty_year: EmptyYearPolicy,
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            min_year_readings: thresholds::MIN_YEAR_READINGS,
            event_threshold: thresholds::EVENT_SEVERITY,
            empty_year: EmptyYearPolicy::Fail,
        }
    }
}

// ── Helpers ─────────────────────────────────────────────────────────────────

/// Arithmetic mean. Fails on an empty slice rather than returning NaN.
pub fn mean(values: &[f64]) -> Result<f64> {
    if values.is_empty() {
        return Err(CoralError::empty("no values"));
    }
    Ok(values.iter().sum::<f64>() / values.len() as f64)
}

/// Number of values strictly greater than `threshold`.
pub fn count_above(values: &[f64], threshold: f64) -> usize {
    values.iter().filter(|&&v| v > threshold).count()
}

/// Mean of the values strictly greater than `threshold`.
pub fn mean_above(values: &[f64], threshold: f64) -> Result<f64> {
    let above: Vec<f64> = values.iter().copied().filter(|&v| v > threshold).collect();
    mean(&above)
}

/// Rounds the exact binary value, ties to even (`1.0005` is 1.000499...).
fn round_to(value: f64, places: usize) -> f64 {
    format!("{value:.places$}").parse().unwrap_or(value)
}

/// Re-tags an empty-sequence failure with the key it happened on.
fn with_context<T>(result: Result<T>, context: impl FnOnce() -> String) -> Result<T> {
    match result {
        Err(CoralError::EmptySequence { .. }) => Err(CoralError::empty(context())),
        other => other,
    }
}

// ── Severity / SSTA correlation ─────────────────────────────────────────────

/// Average each severity's SSTA readings, rounded to 3 decimals.
///
/// The key set and its order are carried over unchanged.
pub fn average_sstas(data: &SeverityToSSTAs) -> Result<SeverityToAverageSSTA> {
    let mut averages = SeverityMap::with_capacity(data.len());
    for (severity, sstas) in data.iter() {
        let avg = with_context(mean(sstas), || format!("severity {severity} has no SSTA readings"))?;
        averages.insert(severity, round_to(avg, 3));
    }
    debug!(severities = averages.len(), "averaged SSTA readings");
    Ok(averages)
}

/// Unzip into plot coordinates: average SSTA on x, severity on y.
///
/// Order is the map's iteration order; nothing is sorted.
pub fn to_points(data: &SeverityToAverageSSTA) -> PointSeries {
    let (y, x) = data.iter().map(|(severity, &avg)| (severity, avg)).unzip();
    PointSeries { x, y }
}

// ── Per-year frequency and severity ─────────────────────────────────────────

/// Per-year bleaching frequency and average severity.
///
/// Sparse years (`min_year_readings` or fewer entries) are dropped first.
/// For the rest, frequency counts readings strictly above the event
/// threshold and the average is taken over exactly those readings.
pub fn freq_and_severity(
    data: &YearToSeverities,
    config: &AggregationConfig,
) -> Result<YearToFrequencyAndSeverity> {
    let threshold = config.event_threshold;
    let mut summary = BTreeMap::new();

    for (&year, severities) in data {
        if severities.len() <= config.min_year_readings {
            debug!(year, readings = severities.len(), "dropping sparse year");
            continue;
        }

        let frequency = count_above(severities, threshold);
        let average = with_context(mean_above(severities, threshold), || {
            format!("year {year} has no readings above {threshold}")
        });
        let average_severity = match average {
            Ok(avg) => avg,
            Err(err) if config.empty_year == EmptyYearPolicy::Skip => {
                warn!(year, "skipping year: {err}");
                continue;
            }
            Err(err) => return Err(err),
        };

        summary.insert(
            year,
            YearSummary {
                frequency,
                average_severity,
            },
        );
    }

    debug!(
        years_in = data.len(),
        years_out = summary.len(),
        "aggregated frequency and severity"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mean_is_sum_over_count() {
        assert_eq!(mean(&[2.0, 4.0, 6.0, 8.0]).unwrap(), 5.0);
        assert_eq!(mean(&[105.0, 55.0, 17.0]).unwrap(), 59.0);
        assert_eq!(mean(&[-1.5]).unwrap(), -1.5);
    }

    #[test]
    fn mean_of_nothing_fails() {
        assert!(matches!(mean(&[]), Err(CoralError::EmptySequence { .. })));
    }

    #[test]
    fn threshold_helpers_are_strict() {
        assert_eq!(count_above(&[1.0, 2.5, 3.7, 4.1], 4.0), 1);
        assert_eq!(count_above(&[12.0, 25.0, 89.4], 12.0), 2);
        assert_eq!(mean_above(&[1.0, 0.0, 0.0, 12.0, 11.0], 0.0).unwrap(), 8.0);
        assert!((mean_above(&[6.0, 7.2, 4.8, 3.8], 4.3).unwrap() - 6.0).abs() < 1e-12);
    }

    #[test]
    fn average_sstas_rounds_to_three_places() {
        let data: SeverityToSSTAs = [(1.0, vec![0.1, 0.3, 0.2])].into_iter().collect();
        let averages = average_sstas(&data).unwrap();
        assert_eq!(averages.get(1.0), Some(&0.2));

        let data: SeverityToSSTAs = [(5.0, vec![0.12345, 0.12345])].into_iter().collect();
        assert_eq!(average_sstas(&data).unwrap().get(5.0), Some(&0.123));
    }

    #[test]
    fn average_sstas_rounds_exact_ties_to_even() {
        let data: SeverityToSSTAs = [(1.0, vec![0.0625]), (2.0, vec![1.0005]), (3.0, vec![-0.0625])]
            .into_iter()
            .collect();
        let averages = average_sstas(&data).unwrap();
        assert_eq!(averages.get(1.0), Some(&0.062));
        assert_eq!(averages.get(2.0), Some(&1.0));
        assert_eq!(averages.get(3.0), Some(&-0.062));
    }

    #[test]
    fn average_sstas_preserves_keys_and_order() {
        let data: SeverityToSSTAs = [
            (40.0, vec![1.0, 2.0]),
            (0.0, vec![-0.5]),
            (12.5, vec![0.25, 0.75, 0.5]),
        ]
        .into_iter()
        .collect();
        let averages = average_sstas(&data).unwrap();
        assert_eq!(
            averages.keys().collect::<Vec<_>>(),
            data.keys().collect::<Vec<_>>()
        );
        assert_eq!(averages.values().copied().collect::<Vec<_>>(), vec![1.5, -0.5, 0.5]);
    }

    #[test]
    fn average_sstas_reports_the_empty_key() {
        let data: SeverityToSSTAs = [(1.0, vec![0.5]), (7.0, vec![])].into_iter().collect();
        match average_sstas(&data) {
            Err(CoralError::EmptySequence { context }) => assert!(context.contains('7')),
            other => panic!("expected EmptySequence, got {other:?}"),
        }
    }

    #[test]
    fn to_points_swaps_keys_and_values() {
        let data: SeverityToAverageSSTA = [(1.0, 12.0), (2.0, 15.0)].into_iter().collect();
        let points = to_points(&data);
        assert_eq!(points.x, vec![12.0, 15.0]);
        assert_eq!(points.y, vec![1.0, 2.0]);

        let data: SeverityToAverageSSTA = [(100.4, 52.4), (23.0, 11.0)].into_iter().collect();
        let points = to_points(&data);
        assert_eq!(points.x, vec![52.4, 11.0]);
        assert_eq!(points.y, vec![100.4, 23.0]);
        for (x, y) in points.iter() {
            assert_eq!(data.get(y), Some(&x));
        }
    }

    #[test]
    fn to_points_of_nothing_is_empty() {
        let points = to_points(&SeverityToAverageSSTA::new());
        assert!(points.x.is_empty());
        assert!(points.y.is_empty());
    }

    #[test]
    fn freq_and_severity_counts_positive_readings_only() {
        let mut readings = vec![0.0; 70];
        readings.extend([5.0, 10.0]);
        let data: YearToSeverities = [(2020, readings)].into_iter().collect();

        let summary = freq_and_severity(&data, &AggregationConfig::default()).unwrap();
        assert_eq!(
            summary[&2020],
            YearSummary {
                frequency: 2,
                average_severity: 7.5
            }
        );
    }

    #[test]
    fn freq_and_severity_drops_sparse_years() {
        let data: YearToSeverities = [
            (2001, vec![10.0; 70]),
            (2002, vec![10.0; 71]),
            (2003, vec![3.0; 5]),
        ]
        .into_iter()
        .collect();

        let summary = freq_and_severity(&data, &AggregationConfig::default()).unwrap();
        assert_eq!(summary.keys().copied().collect::<Vec<_>>(), vec![2002]);
        assert_eq!(summary[&2002].frequency, 71);
        assert_eq!(summary[&2002].average_severity, 10.0);
    }

    #[test]
    fn year_without_events_fails_by_default() {
        let data: YearToSeverities = [(2015, vec![0.0; 71])].into_iter().collect();
        match freq_and_severity(&data, &AggregationConfig::default()) {
            Err(CoralError::EmptySequence { context }) => assert!(context.contains("2015")),
            other => panic!("expected EmptySequence, got {other:?}"),
        }
    }

    #[test]
    fn year_without_events_can_be_skipped() {
        let data: YearToSeverities = [(2015, vec![0.0; 71]), (2016, vec![1.0; 71])]
            .into_iter()
            .collect();
        let config = AggregationConfig {
            empty_year: EmptyYearPolicy::Skip,
            ..Default::default()
        };
        let summary = freq_and_severity(&data, &config).unwrap();
        assert!(!summary.contains_key(&2015));
        assert_eq!(summary[&2016].frequency, 71);
    }

    #[test]
    fn custom_readings_floor() {
        let data: YearToSeverities = [(2010, vec![2.0, 0.0, 4.0])].into_iter().collect();
        let config = AggregationConfig {
            min_year_readings: 2,
            ..Default::default()
        };
        let summary = freq_and_severity(&data, &config).unwrap();
        assert_eq!(summary[&2010].frequency, 2);
        assert_eq!(summary[&2010].average_severity, 3.0);
    }
}
