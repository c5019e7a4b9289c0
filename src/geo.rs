//! Geographic table transforms feeding the bleaching map.

use polars::prelude::*;
use tracing::debug;

use crate::error::Result;
use crate::model::{BleachingSite, GeoTable};
use crate::schema::geo;

/// Replace yyyymmdd dates with their year (`floor(date / 10000)`).
///
/// Returns a new table; the input is left as it was. Row order and every
/// other column are carried over unchanged.
pub fn normalize_years(table: &GeoTable) -> Result<GeoTable> {
    let years: Vec<Option<i64>> = table
        .dates()?
        .into_iter()
        .map(|date| date.map(|d| d.div_euclid(10_000)))
        .collect();

    let mut df = table.frame().clone();
    df.with_column(Series::new(geo::DATE.into(), years))?;
    debug!(rows = df.height(), "normalized dates to years");
    GeoTable::new(df)
}

/// Observations in `year` with severity strictly above `threshold`, least
/// severe first so the worst site at a shared coordinate is drawn on top.
pub fn bleaching_sites(table: &GeoTable, year: i64, threshold: f64) -> Result<Vec<BleachingSite>> {
    let subset = table
        .frame()
        .clone()
        .lazy()
        .filter(
            col(geo::DATE)
                .eq(lit(year))
                .and(col(geo::SEVERITY).gt(lit(threshold))),
        )
        .collect()?;

    let latitudes = subset.column(geo::LATITUDE)?.f64()?;
    let longitudes = subset.column(geo::LONGITUDE)?.f64()?;
    let severities = subset.column(geo::SEVERITY)?.f64()?;

    let mut sites: Vec<BleachingSite> = latitudes
        .into_iter()
        .zip(longitudes)
        .zip(severities)
        .filter_map(|((lat, lon), sev)| {
            Some(BleachingSite {
                latitude: lat?,
                longitude: lon?,
                severity: sev?,
            })
        })
        .collect();
    sites.sort_by(|a, b| a.severity.total_cmp(&b.severity));
    Ok(sites)
}
