use std::collections::{BTreeMap, HashMap};

use polars::prelude::*;

use crate::error::{CoralError, Result};
use crate::schema::geo;

// ── Float-keyed map ─────────────────────────────────────────────────────────

/// Insertion-ordered map keyed by a severity value.
///
/// Keys compare by value, so `0.0` and `-0.0` land on the same entry.
/// Iteration follows first-insertion order, which is the row order of the
/// source file for loader output.
#[derive(Debug, Clone, PartialEq)]
pub struct SeverityMap<V> {
    entries: Vec<(f64, V)>,
    index: HashMap<u64, usize>,
}

fn key_bits(key: f64) -> u64 {
    if key == 0.0 {
        0.0f64.to_bits()
    } else {
        key.to_bits()
    }
}

impl<V> SeverityMap<V> {
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            index: HashMap::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains_key(&self, key: f64) -> bool {
        self.index.contains_key(&key_bits(key))
    }

    pub fn get(&self, key: f64) -> Option<&V> {
        self.index.get(&key_bits(key)).map(|&i| &self.entries[i].1)
    }

    /// Insert or replace; returns the previous value. A replaced entry keeps
    /// its original position.
    pub fn insert(&mut self, key: f64, value: V) -> Option<V> {
        match self.index.get(&key_bits(key)) {
            Some(&i) => Some(std::mem::replace(&mut self.entries[i].1, value)),
            None => {
                self.index.insert(key_bits(key), self.entries.len());
                self.entries.push((key, value));
                None
            }
        }
    }

    pub fn get_or_insert_with(&mut self, key: f64, default: impl FnOnce() -> V) -> &mut V {
        let i = match self.index.get(&key_bits(key)) {
            Some(&i) => i,
            None => {
                let i = self.entries.len();
                self.index.insert(key_bits(key), i);
                self.entries.push((key, default()));
                i
            }
        };
        &mut self.entries[i].1
    }

    pub fn iter(&self) -> impl Iterator<Item = (f64, &V)> + '_ {
        self.entries.iter().map(|(k, v)| (*k, v))
    }

    pub fn keys(&self) -> impl Iterator<Item = f64> + '_ {
        self.entries.iter().map(|(k, _)| *k)
    }

    pub fn values(&self) -> impl Iterator<Item = &V> + '_ {
        self.entries.iter().map(|(_, v)| v)
    }
}

impl<V> Default for SeverityMap<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> FromIterator<(f64, V)> for SeverityMap<V> {
    fn from_iter<I: IntoIterator<Item = (f64, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

impl<V> IntoIterator for SeverityMap<V> {
    type Item = (f64, V);
    type IntoIter = std::vec::IntoIter<(f64, V)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

// ── Loaded and derived shapes ───────────────────────────────────────────────

/// Severity (%) → every SSTA reading (°C) observed at that severity.
pub type SeverityToSSTAs = SeverityMap<Vec<f64>>;

/// Severity (%) → mean SSTA, rounded to 3 decimals.
pub type SeverityToAverageSSTA = SeverityMap<f64>;

/// Year → raw severity readings recorded that year.
pub type YearToSeverities = BTreeMap<i32, Vec<f64>>;

/// Year → bleaching frequency and average severity.
pub type YearToFrequencyAndSeverity = BTreeMap<i32, YearSummary>;

/// Plot-ready points, positionally aligned: `x[i]` pairs with `y[i]`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PointSeries {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
}

impl PointSeries {
    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.x.iter().copied().zip(self.y.iter().copied())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct YearSummary {
    /// Readings strictly above zero.
    pub frequency: usize,
    /// Mean of exactly those readings.
    pub average_severity: f64,
}

/// One positive-severity observation placed on the map.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BleachingSite {
    pub latitude: f64,
    pub longitude: f64,
    pub severity: f64,
}

// ── Geographic table ────────────────────────────────────────────────────────

/// Row-oriented observation table.
///
/// Guaranteed columns: `Date2` as Int64 and latitude, longitude and
/// severity as Float64. Everything else the CSV carried is kept as strings.
#[derive(Debug, Clone)]
pub struct GeoTable {
    df: DataFrame,
}

impl GeoTable {
    pub fn new(df: DataFrame) -> Result<Self> {
        for name in [geo::DATE, geo::LATITUDE, geo::LONGITUDE, geo::SEVERITY] {
            if df.column(name).is_err() {
                return Err(CoralError::MissingColumn(name.to_string()));
            }
        }
        df.column(geo::DATE)?.i64()?;
        for name in geo::FLOAT_COLUMNS {
            df.column(name)?.f64()?;
        }
        Ok(Self { df })
    }

    pub fn frame(&self) -> &DataFrame {
        &self.df
    }

    pub fn height(&self) -> usize {
        self.df.height()
    }

    pub fn dates(&self) -> Result<Vec<Option<i64>>> {
        Ok(self.df.column(geo::DATE)?.i64()?.into_iter().collect())
    }

    /// Sorted distinct values of the date column.
    pub fn years(&self) -> Result<Vec<i64>> {
        let mut years: Vec<i64> = self.dates()?.into_iter().flatten().collect();
        years.sort_unstable();
        years.dedup();
        Ok(years)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::*;

    #[test]
    fn severity_map_keeps_insertion_order() {
        let mut map = SeverityMap::new();
        map.insert(3.0, "c");
        map.insert(1.0, "a");
        map.insert(2.0, "b");
        assert_eq!(map.keys().collect::<Vec<_>>(), vec![3.0, 1.0, 2.0]);

        assert_eq!(map.insert(1.0, "z"), Some("a"));
        assert_eq!(map.keys().collect::<Vec<_>>(), vec![3.0, 1.0, 2.0]);
        assert_eq!(map.get(1.0), Some(&"z"));
    }

    #[test]
    fn signed_zero_is_one_key() {
        let mut map: SeverityMap<Vec<f64>> = SeverityMap::new();
        map.get_or_insert_with(0.0, Vec::new).push(1.0);
        map.get_or_insert_with(-0.0, Vec::new).push(2.0);
        assert_eq!(map.len(), 1);
        assert_eq!(map.get(0.0), Some(&vec![1.0, 2.0]));
    }

    #[test]
    fn geo_table_requires_typed_columns() {
        let df = df!(
            geo::DATE => [20100615i64],
            geo::LATITUDE => [1.5],
            geo::LONGITUDE => [100.0],
        )
        .unwrap();
        assert!(matches!(
            GeoTable::new(df),
            Err(CoralError::MissingColumn(c)) if c == geo::SEVERITY
        ));

        let df = df!(
            geo::DATE => ["20100615"],
            geo::LATITUDE => [1.5],
            geo::LONGITUDE => [100.0],
            geo::SEVERITY => [5.0],
        )
        .unwrap();
        assert!(matches!(GeoTable::new(df), Err(CoralError::Polars(_))));
    }

    #[test]
    fn years_are_sorted_and_distinct() {
        let df = df!(
            geo::DATE => [2005i64, 2003, 2005, 2004],
            geo::LATITUDE => [0.0, 0.0, 0.0, 0.0],
            geo::LONGITUDE => [0.0, 0.0, 0.0, 0.0],
            geo::SEVERITY => [1.0, 2.0, 3.0, 4.0],
        )
        .unwrap();
        let table = GeoTable::new(df).unwrap();
        assert_eq!(table.years().unwrap(), vec![2003, 2004, 2005]);
    }
}
