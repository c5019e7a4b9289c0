/// Column constants for the coral bleaching CSV.
/// Defaults only - every loader call takes a `LoaderConfig` built from these.

// ── Positional columns (header row skipped) ─────────────────────────────────
pub mod bleaching {
    /// Compound date field; the first four characters are the year.
    pub const DATE_IDX: usize = 12;
    pub const SEVERITY_IDX: usize = 14;
    pub const SSTA_IDX: usize = 22;

    /// Marker for an absent SSTA reading.
    pub const MISSING: &str = "nd";
}

// ── Named columns used by the geographic table ──────────────────────────────
pub mod geo {
    /// yyyymmdd integer, or yyyy once normalized.
    pub const DATE: &str = "Date2";
    pub const LATITUDE: &str = "Latitude_Degrees";
    pub const LONGITUDE: &str = "Longitude_Degrees";
    pub const SEVERITY: &str = "Average_Bleaching";

    pub const FLOAT_COLUMNS: [&str; 3] = [LATITUDE, LONGITUDE, SEVERITY];
}

// ── Aggregation thresholds ──────────────────────────────────────────────────
pub mod thresholds {
    /// Years with this many readings or fewer are dropped as outliers.
    pub const MIN_YEAR_READINGS: usize = 70;

    /// A reading strictly above this counts as a bleaching event.
    pub const EVENT_SEVERITY: f64 = 0.0;

    /// Years before this are too sparse to draw on the map.
    pub const MAP_FIRST_YEAR: i64 = 2003;
}
