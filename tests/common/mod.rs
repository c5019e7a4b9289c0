//! CSV fixtures shaped like the bleaching dataset: 23 columns, date at 12,
//! severity at 14, SSTA at 22.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

pub const HEADER: [&str; 23] = [
    "Site_ID",
    "Sample_ID",
    "Data_Source",
    "Latitude_Degrees",
    "Longitude_Degrees",
    "Ocean_Name",
    "Reef_ID",
    "Realm_Name",
    "Ecoregion_Name",
    "Country_Name",
    "State_Island_Province_Name",
    "City_Town_Name",
    "Date",
    "Date2",
    "Average_Bleaching",
    "Depth_m",
    "Turbidity",
    "Cyclone_Frequency",
    "Temperature_Mean",
    "Windspeed",
    "ClimSST",
    "SSTA_Frequency",
    "SSTA",
];

#[derive(Debug, Clone)]
pub struct Row {
    /// yyyy-mm-dd
    pub date: String,
    pub latitude: f64,
    pub longitude: f64,
    pub severity: String,
    pub ssta: String,
}

pub fn row(date: &str, severity: &str, ssta: &str) -> Row {
    Row {
        date: date.to_string(),
        latitude: -18.25,
        longitude: 147.7,
        severity: severity.to_string(),
        ssta: ssta.to_string(),
    }
}

pub fn render(rows: &[Row]) -> String {
    let mut out = HEADER.join(",");
    out.push('\n');
    for (i, r) in rows.iter().enumerate() {
        let date2 = r.date.replace('-', "");
        let cells = [
            format!("{}", 1000 + i),
            format!("{}", 5000 + i),
            "Reef_Check".to_string(),
            r.latitude.to_string(),
            r.longitude.to_string(),
            "Pacific".to_string(),
            "R-1".to_string(),
            "Central Indo-Pacific".to_string(),
            "Great Barrier Reef".to_string(),
            "Australia".to_string(),
            "Queensland".to_string(),
            "Cairns".to_string(),
            r.date.clone(),
            date2,
            r.severity.clone(),
            "6.5".to_string(),
            "0.03".to_string(),
            "49.9".to_string(),
            "300.9".to_string(),
            "6".to_string(),
            "301.2".to_string(),
            "2".to_string(),
            r.ssta.clone(),
        ];
        out.push_str(&cells.join(","));
        out.push('\n');
    }
    out
}

pub fn write_csv(dir: &Path, rows: &[Row]) -> PathBuf {
    let path = dir.join("coral_bleaching_data.csv");
    std::fs::write(&path, render(rows)).unwrap();
    path
}

/// A year dense enough to survive the 70-reading filter, half of it
/// bleached at `severity`.
pub fn busy_year(year: i32, severity: f64, count: usize) -> Vec<Row> {
    (0..count)
        .map(|i| {
            let sev = if i % 2 == 0 { severity } else { 0.0 };
            row(
                &format!("{year}-{:02}-{:02}", i % 12 + 1, i % 28 + 1),
                &sev.to_string(),
                if i % 3 == 0 { "nd" } else { "0.42" },
            )
        })
        .collect()
}
