/// Visualization module: self-contained HTML charts for the three views.
///
/// Each renderer lays the chart out in Rust and emits inline SVG. The map
/// also carries a small inline script driving its year slider; the slider
/// labels travel as an embedded JSON payload.
use std::fmt::Write as FmtWrite;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::geo::bleaching_sites;
use crate::model::{GeoTable, PointSeries, YearToFrequencyAndSeverity};
use crate::schema::thresholds;

// ── Config ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ChartConfig {
    pub width_px: u32,
    pub height_px: u32,
    pub font_family: String,
    pub correlation_title: String,
    pub freq_severity_title: String,
    pub map_title: String,
    pub trendline_color: String,
    /// Severity that maps to a fully opaque marker.
    pub opacity_scale: f64,
    /// Floor so that mild events stay visible.
    pub min_opacity: f64,
    /// Earliest year drawn on the map.
    pub map_first_year: i64,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            width_px: 960,
            height_px: 540,
            font_family: "Gravitas One, sans-serif".to_string(),
            correlation_title:
                "Relationship Between Change in Sea Surface Temperature and Coral Bleaching"
                    .to_string(),
            freq_severity_title: "Frequency and Average Severity of Coral Bleaching Per Year"
                .to_string(),
            map_title: "Map of Coral Bleaching Events and their Severity".to_string(),
            trendline_color: "darkblue".to_string(),
            opacity_scale: 10.0,
            min_opacity: 0.3,
            map_first_year: thresholds::MAP_FIRST_YEAR,
        }
    }
}

const MARGIN_LEFT: f64 = 80.0;
const MARGIN_RIGHT: f64 = 30.0;
const MARGIN_TOP: f64 = 40.0;
const MARGIN_BOTTOM: f64 = 60.0;
const TICKS: usize = 5;

// ── Trend line ──────────────────────────────────────────────────────────────

/// Ordinary least squares fit `y = slope * x + intercept`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Trendline {
    pub slope: f64,
    pub intercept: f64,
    pub r_squared: f64,
}

impl Trendline {
    pub fn at(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }
}

/// `None` with fewer than two points or when every x is the same.
pub fn fit_trendline(points: &PointSeries) -> Option<Trendline> {
    let n = points.len();
    if n < 2 {
        return None;
    }
    let mean_x = points.x.iter().sum::<f64>() / n as f64;
    let mean_y = points.y.iter().sum::<f64>() / n as f64;

    let (mut sxx, mut sxy, mut syy) = (0.0, 0.0, 0.0);
    for (x, y) in points.iter() {
        let (dx, dy) = (x - mean_x, y - mean_y);
        sxx += dx * dx;
        sxy += dx * dy;
        syy += dy * dy;
    }
    if sxx == 0.0 {
        return None;
    }

    let slope = sxy / sxx;
    let r_squared = if syy == 0.0 {
        1.0
    } else {
        (sxy * sxy) / (sxx * syy)
    };
    Some(Trendline {
        slope,
        intercept: mean_y - slope * mean_x,
        r_squared,
    })
}

/// Marker opacity for a severity, clamped to `[min_opacity, 1.0]`. The upper
/// bound wins when `min_opacity` is above 1.
pub fn marker_opacity(severity: f64, config: &ChartConfig) -> f64 {
    (severity / config.opacity_scale).max(config.min_opacity).min(1.0)
}

/// Years shown on the map: distinct table years from `map_first_year` on.
pub fn map_years(table: &GeoTable, config: &ChartConfig) -> Result<Vec<i64>> {
    Ok(table
        .years()?
        .into_iter()
        .filter(|&y| y >= config.map_first_year)
        .collect())
}

// ── Axis scaling ────────────────────────────────────────────────────────────

/// Linear mapping from a data range onto a pixel span.
struct Axis {
    min: f64,
    max: f64,
    start_px: f64,
    end_px: f64,
}

impl Axis {
    /// Range covering `values` with 5% padding on each side.
    fn fit(values: impl IntoIterator<Item = f64>, start_px: f64, end_px: f64) -> Self {
        let (mut min, mut max) = (f64::INFINITY, f64::NEG_INFINITY);
        for v in values.into_iter().filter(|v| v.is_finite()) {
            min = min.min(v);
            max = max.max(v);
        }
        if !min.is_finite() {
            (min, max) = (0.0, 1.0);
        }
        let pad = if max > min { (max - min) * 0.05 } else { 1.0 };
        Self {
            min: min - pad,
            max: max + pad,
            start_px,
            end_px,
        }
    }

    /// Range from zero to the largest value, for bar heights.
    fn from_zero(values: impl IntoIterator<Item = f64>, start_px: f64, end_px: f64) -> Self {
        let max = values
            .into_iter()
            .filter(|v| v.is_finite())
            .fold(0.0, f64::max);
        Self {
            min: 0.0,
            max: if max > 0.0 { max * 1.05 } else { 1.0 },
            start_px,
            end_px,
        }
    }

    fn px(&self, value: f64) -> f64 {
        self.start_px + (value - self.min) / (self.max - self.min) * (self.end_px - self.start_px)
    }

    fn ticks(&self) -> impl Iterator<Item = f64> + '_ {
        let step = (self.max - self.min) / TICKS as f64;
        (0..=TICKS).map(move |i| self.min + step * i as f64)
    }
}

// ── HTML generation ─────────────────────────────────────────────────────────

/// Scatter of average SSTA (x) against severity (y) with its OLS trend line.
pub fn render_correlation(points: &PointSeries, config: &ChartConfig) -> Result<String> {
    if points.is_empty() {
        return page(&config.correlation_title, "<div>No points to visualize.</div>", config);
    }

    let (w, h) = (config.width_px as f64, config.height_px as f64);
    let x_axis = Axis::fit(points.x.iter().copied(), MARGIN_LEFT, w - MARGIN_RIGHT);
    let y_axis = Axis::fit(points.y.iter().copied(), h - MARGIN_BOTTOM, MARGIN_TOP);

    let mut svg = String::new();
    open_svg(&mut svg, w, h)?;
    draw_axes(
        &mut svg,
        &x_axis,
        &y_axis,
        "Average Sea Surface Temperature Anomalies (\u{b0}C)",
        "Severity of Coral Bleaching (%)",
    )?;

    for (x, y) in points.iter() {
        writeln!(
            svg,
            r##"<circle class="point" cx="{:.2}" cy="{:.2}" r="4"><title>SSTA {x}, severity {y}</title></circle>"##,
            x_axis.px(x),
            y_axis.px(y),
        )?;
    }

    if let Some(trend) = fit_trendline(points) {
        writeln!(
            svg,
            r##"<line class="trendline" x1="{:.2}" y1="{:.2}" x2="{:.2}" y2="{:.2}" stroke="{}" stroke-width="2"><title>y = {:.3}x + {:.3}, R² = {:.3}</title></line>"##,
            x_axis.px(x_axis.min),
            y_axis.px(trend.at(x_axis.min)),
            x_axis.px(x_axis.max),
            y_axis.px(trend.at(x_axis.max)),
            escape_xml(&config.trendline_color),
            trend.slope,
            trend.intercept,
            trend.r_squared,
        )?;
    }
    svg.push_str("</svg>\n");

    page(&config.correlation_title, &svg, config)
}

/// Two bar panels side by side: bleaching frequency and average severity.
pub fn render_freq_and_severity(
    data: &YearToFrequencyAndSeverity,
    config: &ChartConfig,
) -> Result<String> {
    if data.is_empty() {
        return page(&config.freq_severity_title, "<div>No years to visualize.</div>", config);
    }

    let labels: Vec<String> = data.keys().map(|y| y.to_string()).collect();
    let frequencies: Vec<f64> = data.values().map(|s| s.frequency as f64).collect();
    let severities: Vec<f64> = data.values().map(|s| s.average_severity).collect();

    let (w, h) = (config.width_px as f64, config.height_px as f64);
    let mut svg = String::new();
    open_svg(&mut svg, w, h)?;
    draw_bar_panel(&mut svg, 0.0, w / 2.0, h, "Frequency", &labels, &frequencies)?;
    draw_bar_panel(&mut svg, w / 2.0, w / 2.0, h, "Average Severity", &labels, &severities)?;
    svg.push_str("</svg>\n");

    page(&config.freq_severity_title, &svg, config)
}

#[derive(Serialize)]
struct MapPayload {
    years: Vec<i64>,
    labels: Vec<String>,
}

/// World scatter of bleaching sites, one layer per year behind a slider.
///
/// Expects a table whose date column already holds years. Only sites with
/// severity strictly above `event_threshold` are drawn.
pub fn render_map(table: &GeoTable, event_threshold: f64, config: &ChartConfig) -> Result<String> {
    let years = map_years(table, config)?;
    if years.is_empty() {
        return page(&config.map_title, "<div>No bleaching events to map.</div>", config);
    }

    let (w, h) = (config.width_px as f64, config.width_px as f64 / 2.0);
    let lon_axis = Axis {
        min: -180.0,
        max: 180.0,
        start_px: 0.0,
        end_px: w,
    };
    let lat_axis = Axis {
        min: -90.0,
        max: 90.0,
        start_px: h,
        end_px: 0.0,
    };

    let mut svg = String::new();
    open_svg(&mut svg, w, h)?;
    writeln!(svg, r##"<rect width="{w}" height="{h}" fill="lightblue"/>"##)?;
    for lon in (-150..=150).step_by(30) {
        let x = lon_axis.px(lon as f64);
        writeln!(svg, r##"<line class="grid" x1="{x:.2}" y1="0" x2="{x:.2}" y2="{h}"/>"##)?;
    }
    for lat in (-60..=60).step_by(30) {
        let y = lat_axis.px(lat as f64);
        writeln!(svg, r##"<line class="grid" x1="0" y1="{y:.2}" x2="{w}" y2="{y:.2}"/>"##)?;
    }

    for (i, &year) in years.iter().enumerate() {
        let display = if i == 0 { "inline" } else { "none" };
        writeln!(
            svg,
            r##"<g class="year-layer" data-year="{year}" style="display:{display}">"##
        )?;
        for site in bleaching_sites(table, year, event_threshold)? {
            writeln!(
                svg,
                r##"<circle class="site" cx="{:.2}" cy="{:.2}" r="4" opacity="{:.2}"><title>Bleaching %: {}</title></circle>"##,
                lon_axis.px(site.longitude),
                lat_axis.px(site.latitude),
                marker_opacity(site.severity, config),
                site.severity,
            )?;
        }
        svg.push_str("</g>\n");
    }
    svg.push_str("</svg>\n");

    let payload = MapPayload {
        labels: years.iter().map(|y| format!("Year {y}")).collect(),
        years,
    };
    let body = format!(
        r##"{svg}<div style="padding:8px; font-family:sans-serif;">
  <input type="range" id="coral-year-slider" min="0" max="{max}" value="0" step="1" style="width:60%;">
  <span id="coral-year-label">{first}</span>
</div>
<script>
const CORAL_MAP = {json};
(function () {{
  const layers = document.querySelectorAll(".year-layer");
  const slider = document.getElementById("coral-year-slider");
  const label = document.getElementById("coral-year-label");
  slider.addEventListener("input", function () {{
    const active = Number(slider.value);
    layers.forEach(function (layer, i) {{
      layer.style.display = i === active ? "inline" : "none";
    }});
    label.textContent = CORAL_MAP.labels[active];
  }});
}})();
</script>"##,
        max = payload.years.len() - 1,
        first = escape_xml(&payload.labels[0]),
        json = serde_json::to_string(&payload)?,
    );

    page(&config.map_title, &body, config)
}

// ── SVG pieces ──────────────────────────────────────────────────────────────

fn open_svg(svg: &mut String, w: f64, h: f64) -> Result<()> {
    writeln!(
        svg,
        r##"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"##
    )?;
    Ok(())
}

fn draw_axes(
    svg: &mut String,
    x_axis: &Axis,
    y_axis: &Axis,
    x_title: &str,
    y_title: &str,
) -> Result<()> {
    let (x0, x1) = (x_axis.start_px, x_axis.end_px);
    let (y0, y1) = (y_axis.start_px, y_axis.end_px);
    writeln!(svg, r##"<line class="axis" x1="{x0}" y1="{y0}" x2="{x1}" y2="{y0}"/>"##)?;
    writeln!(svg, r##"<line class="axis" x1="{x0}" y1="{y0}" x2="{x0}" y2="{y1}"/>"##)?;

    for t in x_axis.ticks() {
        writeln!(
            svg,
            r##"<text class="tick" x="{:.2}" y="{:.2}" text-anchor="middle">{t:.2}</text>"##,
            x_axis.px(t),
            y0 + 18.0,
        )?;
    }
    for t in y_axis.ticks() {
        writeln!(
            svg,
            r##"<text class="tick" x="{:.2}" y="{:.2}" text-anchor="end">{t:.1}</text>"##,
            x0 - 8.0,
            y_axis.px(t) + 4.0,
        )?;
    }

    writeln!(
        svg,
        r##"<text class="axis-title" x="{:.2}" y="{:.2}" text-anchor="middle">{}</text>"##,
        (x0 + x1) / 2.0,
        y0 + 45.0,
        escape_xml(x_title),
    )?;
    writeln!(
        svg,
        r##"<text class="axis-title" transform="translate(20,{:.2}) rotate(-90)" text-anchor="middle">{}</text>"##,
        (y0 + y1) / 2.0,
        escape_xml(y_title),
    )?;
    Ok(())
}

fn draw_bar_panel(
    svg: &mut String,
    offset_px: f64,
    panel_width: f64,
    height: f64,
    title: &str,
    labels: &[String],
    values: &[f64],
) -> Result<()> {
    let left = offset_px + MARGIN_LEFT;
    let right = offset_px + panel_width - MARGIN_RIGHT;
    let y_axis = Axis::from_zero(values.iter().copied(), height - MARGIN_BOTTOM, MARGIN_TOP);
    let slot = (right - left) / values.len() as f64;
    let base = y_axis.start_px;

    writeln!(
        svg,
        r##"<text class="panel-title" x="{:.2}" y="{:.2}" text-anchor="middle">{}</text>"##,
        (left + right) / 2.0,
        MARGIN_TOP - 15.0,
        escape_xml(title),
    )?;
    writeln!(svg, r##"<line class="axis" x1="{left}" y1="{base}" x2="{right}" y2="{base}"/>"##)?;
    for t in y_axis.ticks() {
        writeln!(
            svg,
            r##"<text class="tick" x="{:.2}" y="{:.2}" text-anchor="end">{t:.1}</text>"##,
            left - 8.0,
            y_axis.px(t) + 4.0,
        )?;
    }

    for (i, (label, &value)) in labels.iter().zip(values).enumerate() {
        let x = left + slot * i as f64 + slot * 0.1;
        let top = y_axis.px(value);
        writeln!(
            svg,
            r##"<rect class="bar" x="{x:.2}" y="{top:.2}" width="{:.2}" height="{:.2}"><title>{}: {value}</title></rect>"##,
            slot * 0.8,
            base - top,
            escape_xml(label),
        )?;
        writeln!(
            svg,
            r##"<text class="tick" x="{:.2}" y="{:.2}" text-anchor="end" transform="rotate(-45 {:.2} {:.2})">{}</text>"##,
            x + slot * 0.4,
            base + 14.0,
            x + slot * 0.4,
            base + 14.0,
            escape_xml(label),
        )?;
    }
    Ok(())
}

/// Wrap a chart body in a standalone HTML document.
fn page(title: &str, body: &str, config: &ChartConfig) -> Result<String> {
    let title = escape_xml(title);
    let font = escape_xml(&config.font_family);
    Ok(format!(
        r##"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>{title}</title>
<style>
  body {{ margin: 0; background: #fff; }}
  h1 {{ font-family: {font}; font-size: 28px; color: black; text-align: center; }}
  .axis {{ stroke: #495057; stroke-width: 1; }}
  .grid {{ stroke: #ffffff; stroke-width: 0.5; }}
  .tick {{ font-family: sans-serif; font-size: 12px; fill: #495057; }}
  .axis-title, .panel-title {{ font-family: sans-serif; font-size: 14px; fill: #212529; }}
  .point {{ fill: #636efa; }}
  .bar {{ fill: #636efa; }}
  .site {{ fill: #636efa; stroke: red; stroke-width: 2; }}
</style>
</head>
<body>
<h1>{title}</h1>
<div style="display:flex; justify-content:center;">
{body}
</div>
</body>
</html>
"##
    ))
}

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
