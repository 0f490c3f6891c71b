//! SVG Chart Generator
//!
//! Renders the diagnostic charts of a run (class balance, loss curves) as
//! standalone SVG files.

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use crate::utils::error::{CatDogError, Result};

const CHART_WIDTH: f64 = 800.0;
const CHART_HEIGHT: f64 = 500.0;
const MARGIN_TOP: f64 = 60.0;
const MARGIN_RIGHT: f64 = 40.0;
const MARGIN_BOTTOM: f64 = 80.0;
const MARGIN_LEFT: f64 = 80.0;
const GRID_LINES: usize = 5;

pub const COLOR_BLUE: &str = "#3498db";
pub const COLOR_GREEN: &str = "#2ecc71";
pub const COLOR_RED: &str = "#e74c3c";
const COLOR_GRID: &str = "#ecf0f1";
const COLOR_AXIS: &str = "#2c3e50";
const COLOR_TEXT: &str = "#2c3e50";
const FONT: &str = "Arial, sans-serif";

/// A named line of (x, y) points
#[derive(Debug, Clone)]
pub struct DataSeries {
    pub name: String,
    pub points: Vec<(f64, f64)>,
    pub color: String,
}

impl DataSeries {
    /// Series with x = 0, 1, 2, ... for each value
    pub fn from_values(name: &str, values: &[f64], color: &str) -> Self {
        Self {
            name: name.to_string(),
            points: values
                .iter()
                .enumerate()
                .map(|(i, &v)| (i as f64, v))
                .collect(),
            color: color.to_string(),
        }
    }
}

/// One bar of a bar chart
#[derive(Debug, Clone)]
pub struct BarData {
    pub label: String,
    pub value: f64,
    pub color: String,
}

fn plot_width() -> f64 {
    CHART_WIDTH - MARGIN_LEFT - MARGIN_RIGHT
}

fn plot_height() -> f64 {
    CHART_HEIGHT - MARGIN_TOP - MARGIN_BOTTOM
}

/// Accumulates SVG elements for one chart
struct SvgCanvas {
    svg: String,
}

impl SvgCanvas {
    fn new(title: &str) -> Self {
        let mut svg = String::new();
        let _ = write!(
            svg,
            r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 {w} {h}" width="{w}" height="{h}">"#,
            w = CHART_WIDTH,
            h = CHART_HEIGHT
        );
        let _ = write!(
            svg,
            r#"<rect width="{}" height="{}" fill="white"/>"#,
            CHART_WIDTH, CHART_HEIGHT
        );
        let _ = write!(
            svg,
            r#"<text x="{}" y="35" text-anchor="middle" font-family="{}" font-size="18" font-weight="bold" fill="{}">{}</text>"#,
            CHART_WIDTH / 2.0,
            FONT,
            COLOR_TEXT,
            escape_xml(title)
        );
        Self { svg }
    }

    fn y_to_px(value: f64, y_max: f64) -> f64 {
        MARGIN_TOP + plot_height() - (value / y_max) * plot_height()
    }

    /// Horizontal grid lines with y tick labels from 0 to `y_max`
    fn grid(&mut self, y_max: f64, decimals: usize) {
        for i in 0..=GRID_LINES {
            let value = (i as f64 / GRID_LINES as f64) * y_max;
            let y = Self::y_to_px(value, y_max);
            let _ = write!(
                self.svg,
                r#"<line x1="{}" y1="{}" x2="{}" y2="{}" stroke="{}" stroke-width="1"/>"#,
                MARGIN_LEFT,
                y,
                MARGIN_LEFT + plot_width(),
                y,
                COLOR_GRID
            );
            let _ = write!(
                self.svg,
                r#"<text x="{}" y="{}" text-anchor="end" font-family="{}" font-size="12" fill="{}">{:.*}</text>"#,
                MARGIN_LEFT - 10.0,
                y + 4.0,
                FONT,
                COLOR_TEXT,
                decimals,
                value
            );
        }
    }

    fn axes(&mut self, x_label: &str, y_label: &str) {
        let bottom = MARGIN_TOP + plot_height();
        let _ = write!(
            self.svg,
            r#"<line x1="{}" y1="{}" x2="{}" y2="{}" stroke="{}" stroke-width="2"/>"#,
            MARGIN_LEFT,
            bottom,
            MARGIN_LEFT + plot_width(),
            bottom,
            COLOR_AXIS
        );
        let _ = write!(
            self.svg,
            r#"<line x1="{}" y1="{}" x2="{}" y2="{}" stroke="{}" stroke-width="2"/>"#,
            MARGIN_LEFT, MARGIN_TOP, MARGIN_LEFT, bottom, COLOR_AXIS
        );
        if !x_label.is_empty() {
            let _ = write!(
                self.svg,
                r#"<text x="{}" y="{}" text-anchor="middle" font-family="{}" font-size="14" fill="{}">{}</text>"#,
                MARGIN_LEFT + plot_width() / 2.0,
                CHART_HEIGHT - 20.0,
                FONT,
                COLOR_TEXT,
                escape_xml(x_label)
            );
        }
        let _ = write!(
            self.svg,
            r#"<text x="20" y="{y}" text-anchor="middle" font-family="{}" font-size="14" fill="{}" transform="rotate(-90 20 {y})">{}</text>"#,
            FONT,
            COLOR_TEXT,
            escape_xml(y_label),
            y = CHART_HEIGHT / 2.0
        );
    }

    fn text(&mut self, x: f64, y: f64, size: u32, content: &str) {
        let _ = write!(
            self.svg,
            r#"<text x="{}" y="{}" text-anchor="middle" font-family="{}" font-size="{}" fill="{}">{}</text>"#,
            x,
            y,
            FONT,
            size,
            COLOR_TEXT,
            escape_xml(content)
        );
    }

    fn finish(mut self) -> String {
        self.svg.push_str("</svg>");
        self.svg
    }
}

/// Render a line chart; the y axis spans 0 to the largest finite value
pub fn render_line_chart(title: &str, x_label: &str, y_label: &str, series: &[DataSeries]) -> String {
    let (x_min, x_max, y_max) = find_ranges(series);
    let x_span = if x_max > x_min { x_max - x_min } else { 1.0 };
    let y_max = if y_max > 0.0 { y_max * 1.1 } else { 1.0 };

    let x_to_px = |x: f64| MARGIN_LEFT + ((x - x_min) / x_span) * plot_width();

    let mut canvas = SvgCanvas::new(title);
    canvas.grid(y_max, 2);
    canvas.axes(x_label, y_label);

    for s in series {
        let finite: Vec<(f64, f64)> = s
            .points
            .iter()
            .copied()
            .filter(|(x, y)| x.is_finite() && y.is_finite())
            .collect();
        if finite.is_empty() {
            continue;
        }

        let path = finite
            .iter()
            .enumerate()
            .map(|(i, &(x, y))| {
                let cmd = if i == 0 { "M" } else { "L" };
                format!("{} {} {}", cmd, x_to_px(x), SvgCanvas::y_to_px(y, y_max))
            })
            .collect::<Vec<_>>()
            .join(" ");

        let _ = write!(
            canvas.svg,
            r#"<path d="{}" fill="none" stroke="{}" stroke-width="3"/>"#,
            path, s.color
        );
        for &(x, y) in &finite {
            let _ = write!(
                canvas.svg,
                r#"<circle cx="{}" cy="{}" r="5" fill="{}" stroke="white" stroke-width="2"/>"#,
                x_to_px(x),
                SvgCanvas::y_to_px(y, y_max),
                s.color
            );
        }
    }

    // Tick labels on every other x, as the loss plots are indexed by epoch
    if let Some(first) = series.first() {
        for &(x, _) in first.points.iter().step_by(2) {
            canvas.text(
                x_to_px(x),
                MARGIN_TOP + plot_height() + 20.0,
                11,
                &format!("{:.0}", x),
            );
        }
    }

    let mut legend_y = MARGIN_TOP + 10.0;
    for s in series {
        let legend_x = CHART_WIDTH - MARGIN_RIGHT - 150.0;
        let _ = write!(
            canvas.svg,
            r#"<rect x="{}" y="{}" width="15" height="15" fill="{}"/>"#,
            legend_x, legend_y, s.color
        );
        let _ = write!(
            canvas.svg,
            r#"<text x="{}" y="{}" font-family="{}" font-size="12" fill="{}">{}</text>"#,
            legend_x + 20.0,
            legend_y + 12.0,
            FONT,
            COLOR_TEXT,
            escape_xml(&s.name)
        );
        legend_y += 25.0;
    }

    canvas.finish()
}

/// Render a bar chart of raw values (counts)
pub fn render_bar_chart(title: &str, x_label: &str, y_label: &str, bars: &[BarData]) -> String {
    let y_max = bars.iter().map(|b| b.value).fold(0.0f64, f64::max);
    let y_max = if y_max > 0.0 { y_max * 1.1 } else { 1.0 };

    let mut canvas = SvgCanvas::new(title);
    canvas.grid(y_max, 0);
    canvas.axes(x_label, y_label);

    let slot = plot_width() / bars.len().max(1) as f64;
    let bar_width = slot * 0.7;

    for (i, bar) in bars.iter().enumerate() {
        let x = MARGIN_LEFT + i as f64 * slot + slot * 0.15;
        let y = SvgCanvas::y_to_px(bar.value, y_max);
        let height = MARGIN_TOP + plot_height() - y;

        let _ = write!(
            canvas.svg,
            r#"<rect x="{}" y="{}" width="{}" height="{}" fill="{}" rx="4"/>"#,
            x, y, bar_width, height, bar.color
        );
        canvas.text(x + bar_width / 2.0, y - 8.0, 12, &format!("{:.0}", bar.value));
        canvas.text(
            x + bar_width / 2.0,
            MARGIN_TOP + plot_height() + 25.0,
            11,
            &bar.label,
        );
    }

    canvas.finish()
}

/// Write a line chart SVG to `output_path`
pub fn generate_line_chart(
    title: &str,
    x_label: &str,
    y_label: &str,
    series: &[DataSeries],
    output_path: &Path,
) -> Result<()> {
    write_svg(output_path, render_line_chart(title, x_label, y_label, series))
}

/// Write a bar chart SVG to `output_path`
pub fn generate_bar_chart(
    title: &str,
    x_label: &str,
    y_label: &str,
    bars: &[BarData],
    output_path: &Path,
) -> Result<()> {
    write_svg(output_path, render_bar_chart(title, x_label, y_label, bars))
}

fn write_svg(output_path: &Path, svg: String) -> Result<()> {
    fs::write(output_path, svg).map_err(|e| {
        CatDogError::Report(format!("Failed to write {}: {}", output_path.display(), e))
    })
}

fn find_ranges(series: &[DataSeries]) -> (f64, f64, f64) {
    let mut x_min = f64::INFINITY;
    let mut x_max = f64::NEG_INFINITY;
    let mut y_max = 0.0f64;

    for (x, y) in series.iter().flat_map(|s| s.points.iter().copied()) {
        if !x.is_finite() || !y.is_finite() {
            continue;
        }
        x_min = x_min.min(x);
        x_max = x_max.max(x);
        y_max = y_max.max(y);
    }

    if !x_min.is_finite() {
        (0.0, 1.0, y_max)
    } else {
        (x_min, x_max, y_max)
    }
}

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
