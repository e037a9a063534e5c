use crate::core::chart::{AxisBounds, ChartSeries, Series};
use crate::core::render::{ChartImage, ChartRenderer};
use anyhow::{Context, Result};
use async_trait::async_trait;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use std::fmt::Write;
use std::path::PathBuf;
use tracing::debug;

const WIDTH: f64 = 1280.0;
const HEIGHT: f64 = 720.0;
const LEFT: f64 = 90.0;
const RIGHT: f64 = 1240.0;
const TOP: f64 = 90.0;
const BOTTOM: f64 = 610.0;
const MAX_TICKS: usize = 20;

/// Writes charts as SVG files into `output_dir`.
pub struct SvgRenderer {
    output_dir: PathBuf,
}

impl SvgRenderer {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }
}

fn to_f64(value: Decimal) -> f64 {
    value.to_f64().unwrap_or_default()
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

struct Frame {
    min: f64,
    max: f64,
    count: usize,
}

impl Frame {
    fn new(bounds: Option<AxisBounds>, count: usize) -> Self {
        let (min, max) = bounds.map_or((0.0, 1.0), |b| (to_f64(b.min), to_f64(b.max)));
        // A flat series still needs a visible range
        let (min, max) = if max > min { (min, max) } else { (min - 0.5, max + 0.5) };
        Self { min, max, count }
    }

    fn x(&self, index: usize) -> f64 {
        let step = (RIGHT - LEFT) / self.count.max(1) as f64;
        LEFT + step * (index as f64 + 0.5)
    }

    fn step(&self) -> f64 {
        (RIGHT - LEFT) / self.count.max(1) as f64
    }

    fn y(&self, value: f64) -> f64 {
        BOTTOM - (value - self.min) / (self.max - self.min) * (BOTTOM - TOP)
    }

    fn ticks(&self, increment: Option<Decimal>) -> Vec<f64> {
        let span = self.max - self.min;
        let increment = increment
            .map(to_f64)
            .filter(|inc| *inc > 0.0 && span / inc <= MAX_TICKS as f64)
            .unwrap_or(span / 5.0);
        (0..=MAX_TICKS)
            .map(|i| self.min + increment * i as f64)
            .take_while(|v| *v <= self.max + 1e-9)
            .collect()
    }
}

fn render_svg(chart: &ChartSeries) -> Result<String> {
    let frame = Frame::new(chart.bounds, chart.series.len());
    let mut svg = String::new();

    writeln!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{WIDTH}" height="{HEIGHT}" viewBox="0 0 {WIDTH} {HEIGHT}" font-family="sans-serif">"#
    )?;
    writeln!(svg, r#"<rect width="100%" height="100%" fill="white"/>"#)?;
    for (line_no, line) in chart.title.lines().enumerate() {
        writeln!(
            svg,
            r#"<text x="{}" y="{}" font-size="26" text-anchor="middle">{}</text>"#,
            WIDTH / 2.0,
            36.0 + 30.0 * line_no as f64,
            escape(line)
        )?;
    }

    for tick in frame.ticks(chart.y_increment) {
        let y = frame.y(tick);
        writeln!(
            svg,
            r#"<line x1="{LEFT}" y1="{y:.1}" x2="{RIGHT}" y2="{y:.1}" stroke="grey" stroke-opacity="0.3"/>"#
        )?;
        writeln!(
            svg,
            r#"<text x="{}" y="{:.1}" font-size="14" text-anchor="end">{tick:.2}</text>"#,
            LEFT - 8.0,
            y + 5.0
        )?;
    }

    for (index, label) in &chart.labels {
        let x = frame.x(*index);
        writeln!(
            svg,
            r#"<line x1="{x:.1}" y1="{TOP}" x2="{x:.1}" y2="{BOTTOM}" stroke="grey" stroke-opacity="0.3"/>"#
        )?;
        writeln!(
            svg,
            r#"<text x="{x:.1}" y="{}" font-size="14" fill="grey" text-anchor="end" transform="rotate(-45 {x:.1} {})">{}</text>"#,
            BOTTOM + 20.0,
            BOTTOM + 20.0,
            escape(label)
        )?;
    }

    match &chart.series {
        Series::Candles(candles) => {
            let body_width = frame.step() * 0.9;
            for (index, candle) in candles.iter().enumerate() {
                let x = frame.x(index);
                let (open, close) = (to_f64(candle.open), to_f64(candle.close));
                let color = if close >= open { "#2ca02c" } else { "#d62728" };
                let top = frame.y(open.max(close));
                let height = (frame.y(open.min(close)) - top).max(1.0);
                writeln!(
                    svg,
                    r#"<line x1="{x:.1}" y1="{:.1}" x2="{x:.1}" y2="{:.1}" stroke="{color}"/>"#,
                    frame.y(to_f64(candle.high)),
                    frame.y(to_f64(candle.low))
                )?;
                writeln!(
                    svg,
                    r#"<rect x="{:.1}" y="{top:.1}" width="{body_width:.1}" height="{height:.1}" fill="{color}" fill-opacity="0.75"/>"#,
                    x - body_width / 2.0
                )?;
            }
        }
        Series::Line { name, points } => {
            let coords: Vec<String> = points
                .iter()
                .enumerate()
                .map(|(index, value)| format!("{:.1},{:.1}", frame.x(index), frame.y(to_f64(*value))))
                .collect();
            writeln!(
                svg,
                r##"<polyline points="{}" fill="none" stroke="#1f77b4" stroke-width="3"><title>{}</title></polyline>"##,
                coords.join(" "),
                escape(name)
            )?;
        }
    }

    writeln!(svg, "</svg>")?;
    Ok(svg)
}

#[async_trait]
impl ChartRenderer for SvgRenderer {
    async fn render(&self, chart: &ChartSeries) -> Result<ChartImage> {
        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .with_context(|| {
                format!("Failed to create chart directory: {}", self.output_dir.display())
            })?;

        let file_name = format!("{}.svg", chart.kind.file_stem());
        let path = self.output_dir.join(&file_name);
        tokio::fs::write(&path, render_svg(chart)?)
            .await
            .with_context(|| format!("Failed to write chart: {}", path.display()))?;
        debug!("Rendered {} chart to {}", chart.kind, path.display());

        Ok(ChartImage {
            path,
            file_name,
            mime: "image/svg+xml",
        })
    }
}
