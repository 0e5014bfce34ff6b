//! Violin and box chart rendering for one grade's area scores.
//!
//! Every call builds its own bitmap backend, draws, presents and drops it
//! before returning. Nothing is shared between calls.

use crate::config::DatasetConfig;
use crate::scoring::types::{GradeScores, Quartiles};
use crate::scoring::utility::{gaussian_kde, quartiles, whiskers};
use anyhow::{Context, Result};
use plotters::coord::types::RangedCoordf64;
use plotters::prelude::*;
use plotters::series::DashedLineSeries;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use std::path::Path;
use tracing::{debug, warn};

const FONT: &str = "sans-serif";
const Y_MAX: f64 = 1.05;
const VIOLIN_HALF_WIDTH: f64 = 0.25;
const VIOLIN_ALPHA: f64 = 0.7;
const BOX_HALF_WIDTH: f64 = 0.05;
const CAP_HALF_WIDTH: f64 = 0.025;
const LABEL_DX: f64 = 0.15;
const LABEL_DY: f64 = 0.03;

const TICK_EPSILON: f64 = 1e-6;

type Chart<'a, 'b> =
    ChartContext<'a, BitMapBackend<'b>, Cartesian2d<RangedCoordf64, RangedCoordf64>>;

/// Physical canvas size. Font sizes and line widths are given in points and
/// scaled by `dpi / 72`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChartCanvas {
    pub width_in: f64,
    pub height_in: f64,
    pub dpi: u32,
}

impl Default for ChartCanvas {
    fn default() -> Self {
        ChartCanvas {
            width_in: 8.0,
            height_in: 6.0,
            dpi: 220,
        }
    }
}

impl ChartCanvas {
    pub fn pixels(&self) -> (u32, u32) {
        (
            (self.width_in * self.dpi as f64).round() as u32,
            (self.height_in * self.dpi as f64).round() as u32,
        )
    }

    pub fn pt(&self, points: f64) -> f64 {
        points * self.dpi as f64 / 72.0
    }

    fn px(&self, points: f64) -> u32 {
        self.pt(points).round().max(1.0) as u32
    }
}

/// Title, colour table and violin resolution for one chart.
#[derive(Debug, Clone)]
pub struct ChartStyle {
    pub title: String,
    pub violin_points: usize,
    pub box_fill: bool,
    palette: Vec<(String, RGBColor)>,
    fallback: RGBColor,
}

impl ChartStyle {
    pub fn for_job(config: &DatasetConfig, year: u16, grade: u8) -> Self {
        let palette = config
            .area_colors
            .iter()
            .map(|c| {
                let (r, g, b) = config.area_rgb(&c.area);
                (c.area.clone(), RGBColor(r, g, b))
            })
            .collect();
        let (r, g, b) = crate::config::FALLBACK_RGB;

        ChartStyle {
            title: config.title(year, grade),
            violin_points: config.violin_points,
            box_fill: config.box_fill,
            palette,
            fallback: RGBColor(r, g, b),
        }
    }

    pub fn fill_for(&self, area: &str) -> RGBColor {
        self.palette
            .iter()
            .find(|(name, _)| name == area)
            .map(|(_, color)| *color)
            .unwrap_or(self.fallback)
    }
}

/// The three quartile annotations drawn beside a column: text, anchor height, colour.
pub fn quartile_labels(q: &Quartiles) -> [(String, f64, RGBColor); 3] {
    [
        (format!("Q1={:.2}", q.q1), q.q1 - LABEL_DY, BLUE),
        (format!("Q2={:.2}", q.median), q.median - LABEL_DY, RED),
        (format!("Q3={:.2}", q.q3), q.q3 + LABEL_DY, GREEN),
    ]
}

/// Tick text for x position `x`: the area name at integer positions 1..=N,
/// nothing elsewhere.
pub fn tick_label(names: &[&str], x: f64) -> String {
    let nearest = x.round();
    if (x - nearest).abs() > TICK_EPSILON || nearest < 1.0 {
        return String::new();
    }
    names
        .get(nearest as usize - 1)
        .map(|s| s.to_string())
        .unwrap_or_default()
}

/// Renders one violin per area at x = 1..N with an overlaid box plot and
/// quartile labels, and writes the image to `path`.
///
/// Areas with no scores get a tick label but no shapes.
///
/// # Errors
///
/// Returns an error if the output directory cannot be created or the image
/// cannot be drawn or encoded.
pub fn render_grade_chart(
    canvas: &ChartCanvas,
    scores: &GradeScores,
    style: &ChartStyle,
    path: &Path,
) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }

    let names = scores.area_names();
    let n = names.len().max(1);
    let y_keys: Vec<f64> = (0..=5).map(|i| i as f64 * 0.2).collect();

    let root = BitMapBackend::new(path, canvas.pixels()).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(&style.title, (FONT, canvas.pt(12.0)))
        .margin(canvas.px(10.0))
        .x_label_area_size(canvas.px(30.0))
        .y_label_area_size(canvas.px(40.0))
        .build_cartesian_2d(0.5..n as f64 + 0.5, 0.0..Y_MAX)?;

    // Dashed gridlines go first so the violins cover them.
    for y in &y_keys {
        chart.draw_series(DashedLineSeries::new(
            vec![(0.5, *y), (n as f64 + 0.5, *y)],
            canvas.px(4.0),
            canvas.px(2.0),
            BLACK.mix(0.25).stroke_width(canvas.px(0.6)),
        ))?;
    }

    chart
        .configure_mesh()
        .disable_mesh()
        .axis_style(BLACK.stroke_width(canvas.px(0.8)))
        .x_labels(2 * n + 1)
        .y_labels(y_keys.len())
        .x_label_formatter(&|x: &f64| tick_label(&names, *x))
        .y_label_formatter(&|y: &f64| format!("{y:.1}"))
        .x_label_style((FONT, canvas.pt(10.0)))
        .y_label_style((FONT, canvas.pt(10.0)))
        .y_desc("accuracy rate")
        .axis_desc_style((FONT, canvas.pt(10.0)))
        .draw()?;

    for (i, area) in scores.areas.iter().enumerate() {
        let x = (i + 1) as f64;
        let Some(q) = quartiles(&area.scores) else {
            warn!(area = %area.name, "No scores for area, nothing drawn");
            continue;
        };
        let fill = style.fill_for(&area.name);
        draw_violin(&mut chart, canvas, x, &area.scores, &q, fill, style.violin_points)?;
        draw_box(&mut chart, canvas, x, &area.scores, &q, style.box_fill)?;
        draw_labels(&mut chart, canvas, x, &q)?;
        debug!(
            area = %area.name,
            n = area.scores.len(),
            q1 = q.q1,
            median = q.median,
            q3 = q.q3,
            "Area drawn"
        );
    }

    root.present()
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

fn draw_violin(
    chart: &mut Chart<'_, '_>,
    canvas: &ChartCanvas,
    x: f64,
    data: &[f64],
    q: &Quartiles,
    fill: RGBColor,
    points: usize,
) -> Result<()> {
    let outline = BLACK.stroke_width(canvas.px(0.8));

    match gaussian_kde(data, points) {
        Some(curve) => {
            let peak = curve.iter().map(|(_, d)| *d).fold(0.0, f64::max);
            let right = curve
                .iter()
                .map(|(y, d)| (x + d / peak * VIOLIN_HALF_WIDTH, *y));
            let left = curve
                .iter()
                .rev()
                .map(|(y, d)| (x - d / peak * VIOLIN_HALF_WIDTH, *y));
            let shape: Vec<(f64, f64)> = right.chain(left).collect();

            let mut ring = shape.clone();
            ring.push(shape[0]);

            chart.draw_series(std::iter::once(Polygon::new(
                shape,
                fill.mix(VIOLIN_ALPHA).filled(),
            )))?;
            chart.draw_series(std::iter::once(PathElement::new(ring, outline)))?;
        }
        None => {
            // No spread: a flat bar at the single value.
            let flat = vec![
                (x - VIOLIN_HALF_WIDTH, q.median),
                (x + VIOLIN_HALF_WIDTH, q.median),
            ];
            chart.draw_series(std::iter::once(PathElement::new(
                flat,
                fill.mix(VIOLIN_ALPHA).stroke_width(canvas.px(3.0)),
            )))?;
        }
    }

    let half = VIOLIN_HALF_WIDTH / 2.0;
    chart.draw_series(std::iter::once(PathElement::new(
        vec![(x - half, q.median), (x + half, q.median)],
        fill.stroke_width(canvas.px(1.0)),
    )))?;

    Ok(())
}

fn draw_box(
    chart: &mut Chart<'_, '_>,
    canvas: &ChartCanvas,
    x: f64,
    data: &[f64],
    q: &Quartiles,
    filled: bool,
) -> Result<()> {
    let line = BLACK.stroke_width(canvas.px(1.0));
    let corners = [(x - BOX_HALF_WIDTH, q.q3), (x + BOX_HALF_WIDTH, q.q1)];

    if let Some((lo, hi)) = whiskers(data, q) {
        chart.draw_series([
            PathElement::new(vec![(x, q.q1), (x, lo)], line),
            PathElement::new(vec![(x, q.q3), (x, hi)], line),
            PathElement::new(vec![(x - CAP_HALF_WIDTH, lo), (x + CAP_HALF_WIDTH, lo)], line),
            PathElement::new(vec![(x - CAP_HALF_WIDTH, hi), (x + CAP_HALF_WIDTH, hi)], line),
        ])?;
    }

    if filled {
        chart.draw_series(std::iter::once(Rectangle::new(corners, WHITE.filled())))?;
    }
    chart.draw_series(std::iter::once(Rectangle::new(corners, line)))?;
    chart.draw_series(std::iter::once(PathElement::new(
        vec![(x - BOX_HALF_WIDTH, q.median), (x + BOX_HALF_WIDTH, q.median)],
        BLACK.stroke_width(canvas.px(1.5)),
    )))?;

    Ok(())
}

fn draw_labels(
    chart: &mut Chart<'_, '_>,
    canvas: &ChartCanvas,
    x: f64,
    q: &Quartiles,
) -> Result<()> {
    let anchor = Pos::new(HPos::Left, VPos::Center);

    for (text, y, color) in quartile_labels(q) {
        let font = FontDesc::from((FONT, canvas.pt(9.0))).color(&color).pos(anchor);
        chart.draw_series(std::iter::once(Text::new(text, (x + LABEL_DX, y), font)))?;
    }

    Ok(())
}
