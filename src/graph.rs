#![cfg(feature = "web")]
use crate::chart::{ChartKind, Figure, Trace};
use crate::cell::CellValue;
use image::codecs::png::PngEncoder;
use image::{ColorType, ImageEncoder};
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use std::error::Error;
use std::f64::consts::TAU;
use std::ops::Range;

/// Number of shared bins used when rasterizing a histogram
const HISTOGRAM_BINS: usize = 10;

#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    #[error("the figure has no traces to draw")]
    NothingToDraw,

    #[error("failed to draw the chart: {0}")]
    Draw(String),

    #[error("failed to encode the chart as PNG: {0}")]
    Encode(#[from] image::ImageError),
}

/// Size of the rendered image and whether text is drawn
#[derive(Clone, Debug)]
pub struct GraphOptions {
    /// Width of the graph in pixels
    pub width: u32,

    /// Height of the graph in pixels
    pub height: u32,

    /// Draw the caption, axis labels, legend and wedge labels. Text needs a
    /// system sans-serif font; without it only the plotted shapes are drawn.
    pub labels: bool,
}

impl Default for GraphOptions {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
            labels: true,
        }
    }
}

/// Rasterizes a figure to PNG bytes
///
/// This is the static counterpart of the interactive plotly chart: the same
/// traces drawn with plotters into an in-memory buffer. Values that are not
/// numbers are skipped on numeric axes.
///
/// # Arguments
/// * `figure` - Figure built by [`crate::chart::build_figure`]
/// * `options` - Image size and text switch
///
/// # Returns
/// * A Result containing the PNG image data as bytes or an error
pub fn render_png(figure: &Figure, options: &GraphOptions) -> Result<Vec<u8>, GraphError> {
    if figure.data.is_empty() {
        return Err(GraphError::NothingToDraw);
    }

    let (width, height) = (options.width, options.height);
    let mut pixels = vec![0u8; width as usize * height as usize * 3];
    {
        let root = BitMapBackend::with_buffer(&mut pixels, (width, height)).into_drawing_area();
        draw(&root, figure, options.labels).map_err(|e| GraphError::Draw(e.to_string()))?;
    }

    let mut png = Vec::new();
    PngEncoder::new(&mut png).write_image(&pixels, width, height, ColorType::Rgb8)?;
    Ok(png)
}

type Area<'a> = DrawingArea<BitMapBackend<'a>, Shift>;

fn draw(root: &Area, figure: &Figure, labels: bool) -> Result<(), Box<dyn Error>> {
    root.fill(&WHITE)?;
    let title = labels.then_some(figure.layout.title.as_str());

    match figure.kind {
        ChartKind::Line => draw_lines(root, title, &figure.data, false)?,
        ChartKind::Scatter => draw_lines(root, title, &figure.data, true)?,
        ChartKind::Bar => draw_bars(root, title, &figure.data)?,
        ChartKind::Pie => draw_pie(root, title, &figure.data[0])?,
        ChartKind::Histogram => draw_histogram(root, title, &figure.data)?,
        ChartKind::ThreeD => draw_points_3d(root, title, &figure.data)?,
    }

    root.present()?;
    Ok(())
}

/// Chart builder with the shared margins; caption and label areas only when
/// text is drawn.
fn chart_builder<'a, 'b>(
    root: &'a Area<'b>,
    title: Option<&str>,
) -> ChartBuilder<'a, 'b, BitMapBackend<'b>> {
    let mut builder = ChartBuilder::on(root);
    builder.margin(10);
    if let Some(title) = title {
        builder
            .caption(title, ("sans-serif", 30).into_font())
            .x_label_area_size(30)
            .y_label_area_size(40);
    }
    builder
}

fn numbers(values: Option<&Vec<CellValue>>) -> Vec<Option<f64>> {
    values
        .map(|values| values.iter().map(CellValue::as_f64).collect())
        .unwrap_or_default()
}

/// Pairs up x and y, keeping only points where both are numeric.
fn points(trace: &Trace) -> Vec<(f64, f64)> {
    numbers(trace.x.as_ref())
        .into_iter()
        .zip(numbers(trace.y.as_ref()))
        .filter_map(|(x, y)| Some((x?, y?)))
        .collect()
}

/// Padded range covering `values`; an empty input gives `0..1`.
fn span(values: impl IntoIterator<Item = f64>) -> Range<f64> {
    let (min, max) = values
        .into_iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });

    if min > max {
        return 0.0..1.0;
    }
    if min == max {
        return min - 1.0..max + 1.0;
    }
    let pad = (max - min) * 0.05;
    min - pad..max + pad
}

/// Counts each sample set into [`HISTOGRAM_BINS`] equal bins over `range`.
///
/// Values outside the range are clamped into the first or last bin, so a
/// value sitting on `range.end` is counted in the last one.
fn bin_counts(samples: &[Vec<f64>], range: &Range<f64>) -> Vec<Vec<usize>> {
    let bin_width = (range.end - range.start) / HISTOGRAM_BINS as f64;

    samples
        .iter()
        .map(|values| {
            let mut bins = vec![0usize; HISTOGRAM_BINS];
            for v in values {
                // `as` saturates negatives to 0
                let slot = ((v - range.start) / bin_width) as usize;
                bins[slot.min(HISTOGRAM_BINS - 1)] += 1;
            }
            bins
        })
        .collect()
}

/// Outline of each pie wedge, starting at angle zero and going clockwise in
/// screen space. A zero total gives no wedges.
fn wedges(center: (i32, i32), radius: f64, sizes: &[f64]) -> Vec<Vec<(i32, i32)>> {
    let total: f64 = sizes.iter().sum();
    if total <= 0.0 {
        return Vec::new();
    }

    let mut start = 0.0;
    sizes
        .iter()
        .map(|size| {
            let sweep = size / total * TAU;
            // One edge point per degree keeps the arc smooth
            let steps = (sweep.to_degrees().ceil() as usize).max(1);
            let mut outline = vec![center];
            outline.extend((0..=steps).map(|step| {
                let theta = start + sweep * step as f64 / steps as f64;
                polar(center, radius, theta)
            }));
            start += sweep;
            outline
        })
        .collect()
}

fn polar(center: (i32, i32), radius: f64, theta: f64) -> (i32, i32) {
    (
        center.0 + (radius * theta.cos()).round() as i32,
        center.1 + (radius * theta.sin()).round() as i32,
    )
}

fn draw_lines(
    root: &Area,
    title: Option<&str>,
    traces: &[Trace],
    markers: bool,
) -> Result<(), Box<dyn Error>> {
    let series: Vec<(&str, Vec<(f64, f64)>)> =
        traces.iter().map(|t| (t.name.as_str(), points(t))).collect();

    let x_range = span(series.iter().flat_map(|(_, pts)| pts.iter().map(|p| p.0)));
    let y_range = span(series.iter().flat_map(|(_, pts)| pts.iter().map(|p| p.1)));

    let mut chart = chart_builder(root, title).build_cartesian_2d(x_range, y_range)?;
    if title.is_some() {
        chart.configure_mesh().draw()?;
    }

    for (index, (name, pts)) in series.into_iter().enumerate() {
        let color = Palette99::pick(index).to_rgba();
        chart
            .draw_series(LineSeries::new(pts.iter().copied(), color.stroke_width(2)))?
            .label(name)
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));

        if markers {
            chart.draw_series(pts.iter().map(|&p| Circle::new(p, 4, color.filled())))?;
        }
    }

    if title.is_some() {
        chart
            .configure_series_labels()
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()?;
    }

    Ok(())
}

fn draw_bars(root: &Area, title: Option<&str>, traces: &[Trace]) -> Result<(), Box<dyn Error>> {
    // Every bar trace shares the column names as its categories
    let categories: Vec<String> = traces[0]
        .x
        .iter()
        .flatten()
        .map(CellValue::to_string)
        .collect();
    let heights: Vec<Vec<Option<f64>>> = traces.iter().map(|t| numbers(t.y.as_ref())).collect();

    let y_range = span(
        heights
            .iter()
            .flatten()
            .flatten()
            .copied()
            .chain(std::iter::once(0.0)),
    );
    let x_range = -0.5..categories.len().max(1) as f64 - 0.5;

    let label_for = |x: &f64| {
        let index = x.round();
        if (x - index).abs() < 1e-6 && index >= 0.0 {
            categories.get(index as usize).cloned().unwrap_or_default()
        } else {
            String::new()
        }
    };

    let mut chart = chart_builder(root, title).build_cartesian_2d(x_range, y_range)?;
    if title.is_some() {
        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(categories.len().max(1))
            .x_label_formatter(&label_for)
            .draw()?;
    }

    let group = traces.len() as f64;
    let width = 0.8 / group;

    for (index, (trace, bars)) in traces.iter().zip(&heights).enumerate() {
        let color = Palette99::pick(index).to_rgba();
        let offset = -0.4 + width * index as f64;

        // Extra values beyond the category count have nowhere to go
        let rects = bars
            .iter()
            .take(categories.len())
            .enumerate()
            .filter_map(|(slot, h)| h.map(|h| (slot, h)))
            .map(|(slot, h)| {
                let left = slot as f64 + offset;
                Rectangle::new([(left, 0.0), (left + width, h)], color.filled())
            });

        chart
            .draw_series(rects)?
            .label(trace.name.as_str())
            .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], color.filled()));
    }

    if title.is_some() {
        chart
            .configure_series_labels()
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()?;
    }

    Ok(())
}

fn draw_pie(root: &Area, title: Option<&str>, trace: &Trace) -> Result<(), Box<dyn Error>> {
    let area = match title {
        Some(title) => root.titled(title, ("sans-serif", 30).into_font())?,
        None => root.clone(),
    };
    let (width, height) = area.dim_in_pixel();

    let labels: Vec<String> = trace.labels.clone().unwrap_or_default();
    let sizes: Vec<f64> = trace
        .values
        .iter()
        .flatten()
        .map(|v| *v as f64)
        .collect();

    let center = (width as i32 / 2, height as i32 / 2);
    let radius = f64::from(width.min(height)) * 0.35;

    let total: f64 = sizes.iter().sum();
    let mut start = 0.0;
    for (index, outline) in wedges(center, radius, &sizes).into_iter().enumerate() {
        let (r, g, b) = Palette99::pick(index).rgb();
        area.draw(&Polygon::new(outline, RGBColor(r, g, b).filled()))?;

        let sweep = sizes[index] / total * TAU;
        if let (Some(_), Some(label)) = (title, labels.get(index)) {
            let (x, y) = polar(center, radius * 1.1, start + sweep / 2.0);
            let hpos = if x < center.0 { HPos::Right } else { HPos::Left };
            let style = ("sans-serif", 16)
                .into_font()
                .color(&BLACK)
                .pos(Pos::new(hpos, VPos::Center));
            area.draw(&Text::new(label.as_str(), (x, y), style))?;
        }
        start += sweep;
    }

    Ok(())
}

fn draw_histogram(
    root: &Area,
    title: Option<&str>,
    traces: &[Trace],
) -> Result<(), Box<dyn Error>> {
    let samples: Vec<Vec<f64>> = traces
        .iter()
        .map(|t| numbers(t.x.as_ref()).into_iter().flatten().collect())
        .collect();

    let range = span(samples.iter().flatten().copied());
    let bin_width = (range.end - range.start) / HISTOGRAM_BINS as f64;
    let counts = bin_counts(&samples, &range);

    let tallest = counts.iter().flatten().copied().max().unwrap_or(0).max(1);

    let mut chart =
        chart_builder(root, title).build_cartesian_2d(range.clone(), 0.0..tallest as f64 * 1.1)?;
    if title.is_some() {
        chart.configure_mesh().y_desc("count").draw()?;
    }

    for (index, (trace, bins)) in traces.iter().zip(&counts).enumerate() {
        let color = Palette99::pick(index).to_rgba();
        let rects = bins.iter().enumerate().filter(|(_, c)| **c > 0).map(|(slot, c)| {
            let left = range.start + bin_width * slot as f64;
            Rectangle::new([(left, 0.0), (left + bin_width, *c as f64)], color.mix(0.5).filled())
        });

        chart
            .draw_series(rects)?
            .label(trace.name.as_str())
            .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], color.filled()));
    }

    if title.is_some() {
        chart
            .configure_series_labels()
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()?;
    }

    Ok(())
}

fn draw_points_3d(
    root: &Area,
    title: Option<&str>,
    traces: &[Trace],
) -> Result<(), Box<dyn Error>> {
    let series: Vec<Vec<(f64, f64, f64)>> = traces
        .iter()
        .map(|t| {
            numbers(t.x.as_ref())
                .into_iter()
                .zip(numbers(t.y.as_ref()))
                .zip(numbers(t.z.as_ref()))
                .filter_map(|((x, y), z)| Some((x?, y?, z?)))
                .collect()
        })
        .collect();

    let x_range = span(series.iter().flatten().map(|p| p.0));
    let y_range = span(series.iter().flatten().map(|p| p.1));
    let z_range = span(series.iter().flatten().map(|p| p.2));

    let mut builder = ChartBuilder::on(root);
    builder.margin(20);
    if let Some(title) = title {
        builder.caption(title, ("sans-serif", 30).into_font());
    }
    let mut chart = builder.build_cartesian_3d(x_range, y_range, z_range)?;
    if title.is_some() {
        chart.configure_axes().draw()?;
    }

    for (index, (trace, pts)) in traces.iter().zip(&series).enumerate() {
        let color = Palette99::pick(index).to_rgba();
        chart
            .draw_series(pts.iter().map(|&p| Circle::new(p, 3, color.filled())))?
            .label(trace.name.as_str())
            .legend(move |(x, y)| Circle::new((x + 5, y), 4, color.filled()));
    }

    if title.is_some() {
        chart
            .configure_series_labels()
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()?;
    }

    Ok(())
}
