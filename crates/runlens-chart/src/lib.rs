//! Renders a run's metric history as a PNG line chart.
//!
//! The chart is drawn with plotters into an in-memory RGB buffer and PNG
//! encoded with the `image` crate, so the caller receives plain bytes and
//! nothing touches the filesystem.

use plotters::prelude::*;
use runlens_types::MetricSeries;
use std::fmt;

const WIDTH: u32 = 1000;
const HEIGHT: u32 = 600;

#[derive(Debug)]
pub enum ChartError {
    /// The series holds no plottable points.
    NoData,
    Render(String),
    Encode(image::ImageError),
}

impl fmt::Display for ChartError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChartError::NoData => write!(f, "no plottable metric data"),
            ChartError::Render(msg) => write!(f, "render failed: {}", msg),
            ChartError::Encode(err) => write!(f, "PNG encoding failed: {}", err),
        }
    }
}

impl std::error::Error for ChartError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ChartError::Encode(err) => Some(err),
            _ => None,
        }
    }
}

/// Draw one line per available metric (x = sample index in step order,
/// y = logged value) and return the encoded PNG.
pub fn render_metric_chart(run_name: &str, series: &MetricSeries) -> Result<Vec<u8>, ChartError> {
    let names = series.available();
    if names.is_empty() || series.is_empty() {
        return Err(ChartError::NoData);
    }

    let mut min_y = f64::INFINITY;
    let mut max_y = f64::NEG_INFINITY;
    for name in &names {
        for (_, value) in series.points(name) {
            min_y = min_y.min(value);
            max_y = max_y.max(value);
        }
    }
    if !min_y.is_finite() || !max_y.is_finite() {
        return Err(ChartError::NoData);
    }
    // Pad degenerate ranges so the axis build cannot fail on a constant
    // series or a single sample.
    if (max_y - min_y).abs() < f64::EPSILON {
        min_y -= 0.5;
        max_y += 0.5;
    }
    let max_x = series.len().saturating_sub(1).max(1) as f64;

    let mut rgb = vec![0u8; (WIDTH * HEIGHT * 3) as usize];
    {
        let root = BitMapBackend::with_buffer(&mut rgb, (WIDTH, HEIGHT)).into_drawing_area();
        root.fill(&WHITE).map_err(render_err)?;

        let caption = format!("Run: {} - Metrics: {}", run_name, names.join(", "));
        let mut chart = ChartBuilder::on(&root)
            .caption(caption, ("sans-serif", 22))
            .margin(12)
            .x_label_area_size(40)
            .y_label_area_size(60)
            .build_cartesian_2d(0f64..max_x, min_y..max_y)
            .map_err(render_err)?;

        chart
            .configure_mesh()
            .x_desc("Step")
            .y_desc("Value")
            .draw()
            .map_err(render_err)?;

        for (idx, name) in names.iter().enumerate() {
            let color = Palette99::pick(idx).mix(0.9);
            let points: Vec<(f64, f64)> = series
                .points(name)
                .into_iter()
                .map(|(i, v)| (i as f64, v))
                .collect();
            chart
                .draw_series(LineSeries::new(points, color.stroke_width(2)))
                .map_err(render_err)?
                .label(*name)
                .legend(move |(x, y)| {
                    PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2))
                });
        }

        chart
            .configure_series_labels()
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()
            .map_err(render_err)?;
        root.present().map_err(render_err)?;
    }

    let img = image::RgbImage::from_raw(WIDTH, HEIGHT, rgb)
        .ok_or_else(|| ChartError::Render("pixel buffer size mismatch".to_string()))?;
    let mut png = Vec::new();
    img.write_to(&mut std::io::Cursor::new(&mut png), image::ImageFormat::Png)
        .map_err(ChartError::Encode)?;
    Ok(png)
}

fn render_err<E: fmt::Display>(err: E) -> ChartError {
    ChartError::Render(err.to_string())
}
