use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use plotters::prelude::*;
use thiserror::Error;
use tracing::info;

use super::quantile;
use crate::documents::table::parse_number;
use crate::documents::Table;

const HISTOGRAM_BINS: usize = 10;
const SKY_BLUE: RGBColor = RGBColor(135, 206, 235);
const LIGHT_GREEN: RGBColor = RGBColor(144, 238, 144);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    BmiHistogram,
    HeightWeightScatter,
    GenderDistribution,
    BmiBoxplot,
}

impl ChartKind {
    pub fn title(self) -> &'static str {
        match self {
            ChartKind::BmiHistogram => "BMI Distribution",
            ChartKind::HeightWeightScatter => "Height vs. Weight",
            ChartKind::GenderDistribution => "Gender Distribution",
            ChartKind::BmiBoxplot => "BMI by Gender",
        }
    }
}

#[derive(Debug, Error)]
pub enum ChartError {
    #[error("missing column '{0}'")]
    MissingColumn(String),

    #[error("column '{0}' has no usable values")]
    NoData(String),

    #[error("rendering failed: {0}")]
    Render(String),

    #[error("could not read table: {0}")]
    Table(String),
}

/// Render `kind` from `table` into a PNG at `output_path`.
///
/// Columns are checked before anything is drawn, so a failed render leaves
/// any previous chart at `output_path` untouched.
pub fn render(table: &Table, kind: ChartKind, output_path: &Path) -> Result<PathBuf, ChartError> {
    if let Some(parent) = output_path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| ChartError::Render(e.to_string()))?;
    }

    let drawn = match kind {
        ChartKind::BmiHistogram => {
            let values = numeric(table, "BMI")?;
            write_histogram(output_path, &values, kind.title(), "BMI", "Frequency")
        }
        ChartKind::HeightWeightScatter => {
            let points = paired(table, "Height", "Weight")?;
            write_scatter(output_path, &points, kind.title(), "Height (cm)", "Weight (kg)")
        }
        ChartKind::GenderDistribution => {
            let counts = table
                .value_counts("Gender")
                .ok_or_else(|| ChartError::MissingColumn("Gender".to_string()))?;
            if counts.is_empty() {
                return Err(ChartError::NoData("Gender".to_string()));
            }
            write_bar_chart(output_path, &counts, kind.title(), "Gender", "Count")
        }
        ChartKind::BmiBoxplot => {
            let groups = grouped(table, "BMI", "Gender")?;
            write_boxplot(output_path, &groups, kind.title(), "Gender", "BMI")
        }
    };
    drawn.map_err(|e| ChartError::Render(e.to_string()))?;

    info!(chart = ?kind, path = %output_path.display(), "Chart generated");
    Ok(output_path.to_path_buf())
}

fn numeric(table: &Table, column: &str) -> Result<Vec<f64>, ChartError> {
    let values = table
        .numeric_column(column)
        .ok_or_else(|| ChartError::MissingColumn(column.to_string()))?;
    if values.is_empty() {
        return Err(ChartError::NoData(column.to_string()));
    }
    Ok(values)
}

fn paired(table: &Table, x: &str, y: &str) -> Result<Vec<(f64, f64)>, ChartError> {
    let x_idx = table
        .column_index(x)
        .ok_or_else(|| ChartError::MissingColumn(x.to_string()))?;
    let y_idx = table
        .column_index(y)
        .ok_or_else(|| ChartError::MissingColumn(y.to_string()))?;
    let points: Vec<(f64, f64)> = table
        .rows
        .iter()
        .filter_map(|row| {
            let xv = parse_number(&row[x_idx])?;
            let yv = parse_number(&row[y_idx])?;
            Some((xv, yv))
        })
        .collect();
    if points.is_empty() {
        return Err(ChartError::NoData(format!("{}/{}", x, y)));
    }
    Ok(points)
}

fn grouped(table: &Table, value: &str, by: &str) -> Result<BTreeMap<String, Vec<f64>>, ChartError> {
    let value_idx = table
        .column_index(value)
        .ok_or_else(|| ChartError::MissingColumn(value.to_string()))?;
    let group_idx = table
        .column_index(by)
        .ok_or_else(|| ChartError::MissingColumn(by.to_string()))?;
    let mut groups: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    for row in &table.rows {
        let label = row[group_idx].trim();
        if label.is_empty() {
            continue;
        }
        if let Some(v) = parse_number(&row[value_idx]) {
            groups.entry(label.to_string()).or_default().push(v);
        }
    }
    if groups.is_empty() {
        return Err(ChartError::NoData(value.to_string()));
    }
    Ok(groups)
}

fn padded_range(min: f64, max: f64) -> (f64, f64) {
    if (max - min).abs() < f64::EPSILON {
        (min - 0.5, max + 0.5)
    } else {
        let pad = (max - min) * 0.05;
        (min - pad, max + pad)
    }
}

/// Equal-width bin counts over `[min, max]`; the last bin is closed.
pub fn histogram_bins(values: &[f64], bins: usize) -> (f64, f64, Vec<usize>) {
    let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let (lo, hi) = if (max - min).abs() < f64::EPSILON {
        (min - 0.5, max + 0.5)
    } else {
        (min, max)
    };
    let width = (hi - lo) / bins as f64;
    let mut counts = vec![0usize; bins];
    for v in values {
        let idx = (((v - lo) / width).floor() as usize).min(bins - 1);
        counts[idx] += 1;
    }
    (lo, hi, counts)
}

fn write_histogram(
    output_path: &Path,
    values: &[f64],
    title: &str,
    x_desc: &str,
    y_desc: &str,
) -> anyhow::Result<()> {
    let (lo, hi, counts) = histogram_bins(values, HISTOGRAM_BINS);
    let width = (hi - lo) / HISTOGRAM_BINS as f64;
    let max_count = counts.iter().copied().max().unwrap_or(0) as f64;

    let root = BitMapBackend::new(output_path, (640, 480)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .margin(20)
        .caption(title, ("sans-serif", 24))
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(lo..hi, 0f64..(max_count + 1.0))?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_desc(x_desc)
        .y_desc(y_desc)
        .draw()?;

    chart.draw_series(counts.iter().enumerate().map(|(idx, count)| {
        let x0 = lo + width * idx as f64;
        Rectangle::new([(x0, 0.0), (x0 + width, *count as f64)], SKY_BLUE.filled())
    }))?;
    chart.draw_series(counts.iter().enumerate().map(|(idx, count)| {
        let x0 = lo + width * idx as f64;
        Rectangle::new([(x0, 0.0), (x0 + width, *count as f64)], BLACK.stroke_width(1))
    }))?;

    root.present()?;
    Ok(())
}

fn write_scatter(
    output_path: &Path,
    points: &[(f64, f64)],
    title: &str,
    x_desc: &str,
    y_desc: &str,
) -> anyhow::Result<()> {
    let (x_min, x_max) = padded_range(
        points.iter().map(|p| p.0).fold(f64::INFINITY, f64::min),
        points.iter().map(|p| p.0).fold(f64::NEG_INFINITY, f64::max),
    );
    let (y_min, y_max) = padded_range(
        points.iter().map(|p| p.1).fold(f64::INFINITY, f64::min),
        points.iter().map(|p| p.1).fold(f64::NEG_INFINITY, f64::max),
    );

    let root = BitMapBackend::new(output_path, (640, 480)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .margin(20)
        .caption(title, ("sans-serif", 24))
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(x_min..x_max, y_min..y_max)?;

    chart.configure_mesh().x_desc(x_desc).y_desc(y_desc).draw()?;

    chart.draw_series(points.iter().map(|(x, y)| Circle::new((*x, *y), 3, BLUE.filled())))?;

    root.present()?;
    Ok(())
}

fn write_bar_chart(
    output_path: &Path,
    counts: &[(String, usize)],
    title: &str,
    x_desc: &str,
    y_desc: &str,
) -> anyhow::Result<()> {
    let max_count = counts.iter().map(|(_, c)| *c).max().unwrap_or(0) as f64;

    let root = BitMapBackend::new(output_path, (640, 480)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .margin(20)
        .caption(title, ("sans-serif", 24))
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(0f64..counts.len() as f64, 0f64..(max_count + 1.0))?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(counts.len() * 2 + 1)
        .x_label_formatter(&|x| {
            // labels sit at bar centres
            let idx = x.floor() as usize;
            if (x - idx as f64 - 0.5).abs() < 1e-6 {
                counts.get(idx).map(|c| c.0.clone()).unwrap_or_default()
            } else {
                String::new()
            }
        })
        .x_desc(x_desc)
        .y_desc(y_desc)
        .draw()?;

    for (idx, (_label, count)) in counts.iter().enumerate() {
        let x0 = idx as f64 + 0.1;
        let x1 = idx as f64 + 0.9;
        chart.draw_series(std::iter::once(Rectangle::new(
            [(x0, 0.0), (x1, *count as f64)],
            LIGHT_GREEN.filled(),
        )))?;
        chart.draw_series(std::iter::once(Rectangle::new(
            [(x0, 0.0), (x1, *count as f64)],
            BLACK.stroke_width(1),
        )))?;
    }

    root.present()?;
    Ok(())
}

fn write_boxplot(
    output_path: &Path,
    groups: &BTreeMap<String, Vec<f64>>,
    title: &str,
    x_desc: &str,
    y_desc: &str,
) -> anyhow::Result<()> {
    let labels: Vec<&String> = groups.keys().collect();
    let mut global_min = f64::INFINITY;
    let mut global_max = f64::NEG_INFINITY;
    let mut stats = Vec::with_capacity(groups.len());
    for values in groups.values() {
        let mut v = values.clone();
        v.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        let (min, max) = (v[0], v[v.len() - 1]);
        global_min = global_min.min(min);
        global_max = global_max.max(max);
        stats.push((quantile(&v, 0.25), quantile(&v, 0.5), quantile(&v, 0.75), min, max));
    }
    let (y_min, y_max) = padded_range(global_min, global_max);

    let root = BitMapBackend::new(output_path, (640, 480)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .margin(20)
        .caption(title, ("sans-serif", 24))
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(0f64..labels.len() as f64, y_min..y_max)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(labels.len() * 2 + 1)
        .x_label_formatter(&|x| {
            let idx = x.floor() as usize;
            if (x - idx as f64 - 0.5).abs() < 1e-6 {
                labels.get(idx).map(|l| l.to_string()).unwrap_or_default()
            } else {
                String::new()
            }
        })
        .x_desc(x_desc)
        .y_desc(y_desc)
        .draw()?;

    for (idx, (q1, median, q3, min, max)) in stats.iter().enumerate() {
        let left = idx as f64 + 0.25;
        let right = idx as f64 + 0.75;
        let centre = idx as f64 + 0.5;
        chart.draw_series(std::iter::once(Rectangle::new([(left, *q1), (right, *q3)], BLUE.mix(0.3).filled())))?;
        chart.draw_series(std::iter::once(Rectangle::new([(left, *q1), (right, *q3)], BLUE.stroke_width(1))))?;
        chart.draw_series(std::iter::once(PathElement::new(vec![(left, *median), (right, *median)], GREEN.stroke_width(2))))?;
        chart.draw_series(std::iter::once(PathElement::new(vec![(centre, *q3), (centre, *max)], &BLACK)))?;
        chart.draw_series(std::iter::once(PathElement::new(vec![(centre, *q1), (centre, *min)], &BLACK)))?;
    }

    root.present()?;
    Ok(())
}
