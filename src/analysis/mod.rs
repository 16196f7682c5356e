//! Tabular analysis: descriptive statistics, charts and the text report.

pub mod charts;
pub mod report;

use crate::documents::Table;

/// Summary of one numeric column, in the spirit of a dataframe `describe()`
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct DescriptiveStat {
    pub column: String,
    pub count: usize,
    pub mean: f64,
    /// Sample standard deviation; NaN with fewer than two values
    pub std_dev: f64,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
}

pub fn describe(table: &Table) -> Vec<DescriptiveStat> {
    table
        .numeric_columns()
        .into_iter()
        .filter_map(|(column, values)| describe_values(column, values))
        .collect()
}

pub fn describe_values(column: String, mut values: Vec<f64>) -> Option<DescriptiveStat> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let count = values.len();
    let mean = values.iter().sum::<f64>() / count as f64;
    Some(DescriptiveStat {
        column,
        count,
        mean,
        std_dev: std_dev(&values, mean),
        min: values[0],
        q1: quantile(&values, 0.25),
        median: quantile(&values, 0.5),
        q3: quantile(&values, 0.75),
        max: values[count - 1],
    })
}

fn std_dev(values: &[f64], mean: f64) -> f64 {
    if values.len() < 2 {
        return f64::NAN;
    }
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (values.len() as f64 - 1.0);
    variance.sqrt()
}

/// Linearly interpolated quantile of already sorted values.
pub fn quantile(sorted: &[f64], q: f64) -> f64 {
    match sorted.len() {
        0 => f64::NAN,
        1 => sorted[0],
        n => {
            let pos = q.clamp(0.0, 1.0) * (n - 1) as f64;
            let lower = pos.floor() as usize;
            let upper = pos.ceil() as usize;
            let frac = pos - lower as f64;
            sorted[lower] + (sorted[upper] - sorted[lower]) * frac
        }
    }
}
