use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use tracing::info;

use super::{describe, DescriptiveStat};
use crate::documents::Table;

pub const NO_DATA_MESSAGE: &str = "No tabular data available for report generation.";

/// Write the summary report for `table` to `output_path`, replacing any previous report.
pub fn summarize(table: Option<&Table>, output_path: &Path) -> std::io::Result<PathBuf> {
    let report = build_report(table, chrono::Local::now().naive_local());
    if let Some(parent) = output_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(output_path, report)?;
    info!(path = %output_path.display(), "Report generated");
    Ok(output_path.to_path_buf())
}

pub fn build_report(table: Option<&Table>, generated_at: NaiveDateTime) -> String {
    let mut report = format!(
        "Report Generated on {}\n\n",
        generated_at.format("%Y-%m-%d %H:%M:%S")
    );
    let stats = table.map(describe).unwrap_or_default();
    if stats.is_empty() {
        report.push_str(NO_DATA_MESSAGE);
    } else {
        report.push_str(&format_stats(&stats));
    }
    report
}

/// Statistic names down the side, one column per numeric field.
fn format_stats(stats: &[DescriptiveStat]) -> String {
    let rows: [(&str, fn(&DescriptiveStat) -> f64); 8] = [
        ("count", |s| s.count as f64),
        ("mean", |s| s.mean),
        ("std", |s| s.std_dev),
        ("min", |s| s.min),
        ("25%", |s| s.q1),
        ("50%", |s| s.median),
        ("75%", |s| s.q3),
        ("max", |s| s.max),
    ];

    let cells: Vec<Vec<String>> = rows
        .iter()
        .map(|(_, get)| stats.iter().map(|s| format_value(get(s))).collect())
        .collect();

    let label_width = rows.iter().map(|(l, _)| l.len()).max().unwrap_or(0);
    let widths: Vec<usize> = stats
        .iter()
        .enumerate()
        .map(|(col, stat)| {
            cells
                .iter()
                .map(|row| row[col].len())
                .chain(std::iter::once(stat.column.chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let mut lines = Vec::with_capacity(rows.len() + 1);
    let mut header = " ".repeat(label_width);
    for (stat, width) in stats.iter().zip(&widths) {
        header.push_str(&format!("  {:>width$}", stat.column, width = width));
    }
    lines.push(header);

    for ((label, _), row) in rows.iter().zip(&cells) {
        let mut line = format!("{:<width$}", label, width = label_width);
        for (cell, width) in row.iter().zip(&widths) {
            line.push_str(&format!("  {:>width$}", cell, width = width));
        }
        lines.push(line);
    }
    lines.join("\n")
}

fn format_value(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else {
        format!("{:.6}", value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn at() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 9)
            .unwrap()
            .and_hms_opt(14, 5, 0)
            .unwrap()
    }

    #[test]
    fn test_report_without_table() {
        let report = build_report(None, at());
        assert_eq!(
            report,
            "Report Generated on 2024-03-09 14:05:00\n\nNo tabular data available for report generation."
        );
    }

    #[test]
    fn test_report_without_numeric_columns() {
        let table = Table::from_csv_str("Name\nAda\n").unwrap();
        assert!(build_report(Some(&table), at()).ends_with(NO_DATA_MESSAGE));
    }

    #[test]
    fn test_report_grid() {
        let table = Table::from_csv_str("Name,BMI\nAda,20\nBob,30\n").unwrap();
        let report = build_report(Some(&table), at());
        let lines: Vec<&str> = report.lines().collect();
        assert_eq!(lines[2].trim(), "BMI");
        assert_eq!(lines[3], "count   2.000000");
        assert_eq!(lines[4], "mean   25.000000");
        assert!(lines[5].starts_with("std"));
        assert_eq!(lines[10], "max    30.000000");
    }

    #[test]
    fn test_summarize_overwrites() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("static").join("report.txt");
        summarize(None, &path).unwrap();
        let table = Table::from_csv_str("x\n1\n2\n").unwrap();
        summarize(Some(&table), &path).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("count"));
        assert!(!content.contains(NO_DATA_MESSAGE));
    }
}
