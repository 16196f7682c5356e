use std::collections::HashMap;
use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader};
use csv::ReaderBuilder;

use super::text::decode_text;
use super::{ExtractError, Extension};

/// A rectangular dataset: one header row and string cells.
///
/// Every row has exactly `headers.len()` cells; short rows are padded with
/// empty strings and long rows are truncated.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let width = headers.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, String::new());
                row
            })
            .collect();
        Self { headers, rows }
    }

    /// Load a tabular document by extension (`csv`, `xls`, `xlsx`)
    pub fn load(path: &Path, extension: Extension) -> Result<Self, ExtractError> {
        match extension {
            Extension::Csv => Self::from_csv_path(path),
            Extension::Xls | Extension::Xlsx => Self::from_spreadsheet(path),
            other => Err(ExtractError::UnsupportedExtension(other.to_string())),
        }
    }

    /// Parse a CSV file, decoding it as UTF-8 or Latin-1
    pub fn from_csv_path(path: &Path) -> Result<Self, ExtractError> {
        let bytes = std::fs::read(path)?;
        Self::from_csv_str(&decode_text(bytes))
    }

    pub fn from_csv_str(data: &str) -> Result<Self, ExtractError> {
        let mut rdr = ReaderBuilder::new()
            .flexible(true)
            .from_reader(data.as_bytes());

        let headers: Vec<String> = rdr.headers()?.iter().map(|h| h.to_string()).collect();
        if headers.is_empty() || headers.iter().all(|h| h.is_empty()) {
            return Err(ExtractError::EmptyTable);
        }

        let mut rows = Vec::new();
        for record in rdr.records() {
            let record = record?;
            rows.push(record.iter().map(|v| v.to_string()).collect());
        }

        Ok(Self::new(name_unnamed(headers), rows))
    }

    /// Read the first worksheet of an `xls`/`xlsx` workbook
    pub fn from_spreadsheet(path: &Path) -> Result<Self, ExtractError> {
        let mut workbook = open_workbook_auto(path)?;
        let range = workbook
            .worksheet_range_at(0)
            .ok_or(ExtractError::EmptyTable)??;

        let mut rows = range.rows();
        let headers: Vec<String> = match rows.next() {
            Some(header_row) => header_row.iter().map(cell_to_string).collect(),
            None => return Err(ExtractError::EmptyTable),
        };

        let body = rows
            .map(|row| row.iter().map(cell_to_string).collect())
            .collect();

        Ok(Self::new(name_unnamed(headers), body))
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Raw cell values of a column
    pub fn column(&self, name: &str) -> Option<Vec<&str>> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(|row| row[idx].as_str()).collect())
    }

    /// Values of a column that parse as numbers; blanks and text are skipped
    pub fn numeric_column(&self, name: &str) -> Option<Vec<f64>> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().filter_map(|row| parse_number(&row[idx])).collect())
    }

    /// Columns where every non-blank cell is a number and at least one cell is present
    pub fn numeric_columns(&self) -> Vec<(String, Vec<f64>)> {
        let mut out = Vec::new();
        for (idx, header) in self.headers.iter().enumerate() {
            let mut values = Vec::with_capacity(self.rows.len());
            let mut numeric = true;
            for row in &self.rows {
                let cell = row[idx].trim();
                if cell.is_empty() {
                    continue;
                }
                match parse_number(cell) {
                    Some(v) => values.push(v),
                    None => {
                        numeric = false;
                        break;
                    }
                }
            }
            if numeric && !values.is_empty() {
                out.push((header.clone(), values));
            }
        }
        out
    }

    /// Value counts of a column, most frequent first, ties in first-seen order
    pub fn value_counts(&self, name: &str) -> Option<Vec<(String, usize)>> {
        let idx = self.column_index(name)?;
        let mut order: Vec<String> = Vec::new();
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for row in &self.rows {
            let value = row[idx].as_str();
            if value.trim().is_empty() {
                continue;
            }
            let entry = counts.entry(value).or_insert(0);
            if *entry == 0 {
                order.push(value.to_string());
            }
            *entry += 1;
        }
        let mut result: Vec<(String, usize)> = order
            .into_iter()
            .map(|v| {
                let count = counts.get(v.as_str()).copied().unwrap_or(0);
                (v, count)
            })
            .collect();
        // stable sort keeps first-seen order among ties
        result.sort_by(|a, b| b.1.cmp(&a.1));
        Some(result)
    }

    /// Render as a Markdown pipe table. Numeric columns are right aligned.
    pub fn to_markdown(&self) -> String {
        let numeric: Vec<bool> = (0..self.headers.len())
            .map(|idx| {
                let mut any = false;
                for row in &self.rows {
                    let cell = row[idx].trim();
                    if cell.is_empty() {
                        continue;
                    }
                    if parse_number(cell).is_none() {
                        return false;
                    }
                    any = true;
                }
                any
            })
            .collect();

        let widths: Vec<usize> = self
            .headers
            .iter()
            .enumerate()
            .map(|(idx, header)| {
                self.rows
                    .iter()
                    .map(|row| row[idx].chars().count())
                    .chain(std::iter::once(header.chars().count()))
                    .max()
                    .unwrap_or(0)
                    .max(3)
            })
            .collect();

        let mut lines = Vec::with_capacity(self.rows.len() + 2);
        lines.push(format_row(&self.headers, &widths, &numeric));

        let separator: Vec<String> = widths
            .iter()
            .zip(&numeric)
            .map(|(w, is_num)| {
                if *is_num {
                    format!("{}:", "-".repeat(w + 1))
                } else {
                    format!(":{}", "-".repeat(w + 1))
                }
            })
            .collect();
        lines.push(format!("|{}|", separator.join("|")));

        for row in &self.rows {
            lines.push(format_row(row, &widths, &numeric));
        }
        lines.join("\n")
    }
}

fn format_row(cells: &[String], widths: &[usize], numeric: &[bool]) -> String {
    let padded: Vec<String> = cells
        .iter()
        .zip(widths)
        .zip(numeric)
        .map(|((cell, width), is_num)| {
            if *is_num {
                format!(" {:>width$} ", cell, width = width)
            } else {
                format!(" {:<width$} ", cell, width = width)
            }
        })
        .collect();
    format!("|{}|", padded.join("|"))
}

/// Finite numbers only; `inf`, `NaN` and overflowing literals are rejected
pub(crate) fn parse_number(cell: &str) -> Option<f64> {
    cell.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        other => other.to_string(),
    }
}

/// Blank header cells get positional names so columns stay addressable.
fn name_unnamed(headers: Vec<String>) -> Vec<String> {
    headers
        .into_iter()
        .enumerate()
        .map(|(idx, h)| {
            if h.trim().is_empty() {
                format!("Unnamed: {}", idx)
            } else {
                h
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Table {
        Table::from_csv_str("Name,Gender,BMI\nAda,F,21.5\nBob,M,27\nCy,M,\nDee,F,19.0\nEve,F,x\n").unwrap()
    }

    #[test]
    fn test_parse_csv() {
        let table = sample();
        assert_eq!(table.headers, vec!["Name", "Gender", "BMI"]);
        assert_eq!(table.rows.len(), 5);
        assert_eq!(table.column("Name").unwrap()[1], "Bob");
    }

    #[test]
    fn test_ragged_rows_are_normalized() {
        let table = Table::from_csv_str("a,b,c\n1\n1,2,3,4\n").unwrap();
        assert_eq!(table.rows[0], vec!["1", "", ""]);
        assert_eq!(table.rows[1], vec!["1", "2", "3"]);
    }

    #[test]
    fn test_empty_csv_is_an_error() {
        assert!(matches!(Table::from_csv_str(""), Err(ExtractError::EmptyTable)));
    }

    #[test]
    fn test_numeric_column_skips_blanks_and_text() {
        let table = sample();
        assert_eq!(table.numeric_column("BMI").unwrap(), vec![21.5, 27.0, 19.0]);
        assert!(table.numeric_column("Height").is_none());
    }

    #[test]
    fn test_numeric_columns_require_all_numeric() {
        let table = Table::from_csv_str("Height,Weight,Name\n170,65,a\n180,,b\n").unwrap();
        let cols = table.numeric_columns();
        let names: Vec<&str> = cols.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["Height", "Weight"]);
        assert_eq!(cols[1].1, vec![65.0]);
    }

    #[test]
    fn test_value_counts_ordering() {
        let table = sample();
        let counts = table.value_counts("Gender").unwrap();
        assert_eq!(counts, vec![("F".to_string(), 3), ("M".to_string(), 2)]);
    }

    #[test]
    fn test_markdown_rendering() {
        let table = Table::from_csv_str("Name,BMI\nAda,21.5\nBob,27\n").unwrap();
        let md = table.to_markdown();
        let lines: Vec<&str> = md.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "| Name |  BMI |");
        assert_eq!(lines[1], "|:-----|-----:|");
        assert_eq!(lines[2], "| Ada  | 21.5 |");
        assert_eq!(lines[3], "| Bob  |   27 |");
    }

    fn fixture(name: &str) -> std::path::PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("tests").join("fixtures").join(name)
    }

    #[test]
    fn test_xlsx_first_sheet() {
        let table = Table::load(&fixture("people.xlsx"), Extension::Xlsx).unwrap();
        assert_eq!(table.headers, vec!["Name", "BMI"]);
        assert_eq!(table.rows, vec![vec!["Ada", "21.5"], vec!["Bob", "27"]]);

        let md = table.to_markdown();
        let lines: Vec<&str> = md.lines().collect();
        assert_eq!(lines, vec!["| Name |  BMI |", "|:-----|-----:|", "| Ada  | 21.5 |", "| Bob  |   27 |"]);
        assert!(!md.contains("Ignored"));
    }

    #[test]
    fn test_corrupt_spreadsheet_is_an_error() {
        let dir = tempfile::TempDir::new().unwrap();
        for name in ["bad.xls", "bad.xlsx"] {
            let path = dir.path().join(name);
            std::fs::write(&path, "not a workbook").unwrap();
            let ext = Extension::from_filename(name).unwrap();
            assert!(Table::load(&path, ext).is_err());
        }
    }

    #[test]
    fn test_blank_headers_are_named() {
        let table = Table::from_csv_str(",score\n1,2\n").unwrap();
        assert_eq!(table.headers, vec!["Unnamed: 0", "score"]);
    }

    #[test]
    fn test_latin1_csv() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("latin.csv");
        std::fs::write(&path, [b"City\nM".as_slice(), &[0xFC], b"nchen\n"].concat()).unwrap();
        let table = Table::from_csv_path(&path).unwrap();
        assert_eq!(table.rows[0][0], "München");
    }
}
