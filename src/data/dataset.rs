//! Historical options dataset
//!
//! Reads end-of-day option files (one row per quote date / expiry / strike)
//! into memory once. Header cells are normalized so both plain
//! `QUOTE_DATE` and bracketed ` [QUOTE_DATE]` layouts are accepted. Cells that
//! are blank or fail to parse become `None`; dropping those rows is the
//! filter stage's job, not the loader's.

use std::collections::BTreeSet;
use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord, Trim};
use serde::{Deserialize, Serialize};

use crate::core::{VolToolError, VolToolResult};

/// Columns the loader requires, in normalized form
pub const REQUIRED_COLUMNS: [&str; 6] = [
    "QUOTE_DATE",
    "EXPIRE_DATE",
    "STRIKE",
    "UNDERLYING_LAST",
    "C_LAST",
    "P_LAST",
];

/// One dataset row as read from disk; any field may be missing
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawOptionRow {
    pub quote_date: Option<NaiveDate>,
    pub expire_date: Option<NaiveDate>,
    pub strike: Option<f64>,
    pub underlying_last: Option<f64>,
    pub call_last: Option<f64>,
    pub put_last: Option<f64>,
}

/// Immutable in-memory dataset, loaded once per session
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OptionDataset {
    rows: Vec<RawOptionRow>,
}

/// Column positions of the required fields in one file
struct ColumnIndex {
    quote_date: usize,
    expire_date: usize,
    strike: usize,
    underlying_last: usize,
    call_last: usize,
    put_last: usize,
}

impl ColumnIndex {
    fn from_headers(headers: &StringRecord) -> VolToolResult<Self> {
        let names: Vec<String> = headers.iter().map(normalize_header).collect();
        let find = |col: &str| {
            names
                .iter()
                .position(|n| n == col)
                .ok_or_else(|| VolToolError::data(format!("Missing required column: {}", col)))
        };

        Ok(Self {
            quote_date: find("QUOTE_DATE")?,
            expire_date: find("EXPIRE_DATE")?,
            strike: find("STRIKE")?,
            underlying_last: find("UNDERLYING_LAST")?,
            call_last: find("C_LAST")?,
            put_last: find("P_LAST")?,
        })
    }

    fn parse(&self, record: &StringRecord) -> RawOptionRow {
        RawOptionRow {
            quote_date: parse_date(record.get(self.quote_date)),
            expire_date: parse_date(record.get(self.expire_date)),
            strike: parse_number(record.get(self.strike)),
            underlying_last: parse_number(record.get(self.underlying_last)),
            call_last: parse_number(record.get(self.call_last)),
            put_last: parse_number(record.get(self.put_last)),
        }
    }
}

impl OptionDataset {
    pub fn new(rows: Vec<RawOptionRow>) -> Self {
        Self { rows }
    }

    /// Parse a dataset from any CSV reader
    pub fn from_reader<R: Read>(reader: R) -> VolToolResult<Self> {
        let mut rows = Vec::new();
        read_rows(reader, &mut rows)?;
        Ok(Self { rows })
    }

    /// Load a single file, or every `.csv`/`.txt` file in a directory
    /// (in file-name order)
    pub fn load(path: impl AsRef<Path>) -> VolToolResult<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(VolToolError::data(format!(
                "Dataset path does not exist: {}",
                path.display()
            )));
        }

        let files = if path.is_dir() {
            list_data_files(path)?
        } else {
            vec![path.to_path_buf()]
        };

        if files.is_empty() {
            return Err(VolToolError::data(format!(
                "No .csv or .txt files in {}",
                path.display()
            )));
        }

        let mut rows = Vec::new();
        for file in &files {
            let before = rows.len();
            read_rows(File::open(file)?, &mut rows)?;
            tracing::info!("Loaded {} rows from {}", rows.len() - before, file.display());
        }

        let dataset = Self { rows };
        if let Some((first, last)) = dataset.covered_range() {
            tracing::info!(
                "Dataset ready: {} rows covering {} to {}",
                dataset.len(),
                first,
                last
            );
        }
        Ok(dataset)
    }

    pub fn rows(&self) -> &[RawOptionRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// First and last quote date present in the data
    pub fn covered_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        let mut dates = self.rows.iter().filter_map(|r| r.quote_date);
        let first = dates.next()?;
        Some(dates.fold((first, first), |(lo, hi), d| (lo.min(d), hi.max(d))))
    }

    /// Distinct quote dates, ascending
    pub fn quote_dates(&self) -> Vec<NaiveDate> {
        self.rows
            .iter()
            .filter_map(|r| r.quote_date)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Rows with every required field present
    pub fn complete_rows(&self) -> usize {
        self.rows.iter().filter(|r| r.is_complete()).count()
    }
}

impl RawOptionRow {
    /// All required fields are present
    pub fn is_complete(&self) -> bool {
        self.quote_date.is_some()
            && self.expire_date.is_some()
            && self.strike.is_some()
            && self.underlying_last.is_some()
            && self.call_last.is_some()
            && self.put_last.is_some()
    }
}

fn read_rows<R: Read>(reader: R, rows: &mut Vec<RawOptionRow>) -> VolToolResult<()> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(reader);

    let columns = ColumnIndex::from_headers(reader.headers()?)?;

    let mut skipped = 0usize;
    for record in reader.records() {
        match record {
            Ok(record) => rows.push(columns.parse(&record)),
            Err(e) => {
                skipped += 1;
                tracing::debug!("Skipping unreadable record: {}", e);
            }
        }
    }

    if skipped > 0 {
        tracing::warn!("Skipped {} unreadable records", skipped);
    }
    Ok(())
}

fn list_data_files(dir: &Path) -> VolToolResult<Vec<PathBuf>> {
    let mut files = Vec::new();

    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let is_data = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.eq_ignore_ascii_case("csv") || e.eq_ignore_ascii_case("txt"))
            .unwrap_or(false);

        if path.is_file() && is_data {
            files.push(path);
        }
    }

    files.sort();
    Ok(files)
}

/// `" [QUOTE_DATE]"` -> `"QUOTE_DATE"`
pub fn normalize_header(raw: &str) -> String {
    raw.trim()
        .trim_start_matches('\u{feff}')
        .trim_matches(|c: char| c == '[' || c == ']' || c.is_whitespace())
        .to_ascii_uppercase()
}

/// Blank or unparseable cells are missing
fn parse_number(cell: Option<&str>) -> Option<f64> {
    let cell = cell?.trim();
    if cell.is_empty() {
        return None;
    }
    cell.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// `YYYY-MM-DD`, ignoring any trailing time component
fn parse_date(cell: Option<&str>) -> Option<NaiveDate> {
    let cell = cell?.trim();
    let date_part = cell.split(|c: char| c == ' ' || c == 'T').next()?;
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    const BRACKETED: &str = "\
[QUOTE_UNIXTIME], [QUOTE_DATE], [UNDERLYING_LAST], [EXPIRE_DATE], [STRIKE], [C_LAST], [P_LAST]
1680292800, 2023-03-31, 164.9, 2023-04-21, 160.0, 6.55, 1.10
1680292800, 2023-03-31, 164.9, 2023-04-21, 165.0, , 2.95
1680292800, 2023-03-31, 164.9, 2023-04-21, 170.0, 1.32, n/a
";

    #[test]
    fn test_normalize_header() {
        assert_eq!(normalize_header(" [QUOTE_DATE]"), "QUOTE_DATE");
        assert_eq!(normalize_header("c_last"), "C_LAST");
        assert_eq!(normalize_header("\u{feff}[STRIKE]"), "STRIKE");
    }

    #[test]
    fn test_parse_cells() {
        assert_eq!(parse_number(Some(" 1.5 ")), Some(1.5));
        assert_eq!(parse_number(Some("")), None);
        assert_eq!(parse_number(Some("abc")), None);
        assert_eq!(parse_number(None), None);

        let d = NaiveDate::from_ymd_opt(2023, 3, 31).unwrap();
        assert_eq!(parse_date(Some("2023-03-31")), Some(d));
        assert_eq!(parse_date(Some("2023-03-31 16:00")), Some(d));
        assert_eq!(parse_date(Some("31/03/2023")), None);
        assert_eq!(parse_date(Some("")), None);
    }

    #[test]
    fn test_bracketed_headers_and_blank_cells() {
        let dataset = OptionDataset::from_reader(BRACKETED.as_bytes()).unwrap();
        assert_eq!(dataset.len(), 3);

        let rows = dataset.rows();
        assert_eq!(rows[0].strike, Some(160.0));
        assert_eq!(rows[0].underlying_last, Some(164.9));
        assert_eq!(rows[1].call_last, None);
        assert_eq!(rows[2].put_last, None);
        assert_eq!(dataset.complete_rows(), 1);
    }

    #[test]
    fn test_missing_column_is_an_error() {
        let data = "QUOTE_DATE,EXPIRE_DATE,STRIKE,UNDERLYING_LAST,C_LAST\n2023-03-01,2023-03-17,150,151,3\n";
        let err = OptionDataset::from_reader(data.as_bytes()).unwrap_err();
        assert!(matches!(err, VolToolError::Data(msg) if msg.contains("P_LAST")));
    }

    #[test]
    fn test_covered_range_and_dates() {
        let data = "\
QUOTE_DATE,EXPIRE_DATE,STRIKE,UNDERLYING_LAST,C_LAST,P_LAST
2023-03-03,2023-03-17,150,151,3,2
2023-03-01,2023-03-17,150,149,2,3
,2023-03-17,150,149,2,3
2023-03-03,2023-04-21,155,151,2,6
";
        let dataset = OptionDataset::from_reader(data.as_bytes()).unwrap();
        let (first, last) = dataset.covered_range().unwrap();
        assert_eq!(first, NaiveDate::from_ymd_opt(2023, 3, 1).unwrap());
        assert_eq!(last, NaiveDate::from_ymd_opt(2023, 3, 3).unwrap());
        assert_eq!(dataset.quote_dates().len(), 2);

        assert!(OptionDataset::default().covered_range().is_none());
    }

    #[test]
    fn test_load_directory() {
        let dir = tempdir().unwrap();
        let header = "QUOTE_DATE,EXPIRE_DATE,STRIKE,UNDERLYING_LAST,C_LAST,P_LAST\n";

        let mut feb = File::create(dir.path().join("aapl_eod_202302.txt")).unwrap();
        write!(feb, "{}2023-02-28,2023-03-17,150,147,2,4\n", header).unwrap();
        let mut mar = File::create(dir.path().join("aapl_eod_202303.txt")).unwrap();
        write!(mar, "{}2023-03-01,2023-03-17,150,149,2,3\n", header).unwrap();
        File::create(dir.path().join("notes.md")).unwrap();

        let dataset = OptionDataset::load(dir.path()).unwrap();
        assert_eq!(dataset.len(), 2);
        assert_eq!(
            dataset.rows()[0].quote_date,
            NaiveDate::from_ymd_opt(2023, 2, 28)
        );
    }

    #[test]
    fn test_load_missing_path() {
        let err = OptionDataset::load("/definitely/not/here.csv").unwrap_err();
        assert!(matches!(err, VolToolError::Data(_)));
    }
}
