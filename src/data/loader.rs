use std::borrow::Cow;
use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader};
use thiserror::Error;

use super::model::{format_number, CellValue, Dataset, Row};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Unsupported file type: {0}. Please upload a CSV or Excel file.")]
    Unsupported(String),

    #[error("The file contains no data rows")]
    Empty,

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Excel error: {0}")]
    Excel(#[from] calamine::Error),

    #[error("Workbook has no worksheets")]
    NoSheets,
}

// ---------------------------------------------------------------------------
// File kind
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Csv,
    Excel,
}

impl FileKind {
    /// Validate a path by extension before anything is read.
    pub fn detect(path: &Path) -> Result<FileKind, LoadError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();

        match ext.as_str() {
            "csv" => Ok(FileKind::Csv),
            "xls" | "xlsx" => Ok(FileKind::Excel),
            "" => Err(LoadError::Unsupported("no extension".to_string())),
            other => Err(LoadError::Unsupported(format!(".{other}"))),
        }
    }
}

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a spreadsheet. Dispatch by extension.
///
/// Supported formats:
/// * `.csv`         – first record is the header row
/// * `.xls`/`.xlsx` – first worksheet, first non-empty row is the header
///
/// Fails with [`LoadError::Empty`] when no data rows remain.
pub fn load_file(path: &Path) -> Result<Dataset, LoadError> {
    let kind = FileKind::detect(path)?;
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("untitled")
        .to_string();

    let (headers, rows) = match kind {
        FileKind::Csv => read_csv(path)?,
        FileKind::Excel => read_excel(path)?,
    };

    if rows.is_empty() {
        return Err(LoadError::Empty);
    }

    log::info!(
        "Parsed {file_name}: {} rows, {} columns",
        rows.len(),
        headers.len()
    );
    Ok(Dataset::new(file_name, headers, rows))
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

fn read_csv(path: &Path) -> Result<(Vec<String>, Vec<Row>), LoadError> {
    let reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)?;
    read_csv_from(reader)
}

fn read_csv_from<R: std::io::Read>(
    mut reader: csv::Reader<R>,
) -> Result<(Vec<String>, Vec<Row>), LoadError> {
    // Byte records so that legacy-encoded exports still load; invalid UTF-8
    // sequences become U+FFFD instead of failing the whole file.
    let headers = name_headers(
        reader
            .byte_headers()?
            .iter()
            .map(|h| String::from_utf8_lossy(h).trim().to_string()),
    );

    let mut rows = Vec::new();
    for result in reader.byte_records() {
        let record = result?;
        let values: Vec<Cow<'_, str>> = record.iter().map(String::from_utf8_lossy).collect();
        if values.iter().all(|v| v.trim().is_empty()) {
            continue;
        }

        // Ragged rows: missing trailing cells stay absent, extras are dropped.
        let row: Row = headers
            .iter()
            .zip(&values)
            .map(|(col, value)| (col.clone(), guess_cell_value(value)))
            .collect();
        rows.push(row);
    }

    Ok((headers, rows))
}

/// Type a raw text cell the way spreadsheet importers usually do.
fn guess_cell_value(s: &str) -> CellValue {
    let t = s.trim();
    if t.is_empty() {
        return CellValue::Null;
    }
    if let Ok(f) = t.parse::<f64>() {
        if f.is_finite() {
            return CellValue::Number(f);
        }
    }
    if t.eq_ignore_ascii_case("true") {
        return CellValue::Bool(true);
    }
    if t.eq_ignore_ascii_case("false") {
        return CellValue::Bool(false);
    }
    CellValue::String(t.to_string())
}

// ---------------------------------------------------------------------------
// Excel loader
// ---------------------------------------------------------------------------

fn read_excel(path: &Path) -> Result<(Vec<String>, Vec<Row>), LoadError> {
    let mut workbook = open_workbook_auto(path)?;
    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or(LoadError::NoSheets)?;
    let range = workbook.worksheet_range(&sheet_name)?;

    let mut grid = range
        .rows()
        .skip_while(|r| r.iter().all(|c| matches!(c, Data::Empty)));

    let Some(header_row) = grid.next() else {
        return Ok((Vec::new(), Vec::new()));
    };
    let headers = name_headers(header_row.iter().map(|c| excel_text(c).trim().to_string()));

    let mut rows = Vec::new();
    for raw in grid {
        if raw.iter().all(|c| matches!(c, Data::Empty)) {
            continue;
        }
        let row: Row = headers
            .iter()
            .zip(raw.iter())
            .filter(|(_, c)| !matches!(c, Data::Empty))
            .map(|(col, c)| (col.clone(), excel_value(c)))
            .collect();
        rows.push(row);
    }

    Ok((headers, rows))
}

fn excel_value(cell: &Data) -> CellValue {
    match cell {
        Data::Empty => CellValue::Null,
        Data::String(s) => {
            if s.is_empty() {
                CellValue::Null
            } else {
                CellValue::String(s.clone())
            }
        }
        Data::Float(f) => CellValue::Number(*f),
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(ndt) if ndt.time() == chrono::NaiveTime::MIN => {
                CellValue::String(ndt.format("%Y-%m-%d").to_string())
            }
            Some(ndt) => CellValue::String(ndt.format("%Y-%m-%dT%H:%M:%S").to_string()),
            None => CellValue::Number(dt.as_f64()),
        },
        Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::String(s.clone()),
        Data::Error(e) => CellValue::String(format!("#{e:?}")),
    }
}

fn excel_text(cell: &Data) -> String {
    match cell {
        Data::Float(f) => format_number(*f),
        other => excel_value(other).to_string(),
    }
}

/// Fill blank header names and de-duplicate repeats so every column has a
/// distinct key.
fn name_headers(raw: impl Iterator<Item = String>) -> Vec<String> {
    let mut headers: Vec<String> = Vec::new();
    for (i, name) in raw.enumerate() {
        let base = if name.is_empty() {
            if i == 0 {
                "__EMPTY".to_string()
            } else {
                format!("__EMPTY_{i}")
            }
        } else {
            name
        };
        let mut candidate = base.clone();
        let mut n = 1;
        while headers.contains(&candidate) {
            candidate = format!("{base}_{n}");
            n += 1;
        }
        headers.push(candidate);
    }
    headers
}

#[cfg(test)]
mod tests {
    use super::*;
    use calamine::{CellErrorType, ExcelDateTime, ExcelDateTimeType};
    use std::io::Write;

    fn csv_reader(text: &str) -> csv::Reader<&[u8]> {
        csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(text.as_bytes())
    }

    #[test]
    fn detects_supported_extensions() {
        assert_eq!(FileKind::detect(Path::new("a.csv")).unwrap(), FileKind::Csv);
        assert_eq!(FileKind::detect(Path::new("a.XLSX")).unwrap(), FileKind::Excel);
        assert_eq!(FileKind::detect(Path::new("a.xls")).unwrap(), FileKind::Excel);
        assert!(matches!(
            FileKind::detect(Path::new("a.pdf")),
            Err(LoadError::Unsupported(ext)) if ext == ".pdf"
        ));
        assert!(FileKind::detect(Path::new("README")).is_err());
    }

    #[test]
    fn csv_cells_are_typed() {
        let (headers, rows) =
            read_csv_from(csv_reader("Region,Sales,Active,Note\nNorth,12.5,TRUE,\n")).unwrap();
        assert_eq!(headers, ["Region", "Sales", "Active", "Note"]);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["Region"], CellValue::String("North".into()));
        assert_eq!(rows[0]["Sales"], CellValue::Number(12.5));
        assert_eq!(rows[0]["Active"], CellValue::Bool(true));
        assert_eq!(rows[0]["Note"], CellValue::Null);
    }

    #[test]
    fn csv_text_is_trimmed_before_storing() {
        let (_, rows) =
            read_csv_from(csv_reader("Region\n North\nNorth \nNorth\n")).unwrap();
        assert!(rows
            .iter()
            .all(|r| r["Region"] == CellValue::String("North".into())));
    }

    #[test]
    fn non_utf8_csv_is_decoded_lossily() {
        let bytes: &[u8] = b"City,Units\nM\xfcnchen,3\nBerlin,4\n";
        let reader = csv::ReaderBuilder::new().flexible(true).from_reader(bytes);
        let (headers, rows) = read_csv_from(reader).unwrap();
        assert_eq!(headers, ["City", "Units"]);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["City"], CellValue::String("M\u{FFFD}nchen".into()));
        assert_eq!(rows[0]["Units"], CellValue::Number(3.0));
    }

    #[test]
    fn excel_dates_become_iso_strings() {
        let day = Data::DateTime(ExcelDateTime::new(43831.0, ExcelDateTimeType::DateTime, false));
        assert_eq!(excel_value(&day), CellValue::String("2020-01-01".into()));

        let noon = Data::DateTime(ExcelDateTime::new(43831.5, ExcelDateTimeType::DateTime, false));
        assert_eq!(
            excel_value(&noon),
            CellValue::String("2020-01-01T12:00:00".into())
        );
        assert!(crate::data::dates::looks_like_date(&excel_value(&day).to_string()));
    }

    #[test]
    fn excel_scalars_map_to_cell_values() {
        assert_eq!(excel_value(&Data::Float(2020.0)), CellValue::Number(2020.0));
        assert_eq!(excel_text(&Data::Float(2020.0)), "2020");
        assert_eq!(excel_value(&Data::Int(7)), CellValue::Number(7.0));
        assert_eq!(excel_value(&Data::Bool(false)), CellValue::Bool(false));
        assert_eq!(excel_value(&Data::String(String::new())), CellValue::Null);
        assert_eq!(excel_value(&Data::Empty), CellValue::Null);
        assert_eq!(excel_text(&Data::Empty), "");
        assert_eq!(
            excel_value(&Data::Error(CellErrorType::Div0)),
            CellValue::String("#Div0".into())
        );
    }

    #[test]
    fn ragged_and_blank_rows_are_tolerated() {
        let (_, rows) = read_csv_from(csv_reader("a,b,c\n1,2\n,,\n4,5,6,7\n")).unwrap();
        assert_eq!(rows.len(), 2);
        assert!(!rows[0].contains_key("c"));
        assert_eq!(rows[1].len(), 3);
    }

    #[test]
    fn duplicate_and_blank_headers_get_names() {
        let headers = name_headers(
            ["", "x", "x", ""].iter().map(|s| s.to_string()),
        );
        assert_eq!(headers, ["__EMPTY", "x", "x_1", "__EMPTY_3"]);
    }

    #[test]
    fn header_only_file_is_empty() {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        writeln!(file, "a,b,c").unwrap();
        let err = load_file(file.path()).unwrap_err();
        assert!(matches!(err, LoadError::Empty));
    }

    #[test]
    fn loads_csv_from_disk() {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        writeln!(file, "Region,Revenue\nNorth,10\nSouth,20").unwrap();
        let ds = load_file(file.path()).unwrap();
        assert_eq!(ds.row_count, 2);
        assert_eq!(ds.headers, ["Region", "Revenue"]);
        assert!(ds.file_name.ends_with(".csv"));
    }

    #[test]
    fn unsupported_file_is_rejected_before_reading() {
        let err = load_file(Path::new("/does/not/exist.txt")).unwrap_err();
        assert!(matches!(err, LoadError::Unsupported(_)));
    }
}
