use std::{
    collections::HashMap,
    fs::File,
    io::{BufReader, Read},
    path::Path,
};

use calamine::{open_workbook_auto, Data, Range, Reader};
use csv::{ReaderBuilder, Trim};
use tracing::{debug, info, instrument};

use super::error::ImportError;
use super::record::{CellValue, RawRecord};

/// Input file family, chosen by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Csv,
    Workbook,
}

impl SourceFormat {
    /// Spreadsheet extensions go to the workbook reader, everything else is CSV.
    pub fn detect(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        match ext.as_deref() {
            Some("xlsx" | "xlsm" | "xlsb" | "xls" | "ods") => Self::Workbook,
            _ => Self::Csv,
        }
    }
}

/// Parse a source file into header-keyed records.
#[instrument]
pub fn read_records(path: &Path) -> Result<Vec<RawRecord>, ImportError> {
    let format = SourceFormat::detect(path);
    let records = match format {
        SourceFormat::Csv => {
            let file = File::open(path).map_err(|source| ImportError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            records_from_csv(BufReader::with_capacity(1 << 20, file)).map_err(|source| {
                ImportError::Csv {
                    path: path.to_path_buf(),
                    source,
                }
            })?
        }
        SourceFormat::Workbook => {
            let mut workbook = open_workbook_auto(path).map_err(|source| ImportError::Workbook {
                path: path.to_path_buf(),
                source,
            })?;
            let range = workbook
                .worksheet_range_at(0)
                .ok_or_else(|| ImportError::EmptyWorkbook {
                    path: path.to_path_buf(),
                })?
                .map_err(|source| ImportError::Workbook {
                    path: path.to_path_buf(),
                    source,
                })?;
            records_from_range(&range)
        }
    };
    info!(?format, rows = records.len(), "parsed source file");
    Ok(records)
}

/// Comma-delimited with a header row; quoted fields and surrounding whitespace
/// are handled by the reader. Ragged rows are a parse failure.
pub fn records_from_csv<R: Read>(reader: R) -> Result<Vec<RawRecord>, csv::Error> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(false)
        .trim(Trim::All)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    let mut out = Vec::new();
    for result in rdr.records() {
        let rec = result?;
        let row: RawRecord = headers
            .iter()
            .zip(rec.iter())
            .map(|(h, v)| (h.to_string(), CellValue::text(v)))
            .collect();
        out.push(row);
    }
    Ok(out)
}

/// First row is the header; missing cells default to blank and fully blank
/// rows are skipped.
pub fn records_from_range(range: &Range<Data>) -> Vec<RawRecord> {
    let mut rows = range.rows();
    let Some(header_row) = rows.next() else {
        return Vec::new();
    };
    let headers = header_names(header_row);
    debug!(?headers, "workbook headers");

    rows.filter_map(|cells| {
        let row: RawRecord = headers
            .iter()
            .enumerate()
            .map(|(i, h)| (h.clone(), cells.get(i).map(cell_from_data).unwrap_or(CellValue::Empty)))
            .collect();
        row.values()
            .any(|c| *c != CellValue::Empty)
            .then_some(row)
    })
    .collect()
}

// Blank headers become `__EMPTY`, repeats get a numeric suffix so no column is lost.
fn header_names(cells: &[Data]) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    cells
        .iter()
        .map(|c| {
            let base = match c {
                Data::Empty => "__EMPTY".to_string(),
                other => other.to_string(),
            };
            let n = seen.entry(base.clone()).or_insert(0);
            let name = if *n == 0 {
                base
            } else {
                format!("{base}_{n}")
            };
            *n += 1;
            name
        })
        .collect()
}

fn cell_from_data(cell: &Data) -> CellValue {
    match cell {
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::text(s.as_str()),
        // Text keeps integers beyond 2^53 exact.
        Data::Int(i) => CellValue::Text(i.to_string()),
        Data::Float(f) => CellValue::Number(*f),
        Data::Bool(b) => CellValue::Text(b.to_string()),
        Data::DateTime(dt) => CellValue::Number(dt.as_f64()),
        Data::Error(_) | Data::Empty => CellValue::Empty,
    }
}
