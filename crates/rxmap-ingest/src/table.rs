use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use calamine::{Data, Reader, open_workbook_auto};
use csv::ReaderBuilder;
use tracing::{debug, info, warn};

use crate::context::REQUIRED_COLUMNS;

/// One product row keyed by trimmed column name.
pub type SourceRow = BTreeMap<String, String>;

/// Extensions read as spreadsheets rather than delimited text.
const WORKBOOK_EXTENSIONS: [&str; 5] = ["xlsx", "xlsm", "xlsb", "xls", "ods"];

#[derive(Debug, Clone, Default)]
pub struct IngestOptions {
    /// Field delimiter for text input; sniffed from the header line when `None`.
    pub delimiter: Option<u8>,
    /// Keep only the first `max_rows` data rows.
    pub max_rows: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct SourceTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl SourceTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Row `index` keyed by header. Short records yield empty cells.
    pub fn row(&self, index: usize) -> Option<SourceRow> {
        let record = self.rows.get(index)?;
        let row = self
            .headers
            .iter()
            .enumerate()
            .map(|(idx, header)| {
                let value = record.get(idx).cloned().unwrap_or_default();
                (header.clone(), value)
            })
            .collect();
        Some(row)
    }

    /// All rows keyed by header, in file order.
    pub fn source_rows(&self) -> Vec<SourceRow> {
        (0..self.rows.len()).filter_map(|idx| self.row(idx)).collect()
    }

    /// Required columns absent from the header row.
    pub fn missing_columns(&self) -> Vec<&'static str> {
        REQUIRED_COLUMNS
            .iter()
            .copied()
            .filter(|column| !self.headers.iter().any(|h| h == column))
            .collect()
    }
}

fn normalize_header(raw: &str) -> String {
    let trimmed = raw.trim().trim_matches('\u{feff}');
    trimmed.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn normalize_cell(raw: &str) -> String {
    raw.trim().trim_matches('\u{feff}').to_string()
}

/// Pick `;`, tab or `,` by counting occurrences on the header line.
fn sniff_delimiter(first_line: &str) -> u8 {
    [b';', b'\t', b',']
        .into_iter()
        .max_by_key(|delim| first_line.bytes().filter(|b| b == delim).count())
        .filter(|delim| first_line.as_bytes().contains(delim))
        .unwrap_or(b',')
}

fn is_workbook(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            WORKBOOK_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
}

/// Read the product spreadsheet at `path`.
///
/// Workbooks (`.xlsx`, `.xls`, `.ods`, ...) are read from their first
/// sheet; anything else is treated as delimited text. Headers and cells
/// are trimmed, a UTF-8 BOM is dropped and rows where every cell is empty
/// are skipped.
pub fn read_source_table(path: &Path, options: &IngestOptions) -> Result<SourceTable> {
    let table = if is_workbook(path) {
        read_workbook(path, options)?
    } else {
        read_delimited(path, options)?
    };

    let missing = table.missing_columns();
    if !missing.is_empty() {
        warn!(columns = ?missing, "product table is missing expected columns");
    }
    info!(rows = table.len(), path = %path.display(), "loaded product table");
    Ok(table)
}

fn read_delimited(path: &Path, options: &IngestOptions) -> Result<SourceTable> {
    let delimiter = match options.delimiter {
        Some(delimiter) => delimiter,
        None => {
            let bytes = fs::read(path).with_context(|| format!("read: {}", path.display()))?;
            let first_line = bytes.split(|b| *b == b'\n').next().unwrap_or_default();
            sniff_delimiter(&String::from_utf8_lossy(first_line))
        }
    };
    debug!(path = %path.display(), delimiter = %(delimiter as char), "reading delimited product table");

    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .delimiter(delimiter)
        .from_path(path)
        .with_context(|| format!("read csv: {}", path.display()))?;
    let headers: Vec<String> = reader
        .headers()
        .with_context(|| format!("read header: {}", path.display()))?
        .iter()
        .map(str::to_string)
        .collect();
    let records = reader.records().map(|record| {
        record
            .map(|record| record.iter().map(str::to_string).collect::<Vec<String>>())
            .with_context(|| format!("read record: {}", path.display()))
    });
    collect_table(path, &headers, records, options)
}

fn read_workbook(path: &Path, options: &IngestOptions) -> Result<SourceTable> {
    debug!(path = %path.display(), "reading product workbook");
    let mut workbook = open_workbook_auto(path)
        .with_context(|| format!("open workbook: {}", path.display()))?;
    let range = workbook
        .worksheet_range_at(0)
        .with_context(|| format!("no worksheet in {}", path.display()))?
        .with_context(|| format!("read first sheet: {}", path.display()))?;

    let mut rows = range
        .rows()
        .map(|row| row.iter().map(cell_text).collect::<Vec<String>>());
    let headers = rows.next().unwrap_or_default();
    collect_table(path, &headers, rows.map(Ok), options)
}

/// Text of a workbook cell. Whole floats print without a fraction, so a
/// numeric code or dosage reads the same as in a text export.
fn cell_text(cell: &Data) -> String {
    match cell {
        Data::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Normalize raw headers and records into a table.
fn collect_table<I>(
    path: &Path,
    raw_headers: &[String],
    records: I,
    options: &IngestOptions,
) -> Result<SourceTable>
where
    I: Iterator<Item = Result<Vec<String>>>,
{
    let headers: Vec<String> = raw_headers.iter().map(|h| normalize_header(h)).collect();
    if headers.iter().all(String::is_empty) {
        bail!("no header row in {}", path.display());
    }

    let mut rows = Vec::new();
    for record in records {
        if options.max_rows.is_some_and(|max| rows.len() >= max) {
            break;
        }
        let row: Vec<String> = record?.iter().map(|cell| normalize_cell(cell)).collect();
        if row.iter().all(String::is_empty) {
            continue;
        }
        rows.push(row);
    }
    Ok(SourceTable { headers, rows })
}
