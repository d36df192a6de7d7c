use crate::domain::model::{Record, Table};
use crate::utils::error::{Result, SplitError};
use calamine::{open_workbook_auto_from_rs, Data, Reader};
use serde_json::Value;
use std::collections::HashMap;
use std::io::Cursor;
use std::path::Path;

/// Identifier headers tried in order when none is configured.
pub const DEFAULT_ID_COLUMNS: [&str; 2] = ["ID", "species"];

const DELIMITED_EXTENSIONS: [&str; 1] = ["csv"];
const SPREADSHEET_EXTENSIONS: [&str; 5] = ["xlsx", "xlsm", "xlsb", "xls", "ods"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableFormat {
    Delimited,
    Spreadsheet,
}

pub fn accepted_extensions() -> String {
    DELIMITED_EXTENSIONS
        .iter()
        .chain(SPREADSHEET_EXTENSIONS.iter())
        .map(|ext| format!(".{}", ext))
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn detect_format(path: &str) -> Result<TableFormat> {
    let extension = Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    if DELIMITED_EXTENSIONS.contains(&extension.as_str()) {
        Ok(TableFormat::Delimited)
    } else if SPREADSHEET_EXTENSIONS.contains(&extension.as_str()) {
        Ok(TableFormat::Spreadsheet)
    } else {
        Err(SplitError::UnsupportedFormat {
            path: path.to_string(),
            extension,
            accepted: accepted_extensions(),
        })
    }
}

pub fn parse_table(path: &str, format: TableFormat, bytes: Vec<u8>) -> Result<Table> {
    let table = match format {
        TableFormat::Delimited => parse_delimited(path, &bytes)?,
        TableFormat::Spreadsheet => parse_spreadsheet(path, bytes)?,
    };
    tracing::debug!(
        "Parsed {} ({} columns, {} rows)",
        path,
        table.columns.len(),
        table.rows.len()
    );
    Ok(table)
}

fn parse_delimited(path: &str, bytes: &[u8]) -> Result<Table> {
    let parse_error = |e: csv::Error| SplitError::Parse {
        path: path.to_string(),
        message: e.to_string(),
    };

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(bytes);
    let columns: Vec<String> = reader
        .headers()
        .map_err(parse_error)?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result.map_err(parse_error)?;
        let data: HashMap<String, Value> = columns
            .iter()
            .zip(record.iter())
            .map(|(column, field)| {
                let value = if field.is_empty() {
                    Value::Null
                } else {
                    Value::String(field.to_string())
                };
                (column.clone(), value)
            })
            .collect();
        rows.push(Record { data });
    }

    Ok(Table {
        source: path.to_string(),
        columns,
        rows,
    })
}

fn parse_spreadsheet(path: &str, bytes: Vec<u8>) -> Result<Table> {
    let parse_error = |message: String| SplitError::Parse {
        path: path.to_string(),
        message,
    };

    let mut workbook =
        open_workbook_auto_from_rs(Cursor::new(bytes)).map_err(|e| parse_error(e.to_string()))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| parse_error("workbook has no sheets".to_string()))?
        .map_err(|e| parse_error(e.to_string()))?;

    let mut sheet_rows = range.rows();
    let columns: Vec<String> = match sheet_rows.next() {
        Some(header) => header.iter().map(|cell| cell.to_string()).collect(),
        None => Vec::new(),
    };

    let rows = sheet_rows
        .map(|cells| Record {
            data: columns
                .iter()
                .zip(cells.iter())
                .map(|(column, cell)| (column.clone(), cell_value(cell)))
                .collect(),
        })
        .collect();

    Ok(Table {
        source: path.to_string(),
        columns,
        rows,
    })
}

fn cell_value(cell: &Data) -> Value {
    match cell {
        Data::Empty => Value::Null,
        Data::String(s) if s.is_empty() => Value::Null,
        Data::String(s) => Value::String(s.clone()),
        Data::Int(i) => Value::from(*i),
        // Whole floats read back as integers so "7" and 7.0 name the same species.
        Data::Float(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => Value::from(*f as i64),
        Data::Float(f) => serde_json::Number::from_f64(*f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        Data::Bool(b) => Value::Bool(*b),
        Data::Error(_) => Value::Null,
        other => Value::String(other.to_string()),
    }
}

/// Picks the identifier column: the configured one must exist, otherwise the
/// first default header present wins.
pub fn resolve_id_column(table: &Table, configured: Option<&str>) -> Result<String> {
    if let Some(column) = configured {
        return require_column(table, column).map(|_| column.to_string());
    }

    DEFAULT_ID_COLUMNS
        .iter()
        .find(|candidate| table.has_column(candidate))
        .map(|candidate| candidate.to_string())
        .ok_or_else(|| SplitError::MissingColumn {
            column: DEFAULT_ID_COLUMNS.join("' or '"),
            path: table.source.clone(),
        })
}

pub fn require_column(table: &Table, column: &str) -> Result<()> {
    if table.has_column(column) {
        Ok(())
    } else {
        Err(SplitError::MissingColumn {
            column: column.to_string(),
            path: table.source.clone(),
        })
    }
}
