use super::NormalizeError;
use crate::store::Record;
use serde_json::{Number, Value};
use std::collections::HashSet;
use std::io::Read;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnType {
    Integer,
    Float,
    Text,
}

/// Reads a headed CSV export into one record per row.
///
/// Column types are inferred over the whole column: integers and floats become JSON
/// numbers only when every non-blank cell parses, otherwise the raw text is kept so the
/// normalizer can trim it. Empty cells become `null`; whitespace-only cells stay text.
pub(crate) fn parse_records<R: Read>(reader: R) -> Result<Vec<Record>, NormalizeError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::Headers)
        .from_reader(reader);

    let headers: Vec<String> = csv_reader
        .headers()?
        .iter()
        .map(|header| header.trim_start_matches('\u{feff}').to_string())
        .collect();

    let mut seen = HashSet::with_capacity(headers.len());
    for header in &headers {
        if !seen.insert(header.as_str()) {
            return Err(NormalizeError::DuplicateColumn(header.clone()));
        }
    }

    let rows = csv_reader
        .records()
        .collect::<Result<Vec<csv::StringRecord>, csv::Error>>()?;

    let column_types: Vec<ColumnType> = (0..headers.len())
        .map(|index| infer_column(rows.iter().filter_map(|row| row.get(index))))
        .collect();

    let records = rows
        .iter()
        .map(|row| {
            headers
                .iter()
                .zip(&column_types)
                .zip(row.iter())
                .map(|((header, column_type), cell)| {
                    (header.clone(), cell_value(cell, *column_type))
                })
                .collect::<Record>()
        })
        .collect();

    Ok(records)
}

fn infer_column<'a, I>(cells: I) -> ColumnType
where
    I: Iterator<Item = &'a str>,
{
    let mut column_type = ColumnType::Integer;
    let mut any_value = false;

    for cell in cells.map(str::trim).filter(|cell| !cell.is_empty()) {
        any_value = true;
        if column_type == ColumnType::Integer && cell.parse::<i64>().is_err() {
            column_type = ColumnType::Float;
        }
        if column_type == ColumnType::Float && parse_finite(cell).is_none() {
            return ColumnType::Text;
        }
    }

    if any_value {
        column_type
    } else {
        ColumnType::Text
    }
}

fn parse_finite(cell: &str) -> Option<f64> {
    cell.parse::<f64>().ok().filter(|value| value.is_finite())
}

fn cell_value(cell: &str, column_type: ColumnType) -> Value {
    if cell.is_empty() {
        return Value::Null;
    }

    let trimmed = cell.trim();

    match column_type {
        ColumnType::Integer => trimmed
            .parse::<i64>()
            .map(Value::from)
            .unwrap_or_else(|_| Value::String(cell.to_string())),
        ColumnType::Float => parse_finite(trimmed)
            .and_then(Number::from_f64)
            .map(Value::Number)
            .unwrap_or_else(|| Value::String(cell.to_string())),
        ColumnType::Text => Value::String(cell.to_string()),
    }
}
