use crate::error::{ReportError, Result};
use crate::table::{CellValue, RawTable};
use crate::utils::parse_date_time;
use serde_json::{Map, Value};

/// Builds the working table from query results delivered as JSON objects.
///
/// Columns appear in the order their keys are first seen; a record that
/// lacks a key gets a null cell. Strings holding ISO dates become dates,
/// other strings stay text. Nested arrays or objects are rejected.
pub fn table_from_records(records: &[Value]) -> Result<RawTable> {
    let mut objects: Vec<&Map<String, Value>> = Vec::with_capacity(records.len());
    let mut columns: Vec<String> = Vec::new();

    for (index, record) in records.iter().enumerate() {
        let object = record.as_object().ok_or_else(|| ReportError::InvalidRecord {
            index,
            details: format!("expected a JSON object, found {}", json_kind(record)),
        })?;

        for key in object.keys() {
            if !columns.iter().any(|c| c == key) {
                columns.push(key.clone());
            }
        }
        objects.push(object);
    }

    let mut table = RawTable::new(columns.clone());
    for (index, object) in objects.into_iter().enumerate() {
        let row = columns
            .iter()
            .map(|column| match object.get(column) {
                Some(value) => cell_from_json(value).ok_or_else(|| ReportError::InvalidRecord {
                    index,
                    details: format!("field '{}' holds a nested {}", column, json_kind(value)),
                }),
                None => Ok(CellValue::Null),
            })
            .collect::<Result<Vec<_>>>()?;
        table.push_row(row);
    }

    Ok(table)
}

/// Builds the working table from untyped text rows, such as a CSV export.
/// Each cell goes through [`CellValue::parse_text`].
pub fn table_from_text_rows<I, R, S>(headers: &[String], rows: I) -> RawTable
where
    I: IntoIterator<Item = R>,
    R: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut table = RawTable::new(headers.to_vec());
    for row in rows {
        table.push_row(
            row.into_iter()
                .map(|cell| CellValue::parse_text(cell.as_ref()))
                .collect(),
        );
    }
    table
}

fn cell_from_json(value: &Value) -> Option<CellValue> {
    match value {
        Value::Null => Some(CellValue::Null),
        Value::Bool(b) => Some(CellValue::Bool(*b)),
        Value::Number(n) => Some(n.as_f64().map_or(CellValue::Null, CellValue::Number)),
        Value::String(s) => Some(match parse_date_time(s) {
            Some(dt) => CellValue::Date(dt),
            None => CellValue::Text(s.clone()),
        }),
        Value::Array(_) | Value::Object(_) => None,
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
