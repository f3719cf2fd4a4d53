//! Row representation shared by every store.

use crate::error::{StoreError, StoreResult};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

/// A single table row: column name to JSON value.
///
/// Column names are snake_case. Typed records name their fields in
/// camelCase (`#[serde(rename_all = "camelCase")]`); [`to_row`] and
/// [`from_row`] translate top-level names between the two.
pub type Row = serde_json::Map<String, Value>;

/// Name of the primary key column.
pub const PRIMARY_KEY: &str = "id";

/// Returns the positive primary key of a row, if it has one.
pub fn row_id(row: &Row) -> Option<i64> {
    row.get(PRIMARY_KEY)
        .and_then(Value::as_i64)
        .filter(|id| *id > 0)
}

/// Column name for a camelCase field name: `mappingKey` -> `mapping_key`.
pub fn column_name(field: &str) -> String {
    let mut column = String::with_capacity(field.len() + 4);
    for c in field.chars() {
        if c.is_ascii_uppercase() {
            if !column.is_empty() {
                column.push('_');
            }
            column.push(c.to_ascii_lowercase());
        } else {
            column.push(c);
        }
    }
    column
}

/// Field name for a snake_case column name: `mapping_key` -> `mappingKey`.
pub fn field_name(column: &str) -> String {
    let mut field = String::with_capacity(column.len());
    let mut upper = false;
    for c in column.chars() {
        if c == '_' && !field.is_empty() {
            upper = true;
        } else if upper {
            field.push(c.to_ascii_uppercase());
            upper = false;
        } else {
            field.push(c);
        }
    }
    field
}

/// Encodes a typed record as a row.
///
/// # Errors
///
/// Returns an error if the value does not serialize to a JSON object.
pub fn to_row<T: Serialize>(value: &T) -> StoreResult<Row> {
    match serde_json::to_value(value)? {
        Value::Object(fields) => Ok(fields
            .into_iter()
            .map(|(name, value)| (column_name(&name), value))
            .collect()),
        other => Err(StoreError::Codec(serde::ser::Error::custom(format!(
            "expected a JSON object, got {other}"
        )))),
    }
}

/// Decodes a row into a typed record.
///
/// # Errors
///
/// Returns an error if the row does not match the record's shape.
pub fn from_row<T: DeserializeOwned>(row: Row) -> StoreResult<T> {
    let fields: Row = row
        .into_iter()
        .map(|(column, value)| (field_name(&column), value))
        .collect();
    Ok(serde_json::from_value(Value::Object(fields))?)
}
