//! MySQL type mappings.
//!
//! Type conversion uses a two-phase approach:
//! 1. `TypeCategory` classifies column types into logical categories
//! 2. Per-category decoders handle the actual value extraction
//!
//! MySQL may hand back VARBINARY where VARCHAR is expected depending on
//! charset configuration, so string extraction always falls back to raw
//! bytes. DECIMAL values are kept as strings to preserve precision.

use crate::models::ColumnMetadata;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde_json::Value as JsonValue;
use sqlx::mysql::{MySqlRow, MySqlTypeInfo, MySqlValueRef};
use sqlx::{Column, Decode, Row, Type, TypeInfo};

/// Logical category for MySQL column types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeCategory {
    Integer,
    Float,
    Decimal,
    Boolean,
    Temporal,
    Binary,
    Json,
    Text,
}

/// Classify a MySQL type name into a logical category.
pub fn categorize_type(type_name: &str) -> TypeCategory {
    let lower = type_name.to_lowercase();

    if lower.contains("decimal") || lower.contains("numeric") {
        return TypeCategory::Decimal;
    }

    if lower == "bool" || lower == "boolean" {
        return TypeCategory::Boolean;
    }

    if lower.contains("int") || lower == "year" {
        return TypeCategory::Integer;
    }

    if lower.contains("float") || lower.contains("double") || lower == "real" {
        return TypeCategory::Float;
    }

    if lower == "json" {
        return TypeCategory::Json;
    }

    if lower == "date" || lower == "time" || lower == "datetime" || lower == "timestamp" {
        return TypeCategory::Temporal;
    }

    if lower.contains("blob") || lower.contains("binary") {
        return TypeCategory::Binary;
    }

    TypeCategory::Text
}

/// Wrapper type for raw DECIMAL/NUMERIC values as strings.
/// This preserves the exact database representation.
#[derive(Debug)]
pub struct RawDecimal(pub String);

impl Type<sqlx::MySql> for RawDecimal {
    fn type_info() -> MySqlTypeInfo {
        <String as Type<sqlx::MySql>>::type_info()
    }

    fn compatible(ty: &MySqlTypeInfo) -> bool {
        let name = ty.name().to_lowercase();
        name.contains("decimal") || name.contains("numeric")
    }
}

impl<'r> Decode<'r, sqlx::MySql> for RawDecimal {
    fn decode(value: MySqlValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <&str as Decode<sqlx::MySql>>::decode(value)?;
        Ok(RawDecimal(s.to_string()))
    }
}

/// Decode binary data to JSON: UTF-8 text when valid, base64 otherwise.
pub fn decode_binary_value(bytes: &[u8]) -> JsonValue {
    use base64::{Engine as _, engine::general_purpose::STANDARD};

    match std::str::from_utf8(bytes) {
        Ok(s) => JsonValue::String(s.to_string()),
        Err(_) => JsonValue::String(STANDARD.encode(bytes)),
    }
}

/// Safely get a string from a MySQL row, falling back to raw bytes.
pub(crate) fn get_string(row: &MySqlRow, column: &str) -> String {
    row.try_get::<String, _>(column)
        .ok()
        .or_else(|| {
            row.try_get::<Vec<u8>, _>(column)
                .ok()
                .and_then(|bytes| String::from_utf8(bytes).ok())
        })
        .unwrap_or_default()
}

/// Safely get an optional string from a MySQL row.
pub(crate) fn get_optional_string(row: &MySqlRow, column: &str) -> Option<String> {
    row.try_get::<Option<String>, _>(column)
        .ok()
        .flatten()
        .or_else(|| {
            row.try_get::<Option<Vec<u8>>, _>(column)
                .ok()
                .flatten()
                .and_then(|bytes| String::from_utf8(bytes).ok())
        })
}

/// Trait for converting database rows to JSON maps.
pub trait RowToJson {
    fn to_json_map(&self) -> serde_json::Map<String, JsonValue>;
    fn get_column_metadata(&self) -> Vec<ColumnMetadata>;
}

impl RowToJson for MySqlRow {
    fn to_json_map(&self) -> serde_json::Map<String, JsonValue> {
        self.columns()
            .iter()
            .enumerate()
            .map(|(idx, col)| {
                let category = categorize_type(col.type_info().name());
                let value = decode_column(self, idx, category);
                (col.name().to_string(), value)
            })
            .collect()
    }

    fn get_column_metadata(&self) -> Vec<ColumnMetadata> {
        self.columns()
            .iter()
            .map(|col| {
                ColumnMetadata::new(
                    col.name(),
                    col.type_info().name(),
                    !col.type_info().is_null(),
                )
            })
            .collect()
    }
}

fn decode_column(row: &MySqlRow, idx: usize, category: TypeCategory) -> JsonValue {
    match category {
        TypeCategory::Decimal => decode_decimal(row, idx),
        TypeCategory::Integer => decode_integer(row, idx),
        TypeCategory::Boolean => decode_boolean(row, idx),
        TypeCategory::Float => decode_float(row, idx),
        TypeCategory::Temporal => decode_temporal(row, idx),
        TypeCategory::Binary => decode_binary_col(row, idx),
        TypeCategory::Json => decode_json(row, idx),
        TypeCategory::Text => decode_text(row, idx),
    }
}

fn decode_decimal(row: &MySqlRow, idx: usize) -> JsonValue {
    match row.try_get::<Option<RawDecimal>, _>(idx) {
        Ok(Some(v)) => JsonValue::String(v.0),
        Ok(None) => JsonValue::Null,
        Err(e) => {
            tracing::error!("Failed to decode DECIMAL: {:?}", e);
            JsonValue::Null
        }
    }
}

fn decode_integer(row: &MySqlRow, idx: usize) -> JsonValue {
    // Check NULL first
    if let Ok(None) = row.try_get::<Option<i64>, _>(idx) {
        return JsonValue::Null;
    }
    // Try signed types
    if let Ok(Some(v)) = row.try_get::<Option<i8>, _>(idx) {
        return JsonValue::Number(v.into());
    }
    if let Ok(Some(v)) = row.try_get::<Option<i16>, _>(idx) {
        return JsonValue::Number(v.into());
    }
    if let Ok(Some(v)) = row.try_get::<Option<i32>, _>(idx) {
        return JsonValue::Number(v.into());
    }
    if let Ok(Some(v)) = row.try_get::<Option<i64>, _>(idx) {
        return JsonValue::Number(v.into());
    }
    // Try unsigned types
    if let Ok(Some(v)) = row.try_get::<Option<u8>, _>(idx) {
        return JsonValue::Number(v.into());
    }
    if let Ok(Some(v)) = row.try_get::<Option<u16>, _>(idx) {
        return JsonValue::Number(v.into());
    }
    if let Ok(Some(v)) = row.try_get::<Option<u32>, _>(idx) {
        return JsonValue::Number(v.into());
    }
    if let Ok(Some(v)) = row.try_get::<Option<u64>, _>(idx) {
        return JsonValue::Number(v.into());
    }
    JsonValue::Null
}

fn decode_boolean(row: &MySqlRow, idx: usize) -> JsonValue {
    row.try_get::<Option<bool>, _>(idx)
        .ok()
        .flatten()
        .map(JsonValue::Bool)
        .unwrap_or(JsonValue::Null)
}

fn decode_float(row: &MySqlRow, idx: usize) -> JsonValue {
    if let Ok(Some(v)) = row.try_get::<Option<f64>, _>(idx) {
        return serde_json::Number::from_f64(v)
            .map(JsonValue::Number)
            .unwrap_or_else(|| JsonValue::String(v.to_string()));
    }
    if let Ok(Some(v)) = row.try_get::<Option<f32>, _>(idx) {
        return serde_json::Number::from_f64(v as f64)
            .map(JsonValue::Number)
            .unwrap_or_else(|| JsonValue::String(v.to_string()));
    }
    JsonValue::Null
}

fn decode_temporal(row: &MySqlRow, idx: usize) -> JsonValue {
    // TIMESTAMP decodes as DateTime<Utc>, DATETIME as NaiveDateTime
    if let Ok(Some(v)) = row.try_get::<Option<DateTime<Utc>>, _>(idx) {
        return JsonValue::String(v.to_rfc3339());
    }
    if let Ok(Some(v)) = row.try_get::<Option<NaiveDateTime>, _>(idx) {
        return JsonValue::String(v.format("%Y-%m-%d %H:%M:%S").to_string());
    }
    if let Ok(Some(v)) = row.try_get::<Option<NaiveDate>, _>(idx) {
        return JsonValue::String(v.format("%Y-%m-%d").to_string());
    }
    if let Ok(Some(v)) = row.try_get::<Option<NaiveTime>, _>(idx) {
        return JsonValue::String(v.format("%H:%M:%S").to_string());
    }
    JsonValue::Null
}

fn decode_binary_col(row: &MySqlRow, idx: usize) -> JsonValue {
    row.try_get::<Option<Vec<u8>>, _>(idx)
        .ok()
        .flatten()
        .map(|v| decode_binary_value(&v))
        .unwrap_or(JsonValue::Null)
}

fn decode_json(row: &MySqlRow, idx: usize) -> JsonValue {
    row.try_get::<Option<serde_json::Value>, _>(idx)
        .ok()
        .flatten()
        .unwrap_or(JsonValue::Null)
}

fn decode_text(row: &MySqlRow, idx: usize) -> JsonValue {
    if let Ok(Some(v)) = row.try_get::<Option<String>, _>(idx) {
        return JsonValue::String(v);
    }
    // VARBINARY masquerading as text
    if let Ok(Some(v)) = row.try_get::<Option<Vec<u8>>, _>(idx) {
        return decode_binary_value(&v);
    }
    JsonValue::Null
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categorize_type_integer() {
        assert_eq!(categorize_type("INT"), TypeCategory::Integer);
        assert_eq!(categorize_type("BIGINT UNSIGNED"), TypeCategory::Integer);
        assert_eq!(categorize_type("TINYINT"), TypeCategory::Integer);
        assert_eq!(categorize_type("YEAR"), TypeCategory::Integer);
    }

    #[test]
    fn test_categorize_type_decimal() {
        assert_eq!(categorize_type("DECIMAL"), TypeCategory::Decimal);
        assert_eq!(categorize_type("NUMERIC"), TypeCategory::Decimal);
    }

    #[test]
    fn test_categorize_type_temporal() {
        assert_eq!(categorize_type("DATETIME"), TypeCategory::Temporal);
        assert_eq!(categorize_type("TIMESTAMP"), TypeCategory::Temporal);
        assert_eq!(categorize_type("DATE"), TypeCategory::Temporal);
        assert_eq!(categorize_type("TIME"), TypeCategory::Temporal);
    }

    #[test]
    fn test_categorize_type_text_default() {
        assert_eq!(categorize_type("VARCHAR"), TypeCategory::Text);
        assert_eq!(categorize_type("TEXT"), TypeCategory::Text);
        assert_eq!(categorize_type("ENUM"), TypeCategory::Text);
    }

    #[test]
    fn test_categorize_type_binary_and_json() {
        assert_eq!(categorize_type("BLOB"), TypeCategory::Binary);
        assert_eq!(categorize_type("VARBINARY"), TypeCategory::Binary);
        assert_eq!(categorize_type("JSON"), TypeCategory::Json);
    }

    #[test]
    fn test_decode_binary_value_with_valid_utf8() {
        let result = decode_binary_value(b"hello world");
        assert_eq!(result, JsonValue::String("hello world".to_string()));
    }

    #[test]
    fn test_decode_binary_value_with_invalid_utf8() {
        let bytes: &[u8] = &[0xFF, 0xFE, 0x00, 0x01];
        let result = decode_binary_value(bytes);
        assert_eq!(result, JsonValue::String("//4AAQ==".to_string()));
    }

    #[test]
    fn test_decode_binary_value_empty() {
        let result = decode_binary_value(&[]);
        assert_eq!(result, JsonValue::String("".to_string()));
    }
}
