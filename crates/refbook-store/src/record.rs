//! Typed record ingestion.
//!
//! Books can be filled from any collection of records that can hand out a
//! named field. The record shape is validated against the requested field
//! names before anything is written, so a bad collection leaves the book
//! untouched.

use std::collections::{BTreeMap, HashMap};

use serde_json::{Map, Value};

use refbook_core::{Error, Result, ResultExt};

/// A single field value read from a record
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Field<'a> {
    /// Integer value
    Int(i64),
    /// Plain text
    Text(&'a str),
    /// Raw bytes, e.g. a JSON column read from a database
    Bytes(&'a [u8]),
    /// Structured JSON value
    Json(&'a Value),
}

impl<'a> Field<'a> {
    /// Classify a JSON value
    pub fn from_value(value: &'a Value) -> Self {
        match value {
            Value::String(s) => Field::Text(s),
            Value::Number(n) => n.as_i64().map_or(Field::Json(value), Field::Int),
            other => Field::Json(other),
        }
    }

    /// Read the field as a book id
    pub fn to_id(&self, field: &str) -> Result<i64> {
        match *self {
            Field::Int(id) => Ok(id),
            Field::Text(text) => text
                .trim()
                .parse()
                .map_err(|_| Error::invalid_field(field, format!("'{text}' is not an integer id"))),
            _ => Err(Error::invalid_field(field, "expected an integer id")),
        }
    }

    /// Read the field as a single-language name
    pub fn to_text(&self, field: &str) -> Result<String> {
        match *self {
            Field::Text(text) => Ok(text.to_string()),
            Field::Bytes(bytes) => std::str::from_utf8(bytes)
                .map(str::to_string)
                .map_err(|_| Error::invalid_field(field, "name is not valid UTF-8")),
            Field::Json(Value::Null) => Ok(String::new()),
            _ => Err(Error::invalid_field(field, "expected a text name")),
        }
    }

    /// Read the field as a language tag to name mapping
    pub fn to_translations(&self, field: &str) -> Result<BTreeMap<String, String>> {
        match *self {
            Field::Bytes(bytes) => Ok(serde_json::from_slice(bytes)?),
            Field::Json(value) if value.is_object() => Ok(serde_json::from_value(value.clone())?),
            _ => Err(Error::invalid_field(field, "expected a language to name mapping")),
        }
    }
}

/// Anything that exposes fields by name
pub trait Record {
    /// Look up a field, `None` if the record has no such attribute
    fn field(&self, name: &str) -> Option<Field<'_>>;
}

impl Record for Map<String, Value> {
    fn field(&self, name: &str) -> Option<Field<'_>> {
        self.get(name).map(Field::from_value)
    }
}

impl Record for Value {
    fn field(&self, name: &str) -> Option<Field<'_>> {
        match self {
            Value::Object(map) => map.field(name),
            _ => None,
        }
    }
}

impl Record for HashMap<String, String> {
    fn field(&self, name: &str) -> Option<Field<'_>> {
        self.get(name).map(|s| Field::Text(s))
    }
}

impl Record for BTreeMap<String, String> {
    fn field(&self, name: &str) -> Option<Field<'_>> {
        self.get(name).map(|s| Field::Text(s))
    }
}

/// Read `(id, name)` rows out of `records`, converting each name with `convert`.
pub(crate) fn read_rows<R, T, F>(
    records: &[R],
    id_field: &str,
    name_field: &str,
    mut convert: F,
) -> Result<Vec<(i64, T)>>
where
    R: Record,
    F: FnMut(&Field<'_>) -> Result<T>,
{
    let Some(first) = records.first() else {
        return Ok(Vec::new());
    };
    for attribute in [id_field, name_field] {
        if first.field(attribute).is_none() {
            return Err(Error::missing_attribute(attribute));
        }
    }

    records
        .iter()
        .enumerate()
        .map(|(index, record)| {
            read_row(record, id_field, name_field, &mut convert)
                .with_context(|| format!("record {index}"))
        })
        .collect()
}

fn read_row<R, T, F>(record: &R, id_field: &str, name_field: &str, convert: &mut F) -> Result<(i64, T)>
where
    R: Record,
    F: FnMut(&Field<'_>) -> Result<T>,
{
    let id = record
        .field(id_field)
        .ok_or_else(|| Error::missing_attribute(id_field))?
        .to_id(id_field)?;
    let name = record
        .field(name_field)
        .ok_or_else(|| Error::missing_attribute(name_field))?;
    Ok((id, convert(&name)?))
}

/// Unwrap a JSON array of records
pub(crate) fn as_records(value: &Value) -> Result<&[Value]> {
    match value {
        Value::Array(records) => Ok(records),
        Value::Null => Ok(&[]),
        _ => Err(Error::shape_mismatch("expected a JSON array of records")),
    }
}
