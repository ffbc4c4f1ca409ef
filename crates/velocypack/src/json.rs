//! Conversion between encoded values and `serde_json::Value`.
//!
//! Binary values become `data:application/octet-stream;base64,...` strings
//! and dates become RFC 3339 strings with millisecond precision.

use base64::Engine;
use chrono::{DateTime, SecondsFormat};
use serde_json::{Map, Number, Value as JsonValue};

use crate::builder::{BuildValue, Builder};
use crate::error::{Result, VPackError};
use crate::slice::Slice;
use crate::value::Value;
use crate::vpack::VPack;

const BIN_URI_START: &str = "data:application/octet-stream;base64,";

/// Encodes a JSON document with default options and the standard
/// attribute translator.
pub fn from_json(value: &JsonValue) -> Result<VPack> {
    let mut builder = Builder::new();
    builder.add_json(value)?;
    builder.finish()
}

fn number_value(number: &Number) -> BuildValue<'static> {
    if let Some(value) = number.as_i64() {
        BuildValue::CompactInt(value)
    } else if let Some(value) = number.as_u64() {
        BuildValue::CompactUInt(value)
    } else {
        BuildValue::Double(number.as_f64().unwrap_or(f64::NAN))
    }
}

impl Builder {
    /// Appends a JSON document. Object members are written in map order and
    /// sorted when their object closes.
    pub fn add_json(&mut self, value: &JsonValue) -> Result<()> {
        self.write_json(None, value)
    }

    pub fn add_keyed_json(&mut self, key: &str, value: &JsonValue) -> Result<()> {
        self.write_json(Some(key), value)
    }

    fn write_json(&mut self, key: Option<&str>, value: &JsonValue) -> Result<()> {
        match value {
            JsonValue::Null => self.add_entry(key, BuildValue::Null),
            JsonValue::Bool(b) => self.add_entry(key, BuildValue::Bool(*b)),
            JsonValue::Number(n) => self.add_entry(key, number_value(n)),
            JsonValue::String(s) => self.add_entry(key, BuildValue::String(s)),
            JsonValue::Array(items) => {
                self.add_entry(key, BuildValue::Array)?;
                for item in items {
                    self.write_json(None, item)?;
                }
                self.close()
            }
            JsonValue::Object(members) => {
                self.add_entry(key, BuildValue::Object)?;
                for (name, member) in members {
                    self.write_json(Some(name), member)?;
                }
                self.close()
            }
        }
    }
}

impl Slice<'_> {
    /// Converts the value and everything below it to JSON.
    pub fn to_json(&self) -> Result<JsonValue> {
        Ok(match self.value()? {
            Value::None | Value::Illegal | Value::Null | Value::MinKey | Value::MaxKey => {
                JsonValue::Null
            }
            Value::Bool(b) => JsonValue::Bool(b),
            Value::Double(f) => Number::from_f64(f).map_or(JsonValue::Null, JsonValue::Number),
            Value::Int(i) => JsonValue::from(i),
            Value::UInt(u) => JsonValue::from(u),
            Value::SmallInt(i) => JsonValue::from(i),
            Value::String(s) => JsonValue::String(s.to_owned()),
            Value::Binary(bytes) => JsonValue::String(format!(
                "{}{}",
                BIN_URI_START,
                base64::engine::general_purpose::STANDARD.encode(bytes)
            )),
            Value::UtcDate(millis) => {
                let date = DateTime::from_timestamp_millis(millis)
                    .ok_or(VPackError::NumberOutOfRange { target: "DateTime" })?;
                JsonValue::String(date.to_rfc3339_opts(SecondsFormat::Millis, true))
            }
            Value::External(_) => return Err(VPackError::Unsupported("external value in JSON")),
            Value::Bcd(_) => return Err(VPackError::Unsupported("bcd value in JSON")),
            Value::Custom(_) => return Err(VPackError::Unsupported("custom value in JSON")),
            Value::Array(array) => {
                let mut items = Vec::new();
                for item in array.iter_array()? {
                    items.push(item.to_json()?);
                }
                JsonValue::Array(items)
            }
            Value::Object(object) => {
                let mut members = Map::new();
                for (name, member) in object.iter_object()? {
                    members.insert(name.to_owned(), member.to_json()?);
                }
                JsonValue::Object(members)
            }
        })
    }
}
