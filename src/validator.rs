//! Typed value validation.
//!
//! Data points and metadata values arrive as arbitrary JSON scalars. Every
//! [`Data`](crate::types::DataResponse) and [`Meta`](crate::types::MetaResponse)
//! declares a [`ValueType`]; [`validate`] is the only place where a wire value
//! is turned into the canonical [`TypedValue`] that gets stored.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Wire and storage format of datetime values.
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Declared type of a data series or a metadata field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    String,
    Integer,
    Float,
    Datetime,
}

impl ValueType {
    pub const ALL: [ValueType; 4] = [ValueType::String, ValueType::Integer, ValueType::Float, ValueType::Datetime];

    pub fn as_str(&self) -> &'static str {
        match self {
            ValueType::String => "string",
            ValueType::Integer => "integer",
            ValueType::Float => "float",
            ValueType::Datetime => "datetime",
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ValueType {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "string" => Ok(ValueType::String),
            "integer" => Ok(ValueType::Integer),
            "float" => Ok(ValueType::Float),
            "datetime" => Ok(ValueType::Datetime),
            other => Err(ValueError::UnsupportedType(other.to_string())),
        }
    }
}

/// A value that passed validation against its declared type.
#[derive(Debug, Clone, PartialEq)]
pub enum TypedValue {
    String(String),
    Integer(i64),
    Float(f64),
    DateTime(NaiveDateTime),
}

impl TypedValue {
    pub fn value_type(&self) -> ValueType {
        match self {
            TypedValue::String(_) => ValueType::String,
            TypedValue::Integer(_) => ValueType::Integer,
            TypedValue::Float(_) => ValueType::Float,
            TypedValue::DateTime(_) => ValueType::Datetime,
        }
    }

    /// The JSON form that is persisted and returned to clients.
    pub fn to_json(&self) -> Value {
        match self {
            TypedValue::String(s) => Value::String(s.clone()),
            TypedValue::Integer(i) => Value::from(*i),
            // Non-finite floats are rejected during validation
            TypedValue::Float(f) => Value::from(*f),
            TypedValue::DateTime(dt) => Value::String(dt.format(DATETIME_FORMAT).to_string()),
        }
    }
}

/// Why a value was rejected. Every variant renders as `validation failed: <reason>`.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValueError {
    #[error("validation failed: unsupported data type '{0}'")]
    UnsupportedType(String),
    #[error("validation failed: invalid integer value: {0}")]
    InvalidInteger(String),
    #[error("validation failed: invalid float value: {0}")]
    InvalidFloat(String),
    #[error("validation failed: invalid datetime value: {0} (expected YYYY-MM-DD HH:MM:SS)")]
    InvalidDatetime(String),
}

/// Validates `value` against a type tag such as `"integer"`.
pub fn validate_tagged(type_tag: &str, value: &Value) -> Result<TypedValue, ValueError> {
    validate(type_tag.parse()?, value)
}

/// Coerces `value` into the canonical representation of `declared`.
pub fn validate(declared: ValueType, value: &Value) -> Result<TypedValue, ValueError> {
    match declared {
        ValueType::String => Ok(TypedValue::String(as_string(value))),
        ValueType::Integer => as_integer(value).map(TypedValue::Integer),
        ValueType::Float => as_float(value).map(TypedValue::Float),
        ValueType::Datetime => as_datetime(value).map(TypedValue::DateTime),
    }
}

fn as_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn as_integer(value: &Value) -> Result<i64, ValueError> {
    let invalid = || ValueError::InvalidInteger(value.to_string());
    match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                return Ok(i);
            }
            // u64 beyond i64::MAX or a float
            let f = n.as_f64().ok_or_else(invalid)?;
            if f.fract() != 0.0 || !f.is_finite() || f < i64::MIN as f64 || f >= i64::MAX as f64 {
                return Err(invalid());
            }
            Ok(f as i64)
        }
        Value::String(s) => s.trim().parse::<i64>().map_err(|_| invalid()),
        Value::Bool(b) => Ok(i64::from(*b)),
        Value::Null | Value::Array(_) | Value::Object(_) => Err(invalid()),
    }
}

fn as_float(value: &Value) -> Result<f64, ValueError> {
    let invalid = || ValueError::InvalidFloat(value.to_string());
    let f = match value {
        Value::Number(n) => n.as_f64().ok_or_else(invalid)?,
        Value::String(s) => s.trim().parse::<f64>().map_err(|_| invalid())?,
        Value::Bool(b) => {
            if *b {
                1.0
            } else {
                0.0
            }
        }
        Value::Null | Value::Array(_) | Value::Object(_) => return Err(invalid()),
    };
    if !f.is_finite() {
        return Err(invalid());
    }
    Ok(f)
}

fn as_datetime(value: &Value) -> Result<NaiveDateTime, ValueError> {
    match value {
        Value::String(s) if is_datetime_shaped(s) => NaiveDateTime::parse_from_str(s, DATETIME_FORMAT)
            .map_err(|_| ValueError::InvalidDatetime(value.to_string())),
        _ => Err(ValueError::InvalidDatetime(value.to_string())),
    }
}

/// `YYYY-MM-DD HH:MM:SS` with zero padding. chrono alone accepts unpadded fields.
fn is_datetime_shaped(s: &str) -> bool {
    let bytes = s.as_bytes();
    bytes.len() == 19
        && bytes.iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            10 => *b == b' ',
            13 | 16 => *b == b':',
            _ => b.is_ascii_digit(),
        })
}
