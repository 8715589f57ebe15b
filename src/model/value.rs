//! Universal value type stored at property nodes.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// A literal property value.
///
/// Covers the types a property tree actually carries:
/// - Scalars: Bool, Int, Float, String, Bytes
/// - Containers: List, Map (a List written through `Graph::set` is expanded
///   into indexed child nodes rather than stored as a literal)
/// - Temporal: Date, DateTime
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Bytes(Vec<u8>),
    List(Vec<Value>),
    Map(HashMap<String, Value>),

    // Temporal types
    Date(NaiveDate),
    DateTime(DateTime<Utc>),
}

/// Expected-type hint passed to generators and carried by typed reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValueKind {
    /// No expectation; any value is acceptable.
    Any,
    Bool,
    Int,
    Float,
    String,
    Bytes,
    List,
    Map,
    Date,
    DateTime,
}

impl ValueKind {
    pub fn name(&self) -> &'static str {
        match self {
            ValueKind::Any => "ANY",
            ValueKind::Bool => "BOOLEAN",
            ValueKind::Int => "INTEGER",
            ValueKind::Float => "FLOAT",
            ValueKind::String => "STRING",
            ValueKind::Bytes => "BYTES",
            ValueKind::List => "LIST",
            ValueKind::Map => "MAP",
            ValueKind::Date => "DATE",
            ValueKind::DateTime => "DATETIME",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// Type checking
// ============================================================================

impl Value {
    pub fn type_name(&self) -> &'static str {
        self.kind().name()
    }

    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Null => ValueKind::Any,
            Value::Bool(_) => ValueKind::Bool,
            Value::Int(_) => ValueKind::Int,
            Value::Float(_) => ValueKind::Float,
            Value::String(_) => ValueKind::String,
            Value::Bytes(_) => ValueKind::Bytes,
            Value::List(_) => ValueKind::List,
            Value::Map(_) => ValueKind::Map,
            Value::Date(_) => ValueKind::Date,
            Value::DateTime(_) => ValueKind::DateTime,
        }
    }

    pub fn is_null(&self) -> bool { matches!(self, Value::Null) }
    pub fn is_numeric(&self) -> bool { matches!(self, Value::Int(_) | Value::Float(_)) }
    pub fn is_string(&self) -> bool { matches!(self, Value::String(_)) }

    /// Null and `false` are falsy; everything else is truthy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            _ => true,
        }
    }

    /// Attempt to extract as i64. Integral floats convert.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            Value::Float(f) if f.fract() == 0.0 => Some(*f as i64),
            _ => None,
        }
    }

    /// Attempt to extract as f64.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Attempt to extract as &str.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }
}

// ============================================================================
// FromValue — typed extraction for get/find/list_values
// ============================================================================

/// Convert from a resolved `Value` to a concrete type.
///
/// `EXPECTED` doubles as the type hint handed to generators when the value
/// is read through [`crate::Graph::get`] or [`crate::Graph::find`].
pub trait FromValue: Sized {
    const EXPECTED: ValueKind;

    fn from_value(val: &Value) -> Result<Self>;
}

fn mismatch(expected: ValueKind, got: &Value) -> Error {
    Error::TypeMismatch { expected: expected.name(), got: got.type_name() }
}

impl FromValue for Value {
    const EXPECTED: ValueKind = ValueKind::Any;
    fn from_value(val: &Value) -> Result<Self> {
        Ok(val.clone())
    }
}

impl FromValue for bool {
    const EXPECTED: ValueKind = ValueKind::Bool;
    fn from_value(val: &Value) -> Result<Self> {
        match val {
            Value::Bool(b) => Ok(*b),
            _ => Err(mismatch(Self::EXPECTED, val)),
        }
    }
}

impl FromValue for i64 {
    const EXPECTED: ValueKind = ValueKind::Int;
    fn from_value(val: &Value) -> Result<Self> {
        val.as_int().ok_or_else(|| mismatch(Self::EXPECTED, val))
    }
}

impl FromValue for f64 {
    const EXPECTED: ValueKind = ValueKind::Float;
    fn from_value(val: &Value) -> Result<Self> {
        val.as_float().ok_or_else(|| mismatch(Self::EXPECTED, val))
    }
}

impl FromValue for String {
    const EXPECTED: ValueKind = ValueKind::String;
    fn from_value(val: &Value) -> Result<Self> {
        match val {
            Value::String(s) => Ok(s.clone()),
            _ => Err(mismatch(Self::EXPECTED, val)),
        }
    }
}

impl FromValue for Vec<u8> {
    const EXPECTED: ValueKind = ValueKind::Bytes;
    fn from_value(val: &Value) -> Result<Self> {
        match val {
            Value::Bytes(b) => Ok(b.clone()),
            _ => Err(mismatch(Self::EXPECTED, val)),
        }
    }
}

impl FromValue for NaiveDate {
    const EXPECTED: ValueKind = ValueKind::Date;
    fn from_value(val: &Value) -> Result<Self> {
        match val {
            Value::Date(d) => Ok(*d),
            _ => Err(mismatch(Self::EXPECTED, val)),
        }
    }
}

impl FromValue for DateTime<Utc> {
    const EXPECTED: ValueKind = ValueKind::DateTime;
    fn from_value(val: &Value) -> Result<Self> {
        match val {
            Value::DateTime(dt) => Ok(*dt),
            _ => Err(mismatch(Self::EXPECTED, val)),
        }
    }
}

// ============================================================================
// Conversions (From impls)
// ============================================================================

impl From<bool> for Value { fn from(v: bool) -> Self { Value::Bool(v) } }
impl From<i32> for Value { fn from(v: i32) -> Self { Value::Int(v as i64) } }
impl From<i64> for Value { fn from(v: i64) -> Self { Value::Int(v) } }
impl From<f64> for Value { fn from(v: f64) -> Self { Value::Float(v) } }
impl From<String> for Value { fn from(v: String) -> Self { Value::String(v) } }
impl From<&str> for Value { fn from(v: &str) -> Self { Value::String(v.to_owned()) } }
impl From<NaiveDate> for Value { fn from(v: NaiveDate) -> Self { Value::Date(v) } }
impl From<DateTime<Utc>> for Value { fn from(v: DateTime<Utc>) -> Self { Value::DateTime(v) } }
impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self { Value::List(v.into_iter().map(Into::into).collect()) }
}
impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self { v.map(Into::into).unwrap_or(Value::Null) }
}

// ============================================================================
// JSON interop
// ============================================================================

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Int(i)
                } else {
                    Value::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::List(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => {
                Value::Map(map.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

impl From<Value> for serde_json::Value {
    fn from(v: Value) -> Self {
        match v {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(b),
            Value::Int(i) => serde_json::Value::from(i),
            Value::Float(f) => {
                serde_json::Number::from_f64(f)
                    .map(serde_json::Value::Number)
                    .unwrap_or(serde_json::Value::Null)
            }
            Value::String(s) => serde_json::Value::String(s),
            Value::Bytes(b) => {
                serde_json::Value::Array(b.into_iter().map(serde_json::Value::from).collect())
            }
            Value::List(items) => {
                serde_json::Value::Array(items.into_iter().map(serde_json::Value::from).collect())
            }
            Value::Map(map) => serde_json::Value::Object(
                map.into_iter().map(|(k, v)| (k, serde_json::Value::from(v))).collect(),
            ),
            Value::Date(d) => serde_json::Value::String(d.to_string()),
            Value::DateTime(dt) => serde_json::Value::String(dt.to_rfc3339()),
        }
    }
}

// ============================================================================
// Display
// ============================================================================

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::String(s) => write!(f, "\"{}\"", s.replace('"', "\\\"")),
            Value::Bytes(b) => write!(f, "<bytes[{}]>", b.len()),
            Value::List(l) => {
                write!(f, "[")?;
                for (i, v) in l.iter().enumerate() {
                    if i > 0 { write!(f, ", ")?; }
                    write!(f, "{v}")?;
                }
                write!(f, "]")
            }
            Value::Map(m) => {
                write!(f, "{{")?;
                for (i, (k, v)) in m.iter().enumerate() {
                    if i > 0 { write!(f, ", ")?; }
                    write!(f, "{k}: {v}")?;
                }
                write!(f, "}}")
            }
            Value::Date(d) => write!(f, "{d}"),
            Value::DateTime(dt) => write!(f, "{dt}"),
        }
    }
}
