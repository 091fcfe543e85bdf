//! Value types for persisted instance state
//!
//! This module defines:
//! - Value: the payload stored under a qualified name
//! - Visibility: who may read a stored value back
//! - InstanceValue: a value together with its visibility
//!
//! ## Type Rules
//!
//! - Different variants are never equal: `Int(1) != Float(1.0)`
//! - `Bytes` are not `String`
//! - Float uses IEEE-754 equality: `NaN != NaN`, `-0.0 == 0.0`
//!
//! The pipeline never inspects or encodes values; turning them into bytes is
//! the storage backend's job.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Payload stored under a qualified name
///
/// Objects use a `BTreeMap` so that nested payloads enumerate in a stable
/// order, matching the ordering guarantees of the store itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// Null value
    Null,
    /// Boolean value
    Bool(bool),
    /// 64-bit signed integer
    Int(i64),
    /// 64-bit floating point (IEEE-754)
    Float(f64),
    /// UTF-8 string
    String(String),
    /// Raw bytes
    Bytes(Vec<u8>),
    /// Array of values
    Array(Vec<Value>),
    /// Object with string keys
    Object(BTreeMap<String, Value>),
}

impl Value {
    /// Get the type name as a string
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "Null",
            Value::Bool(_) => "Bool",
            Value::Int(_) => "Int",
            Value::Float(_) => "Float",
            Value::String(_) => "String",
            Value::Bytes(_) => "Bytes",
            Value::Array(_) => "Array",
            Value::Object(_) => "Object",
        }
    }

    /// Check if this is a null value
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Get as bool if this is a Bool value
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Get as i64 if this is an Int value
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Get as f64 if this is a Float value
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Get as &str if this is a String value
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get as &[u8] if this is a Bytes value
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(b) => Some(b),
            _ => None,
        }
    }

    /// Get as &[Value] if this is an Array value
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }

    /// Get as &BTreeMap if this is an Object value
    pub fn as_object(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Object(o) => Some(o),
            _ => None,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i as i64)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<Vec<u8>> for Value {
    fn from(b: Vec<u8>) -> Self {
        Value::Bytes(b)
    }
}

impl From<Vec<Value>> for Value {
    fn from(a: Vec<Value>) -> Self {
        Value::Array(a)
    }
}

impl From<BTreeMap<String, Value>> for Value {
    fn from(o: BTreeMap<String, Value>) -> Self {
        Value::Object(o)
    }
}

impl From<()> for Value {
    fn from(_: ()) -> Self {
        Value::Null
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                // u64 beyond i64::MAX and real numbers both land here
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(arr) => {
                Value::Array(arr.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(obj) => {
                Value::Object(obj.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

// ============================================================================
// Visibility
// ============================================================================

/// Whether a stored value is handed back to participants on load
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Access {
    /// Persisted and restored; visible through the read-write view
    ReadWrite,
    /// Persisted only (e.g. for querying by the backend); never restored
    WriteOnly,
}

/// Whether the backend must persist a value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Requirement {
    /// The backend must persist this value
    Required,
    /// The backend may drop this value if it cannot store it
    Optional,
}

/// Visibility tag attached to every stored value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Visibility {
    /// Read-write or write-only
    pub access: Access,
    /// Required or optional
    pub requirement: Requirement,
}

impl Visibility {
    /// Collected read-write values: `{ReadWrite, Required}`
    pub const READ_WRITE: Visibility = Visibility {
        access: Access::ReadWrite,
        requirement: Requirement::Required,
    };

    /// Collected write-only and mapped values: `{WriteOnly, Optional}`
    pub const WRITE_ONLY: Visibility = Visibility {
        access: Access::WriteOnly,
        requirement: Requirement::Optional,
    };

    /// Create a visibility tag
    pub const fn new(access: Access, requirement: Requirement) -> Self {
        Visibility {
            access,
            requirement,
        }
    }

    /// Check if the value is write-only
    pub fn is_write_only(&self) -> bool {
        self.access == Access::WriteOnly
    }

    /// Check if the value is optional
    pub fn is_optional(&self) -> bool {
        self.requirement == Requirement::Optional
    }
}

/// A stored value and its visibility
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstanceValue {
    /// The payload
    pub value: Value,
    /// Visibility flags
    pub visibility: Visibility,
}

impl InstanceValue {
    /// Create a new instance value
    pub fn new(value: Value, visibility: Visibility) -> Self {
        InstanceValue { value, visibility }
    }

    /// Create a `{ReadWrite, Required}` value
    pub fn read_write(value: Value) -> Self {
        Self::new(value, Visibility::READ_WRITE)
    }

    /// Create a `{WriteOnly, Optional}` value
    pub fn write_only(value: Value) -> Self {
        Self::new(value, Visibility::WRITE_ONLY)
    }
}
