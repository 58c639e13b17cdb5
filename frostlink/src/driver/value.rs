// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Wire-level value and metadata types shared with the driver

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// A single client-side value bound to or returned from a statement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Bytes(Vec<u8>),
}

impl Value {
    /// Render this value as a SQL literal.
    ///
    /// Strings are single-quoted with backslashes and embedded single quotes
    /// escaped, matching the engine's literal syntax. Used for query tags and
    /// for substituting server query ids into dependent statements.
    pub fn to_sql_literal(&self) -> String {
        match self {
            Value::Null => "NULL".to_string(),
            Value::Bool(b) => if *b { "TRUE" } else { "FALSE" }.to_string(),
            Value::Int(i) => i.to_string(),
            Value::Float(f) => f.to_string(),
            Value::Str(s) => {
                let escaped = s.replace('\\', "\\\\").replace('\'', "''");
                format!("'{}'", escaped)
            }
            Value::Bytes(b) => {
                let hex: String = b.iter().map(|byte| format!("{:02X}", byte)).collect();
                format!("'{}'", hex)
            }
        }
    }

    /// Whether this value is SQL NULL
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(v) => write!(f, "{}", v),
            Value::Str(s) => write!(f, "{}", s),
            Value::Bytes(b) => write!(f, "{} bytes", b.len()),
        }
    }
}

/// Single result row: positional values plus an optional shared field header
///
/// Rows coming off the driver are purely positional. The plan executor
/// attaches a shared header (one allocation per result set) when the caller
/// asks for named access.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Row {
    values: Vec<Value>,
    #[serde(skip)]
    fields: Option<Arc<Vec<String>>>,
}

impl Row {
    /// Create a positional row without a field header
    pub fn new(values: Vec<Value>) -> Self {
        Self {
            values,
            fields: None,
        }
    }

    /// Attach a shared field-name header to this row
    pub fn with_fields(mut self, fields: Arc<Vec<String>>) -> Self {
        self.fields = Some(fields);
        self
    }

    /// Positional values of this row
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Get a value by position
    pub fn get_index(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// Get a value by field name (requires an attached header)
    pub fn get(&self, name: &str) -> Option<&Value> {
        let fields = self.fields.as_ref()?;
        let position = fields.iter().position(|f| f == name)?;
        self.values.get(position)
    }

    /// Field names attached to this row, if any
    pub fn fields(&self) -> Option<&[String]> {
        self.fields.as_deref().map(|f| f.as_slice())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Column type reported by the engine in result metadata
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnType {
    /// Fixed-point number (the engine's NUMBER family)
    Fixed,
    /// Floating-point number
    Real,
    Text,
    Boolean,
    Date,
    Timestamp,
    Binary,
    Variant,
}

/// Metadata for one result column, as reported by the driver cursor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnMetadata {
    pub name: String,
    pub column_type: ColumnType,
    /// Total digits for `Fixed` columns, when known
    pub precision: Option<u8>,
    /// Digits after the decimal point for `Fixed` columns, when known
    pub scale: Option<i8>,
    pub nullable: bool,
}

impl ColumnMetadata {
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
            precision: None,
            scale: None,
            nullable: true,
        }
    }

    pub fn with_precision_and_scale(mut self, precision: u8, scale: i8) -> Self {
        self.precision = Some(precision);
        self.scale = Some(scale);
        self
    }

    pub fn with_nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }
}
