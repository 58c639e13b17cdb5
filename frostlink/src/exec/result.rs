// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Execution results and result shaping

use crate::driver::{ColumnMetadata, Row};
use crate::quoting::quote_name;
use arrow::record_batch::RecordBatch;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::vec;

/// Result representation requested by the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResultFormat {
    /// Materialize the complete result as an ordered row list
    #[default]
    Rows,
    /// Forward-only, one-pass iterator over rows
    RowIter,
    /// All columnar batches, materialized and numeric-corrected
    ColumnarAll,
    /// Forward-only iterator over columnar batches, uncorrected
    ColumnarLazy,
}

impl ResultFormat {
    /// Shape used for intermediate plan steps, whose results are discarded
    pub(crate) fn eager(self) -> ResultFormat {
        ResultFormat::Rows
    }

    /// Whether this format asks the driver for columnar batches
    pub(crate) fn wants_columnar(self) -> bool {
        matches!(self, ResultFormat::ColumnarAll | ResultFormat::ColumnarLazy)
    }
}

/// Result data in the shape the caller asked for (or the row-based shape the
/// runner fell back to when the statement type does not support columnar
/// fetch)
#[derive(Debug)]
pub enum ResultData {
    Rows(Vec<Row>),
    RowIter(RowSetIter),
    Batches(Vec<RecordBatch>),
    BatchIter(BatchSetIter),
}

impl ResultData {
    /// Materialized rows, when this is the `Rows` shape
    pub fn rows(&self) -> Option<&[Row]> {
        match self {
            ResultData::Rows(rows) => Some(rows),
            _ => None,
        }
    }

    /// Materialized batches, when this is the `Batches` shape
    pub fn batches(&self) -> Option<&[RecordBatch]> {
        match self {
            ResultData::Batches(batches) => Some(batches),
            _ => None,
        }
    }
}

/// Structured result of one executed statement
#[derive(Debug)]
pub struct ExecutionOutput {
    /// Server-assigned query id
    pub query_id: String,
    /// Cursor description of the result columns
    pub columns: Vec<ColumnMetadata>,
    pub data: ResultData,
}

/// One-pass iterator over result rows.
///
/// The result set is already materialized on the client (the driver owns
/// streaming); this shape exists so large results can be consumed without a
/// second caller-side copy.
#[derive(Debug)]
pub struct RowSetIter {
    rows: vec::IntoIter<Row>,
    fields: Option<Arc<Vec<String>>>,
}

impl RowSetIter {
    pub fn new(rows: Vec<Row>) -> Self {
        Self {
            rows: rows.into_iter(),
            fields: None,
        }
    }

    pub fn with_fields(mut self, fields: Arc<Vec<String>>) -> Self {
        self.fields = Some(fields);
        self
    }
}

impl Iterator for RowSetIter {
    type Item = Row;

    fn next(&mut self) -> Option<Self::Item> {
        let row = self.rows.next()?;
        Some(match &self.fields {
            Some(fields) => row.with_fields(fields.clone()),
            None => row,
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.rows.size_hint()
    }
}

/// One-pass iterator over columnar batches
#[derive(Debug)]
pub struct BatchSetIter {
    batches: vec::IntoIter<RecordBatch>,
}

impl BatchSetIter {
    pub fn new(batches: Vec<RecordBatch>) -> Self {
        Self {
            batches: batches.into_iter(),
        }
    }
}

impl Iterator for BatchSetIter {
    type Item = RecordBatch;

    fn next(&mut self) -> Option<Self::Item> {
        self.batches.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.batches.size_hint()
    }
}

/// Schema attribute derived from result metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attribute {
    /// Column name in resolved (quoted) form
    pub name: String,
    pub column_type: crate::driver::ColumnType,
    pub nullable: bool,
}

/// Convert cursor metadata into schema attributes
pub fn attributes_from_metadata(meta: &[ColumnMetadata]) -> Vec<Attribute> {
    meta.iter()
        .map(|m| Attribute {
            name: quote_name(&m.name),
            column_type: m.column_type,
            nullable: m.nullable,
        })
        .collect()
}

/// Shared field-name header for a result set
pub fn field_header(meta: &[ColumnMetadata]) -> Arc<Vec<String>> {
    Arc::new(meta.iter().map(|m| m.name.clone()).collect())
}

/// Attach a field header to every row of a materialized result set
pub fn result_set_to_rows(rows: Vec<Row>, meta: &[ColumnMetadata]) -> Vec<Row> {
    let header = field_header(meta);
    rows.into_iter()
        .map(|row| row.with_fields(header.clone()))
        .collect()
}
