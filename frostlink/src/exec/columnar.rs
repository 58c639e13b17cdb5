// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Numeric type correction for columnar results
//!
//! The columnar layer infers a decimal or floating type for fixed-point
//! columns even when the column has scale 0. After a full columnar fetch,
//! such columns are recast to the narrowest integer type that holds the
//! column's declared precision. Lazy batch iterators are left unmodified:
//! the correction would need cross-batch buffering to be applied safely.

use crate::driver::{ColumnMetadata, ColumnType};
use crate::exec::error::ConnectionError;
use arrow::array::ArrayRef;
use arrow::compute::cast;
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use std::sync::Arc;

/// Narrowest signed integer type that holds `precision` decimal digits
fn narrowest_integer(precision: u8) -> DataType {
    match precision {
        0..=2 => DataType::Int8,
        3..=4 => DataType::Int16,
        5..=9 => DataType::Int32,
        _ => DataType::Int64,
    }
}

fn is_integer(data_type: &DataType) -> bool {
    matches!(
        data_type,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
    )
}

/// Target integer type for one column, or `None` when no correction applies
fn integer_target(meta: &ColumnMetadata, current: &DataType) -> Option<DataType> {
    if meta.column_type != ColumnType::Fixed {
        return None;
    }
    let precision = meta.precision?;
    if meta.scale != Some(0) {
        return None;
    }
    if is_integer(current) {
        return None;
    }
    Some(narrowest_integer(precision))
}

/// Recast scale-0 fixed-point columns of one batch to integer types.
///
/// Values are unchanged; only the column type moves. Columns whose metadata
/// does not mark them as integral fixed-point, or that are already integer
/// typed, pass through untouched.
pub fn fix_batch_integer_columns(
    batch: &RecordBatch,
    meta: &[ColumnMetadata],
) -> Result<RecordBatch, ConnectionError> {
    let schema = batch.schema();
    let mut changed = false;
    let mut fields: Vec<Field> = Vec::with_capacity(batch.num_columns());
    let mut columns: Vec<ArrayRef> = Vec::with_capacity(batch.num_columns());

    for (index, field) in schema.fields().iter().enumerate() {
        let column = batch.column(index).clone();
        match meta
            .get(index)
            .and_then(|m| integer_target(m, field.data_type()))
        {
            Some(target) => {
                let recast = cast(&column, &target)
                    .map_err(|e| ConnectionError::ColumnarFetch(e.to_string()))?;
                fields.push(Field::new(
                    field.name().clone(),
                    target,
                    field.is_nullable(),
                ));
                columns.push(recast);
                changed = true;
            }
            None => {
                fields.push(field.as_ref().clone());
                columns.push(column);
            }
        }
    }

    if !changed {
        return Ok(batch.clone());
    }

    RecordBatch::try_new(Arc::new(Schema::new(fields)), columns)
        .map_err(|e| ConnectionError::ColumnarFetch(e.to_string()))
}

/// Apply the integer correction to every batch of a full columnar fetch
pub fn fix_batches_integer_columns(
    batches: Vec<RecordBatch>,
    meta: &[ColumnMetadata],
) -> Result<Vec<RecordBatch>, ConnectionError> {
    batches
        .iter()
        .map(|batch| fix_batch_integer_columns(batch, meta))
        .collect()
}
