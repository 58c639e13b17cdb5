// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Statement runner: executes one SQL text and shapes its result
//!
//! Every successful execution is broadcast to the query listeners before the
//! result reaches the caller. A columnar fetch request that the statement
//! type cannot serve falls back to the row-based shape without surfacing an
//! error.

use crate::connection::Connection;
use crate::driver::{
    ColumnMetadata, DriverPayload, FetchShape, SourceStream, StatementOptions,
};
use crate::exec::columnar::fix_batches_integer_columns;
use crate::exec::error::{self, ConnectionError};
use crate::exec::result::{BatchSetIter, ExecutionOutput, ResultData, ResultFormat, RowSetIter};
use crate::history::QueryRecord;

impl Connection {
    /// Execute one SQL text and return its structured result
    pub fn run_query(
        &self,
        sql: &str,
        format: ResultFormat,
        is_ddl_on_temp_object: bool,
    ) -> Result<ExecutionOutput, ConnectionError> {
        self.run_query_with_stream(sql, format, is_ddl_on_temp_object, None)
    }

    /// Execute one SQL text with a live byte source attached (the
    /// PUT-with-stream path)
    pub(crate) fn run_query_with_stream(
        &self,
        sql: &str,
        format: ResultFormat,
        is_ddl_on_temp_object: bool,
        file_stream: Option<&mut dyn SourceStream>,
    ) -> Result<ExecutionOutput, ConnectionError> {
        self.ensure_open()?;

        let options = StatementOptions {
            fetch: if format.wants_columnar() {
                FetchShape::Columnar
            } else {
                FetchShape::RowBased
            },
            // DDL on a temp object must stay inside the caller's open
            // transaction
            skip_commit_on_temp_ddl: is_ddl_on_temp_object,
        };

        let output = match self.driver().execute(sql, &options, file_stream) {
            Ok(output) => output,
            Err(err) => {
                let query_id_log = err
                    .query_id
                    .as_deref()
                    .map(|id| format!(" [queryID: {id}]"))
                    .unwrap_or_default();
                log::error!("Failed to execute query{query_id_log} {sql}\n{err}");
                return Err(error::from_driver(err));
            }
        };

        self.notify_query_listeners(&QueryRecord::new(output.query_id.clone(), sql));
        log::debug!("Execute query [queryID: {}] {}", output.query_id, sql);

        let data = shape_payload(output.payload, format, &output.columns)?;
        Ok(ExecutionOutput {
            query_id: output.query_id,
            columns: output.columns,
            data,
        })
    }
}

/// Shape a driver payload into the representation the caller asked for.
///
/// A row-based payload under a columnar request is the driver signalling
/// that the statement type does not support columnar fetch; the caller's
/// downstream tolerates either shape, so the fallback is silent.
fn shape_payload(
    payload: DriverPayload,
    format: ResultFormat,
    meta: &[ColumnMetadata],
) -> Result<ResultData, ConnectionError> {
    match (format, payload) {
        (ResultFormat::Rows, DriverPayload::Rows(rows)) => Ok(ResultData::Rows(rows)),
        (ResultFormat::RowIter, DriverPayload::Rows(rows)) => {
            Ok(ResultData::RowIter(RowSetIter::new(rows)))
        }
        (ResultFormat::ColumnarAll, DriverPayload::Columnar(batches)) => Ok(ResultData::Batches(
            fix_batches_integer_columns(batches, meta)?,
        )),
        // Lazy batches are left uncorrected: the integer fix-up cannot be
        // applied per batch without buffering.
        (ResultFormat::ColumnarLazy, DriverPayload::Columnar(batches)) => {
            Ok(ResultData::BatchIter(BatchSetIter::new(batches)))
        }
        (ResultFormat::ColumnarAll, DriverPayload::Rows(rows)) => Ok(ResultData::Rows(rows)),
        (ResultFormat::ColumnarLazy, DriverPayload::Rows(rows)) => {
            Ok(ResultData::RowIter(RowSetIter::new(rows)))
        }
        (_, DriverPayload::Columnar(_)) => Err(ConnectionError::ColumnarFetch(
            "driver returned columnar data for a row-based fetch".to_string(),
        )),
    }
}
