// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Plan executor
//!
//! Walks a compiled plan in order, substituting earlier statements' server
//! query ids into later statement text, polling cancellation at step
//! boundaries, and running every post action regardless of how the plan
//! ended. Cleanup failures never mask a primary error.

use crate::connection::Connection;
use crate::driver::{Row, Value};
use crate::exec::error::ConnectionError;
use crate::exec::plan::{QueryPlan, QueryStep};
use crate::exec::result::{
    attributes_from_metadata, field_header, result_set_to_rows, Attribute, ExecutionOutput,
    ResultData, ResultFormat,
};
use crate::exec::ExecOptions;
use crate::driver::ColumnMetadata;
use std::collections::HashMap;

impl Connection {
    /// Execute a plan and return the final step's raw result and metadata
    pub fn get_result_set(
        &self,
        plan: &QueryPlan,
        format: ResultFormat,
        options: &ExecOptions,
    ) -> Result<(ResultData, Vec<ColumnMetadata>), ConnectionError> {
        self.ensure_open()?;
        let action_id = plan.session().generate_action_id();
        let last_index = plan.steps().len().saturating_sub(1);

        let mut placeholders: HashMap<String, String> = HashMap::new();
        let mut result: Option<ExecutionOutput> = None;
        let mut primary_err: Option<ConnectionError> = None;

        for (index, step) in plan.steps().iter().enumerate() {
            let outcome = self.run_step(
                step,
                index == last_index,
                format,
                options,
                &mut placeholders,
                &mut result,
            );
            if let Err(err) = outcome {
                primary_err = Some(err);
                break;
            }
            // Cancellation is polled here only; an in-flight statement always
            // runs to completion.
            if plan.session().is_canceled(action_id) {
                log::debug!("Plan canceled after step {index} (action id {action_id})");
                primary_err = Some(ConnectionError::QueryCancelled);
                break;
            }
        }

        // Post actions drop temporary objects; they run on every path, in
        // definition order.
        let mut cleanup_err: Option<ConnectionError> = None;
        for action in plan.post_actions() {
            if let Err(err) =
                self.run_query(&action.sql, ResultFormat::Rows, action.is_ddl_on_temp_object)
            {
                if primary_err.is_some() || cleanup_err.is_some() {
                    log::warn!("Post action failed after an earlier failure, suppressed: {err}");
                } else {
                    cleanup_err = Some(err);
                }
            }
        }

        if let Some(err) = primary_err {
            return Err(err);
        }
        if let Some(err) = cleanup_err {
            return Err(err);
        }

        let output = result.ok_or(ConnectionError::NoResultSet)?;
        Ok((output.data, output.columns))
    }

    fn run_step(
        &self,
        step: &QueryStep,
        is_last: bool,
        format: ResultFormat,
        options: &ExecOptions,
        placeholders: &mut HashMap<String, String>,
        result: &mut Option<ExecutionOutput>,
    ) -> Result<(), ConnectionError> {
        match step {
            QueryStep::BatchInsert { sql, rows } => self.run_batch_insert(sql, rows, options),
            QueryStep::Statement(stmt) => {
                let mut final_sql = stmt.sql.clone();
                for (holder, query_id) in placeholders.iter() {
                    final_sql = final_sql
                        .replace(holder, &Value::Str(query_id.clone()).to_sql_literal());
                }
                // Only the final step's result survives; intermediates are
                // materialized eagerly and discarded.
                let step_format = if is_last { format } else { format.eager() };
                let output =
                    self.run_query(&final_sql, step_format, stmt.is_ddl_on_temp_object)?;
                placeholders.insert(stmt.query_id_placeholder.clone(), output.query_id.clone());
                *result = Some(output);
                Ok(())
            }
        }
    }

    /// Execute a plan and return its result with field names resolved
    pub fn execute(
        &self,
        plan: &QueryPlan,
        format: ResultFormat,
        options: &ExecOptions,
    ) -> Result<ResultData, ConnectionError> {
        let (data, meta) = self.get_result_set(plan, format, options)?;
        Ok(match data {
            ResultData::Rows(rows) => ResultData::Rows(result_set_to_rows(rows, &meta)),
            ResultData::RowIter(iter) => ResultData::RowIter(iter.with_fields(field_header(&meta))),
            columnar => columnar,
        })
    }

    /// Execute a plan eagerly and return rows plus schema attributes
    pub fn get_result_and_metadata(
        &self,
        plan: &QueryPlan,
        options: &ExecOptions,
    ) -> Result<(Vec<Row>, Vec<Attribute>), ConnectionError> {
        let (data, meta) = self.get_result_set(plan, ResultFormat::Rows, options)?;
        let rows = match data {
            ResultData::Rows(rows) => result_set_to_rows(rows, &meta),
            // A row-based request never produces another shape; an empty
            // result here would hide a shaping bug.
            other => {
                return Err(ConnectionError::ColumnarFetch(format!(
                    "expected a materialized row result, got {other:?}"
                )))
            }
        };
        Ok((rows, attributes_from_metadata(&meta)))
    }
}
