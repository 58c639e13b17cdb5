// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Batch-parameterized insertion
//!
//! Each row becomes one positional (qmark-style) parameter list; client
//! values map to engine column types positionally, not by name. An optional
//! query tag is set as a session variable around the batch statement, with
//! the unset guaranteed on every exit path once the set succeeded.

use crate::connection::Connection;
use crate::driver::{DriverError, Row, StatementOptions, Value};
use crate::exec::error::{self, ConnectionError};
use crate::exec::ExecOptions;
use crate::history::QueryRecord;

const UNSET_QUERY_TAG: &str = "alter session unset query_tag";

impl Connection {
    /// Insert a batch of rows with one statement execution per parameter set
    pub fn run_batch_insert(
        &self,
        sql: &str,
        rows: &[Row],
        options: &ExecOptions,
    ) -> Result<(), ConnectionError> {
        self.ensure_open()?;
        let params: Vec<Vec<Value>> = rows.iter().map(|row| row.values().to_vec()).collect();

        // Tag wrapping is skipped entirely inside the restricted context,
        // where session variables are managed by the host runtime.
        let query_tag = options
            .query_tag
            .as_deref()
            .filter(|tag| !tag.is_empty() && !self.execution_context().is_restricted());

        let mut tag_was_set = false;
        if let Some(tag) = query_tag {
            let set_sql = format!(
                "alter session set query_tag = {}",
                Value::Str(tag.to_string()).to_sql_literal()
            );
            let output = self
                .driver()
                .execute(&set_sql, &StatementOptions::default(), None)
                .map_err(error::from_driver)?;
            self.notify_query_listeners(&QueryRecord::new(output.query_id, set_sql));
            tag_was_set = true;
        }

        let batch_result = self
            .driver()
            .execute_many(sql, &params, &StatementOptions::default());
        if let Ok(output) = &batch_result {
            self.notify_query_listeners(&QueryRecord::new(output.query_id.clone(), sql));
        }

        // Unset runs even when the batch statement failed.
        let mut unset_err: Option<DriverError> = None;
        if tag_was_set {
            match self
                .driver()
                .execute(UNSET_QUERY_TAG, &StatementOptions::default(), None)
            {
                Ok(output) => {
                    self.notify_query_listeners(&QueryRecord::new(output.query_id, UNSET_QUERY_TAG))
                }
                Err(err) => unset_err = Some(err),
            }
        }

        if let Err(err) = batch_result {
            if let Some(unset) = unset_err {
                log::warn!("Failed to unset query tag after batch failure, suppressed: {unset}");
            }
            return Err(error::from_driver(err));
        }
        if let Some(err) = unset_err {
            return Err(error::from_driver(err));
        }

        log::debug!("Execute batch insertion query {sql}");
        Ok(())
    }
}
