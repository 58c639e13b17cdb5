// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Server connection facade
//!
//! Owns the driver, the listener registry, the telemetry sink, and the
//! transfer strategy. All statements for one connection are serialized by
//! the caller; the connection introduces no concurrency of its own.

use crate::config::{ConnectionOptions, ExecutionContext, PARAM_DATABASE, PARAM_SCHEMA};
use crate::driver::WarehouseDriver;
use crate::exec::error::ConnectionError;
use crate::exec::result::{attributes_from_metadata, Attribute, ResultData, ResultFormat};
use crate::history::{ListenerRegistry, QueryListener, QueryRecord};
use crate::quoting::{escape_quotes, quote_name, quote_name_without_upper_casing};
use crate::stage::{strategy_for, TransferStrategy};
use crate::telemetry::{NoopTelemetry, TelemetrySink};
use std::sync::Arc;

/// Client-side connection to the warehouse service
pub struct Connection {
    driver: Box<dyn WarehouseDriver>,
    options: ConnectionOptions,
    listeners: ListenerRegistry,
    telemetry: Box<dyn TelemetrySink>,
    context: ExecutionContext,
    transfer: Box<dyn TransferStrategy>,
}

impl Connection {
    /// Connect with a default telemetry sink and environment-detected
    /// execution context
    pub fn new(options: ConnectionOptions, driver: Box<dyn WarehouseDriver>) -> Self {
        Self::with_parts(
            options,
            driver,
            Box::new(NoopTelemetry),
            ExecutionContext::detect(),
        )
    }

    /// Connect with an explicit telemetry sink and execution context.
    ///
    /// The explicit context exists for embedding runtimes and tests; most
    /// callers want [`Connection::new`].
    pub fn with_parts(
        mut options: ConnectionOptions,
        driver: Box<dyn WarehouseDriver>,
        telemetry: Box<dyn TelemetrySink>,
        context: ExecutionContext,
    ) -> Self {
        options.apply_application_defaults();
        // The driver keeps its own credential copy; ours goes away.
        options.scrub_password();
        telemetry.record_session_created(true);
        let transfer = strategy_for(context);
        Self {
            driver,
            options,
            listeners: ListenerRegistry::new(),
            telemetry,
            context,
            transfer,
        }
    }

    pub(crate) fn driver(&self) -> &dyn WarehouseDriver {
        self.driver.as_ref()
    }

    pub(crate) fn telemetry(&self) -> &dyn TelemetrySink {
        self.telemetry.as_ref()
    }

    pub(crate) fn transfer(&self) -> &dyn TransferStrategy {
        self.transfer.as_ref()
    }

    pub fn execution_context(&self) -> ExecutionContext {
        self.context
    }

    pub fn options(&self) -> &ConnectionOptions {
        &self.options
    }

    /// Fail fast when the underlying driver connection is gone
    pub(crate) fn ensure_open(&self) -> Result<(), ConnectionError> {
        if self.driver.is_closed() {
            return Err(ConnectionError::SessionClosed);
        }
        Ok(())
    }

    pub fn close(&self) {
        self.driver.close();
    }

    pub fn is_closed(&self) -> bool {
        self.driver.is_closed()
    }

    /// Server session id for this connection
    pub fn session_id(&self) -> Result<u64, ConnectionError> {
        self.ensure_open()?;
        Ok(self.driver.session_id())
    }

    pub fn add_query_listener(&self, listener: Arc<dyn QueryListener>) {
        self.listeners.add(listener);
    }

    pub fn remove_query_listener(&self, listener: &Arc<dyn QueryListener>) {
        self.listeners.remove(listener);
    }

    pub fn notify_query_listeners(&self, record: &QueryRecord) {
        self.listeners.publish(record);
    }

    /// Configured default database in resolved (quoted) form
    pub fn default_database(&self) -> Option<String> {
        self.options.get_str(PARAM_DATABASE).map(|db| quote_name(&db))
    }

    /// Configured default schema in resolved (quoted) form
    pub fn default_schema(&self) -> Option<String> {
        self.options.get_str(PARAM_SCHEMA).map(|s| quote_name(&s))
    }

    /// Current value of a session parameter (database, schema, warehouse,
    /// role, ...), read from the driver's cache or from the server
    pub fn current_parameter(
        &self,
        param: &str,
        quoted: bool,
    ) -> Result<Option<String>, ConnectionError> {
        self.ensure_open()?;
        let name = match self.driver.cached_parameter(param) {
            Some(value) => Some(value),
            None => self.string_datum(&format!("SELECT CURRENT_{}()", param.to_uppercase()))?,
        };
        Ok(name.filter(|n| !n.is_empty()).map(|n| {
            if quoted {
                quote_name_without_upper_casing(&n)
            } else {
                escape_quotes(&n)
            }
        }))
    }

    /// First column of the first row of a query, as a string
    fn string_datum(&self, sql: &str) -> Result<Option<String>, ConnectionError> {
        let output = self.run_query(sql, ResultFormat::Rows, false)?;
        Ok(match output.data {
            ResultData::Rows(rows) => rows
                .first()
                .and_then(|row| row.get_index(0))
                .filter(|value| !value.is_null())
                .map(|value| value.to_string()),
            _ => None,
        })
    }

    /// Schema attributes of a statement's result, without executing it
    pub fn result_attributes(&self, sql: &str) -> Result<Vec<Attribute>, ConnectionError> {
        self.ensure_open()?;
        let meta = self
            .driver
            .describe(sql)
            .map_err(crate::exec::error::from_driver)?;
        Ok(attributes_from_metadata(&meta))
    }
}
