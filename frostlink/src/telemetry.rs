// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Telemetry sink seam
//!
//! Emission itself is an external concern; the orchestrator only decides
//! when a record is worth emitting.

use std::time::Duration;

/// Receiver for client-side telemetry events
pub trait TelemetrySink: Send + Sync {
    /// Emitted once when a connection is constructed
    fn record_session_created(&self, uses_external_connection: bool);

    /// Emitted after a stage upload that produced a server query id.
    ///
    /// Uploads without a correlating query id are not reported; a
    /// performance record that cannot be joined to a server query is not
    /// actionable.
    fn record_upload_perf(&self, operation: &str, duration: Duration, query_id: &str);
}

impl<T: TelemetrySink + ?Sized> TelemetrySink for std::sync::Arc<T> {
    fn record_session_created(&self, uses_external_connection: bool) {
        self.as_ref().record_session_created(uses_external_connection)
    }

    fn record_upload_perf(&self, operation: &str, duration: Duration, query_id: &str) {
        self.as_ref().record_upload_perf(operation, duration, query_id)
    }
}

/// Sink that drops every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopTelemetry;

impl TelemetrySink for NoopTelemetry {
    fn record_session_created(&self, _uses_external_connection: bool) {}

    fn record_upload_perf(&self, _operation: &str, _duration: Duration, _query_id: &str) {}
}
