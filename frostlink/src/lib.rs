// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! FrostLink - Client-side query execution orchestrator for warehouse SQL
//! services
//!
//! FrostLink drives compiled multi-statement query plans against a remote
//! warehouse engine through a pluggable driver, and shapes the results for
//! the caller.
//!
//! # Features
//!
//! - **Plan execution**: ordered statement sequencing with server query-id
//!   propagation between dependent statements
//! - **Cooperative cancellation**: polled at step boundaries, never
//!   preemptive; cleanup actions always run
//! - **Result shaping**: row lists, one-pass row iterators, or Arrow
//!   columnar batches with integer type correction
//! - **Batch insertion**: positional (qmark) parameter binding with optional
//!   query-tag wrapping
//! - **Stage uploads**: PUT statements in normal contexts, direct stream
//!   transfer inside the engine's procedural runtime
//! - **Query listeners**: synchronous fan-out of executed-statement records
//!
//! The network/auth layer, the plan compiler, and telemetry emission are
//! external collaborators behind the [`driver::WarehouseDriver`],
//! [`exec::QueryPlan`], and [`telemetry::TelemetrySink`] seams.

pub mod config;
pub mod connection;
pub mod driver;
pub mod exec;
pub mod history;
pub mod quoting;
pub mod session;
pub mod stage;
pub mod telemetry;

// Re-export the public API
pub use config::{ConnectionOptions, ExecutionContext};
pub use connection::Connection;
pub use driver::{
    ByteStream, ColumnMetadata, ColumnType, DriverError, DriverErrorKind, DriverOutput,
    DriverPayload, FetchShape, Row, SourceStream, StatementOptions, Value, WarehouseDriver,
};
pub use exec::{
    Attribute, ConnectionError, ExecOptions, ExecutionOutput, PlanStatement, PostAction,
    QueryPlan, QueryStep, ResultData, ResultFormat,
};
pub use history::{QueryHistory, QueryListener, QueryRecord};
pub use session::SessionState;
pub use stage::StageUploadOptions;
pub use telemetry::{NoopTelemetry, TelemetrySink};

/// FrostLink version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// FrostLink crate name
pub const CRATE_NAME: &str = env!("CARGO_PKG_NAME");
