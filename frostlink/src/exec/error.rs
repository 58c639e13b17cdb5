// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Execution error types

use crate::driver::{DriverError, DriverErrorKind};
use thiserror::Error;

/// Errors surfaced by the connection and plan executor
#[derive(Debug, Error)]
pub enum ConnectionError {
    /// Remote execution failed; carries the server query id when one was
    /// assigned before the failure
    #[error("failed to execute query [queryID: {}]: {message}", .query_id.as_deref().unwrap_or("unknown"))]
    StatementExecution {
        message: String,
        query_id: Option<String>,
    },

    #[error("the query was canceled before it completed")]
    QueryCancelled,

    #[error("the last query in the plan did not return a result set")]
    NoResultSet,

    #[error("failed to upload to stage path {dest}: {source}")]
    StageUpload {
        dest: String,
        #[source]
        source: DriverError,
    },

    #[error("the stream provided for file {0} was closed before the upload finished")]
    StreamAlreadyClosed(String),

    #[error("failed to fetch the columnar result set: {0}")]
    ColumnarFetch(String),

    #[error("the server session has been closed")]
    SessionClosed,

    #[error("the server session has expired, please re-authenticate: {0}")]
    SessionExpired(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Translate a driver failure into the caller-facing taxonomy
pub(crate) fn from_driver(err: DriverError) -> ConnectionError {
    match err.kind {
        DriverErrorKind::AuthExpired => ConnectionError::SessionExpired(err.message),
        DriverErrorKind::ColumnarFetch => ConnectionError::ColumnarFetch(err.message),
        _ => ConnectionError::StatementExecution {
            message: err.message,
            query_id: err.query_id,
        },
    }
}
