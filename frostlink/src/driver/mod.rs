// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Driver contract for the underlying network/auth layer
//!
//! FrostLink never talks to the wire itself. Everything below a single
//! statement execution (authentication, connection pooling, the result
//! protocol) lives behind [`WarehouseDriver`]. The orchestrator serializes
//! all statements for a connection; drivers may assume a single in-flight
//! statement at a time.

pub mod value;

use std::io::{self, Read};
use thiserror::Error;

use arrow::record_batch::RecordBatch;

pub use value::{ColumnMetadata, ColumnType, Row, Value};

/// Error category reported by the driver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverErrorKind {
    /// Statement execution failed on the server
    Execution,
    /// A columnar fetch was attempted and failed (distinct from the
    /// statement type simply not supporting columnar results, which is
    /// signalled through [`DriverPayload::Rows`])
    ColumnarFetch,
    /// The caller-supplied stream could not be read
    StreamClosed,
    /// The session needs re-authentication
    AuthExpired,
    /// Transport-level I/O failure
    Io,
}

/// Error returned by the underlying driver
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct DriverError {
    pub kind: DriverErrorKind,
    pub message: String,
    /// Server-assigned query id, when the server got far enough to assign one
    pub query_id: Option<String>,
}

impl DriverError {
    pub fn new(kind: DriverErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            query_id: None,
        }
    }

    pub fn execution(message: impl Into<String>) -> Self {
        Self::new(DriverErrorKind::Execution, message)
    }

    pub fn with_query_id(mut self, query_id: impl Into<String>) -> Self {
        self.query_id = Some(query_id.into());
        self
    }
}

/// Fetch shape requested from the driver for one statement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FetchShape {
    #[default]
    RowBased,
    Columnar,
}

/// Per-statement execution options passed down to the driver
#[derive(Debug, Clone, Copy, Default)]
pub struct StatementOptions {
    pub fetch: FetchShape,
    /// Tell the engine not to commit an open transaction when this statement
    /// is DDL on a temporary object
    pub skip_commit_on_temp_ddl: bool,
}

/// Result payload of one executed statement.
///
/// A columnar fetch request may still come back as `Rows`: that is the
/// driver signalling that the statement type does not support columnar
/// results, and the caller branches on the variant instead of catching an
/// error.
#[derive(Debug)]
pub enum DriverPayload {
    Rows(Vec<Row>),
    Columnar(Vec<RecordBatch>),
}

/// Everything the driver returns for one executed statement
#[derive(Debug)]
pub struct DriverOutput {
    /// Server-assigned query id
    pub query_id: String,
    /// Cursor description of the result columns
    pub columns: Vec<ColumnMetadata>,
    pub payload: DriverPayload,
}

/// A readable, rewindable byte source for stage uploads
pub trait SourceStream: Read {
    /// Reposition the stream at its start
    fn rewind(&mut self) -> io::Result<()>;

    /// Whether the stream has been closed by its owner.
    ///
    /// Used to distinguish "the upload failed" from "the caller handed us a
    /// stream that was already closed".
    fn is_closed(&self) -> bool {
        false
    }
}

impl SourceStream for std::fs::File {
    fn rewind(&mut self) -> io::Result<()> {
        use std::io::Seek;
        self.seek(io::SeekFrom::Start(0)).map(|_| ())
    }
}

/// In-memory byte source with explicit close semantics
pub struct ByteStream {
    cursor: io::Cursor<Vec<u8>>,
    closed: bool,
}

impl ByteStream {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self {
            cursor: io::Cursor::new(bytes),
            closed: false,
        }
    }

    /// Close the stream; further reads fail
    pub fn close(&mut self) {
        self.closed = true;
    }
}

impl Read for ByteStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.closed {
            return Err(io::Error::new(
                io::ErrorKind::Other,
                "read from closed stream",
            ));
        }
        self.cursor.read(buf)
    }
}

impl SourceStream for ByteStream {
    fn rewind(&mut self) -> io::Result<()> {
        if self.closed {
            return Err(io::Error::new(
                io::ErrorKind::Other,
                "rewind on closed stream",
            ));
        }
        self.cursor.set_position(0);
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.closed
    }
}

/// Single-statement execution primitive provided by the network layer.
///
/// Implementations are expected to serialize statements internally if they
/// hold shared cursor state; the orchestrator never issues concurrent calls
/// on one connection.
pub trait WarehouseDriver: Send + Sync {
    /// Execute one SQL text and return its structured result.
    ///
    /// `file_stream` carries the live byte source for statement-attached
    /// uploads (the PUT-with-stream path).
    fn execute(
        &self,
        sql: &str,
        options: &StatementOptions,
        file_stream: Option<&mut dyn SourceStream>,
    ) -> Result<DriverOutput, DriverError>;

    /// Execute one SQL text once per parameter row (qmark-style positional
    /// binding; values map to engine column types positionally)
    fn execute_many(
        &self,
        sql: &str,
        parameter_rows: &[Vec<Value>],
        options: &StatementOptions,
    ) -> Result<DriverOutput, DriverError>;

    /// Describe the result columns of a statement without executing it
    fn describe(&self, sql: &str) -> Result<Vec<ColumnMetadata>, DriverError>;

    /// Transfer a byte stream directly to a stage path without issuing SQL.
    /// Only available in restricted execution contexts.
    fn upload_stream(
        &self,
        stream: &mut dyn SourceStream,
        target_path: &str,
    ) -> Result<(), DriverError>;

    /// Server session id for this connection
    fn session_id(&self) -> u64;

    /// Session parameter value cached on the connection, if the driver has
    /// one (e.g. current warehouse/database/schema)
    fn cached_parameter(&self, name: &str) -> Option<String>;

    fn close(&self);

    fn is_closed(&self) -> bool;
}

impl<T: WarehouseDriver + ?Sized> WarehouseDriver for std::sync::Arc<T> {
    fn execute(
        &self,
        sql: &str,
        options: &StatementOptions,
        file_stream: Option<&mut dyn SourceStream>,
    ) -> Result<DriverOutput, DriverError> {
        self.as_ref().execute(sql, options, file_stream)
    }

    fn execute_many(
        &self,
        sql: &str,
        parameter_rows: &[Vec<Value>],
        options: &StatementOptions,
    ) -> Result<DriverOutput, DriverError> {
        self.as_ref().execute_many(sql, parameter_rows, options)
    }

    fn describe(&self, sql: &str) -> Result<Vec<ColumnMetadata>, DriverError> {
        self.as_ref().describe(sql)
    }

    fn upload_stream(
        &self,
        stream: &mut dyn SourceStream,
        target_path: &str,
    ) -> Result<(), DriverError> {
        self.as_ref().upload_stream(stream, target_path)
    }

    fn session_id(&self) -> u64 {
        self.as_ref().session_id()
    }

    fn cached_parameter(&self, name: &str) -> Option<String> {
        self.as_ref().cached_parameter(name)
    }

    fn close(&self) {
        self.as_ref().close()
    }

    fn is_closed(&self) -> bool {
        self.as_ref().is_closed()
    }
}
