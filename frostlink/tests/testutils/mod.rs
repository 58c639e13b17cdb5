//! Test utilities for FrostLink integration tests
//!
//! `MockDriver` is a scriptable in-memory driver: tests configure result
//! payloads and failure triggers, then assert on the statements it saw.

use frostlink::{
    ColumnMetadata, ColumnType, DriverError, DriverErrorKind, DriverOutput, DriverPayload,
    FetchShape, Row, SourceStream, StatementOptions, TelemetrySink, Value, WarehouseDriver,
};
use arrow::record_batch::RecordBatch;
use std::collections::HashMap;
use std::io::Read;
use std::sync::Mutex;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatementKind {
    Execute,
    ExecuteMany,
}

/// One statement the mock driver executed
#[derive(Debug, Clone)]
pub struct ExecutedStatement {
    pub sql: String,
    pub kind: StatementKind,
    pub parameter_rows: usize,
    pub skip_commit_on_temp_ddl: bool,
    pub fetch: FetchShape,
}

#[derive(Default)]
struct MockState {
    next_id: u64,
    executed: Vec<ExecutedStatement>,
    rows: Vec<Row>,
    columns: Vec<ColumnMetadata>,
    batches: Option<Vec<RecordBatch>>,
    fail_when_contains: Option<(String, DriverError)>,
    upload_error: Option<DriverError>,
    uploads: Vec<(String, Vec<u8>)>,
    attached_streams: Vec<Vec<u8>>,
    cached_params: HashMap<String, String>,
    closed: bool,
}

/// Scriptable driver standing in for the network layer
pub struct MockDriver {
    state: Mutex<MockState>,
}

impl MockDriver {
    pub fn new() -> Self {
        let _ = env_logger::builder().is_test(true).try_init();
        let state = MockState {
            next_id: 0,
            columns: vec![ColumnMetadata::new("C1", ColumnType::Fixed)
                .with_precision_and_scale(10, 0)],
            rows: vec![Row::new(vec![Value::Int(1)])],
            ..Default::default()
        };
        Self {
            state: Mutex::new(state),
        }
    }

    pub fn set_rows(&self, rows: Vec<Row>) {
        self.state.lock().unwrap().rows = rows;
    }

    pub fn set_columns(&self, columns: Vec<ColumnMetadata>) {
        self.state.lock().unwrap().columns = columns;
    }

    /// Serve these batches for columnar fetch requests. Without this call the
    /// mock answers every columnar request row-based (statement type
    /// unsupported).
    pub fn set_batches(&self, batches: Vec<RecordBatch>) {
        self.state.lock().unwrap().batches = Some(batches);
    }

    /// Fail any statement whose text contains `needle`
    pub fn fail_when_contains(&self, needle: &str, error: DriverError) {
        self.state.lock().unwrap().fail_when_contains = Some((needle.to_string(), error));
    }

    pub fn set_upload_error(&self, error: DriverError) {
        self.state.lock().unwrap().upload_error = Some(error);
    }

    pub fn set_cached_parameter(&self, name: &str, value: &str) {
        self.state
            .lock()
            .unwrap()
            .cached_params
            .insert(name.to_string(), value.to_string());
    }

    pub fn executed(&self) -> Vec<ExecutedStatement> {
        self.state.lock().unwrap().executed.clone()
    }

    pub fn executed_sql(&self) -> Vec<String> {
        self.executed().into_iter().map(|s| s.sql).collect()
    }

    /// Direct (non-statement) uploads: (target path, bytes)
    pub fn uploads(&self) -> Vec<(String, Vec<u8>)> {
        self.state.lock().unwrap().uploads.clone()
    }

    /// Byte payloads of streams attached to PUT statements
    pub fn attached_streams(&self) -> Vec<Vec<u8>> {
        self.state.lock().unwrap().attached_streams.clone()
    }

    fn next_query_id(state: &mut MockState) -> String {
        state.next_id += 1;
        format!("q{}", state.next_id)
    }

    fn check_failure(state: &MockState, sql: &str) -> Result<(), DriverError> {
        if let Some((needle, error)) = &state.fail_when_contains {
            if sql.contains(needle.as_str()) {
                return Err(error.clone());
            }
        }
        Ok(())
    }
}

impl WarehouseDriver for MockDriver {
    fn execute(
        &self,
        sql: &str,
        options: &StatementOptions,
        file_stream: Option<&mut dyn SourceStream>,
    ) -> Result<DriverOutput, DriverError> {
        let mut state = self.state.lock().unwrap();
        Self::check_failure(&state, sql)?;

        if let Some(stream) = file_stream {
            let mut bytes = Vec::new();
            stream
                .read_to_end(&mut bytes)
                .map_err(|e| DriverError::new(DriverErrorKind::StreamClosed, e.to_string()))?;
            state.attached_streams.push(bytes);
        }

        state.executed.push(ExecutedStatement {
            sql: sql.to_string(),
            kind: StatementKind::Execute,
            parameter_rows: 0,
            skip_commit_on_temp_ddl: options.skip_commit_on_temp_ddl,
            fetch: options.fetch,
        });

        let query_id = Self::next_query_id(&mut state);
        let payload = match (options.fetch, &state.batches) {
            (FetchShape::Columnar, Some(batches)) => DriverPayload::Columnar(batches.clone()),
            _ => DriverPayload::Rows(state.rows.clone()),
        };
        Ok(DriverOutput {
            query_id,
            columns: state.columns.clone(),
            payload,
        })
    }

    fn execute_many(
        &self,
        sql: &str,
        parameter_rows: &[Vec<Value>],
        options: &StatementOptions,
    ) -> Result<DriverOutput, DriverError> {
        let mut state = self.state.lock().unwrap();
        Self::check_failure(&state, sql)?;
        state.executed.push(ExecutedStatement {
            sql: sql.to_string(),
            kind: StatementKind::ExecuteMany,
            parameter_rows: parameter_rows.len(),
            skip_commit_on_temp_ddl: options.skip_commit_on_temp_ddl,
            fetch: options.fetch,
        });
        let query_id = Self::next_query_id(&mut state);
        Ok(DriverOutput {
            query_id,
            columns: Vec::new(),
            payload: DriverPayload::Rows(Vec::new()),
        })
    }

    fn describe(&self, _sql: &str) -> Result<Vec<ColumnMetadata>, DriverError> {
        Ok(self.state.lock().unwrap().columns.clone())
    }

    fn upload_stream(
        &self,
        stream: &mut dyn SourceStream,
        target_path: &str,
    ) -> Result<(), DriverError> {
        let mut state = self.state.lock().unwrap();
        if let Some(error) = &state.upload_error {
            return Err(error.clone());
        }
        let mut bytes = Vec::new();
        stream
            .read_to_end(&mut bytes)
            .map_err(|e| DriverError::new(DriverErrorKind::StreamClosed, e.to_string()))?;
        state.uploads.push((target_path.to_string(), bytes));
        Ok(())
    }

    fn session_id(&self) -> u64 {
        42
    }

    fn cached_parameter(&self, name: &str) -> Option<String> {
        self.state.lock().unwrap().cached_params.get(name).cloned()
    }

    fn close(&self) {
        self.state.lock().unwrap().closed = true;
    }

    fn is_closed(&self) -> bool {
        self.state.lock().unwrap().closed
    }
}

/// Telemetry sink that records every event
#[derive(Default)]
pub struct RecordingTelemetry {
    uploads: Mutex<Vec<(String, Duration, String)>>,
    sessions_created: Mutex<usize>,
}

impl RecordingTelemetry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn upload_events(&self) -> Vec<(String, Duration, String)> {
        self.uploads.lock().unwrap().clone()
    }

    pub fn sessions_created(&self) -> usize {
        *self.sessions_created.lock().unwrap()
    }
}

impl TelemetrySink for RecordingTelemetry {
    fn record_session_created(&self, _uses_external_connection: bool) {
        *self.sessions_created.lock().unwrap() += 1;
    }

    fn record_upload_perf(&self, operation: &str, duration: Duration, query_id: &str) {
        self.uploads
            .lock()
            .unwrap()
            .push((operation.to_string(), duration, query_id.to_string()));
    }
}
