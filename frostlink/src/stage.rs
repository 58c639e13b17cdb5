// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Stage transfer controller
//!
//! Uploads a local file or an in-memory stream to a stage location. Two
//! strategies share the public contract, selected once at connection
//! construction: the normal context issues a PUT statement through the
//! statement runner; the restricted context streams bytes directly through
//! the driver without building any SQL. Every upload is timed, and a
//! performance record is emitted when a server query id was produced.

use crate::config::ExecutionContext;
use crate::connection::Connection;
use crate::driver::SourceStream;
use crate::exec::error::ConnectionError;
use crate::exec::result::{ExecutionOutput, ResultFormat};
use crate::quoting::{
    normalize_local_file, normalize_remote_file_or_dir, unwrap_stage_location_single_quote,
};
use std::fs::File;
use std::io;
use std::path::Path;
use std::time::Instant;

/// Options for one stage upload
#[derive(Debug, Clone)]
pub struct StageUploadOptions {
    /// Stage location, with or without the leading `@`
    pub stage_location: String,
    /// Path prefix under the stage; a leading `/` is added when missing
    pub dest_prefix: String,
    /// Number of parallel transfer threads used by the engine
    pub parallel: u32,
    /// Let the engine compress the file on upload
    pub compress_data: bool,
    /// Source compression mode (e.g. `AUTO_DETECT`, `GZIP`, `NONE`)
    pub source_compression: String,
    pub overwrite: bool,
}

impl StageUploadOptions {
    pub fn new(stage_location: impl Into<String>) -> Self {
        Self {
            stage_location: stage_location.into(),
            dest_prefix: String::new(),
            parallel: 4,
            compress_data: true,
            source_compression: "AUTO_DETECT".to_string(),
            overwrite: false,
        }
    }

    pub fn with_dest_prefix(mut self, dest_prefix: impl Into<String>) -> Self {
        self.dest_prefix = dest_prefix.into();
        self
    }

    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }
}

/// Unquoted target path for a stage location plus destination prefix
pub(crate) fn build_target_path(stage_location: &str, dest_prefix: &str) -> String {
    let qualified = unwrap_stage_location_single_quote(stage_location);
    let prefix = if dest_prefix.is_empty() || dest_prefix.starts_with('/') {
        dest_prefix.to_string()
    } else {
        format!("/{dest_prefix}")
    };
    format!("{qualified}{prefix}")
}

fn bool_upper(value: bool) -> &'static str {
    if value {
        "TRUE"
    } else {
        "FALSE"
    }
}

/// Build the PUT statement for a normalized local path
pub(crate) fn build_put_statement(local_path: &str, options: &StageUploadOptions) -> String {
    let target_path = normalize_remote_file_or_dir(&build_target_path(
        &options.stage_location,
        &options.dest_prefix,
    ));
    format!(
        "PUT {} {} PARALLEL = {} AUTO_COMPRESS = {} SOURCE_COMPRESSION = {} OVERWRITE = {}",
        local_path,
        target_path,
        options.parallel,
        bool_upper(options.compress_data),
        options.source_compression.to_uppercase(),
        bool_upper(options.overwrite),
    )
}

/// One of the two upload code paths behind the public contract
pub(crate) trait TransferStrategy: Send + Sync {
    fn upload_file(
        &self,
        conn: &Connection,
        path: &Path,
        options: &StageUploadOptions,
    ) -> Result<Option<ExecutionOutput>, ConnectionError>;

    fn upload_stream(
        &self,
        conn: &Connection,
        stream: &mut dyn SourceStream,
        dest_filename: &str,
        options: &StageUploadOptions,
    ) -> Result<Option<ExecutionOutput>, ConnectionError>;
}

/// Select the strategy for a detected execution context
pub(crate) fn strategy_for(context: ExecutionContext) -> Box<dyn TransferStrategy> {
    if context.is_restricted() {
        Box::new(DirectTransfer)
    } else {
        Box::new(PutStatementTransfer)
    }
}

/// Restricted context: stream bytes straight to the stage path, no SQL
struct DirectTransfer;

impl DirectTransfer {
    fn transfer(
        &self,
        conn: &Connection,
        stream: &mut dyn SourceStream,
        dest_path: String,
    ) -> Result<Option<ExecutionOutput>, ConnectionError> {
        conn.driver()
            .upload_stream(stream, &dest_path)
            .map_err(|source| ConnectionError::StageUpload {
                dest: dest_path,
                source,
            })?;
        Ok(None)
    }
}

impl TransferStrategy for DirectTransfer {
    fn upload_file(
        &self,
        conn: &Connection,
        path: &Path,
        options: &StageUploadOptions,
    ) -> Result<Option<ExecutionOutput>, ConnectionError> {
        let file_name = path
            .file_name()
            .ok_or_else(|| {
                io::Error::new(io::ErrorKind::InvalidInput, "upload path has no file name")
            })?
            .to_string_lossy()
            .into_owned();
        let target = build_target_path(&options.stage_location, &options.dest_prefix);
        let mut file = File::open(path)?;
        self.transfer(conn, &mut file, format!("{target}/{file_name}"))
    }

    fn upload_stream(
        &self,
        conn: &Connection,
        stream: &mut dyn SourceStream,
        dest_filename: &str,
        options: &StageUploadOptions,
    ) -> Result<Option<ExecutionOutput>, ConnectionError> {
        if let Err(err) = stream.rewind() {
            if stream.is_closed() {
                return Err(ConnectionError::StreamAlreadyClosed(
                    dest_filename.to_string(),
                ));
            }
            return Err(ConnectionError::Io(err));
        }
        let target = build_target_path(&options.stage_location, &options.dest_prefix);
        match self.transfer(conn, stream, format!("{target}/{dest_filename}")) {
            Err(_) if stream.is_closed() => Err(ConnectionError::StreamAlreadyClosed(
                dest_filename.to_string(),
            )),
            other => other,
        }
    }
}

/// Normal context: build one PUT statement and run it through the statement
/// runner
struct PutStatementTransfer;

impl TransferStrategy for PutStatementTransfer {
    fn upload_file(
        &self,
        conn: &Connection,
        path: &Path,
        options: &StageUploadOptions,
    ) -> Result<Option<ExecutionOutput>, ConnectionError> {
        let uri = normalize_local_file(&path.to_string_lossy());
        let sql = build_put_statement(&uri, options);
        conn.run_query(&sql, ResultFormat::Rows, false).map(Some)
    }

    fn upload_stream(
        &self,
        conn: &Connection,
        stream: &mut dyn SourceStream,
        dest_filename: &str,
        options: &StageUploadOptions,
    ) -> Result<Option<ExecutionOutput>, ConnectionError> {
        // The placeholder path only exists to give the statement a file
        // reference; the live stream rides alongside it.
        let uri = normalize_local_file(&format!("/tmp/placeholder/{dest_filename}"));
        let sql = build_put_statement(&uri, options);
        match conn.run_query_with_stream(&sql, ResultFormat::Rows, false, Some(stream)) {
            Ok(output) => Ok(Some(output)),
            Err(_) if stream.is_closed() => Err(ConnectionError::StreamAlreadyClosed(
                dest_filename.to_string(),
            )),
            Err(err) => Err(err),
        }
    }
}

impl Connection {
    /// Upload a local file to a stage location
    pub fn upload_file(
        &self,
        path: impl AsRef<Path>,
        options: &StageUploadOptions,
    ) -> Result<Option<ExecutionOutput>, ConnectionError> {
        self.ensure_open()?;
        log::debug!("Uploading file to stage");
        self.with_upload_perf("upload_file", |conn| {
            conn.transfer().upload_file(conn, path.as_ref(), options)
        })
    }

    /// Upload an in-memory stream to a stage location under `dest_filename`
    pub fn upload_stream(
        &self,
        stream: &mut dyn SourceStream,
        dest_filename: &str,
        options: &StageUploadOptions,
    ) -> Result<Option<ExecutionOutput>, ConnectionError> {
        self.ensure_open()?;
        log::debug!("Uploading stream to stage");
        self.with_upload_perf("upload_stream", |conn| {
            conn.transfer()
                .upload_stream(conn, stream, dest_filename, options)
        })
    }

    /// Time an upload end-to-end and report it when a server query id was
    /// produced; a record without a correlating id is not actionable.
    fn with_upload_perf<F>(
        &self,
        operation: &'static str,
        f: F,
    ) -> Result<Option<ExecutionOutput>, ConnectionError>
    where
        F: FnOnce(&Connection) -> Result<Option<ExecutionOutput>, ConnectionError>,
    {
        let start = Instant::now();
        let result = f(self)?;
        let duration = start.elapsed();
        if let Some(output) = &result {
            self.telemetry()
                .record_upload_perf(operation, duration, &output.query_id);
        }
        log::debug!("Finished in {:.4} secs", duration.as_secs_f64());
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_target_path_prefixes() {
        assert_eq!(build_target_path("@stage", ""), "@stage");
        assert_eq!(build_target_path("@stage", "dir"), "@stage/dir");
        assert_eq!(build_target_path("@stage", "/dir"), "@stage/dir");
        assert_eq!(build_target_path("'@stage'", "dir"), "@stage/dir");
    }

    #[test]
    fn test_build_put_statement() {
        let options = StageUploadOptions::new("@stage").with_dest_prefix("pre");
        let sql = build_put_statement("'file:///tmp/a.csv'", &options);
        assert_eq!(
            sql,
            "PUT 'file:///tmp/a.csv' '@stage/pre' PARALLEL = 4 AUTO_COMPRESS = TRUE \
             SOURCE_COMPRESSION = AUTO_DETECT OVERWRITE = FALSE"
        );
    }

    #[test]
    fn test_build_put_statement_uppercases_options() {
        let mut options = StageUploadOptions::new("@stage").with_overwrite(true);
        options.source_compression = "gzip".to_string();
        options.compress_data = false;
        let sql = build_put_statement("'file:///tmp/a.csv'", &options);
        assert!(sql.contains("AUTO_COMPRESS = FALSE"));
        assert!(sql.contains("SOURCE_COMPRESSION = GZIP"));
        assert!(sql.contains("OVERWRITE = TRUE"));
    }
}
