// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Query execution orchestration
//!
//! This module turns a compiled [`plan::QueryPlan`] into a sequence of
//! remote statement executions and shapes the final result for the caller.

pub mod batch;
pub mod columnar;
pub mod error;
pub mod executor;
pub mod plan;
pub mod result;
pub mod statement;

pub use error::ConnectionError;
pub use plan::{PlanStatement, PostAction, QueryPlan, QueryStep};
pub use result::{
    Attribute, BatchSetIter, ExecutionOutput, ResultData, ResultFormat, RowSetIter,
};

/// Caller-supplied execution options threaded through a plan run
#[derive(Debug, Clone, Default)]
pub struct ExecOptions {
    /// Session-scoped query tag wrapped around batch inserts
    pub query_tag: Option<String>,
}

impl ExecOptions {
    pub fn with_query_tag(mut self, tag: impl Into<String>) -> Self {
        self.query_tag = Some(tag.into());
        self
    }
}
