// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Query plans
//!
//! A plan is an ordered sequence of statements compiled from one logical
//! operation, plus the cleanup statements that must run after it regardless
//! of outcome. Plans are produced by the plan compiler and consumed exactly
//! once by the plan executor.

use crate::driver::Row;
use crate::session::SessionState;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

static PLACEHOLDER_SEQ: AtomicU64 = AtomicU64::new(0);

/// Allocate a placeholder token for a statement's future query id.
///
/// Tokens are unique per process, which satisfies the per-plan uniqueness
/// invariant, and deliberately shaped so they cannot collide with real SQL
/// text.
pub fn generate_query_id_placeholder() -> String {
    let seq = PLACEHOLDER_SEQ.fetch_add(1, Ordering::Relaxed);
    format!("query_id_place_holder_{seq:016x}")
}

/// One statement step of a plan
#[derive(Debug, Clone)]
pub struct PlanStatement {
    pub sql: String,
    /// Token that later statements in the same plan may embed to reference
    /// this statement's server-assigned query id
    pub query_id_placeholder: String,
    /// DDL on a temporary object must not commit the open transaction
    pub is_ddl_on_temp_object: bool,
}

impl PlanStatement {
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            query_id_placeholder: generate_query_id_placeholder(),
            is_ddl_on_temp_object: false,
        }
    }

    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.query_id_placeholder = placeholder.into();
        self
    }

    pub fn ddl_on_temp_object(mut self) -> Self {
        self.is_ddl_on_temp_object = true;
        self
    }
}

/// One step of a plan: a plain statement or a batch-parameterized insert
#[derive(Debug, Clone)]
pub enum QueryStep {
    Statement(PlanStatement),
    /// Batch insert carrying one parameter row per inserted row. Produces no
    /// placeholder mapping.
    BatchInsert { sql: String, rows: Vec<Row> },
}

impl QueryStep {
    pub fn statement(sql: impl Into<String>) -> Self {
        QueryStep::Statement(PlanStatement::new(sql))
    }

    pub fn batch_insert(sql: impl Into<String>, rows: Vec<Row>) -> Self {
        QueryStep::BatchInsert {
            sql: sql.into(),
            rows,
        }
    }
}

/// Cleanup statement guaranteed to run after plan execution
#[derive(Debug, Clone)]
pub struct PostAction {
    pub sql: String,
    pub is_ddl_on_temp_object: bool,
}

impl PostAction {
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            is_ddl_on_temp_object: false,
        }
    }

    pub fn ddl_on_temp_object(mut self) -> Self {
        self.is_ddl_on_temp_object = true;
        self
    }
}

/// Ordered statements plus cleanup actions for one logical operation
#[derive(Debug, Clone)]
pub struct QueryPlan {
    steps: Vec<QueryStep>,
    post_actions: Vec<PostAction>,
    session: Arc<SessionState>,
}

impl QueryPlan {
    pub fn new(
        steps: Vec<QueryStep>,
        post_actions: Vec<PostAction>,
        session: Arc<SessionState>,
    ) -> Self {
        Self {
            steps,
            post_actions,
            session,
        }
    }

    pub fn steps(&self) -> &[QueryStep] {
        &self.steps
    }

    pub fn post_actions(&self) -> &[PostAction] {
        &self.post_actions
    }

    pub fn session(&self) -> &Arc<SessionState> {
        &self.session
    }
}
