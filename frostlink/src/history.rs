// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Query listener bus
//!
//! Every executed statement is broadcast to the registered listeners before
//! the result is handed back to the caller. Delivery is synchronous on the
//! executing thread; listeners sit on the execution-critical path and must
//! not block.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Immutable record of one executed statement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryRecord {
    pub query_id: String,
    pub sql: String,
}

impl QueryRecord {
    pub fn new(query_id: impl Into<String>, sql: impl Into<String>) -> Self {
        Self {
            query_id: query_id.into(),
            sql: sql.into(),
        }
    }
}

/// Observer of executed statements
pub trait QueryListener: Send + Sync {
    fn on_query(&self, record: &QueryRecord);
}

/// Listener registry with snapshot-iterating publish.
///
/// Membership is unique (by listener identity); publish iterates over a
/// snapshot, so subscribe/unsubscribe from other threads never interleaves
/// with an in-flight delivery. Iteration order is unspecified.
#[derive(Default)]
pub struct ListenerRegistry {
    listeners: RwLock<Vec<Arc<dyn QueryListener>>>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener; adding the same listener twice is a no-op
    pub fn add(&self, listener: Arc<dyn QueryListener>) {
        let mut listeners = self.listeners.write();
        if !listeners.iter().any(|l| Arc::ptr_eq(l, &listener)) {
            listeners.push(listener);
        }
    }

    /// Remove a listener; removing an absent listener is a no-op
    pub fn remove(&self, listener: &Arc<dyn QueryListener>) {
        let mut listeners = self.listeners.write();
        listeners.retain(|l| !Arc::ptr_eq(l, listener));
    }

    /// Deliver a record to every current listener
    pub fn publish(&self, record: &QueryRecord) {
        let snapshot: Vec<Arc<dyn QueryListener>> = self.listeners.read().clone();
        for listener in snapshot {
            listener.on_query(record);
        }
    }

    pub fn len(&self) -> usize {
        self.listeners.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.read().is_empty()
    }
}

/// Concrete listener that accumulates every record it sees
#[derive(Default)]
pub struct QueryHistory {
    records: RwLock<Vec<QueryRecord>>,
}

impl QueryHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records observed so far, in delivery order
    pub fn records(&self) -> Vec<QueryRecord> {
        self.records.read().clone()
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

impl QueryListener for QueryHistory {
    fn on_query(&self, record: &QueryRecord) {
        self.records.write().push(record.clone());
    }
}
