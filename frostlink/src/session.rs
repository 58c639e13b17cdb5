// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Session-scoped cancellation bookkeeping
//!
//! Cancellation is cooperative: any actor holding the session state may
//! advance the canceled watermark, and plan execution polls it at step
//! boundaries. A statement already in flight always runs to completion.

use std::sync::atomic::{AtomicU64, Ordering};

/// Shared cancellation state for one server session.
///
/// The action counter only increases. A plan captures an action id when it
/// starts; the plan is considered canceled once the last-canceled watermark
/// moves past that captured id (`captured < last_canceled`). The plan
/// executor treats this state as read-only.
#[derive(Debug, Default)]
pub struct SessionState {
    action_counter: AtomicU64,
    last_canceled_id: AtomicU64,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate the next action id (monotonically increasing, starting at 1)
    pub fn generate_action_id(&self) -> u64 {
        self.action_counter.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// The id below which every running plan is considered canceled
    pub fn last_canceled_id(&self) -> u64 {
        self.last_canceled_id.load(Ordering::SeqCst)
    }

    /// Cancel every plan started before this call.
    ///
    /// Returns the new watermark.
    pub fn cancel_all(&self) -> u64 {
        let id = self.generate_action_id();
        self.last_canceled_id.store(id, Ordering::SeqCst);
        id
    }

    /// Whether a plan that captured `action_id` at start has been canceled
    pub fn is_canceled(&self, action_id: u64) -> bool {
        action_id < self.last_canceled_id()
    }
}
