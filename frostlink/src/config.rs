// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Connection options
//!
//! Option keys are case-insensitive (stored lower-cased). The application
//! identification parameters are filled in from the crate when the caller
//! does not provide them, and the password is scrubbed from the retained map
//! once the driver has been handed its copy.

use serde_json::Value as JsonValue;
use std::collections::HashMap;

/// Environment variable marking a restricted execution context (code running
/// inside the engine's own procedural runtime)
pub const RESTRICTED_CONTEXT_ENV: &str = "FROSTLINK_RESTRICTED_CONTEXT";

pub const PARAM_APPLICATION: &str = "application";
pub const PARAM_INTERNAL_APPLICATION_NAME: &str = "internal_application_name";
pub const PARAM_INTERNAL_APPLICATION_VERSION: &str = "internal_application_version";
pub const PARAM_PASSWORD: &str = "password";
pub const PARAM_DATABASE: &str = "database";
pub const PARAM_SCHEMA: &str = "schema";

/// Case-insensitive connection option map
#[derive(Debug, Clone, Default)]
pub struct ConnectionOptions {
    params: HashMap<String, JsonValue>,
}

impl ConnectionOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from key/value pairs, lower-casing every key
    pub fn from_iter<I, K>(options: I) -> Self
    where
        I: IntoIterator<Item = (K, JsonValue)>,
        K: Into<String>,
    {
        let params = options
            .into_iter()
            .map(|(k, v)| (k.into().to_lowercase(), v))
            .collect();
        Self { params }
    }

    pub fn set(&mut self, key: &str, value: JsonValue) {
        self.params.insert(key.to_lowercase(), value);
    }

    pub fn get(&self, key: &str) -> Option<&JsonValue> {
        self.params.get(&key.to_lowercase())
    }

    /// String view of an option value (numbers are rendered, null is absent)
    pub fn get_str(&self, key: &str) -> Option<String> {
        match self.get(key)? {
            JsonValue::Null => None,
            JsonValue::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.params.contains_key(&key.to_lowercase())
    }

    /// Fill in application identification parameters from the crate when the
    /// caller did not set them
    pub fn apply_application_defaults(&mut self) {
        if !self.contains(PARAM_APPLICATION) {
            self.set(
                PARAM_APPLICATION,
                JsonValue::String(crate::CRATE_NAME.to_string()),
            );
        }
        if !self.contains(PARAM_INTERNAL_APPLICATION_NAME) {
            self.set(
                PARAM_INTERNAL_APPLICATION_NAME,
                JsonValue::String(crate::CRATE_NAME.to_string()),
            );
        }
        if !self.contains(PARAM_INTERNAL_APPLICATION_VERSION) {
            self.set(
                PARAM_INTERNAL_APPLICATION_VERSION,
                JsonValue::String(crate::VERSION.to_string()),
            );
        }
    }

    /// Drop the password from the retained map. The driver keeps its own
    /// copy of the credentials; the orchestrator must not.
    pub fn scrub_password(&mut self) {
        if self.contains(PARAM_PASSWORD) {
            self.set(PARAM_PASSWORD, JsonValue::Null);
        }
    }
}

/// Where the client code is running.
///
/// Inside the restricted context, direct file-transfer APIs are available
/// and SQL-level transfer statements are not used; session variables are
/// managed by the host runtime. Detected once at connection construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecutionContext {
    #[default]
    Normal,
    Restricted,
}

impl ExecutionContext {
    /// Detect the context from the process environment
    pub fn detect() -> Self {
        match std::env::var(RESTRICTED_CONTEXT_ENV) {
            Ok(value) if matches!(value.as_str(), "1" | "true" | "yes") => {
                ExecutionContext::Restricted
            }
            _ => ExecutionContext::Normal,
        }
    }

    pub fn is_restricted(&self) -> bool {
        matches!(self, ExecutionContext::Restricted)
    }
}
