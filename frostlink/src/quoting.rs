// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Identifier quoting and stage path normalization
//!
//! The engine folds unquoted identifiers to upper case; these helpers
//! reproduce that behavior on the client so that names configured by the
//! caller and names echoed by the server compare equal.

use once_cell::sync::Lazy;
use regex::Regex;

static ALREADY_QUOTED: Lazy<Regex> = Lazy::new(|| Regex::new(r#"^(?s)".+"$"#).unwrap());
static UNQUOTED_IDENTIFIER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[_A-Za-z]+[_A-Za-z0-9$]*$").unwrap());

/// Double every embedded double quote
pub fn escape_quotes(unescaped: &str) -> String {
    unescaped.replace('"', "\"\"")
}

/// Quote an identifier the way the engine resolves it: already-quoted names
/// pass through, plain identifiers are upper-cased, anything else is quoted
/// verbatim with interior quotes escaped.
pub fn quote_name(name: &str) -> String {
    if ALREADY_QUOTED.is_match(name) {
        name.to_string()
    } else if UNQUOTED_IDENTIFIER.is_match(name) {
        format!("\"{}\"", escape_quotes(&name.to_uppercase()))
    } else {
        format!("\"{}\"", escape_quotes(name))
    }
}

/// Quote an identifier preserving its case (for names echoed by the server,
/// which are already in resolved form)
pub fn quote_name_without_upper_casing(name: &str) -> String {
    format!("\"{}\"", escape_quotes(name))
}

/// Wrap a local file path in a quoted `file://` URI unless the caller
/// already quoted it
pub fn normalize_local_file(file: &str) -> String {
    let trimmed = file.trim();
    if trimmed.starts_with('\'') && trimmed.ends_with('\'') {
        trimmed.to_string()
    } else {
        format!("'file://{}'", trimmed)
    }
}

/// Single-quote a remote file or directory reference unless already quoted
pub fn normalize_remote_file_or_dir(name: &str) -> String {
    let trimmed = name.trim();
    if trimmed.starts_with('\'') && trimmed.ends_with('\'') {
        trimmed.to_string()
    } else {
        format!("'{}'", trimmed)
    }
}

/// Strip surrounding single quotes from a stage location and guarantee the
/// leading `@`
pub fn unwrap_stage_location_single_quote(name: &str) -> String {
    let mut unwrapped = name.trim().to_string();
    if unwrapped.starts_with('\'') && unwrapped.ends_with('\'') && unwrapped.len() >= 2 {
        unwrapped = unwrapped[1..unwrapped.len() - 1].to_string();
    }
    if unwrapped.starts_with('@') {
        unwrapped
    } else {
        format!("@{}", unwrapped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_name_upper_cases_plain_identifiers() {
        assert_eq!(quote_name("my_table"), "\"MY_TABLE\"");
        assert_eq!(quote_name("col$1"), "\"COL$1\"");
    }

    #[test]
    fn test_quote_name_preserves_quoted_identifiers() {
        assert_eq!(quote_name("\"MixedCase\""), "\"MixedCase\"");
    }

    #[test]
    fn test_quote_name_quotes_special_characters() {
        assert_eq!(quote_name("weird name"), "\"weird name\"");
        assert_eq!(quote_name("has\"quote"), "\"has\"\"quote\"");
    }

    #[test]
    fn test_quote_name_without_upper_casing() {
        assert_eq!(quote_name_without_upper_casing("db1"), "\"db1\"");
    }

    #[test]
    fn test_normalize_local_file() {
        assert_eq!(normalize_local_file("/tmp/a.csv"), "'file:///tmp/a.csv'");
        assert_eq!(normalize_local_file("'file:///tmp/a.csv'"), "'file:///tmp/a.csv'");
    }

    #[test]
    fn test_normalize_remote_file_or_dir() {
        assert_eq!(normalize_remote_file_or_dir("@stage/dir"), "'@stage/dir'");
        assert_eq!(normalize_remote_file_or_dir("'@stage/dir'"), "'@stage/dir'");
    }

    #[test]
    fn test_unwrap_stage_location() {
        assert_eq!(unwrap_stage_location_single_quote("'@stage'"), "@stage");
        assert_eq!(unwrap_stage_location_single_quote("stage"), "@stage");
        assert_eq!(unwrap_stage_location_single_quote("@stage"), "@stage");
    }
}
