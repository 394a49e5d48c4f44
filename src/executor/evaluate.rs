// Copyright 2025 The pgmesh Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Result evaluation and error-message extraction.
//!
//! Query-style commands are held to a single-row, single-column contract;
//! anything wider is a per-command failure with a fixed diagnostic.

use crate::wire::{RawResult, WireError};

/// Substituted when a failed connection reports no error message.
pub const DEFAULT_ERROR_MESSAGE: &str = "An error occurred while running the query";

/// Interpret a raw command result into a `(success, text)` pair.
///
/// `last_error` is the originating connection's last driver message, used
/// when the result itself carries none.
pub fn evaluate_result(raw: &RawResult, last_error: Option<&str>) -> (bool, String) {
    match raw {
        RawResult::Command { rows_affected } => (true, rows_affected.to_string()),
        RawResult::Rows { columns, rows } => {
            if *columns != 1 {
                (false, "expected a single column in query target".to_string())
            } else if rows.len() > 1 {
                (false, "expected a single row in query result".to_string())
            } else {
                let text = rows
                    .first()
                    .and_then(|row| row.first())
                    .and_then(|value| value.clone())
                    .unwrap_or_default();
                (true, text)
            }
        }
        RawResult::Error { message } => (
            false,
            extract_error_message(message.as_deref().or(last_error)),
        ),
    }
}

/// Reduce a driver error message to a single line, substituting the fixed
/// default when none is available. Everything after (and including) the
/// first line break is discarded.
pub fn extract_error_message(message: Option<&str>) -> String {
    let message = match message {
        Some(message) if !message.is_empty() => message,
        _ => DEFAULT_ERROR_MESSAGE,
    };
    match message.find('\n') {
        Some(index) => message[..index].to_string(),
        None => message.to_string(),
    }
}

/// Diagnostic text for a command whose connection died in flight.
pub fn describe_connection_loss(err: &WireError) -> String {
    match err {
        WireError::ResultUnavailable => "query result unavailable".to_string(),
        other => match other.message() {
            Some(message) => extract_error_message(Some(message)),
            None => "connection lost".to_string(),
        },
    }
}
