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

//! All-pairs connectivity probing.
//!
//! For every source node, one control connection is opened and asked to
//! run the single-pair check against every node in the list (itself
//! included). Reachability is three-valued: `Some(true)` / `Some(false)`
//! are the source's own verdicts, `None` means this process could not ask
//! the source at all — a categorically different outcome from "the source
//! said no".

use anyhow::Result;
use tokio_util::sync::CancellationToken;

use crate::executor::evaluate_result;
use crate::node::NodeAddress;
use crate::wire::{ConnectionHandle, Connector, RawResult};

/// Trivial round-trip query for the single-pair check.
pub const CONNECTIVITY_CHECK_QUERY: &str = "SELECT 1";

/// Remote function each cluster node is expected to expose for delegated
/// checks; overridable via configuration.
pub const DEFAULT_CHECK_FUNCTION: &str = "pgmesh_check_connection_to_node";

/// One directed reachability observation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectivityRecord {
    pub source: NodeAddress,
    pub target: NodeAddress,
    /// `None` means the probing connection to `source` could not be
    /// established or the delegated check could not be completed.
    pub reachable: Option<bool>,
}

/// Check a single node by running a trivial query against it. Returns
/// true only if the round trip succeeds.
pub async fn check_connection_to_node(connector: &dyn Connector, addr: &NodeAddress) -> bool {
    let mut handle = match ConnectionHandle::connect(connector, addr.clone()).await {
        Ok(handle) => handle,
        Err(err) => {
            tracing::debug!("connectivity check handshake with {addr} failed: {err}");
            return false;
        }
    };

    if let Err(err) = handle.send_command(CONNECTIVITY_CHECK_QUERY) {
        tracing::debug!("connectivity check dispatch to {addr} failed: {err}");
        handle.close();
        return false;
    }

    let success = match handle.wait_result().await {
        Ok(raw) => evaluate_result(&raw, handle.last_error().as_deref()).0,
        Err(_) => false,
    };

    handle.close();
    success
}

/// SQL text asking a remote node to check connectivity to `target`.
pub fn connectivity_check_command(function: &str, target: &NodeAddress) -> String {
    let host = target.host.replace('\'', "''");
    format!("SELECT {function}('{host}', {port})", port = target.port)
}

/// Probes reachability between every ordered pair of nodes.
pub struct MeshProber<'a> {
    connector: &'a dyn Connector,
    check_function: String,
}

impl<'a> MeshProber<'a> {
    pub fn new(connector: &'a dyn Connector) -> Self {
        Self {
            connector,
            check_function: DEFAULT_CHECK_FUNCTION.to_string(),
        }
    }

    pub fn with_check_function(mut self, check_function: impl Into<String>) -> Self {
        self.check_function = check_function.into();
        self
    }

    /// Visit every ordered (source, target) pair exactly once, self-pairs
    /// included, over a sorted and deduplicated copy of `nodes`. Produces
    /// (node count)² records.
    pub async fn probe(
        &self,
        nodes: &[NodeAddress],
        cancel: &CancellationToken,
    ) -> Result<Vec<ConnectivityRecord>> {
        let mut nodes = nodes.to_vec();
        nodes.sort();
        nodes.dedup();

        let mut records = Vec::with_capacity(nodes.len() * nodes.len());

        for source in &nodes {
            let mut control = match ConnectionHandle::connect(self.connector, source.clone()).await
            {
                Ok(handle) => Some(handle),
                Err(err) => {
                    tracing::debug!("cannot reach source node {source}: {err}");
                    None
                }
            };

            for target in &nodes {
                if cancel.is_cancelled() {
                    if let Some(handle) = control.take() {
                        handle.close();
                    }
                    anyhow::bail!("connectivity probe interrupted");
                }

                let reachable = match control.as_mut() {
                    Some(handle) => {
                        let (reachable, alive) = self.delegate_check(handle, target).await;
                        if !alive {
                            if let Some(handle) = control.take() {
                                handle.close();
                            }
                        }
                        reachable
                    }
                    None => None,
                };

                records.push(ConnectivityRecord {
                    source: source.clone(),
                    target: target.clone(),
                    reachable,
                });
            }

            if let Some(handle) = control.take() {
                handle.close();
            }
        }

        Ok(records)
    }

    /// Ask the source (through `handle`) whether it can reach `target`.
    /// Returns the three-valued verdict plus whether the control
    /// connection survived the exchange.
    async fn delegate_check(
        &self,
        handle: &mut ConnectionHandle,
        target: &NodeAddress,
    ) -> (Option<bool>, bool) {
        let command = connectivity_check_command(&self.check_function, target);

        if let Err(err) = handle.send_command(&command) {
            tracing::debug!("delegated check dispatch failed: {err}");
            return (None, false);
        }

        match handle.wait_result().await {
            Ok(raw) => (interpret_check_result(&raw), true),
            Err(err) => {
                tracing::debug!("delegated check lost its connection: {err}");
                (None, false)
            }
        }
    }
}

/// A delegated check answers with a single boolean field; anything else —
/// an error result, a NULL, a malformed shape — stays unknown, never
/// false.
fn interpret_check_result(raw: &RawResult) -> Option<bool> {
    match raw {
        RawResult::Rows { columns: 1, rows } if rows.len() == 1 => rows[0]
            .first()
            .and_then(|value| value.as_deref())
            .and_then(parse_bool_field),
        _ => None,
    }
}

fn parse_bool_field(value: &str) -> Option<bool> {
    match value {
        "t" | "true" => Some(true),
        "f" | "false" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_command_text() {
        let command = connectivity_check_command(
            DEFAULT_CHECK_FUNCTION,
            &NodeAddress::new("db2.example.com", 5432),
        );
        assert_eq!(
            command,
            "SELECT pgmesh_check_connection_to_node('db2.example.com', 5432)"
        );
    }

    #[test]
    fn test_check_command_escapes_quotes() {
        let command =
            connectivity_check_command(DEFAULT_CHECK_FUNCTION, &NodeAddress::new("o'db", 5432));
        assert_eq!(
            command,
            "SELECT pgmesh_check_connection_to_node('o''db', 5432)"
        );
    }

    #[test]
    fn test_interpret_boolean_field() {
        let raw = RawResult::Rows {
            columns: 1,
            rows: vec![vec![Some("t".to_string())]],
        };
        assert_eq!(interpret_check_result(&raw), Some(true));

        let raw = RawResult::Rows {
            columns: 1,
            rows: vec![vec![Some("f".to_string())]],
        };
        assert_eq!(interpret_check_result(&raw), Some(false));
    }

    #[test]
    fn test_interpret_structural_failures_stay_unknown() {
        let error = RawResult::Error { message: None };
        assert_eq!(interpret_check_result(&error), None);

        let null_field = RawResult::Rows {
            columns: 1,
            rows: vec![vec![None]],
        };
        assert_eq!(interpret_check_result(&null_field), None);

        let wide = RawResult::Rows {
            columns: 2,
            rows: vec![vec![Some("t".to_string()), Some("f".to_string())]],
        };
        assert_eq!(interpret_check_result(&wide), None);

        let command = RawResult::Command { rows_affected: 0 };
        assert_eq!(interpret_check_result(&command), None);
    }
}
