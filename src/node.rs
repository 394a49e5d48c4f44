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

use anyhow::{Context, Result};
use std::fmt;

pub const DEFAULT_PORT: u16 = 5432;

/// Address of one database node. Equality and ordering are by
/// (host, port), so sorted node lists are deterministic across runs.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeAddress {
    pub host: String,
    pub port: u16,
}

impl NodeAddress {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Parse `host` or `host:port` (default port 5432).
    pub fn parse(node_str: &str, default_port: Option<u16>) -> Result<Self> {
        let (host, port) = if let Some(colon_pos) = node_str.rfind(':') {
            let host = &node_str[..colon_pos];
            let port_str = &node_str[colon_pos + 1..];
            let port = port_str.parse::<u16>().context("Invalid port number")?;
            (host, port)
        } else {
            (node_str, default_port.unwrap_or(DEFAULT_PORT))
        };

        if host.is_empty() {
            anyhow::bail!("Empty host in node address: {node_str:?}");
        }

        Ok(NodeAddress {
            host: host.to_string(),
            port,
        })
    }
}

impl fmt::Display for NodeAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}
