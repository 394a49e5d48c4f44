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

//! Configuration types and loading.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::mesh::DEFAULT_CHECK_FUNCTION;
use crate::node::{NodeAddress, DEFAULT_PORT};

/// Main configuration structure.
#[derive(Debug, Serialize, Deserialize, Default, Clone)]
pub struct Config {
    #[serde(default)]
    pub defaults: Defaults,

    #[serde(default)]
    pub clusters: HashMap<String, Cluster>,
}

/// Global default settings.
#[derive(Debug, Serialize, Deserialize, Default, Clone)]
pub struct Defaults {
    pub user: Option<String>,
    pub database: Option<String>,
    pub password: Option<String>,
    pub port: Option<u16>,
    /// Connection handshake timeout in seconds.
    pub connect_timeout: Option<u64>,
    /// Sleep between parallel drain sweeps, in milliseconds.
    pub poll_interval_ms: Option<u64>,
    /// Remote function used for delegated connectivity checks.
    pub check_function: Option<String>,
}

/// Cluster configuration.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Cluster {
    pub nodes: Vec<NodeConfig>,

    #[serde(flatten)]
    pub defaults: ClusterDefaults,
}

/// Cluster-specific default settings.
#[derive(Debug, Serialize, Deserialize, Default, Clone)]
pub struct ClusterDefaults {
    pub user: Option<String>,
    pub database: Option<String>,
    pub password: Option<String>,
    pub port: Option<u16>,
    pub connect_timeout: Option<u64>,
    pub poll_interval_ms: Option<u64>,
}

/// Node configuration within a cluster.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(untagged)]
pub enum NodeConfig {
    Simple(String),
    Detailed {
        host: String,
        #[serde(default)]
        port: Option<u16>,
    },
}

impl Config {
    /// Load configuration from a file, falling back to defaults when the
    /// file does not exist.
    pub async fn load(path: &Path) -> Result<Self> {
        let expanded_path = expand_tilde(path);

        if !expanded_path.exists() {
            tracing::debug!(
                "Config file not found at {:?}, using defaults",
                expanded_path
            );
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&expanded_path)
            .await
            .with_context(|| format!("Failed to read configuration file at {expanded_path:?}"))?;

        let config: Config = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse YAML configuration at {expanded_path:?}"))?;

        Ok(config)
    }

    /// Load configuration with priority order:
    /// 1. Explicit --config path (if it exists and differs from the default)
    /// 2. Current directory pgmesh.yaml
    /// 3. ~/.config/pgmesh/config.yaml
    pub async fn load_with_priority(cli_config_path: &Path) -> Result<Self> {
        let default_config_path = PathBuf::from("~/.config/pgmesh/config.yaml");
        let expanded_cli_path = expand_tilde(cli_config_path);
        let expanded_default_path = expand_tilde(&default_config_path);

        let is_custom_config = expanded_cli_path != expanded_default_path;
        if is_custom_config && expanded_cli_path.exists() {
            tracing::debug!("Using explicitly specified config file: {expanded_cli_path:?}");
            return Self::load(&expanded_cli_path).await;
        }

        let current_dir_config = PathBuf::from("pgmesh.yaml");
        if current_dir_config.exists() {
            tracing::debug!("Found pgmesh.yaml in current directory");
            return Self::load(&current_dir_config).await;
        }

        Self::load(&expanded_default_path).await
    }

    /// Resolve the node list for a cluster, applying the configured
    /// default port.
    pub fn cluster_nodes(&self, cluster_name: &str) -> Result<Vec<NodeAddress>> {
        let cluster = self
            .clusters
            .get(cluster_name)
            .with_context(|| format!("Unknown cluster: {cluster_name}"))?;

        let default_port = cluster
            .defaults
            .port
            .or(self.defaults.port)
            .unwrap_or(DEFAULT_PORT);

        cluster
            .nodes
            .iter()
            .map(|node| match node {
                NodeConfig::Simple(spec) => NodeAddress::parse(spec, Some(default_port)),
                NodeConfig::Detailed { host, port } => Ok(NodeAddress::new(
                    host.clone(),
                    port.unwrap_or(default_port),
                )),
            })
            .collect()
    }

    pub fn user(&self, cluster_name: Option<&str>) -> Option<String> {
        self.cluster_default(cluster_name, |c| c.user.clone())
            .or_else(|| self.defaults.user.clone())
    }

    pub fn database(&self, cluster_name: Option<&str>) -> Option<String> {
        self.cluster_default(cluster_name, |c| c.database.clone())
            .or_else(|| self.defaults.database.clone())
    }

    pub fn password(&self, cluster_name: Option<&str>) -> Option<String> {
        self.cluster_default(cluster_name, |c| c.password.clone())
            .or_else(|| self.defaults.password.clone())
    }

    pub fn connect_timeout(&self, cluster_name: Option<&str>) -> Option<u64> {
        self.cluster_default(cluster_name, |c| c.connect_timeout)
            .or(self.defaults.connect_timeout)
    }

    pub fn poll_interval_ms(&self, cluster_name: Option<&str>) -> Option<u64> {
        self.cluster_default(cluster_name, |c| c.poll_interval_ms)
            .or(self.defaults.poll_interval_ms)
    }

    pub fn check_function(&self) -> String {
        self.defaults
            .check_function
            .clone()
            .unwrap_or_else(|| DEFAULT_CHECK_FUNCTION.to_string())
    }

    fn cluster_default<T>(
        &self,
        cluster_name: Option<&str>,
        get: impl Fn(&ClusterDefaults) -> Option<T>,
    ) -> Option<T> {
        cluster_name
            .and_then(|name| self.clusters.get(name))
            .and_then(|cluster| get(&cluster.defaults))
    }
}

/// Expand tilde (~) in path to home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
    if let Some(path_str) = path.to_str() {
        if path_str.starts_with("~/") {
            if let Ok(home) = std::env::var("HOME") {
                return PathBuf::from(path_str.replacen("~", &home, 1));
            }
        }
    }
    path.to_path_buf()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cluster_nodes_with_default_port() {
        let yaml = r#"
defaults:
  port: 6432

clusters:
  production:
    nodes:
      - db1.example.com
      - db2.example.com:5432
      - host: db3.example.com
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        let nodes = config.cluster_nodes("production").unwrap();

        assert_eq!(nodes[0], NodeAddress::new("db1.example.com", 6432));
        assert_eq!(nodes[1], NodeAddress::new("db2.example.com", 5432));
        assert_eq!(nodes[2], NodeAddress::new("db3.example.com", 6432));
    }

    #[test]
    fn test_unknown_cluster_is_an_error() {
        let config = Config::default();
        assert!(config.cluster_nodes("nope").is_err());
    }

    #[test]
    fn test_cluster_overrides_fall_back_to_defaults() {
        let yaml = r#"
defaults:
  user: postgres
  connect_timeout: 20

clusters:
  production:
    user: admin
    nodes:
      - db1
  staging:
    nodes:
      - db2
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(config.user(Some("production")).as_deref(), Some("admin"));
        assert_eq!(config.user(Some("staging")).as_deref(), Some("postgres"));
        assert_eq!(config.user(None).as_deref(), Some("postgres"));
        assert_eq!(config.connect_timeout(Some("production")), Some(20));
    }

    #[test]
    fn test_check_function_default() {
        let config = Config::default();
        assert_eq!(config.check_function(), DEFAULT_CHECK_FUNCTION);
    }
}
