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

//! Cluster topology lookup.

use anyhow::Result;
use async_trait::async_trait;

use crate::config::Config;
use crate::node::NodeAddress;

/// Source of the active node list the mesh prober walks. Implementations
/// return the list sorted by (host, port) so repeated probes are
/// comparable.
#[async_trait]
pub trait TopologyProvider: Send + Sync {
    async fn active_nodes(&self) -> Result<Vec<NodeAddress>>;
}

/// Topology backed by a fixed node list, e.g. a configured cluster.
pub struct StaticTopology {
    nodes: Vec<NodeAddress>,
}

impl StaticTopology {
    pub fn new(mut nodes: Vec<NodeAddress>) -> Self {
        nodes.sort();
        nodes.dedup();
        Self { nodes }
    }

    /// Build from a named cluster in the configuration.
    pub fn from_config(config: &Config, cluster_name: &str) -> Result<Self> {
        Ok(Self::new(config.cluster_nodes(cluster_name)?))
    }
}

#[async_trait]
impl TopologyProvider for StaticTopology {
    async fn active_nodes(&self) -> Result<Vec<NodeAddress>> {
        Ok(self.nodes.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_topology_sorts_and_dedups() {
        let topology = StaticTopology::new(vec![
            NodeAddress::new("db2", 5432),
            NodeAddress::new("db1", 5432),
            NodeAddress::new("db2", 5432),
        ]);

        let nodes = topology.active_nodes().await.unwrap();
        assert_eq!(
            nodes,
            vec![NodeAddress::new("db1", 5432), NodeAddress::new("db2", 5432)]
        );
    }
}
