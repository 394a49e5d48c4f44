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

use anyhow::Result;
use owo_colors::OwoColorize;
use tokio_util::sync::CancellationToken;

use crate::mesh::MeshProber;
use crate::topology::TopologyProvider;
use crate::ui::OutputFormatter;
use crate::wire::Connector;

/// Probe the full reachability mesh and print every directed pair.
/// Returns true only if every pair came back reachable.
pub async fn probe_mesh(
    connector: &dyn Connector,
    topology: &dyn TopologyProvider,
    check_function: &str,
    cancel: &CancellationToken,
) -> Result<bool> {
    let nodes = topology.active_nodes().await?;
    if nodes.is_empty() {
        anyhow::bail!("No nodes to probe");
    }

    println!(
        "\n{} {} across {} {}\n",
        "►".cyan().bold(),
        "Probing connectivity".cyan(),
        nodes.len().to_string().bold(),
        if nodes.len() == 1 { "node" } else { "nodes" }
    );

    let prober = MeshProber::new(connector).with_check_function(check_function);
    let records = prober.probe(&nodes, cancel).await?;

    for record in &records {
        println!("{}", OutputFormatter::format_connectivity_record(record));
    }

    println!("{}", OutputFormatter::format_mesh_summary(&records));

    Ok(records.iter().all(|record| record.reachable == Some(true)))
}
