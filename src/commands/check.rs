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

use crate::mesh::check_connection_to_node;
use crate::node::NodeAddress;
use crate::wire::Connector;

/// Check a single node and print the verdict. Returns the check result.
pub async fn check_node(connector: &dyn Connector, node: &NodeAddress) -> Result<bool> {
    let reachable = check_connection_to_node(connector, node).await;

    if reachable {
        println!(
            "{} {} - {}",
            "●".green(),
            node.to_string().bold(),
            "Connected".green()
        );
    } else {
        println!(
            "{} {} - {}",
            "●".red(),
            node.to_string().bold(),
            "Failed".red()
        );
    }

    Ok(reachable)
}
