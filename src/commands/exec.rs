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
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::executor::{CommandSpec, ParallelExecutor, SequentialExecutor};
use crate::node::NodeAddress;
use crate::ui::OutputFormatter;
use crate::wire::Connector;

pub struct ExecuteCommandParams<'a> {
    pub nodes: Vec<NodeAddress>,
    pub command: &'a str,
    pub sequential: bool,
    pub poll_interval: Duration,
}

/// Run one command on every target node and print per-node results.
/// Returns true only if every command succeeded.
pub async fn execute_command(
    connector: &dyn Connector,
    params: ExecuteCommandParams<'_>,
    cancel: &CancellationToken,
) -> Result<bool> {
    println!(
        "{}",
        OutputFormatter::format_command_header(params.command, params.nodes.len())
    );

    let batch: Vec<CommandSpec> = params
        .nodes
        .iter()
        .map(|node| CommandSpec::new(node.clone(), params.command))
        .collect();

    let results = if params.sequential {
        SequentialExecutor::new(connector)
            .execute(&batch, cancel)
            .await?
    } else {
        ParallelExecutor::new(connector)
            .with_poll_interval(params.poll_interval)
            .execute(&batch, cancel)
            .await?
    };

    for result in &results {
        print!("{}", OutputFormatter::format_node_result(result));
    }

    let success_count = results.iter().filter(|r| r.is_success()).count();
    let failed_count = results.len() - success_count;

    println!(
        "{}",
        OutputFormatter::format_summary(results.len(), success_count, failed_count)
    );

    Ok(failed_count == 0)
}
