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

//! Batch input/output types for the executors.

use anyhow::Result;

use crate::node::NodeAddress;

/// One command to execute remotely.
#[derive(Debug, Clone)]
pub struct CommandSpec {
    pub target: NodeAddress,
    pub text: String,
}

impl CommandSpec {
    pub fn new(target: NodeAddress, text: impl Into<String>) -> Self {
        Self {
            target,
            text: text.into(),
        }
    }
}

/// Result of executing a command on a single node.
///
/// `success == false` always pairs with a populated single-line
/// diagnostic in `text`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionResult {
    pub node: NodeAddress,
    pub success: bool,
    pub text: String,
}

impl ExecutionResult {
    pub fn is_success(&self) -> bool {
        self.success
    }
}

/// Build a command batch from the caller's parallel input lists,
/// preserving input order.
pub fn build_command_batch(
    names: &[String],
    ports: &[u16],
    commands: &[String],
) -> Result<Vec<CommandSpec>> {
    if names.len() != ports.len() || names.len() != commands.len() {
        anyhow::bail!("expected same number of node name, port, and query string");
    }

    Ok(names
        .iter()
        .zip(ports)
        .zip(commands)
        .map(|((name, port), command)| {
            CommandSpec::new(NodeAddress::new(name.clone(), *port), command.clone())
        })
        .collect())
}

/// Destination the executors write per-command outcomes into, decoupling
/// result collection from how the caller materializes rows.
pub trait ResultSink {
    fn record(&mut self, index: usize, node: &NodeAddress, success: bool, text: String);
}

/// Default sink: an index-addressed result set that keeps output slots in
/// input order. Each slot is recorded exactly once; recording a slot twice
/// or finishing with a hole is a programming error and panics.
pub struct ResultCollector {
    slots: Vec<Option<ExecutionResult>>,
}

impl ResultCollector {
    pub fn with_capacity(count: usize) -> Self {
        Self {
            slots: (0..count).map(|_| None).collect(),
        }
    }

    pub fn recorded(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    pub fn into_results(self) -> Vec<ExecutionResult> {
        self.slots
            .into_iter()
            .enumerate()
            .map(|(index, slot)| {
                slot.unwrap_or_else(|| panic!("no result recorded for command {index}"))
            })
            .collect()
    }
}

impl ResultSink for ResultCollector {
    fn record(&mut self, index: usize, node: &NodeAddress, success: bool, text: String) {
        let slot = &mut self.slots[index];
        assert!(slot.is_none(), "result recorded twice for command {index}");
        *slot = Some(ExecutionResult {
            node: node.clone(),
            success,
            text,
        });
    }
}
