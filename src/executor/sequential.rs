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

//! Sequential executor: one command at a time, fully blocking.

use anyhow::Result;
use tokio_util::sync::CancellationToken;

use super::evaluate::{describe_connection_loss, evaluate_result};
use super::result_types::{CommandSpec, ExecutionResult, ResultCollector, ResultSink};
use crate::wire::{ConnectionHandle, Connector};

/// Runs a command batch in input order, opening a fresh connection per
/// command. A per-command failure is recorded and execution continues with
/// the next command; cancellation is checked after each command.
pub struct SequentialExecutor<'a> {
    connector: &'a dyn Connector,
}

impl<'a> SequentialExecutor<'a> {
    pub fn new(connector: &'a dyn Connector) -> Self {
        Self { connector }
    }

    pub async fn execute(
        &self,
        batch: &[CommandSpec],
        cancel: &CancellationToken,
    ) -> Result<Vec<ExecutionResult>> {
        let mut collector = ResultCollector::with_capacity(batch.len());
        self.execute_into(batch, &mut collector, cancel).await?;
        Ok(collector.into_results())
    }

    pub async fn execute_into(
        &self,
        batch: &[CommandSpec],
        sink: &mut dyn ResultSink,
        cancel: &CancellationToken,
    ) -> Result<()> {
        for (index, spec) in batch.iter().enumerate() {
            let (success, text) = self.run_one(spec).await;
            sink.record(index, &spec.target, success, text);

            if cancel.is_cancelled() {
                anyhow::bail!("command execution interrupted");
            }
        }
        Ok(())
    }

    async fn run_one(&self, spec: &CommandSpec) -> (bool, String) {
        let mut handle =
            match ConnectionHandle::connect(self.connector, spec.target.clone()).await {
                Ok(handle) => handle,
                Err(err) => {
                    tracing::debug!("handshake with {} failed: {err}", spec.target);
                    return (false, format!("failed to connect to {}", spec.target));
                }
            };

        if let Err(err) = handle.send_command(&spec.text) {
            tracing::debug!("dispatch to {} failed: {err}", spec.target);
            handle.close();
            return (false, format!("failed to send query to {}", spec.target));
        }

        let outcome = handle.wait_result().await;
        let evaluated = match outcome {
            Ok(raw) => evaluate_result(&raw, handle.last_error().as_deref()),
            Err(err) => (false, describe_connection_loss(&err)),
        };

        handle.close();
        evaluated
    }
}
