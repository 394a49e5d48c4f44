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

//! Core parallel executor implementation.
//!
//! Four phases over the whole batch: initiate every connect without
//! blocking, establish each handshake, send every command, then drain with
//! non-blocking round-robin sweeps until every command is terminal. All
//! handshake and dispatch round-trips overlap across nodes, so wall-clock
//! time approaches the slowest single node rather than the sum.
//!
//! No task is spawned per connection: concurrency comes entirely from
//! overlapping in-flight handles polled in each sweep.

use anyhow::Result;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use super::evaluate::{describe_connection_loss, evaluate_result};
use super::result_types::{CommandSpec, ExecutionResult, ResultCollector, ResultSink};
use crate::wire::{ConnectionHandle, Connector, PollStatus};

/// Sleep between drain sweeps. Short enough not to inflate latency for
/// fast nodes, long enough to avoid busy-spinning.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Runs a command batch concurrently over one fresh connection per
/// command. Results land by original batch position, not completion order.
pub struct ParallelExecutor<'a> {
    connector: &'a dyn Connector,
    poll_interval: Duration,
}

impl<'a> ParallelExecutor<'a> {
    pub fn new(connector: &'a dyn Connector) -> Self {
        Self {
            connector,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
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
        let count = batch.len();
        let mut finished = 0usize;

        // Phase A: initiate a brand-new connection for every command.
        let mut slots: Vec<Option<ConnectionHandle>> = batch
            .iter()
            .map(|spec| {
                Some(ConnectionHandle::start_connect(
                    self.connector,
                    spec.target.clone(),
                ))
            })
            .collect();

        // Phase B: resolve each handshake. A failure records the outcome
        // and inerts the slot; it does not abort the batch.
        for ((index, slot), spec) in slots.iter_mut().enumerate().zip(batch) {
            let Some(handle) = slot.as_mut() else { continue };
            if let Err(err) = handle.finish_connect().await {
                tracing::debug!("handshake with {} failed: {err}", spec.target);
                sink.record(
                    index,
                    &spec.target,
                    false,
                    format!("failed to connect to {}", spec.target),
                );
                *slot = None;
                finished += 1;
            }
        }

        // Phase C: dispatch every command on the surviving connections.
        for ((index, slot), spec) in slots.iter_mut().enumerate().zip(batch) {
            let Some(handle) = slot.as_mut() else { continue };
            if let Err(err) = handle.send_command(&spec.text) {
                tracing::debug!("dispatch to {} failed: {err}", spec.target);
                sink.record(
                    index,
                    &spec.target,
                    false,
                    format!("failed to send query to {}", spec.target),
                );
                if let Some(handle) = slot.take() {
                    handle.close();
                }
                finished += 1;
            }
        }

        // Phase D: drain. Sweep the unfinished subset without blocking
        // until every command has a terminal status.
        while finished < count {
            for ((index, slot), spec) in slots.iter_mut().enumerate().zip(batch) {
                let status = match slot.as_mut() {
                    Some(handle) => handle.poll_ready().await,
                    None => continue,
                };

                match status {
                    PollStatus::StillBusy => {}
                    PollStatus::Ready(raw) => {
                        let last_error = slot.as_ref().and_then(|handle| handle.last_error());
                        let (success, text) = evaluate_result(&raw, last_error.as_deref());
                        if let Some(handle) = slot.take() {
                            handle.close();
                        }
                        sink.record(index, &spec.target, success, text);
                        finished += 1;
                    }
                    PollStatus::ConnectionLost(err) => {
                        tracing::debug!("connection to {} lost: {err}", spec.target);
                        if let Some(handle) = slot.take() {
                            handle.close();
                        }
                        sink.record(index, &spec.target, false, describe_connection_loss(&err));
                        finished += 1;
                    }
                }
            }

            if cancel.is_cancelled() {
                // Resource-cleanup fail-safe: every live connection is
                // closed before the abort is acknowledged.
                for slot in slots.iter_mut() {
                    if let Some(handle) = slot.take() {
                        handle.close();
                    }
                }
                anyhow::bail!("command execution interrupted");
            }

            if finished < count {
                tokio::time::sleep(self.poll_interval).await;
            }
        }

        Ok(())
    }
}
