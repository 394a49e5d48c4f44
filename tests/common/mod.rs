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

//! Scripted mock transport for executor and mesh tests.

// Each integration test binary uses its own subset of these helpers.
#![allow(dead_code)]

use futures::future::BoxFuture;
use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use std::time::Duration;

use pgmesh::node::NodeAddress;
use pgmesh::wire::{Connector, RawResult, Session, WireError};

pub type Responder = Arc<dyn Fn(&str) -> Result<RawResult, WireError> + Send + Sync>;

/// Scripted behavior for one node.
#[derive(Clone)]
pub enum NodeScript {
    /// Refuse the connection handshake.
    RefuseConnect,
    /// Accept the handshake but fail every dispatch.
    RefuseSend,
    /// Answer each command through the responder, after the latency.
    Respond {
        responder: Responder,
        latency: Duration,
    },
}

/// A single-column, single-row result carrying `value`.
pub fn scalar(value: &str) -> RawResult {
    RawResult::Rows {
        columns: 1,
        rows: vec![vec![Some(value.to_string())]],
    }
}

/// Script answering every command with the same scalar.
pub fn respond_scalar(value: &'static str) -> NodeScript {
    NodeScript::Respond {
        responder: Arc::new(move |_| Ok(scalar(value))),
        latency: Duration::ZERO,
    }
}

/// Script answering every command with the same scalar after `latency`.
pub fn respond_scalar_after(value: &'static str, latency: Duration) -> NodeScript {
    NodeScript::Respond {
        responder: Arc::new(move |_| Ok(scalar(value))),
        latency,
    }
}

/// Script answering each command through `f`.
pub fn respond_with(
    f: impl Fn(&str) -> Result<RawResult, WireError> + Send + Sync + 'static,
) -> NodeScript {
    NodeScript::Respond {
        responder: Arc::new(f),
        latency: Duration::ZERO,
    }
}

/// Connection bookkeeping shared with the test body.
#[derive(Default)]
pub struct MockState {
    pub opened: Mutex<Vec<NodeAddress>>,
    pub closed: Mutex<Vec<NodeAddress>>,
    pub commands: Mutex<Vec<(NodeAddress, String)>>,
}

impl MockState {
    pub fn opened_count(&self) -> usize {
        self.opened.lock().unwrap().len()
    }

    pub fn closed_count(&self) -> usize {
        self.closed.lock().unwrap().len()
    }
}

pub struct MockConnector {
    scripts: HashMap<NodeAddress, NodeScript>,
    pub state: Arc<MockState>,
}

impl MockConnector {
    pub fn new() -> Self {
        Self {
            scripts: HashMap::new(),
            state: Arc::new(MockState::default()),
        }
    }

    pub fn script(mut self, addr: NodeAddress, script: NodeScript) -> Self {
        self.scripts.insert(addr, script);
        self
    }
}

impl Connector for MockConnector {
    fn start_connect(
        &self,
        addr: &NodeAddress,
    ) -> BoxFuture<'static, Result<Box<dyn Session>, WireError>> {
        let script = self
            .scripts
            .get(addr)
            .cloned()
            .unwrap_or_else(|| respond_scalar("1"));
        let addr = addr.clone();
        let state = Arc::clone(&self.state);

        Box::pin(async move {
            match script {
                NodeScript::RefuseConnect => {
                    Err(WireError::connect_failed(&addr, "connection refused"))
                }
                NodeScript::RefuseSend => {
                    state.opened.lock().unwrap().push(addr.clone());
                    Ok(Box::new(MockSession {
                        addr,
                        responder: None,
                        latency: Duration::ZERO,
                        pending: None,
                        last_error: None,
                        state,
                        closed: false,
                    }) as Box<dyn Session>)
                }
                NodeScript::Respond { responder, latency } => {
                    state.opened.lock().unwrap().push(addr.clone());
                    Ok(Box::new(MockSession {
                        addr,
                        responder: Some(responder),
                        latency,
                        pending: None,
                        last_error: None,
                        state,
                        closed: false,
                    }) as Box<dyn Session>)
                }
            }
        })
    }
}

pub struct MockSession {
    addr: NodeAddress,
    /// `None` refuses every dispatch.
    responder: Option<Responder>,
    latency: Duration,
    pending: Option<BoxFuture<'static, Result<RawResult, WireError>>>,
    last_error: Option<String>,
    state: Arc<MockState>,
    closed: bool,
}

impl Session for MockSession {
    fn start_command(&mut self, text: &str) -> Result<(), WireError> {
        assert!(self.pending.is_none(), "mock session already has a pending command");
        self.state
            .commands
            .lock()
            .unwrap()
            .push((self.addr.clone(), text.to_string()));

        let Some(responder) = self.responder.as_ref() else {
            return Err(WireError::send_failed(&self.addr, "dispatch refused"));
        };

        let response = responder(text);
        let latency = self.latency;
        self.pending = Some(Box::pin(async move {
            if !latency.is_zero() {
                tokio::time::sleep(latency).await;
            }
            response
        }));
        Ok(())
    }

    fn poll_result(&mut self, cx: &mut Context<'_>) -> Poll<Result<RawResult, WireError>> {
        let Some(pending) = self.pending.as_mut() else {
            return Poll::Ready(Err(WireError::ResultUnavailable));
        };
        match pending.as_mut().poll(cx) {
            Poll::Pending => Poll::Pending,
            Poll::Ready(response) => {
                self.pending = None;
                if let Err(err) = &response {
                    self.last_error = err.message().map(str::to_string);
                }
                Poll::Ready(response)
            }
        }
    }

    fn last_error(&self) -> Option<String> {
        self.last_error.clone()
    }

    fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            self.state.closed.lock().unwrap().push(self.addr.clone());
        }
    }
}

/// Remaining deque-based script: answer the queued results in order, then
/// refuse. Useful when a node must change behavior between commands.
pub fn respond_queue(results: Vec<Result<RawResult, WireError>>) -> NodeScript {
    let queue = Mutex::new(VecDeque::from(results));
    NodeScript::Respond {
        responder: Arc::new(move |_| {
            queue
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(WireError::connection_lost("script exhausted")))
        }),
        latency: Duration::ZERO,
    }
}
