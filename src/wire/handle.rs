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

//! Connection state machine.
//!
//! `Connecting → Ready → AwaitingResult → Ready`, with I/O errors
//! surfacing from `finish_connect`, `send_command`, or as
//! [`PollStatus::ConnectionLost`]. Delivering a result returns the handle
//! to `Ready` so a control connection can run several commands in turn;
//! the executors open exactly one handle per command and close it after
//! the first result. `close` consumes the handle, so a closed handle
//! cannot be used again; calling an operation in the wrong state is a
//! programming error and panics.

use futures::future::BoxFuture;
use std::future::poll_fn;
use std::task::Poll;

use crate::node::NodeAddress;
use crate::wire::error::WireError;
use crate::wire::transport::{Connector, RawResult, Session};

/// Outcome of one non-blocking poll of an in-flight command.
#[derive(Debug)]
pub enum PollStatus {
    /// The server has not produced a complete result yet.
    StillBusy,
    /// The raw result is available; the command is terminal.
    Ready(RawResult),
    /// The socket reported an unrecoverable error; the command is terminal.
    ConnectionLost(WireError),
}

enum HandleState {
    Connecting(BoxFuture<'static, Result<Box<dyn Session>, WireError>>),
    Ready(Box<dyn Session>),
    AwaitingResult(Box<dyn Session>),
    Failed,
}

pub struct ConnectionHandle {
    addr: NodeAddress,
    state: HandleState,
}

impl ConnectionHandle {
    /// Initiate a connection without waiting for the handshake.
    pub fn start_connect(connector: &dyn Connector, addr: NodeAddress) -> Self {
        let fut = connector.start_connect(&addr);
        Self {
            addr,
            state: HandleState::Connecting(fut),
        }
    }

    /// Open a connection and wait for the handshake to resolve. Used by
    /// the sequential path.
    pub async fn connect(connector: &dyn Connector, addr: NodeAddress) -> Result<Self, WireError> {
        let mut handle = Self::start_connect(connector, addr);
        handle.finish_connect().await?;
        Ok(handle)
    }

    pub fn addr(&self) -> &NodeAddress {
        &self.addr
    }

    /// Wait for the handshake started by [`Self::start_connect`] to
    /// complete or fail. Called exactly once per handle.
    pub async fn finish_connect(&mut self) -> Result<(), WireError> {
        match std::mem::replace(&mut self.state, HandleState::Failed) {
            HandleState::Connecting(fut) => match fut.await {
                Ok(session) => {
                    self.state = HandleState::Ready(session);
                    Ok(())
                }
                Err(err) => Err(err),
            },
            _ => panic!("finish_connect called on a connection that is not connecting"),
        }
    }

    /// Dispatch the command on an established connection. Does not wait
    /// for the result.
    pub fn send_command(&mut self, text: &str) -> Result<(), WireError> {
        match std::mem::replace(&mut self.state, HandleState::Failed) {
            HandleState::Ready(mut session) => match session.start_command(text) {
                Ok(()) => {
                    self.state = HandleState::AwaitingResult(session);
                    Ok(())
                }
                Err(err) => {
                    self.state = HandleState::Ready(session);
                    Err(err)
                }
            },
            _ => panic!("send_command called on a connection that is not ready"),
        }
    }

    /// Perform exactly one non-blocking poll of the in-flight command.
    /// Never waits; callers re-invoke across sweeps.
    pub async fn poll_ready(&mut self) -> PollStatus {
        let polled = match &mut self.state {
            HandleState::AwaitingResult(session) => {
                poll_fn(|cx| Poll::Ready(session.poll_result(cx))).await
            }
            _ => panic!("poll_ready called on a connection with no command in flight"),
        };

        match polled {
            Poll::Pending => PollStatus::StillBusy,
            Poll::Ready(Ok(raw)) => {
                self.finish();
                PollStatus::Ready(raw)
            }
            Poll::Ready(Err(err)) => {
                self.finish();
                PollStatus::ConnectionLost(err)
            }
        }
    }

    /// Wait for the in-flight command to reach a terminal state. Used by
    /// the sequential path.
    pub async fn wait_result(&mut self) -> Result<RawResult, WireError> {
        let result = match &mut self.state {
            HandleState::AwaitingResult(session) => poll_fn(|cx| session.poll_result(cx)).await,
            _ => panic!("wait_result called on a connection with no command in flight"),
        };
        self.finish();
        result
    }

    /// The driver's last error message on this connection, if any.
    pub fn last_error(&self) -> Option<String> {
        match &self.state {
            HandleState::Ready(session) | HandleState::AwaitingResult(session) => {
                session.last_error()
            }
            HandleState::Connecting(_) | HandleState::Failed => None,
        }
    }

    /// Release the connection. Consumes the handle, so every handle is
    /// closed at most once and never used afterwards.
    pub fn close(mut self) {
        match std::mem::replace(&mut self.state, HandleState::Failed) {
            HandleState::Ready(mut session) | HandleState::AwaitingResult(mut session) => {
                session.close()
            }
            HandleState::Connecting(_) | HandleState::Failed => {}
        }
    }

    fn finish(&mut self) {
        if let HandleState::AwaitingResult(session) =
            std::mem::replace(&mut self.state, HandleState::Failed)
        {
            self.state = HandleState::Ready(session);
        }
    }
}
