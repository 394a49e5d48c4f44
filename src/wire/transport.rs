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

//! The transport seam between the execution engine and the wire library.
//!
//! The engine never touches the database driver directly; it drives a
//! [`Session`] obtained from a [`Connector`]. The production implementation
//! lives in [`crate::wire::postgres`]; the test suite supplies mocks.

use futures::future::BoxFuture;
use std::task::{Context, Poll};

use crate::node::NodeAddress;
use crate::wire::error::WireError;

/// Raw outcome of one command, before result evaluation.
#[derive(Debug, Clone)]
pub enum RawResult {
    /// A non-query command completed. The wire layer reports the
    /// affected-row count as the completion status.
    Command { rows_affected: u64 },

    /// A query returned a rowset. `rows` holds the textual form of each
    /// value; `None` is a SQL NULL.
    Rows {
        columns: usize,
        rows: Vec<Vec<Option<String>>>,
    },

    /// The server rejected or failed the command but the connection is
    /// still usable.
    Error { message: Option<String> },
}

/// One in-progress session to a node.
///
/// `start_command` initiates without waiting; `poll_result` performs one
/// non-blocking consume of pending input. Callers re-poll across sweeps.
pub trait Session: Send {
    /// Dispatch a command on this session. Must not be called while a
    /// previous command is still pending.
    fn start_command(&mut self, text: &str) -> Result<(), WireError>;

    /// Poll the pending command. `Poll::Pending` means the server has not
    /// produced a complete result yet; an `Err` means the connection is no
    /// longer usable.
    fn poll_result(&mut self, cx: &mut Context<'_>) -> Poll<Result<RawResult, WireError>>;

    /// The last error message the driver reported on this session, if any.
    fn last_error(&self) -> Option<String>;

    /// Release transport resources. Called exactly once, via
    /// [`crate::wire::ConnectionHandle::close`].
    fn close(&mut self);
}

/// Opens sessions to nodes.
///
/// `start_connect` returns immediately; the returned future resolves when
/// the handshake completes or fails. Every call opens a brand-new
/// connection — there is no pooling or reuse across commands.
pub trait Connector: Send + Sync {
    fn start_connect(
        &self,
        addr: &NodeAddress,
    ) -> BoxFuture<'static, Result<Box<dyn Session>, WireError>>;
}
