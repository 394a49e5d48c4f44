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

//! Transport-level error types.

use std::fmt;

use crate::node::NodeAddress;

/// Error type for wire transport failures.
///
/// Every variant carries the driver's message so the error extractor can
/// surface a one-line diagnostic without re-deriving it from the socket.
#[derive(Debug, Clone)]
pub enum WireError {
    /// The connection handshake did not complete.
    ConnectFailed {
        addr: NodeAddress,
        message: String,
    },

    /// The command could not be dispatched on an established connection.
    SendFailed {
        addr: NodeAddress,
        message: String,
    },

    /// The socket died while a command was in flight.
    ConnectionLost { message: String },

    /// Pending input could not be consumed into a result.
    ResultUnavailable,
}

impl WireError {
    pub fn connect_failed(addr: &NodeAddress, message: impl fmt::Display) -> Self {
        WireError::ConnectFailed {
            addr: addr.clone(),
            message: message.to_string(),
        }
    }

    pub fn send_failed(addr: &NodeAddress, message: impl fmt::Display) -> Self {
        WireError::SendFailed {
            addr: addr.clone(),
            message: message.to_string(),
        }
    }

    pub fn connection_lost(message: impl fmt::Display) -> Self {
        WireError::ConnectionLost {
            message: message.to_string(),
        }
    }

    /// The driver-reported message, if any, for error extraction.
    pub fn message(&self) -> Option<&str> {
        match self {
            WireError::ConnectFailed { message, .. }
            | WireError::SendFailed { message, .. }
            | WireError::ConnectionLost { message } => {
                (!message.is_empty()).then_some(message.as_str())
            }
            WireError::ResultUnavailable => None,
        }
    }
}

impl fmt::Display for WireError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WireError::ConnectFailed { addr, message } => {
                write!(f, "failed to connect to {addr}: {message}")
            }
            WireError::SendFailed { addr, message } => {
                write!(f, "failed to send query to {addr}: {message}")
            }
            WireError::ConnectionLost { message } => {
                write!(f, "connection lost: {message}")
            }
            WireError::ResultUnavailable => write!(f, "query result unavailable"),
        }
    }
}

impl std::error::Error for WireError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_address() {
        let err = WireError::connect_failed(&NodeAddress::new("db1", 5432), "refused");
        assert_eq!(err.to_string(), "failed to connect to db1:5432: refused");
    }

    #[test]
    fn test_empty_message_is_absent() {
        let err = WireError::connection_lost("");
        assert_eq!(err.message(), None);
    }
}
