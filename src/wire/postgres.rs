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

//! Production transport over `tokio-postgres`.
//!
//! Commands go through the simple-query protocol so results arrive as
//! text without per-type decoding. The connection driver each session
//! spawns is a transport-internal detail; the execution engine itself
//! never spawns per-connection tasks.

use futures::future::BoxFuture;
use std::future::Future;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;
use tokio_postgres::{Client, NoTls, SimpleQueryMessage};

use crate::node::NodeAddress;
use crate::wire::error::WireError;
use crate::wire::transport::{Connector, RawResult, Session};

/// Connector that opens one fresh `tokio-postgres` session per command.
#[derive(Debug, Clone)]
pub struct PgConnector {
    user: String,
    database: String,
    password: Option<String>,
    connect_timeout: Duration,
}

impl PgConnector {
    pub fn new(user: impl Into<String>, database: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            database: database.into(),
            password: None,
            connect_timeout: Duration::from_secs(10),
        }
    }

    pub fn with_password(mut self, password: Option<String>) -> Self {
        self.password = password;
        self
    }

    pub fn with_connect_timeout(mut self, connect_timeout: Duration) -> Self {
        self.connect_timeout = connect_timeout;
        self
    }
}

impl Connector for PgConnector {
    fn start_connect(
        &self,
        addr: &NodeAddress,
    ) -> BoxFuture<'static, Result<Box<dyn Session>, WireError>> {
        let mut config = tokio_postgres::Config::new();
        config
            .host(&addr.host)
            .port(addr.port)
            .user(&self.user)
            .dbname(&self.database)
            .connect_timeout(self.connect_timeout);
        if let Some(ref password) = self.password {
            config.password(password);
        }

        let addr = addr.clone();
        Box::pin(async move {
            let (client, connection) = config
                .connect(NoTls)
                .await
                .map_err(|err| WireError::connect_failed(&addr, err))?;

            let driver = tokio::spawn(async move {
                if let Err(err) = connection.await {
                    tracing::debug!("connection driver for {addr} exited: {err}");
                }
            });

            Ok(Box::new(PgSession {
                client: Arc::new(client),
                driver,
                pending: None,
                last_error: None,
            }) as Box<dyn Session>)
        })
    }
}

type PendingResult =
    BoxFuture<'static, Result<Vec<SimpleQueryMessage>, tokio_postgres::Error>>;

struct PgSession {
    client: Arc<Client>,
    driver: tokio::task::JoinHandle<()>,
    pending: Option<PendingResult>,
    last_error: Option<String>,
}

impl Session for PgSession {
    fn start_command(&mut self, text: &str) -> Result<(), WireError> {
        assert!(
            self.pending.is_none(),
            "command started while a previous command is pending"
        );
        if self.client.is_closed() {
            let message = self
                .last_error
                .clone()
                .unwrap_or_else(|| "connection closed".to_string());
            return Err(WireError::ConnectionLost { message });
        }

        let client = Arc::clone(&self.client);
        let text = text.to_string();
        self.pending = Some(Box::pin(async move { client.simple_query(&text).await }));
        Ok(())
    }

    fn poll_result(&mut self, cx: &mut Context<'_>) -> Poll<Result<RawResult, WireError>> {
        let Some(pending) = self.pending.as_mut() else {
            return Poll::Ready(Err(WireError::ResultUnavailable));
        };

        match pending.as_mut().poll(cx) {
            Poll::Pending => Poll::Pending,
            Poll::Ready(outcome) => {
                self.pending = None;
                match outcome {
                    Ok(messages) => Poll::Ready(Ok(translate_messages(messages))),
                    Err(err) => {
                        // A server-side failure leaves the connection usable
                        // and becomes a raw error result; anything else is a
                        // dead socket.
                        if let Some(db_error) = err.as_db_error() {
                            let message = db_error.message().to_string();
                            self.last_error = Some(message.clone());
                            Poll::Ready(Ok(RawResult::Error {
                                message: Some(message),
                            }))
                        } else {
                            let message = err.to_string();
                            self.last_error = Some(message.clone());
                            Poll::Ready(Err(WireError::ConnectionLost { message }))
                        }
                    }
                }
            }
        }
    }

    fn last_error(&self) -> Option<String> {
        self.last_error.clone()
    }

    fn close(&mut self) {
        self.pending = None;
        self.driver.abort();
    }
}

impl Drop for PgSession {
    fn drop(&mut self) {
        // Fail-safe for handles torn down without an explicit close.
        self.driver.abort();
    }
}

fn translate_messages(messages: Vec<SimpleQueryMessage>) -> RawResult {
    let mut columns: Option<usize> = None;
    let mut rows: Vec<Vec<Option<String>>> = Vec::new();
    let mut rows_affected = 0u64;

    for message in messages {
        match message {
            SimpleQueryMessage::RowDescription(description) => {
                columns.get_or_insert(description.len());
            }
            SimpleQueryMessage::Row(row) => {
                columns.get_or_insert(row.len());
                let values = (0..row.len())
                    .map(|index| row.get(index).map(str::to_string))
                    .collect();
                rows.push(values);
            }
            SimpleQueryMessage::CommandComplete(count) => rows_affected = count,
            _ => {}
        }
    }

    match columns {
        Some(columns) => RawResult::Rows { columns, rows },
        None => RawResult::Command { rows_affected },
    }
}
