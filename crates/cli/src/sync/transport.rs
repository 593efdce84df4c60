// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! WebSocket implementation of the remote backend.
//!
//! Speaks the `sfs-core` JSON protocol over a single lazily-opened
//! connection. Requests are strictly sequential: each one sends a message and
//! waits for the matching reply. A connection that fails mid-request, or
//! whose request is cancelled by a timeout, is dropped and reopened on the
//! next call.

use std::sync::atomic::{AtomicU64, Ordering};

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use sfs_core::protocol::{ClientMessage, ServerMessage};
use sfs_core::QueuedOperation;
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use super::backend::{BackendFuture, FetchError, Probe, ProbeFailure, RemoteBackend, SubmitError};

/// Error type for transport operations.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Connection failed.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Connection closed unexpectedly.
    #[error("connection closed")]
    ConnectionClosed,

    /// Send failed.
    #[error("send failed: {0}")]
    SendFailed(String),

    /// Receive failed.
    #[error("receive failed: {0}")]
    ReceiveFailed(String),

    /// Serialization/deserialization failed.
    #[error("serialization error: {0}")]
    SerializationError(String),
}

/// Result type for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Internal WebSocket connection wrapper.
struct WebSocketConnection {
    sink: SplitSink<WsStream, Message>,
    stream: SplitStream<WsStream>,
}

impl WebSocketConnection {
    async fn open(url: &str) -> TransportResult<Self> {
        let (ws, _) = tokio_tungstenite::connect_async(url)
            .await
            .map_err(|e| TransportError::ConnectionFailed(e.to_string()))?;
        let (sink, stream) = ws.split();
        tracing::debug!(url, "connected to remote");
        Ok(WebSocketConnection { sink, stream })
    }

    async fn send(&mut self, msg: &ClientMessage) -> TransportResult<()> {
        let json = msg.to_json().map_err(|e| TransportError::SerializationError(e.to_string()))?;
        self.sink
            .send(Message::Text(json.into()))
            .await
            .map_err(|e| TransportError::SendFailed(e.to_string()))?;
        // Flush so a dead peer is noticed here rather than on the next read.
        self.sink.flush().await.map_err(|e| TransportError::SendFailed(e.to_string()))
    }

    async fn recv(&mut self) -> TransportResult<ServerMessage> {
        loop {
            match self.stream.next().await {
                Some(Ok(Message::Text(text))) => {
                    return ServerMessage::from_json(&text)
                        .map_err(|e| TransportError::SerializationError(e.to_string()));
                }
                Some(Ok(Message::Close(_))) | None => return Err(TransportError::ConnectionClosed),
                Some(Ok(_)) => continue,
                Some(Err(e)) => return Err(TransportError::ReceiveFailed(e.to_string())),
            }
        }
    }

    /// Sends `msg` and returns the first reply accepted by `matches`.
    async fn exchange(
        &mut self,
        msg: &ClientMessage,
        matches: impl Fn(&ServerMessage) -> bool,
    ) -> TransportResult<ServerMessage> {
        self.send(msg).await?;
        loop {
            let reply = self.recv().await?;
            if matches(&reply) {
                return Ok(reply);
            }
            tracing::trace!(?reply, "skipping unrelated server message");
        }
    }
}

/// [`RemoteBackend`] over a WebSocket connection to an `sfs-remote` server.
pub struct WebSocketBackend {
    url: String,
    conn: Mutex<Option<WebSocketConnection>>,
    next_ping: AtomicU64,
}

impl WebSocketBackend {
    pub fn new(url: impl Into<String>) -> Self {
        WebSocketBackend { url: url.into(), conn: Mutex::new(None), next_ping: AtomicU64::new(1) }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Whether a connection is currently open.
    pub async fn is_connected(&self) -> bool {
        self.conn.lock().await.is_some()
    }

    async fn request(
        &self,
        msg: ClientMessage,
        matches: impl Fn(&ServerMessage) -> bool,
    ) -> TransportResult<ServerMessage> {
        let mut slot = self.conn.lock().await;
        // Taken out of the slot for the duration of the request, so a request
        // that fails or is cancelled never leaves a half-read connection behind.
        let mut conn = match slot.take() {
            Some(conn) => conn,
            None => WebSocketConnection::open(&self.url).await?,
        };
        match conn.exchange(&msg, matches).await {
            Ok(reply) => {
                *slot = Some(conn);
                Ok(reply)
            }
            Err(e) => {
                tracing::debug!(error = %e, "dropping remote connection");
                Err(e)
            }
        }
    }
}

impl Probe for WebSocketBackend {
    fn probe(&self) -> BackendFuture<'_, Result<(), ProbeFailure>> {
        Box::pin(async move {
            let id = self.next_ping.fetch_add(1, Ordering::Relaxed);
            self.request(ClientMessage::ping(id), |m| matches!(m, ServerMessage::Pong { id: p } if *p == id))
                .await
                .map(|_| ())
                .map_err(|e| ProbeFailure(e.to_string()))
        })
    }
}

impl RemoteBackend for WebSocketBackend {
    fn submit<'a>(&'a self, op: &'a QueuedOperation) -> BackendFuture<'a, Result<(), SubmitError>> {
        Box::pin(async move {
            let id = op.id;
            let reply = self
                .request(ClientMessage::submit(op.clone()), |m| match m {
                    ServerMessage::Ack { id: acked } => *acked == id,
                    ServerMessage::Rejected { id: rejected, .. } => *rejected == id,
                    ServerMessage::Error { .. } => true,
                    _ => false,
                })
                .await
                .map_err(|e| SubmitError::Retryable(e.to_string()))?;

            match reply {
                ServerMessage::Ack { .. } => Ok(()),
                ServerMessage::Rejected { reason, retryable: true, .. } => {
                    Err(SubmitError::Retryable(reason))
                }
                ServerMessage::Rejected { reason, .. } => Err(SubmitError::Fatal(reason)),
                ServerMessage::Error { message } => Err(SubmitError::Retryable(message)),
                other => Err(SubmitError::Retryable(format!("unexpected reply: {other:?}"))),
            }
        })
    }

    fn fetch<'a>(&'a self, key: &'a str) -> BackendFuture<'a, Result<serde_json::Value, FetchError>> {
        Box::pin(async move {
            let reply = self
                .request(ClientMessage::fetch(key), |m| match m {
                    ServerMessage::Value { key: k, .. } | ServerMessage::NotFound { key: k } => k == key,
                    ServerMessage::Error { .. } => true,
                    _ => false,
                })
                .await
                .map_err(|e| FetchError::Unavailable(e.to_string()))?;

            match reply {
                ServerMessage::Value { value, .. } => Ok(value),
                ServerMessage::NotFound { key } => Err(FetchError::NotFound(key)),
                ServerMessage::Error { message } => Err(FetchError::Rejected(message)),
                other => Err(FetchError::Rejected(format!("unexpected reply: {other:?}"))),
            }
        })
    }
}
