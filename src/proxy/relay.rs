//! Upstream-to-client byte relay.
//!
//! # Data Flow
//! ```text
//! upstream body ──▶ pump task ──▶ bounded mpsc ──▶ RelayBody ──▶ hyper ──▶ client
//!                      ▲                             │
//!                      └──── CancellationToken ◀─────┘ (DropGuard)
//! ```
//!
//! The pump owns the upstream stream for its whole life. The response body
//! owns a drop guard on the client connection's token: when hyper drops the
//! body (peer gone, write failed, server shutdown), the token fires and the
//! pump abandons its pending read, dropping the upstream socket.
//!
//! # Design Decisions
//! - At most `channel_capacity` chunks wait in the channel, plus the one the
//!   pump holds, so memory does not grow with resource size
//! - Cancellation is checked at every chunk boundary and races every read
//! - Mid-stream upstream errors are sent as body errors, which makes hyper
//!   abort the connection; the client sees a truncated transfer

use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use bytes::Bytes;
use futures_util::{Stream, StreamExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::{CancellationToken, DropGuard, WaitForCancellationFuture};
use tracing::Instrument;

use crate::observability::metrics;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Failure after the response status was already sent.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("upstream read failed: {0}")]
    Upstream(#[source] BoxError),
    #[error("upstream idle for {0:?}")]
    IdleTimeout(Duration),
}

/// How a relay ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayOutcome {
    /// Upstream reached end-of-stream and every chunk was handed over.
    Completed,
    /// The client went away (or the server is shutting down).
    ClientClosed,
    /// The upstream failed mid-transfer.
    UpstreamFailed,
}

impl RelayOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            RelayOutcome::Completed => "completed",
            RelayOutcome::ClientClosed => "client_closed",
            RelayOutcome::UpstreamFailed => "upstream_failed",
        }
    }
}

/// Totals reported when the pump exits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelayStats {
    pub outcome: RelayOutcome,
    pub chunks: u64,
    pub bytes: u64,
}

/// The downstream side of one proxied transfer.
///
/// Wraps a cancellation token that fires when the client disconnects. The
/// link only goes one way: an upstream ending never closes the client.
#[derive(Debug, Clone)]
pub struct ClientConnection {
    token: CancellationToken,
}

impl ClientConnection {
    /// A connection whose token is also cancelled when `parent` is.
    pub fn new(parent: &CancellationToken) -> Self {
        Self {
            token: parent.child_token(),
        }
    }

    /// A connection with no parent, closed only by itself.
    pub fn detached() -> Self {
        Self {
            token: CancellationToken::new(),
        }
    }

    /// Resolves once the client has gone away.
    pub fn closed(&self) -> WaitForCancellationFuture<'_> {
        self.token.cancelled()
    }

    pub fn is_closed(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Mark the client as gone.
    pub fn close(&self) {
        self.token.cancel();
    }
}

/// Relay tuning.
#[derive(Debug, Clone, Copy)]
pub struct RelaySettings {
    pub channel_capacity: usize,
    pub idle_timeout: Option<Duration>,
}

impl Default for RelaySettings {
    fn default() -> Self {
        Self {
            channel_capacity: 4,
            idle_timeout: None,
        }
    }
}

/// Response body fed by a pump task.
///
/// Dropping it closes the client connection it was created with.
pub struct RelayBody {
    rx: mpsc::Receiver<Result<Bytes, RelayError>>,
    _closed_on_drop: DropGuard,
}

impl Stream for RelayBody {
    type Item = Result<Bytes, RelayError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}

/// Start relaying `upstream` to a new [`RelayBody`].
///
/// The returned handle resolves with the transfer totals once the pump has
/// released the upstream stream.
pub fn spawn_relay<S, E>(
    upstream: S,
    connection: ClientConnection,
    settings: RelaySettings,
    target: &str,
) -> (RelayBody, JoinHandle<RelayStats>)
where
    S: Stream<Item = Result<Bytes, E>> + Send + Unpin + 'static,
    E: Into<BoxError> + Send + 'static,
{
    let (tx, rx) = mpsc::channel(settings.channel_capacity.max(1));
    let body = RelayBody {
        rx,
        _closed_on_drop: connection.token.clone().drop_guard(),
    };

    let span = tracing::debug_span!("relay", target = %target);
    let handle = tokio::spawn(
        async move {
            let stats = pump(upstream, tx, connection, settings.idle_timeout).await;
            match stats.outcome {
                RelayOutcome::Completed => {
                    tracing::debug!(chunks = stats.chunks, bytes = stats.bytes, "Relay completed")
                }
                RelayOutcome::ClientClosed => tracing::debug!(
                    chunks = stats.chunks,
                    bytes = stats.bytes,
                    "Client disconnected, upstream released"
                ),
                RelayOutcome::UpstreamFailed => tracing::warn!(
                    chunks = stats.chunks,
                    bytes = stats.bytes,
                    "Upstream failed mid-stream, client response truncated"
                ),
            }
            metrics::record_relay(stats.outcome.as_str(), stats.bytes);
            stats
        }
        .instrument(span),
    );

    (body, handle)
}

async fn pump<S, E>(
    mut upstream: S,
    tx: mpsc::Sender<Result<Bytes, RelayError>>,
    connection: ClientConnection,
    idle_timeout: Option<Duration>,
) -> RelayStats
where
    S: Stream<Item = Result<Bytes, E>> + Unpin,
    E: Into<BoxError>,
{
    let mut stats = RelayStats {
        outcome: RelayOutcome::Completed,
        chunks: 0,
        bytes: 0,
    };

    loop {
        let next = tokio::select! {
            biased;
            _ = connection.closed() => {
                stats.outcome = RelayOutcome::ClientClosed;
                return stats;
            }
            next = next_chunk(&mut upstream, idle_timeout) => next,
        };

        let chunk = match next {
            Ok(Some(chunk)) if chunk.is_empty() => continue,
            Ok(Some(chunk)) => chunk,
            Ok(None) => return stats,
            Err(e) => {
                tracing::debug!(error = %e, "Upstream read error");
                // Best effort: a closed client no longer cares.
                tokio::select! {
                    biased;
                    _ = connection.closed() => {}
                    _ = tx.send(Err(e)) => {}
                }
                stats.outcome = RelayOutcome::UpstreamFailed;
                return stats;
            }
        };

        let len = chunk.len() as u64;
        tokio::select! {
            biased;
            _ = connection.closed() => {
                stats.outcome = RelayOutcome::ClientClosed;
                return stats;
            }
            sent = tx.send(Ok(chunk)) => {
                if sent.is_err() {
                    stats.outcome = RelayOutcome::ClientClosed;
                    return stats;
                }
            }
        }
        stats.chunks += 1;
        stats.bytes += len;
    }
}

async fn next_chunk<S, E>(
    upstream: &mut S,
    idle_timeout: Option<Duration>,
) -> Result<Option<Bytes>, RelayError>
where
    S: Stream<Item = Result<Bytes, E>> + Unpin,
    E: Into<BoxError>,
{
    let next = match idle_timeout {
        Some(limit) => tokio::time::timeout(limit, upstream.next())
            .await
            .map_err(|_| RelayError::IdleTimeout(limit))?,
        None => upstream.next().await,
    };

    next.transpose().map_err(|e| RelayError::Upstream(e.into()))
}
