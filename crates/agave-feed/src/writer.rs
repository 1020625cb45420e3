//! Publish writer with a background reconnect supervisor.
//!
//! [`PublishWriter::connect`] opens one broker session up front and then
//! hands the broker to a supervisor task. Callers push payloads through a
//! single-slot channel; the supervisor forwards them over the live session,
//! and when the session drops it reconnects every [`RECONNECT_DELAY`] until
//! the broker comes back. While the connection is degraded every `write`
//! still queues its payload but reports the most recent connection error.
//!
//! A failed publish waits out [`RECONNECT_DELAY`] before reconnecting and is
//! re-sent once on the new session. A payload that fails
//! [`MAX_PUBLISH_ATTEMPTS`] times is dropped so it cannot hold the slot.
//!
//! # Example
//!
//! ```rust,ignore
//! use agave_feed::{Endpoint, PublishWriter};
//! use secrecy::SecretString;
//!
//! let endpoint = Endpoint::new("127.0.0.1", 10000, "sensor-1", SecretString::from(secret));
//! let writer = PublishWriter::connect(my_broker, endpoint, "agave.events").await?;
//!
//! match writer.write(br#"{"SrcIp":"10.0.0.5"}"#.as_slice()).await {
//!     Ok(n) => tracing::debug!(bytes = n, "published"),
//!     Err(e) => tracing::warn!(error = %e, queued = e.queued(), "feed degraded"),
//! }
//! ```

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;

use crate::broker::{Broker, Endpoint};
use crate::error::{ConnectionError, ConstructionError, WriteError};
use crate::last_error::LastError;

/// Fixed pause between failed reconnect attempts.
pub const RECONNECT_DELAY: Duration = Duration::from_secs(5);

/// Publish attempts per payload (the first send plus one re-send).
pub const MAX_PUBLISH_ATTEMPTS: u32 = 2;

// One payload in flight: a second writer waits until the supervisor has
// taken the first one off the channel.
const PUBLISH_CHANNEL_CAPACITY: usize = 1;

// ── ConnectionState ──────────────────────────────────────────────────

/// Supervisor state, observable through [`PublishWriter::subscribe_state`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum ConnectionState {
    #[strum(serialize = "connected")]
    Connected,
    /// Session lost; `attempt` counts reconnects since the drop (1-based).
    #[strum(serialize = "reconnecting")]
    Reconnecting { attempt: u32 },
    /// Shut down or every writer handle dropped.
    #[strum(serialize = "closed")]
    Closed,
}

// ── PublishWriter ────────────────────────────────────────────────────

/// Byte sink over a self-healing broker session.
///
/// Cheaply cloneable; all clones feed the same channel and share the same
/// supervisor. The supervisor exits after [`shutdown`](Self::shutdown) or
/// once every clone has been dropped.
#[derive(Debug, Clone)]
pub struct PublishWriter {
    channel: Arc<str>,
    publish_tx: mpsc::Sender<Bytes>,
    last_error: Arc<LastError>,
    state: watch::Receiver<ConnectionState>,
    cancel: CancellationToken,
}

impl PublishWriter {
    /// Connect to the broker and start the supervisor.
    ///
    /// The first connect is awaited here; if it fails nothing is spawned
    /// and the broker is dropped.
    pub async fn connect<B: Broker>(
        broker: B,
        endpoint: Endpoint,
        channel: impl Into<String>,
    ) -> Result<Self, ConstructionError> {
        Self::connect_with_cancel(broker, endpoint, channel, CancellationToken::new()).await
    }

    /// Like [`connect`](Self::connect), but the supervisor also stops when
    /// `cancel` fires.
    pub async fn connect_with_cancel<B: Broker>(
        broker: B,
        endpoint: Endpoint,
        channel: impl Into<String>,
        cancel: CancellationToken,
    ) -> Result<Self, ConstructionError> {
        let channel: Arc<str> = Arc::from(channel.into());

        tracing::info!(endpoint = %endpoint, channel = %channel, "Connecting to broker");
        if let Err(source) = broker.connect(&endpoint).await {
            tracing::warn!(endpoint = %endpoint, error = %source, "Initial broker connect failed");
            return Err(ConstructionError {
                endpoint: endpoint.to_string(),
                source,
            });
        }
        tracing::info!(endpoint = %endpoint, "Broker connected");

        let (publish_tx, publish_rx) = mpsc::channel(PUBLISH_CHANNEL_CAPACITY);
        let (state_tx, state) = watch::channel(ConnectionState::Connected);
        let last_error = Arc::new(LastError::new());

        let supervisor = Supervisor {
            broker,
            endpoint,
            channel: Arc::clone(&channel),
            publish_rx,
            last_error: Arc::clone(&last_error),
            state: state_tx,
            cancel: cancel.clone(),
        };
        tokio::spawn(supervisor.run());

        Ok(Self {
            channel,
            publish_tx,
            last_error,
            state,
            cancel,
        })
    }

    /// Queue `payload` for publishing.
    ///
    /// Suspends while the channel slot is occupied (e.g. during a
    /// reconnect). Once queued, returns `Ok(len)` if the connection is
    /// healthy or [`WriteError::Degraded`] carrying the last connection
    /// error. The payload is delivered either way once the session is back.
    pub async fn write(&self, payload: impl Into<Bytes>) -> Result<usize, WriteError> {
        let payload = payload.into();
        let len = payload.len();

        self.publish_tx
            .send(payload)
            .await
            .map_err(|_| WriteError::Closed)?;

        match self.last_error.get() {
            None => Ok(len),
            Some(cause) => Err(WriteError::Degraded { queued: len, cause }),
        }
    }

    /// The channel every payload is published to.
    pub fn channel(&self) -> &str {
        &self.channel
    }

    /// Most recent connection failure, or `None` while healthy.
    pub fn last_error(&self) -> Option<ConnectionError> {
        self.last_error.get()
    }

    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    /// Watch supervisor state transitions.
    pub fn subscribe_state(&self) -> watch::Receiver<ConnectionState> {
        self.state.clone()
    }

    /// Stop the supervisor. Pending and future writes fail with
    /// [`WriteError::Closed`] once it has exited.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}

// ── Supervisor ───────────────────────────────────────────────────────

enum Wake {
    Payload(Pending),
    Disconnected,
}

/// A payload together with the publish attempts already spent on it.
struct Pending {
    payload: Bytes,
    attempts: u32,
}

struct Supervisor<B> {
    broker: B,
    endpoint: Endpoint,
    channel: Arc<str>,
    publish_rx: mpsc::Receiver<Bytes>,
    last_error: Arc<LastError>,
    state: watch::Sender<ConnectionState>,
    cancel: CancellationToken,
}

impl<B: Broker> Supervisor<B> {
    /// Forward payloads while connected; reconnect whenever the session
    /// drops. Publishing and reconnecting share this task, so no payload is
    /// ever sent against a half-replaced session.
    async fn run(self) {
        let Self {
            broker,
            endpoint,
            channel,
            mut publish_rx,
            last_error,
            state,
            cancel,
        } = self;

        // A payload whose publish failed; re-sent first after reconnect.
        let mut pending: Option<Pending> = None;

        loop {
            let wake = tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                () = broker.disconnected() => Wake::Disconnected,
                next = next_payload(&mut pending, &mut publish_rx) => match next {
                    Some(payload) => Wake::Payload(payload),
                    // Every writer handle is gone.
                    None => break,
                },
            };

            let backoff = match wake {
                Wake::Payload(Pending { payload, attempts }) => {
                    match broker.publish(&channel, payload.clone()).await {
                        Ok(()) => {
                            tracing::trace!(bytes = payload.len(), channel = %channel, "Published");
                            last_error.clear();
                            continue;
                        }
                        Err(e) => {
                            let attempts = attempts.saturating_add(1);
                            if attempts >= MAX_PUBLISH_ATTEMPTS {
                                tracing::warn!(
                                    error = %e,
                                    channel = %channel,
                                    bytes = payload.len(),
                                    attempts,
                                    "Publish failed, dropping payload"
                                );
                            } else {
                                tracing::warn!(error = %e, channel = %channel, "Publish failed, reconnecting");
                                pending = Some(Pending { payload, attempts });
                            }
                            last_error.set(e);
                            true
                        }
                    }
                }
                Wake::Disconnected => {
                    tracing::info!(endpoint = %endpoint, "Broker disconnected");
                    last_error.set(ConnectionError::Disconnected);
                    false
                }
            };

            if !reconnect(&broker, &endpoint, &last_error, &state, &cancel, backoff).await {
                break;
            }
        }

        let _ = state.send(ConnectionState::Closed);
        publish_rx.close();
        tracing::debug!(endpoint = %endpoint, "Publish supervisor exiting");
    }
}

/// Take the held-back payload if there is one, otherwise wait on the
/// channel. Cancel-safe: `pending` is only emptied when the future is
/// polled to completion in the same poll.
async fn next_payload(
    pending: &mut Option<Pending>,
    publish_rx: &mut mpsc::Receiver<Bytes>,
) -> Option<Pending> {
    match pending.take() {
        Some(pending) => Some(pending),
        None => publish_rx
            .recv()
            .await
            .map(|payload| Pending { payload, attempts: 0 }),
    }
}

/// Retry until the broker accepts a new session. Returns `false` if
/// cancelled first.
///
/// With `backoff` set the first attempt also waits [`RECONNECT_DELAY`].
async fn reconnect<B: Broker>(
    broker: &B,
    endpoint: &Endpoint,
    last_error: &LastError,
    state: &watch::Sender<ConnectionState>,
    cancel: &CancellationToken,
    backoff: bool,
) -> bool {
    let mut attempt: u32 = 1;

    if backoff {
        let _ = state.send(ConnectionState::Reconnecting { attempt });
        if !wait_out_delay(cancel).await {
            return false;
        }
    }

    loop {
        let _ = state.send(ConnectionState::Reconnecting { attempt });
        tracing::info!(endpoint = %endpoint, attempt, "Attempting to reconnect");

        let result = tokio::select! {
            biased;
            () = cancel.cancelled() => return false,
            result = broker.connect(endpoint) => result,
        };

        match result {
            Ok(()) => {
                last_error.clear();
                let _ = state.send(ConnectionState::Connected);
                tracing::info!(endpoint = %endpoint, attempt, "Broker reconnected");
                return true;
            }
            Err(e) => {
                tracing::warn!(
                    endpoint = %endpoint,
                    error = %e,
                    attempt,
                    delay_secs = RECONNECT_DELAY.as_secs(),
                    "Error reconnecting"
                );
                last_error.set(e);

                if !wait_out_delay(cancel).await {
                    return false;
                }
                attempt = attempt.saturating_add(1);
            }
        }
    }
}

/// Sleep for [`RECONNECT_DELAY`]. Returns `false` if cancelled first.
async fn wait_out_delay(cancel: &CancellationToken) -> bool {
    tokio::select! {
        biased;
        () = cancel.cancelled() => false,
        () = tokio::time::sleep(RECONNECT_DELAY) => true,
    }
}
