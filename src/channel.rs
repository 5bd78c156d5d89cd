// src/channel.rs

//! Reconnecting sample channel.
//!
//! This module contains the core [`SampleChannel`] type: it owns the single
//! outbound connection, queues payloads for delivery, drives the connection
//! through failure/reconnect cycles under its retry policy, and raises
//! lifecycle notifications to registered listeners.
//!
//! # Architecture
//!
//! `send()` appends the payload to the outbound queue and then joins the
//! drain: whichever caller holds the drain lock pulls payloads from the
//! queue head and transmits them in FIFO order. A `send` arriving while a
//! drain pass is in progress appends to the same queue and waits on the
//! lock; by the time it acquires the lock its payloads have either already
//! been attempted by the in-progress pass or it drains them itself. Two
//! drain passes never run interleaved against the same queue.
//!
//! # Failure handling
//!
//! A transmit failure enters a bounded recovery loop: the drain task
//! suspends for the policy's delay, then constructs a **fresh** connection
//! bound to the same URL and previously negotiated sub-protocol (the failed
//! connection is discarded, never reset in place). The first attempt that
//! yields an open connection resumes draining with the next queued payload;
//! the payload whose transmission failed was already removed from the queue
//! and is not re-sent. Policy exhaustion emits `error` with the triggering
//! failure, then `closed`, abandons anything still queued, and leaves the
//! channel terminal: later `send` calls fail fast with
//! [`Error::ChannelClosed`].
//!
//! Transmit and reconnect failures never propagate as `Err` from `send`;
//! delivery failure is observable only through the `error`/`closed`
//! notifications.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use bytes::Bytes;

use crate::connection::{Connection, ConnectionState, ConnectorPtr};
use crate::notifier::LifecycleNotifier;
use crate::queue::OutboundQueue;
use crate::{EndpointAddress, Error, Result, RetryPolicy};

/// Acquire a mutex guard, intentionally ignoring poisoning.
///
/// The queue has no invariants spanning multiple fields; the worst outcome
/// of a poisoned lock is a payload that was mid-append when a task panicked.
fn lock_ignore_poison<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    // ---
    match m.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// Reconnecting message channel for telemetry samples.
///
/// Cheap to clone (internally `Arc`-backed). All state mutation is
/// serialized through the drain lock, so clones may be used from multiple
/// tasks.
#[derive(Clone)]
pub struct SampleChannel {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for SampleChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SampleChannel")
            .field("url", &self.inner.url)
            .finish_non_exhaustive()
    }
}

struct Inner {
    // ---
    endpoint: EndpointAddress,
    url: String,
    connector: ConnectorPtr,
    policy: Box<dyn RetryPolicy>,
    queue: Mutex<OutboundQueue>,
    notifier: LifecycleNotifier,
    drain: tokio::sync::Mutex<DrainState>,
    closed: AtomicBool,
}

/// State owned exclusively by the task holding the drain lock.
struct DrainState {
    // ---
    /// Current connection. `None` before the first connect and between a
    /// failure and the recovery that replaces it.
    connection: Option<Box<dyn Connection>>,

    /// Sub-protocol negotiated on the most recent successful connect,
    /// carried forward so reconnects request a consistent session type.
    sub_protocol: Option<String>,
}

impl DrainState {
    fn is_open(&self) -> bool {
        self.connection
            .as_ref()
            .is_some_and(|conn| conn.state() == ConnectionState::Open)
    }
}

impl SampleChannel {
    // ---
    pub(crate) fn new(
        endpoint: EndpointAddress,
        connector: ConnectorPtr,
        policy: Box<dyn RetryPolicy>,
    ) -> Self {
        // ---
        let url = endpoint.url();

        Self {
            inner: Arc::new(Inner {
                endpoint,
                url,
                connector,
                policy,
                queue: Mutex::new(OutboundQueue::new()),
                notifier: LifecycleNotifier::new(),
                drain: tokio::sync::Mutex::new(DrainState {
                    connection: None,
                    sub_protocol: None,
                }),
                closed: AtomicBool::new(false),
            }),
        }
    }

    /// Queue one pre-serialized payload and drive delivery.
    ///
    /// Completes once every payload that was queued at call time (including
    /// payloads queued by concurrent `send` calls carried by the same drain
    /// pass) has had a transmit attempt. The connection is established
    /// lazily on the first pass.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ChannelClosed`] if the channel already reached its
    /// terminal state. Transport failures do not surface here; subscribe to
    /// [`on_error`](Self::on_error) / [`on_closed`](Self::on_closed) to
    /// observe them.
    pub async fn send(&self, payload: impl Into<Bytes>) -> Result<()> {
        // ---
        if self.inner.closed.load(Ordering::Acquire) {
            return Err(Error::ChannelClosed);
        }

        lock_ignore_poison(&self.inner.queue).push_back(payload.into());
        self.drain().await;

        Ok(())
    }

    /// Register a listener for successful (re)connections. Chainable.
    pub fn on_connected(&self, listener: impl Fn() + Send + Sync + 'static) -> &Self {
        self.inner.notifier.on_connected(listener);
        self
    }

    /// Register a listener for terminal delivery errors. Chainable.
    pub fn on_error(&self, listener: impl Fn(&Error) + Send + Sync + 'static) -> &Self {
        self.inner.notifier.on_error(listener);
        self
    }

    /// Register a listener for the terminal `closed` transition. Chainable.
    pub fn on_closed(&self, listener: impl Fn() + Send + Sync + 'static) -> &Self {
        self.inner.notifier.on_closed(listener);
        self
    }

    /// The derived connection target URL.
    pub fn url(&self) -> &str {
        &self.inner.url
    }

    /// The validated connection target.
    pub fn endpoint(&self) -> &EndpointAddress {
        &self.inner.endpoint
    }

    /// Whether the channel has reached its terminal closed state.
    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }

    /// Gracefully terminate the channel. Idempotent.
    ///
    /// Closes the current connection, abandons queued payloads, and emits
    /// `closed` exactly once across all calls and failure paths.
    pub async fn close(&self) {
        // ---
        let mut state = self.inner.drain.lock().await;
        self.terminate(&mut state).await;
    }

    /// One single-flight drain pass.
    async fn drain(&self) {
        // ---
        let mut state = self.inner.drain.lock().await;

        // The channel may have gone terminal while this call waited on the
        // lock; its payloads were abandoned with the rest of the queue.
        if self.inner.closed.load(Ordering::Acquire) {
            return;
        }

        loop {
            // Narrow scope: the queue lock must not be held across the
            // transmit/recovery awaits below.
            let head = lock_ignore_poison(&self.inner.queue).pop_front();
            let Some(payload) = head else {
                return;
            };

            match self.attempt(&mut state, payload).await {
                Ok(()) => {}
                Err(err) => {
                    tracing::warn!(url = %self.inner.url, %err, "transmit failed");

                    if self.recover(&mut state).await {
                        // Recovered within the cap. The failed payload was
                        // already dequeued and is not re-sent; continue with
                        // the next one.
                        continue;
                    }

                    self.inner.notifier.emit_error(&err);
                    self.terminate(&mut state).await;
                    return;
                }
            }
        }
    }

    /// Transmit one payload, lazily connecting first if needed.
    async fn attempt(&self, state: &mut DrainState, payload: Bytes) -> Result<()> {
        // ---
        if !state.is_open() {
            self.reconnect(state).await?;
        }

        match state.connection.as_mut() {
            Some(conn) => conn.transmit(payload).await,
            None => Err(Error::Transmit("connection is not open".into())),
        }
    }

    /// Construct a fresh connection, replacing whatever was there.
    ///
    /// Connections are single-use: the previous instance is discarded, never
    /// reset in place.
    async fn reconnect(&self, state: &mut DrainState) -> Result<()> {
        // ---
        state.connection = None;

        let conn = self
            .inner
            .connector
            .connect(&self.inner.url, state.sub_protocol.as_deref())
            .await?;

        if let Some(token) = conn.sub_protocol() {
            state.sub_protocol = Some(token.to_owned());
        }
        state.connection = Some(conn);

        self.inner.notifier.emit_connected();

        Ok(())
    }

    /// Bounded recovery loop. Returns `true` once a fresh connection is
    /// open, `false` when the policy gives up.
    async fn recover(&self, state: &mut DrainState) -> bool {
        // ---
        state.connection = None;

        let mut attempts: u32 = 0;

        while let Some(delay) = self.inner.policy.next_delay(attempts) {
            attempts += 1;

            // Suspend the drain task between attempts; no queued payload is
            // attempted during the delay.
            tokio::time::sleep(delay).await;

            match self.reconnect(state).await {
                Ok(()) => {
                    tracing::info!(url = %self.inner.url, attempts, "reconnected");
                    return true;
                }
                Err(err) => {
                    tracing::debug!(url = %self.inner.url, attempts, %err, "reconnect attempt failed");
                }
            }
        }

        tracing::error!(url = %self.inner.url, attempts, "reconnect attempts exhausted");
        false
    }

    /// Transition to the terminal closed state. Idempotent.
    async fn terminate(&self, state: &mut DrainState) {
        // ---
        if self.inner.closed.swap(true, Ordering::AcqRel) {
            return;
        }

        {
            let mut queue = lock_ignore_poison(&self.inner.queue);
            if !queue.is_empty() {
                tracing::warn!(
                    url = %self.inner.url,
                    abandoned = queue.len(),
                    "abandoning queued payloads"
                );
                queue.clear();
            }
        }

        if let Some(mut conn) = state.connection.take() {
            if let Err(err) = conn.close().await {
                tracing::debug!(%err, "connection close failed");
            }
        }

        self.inner.notifier.emit_closed();
    }
}
