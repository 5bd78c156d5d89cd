// src/connection/memory.rs

//! In-memory connection implementation.
//!
//! The memory connector is the **reference implementation** of connection
//! semantics: it simulates the collector entirely within the process so the
//! channel's drain, recovery, and exhaustion behavior can be validated
//! without network or timing variability.
//!
//! Frames transmitted over any connection produced by a connector instance
//! accumulate in shared state, and tests can script failures ahead of time:
//! fail the next N connect attempts, or the next N transmit attempts.
//!
//! ## Semantics
//!
//! - `connect()` succeeds immediately unless a scripted connect failure is
//!   pending, and records the sub-protocol it was asked to request.
//! - `transmit()` appends the payload to the shared frame log, unless a
//!   scripted transmit failure is pending, in which case the connection
//!   transitions to `Errored`.
//!
//! ## Non-goals
//!
//! - Network behavior, handshake emulation, or latency simulation
//! - Persistence of any kind

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use bytes::Bytes;

use crate::{Connection, ConnectionState, Connector, Error, Result};

#[derive(Default)]
struct MemoryShared {
    frames: Mutex<Vec<Bytes>>,
    requested_protocols: Mutex<Vec<Option<String>>>,
    connect_failures: AtomicUsize,
    transmit_failures: AtomicUsize,
    connects: AtomicUsize,
    negotiated: Option<String>,
}

/// Lock a shared log, ignoring poisoning (the logs are append-only).
fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Consume one scripted failure if any are pending.
fn take_failure(counter: &AtomicUsize) -> bool {
    counter
        .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1))
        .is_ok()
}

/// In-process connector with scriptable failure injection.
///
/// Cheap to clone; all clones share the same frame log and failure scripts,
/// so tests keep one handle for inspection and give another to the channel
/// builder.
#[derive(Clone, Default)]
pub struct MemoryConnector {
    shared: Arc<MemoryShared>,
}

impl MemoryConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Connector whose fake collector negotiates the given sub-protocol on
    /// every successful connect.
    pub fn with_sub_protocol(token: impl Into<String>) -> Self {
        // ---
        Self {
            shared: Arc::new(MemoryShared {
                negotiated: Some(token.into()),
                ..MemoryShared::default()
            }),
        }
    }

    /// Script the next `n` connect attempts to fail.
    pub fn fail_next_connects(&self, n: usize) {
        self.shared.connect_failures.store(n, Ordering::Release);
    }

    /// Script the next `n` transmit attempts to fail.
    pub fn fail_next_transmits(&self, n: usize) {
        self.shared.transmit_failures.store(n, Ordering::Release);
    }

    /// Frames transmitted so far, in delivery order.
    pub fn frames(&self) -> Vec<Bytes> {
        lock(&self.shared.frames).clone()
    }

    /// Number of successful connects so far.
    pub fn connect_count(&self) -> usize {
        self.shared.connects.load(Ordering::Acquire)
    }

    /// Sub-protocol tokens requested on each connect attempt (including
    /// failed ones), in order.
    pub fn requested_protocols(&self) -> Vec<Option<String>> {
        lock(&self.shared.requested_protocols).clone()
    }
}

#[async_trait::async_trait]
impl Connector for MemoryConnector {
    async fn connect(
        &self,
        _url: &str,
        sub_protocol: Option<&str>,
    ) -> Result<Box<dyn Connection>> {
        // ---
        lock(&self.shared.requested_protocols).push(sub_protocol.map(str::to_owned));

        if take_failure(&self.shared.connect_failures) {
            return Err(Error::Connect("scripted connect failure".into()));
        }

        self.shared.connects.fetch_add(1, Ordering::AcqRel);

        Ok(Box::new(MemoryConnection {
            shared: Arc::clone(&self.shared),
            state: ConnectionState::Open,
            sub_protocol: self.shared.negotiated.clone(),
        }))
    }
}

struct MemoryConnection {
    shared: Arc<MemoryShared>,
    state: ConnectionState,
    sub_protocol: Option<String>,
}

#[async_trait::async_trait]
impl Connection for MemoryConnection {
    async fn transmit(&mut self, payload: Bytes) -> Result<()> {
        // ---
        if self.state != ConnectionState::Open {
            return Err(Error::Transmit("connection is not open".into()));
        }

        if take_failure(&self.shared.transmit_failures) {
            self.state = ConnectionState::Errored;
            return Err(Error::Transmit("scripted transmit failure".into()));
        }

        lock(&self.shared.frames).push(payload);

        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        // ---
        if !matches!(
            self.state,
            ConnectionState::Closed | ConnectionState::Errored
        ) {
            self.state = ConnectionState::Closed;
        }
        Ok(())
    }

    fn state(&self) -> ConnectionState {
        self.state
    }

    fn sub_protocol(&self) -> Option<&str> {
        self.sub_protocol.as_deref()
    }
}
