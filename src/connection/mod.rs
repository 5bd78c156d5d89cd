// src/connection/mod.rs

//! Connection domain abstractions.
//!
//! This module defines the transport seam used by the channel's drain loop.
//! It intentionally avoids any reference to a concrete protocol library:
//! the channel only needs "open one connection to a target, transmit opaque
//! frames on it, observe its state."
//!
//! A [`Connection`] is single-use. Reconnecting never resets an existing
//! connection in place; the channel asks its [`Connector`] for a fresh one
//! bound to the same URL and previously negotiated sub-protocol, and the
//! replaced instance is dropped.
//!
//! Concrete implementations live in the submodules: [`websocket`] is the
//! production transport, [`memory`] is the in-process reference used by
//! tests.

mod memory;
mod websocket;

pub use memory::MemoryConnector;
pub use websocket::WsConnector;

use std::sync::Arc;

use bytes::Bytes;

use crate::Result;

/// Lifecycle state of a single connection instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Handshake in progress.
    Connecting,
    /// Usable for transmission.
    Open,
    /// Terminated cleanly; terminal.
    Closed,
    /// Terminated by a transport error; terminal.
    Errored,
}

/// One underlying bidirectional message-stream resource.
///
/// Implementations must ensure that:
/// - `transmit()` fails synchronously (with respect to the call) when the
///   connection is not [`ConnectionState::Open`]; it never blocks waiting
///   for recovery.
/// - `close()` is idempotent, and the state reaches a terminal value exactly
///   once per instance.
/// - Each payload handed to `transmit()` becomes one discrete frame on the
///   wire; the connection does not inspect or re-frame payload contents.
#[async_trait::async_trait]
pub trait Connection: Send {
    /// Transmit one pre-serialized payload as a single frame.
    async fn transmit(&mut self, payload: Bytes) -> Result<()>;

    /// Close the connection. Idempotent.
    async fn close(&mut self) -> Result<()>;

    /// Current lifecycle state.
    fn state(&self) -> ConnectionState;

    /// Sub-protocol token negotiated during the handshake, if any.
    ///
    /// The channel carries this token forward so the remote sees a
    /// consistent session type across reconnects.
    fn sub_protocol(&self) -> Option<&str>;
}

/// Factory for fresh, single-use connections.
///
/// Connect failure is reported to the caller as an `Err`, not as a lifecycle
/// notification, because it occurs inside the channel's own reconnect
/// attempt rather than during steady-state operation.
#[async_trait::async_trait]
pub trait Connector: Send + Sync {
    /// Open a new connection to `url`.
    ///
    /// When `sub_protocol` is `Some`, the connector requests that token
    /// during the handshake so the renewed session matches the original.
    async fn connect(&self, url: &str, sub_protocol: Option<&str>)
        -> Result<Box<dyn Connection>>;
}

/// Shared connector pointer.
///
/// `Arc<dyn Connector>` erases the concrete connector behind a stable
/// interface; cloning only bumps a reference count.
pub type ConnectorPtr = Arc<dyn Connector>;
