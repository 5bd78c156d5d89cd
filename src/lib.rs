//! Reconnecting WebSocket channel for streaming SFU telemetry samples
//!
//! This library delivers pre-serialized telemetry samples (per-stream RTP
//! statistics produced by a media-routing server) to a remote collector over
//! a persistent WebSocket connection. It handles outbound queueing, bounded
//! reconnect-on-failure, and lifecycle notifications, so the producing call
//! site never deals with transient connectivity loss.
//!
//! The channel accepts opaque payloads; assembling and encoding sample
//! records is the caller's concern. Each payload becomes one binary frame on
//! the wire, transmitted in strict enqueue order.
//!
//! ```no_run
//! use sfu_samples_ws::SampleChannelBuilder;
//!
//! # async fn example() -> sfu_samples_ws::Result<()> {
//! let channel = SampleChannelBuilder::new()
//!     .host("collector.example.com")
//!     .service_id("svc")
//!     .media_unit_id("mu1")
//!     .build()?;
//!
//! channel
//!     .on_connected(|| println!("collector link up"))
//!     .on_error(|err| eprintln!("delivery failed: {err}"))
//!     .on_closed(|| eprintln!("channel closed"));
//!
//! channel.send(br#"{"a":1}"#.to_vec()).await?;
//! # Ok(())
//! # }
//! ```

// Import all sub modules once...
mod channel;
mod channel_builder;
mod connection;
mod endpoint;
mod notifier;
mod queue;
mod retry;

mod error;

// Re-export main types
pub use channel::SampleChannel;
pub use channel_builder::SampleChannelBuilder;

pub use endpoint::EndpointAddress;
pub use error::{Error, Result};

pub use retry::{FixedDelay, NoReconnect, RetryPolicy};

// --- public re-exports
pub use connection::{
    //
    Connection,
    ConnectionState,
    Connector,
    ConnectorPtr,
    MemoryConnector,
    WsConnector,
};
