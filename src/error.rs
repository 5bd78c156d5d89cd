use thiserror::Error;

/// Errors that can occur while building or operating a sample channel
#[derive(Error, Debug)]
pub enum Error {
    /// Required builder field missing or empty
    #[error("missing required configuration: {0}")]
    MissingConfig(String),

    /// Conflicting builder configuration
    #[error("conflicting configuration: {0}")]
    ConfigConflict(String),

    /// A connect attempt failed to produce a usable connection
    #[error("connect failed: {0}")]
    Connect(String),

    /// A single transmit attempt failed
    #[error("transmit failed: {0}")]
    Transmit(String),

    /// The channel has reached its terminal closed state
    #[error("channel is closed")]
    ChannelClosed,

    /// WebSocket library error
    #[error("websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),
}

/// Result type alias for channel operations
pub type Result<T> = std::result::Result<T, Error>;
