// src/connection/websocket.rs

//! WebSocket connection implementation using `tokio-tungstenite`.
//!
//! Each payload is transmitted as one binary WebSocket frame. The connector
//! requests the carried-forward sub-protocol (when one was negotiated on a
//! previous connection) via the `Sec-WebSocket-Protocol` header and records
//! the token the server accepted from the handshake response.
//!
//! This module keeps WebSocket-specific concepts (handshake requests,
//! close frames, library error types) inside the transport boundary; the
//! channel above only sees the `Connection`/`Connector` contract.

use bytes::Bytes;
use futures_util::SinkExt;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::header::{HeaderValue, SEC_WEBSOCKET_PROTOCOL};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use crate::{Connection, ConnectionState, Connector, Error, Result};

/// Connector producing WebSocket client connections.
#[derive(Debug, Default, Clone, Copy)]
pub struct WsConnector;

impl WsConnector {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait::async_trait]
impl Connector for WsConnector {
    async fn connect(
        &self,
        url: &str,
        sub_protocol: Option<&str>,
    ) -> Result<Box<dyn Connection>> {
        // ---
        let mut request = url.into_client_request()?;

        if let Some(token) = sub_protocol {
            let value = HeaderValue::from_str(token).map_err(|err| {
                Error::Connect(format!("invalid sub-protocol token {token:?}: {err}"))
            })?;
            request.headers_mut().insert(SEC_WEBSOCKET_PROTOCOL, value);
        }

        let (stream, response) = connect_async(request).await?;

        // The token the server actually accepted, carried forward by the
        // channel on the next reconnect.
        let negotiated = response
            .headers()
            .get(SEC_WEBSOCKET_PROTOCOL)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);

        tracing::info!(url, sub_protocol = ?negotiated, "websocket connected");

        Ok(Box::new(WsConnection {
            stream,
            state: ConnectionState::Open,
            sub_protocol: negotiated,
        }))
    }
}

/// A single established WebSocket connection.
struct WsConnection {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
    state: ConnectionState,
    sub_protocol: Option<String>,
}

#[async_trait::async_trait]
impl Connection for WsConnection {
    async fn transmit(&mut self, payload: Bytes) -> Result<()> {
        // ---
        if self.state != ConnectionState::Open {
            return Err(Error::Transmit("connection is not open".into()));
        }

        match self.stream.send(Message::Binary(payload.to_vec())).await {
            Ok(()) => Ok(()),
            Err(err) => {
                self.state = ConnectionState::Errored;
                Err(err.into())
            }
        }
    }

    async fn close(&mut self) -> Result<()> {
        // ---
        if matches!(
            self.state,
            ConnectionState::Closed | ConnectionState::Errored
        ) {
            return Ok(());
        }
        self.state = ConnectionState::Closed;

        if let Err(err) = self.stream.close(None).await {
            tracing::debug!(%err, "websocket close handshake failed");
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
