// src/endpoint.rs

//! Connection target description.
//!
//! An [`EndpointAddress`] is an immutable, validated description of where the
//! channel connects: host, optional port, encryption flag, and the logical
//! routing identifiers (service id and media-unit id) that become path
//! segments of the derived URL.
//!
//! Addresses are produced by the channel builder and never mutated afterward.

use crate::{Error, Result};

/// Fixed path prefix under which collectors accept sample streams.
const SAMPLES_PATH: &str = "sfusamples";

/// Immutable, validated connection target.
///
/// The derived URL has the shape
/// `{ws|wss}://{host}[:{port}]/sfusamples/{service_id}/{media_unit_id}`,
/// using `wss` unless encryption was explicitly disabled at build time.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EndpointAddress {
    secure: bool,
    host: String,
    port: Option<u16>,
    service_id: String,
    media_unit_id: String,
}

impl EndpointAddress {
    /// Create a validated endpoint address.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingConfig`] if `host`, `service_id`, or
    /// `media_unit_id` is empty.
    pub fn new(
        secure: bool,
        host: impl Into<String>,
        port: Option<u16>,
        service_id: impl Into<String>,
        media_unit_id: impl Into<String>,
    ) -> Result<Self> {
        // ---
        let host = host.into();
        let service_id = service_id.into();
        let media_unit_id = media_unit_id.into();

        if host.is_empty() {
            return Err(Error::MissingConfig("host".into()));
        }
        if service_id.is_empty() {
            return Err(Error::MissingConfig("service_id".into()));
        }
        if media_unit_id.is_empty() {
            return Err(Error::MissingConfig("media_unit_id".into()));
        }

        Ok(Self {
            secure,
            host,
            port,
            service_id,
            media_unit_id,
        })
    }

    /// Hostname of the collector.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Explicit port, if one was configured.
    pub fn port(&self) -> Option<u16> {
        self.port
    }

    /// Whether the derived URL uses the encrypted scheme (`wss`).
    pub fn is_secure(&self) -> bool {
        self.secure
    }

    /// Service identifier routing segment.
    pub fn service_id(&self) -> &str {
        &self.service_id
    }

    /// Media-unit identifier routing segment.
    pub fn media_unit_id(&self) -> &str {
        &self.media_unit_id
    }

    /// Derive the full connection URL.
    pub fn url(&self) -> String {
        // ---
        let scheme = if self.secure { "wss" } else { "ws" };

        match self.port {
            Some(port) => format!(
                "{scheme}://{}:{port}/{SAMPLES_PATH}/{}/{}",
                self.host, self.service_id, self.media_unit_id
            ),
            None => format!(
                "{scheme}://{}/{SAMPLES_PATH}/{}/{}",
                self.host, self.service_id, self.media_unit_id
            ),
        }
    }
}

impl std::fmt::Display for EndpointAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.url())
    }
}
