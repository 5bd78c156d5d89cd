// src/channel_builder.rs

//! Channel builder.
//!
//! Provides a fluent builder API for constructing sample channels with clear
//! separation between required and optional configuration.

use std::sync::Arc;
use std::time::Duration;

use crate::connection::{Connector, ConnectorPtr, WsConnector};
use crate::retry::FixedDelay;
use crate::{EndpointAddress, Error, Result, RetryPolicy, SampleChannel};

/// Builder for [`SampleChannel`].
///
/// Required fields: `host`, `service_id`, `media_unit_id`. Construction
/// fails with a descriptive error when any is missing; no connection attempt
/// is made at build time (the channel connects lazily on first send).
///
/// # Examples
///
/// ```no_run
/// use sfu_samples_ws::SampleChannelBuilder;
///
/// # fn example() -> sfu_samples_ws::Result<()> {
/// let channel = SampleChannelBuilder::new()
///     .host("collector.example.com")
///     .service_id("svc")
///     .media_unit_id("mu1")
///     .build()?;
///
/// assert_eq!(channel.url(), "wss://collector.example.com/sfusamples/svc/mu1");
/// # Ok(())
/// # }
/// ```
pub struct SampleChannelBuilder {
    host: Option<String>,
    service_id: Option<String>,
    media_unit_id: Option<String>,
    port: Option<u16>,
    secure: bool,
    reconnect_wait: Option<Duration>,
    max_reconnect_attempts: Option<u32>,
    policy: Option<Box<dyn RetryPolicy>>,
    connector: Option<ConnectorPtr>,
}

impl SampleChannelBuilder {
    /// Create a new channel builder.
    pub fn new() -> Self {
        Self {
            host: None,
            service_id: None,
            media_unit_id: None,
            port: None,
            secure: true,
            reconnect_wait: None,
            max_reconnect_attempts: None,
            policy: None,
            connector: None,
        }
    }

    /// Set the collector hostname (required).
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    /// Set the service identifier routing segment (required).
    pub fn service_id(mut self, id: impl Into<String>) -> Self {
        self.service_id = Some(id.into());
        self
    }

    /// Set the media-unit identifier routing segment (required).
    pub fn media_unit_id(mut self, id: impl Into<String>) -> Self {
        self.media_unit_id = Some(id.into());
        self
    }

    /// Set an explicit collector port.
    ///
    /// If not specified, the URL carries no port and the transport uses the
    /// scheme default.
    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Disable transport encryption (`ws` scheme instead of `wss`).
    pub fn insecure(mut self) -> Self {
        self.secure = false;
        self
    }

    /// Set the delay between reconnect attempts (default 1000 ms).
    ///
    /// Cannot be combined with [`retry_policy`](Self::retry_policy).
    pub fn reconnect_wait(mut self, wait: Duration) -> Self {
        self.reconnect_wait = Some(wait);
        self
    }

    /// Set the reconnect attempt cap (default 3).
    ///
    /// Cannot be combined with [`retry_policy`](Self::retry_policy).
    pub fn max_reconnect_attempts(mut self, attempts: u32) -> Self {
        self.max_reconnect_attempts = Some(attempts);
        self
    }

    /// Replace the retry strategy entirely.
    ///
    /// Cannot be combined with [`reconnect_wait`](Self::reconnect_wait) or
    /// [`max_reconnect_attempts`](Self::max_reconnect_attempts), which
    /// configure the baseline fixed-delay policy.
    pub fn retry_policy(mut self, policy: impl RetryPolicy + 'static) -> Self {
        self.policy = Some(Box::new(policy));
        self
    }

    /// Set an explicit connector.
    ///
    /// This is the hook you want for tests: inject a
    /// [`MemoryConnector`](crate::MemoryConnector) to exercise the channel
    /// without a network. Defaults to the WebSocket connector.
    pub fn connector(mut self, connector: impl Connector + 'static) -> Self {
        self.connector = Some(Arc::new(connector));
        self
    }

    /// Build the channel (consumes self).
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingConfig`] if `host`, `service_id`, or
    /// `media_unit_id` is absent, and [`Error::ConfigConflict`] if both a
    /// custom retry policy and baseline retry knobs were configured.
    pub fn build(self) -> Result<SampleChannel> {
        // ---
        let host = self
            .host
            .ok_or_else(|| Error::MissingConfig("host".into()))?;
        let service_id = self
            .service_id
            .ok_or_else(|| Error::MissingConfig("service_id".into()))?;
        let media_unit_id = self
            .media_unit_id
            .ok_or_else(|| Error::MissingConfig("media_unit_id".into()))?;

        if self.policy.is_some()
            && (self.reconnect_wait.is_some() || self.max_reconnect_attempts.is_some())
        {
            return Err(Error::ConfigConflict(
                "retry_policy cannot be combined with reconnect_wait / max_reconnect_attempts"
                    .into(),
            ));
        }

        let endpoint =
            EndpointAddress::new(self.secure, host, self.port, service_id, media_unit_id)?;

        let policy = match self.policy {
            Some(policy) => policy,
            None => Box::new(FixedDelay::new(
                self.max_reconnect_attempts.unwrap_or(3),
                self.reconnect_wait
                    .unwrap_or_else(|| Duration::from_millis(1000)),
            )),
        };

        let connector = self
            .connector
            .unwrap_or_else(|| Arc::new(WsConnector::new()));

        Ok(SampleChannel::new(endpoint, connector, policy))
    }
}

impl Default for SampleChannelBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;

    fn complete() -> SampleChannelBuilder {
        SampleChannelBuilder::new()
            .host("localhost")
            .service_id("svc")
            .media_unit_id("mu1")
    }

    #[test]
    fn builds_with_required_fields_only() {
        // ---
        let channel = complete().build().unwrap();

        assert_eq!(channel.url(), "wss://localhost/sfusamples/svc/mu1");
    }

    #[test]
    fn missing_host_fails() {
        // ---
        let err = SampleChannelBuilder::new()
            .service_id("svc")
            .media_unit_id("mu1")
            .build()
            .unwrap_err();

        assert!(matches!(err, Error::MissingConfig(field) if field == "host"));
    }

    #[test]
    fn missing_service_id_fails() {
        // ---
        let err = SampleChannelBuilder::new()
            .host("localhost")
            .media_unit_id("mu1")
            .build()
            .unwrap_err();

        assert!(matches!(err, Error::MissingConfig(field) if field == "service_id"));
    }

    #[test]
    fn missing_media_unit_id_fails() {
        // ---
        let err = SampleChannelBuilder::new()
            .host("localhost")
            .service_id("svc")
            .build()
            .unwrap_err();

        assert!(matches!(err, Error::MissingConfig(field) if field == "media_unit_id"));
    }

    #[test]
    fn insecure_port_url_matches_expected_target() {
        // ---
        let channel = complete().port(1234).insecure().build().unwrap();

        assert_eq!(channel.url(), "ws://localhost:1234/sfusamples/svc/mu1");
    }

    #[test]
    fn custom_policy_conflicts_with_baseline_knobs() {
        // ---
        let err = complete()
            .retry_policy(crate::NoReconnect)
            .reconnect_wait(Duration::from_millis(5))
            .build()
            .unwrap_err();

        assert!(matches!(err, Error::ConfigConflict(_)));
    }
}
