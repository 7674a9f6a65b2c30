//! `[http]` table of the client configuration.

use std::{ops::RangeInclusive, time::Duration};

use serde::Deserialize;

use crate::error::{Result, WechatError};

const TIMEOUT_RANGE: RangeInclusive<u64> = 1..=300;
const CONNECT_TIMEOUT_RANGE: RangeInclusive<u64> = 1..=60;

/// Settings for [`HttpTransport`](super::HttpTransport).
///
/// Every key is optional:
///
/// ```toml
/// [http]
/// pool_max_idle_per_host = 100
/// timeout_secs = 30
/// connect_timeout_secs = 10
/// http_version = "auto"
/// ```
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct HttpConfig {
    /// Idle pooled connections kept per provider host.
    pub pool_max_idle_per_host: usize,
    /// Whole-request deadline (1 to 300 seconds).
    pub timeout_secs: u64,
    /// TCP and TLS handshake deadline (1 to 60 seconds).
    pub connect_timeout_secs: u64,
    /// Protocol negotiation.
    pub http_version: HttpVersion,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            pool_max_idle_per_host: 100,
            timeout_secs: 30,
            connect_timeout_secs: 10,
            http_version: HttpVersion::Auto,
        }
    }
}

impl HttpConfig {
    /// Checks the timeout bounds.
    ///
    /// # Errors
    ///
    /// Returns [`WechatError::Config`] naming the first out-of-range key.
    pub fn validate(&self) -> Result<()> {
        check_range("timeout_secs", self.timeout_secs, &TIMEOUT_RANGE)?;
        check_range("connect_timeout_secs", self.connect_timeout_secs, &CONNECT_TIMEOUT_RANGE)
    }

    /// Request deadline.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Handshake deadline.
    #[must_use]
    pub const fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

fn check_range(key: &str, value: u64, range: &RangeInclusive<u64>) -> Result<()> {
    if range.contains(&value) {
        Ok(())
    } else {
        Err(WechatError::Config(format!(
            "{key} must be between {} and {}, got {value}",
            range.start(),
            range.end()
        )))
    }
}

/// HTTP protocol selection.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum HttpVersion {
    /// HTTP/1.1 only.
    Http1,
    /// HTTP/2 with prior knowledge.
    Http2,
    /// Negotiated through ALPN.
    #[default]
    Auto,
}

impl HttpVersion {
    /// Protocol label reported by the transport.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Http1 => "http/1.1",
            Self::Http2 => "http/2",
            Self::Auto => "http",
        }
    }
}
