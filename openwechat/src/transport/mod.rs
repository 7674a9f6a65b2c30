//! Transport collaborator.
//!
//! The invoker never opens sockets itself: it hands an encoded [`Payload`] to
//! a [`Transport`] and receives the raw reply body. [`HttpTransport`] is the
//! reqwest-backed implementation; tests and applications may supply their own.
//!
//! # Examples
//!
//! ```rust,no_run
//! use openwechat::transport::{HttpMethod, HttpTransport, Payload, Transport};
//!
//! # async fn example() -> openwechat::error::Result<()> {
//! let transport = HttpTransport::new()?;
//! let body = transport
//!     .execute(
//!         HttpMethod::Get,
//!         "https://api.weixin.qq.com/sns/userinfo",
//!         Payload::Form(vec![("openid".to_owned(), "o1".to_owned())]),
//!     )
//!     .await?;
//! println!("{} bytes", body.len());
//! # Ok(())
//! # }
//! ```

#[allow(
    redundant_imports,
    reason = "Future needed for RPITIT despite being in Edition 2024 prelude"
)]
use std::future::Future;

use crate::error::Result;

pub mod config;
pub mod http;

pub use config::{HttpConfig, HttpVersion};
pub use http::HttpTransport;

/// HTTP method of an endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    /// Parameters travel in the query string.
    Get,
    /// Parameters travel in the request body.
    Post,
}

impl HttpMethod {
    /// Returns the method name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
        }
    }
}

/// Encoded request parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    /// Form pairs; a query string for GET, an urlencoded body for POST.
    Form(Vec<(String, String)>),
    /// XML document body.
    Xml(Vec<u8>),
}

impl Payload {
    /// Returns the MIME type used when the payload is sent as a body.
    #[must_use]
    pub const fn content_type(&self) -> &'static str {
        match self {
            Self::Form(_) => "application/x-www-form-urlencoded",
            Self::Xml(_) => "text/xml; charset=utf-8",
        }
    }
}

/// Sends one request and returns the raw reply body.
///
/// Implementations own timeouts, TLS and connection reuse. Failures should be
/// reported as [`WechatError::TransportError`](crate::error::WechatError::TransportError)
/// or [`WechatError::HttpError`](crate::error::WechatError::HttpError); the
/// invoker passes them through unchanged.
pub trait Transport: Send + Sync {
    /// Executes `method` against `url` with `payload`.
    ///
    /// # Errors
    ///
    /// Returns error if the exchange cannot be completed or the server answers
    /// with a non-success status.
    fn execute<'a>(
        &'a self,
        method: HttpMethod,
        url: &'a str,
        payload: Payload,
    ) -> impl Future<Output = Result<Vec<u8>>> + Send + 'a;

    /// Returns the protocol name for logging.
    ///
    /// Examples: "http/1.1", "http/2"
    fn protocol_name(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_method_names() {
        assert_eq!(HttpMethod::Get.as_str(), "GET");
        assert_eq!(HttpMethod::Post.as_str(), "POST");
    }

    #[test]
    fn test_payload_content_type() {
        assert_eq!(Payload::Form(vec![]).content_type(), "application/x-www-form-urlencoded");
        assert!(Payload::Xml(b"<xml></xml>".to_vec()).content_type().starts_with("text/xml"));
    }

    #[test]
    fn test_payload_debug() {
        let payload = Payload::Form(vec![("appid".to_owned(), "wx1".to_owned())]);
        let debug_str = format!("{payload:?}");
        assert!(debug_str.contains("Form"));
        assert!(debug_str.contains("appid"));
    }
}
