//! Error types for the WeChat client.
//!
//! This module defines every error a call can produce, from request validation
//! through response decoding. All errors implement the standard
//! [`std::error::Error`] trait via [`thiserror::Error`].
//!
//! # Error Categories
//!
//! - **Validation Errors** ([`WechatError::Validation`]): a request record rejected itself
//!   before any network traffic
//! - **Credential Errors** ([`WechatError::InvalidCredential`], [`WechatError::AppIdNil`],
//!   [`WechatError::SecretNil`]): missing or incomplete application credentials
//! - **Signature Errors** ([`WechatError::VerifySign`]): an inbound reply failed verification
//! - **Transport Errors** ([`WechatError::HttpError`], [`WechatError::TransportError`]):
//!   opaque failures of the HTTP collaborator
//! - **Decode Errors** ([`WechatError::XmlParse`], [`WechatError::JsonDecode`]): malformed
//!   response bodies
//!
//! # Examples
//!
//! ```
//! use openwechat::error::{ErrorKind, WechatError};
//!
//! let err = WechatError::Validation("bill_date can not be empty".to_owned());
//! assert_eq!(err.kind(), ErrorKind::Validation);
//! assert_eq!(err.to_string(), "invalid request: bill_date can not be empty");
//! ```

use thiserror::Error;

use crate::api::Stage;

/// Result type alias for client operations.
///
/// All fallible functions in this crate return this type.
pub type Result<T> = std::result::Result<T, WechatError>;

/// Errors that can occur while building, sending, or decoding an API call.
///
/// Errors are returned to the caller of the failing step undecorated. Nothing
/// in this crate retries; that policy belongs to the transport or the
/// application.
///
/// # Error Recovery
///
/// - **Validation errors** ([`Validation`](Self::Validation)): fix the request and retry
/// - **Credential errors** ([`AppIdNil`](Self::AppIdNil), [`SecretNil`](Self::SecretNil),
///   [`InvalidCredential`](Self::InvalidCredential)): register the application before calling
/// - **Signature errors** ([`VerifySign`](Self::VerifySign)): check the signing key; the reply
///   may have been tampered with
/// - **Transport errors** ([`HttpError`](Self::HttpError),
///   [`TransportError`](Self::TransportError)): transient, retry with backoff at the
///   application layer
/// - **Decode errors** ([`XmlParse`](Self::XmlParse), [`JsonDecode`](Self::JsonDecode)): the
///   endpoint returned something other than its documented format
#[must_use = "errors should be handled, propagated, or explicitly panicked"]
#[derive(Debug, Error)]
pub enum WechatError {
    /// A request record failed its own validation.
    ///
    /// Raised by [`Validate::validate`](crate::api::Validate::validate) implementations, for
    /// example when a mandatory business field is empty. Detected before any network call.
    #[error("invalid request: {0}")]
    Validation(String),

    /// A credential could not be registered, or lacks what the endpoint needs.
    ///
    /// Occurs when the application id or shared secret is empty, when no credential was
    /// supplied at all, or when a signed endpoint is called for an application without a
    /// merchant signing key.
    #[error("invalid credential: {0}")]
    InvalidCredential(String),

    /// No application id was set for the call.
    #[error("APPID NIL")]
    AppIdNil,

    /// No credential is registered for the application id.
    ///
    /// # Recovery
    ///
    /// Register the application with
    /// [`CredentialStore::register`](crate::credential::CredentialStore::register) first.
    #[error("SECRET NIL")]
    SecretNil,

    /// A step was attempted on a call whose earlier step already failed.
    ///
    /// The first failure ends an [`ApiCall`](crate::api::ApiCall); start a new call
    /// instead of retrying steps on the old one.
    #[error("call already failed at stage {0}")]
    CallFailed(Stage),

    /// The reply's `sign` field did not match the recomputed signature.
    #[error("VERIFY SIGN ERROR")]
    VerifySign,

    /// HTTP request failed.
    ///
    /// Wraps [`reqwest::Error`]: timeouts, refused connections, DNS and TLS failures.
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// The transport refused or could not complete the exchange.
    ///
    /// Covers non-HTTPS URLs and non-success status codes, and is the variant
    /// custom [`Transport`](crate::transport::Transport) implementations should use for
    /// their own failures.
    #[error("transport error: {0}")]
    TransportError(String),

    /// An XML reply could not be parsed.
    #[error("XML PARSE ERROR: {0}")]
    XmlParse(String),

    /// A JSON reply could not be decoded into the response record.
    #[error("JSON decode failed: {0}")]
    JsonDecode(#[from] serde_json::Error),

    /// Configuration could not be loaded or failed validation.
    #[error("invalid configuration: {0}")]
    Config(String),
}

/// Coarse error taxonomy used when callers only care about the failure class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Missing or malformed request field.
    Validation,
    /// Unregistered or incomplete credential.
    Credential,
    /// Response signature mismatch.
    Signature,
    /// Failure inside the transport collaborator.
    Transport,
    /// Malformed response body.
    Decode,
    /// Configuration loading failure.
    Config,
}

impl WechatError {
    /// Returns the taxonomy class of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) | Self::CallFailed(_) => ErrorKind::Validation,
            Self::InvalidCredential(_) | Self::AppIdNil | Self::SecretNil => ErrorKind::Credential,
            Self::VerifySign => ErrorKind::Signature,
            Self::HttpError(_) | Self::TransportError(_) => ErrorKind::Transport,
            Self::XmlParse(_) | Self::JsonDecode(_) => ErrorKind::Decode,
            Self::Config(_) => ErrorKind::Config,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = WechatError::Validation("mch_id can not be empty".into());
        assert_eq!(error.to_string(), "invalid request: mch_id can not be empty");
    }

    #[test]
    fn test_sentinel_messages() {
        assert_eq!(WechatError::AppIdNil.to_string(), "APPID NIL");
        assert_eq!(WechatError::SecretNil.to_string(), "SECRET NIL");
        assert_eq!(WechatError::VerifySign.to_string(), "VERIFY SIGN ERROR");
    }

    #[test]
    fn test_call_failed_names_stage() {
        let error = WechatError::CallFailed(Stage::CredentialResolved);
        assert_eq!(error.to_string(), "call already failed at stage credential_resolved");
    }

    #[test]
    fn test_xml_parse_error() {
        let error = WechatError::XmlParse("unclosed element".into());
        assert!(error.to_string().contains("XML PARSE ERROR"));
    }

    #[test]
    fn test_kind_mapping() {
        assert_eq!(WechatError::Validation(String::new()).kind(), ErrorKind::Validation);
        assert_eq!(WechatError::InvalidCredential(String::new()).kind(), ErrorKind::Credential);
        assert_eq!(WechatError::AppIdNil.kind(), ErrorKind::Credential);
        assert_eq!(WechatError::SecretNil.kind(), ErrorKind::Credential);
        assert_eq!(WechatError::CallFailed(Stage::Idle).kind(), ErrorKind::Validation);
        assert_eq!(WechatError::VerifySign.kind(), ErrorKind::Signature);
        assert_eq!(WechatError::TransportError(String::new()).kind(), ErrorKind::Transport);
        assert_eq!(WechatError::XmlParse(String::new()).kind(), ErrorKind::Decode);
        assert_eq!(WechatError::Config(String::new()).kind(), ErrorKind::Config);
    }

    #[test]
    fn test_json_decode_from() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let error = WechatError::from(json_err);
        assert_eq!(error.kind(), ErrorKind::Decode);
    }
}
