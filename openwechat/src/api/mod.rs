//! Endpoint invoker.
//!
//! An [`Endpoint`] declares everything the invoker needs to know about one
//! provider API: where it lives, how its parameters are encoded, how it
//! authenticates and what its reply looks like. [`Client::call`] then drives a
//! single invocation through the fixed sequence of [`Stage`]s.
//!
//! # Examples
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use openwechat::{
//!     api::Client,
//!     credential::{Credential, CredentialStore},
//!     endpoints::pay::{DownloadBill, DownloadBillRequest},
//!     transport::HttpTransport,
//! };
//!
//! # async fn example() -> openwechat::error::Result<()> {
//! let store = Arc::new(CredentialStore::new());
//! store.register([Credential::new("wx123", "app-secret", "merchant-key")])?;
//! let client = Client::new(store, HttpTransport::new()?);
//!
//! let mut call = client.call::<DownloadBill>();
//! call.set_app_id("wx123")?.set_request(DownloadBillRequest {
//!     mch_id: "100".to_owned(),
//!     bill_date: "20140603".to_owned(),
//!     ..Default::default()
//! })?;
//! let bill = call.run_opaque().await?;
//! println!("{} bytes", bill.data.len());
//! # Ok(())
//! # }
//! ```

use std::fmt;

use serde::de::DeserializeOwned;

use crate::{
    codec::{RequestFormat, ResponseFormat},
    error::Result,
    field::WireSchema,
    sign::SignType,
    transport::HttpMethod,
};

mod client;

pub use client::{ApiCall, Client};

/// Self-validation of a request record.
pub trait Validate {
    /// Checks that mandatory business fields are present and well-formed.
    ///
    /// # Errors
    ///
    /// Returns [`WechatError::Validation`](crate::error::WechatError::Validation)
    /// describing the first offending field.
    fn validate(&self) -> Result<()>;
}

/// How a call proves which application is calling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthScheme {
    /// Inject `appid` and `nonce_str`, then sign with the merchant key.
    Signed,
    /// Inject `appid` and the application secret as `secret`.
    AppSecret,
    /// Send the request fields only.
    None,
}

/// Static description of one provider API.
pub trait Endpoint {
    /// Short identifier used in logs and listings.
    const NAME: &'static str;
    /// Absolute HTTPS URL.
    const URL: &'static str;
    /// HTTP method.
    const METHOD: HttpMethod;
    /// Encoding of the request parameters.
    const REQUEST_FORMAT: RequestFormat;
    /// Encoding of the reply.
    const RESPONSE_FORMAT: ResponseFormat;
    /// Authentication scheme.
    const AUTH: AuthScheme;
    /// Whether XML replies must carry a valid `sign`.
    ///
    /// Replies with `return_code = FAIL` are exempt; the provider does not
    /// sign them.
    const VERIFY_RESPONSE: bool = false;
    /// Digest used for request and reply signatures.
    const SIGN_TYPE: SignType = SignType::Md5;

    /// Request record.
    type Request: WireSchema + Validate + Send + Sync;
    /// Reply record, populated by field name.
    type Response: DeserializeOwned + Default;
}

/// Reply records whose success body is an opaque byte stream.
///
/// Bulk downloads answer with the file itself on success and with a flat XML
/// error document otherwise.
pub trait OpaquePayload {
    /// Returns true if the record carries a structured error indicator.
    fn has_error(&self) -> bool;

    /// Stores the raw success body.
    fn set_payload(&mut self, data: Vec<u8>);
}

/// Progress of a single call.
///
/// Stages only move forward; the first failure ends the call where it stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    /// Nothing set yet.
    Idle,
    /// Application id accepted.
    ApplicationIdSet,
    /// Credential found for the application id.
    CredentialResolved,
    /// Request record passed validation.
    RequestValidated,
    /// Request projected into a field set.
    FieldsProjected,
    /// Common fields injected and signature computed.
    Signed,
    /// Field set encoded for the wire.
    Serialized,
    /// Transport returned a reply body.
    Sent,
    /// Reply decoded into the response record.
    Decoded,
    /// Call finished successfully.
    Done,
}

impl Stage {
    /// Returns the stage name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::ApplicationIdSet => "application_id_set",
            Self::CredentialResolved => "credential_resolved",
            Self::RequestValidated => "request_validated",
            Self::FieldsProjected => "fields_projected",
            Self::Signed => "signed",
            Self::Serialized => "serialized",
            Self::Sent => "sent",
            Self::Decoded => "decoded",
            Self::Done => "done",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_order() {
        assert!(Stage::Idle < Stage::ApplicationIdSet);
        assert!(Stage::CredentialResolved < Stage::RequestValidated);
        assert!(Stage::Sent < Stage::Decoded);
        assert!(Stage::Decoded < Stage::Done);
    }

    #[test]
    fn test_stage_display() {
        assert_eq!(Stage::Idle.to_string(), "idle");
        assert_eq!(Stage::CredentialResolved.to_string(), "credential_resolved");
        assert_eq!(Stage::Done.to_string(), "done");
    }
}
