//! openwechat: signed request marshaling for the WeChat Pay and Open Platform APIs
//!
//! The crate turns a typed request record into the exact bytes the provider
//! expects and turns the provider's reply back into a typed record:
//!
//! ```text
//! request record ──project──▶ FieldSet ──inject + sign──▶ FieldSet ──encode──▶ XML / form
//!                                                                                 │
//!                                                                            Transport
//!                                                                                 │
//! response record ◀──populate── FieldSet / JSON ◀──decode + verify─────────── reply body
//! ```
//!
//! - [`field`]: declarative wire schemas and the [`FieldSet`](field::FieldSet)
//! - [`sign`]: the canonical string and its MD5 / HMAC-SHA256 signature
//! - [`codec`]: flat XML, form and JSON wire formats
//! - [`transport`]: the HTTP collaborator and its reqwest implementation
//! - [`api`]: the per-call state machine
//! - [`endpoints`]: bundled endpoint definitions
//! - [`credential`] and [`config`]: application credentials and their TOML source
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use openwechat::{
//!     api::Client,
//!     config::ClientConfig,
//!     endpoints::oauth::{AccessToken, AccessTokenRequest},
//!     transport::HttpTransport,
//! };
//!
//! # async fn example() -> openwechat::Result<()> {
//! let config = ClientConfig::from_file("openwechat.toml")?;
//! let transport = HttpTransport::with_config(&config.http)?;
//! let client = Client::new(Arc::new(config.into_store()?), transport);
//!
//! let mut call = client.call::<AccessToken>();
//! call.set_app_id("wx123")?.set_request(AccessTokenRequest::new("CODE"))?;
//! let token = call.run().await?;
//! println!("openid: {}", token.openid);
//! # Ok(())
//! # }
//! ```
//!
//! # Signing
//!
//! ```
//! use openwechat::{field::FieldSet, sign};
//!
//! let mut fields: FieldSet = [("bill_date", "20140603"), ("mch_id", "100")].into_iter().collect();
//! let signature = sign::sign(&fields, "abc");
//! assert_eq!(signature.as_str(), "FCA92F0B93579A2320129CB071D1E547");
//!
//! fields.insert(sign::SIGN_FIELD, signature.into_string());
//! assert!(sign::verify(&fields, "abc"));
//! ```

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![allow(clippy::multiple_crate_versions, reason = "transitive dependencies from reqwest")]

pub mod api;
pub mod codec;
pub mod config;
pub mod credential;
pub mod endpoints;
pub mod error;
pub mod field;
pub mod sign;
pub mod transport;

pub use api::{Client, Endpoint};
pub use config::ClientConfig;
pub use credential::{Credential, CredentialStore};
pub use error::{Result, WechatError};

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;

    use crate::{endpoints::pay::DownloadBill, transport::HttpTransport};

    #[test]
    fn test_library_exports() {
        let store = CredentialStore::new();
        store.register([Credential::new("wx1", "secret", "key")]).unwrap();
        let client = Client::new(Arc::new(store), HttpTransport::new().unwrap());

        let mut call = client.call::<DownloadBill>();
        let err = call.set_app_id("missing").unwrap_err();
        assert!(matches!(err, WechatError::SecretNil));
        assert_eq!(<DownloadBill as Endpoint>::NAME, "pay.downloadbill");

        let result: Result<()> = Err(err);
        assert!(result.is_err());
        assert!(ClientConfig::default().credentials.is_empty());
    }
}
