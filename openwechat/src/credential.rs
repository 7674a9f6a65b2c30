//! Registered application credentials.
//!
//! A [`CredentialStore`] maps an application id to its secret material. It is
//! built once at startup, shared behind an [`Arc`](std::sync::Arc) and read by
//! every call afterwards.

use std::{
    collections::HashMap,
    fmt,
    sync::{PoisonError, RwLock},
};

use crate::error::{Result, WechatError};

/// Secret material for one application.
///
/// `app_secret` authenticates Open Platform calls; `sign_key` is the merchant
/// API key used only inside the signature digest.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credential {
    /// Public application id (`appid`).
    pub app_id: String,
    /// Application secret (`secret`).
    pub app_secret: String,
    /// Merchant API key for request signatures.
    pub sign_key: String,
    /// PEM-encoded client certificate and private key, for certificate-protected endpoints.
    pub certificate: Option<Vec<u8>>,
}

impl Credential {
    /// Creates a credential without a client certificate.
    #[must_use]
    pub fn new(
        app_id: impl Into<String>,
        app_secret: impl Into<String>,
        sign_key: impl Into<String>,
    ) -> Self {
        Self {
            app_id: app_id.into(),
            app_secret: app_secret.into(),
            sign_key: sign_key.into(),
            certificate: None,
        }
    }

    /// Attaches a PEM client certificate.
    #[must_use]
    pub fn with_certificate(mut self, pem: Vec<u8>) -> Self {
        self.certificate = Some(pem);
        self
    }

    /// Returns true for the zero-value sentinel returned by
    /// [`CredentialStore::lookup`] when nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.app_id.is_empty()
            && self.app_secret.is_empty()
            && self.sign_key.is_empty()
            && self.certificate.is_none()
    }

    fn validate(&self) -> Result<()> {
        if self.app_id.is_empty() {
            return Err(WechatError::InvalidCredential("app_id can not be empty".to_owned()));
        }
        if self.app_secret.is_empty() {
            return Err(WechatError::InvalidCredential("app_secret can not be empty".to_owned()));
        }
        Ok(())
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("app_id", &self.app_id)
            .field("app_secret", &"<redacted>")
            .field("sign_key", &"<redacted>")
            .field("certificate", &self.certificate.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Concurrency-safe registry of application credentials.
///
/// Registration and lookup both take `&self`. Overwriting an existing
/// application id is last-writer-wins; concurrent writers to the same key have
/// no ordering guarantee.
#[derive(Debug, Default)]
pub struct CredentialStore {
    entries: RwLock<HashMap<String, Credential>>,
}

impl CredentialStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers one or more credentials, overwriting entries with the same app id.
    ///
    /// Credentials are validated and stored one at a time, so entries that
    /// precede an invalid one stay registered.
    ///
    /// # Errors
    ///
    /// Returns [`WechatError::InvalidCredential`] if no credential is supplied or
    /// any credential has an empty `app_id` or `app_secret`.
    ///
    /// # Examples
    ///
    /// ```
    /// use openwechat::credential::{Credential, CredentialStore};
    ///
    /// let store = CredentialStore::new();
    /// store.register([Credential::new("wx123", "secret", "key")]).unwrap();
    /// assert_eq!(store.lookup("wx123").sign_key, "key");
    /// assert!(store.lookup("unknown").is_empty());
    /// ```
    pub fn register(&self, credentials: impl IntoIterator<Item = Credential>) -> Result<()> {
        let mut supplied = false;
        for credential in credentials {
            supplied = true;
            credential.validate()?;
            tracing::debug!(app_id = %credential.app_id, "registering credential");
            self.entries
                .write()
                .unwrap_or_else(PoisonError::into_inner)
                .insert(credential.app_id.clone(), credential);
        }

        if !supplied {
            return Err(WechatError::InvalidCredential("no credential supplied".to_owned()));
        }
        Ok(())
    }

    /// Returns the credential for `app_id`, or the zero-value sentinel if absent.
    #[must_use]
    pub fn lookup(&self, app_id: &str) -> Credential {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(app_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Returns the number of registered applications.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Returns true if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
