//! Client configuration loaded from TOML.
//!
//! ```toml
//! [http]
//! timeout_secs = 30
//!
//! [[credentials]]
//! app_id = "wx123"
//! app_secret = "app-secret"
//! sign_key = "merchant-key"
//! certificate_path = "/etc/wechat/apiclient.pem"
//! ```

use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::Deserialize;
use tracing::debug;

use crate::{
    credential::{Credential, CredentialStore},
    error::{Result, WechatError},
    transport::HttpConfig,
};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
    /// HTTP transport settings.
    #[serde(default)]
    pub http: HttpConfig,
    /// Registered applications.
    #[serde(default)]
    pub credentials: Vec<CredentialConfig>,
}

/// One `[[credentials]]` entry.
#[derive(Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct CredentialConfig {
    /// Application id.
    pub app_id: String,
    /// Application secret.
    pub app_secret: String,
    /// Merchant API key; only needed for signed endpoints.
    #[serde(default)]
    pub sign_key: String,
    /// PEM with the merchant client certificate and key.
    #[serde(default)]
    pub certificate_path: Option<PathBuf>,
}

impl std::fmt::Debug for CredentialConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialConfig")
            .field("app_id", &self.app_id)
            .field("app_secret", &"<redacted>")
            .field("sign_key", &"<redacted>")
            .field("certificate_path", &self.certificate_path)
            .finish()
    }
}

impl ClientConfig {
    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`WechatError::Config`] if the document does not parse or fails
    /// [`validate`](Self::validate).
    ///
    /// # Examples
    ///
    /// ```
    /// use openwechat::config::ClientConfig;
    ///
    /// let config = ClientConfig::from_toml(
    ///     r#"
    ///     [[credentials]]
    ///     app_id = "wx1"
    ///     app_secret = "secret"
    ///     "#,
    /// )
    /// .unwrap();
    /// assert_eq!(config.credentials.len(), 1);
    /// assert_eq!(config.http.timeout_secs, 30);
    /// ```
    pub fn from_toml(text: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(text).map_err(|e| WechatError::Config(format!("parse error: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`WechatError::Config`] if the file cannot be read or is invalid.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!(path = %path.display(), "loading configuration");
        let text = fs::read_to_string(path)
            .map_err(|e| WechatError::Config(format!("cannot read {}: {e}", path.display())))?;
        Self::from_toml(&text)
    }

    /// Checks HTTP bounds and that every credential names its app id and secret.
    ///
    /// # Errors
    ///
    /// Returns [`WechatError::Config`] describing the first problem found.
    pub fn validate(&self) -> Result<()> {
        self.http.validate()?;
        for (index, credential) in self.credentials.iter().enumerate() {
            if credential.app_id.is_empty() {
                return Err(WechatError::Config(format!(
                    "credentials[{index}]: app_id can not be empty"
                )));
            }
            if credential.app_secret.is_empty() {
                return Err(WechatError::Config(format!(
                    "credentials[{index}] ({}): app_secret can not be empty",
                    credential.app_id
                )));
            }
        }
        Ok(())
    }

    /// Builds a credential store from the configured credentials.
    ///
    /// Certificate files are read at this point.
    ///
    /// # Errors
    ///
    /// Returns [`WechatError::Config`] if a certificate cannot be read, or
    /// [`WechatError::InvalidCredential`] if no credential is configured.
    pub fn into_store(self) -> Result<CredentialStore> {
        let credentials = self
            .credentials
            .into_iter()
            .map(CredentialConfig::into_credential)
            .collect::<Result<Vec<_>>>()?;

        let store = CredentialStore::new();
        store.register(credentials)?;
        Ok(store)
    }
}

impl CredentialConfig {
    fn into_credential(self) -> Result<Credential> {
        let mut credential = Credential::new(self.app_id, self.app_secret, self.sign_key);
        if let Some(path) = self.certificate_path {
            let pem = fs::read(&path).map_err(|e| {
                WechatError::Config(format!("cannot read certificate {}: {e}", path.display()))
            })?;
            credential = credential.with_certificate(pem);
        }
        Ok(credential)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;

    const SAMPLE: &str = r#"
        [http]
        timeout_secs = 45
        http_version = "http1"

        [[credentials]]
        app_id = "wx1"
        app_secret = "secret1"
        sign_key = "key1"

        [[credentials]]
        app_id = "wx2"
        app_secret = "secret2"
    "#;

    #[test]
    fn test_from_toml() {
        let config = ClientConfig::from_toml(SAMPLE).unwrap();
        assert_eq!(config.http.timeout_secs, 45);
        assert_eq!(config.credentials.len(), 2);
        assert_eq!(config.credentials[0].sign_key, "key1");
        assert_eq!(config.credentials[1].sign_key, "");
        assert!(config.credentials[1].certificate_path.is_none());
    }

    #[test]
    fn test_from_toml_empty() {
        let config = ClientConfig::from_toml("").unwrap();
        assert_eq!(config, ClientConfig::default());
    }

    #[test]
    fn test_from_toml_syntax_error() {
        let result = ClientConfig::from_toml("[[credentials]\napp_id = ");
        assert!(matches!(result, Err(WechatError::Config(_))));
    }

    #[test]
    fn test_from_toml_unknown_key() {
        let result = ClientConfig::from_toml("[[credentials]]\napp_id = \"wx\"\nappsecret = \"s\"");
        assert!(matches!(result, Err(WechatError::Config(_))));
    }

    #[test]
    fn test_validate_empty_secret() {
        let result = ClientConfig::from_toml(
            "[[credentials]]\napp_id = \"wx1\"\napp_secret = \"\"",
        );
        let err = result.unwrap_err();
        assert!(err.to_string().contains("app_secret can not be empty"));
    }

    #[test]
    fn test_validate_http_bounds() {
        let result = ClientConfig::from_toml("[http]\ntimeout_secs = 0");
        assert!(matches!(result, Err(WechatError::Config(_))));
    }

    #[test]
    fn test_into_store() {
        let store = ClientConfig::from_toml(SAMPLE).unwrap().into_store().unwrap();
        assert_eq!(store.len(), 2);
        assert_eq!(store.lookup("wx1").sign_key, "key1");
    }

    #[test]
    fn test_into_store_without_credentials() {
        let result = ClientConfig::default().into_store();
        assert!(matches!(result, Err(WechatError::InvalidCredential(_))));
    }

    #[test]
    fn test_certificate_is_loaded() {
        let mut pem = NamedTempFile::new().unwrap();
        pem.write_all(b"-----BEGIN CERTIFICATE-----\n").unwrap();

        let text = format!(
            "[[credentials]]\napp_id = \"wx1\"\napp_secret = \"s\"\ncertificate_path = {:?}\n",
            pem.path().display().to_string()
        );
        let store = ClientConfig::from_toml(&text).unwrap().into_store().unwrap();
        assert_eq!(
            store.lookup("wx1").certificate.as_deref(),
            Some(b"-----BEGIN CERTIFICATE-----\n".as_slice())
        );
    }

    #[test]
    fn test_missing_certificate() {
        let text = "[[credentials]]\napp_id = \"wx1\"\napp_secret = \"s\"\n\
                    certificate_path = \"/nonexistent/apiclient.pem\"\n";
        let result = ClientConfig::from_toml(text).unwrap().into_store();
        assert!(matches!(result, Err(WechatError::Config(_))));
    }

    #[test]
    fn test_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();
        let config = ClientConfig::from_file(file.path()).unwrap();
        assert_eq!(config.credentials[0].app_id, "wx1");

        let missing = ClientConfig::from_file("/nonexistent/openwechat.toml");
        assert!(matches!(missing, Err(WechatError::Config(_))));
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = ClientConfig::from_toml(SAMPLE).unwrap();
        let debug_str = format!("{config:?}");
        assert!(debug_str.contains("wx1"));
        assert!(!debug_str.contains("secret1"));
        assert!(!debug_str.contains("key1"));
    }
}
