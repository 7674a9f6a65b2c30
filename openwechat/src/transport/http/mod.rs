//! reqwest-backed [`Transport`].

use std::sync::LazyLock;

use reqwest::{Client, ClientBuilder, Identity, RequestBuilder, header::CONTENT_TYPE};
use tracing::{debug, instrument};
use url::Url;

use super::config::{HttpConfig, HttpVersion};
use crate::{
    error::{Result, WechatError},
    transport::{HttpMethod, Payload, Transport},
};

/// Pool shared by every transport built with [`HttpTransport::new`].
#[allow(clippy::expect_used, reason = "builder without TLS identity cannot fail")]
static SHARED_CLIENT: LazyLock<Client> = LazyLock::new(|| {
    builder(&HttpConfig::default()).build().expect("default reqwest client must build")
});

fn builder(config: &HttpConfig) -> ClientBuilder {
    let builder = Client::builder()
        .pool_max_idle_per_host(config.pool_max_idle_per_host)
        .timeout(config.timeout())
        .connect_timeout(config.connect_timeout());

    match config.http_version {
        HttpVersion::Http1 => builder.http1_only(),
        HttpVersion::Http2 => builder.http2_prior_knowledge(),
        HttpVersion::Auto => builder,
    }
}

/// Accepts only `https://` URLs that name a host.
fn parse_endpoint_url(url: &str) -> Result<Url> {
    let parsed =
        Url::parse(url).map_err(|e| WechatError::TransportError(format!("invalid URL {url}: {e}")))?;

    if parsed.scheme() != "https" {
        return Err(WechatError::TransportError(format!("refusing non-HTTPS URL {url}")));
    }
    if parsed.host_str().is_none_or(str::is_empty) {
        return Err(WechatError::TransportError(format!("URL has no host: {url}")));
    }
    Ok(parsed)
}

/// Sends provider requests over HTTPS.
///
/// GET carries form pairs in the query string; POST carries them as an
/// urlencoded body, or sends an XML document verbatim.
///
/// ```
/// use openwechat::transport::{HttpTransport, Transport};
///
/// let transport = HttpTransport::new().unwrap();
/// assert_eq!(transport.protocol_name(), "http");
/// ```
#[derive(Debug)]
pub struct HttpTransport {
    client: Client,
    version: HttpVersion,
}

impl HttpTransport {
    /// Uses the process-wide pooled client with [`HttpConfig::default`] settings.
    ///
    /// # Errors
    ///
    /// Never fails; the `Result` matches the other constructors.
    pub fn new() -> Result<Self> {
        Ok(Self { client: SHARED_CLIENT.clone(), version: HttpVersion::Auto })
    }

    /// Builds a dedicated client from `config`.
    ///
    /// # Errors
    ///
    /// Returns [`WechatError::HttpError`] if reqwest rejects the settings.
    ///
    /// ```
    /// use openwechat::transport::{HttpConfig, HttpTransport, HttpVersion};
    ///
    /// let config = HttpConfig { timeout_secs: 60, http_version: HttpVersion::Http1, ..Default::default() };
    /// let transport = HttpTransport::with_config(&config).unwrap();
    /// ```
    pub fn with_config(config: &HttpConfig) -> Result<Self> {
        Ok(Self { client: builder(config).build()?, version: config.http_version })
    }

    /// Builds a client that presents the merchant certificate.
    ///
    /// Refunds and some bill downloads require mutual TLS. `pem` holds the
    /// certificate chain followed by its private key.
    ///
    /// # Errors
    ///
    /// Returns [`WechatError::HttpError`] if the PEM does not parse or the
    /// client cannot be built.
    pub fn with_identity(config: &HttpConfig, pem: &[u8]) -> Result<Self> {
        let identity = Identity::from_pem(pem)?;
        Ok(Self { client: builder(config).identity(identity).build()?, version: config.http_version })
    }

    fn request(&self, method: HttpMethod, url: Url, payload: Payload) -> Result<RequestBuilder> {
        let content_type = payload.content_type();
        Ok(match (method, payload) {
            (HttpMethod::Get, Payload::Form(pairs)) => self.client.get(url).query(&pairs),
            (HttpMethod::Post, Payload::Form(pairs)) => self.client.post(url).form(&pairs),
            (HttpMethod::Post, Payload::Xml(body)) => {
                self.client.post(url).header(CONTENT_TYPE, content_type).body(body)
            }
            (HttpMethod::Get, Payload::Xml(_)) => {
                return Err(WechatError::TransportError("an XML body needs POST".to_owned()));
            }
        })
    }
}

impl Transport for HttpTransport {
    #[instrument(skip(self, payload), fields(method = method.as_str(), protocol = self.version.as_str()))]
    async fn execute<'a>(
        &'a self,
        method: HttpMethod,
        url: &'a str,
        payload: Payload,
    ) -> Result<Vec<u8>> {
        let url = parse_endpoint_url(url)?;
        let response = self.request(method, url, payload)?.send().await?;

        let status = response.status();
        debug!(status = status.as_u16(), "provider answered");
        if !status.is_success() {
            return Err(WechatError::TransportError(format!("provider returned HTTP {status}")));
        }
        Ok(response.bytes().await?.to_vec())
    }

    fn protocol_name(&self) -> &'static str {
        self.version.as_str()
    }
}
