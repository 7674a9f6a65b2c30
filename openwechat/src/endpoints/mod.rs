//! Bundled endpoint definitions.
//!
//! Each endpoint is a unit type implementing [`Endpoint`]; custom endpoints are
//! declared the same way outside this crate.

use crate::{
    api::{AuthScheme, Endpoint},
    transport::HttpMethod,
};

pub mod oauth;
pub mod pay;

/// Listing entry for one endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApiInfo {
    /// Endpoint identifier.
    pub name: &'static str,
    /// Absolute URL.
    pub url: &'static str,
    /// HTTP method.
    pub method: HttpMethod,
    /// Authentication scheme.
    pub auth: AuthScheme,
}

impl ApiInfo {
    /// Describes endpoint `E`.
    #[must_use]
    pub const fn of<E: Endpoint>() -> Self {
        Self { name: E::NAME, url: E::URL, method: E::METHOD, auth: E::AUTH }
    }
}

const SUPPORTED: &[ApiInfo] = &[
    ApiInfo::of::<pay::DownloadBill>(),
    ApiInfo::of::<oauth::AccessToken>(),
    ApiInfo::of::<oauth::UserInfo>(),
];

/// Returns every endpoint bundled with this crate.
#[must_use]
pub const fn supported_apis() -> &'static [ApiInfo] {
    SUPPORTED
}
