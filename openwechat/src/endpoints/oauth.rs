//! Open Platform web authorization.
//!
//! The flow is: send the user to [`web_authorize_url`], exchange the `code`
//! the provider redirects back with through [`AccessToken`], then read the
//! profile with [`UserInfo`].

use serde::{Deserialize, Serialize};
use url::form_urlencoded;

use crate::{
    api::{AuthScheme, Endpoint, Validate},
    codec::{RequestFormat, ResponseFormat},
    error::{Result, WechatError},
    field::{FieldValue, WireField, WireSchema},
    transport::HttpMethod,
};

/// Authorization page.
pub const AUTHORIZE_URL: &str = "https://open.weixin.qq.com/connect/oauth2/authorize";

/// Silent authorization: yields the openid only.
pub const SCOPE_BASE: &str = "snsapi_base";
/// Interactive authorization: also grants profile access.
pub const SCOPE_USERINFO: &str = "snsapi_userinfo";

/// Grant type of the code exchange.
pub const GRANT_AUTHORIZATION_CODE: &str = "authorization_code";

/// Builds the link that starts web authorization for `app_id`.
///
/// The application id doubles as `state`.
///
/// # Examples
///
/// ```
/// use openwechat::endpoints::oauth::{SCOPE_BASE, web_authorize_url};
///
/// let url = web_authorize_url("wx1", SCOPE_BASE, "https://shop.example/cb?from=menu");
/// assert_eq!(
///     url,
///     "https://open.weixin.qq.com/connect/oauth2/authorize?appid=wx1\
///      &redirect_uri=https%3A%2F%2Fshop.example%2Fcb%3Ffrom%3Dmenu&response_type=code\
///      &scope=snsapi_base&state=wx1#wechat_redirect"
/// );
/// ```
#[must_use]
pub fn web_authorize_url(app_id: &str, scope: &str, redirect_uri: &str) -> String {
    let query = form_urlencoded::Serializer::new(String::new())
        .append_pair("appid", app_id)
        .append_pair("redirect_uri", redirect_uri)
        .append_pair("response_type", "code")
        .append_pair("scope", scope)
        .append_pair("state", app_id)
        .finish();
    format!("{AUTHORIZE_URL}?{query}#wechat_redirect")
}

/// Exchanges an authorization code for an access token.
#[derive(Debug, Clone, Copy)]
pub struct AccessToken;

impl Endpoint for AccessToken {
    const NAME: &'static str = "sns.oauth2.access_token";
    const URL: &'static str = "https://api.weixin.qq.com/sns/oauth2/access_token";
    const METHOD: HttpMethod = HttpMethod::Get;
    const REQUEST_FORMAT: RequestFormat = RequestFormat::Form;
    const RESPONSE_FORMAT: ResponseFormat = ResponseFormat::Json;
    const AUTH: AuthScheme = AuthScheme::AppSecret;

    type Request = AccessTokenRequest;
    type Response = AccessTokenResponse;
}

/// Parameters of [`AccessToken`]; `appid` and `secret` are injected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccessTokenRequest {
    /// Code from the authorization redirect.
    pub code: String,
    /// Always `authorization_code`.
    pub grant_type: String,
}

impl AccessTokenRequest {
    /// Creates a request for `code` with the authorization-code grant.
    #[must_use]
    pub fn new(code: impl Into<String>) -> Self {
        Self { code: code.into(), grant_type: GRANT_AUTHORIZATION_CODE.to_owned() }
    }
}

impl WireSchema for AccessTokenRequest {
    const FIELDS: &'static [WireField<Self>] = &[
        WireField::named("code", |r: &Self| FieldValue::from(&r.code)),
        WireField::named("grant_type", |r: &Self| FieldValue::from(&r.grant_type)),
    ];
}

impl Validate for AccessTokenRequest {
    fn validate(&self) -> Result<()> {
        if self.grant_type.is_empty() {
            return Err(WechatError::Validation("grant_type can not be empty".to_owned()));
        }
        if self.code.is_empty() {
            return Err(WechatError::Validation("code can not be empty".to_owned()));
        }
        Ok(())
    }
}

/// Reply of [`AccessToken`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct AccessTokenResponse {
    /// Non-zero on failure.
    pub errcode: i64,
    /// Failure description.
    pub errmsg: String,
    /// Web access token.
    pub access_token: String,
    /// Token lifetime in seconds.
    pub expires_in: u64,
    /// Token used to renew `access_token`.
    pub refresh_token: String,
    /// User id within the application.
    pub openid: String,
    /// Granted scopes, comma-separated.
    pub scope: String,
    /// User id across the Open Platform account.
    pub unionid: String,
}

impl AccessTokenResponse {
    /// Returns true if the provider reported an error.
    #[must_use]
    pub const fn is_error(&self) -> bool {
        self.errcode != 0
    }
}

/// Reads the profile of an authorized user.
#[derive(Debug, Clone, Copy)]
pub struct UserInfo;

impl Endpoint for UserInfo {
    const NAME: &'static str = "sns.userinfo";
    const URL: &'static str = "https://api.weixin.qq.com/sns/userinfo";
    const METHOD: HttpMethod = HttpMethod::Get;
    const REQUEST_FORMAT: RequestFormat = RequestFormat::Form;
    const RESPONSE_FORMAT: ResponseFormat = ResponseFormat::Json;
    const AUTH: AuthScheme = AuthScheme::None;

    type Request = UserInfoRequest;
    type Response = UserInfoResponse;
}

/// Parameters of [`UserInfo`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserInfoRequest {
    /// Token from [`AccessToken`].
    pub access_token: String,
    /// User id from [`AccessToken`].
    pub openid: String,
    /// Profile language (`zh_CN`, `zh_TW`, `en`); optional.
    pub lang: String,
}

impl WireSchema for UserInfoRequest {
    const FIELDS: &'static [WireField<Self>] = &[
        WireField::named("access_token", |r: &Self| FieldValue::from(&r.access_token)),
        WireField::named("openid", |r: &Self| FieldValue::from(&r.openid)),
        WireField::named("lang", |r: &Self| FieldValue::from(&r.lang)),
    ];
}

impl Validate for UserInfoRequest {
    fn validate(&self) -> Result<()> {
        if self.access_token.is_empty() {
            return Err(WechatError::Validation("access_token can not be empty".to_owned()));
        }
        if self.openid.is_empty() {
            return Err(WechatError::Validation("openid can not be empty".to_owned()));
        }
        Ok(())
    }
}

/// Reply of [`UserInfo`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct UserInfoResponse {
    /// Non-zero on failure.
    pub errcode: i64,
    /// Failure description.
    pub errmsg: String,
    /// User id within the application.
    pub openid: String,
    /// Display name.
    pub nickname: String,
    /// 1 male, 2 female, 0 unknown.
    pub sex: i64,
    /// Province from the user profile.
    pub province: String,
    /// City from the user profile.
    pub city: String,
    /// Country from the user profile.
    pub country: String,
    /// Avatar URL; invalidated when the user changes avatar.
    pub headimgurl: String,
    /// Privileges, such as `chinaunicom`.
    pub privilege: Vec<String>,
    /// User id across the Open Platform account.
    pub unionid: String,
}

impl UserInfoResponse {
    /// Returns true if the provider reported an error.
    #[must_use]
    pub const fn is_error(&self) -> bool {
        self.errcode != 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{codec, field::project};

    #[test]
    fn test_authorize_url_encodes_redirect() {
        let url = web_authorize_url("wx1", SCOPE_USERINFO, "https://a.example/cb");
        assert!(url.starts_with(AUTHORIZE_URL));
        assert!(url.contains("redirect_uri=https%3A%2F%2Fa.example%2Fcb"));
        assert!(url.contains("scope=snsapi_userinfo"));
        assert!(url.contains("&state=wx1"));
        assert!(url.ends_with("#wechat_redirect"));
    }

    #[test]
    fn test_access_token_request_validation() {
        assert!(AccessTokenRequest::new("CODE").validate().is_ok());

        let missing_code = AccessTokenRequest::new("");
        assert_eq!(
            missing_code.validate().unwrap_err().to_string(),
            "invalid request: code can not be empty"
        );

        let missing_grant = AccessTokenRequest { code: "CODE".to_owned(), grant_type: String::new() };
        assert!(matches!(missing_grant.validate(), Err(WechatError::Validation(_))));
    }

    #[test]
    fn test_access_token_projection() {
        let fields = project(&AccessTokenRequest::new("CODE"));
        assert_eq!(
            codec::to_form(&fields),
            vec![
                ("code".to_owned(), "CODE".to_owned()),
                ("grant_type".to_owned(), "authorization_code".to_owned()),
            ]
        );
    }

    #[test]
    fn test_access_token_error_reply() {
        let reply: AccessTokenResponse =
            codec::from_json(br#"{"errcode":40029,"errmsg":"invalid code"}"#).unwrap();
        assert!(reply.is_error());
        assert_eq!(reply.errmsg, "invalid code");
        assert!(reply.access_token.is_empty());
    }

    #[test]
    fn test_user_info_request_validation() {
        let req = UserInfoRequest {
            access_token: "TOKEN".to_owned(),
            openid: String::new(),
            lang: String::new(),
        };
        assert_eq!(req.validate().unwrap_err().to_string(), "invalid request: openid can not be empty");
    }

    #[test]
    fn test_user_info_reply() {
        let body = br#"{
            "openid": "o1",
            "nickname": "Band",
            "sex": 1,
            "province": "Guangdong",
            "city": "Guangzhou",
            "country": "CN",
            "headimgurl": "https://thirdwx.qlogo.cn/0",
            "privilege": ["PRIVILEGE1", "PRIVILEGE2"],
            "unionid": "u1"
        }"#;
        let reply: UserInfoResponse = codec::from_json(body).unwrap();
        assert!(!reply.is_error());
        assert_eq!(reply.sex, 1);
        assert_eq!(reply.privilege, ["PRIVILEGE1", "PRIVILEGE2"]);
    }
}
