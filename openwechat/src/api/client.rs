//! Client and per-call state machine.

use std::{fmt, marker::PhantomData, sync::Arc};

use tracing::{Span, debug, info, instrument, trace};
use uuid::Uuid;

use super::{AuthScheme, Endpoint, OpaquePayload, Stage, Validate};
use crate::{
    codec,
    credential::{Credential, CredentialStore},
    error::{Result, WechatError},
    field::{FieldSet, FieldValue, WireField, WireSchema, project_merged},
    sign::{self, SIGN_FIELD, SignType},
    transport::{Payload, Transport},
};

const RETURN_CODE_FIELD: &str = "return_code";
const FAIL: &str = "FAIL";

/// Common parameters of signed calls.
struct SignedParams {
    app_id: String,
    nonce_str: String,
    sign_type: String,
}

impl WireSchema for SignedParams {
    const FIELDS: &'static [WireField<Self>] = &[
        WireField::tagged("app_id", "appid", |r: &Self| FieldValue::from(&r.app_id)),
        WireField::named("nonce_str", |r: &Self| FieldValue::from(&r.nonce_str)),
        WireField::named("sign_type", |r: &Self| FieldValue::from(&r.sign_type)),
    ];
}

impl SignedParams {
    fn new(app_id: &str, sign_type: SignType) -> Self {
        Self {
            app_id: app_id.to_owned(),
            nonce_str: Uuid::new_v4().simple().to_string(),
            // MD5 is the provider default and is left implicit.
            sign_type: match sign_type {
                SignType::Md5 => String::new(),
                SignType::HmacSha256 => sign_type.as_str().to_owned(),
            },
        }
    }
}

/// Common parameters of calls authenticated by application secret.
struct SecretParams {
    app_id: String,
    secret: String,
}

impl WireSchema for SecretParams {
    const FIELDS: &'static [WireField<Self>] = &[
        WireField::tagged("app_id", "appid", |r: &Self| FieldValue::from(&r.app_id)),
        WireField::named("secret", |r: &Self| FieldValue::from(&r.secret)),
    ];
}

/// Entry point for API calls.
///
/// Holds the shared credential store and the transport. A client is cheap to
/// share; every [`call`](Self::call) gets its own [`ApiCall`] state.
#[derive(Debug)]
pub struct Client<T> {
    store: Arc<CredentialStore>,
    transport: T,
}

impl<T: Transport> Client<T> {
    /// Creates a client over `store` and `transport`.
    #[must_use]
    pub fn new(store: Arc<CredentialStore>, transport: T) -> Self {
        Self { store, transport }
    }

    /// Returns the credential store.
    #[must_use]
    pub fn store(&self) -> &Arc<CredentialStore> {
        &self.store
    }

    /// Returns the transport.
    #[must_use]
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Starts a call to endpoint `E`.
    #[must_use]
    pub fn call<E: Endpoint>(&self) -> ApiCall<'_, T, E> {
        ApiCall {
            client: self,
            stage: Stage::Idle,
            failed: false,
            app_id: None,
            request: None,
            endpoint: PhantomData,
        }
    }
}

/// One in-flight invocation of endpoint `E`.
///
/// Steps must be taken in order: [`set_app_id`](Self::set_app_id),
/// [`set_request`](Self::set_request), then [`run`](Self::run) or
/// [`run_opaque`](Self::run_opaque). The first failed step ends the call at
/// the stage it had reached; every later step returns
/// [`WechatError::CallFailed`].
pub struct ApiCall<'c, T, E: Endpoint> {
    client: &'c Client<T>,
    stage: Stage,
    failed: bool,
    app_id: Option<String>,
    request: Option<E::Request>,
    endpoint: PhantomData<fn() -> E>,
}

impl<T, E: Endpoint> fmt::Debug for ApiCall<'_, T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiCall")
            .field("endpoint", &E::NAME)
            .field("stage", &self.stage)
            .field("failed", &self.failed)
            .field("app_id", &self.app_id)
            .field("has_request", &self.request.is_some())
            .finish_non_exhaustive()
    }
}

impl<T: Transport, E: Endpoint> ApiCall<'_, T, E> {
    /// Returns the stage reached so far.
    #[must_use]
    pub const fn stage(&self) -> Stage {
        self.stage
    }

    /// Returns true once a step has failed.
    #[must_use]
    pub const fn is_failed(&self) -> bool {
        self.failed
    }

    /// Selects the calling application.
    ///
    /// # Errors
    ///
    /// - [`WechatError::CallFailed`] if an earlier step failed
    /// - [`WechatError::AppIdNil`] if `app_id` is empty
    /// - [`WechatError::SecretNil`] if no credential is registered for it
    /// - [`WechatError::InvalidCredential`] if the endpoint is signed and the
    ///   credential has no signing key
    pub fn set_app_id(&mut self, app_id: impl Into<String>) -> Result<&mut Self> {
        self.ensure_live()?;
        let app_id = app_id.into();
        let outcome = self.accept_app_id(app_id);
        self.settle(outcome)?;
        Ok(self)
    }

    /// Attaches the request record after validating it.
    ///
    /// # Errors
    ///
    /// Returns [`WechatError::CallFailed`] if an earlier step failed,
    /// [`WechatError::AppIdNil`] if no application id was accepted yet,
    /// otherwise whatever the record's [`Validate::validate`] returns, unchanged.
    pub fn set_request(&mut self, request: E::Request) -> Result<&mut Self> {
        self.ensure_live()?;
        let outcome = self.accept_request(request);
        self.settle(outcome)?;
        Ok(self)
    }

    fn accept_app_id(&mut self, app_id: String) -> Result<()> {
        if app_id.is_empty() {
            return Err(WechatError::AppIdNil);
        }
        self.advance(Stage::ApplicationIdSet);
        resolve_credential::<E>(&self.client.store, &app_id)?;
        self.app_id = Some(app_id);
        self.advance(Stage::CredentialResolved);
        Ok(())
    }

    fn accept_request(&mut self, request: E::Request) -> Result<()> {
        if self.app_id.is_none() {
            return Err(WechatError::AppIdNil);
        }
        request.validate()?;
        self.request = Some(request);
        self.advance(Stage::RequestValidated);
        Ok(())
    }

    fn ensure_live(&self) -> Result<()> {
        if self.failed { Err(WechatError::CallFailed(self.stage)) } else { Ok(()) }
    }

    /// Ends the call if `outcome` is an error.
    fn settle(&mut self, outcome: Result<()>) -> Result<()> {
        if let Err(err) = &outcome {
            self.failed = true;
            debug!(endpoint = E::NAME, stage = %self.stage, error = %err, "call failed");
        }
        outcome
    }

    /// Performs the call and decodes the reply into `E::Response`.
    ///
    /// # Errors
    ///
    /// Returns [`WechatError::CallFailed`] if an earlier step failed, otherwise
    /// the first error raised by credential resolution, the transport,
    /// decoding or reply verification. Nothing is retried.
    #[instrument(skip_all, fields(endpoint = E::NAME, app_id))]
    pub async fn run(mut self) -> Result<E::Response> {
        let (credential, payload) = self.prepare()?;
        let body = self.send(payload).await?;

        let decoded = codec::decode::<E::Response>(&body, E::RESPONSE_FORMAT)?;
        if let Some(fields) = &decoded.fields {
            verify_reply::<E>(fields, &credential)?;
        }
        self.advance(Stage::Decoded);

        self.finish();
        Ok(decoded.record)
    }

    /// Performs a call whose success reply is an opaque byte payload.
    ///
    /// The body is first parsed as flat XML. If that yields a record with a
    /// structured error indicator, the record is returned as is. Otherwise the
    /// whole raw body becomes the record's payload.
    ///
    /// # Errors
    ///
    /// Returns [`WechatError::CallFailed`] if an earlier step failed, otherwise
    /// the first error raised by credential resolution or the transport. A
    /// body that is not XML is not an error.
    #[instrument(skip_all, fields(endpoint = E::NAME, app_id))]
    pub async fn run_opaque(mut self) -> Result<E::Response>
    where
        E::Response: OpaquePayload,
    {
        let (credential, payload) = self.prepare()?;
        let body = self.send(payload).await?;

        let structured = match codec::from_xml(&body) {
            Ok(fields) => match codec::decode_fields::<E::Response>(&fields) {
                Ok(record) if record.has_error() => Some((record, fields)),
                _ => None,
            },
            Err(_) => None,
        };

        let response = if let Some((record, fields)) = structured {
            debug!("reply carries an error indicator");
            verify_reply::<E>(&fields, &credential)?;
            record
        } else {
            let mut record = E::Response::default();
            record.set_payload(body);
            record
        };
        self.advance(Stage::Decoded);

        self.finish();
        Ok(response)
    }

    /// Resolves the credential and builds the signed, encoded payload.
    fn prepare(&mut self) -> Result<(Credential, Payload)> {
        self.ensure_live()?;
        let app_id = self.app_id.clone().ok_or(WechatError::AppIdNil)?;
        Span::current().record("app_id", app_id.as_str());

        let credential = resolve_credential::<E>(&self.client.store, &app_id)?;
        let request = self
            .request
            .as_ref()
            .ok_or_else(|| WechatError::Validation("request content not set".to_owned()))?;
        info!(url = E::URL, "calling endpoint");

        let fields = build_fields::<E>(request, &credential);
        self.advance(Stage::FieldsProjected);
        self.advance(Stage::Signed);

        let payload = codec::encode(&fields, E::REQUEST_FORMAT);
        self.advance(Stage::Serialized);
        Ok((credential, payload))
    }

    async fn send(&mut self, payload: Payload) -> Result<Vec<u8>> {
        let body = self.client.transport.execute(E::METHOD, E::URL, payload).await?;
        debug!(
            protocol = self.client.transport.protocol_name(),
            bytes = body.len(),
            "reply received"
        );
        self.advance(Stage::Sent);
        Ok(body)
    }

    fn finish(&mut self) {
        self.advance(Stage::Done);
        info!("call completed");
    }

    fn advance(&mut self, stage: Stage) {
        self.stage = stage;
        trace!(endpoint = E::NAME, stage = %stage, "stage reached");
    }
}

/// Looks up the credential for `app_id` and checks it covers `E`'s auth scheme.
fn resolve_credential<E: Endpoint>(store: &CredentialStore, app_id: &str) -> Result<Credential> {
    let credential = store.lookup(app_id);
    if credential.is_empty() {
        debug!(endpoint = E::NAME, app_id, "no credential registered");
        return Err(WechatError::SecretNil);
    }
    if E::AUTH == AuthScheme::Signed && credential.sign_key.is_empty() {
        return Err(WechatError::InvalidCredential(format!(
            "{app_id} has no sign_key for signed endpoint {}",
            E::NAME
        )));
    }
    Ok(credential)
}

/// Projects the request and injects the fields its auth scheme requires.
///
/// Injected fields are merged after the request's own, so they win on
/// collision.
fn build_fields<E: Endpoint>(request: &E::Request, credential: &Credential) -> FieldSet {
    match E::AUTH {
        AuthScheme::Signed => {
            let common = SignedParams::new(&credential.app_id, E::SIGN_TYPE);
            let mut fields = project_merged(request, &common);
            let signature = sign::sign_with(&fields, &credential.sign_key, E::SIGN_TYPE);
            fields.insert(SIGN_FIELD, signature.into_string());
            fields
        }
        AuthScheme::AppSecret => {
            let common = SecretParams {
                app_id: credential.app_id.clone(),
                secret: credential.app_secret.clone(),
            };
            project_merged(request, &common)
        }
        AuthScheme::None => project_merged(request, &()),
    }
}

/// Applies the endpoint's reply verification policy to an XML reply.
fn verify_reply<E: Endpoint>(fields: &FieldSet, credential: &Credential) -> Result<()> {
    if !E::VERIFY_RESPONSE {
        return Ok(());
    }
    if fields.get_str(RETURN_CODE_FIELD).as_deref() == Some(FAIL) {
        debug!("failure reply accepted without signature");
        return Ok(());
    }
    if sign::verify_with(fields, &credential.sign_key, E::SIGN_TYPE) {
        Ok(())
    } else {
        Err(WechatError::VerifySign)
    }
}
