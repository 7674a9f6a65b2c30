//! Wire encoding and decoding.
//!
//! Outbound, a [`FieldSet`] becomes either an XML document or form parameters,
//! as chosen by the endpoint's [`RequestFormat`]. Inbound, the endpoint's
//! [`ResponseFormat`] decides whether the body is parsed as XML (into a
//! [`FieldSet`], then a record) or decoded as JSON (directly into a record).
//! The codec never sniffs content to pick a format.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::{error::Result, field::FieldSet, transport::Payload};

pub mod form;
pub mod xml;

pub use form::{to_form, to_form_body};
pub use xml::{XML_ROOT, from_xml, to_xml};

/// Encoding of an outbound request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestFormat {
    /// `<xml><field>value</field>...</xml>` body.
    Xml,
    /// Form parameters (query string for GET, urlencoded body for POST).
    Form,
}

/// Encoding of an inbound reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseFormat {
    /// Flat XML document.
    Xml,
    /// JSON object.
    Json,
}

/// A decoded reply.
#[derive(Debug)]
pub struct Decoded<R> {
    /// The populated response record.
    pub record: R,
    /// The raw field set, for XML replies; used for signature verification.
    pub fields: Option<FieldSet>,
}

/// Encodes `fields` in the given request format. Empty fields are dropped.
#[must_use]
pub fn encode(fields: &FieldSet, format: RequestFormat) -> Payload {
    match format {
        RequestFormat::Xml => Payload::Xml(to_xml(fields).into_bytes()),
        RequestFormat::Form => Payload::Form(to_form(fields)),
    }
}

/// Decodes a reply body in the given response format.
///
/// # Errors
///
/// Returns [`XmlParse`](crate::error::WechatError::XmlParse) or
/// [`JsonDecode`](crate::error::WechatError::JsonDecode) for malformed bodies.
pub fn decode<R: DeserializeOwned>(body: &[u8], format: ResponseFormat) -> Result<Decoded<R>> {
    match format {
        ResponseFormat::Xml => {
            let fields = from_xml(body)?;
            let record = decode_fields(&fields)?;
            Ok(Decoded { record, fields: Some(fields) })
        }
        ResponseFormat::Json => Ok(Decoded { record: from_json(body)?, fields: None }),
    }
}

/// Decodes a JSON body into a record.
///
/// Unknown fields are ignored; fields missing from the body keep the record's
/// `#[serde(default)]` value.
///
/// # Errors
///
/// Returns [`JsonDecode`](crate::error::WechatError::JsonDecode) if the body is
/// not valid JSON for `R`.
pub fn from_json<R: DeserializeOwned>(body: &[u8]) -> Result<R> {
    Ok(serde_json::from_slice(body)?)
}

/// Populates a record from a field set by field name.
///
/// # Errors
///
/// Returns [`JsonDecode`](crate::error::WechatError::JsonDecode) if a field
/// cannot be assigned to the record's type.
pub fn decode_fields<R: DeserializeOwned>(fields: &FieldSet) -> Result<R> {
    Ok(serde_json::from_value(Value::Object(fields.to_json_object()))?)
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    use super::*;
    use crate::error::WechatError;

    #[derive(Debug, Default, Deserialize)]
    #[serde(default)]
    struct Reply {
        return_code: String,
        result_code: String,
        err_code: String,
    }

    #[derive(Debug, Default, Deserialize)]
    #[serde(default)]
    struct TokenReply {
        errcode: i64,
        access_token: String,
        expires_in: u64,
    }

    fn bill_fields() -> FieldSet {
        [("bill_date", "20140603"), ("mch_id", "100"), ("device_info", "")].into_iter().collect()
    }

    #[test]
    fn test_encode_xml() {
        let Payload::Xml(body) = encode(&bill_fields(), RequestFormat::Xml) else {
            unreachable!("expected XML payload");
        };
        assert_eq!(
            String::from_utf8(body).unwrap(),
            "<xml><bill_date>20140603</bill_date><mch_id>100</mch_id></xml>"
        );
    }

    #[test]
    fn test_encode_form() {
        let Payload::Form(pairs) = encode(&bill_fields(), RequestFormat::Form) else {
            unreachable!("expected form payload");
        };
        assert_eq!(
            pairs,
            vec![
                ("bill_date".to_owned(), "20140603".to_owned()),
                ("mch_id".to_owned(), "100".to_owned()),
            ]
        );
    }

    #[test]
    fn test_decode_xml_into_record() {
        let body = b"<xml><return_code>SUCCESS</return_code><result_code>SUCCESS</result_code>\
                     <unknown>x</unknown></xml>";
        let decoded: Decoded<Reply> = decode(body, ResponseFormat::Xml).unwrap();
        assert_eq!(decoded.record.return_code, "SUCCESS");
        assert_eq!(decoded.record.result_code, "SUCCESS");
        assert_eq!(decoded.record.err_code, "");
        assert_eq!(decoded.fields.unwrap().len(), 3);
    }

    #[test]
    fn test_decode_malformed_xml() {
        let body = b"<xml><return_code>SUCCESS</return_code>";
        let result: Result<Decoded<Reply>> = decode(body, ResponseFormat::Xml);
        assert!(matches!(result, Err(WechatError::XmlParse(_))));
    }

    #[test]
    fn test_decode_json_ignores_unknown_and_defaults_missing() {
        let body = br#"{"access_token":"TOKEN","scope":"snsapi_base"}"#;
        let decoded: Decoded<TokenReply> = decode(body, ResponseFormat::Json).unwrap();
        assert_eq!(decoded.record.access_token, "TOKEN");
        assert_eq!(decoded.record.errcode, 0);
        assert_eq!(decoded.record.expires_in, 0);
        assert!(decoded.fields.is_none());
    }

    #[test]
    fn test_decode_json_error() {
        let result: Result<Decoded<TokenReply>> = decode(b"<xml></xml>", ResponseFormat::Json);
        assert!(matches!(result, Err(WechatError::JsonDecode(_))));
    }

    #[test]
    fn test_decode_format_is_not_sniffed() {
        let body = br#"{"return_code":"SUCCESS"}"#;
        let result: Result<Decoded<Reply>> = decode(body, ResponseFormat::Xml);
        assert!(matches!(result, Err(WechatError::XmlParse(_))));
    }

    #[test]
    fn test_decode_fields_type_mismatch() {
        let fields: FieldSet = [("errcode", "not-a-number")].into_iter().collect();
        let result: Result<TokenReply> = decode_fields(&fields);
        assert!(matches!(result, Err(WechatError::JsonDecode(_))));
    }
}
