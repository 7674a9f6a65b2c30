//! WeChat Pay merchant endpoints.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{
    api::{AuthScheme, Endpoint, OpaquePayload, Validate},
    codec::{RequestFormat, ResponseFormat},
    error::{Result, WechatError},
    field::{FieldValue, WireField, WireSchema},
    transport::HttpMethod,
};

/// Bill download.
///
/// Bills are generated from 9:00 the next day and kept for three months. On
/// success the reply body is the bill itself (CSV text, or a gzip archive when
/// `tar_type = GZIP`); on failure it is a flat XML error document.
#[derive(Debug, Clone, Copy)]
pub struct DownloadBill;

impl Endpoint for DownloadBill {
    const NAME: &'static str = "pay.downloadbill";
    const URL: &'static str = "https://api.mch.weixin.qq.com/pay/downloadbill";
    const METHOD: HttpMethod = HttpMethod::Post;
    const REQUEST_FORMAT: RequestFormat = RequestFormat::Xml;
    const RESPONSE_FORMAT: ResponseFormat = ResponseFormat::Xml;
    const AUTH: AuthScheme = AuthScheme::Signed;

    type Request = DownloadBillRequest;
    type Response = DownloadBillResponse;
}

/// Which orders a bill lists.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BillType {
    /// Every order of the day.
    #[default]
    All,
    /// Paid orders.
    Success,
    /// Refunded orders.
    Refund,
    /// Recharge refunds, with the extra fee-return column.
    RechargeRefund,
}

impl BillType {
    /// Returns the wire value.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::All => "ALL",
            Self::Success => "SUCCESS",
            Self::Refund => "REFUND",
            Self::RechargeRefund => "RECHARGE_REFUND",
        }
    }
}

impl fmt::Display for BillType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for BillType {
    type Err = WechatError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "ALL" => Ok(Self::All),
            "SUCCESS" => Ok(Self::Success),
            "REFUND" => Ok(Self::Refund),
            "RECHARGE_REFUND" => Ok(Self::RechargeRefund),
            other => Err(WechatError::Validation(format!("unknown bill_type: {other}"))),
        }
    }
}

/// Only accepted `tar_type`.
pub const TAR_TYPE_GZIP: &str = "GZIP";

/// Parameters of [`DownloadBill`].
///
/// `appid`, `nonce_str` and `sign` are injected by the invoker.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DownloadBillRequest {
    /// Merchant id.
    pub mch_id: String,
    /// Random string; overwritten by the invoker.
    pub nonce_str: String,
    /// Sub-merchant application id (service providers only).
    pub sub_appid: String,
    /// Sub-merchant id (service providers only).
    pub sub_mch_id: String,
    /// Restricts the bill to one device.
    pub device_info: String,
    /// Bill date, `YYYYMMDD`.
    pub bill_date: String,
    /// Which orders to list; the provider defaults to all.
    pub bill_type: Option<BillType>,
    /// `GZIP` for a compressed bill; empty for plain text.
    pub tar_type: String,
}

impl WireSchema for DownloadBillRequest {
    const FIELDS: &'static [WireField<Self>] = &[
        WireField::named("mch_id", |r: &Self| FieldValue::from(&r.mch_id)),
        WireField::named("nonce_str", |r: &Self| FieldValue::from(&r.nonce_str)),
        WireField::named("sub_appid", |r: &Self| FieldValue::from(&r.sub_appid)),
        WireField::named("sub_mch_id", |r: &Self| FieldValue::from(&r.sub_mch_id)),
        WireField::named("device_info", |r: &Self| FieldValue::from(&r.device_info)),
        WireField::named("bill_date", |r: &Self| FieldValue::from(&r.bill_date)),
        WireField::named("bill_type", |r: &Self| {
            FieldValue::from(r.bill_type.map_or("", |bill_type| bill_type.as_str()))
        }),
        WireField::named("tar_type", |r: &Self| FieldValue::from(&r.tar_type)),
    ];
}

impl Validate for DownloadBillRequest {
    fn validate(&self) -> Result<()> {
        if self.mch_id.is_empty() {
            return Err(WechatError::Validation("mch_id can not be empty".to_owned()));
        }
        if !self.tar_type.is_empty() && self.tar_type != TAR_TYPE_GZIP {
            return Err(WechatError::Validation("tar_type must be GZIP".to_owned()));
        }
        if self.bill_date.is_empty() {
            return Err(WechatError::Validation("bill_date can not be empty".to_owned()));
        }
        Ok(())
    }
}

/// Status block shared by merchant replies.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ReturnStatus {
    /// `SUCCESS` or `FAIL` at the communication level.
    pub return_code: String,
    /// Reason for a communication failure.
    pub return_msg: String,
    /// `SUCCESS` or `FAIL` at the business level.
    pub result_code: String,
    /// Business error code.
    pub err_code: String,
    /// Business error description.
    pub err_code_des: String,
}

impl ReturnStatus {
    /// Returns true if the provider reported an error.
    #[must_use]
    pub fn is_error(&self) -> bool {
        !self.return_code.is_empty() || !self.err_code.is_empty()
    }
}

/// Reply of [`DownloadBill`].
///
/// Exactly one of `status` and `data` is populated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct DownloadBillResponse {
    /// Error reply, when the provider refused.
    #[serde(flatten)]
    pub status: ReturnStatus,
    /// Raw bill body.
    #[serde(skip)]
    pub data: Vec<u8>,
}

impl OpaquePayload for DownloadBillResponse {
    fn has_error(&self) -> bool {
        self.status.is_error()
    }

    fn set_payload(&mut self, data: Vec<u8>) {
        self.data = data;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{codec, field::project};

    fn request() -> DownloadBillRequest {
        DownloadBillRequest {
            mch_id: "100".to_owned(),
            bill_date: "20140603".to_owned(),
            ..Default::default()
        }
    }

    #[test]
    fn test_validate_ok() {
        assert!(request().validate().is_ok());
        let gzip = DownloadBillRequest { tar_type: "GZIP".to_owned(), ..request() };
        assert!(gzip.validate().is_ok());
    }

    #[test]
    fn test_validate_missing_mch_id() {
        let req = DownloadBillRequest { mch_id: String::new(), ..request() };
        let err = req.validate().unwrap_err();
        assert_eq!(err.to_string(), "invalid request: mch_id can not be empty");
    }

    #[test]
    fn test_validate_missing_bill_date() {
        let req = DownloadBillRequest { bill_date: String::new(), ..request() };
        assert!(matches!(req.validate(), Err(WechatError::Validation(_))));
    }

    #[test]
    fn test_validate_tar_type() {
        let req = DownloadBillRequest { tar_type: "ZIP".to_owned(), ..request() };
        let err = req.validate().unwrap_err();
        assert!(err.to_string().contains("tar_type must be GZIP"));
    }

    #[test]
    fn test_projection_uses_wire_names() {
        let req = DownloadBillRequest { bill_type: Some(BillType::Refund), ..request() };
        let fields = project(&req);
        assert_eq!(fields.len(), 8);
        assert_eq!(fields.get_str("bill_type").as_deref(), Some("REFUND"));
        assert_eq!(
            codec::to_xml(&fields),
            "<xml><bill_date>20140603</bill_date><bill_type>REFUND</bill_type>\
             <mch_id>100</mch_id></xml>"
        );
    }

    #[test]
    fn test_bill_type_parse() {
        assert_eq!("RECHARGE_REFUND".parse::<BillType>().unwrap(), BillType::RechargeRefund);
        assert_eq!(BillType::default().to_string(), "ALL");
        assert!("MONTHLY".parse::<BillType>().is_err());
    }

    #[test]
    fn test_response_from_error_reply() {
        let fields = codec::from_xml(
            b"<xml><return_code>FAIL</return_code><return_msg>No Bill Exist</return_msg></xml>",
        )
        .unwrap();
        let reply: DownloadBillResponse = codec::decode_fields(&fields).unwrap();
        assert!(reply.has_error());
        assert_eq!(reply.status.return_msg, "No Bill Exist");
        assert!(reply.data.is_empty());
    }

    #[test]
    fn test_response_without_indicator() {
        let reply = DownloadBillResponse::default();
        assert!(!reply.has_error());
    }
}
