//! Canonical request signatures.
//!
//! The provider signs a [`FieldSet`] by sorting its non-empty keys byte-wise,
//! joining them as `k=v&`, appending `key=<signing key>`, digesting the result
//! and upper-casing the hex digest.
//!
//! # Examples
//!
//! ```
//! use openwechat::{field::FieldSet, sign};
//!
//! let fields: FieldSet = [("mch_id", "100"), ("bill_date", "20140603")].into_iter().collect();
//!
//! assert_eq!(sign::canonical_string(&fields, "abc"), "bill_date=20140603&mch_id=100&key=abc");
//! assert_eq!(sign::sign(&fields, "abc").as_str(), "FCA92F0B93579A2320129CB071D1E547");
//! ```

use std::fmt;

use hmac::{Hmac, Mac};
use md5::{Digest, Md5};
use sha2::Sha256;
use tracing::{instrument, trace};

use crate::field::FieldSet;

#[cfg(test)]
mod tests;

/// Name of the field that carries the signature.
pub const SIGN_FIELD: &str = "sign";

/// Digest algorithm agreed with the provider (`sign_type`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SignType {
    /// MD5 over the canonical string.
    #[default]
    Md5,
    /// HMAC-SHA256 over the canonical string, keyed with the signing key.
    HmacSha256,
}

impl SignType {
    /// Returns the value the provider expects in the `sign_type` field.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Md5 => "MD5",
            Self::HmacSha256 => "HMAC-SHA256",
        }
    }
}

/// Upper-case hexadecimal request signature.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Signature(String);

impl Signature {
    /// Returns the signature text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the signature, returning its text.
    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Signature {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Builds the canonical string for `fields` and `key`.
///
/// Empty values and the `sign` field are skipped. The trailing `key=` entry is
/// always present, so an empty set yields `key=<key>`.
#[must_use]
pub fn canonical_string(fields: &FieldSet, key: &str) -> String {
    let mut canonical = String::new();
    // FieldSet iterates in byte-wise key order.
    for (name, value) in fields.non_empty().filter(|(name, _)| *name != SIGN_FIELD) {
        canonical.push_str(name);
        canonical.push('=');
        canonical.push_str(&value.as_wire_str());
        canonical.push('&');
    }
    canonical.push_str("key=");
    canonical.push_str(key);
    canonical
}

/// Signs `fields` with MD5.
#[must_use]
pub fn sign(fields: &FieldSet, key: &str) -> Signature {
    sign_with(fields, key, SignType::Md5)
}

/// Signs `fields` with the given digest.
#[instrument(skip_all, fields(sign_type = sign_type.as_str(), field_count = fields.len()))]
#[must_use]
pub fn sign_with(fields: &FieldSet, key: &str, sign_type: SignType) -> Signature {
    let canonical = canonical_string(fields, key);
    // the key itself stays out of the log
    trace!(canonical = canonical.strip_suffix(key).unwrap_or_default(), "canonical string");

    let digest = match sign_type {
        SignType::Md5 => hex::encode_upper(Md5::digest(canonical.as_bytes())),
        SignType::HmacSha256 => {
            hex::encode_upper(hmac_sha256(key.as_bytes(), canonical.as_bytes()))
        }
    };
    Signature(digest)
}

#[allow(clippy::expect_used, reason = "HMAC accepts keys of any length")]
fn hmac_sha256(key: &[u8], message: &[u8]) -> Vec<u8> {
    let mut mac = Hmac::<Sha256>::new_from_slice(key).expect("HMAC key of any length is valid");
    mac.update(message);
    mac.finalize().into_bytes().to_vec()
}

/// Verifies the `sign` field of `fields` with MD5.
#[must_use]
pub fn verify(fields: &FieldSet, key: &str) -> bool {
    verify_with(fields, key, SignType::Md5)
}

/// Verifies the `sign` field of `fields` with the given digest.
///
/// The caller resolves the signing key. Returns false when `sign` is missing
/// or does not match byte-for-byte.
#[must_use]
pub fn verify_with(fields: &FieldSet, key: &str, sign_type: SignType) -> bool {
    let Some(expected) = fields.get_str(SIGN_FIELD) else {
        return false;
    };
    let actual = sign_with(fields, key, sign_type);
    let matched = actual.as_str() == expected;
    if !matched {
        tracing::debug!("reply signature mismatch");
    }
    matched
}
