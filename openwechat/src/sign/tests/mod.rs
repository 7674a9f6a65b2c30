use super::*;
use crate::field::FieldValue;


fn bill_fields() -> FieldSet {
    [("bill_date", "20140603"), ("mch_id", "100")].into_iter().collect()
}

#[test]
fn test_canonical_string() {
    assert_eq!(canonical_string(&bill_fields(), "abc"), "bill_date=20140603&mch_id=100&key=abc");
}

#[test]
fn test_sign_known_digest() {
    assert_eq!(sign(&bill_fields(), "abc").as_str(), "FCA92F0B93579A2320129CB071D1E547");
}

#[test]
fn test_sign_reverse_insertion_order() {
    let mut reversed = FieldSet::new();
    reversed.insert("mch_id", "100");
    reversed.insert("bill_date", "20140603");
    assert_eq!(sign(&reversed, "abc"), sign(&bill_fields(), "abc"));
}

#[test]
fn test_sign_empty_set() {
    let empty = FieldSet::new();
    assert_eq!(canonical_string(&empty, "abc"), "key=abc");
    assert_eq!(sign(&empty, "abc").as_str(), "15112F0459B934C2BDA886B83686F903");
}

#[test]
fn test_sign_skips_empty_values() {
    let mut fields = bill_fields();
    fields.insert("device_info", "");
    fields.insert("tar_type", FieldValue::Bytes(Vec::new()));
    assert_eq!(canonical_string(&fields, "abc"), "bill_date=20140603&mch_id=100&key=abc");
}

#[test]
fn test_sign_excludes_sign_field() {
    let mut fields = bill_fields();
    fields.insert(SIGN_FIELD, "DEADBEEF");
    assert_eq!(sign(&fields, "abc"), sign(&bill_fields(), "abc"));
}

#[test]
fn test_sign_renders_integers_in_decimal() {
    let mut fields = FieldSet::new();
    fields.insert("total_fee", 1_000_000_i64);
    fields.insert("count", 0_i64);
    assert_eq!(canonical_string(&fields, "k"), "count=0&total_fee=1000000&key=k");
}

#[test]
fn test_sign_byte_order_not_locale() {
    let fields: FieldSet = [("b", "2"), ("B", "1"), ("_a", "3")].into_iter().collect();
    assert_eq!(canonical_string(&fields, "k"), "B=1&_a=3&b=2&key=k");
}

#[test]
fn test_sign_output_is_uppercase_hex() {
    let signature = sign(&bill_fields(), "abc");
    assert_eq!(signature.as_str().len(), 32);
    assert!(signature.as_str().chars().all(|c| c.is_ascii_digit() || c.is_ascii_uppercase()));
}

#[test]
fn test_sign_hmac_sha256_known_digest() {
    let signature = sign_with(&bill_fields(), "abc", SignType::HmacSha256);
    assert_eq!(
        signature.as_str(),
        "F6700B96849B8160DF9AEC87E8279FFA46A553F26B5FFD593D5B08C88F1E7A20"
    );
}

#[test]
fn test_verify_roundtrip() {
    let mut fields = bill_fields();
    let signature = sign(&fields, "abc");
    fields.insert(SIGN_FIELD, signature.into_string());
    assert!(verify(&fields, "abc"));
    assert!(!verify(&fields, "wrong-key"));
}

#[test]
fn test_verify_missing_sign() {
    assert!(!verify(&bill_fields(), "abc"));
}

#[test]
fn test_verify_is_case_sensitive() {
    let mut fields = bill_fields();
    fields.insert(SIGN_FIELD, sign(&bill_fields(), "abc").as_str().to_lowercase());
    assert!(!verify(&fields, "abc"));
}

#[test]
fn test_verify_with_hmac() {
    let mut fields = bill_fields();
    fields.insert(SIGN_FIELD, sign_with(&fields, "abc", SignType::HmacSha256).into_string());
    assert!(verify_with(&fields, "abc", SignType::HmacSha256));
    assert!(!verify_with(&fields, "abc", SignType::Md5));
}

#[test]
fn test_sign_type_names() {
    assert_eq!(SignType::Md5.as_str(), "MD5");
    assert_eq!(SignType::HmacSha256.as_str(), "HMAC-SHA256");
    assert_eq!(SignType::default(), SignType::Md5);
}

#[test]
fn test_signature_display() {
    let signature = sign(&bill_fields(), "abc");
    assert_eq!(signature.to_string(), signature.as_str());
}
