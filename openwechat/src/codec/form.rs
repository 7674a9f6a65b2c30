//! Form parameters.

use url::form_urlencoded;

use crate::field::FieldSet;

/// Flattens the non-empty fields of `fields` into `(name, value)` pairs in
/// ascending key order.
#[must_use]
pub fn to_form(fields: &FieldSet) -> Vec<(String, String)> {
    fields
        .non_empty()
        .map(|(name, value)| (name.to_owned(), value.as_wire_str().into_owned()))
        .collect()
}

/// Renders the non-empty fields of `fields` as an
/// `application/x-www-form-urlencoded` string.
///
/// # Examples
///
/// ```
/// use openwechat::{codec::to_form_body, field::FieldSet};
///
/// let fields: FieldSet =
///     [("appid", "wx1"), ("redirect_uri", "https://a.example/cb?x=1")].into_iter().collect();
/// assert_eq!(to_form_body(&fields), "appid=wx1&redirect_uri=https%3A%2F%2Fa.example%2Fcb%3Fx%3D1");
/// ```
#[must_use]
pub fn to_form_body(fields: &FieldSet) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (name, value) in fields.non_empty() {
        serializer.append_pair(name, &value.as_wire_str());
    }
    serializer.finish()
}
