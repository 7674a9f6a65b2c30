//! Field projection.
//!
//! Request records describe their wire layout through [`WireSchema`], a static
//! table of `(name, tag, accessor)` triples. [`project`] walks that table and
//! produces a [`FieldSet`], the unit of signing and serialization.

use std::{
    borrow::Cow,
    collections::{BTreeMap, btree_map},
};

use serde_json::{Map, Value};

/// Scalar value of a single wire field.
///
/// Two values are equal when they render to the same wire text, so
/// `Int(88)` equals `Str("88")`.
#[derive(Debug, Clone)]
pub enum FieldValue {
    /// Text value, emitted verbatim.
    Str(String),
    /// Integer value, emitted as decimal digits.
    Int(i64),
    /// Raw bytes, emitted as UTF-8 text.
    Bytes(Vec<u8>),
}

impl FieldValue {
    /// Renders the value the way it appears on the wire and in the canonical string.
    #[must_use]
    pub fn as_wire_str(&self) -> Cow<'_, str> {
        match self {
            Self::Str(s) => Cow::Borrowed(s),
            Self::Int(n) => Cow::Owned(n.to_string()),
            Self::Bytes(b) => String::from_utf8_lossy(b),
        }
    }

    /// Returns true if the value renders to an empty string.
    ///
    /// Empty values are treated as absent by the signer and the codec.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Str(s) => s.is_empty(),
            Self::Int(_) => false,
            Self::Bytes(b) => b.is_empty(),
        }
    }
}

impl PartialEq for FieldValue {
    fn eq(&self, other: &Self) -> bool {
        self.as_wire_str() == other.as_wire_str()
    }
}

impl Eq for FieldValue {}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_owned())
    }
}

impl From<&String> for FieldValue {
    fn from(value: &String) -> Self {
        Self::Str(value.clone())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<u32> for FieldValue {
    fn from(value: u32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<Vec<u8>> for FieldValue {
    fn from(value: Vec<u8>) -> Self {
        Self::Bytes(value)
    }
}

/// Mapping of wire field name to value.
///
/// Keys are unique. Iteration is in ascending byte-wise key order, but nothing
/// in the protocol depends on insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldSet {
    fields: BTreeMap<String, FieldValue>,
}

impl FieldSet {
    /// Creates an empty field set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a field, returning the previous value for that name.
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        value: impl Into<FieldValue>,
    ) -> Option<FieldValue> {
        self.fields.insert(name.into(), value.into())
    }

    /// Returns the value for `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    /// Returns the rendered value for `name`, if present.
    #[must_use]
    pub fn get_str(&self, name: &str) -> Option<Cow<'_, str>> {
        self.fields.get(name).map(FieldValue::as_wire_str)
    }

    /// Removes and returns the value for `name`.
    pub fn remove(&mut self, name: &str) -> Option<FieldValue> {
        self.fields.remove(name)
    }

    /// Returns true if a field named `name` is present.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Number of fields, empty ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns true if there are no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterates over all fields in ascending key order.
    pub fn iter(&self) -> btree_map::Iter<'_, String, FieldValue> {
        self.fields.iter()
    }

    /// Iterates over fields whose value is non-empty, in ascending key order.
    pub fn non_empty(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().filter(|(_, v)| !v.is_empty()).map(|(k, v)| (k.as_str(), v))
    }

    /// Merges `other` into `self`; keys from `other` overwrite existing ones.
    pub fn merge(&mut self, other: Self) {
        self.fields.extend(other.fields);
    }

    /// Converts the set into a JSON object of string values.
    ///
    /// Used to populate response records by field name.
    #[must_use]
    pub fn to_json_object(&self) -> Map<String, Value> {
        self.fields
            .iter()
            .map(|(k, v)| (k.clone(), Value::String(v.as_wire_str().into_owned())))
            .collect()
    }
}

impl<K: Into<String>, V: Into<FieldValue>> FromIterator<(K, V)> for FieldSet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self { fields: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect() }
    }
}

impl IntoIterator for FieldSet {
    type IntoIter = btree_map::IntoIter<String, FieldValue>;
    type Item = (String, FieldValue);

    fn into_iter(self) -> Self::IntoIter {
        self.fields.into_iter()
    }
}

impl<'a> IntoIterator for &'a FieldSet {
    type IntoIter = btree_map::Iter<'a, String, FieldValue>;
    type Item = (&'a String, &'a FieldValue);

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}

/// One declared field of a request record.
pub struct WireField<R> {
    /// Declared field name.
    pub name: &'static str,
    /// Serialization tag; the first comma-delimited segment overrides the name.
    pub tag: Option<&'static str>,
    /// Reads the field's value from a record.
    pub accessor: fn(&R) -> FieldValue,
}

impl<R> WireField<R> {
    /// Declares a field whose wire name is given by `tag`.
    #[must_use]
    pub const fn tagged(
        name: &'static str,
        tag: &'static str,
        accessor: fn(&R) -> FieldValue,
    ) -> Self {
        Self { name, tag: Some(tag), accessor }
    }

    /// Declares a field sent under its declared name.
    #[must_use]
    pub const fn named(name: &'static str, accessor: fn(&R) -> FieldValue) -> Self {
        Self { name, tag: None, accessor }
    }

    /// Resolves the name this field is sent under.
    ///
    /// ```
    /// use openwechat::field::{FieldValue, WireField};
    ///
    /// let field = WireField::<()>::tagged("MchId", "mch_id,omitempty", |_| FieldValue::Int(0));
    /// assert_eq!(field.wire_name(), "mch_id");
    ///
    /// let field = WireField::<()>::named("BillDate", |_| FieldValue::Int(0));
    /// assert_eq!(field.wire_name(), "BillDate");
    /// ```
    #[must_use]
    pub fn wire_name(&self) -> &'static str {
        self.tag
            .and_then(|tag| tag.split(',').next())
            .filter(|segment| !segment.is_empty())
            .unwrap_or(self.name)
    }
}

impl<R> std::fmt::Debug for WireField<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WireField").field("name", &self.name).field("tag", &self.tag).finish()
    }
}

/// Static wire layout of a record.
///
/// # Examples
///
/// ```
/// use openwechat::field::{FieldValue, WireField, WireSchema, project};
///
/// struct Query {
///     mch_id: String,
///     limit: i64,
/// }
///
/// impl WireSchema for Query {
///     const FIELDS: &'static [WireField<Self>] = &[
///         WireField::tagged("mch_id", "mch_id", |r: &Self| FieldValue::from(&r.mch_id)),
///         WireField::tagged("limit", "limit,omitempty", |r: &Self| FieldValue::Int(r.limit)),
///     ];
/// }
///
/// let fields = project(&Query { mch_id: "100".into(), limit: 20 });
/// assert_eq!(fields.get_str("mch_id").as_deref(), Some("100"));
/// assert_eq!(fields.get_str("limit").as_deref(), Some("20"));
/// ```
pub trait WireSchema: Sized + 'static {
    /// Declared fields, in declaration order.
    const FIELDS: &'static [WireField<Self>];
}

/// Projects a record into a field set, one entry per declared field.
#[must_use]
pub fn project<R: WireSchema>(record: &R) -> FieldSet {
    R::FIELDS.iter().map(|field| (field.wire_name(), (field.accessor)(record))).collect()
}

/// Projects two related records and merges them; `second` wins on key collisions.
#[must_use]
pub fn project_merged<A: WireSchema, B: WireSchema>(first: &A, second: &B) -> FieldSet {
    let mut fields = project(first);
    fields.merge(project(second));
    fields
}

impl WireSchema for () {
    const FIELDS: &'static [WireField<Self>] = &[];
}
