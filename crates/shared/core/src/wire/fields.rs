use std::collections::BTreeMap;

use super::error::ProtocolError;
use super::tags;
use super::{FIELD_DELIMITER, TAG_VALUE_SEPARATOR};

/// Decoded message: tag -> value.
///
/// Duplicate tags within one message resolve to the last occurrence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldSet {
    fields: BTreeMap<String, String>,
}

impl FieldSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Value of `tag`, if present
    pub fn get(&self, tag: &str) -> Option<&str> {
        self.fields.get(tag).map(String::as_str)
    }

    /// Value of `tag`, or [`ProtocolError::MissingTag`]
    pub fn require(&self, tag: &str) -> Result<&str, ProtocolError> {
        self.get(tag)
            .ok_or_else(|| ProtocolError::MissingTag(tag.to_string()))
    }

    /// Insert or overwrite a field, returning the previous value
    pub fn insert(&mut self, tag: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.fields.insert(tag.into(), value.into())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Fields in ascending tag order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K, V> FromIterator<(K, V)> for FieldSet
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut set = FieldSet::new();
        for (k, v) in iter {
            set.insert(k, v);
        }
        set
    }
}

/// Decode a raw message into its fields.
///
/// Empty tokens (including the one after the trailing `|`) are skipped.
/// A token without `=`, or with an empty tag, fails with
/// [`ProtocolError::MalformedField`].
pub fn decode(raw: &str) -> Result<FieldSet, ProtocolError> {
    let mut fields = FieldSet::new();

    for token in raw.split(FIELD_DELIMITER) {
        if token.is_empty() {
            continue;
        }

        match token.split_once(TAG_VALUE_SEPARATOR) {
            Some((tag, value)) if !tag.is_empty() => {
                fields.insert(tag, value);
            }
            _ => return Err(ProtocolError::MalformedField(token.to_string())),
        }
    }

    Ok(fields)
}

/// Encode fields as `tag=value|...`.
///
/// Header tags (35, 49, 56) come first in that order, then every other tag
/// in ascending lexicographic order.
pub fn encode(fields: &FieldSet) -> String {
    let mut out = String::new();

    let mut push = |tag: &str, value: &str| {
        out.push_str(tag);
        out.push(TAG_VALUE_SEPARATOR);
        out.push_str(value);
        out.push(FIELD_DELIMITER);
    };

    for tag in tags::HEADER_ORDER {
        if let Some(value) = fields.get(tag) {
            push(tag, value);
        }
    }

    for (tag, value) in fields.iter() {
        if !tags::HEADER_ORDER.contains(&tag) {
            push(tag, value);
        }
    }

    out
}
