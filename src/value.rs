//! The structured value model exchanged by calls.
//!
//! A [`Value`] is a closed variant type: scalar, sequence, map or
//! [`Attachment`]. Keeping the variant set closed (instead of passing
//! `serde_json::Value` plus an out-of-band file list around) lets the
//! extraction/injection logic in [`crate::codec`] be exhaustively checked
//! by the compiler.
//!
//! Attachments may appear at any depth inside a value; they are always
//! leaves. Map entries are stored sorted by key so that skeleton
//! serialization is deterministic.

use std::collections::BTreeMap;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// An opaque binary payload embeddable anywhere inside a [`Value`].
///
/// Immutable once constructed. The payload is a [`Bytes`] handle, so
/// cloning an attachment never copies the underlying buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    data: Bytes,
    file_name: Option<String>,
    media_type: Option<String>,
}

impl Attachment {
    /// Create an attachment from raw bytes.
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self {
            data: data.into(),
            file_name: None,
            media_type: None,
        }
    }

    /// Set the display name.
    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = Some(file_name.into());
        self
    }

    /// Set the media-type tag (e.g. `image/png`).
    pub fn with_media_type(mut self, media_type: impl Into<String>) -> Self {
        self.media_type = Some(media_type.into());
        self
    }

    /// The raw payload bytes.
    pub fn data(&self) -> &Bytes {
        &self.data
    }

    /// The display name, if one was set.
    pub fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }

    /// The media-type tag, if one was set.
    pub fn media_type(&self) -> Option<&str> {
        self.media_type.as_deref()
    }

    /// Payload length in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the payload is empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// One step of a [`Path`]: a sequence index or a map key.
///
/// Serializes untagged, so a path appears on the wire as a JSON array
/// mixing numbers and strings, e.g. `[1, "avatar", 0]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathSegment {
    /// Index into a sequence.
    Index(usize),
    /// Key into a map.
    Key(String),
}

impl std::fmt::Display for PathSegment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathSegment::Index(i) => write!(f, "[{}]", i),
            PathSegment::Key(k) => write!(f, ".{}", k),
        }
    }
}

/// Address of one node within a [`Value`], from the root down.
///
/// Comparable only by full-sequence equality; extraction produces paths in
/// encounter order.
pub type Path = Vec<PathSegment>;

/// Render a path for error messages, e.g. `$[1].avatar`.
pub(crate) fn display_path(path: &[PathSegment]) -> String {
    let mut out = String::from("$");
    for seg in path {
        out.push_str(&seg.to_string());
    }
    out
}

/// A structured value: the argument/result type of every call.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// JSON null.
    #[default]
    Null,
    /// Boolean scalar.
    Bool(bool),
    /// Numeric scalar (integer or float, as in JSON).
    Number(serde_json::Number),
    /// String scalar.
    String(String),
    /// Ordered sequence.
    Array(Vec<Value>),
    /// Keyed map with unique keys, stored sorted for stable serialization.
    Object(BTreeMap<String, Value>),
    /// Opaque binary attachment (always a leaf).
    Attachment(Attachment),
}

impl Value {
    /// Convert to plain JSON. Attachments become `null`, which makes this
    /// exactly the skeleton transform for values already run through
    /// [`crate::codec::extract`].
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null | Value::Attachment(_) => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Number(n) => serde_json::Value::Number(n.clone()),
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Array(items) => {
                serde_json::Value::Array(items.iter().map(Value::to_json).collect())
            }
            Value::Object(map) => serde_json::Value::Object(
                map.iter().map(|(k, v)| (k.clone(), v.to_json())).collect(),
            ),
        }
    }

    /// Build a value from plain JSON. The result contains no attachments.
    pub fn from_json(json: serde_json::Value) -> Value {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => Value::Number(n),
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::Array(items.into_iter().map(Value::from_json).collect())
            }
            serde_json::Value::Object(map) => Value::Object(
                map.into_iter().map(|(k, v)| (k, Value::from_json(v))).collect(),
            ),
        }
    }

    /// Borrow as a string scalar.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Borrow as an integer, if the number fits.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Number(n) => n.as_i64(),
            _ => None,
        }
    }

    /// Borrow as a sequence.
    pub fn as_array(&self) -> Option<&Vec<Value>> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Borrow as a map.
    pub fn as_object(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Object(map) => Some(map),
            _ => None,
        }
    }

    /// Borrow as an attachment.
    pub fn as_attachment(&self) -> Option<&Attachment> {
        match self {
            Value::Attachment(a) => Some(a),
            _ => None,
        }
    }

    /// Look up a map entry by key.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_object().and_then(|m| m.get(key))
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n.into())
    }
}

impl From<u64> for Value {
    fn from(n: u64) -> Self {
        Value::Number(n.into())
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        serde_json::Number::from_f64(n).map_or(Value::Null, Value::Number)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Attachment> for Value {
    fn from(a: Attachment) -> Self {
        Value::Attachment(a)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Array(items)
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        Value::from_json(json)
    }
}
