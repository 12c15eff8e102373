//! The tagged envelope every self-describing value travels in.

use crate::TypeTag;

/// A key of a [TypedValue::Dict].
///
/// The peer may send keys as text or as raw bytes. Both decode to the same text key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DictKey {
    Text(String),
    Bytes(Vec<u8>),
}

impl DictKey {
    /// The key as raw bytes, regardless of how it was sent.
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            DictKey::Text(s) => s.as_bytes(),
            DictKey::Bytes(b) => b,
        }
    }
}

impl From<&str> for DictKey {
    fn from(key: &str) -> Self {
        DictKey::Text(key.to_owned())
    }
}

impl From<String> for DictKey {
    fn from(key: String) -> Self {
        DictKey::Text(key)
    }
}

/// A `(tag, raw)` pair.
///
/// Containers hold nested envelopes; every other tag holds a byte string whose interpretation the
/// tag fixes. Dict entries keep the order they were encoded or received in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypedValue {
    Nil,
    Dict(Vec<(DictKey, TypedValue)>),
    List(Vec<TypedValue>),
    Scalar(TypeTag, Vec<u8>),
}

impl TypedValue {
    /// The envelope's tag.
    pub fn tag(&self) -> TypeTag {
        match self {
            TypedValue::Nil => TypeTag::NIL,
            TypedValue::Dict(_) => TypeTag::DICT,
            TypedValue::List(_) => TypeTag::LIST,
            TypedValue::Scalar(tag, _) => *tag,
        }
    }

    /// Shorthand for a BYTES envelope.
    pub fn bytes(raw: impl Into<Vec<u8>>) -> Self {
        TypedValue::Scalar(TypeTag::BYTES, raw.into())
    }

    /// Shorthand for a STRING envelope.
    pub fn string(s: &str) -> Self {
        TypedValue::Scalar(TypeTag::STRING, s.as_bytes().to_vec())
    }
}
