//! Mapping between msgpack values and the field types carried in payloads.
//!
//! The peer's encoder is loose about `str` versus `bin`: wherever bytes are expected either is
//! accepted.

use crate::{IpcError, IpcResult};
use ee_types::{CodecError, DictKey, TypeTag, TypedValue};
use rmpv::Value as Wire;

/// Raw bytes of a `bin` or `str` value.
pub(crate) fn as_bytes(value: &Wire) -> Option<&[u8]> {
    match value {
        Wire::Binary(b) => Some(b),
        Wire::String(s) => Some(s.as_bytes()),
        _ => None,
    }
}

/// Unsigned integer value.
pub(crate) fn as_uint(value: &Wire) -> Option<u64> {
    value.as_u64()
}

/// A `bin` value.
pub(crate) fn bin(bytes: impl Into<Vec<u8>>) -> Wire {
    Wire::Binary(bytes.into())
}

/// Encode a typed value as its `[tag, raw]` wire pair.
pub fn typed_to_wire(typed: &TypedValue) -> Wire {
    let raw = match typed {
        TypedValue::Nil => bin(Vec::new()),
        TypedValue::Dict(entries) => Wire::Map(
            entries
                .iter()
                .map(|(key, value)| {
                    let key = match key {
                        DictKey::Text(s) => Wire::from(s.as_str()),
                        DictKey::Bytes(b) => bin(b.clone()),
                    };
                    (key, typed_to_wire(value))
                })
                .collect(),
        ),
        TypedValue::List(items) => Wire::Array(items.iter().map(typed_to_wire).collect()),
        TypedValue::Scalar(_, raw) => bin(raw.clone()),
    };
    Wire::Array(vec![Wire::from(typed.tag().0), raw])
}

/// Decode a `[tag, raw]` wire pair.
///
/// A raw value whose shape disagrees with the tag is rejected.
pub fn typed_from_wire(value: &Wire) -> IpcResult<TypedValue> {
    let pair = match value {
        Wire::Array(pair) if pair.len() == 2 => pair,
        other => {
            return Err(IpcError::MalformedTypedValue(format!("expected [tag, raw], got {other}")))
        }
    };

    let tag = as_uint(&pair[0])
        .ok_or_else(|| IpcError::MalformedTypedValue(format!("invalid tag {}", pair[0])))?;
    let tag = u8::try_from(tag).map(TypeTag).map_err(|_| CodecError::TagOutOfRange(tag))?;
    let raw = &pair[1];

    let typed = match tag {
        TypeTag::NIL => TypedValue::Nil,
        TypeTag::DICT => {
            let entries = raw.as_map().ok_or(CodecError::ShapeMismatch { tag, shape: shape(raw) })?;
            let entries = entries
                .iter()
                .map(|(key, value)| -> IpcResult<_> { Ok((dict_key(key)?, typed_from_wire(value)?)) })
                .collect::<IpcResult<_>>()?;
            TypedValue::Dict(entries)
        }
        TypeTag::LIST => {
            let items =
                raw.as_array().ok_or(CodecError::ShapeMismatch { tag, shape: shape(raw) })?;
            TypedValue::List(items.iter().map(typed_from_wire).collect::<IpcResult<_>>()?)
        }
        tag => {
            let bytes = as_bytes(raw).ok_or(CodecError::ShapeMismatch { tag, shape: shape(raw) })?;
            TypedValue::Scalar(tag, bytes.to_vec())
        }
    };
    Ok(typed)
}

fn dict_key(key: &Wire) -> IpcResult<DictKey> {
    match key {
        Wire::String(s) => Ok(match s.as_str() {
            Some(text) => DictKey::Text(text.to_owned()),
            None => DictKey::Bytes(s.as_bytes().to_vec()),
        }),
        Wire::Binary(b) => Ok(DictKey::Bytes(b.clone())),
        other => Err(IpcError::MalformedTypedValue(format!("invalid dict key {other}"))),
    }
}

fn shape(value: &Wire) -> &'static str {
    match value {
        Wire::Nil => "nil",
        Wire::Boolean(_) => "boolean",
        Wire::Integer(_) => "integer",
        Wire::F32(_) | Wire::F64(_) => "float",
        Wire::String(_) => "string",
        Wire::Binary(_) => "bytes",
        Wire::Array(_) => "array",
        Wire::Map(_) => "map",
        Wire::Ext(..) => "ext",
    }
}
