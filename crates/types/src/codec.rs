//! Typed value codec.
//!
//! Two encoder forms exist:
//! - scalar ([ValueCodec::encode]): raw bytes only, for fields whose tag the message schema fixes
//! - self-describing ([ValueCodec::encode_any]): a [TypedValue] tree with every leaf tagged, for
//!   open-ended structures
//!
//! Primitive tags are handled here. Custom tags go to the [ExtensionCodec].

use crate::{
    decode_int, encode_int, Address, AddressCodec, CodecError, CodecResult, DictKey, TypeTag,
    TypedValue, Value,
};
use std::{fmt, sync::Arc};

/// Capability for domain types outside the primitive tag set.
///
/// Implemented once per deployment. The codec owns every tag from [TypeTag::CUSTOM] up, except
/// [TypeTag::INT].
pub trait ExtensionCodec: Send + Sync {
    /// The domain type carried by [Value::Custom].
    type Custom;

    /// Encode a domain value into its tag and raw bytes.
    fn encode(&self, value: &Self::Custom) -> CodecResult<(TypeTag, Vec<u8>)>;

    /// Decode raw bytes for a custom tag.
    ///
    /// Tags the codec does not recognize must fail with [CodecError::UnknownTag].
    fn decode(&self, tag: TypeTag, bytes: &[u8]) -> CodecResult<Self::Custom>;
}

/// Encoder/decoder between [Value] and the wire forms.
pub struct ValueCodec<X = Address> {
    extension: Arc<dyn ExtensionCodec<Custom = X>>,
}

impl<X> ValueCodec<X> {
    /// Create a codec delegating custom tags to `extension`.
    pub fn new(extension: impl ExtensionCodec<Custom = X> + 'static) -> Self {
        Self { extension: Arc::new(extension) }
    }

    /// Create a codec from a shared extension codec.
    pub fn from_shared(extension: Arc<dyn ExtensionCodec<Custom = X>>) -> Self {
        Self { extension }
    }

    /// Decode a scalar raw value according to `tag`.
    pub fn decode(&self, tag: TypeTag, raw: &[u8]) -> CodecResult<Value<X>> {
        match tag {
            TypeTag::BYTES => Ok(Value::Bytes(raw.to_vec())),
            TypeTag::STRING => Ok(Value::String(String::from_utf8(raw.to_vec())?)),
            TypeTag::INT => Ok(Value::Int(decode_int(raw))),
            tag if tag.is_structural() => Err(CodecError::ShapeMismatch { tag, shape: "bytes" }),
            tag if tag.is_custom() => self.decode_custom(tag, raw).map(Value::Custom),
            tag => Err(CodecError::UnknownTag(tag)),
        }
    }

    /// Decode a custom tag straight into the domain type.
    pub fn decode_custom(&self, tag: TypeTag, raw: &[u8]) -> CodecResult<X> {
        if !tag.is_custom() {
            return Err(CodecError::UnknownTag(tag));
        }
        self.extension.decode(tag, raw)
    }

    /// Scalar encoding.
    ///
    /// Nil is the empty string. The extension codec's tag is discarded: the message schema fixes
    /// it. Containers are rejected.
    pub fn encode(&self, value: &Value<X>) -> CodecResult<Vec<u8>> {
        match value {
            Value::Nil => Ok(Vec::new()),
            Value::Int(v) => Ok(encode_int(v)),
            Value::String(s) => Ok(s.as_bytes().to_vec()),
            Value::Bytes(b) => Ok(b.clone()),
            Value::Custom(x) => self.extension.encode(x).map(|(_, bytes)| bytes),
            Value::List(_) | Value::Dict(_) => Err(CodecError::NotScalar(value.kind())),
        }
    }

    /// Self-describing encoding, recursing into containers.
    ///
    /// Dict entries keep their iteration order.
    pub fn encode_any(&self, value: &Value<X>) -> CodecResult<TypedValue> {
        let encoded = match value {
            Value::Nil => TypedValue::Nil,
            Value::Dict(dict) => TypedValue::Dict(
                dict.iter()
                    .map(|(k, v)| -> CodecResult<_> {
                        Ok((DictKey::Text(k.clone()), self.encode_any(v)?))
                    })
                    .collect::<CodecResult<_>>()?,
            ),
            Value::List(list) => TypedValue::List(
                list.iter().map(|v| self.encode_any(v)).collect::<CodecResult<_>>()?,
            ),
            Value::Bytes(b) => TypedValue::Scalar(TypeTag::BYTES, b.clone()),
            Value::String(s) => TypedValue::Scalar(TypeTag::STRING, s.as_bytes().to_vec()),
            Value::Int(v) => TypedValue::Scalar(TypeTag::INT, encode_int(v)),
            Value::Custom(x) => {
                let (tag, bytes) = self.extension.encode(x)?;
                TypedValue::Scalar(tag, bytes)
            }
        };
        Ok(encoded)
    }

    /// Inverse of [Self::encode_any].
    ///
    /// Byte-string dict keys are read as UTF-8 text.
    pub fn decode_any(&self, typed: &TypedValue) -> CodecResult<Value<X>> {
        match typed {
            TypedValue::Nil => Ok(Value::Nil),
            TypedValue::Dict(entries) => {
                let mut dict = crate::Dict::with_capacity(entries.len());
                for (key, value) in entries {
                    let key = match key {
                        DictKey::Text(s) => s.clone(),
                        DictKey::Bytes(b) => String::from_utf8(b.clone())?,
                    };
                    dict.insert(key, self.decode_any(value)?);
                }
                Ok(Value::Dict(dict))
            }
            TypedValue::List(items) => {
                items.iter().map(|v| self.decode_any(v)).collect::<CodecResult<_>>().map(Value::List)
            }
            TypedValue::Scalar(tag, raw) => self.decode(*tag, raw),
        }
    }
}

impl Default for ValueCodec<Address> {
    fn default() -> Self {
        Self::new(AddressCodec)
    }
}

impl<X> Clone for ValueCodec<X> {
    fn clone(&self) -> Self {
        Self { extension: Arc::clone(&self.extension) }
    }
}

impl<X> fmt::Debug for ValueCodec<X> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValueCodec").finish_non_exhaustive()
    }
}
