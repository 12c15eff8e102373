//! Messages exchanged with the service manager.
//!
//! Each message is a `(kind, payload)` pair. Payload layouts:
//!
//! | kind     | payload                                                      |
//! |----------|--------------------------------------------------------------|
//! | VERSION  | `[version, pid, language]`                                   |
//! | INVOKE   | `[code, from, to, value, step_limit, method, params]`        |
//! | RESULT   | `[status, step_used, result \| nil]`                         |
//! | GETVALUE | key bytes (request) or value bytes (reply)                   |
//! | SETVALUE | `[key, value]`                                               |
//! | CALL     | `[to, value, step_limit, method, params]`                    |
//! | EVENT    | `[indexed, [value...]]`                                      |
//! | GETINFO  | empty bytes (request) or a typed value (reply)               |
//!
//! Scalar fields are raw bytes produced by [ValueCodec::encode]. `params` of INVOKE and the
//! GETINFO reply are self-describing `[tag, raw]` envelopes.

use crate::{
    wire::{as_bytes, as_uint, bin, typed_from_wire, typed_to_wire},
    IpcError, IpcResult,
};
use ee_types::{
    decode_int, encode_int, Address, BigInt, CodecError, TypeTag, TypedValue, Value, ValueCodec,
};
use rmpv::Value as Wire;
use std::fmt;

/// Protocol version announced in the handshake.
pub const PROTOCOL_VERSION: u16 = 1;

/// Executor type name this runtime registers under with the service manager.
pub const LANGUAGE: &str = "python";

/// The closed set of message kinds.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    Version = 0,
    Invoke = 1,
    Result = 2,
    GetValue = 3,
    SetValue = 4,
    Call = 5,
    Event = 6,
    GetInfo = 7,
}

impl MessageKind {
    /// The numeric tag sent on the wire.
    pub fn tag(self) -> u32 {
        self as u32
    }

    /// Look up a kind by its wire tag.
    pub fn from_tag(tag: u64) -> IpcResult<Self> {
        let kind = match tag {
            0 => Self::Version,
            1 => Self::Invoke,
            2 => Self::Result,
            3 => Self::GetValue,
            4 => Self::SetValue,
            5 => Self::Call,
            6 => Self::Event,
            7 => Self::GetInfo,
            other => return Err(IpcError::UnknownKind(other)),
        };
        Ok(kind)
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Version => "VERSION",
            Self::Invoke => "INVOKE",
            Self::Result => "RESULT",
            Self::GetValue => "GETVALUE",
            Self::SetValue => "SETVALUE",
            Self::Call => "CALL",
            Self::Event => "EVENT",
            Self::GetInfo => "GETINFO",
        };
        f.write_str(name)
    }
}

/// Outcome code of an invocation.
///
/// Codes other than the two named here are defined by the peer and passed through untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Status(pub u16);

impl Status {
    pub const SUCCESS: Self = Self(0);
    pub const SYSTEM_FAILURE: Self = Self(1);

    pub fn is_success(self) -> bool {
        self == Self::SUCCESS
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::SUCCESS => f.write_str("SUCCESS"),
            Self::SYSTEM_FAILURE => f.write_str("SYSTEM_FAILURE"),
            Status(code) => write!(f, "{code}"),
        }
    }
}

/// One-way announcement sent right after connecting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionMessage {
    pub version: u16,
    pub pid: u32,
    pub language: String,
}

impl VersionMessage {
    /// The announcement for the current process.
    pub fn current() -> Self {
        Self { version: PROTOCOL_VERSION, pid: std::process::id(), language: LANGUAGE.to_string() }
    }
}

/// Request to run a contract method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvokeMessage<X = Address> {
    pub code: String,
    pub from: X,
    pub to: X,
    pub value: BigInt,
    pub step_limit: BigInt,
    pub method: String,
    /// Left undecoded; the executor resolves parameter types.
    pub params: TypedValue,
}

/// Outcome of an INVOKE or a CALL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultMessage {
    pub status: Status,
    /// Steps consumed, or the whole limit on failure.
    pub step_used: BigInt,
    /// Scalar-encoded result; `None` when withheld.
    pub result: Option<Vec<u8>>,
}

/// Write to the peer's key-value store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetValueMessage {
    pub key: Vec<u8>,
    pub value: Vec<u8>,
}

/// Nested call issued while servicing an invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallMessage<X = Address> {
    pub to: X,
    pub value: BigInt,
    pub step_limit: BigInt,
    pub method: String,
    pub params: Vec<u8>,
}

/// Event log entry. The first `indexed` values are indexed for filtering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventMessage {
    pub indexed: u16,
    pub values: Vec<Vec<u8>>,
}

/// A decoded message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message<X = Address> {
    Version(VersionMessage),
    Invoke(InvokeMessage<X>),
    Result(ResultMessage),
    /// Key on request, value on reply.
    GetValue(Vec<u8>),
    SetValue(SetValueMessage),
    Call(CallMessage<X>),
    Event(EventMessage),
    /// `None` on request, the info structure on reply.
    GetInfo(Option<TypedValue>),
}

impl<X> Message<X> {
    pub fn kind(&self) -> MessageKind {
        match self {
            Self::Version(_) => MessageKind::Version,
            Self::Invoke(_) => MessageKind::Invoke,
            Self::Result(_) => MessageKind::Result,
            Self::GetValue(_) => MessageKind::GetValue,
            Self::SetValue(_) => MessageKind::SetValue,
            Self::Call(_) => MessageKind::Call,
            Self::Event(_) => MessageKind::Event,
            Self::GetInfo(_) => MessageKind::GetInfo,
        }
    }

    /// Encode into the `(kind, payload)` pair handed to the transport.
    pub fn encode(&self, codec: &ValueCodec<X>) -> IpcResult<(MessageKind, Wire)>
    where
        X: Clone,
    {
        let payload = match self {
            Self::Version(m) => Wire::Array(vec![
                Wire::from(m.version),
                Wire::from(m.pid),
                Wire::from(m.language.as_str()),
            ]),
            Self::Invoke(m) => Wire::Array(vec![
                Wire::from(m.code.as_str()),
                bin(custom_bytes(codec, &m.from)?),
                bin(custom_bytes(codec, &m.to)?),
                bin(encode_int(&m.value)),
                bin(encode_int(&m.step_limit)),
                Wire::from(m.method.as_str()),
                typed_to_wire(&m.params),
            ]),
            Self::Result(m) => Wire::Array(vec![
                Wire::from(m.status.0),
                bin(encode_int(&m.step_used)),
                m.result.as_ref().map(|r| bin(r.clone())).unwrap_or(Wire::Nil),
            ]),
            Self::GetValue(bytes) => bin(bytes.clone()),
            Self::SetValue(m) => Wire::Array(vec![bin(m.key.clone()), bin(m.value.clone())]),
            Self::Call(m) => Wire::Array(vec![
                bin(custom_bytes(codec, &m.to)?),
                bin(encode_int(&m.value)),
                bin(encode_int(&m.step_limit)),
                bin(m.method.as_bytes()),
                bin(m.params.clone()),
            ]),
            Self::Event(m) => Wire::Array(vec![
                Wire::from(m.indexed),
                Wire::Array(m.values.iter().map(|v| bin(v.clone())).collect()),
            ]),
            Self::GetInfo(None) => bin(Vec::new()),
            Self::GetInfo(Some(info)) => typed_to_wire(info),
        };
        Ok((self.kind(), payload))
    }

    /// Decode a `(kind, payload)` pair received from the transport.
    pub fn decode(tag: u32, payload: &Wire, codec: &ValueCodec<X>) -> IpcResult<Self> {
        let kind = MessageKind::from_tag(tag as u64)?;
        let fields = Fields { kind, payload };

        let message = match kind {
            MessageKind::Version => {
                let f = fields.array(3)?;
                Self::Version(VersionMessage {
                    version: fields.uint(&f[0], "version")?,
                    pid: fields.uint(&f[1], "pid")?,
                    language: fields.string(&f[2], "language")?,
                })
            }
            MessageKind::Invoke => {
                let f = fields.array(7)?;
                Self::Invoke(InvokeMessage {
                    code: fields.string(&f[0], "code")?,
                    from: codec.decode_custom(TypeTag::ADDRESS, fields.bytes(&f[1], "from")?)?,
                    to: codec.decode_custom(TypeTag::ADDRESS, fields.bytes(&f[2], "to")?)?,
                    value: decode_int(fields.bytes(&f[3], "value")?),
                    step_limit: decode_int(fields.bytes(&f[4], "step_limit")?),
                    method: fields.string(&f[5], "method")?,
                    params: typed_from_wire(&f[6])?,
                })
            }
            MessageKind::Result => {
                let f = fields.array(3)?;
                Self::Result(ResultMessage {
                    status: Status(fields.uint(&f[0], "status")?),
                    step_used: decode_int(fields.bytes(&f[1], "step_used")?),
                    result: fields.optional_bytes(&f[2], "result")?.map(<[u8]>::to_vec),
                })
            }
            MessageKind::GetValue => {
                Self::GetValue(fields.optional_bytes(payload, "value")?.unwrap_or_default().to_vec())
            }
            MessageKind::SetValue => {
                let f = fields.array(2)?;
                Self::SetValue(SetValueMessage {
                    key: fields.bytes(&f[0], "key")?.to_vec(),
                    value: fields.bytes(&f[1], "value")?.to_vec(),
                })
            }
            MessageKind::Call => {
                let f = fields.array(5)?;
                Self::Call(CallMessage {
                    to: codec.decode_custom(TypeTag::ADDRESS, fields.bytes(&f[0], "to")?)?,
                    value: decode_int(fields.bytes(&f[1], "value")?),
                    step_limit: decode_int(fields.bytes(&f[2], "step_limit")?),
                    method: fields.string(&f[3], "method")?,
                    params: fields.bytes(&f[4], "params")?.to_vec(),
                })
            }
            MessageKind::Event => {
                let f = fields.array(2)?;
                let values = f[1]
                    .as_array()
                    .ok_or_else(|| fields.malformed("values must be an array"))?
                    .iter()
                    .map(|v| fields.bytes(v, "value").map(<[u8]>::to_vec))
                    .collect::<IpcResult<_>>()?;
                Self::Event(EventMessage { indexed: fields.uint(&f[0], "indexed")?, values })
            }
            MessageKind::GetInfo => match payload {
                Wire::Array(_) => Self::GetInfo(Some(typed_from_wire(payload)?)),
                _ => Self::GetInfo(None),
            },
        };
        Ok(message)
    }
}

/// Scalar form of a custom value: the extension codec's bytes with its tag dropped.
fn custom_bytes<X>(codec: &ValueCodec<X>, value: &X) -> IpcResult<Vec<u8>>
where
    X: Clone,
{
    Ok(codec.encode(&Value::Custom(value.clone()))?)
}

/// Field accessors that report failures against the message kind being decoded.
struct Fields<'a> {
    kind: MessageKind,
    payload: &'a Wire,
}

impl<'a> Fields<'a> {
    fn malformed(&self, reason: impl Into<String>) -> IpcError {
        IpcError::Malformed { kind: self.kind, reason: reason.into() }
    }

    fn array(&self, len: usize) -> IpcResult<&'a [Wire]> {
        match self.payload {
            Wire::Array(fields) if fields.len() == len => Ok(fields),
            Wire::Array(fields) => {
                Err(self.malformed(format!("expected {len} fields, received {}", fields.len())))
            }
            other => Err(self.malformed(format!("expected array, received {other}"))),
        }
    }

    fn bytes<'v>(&self, value: &'v Wire, field: &str) -> IpcResult<&'v [u8]> {
        as_bytes(value).ok_or_else(|| self.malformed(format!("{field} must be bytes")))
    }

    fn optional_bytes<'v>(&self, value: &'v Wire, field: &str) -> IpcResult<Option<&'v [u8]>> {
        if value.is_nil() {
            return Ok(None);
        }
        self.bytes(value, field).map(Some)
    }

    fn string(&self, value: &Wire, field: &str) -> IpcResult<String> {
        let bytes = self.bytes(value, field)?;
        String::from_utf8(bytes.to_vec()).map_err(|e| IpcError::Codec(CodecError::from(e)))
    }

    fn uint<T: TryFrom<u64>>(&self, value: &Wire, field: &str) -> IpcResult<T> {
        as_uint(value)
            .and_then(|v| T::try_from(v).ok())
            .ok_or_else(|| self.malformed(format!("{field} must be an unsigned integer in range")))
    }
}

#[cfg(test)]
#[path = "tests/message_tests.rs"]
mod message_tests;
