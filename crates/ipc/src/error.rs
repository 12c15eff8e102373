//! Error types for the IPC channel.

use crate::MessageKind;
use ee_types::CodecError;
use thiserror::Error;

/// Result alias for IPC operations.
pub type IpcResult<T> = Result<T, IpcError>;

/// Transport and message-layer failures.
#[derive(Debug, Error)]
pub enum IpcError {
    /// The peer closed the connection between two messages.
    #[error("connection closed by peer")]
    Closed,
    /// Error conversion from [std::io::Error]
    #[error(transparent)]
    StdIo(#[from] std::io::Error),
    /// The byte stream was not valid msgpack.
    #[error("msgpack decode error: {0}")]
    Decode(String),
    /// A value could not be written as msgpack.
    #[error("msgpack encode error: {0}")]
    Encode(String),
    /// The message tag is outside the closed set of kinds.
    #[error("unknown message kind {0}")]
    UnknownKind(u64),
    /// The payload does not have the shape its kind requires.
    #[error("malformed {kind} payload: {reason}")]
    Malformed {
        /// The kind being decoded.
        kind: MessageKind,
        /// What was wrong.
        reason: String,
    },
    /// A typed value envelope was not a `[tag, raw]` pair.
    #[error("malformed typed value: {0}")]
    MalformedTypedValue(String),
    /// A field failed to encode or decode.
    #[error(transparent)]
    Codec(#[from] CodecError),
    /// The connection address could not be parsed.
    #[error("invalid ipc address: {0}")]
    InvalidAddress(String),
}

impl From<rmpv::decode::Error> for IpcError {
    fn from(e: rmpv::decode::Error) -> Self {
        match e {
            rmpv::decode::Error::InvalidMarkerRead(io)
                if io.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                Self::Closed
            }
            other => Self::Decode(other.to_string()),
        }
    }
}
