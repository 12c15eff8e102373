//! Errors that end the proxy's connection.

use crate::ProxyState;
use ee_ipc::{IpcError, MessageKind};
use ee_types::CodecError;
use thiserror::Error;

/// Result alias for proxy operations.
pub type ProxyResult<T> = Result<T, ProxyError>;

/// Fatal proxy failures.
///
/// Invocation failures never show up here: they are reported to the peer as a RESULT.
#[derive(Debug, Error)]
pub enum ProxyError {
    /// Transport or message decoding failed.
    #[error(transparent)]
    Ipc(#[from] IpcError),
    /// A value could not be encoded for the wire.
    #[error(transparent)]
    Codec(#[from] CodecError),
    /// A request received a reply of the wrong kind.
    #[error("protocol mismatch: expected {expected} reply, received {received}")]
    ProtocolMismatch {
        /// The reply kind the request requires.
        expected: MessageKind,
        /// The kind actually received.
        received: MessageKind,
    },
    /// A message arrived that the current state does not accept.
    #[error("unexpected {kind} message while {state}")]
    UnexpectedMessage {
        /// The offending kind.
        kind: MessageKind,
        /// Where the proxy was.
        state: ProxyState,
    },
}

impl ProxyError {
    /// Whether the connection can no longer be used after this error.
    ///
    /// Only codec failures are local to the operation that raised them.
    pub fn ends_connection(&self) -> bool {
        !matches!(self, Self::Codec(_))
    }
}
