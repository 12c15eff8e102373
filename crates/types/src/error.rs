// SPDX-License-Identifier: Apache-2.0
//! Error types for value encoding and decoding.

use crate::TypeTag;
use thiserror::Error;

/// Return an error if the condition is false.
#[macro_export(local_inner_macros)]
macro_rules! ensure {
    ($cond:expr, $e:expr) => {
        if !($cond) {
            return Err($e);
        }
    };
}

/// Result alias for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

/// Local encode/decode failures.
///
/// These indicate a wire-compatibility defect between this process and the peer and are never
/// swallowed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// The tag is neither a primitive nor recognized by the extension codec.
    #[error("unknown type tag {0}")]
    UnknownTag(TypeTag),
    /// An integer tag too wide for any known type.
    #[error("unknown type tag {0}")]
    TagOutOfRange(u64),
    /// The tag does not match the shape of the raw value it was paired with.
    #[error("type tag {tag} cannot carry a {shape} value")]
    ShapeMismatch {
        /// The tag read from the envelope.
        tag: TypeTag,
        /// The shape of the raw value.
        shape: &'static str,
    },
    /// A STRING value or DICT key was not valid UTF-8.
    #[error("invalid utf-8 in string value: {0}")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),
    /// Address bytes of the wrong length or with an unknown prefix.
    #[error("malformed address: {0}")]
    MalformedAddress(String),
    /// Containers have no implicit tag and cannot be scalar encoded.
    #[error("{0} values cannot be scalar encoded")]
    NotScalar(&'static str),
}
