//! Type tags for [crate::TypedValue] envelopes.

use std::fmt;

/// The numeric tag identifying how a raw value is interpreted.
///
/// Numbering must match the peer exactly. Tags from [TypeTag::CUSTOM] up belong to the extension
/// codec, except [TypeTag::INT] which the peer places inside that range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TypeTag(pub u8);

impl TypeTag {
    pub const NIL: Self = Self(0);
    pub const DICT: Self = Self(1);
    pub const LIST: Self = Self(2);
    pub const BYTES: Self = Self(3);
    pub const STRING: Self = Self(4);

    /// First tag of the extension range.
    pub const CUSTOM: Self = Self(10);
    /// Account address, the one reserved extension tag.
    pub const ADDRESS: Self = Self::CUSTOM;
    /// Arbitrary precision integer.
    pub const INT: Self = Self(Self::CUSTOM.0 + 1);

    /// True for tags the extension codec owns.
    pub fn is_custom(self) -> bool {
        self >= Self::CUSTOM && self != Self::INT
    }

    /// True for tags whose raw value is a nested container or absent.
    pub fn is_structural(self) -> bool {
        matches!(self, Self::NIL | Self::DICT | Self::LIST)
    }
}

impl From<u8> for TypeTag {
    fn from(tag: u8) -> Self {
        Self(tag)
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::NIL => f.write_str("NIL"),
            Self::DICT => f.write_str("DICT"),
            Self::LIST => f.write_str("LIST"),
            Self::BYTES => f.write_str("BYTES"),
            Self::STRING => f.write_str("STRING"),
            Self::ADDRESS => f.write_str("ADDRESS"),
            Self::INT => f.write_str("INT"),
            TypeTag(other) => write!(f, "CUSTOM({other})"),
        }
    }
}
