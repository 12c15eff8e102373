//! Account addresses and the default extension codec.

use crate::{CodecError, CodecResult, ExtensionCodec, TypeTag};
use std::{fmt, str::FromStr};

/// Length of the account identifier following the prefix byte.
pub const ADDRESS_ID_LENGTH: usize = 20;

/// Length of an encoded address: prefix byte and identifier.
pub const ADDRESS_LENGTH: usize = ADDRESS_ID_LENGTH + 1;

/// An account address.
///
/// Externally owned accounts display as `hx...`, contracts as `cx...`.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Address {
    contract: bool,
    id: [u8; ADDRESS_ID_LENGTH],
}

impl Address {
    /// Create an externally owned account address.
    pub fn account(id: [u8; ADDRESS_ID_LENGTH]) -> Self {
        Self { contract: false, id }
    }

    /// Create a contract address.
    pub fn contract(id: [u8; ADDRESS_ID_LENGTH]) -> Self {
        Self { contract: true, id }
    }

    /// Whether this address belongs to a contract.
    pub fn is_contract(&self) -> bool {
        self.contract
    }

    /// The 20-byte identifier.
    pub fn id(&self) -> &[u8; ADDRESS_ID_LENGTH] {
        &self.id
    }

    /// The wire form: prefix byte followed by the identifier.
    pub fn to_bytes(&self) -> [u8; ADDRESS_LENGTH] {
        let mut bytes = [0u8; ADDRESS_LENGTH];
        bytes[0] = self.contract as u8;
        bytes[1..].copy_from_slice(&self.id);
        bytes
    }

    /// Parse the wire form.
    pub fn from_bytes(bytes: &[u8]) -> CodecResult<Self> {
        ensure!(
            bytes.len() == ADDRESS_LENGTH,
            CodecError::MalformedAddress(format!(
                "expected {ADDRESS_LENGTH} bytes, received {}",
                bytes.len()
            ))
        );
        let contract = match bytes[0] {
            0 => false,
            1 => true,
            prefix => {
                return Err(CodecError::MalformedAddress(format!("unknown prefix byte {prefix}")))
            }
        };
        let mut id = [0u8; ADDRESS_ID_LENGTH];
        id.copy_from_slice(&bytes[1..]);
        Ok(Self { contract, id })
    }

    fn prefix(&self) -> &'static str {
        if self.contract {
            "cx"
        } else {
            "hx"
        }
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.prefix(), hex::encode(self.id))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({self})")
    }
}

impl FromStr for Address {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (contract, digits) = if let Some(digits) = s.strip_prefix("hx") {
            (false, digits)
        } else if let Some(digits) = s.strip_prefix("cx") {
            (true, digits)
        } else {
            return Err(CodecError::MalformedAddress(format!("missing hx/cx prefix: {s}")));
        };

        let mut id = [0u8; ADDRESS_ID_LENGTH];
        hex::decode_to_slice(digits, &mut id)
            .map_err(|e| CodecError::MalformedAddress(format!("{s}: {e}")))?;
        Ok(Self { contract, id })
    }
}

/// The default extension codec: understands [TypeTag::ADDRESS] and nothing else.
#[derive(Debug, Clone, Copy, Default)]
pub struct AddressCodec;

impl ExtensionCodec for AddressCodec {
    type Custom = Address;

    fn encode(&self, value: &Address) -> CodecResult<(TypeTag, Vec<u8>)> {
        Ok((TypeTag::ADDRESS, value.to_bytes().to_vec()))
    }

    fn decode(&self, tag: TypeTag, bytes: &[u8]) -> CodecResult<Address> {
        match tag {
            TypeTag::ADDRESS => Address::from_bytes(bytes),
            other => Err(CodecError::UnknownTag(other)),
        }
    }
}
