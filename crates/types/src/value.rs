//! Native dynamic values.

use crate::Address;
use indexmap::IndexMap;
use num_bigint::BigInt;

/// Mapping type for [Value::Dict]. Iteration follows insertion order.
pub type Dict<X = Address> = IndexMap<String, Value<X>>;

/// A dynamic value exchanged with the peer.
///
/// `X` is the domain type carried by the extension codec.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value<X = Address> {
    Nil,
    Int(BigInt),
    Bytes(Vec<u8>),
    String(String),
    List(Vec<Value<X>>),
    Dict(Dict<X>),
    Custom(X),
}

impl<X> Value<X> {
    /// Short name of the variant, used in error reports.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::Int(_) => "int",
            Value::Bytes(_) => "bytes",
            Value::String(_) => "string",
            Value::List(_) => "list",
            Value::Dict(_) => "dict",
            Value::Custom(_) => "custom",
        }
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    pub fn as_int(&self) -> Option<&BigInt> {
        match self {
            Value::Int(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value<X>]> {
        match self {
            Value::List(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_dict(&self) -> Option<&Dict<X>> {
        match self {
            Value::Dict(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_custom(&self) -> Option<&X> {
        match self {
            Value::Custom(v) => Some(v),
            _ => None,
        }
    }
}

impl<X> Default for Value<X> {
    fn default() -> Self {
        Value::Nil
    }
}

impl<X> From<BigInt> for Value<X> {
    fn from(v: BigInt) -> Self {
        Value::Int(v)
    }
}

macro_rules! impl_from_int {
    ($($t:ty),*) => {
        $(
            impl<X> From<$t> for Value<X> {
                fn from(v: $t) -> Self {
                    Value::Int(BigInt::from(v))
                }
            }
        )*
    };
}

impl_from_int!(i8, i16, i32, i64, i128, u8, u16, u32, u64, u128, usize);

impl<X> From<&str> for Value<X> {
    fn from(v: &str) -> Self {
        Value::String(v.to_owned())
    }
}

impl<X> From<String> for Value<X> {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl<X> From<Vec<u8>> for Value<X> {
    fn from(v: Vec<u8>) -> Self {
        Value::Bytes(v)
    }
}

impl<X> From<&[u8]> for Value<X> {
    fn from(v: &[u8]) -> Self {
        Value::Bytes(v.to_vec())
    }
}

impl<X> From<Vec<Value<X>>> for Value<X> {
    fn from(v: Vec<Value<X>>) -> Self {
        Value::List(v)
    }
}

impl<X> From<Dict<X>> for Value<X> {
    fn from(v: Dict<X>) -> Self {
        Value::Dict(v)
    }
}

impl From<Address> for Value<Address> {
    fn from(v: Address) -> Self {
        Value::Custom(v)
    }
}

impl<X, T: Into<Value<X>>> From<Option<T>> for Value<X> {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Nil)
    }
}
