// SPDX-License-Identifier: Apache-2.0
//! Value model shared by the proxy and its peer.
//!
//! Integers, tags, the [TypedValue] envelope, and the codec that maps native [Value]s onto it.

#[macro_use]
pub mod error;
mod address;
mod codec;
mod int;
mod tag;
mod typed;
mod value;
pub use address::*;
pub use codec::*;
pub use error::{CodecError, CodecResult};
pub use int::*;
pub use tag::*;
pub use typed::*;
pub use value::*;

// re-exports for easier maintainability
pub use indexmap::IndexMap;
pub use num_bigint::{BigInt, Sign};
