// SPDX-License-Identifier: Apache-2.0
//! IPC channel to the service manager.
//!
//! The [Message] layer maps each message kind onto its payload layout. [IpcClient] carries
//! messages over a Unix or TCP stream as back-to-back msgpack values.

mod client;
mod error;
mod message;
mod transport;
mod wire;

pub use client::*;
pub use error::*;
pub use message::*;
pub use transport::*;
pub use wire::{typed_from_wire, typed_to_wire};

// re-exports for easier maintainability
pub use rmpv::Value as Wire;
