// SPDX-License-Identifier: Apache-2.0
//! Proxy engine between a contract executor and the service manager.
//!
//! The service manager dispatches INVOKE requests. While servicing one, the executor can issue
//! nested calls back, read and write state, fetch context info, and emit events, all over the
//! same synchronous connection.

mod error;
mod handler;
mod proxy;

pub use error::*;
pub use handler::*;
pub use proxy::*;
