//! The invocation callback.

use crate::ServiceManagerProxy;
use ee_ipc::{InvokeMessage, Status};
use ee_types::{Address, BigInt, Value};

/// What the executor reports back for a finished invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvokeOutcome<X = Address> {
    pub status: Status,
    pub step_used: BigInt,
    /// Sent scalar-encoded; containers are rejected.
    pub result: Value<X>,
}

impl<X> InvokeOutcome<X> {
    pub fn new(status: Status, step_used: impl Into<BigInt>, result: impl Into<Value<X>>) -> Self {
        Self { status, step_used: step_used.into(), result: result.into() }
    }

    /// A [Status::SUCCESS] outcome.
    pub fn success(step_used: impl Into<BigInt>, result: impl Into<Value<X>>) -> Self {
        Self::new(Status::SUCCESS, step_used, result)
    }
}

/// Executes contract methods on behalf of the proxy.
///
/// The handler gets the proxy back so it can issue nested calls and state access while the
/// invocation is in flight. Any error or panic, including an error returned by a nested
/// operation, is reported to the peer as [Status::SYSTEM_FAILURE] with the whole step limit
/// consumed.
pub trait InvokeHandler<X = Address>: Send + Sync {
    fn invoke(
        &self,
        proxy: &mut ServiceManagerProxy<X>,
        request: InvokeMessage<X>,
    ) -> eyre::Result<InvokeOutcome<X>>;
}

impl<X, F> InvokeHandler<X> for F
where
    F: Fn(&mut ServiceManagerProxy<X>, InvokeMessage<X>) -> eyre::Result<InvokeOutcome<X>>
        + Send
        + Sync,
{
    fn invoke(
        &self,
        proxy: &mut ServiceManagerProxy<X>,
        request: InvokeMessage<X>,
    ) -> eyre::Result<InvokeOutcome<X>> {
        self(proxy, request)
    }
}
