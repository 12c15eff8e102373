//! Proxy engine tests against a scripted service manager.

use ee_ipc::{InvokeMessage, Wire};
use ee_proxy::{InvokeOutcome, ServiceManagerProxy};
use ee_test_utils::{init_test_tracing, ExecutorTransport};
use ee_types::ValueCodec;

mod connect;
mod reentrancy;

fn proxy(transport: ExecutorTransport) -> ServiceManagerProxy {
    init_test_tracing();
    ServiceManagerProxy::new(transport, ValueCodec::default())
}

fn bin(bytes: impl Into<Vec<u8>>) -> Wire {
    Wire::Binary(bytes.into())
}

/// Handler used where the test only exercises the wire.
fn succeed(_: &mut ServiceManagerProxy, _: InvokeMessage) -> eyre::Result<InvokeOutcome> {
    Ok(InvokeOutcome::success(42, b"ok".to_vec()))
}
