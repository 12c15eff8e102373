//! The proxy state machine.
//!
//! After the handshake the proxy is either dispatching (blocked at the top level waiting for
//! INVOKE) or awaiting the RESULT of a CALL it issued. Awaiting nests: an INVOKE that arrives
//! while a CALL is outstanding is handled in place, and its handler may CALL again. The call
//! stack is the only record of nesting depth.

use crate::{InvokeHandler, InvokeOutcome, ProxyError, ProxyResult};
use ee_config::ProxyConfig;
use ee_ipc::{
    CallMessage, EventMessage, InvokeMessage, IpcAddress, IpcClient, IpcError, Message,
    MessageKind, ResultMessage, SetValueMessage, Status, Transport, VersionMessage,
};
use ee_types::{Address, BigInt, CodecResult, Value, ValueCodec};
use eyre::eyre;
use std::{
    any::Any,
    fmt,
    panic::{self, AssertUnwindSafe},
    sync::Arc,
};
use tracing::{debug, error, warn};

/// Where the proxy is when a message arrives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProxyState {
    /// Top-level loop, only INVOKE is accepted.
    Dispatching,
    /// Inside [ServiceManagerProxy::call], INVOKE and RESULT are accepted.
    AwaitingResult,
}

impl fmt::Display for ProxyState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Dispatching => f.write_str("dispatching"),
            Self::AwaitingResult => f.write_str("awaiting a call result"),
        }
    }
}

/// The reply to a nested CALL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallResult {
    /// Passed through from the peer as is.
    pub status: Status,
    pub step_used: BigInt,
    /// Raw result bytes; the caller knows their type.
    pub result: Option<Vec<u8>>,
}

impl From<ResultMessage> for CallResult {
    fn from(msg: ResultMessage) -> Self {
        Self { status: msg.status, step_used: msg.step_used, result: msg.result }
    }
}

/// Bridge between a contract executor and the service manager.
///
/// One instance per connection. Nothing is shared between instances.
pub struct ServiceManagerProxy<X = Address> {
    transport: Box<dyn Transport>,
    codec: ValueCodec<X>,
    handler: Option<Arc<dyn InvokeHandler<X>>>,
}

impl<X> ServiceManagerProxy<X>
where
    X: Clone,
{
    /// Create a proxy over an established transport. No handshake is sent.
    pub fn new(transport: impl Transport + 'static, codec: ValueCodec<X>) -> Self {
        Self { transport: Box::new(transport), codec, handler: None }
    }

    /// Connect to the service manager and announce this executor.
    pub fn connect(address: &IpcAddress, codec: ValueCodec<X>) -> ProxyResult<Self> {
        let client = IpcClient::connect(address)?;
        let mut proxy = Self::new(client, codec);
        proxy.handshake()?;
        debug!(target: "ee::proxy", %address, "connected to service manager");
        Ok(proxy)
    }

    /// Connect to the address in `config`.
    pub fn from_config(config: &ProxyConfig, codec: ValueCodec<X>) -> ProxyResult<Self> {
        Self::connect(&config.address, codec)
    }

    /// Send the VERSION announcement. The peer does not reply.
    pub fn handshake(&mut self) -> ProxyResult<()> {
        self.send(Message::Version(VersionMessage::current()))
    }

    /// Register the callback that executes INVOKE requests.
    pub fn set_invoke_handler(&mut self, handler: impl InvokeHandler<X> + 'static) {
        self.handler = Some(Arc::new(handler));
    }

    pub fn codec(&self) -> &ValueCodec<X> {
        &self.codec
    }

    /// Top-level loop: service INVOKE requests until the peer disconnects.
    ///
    /// Returns `Ok(())` on a clean close. Any message other than INVOKE is fatal.
    pub fn serve(&mut self) -> ProxyResult<()> {
        loop {
            let message = match self.receive() {
                Ok(message) => message,
                Err(ProxyError::Ipc(IpcError::Closed)) => {
                    debug!(target: "ee::proxy", "service manager closed the connection");
                    return Ok(());
                }
                Err(e) => return Err(e),
            };
            match message {
                Message::Invoke(invoke) => self.handle_invoke(invoke)?,
                other => return Err(unexpected(other.kind(), ProxyState::Dispatching)),
            }
        }
    }

    /// Issue a nested call and block for its result.
    ///
    /// INVOKE requests arriving before the RESULT are serviced first, in order.
    pub fn call(
        &mut self,
        to: X,
        value: impl Into<BigInt>,
        step_limit: impl Into<BigInt>,
        method: &str,
        params: &Value<X>,
    ) -> ProxyResult<CallResult> {
        let params = self.codec.encode(params)?;
        self.send(Message::Call(CallMessage {
            to,
            value: value.into(),
            step_limit: step_limit.into(),
            method: method.to_string(),
            params,
        }))?;

        loop {
            match self.receive()? {
                Message::Invoke(invoke) => self.handle_invoke(invoke)?,
                Message::Result(result) => {
                    debug!(target: "ee::proxy", status = %result.status, method, "call returned");
                    return Ok(result.into());
                }
                other => return Err(unexpected(other.kind(), ProxyState::AwaitingResult)),
            }
        }
    }

    /// Read a value from the peer's store. A missing key reads as empty bytes.
    pub fn get_value(&mut self, key: &[u8]) -> ProxyResult<Vec<u8>> {
        match self.request(Message::GetValue(key.to_vec()))? {
            Message::GetValue(value) => Ok(value),
            other => Err(mismatch(MessageKind::GetValue, other.kind())),
        }
    }

    /// Write a value to the peer's store.
    pub fn set_value(&mut self, key: &[u8], value: &[u8]) -> ProxyResult<()> {
        self.send(Message::SetValue(SetValueMessage { key: key.to_vec(), value: value.to_vec() }))
    }

    /// Fetch the execution context from the peer.
    pub fn get_info(&mut self) -> ProxyResult<Value<X>> {
        match self.request(Message::GetInfo(None))? {
            Message::GetInfo(Some(info)) => Ok(self.codec.decode_any(&info)?),
            Message::GetInfo(None) => Ok(Value::Nil),
            other => Err(mismatch(MessageKind::GetInfo, other.kind())),
        }
    }

    /// Emit an event. The first `indexed` values are indexed by the peer.
    pub fn send_event(&mut self, indexed: u16, values: &[Value<X>]) -> ProxyResult<()> {
        let values = values.iter().map(|v| self.codec.encode(v)).collect::<CodecResult<_>>()?;
        self.send(Message::Event(EventMessage { indexed, values }))
    }

    /// Run the handler and reply with a RESULT.
    ///
    /// Every handler failure is masked, including errors from nested operations. Only a failure
    /// to send the RESULT escapes.
    fn handle_invoke(&mut self, invoke: InvokeMessage<X>) -> ProxyResult<()> {
        debug!(
            target: "ee::proxy",
            method = %invoke.method,
            step_limit = %invoke.step_limit,
            "invoke"
        );
        let step_limit = invoke.step_limit.clone();

        let reply = self.run_handler(invoke).and_then(|outcome| {
            let result = self.codec.encode(&outcome.result)?;
            Ok(ResultMessage {
                status: outcome.status,
                step_used: outcome.step_used,
                result: Some(result),
            })
        });
        let reply = match reply {
            Ok(reply) => reply,
            Err(err) => {
                match err.downcast_ref::<ProxyError>() {
                    Some(nested) if nested.ends_connection() => {
                        error!(target: "ee::proxy", ?err, "invocation failed on a broken exchange")
                    }
                    _ => warn!(target: "ee::proxy", ?err, "invocation failed"),
                }
                ResultMessage { status: Status::SYSTEM_FAILURE, step_used: step_limit, result: None }
            }
        };
        self.send(Message::Result(reply))
    }

    fn run_handler(&mut self, invoke: InvokeMessage<X>) -> eyre::Result<InvokeOutcome<X>> {
        // cloned out so the handler can borrow the proxy mutably for nested calls
        let handler = self.handler.clone().ok_or_else(|| eyre!("no invoke handler registered"))?;
        panic::catch_unwind(AssertUnwindSafe(|| handler.invoke(self, invoke))).unwrap_or_else(
            |panic| Err(eyre!("invoke handler panicked: {}", panic_message(panic.as_ref()))),
        )
    }

    fn send(&mut self, message: Message<X>) -> ProxyResult<()> {
        let (kind, payload) = message.encode(&self.codec)?;
        debug!(target: "ee::proxy", %kind, "send");
        self.transport.send(kind.tag(), payload)?;
        Ok(())
    }

    fn receive(&mut self) -> ProxyResult<Message<X>> {
        let (kind, payload) = self.transport.receive()?;
        let message = Message::decode(kind, &payload, &self.codec)?;
        debug!(target: "ee::proxy", kind = %message.kind(), "receive");
        Ok(message)
    }

    /// Send a request whose reply must be of the same kind.
    fn request(&mut self, message: Message<X>) -> ProxyResult<Message<X>> {
        let (kind, payload) = message.encode(&self.codec)?;
        let (tag, payload) = self.transport.send_and_receive(kind.tag(), payload)?;
        let received = MessageKind::from_tag(tag as u64)?;
        if received != kind {
            return Err(mismatch(kind, received));
        }
        Ok(Message::decode(tag, &payload, &self.codec)?)
    }
}

impl<X> fmt::Debug for ServiceManagerProxy<X> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceManagerProxy")
            .field("codec", &self.codec)
            .field("handler", &self.handler.is_some())
            .finish_non_exhaustive()
    }
}

fn mismatch(expected: MessageKind, received: MessageKind) -> ProxyError {
    error!(target: "ee::proxy", %expected, %received, "protocol mismatch");
    ProxyError::ProtocolMismatch { expected, received }
}

fn unexpected(kind: MessageKind, state: ProxyState) -> ProxyError {
    error!(target: "ee::proxy", %kind, %state, "unexpected message");
    ProxyError::UnexpectedMessage { kind, state }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    panic
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| panic.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string payload")
}
