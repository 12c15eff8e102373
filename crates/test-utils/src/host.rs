//! A scripted service manager speaking the real wire format.

use ee_ipc::{
    InvokeMessage, IpcClient, IpcResult, Message, MessageKind, ResultMessage, Transport,
    VersionMessage, Wire,
};
use ee_types::{Address, BigInt, TypedValue, ValueCodec};
use std::{os::unix::net::UnixStream, thread::JoinHandle};

/// Transport handed to the proxy under test.
pub type ExecutorTransport = IpcClient<UnixStream>;

/// The host end of a connected socket pair.
#[derive(Debug)]
pub struct HostPeer {
    client: IpcClient<UnixStream>,
    codec: ValueCodec,
}

/// Create a connected (executor transport, host) pair.
pub fn connected_pair() -> (ExecutorTransport, HostPeer) {
    let (executor, host) = UnixStream::pair().expect("socket pair");
    (
        IpcClient::from_stream(executor),
        HostPeer { client: IpcClient::from_stream(host), codec: ValueCodec::default() },
    )
}

/// Run `script` as the host on its own thread.
///
/// The host end is dropped when the script returns, which closes the connection.
pub fn spawn_host<F, T>(script: F) -> (ExecutorTransport, JoinHandle<T>)
where
    F: FnOnce(&mut HostPeer) -> T + Send + 'static,
    T: Send + 'static,
{
    let (executor, mut host) = connected_pair();
    let handle = std::thread::spawn(move || script(&mut host));
    (executor, handle)
}

/// Build an INVOKE from a fixed sender to a fixed contract.
pub fn invoke_request(method: &str, step_limit: u64, params: TypedValue) -> InvokeMessage {
    InvokeMessage {
        code: "/contracts/test".to_string(),
        from: Address::account([0xaa; 20]),
        to: Address::contract([0xcc; 20]),
        value: BigInt::from(0),
        step_limit: BigInt::from(step_limit),
        method: method.to_string(),
        params,
    }
}

impl HostPeer {
    pub fn codec(&self) -> &ValueCodec {
        &self.codec
    }

    pub fn send(&mut self, message: Message) -> IpcResult<()> {
        let (kind, payload) = message.encode(&self.codec)?;
        self.client.send(kind.tag(), payload)
    }

    pub fn receive(&mut self) -> IpcResult<Message> {
        let (kind, payload) = self.client.receive()?;
        Message::decode(kind, &payload, &self.codec)
    }

    /// Send an undecoded message.
    pub fn send_raw(&mut self, kind: u32, payload: Wire) -> IpcResult<()> {
        self.client.send(kind, payload)
    }

    /// Receive without decoding the payload.
    pub fn receive_raw(&mut self) -> IpcResult<(u32, Wire)> {
        self.client.receive()
    }

    pub fn invoke(&mut self, request: InvokeMessage) -> IpcResult<()> {
        self.send(Message::Invoke(request))
    }

    /// Receive the next message and require it to be of `kind`.
    pub fn expect(&mut self, kind: MessageKind) -> Message {
        let message = self.receive().expect("host receive");
        assert_eq!(message.kind(), kind, "host expected {kind}, received {message:?}");
        message
    }

    pub fn expect_version(&mut self) -> VersionMessage {
        match self.expect(MessageKind::Version) {
            Message::Version(version) => version,
            other => panic!("expected VERSION, received {other:?}"),
        }
    }

    pub fn expect_result(&mut self) -> ResultMessage {
        match self.expect(MessageKind::Result) {
            Message::Result(result) => result,
            other => panic!("expected RESULT, received {other:?}"),
        }
    }
}
