//! Blocking transport capability the proxy drives.

use crate::IpcResult;
use rmpv::Value as Wire;

/// A bidirectional, strictly synchronous message channel.
///
/// There is no timeout: [Transport::receive] blocks until the peer sends or the connection
/// drops.
pub trait Transport: Send {
    /// Write one `(kind, payload)` message.
    fn send(&mut self, kind: u32, payload: Wire) -> IpcResult<()>;

    /// Block until the next message arrives.
    fn receive(&mut self) -> IpcResult<(u32, Wire)>;

    /// Send a request and block for the next message.
    fn send_and_receive(&mut self, kind: u32, payload: Wire) -> IpcResult<(u32, Wire)> {
        self.send(kind, payload)?;
        self.receive()
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn send(&mut self, kind: u32, payload: Wire) -> IpcResult<()> {
        (**self).send(kind, payload)
    }

    fn receive(&mut self) -> IpcResult<(u32, Wire)> {
        (**self).receive()
    }

    fn send_and_receive(&mut self, kind: u32, payload: Wire) -> IpcResult<(u32, Wire)> {
        (**self).send_and_receive(kind, payload)
    }
}
