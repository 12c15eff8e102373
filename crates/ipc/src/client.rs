//! Stream transport: msgpack `[kind, payload]` values written back to back.

use crate::{IpcError, IpcResult, Transport};
use rmpv::Value as Wire;
use serde::{Deserialize, Serialize};
use std::{
    fmt,
    io::{self, BufReader, Read, Write},
    net::TcpStream,
    os::unix::net::UnixStream,
    path::PathBuf,
    str::FromStr,
};
use tracing::trace;

/// Where the service manager listens.
///
/// Accepted forms: `unix:///path`, `unix:/path`, a bare path, or `tcp://host:port`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum IpcAddress {
    Unix(PathBuf),
    Tcp(String),
}

impl FromStr for IpcAddress {
    type Err = IpcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some(host) = s.strip_prefix("tcp://") {
            match host.rsplit_once(':') {
                Some((name, port)) if !name.is_empty() && port.parse::<u16>().is_ok() => {
                    Ok(Self::Tcp(host.to_string()))
                }
                _ => Err(IpcError::InvalidAddress(s.to_string())),
            }
        } else {
            let path = s.strip_prefix("unix://").or_else(|| s.strip_prefix("unix:")).unwrap_or(s);
            if path.is_empty() || path.contains("://") {
                return Err(IpcError::InvalidAddress(s.to_string()));
            }
            Ok(Self::Unix(PathBuf::from(path)))
        }
    }
}

impl fmt::Display for IpcAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unix(path) => write!(f, "unix://{}", path.display()),
            Self::Tcp(host) => write!(f, "tcp://{host}"),
        }
    }
}

impl TryFrom<String> for IpcAddress {
    type Error = IpcError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<IpcAddress> for String {
    fn from(value: IpcAddress) -> Self {
        value.to_string()
    }
}

/// A connected socket of either family.
#[derive(Debug)]
pub enum IpcStream {
    Unix(UnixStream),
    Tcp(TcpStream),
}

impl IpcStream {
    pub fn connect(address: &IpcAddress) -> io::Result<Self> {
        match address {
            IpcAddress::Unix(path) => UnixStream::connect(path).map(Self::Unix),
            IpcAddress::Tcp(host) => TcpStream::connect(host.as_str()).map(Self::Tcp),
        }
    }
}

impl Read for IpcStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Self::Unix(s) => s.read(buf),
            Self::Tcp(s) => s.read(buf),
        }
    }
}

impl Write for IpcStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Self::Unix(s) => s.write(buf),
            Self::Tcp(s) => s.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Self::Unix(s) => s.flush(),
            Self::Tcp(s) => s.flush(),
        }
    }
}

/// [Transport] over any byte stream.
#[derive(Debug)]
pub struct IpcClient<S = IpcStream> {
    stream: BufReader<S>,
}

impl IpcClient<IpcStream> {
    /// Open a connection to the service manager.
    pub fn connect(address: &IpcAddress) -> IpcResult<Self> {
        let stream = IpcStream::connect(address)?;
        trace!(target: "ee::ipc", %address, "connected");
        Ok(Self::from_stream(stream))
    }
}

impl<S: Read + Write> IpcClient<S> {
    /// Wrap an already connected stream.
    pub fn from_stream(stream: S) -> Self {
        Self { stream: BufReader::new(stream) }
    }

    /// The underlying stream.
    pub fn get_ref(&self) -> &S {
        self.stream.get_ref()
    }

    fn write_frame(&mut self, kind: u32, payload: Wire) -> IpcResult<()> {
        let frame = Wire::Array(vec![Wire::from(kind), payload]);
        let mut buf = Vec::new();
        rmpv::encode::write_value(&mut buf, &frame).map_err(|e| IpcError::Encode(e.to_string()))?;

        let stream = self.stream.get_mut();
        stream.write_all(&buf)?;
        stream.flush()?;
        Ok(())
    }

    fn read_frame(&mut self) -> IpcResult<(u32, Wire)> {
        let frame = rmpv::decode::read_value(&mut self.stream)?;
        let mut fields = match frame {
            Wire::Array(fields) if fields.len() == 2 => fields,
            other => return Err(IpcError::Decode(format!("expected [kind, payload], got {other}"))),
        };
        let payload = fields.pop().unwrap_or(Wire::Nil);
        let kind = fields
            .pop()
            .and_then(|k| k.as_u64())
            .and_then(|k| u32::try_from(k).ok())
            .ok_or_else(|| IpcError::Decode("message kind must be an unsigned integer".into()))?;
        Ok((kind, payload))
    }
}

impl<S: Read + Write + Send> Transport for IpcClient<S> {
    fn send(&mut self, kind: u32, payload: Wire) -> IpcResult<()> {
        trace!(target: "ee::ipc", kind, "send");
        self.write_frame(kind, payload)
    }

    fn receive(&mut self) -> IpcResult<(u32, Wire)> {
        let (kind, payload) = self.read_frame()?;
        trace!(target: "ee::ipc", kind, "receive");
        Ok((kind, payload))
    }
}

#[cfg(test)]
#[path = "tests/client_tests.rs"]
mod client_tests;
