//! Handshake and connection setup.

use crate::{bin, proxy};
use ee_config::ProxyConfig;
use ee_ipc::{IpcAddress, IpcClient, Message, Transport, Wire};
use ee_proxy::ServiceManagerProxy;
use ee_test_utils::spawn_host;
use ee_types::ValueCodec;
use std::os::unix::net::UnixListener;

#[test]
fn test_handshake_payload() {
    let (transport, host) = spawn_host(|host| host.receive_raw().unwrap());
    let mut proxy = proxy(transport);
    proxy.handshake().unwrap();

    let (kind, payload) = host.join().unwrap();
    assert_eq!(kind, 0);
    assert_eq!(
        payload,
        Wire::Array(vec![Wire::from(1u8), Wire::from(std::process::id()), Wire::from("python")])
    );
}

#[test]
fn test_handshake_expects_no_reply() {
    let (transport, host) = spawn_host(|host| {
        let version = host.expect_version();
        // the next message proves the proxy did not wait for a reply
        host.expect(ee_ipc::MessageKind::SetValue);
        version
    });
    let mut proxy = proxy(transport);
    proxy.handshake().unwrap();
    proxy.set_value(b"k", b"v").unwrap();

    let version = host.join().unwrap();
    assert_eq!(version.version, 1);
    assert_eq!(version.pid, std::process::id());
    assert_eq!(version.language, "python");
}

#[test]
fn test_connect_and_from_config() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ee.socket");
    let listener = UnixListener::bind(&path).unwrap();

    let server = std::thread::spawn(move || {
        let mut versions = Vec::new();
        for _ in 0..2 {
            let (stream, _) = listener.accept().unwrap();
            let mut host = IpcClient::from_stream(stream);
            let (kind, payload) = host.receive().unwrap();
            versions.push(Message::decode(kind, &payload, &ValueCodec::default()).unwrap());
        }
        versions
    });

    let address = IpcAddress::Unix(path.clone());
    let first = ServiceManagerProxy::connect(&address, ValueCodec::default()).unwrap();
    let config = ProxyConfig { address: format!("unix://{}", path.display()).parse().unwrap() };
    let second = ServiceManagerProxy::from_config(&config, ValueCodec::default()).unwrap();

    let versions = server.join().unwrap();
    assert_eq!(versions.len(), 2);
    assert!(versions.iter().all(|m| matches!(m, Message::Version(v) if v.language == "python")));
    drop((first, second));
}

#[test]
fn test_connect_refused() {
    let dir = tempfile::tempdir().unwrap();
    let address = IpcAddress::Unix(dir.path().join("missing.socket"));
    let err = ServiceManagerProxy::connect(&address, ValueCodec::default()).unwrap_err();
    assert!(matches!(err, ee_proxy::ProxyError::Ipc(ee_ipc::IpcError::StdIo(_))));
}

#[test]
fn test_serve_returns_on_clean_close() {
    let (transport, host) = spawn_host(|_| ());
    host.join().unwrap();
    let mut proxy = proxy(transport);
    proxy.serve().unwrap();
}

#[test]
fn test_serve_fails_on_garbage() {
    let (transport, host) = spawn_host(|host| host.send_raw(42, bin(Vec::new())).unwrap());
    host.join().unwrap();
    let mut proxy = proxy(transport);
    assert!(matches!(
        proxy.serve(),
        Err(ee_proxy::ProxyError::Ipc(ee_ipc::IpcError::UnknownKind(42)))
    ));
}
