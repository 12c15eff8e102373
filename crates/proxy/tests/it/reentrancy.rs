//! Nested CALL / INVOKE ordering.

use crate::proxy;
use assert_matches::assert_matches;
use ee_ipc::{CallMessage, InvokeMessage, Message, MessageKind, ResultMessage, Status, Wire};
use ee_proxy::{InvokeOutcome, ProxyError, ProxyState, ServiceManagerProxy};
use ee_test_utils::{invoke_request, spawn_host};
use ee_types::{encode_int, Address, BigInt, TypedValue, Value};
use eyre::eyre;
use std::sync::{Arc, Mutex};

fn callee(n: u8) -> Address {
    Address::contract([n; 20])
}

fn call_result(step_used: u64, result: &[u8]) -> Message {
    Message::Result(ResultMessage {
        status: Status::SUCCESS,
        step_used: BigInt::from(step_used),
        result: Some(result.to_vec()),
    })
}

fn expect_call(host: &mut ee_test_utils::HostPeer) -> CallMessage {
    match host.expect(MessageKind::Call) {
        Message::Call(call) => call,
        other => panic!("expected CALL, received {other:?}"),
    }
}

/// Records handler progress so ordering can be asserted from the test thread.
#[derive(Clone, Default)]
struct Journal(Arc<Mutex<Vec<String>>>);

impl Journal {
    fn push(&self, entry: impl Into<String>) {
        self.0.lock().unwrap().push(entry.into());
    }

    fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

#[test]
fn test_nested_invoke_serviced_before_call_returns() {
    let (transport, host) = spawn_host(|host| {
        host.invoke(invoke_request("outer", 1000, TypedValue::Nil)).unwrap();

        let call = expect_call(host);
        // the peer dispatches into the executor before answering the call
        host.invoke(invoke_request("nested", 300, TypedValue::Nil)).unwrap();
        let nested = host.expect_result();

        host.send(call_result(11, b"call-ok")).unwrap();
        let outer = host.expect_result();
        (call, nested, outer)
    });

    let journal = Journal::default();
    let log = journal.clone();
    let mut proxy = proxy(transport);
    proxy.set_invoke_handler(
        move |proxy: &mut ServiceManagerProxy, req: InvokeMessage| -> eyre::Result<InvokeOutcome> {
            log.push(format!("{}:start", req.method));
            match req.method.as_str() {
                "outer" => {
                    let params = Value::from("arg");
                    let reply = proxy.call(callee(0xdd), 5, 500, "inner", &params)?;
                    log.push("outer:end");
                    assert_eq!(reply.status, Status::SUCCESS);
                    Ok(InvokeOutcome::success(reply.step_used + 1, reply.result.unwrap_or_default()))
                }
                "nested" => Ok(InvokeOutcome::success(7, "nested-ok")),
                other => Err(eyre!("unknown method {other}")),
            }
        },
    );
    proxy.serve().unwrap();

    let (call, nested, outer) = host.join().unwrap();
    assert_eq!(call.to, callee(0xdd));
    assert_eq!(call.value, BigInt::from(5));
    assert_eq!(call.step_limit, BigInt::from(500));
    assert_eq!(call.method, "inner");
    assert_eq!(call.params, b"arg".to_vec());

    assert_eq!(nested.status, Status::SUCCESS);
    assert_eq!(nested.step_used, BigInt::from(7));
    assert_eq!(nested.result, Some(b"nested-ok".to_vec()));

    assert_eq!(outer.step_used, BigInt::from(12));
    assert_eq!(outer.result, Some(b"call-ok".to_vec()));

    assert_eq!(journal.entries(), vec!["outer:start", "nested:start", "outer:end"]);
}

#[test]
fn test_call_depth_follows_lifo_order() {
    // a -> CALL -> b -> CALL -> c, results unwind c, b, a
    let (transport, host) = spawn_host(|host| {
        let mut observed = Vec::new();
        host.invoke(invoke_request("a", 1000, TypedValue::Nil)).unwrap();
        observed.push(expect_call(host).method);
        host.invoke(invoke_request("b", 800, TypedValue::Nil)).unwrap();
        observed.push(expect_call(host).method);
        host.invoke(invoke_request("c", 600, TypedValue::Nil)).unwrap();
        observed.push(String::from_utf8(host.expect_result().result.unwrap()).unwrap());

        // answer the call issued by b, then the one issued by a
        host.send(call_result(1, b"to-b")).unwrap();
        observed.push(String::from_utf8(host.expect_result().result.unwrap()).unwrap());
        host.send(call_result(1, b"to-a")).unwrap();
        observed.push(String::from_utf8(host.expect_result().result.unwrap()).unwrap());
        observed
    });

    let mut proxy = proxy(transport);
    proxy.set_invoke_handler(
        |proxy: &mut ServiceManagerProxy, req: InvokeMessage| -> eyre::Result<InvokeOutcome> {
            let method = req.method.as_str();
            if method == "c" {
                return Ok(InvokeOutcome::success(1, "c-done"));
            }
            let reply = proxy.call(callee(1), 0, 100, &format!("from-{method}"), &Value::Nil)?;
            let got = String::from_utf8(reply.result.unwrap_or_default())?;
            Ok(InvokeOutcome::success(1, format!("{method}-done({got})")))
        },
    );
    proxy.serve().unwrap();

    assert_eq!(
        host.join().unwrap(),
        vec!["from-a", "from-b", "c-done", "b-done(to-b)", "a-done(to-a)"]
    );
}

#[test]
fn test_call_outside_invoke_and_status_passthrough() {
    let (transport, host) = spawn_host(|host| {
        let call = expect_call(host);
        host.send(Message::Result(ResultMessage {
            status: Status(32),
            step_used: BigInt::from(250),
            result: None,
        }))
        .unwrap();
        call
    });
    let mut proxy = proxy(transport);
    let reply = proxy.call(callee(2), -1, 250, "balanceOf", &Value::from(vec![1u8, 2])).unwrap();

    assert_eq!(reply.status, Status(32));
    assert_eq!(reply.step_used, BigInt::from(250));
    assert_eq!(reply.result, None);
    let call = host.join().unwrap();
    assert_eq!(call.value, BigInt::from(-1));
    assert_eq!(call.params, vec![1, 2]);
}

/// Result every masked invocation failure reports.
fn system_failure(step_limit: u64) -> ResultMessage {
    ResultMessage { status: Status::SYSTEM_FAILURE, step_used: BigInt::from(step_limit), result: None }
}

#[test]
fn test_unexpected_message_while_awaiting_result() {
    let (transport, host) = spawn_host(|host| {
        host.invoke(invoke_request("outer", 1000, TypedValue::Nil)).unwrap();
        expect_call(host);
        host.send(Message::GetValue(b"stray".to_vec())).unwrap();
        host.expect_result()
    });
    let seen = Arc::new(Mutex::new(None));
    let recorded = Arc::clone(&seen);
    let mut proxy = proxy(transport);
    proxy.set_invoke_handler(
        move |proxy: &mut ServiceManagerProxy, _: InvokeMessage| -> eyre::Result<InvokeOutcome> {
            if let Err(e) = proxy.call(callee(3), 0, 10, "x", &Value::Nil) {
                *recorded.lock().unwrap() = Some(e.to_string());
                return Err(e.into());
            }
            Ok(InvokeOutcome::success(0, Value::Nil))
        },
    );

    // the violation is answered with a RESULT and the loop keeps running until the host closes
    proxy.serve().unwrap();
    assert_eq!(host.join().unwrap(), system_failure(1000));
    let expected = ProxyError::UnexpectedMessage {
        kind: MessageKind::GetValue,
        state: ProxyState::AwaitingResult,
    };
    assert_eq!(seen.lock().unwrap().take(), Some(expected.to_string()));
}

#[test]
fn test_nested_get_value_mismatch_is_masked() {
    let (transport, host) = spawn_host(|host| {
        host.invoke(invoke_request("read", 1000, TypedValue::Nil)).unwrap();
        host.expect(MessageKind::GetValue);
        host.send(call_result(1, b"not a value")).unwrap();
        let failed = host.expect_result();

        // the loop is still serving
        host.invoke(invoke_request("ok", 50, TypedValue::Nil)).unwrap();
        (failed, host.expect_result())
    });
    let mut proxy = proxy(transport);
    proxy.set_invoke_handler(
        |proxy: &mut ServiceManagerProxy, req: InvokeMessage| -> eyre::Result<InvokeOutcome> {
            if req.method == "read" {
                proxy.get_value(b"k")?;
            }
            Ok(InvokeOutcome::success(2, "done"))
        },
    );
    proxy.serve().unwrap();

    let (failed, next) = host.join().unwrap();
    assert_eq!(failed, system_failure(1000));
    assert_eq!(next.status, Status::SUCCESS);
    assert_eq!(next.result, Some(b"done".to_vec()));
}

#[test]
fn test_nested_container_params_are_masked() {
    let (transport, host) = spawn_host(|host| {
        host.invoke(invoke_request("outer", 700, TypedValue::Nil)).unwrap();
        // no CALL is sent, the RESULT comes straight back
        let failed = host.receive_raw().unwrap();
        host.invoke(invoke_request("ok", 50, TypedValue::Nil)).unwrap();
        (failed, host.expect_result())
    });
    let mut proxy = proxy(transport);
    proxy.set_invoke_handler(
        |proxy: &mut ServiceManagerProxy, req: InvokeMessage| -> eyre::Result<InvokeOutcome> {
            if req.method == "outer" {
                proxy.call(callee(6), 0, 10, "x", &Value::List(vec![]))?;
            }
            Ok(InvokeOutcome::success(1, Value::Nil))
        },
    );
    proxy.serve().unwrap();

    let ((kind, payload), next) = host.join().unwrap();
    assert_eq!(kind, MessageKind::Result.tag());
    assert_eq!(
        payload,
        Wire::Array(vec![
            Wire::from(1u8),
            Wire::Binary(encode_int(&BigInt::from(700))),
            Wire::Nil,
        ])
    );
    assert_eq!(next.status, Status::SUCCESS);
}

#[test]
fn test_connection_lost_while_awaiting_result() {
    let (transport, host) = spawn_host(|host| {
        expect_call(host);
    });
    let mut proxy = proxy(transport);
    let err = proxy.call(callee(4), 0, 10, "x", &Value::Nil).unwrap_err();
    assert_matches!(err, ProxyError::Ipc(ee_ipc::IpcError::Closed));
    host.join().unwrap();
}

#[test]
fn test_container_params_rejected_before_send() {
    let (transport, host) = spawn_host(|host| host.receive().map(|m| m.kind()));
    let mut proxy = proxy(transport);
    let err = proxy.call(callee(5), 0, 10, "x", &Value::List(vec![])).unwrap_err();
    assert_matches!(err, ProxyError::Codec(_));
    assert!(!err.ends_connection());
    drop(proxy);
    // nothing reached the host
    assert_matches!(host.join().unwrap(), Err(ee_ipc::IpcError::Closed));
}
