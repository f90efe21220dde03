//! End-to-end tests of the WebSocket progress simulation against an
//! in-process signaling server.
//!
//! The server below emulates the service's authoritative call state machine:
//! legs identify themselves by the auth token in their hello, state changes
//! are broadcast to every joined leg, and each timeout behavior terminates
//! the call with reason `timeout` when the expected step never arrives.
//! Every test binds to port 0 for isolation.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message;

use callbench::signaling::handlers::Variant;
use callbench::signaling::{simulate_call, CallSetup};

const CALLER_TOKEN: &str = "caller-tok";
const CALLEE_TOKEN: &str = "callee-tok";
const CALL_ID: &str = "call-0001";

/// How long the emulated server waits before firing a timeout termination.
const SERVER_TIMEOUT: Duration = Duration::from_millis(300);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ServerBehavior {
    /// Drive the full negotiation to connected.
    Normal,
    /// Terminate with `timeout` if no callee joins.
    SupervisoryTimeout,
    /// Terminate with `timeout` if the caller never accepts.
    RingingTimeout,
    /// Terminate with `timeout` if media-up never completes on both legs.
    ConnectionTimeout,
    /// Reject the accepted call with a non-timeout reason.
    RejectBusy,
    /// Acknowledge the caller's hello, then go quiet.
    Silent,
}

#[derive(Default)]
struct CallState {
    caller: Option<mpsc::UnboundedSender<String>>,
    callee: Option<mpsc::UnboundedSender<String>>,
    accepted: bool,
    media_up: u32,
}

impl CallState {
    fn broadcast(&self, text: &str) {
        for leg in [&self.caller, &self.callee].into_iter().flatten() {
            let _ = leg.send(text.to_string());
        }
    }
}

fn progress(state: &str) -> String {
    json!({"messageType": "progress", "state": state}).to_string()
}

fn terminated(reason: &str) -> String {
    json!({"messageType": "progress", "state": "terminated", "reason": reason}).to_string()
}

async fn spawn_server(behavior: ServerBehavior) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let state = Arc::new(Mutex::new(CallState::default()));

    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            tokio::spawn(handle_connection(stream, state.clone(), behavior));
        }
    });

    format!("ws://{}", addr)
}

async fn handle_connection(
    stream: TcpStream,
    state: Arc<Mutex<CallState>>,
    behavior: ServerBehavior,
) {
    let ws = accept_async(stream).await.unwrap();
    let (mut sink, mut read) = ws.split();

    // Writer side: forward broadcast state changes onto this connection.
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();
    tokio::spawn(async move {
        while let Some(text) = rx.recv().await {
            if sink.send(Message::Text(text)).await.is_err() {
                break;
            }
        }
    });

    while let Some(Ok(frame)) = read.next().await {
        match frame {
            Message::Text(text) => {
                let msg: Value = serde_json::from_str(&text).unwrap();
                handle_message(&state, &tx, behavior, &msg);
            }
            Message::Close(_) => break,
            _ => {}
        }
    }
}

fn handle_message(
    state: &Arc<Mutex<CallState>>,
    tx: &mpsc::UnboundedSender<String>,
    behavior: ServerBehavior,
    msg: &Value,
) {
    match msg["messageType"].as_str().unwrap_or("") {
        "hello" => match msg["auth"].as_str().unwrap_or("") {
            CALLER_TOKEN => {
                state.lock().unwrap().caller = Some(tx.clone());
                let _ = tx.send(json!({"messageType": "hello", "state": "init"}).to_string());

                if behavior == ServerBehavior::SupervisoryTimeout {
                    let state = state.clone();
                    tokio::spawn(async move {
                        tokio::time::sleep(SERVER_TIMEOUT).await;
                        let s = state.lock().unwrap();
                        if s.callee.is_none() {
                            s.broadcast(&terminated("timeout"));
                        }
                    });
                }
            }
            CALLEE_TOKEN => {
                if behavior == ServerBehavior::Silent {
                    return;
                }
                {
                    let mut s = state.lock().unwrap();
                    s.callee = Some(tx.clone());
                    s.broadcast(&progress("alerting"));
                }

                if behavior == ServerBehavior::RingingTimeout {
                    let state = state.clone();
                    tokio::spawn(async move {
                        tokio::time::sleep(SERVER_TIMEOUT).await;
                        let s = state.lock().unwrap();
                        if !s.accepted {
                            s.broadcast(&terminated("timeout"));
                        }
                    });
                }
            }
            _ => {}
        },
        "action" => match msg["event"].as_str().unwrap_or("") {
            "accept" => {
                let mut s = state.lock().unwrap();
                s.accepted = true;
                if behavior == ServerBehavior::RejectBusy {
                    s.broadcast(&terminated("busy"));
                    return;
                }
                s.broadcast(&progress("connecting"));
                drop(s);

                if behavior == ServerBehavior::ConnectionTimeout {
                    let state = state.clone();
                    tokio::spawn(async move {
                        tokio::time::sleep(SERVER_TIMEOUT).await;
                        let s = state.lock().unwrap();
                        if s.media_up < 2 {
                            s.broadcast(&terminated("timeout"));
                        }
                    });
                }
            }
            "media-up" => {
                let mut s = state.lock().unwrap();
                s.media_up += 1;
                if s.media_up == 1 {
                    s.broadcast(&progress("half-connected"));
                } else {
                    s.broadcast(&progress("connected"));
                }
            }
            _ => {}
        },
        _ => {}
    }
}

fn setup(callee: bool) -> CallSetup<'static> {
    CallSetup {
        progress_url: "",
        websocket_token: CALLER_TOKEN,
        callee_token: callee.then_some(CALLEE_TOKEN),
        call_id: CALL_ID,
    }
}

#[tokio::test]
async fn basic_scenario_connects_both_legs() {
    let url = spawn_server(ServerBehavior::Normal).await;
    let setup = CallSetup {
        progress_url: &url,
        ..setup(true)
    };

    let outcome = simulate_call(Variant::Basic, &setup, Duration::from_secs(10))
        .await
        .unwrap();

    assert!(outcome.caller.established);
    assert!(outcome.callee.established);
    assert!(!outcome.caller.terminated);
    // The caller observed the full sequence the server walked through.
    let states: Vec<_> = outcome
        .caller_log
        .iter()
        .filter_map(|m| m.state)
        .collect();
    assert!(states.windows(2).all(|w| w[0] != w[1]), "{:?}", states);
    assert!(!outcome.callee_log.is_empty());
}

#[tokio::test]
async fn supervisory_timeout_terminates_the_lonely_caller() {
    let url = spawn_server(ServerBehavior::SupervisoryTimeout).await;
    let setup = CallSetup {
        progress_url: &url,
        ..setup(false)
    };

    let outcome = simulate_call(Variant::SupervisoryTimeout, &setup, Duration::from_secs(10))
        .await
        .unwrap();

    assert!(outcome.caller.terminated);
    assert!(!outcome.caller.established);
    assert!(outcome.callee_log.is_empty());
}

#[tokio::test]
async fn ringing_timeout_when_callee_never_accepts() {
    let url = spawn_server(ServerBehavior::RingingTimeout).await;
    let setup = CallSetup {
        progress_url: &url,
        ..setup(true)
    };

    let outcome = simulate_call(Variant::RingingTimeout, &setup, Duration::from_secs(10))
        .await
        .unwrap();

    assert!(outcome.caller.terminated);
    assert!(!outcome.caller.established);
    assert!(!outcome.callee.established);
}

#[tokio::test]
async fn connection_timeout_when_media_up_stalls() {
    let url = spawn_server(ServerBehavior::ConnectionTimeout).await;
    let setup = CallSetup {
        progress_url: &url,
        ..setup(true)
    };

    let outcome = simulate_call(Variant::ConnectionTimeout, &setup, Duration::from_secs(10))
        .await
        .unwrap();

    assert!(outcome.caller.terminated);
    assert!(!outcome.caller.established);
    // The callee did its part before the server gave up.
    assert!(outcome
        .callee_log
        .iter()
        .any(|m| m.state.is_some()));
}

#[tokio::test]
async fn non_timeout_termination_is_a_hard_failure() {
    let url = spawn_server(ServerBehavior::RejectBusy).await;
    let setup = CallSetup {
        progress_url: &url,
        ..setup(true)
    };

    let err = simulate_call(Variant::Basic, &setup, Duration::from_secs(10))
        .await
        .unwrap_err();
    assert!(format!("{:#}", err).contains("busy"));
}

#[tokio::test]
async fn watchdog_bounds_a_server_that_goes_quiet() {
    let url = spawn_server(ServerBehavior::Silent).await;
    let setup = CallSetup {
        progress_url: &url,
        ..setup(true)
    };

    let err = simulate_call(Variant::Basic, &setup, Duration::from_millis(500))
        .await
        .unwrap_err();
    assert!(format!("{:#}", err).contains("watchdog"));
}
