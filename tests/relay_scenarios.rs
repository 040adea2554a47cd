//! End-to-end relay tests over real WebSocket connections.

#![allow(clippy::panic)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

use peeper_gateway::app_state::AppState;
use peeper_gateway::config::RelaySettings;
use peeper_gateway::domain::{ConnectionRegistry, Role};
use peeper_gateway::persistence::EventLog;
use peeper_gateway::server;
use peeper_gateway::ws::connection::WRITER_GRACE;

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

const WAIT: Duration = Duration::from_secs(3);
const QUIET: Duration = Duration::from_millis(200);

async fn spawn_server(relay: RelaySettings) -> (SocketAddr, Arc<ConnectionRegistry>) {
    let state = AppState::new(relay, EventLog::in_memory());
    let registry = Arc::clone(state.registry());
    let Ok(listener) = TcpListener::bind("127.0.0.1:0").await else {
        panic!("bind failed");
    };
    let Ok(addr) = listener.local_addr() else {
        panic!("no local addr");
    };
    tokio::spawn(server::serve(listener, state, std::future::pending()));
    (addr, registry)
}

async fn connect(addr: SocketAddr, path: &str) -> Client {
    match connect_async(format!("ws://{addr}{path}")).await {
        Ok((ws, _)) => ws,
        Err(e) => panic!("connect to {path} failed: {e}"),
    }
}

/// Registration happens after the handshake, so tests wait for it.
async fn wait_for_count(registry: &ConnectionRegistry, role: Role, expected: usize) {
    let deadline = tokio::time::Instant::now() + WAIT;
    while registry.count(role) != expected {
        if tokio::time::Instant::now() > deadline {
            panic!(
                "expected {expected} {role} connections, have {}",
                registry.count(role)
            );
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

async fn recv(ws: &mut Client) -> Message {
    match tokio::time::timeout(WAIT, ws.next()).await {
        Ok(Some(Ok(msg))) => msg,
        Ok(other) => panic!("stream ended: {other:?}"),
        Err(_) => panic!("timed out waiting for a message"),
    }
}

async fn assert_silent(ws: &mut Client) {
    if let Ok(msg) = tokio::time::timeout(QUIET, ws.next()).await {
        panic!("expected no message, got {msg:?}");
    }
}

async fn send(ws: &mut Client, msg: Message) {
    if let Err(e) = ws.send(msg).await {
        panic!("send failed: {e}");
    }
}

#[tokio::test]
async fn command_reaches_every_actuator_and_stops_after_disconnect() {
    let (addr, registry) = spawn_server(RelaySettings::default()).await;

    let mut operator = connect(addr, "/ws/operator").await;
    let mut a1 = connect(addr, "/ws/actuator").await;
    let mut a2 = connect(addr, "/ws/actuator").await;
    wait_for_count(&registry, Role::Operator, 1).await;
    wait_for_count(&registry, Role::Actuator, 2).await;

    send(&mut operator, Message::binary(vec![0x01])).await;
    assert_eq!(recv(&mut a1).await, Message::binary(vec![0x01]));
    assert_eq!(recv(&mut a2).await, Message::binary(vec![0x01]));
    assert_silent(&mut operator).await;

    if let Err(e) = a1.close(None).await {
        panic!("close failed: {e}");
    }
    wait_for_count(&registry, Role::Actuator, 1).await;

    send(&mut operator, Message::binary(vec![0x02])).await;
    assert_eq!(recv(&mut a2).await, Message::binary(vec![0x02]));
    assert_silent(&mut a2).await;
}

#[tokio::test]
async fn notification_reaches_each_operator_once_and_no_actuator() {
    let (addr, registry) = spawn_server(RelaySettings::default()).await;

    let mut actuator = connect(addr, "/ws/actuator").await;
    let mut other_actuator = connect(addr, "/ws/actuator").await;
    let mut o1 = connect(addr, "/ws/operator").await;
    let mut o2 = connect(addr, "/ws/operator").await;
    wait_for_count(&registry, Role::Actuator, 2).await;
    wait_for_count(&registry, Role::Operator, 2).await;

    send(&mut actuator, Message::text("status:ok")).await;

    assert_eq!(recv(&mut o1).await, Message::text("status:ok"));
    assert_eq!(recv(&mut o2).await, Message::text("status:ok"));
    assert_silent(&mut o1).await;
    assert_silent(&mut o2).await;
    assert_silent(&mut other_actuator).await;
    assert_silent(&mut actuator).await;
}

#[tokio::test]
async fn messages_from_one_sender_arrive_in_order() {
    let (addr, registry) = spawn_server(RelaySettings::default()).await;

    let mut actuator = connect(addr, "/ws/actuator").await;
    let mut operator = connect(addr, "/ws/operator").await;
    wait_for_count(&registry, Role::Actuator, 1).await;
    wait_for_count(&registry, Role::Operator, 1).await;

    for m in ["m1", "m2", "m3"] {
        send(&mut actuator, Message::text(m)).await;
    }
    for m in ["m1", "m2", "m3"] {
        assert_eq!(recv(&mut operator).await, Message::text(m));
    }
}

#[tokio::test]
async fn wrong_frame_kind_is_dropped_and_connection_stays_open() {
    let (addr, registry) = spawn_server(RelaySettings::default()).await;

    let mut operator = connect(addr, "/ws/operator").await;
    let mut actuator = connect(addr, "/ws/actuator").await;
    wait_for_count(&registry, Role::Operator, 1).await;
    wait_for_count(&registry, Role::Actuator, 1).await;

    // Operators must send binary; text is dropped.
    send(&mut operator, Message::text("not a command")).await;
    assert_silent(&mut actuator).await;

    send(&mut operator, Message::binary(vec![0x07])).await;
    assert_eq!(recv(&mut actuator).await, Message::binary(vec![0x07]));
    assert_eq!(registry.count(Role::Operator), 1);
}

#[tokio::test]
async fn legacy_paths_are_aliases() {
    let (addr, registry) = spawn_server(RelaySettings::default()).await;

    let mut mcu = connect(addr, "/mcu/ws/").await;
    let mut remote = connect(addr, "/remote/ws/").await;
    let mut mcu_bare = connect(addr, "/mcu/ws").await;
    let mut remote_bare = connect(addr, "/remote/ws").await;
    wait_for_count(&registry, Role::Actuator, 2).await;
    wait_for_count(&registry, Role::Operator, 2).await;

    send(&mut remote, Message::binary(vec![0xAA, 0xBB])).await;
    assert_eq!(recv(&mut mcu).await, Message::binary(vec![0xAA, 0xBB]));
    assert_eq!(recv(&mut mcu_bare).await, Message::binary(vec![0xAA, 0xBB]));

    send(&mut mcu, Message::text("status:legacy")).await;
    assert_eq!(recv(&mut remote).await, Message::text("status:legacy"));
    assert_eq!(recv(&mut remote_bare).await, Message::text("status:legacy"));
}

#[tokio::test]
async fn dropped_client_is_deregistered() {
    let (addr, registry) = spawn_server(RelaySettings::default()).await;

    let operator = connect(addr, "/ws/operator").await;
    let mut actuator = connect(addr, "/ws/actuator").await;
    wait_for_count(&registry, Role::Operator, 1).await;

    drop(operator);
    wait_for_count(&registry, Role::Operator, 0).await;

    // Broadcasting to nobody is not an error for the sender.
    send(&mut actuator, Message::text("status:alone")).await;
    send(&mut actuator, Message::text("status:still-here")).await;
    assert_eq!(registry.count(Role::Actuator), 1);
}

#[tokio::test]
async fn connection_limit_refuses_upgrade() {
    let relay = RelaySettings {
        max_connections: 1,
        ..RelaySettings::default()
    };
    let (addr, registry) = spawn_server(relay).await;

    let _actuator = connect(addr, "/ws/actuator").await;
    wait_for_count(&registry, Role::Actuator, 1).await;

    match connect_async(format!("ws://{addr}/ws/operator")).await {
        Err(tungstenite::Error::Http(response)) => {
            assert_eq!(response.status().as_u16(), 503);
        }
        Err(e) => panic!("unexpected error: {e}"),
        Ok(_) => panic!("upgrade should have been refused"),
    }
    assert_eq!(registry.count(Role::Operator), 0);
}

#[tokio::test]
async fn stalled_recipient_is_evicted_and_disconnected() {
    let relay = RelaySettings {
        send_queue_capacity: 1,
        max_connections: 2,
        ..RelaySettings::default()
    };
    let (addr, registry) = spawn_server(relay).await;

    let mut stalled = connect(addr, "/ws/operator").await;
    let mut actuator = connect(addr, "/ws/actuator").await;
    wait_for_count(&registry, Role::Operator, 1).await;
    wait_for_count(&registry, Role::Actuator, 1).await;

    // The operator never reads: large notifications fill the socket
    // buffers, park its writer, then overflow its queue.
    let chunk = "x".repeat(1 << 20);
    for _ in 0..256 {
        if registry.count(Role::Operator) == 0 {
            break;
        }
        send(&mut actuator, Message::text(chunk.clone())).await;
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    wait_for_count(&registry, Role::Operator, 0).await;
    assert_eq!(registry.len(), 1);

    // The server side goes away: whatever was buffered drains, then the
    // stream ends.
    let drained = tokio::time::timeout(WAIT + WRITER_GRACE, async {
        while let Some(Ok(msg)) = stalled.next().await {
            if msg.is_close() {
                break;
            }
        }
    })
    .await;
    assert!(drained.is_ok(), "evicted connection was never closed");

    // The freed slot is reusable and the limit still holds.
    let mut operator = connect(addr, "/ws/operator").await;
    wait_for_count(&registry, Role::Operator, 1).await;
    send(&mut actuator, Message::text("status:ok")).await;
    assert_eq!(recv(&mut operator).await, Message::text("status:ok"));

    match connect_async(format!("ws://{addr}/ws/operator")).await {
        Err(tungstenite::Error::Http(response)) => {
            assert_eq!(response.status().as_u16(), 503);
        }
        Err(e) => panic!("unexpected error: {e}"),
        Ok(_) => panic!("upgrade should have been refused"),
    }
}

#[tokio::test]
async fn idle_connection_is_closed() {
    let relay = RelaySettings {
        idle_timeout: Some(Duration::from_millis(150)),
        ..RelaySettings::default()
    };
    let (addr, registry) = spawn_server(relay).await;

    let mut actuator = connect(addr, "/ws/actuator").await;
    wait_for_count(&registry, Role::Actuator, 1).await;
    wait_for_count(&registry, Role::Actuator, 0).await;

    // The server side went away; the client sees a close or end of stream.
    match tokio::time::timeout(WAIT, actuator.next()).await {
        Ok(None | Some(Ok(Message::Close(_)) | Err(_))) => {}
        Ok(Some(Ok(other))) => panic!("unexpected message {other:?}"),
        Err(_) => panic!("connection was not closed"),
    }
}

#[tokio::test]
async fn health_reports_connection_counts() {
    let (addr, registry) = spawn_server(RelaySettings::default()).await;

    let _a = connect(addr, "/ws/actuator").await;
    let _o1 = connect(addr, "/ws/operator").await;
    let _o2 = connect(addr, "/ws/operator").await;
    wait_for_count(&registry, Role::Actuator, 1).await;
    wait_for_count(&registry, Role::Operator, 2).await;

    let body: serde_json::Value = match reqwest::get(format!("http://{addr}/health")).await {
        Ok(resp) => match resp.json().await {
            Ok(v) => v,
            Err(e) => panic!("bad body: {e}"),
        },
        Err(e) => panic!("request failed: {e}"),
    };
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["event_log"], "memory");
    assert_eq!(body["connections"]["actuators"], 1);
    assert_eq!(body["connections"]["operators"], 2);
}
