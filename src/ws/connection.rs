//! WebSocket connection lifecycle.
//!
//! One accepted socket runs as two tasks: the upgrade task reads inbound
//! frames and hands them to the [`RelayDispatcher`], and a spawned writer
//! drains the connection's outbound queue into the socket. The read loop
//! ends with a [`CloseReason`]; whatever the reason, the registration is
//! released exactly once before the task returns.
//!
//! Leaving the registry ends the read loop directly, so a peer that stopped
//! reading (and has its writer parked on a full socket) is still torn down.
//! The writer gets [`WRITER_GRACE`] to flush a close frame, then is aborted
//! and the socket dropped.

use std::time::Duration;

use axum::extract::ws::{CloseFrame, Message, Utf8Bytes, WebSocket, close_code};
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;

use crate::domain::{ConnectionId, InboundKind, Outbound, Role};
use crate::error::RelayError;
use crate::service::{Inbound, RelayDispatcher};

/// How long the writer may keep running after the read loop ends.
pub const WRITER_GRACE: Duration = Duration::from_secs(1);

/// Why a connection left the `Open` state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    /// The client sent a close frame or the stream ended.
    ClientClosed,
    /// Reading from the socket failed.
    ReadError,
    /// No inbound message within the configured idle timeout.
    IdleTimeout,
    /// The connection left the registry without the client closing it:
    /// evicted after a failed broadcast, or the registry was shut down.
    Evicted,
    /// Writing to the socket failed.
    WriteError,
}

/// What the read loop does with one inbound frame.
#[derive(Debug, PartialEq, Eq)]
enum Decoded {
    Relay(Inbound),
    Mismatch(InboundKind),
    Control,
    Close,
}

/// Classifies a frame against the kind `role` is expected to send.
fn decode(role: Role, msg: Message) -> Decoded {
    match (role.inbound_kind(), msg) {
        (InboundKind::Text, Message::Text(text)) => {
            Decoded::Relay(Inbound::Notification(text.as_str().to_owned()))
        }
        (InboundKind::Binary, Message::Binary(data)) => Decoded::Relay(Inbound::Command(data)),
        (InboundKind::Text, Message::Binary(_)) => Decoded::Mismatch(InboundKind::Binary),
        (InboundKind::Binary, Message::Text(_)) => Decoded::Mismatch(InboundKind::Text),
        (_, Message::Ping(_) | Message::Pong(_)) => Decoded::Control,
        (_, Message::Close(_)) => Decoded::Close,
    }
}

enum Next {
    Message(Message),
    End,
    Error(axum::Error),
    Idle,
}

async fn next_message(ws_rx: &mut SplitStream<WebSocket>, idle: Option<Duration>) -> Next {
    let next = match idle {
        Some(limit) => match tokio::time::timeout(limit, ws_rx.next()).await {
            Ok(next) => next,
            Err(_) => return Next::Idle,
        },
        None => ws_rx.next().await,
    };
    match next {
        Some(Ok(msg)) => Next::Message(msg),
        Some(Err(e)) => Next::Error(e),
        None => Next::End,
    }
}

/// Runs one relay connection from registration to teardown.
///
/// Registers the socket under `role`, forwards every accepted inbound
/// message before reading the next one, and deregisters on any exit.
/// Frames of the wrong kind for the role are dropped and the connection
/// stays open.
pub async fn run_connection(
    socket: WebSocket,
    role: Role,
    dispatcher: RelayDispatcher,
    idle_timeout: Option<Duration>,
) {
    let (registration, outbound_rx) = match dispatcher.registry().register(role) {
        Ok(pair) => pair,
        Err(e) => {
            tracing::warn!(%role, error = %e, "refusing relay connection");
            reject(socket, &e).await;
            return;
        }
    };
    let connection_id = registration.id();
    tracing::info!(%connection_id, %role, "relay connection opened");

    let (ws_tx, mut ws_rx) = socket.split();
    let mut writer = tokio::spawn(write_outbound(ws_tx, outbound_rx, connection_id));

    let reason = loop {
        tokio::select! {
            biased;
            () = registration.closed() => break CloseReason::Evicted,
            _ = &mut writer => break CloseReason::WriteError,
            next = next_message(&mut ws_rx, idle_timeout) => match next {
                Next::Message(msg) => match decode(role, msg) {
                    Decoded::Relay(inbound) => {
                        dispatcher.dispatch(inbound);
                    }
                    Decoded::Mismatch(got) => {
                        tracing::warn!(%connection_id, %role, ?got, "dropping frame of unexpected kind");
                    }
                    Decoded::Control => {}
                    Decoded::Close => break CloseReason::ClientClosed,
                },
                Next::End => break CloseReason::ClientClosed,
                Next::Error(e) => {
                    tracing::debug!(%connection_id, error = %e, "websocket read failed");
                    break CloseReason::ReadError;
                }
                Next::Idle => break CloseReason::IdleTimeout,
            },
        }
    };

    registration.deregister();
    if !writer.is_finished() && tokio::time::timeout(WRITER_GRACE, &mut writer).await.is_err() {
        tracing::debug!(%connection_id, "writer stalled, aborting");
        writer.abort();
    }
    tracing::info!(%connection_id, %role, ?reason, "relay connection closed");
}

/// Drains the outbound queue into the socket until the queue closes or a
/// write fails. A closed queue ends with a close frame.
async fn write_outbound(
    mut ws_tx: SplitSink<WebSocket, Message>,
    mut outbound_rx: mpsc::Receiver<Outbound>,
    connection_id: ConnectionId,
) {
    while let Some(item) = outbound_rx.recv().await {
        let msg = match item {
            Outbound::Command(bytes) => Message::Binary(bytes),
            Outbound::Notification(text) => Message::text(text),
        };
        if let Err(e) = ws_tx.send(msg).await {
            tracing::debug!(%connection_id, error = %e, "websocket write failed");
            return;
        }
    }

    let frame = CloseFrame {
        code: close_code::NORMAL,
        reason: Utf8Bytes::from_static("relay closed"),
    };
    let _ = ws_tx.send(Message::Close(Some(frame))).await;
}

/// Closes a socket that could not be registered with "try again later".
async fn reject(mut socket: WebSocket, error: &RelayError) {
    let frame = CloseFrame {
        code: close_code::AGAIN,
        reason: Utf8Bytes::from(error.to_string()),
    };
    let _ = socket.send(Message::Close(Some(frame))).await;
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use super::*;

    #[test]
    fn actuator_text_is_a_notification() {
        let decoded = decode(Role::Actuator, Message::text("status:ok"));
        assert_eq!(
            decoded,
            Decoded::Relay(Inbound::Notification("status:ok".to_string()))
        );
    }

    #[test]
    fn operator_binary_is_a_command() {
        let decoded = decode(Role::Operator, Message::Binary(Bytes::from_static(&[0x01])));
        assert_eq!(
            decoded,
            Decoded::Relay(Inbound::Command(Bytes::from_static(&[0x01])))
        );
    }

    #[test]
    fn wrong_kind_is_a_mismatch() {
        assert_eq!(
            decode(Role::Actuator, Message::Binary(Bytes::from_static(b"x"))),
            Decoded::Mismatch(InboundKind::Binary)
        );
        assert_eq!(
            decode(Role::Operator, Message::text("x")),
            Decoded::Mismatch(InboundKind::Text)
        );
    }

    #[test]
    fn control_frames() {
        assert_eq!(
            decode(Role::Operator, Message::Ping(Bytes::new())),
            Decoded::Control
        );
        assert_eq!(decode(Role::Actuator, Message::Close(None)), Decoded::Close);
    }
}
