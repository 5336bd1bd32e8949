//! WebSocket endpoint for the attendance namespace.
//!
//! A connection presents a bearer token at handshake time (header or
//! `?token=`), is verified before the upgrade completes, and then
//! exchanges JSON frames: `subscribeToClass` and `markAttendance`
//! inbound, `attendanceUpdate`, `ack` and `error` outbound.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use futures_util::{SinkExt, StreamExt};
use std::collections::HashMap;
use tokio::sync::mpsc;
use uuid::Uuid;

use rollcall_auth::{Principal, bearer_from_parts};
use rollcall_sync::DrainOutcome;

use super::broadcaster::ConnectionHandle;
use super::protocol::{ClientFrame, MarkAck, ServerFrame};
use crate::state::AppState;

/// Handler for `GET /attendance/ws`.
///
/// The token is verified before the upgrade; a missing or rejected
/// token fails the handshake with an authentication error and the
/// connection is never admitted to any room.
pub async fn attendance_ws_handler(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
    ws: WebSocketUpgrade,
) -> Response {
    let token = match bearer_from_parts(&headers, &params) {
        Ok(token) => token,
        Err(err) => {
            tracing::warn!(error = %err, "realtime handshake without usable token");
            return err.into_response();
        }
    };

    let principal = match state.verifier.verify(&token).await {
        Ok(principal) => principal,
        Err(err) => {
            tracing::warn!(error = %err, "realtime handshake token rejected");
            return err.into_response();
        }
    };

    ws.on_upgrade(move |socket| handle_attendance_socket(socket, state, principal))
}

async fn handle_attendance_socket(socket: WebSocket, state: AppState, principal: Principal) {
    let connection_id = Uuid::new_v4();
    let (tx, mut rx) = mpsc::channel::<ServerFrame>(32);
    let handle = ConnectionHandle::new(connection_id, tx.clone());

    tracing::info!(
        connection_id = %connection_id,
        user = %principal.display_name(),
        "realtime connection established"
    );

    // Every new connection triggers a queue drain. The connect handler
    // has no caller to report to, so a drain fault is surfaced to this
    // connection as an out-of-band error frame.
    {
        let state = state.clone();
        let tx = tx.clone();
        tokio::spawn(async move {
            if let DrainOutcome::Stopped { error, .. } =
                state.queue.drain(state.sink.as_ref()).await
            {
                let _ = tx
                    .send(ServerFrame::Error {
                        message: format!("Connection error: offline sync failed ({error})"),
                    })
                    .await;
            }
        });
    }

    let (mut sender, mut receiver) = socket.split();

    loop {
        tokio::select! {
            incoming = receiver.next() => {
                match incoming {
                    Some(Ok(Message::Text(text))) => {
                        handle_client_frame(&state, &handle, &principal, text.as_str()).await;
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if sender.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Pong(_))) | Some(Ok(Message::Binary(_))) => {
                        // Ignored on this namespace.
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        tracing::debug!(connection_id = %connection_id, "client closed connection");
                        break;
                    }
                    Some(Err(e)) => {
                        tracing::debug!(connection_id = %connection_id, error = %e, "websocket error");
                        break;
                    }
                }
            }

            outgoing = rx.recv() => {
                let Some(frame) = outgoing else { break };
                let text = match serde_json::to_string(&frame) {
                    Ok(text) => text,
                    Err(e) => {
                        tracing::error!(connection_id = %connection_id, error = %e, "failed to encode frame");
                        continue;
                    }
                };
                if sender.send(Message::Text(text.into())).await.is_err() {
                    break;
                }
            }
        }
    }

    // Disconnect: membership is dropped implicitly, no further side
    // effects.
    state.broadcaster.leave_all(connection_id);
    tracing::info!(connection_id = %connection_id, "realtime connection closed");
}

/// Dispatch a single inbound frame. Faults never abort the connection;
/// they are answered with an `error` frame.
async fn handle_client_frame(
    state: &AppState,
    handle: &ConnectionHandle,
    principal: &Principal,
    text: &str,
) {
    let frame: ClientFrame = match serde_json::from_str(text) {
        Ok(frame) => frame,
        Err(e) => {
            handle.send(ServerFrame::Error {
                message: format!("Invalid message: {e}"),
            });
            return;
        }
    };

    match frame {
        ClientFrame::SubscribeToClass(req) => {
            if let Err(e) = req.validate() {
                handle.send(ServerFrame::Error {
                    message: format!("Failed to subscribe to class: {e}"),
                });
                return;
            }

            state.broadcaster.subscribe(&req.class_id, handle.clone());
            tracing::info!(
                connection_id = %handle.id(),
                class_id = %req.class_id,
                "client joined class room"
            );
        }

        ClientFrame::MarkAttendance(req) => {
            if let Err(e) = req.validate() {
                handle.send(ServerFrame::Error {
                    message: format!("Failed to mark attendance: {e}"),
                });
                return;
            }

            tracing::info!(
                user = %principal.display_name(),
                class_id = %req.class_id,
                student_id = %req.student_id,
                "marking attendance"
            );

            match state.mark(&req).await {
                Ok(cache_key) => {
                    handle.send(ServerFrame::Ack(MarkAck {
                        success: true,
                        message: "Attendance marked successfully".into(),
                        cache_key: Some(cache_key),
                    }));
                }
                Err(e) => {
                    tracing::error!(
                        class_id = %req.class_id,
                        student_id = %req.student_id,
                        error = %e,
                        "mark attendance failed"
                    );
                    handle.send(ServerFrame::Error {
                        message: format!("Cache error: {e}"),
                    });
                }
            }
        }
    }
}
