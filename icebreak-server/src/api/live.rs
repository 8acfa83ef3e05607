//! Live join feed over WebSocket.

use axum::{
    extract::{
        Path, State,
        ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use icebreak_core::live::FeedError;
use icebreak_core::stores::{EventStore, ParticipantStore};
use icebreak_sdk::objects::{WsCloseCode, WsServerMessage};
use uuid::Uuid;

use super::participant_to_response;
use crate::state::AppState;

/// `GET /events/{event_id}/live` — WebSocket live join feed.
///
/// Upgrades the connection and pushes one `participant_joined` frame per
/// admission. The first frame is always a snapshot of the current
/// participants; observers that connect late or lag reconcile through it.
pub(super) async fn join_feed(
    State(state): State<AppState>,
    Path(event_id): Path<Uuid>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_join_feed(socket, state, event_id))
}

/// Background task that drives a single WebSocket connection.
///
/// 1. Verifies the event exists (close 4004 otherwise).
/// 2. Sends the participant snapshot as the first message.
/// 3. Relays join frames for this event until the client disconnects,
///    re-snapshotting whenever the broadcast receiver lagged.
async fn handle_join_feed(mut socket: WebSocket, state: AppState, event_id: Uuid) {
    // Subscribe to the feed *before* reading the snapshot so that any
    // admission racing with the read is still captured in the receiver's
    // buffer.
    let mut feed = state.notifier.subscribe(event_id);

    match state.events.find_by_id(event_id).await {
        Ok(Some(_)) => {}
        Ok(None) => {
            let _ = send_json(
                &mut socket,
                &WsServerMessage::Error {
                    code: WsCloseCode::EVENT_NOT_FOUND,
                    reason: "event not found".into(),
                },
            )
            .await;
            let _ = socket
                .send(Message::Close(Some(CloseFrame {
                    code: WsCloseCode::EVENT_NOT_FOUND,
                    reason: "event not found".into(),
                })))
                .await;
            return;
        }
        Err(e) => {
            tracing::error!(error = %e, %event_id, "WS: failed to query event");
            let _ = send_json(
                &mut socket,
                &WsServerMessage::Error {
                    code: WsCloseCode::INTERNAL_ERROR,
                    reason: "internal error".into(),
                },
            )
            .await;
            let _ = socket
                .send(Message::Close(Some(CloseFrame {
                    code: WsCloseCode::INTERNAL_ERROR,
                    reason: "internal error".into(),
                })))
                .await;
            return;
        }
    }

    if send_snapshot(&mut socket, &state, event_id).await.is_err() {
        return;
    }

    // --- Relay join frames until the client disconnects --------------------

    loop {
        tokio::select! {
            result = feed.recv() => {
                match result {
                    Ok(frame) => {
                        let msg = WsServerMessage::ParticipantJoined {
                            participant_id: frame.participant_id,
                            name: frame.name,
                        };
                        if send_json(&mut socket, &msg).await.is_err() {
                            return; // client gone
                        }
                    }
                    Err(FeedError::Lagged(skipped)) => {
                        tracing::warn!(
                            %event_id,
                            skipped,
                            "WS: join feed lagged, re-sending snapshot"
                        );
                        if send_snapshot(&mut socket, &state, event_id).await.is_err() {
                            return;
                        }
                    }
                    Err(FeedError::Closed) => {
                        // Publisher gone (server shutting down)
                        break;
                    }
                }
            }

            // Incoming WebSocket frame from the client (ping/pong/close)
            msg = socket.recv() => {
                match msg {
                    Some(Ok(Message::Close(_))) | None => {
                        return;
                    }
                    Some(Ok(_)) => {
                        // Ignore other client messages (text, binary, ping)
                    }
                    Some(Err(_)) => {
                        return;
                    }
                }
            }
        }
    }

    let _ = socket.send(Message::Close(None)).await;
}

/// Send the current participant list as a snapshot frame.
async fn send_snapshot(
    socket: &mut WebSocket,
    state: &AppState,
    event_id: Uuid,
) -> Result<(), ()> {
    let participants = match state.participants.list_for_event(event_id).await {
        Ok(participants) => participants,
        Err(e) => {
            tracing::error!(error = %e, %event_id, "WS: failed to list participants");
            let _ = socket
                .send(Message::Close(Some(CloseFrame {
                    code: WsCloseCode::INTERNAL_ERROR,
                    reason: "internal error".into(),
                })))
                .await;
            return Err(());
        }
    };
    let msg = WsServerMessage::Snapshot {
        participants: participants.iter().map(participant_to_response).collect(),
    };
    send_json(socket, &msg).await
}

/// Serialize `value` as JSON and send it as a text WebSocket frame.
///
/// Returns `Err(())` if the send fails (client disconnected).
async fn send_json<T: serde::Serialize>(socket: &mut WebSocket, value: &T) -> Result<(), ()> {
    let json = serde_json::to_string(value).map_err(|_| ())?;
    socket
        .send(Message::Text(json.into()))
        .await
        .map_err(|_| ())
}
