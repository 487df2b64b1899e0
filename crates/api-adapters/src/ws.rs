//! # Live channel
//!
//! `GET /ws` upgrades to a WebSocket speaking `{"event", "data"}` frames.
//! The client authenticates with its bearer token; from then on the socket
//! is the user's entry in the [`LiveRegistry`](services::LiveRegistry) and
//! receives `new_message` and `new_notification` pushes.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use domains::{ConnectionId, LiveEvent, UserId};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::state::AppState;

/// Client → server frames.
#[derive(Debug, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
enum ClientFrame {
    Authenticate { token: String },
    PrivateMessage { receiver_id: UserId, message: String },
}

pub async fn upgrade(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| session(socket, state))
}

async fn session(socket: WebSocket, state: AppState) {
    let (mut sink, mut stream) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<LiveEvent>();

    let mut forward = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            let text = match serde_json::to_string(&event) {
                Ok(text) => text,
                Err(err) => {
                    warn!(error = %err, "live event could not be encoded");
                    continue;
                }
            };
            if sink.send(Message::Text(text.into())).await.is_err() {
                break;
            }
        }
    });

    let mut identity: Option<(UserId, ConnectionId)> = None;

    loop {
        tokio::select! {
            _ = &mut forward => break,
            frame = stream.next() => {
                let text = match frame {
                    Some(Ok(Message::Text(text))) => text,
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    Some(Ok(_)) => continue,
                };
                let frame = match serde_json::from_str::<ClientFrame>(text.as_str()) {
                    Ok(frame) => frame,
                    Err(err) => {
                        debug!(error = %err, "ignoring malformed live frame");
                        continue;
                    }
                };
                handle(&state, frame, &tx, &mut identity).await;
            }
        }
    }

    if let Some((user, connection)) = identity {
        if state.live.unregister(user, connection) {
            info!(user = %user, "live connection closed");
        }
    }
    forward.abort();
}

async fn handle(
    state: &AppState,
    frame: ClientFrame,
    tx: &mpsc::UnboundedSender<LiveEvent>,
    identity: &mut Option<(UserId, ConnectionId)>,
) {
    match frame {
        ClientFrame::Authenticate { token } => match state.verifier.verify(&token) {
            Ok(user) => {
                if let Some((previous, connection)) = identity.take() {
                    state.live.unregister(previous, connection);
                }
                let connection = state.live.register(user, tx.clone());
                *identity = Some((user, connection));
                info!(user = %user, "live connection authenticated");
            }
            Err(err) => debug!(error = %err, "live authentication rejected"),
        },
        ClientFrame::PrivateMessage {
            receiver_id,
            message,
        } => {
            let Some((sender, _)) = *identity else {
                debug!("private_message before authenticate");
                return;
            };
            match state.services.messages.relay(sender, receiver_id, message).await {
                Ok(delivered) => debug!(from = %sender, to = %receiver_id, delivered, "relayed"),
                Err(err) => debug!(error = %err, "relay refused"),
            }
        }
    }
}
