//! `GET /events` — the WebSocket subscription stream (`spec.md` §4.7).
//!
//! On upgrade: register in the subscriber set, replay retained events plus
//! the current state snapshot, then forward every subsequent broadcast.
//! Text frame `"ping"` gets `"pong"`; a binary frame is echoed back as a
//! binary `"pong"` payload. A close frame (or a failed send) deregisters
//! the subscriber.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;

use crate::app::AppState;

pub(crate) fn routes() -> Router<AppState> {
    Router::new().route("/events", get(upgrade))
}

async fn upgrade(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(mut socket: WebSocket, state: AppState) {
    let (id, mut rx) = state.broadcast.subscribers.add();

    for message in argus_broadcast::replay_payload(&state.broadcast) {
        if socket.send(Message::Text(message)).await.is_err() {
            state.broadcast.subscribers.remove(id);
            return;
        }
    }

    loop {
        tokio::select! {
            outgoing = rx.recv() => {
                let Some(text) = outgoing else { break };
                if socket.send(Message::Text(text)).await.is_err() {
                    break;
                }
            }
            incoming = socket.recv() => {
                match incoming {
                    Some(Ok(Message::Text(text))) if text == "ping" => {
                        if socket.send(Message::Text("pong".to_string())).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Binary(_))) => {
                        if socket.send(Message::Binary(b"pong".to_vec())).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(_)) => break,
                }
            }
        }
    }

    state.broadcast.subscribers.remove(id);
}
