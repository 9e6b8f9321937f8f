//! `WebSocket` stream of wallet events.
//!
//! Clients connect to `GET /api/wallet/ws`. The first frame is the current
//! snapshot; after that every published [`WalletEvent`] (new snapshots and
//! save-failure alerts) is sent as a JSON text frame.
//!
//! A client that falls behind skips the events it missed and continues with
//! the newest one.

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use shared::WalletEvent;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, warn};

use crate::AppState;

pub async fn wallet_ws(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_ws(socket, state))
}

async fn handle_ws(mut socket: WebSocket, state: AppState) {
    debug!("WebSocket client connected");

    let sync = state.sync_adapter;
    let mut rx = sync.events().subscribe();

    let current = WalletEvent::Snapshot(sync.current().await);
    if !send_event(&mut socket, &current).await {
        return;
    }

    loop {
        tokio::select! {
            result = rx.recv() => {
                match result {
                    Ok(event) => {
                        if !send_event(&mut socket, &event).await {
                            debug!("WebSocket client disconnected (send failed)");
                            return;
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        debug!(skipped, "WebSocket client lagged, skipping ahead");
                    }
                    Err(RecvError::Closed) => {
                        debug!("Wallet event channel closed, shutting down WebSocket");
                        return;
                    }
                }
            }
            msg = socket.recv() => {
                match msg {
                    Some(Ok(Message::Close(_))) | None => {
                        debug!("WebSocket client disconnected");
                        return;
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if socket.send(Message::Pong(data)).await.is_err() {
                            return;
                        }
                    }
                    Some(Err(e)) => {
                        debug!("WebSocket error: {e}");
                        return;
                    }
                    _ => {}
                }
            }
        }
    }
}

/// Returns false once the client is gone
async fn send_event(socket: &mut WebSocket, event: &WalletEvent) -> bool {
    let json = match serde_json::to_string(event) {
        Ok(json) => json,
        Err(e) => {
            warn!("Failed to serialize wallet event: {e}");
            return true;
        }
    };
    socket.send(Message::Text(json)).await.is_ok()
}
