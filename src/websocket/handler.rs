use std::sync::Arc;
use axum::{
    extract::{ws::{Message, WebSocket, WebSocketUpgrade}, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::AppState;
use crate::models::{ReceivedMessage, SendMessage};
use crate::websocket::dispatch;
use crate::ws::connctx::ConnCtx;

/// WebSocket handler
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    headers: HeaderMap,
    State(app_state): State<Arc<AppState>>,
) -> Response {
    // Browsers send Origin on upgrades; CORS headers alone do not stop a socket.
    if let Some(origin) = headers.get(header::ORIGIN).and_then(|v| v.to_str().ok()) {
        if !app_state.cors.allows(origin) {
            warn!("Rejected WebSocket upgrade from origin {}", origin);
            return (StatusCode::FORBIDDEN, "Origin not allowed").into_response();
        }
    }

    info!("New WebSocket connection attempt");
    ws.on_upgrade(move |socket| handle_socket(socket, app_state))
}

/// Handle WebSocket connection
async fn handle_socket(socket: WebSocket, app_state: Arc<AppState>) {
    // Outbound queue, fed by the hub and drained by the writer task
    let (tx, mut rx) = mpsc::unbounded_channel::<SendMessage>();
    let ctx = ConnCtx::new(tx);
    let conn_id = ctx.id;
    app_state.hub.lock().await.register(ctx);

    info!("WebSocket connection established with connection_id: {}", conn_id);
    let (mut sender, mut receiver) = socket.split();

    let mut write_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            let text = match serde_json::to_string(&msg) {
                Ok(text) => text,
                Err(e) => {
                    error!("Failed to serialize message for {}: {}", conn_id, e);
                    continue;
                }
            };
            if sender.send(Message::Text(text)).await.is_err() {
                break;
            }
        }
    });

    let read_state = app_state.clone();
    let mut read_task = tokio::spawn(async move {
        while let Some(frame) = receiver.next().await {
            let text = match frame {
                Ok(Message::Text(text)) => text,
                Ok(Message::Close(_)) => break,
                Ok(_) => continue,
                Err(e) => {
                    debug!("WebSocket error on {}: {}", conn_id, e);
                    break;
                }
            };

            let msg: ReceivedMessage = match serde_json::from_str(&text) {
                Ok(msg) => msg,
                Err(e) => {
                    warn!("Failed to parse message from {}: {}", conn_id, e);
                    continue;
                }
            };

            let mut hub = read_state.hub.lock().await;
            dispatch(&mut hub, conn_id, msg);
        }
    });

    // Wait for either task to finish (and finish the other)
    tokio::select! {
        _ = (&mut write_task) => read_task.abort(),
        _ = (&mut read_task) => write_task.abort(),
    };

    // Always runs, so an abrupt drop cleans up like an explicit leave
    app_state.hub.lock().await.disconnect(&conn_id);
    info!("WebSocket connection {} terminated", conn_id);
}
