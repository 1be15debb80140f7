use chrono::Utc;
use tracing::debug;
use uuid::Uuid;

use crate::models::{PingMessage, PongMessage, SendMessage};
use crate::ws::hub::RoomHub;

/// Handle PingMessage: reply with the server time. No room needed.
pub fn handle_ping_message(hub: &RoomHub, conn_id: Uuid, ping_msg: PingMessage) {
    debug!("Ping received from {}", conn_id);
    hub.send_to(
        &conn_id,
        SendMessage::Pong(PongMessage {
            date: Utc::now().to_rfc3339(),
            nonce: ping_msg.nonce,
        }),
    );
}
