use chrono::{DateTime, Utc};
use tokio::sync::mpsc::UnboundedSender;
use uuid::Uuid;

use crate::models::SendMessage;

/// Outbound side of a single WebSocket connection.
#[derive(Clone, Debug)]
pub struct ConnCtx {
    pub id: Uuid,
    pub connected_at: DateTime<Utc>,
    sender: UnboundedSender<SendMessage>,
}

impl ConnCtx {
    pub fn new(sender: UnboundedSender<SendMessage>) -> Self {
        Self {
            id: Uuid::new_v4(),
            connected_at: Utc::now(),
            sender,
        }
    }

    /// Queue a message for the writer task. Returns false once the connection is gone.
    pub fn send(&self, msg: SendMessage) -> bool {
        self.sender.send(msg).is_ok()
    }
}
