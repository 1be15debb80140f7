use tracing::debug;
use uuid::Uuid;

use crate::models::SendMessage;
use crate::ws::hub::RoomHub;

/// Which piece of room state a sync request asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncTarget {
    Roster,
    Document,
    Language,
    Notepad,
    Execution,
}

/// Handle a sync-* request: answer the requester only with the current value.
pub fn handle_sync_message(hub: &RoomHub, conn_id: Uuid, target: SyncTarget) {
    let Some(room_id) = hub.rooms.room_of(&conn_id) else {
        debug!("Dropping {:?} sync from {}: not in a room", target, conn_id);
        return;
    };

    let reply = match target {
        SyncTarget::Roster => {
            SendMessage::RosterUpdated((*hub.rooms.cached_roster(room_id)).clone())
        }
        SyncTarget::Document => {
            SendMessage::DocumentUpdated(hub.docs.document(room_id).to_string())
        }
        SyncTarget::Language => {
            SendMessage::LanguageUpdated(hub.docs.language(room_id).to_string())
        }
        SyncTarget::Notepad => {
            SendMessage::NotepadUpdated(hub.channels.notepad(room_id).to_string())
        }
        SyncTarget::Execution => SendMessage::ExecutionState(hub.channels.is_executing(room_id)),
    };
    hub.send_to(&conn_id, reply);
}
