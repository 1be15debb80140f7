use tracing::debug;
use uuid::Uuid;

use crate::models::{EditOperation, ExecutionResult, SendMessage};
use crate::ws::hub::RoomHub;

/// Handle apply-edit: forward the raw operation to peers, then fold it into
/// the authoritative buffer.
pub fn handle_apply_edit(hub: &mut RoomHub, conn_id: Uuid, op: EditOperation) {
    let Some(room_id) = hub.rooms.room_of(&conn_id).cloned() else {
        debug!("Dropping edit from {}: not in a room", conn_id);
        return;
    };

    // Peers first, the server copy is not on the latency path.
    hub.broadcast_except(&room_id, &conn_id, SendMessage::ApplyEdit(op.clone()));
    hub.docs.apply_edit(&room_id, &op);
}

/// Handle update-document: replace the whole buffer.
pub fn handle_update_document(hub: &mut RoomHub, conn_id: Uuid, text: String) {
    let Some(room_id) = hub.rooms.room_of(&conn_id).cloned() else {
        debug!("Dropping document replacement from {}: not in a room", conn_id);
        return;
    };

    hub.broadcast_except(&room_id, &conn_id, SendMessage::DocumentUpdated(text.clone()));
    hub.docs.set_document(&room_id, text);
}

pub fn handle_update_language(hub: &mut RoomHub, conn_id: Uuid, language: String) {
    let Some(room_id) = hub.rooms.room_of(&conn_id).cloned() else {
        debug!("Dropping language change from {}: not in a room", conn_id);
        return;
    };

    hub.docs.set_language(&room_id, language.clone());
    hub.broadcast_except(&room_id, &conn_id, SendMessage::LanguageUpdated(language));
}

pub fn handle_update_notepad(hub: &mut RoomHub, conn_id: Uuid, text: String) {
    let Some(room_id) = hub.rooms.room_of(&conn_id).cloned() else {
        debug!("Dropping notepad update from {}: not in a room", conn_id);
        return;
    };

    hub.channels.set_notepad(&room_id, text.clone());
    hub.broadcast_except(&room_id, &conn_id, SendMessage::NotepadUpdated(text));
}

/// Handle execution-state: peers show or hide their running indicator.
pub fn handle_execution_state(hub: &mut RoomHub, conn_id: Uuid, running: bool) {
    let Some(room_id) = hub.rooms.room_of(&conn_id).cloned() else {
        debug!("Dropping execution state from {}: not in a room", conn_id);
        return;
    };

    hub.channels.set_executing(&room_id, running);
    hub.broadcast_except(&room_id, &conn_id, SendMessage::ExecutionState(running));
}

/// Handle terminal-output. Relayed only, late joiners do not see it.
pub fn handle_terminal_output(hub: &RoomHub, conn_id: Uuid, result: ExecutionResult) {
    let Some(room_id) = hub.rooms.room_of(&conn_id) else {
        debug!("Dropping terminal output from {}: not in a room", conn_id);
        return;
    };

    debug!(
        "Relaying terminal output from {} in room {} (exit code {:?})",
        conn_id,
        room_id,
        result.field("exitCode")
    );
    hub.broadcast_except(room_id, &conn_id, SendMessage::TerminalOutput(result));
}
