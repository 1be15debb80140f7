pub mod handler;
pub mod msg_load_handler;
pub mod msg_ping_handler;
pub mod msg_presence_handler;
pub mod msg_room_handler;
pub mod msg_update_handler;

use uuid::Uuid;

use crate::models::ReceivedMessage;
use crate::ws::hub::RoomHub;
use msg_load_handler::{handle_sync_message, SyncTarget};
use msg_ping_handler::handle_ping_message;
use msg_presence_handler::{
    handle_cursor, handle_media_event, handle_pointer, handle_scroll, handle_webrtc_signal,
    MediaEvent,
};
use msg_room_handler::{handle_create_room, handle_join_room, handle_leave_room};
use msg_update_handler::{
    handle_apply_edit, handle_execution_state, handle_terminal_output, handle_update_document,
    handle_update_language, handle_update_notepad,
};

/// Route one inbound message to its handler. Runs to completion without awaiting.
pub fn dispatch(hub: &mut RoomHub, conn_id: Uuid, msg: ReceivedMessage) {
    match msg {
        ReceivedMessage::CreateRoom(display_name) => {
            handle_create_room(hub, conn_id, &display_name)
        }
        ReceivedMessage::JoinRoom(join_msg) => handle_join_room(hub, conn_id, join_msg),
        ReceivedMessage::LeaveRoom => handle_leave_room(hub, conn_id),
        ReceivedMessage::SyncRoster => handle_sync_message(hub, conn_id, SyncTarget::Roster),
        ReceivedMessage::SyncDocument => handle_sync_message(hub, conn_id, SyncTarget::Document),
        ReceivedMessage::SyncLanguage => handle_sync_message(hub, conn_id, SyncTarget::Language),
        ReceivedMessage::SyncNotepad => handle_sync_message(hub, conn_id, SyncTarget::Notepad),
        ReceivedMessage::SyncExecution => handle_sync_message(hub, conn_id, SyncTarget::Execution),
        ReceivedMessage::UpdateDocument(text) => handle_update_document(hub, conn_id, text),
        ReceivedMessage::ApplyEdit(op) => handle_apply_edit(hub, conn_id, op),
        ReceivedMessage::UpdateLanguage(language) => handle_update_language(hub, conn_id, language),
        ReceivedMessage::UpdateNotepad(text) => handle_update_notepad(hub, conn_id, text),
        ReceivedMessage::ExecutionState(running) => handle_execution_state(hub, conn_id, running),
        ReceivedMessage::TerminalOutput(result) => handle_terminal_output(hub, conn_id, result),
        ReceivedMessage::UpdateCursor(position) => handle_cursor(hub, conn_id, position),
        ReceivedMessage::UpdateScroll(position) => handle_scroll(hub, conn_id, position),
        ReceivedMessage::UpdatePointer(position) => handle_pointer(hub, conn_id, position),
        ReceivedMessage::WebRtcSignal(signal_msg) => handle_webrtc_signal(hub, conn_id, signal_msg),
        ReceivedMessage::UserReady => handle_media_event(hub, conn_id, MediaEvent::UserReady),
        ReceivedMessage::CameraOff => handle_media_event(hub, conn_id, MediaEvent::CameraOff),
        ReceivedMessage::MicState(enabled) => {
            handle_media_event(hub, conn_id, MediaEvent::MicState(enabled))
        }
        ReceivedMessage::SpeakerState(enabled) => {
            handle_media_event(hub, conn_id, MediaEvent::SpeakerState(enabled))
        }
        ReceivedMessage::Ping(ping_msg) => handle_ping_message(hub, conn_id, ping_msg),
    }
}
