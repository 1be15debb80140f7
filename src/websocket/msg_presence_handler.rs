use tracing::debug;
use uuid::Uuid;

use crate::models::{
    CursorPosition, MemberRef, PointerPosition, ScrollPosition, SendMessage, SignalMessage, Tagged,
    TaggedSignal, TaggedToggle,
};
use crate::ws::hub::RoomHub;

/// Presence events that carry no payload besides who sent them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaEvent {
    UserReady,
    CameraOff,
    MicState(bool),
    SpeakerState(bool),
}

pub fn handle_cursor(hub: &RoomHub, conn_id: Uuid, position: CursorPosition) {
    relay_tagged(hub, conn_id, "cursor", |identifier| {
        SendMessage::CursorUpdated(Tagged { identifier, position })
    });
}

pub fn handle_scroll(hub: &RoomHub, conn_id: Uuid, position: ScrollPosition) {
    relay_tagged(hub, conn_id, "scroll", |identifier| {
        SendMessage::ScrollUpdated(Tagged { identifier, position })
    });
}

pub fn handle_pointer(hub: &RoomHub, conn_id: Uuid, position: PointerPosition) {
    relay_tagged(hub, conn_id, "pointer", |identifier| {
        SendMessage::PointerUpdated(Tagged { identifier, position })
    });
}

pub fn handle_media_event(hub: &RoomHub, conn_id: Uuid, event: MediaEvent) {
    relay_tagged(hub, conn_id, "media", |identifier| match event {
        MediaEvent::UserReady => SendMessage::UserReady(MemberRef { identifier }),
        MediaEvent::CameraOff => SendMessage::CameraOff(MemberRef { identifier }),
        MediaEvent::MicState(enabled) => {
            SendMessage::MicState(TaggedToggle { identifier, enabled })
        }
        MediaEvent::SpeakerState(enabled) => {
            SendMessage::SpeakerState(TaggedToggle { identifier, enabled })
        }
    });
}

/// Handle webrtc-signal. With a target only that member gets it, and only if
/// it shares the sender's room.
pub fn handle_webrtc_signal(hub: &RoomHub, conn_id: Uuid, signal_msg: SignalMessage) {
    let Some((room_id, identifier)) = hub.member(&conn_id) else {
        debug!("Dropping signal from {}: not in a room", conn_id);
        return;
    };
    let msg = SendMessage::WebRtcSignal(TaggedSignal {
        identifier,
        signal: signal_msg.signal,
    });

    match signal_msg.target {
        Some(target) => {
            let Some(target_conn) = hub.rooms.connection_of(&target) else {
                debug!("Dropping signal from {}: no member {}", conn_id, target);
                return;
            };
            if target_conn == conn_id || hub.rooms.room_of(&target_conn) != Some(&room_id) {
                debug!("Dropping signal from {}: {} is not a peer", conn_id, target);
                return;
            }
            hub.send_to(&target_conn, msg);
        }
        None => hub.broadcast_except(&room_id, &conn_id, msg),
    }
}

fn relay_tagged(
    hub: &RoomHub,
    conn_id: Uuid,
    kind: &str,
    build: impl FnOnce(String) -> SendMessage,
) {
    let Some((room_id, identifier)) = hub.member(&conn_id) else {
        debug!("Dropping {} update from {}: not in a room", kind, conn_id);
        return;
    };
    hub.broadcast_except(&room_id, &conn_id, build(identifier));
}
