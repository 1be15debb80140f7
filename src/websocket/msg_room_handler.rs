use tracing::{debug, info};
use uuid::Uuid;

use crate::models::{JoinRoomMessage, RoomAck, RoomId, RoomNotFound, SendMessage};
use crate::services::room_service::JoinError;
use crate::ws::hub::RoomHub;

/// Handle create-room: open a fresh room with the sender as sole member.
pub fn handle_create_room(hub: &mut RoomHub, conn_id: Uuid, display_name: &str) {
    hub.leave(&conn_id);

    let (room_id, identifier) = hub.rooms.create(conn_id, display_name, &hub.docs);
    hub.docs.init(&room_id);

    hub.send_to(&conn_id, SendMessage::RoomCreated(RoomAck { room_id, identifier }));
}

/// Handle join-room: add the sender to an existing room and tell everyone else.
pub fn handle_join_room(hub: &mut RoomHub, conn_id: Uuid, join_msg: JoinRoomMessage) {
    let JoinRoomMessage { room_id: raw_room_id, display_name } = join_msg;

    let room_id = match RoomId::parse(&raw_room_id) {
        Ok(room_id) => room_id,
        Err(e) => {
            info!("Join with malformed room id {:?} from {}: {}", raw_room_id, conn_id, e);
            hub.send_to(&conn_id, SendMessage::RoomNotFound(RoomNotFound { room_id: raw_room_id }));
            return;
        }
    };

    // Joining the room you are already in just repeats the ack.
    if let Some((current, identifier)) = hub.member(&conn_id) {
        if current == room_id {
            debug!("{} is already in room {}", identifier, room_id);
            hub.send_to(&conn_id, SendMessage::RoomJoined(RoomAck { room_id, identifier }));
            return;
        }
    }

    if !hub.docs.room_exists(&room_id) {
        info!("Join for unknown room {} from {}", room_id, conn_id);
        hub.send_to(
            &conn_id,
            SendMessage::RoomNotFound(RoomNotFound {
                room_id: room_id.as_str().to_string(),
            }),
        );
        return;
    }

    hub.leave(&conn_id);

    match hub.rooms.join(conn_id, &room_id, &display_name, &hub.docs) {
        Ok(identifier) => {
            hub.send_to(
                &conn_id,
                SendMessage::RoomJoined(RoomAck {
                    room_id: room_id.clone(),
                    identifier,
                }),
            );
            hub.broadcast_roster(&room_id, Some(&conn_id));
        }
        Err(JoinError::RoomNotFound(room_id)) => {
            hub.send_to(
                &conn_id,
                SendMessage::RoomNotFound(RoomNotFound {
                    room_id: room_id.as_str().to_string(),
                }),
            );
        }
    }
}

/// Handle leave-room.
pub fn handle_leave_room(hub: &mut RoomHub, conn_id: Uuid) {
    hub.leave(&conn_id);
}
