use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::models::{
    CursorPosition, EditOperation, ExecutionResult, PointerPosition, RoomId, ScrollPosition,
};

/// Identifier -> display name for every member of a room.
pub type Roster = BTreeMap<String, String>;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct JoinRoomMessage {
    /// Raw room code as typed, with or without the dash.
    pub room_id: String,
    pub display_name: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SignalMessage {
    /// Identifier of the single peer that should receive the signal.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    pub signal: Value,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PingMessage {
    #[serde(default)]
    pub nonce: Option<String>,
}

/// Everything a client may send, as `{"event": "...", "data": ...}`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ReceivedMessage {
    CreateRoom(String),
    JoinRoom(JoinRoomMessage),
    LeaveRoom,
    SyncRoster,
    SyncDocument,
    UpdateDocument(String),
    ApplyEdit(EditOperation),
    SyncLanguage,
    UpdateLanguage(String),
    SyncNotepad,
    UpdateNotepad(String),
    SyncExecution,
    ExecutionState(bool),
    TerminalOutput(ExecutionResult),
    UpdateCursor(CursorPosition),
    UpdateScroll(ScrollPosition),
    UpdatePointer(PointerPosition),
    #[serde(rename = "webrtc-signal")]
    WebRtcSignal(SignalMessage),
    UserReady,
    CameraOff,
    MicState(bool),
    SpeakerState(bool),
    Ping(PingMessage),
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RoomAck {
    pub room_id: RoomId,
    pub identifier: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RoomNotFound {
    /// Echo of the code the client asked for.
    pub room_id: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct MemberRef {
    pub identifier: String,
}

/// A relayed payload tagged with the identifier of the member that sent it.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Tagged<T> {
    pub identifier: String,
    pub position: T,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TaggedSignal {
    pub identifier: String,
    pub signal: Value,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TaggedToggle {
    pub identifier: String,
    pub enabled: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PongMessage {
    pub date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nonce: Option<String>,
}

/// Everything the server pushes to clients.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum SendMessage {
    RoomCreated(RoomAck),
    RoomJoined(RoomAck),
    RoomNotFound(RoomNotFound),
    RosterUpdated(Roster),
    UserLeft(MemberRef),
    DocumentUpdated(String),
    ApplyEdit(EditOperation),
    LanguageUpdated(String),
    NotepadUpdated(String),
    ExecutionState(bool),
    TerminalOutput(ExecutionResult),
    CursorUpdated(Tagged<CursorPosition>),
    ScrollUpdated(Tagged<ScrollPosition>),
    PointerUpdated(Tagged<PointerPosition>),
    #[serde(rename = "webrtc-signal")]
    WebRtcSignal(TaggedSignal),
    UserReady(MemberRef),
    CameraOff(MemberRef),
    MicState(TaggedToggle),
    SpeakerState(TaggedToggle),
    Pong(PongMessage),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_client_events() {
        let raw = r#"{"event":"join-room","data":{"roomId":"ABCD-1234","displayName":"Ada"}}"#;
        let msg: ReceivedMessage = serde_json::from_str(raw).unwrap();
        assert_eq!(
            msg,
            ReceivedMessage::JoinRoom(JoinRoomMessage {
                room_id: "ABCD-1234".to_string(),
                display_name: "Ada".to_string(),
            })
        );

        let msg: ReceivedMessage = serde_json::from_str(r#"{"event":"leave-room"}"#).unwrap();
        assert_eq!(msg, ReceivedMessage::LeaveRoom);

        let raw = r#"{"event":"apply-edit","data":["x",1,1,1,1]}"#;
        let msg: ReceivedMessage = serde_json::from_str(raw).unwrap();
        assert_eq!(msg, ReceivedMessage::ApplyEdit(EditOperation::new("x", 1, 1, 1, 1)));

        let raw = r#"{"event":"webrtc-signal","data":{"target":"B","signal":{"sdp":"..."}}}"#;
        let msg: ReceivedMessage = serde_json::from_str(raw).unwrap();
        assert!(matches!(
            msg,
            ReceivedMessage::WebRtcSignal(SignalMessage { target: Some(ref t), .. }) if t == "B"
        ));
    }

    #[test]
    fn rejects_unknown_events() {
        assert!(serde_json::from_str::<ReceivedMessage>(r#"{"event":"drop-tables"}"#).is_err());
    }

    #[test]
    fn server_events_are_tagged() {
        let msg = SendMessage::CursorUpdated(Tagged {
            identifier: "B".to_string(),
            position: CursorPosition::Point(2, 5),
        });
        assert_eq!(
            serde_json::to_value(&msg).unwrap(),
            json!({"event": "cursor-updated", "data": {"identifier": "B", "position": [2, 5]}})
        );

        let msg = SendMessage::RoomCreated(RoomAck {
            room_id: RoomId::parse("ABCD1234").unwrap(),
            identifier: "A".to_string(),
        });
        assert_eq!(
            serde_json::to_value(&msg).unwrap(),
            json!({"event": "room-created", "data": {"roomId": "ABCD1234", "identifier": "A"}})
        );
    }
}
