use codecollab_relay::models::{
    CursorPosition, EditOperation, ExecutionResult, JoinRoomMessage, MemberRef, PingMessage,
    PointerPosition, ReceivedMessage, RoomAck, RoomId, RoomNotFound, ScrollPosition, SendMessage,
    SignalMessage, Tagged, TaggedSignal, TaggedToggle,
};
use codecollab_relay::websocket::dispatch;
use codecollab_relay::ws::{connctx::ConnCtx, hub::RoomHub};
use serde_json::json;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use uuid::Uuid;

type Inbox = mpsc::UnboundedReceiver<SendMessage>;

fn connect(hub: &mut RoomHub) -> (Uuid, Inbox) {
    let (tx, rx) = mpsc::unbounded_channel();
    let ctx = ConnCtx::new(tx);
    let id = ctx.id;
    hub.register(ctx);
    (id, rx)
}

fn drain(rx: &mut Inbox) -> Vec<SendMessage> {
    let mut out = Vec::new();
    while let Ok(msg) = rx.try_recv() {
        out.push(msg);
    }
    out
}

/// Create a room from `conn` and return its id.
fn create_room(hub: &mut RoomHub, conn: Uuid, rx: &mut Inbox, name: &str) -> RoomId {
    dispatch(hub, conn, ReceivedMessage::CreateRoom(name.to_string()));
    match drain(rx).as_slice() {
        [SendMessage::RoomCreated(RoomAck { room_id, .. })] => room_id.clone(),
        other => panic!("expected room-created, got {other:?}"),
    }
}

fn join_room(hub: &mut RoomHub, conn: Uuid, room_id: &RoomId, name: &str) {
    dispatch(
        hub,
        conn,
        ReceivedMessage::JoinRoom(JoinRoomMessage {
            room_id: room_id.to_string(),
            display_name: name.to_string(),
        }),
    );
}

fn roster_of(entries: &[(&str, &str)]) -> SendMessage {
    SendMessage::RosterUpdated(
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
    )
}

#[test]
fn test_create_and_join_broadcasts_roster() {
    let mut hub = RoomHub::new("javascript");
    let (alice, mut alice_rx) = connect(&mut hub);
    let (bob, mut bob_rx) = connect(&mut hub);

    let room_id = create_room(&mut hub, alice, &mut alice_rx, "Alice");
    join_room(&mut hub, bob, &room_id, "Bob");

    assert_eq!(
        drain(&mut bob_rx),
        vec![SendMessage::RoomJoined(RoomAck {
            room_id: room_id.clone(),
            identifier: "B".to_string(),
        })]
    );
    assert_eq!(drain(&mut alice_rx), vec![roster_of(&[("A", "Alice"), ("B", "Bob")])]);

    dispatch(&mut hub, bob, ReceivedMessage::SyncRoster);
    assert_eq!(drain(&mut bob_rx), vec![roster_of(&[("A", "Alice"), ("B", "Bob")])]);
    assert!(drain(&mut alice_rx).is_empty());
}

#[test]
fn test_join_unknown_room_is_not_found() {
    let mut hub = RoomHub::new("javascript");
    let (alice, mut alice_rx) = connect(&mut hub);
    let (bob, mut bob_rx) = connect(&mut hub);
    let room_id = create_room(&mut hub, alice, &mut alice_rx, "Alice");

    let missing = RoomId::parse("ZZZZ9999").unwrap();
    join_room(&mut hub, bob, &missing, "Bob");
    assert_eq!(
        drain(&mut bob_rx),
        vec![SendMessage::RoomNotFound(RoomNotFound {
            room_id: "ZZZZ9999".to_string(),
        })]
    );

    dispatch(
        &mut hub,
        bob,
        ReceivedMessage::JoinRoom(JoinRoomMessage {
            room_id: "zzzz-9999".to_string(),
            display_name: "Bob".to_string(),
        }),
    );
    assert_eq!(
        drain(&mut bob_rx),
        vec![SendMessage::RoomNotFound(RoomNotFound {
            room_id: "zzzz-9999".to_string(),
        })]
    );

    assert!(drain(&mut alice_rx).is_empty());
    assert_eq!(hub.rooms.roster(&room_id).len(), 1);
    assert_eq!(hub.rooms.member_count(), 1);
    assert!(hub.member(&bob).is_none());
}

#[test]
fn test_join_while_in_another_room_moves_member() {
    let mut hub = RoomHub::new("javascript");
    let (alice, mut alice_rx) = connect(&mut hub);
    let (bob, mut bob_rx) = connect(&mut hub);
    let first = create_room(&mut hub, alice, &mut alice_rx, "Alice");
    let second = create_room(&mut hub, bob, &mut bob_rx, "Bob");

    join_room(&mut hub, alice, &second, "Alice");

    // Alice was alone in the first room, so it is gone.
    assert!(!hub.docs.room_exists(&first));
    assert_eq!(hub.rooms.room_of(&alice), Some(&second));
    assert_eq!(hub.rooms.roster(&second).len(), 2);

    // Re-joining the current room only repeats the ack.
    drain(&mut alice_rx);
    join_room(&mut hub, alice, &second, "Alice");
    assert!(matches!(drain(&mut alice_rx).as_slice(), [SendMessage::RoomJoined(_)]));
    assert_eq!(hub.rooms.roster(&second).len(), 2);
}

#[test]
fn test_edit_is_relayed_then_applied() {
    let mut hub = RoomHub::new("javascript");
    let (alice, mut alice_rx) = connect(&mut hub);
    let (bob, mut bob_rx) = connect(&mut hub);
    let room_id = create_room(&mut hub, alice, &mut alice_rx, "Alice");
    join_room(&mut hub, bob, &room_id, "Bob");
    drain(&mut alice_rx);
    drain(&mut bob_rx);

    let op = EditOperation::new("world", 1, 1, 1, 1);
    dispatch(&mut hub, alice, ReceivedMessage::ApplyEdit(op.clone()));
    let op2 = EditOperation::new("hello ", 1, 1, 1, 1);
    dispatch(&mut hub, bob, ReceivedMessage::ApplyEdit(op2.clone()));

    assert_eq!(drain(&mut bob_rx), vec![SendMessage::ApplyEdit(op)]);
    assert_eq!(drain(&mut alice_rx), vec![SendMessage::ApplyEdit(op2)]);
    assert_eq!(hub.docs.document(&room_id), "hello world");

    dispatch(&mut hub, bob, ReceivedMessage::SyncDocument);
    assert_eq!(drain(&mut bob_rx), vec![SendMessage::DocumentUpdated("hello world".to_string())]);
    assert!(drain(&mut alice_rx).is_empty());
}

#[test]
fn test_full_document_replacement() {
    let mut hub = RoomHub::new("javascript");
    let (alice, mut alice_rx) = connect(&mut hub);
    let (bob, mut bob_rx) = connect(&mut hub);
    let room_id = create_room(&mut hub, alice, &mut alice_rx, "Alice");
    join_room(&mut hub, bob, &room_id, "Bob");
    drain(&mut alice_rx);
    drain(&mut bob_rx);

    dispatch(&mut hub, alice, ReceivedMessage::UpdateDocument("fn main() {}".to_string()));
    assert_eq!(drain(&mut bob_rx), vec![SendMessage::DocumentUpdated("fn main() {}".to_string())]);
    assert!(drain(&mut alice_rx).is_empty());
    assert_eq!(hub.docs.document(&room_id), "fn main() {}");
}

#[test]
fn test_broadcasts_never_echo_to_sender() {
    let mut hub = RoomHub::new("javascript");
    let (alice, mut alice_rx) = connect(&mut hub);
    let (bob, mut bob_rx) = connect(&mut hub);
    let (carol, mut carol_rx) = connect(&mut hub);
    let room_id = create_room(&mut hub, alice, &mut alice_rx, "Alice");
    join_room(&mut hub, bob, &room_id, "Bob");
    join_room(&mut hub, carol, &room_id, "Carol");
    drain(&mut alice_rx);
    drain(&mut bob_rx);
    drain(&mut carol_rx);

    let result: ExecutionResult =
        serde_json::from_value(json!({"stdout": "42\n", "exitCode": 0})).unwrap();
    let events = vec![
        (
            ReceivedMessage::ApplyEdit(EditOperation::new("x", 1, 1, 1, 1)),
            SendMessage::ApplyEdit(EditOperation::new("x", 1, 1, 1, 1)),
        ),
        (
            ReceivedMessage::UpdateCursor(CursorPosition::Selection(1, 2, 1, 1, 1, 2)),
            SendMessage::CursorUpdated(Tagged {
                identifier: "A".to_string(),
                position: CursorPosition::Selection(1, 2, 1, 1, 1, 2),
            }),
        ),
        (
            ReceivedMessage::UpdateScroll(ScrollPosition(0.0, 120.5)),
            SendMessage::ScrollUpdated(Tagged {
                identifier: "A".to_string(),
                position: ScrollPosition(0.0, 120.5),
            }),
        ),
        (
            ReceivedMessage::UpdatePointer(PointerPosition(0.25, 0.75)),
            SendMessage::PointerUpdated(Tagged {
                identifier: "A".to_string(),
                position: PointerPosition(0.25, 0.75),
            }),
        ),
        (
            ReceivedMessage::UpdateNotepad("notes".to_string()),
            SendMessage::NotepadUpdated("notes".to_string()),
        ),
        (
            ReceivedMessage::UpdateLanguage("rust".to_string()),
            SendMessage::LanguageUpdated("rust".to_string()),
        ),
        (ReceivedMessage::ExecutionState(true), SendMessage::ExecutionState(true)),
        (
            ReceivedMessage::TerminalOutput(result.clone()),
            SendMessage::TerminalOutput(result),
        ),
        (
            ReceivedMessage::UserReady,
            SendMessage::UserReady(MemberRef {
                identifier: "A".to_string(),
            }),
        ),
        (
            ReceivedMessage::MicState(false),
            SendMessage::MicState(TaggedToggle {
                identifier: "A".to_string(),
                enabled: false,
            }),
        ),
    ];

    for (inbound, expected) in events {
        dispatch(&mut hub, alice, inbound);
        assert!(drain(&mut alice_rx).is_empty());
        assert_eq!(drain(&mut bob_rx), vec![expected.clone()]);
        assert_eq!(drain(&mut carol_rx), vec![expected]);
    }
}

#[test]
fn test_terminal_output_relayed_verbatim() {
    let mut hub = RoomHub::new("javascript");
    let (alice, mut alice_rx) = connect(&mut hub);
    let (bob, mut bob_rx) = connect(&mut hub);
    let room_id = create_room(&mut hub, alice, &mut alice_rx, "Alice");
    join_room(&mut hub, bob, &room_id, "Bob");
    drain(&mut alice_rx);
    drain(&mut bob_rx);

    let data = json!({
        "stdout": null,
        "stderr": null,
        "compileOutput": null,
        "message": null,
        "exitCode": 1.0,
        "time": "0.004",
        "memory": 3120,
        "status": {"id": 11, "description": "Runtime Error (NZEC)"},
        "token": "d85cd024-1548-4165-96c7-7bc88673f194"
    });
    let frame = json!({"event": "terminal-output", "data": data.clone()}).to_string();
    let msg: ReceivedMessage = serde_json::from_str(&frame).unwrap();
    dispatch(&mut hub, alice, msg);

    assert!(drain(&mut alice_rx).is_empty());
    let received = drain(&mut bob_rx);
    assert_eq!(received.len(), 1);
    let wire = serde_json::to_string(&received[0]).unwrap();
    let wire: serde_json::Value = serde_json::from_str(&wire).unwrap();
    assert_eq!(wire, json!({"event": "terminal-output", "data": data}));
}

#[test]
fn test_late_joiner_syncs_cached_state() {
    let mut hub = RoomHub::new("javascript");
    let (alice, mut alice_rx) = connect(&mut hub);
    let room_id = create_room(&mut hub, alice, &mut alice_rx, "Alice");

    dispatch(&mut hub, alice, ReceivedMessage::UpdateLanguage("python".to_string()));
    let notes = "remember the edge cases".to_string();
    dispatch(&mut hub, alice, ReceivedMessage::UpdateNotepad(notes));
    dispatch(&mut hub, alice, ReceivedMessage::ExecutionState(true));
    let edit = EditOperation::new("print(1)", 1, 1, 1, 1);
    dispatch(&mut hub, alice, ReceivedMessage::ApplyEdit(edit));

    let (bob, mut bob_rx) = connect(&mut hub);
    join_room(&mut hub, bob, &room_id, "Bob");
    drain(&mut bob_rx);

    for sync in [
        ReceivedMessage::SyncDocument,
        ReceivedMessage::SyncLanguage,
        ReceivedMessage::SyncNotepad,
        ReceivedMessage::SyncExecution,
    ] {
        dispatch(&mut hub, bob, sync);
    }
    assert_eq!(
        drain(&mut bob_rx),
        vec![
            SendMessage::DocumentUpdated("print(1)".to_string()),
            SendMessage::LanguageUpdated("python".to_string()),
            SendMessage::NotepadUpdated("remember the edge cases".to_string()),
            SendMessage::ExecutionState(true),
        ]
    );
}

#[test]
fn test_new_room_starts_with_defaults() {
    let mut hub = RoomHub::new("typescript");
    let (alice, mut alice_rx) = connect(&mut hub);
    create_room(&mut hub, alice, &mut alice_rx, "Alice");

    dispatch(&mut hub, alice, ReceivedMessage::SyncDocument);
    dispatch(&mut hub, alice, ReceivedMessage::SyncLanguage);
    dispatch(&mut hub, alice, ReceivedMessage::SyncNotepad);
    assert_eq!(
        drain(&mut alice_rx),
        vec![
            SendMessage::DocumentUpdated(String::new()),
            SendMessage::LanguageUpdated("typescript".to_string()),
            SendMessage::NotepadUpdated(String::new()),
        ]
    );
}

#[test]
fn test_leave_notifies_and_is_idempotent() {
    let mut hub = RoomHub::new("javascript");
    let (alice, mut alice_rx) = connect(&mut hub);
    let (bob, mut bob_rx) = connect(&mut hub);
    let room_id = create_room(&mut hub, alice, &mut alice_rx, "Alice");
    join_room(&mut hub, bob, &room_id, "Bob");
    drain(&mut alice_rx);
    drain(&mut bob_rx);

    dispatch(&mut hub, bob, ReceivedMessage::LeaveRoom);
    assert_eq!(
        drain(&mut alice_rx),
        vec![
            SendMessage::UserLeft(MemberRef {
                identifier: "B".to_string(),
            }),
            roster_of(&[("A", "Alice")]),
        ]
    );
    assert!(drain(&mut bob_rx).is_empty());

    dispatch(&mut hub, bob, ReceivedMessage::LeaveRoom);
    hub.leave(&bob);
    assert!(drain(&mut alice_rx).is_empty());
    assert!(hub.docs.room_exists(&room_id));
    assert_eq!(hub.rooms.roster(&room_id).len(), 1);
}

#[test]
fn test_last_member_leaving_purges_room() {
    let mut hub = RoomHub::new("javascript");
    let (alice, mut alice_rx) = connect(&mut hub);
    let (bob, mut bob_rx) = connect(&mut hub);
    let room_id = create_room(&mut hub, alice, &mut alice_rx, "Alice");
    join_room(&mut hub, bob, &room_id, "Bob");

    dispatch(&mut hub, alice, ReceivedMessage::UpdateNotepad("scratch".to_string()));
    dispatch(&mut hub, alice, ReceivedMessage::ExecutionState(true));
    dispatch(&mut hub, bob, ReceivedMessage::ApplyEdit(EditOperation::new("code", 1, 1, 1, 1)));

    hub.disconnect(&alice);
    dispatch(&mut hub, bob, ReceivedMessage::LeaveRoom);

    assert!(!hub.docs.room_exists(&room_id));
    assert!(!hub.channels.has_state(&room_id));
    assert!(hub.rooms.roster(&room_id).is_empty());
    assert_eq!(hub.rooms.room_count(), 0);

    // The code is dead now.
    let (carol, mut carol_rx) = connect(&mut hub);
    join_room(&mut hub, carol, &room_id, "Carol");
    assert!(matches!(drain(&mut carol_rx).as_slice(), [SendMessage::RoomNotFound(_)]));
    drain(&mut bob_rx);
}

#[test]
fn test_roomless_events_are_dropped() {
    let mut hub = RoomHub::new("javascript");
    let (alice, mut alice_rx) = connect(&mut hub);
    let (loner, mut loner_rx) = connect(&mut hub);
    let room_id = create_room(&mut hub, alice, &mut alice_rx, "Alice");

    for msg in [
        ReceivedMessage::ApplyEdit(EditOperation::new("nope", 1, 1, 1, 1)),
        ReceivedMessage::UpdateCursor(CursorPosition::Point(1, 1)),
        ReceivedMessage::UpdateNotepad("nope".to_string()),
        ReceivedMessage::UpdateLanguage("cobol".to_string()),
        ReceivedMessage::ExecutionState(true),
        ReceivedMessage::SyncDocument,
        ReceivedMessage::SyncRoster,
        ReceivedMessage::LeaveRoom,
        ReceivedMessage::CameraOff,
    ] {
        dispatch(&mut hub, loner, msg);
    }

    assert!(drain(&mut loner_rx).is_empty());
    assert!(drain(&mut alice_rx).is_empty());
    assert_eq!(hub.docs.document(&room_id), "");
    assert_eq!(hub.docs.language(&room_id), "javascript");

    // Unknown connections are ignored too.
    let edit = EditOperation::new("x", 1, 1, 1, 1);
    dispatch(&mut hub, Uuid::new_v4(), ReceivedMessage::ApplyEdit(edit));
    hub.disconnect(&Uuid::new_v4());
    assert_eq!(hub.docs.document(&room_id), "");
}

#[test]
fn test_targeted_signal_reaches_only_target() {
    let mut hub = RoomHub::new("javascript");
    let (alice, mut alice_rx) = connect(&mut hub);
    let (bob, mut bob_rx) = connect(&mut hub);
    let (carol, mut carol_rx) = connect(&mut hub);
    let (outsider, mut outsider_rx) = connect(&mut hub);
    let room_id = create_room(&mut hub, alice, &mut alice_rx, "Alice");
    join_room(&mut hub, bob, &room_id, "Bob");
    join_room(&mut hub, carol, &room_id, "Carol");
    create_room(&mut hub, outsider, &mut outsider_rx, "Dave");
    drain(&mut alice_rx);
    drain(&mut bob_rx);
    drain(&mut carol_rx);

    let signal = json!({"type": "offer", "sdp": "v=0"});
    dispatch(
        &mut hub,
        alice,
        ReceivedMessage::WebRtcSignal(SignalMessage {
            target: Some("C".to_string()),
            signal: signal.clone(),
        }),
    );
    assert!(drain(&mut bob_rx).is_empty());
    assert_eq!(
        drain(&mut carol_rx),
        vec![SendMessage::WebRtcSignal(TaggedSignal {
            identifier: "A".to_string(),
            signal: signal.clone(),
        })]
    );

    // Dave holds identifier D but sits in another room.
    dispatch(
        &mut hub,
        alice,
        ReceivedMessage::WebRtcSignal(SignalMessage {
            target: Some("D".to_string()),
            signal: signal.clone(),
        }),
    );
    assert!(drain(&mut outsider_rx).is_empty());

    let broadcast = SignalMessage { target: None, signal };
    dispatch(&mut hub, alice, ReceivedMessage::WebRtcSignal(broadcast));
    assert_eq!(drain(&mut bob_rx).len(), 1);
    assert_eq!(drain(&mut carol_rx).len(), 1);
    assert!(drain(&mut alice_rx).is_empty());
}

#[test]
fn test_identifier_reuse_through_hub() {
    let mut hub = RoomHub::new("javascript");
    let (alice, mut alice_rx) = connect(&mut hub);
    let (bob, mut bob_rx) = connect(&mut hub);
    let room_id = create_room(&mut hub, alice, &mut alice_rx, "Alice");
    join_room(&mut hub, bob, &room_id, "Bob");
    drain(&mut bob_rx);

    hub.disconnect(&alice);
    let (carol, mut carol_rx) = connect(&mut hub);
    join_room(&mut hub, carol, &room_id, "Carol");
    assert_eq!(
        drain(&mut carol_rx),
        vec![SendMessage::RoomJoined(RoomAck {
            room_id: room_id.clone(),
            identifier: "A".to_string(),
        })]
    );
}

#[test]
fn test_roster_consistency_after_churn() {
    let mut hub = RoomHub::new("javascript");
    let mut clients: Vec<(Uuid, Inbox)> = (0..6).map(|_| connect(&mut hub)).collect();

    let (first, first_rx) = &mut clients[0];
    let room_a = create_room(&mut hub, *first, first_rx, "c0");
    let (second, second_rx) = &mut clients[1];
    let room_b = create_room(&mut hub, *second, second_rx, "c1");

    for (i, (conn, _)) in clients.iter().enumerate().skip(2) {
        let room = if i % 2 == 0 { &room_a } else { &room_b };
        join_room(&mut hub, *conn, room, &format!("c{i}"));
    }
    hub.disconnect(&clients[0].0);
    dispatch(&mut hub, clients[3].0, ReceivedMessage::LeaveRoom);
    join_room(&mut hub, clients[3].0, &room_a, "c3");

    let mut seen = 0;
    for room in [&room_a, &room_b] {
        for identifier in hub.rooms.roster(room).keys() {
            let conn = hub
                .rooms
                .connection_of(identifier)
                .expect("roster entry without connection");
            assert_eq!(hub.rooms.room_of(&conn), Some(room));
            seen += 1;
        }
    }
    assert_eq!(seen, hub.rooms.member_count());
    assert_eq!(seen, 5);
}

#[test]
fn test_ping_needs_no_room() {
    let mut hub = RoomHub::new("javascript");
    let (conn, mut rx) = connect(&mut hub);
    dispatch(
        &mut hub,
        conn,
        ReceivedMessage::Ping(PingMessage {
            nonce: Some("n1".to_string()),
        }),
    );
    match drain(&mut rx).as_slice() {
        [SendMessage::Pong(pong)] => {
            assert_eq!(pong.nonce.as_deref(), Some("n1"));
            assert!(!pong.date.is_empty());
        }
        other => panic!("expected pong, got {other:?}"),
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_edits_are_serialized() {
    let hub = Arc::new(Mutex::new(RoomHub::new("javascript")));

    let mut writers = Vec::new();
    let room_id = {
        let mut guard = hub.lock().await;
        let (owner, mut owner_rx) = connect(&mut guard);
        let room_id = create_room(&mut guard, owner, &mut owner_rx, "owner");
        writers.push((owner, owner_rx));
        for i in 0..7 {
            let (conn, rx) = connect(&mut guard);
            join_room(&mut guard, conn, &room_id, &format!("w{i}"));
            writers.push((conn, rx));
        }
        room_id
    };

    let mut tasks = Vec::new();
    for (conn, _) in &writers {
        let hub = hub.clone();
        let conn = *conn;
        tasks.push(tokio::spawn(async move {
            for _ in 0..100 {
                let mut guard = hub.lock().await;
                let edit = EditOperation::new("x", 1, 1, 1, 1);
                dispatch(&mut guard, conn, ReceivedMessage::ApplyEdit(edit));
                drop(guard);
                tokio::task::yield_now().await;
            }
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }

    let guard = hub.lock().await;
    assert_eq!(guard.docs.document(&room_id), "x".repeat(800));

    // Each writer saw every edit but its own.
    drop(guard);
    for (_, rx) in writers.iter_mut() {
        let edits = drain(rx)
            .into_iter()
            .filter(|msg| matches!(msg, SendMessage::ApplyEdit(_)))
            .count();
        assert_eq!(edits, 700);
    }
}
