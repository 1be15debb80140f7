use std::collections::HashMap;

use crate::models::RoomId;

/// Cached state of the side channels that late joiners can ask for:
/// the shared notepad and the "someone is executing code" flag.
///
/// Cursor, scroll, pointer and terminal output are relay-only and never land here.
#[derive(Debug, Default)]
pub struct ChannelStore {
    notepads: HashMap<RoomId, String>,
    executing: HashMap<RoomId, bool>,
}

impl ChannelStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notepad(&self, room_id: &RoomId) -> &str {
        self.notepads.get(room_id).map_or("", String::as_str)
    }

    pub fn set_notepad(&mut self, room_id: &RoomId, text: String) {
        self.notepads.insert(room_id.clone(), text);
    }

    pub fn is_executing(&self, room_id: &RoomId) -> bool {
        self.executing.get(room_id).copied().unwrap_or(false)
    }

    pub fn set_executing(&mut self, room_id: &RoomId, running: bool) {
        if running {
            self.executing.insert(room_id.clone(), true);
        } else {
            self.executing.remove(room_id);
        }
    }

    /// Purge everything held for the room.
    pub fn delete(&mut self, room_id: &RoomId) {
        self.notepads.remove(room_id);
        self.executing.remove(room_id);
    }

    pub fn has_state(&self, room_id: &RoomId) -> bool {
        self.notepads.contains_key(room_id) || self.executing.contains_key(room_id)
    }
}
