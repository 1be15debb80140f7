use moka::sync::Cache;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::models::{RoomId, Roster};
use crate::services::doc_edit_service::DocumentStore;
use crate::services::identity_service::IdentityRegistry;

/// Longest display name kept server-side, in characters.
pub const MAX_DISPLAY_NAME_LEN: usize = 64;

/// Upper bound on the number of rooms with a cached roster snapshot.
pub const ROSTER_CACHE_CAPACITY: u64 = 10_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JoinError {
    RoomNotFound(RoomId),
}

impl fmt::Display for JoinError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JoinError::RoomNotFound(room_id) => write!(f, "room {} not found", room_id),
        }
    }
}

impl std::error::Error for JoinError {}

/// What happened when a connection left its room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Departure {
    pub room_id: RoomId,
    pub identifier: String,
    /// The roster is now empty and the room is gone.
    pub room_emptied: bool,
}

#[derive(Debug, Default)]
struct RoomMembers {
    roster: Roster,
    connections: HashSet<Uuid>,
}

/// Which connection sits in which room, under which identifier and name.
///
/// Identities live exactly as long as a membership: they are assigned on
/// create/join and released on leave.
pub struct RoomDirectory {
    identities: IdentityRegistry,
    rooms: HashMap<RoomId, RoomMembers>,
    membership: HashMap<Uuid, RoomId>,
    roster_cache: Cache<RoomId, Arc<Roster>>,
}

impl Default for RoomDirectory {
    fn default() -> Self {
        Self::new()
    }
}

impl RoomDirectory {
    pub fn new() -> Self {
        Self {
            identities: IdentityRegistry::new(),
            rooms: HashMap::new(),
            membership: HashMap::new(),
            roster_cache: Cache::builder().max_capacity(ROSTER_CACHE_CAPACITY).build(),
        }
    }

    /// Open a new room with `conn_id` as its only member.
    ///
    /// The room id is regenerated until it collides with neither a tracked
    /// document nor a known room. The caller must have made the connection
    /// leave any previous room.
    pub fn create(
        &mut self,
        conn_id: Uuid,
        display_name: &str,
        docs: &DocumentStore,
    ) -> (RoomId, String) {
        let room_id = loop {
            let candidate = RoomId::generate();
            if !docs.room_exists(&candidate) && !self.rooms.contains_key(&candidate) {
                break candidate;
            }
            debug!("Room id {} already live, regenerating", candidate);
        };

        let identifier = self.admit(conn_id, &room_id, display_name);
        info!("Room {} created by {} ({})", room_id, identifier, conn_id);
        (room_id, identifier)
    }

    /// Add `conn_id` to an existing room. Nothing changes when the room has no live document.
    pub fn join(
        &mut self,
        conn_id: Uuid,
        room_id: &RoomId,
        display_name: &str,
        docs: &DocumentStore,
    ) -> Result<String, JoinError> {
        if !docs.room_exists(room_id) {
            return Err(JoinError::RoomNotFound(room_id.clone()));
        }

        let identifier = self.admit(conn_id, room_id, display_name);
        info!("{} ({}) joined room {}", identifier, conn_id, room_id);
        Ok(identifier)
    }

    /// Remove the connection from its room, if it has one.
    pub fn leave(&mut self, conn_id: &Uuid) -> Option<Departure> {
        let room_id = self.membership.remove(conn_id)?;
        let identifier = self.identities.release(conn_id)?;

        let room_emptied = match self.rooms.get_mut(&room_id) {
            Some(members) => {
                members.roster.remove(&identifier);
                members.connections.remove(conn_id);
                members.connections.is_empty()
            }
            None => true,
        };
        if room_emptied {
            self.rooms.remove(&room_id);
        }
        self.roster_cache.invalidate(&room_id);

        info!("{} ({}) left room {}", identifier, conn_id, room_id);
        Some(Departure {
            room_id,
            identifier,
            room_emptied,
        })
    }

    pub fn room_of(&self, conn_id: &Uuid) -> Option<&RoomId> {
        self.membership.get(conn_id)
    }

    pub fn identifier_of(&self, conn_id: &Uuid) -> Option<&str> {
        self.identities.lookup(conn_id)
    }

    pub fn connection_of(&self, identifier: &str) -> Option<Uuid> {
        self.identities.lookup_connection(identifier)
    }

    /// Connections currently in the room.
    pub fn connections(&self, room_id: &RoomId) -> impl Iterator<Item = &Uuid> + '_ {
        self.rooms
            .get(room_id)
            .into_iter()
            .flat_map(|members| members.connections.iter())
    }

    pub fn roster(&self, room_id: &RoomId) -> Roster {
        self.rooms
            .get(room_id)
            .map(|members| members.roster.clone())
            .unwrap_or_default()
    }

    /// Shared snapshot of the roster, rebuilt only after membership changes.
    pub fn cached_roster(&self, room_id: &RoomId) -> Arc<Roster> {
        self.roster_cache
            .get_with(room_id.clone(), || Arc::new(self.roster(room_id)))
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    pub fn member_count(&self) -> usize {
        self.membership.len()
    }

    fn admit(&mut self, conn_id: Uuid, room_id: &RoomId, display_name: &str) -> String {
        let identifier = self.identities.assign(conn_id);
        let members = self.rooms.entry(room_id.clone()).or_default();
        members.roster.insert(identifier.clone(), clean_display_name(display_name));
        members.connections.insert(conn_id);
        self.membership.insert(conn_id, room_id.clone());
        self.roster_cache.invalidate(room_id);
        identifier
    }
}

fn clean_display_name(display_name: &str) -> String {
    display_name.trim().chars().take(MAX_DISPLAY_NAME_LEN).collect()
}
