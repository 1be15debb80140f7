use chrono::Utc;
use std::collections::HashMap;
use tracing::{debug, info};
use uuid::Uuid;

use crate::models::{MemberRef, RoomId, SendMessage};
use crate::services::channel_service::ChannelStore;
use crate::services::doc_edit_service::DocumentStore;
use crate::services::room_service::RoomDirectory;
use crate::ws::connctx::ConnCtx;

/// Owner of all room state plus the outbound side of every connection.
///
/// The hub sits behind a single mutex in `AppState`. Each inbound event is
/// handled start to finish under that lock and nothing in here awaits, so
/// events are applied in the order the lock is granted, one at a time.
pub struct RoomHub {
    connections: HashMap<Uuid, ConnCtx>,
    pub rooms: RoomDirectory,
    pub docs: DocumentStore,
    pub channels: ChannelStore,
}

impl RoomHub {
    pub fn new(default_language: impl Into<String>) -> Self {
        Self {
            connections: HashMap::new(),
            rooms: RoomDirectory::new(),
            docs: DocumentStore::new(default_language),
            channels: ChannelStore::new(),
        }
    }

    pub fn register(&mut self, ctx: ConnCtx) {
        debug!("Registered connection {}", ctx.id);
        self.connections.insert(ctx.id, ctx);
    }

    /// Clean up after a connection, whatever state it was in.
    pub fn disconnect(&mut self, conn_id: &Uuid) {
        self.leave(conn_id);
        if let Some(ctx) = self.connections.remove(conn_id) {
            let lifetime = Utc::now() - ctx.connected_at;
            debug!("Unregistered connection {} after {}s", conn_id, lifetime.num_seconds());
        }
    }

    /// Take the connection out of its room. Safe to call repeatedly.
    ///
    /// When the last member goes, every piece of room state goes with it.
    /// Otherwise the remaining members learn who left and get the new roster.
    pub fn leave(&mut self, conn_id: &Uuid) {
        let Some(departure) = self.rooms.leave(conn_id) else {
            return;
        };

        if departure.room_emptied {
            self.docs.delete(&departure.room_id);
            self.channels.delete(&departure.room_id);
            info!("Room {} is empty and was deleted", departure.room_id);
            return;
        }

        self.broadcast_except(
            &departure.room_id,
            conn_id,
            SendMessage::UserLeft(MemberRef {
                identifier: departure.identifier,
            }),
        );
        self.broadcast_roster(&departure.room_id, None);
    }

    /// Room and identifier of a connection, or `None` when it has neither.
    pub fn member(&self, conn_id: &Uuid) -> Option<(RoomId, String)> {
        let room_id = self.rooms.room_of(conn_id)?;
        let identifier = self.rooms.identifier_of(conn_id)?;
        Some((room_id.clone(), identifier.to_string()))
    }

    pub fn send_to(&self, conn_id: &Uuid, msg: SendMessage) {
        match self.connections.get(conn_id) {
            Some(ctx) => {
                if !ctx.send(msg) {
                    debug!("Connection {} closed before delivery", conn_id);
                }
            }
            None => debug!("No open connection {}", conn_id),
        }
    }

    /// Deliver to every member of the room but `except`.
    pub fn broadcast_except(&self, room_id: &RoomId, except: &Uuid, msg: SendMessage) {
        for conn_id in self.rooms.connections(room_id) {
            if conn_id == except {
                continue;
            }
            if let Some(ctx) = self.connections.get(conn_id) {
                ctx.send(msg.clone());
            }
        }
    }

    /// Push the full roster to the room, optionally skipping one connection.
    pub fn broadcast_roster(&self, room_id: &RoomId, except: Option<&Uuid>) {
        let roster = self.rooms.cached_roster(room_id);
        for conn_id in self.rooms.connections(room_id) {
            if Some(conn_id) == except {
                continue;
            }
            if let Some(ctx) = self.connections.get(conn_id) {
                ctx.send(SendMessage::RosterUpdated((*roster).clone()));
            }
        }
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }
}
