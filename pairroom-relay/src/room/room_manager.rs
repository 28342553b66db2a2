use crate::room::{Room, RoomCommand};
use dashmap::DashMap;
use pairroom_core::RoomId;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::info;

/// Creates room actors on first use and hands out their command senders.
#[derive(Clone)]
pub struct RoomManager {
    rooms: Arc<DashMap<RoomId, mpsc::Sender<RoomCommand>>>,
    default_language: Arc<str>,
}

impl RoomManager {
    pub fn new(default_language: &str) -> Self {
        Self {
            rooms: Arc::new(DashMap::new()),
            default_language: Arc::from(default_language),
        }
    }

    pub fn get_room_sender(&self, room_id: &RoomId) -> mpsc::Sender<RoomCommand> {
        if let Some(sender) = self.rooms.get(room_id) {
            return sender.clone();
        }

        self.rooms
            .entry(room_id.clone())
            .or_insert_with(|| {
                info!("Creating new room: {}", room_id);
                let (tx, rx) = mpsc::channel(100);
                let room = Room::new(room_id.clone(), self.default_language.to_string(), rx);
                tokio::spawn(room.run());
                tx
            })
            .clone()
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }
}
