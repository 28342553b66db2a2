use crate::room::room_command::{ConnectionId, Outbox, RoomCommand};
use pairroom_core::utils::now_millis;
use pairroom_core::{
    IceCandidate, Participant, RelayEvent, RelayPayload, RoomId, RoomPayload, SessionDescription,
    UserId,
};
use std::collections::HashMap;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

struct Member {
    user: Participant,
    outbox: Outbox,
}

/// One room's actor: membership, the shared code buffer and its language.
/// Lives for the lifetime of the relay so the code survives empty periods.
pub struct Room {
    id: RoomId,
    code: String,
    language: String,
    members: HashMap<ConnectionId, Member>,
    command_rx: mpsc::Receiver<RoomCommand>,
}

impl Room {
    pub fn new(id: RoomId, language: String, command_rx: mpsc::Receiver<RoomCommand>) -> Self {
        Self {
            id,
            code: String::new(),
            language,
            members: HashMap::new(),
            command_rx,
        }
    }

    pub async fn run(mut self) {
        info!("Room {} event loop started", self.id);

        while let Some(cmd) = self.command_rx.recv().await {
            self.prune_closed();
            self.handle_command(cmd);
            self.prune_closed();
        }

        info!("Room {} event loop finished", self.id);
    }

    fn handle_command(&mut self, cmd: RoomCommand) {
        match cmd {
            RoomCommand::Join { conn, user, outbox } => self.join(conn, user, outbox),
            RoomCommand::Leave { conn } => self.leave(conn),
            RoomCommand::Forward { conn, payload } => {
                let Some(sender) = self.members.get(&conn).map(|m| m.user.clone()) else {
                    warn!(
                        "Dropping {} from connection {}: not a member of room {}",
                        payload.event_name(),
                        conn,
                        self.id
                    );
                    return;
                };
                self.forward(conn, sender, payload);
            }
        }
    }

    /// Members whose socket task is gone leave as if they had said so.
    fn prune_closed(&mut self) {
        loop {
            let Some(conn) = self
                .members
                .iter()
                .find(|(_, m)| m.outbox.is_closed())
                .map(|(conn, _)| *conn)
            else {
                return;
            };
            warn!("Connection {} closed without leaving room {}", conn, self.id);
            self.leave(conn);
        }
    }

    fn join(&mut self, conn: ConnectionId, user: Participant, outbox: Outbox) {
        info!("User {} joined room {}", user.username, self.id);
        self.members.insert(
            conn,
            Member {
                user: user.clone(),
                outbox,
            },
        );

        // 1. Everyone, the joiner included, hears about it
        let message = format!("{} joined the room", user.username);
        self.broadcast(
            RelayPayload::UserJoined {
                user,
                message,
                timestamp: now_millis(),
            },
            None,
        );

        // 2. The joiner gets the current room state
        let sync = RelayPayload::SyncCode {
            code: self.code.clone(),
            language: self.language.clone(),
            users: self.participants(),
        };
        self.send_to(conn, sync);
    }

    fn leave(&mut self, conn: ConnectionId) {
        let Some(member) = self.members.remove(&conn) else {
            debug!("Connection {} left room {} without joining", conn, self.id);
            return;
        };
        info!("User {} left room {}", member.user.username, self.id);

        let message = format!("{} left the room", member.user.username);
        self.broadcast(
            RelayPayload::UserLeft {
                user_id: member.user.id,
                username: member.user.username,
                message,
                timestamp: now_millis(),
            },
            None,
        );
    }

    fn forward(&mut self, conn: ConnectionId, sender: Participant, payload: RoomPayload) {
        match payload {
            RoomPayload::Join | RoomPayload::Leave => {
                debug!("Membership frame forwarded to room {} ignored", self.id);
            }

            RoomPayload::CodeChange { code } => {
                self.code = code.clone();
                self.broadcast(
                    RelayPayload::CodeUpdate {
                        code,
                        user_id: sender.id,
                    },
                    Some(conn),
                );
            }

            RoomPayload::LanguageChange { language } => {
                if language.trim().is_empty() {
                    return;
                }
                info!(
                    "Language in room {} changed to {} by {}",
                    self.id, language, sender.username
                );
                self.language = language.clone();
                let message = format!("{} changed language to {}", sender.username, language);
                self.broadcast(
                    RelayPayload::LanguageUpdate {
                        language,
                        username: sender.username,
                        message,
                        timestamp: now_millis(),
                    },
                    None,
                );
            }

            RoomPayload::ChatMessage { message } => {
                if message.is_empty() {
                    return;
                }
                self.broadcast(
                    RelayPayload::ChatMessage {
                        user_id: sender.id,
                        username: sender.username,
                        message,
                        timestamp: now_millis(),
                    },
                    None,
                );
            }

            RoomPayload::VideoOffer {
                target_user_id,
                offer,
            } => self.forward_offer(conn, sender, &target_user_id, offer),

            RoomPayload::VideoAnswer {
                target_user_id,
                answer,
            } => self.forward_answer(conn, sender, &target_user_id, answer),

            RoomPayload::IceCandidate {
                target_user_id,
                candidate,
            } => self.forward_candidate(sender, target_user_id.as_ref(), candidate),
        }
    }

    fn forward_offer(
        &self,
        conn: ConnectionId,
        sender: Participant,
        target: &UserId,
        offer: SessionDescription,
    ) {
        let payload = RelayPayload::VideoOffer {
            user_id: sender.id,
            username: sender.username.clone(),
            offer,
        };
        if self.send_to_user(target, payload) == 0 {
            self.reply_target_missing(conn, target);
            return;
        }
        info!("Video offer sent from {} to user {}", sender.username, target);
    }

    fn forward_answer(
        &self,
        conn: ConnectionId,
        sender: Participant,
        target: &UserId,
        answer: SessionDescription,
    ) {
        let payload = RelayPayload::VideoAnswer {
            user_id: sender.id,
            username: sender.username.clone(),
            answer,
        };
        if self.send_to_user(target, payload) == 0 {
            self.reply_target_missing(conn, target);
            return;
        }
        info!("Video answer sent from {} to user {}", sender.username, target);
    }

    /// Without a target the candidate goes to every other user in the room.
    fn forward_candidate(
        &self,
        sender: Participant,
        target: Option<&UserId>,
        candidate: IceCandidate,
    ) {
        let payload = RelayPayload::IceCandidate {
            user_id: sender.id.clone(),
            candidate,
        };
        let delivered = match target {
            Some(target) => self.send_to_user(target, payload),
            None => self.send_where(|m| m.user.id != sender.id, payload, None),
        };
        if delivered == 0 {
            debug!("ICE candidate from {} had no recipient", sender.id);
        }
    }

    fn reply_target_missing(&self, conn: ConnectionId, target: &UserId) {
        warn!("Target user {} not connected to room {}", target, self.id);
        self.send_to(
            conn,
            RelayPayload::Error {
                message: "Target user not connected".to_owned(),
            },
        );
    }

    /// Distinct users, in join order of their first connection.
    fn participants(&self) -> Vec<Participant> {
        let mut conns: Vec<_> = self.members.iter().collect();
        conns.sort_by_key(|(conn, _)| **conn);

        let mut users: Vec<Participant> = Vec::new();
        for (_, member) in conns {
            if !users.iter().any(|u| u.id == member.user.id) {
                users.push(member.user.clone());
            }
        }
        users
    }

    fn broadcast(&self, payload: RelayPayload, except: Option<ConnectionId>) -> usize {
        self.send_where(|_| true, payload, except)
    }

    fn send_to_user(&self, user: &UserId, payload: RelayPayload) -> usize {
        self.send_where(|m| m.user.id == *user, payload, None)
    }

    fn send_to(&self, conn: ConnectionId, payload: RelayPayload) {
        if let Some(member) = self.members.get(&conn) {
            self.deliver(conn, member, payload);
        }
    }

    fn send_where<F>(&self, filter: F, payload: RelayPayload, except: Option<ConnectionId>) -> usize
    where
        F: Fn(&Member) -> bool,
    {
        let mut delivered = 0;
        for (conn, member) in &self.members {
            if Some(*conn) == except || !filter(member) {
                continue;
            }
            if self.deliver(*conn, member, payload.clone()) {
                delivered += 1;
            }
        }
        delivered
    }

    fn deliver(&self, conn: ConnectionId, member: &Member, payload: RelayPayload) -> bool {
        let event = RelayEvent::in_room(self.id.clone(), payload);
        if member.outbox.send(event).is_err() {
            warn!("Connection {} of {} is gone", conn, member.user.username);
            return false;
        }
        true
    }
}
