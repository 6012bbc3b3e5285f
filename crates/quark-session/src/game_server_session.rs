//! `GameServerSession`: drives the Room engine on behalf of one client
//! stream.

use std::sync::Arc;

use quark_protocol::{
    ActorId, ActorMessage, Codec, Command, Event, Message, OriginalCommand, RoomId,
    ERROR_ROOM_DOES_NOT_EXIST,
};
use quark_room::{RoomEntry, RoomSet};
use quark_transport::Connection;

use crate::GameServerSessionError;

/// One per client stream. There is no handshake step here — the
/// actor id is minted on construction and the command loop starts
/// immediately, since authN/Z beyond identity echo is out of scope.
pub struct GameServerSession {
    actor_id: ActorId,
    current: Option<RoomEntry>,
    room_set: Arc<RoomSet>,
}

impl GameServerSession {
    pub fn new(room_set: Arc<RoomSet>) -> Self {
        Self {
            actor_id: ActorId::generate(),
            current: None,
            room_set,
        }
    }

    pub fn actor_id(&self) -> &ActorId {
        &self.actor_id
    }

    /// Runs the session to completion: decodes `Command`s off `conn`,
    /// encodes `Event`s back onto it, until the connection closes or a
    /// transport/codec error occurs.
    ///
    /// Two independent producers feed the outbound stream — the command
    /// handler (acks/errors) and the current room's inbox forwarder — and
    /// `tokio::select!` multiplexes them, preserving order within each but
    /// not between them.
    pub async fn run<C, D>(self, conn: C, codec: D) -> Result<(), GameServerSessionError>
    where
        C: Connection,
        D: Codec,
    {
        self.run_with_first(None, conn, codec).await
    }

    /// Same as [`Self::run`], but dispatches `first` (already decoded by the
    /// caller) before entering the read loop. The game-server accept path
    /// peeks the connection's very first frame to tell a one-shot
    /// `CreateRoom` exchange from a persistent session; when it turns out
    /// to be a `Command`, this lets that already-consumed frame feed into
    /// the session instead of being lost.
    pub async fn run_with_first<C, D>(
        mut self,
        first: Option<Command>,
        conn: C,
        codec: D,
    ) -> Result<(), GameServerSessionError>
    where
        C: Connection,
        D: Codec,
    {
        tracing::info!(actor_id = %self.actor_id, "game server session started");

        if let Some(cmd) = first {
            if let Some(event) = self.handle_command(cmd).await {
                let bytes = codec.encode(&event)?;
                conn.send(&bytes)
                    .await
                    .map_err(|e| GameServerSessionError::Transport(e.to_string()))?;
            }
        }

        loop {
            tokio::select! {
                incoming = conn.recv() => {
                    let Some(data) = incoming.map_err(|e| {
                        GameServerSessionError::Transport(e.to_string())
                    })? else {
                        tracing::info!(actor_id = %self.actor_id, "connection closed cleanly");
                        break;
                    };
                    let command: Command = codec.decode(&data)?;
                    if let Some(event) = self.handle_command(command).await {
                        let bytes = codec.encode(&event)?;
                        conn.send(&bytes).await.map_err(|e| {
                            GameServerSessionError::Transport(e.to_string())
                        })?;
                    }
                }

                inbox_msg = recv_from_current(&mut self.current) => {
                    match inbox_msg {
                        Some(msg) => {
                            if let Some(event) = forward(msg, &self.actor_id) {
                                let bytes = codec.encode(&event)?;
                                conn.send(&bytes).await.map_err(|e| {
                                    GameServerSessionError::Transport(e.to_string())
                                })?;
                            }
                        }
                        // The room closed this entry out from under us
                        // (room stopped). Clear it so a later JoinRoom
                        // correctly reports "no current room" rather than
                        // waiting on a dead inbox.
                        None => self.current = None,
                    }
                }
            }
        }

        self.leave().await;
        tracing::info!(actor_id = %self.actor_id, "game server session ended");
        Ok(())
    }

    /// Dispatches one inbound command, returning the event to send back —
    /// `None` for a `SendMessage` that was broadcast successfully, since
    /// the protocol has no direct ack for it (the sender only hears back
    /// through its own inbox if it's also a subscriber).
    async fn handle_command(&mut self, cmd: Command) -> Option<Event> {
        match cmd {
            Command::JoinRoom { room_id } => Some(self.handle_join(room_id).await),
            Command::LeaveRoom => Some(self.handle_leave().await),
            Command::SendMessage { code, payload } => self.handle_send(code, payload).await,
        }
    }

    async fn handle_join(&mut self, room_id: RoomId) -> Event {
        // Joining while already in a room first leaves the previous one.
        self.leave().await;

        let Some(handle) = self.room_set.get(room_id) else {
            return room_does_not_exist(OriginalCommand::JoinRoom { room_id });
        };

        match handle.join(self.actor_id.clone()).await {
            Ok(entry) => {
                self.current = Some(entry);
                Event::JoinRoomSucceed {
                    actor_id: self.actor_id.clone(),
                }
            }
            Err(_) => room_does_not_exist(OriginalCommand::JoinRoom { room_id }),
        }
    }

    async fn handle_leave(&mut self) -> Event {
        self.leave().await;
        Event::LeaveRoomSucceed
    }

    /// Returns `None` on a successful broadcast — the protocol has no
    /// direct ack for `SendMessage`; the sender only hears back through
    /// its own inbox if it's also a room subscriber.
    async fn handle_send(&mut self, code: u32, payload: Vec<u8>) -> Option<Event> {
        let room_id = match self.current.as_ref() {
            Some(entry) => entry.room_id(),
            None => return Some(room_does_not_exist(OriginalCommand::SendMessage { code })),
        };
        let Some(handle) = self.room_set.get(room_id) else {
            return Some(room_does_not_exist(OriginalCommand::SendMessage { code }));
        };

        let msg = ActorMessage {
            sender: self.actor_id.clone(),
            code,
            body: payload,
        };
        match handle.broadcast(msg).await {
            Ok(()) => None,
            Err(_) => Some(room_does_not_exist(OriginalCommand::SendMessage { code })),
        }
    }

    async fn leave(&mut self) {
        if let Some(mut entry) = self.current.take() {
            entry.leave().await;
        }
    }
}

/// Awaits the current room entry's next inbox item, or never resolves if
/// there is no current room. Lets `select!` treat "not in a room" as a
/// branch that simply can't win.
async fn recv_from_current(current: &mut Option<RoomEntry>) -> Option<Message> {
    match current {
        Some(entry) => entry.recv().await,
        None => std::future::pending().await,
    }
}

/// Translates a Room-level inbox item into a wire event, applying echo
/// suppression.
///
/// The wire protocol has no frame for membership transitions — only
/// `JoinRoomSucceed`/`LeaveRoomSucceed` acks to the actor that caused them —
/// so `Message::Membership` is consumed here but never forwarded; only
/// actor messages turn into `MessageReceived`.
fn forward(msg: Message, actor_id: &ActorId) -> Option<Event> {
    match msg {
        Message::Membership(_) => None,
        Message::Actor(am) => {
            if &am.sender == actor_id {
                return None;
            }
            Some(Event::MessageReceived {
                sender_id: am.sender,
                code: am.code,
                payload: am.body,
            })
        }
    }
}

fn room_does_not_exist(original_command: OriginalCommand) -> Event {
    Event::CommandOperationError {
        error_code: ERROR_ROOM_DOES_NOT_EXIST.into(),
        error_detail: "room does not exist".into(),
        original_command,
    }
}
