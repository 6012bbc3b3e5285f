//! Room actor: an isolated Tokio task that owns one room's membership and
//! broadcast state.
//!
//! Each room runs in its own task, communicating with the outside world
//! through an mpsc command channel. This is the "actor model" — no shared
//! mutable state, just message passing. It is what gives the room its
//! single total order of join/leave/broadcast transitions: everything
//! that mutates `members`/`entries` happens inside this one task.

use std::collections::HashMap;

use quark_protocol::{ActorId, ActorMessage, MembershipEvent, Message, RoomId};
use tokio::sync::{mpsc, oneshot};

use crate::RoomError;

/// The lifecycle state of a room: `Open` accepts joins and broadcasts,
/// `Stopped` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomState {
    Open,
    Stopped,
}

impl std::fmt::Display for RoomState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Open => write!(f, "Open"),
            Self::Stopped => write!(f, "Stopped"),
        }
    }
}

/// A point-in-time snapshot of a room's metadata.
#[derive(Debug, Clone)]
pub struct RoomInfo {
    pub room_id: RoomId,
    pub name: String,
    pub state: RoomState,
    pub member_count: usize,
    /// Messages dropped so far because a subscriber's inbox was full.
    pub dropped: u64,
}

/// Commands sent to a room actor through its channel.
enum RoomCommand {
    Join {
        actor_id: ActorId,
        reply: oneshot::Sender<Result<mpsc::Receiver<Message>, RoomError>>,
    },
    LeaveActor {
        actor_id: ActorId,
        reply: oneshot::Sender<bool>,
    },
    Broadcast {
        msg: ActorMessage,
        reply: oneshot::Sender<Result<(), RoomError>>,
    },
    GetInfo {
        reply: oneshot::Sender<RoomInfo>,
    },
    Stop,
}

/// A subscriber's handle into a room: its inbox and a way to leave.
///
/// Owned by the subscriber; its lifetime ends when `leave()` is invoked or
/// the owning room stops. If dropped without an explicit `leave()`, the
/// entry is cleaned up on a best-effort basis so no membership is leaked
/// by an ungraceful disconnect.
pub struct RoomEntry {
    actor_id: ActorId,
    room_id: RoomId,
    rx: mpsc::Receiver<Message>,
    handle: RoomHandle,
    left: bool,
}

impl RoomEntry {
    pub fn actor_id(&self) -> &ActorId {
        &self.actor_id
    }

    pub fn room_id(&self) -> RoomId {
        self.room_id
    }

    /// Receives the next message for this subscriber. Returns `None` once
    /// the room has closed this entry's inbox (left or room stopped).
    pub async fn recv(&mut self) -> Option<Message> {
        self.rx.recv().await
    }

    /// Removes this entry from the room. Idempotent: a second call is a
    /// no-op and returns `false`.
    pub async fn leave(&mut self) -> bool {
        if self.left {
            return false;
        }
        self.left = true;
        self.handle.leave_actor(self.actor_id.clone()).await
    }
}

impl Drop for RoomEntry {
    fn drop(&mut self) {
        if self.left {
            return;
        }
        self.left = true;
        let handle = self.handle.clone();
        let actor_id = self.actor_id.clone();
        tokio::spawn(async move {
            let _ = handle.leave_actor(actor_id).await;
        });
    }
}

/// Handle to a running room actor. Cheap to clone — it's just an
/// `mpsc::Sender` wrapper. `RoomSet` holds one of these per room.
#[derive(Clone)]
pub struct RoomHandle {
    room_id: RoomId,
    sender: mpsc::Sender<RoomCommand>,
}

impl RoomHandle {
    pub fn room_id(&self) -> RoomId {
        self.room_id
    }

    /// Adds `actor_id` to the room, returning its new [`RoomEntry`].
    pub async fn join(&self, actor_id: ActorId) -> Result<RoomEntry, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::Join {
                actor_id: actor_id.clone(),
                reply: reply_tx,
            })
            .await
            .map_err(|_| RoomError::Stopped(self.room_id))?;
        let rx = reply_rx
            .await
            .map_err(|_| RoomError::Stopped(self.room_id))??;
        Ok(RoomEntry {
            actor_id,
            room_id: self.room_id,
            rx,
            handle: self.clone(),
            left: false,
        })
    }

    /// Removes an actor's entry directly, without holding a `RoomEntry`.
    /// Used by `RoomEntry::leave`/`Drop` and by callers that only track
    /// the actor id.
    pub async fn leave_actor(&self, actor_id: ActorId) -> bool {
        let (reply_tx, reply_rx) = oneshot::channel();
        if self
            .sender
            .send(RoomCommand::LeaveActor {
                actor_id,
                reply: reply_tx,
            })
            .await
            .is_err()
        {
            return false;
        }
        reply_rx.await.unwrap_or(false)
    }

    /// Broadcasts a message to every current subscriber, including the
    /// sender. Echo suppression is the session layer's responsibility.
    pub async fn broadcast(&self, msg: ActorMessage) -> Result<(), RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::Broadcast {
                msg,
                reply: reply_tx,
            })
            .await
            .map_err(|_| RoomError::Stopped(self.room_id))?;
        reply_rx
            .await
            .map_err(|_| RoomError::Stopped(self.room_id))?
    }

    /// Stops the room: terminal, closes every subscriber's inbox.
    pub async fn stop(&self) {
        let _ = self.sender.send(RoomCommand::Stop).await;
    }

    pub async fn info(&self) -> Result<RoomInfo, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::GetInfo { reply: reply_tx })
            .await
            .map_err(|_| RoomError::Stopped(self.room_id))?;
        reply_rx
            .await
            .map_err(|_| RoomError::Stopped(self.room_id))
    }
}

/// The internal room actor state. Runs inside a Tokio task; nothing
/// outside this task ever touches `members`/`entries` directly.
struct RoomActor {
    room_id: RoomId,
    name: String,
    state: RoomState,
    inbox_capacity: usize,
    /// Current members in join order.
    members: Vec<ActorId>,
    entries: HashMap<ActorId, mpsc::Sender<Message>>,
    dropped: u64,
    receiver: mpsc::Receiver<RoomCommand>,
}

impl RoomActor {
    async fn run(mut self) {
        tracing::info!(room_id = %self.room_id, name = %self.name, "room actor started");

        while let Some(cmd) = self.receiver.recv().await {
            match cmd {
                RoomCommand::Join { actor_id, reply } => {
                    let result = self.handle_join(actor_id);
                    let _ = reply.send(result);
                }
                RoomCommand::LeaveActor { actor_id, reply } => {
                    let result = self.handle_leave(actor_id);
                    let _ = reply.send(result);
                }
                RoomCommand::Broadcast { msg, reply } => {
                    let result = self.handle_broadcast(msg);
                    let _ = reply.send(result);
                }
                RoomCommand::GetInfo { reply } => {
                    let _ = reply.send(self.info());
                }
                RoomCommand::Stop => {
                    self.handle_stop();
                    break;
                }
            }
        }

        tracing::info!(room_id = %self.room_id, "room actor stopped");
    }

    fn handle_join(
        &mut self,
        actor_id: ActorId,
    ) -> Result<mpsc::Receiver<Message>, RoomError> {
        if self.state == RoomState::Stopped {
            return Err(RoomError::Stopped(self.room_id));
        }
        if self.entries.contains_key(&actor_id) {
            return Err(RoomError::AlreadyJoined(actor_id, self.room_id));
        }

        let (tx, rx) = mpsc::channel(self.inbox_capacity);
        self.members.push(actor_id.clone());
        self.entries.insert(actor_id.clone(), tx);

        tracing::info!(
            room_id = %self.room_id,
            %actor_id,
            members = self.members.len(),
            "actor joined"
        );

        let actor_list = self.members.clone();
        self.fan_out(Message::Membership(MembershipEvent::Join { actor_list }));

        Ok(rx)
    }

    fn handle_leave(&mut self, actor_id: ActorId) -> bool {
        // Remove the entry (and close its inbox by dropping the sender)
        // before fanning out Leave, so the departing actor never
        // receives its own Leave event.
        let Some(_sender) = self.entries.remove(&actor_id) else {
            return false;
        };
        self.members.retain(|a| a != &actor_id);

        tracing::info!(
            room_id = %self.room_id,
            %actor_id,
            members = self.members.len(),
            "actor left"
        );

        let actor_list = self.members.clone();
        self.fan_out(Message::Membership(MembershipEvent::Leave { actor_list }));
        true
    }

    fn handle_broadcast(&mut self, msg: ActorMessage) -> Result<(), RoomError> {
        if self.state == RoomState::Stopped {
            return Err(RoomError::Stopped(self.room_id));
        }
        self.fan_out(Message::Actor(msg));
        Ok(())
    }

    fn handle_stop(&mut self) {
        self.state = RoomState::Stopped;
        // Dropping every sender closes each subscriber's receiving end.
        self.entries.clear();
        self.members.clear();
        tracing::info!(room_id = %self.room_id, "room stopped");
    }

    /// Enqueues `msg` onto every current entry's inbox. A full inbox
    /// drops the message for that subscriber only — it never blocks the
    /// room's serializer.
    fn fan_out(&mut self, msg: Message) {
        for (actor_id, tx) in &self.entries {
            if tx.try_send(msg.clone()).is_err() {
                self.dropped += 1;
                tracing::warn!(
                    room_id = %self.room_id,
                    %actor_id,
                    dropped = self.dropped,
                    "subscriber inbox full, dropping message"
                );
            }
        }
    }

    fn info(&self) -> RoomInfo {
        RoomInfo {
            room_id: self.room_id,
            name: self.name.clone(),
            state: self.state,
            member_count: self.members.len(),
            dropped: self.dropped,
        }
    }
}

/// Spawns a new room actor task and returns a handle to communicate with
/// it. `channel_size` bounds the command queue (backpressure on callers,
/// not a subscriber inbox).
pub(crate) fn spawn_room(
    room_id: RoomId,
    name: String,
    inbox_capacity: usize,
    channel_size: usize,
) -> RoomHandle {
    let (tx, rx) = mpsc::channel(channel_size);

    let actor = RoomActor {
        room_id,
        name,
        state: RoomState::Open,
        inbox_capacity,
        members: Vec::new(),
        entries: HashMap::new(),
        dropped: 0,
        receiver: rx,
    };

    tokio::spawn(actor.run());

    RoomHandle {
        room_id,
        sender: tx,
    }
}
