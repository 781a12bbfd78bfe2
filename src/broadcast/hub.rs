use std::collections::HashMap;
use std::ops::{Deref, DerefMut};
use std::sync::{Arc, RwLock};
use tokio::sync::broadcast;
use tracing::debug;

use super::events::RoomEvent;

/// Buffered events per room channel. Subscribers that fall this far
/// behind skip ahead (RecvError::Lagged) instead of blocking publishers.
const CHANNEL_CAPACITY: usize = 64;

#[derive(Debug)]
struct RoomChannel {
    sender: broadcast::Sender<RoomEvent>,
    // Distinguishes this channel from any successor created under the
    // same invite code after a close
    generation: u64,
}

#[derive(Debug, Default)]
struct HubState {
    channels: HashMap<String, RoomChannel>,
    next_generation: u64,
}

/// Per-room fan-out of live updates, keyed by invite code.
///
/// Publishes take only the read lock on the channel map, so publishers for
/// unrelated rooms never serialize against each other; the write lock is
/// held only to insert or remove a room entry, and never across an await.
/// Within one room the broadcast channel preserves publish order per
/// subscriber. Dropping a room's last [`RoomSubscription`] removes the
/// entry, so idle channels never accumulate.
#[derive(Debug, Clone)]
pub struct BroadcastHub {
    state: Arc<RwLock<HubState>>,
}

impl Default for BroadcastHub {
    fn default() -> Self {
        Self::new()
    }
}

impl BroadcastHub {
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(HubState::default())),
        }
    }

    /// Registers a new subscriber channel for a room.
    ///
    /// The subscription has no fixed lifetime; it ends when it is dropped,
    /// the room is closed, or the hub shuts down.
    pub async fn subscribe(&self, invite_code: &str) -> RoomSubscription {
        let mut guard = self.state.write().unwrap();
        let HubState {
            channels,
            next_generation,
        } = &mut *guard;
        let channel = channels.entry(invite_code.to_string()).or_insert_with(|| {
            let generation = *next_generation;
            *next_generation += 1;
            RoomChannel {
                sender: broadcast::channel(CHANNEL_CAPACITY).0,
                generation,
            }
        });
        RoomSubscription {
            receiver: channel.sender.subscribe(),
            generation: channel.generation,
            state: Arc::clone(&self.state),
            invite_code: invite_code.to_string(),
        }
    }

    /// Best-effort delivery to every current subscriber of a room.
    ///
    /// Never fails: a room with no subscribers is pruned and the event is
    /// dropped. Callers must not treat publishing as transactional.
    pub async fn publish(&self, invite_code: &str, event: RoomEvent) {
        let state = self.state.read().unwrap();
        let Some(channel) = state.channels.get(invite_code) else {
            debug!(invite_code = %invite_code, "No subscribers registered, event dropped");
            return;
        };

        match channel.sender.send(event) {
            Ok(receiver_count) => {
                debug!(
                    invite_code = %invite_code,
                    receivers = receiver_count,
                    "Room event published"
                );
            }
            Err(_) => {
                // Every receiver is gone; drop the dead entry so closed
                // channels never accumulate.
                drop(state);
                let mut state = self.state.write().unwrap();
                if state
                    .channels
                    .get(invite_code)
                    .is_some_and(|c| c.sender.receiver_count() == 0)
                {
                    state.channels.remove(invite_code);
                    debug!(invite_code = %invite_code, "Pruned room channel with no subscribers");
                }
            }
        }
    }

    /// Publishes the terminal `room_closed` event, then completes and
    /// removes every subscriber channel of the room.
    pub async fn close_room(&self, invite_code: &str) {
        self.publish(invite_code, RoomEvent::RoomClosed).await;
        let mut state = self.state.write().unwrap();
        // Dropping the sender closes all receivers
        if state.channels.remove(invite_code).is_some() {
            debug!(invite_code = %invite_code, "Room channel closed");
        }
    }

    /// Number of live subscriber channels for a room
    pub async fn subscriber_count(&self, invite_code: &str) -> usize {
        let state = self.state.read().unwrap();
        state
            .channels
            .get(invite_code)
            .map_or(0, |c| c.sender.receiver_count())
    }

    /// Closes every room channel. Part of process shutdown, so no
    /// subscription outlives the hub's owner.
    pub async fn shutdown(&self) {
        let codes: Vec<String> = {
            let state = self.state.read().unwrap();
            state.channels.keys().cloned().collect()
        };
        for code in codes {
            self.close_room(&code).await;
        }
    }
}

/// A live subscription to one room's event channel.
///
/// Dereferences to the underlying broadcast receiver. On drop, the last
/// subscription of a room removes the room's channel from the hub; the
/// generation check keeps a stale handle from removing a successor
/// channel opened under the same invite code.
pub struct RoomSubscription {
    receiver: broadcast::Receiver<RoomEvent>,
    generation: u64,
    state: Arc<RwLock<HubState>>,
    invite_code: String,
}

impl Deref for RoomSubscription {
    type Target = broadcast::Receiver<RoomEvent>;

    fn deref(&self) -> &Self::Target {
        &self.receiver
    }
}

impl DerefMut for RoomSubscription {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.receiver
    }
}

impl Drop for RoomSubscription {
    fn drop(&mut self) {
        let mut state = self.state.write().unwrap();
        // Our receiver still counts until after this drop completes, so a
        // count of one means no other subscription remains.
        let last_of_channel = state.channels.get(&self.invite_code).is_some_and(|c| {
            c.generation == self.generation && c.sender.receiver_count() == 1
        });
        if last_of_channel {
            state.channels.remove(&self.invite_code);
            debug!(invite_code = %self.invite_code, "Removed idle room channel");
        }
    }
}
