use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, warn};

use crate::dto::sse::ServerEvent;

struct Subscriber {
    id: u64,
    participant_id: Option<String>,
    sender: mpsc::Sender<ServerEvent>,
}

/// Receiving end of one room subscription.
#[derive(Debug)]
pub struct Subscription {
    /// Identifier used to unsubscribe.
    pub id: u64,
    /// Events for this subscriber, in commit order.
    pub receiver: mpsc::Receiver<ServerEvent>,
}

/// Per-room fan-out of server events to bounded subscriber channels.
///
/// Delivery never waits: a subscriber whose channel is full or closed is
/// dropped, which ends its stream and prompts the client to resync.
pub struct RoomHub {
    rooms: DashMap<String, Vec<Subscriber>>,
    capacity: usize,
    next_id: AtomicU64,
}

impl RoomHub {
    /// Create a hub whose subscriber channels hold `capacity` pending events.
    pub fn new(capacity: usize) -> Self {
        Self {
            rooms: DashMap::new(),
            capacity: capacity.max(1),
            next_id: AtomicU64::new(1),
        }
    }

    /// Register a subscriber and queue `initial` as its first event.
    pub fn subscribe(
        &self,
        code: &str,
        participant_id: Option<String>,
        initial: ServerEvent,
    ) -> Subscription {
        let (sender, receiver) = mpsc::channel(self.capacity);
        // fresh channel, capacity >= 1
        let _ = sender.try_send(initial);

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.rooms
            .entry(code.to_string())
            .or_default()
            .push(Subscriber {
                id,
                participant_id,
                sender,
            });

        Subscription { id, receiver }
    }

    /// Remove one subscriber; drops the room entry once empty.
    pub fn unsubscribe(&self, code: &str, id: u64) {
        if let Some(mut subscribers) = self.rooms.get_mut(code) {
            subscribers.retain(|s| s.id != id);
        }
        self.rooms.remove_if(code, |_, subscribers| subscribers.is_empty());
    }

    /// Enqueue `event` for every subscriber of `code`. Returns how many received it.
    pub fn publish(&self, code: &str, event: &ServerEvent) -> usize {
        let Some(mut subscribers) = self.rooms.get_mut(code) else {
            return 0;
        };

        subscribers.retain(|subscriber| match subscriber.sender.try_send(event.clone()) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                warn!(
                    room = %code,
                    subscriber = subscriber.id,
                    participant = ?subscriber.participant_id,
                    "subscriber lagging, dropping it"
                );
                false
            }
            Err(TrySendError::Closed(_)) => {
                debug!(room = %code, subscriber = subscriber.id, "subscriber gone");
                false
            }
        });
        let delivered = subscribers.len();
        drop(subscribers);

        self.rooms.remove_if(code, |_, subscribers| subscribers.is_empty());
        delivered
    }

    /// Drop every subscriber of `code`, ending their streams.
    pub fn close(&self, code: &str) -> usize {
        self.rooms
            .remove(code)
            .map(|(_, subscribers)| subscribers.len())
            .unwrap_or(0)
    }

    /// Number of live subscribers of `code`.
    pub fn subscriber_count(&self, code: &str) -> usize {
        self.rooms.get(code).map(|s| s.len()).unwrap_or(0)
    }

    /// Number of rooms with at least one subscriber.
    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    /// Codes of the rooms with at least one subscriber.
    pub fn room_codes(&self) -> Vec<String> {
        self.rooms.iter().map(|entry| entry.key().clone()).collect()
    }
}
