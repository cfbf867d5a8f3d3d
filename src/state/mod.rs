/// Room rejection reasons.
pub mod errors;
/// Per-room subscriber fan-out.
pub mod hub;
/// Nominations, votes and winner selection.
pub mod ledger;
/// Commit plan returned by room mutations.
pub mod mutation;
/// Joining, readiness and leaving.
pub mod registry;
/// Room record and its parts.
pub mod room;
/// Room lifecycle phases.
pub mod state_machine;

use std::{future::Future, sync::Arc, time::Duration};

use dashmap::DashMap;
use tokio::{sync::Mutex, time::timeout};
use tracing::{debug, warn};

use crate::{
    config::AppConfig,
    dao::{
        room::RoomRepository,
        session_store::SessionStore,
        storage::{StorageError, StorageResult},
    },
    dto::sse::RoomUpdate,
    error::ServiceError,
    services::sse_events,
};

pub use self::hub::{RoomHub, Subscription};
pub use self::mutation::{Commit, Mutation};
use self::{
    errors::RoomError,
    room::{Room, RoomCode, now_millis},
};

/// Application state shared by every handler and background task.
pub type SharedState = Arc<AppState>;

/// Central application state: room persistence, realtime fan-out and per-room gates.
pub struct AppState {
    config: AppConfig,
    rooms: RoomRepository,
    hub: RoomHub,
    gates: DashMap<String, Arc<Mutex<()>>>,
    store_timeout: Duration,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    pub fn new(config: AppConfig, store: Arc<dyn SessionStore>) -> SharedState {
        Arc::new(Self {
            rooms: RoomRepository::new(store, config.room_ttl()),
            hub: RoomHub::new(config.subscriber_buffer),
            gates: DashMap::new(),
            store_timeout: config.store_timeout(),
            config,
        })
    }

    /// Runtime configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Subscriber registry of every room.
    pub fn hub(&self) -> &RoomHub {
        &self.hub
    }

    /// Room persistence.
    pub fn rooms(&self) -> &RoomRepository {
        &self.rooms
    }

    /// Gate serialising read-modify-write cycles of one room.
    fn gate(&self, code: &RoomCode) -> Arc<Mutex<()>> {
        self.gates
            .entry(code.as_str().to_string())
            .or_default()
            .clone()
    }

    /// Await a store call under the configured deadline.
    pub async fn with_store_timeout<T, F>(&self, call: F) -> Result<T, ServiceError>
    where
        F: Future<Output = StorageResult<T>>,
    {
        match timeout(self.store_timeout, call).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(err)) => {
                warn!(error = %err, "session store call failed");
                Err(err.into())
            }
            Err(_) => {
                warn!(limit = ?self.store_timeout, "session store call timed out");
                Err(ServiceError::Timeout)
            }
        }
    }

    /// Read the current room record without taking its gate.
    pub async fn load_room(&self, code: &RoomCode) -> Result<Room, ServiceError> {
        self.with_store_timeout(self.rooms.find(code))
            .await?
            .ok_or_else(|| RoomError::RoomNotFound(code.to_string()).into())
    }

    /// Store a brand-new room. Returns `false` when its code is already in use.
    pub async fn insert_room(&self, room: &Room) -> Result<bool, ServiceError> {
        let gate = self.gate(&room.code);
        let _guard = gate.lock().await;

        if self.with_store_timeout(self.rooms.exists(&room.code)).await? {
            return Ok(false);
        }
        self.with_store_timeout(self.rooms.save(room)).await?;
        Ok(true)
    }

    /// Apply `apply` to the current room record atomically with respect to other
    /// actions on the same room, then commit and publish its updates.
    ///
    /// A rejected mutation leaves the stored record untouched. Updates are
    /// published while the gate is still held, so subscribers see them in
    /// commit order. Returns the caller's value and the committed room.
    pub async fn mutate_room<T, F>(&self, code: &RoomCode, apply: F) -> Result<(T, Room), ServiceError>
    where
        F: FnOnce(&mut Room, i64) -> Result<Mutation<T>, RoomError>,
    {
        let gate = self.gate(code);
        let _guard = gate.lock().await;

        let mut room = self.load_room(code).await?;
        let now = now_millis();
        let Mutation {
            value,
            updates,
            commit,
        } = apply(&mut room, now).inspect_err(|err| {
            debug!(room = %code, error = %err, "room action rejected");
        })?;

        match commit {
            Commit::Save => {
                room.touch(now);
                self.with_store_timeout(self.rooms.save(&room)).await?;
            }
            Commit::Delete => {
                self.with_store_timeout(self.rooms.delete(code)).await?;
            }
            Commit::Unchanged => {}
        }

        sse_events::publish_updates(&self.hub, code, &updates);
        if commit == Commit::Delete {
            self.hub.close(code.as_str());
        }

        Ok((value, room))
    }

    /// Register a subscriber whose first event is a snapshot of the room.
    ///
    /// Runs under the room gate so no commit can slip between the snapshot
    /// and the registration.
    pub async fn subscribe_room(
        &self,
        code: &RoomCode,
        participant_id: Option<String>,
    ) -> Result<Subscription, ServiceError> {
        let gate = self.gate(code);
        let _guard = gate.lock().await;

        let room = self.load_room(code).await?;
        if let Some(id) = participant_id.as_deref() {
            if room.participant(id).is_none() {
                debug!(room = %code, participant = %id, "subscriber is not a participant of the room");
            }
        }
        let snapshot = RoomUpdate::Snapshot { room }
            .to_server_event()
            .map_err(|err| StorageError::corrupted(code.storage_key(), err))?;

        Ok(self.hub.subscribe(code.as_str(), participant_id, snapshot))
    }

    /// Close the streams of a room whose record is gone, telling subscribers first.
    pub async fn close_if_missing(&self, code: &RoomCode) -> Result<bool, ServiceError> {
        let gate = self.gate(code);
        let _guard = gate.lock().await;

        if self.with_store_timeout(self.rooms.exists(code)).await? {
            return Ok(false);
        }
        sse_events::publish_updates(
            &self.hub,
            code,
            &[RoomUpdate::Closed {
                code: code.to_string(),
            }],
        );
        self.hub.close(code.as_str());
        Ok(true)
    }

    /// Forget gates nobody currently holds. Returns how many were dropped.
    pub fn prune_gates(&self) -> usize {
        let before = self.gates.len();
        self.gates.retain(|_, gate| Arc::strong_count(gate) > 1);
        before.saturating_sub(self.gates.len())
    }

    /// Number of gates currently tracked.
    pub fn gate_count(&self) -> usize {
        self.gates.len()
    }
}
