use serde::Serialize;
use utoipa::ToSchema;

use crate::state::{
    room::{Nomination, Participant, Room, Winner},
    state_machine::RoomPhase,
};

#[derive(Clone, Debug, PartialEq, Eq)]
/// Dispatched payload carried across SSE channels.
pub struct ServerEvent {
    /// SSE `event:` name, if any.
    pub event: Option<String>,
    /// Serialized JSON payload.
    pub data: String,
}

impl ServerEvent {
    /// Convenience wrapper that serialises `payload` into the SSE data field.
    pub fn json<E, T>(event: E, payload: &T) -> serde_json::Result<Self>
    where
        E: Into<Option<String>>,
        T: Serialize,
    {
        Ok(Self {
            event: event.into(),
            data: serde_json::to_string(payload)?,
        })
    }
}

/// Structured change pushed to every subscriber of a room.
///
/// The `type` field doubles as the SSE `event:` name.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(tag = "type")]
pub enum RoomUpdate {
    /// Full room state, sent only to a subscriber that just connected.
    #[serde(rename = "room.snapshot")]
    Snapshot {
        /// Room as committed.
        room: Room,
    },
    /// A new participant entered the room.
    #[serde(rename = "participant.joined")]
    ParticipantJoined {
        /// The newcomer.
        participant: Participant,
    },
    /// A participant rejoined or changed a flag.
    #[serde(rename = "participant.updated")]
    ParticipantUpdated {
        /// Participant after the change.
        participant: Participant,
    },
    /// A participant left the room.
    #[serde(rename = "participant.left", rename_all = "camelCase")]
    ParticipantLeft {
        /// Id of the leaver.
        participant_id: String,
        /// Nickname of the leaver.
        nickname: String,
        /// Promoted participant when the host left.
        #[serde(skip_serializing_if = "Option::is_none")]
        new_host_id: Option<String>,
    },
    /// The room moved to another phase.
    #[serde(rename = "phase.changed")]
    PhaseChanged {
        /// Phase entered.
        phase: RoomPhase,
        /// Phase left.
        previous: RoomPhase,
    },
    /// A movie was nominated.
    #[serde(rename = "nomination.added", rename_all = "camelCase")]
    NominationAdded {
        /// The new nomination.
        nomination: Nomination,
        /// Nominations in the room after this one.
        total_nominations: usize,
    },
    /// A participant cast or replaced a vote.
    #[serde(rename = "vote.cast", rename_all = "camelCase")]
    VoteCast {
        /// Voter.
        participant_id: String,
        /// Movie voted for.
        movie_id: String,
        /// Ballots recorded so far.
        total_votes: usize,
    },
    /// Voting finished.
    #[serde(rename = "winner.revealed")]
    WinnerRevealed {
        /// Final decision.
        winner: Winner,
    },
    /// Every current participant has nominated.
    #[serde(rename = "room.all_nominated", rename_all = "camelCase")]
    AllNominated {
        /// Nominations in the room.
        total_nominations: usize,
    },
    /// Every current participant has voted.
    #[serde(rename = "room.all_voted", rename_all = "camelCase")]
    AllVoted {
        /// Ballots recorded.
        total_votes: usize,
    },
    /// The room was deleted; the stream ends right after this event.
    #[serde(rename = "room.closed")]
    Closed {
        /// Code of the deleted room.
        code: String,
    },
}

impl RoomUpdate {
    /// Wire name of the update, identical to its `type` field.
    pub fn event_name(&self) -> &'static str {
        match self {
            RoomUpdate::Snapshot { .. } => "room.snapshot",
            RoomUpdate::ParticipantJoined { .. } => "participant.joined",
            RoomUpdate::ParticipantUpdated { .. } => "participant.updated",
            RoomUpdate::ParticipantLeft { .. } => "participant.left",
            RoomUpdate::PhaseChanged { .. } => "phase.changed",
            RoomUpdate::NominationAdded { .. } => "nomination.added",
            RoomUpdate::VoteCast { .. } => "vote.cast",
            RoomUpdate::WinnerRevealed { .. } => "winner.revealed",
            RoomUpdate::AllNominated { .. } => "room.all_nominated",
            RoomUpdate::AllVoted { .. } => "room.all_voted",
            RoomUpdate::Closed { .. } => "room.closed",
        }
    }

    /// Serialise into an SSE payload named after the update.
    pub fn to_server_event(&self) -> serde_json::Result<ServerEvent> {
        ServerEvent::json(Some(self.event_name().to_string()), self)
    }
}
