use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::{
    dto::{movie::MovieInput, validation::validate_participant_id},
    state::{
        errors::RoomError,
        room::{Nomination, Participant, ParticipantRef, Room, Winner},
        state_machine::RoomPhase,
    },
};

/// Raw nickname inputs longer than this are refused before sanitization.
const RAW_NICKNAME_MAX: u64 = 200;

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
/// Payload used to open a new room.
pub struct CreateRoomRequest {
    /// Nickname of the host.
    #[validate(length(min = 1, max = RAW_NICKNAME_MAX))]
    pub host_nickname: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
/// Identifiers of a freshly created room.
pub struct CreateRoomResponse {
    /// Code to share with guests.
    pub room_code: String,
    /// Participant id the host must send with host-only actions.
    pub host_id: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
/// Payload used to join, or rejoin, a room.
pub struct JoinRoomRequest {
    /// Known id of a returning participant, or an id chosen by the client.
    #[validate(custom(function = "validate_participant_id"))]
    pub participant_id: Option<String>,
    /// Desired nickname.
    #[validate(length(min = 1, max = RAW_NICKNAME_MAX))]
    pub nickname: String,
    /// Claim to be the host; only honoured for the recorded host.
    #[serde(default)]
    pub is_host: bool,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
/// Identity of the joined participant along with the room state.
pub struct JoinRoomResponse {
    /// Id to send with later actions.
    pub participant_id: String,
    /// Room after the join.
    pub room: Room,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
/// Payload of host-only phase transitions.
pub struct HostActionRequest {
    /// Participant id of the host.
    #[validate(length(min = 1, max = 64))]
    pub requester_id: String,
}

#[derive(Debug, Serialize, ToSchema)]
/// Phase reached after a transition.
pub struct PhaseResponse {
    /// Current phase.
    pub phase: RoomPhase,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
/// Designates the participant an action is performed for. The id wins over the nickname.
pub struct ParticipantSelector {
    /// Participant id.
    #[validate(length(min = 1, max = 64))]
    pub participant_id: Option<String>,
    /// Nickname, matched regardless of case.
    #[validate(length(min = 1, max = RAW_NICKNAME_MAX))]
    pub nickname: Option<String>,
}

impl ParticipantSelector {
    /// Resolve into a participant reference, failing when neither field is set.
    pub fn into_ref(self) -> Result<ParticipantRef, RoomError> {
        ParticipantRef::from_parts(self.participant_id, self.nickname)
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
/// Payload used to nominate a movie.
pub struct NominateRequest {
    /// Nominator.
    #[serde(flatten)]
    #[validate(nested)]
    pub participant: ParticipantSelector,
    /// Movie to propose.
    pub movie: MovieInput,
}

#[derive(Debug, Serialize, ToSchema)]
/// Every nomination of the room, in nomination order.
pub struct NominationsResponse {
    /// Nominations so far.
    pub nominations: Vec<Nomination>,
}

#[derive(Debug, Serialize, ToSchema)]
/// Participant state after an update.
pub struct ParticipantResponse {
    /// Updated participant.
    pub participant: Participant,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
/// Payload used to cast or replace a vote.
pub struct VoteRequest {
    /// Voter.
    #[serde(flatten)]
    #[validate(nested)]
    pub participant: ParticipantSelector,
    /// Id of a nominated movie, string or integer.
    #[schema(value_type = String)]
    pub movie_id: Value,
}

#[derive(Debug, Serialize, ToSchema)]
/// Current ballot: participant id to movie id.
pub struct VotesResponse {
    /// Votes keyed by participant id.
    pub votes: IndexMap<String, String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
/// Payload used by the host to close the ballot.
pub struct FinishVotingRequest {
    /// Participant id of the host.
    #[validate(length(min = 1, max = 64))]
    pub requester_id: String,
    /// Nominated movie id that wins regardless of the count.
    #[schema(value_type = Option<String>)]
    pub forced_winner: Option<Value>,
}

#[derive(Debug, Serialize, ToSchema)]
/// Final phase and decision of the room.
pub struct FinishVotingResponse {
    /// Always `complete`.
    pub phase: RoomPhase,
    /// Winning nomination and tally.
    pub winner: Winner,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
/// Payload used to leave a room.
pub struct LeaveRoomRequest {
    /// Participant leaving.
    #[validate(length(min = 1, max = 64))]
    pub participant_id: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
/// Outcome of a participant leaving.
pub struct LeaveRoomResponse {
    /// True when the room was deleted because nobody is left.
    pub room_closed: bool,
    /// Promoted participant when the host left.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_host_id: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
/// Query string of the room event stream.
pub struct SubscribeQuery {
    /// Participant the stream belongs to; used for logging only.
    pub participant_id: Option<String>,
}
