use std::fmt;

use indexmap::IndexMap;
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use time::OffsetDateTime;
use utoipa::ToSchema;

use crate::state::{
    errors::RoomError,
    state_machine::{PhaseEvent, RoomPhase},
};

/// Number of characters in a room code.
pub const ROOM_CODE_LENGTH: usize = 6;
const ROOM_CODE_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
const STORAGE_PREFIX: &str = "room:";

/// Current wall-clock time as unix milliseconds.
pub fn now_millis() -> i64 {
    (OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64
}

/// Short case-insensitive room identifier, always held in lowercase.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct RoomCode(String);

impl RoomCode {
    /// Normalise and validate a client-supplied code.
    pub fn parse(raw: &str) -> Result<Self, RoomError> {
        let trimmed = raw.trim();
        if trimmed.chars().count() != ROOM_CODE_LENGTH {
            return Err(RoomError::InvalidRoomCode(format!(
                "expected {ROOM_CODE_LENGTH} characters"
            )));
        }
        if !trimmed.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(RoomError::InvalidRoomCode(
                "only letters and digits are allowed".into(),
            ));
        }
        Ok(Self(trimmed.to_ascii_lowercase()))
    }

    /// Draw a random code. Uniqueness is checked against the store by the caller.
    pub fn generate() -> Self {
        let mut rng = rand::rng();
        let code = (0..ROOM_CODE_LENGTH)
            .map(|_| ROOM_CODE_ALPHABET[rng.random_range(0..ROOM_CODE_ALPHABET.len())] as char)
            .collect();
        Self(code)
    }

    /// Borrow the normalised code.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Session store key for this room.
    pub fn storage_key(&self) -> String {
        format!("{STORAGE_PREFIX}{}", self.0)
    }
}

impl fmt::Display for RoomCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A person taking part in a room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    /// Opaque identifier, stable across rejoins.
    pub id: String,
    /// Display name, unique among current participants regardless of case.
    pub nickname: String,
    /// Whether this participant runs the room.
    pub is_host: bool,
    /// Set once the participant flagged themselves ready.
    pub is_ready: bool,
    /// Set once the participant nominated a movie.
    pub has_nominated: bool,
    /// Set once the participant voted in the current ballot.
    pub has_voted: bool,
    /// Unix milliseconds of the latest (re)join.
    pub joined_at: i64,
}

impl Participant {
    /// Fresh participant with every flag cleared. Hosts start ready.
    pub fn new(id: String, nickname: String, is_host: bool, now: i64) -> Self {
        Self {
            id,
            nickname,
            is_host,
            is_ready: is_host,
            has_nominated: false,
            has_voted: false,
            joined_at: now,
        }
    }
}

/// How an action designates the participant it acts for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParticipantRef {
    /// Opaque participant identifier.
    Id(String),
    /// Case-insensitive nickname among current participants.
    Nickname(String),
}

impl ParticipantRef {
    /// Pick the identifier when present, falling back to the nickname.
    pub fn from_parts(id: Option<String>, nickname: Option<String>) -> Result<Self, RoomError> {
        match (id, nickname) {
            (Some(id), _) if !id.trim().is_empty() => Ok(ParticipantRef::Id(id)),
            (_, Some(nickname)) if !nickname.trim().is_empty() => {
                Ok(ParticipantRef::Nickname(nickname))
            }
            _ => Err(RoomError::InvalidParticipantId(
                "participantId or nickname is required".into(),
            )),
        }
    }
}

impl fmt::Display for ParticipantRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParticipantRef::Id(id) => f.write_str(id),
            ParticipantRef::Nickname(nickname) => f.write_str(nickname),
        }
    }
}

/// Kind of media a nomination points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum MediaType {
    /// Feature film.
    Movie,
    /// Television show.
    Tv,
}

/// Validated snapshot of a movie or show, captured at nomination time.
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Movie {
    /// Provider identifier, normalised to a string.
    pub id: String,
    /// Sanitised title.
    pub title: String,
    /// Plain-text synopsis with markup stripped.
    pub overview: Option<String>,
    /// Relative poster image path.
    pub poster_path: Option<String>,
    /// Relative backdrop image path.
    pub backdrop_path: Option<String>,
    /// Calendar date formatted as `YYYY-MM-DD`.
    pub release_date: Option<String>,
    /// Average rating on a 0-10 scale.
    pub vote_average: Option<f64>,
    /// Movie or show.
    pub media_type: Option<MediaType>,
}

/// A movie proposed by one participant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Nomination {
    /// Movie being proposed.
    pub movie: Movie,
    /// Participant id of the nominator.
    pub nominated_by: String,
    /// Nickname at nomination time; not updated if the nominator renames.
    pub nominated_by_nickname: String,
    /// Unix milliseconds of the nomination.
    pub nominated_at: i64,
}

/// Final decision of a room. Never mutated once recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Winner {
    /// Winning nomination.
    pub nomination: Nomination,
    /// Vote count for every nominated movie id, in nomination order.
    pub tally: IndexMap<String, u32>,
    /// Ballots counted.
    pub total_votes: u32,
    /// True when the host picked the winner instead of the ballot.
    pub forced: bool,
    /// Unix milliseconds of the decision.
    pub decided_at: i64,
}

/// Authoritative record of a movie night session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    /// Lowercased room code.
    pub code: RoomCode,
    /// Participant id of the current host.
    pub host_id: String,
    /// Current lifecycle phase.
    pub phase: RoomPhase,
    /// Participants in join order.
    pub participants: Vec<Participant>,
    /// Nominations in insertion order.
    pub nominations: Vec<Nomination>,
    /// Participant id to nominated movie id.
    pub votes: IndexMap<String, String>,
    /// Set once voting finishes.
    pub winner: Option<Winner>,
    /// Unix milliseconds of creation.
    pub created_at: i64,
    /// Unix milliseconds of the latest commit.
    pub updated_at: i64,
    /// Incremented on every committed mutation.
    pub version: u64,
}

impl Room {
    /// Open a room in the waiting phase with its host as sole participant.
    pub fn new(code: RoomCode, host_id: String, host_nickname: String, now: i64) -> Self {
        let host = Participant::new(host_id.clone(), host_nickname, true, now);
        Self {
            code,
            host_id,
            phase: RoomPhase::Waiting,
            participants: vec![host],
            nominations: Vec::new(),
            votes: IndexMap::new(),
            winner: None,
            created_at: now,
            updated_at: now,
            version: 0,
        }
    }

    /// Look a participant up by id.
    pub fn participant(&self, id: &str) -> Option<&Participant> {
        self.participants.iter().find(|p| p.id == id)
    }

    pub(crate) fn participant_mut(&mut self, id: &str) -> Option<&mut Participant> {
        self.participants.iter_mut().find(|p| p.id == id)
    }

    /// Look a participant up by nickname, ignoring case.
    pub fn participant_by_nickname(&self, nickname: &str) -> Option<&Participant> {
        let wanted = nickname.trim().to_lowercase();
        self.participants
            .iter()
            .find(|p| p.nickname.to_lowercase() == wanted)
    }

    /// Resolve an action's participant reference.
    pub fn resolve(&self, who: &ParticipantRef) -> Result<&Participant, RoomError> {
        let found = match who {
            ParticipantRef::Id(id) => self.participant(id),
            ParticipantRef::Nickname(nickname) => self.participant_by_nickname(nickname),
        };
        found.ok_or_else(|| RoomError::ParticipantNotFound(who.to_string()))
    }

    /// Reject `requester_id` unless it designates the current host.
    pub fn ensure_host(&self, requester_id: &str, action: &'static str) -> Result<(), RoomError> {
        if requester_id != self.host_id {
            return Err(RoomError::NotHost(action));
        }
        Ok(())
    }

    pub(crate) fn advance(&mut self, event: PhaseEvent) -> Result<RoomPhase, RoomError> {
        self.phase = self.phase.next(event)?;
        Ok(self.phase)
    }

    /// Host opens the nomination round.
    pub fn start_nominations(&mut self, requester_id: &str) -> Result<RoomPhase, RoomError> {
        self.ensure_host(requester_id, PhaseEvent::StartNominations.action())?;
        self.advance(PhaseEvent::StartNominations)
    }

    /// Stamp a committed mutation.
    pub fn touch(&mut self, now: i64) {
        self.updated_at = now.max(self.updated_at);
        self.version += 1;
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn room_with_host() -> Room {
        Room::new(
            RoomCode::parse("abc123").unwrap(),
            "host".into(),
            "Alice".into(),
            1_000,
        )
    }

    #[test]
    fn room_code_is_normalised() {
        let code = RoomCode::parse("  AbC12z ").unwrap();
        assert_eq!(code.as_str(), "abc12z");
        assert_eq!(code.storage_key(), "room:abc12z");
    }

    #[test]
    fn room_code_rejects_bad_shapes() {
        for raw in ["", "abc12", "abc1234", "abc-12", "ab c12", "äbc123"] {
            let err = RoomCode::parse(raw).unwrap_err();
            assert_eq!(err.code(), "invalid_room_code", "accepted {raw:?}");
        }
    }

    #[test]
    fn generated_codes_are_lowercase_alphanumeric() {
        for _ in 0..64 {
            let code = RoomCode::generate();
            assert_eq!(code.as_str().len(), ROOM_CODE_LENGTH);
            assert!(
                code.as_str()
                    .chars()
                    .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
            );
            assert_eq!(RoomCode::parse(code.as_str()).unwrap(), code);
        }
    }

    #[test]
    fn new_room_has_single_ready_host() {
        let room = room_with_host();
        assert_eq!(room.phase, RoomPhase::Waiting);
        assert_eq!(room.participants.len(), 1);
        let host = &room.participants[0];
        assert!(host.is_host && host.is_ready);
        assert_eq!(host.nickname, "Alice");
        assert_eq!(room.host_id, host.id);
    }

    #[test]
    fn only_host_starts_nominations() {
        let mut room = room_with_host();
        assert_eq!(
            room.start_nominations("someone-else").unwrap_err(),
            RoomError::NotHost("start nominations")
        );
        assert_eq!(room.phase, RoomPhase::Waiting);

        assert_eq!(room.start_nominations("host").unwrap(), RoomPhase::Nominating);

        let err = room.start_nominations("host").unwrap_err();
        assert_eq!(err.code(), "invalid_phase");
        assert_eq!(room.phase, RoomPhase::Nominating);
    }

    #[test]
    fn resolve_by_id_or_nickname() {
        let room = room_with_host();
        assert_eq!(
            room.resolve(&ParticipantRef::Nickname("aLiCe".into()))
                .unwrap()
                .id,
            "host"
        );
        assert_eq!(
            room.resolve(&ParticipantRef::Id("ghost".into()))
                .unwrap_err(),
            RoomError::ParticipantNotFound("ghost".into())
        );
    }

    #[test]
    fn touch_bumps_version_and_timestamp() {
        let mut room = room_with_host();
        room.touch(2_000);
        room.touch(1_500);
        assert_eq!(room.version, 2);
        assert_eq!(room.updated_at, 2_000);
    }

    #[test]
    fn room_serialises_with_camel_case_fields() {
        let room = room_with_host();
        let json = serde_json::to_value(&room).unwrap();
        assert_eq!(json["code"], "abc123");
        assert_eq!(json["hostId"], "host");
        assert_eq!(json["phase"], "waiting");
        assert_eq!(json["participants"][0]["isHost"], true);
        assert!(json["winner"].is_null());
    }
}
