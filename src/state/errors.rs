use thiserror::Error;

use crate::state::state_machine::{InvalidTransition, RoomPhase};

/// Broad families of room rejections, used to pick a transport status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Malformed or out-of-policy input.
    Validation,
    /// The action conflicts with the current room state.
    StateConflict,
    /// The room or participant does not exist.
    NotFound,
    /// The requester may not perform the action.
    Authorization,
}

/// Reasons a room action is rejected. None of them leave partial state behind.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoomError {
    /// No live room under this code.
    #[error("room `{0}` not found")]
    RoomNotFound(String),
    /// The referenced participant is not in the room.
    #[error("participant `{0}` is not in this room")]
    ParticipantNotFound(String),
    /// Another participant already uses this nickname.
    #[error("nickname `{0}` is already taken in this room")]
    NicknameTaken(String),
    /// A host-only action was requested by someone else.
    #[error("only the host can {0}")]
    NotHost(&'static str),
    /// The action is not allowed in the current phase.
    #[error("cannot {action} while the room is {phase}")]
    InvalidPhase {
        /// Action that was attempted.
        action: &'static str,
        /// Phase the room was in.
        phase: RoomPhase,
    },
    /// The participant already has a nomination.
    #[error("you have already nominated a movie")]
    AlreadyNominated,
    /// The room holds the maximum number of nominations.
    #[error("this room already has the maximum of {0} nominations")]
    NominationLimitReached(usize),
    /// Someone else already nominated this movie.
    #[error("movie `{0}` has already been nominated")]
    MovieAlreadyNominated(String),
    /// Too few nominations to open the ballot.
    #[error("voting needs at least {required} nominations (got {actual})")]
    NotEnoughNominations {
        /// Minimum number of nominations.
        required: usize,
        /// Nominations currently recorded.
        actual: usize,
    },
    /// The movie id does not match any nomination.
    #[error("movie `{0}` is not among the nominations")]
    InvalidNomination(String),
    /// The movie payload failed validation.
    #[error("invalid movie: {0}")]
    InvalidMovie(String),
    /// The nickname failed sanitisation.
    #[error("invalid nickname: {0}")]
    InvalidNickname(String),
    /// The room code is malformed.
    #[error("invalid room code: {0}")]
    InvalidRoomCode(String),
    /// The participant id is malformed.
    #[error("invalid participant id: {0}")]
    InvalidParticipantId(String),
}

impl RoomError {
    /// Family of the rejection.
    pub fn category(&self) -> ErrorCategory {
        match self {
            RoomError::RoomNotFound(_) | RoomError::ParticipantNotFound(_) => {
                ErrorCategory::NotFound
            }
            RoomError::NotHost(_) => ErrorCategory::Authorization,
            RoomError::InvalidMovie(_)
            | RoomError::InvalidNickname(_)
            | RoomError::InvalidRoomCode(_)
            | RoomError::InvalidParticipantId(_) => ErrorCategory::Validation,
            RoomError::NicknameTaken(_)
            | RoomError::InvalidPhase { .. }
            | RoomError::AlreadyNominated
            | RoomError::NominationLimitReached(_)
            | RoomError::MovieAlreadyNominated(_)
            | RoomError::NotEnoughNominations { .. }
            | RoomError::InvalidNomination(_) => ErrorCategory::StateConflict,
        }
    }

    /// Stable machine-readable code clients can switch on.
    pub fn code(&self) -> &'static str {
        match self {
            RoomError::RoomNotFound(_) => "room_not_found",
            RoomError::ParticipantNotFound(_) => "participant_not_found",
            RoomError::NicknameTaken(_) => "nickname_taken",
            RoomError::NotHost(_) => "not_host",
            RoomError::InvalidPhase { .. } => "invalid_phase",
            RoomError::AlreadyNominated => "already_nominated",
            RoomError::NominationLimitReached(_) => "nomination_limit_reached",
            RoomError::MovieAlreadyNominated(_) => "movie_already_nominated",
            RoomError::NotEnoughNominations { .. } => "not_enough_nominations",
            RoomError::InvalidNomination(_) => "invalid_nomination",
            RoomError::InvalidMovie(_) => "invalid_movie",
            RoomError::InvalidNickname(_) => "invalid_nickname",
            RoomError::InvalidRoomCode(_) => "invalid_room_code",
            RoomError::InvalidParticipantId(_) => "invalid_participant_id",
        }
    }
}

impl From<InvalidTransition> for RoomError {
    fn from(err: InvalidTransition) -> Self {
        RoomError::InvalidPhase {
            action: err.event.action(),
            phase: err.from,
        }
    }
}
