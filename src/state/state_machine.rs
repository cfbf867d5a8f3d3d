use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Phases a room moves through, strictly forward.
///
/// The derived ordering follows the lifecycle, so `a < b` means `a` happens before `b`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum RoomPhase {
    /// Room created, participants gathering in the lobby.
    Waiting,
    /// Participants propose one movie each.
    Nominating,
    /// Participants cast one vote each among the nominations.
    Voting,
    /// Winner decided; the room is read-only until it expires.
    Complete,
}

/// Host-triggered events that move a room to its next phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseEvent {
    /// Open the nomination round.
    StartNominations,
    /// Close nominations and open the ballot.
    StartVoting,
    /// Close the ballot and settle the winner.
    FinishVoting,
}

/// Error returned when attempting to apply an invalid transition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid transition: {event:?} cannot be applied while in {from:?}")]
pub struct InvalidTransition {
    /// The phase the room was in when the invalid event was received.
    pub from: RoomPhase,
    /// The event that cannot be applied from this phase.
    pub event: PhaseEvent,
}

impl RoomPhase {
    /// Compute the phase reached by applying `event`, if the transition is valid.
    pub fn next(self, event: PhaseEvent) -> Result<RoomPhase, InvalidTransition> {
        let next = match (self, event) {
            (RoomPhase::Waiting, PhaseEvent::StartNominations) => RoomPhase::Nominating,
            (RoomPhase::Nominating, PhaseEvent::StartVoting) => RoomPhase::Voting,
            (RoomPhase::Voting, PhaseEvent::FinishVoting) => RoomPhase::Complete,
            (from, event) => return Err(InvalidTransition { from, event }),
        };

        Ok(next)
    }

    /// Whether no further transition can leave this phase.
    pub fn is_terminal(self) -> bool {
        matches!(self, RoomPhase::Complete)
    }

    /// Wire name of the phase.
    pub fn as_str(self) -> &'static str {
        match self {
            RoomPhase::Waiting => "waiting",
            RoomPhase::Nominating => "nominating",
            RoomPhase::Voting => "voting",
            RoomPhase::Complete => "complete",
        }
    }
}

impl fmt::Display for RoomPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl PhaseEvent {
    /// Human readable description of the action, used in rejection messages.
    pub fn action(self) -> &'static str {
        match self {
            PhaseEvent::StartNominations => "start nominations",
            PhaseEvent::StartVoting => "start voting",
            PhaseEvent::FinishVoting => "finish voting",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_PHASES: [RoomPhase; 4] = [
        RoomPhase::Waiting,
        RoomPhase::Nominating,
        RoomPhase::Voting,
        RoomPhase::Complete,
    ];
    const ALL_EVENTS: [PhaseEvent; 3] = [
        PhaseEvent::StartNominations,
        PhaseEvent::StartVoting,
        PhaseEvent::FinishVoting,
    ];

    #[test]
    fn full_happy_path_through_room() {
        let phase = RoomPhase::Waiting;
        let phase = phase.next(PhaseEvent::StartNominations).unwrap();
        assert_eq!(phase, RoomPhase::Nominating);
        let phase = phase.next(PhaseEvent::StartVoting).unwrap();
        assert_eq!(phase, RoomPhase::Voting);
        let phase = phase.next(PhaseEvent::FinishVoting).unwrap();
        assert_eq!(phase, RoomPhase::Complete);
        assert!(phase.is_terminal());
    }

    #[test]
    fn invalid_transition_returns_error() {
        let err = RoomPhase::Waiting.next(PhaseEvent::StartVoting).unwrap_err();
        assert_eq!(err.from, RoomPhase::Waiting);
        assert_eq!(err.event, PhaseEvent::StartVoting);
    }

    #[test]
    fn every_valid_transition_moves_forward() {
        for phase in ALL_PHASES {
            for event in ALL_EVENTS {
                if let Ok(next) = phase.next(event) {
                    assert!(next > phase, "{phase:?} --{event:?}--> {next:?} went backwards");
                }
            }
        }
    }

    #[test]
    fn complete_accepts_no_event() {
        for event in ALL_EVENTS {
            assert!(RoomPhase::Complete.next(event).is_err());
        }
    }
}
