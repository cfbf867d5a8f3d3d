//! Membership rules of a room: joining, rejoining, readiness and leaving.
//!
//! Nicknames are unique among *current* participants only, ignoring case. A
//! participant that leaves frees its nickname immediately.

use uuid::Uuid;

use crate::state::{
    errors::RoomError,
    room::{Participant, ParticipantRef, Room},
    state_machine::RoomPhase,
};

/// Result of a successful join request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinOutcome {
    /// The participant as recorded after the join.
    pub participant: Participant,
    /// True when the id matched an existing participant.
    pub rejoined: bool,
    /// True when the caller claimed to be host but is not the recorded host.
    pub host_claim_rejected: bool,
}

/// Result of a participant leaving.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaveOutcome {
    /// The participant that left.
    pub participant: Participant,
    /// Set when the host left and someone else was promoted.
    pub new_host_id: Option<String>,
    /// True when nobody is left in the room.
    pub room_empty: bool,
}

impl Room {
    /// Whether `nickname` is used by a current participant other than `except_id`.
    pub fn nickname_taken(&self, nickname: &str, except_id: Option<&str>) -> bool {
        let wanted = nickname.to_lowercase();
        self.participants
            .iter()
            .filter(|p| Some(p.id.as_str()) != except_id)
            .any(|p| p.nickname.to_lowercase() == wanted)
    }

    /// Add a participant, or refresh an existing one when `participant_id` matches.
    ///
    /// A rejoin keeps every flag already set; only the nickname and join time change.
    pub fn join(
        &mut self,
        participant_id: Option<String>,
        nickname: String,
        claims_host: bool,
        now: i64,
    ) -> Result<JoinOutcome, RoomError> {
        let existing = participant_id
            .as_deref()
            .and_then(|id| self.participants.iter().position(|p| p.id == id));

        if let Some(index) = existing {
            let id = self.participants[index].id.clone();
            if self.nickname_taken(&nickname, Some(&id)) {
                return Err(RoomError::NicknameTaken(nickname));
            }

            let participant = &mut self.participants[index];
            participant.nickname = nickname;
            participant.joined_at = now;
            return Ok(JoinOutcome {
                host_claim_rejected: claims_host && !participant.is_host,
                participant: participant.clone(),
                rejoined: true,
            });
        }

        if self.nickname_taken(&nickname, None) {
            return Err(RoomError::NicknameTaken(nickname));
        }

        let id = participant_id.unwrap_or_else(|| Uuid::new_v4().simple().to_string());
        let participant = Participant::new(id, nickname, false, now);
        self.participants.push(participant.clone());

        Ok(JoinOutcome {
            participant,
            rejoined: false,
            host_claim_rejected: claims_host,
        })
    }

    /// Flag a participant as ready. Returns the participant and whether anything changed.
    pub fn mark_ready(&mut self, who: &ParticipantRef) -> Result<(Participant, bool), RoomError> {
        let id = self.resolve(who)?.id.clone();
        let Some(participant) = self.participant_mut(&id) else {
            return Err(RoomError::ParticipantNotFound(id));
        };
        let changed = !participant.is_ready;
        participant.is_ready = true;
        Ok((participant.clone(), changed))
    }

    /// Remove a participant, promoting the earliest-joined remaining one when the host leaves.
    ///
    /// Nominations stay on the ballot. The leaver's vote is dropped unless the
    /// room is already complete.
    pub fn leave(&mut self, participant_id: &str) -> Result<LeaveOutcome, RoomError> {
        let index = self
            .participants
            .iter()
            .position(|p| p.id == participant_id)
            .ok_or_else(|| RoomError::ParticipantNotFound(participant_id.to_string()))?;

        let participant = self.participants.remove(index);
        if self.phase != RoomPhase::Complete {
            self.votes.shift_remove(&participant.id);
        }

        let mut new_host_id = None;
        if participant.is_host {
            if let Some(next) = self.participants.first_mut() {
                next.is_host = true;
                next.is_ready = true;
                self.host_id = next.id.clone();
                new_host_id = Some(next.id.clone());
            }
        }

        Ok(LeaveOutcome {
            participant,
            new_host_id,
            room_empty: self.participants.is_empty(),
        })
    }

    /// Number of participants flagged as host. Always one for a non-empty room.
    pub fn host_count(&self) -> usize {
        self.participants.iter().filter(|p| p.is_host).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::room::tests::room_with_host;

    fn join(room: &mut Room, id: Option<&str>, nickname: &str) -> Result<JoinOutcome, RoomError> {
        room.join(id.map(Into::into), nickname.into(), false, 2_000)
    }

    #[test]
    fn duplicate_nickname_is_rejected_case_insensitively() {
        let mut room = room_with_host();
        let err = join(&mut room, None, "alice").unwrap_err();

        assert_eq!(err, RoomError::NicknameTaken("alice".into()));
        assert_eq!(room.participants.len(), 1);
    }

    #[test]
    fn new_participant_gets_generated_id() {
        let mut room = room_with_host();
        let outcome = join(&mut room, None, "Bob").unwrap();

        assert!(!outcome.rejoined);
        assert!(!outcome.participant.is_host);
        assert!(!outcome.participant.is_ready);
        assert_eq!(outcome.participant.id.len(), 32);
        assert_eq!(room.participants.len(), 2);
        assert_eq!(room.host_count(), 1);
    }

    #[test]
    fn rejoin_keeps_flags_and_does_not_duplicate() {
        let mut room = room_with_host();
        join(&mut room, Some("bob-1"), "Bob").unwrap();
        room.participant_mut("bob-1").unwrap().is_ready = true;
        room.participant_mut("bob-1").unwrap().has_nominated = true;

        let outcome = room
            .join(Some("bob-1".into()), "Bobby".into(), false, 9_000)
            .unwrap();

        assert!(outcome.rejoined);
        assert_eq!(room.participants.len(), 2);
        let bob = room.participant("bob-1").unwrap();
        assert_eq!(bob.nickname, "Bobby");
        assert_eq!(bob.joined_at, 9_000);
        assert!(bob.is_ready && bob.has_nominated);
    }

    #[test]
    fn rejoin_may_keep_own_nickname_but_not_steal_one() {
        let mut room = room_with_host();
        join(&mut room, Some("bob-1"), "Bob").unwrap();

        assert!(join(&mut room, Some("bob-1"), "BOB").is_ok());
        assert_eq!(
            join(&mut room, Some("bob-1"), "ALICE").unwrap_err(),
            RoomError::NicknameTaken("ALICE".into())
        );
    }

    #[test]
    fn host_claim_never_creates_second_host() {
        let mut room = room_with_host();
        let outcome = room.join(None, "Mallory".into(), true, 2_000).unwrap();

        assert!(outcome.host_claim_rejected);
        assert!(!outcome.participant.is_host);
        assert_eq!(room.host_count(), 1);

        let rejoin = room.join(Some("host".into()), "Alice".into(), true, 3_000).unwrap();
        assert!(!rejoin.host_claim_rejected);
        assert!(rejoin.participant.is_host);
    }

    #[test]
    fn mark_ready_is_idempotent() {
        let mut room = room_with_host();
        join(&mut room, Some("bob-1"), "Bob").unwrap();

        let who = ParticipantRef::Nickname("bob".into());
        let (bob, changed) = room.mark_ready(&who).unwrap();
        assert!(bob.is_ready && changed);
        let (_, changed) = room.mark_ready(&who).unwrap();
        assert!(!changed);
    }

    #[test]
    fn leaving_host_promotes_earliest_joined() {
        let mut room = room_with_host();
        join(&mut room, Some("bob-1"), "Bob").unwrap();
        join(&mut room, Some("carol-1"), "Carol").unwrap();

        let outcome = room.leave("host").unwrap();

        assert_eq!(outcome.new_host_id.as_deref(), Some("bob-1"));
        assert!(!outcome.room_empty);
        assert_eq!(room.host_id, "bob-1");
        assert_eq!(room.host_count(), 1);
        let bob = room.participant("bob-1").unwrap();
        assert!(bob.is_host && bob.is_ready);
    }

    #[test]
    fn leaving_frees_nickname_and_drops_vote() {
        let mut room = room_with_host();
        join(&mut room, Some("bob-1"), "Bob").unwrap();
        room.votes.insert("bob-1".into(), "m1".into());

        let outcome = room.leave("bob-1").unwrap();

        assert_eq!(outcome.new_host_id, None);
        assert!(room.votes.is_empty());
        assert!(join(&mut room, None, "bob").is_ok());
    }

    #[test]
    fn last_participant_leaving_empties_room() {
        let mut room = room_with_host();
        let outcome = room.leave("host").unwrap();
        assert!(outcome.room_empty);
        assert_eq!(outcome.new_host_id, None);

        assert_eq!(
            room.leave("host").unwrap_err(),
            RoomError::ParticipantNotFound("host".into())
        );
    }
}
