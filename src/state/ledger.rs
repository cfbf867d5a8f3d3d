//! Nomination and ballot rules.
//!
//! Every operation validates completely before touching the room, so a
//! rejected call never leaves partial state behind.

use indexmap::IndexMap;

use crate::state::{
    errors::RoomError,
    room::{Movie, Nomination, ParticipantRef, Room, Winner},
    state_machine::{PhaseEvent, RoomPhase},
};

/// Fewest nominations a ballot can be opened with.
pub const MIN_NOMINATIONS_FOR_VOTING: usize = 2;

/// Result of a recorded vote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CastVote {
    /// Voter.
    pub participant_id: String,
    /// Movie the vote now points at.
    pub movie_id: String,
    /// Movie the participant voted for before this call, if any.
    pub replaced: Option<String>,
}

impl Room {
    fn nomination_index(&self, movie_id: &str) -> Option<usize> {
        self.nominations.iter().position(|n| n.movie.id == movie_id)
    }

    /// Record one participant's movie proposal.
    pub fn nominate(
        &mut self,
        who: &ParticipantRef,
        movie: Movie,
        max_nominations: usize,
        now: i64,
    ) -> Result<Nomination, RoomError> {
        if self.phase != RoomPhase::Nominating {
            return Err(RoomError::InvalidPhase {
                action: "nominate",
                phase: self.phase,
            });
        }

        let participant = self.resolve(who)?;
        let participant_id = participant.id.clone();
        let already = participant.has_nominated
            || self.nominations.iter().any(|n| n.nominated_by == participant_id);
        if already {
            return Err(RoomError::AlreadyNominated);
        }
        if self.nominations.len() >= max_nominations {
            return Err(RoomError::NominationLimitReached(max_nominations));
        }
        if self.nomination_index(&movie.id).is_some() {
            return Err(RoomError::MovieAlreadyNominated(movie.id));
        }

        let nomination = Nomination {
            movie,
            nominated_by: participant_id.clone(),
            nominated_by_nickname: participant.nickname.clone(),
            nominated_at: now,
        };
        self.nominations.push(nomination.clone());
        if let Some(participant) = self.participant_mut(&participant_id) {
            participant.has_nominated = true;
        }

        Ok(nomination)
    }

    /// Host closes nominations and opens the ballot with fresh vote flags.
    pub fn start_voting(&mut self, requester_id: &str) -> Result<RoomPhase, RoomError> {
        self.ensure_host(requester_id, PhaseEvent::StartVoting.action())?;
        let next = self.phase.next(PhaseEvent::StartVoting)?;
        if self.nominations.len() < MIN_NOMINATIONS_FOR_VOTING {
            return Err(RoomError::NotEnoughNominations {
                required: MIN_NOMINATIONS_FOR_VOTING,
                actual: self.nominations.len(),
            });
        }

        self.phase = next;
        self.votes.clear();
        for participant in &mut self.participants {
            participant.has_voted = false;
        }
        Ok(next)
    }

    /// Record or replace a participant's vote.
    pub fn cast_vote(&mut self, who: &ParticipantRef, movie_id: &str) -> Result<CastVote, RoomError> {
        if self.phase != RoomPhase::Voting {
            return Err(RoomError::InvalidPhase {
                action: "vote",
                phase: self.phase,
            });
        }

        let participant_id = self.resolve(who)?.id.clone();
        if self.nomination_index(movie_id).is_none() {
            return Err(RoomError::InvalidNomination(movie_id.to_string()));
        }

        let replaced = self
            .votes
            .insert(participant_id.clone(), movie_id.to_string());
        if let Some(participant) = self.participant_mut(&participant_id) {
            participant.has_voted = true;
        }

        Ok(CastVote {
            participant_id,
            movie_id: movie_id.to_string(),
            replaced,
        })
    }

    /// Vote count per nominated movie, in nomination order.
    pub fn tally(&self) -> IndexMap<String, u32> {
        let mut tally: IndexMap<String, u32> = self
            .nominations
            .iter()
            .map(|n| (n.movie.id.clone(), 0))
            .collect();
        for movie_id in self.votes.values() {
            if let Some(count) = tally.get_mut(movie_id) {
                *count += 1;
            }
        }
        tally
    }

    /// Host closes the ballot. `forced` overrides the count with a nominated movie id.
    ///
    /// Without a forced pick the highest count wins; ties go to the movie
    /// nominated first, so the same ballot always yields the same winner.
    pub fn finish_voting(
        &mut self,
        requester_id: &str,
        forced: Option<&str>,
        now: i64,
    ) -> Result<Winner, RoomError> {
        self.ensure_host(requester_id, PhaseEvent::FinishVoting.action())?;
        let next = self.phase.next(PhaseEvent::FinishVoting)?;

        let tally = self.tally();
        let index = match forced {
            Some(movie_id) => self
                .nomination_index(movie_id)
                .ok_or_else(|| RoomError::InvalidNomination(movie_id.to_string()))?,
            None => leading_index(&tally).ok_or(RoomError::NotEnoughNominations {
                required: 1,
                actual: 0,
            })?,
        };

        let winner = Winner {
            nomination: self.nominations[index].clone(),
            total_votes: tally.values().sum(),
            tally,
            forced: forced.is_some(),
            decided_at: now,
        };
        self.phase = next;
        self.winner = Some(winner.clone());
        Ok(winner)
    }

    /// Whether every current participant has nominated.
    pub fn all_nominated(&self) -> bool {
        !self.participants.is_empty() && self.participants.iter().all(|p| p.has_nominated)
    }

    /// Whether every current participant has voted.
    pub fn all_voted(&self) -> bool {
        !self.participants.is_empty() && self.participants.iter().all(|p| p.has_voted)
    }
}

/// Position of the highest count, the earliest one on ties.
fn leading_index(tally: &IndexMap<String, u32>) -> Option<usize> {
    let mut best: Option<(usize, u32)> = None;
    for (index, count) in tally.values().copied().enumerate() {
        match best {
            Some((_, top)) if count <= top => {}
            _ => best = Some((index, count)),
        }
    }
    best.map(|(index, _)| index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::room::tests::room_with_host;

    fn movie(id: &str) -> Movie {
        Movie {
            id: id.into(),
            title: format!("Movie {id}"),
            overview: None,
            poster_path: None,
            backdrop_path: None,
            release_date: None,
            vote_average: None,
            media_type: None,
        }
    }

    fn by_id(id: &str) -> ParticipantRef {
        ParticipantRef::Id(id.into())
    }

    /// Host plus Bob and Carol, in the nominating phase.
    fn nominating_room() -> Room {
        let mut room = room_with_host();
        room.join(Some("bob".into()), "Bob".into(), false, 1_100).unwrap();
        room.join(Some("carol".into()), "Carol".into(), false, 1_200).unwrap();
        room.start_nominations("host").unwrap();
        room
    }

    /// Nominations m1 (host), m2 (bob), m3 (carol), in the voting phase.
    fn voting_room() -> Room {
        let mut room = nominating_room();
        for (who, id) in [("host", "m1"), ("bob", "m2"), ("carol", "m3")] {
            room.nominate(&by_id(who), movie(id), 10, 2_000).unwrap();
        }
        room.start_voting("host").unwrap();
        room
    }

    #[test]
    fn nominate_outside_nominating_phase_is_rejected() {
        let mut room = room_with_host();
        let err = room.nominate(&by_id("host"), movie("m1"), 10, 2_000).unwrap_err();

        assert_eq!(
            err,
            RoomError::InvalidPhase {
                action: "nominate",
                phase: RoomPhase::Waiting
            }
        );
        assert!(room.nominations.is_empty());
    }

    #[test]
    fn one_nomination_per_participant() {
        let mut room = nominating_room();
        let nomination = room
            .nominate(&ParticipantRef::Nickname("bob".into()), movie("m1"), 10, 2_000)
            .unwrap();
        assert_eq!(nomination.nominated_by, "bob");
        assert_eq!(nomination.nominated_by_nickname, "Bob");
        assert!(room.participant("bob").unwrap().has_nominated);

        let err = room.nominate(&by_id("bob"), movie("m2"), 10, 2_100).unwrap_err();
        assert_eq!(err, RoomError::AlreadyNominated);
        assert_eq!(room.nominations.len(), 1);
    }

    #[test]
    fn same_movie_cannot_be_nominated_twice() {
        let mut room = nominating_room();
        room.nominate(&by_id("host"), movie("m1"), 10, 2_000).unwrap();

        let err = room.nominate(&by_id("bob"), movie("m1"), 10, 2_100).unwrap_err();
        assert_eq!(err, RoomError::MovieAlreadyNominated("m1".into()));
        assert!(!room.participant("bob").unwrap().has_nominated);
    }

    #[test]
    fn nomination_limit_is_enforced() {
        let mut room = nominating_room();
        room.nominate(&by_id("host"), movie("m1"), 2, 2_000).unwrap();
        room.nominate(&by_id("bob"), movie("m2"), 2, 2_000).unwrap();

        let err = room.nominate(&by_id("carol"), movie("m3"), 2, 2_000).unwrap_err();
        assert_eq!(err, RoomError::NominationLimitReached(2));
        assert_eq!(room.nominations.len(), 2);
    }

    #[test]
    fn all_nominated_tracks_every_participant() {
        let mut room = nominating_room();
        room.nominate(&by_id("host"), movie("m1"), 10, 2_000).unwrap();
        room.nominate(&by_id("bob"), movie("m2"), 10, 2_000).unwrap();
        assert!(!room.all_nominated());

        room.nominate(&by_id("carol"), movie("m3"), 10, 2_000).unwrap();
        assert!(room.all_nominated());
    }

    #[test]
    fn voting_needs_two_nominations() {
        let mut room = nominating_room();
        room.nominate(&by_id("host"), movie("m1"), 10, 2_000).unwrap();

        let err = room.start_voting("host").unwrap_err();
        assert_eq!(
            err,
            RoomError::NotEnoughNominations {
                required: 2,
                actual: 1
            }
        );
        assert_eq!(room.phase, RoomPhase::Nominating);
    }

    #[test]
    fn start_voting_checks_host_and_phase() {
        let mut room = room_with_host();
        assert_eq!(
            room.start_voting("bob").unwrap_err(),
            RoomError::NotHost("start voting")
        );
        assert_eq!(room.start_voting("host").unwrap_err().code(), "invalid_phase");
    }

    #[test]
    fn start_voting_resets_vote_flags() {
        let mut room = nominating_room();
        room.nominate(&by_id("host"), movie("m1"), 10, 2_000).unwrap();
        room.nominate(&by_id("bob"), movie("m2"), 10, 2_000).unwrap();
        room.participant_mut("carol").unwrap().has_voted = true;

        assert_eq!(room.start_voting("host").unwrap(), RoomPhase::Voting);
        assert!(room.participants.iter().all(|p| !p.has_voted));
        assert!(room.votes.is_empty());
    }

    #[test]
    fn revote_replaces_previous_choice() {
        let mut room = voting_room();
        let first = room.cast_vote(&by_id("bob"), "m1").unwrap();
        assert_eq!(first.replaced, None);

        let second = room.cast_vote(&by_id("bob"), "m3").unwrap();
        assert_eq!(second.replaced.as_deref(), Some("m1"));
        assert_eq!(room.votes.len(), 1);
        assert_eq!(room.tally()["m1"], 0);
        assert_eq!(room.tally()["m3"], 1);
    }

    #[test]
    fn vote_for_unknown_movie_changes_nothing() {
        let mut room = voting_room();
        room.cast_vote(&by_id("bob"), "m2").unwrap();
        let before = room.clone();

        let err = room.cast_vote(&by_id("bob"), "m9").unwrap_err();
        assert_eq!(err, RoomError::InvalidNomination("m9".into()));
        assert_eq!(room, before);
    }

    #[test]
    fn vote_outside_voting_phase_is_rejected() {
        let mut room = nominating_room();
        room.nominate(&by_id("host"), movie("m1"), 10, 2_000).unwrap();

        let err = room.cast_vote(&by_id("host"), "m1").unwrap_err();
        assert_eq!(err.code(), "invalid_phase");
        assert!(room.votes.is_empty());
    }

    #[test]
    fn majority_wins() {
        let mut room = voting_room();
        room.cast_vote(&by_id("host"), "m2").unwrap();
        room.cast_vote(&by_id("bob"), "m2").unwrap();
        room.cast_vote(&by_id("carol"), "m3").unwrap();
        assert!(room.all_voted());

        let winner = room.finish_voting("host", None, 3_000).unwrap();

        assert_eq!(winner.nomination.movie.id, "m2");
        assert_eq!(winner.total_votes, 3);
        assert!(!winner.forced);
        assert_eq!(
            winner.tally.into_iter().collect::<Vec<_>>(),
            vec![("m1".into(), 0), ("m2".into(), 2), ("m3".into(), 1)]
        );
        assert_eq!(room.phase, RoomPhase::Complete);
    }

    #[test]
    fn tie_goes_to_first_nominated() {
        let mut room = voting_room();
        room.cast_vote(&by_id("host"), "m3").unwrap();
        room.cast_vote(&by_id("bob"), "m2").unwrap();

        let winner = room.finish_voting("host", None, 3_000).unwrap();
        assert_eq!(winner.nomination.movie.id, "m2");
    }

    #[test]
    fn winner_is_deterministic() {
        let mut a = voting_room();
        a.cast_vote(&by_id("bob"), "m3").unwrap();
        a.cast_vote(&by_id("carol"), "m1").unwrap();
        let mut b = a.clone();

        let first = a.finish_voting("host", None, 3_000).unwrap();
        let second = b.finish_voting("host", None, 3_000).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.nomination.movie.id, "m1");
    }

    #[test]
    fn zero_votes_picks_first_nomination() {
        let mut room = voting_room();
        let winner = room.finish_voting("host", None, 3_000).unwrap();

        assert_eq!(winner.nomination.movie.id, "m1");
        assert_eq!(winner.total_votes, 0);
    }

    #[test]
    fn forced_winner_overrides_ballot() {
        let mut room = voting_room();
        room.cast_vote(&by_id("bob"), "m2").unwrap();

        let winner = room.finish_voting("host", Some("m3"), 3_000).unwrap();
        assert!(winner.forced);
        assert_eq!(winner.nomination.movie.id, "m3");
        assert_eq!(winner.tally["m2"], 1);
    }

    #[test]
    fn forced_winner_must_be_nominated() {
        let mut room = voting_room();
        let err = room.finish_voting("host", Some("m9"), 3_000).unwrap_err();

        assert_eq!(err, RoomError::InvalidNomination("m9".into()));
        assert_eq!(room.phase, RoomPhase::Voting);
        assert!(room.winner.is_none());
    }

    #[test]
    fn only_host_finishes_and_only_once() {
        let mut room = voting_room();
        assert_eq!(
            room.finish_voting("bob", None, 3_000).unwrap_err(),
            RoomError::NotHost("finish voting")
        );

        let winner = room.finish_voting("host", None, 3_000).unwrap();
        let err = room.finish_voting("host", Some("m2"), 4_000).unwrap_err();
        assert_eq!(err.code(), "invalid_phase");
        assert_eq!(room.winner.as_ref(), Some(&winner));

        let late = room.cast_vote(&by_id("bob"), "m2").unwrap_err();
        assert_eq!(late.code(), "invalid_phase");
    }
}
