//! Room actions: every operation parses its inputs, then runs one gated
//! read-modify-write cycle through [`AppState::mutate_room`].
//!
//! [`AppState::mutate_room`]: crate::state::AppState::mutate_room

use serde_json::Value;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    dto::{
        movie::normalize_movie_id,
        room::{
            CreateRoomRequest, CreateRoomResponse, FinishVotingRequest, FinishVotingResponse,
            HostActionRequest, JoinRoomRequest, JoinRoomResponse, LeaveRoomRequest,
            LeaveRoomResponse, NominateRequest, NominationsResponse, ParticipantResponse,
            ParticipantSelector, PhaseResponse, VoteRequest, VotesResponse,
        },
        sse::RoomUpdate,
        validation::sanitize_nickname,
    },
    error::ServiceError,
    state::{
        Mutation, SharedState,
        errors::RoomError,
        room::{Room, RoomCode, now_millis},
        state_machine::RoomPhase,
    },
};

/// Open a room with the caller as host.
pub async fn create_room(
    state: &SharedState,
    request: CreateRoomRequest,
) -> Result<CreateRoomResponse, ServiceError> {
    let nickname = sanitize_nickname(&request.host_nickname)?;
    let host_id = Uuid::new_v4().simple().to_string();
    let attempts = state.config().room_code_attempts;

    for attempt in 1..=attempts {
        let code = RoomCode::generate();
        let room = Room::new(code.clone(), host_id.clone(), nickname.clone(), now_millis());
        if state.insert_room(&room).await? {
            info!(room = %code, host = %host_id, "room created");
            return Ok(CreateRoomResponse {
                room_code: code.to_string(),
                host_id,
            });
        }
        debug!(room = %code, attempt, "room code already in use; drawing another");
    }

    warn!(attempts, "could not allocate a room code");
    Err(ServiceError::RoomCodesExhausted(attempts))
}

/// Join a room, or rejoin it when the participant id is already known.
pub async fn join_room(
    state: &SharedState,
    code: &str,
    request: JoinRoomRequest,
) -> Result<JoinRoomResponse, ServiceError> {
    let code = RoomCode::parse(code)?;
    let nickname = sanitize_nickname(&request.nickname)?;

    let (outcome, room) = state
        .mutate_room(&code, |room, now| {
            let outcome = room.join(request.participant_id, nickname, request.is_host, now)?;
            let participant = outcome.participant.clone();
            let update = if outcome.rejoined {
                RoomUpdate::ParticipantUpdated { participant }
            } else {
                RoomUpdate::ParticipantJoined { participant }
            };
            Ok(Mutation::save(outcome).with(update))
        })
        .await?;

    if outcome.host_claim_rejected {
        warn!(
            room = %code,
            participant = %outcome.participant.id,
            "ignored host claim from a participant that is not the host"
        );
    }
    info!(
        room = %code,
        participant = %outcome.participant.id,
        rejoined = outcome.rejoined,
        "participant joined"
    );

    Ok(JoinRoomResponse {
        participant_id: outcome.participant.id,
        room,
    })
}

/// Current state of a room, for clients reconciling after a missed event.
pub async fn room_status(state: &SharedState, code: &str) -> Result<Room, ServiceError> {
    let code = RoomCode::parse(code)?;
    state.load_room(&code).await
}

/// Host opens the nomination round.
pub async fn start_nominations(
    state: &SharedState,
    code: &str,
    request: HostActionRequest,
) -> Result<PhaseResponse, ServiceError> {
    let code = RoomCode::parse(code)?;
    let (phase, _) = state
        .mutate_room(&code, |room, _| {
            let previous = room.phase;
            let phase = room.start_nominations(&request.requester_id)?;
            Ok(Mutation::save(phase).with(RoomUpdate::PhaseChanged { phase, previous }))
        })
        .await?;

    info!(room = %code, %phase, "phase changed");
    Ok(PhaseResponse { phase })
}

/// Record a participant's movie proposal.
pub async fn nominate(
    state: &SharedState,
    code: &str,
    request: NominateRequest,
) -> Result<NominationsResponse, ServiceError> {
    let code = RoomCode::parse(code)?;
    let who = request.participant.into_ref()?;
    let movie = request
        .movie
        .into_movie(state.config().overview_max_chars)?;
    let max_nominations = state.config().max_nominations;

    let (nomination, room) = state
        .mutate_room(&code, |room, now| {
            let nomination = room.nominate(&who, movie, max_nominations, now)?;
            let total_nominations = room.nominations.len();
            Ok(Mutation::save(nomination.clone())
                .with(RoomUpdate::NominationAdded {
                    nomination,
                    total_nominations,
                })
                .with_if(room.all_nominated(), || RoomUpdate::AllNominated {
                    total_nominations,
                }))
        })
        .await?;

    info!(
        room = %code,
        participant = %nomination.nominated_by,
        movie = %nomination.movie.id,
        "movie nominated"
    );
    Ok(NominationsResponse {
        nominations: room.nominations,
    })
}

/// Flag a participant as ready.
pub async fn mark_ready(
    state: &SharedState,
    code: &str,
    request: ParticipantSelector,
) -> Result<ParticipantResponse, ServiceError> {
    let code = RoomCode::parse(code)?;
    let who = request.into_ref()?;

    let (participant, _) = state
        .mutate_room(&code, |room, _| {
            let (participant, changed) = room.mark_ready(&who)?;
            if !changed {
                return Ok(Mutation::unchanged(participant));
            }
            Ok(Mutation::save(participant.clone())
                .with(RoomUpdate::ParticipantUpdated { participant }))
        })
        .await?;

    debug!(room = %code, participant = %participant.id, "participant ready");
    Ok(ParticipantResponse { participant })
}

/// Host closes nominations and opens the ballot.
pub async fn start_voting(
    state: &SharedState,
    code: &str,
    request: HostActionRequest,
) -> Result<PhaseResponse, ServiceError> {
    let code = RoomCode::parse(code)?;
    let (phase, _) = state
        .mutate_room(&code, |room, _| {
            let previous = room.phase;
            let phase = room.start_voting(&request.requester_id)?;
            Ok(Mutation::save(phase).with(RoomUpdate::PhaseChanged { phase, previous }))
        })
        .await?;

    info!(room = %code, %phase, "phase changed");
    Ok(PhaseResponse { phase })
}

/// Cast or replace a participant's vote.
pub async fn vote(
    state: &SharedState,
    code: &str,
    request: VoteRequest,
) -> Result<VotesResponse, ServiceError> {
    let code = RoomCode::parse(code)?;
    let who = request.participant.into_ref()?;
    let movie_id = nominated_movie_id(&request.movie_id)?;

    let (cast, room) = state
        .mutate_room(&code, |room, _| {
            let cast = room.cast_vote(&who, &movie_id)?;
            let total_votes = room.votes.len();
            Ok(Mutation::save(cast.clone())
                .with(RoomUpdate::VoteCast {
                    participant_id: cast.participant_id,
                    movie_id: cast.movie_id,
                    total_votes,
                })
                .with_if(room.all_voted(), || RoomUpdate::AllVoted { total_votes }))
        })
        .await?;

    debug!(
        room = %code,
        participant = %cast.participant_id,
        movie = %cast.movie_id,
        replaced = ?cast.replaced,
        "vote recorded"
    );
    Ok(VotesResponse { votes: room.votes })
}

/// Host closes the ballot and settles the winner.
pub async fn finish_voting(
    state: &SharedState,
    code: &str,
    request: FinishVotingRequest,
) -> Result<FinishVotingResponse, ServiceError> {
    let code = RoomCode::parse(code)?;
    let forced = request
        .forced_winner
        .as_ref()
        .map(nominated_movie_id)
        .transpose()?;

    let (winner, room) = state
        .mutate_room(&code, |room, now| {
            let previous = room.phase;
            let winner = room.finish_voting(&request.requester_id, forced.as_deref(), now)?;
            Ok(Mutation::save(winner.clone())
                .with(RoomUpdate::PhaseChanged {
                    phase: room.phase,
                    previous,
                })
                .with(RoomUpdate::WinnerRevealed { winner }))
        })
        .await?;

    info!(
        room = %code,
        movie = %winner.nomination.movie.id,
        forced = winner.forced,
        total_votes = winner.total_votes,
        "winner decided"
    );
    Ok(FinishVotingResponse {
        phase: room.phase,
        winner,
    })
}

/// Normalise a movie id that must point at an existing nomination.
///
/// A malformed id can never match one, so it is reported as such.
fn nominated_movie_id(raw: &Value) -> Result<String, RoomError> {
    normalize_movie_id(raw).map_err(|_| RoomError::InvalidNomination(raw.to_string()))
}

/// Remove a participant; deletes the room when nobody is left.
pub async fn leave_room(
    state: &SharedState,
    code: &str,
    request: LeaveRoomRequest,
) -> Result<LeaveRoomResponse, ServiceError> {
    let room_code = RoomCode::parse(code)?;

    let (outcome, _) = state
        .mutate_room(&room_code, |room, _| {
            let had_all_nominated = room.all_nominated();
            let had_all_voted = room.all_voted();
            let outcome = room.leave(&request.participant_id)?;
            let left = RoomUpdate::ParticipantLeft {
                participant_id: outcome.participant.id.clone(),
                nickname: outcome.participant.nickname.clone(),
                new_host_id: outcome.new_host_id.clone(),
            };

            if outcome.room_empty {
                let closed = RoomUpdate::Closed {
                    code: room.code.to_string(),
                };
                return Ok(Mutation::delete(outcome).with(left).with(closed));
            }

            let promoted = outcome
                .new_host_id
                .as_deref()
                .and_then(|id| room.participant(id))
                .cloned();
            let mut mutation = Mutation::save(outcome).with(left);
            if let Some(participant) = promoted {
                mutation = mutation.with(RoomUpdate::ParticipantUpdated { participant });
            }
            let total_nominations = room.nominations.len();
            let total_votes = room.votes.len();
            Ok(mutation
                .with_if(
                    room.phase == RoomPhase::Nominating
                        && !had_all_nominated
                        && room.all_nominated(),
                    || RoomUpdate::AllNominated { total_nominations },
                )
                .with_if(
                    room.phase == RoomPhase::Voting && !had_all_voted && room.all_voted(),
                    || RoomUpdate::AllVoted { total_votes },
                ))
        })
        .await?;

    info!(
        room = %room_code,
        participant = %outcome.participant.id,
        new_host = ?outcome.new_host_id,
        room_closed = outcome.room_empty,
        "participant left"
    );
    Ok(LeaveRoomResponse {
        room_closed: outcome.room_empty,
        new_host_id: outcome.new_host_id,
    })
}
