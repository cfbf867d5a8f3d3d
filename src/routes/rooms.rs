use axum::{
    Json, Router,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    routing::{get, post},
};
use validator::Validate;

use crate::{
    dto::room::{
        CreateRoomRequest, CreateRoomResponse, FinishVotingRequest, FinishVotingResponse,
        HostActionRequest, JoinRoomRequest, JoinRoomResponse, LeaveRoomRequest,
        LeaveRoomResponse, NominateRequest, NominationsResponse, ParticipantResponse,
        ParticipantSelector, PhaseResponse, VoteRequest, VotesResponse,
    },
    error::{AppError, ErrorBody},
    services::room_service,
    state::{SharedState, room::Room},
};

/// Room lifecycle endpoints.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new()
        .route("/rooms", post(create_room))
        .route("/rooms/{code}", get(room_status))
        .route("/rooms/{code}/join", post(join_room))
        .route("/rooms/{code}/nominations/start", post(start_nominations))
        .route("/rooms/{code}/nominations", post(nominate))
        .route("/rooms/{code}/ready", post(mark_ready))
        .route("/rooms/{code}/voting/start", post(start_voting))
        .route("/rooms/{code}/votes", post(vote))
        .route("/rooms/{code}/voting/finish", post(finish_voting))
        .route("/rooms/{code}/leave", post(leave_room))
}

/// Unwrap a JSON body and run its declared validation rules.
fn validated<T: Validate>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    let Json(payload) = payload.map_err(|rejection| AppError::BadRequest {
        code: "invalid_request",
        message: rejection.body_text(),
    })?;
    payload.validate()?;
    Ok(payload)
}

/// Open a new room with the caller as host.
#[utoipa::path(
    post,
    path = "/rooms",
    tag = "rooms",
    request_body = CreateRoomRequest,
    responses(
        (status = 201, description = "Room created", body = CreateRoomResponse),
        (status = 400, description = "Invalid nickname or body", body = ErrorBody),
        (status = 503, description = "Room store unavailable", body = ErrorBody)
    )
)]
pub async fn create_room(
    State(state): State<SharedState>,
    payload: Result<Json<CreateRoomRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CreateRoomResponse>), AppError> {
    let request = validated(payload)?;
    let created = room_service::create_room(&state, request).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Current state of a room.
#[utoipa::path(
    get,
    path = "/rooms/{code}",
    tag = "rooms",
    params(("code" = String, Path, description = "Six character room code")),
    responses(
        (status = 200, description = "Room snapshot", body = Room),
        (status = 400, description = "Malformed room code", body = ErrorBody),
        (status = 404, description = "Room not found or expired", body = ErrorBody)
    )
)]
pub async fn room_status(
    State(state): State<SharedState>,
    Path(code): Path<String>,
) -> Result<Json<Room>, AppError> {
    Ok(Json(room_service::room_status(&state, &code).await?))
}

/// Join a room, or rejoin it with a known participant id.
#[utoipa::path(
    post,
    path = "/rooms/{code}/join",
    tag = "rooms",
    params(("code" = String, Path, description = "Six character room code")),
    request_body = JoinRoomRequest,
    responses(
        (status = 200, description = "Joined", body = JoinRoomResponse),
        (status = 400, description = "Invalid nickname or participant id", body = ErrorBody),
        (status = 404, description = "Room not found", body = ErrorBody),
        (status = 409, description = "Nickname already taken", body = ErrorBody)
    )
)]
pub async fn join_room(
    State(state): State<SharedState>,
    Path(code): Path<String>,
    payload: Result<Json<JoinRoomRequest>, JsonRejection>,
) -> Result<Json<JoinRoomResponse>, AppError> {
    let request = validated(payload)?;
    Ok(Json(room_service::join_room(&state, &code, request).await?))
}

/// Host opens the nomination round.
#[utoipa::path(
    post,
    path = "/rooms/{code}/nominations/start",
    tag = "rooms",
    params(("code" = String, Path, description = "Six character room code")),
    request_body = HostActionRequest,
    responses(
        (status = 200, description = "Nominations open", body = PhaseResponse),
        (status = 403, description = "Requester is not the host", body = ErrorBody),
        (status = 409, description = "Room is not waiting", body = ErrorBody)
    )
)]
pub async fn start_nominations(
    State(state): State<SharedState>,
    Path(code): Path<String>,
    payload: Result<Json<HostActionRequest>, JsonRejection>,
) -> Result<Json<PhaseResponse>, AppError> {
    let request = validated(payload)?;
    Ok(Json(
        room_service::start_nominations(&state, &code, request).await?,
    ))
}

/// Nominate a movie.
#[utoipa::path(
    post,
    path = "/rooms/{code}/nominations",
    tag = "rooms",
    params(("code" = String, Path, description = "Six character room code")),
    request_body = NominateRequest,
    responses(
        (status = 200, description = "Nomination recorded", body = NominationsResponse),
        (status = 400, description = "Invalid movie payload", body = ErrorBody),
        (status = 404, description = "Room or participant not found", body = ErrorBody),
        (status = 409, description = "Nomination refused in the current state", body = ErrorBody)
    )
)]
pub async fn nominate(
    State(state): State<SharedState>,
    Path(code): Path<String>,
    payload: Result<Json<NominateRequest>, JsonRejection>,
) -> Result<Json<NominationsResponse>, AppError> {
    let request = validated(payload)?;
    Ok(Json(room_service::nominate(&state, &code, request).await?))
}

/// Flag a participant as ready.
#[utoipa::path(
    post,
    path = "/rooms/{code}/ready",
    tag = "rooms",
    params(("code" = String, Path, description = "Six character room code")),
    request_body = ParticipantSelector,
    responses(
        (status = 200, description = "Participant ready", body = ParticipantResponse),
        (status = 404, description = "Room or participant not found", body = ErrorBody)
    )
)]
pub async fn mark_ready(
    State(state): State<SharedState>,
    Path(code): Path<String>,
    payload: Result<Json<ParticipantSelector>, JsonRejection>,
) -> Result<Json<ParticipantResponse>, AppError> {
    let request = validated(payload)?;
    Ok(Json(room_service::mark_ready(&state, &code, request).await?))
}

/// Host closes nominations and opens the ballot.
#[utoipa::path(
    post,
    path = "/rooms/{code}/voting/start",
    tag = "rooms",
    params(("code" = String, Path, description = "Six character room code")),
    request_body = HostActionRequest,
    responses(
        (status = 200, description = "Voting open", body = PhaseResponse),
        (status = 403, description = "Requester is not the host", body = ErrorBody),
        (status = 409, description = "Wrong phase or not enough nominations", body = ErrorBody)
    )
)]
pub async fn start_voting(
    State(state): State<SharedState>,
    Path(code): Path<String>,
    payload: Result<Json<HostActionRequest>, JsonRejection>,
) -> Result<Json<PhaseResponse>, AppError> {
    let request = validated(payload)?;
    Ok(Json(room_service::start_voting(&state, &code, request).await?))
}

/// Cast or replace a vote.
#[utoipa::path(
    post,
    path = "/rooms/{code}/votes",
    tag = "rooms",
    params(("code" = String, Path, description = "Six character room code")),
    request_body = VoteRequest,
    responses(
        (status = 200, description = "Vote recorded", body = VotesResponse),
        (status = 404, description = "Room or participant not found", body = ErrorBody),
        (status = 409, description = "Wrong phase or unknown movie", body = ErrorBody)
    )
)]
pub async fn vote(
    State(state): State<SharedState>,
    Path(code): Path<String>,
    payload: Result<Json<VoteRequest>, JsonRejection>,
) -> Result<Json<VotesResponse>, AppError> {
    let request = validated(payload)?;
    Ok(Json(room_service::vote(&state, &code, request).await?))
}

/// Host closes the ballot and reveals the winner.
#[utoipa::path(
    post,
    path = "/rooms/{code}/voting/finish",
    tag = "rooms",
    params(("code" = String, Path, description = "Six character room code")),
    request_body = FinishVotingRequest,
    responses(
        (status = 200, description = "Winner decided", body = FinishVotingResponse),
        (status = 403, description = "Requester is not the host", body = ErrorBody),
        (status = 404, description = "Room not found", body = ErrorBody),
        (status = 409, description = "Wrong phase or unknown forced winner", body = ErrorBody)
    )
)]
pub async fn finish_voting(
    State(state): State<SharedState>,
    Path(code): Path<String>,
    payload: Result<Json<FinishVotingRequest>, JsonRejection>,
) -> Result<Json<FinishVotingResponse>, AppError> {
    let request = validated(payload)?;
    Ok(Json(
        room_service::finish_voting(&state, &code, request).await?,
    ))
}

/// Leave a room; the last participant leaving deletes it.
#[utoipa::path(
    post,
    path = "/rooms/{code}/leave",
    tag = "rooms",
    params(("code" = String, Path, description = "Six character room code")),
    request_body = LeaveRoomRequest,
    responses(
        (status = 200, description = "Participant removed", body = LeaveRoomResponse),
        (status = 404, description = "Room or participant not found", body = ErrorBody)
    )
)]
pub async fn leave_room(
    State(state): State<SharedState>,
    Path(code): Path<String>,
    payload: Result<Json<LeaveRoomRequest>, JsonRejection>,
) -> Result<Json<LeaveRoomResponse>, AppError> {
    let request = validated(payload)?;
    Ok(Json(room_service::leave_room(&state, &code, request).await?))
}
