use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for Movie Night Back.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::rooms::create_room,
        crate::routes::rooms::room_status,
        crate::routes::rooms::join_room,
        crate::routes::rooms::start_nominations,
        crate::routes::rooms::nominate,
        crate::routes::rooms::mark_ready,
        crate::routes::rooms::start_voting,
        crate::routes::rooms::vote,
        crate::routes::rooms::finish_voting,
        crate::routes::rooms::leave_room,
        crate::routes::sse::room_stream,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::movie::MovieInput,
            crate::dto::room::CreateRoomRequest,
            crate::dto::room::CreateRoomResponse,
            crate::dto::room::JoinRoomRequest,
            crate::dto::room::JoinRoomResponse,
            crate::dto::room::HostActionRequest,
            crate::dto::room::PhaseResponse,
            crate::dto::room::ParticipantSelector,
            crate::dto::room::NominateRequest,
            crate::dto::room::NominationsResponse,
            crate::dto::room::ParticipantResponse,
            crate::dto::room::VoteRequest,
            crate::dto::room::VotesResponse,
            crate::dto::room::FinishVotingRequest,
            crate::dto::room::FinishVotingResponse,
            crate::dto::room::LeaveRoomRequest,
            crate::dto::room::LeaveRoomResponse,
            crate::dto::sse::RoomUpdate,
            crate::error::ErrorBody,
            crate::error::ErrorDetail,
            crate::state::room::Room,
            crate::state::room::RoomCode,
            crate::state::room::Participant,
            crate::state::room::Movie,
            crate::state::room::MediaType,
            crate::state::room::Nomination,
            crate::state::room::Winner,
            crate::state::state_machine::RoomPhase,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "rooms", description = "Room lifecycle, nominations and voting"),
        (name = "sse", description = "Server-sent events streams"),
    )
)]
pub struct ApiDoc;
