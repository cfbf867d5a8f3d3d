use std::convert::Infallible;

use axum::{
    Router,
    extract::{Path, Query, State},
    response::sse::{Event, Sse},
    routing::get,
};
use futures::Stream;

use crate::{
    dto::room::SubscribeQuery,
    error::{AppError, ErrorBody},
    services::sse_service,
    state::SharedState,
};

#[utoipa::path(
    get,
    path = "/rooms/{code}/events",
    tag = "sse",
    params(
        ("code" = String, Path, description = "Six character room code"),
        SubscribeQuery
    ),
    responses(
        (status = 200, description = "Room event stream, starting with a room.snapshot", content_type = "text/event-stream", body = String),
        (status = 404, description = "Room not found", body = ErrorBody)
    )
)]
/// Stream realtime updates of one room.
pub async fn room_stream(
    State(state): State<SharedState>,
    Path(code): Path<String>,
    Query(query): Query<SubscribeQuery>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    let (code, subscription) =
        sse_service::subscribe_room(&state, &code, query.participant_id).await?;
    Ok(sse_service::to_sse_stream(state, code, subscription))
}

/// Configure the SSE endpoints.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new().route("/rooms/{code}/events", get(room_stream))
}
