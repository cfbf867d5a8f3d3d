use std::convert::Infallible;

use axum::response::sse::{Event, KeepAlive, Sse};
use futures::Stream;
use tracing::info;

use crate::{
    dto::sse::ServerEvent,
    error::ServiceError,
    state::{SharedState, Subscription, room::RoomCode},
};

/// Subscribe to the event stream of one room.
///
/// The first event delivered is always a `room.snapshot` of the current state.
pub async fn subscribe_room(
    state: &SharedState,
    code: &str,
    participant_id: Option<String>,
) -> Result<(RoomCode, Subscription), ServiceError> {
    let code = RoomCode::parse(code)?;
    let subscription = state.subscribe_room(&code, participant_id.clone()).await?;
    info!(
        room = %code,
        participant = ?participant_id,
        subscriber = subscription.id,
        "room SSE stream connected"
    );
    Ok((code, subscription))
}

/// Unregisters the subscriber once its response stream is dropped.
struct SubscriptionGuard {
    state: SharedState,
    code: RoomCode,
    id: u64,
}

impl Drop for SubscriptionGuard {
    fn drop(&mut self) {
        self.state.hub().unsubscribe(self.code.as_str(), self.id);
        info!(room = %self.code, subscriber = self.id, "room SSE stream disconnected");
    }
}

/// Convert a room subscription into an SSE response with heartbeats.
pub fn to_sse_stream(
    state: SharedState,
    code: RoomCode,
    subscription: Subscription,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let heartbeat = state.config().heartbeat_interval();
    Sse::new(event_stream(state, code, subscription))
        .keep_alive(KeepAlive::new().interval(heartbeat).text("ping"))
}

/// Stream of SSE events for one subscriber.
///
/// Ends when the hub drops the subscriber (room closed or subscriber too
/// slow); dropping the stream unsubscribes it.
fn event_stream(
    state: SharedState,
    code: RoomCode,
    subscription: Subscription,
) -> impl Stream<Item = Result<Event, Infallible>> {
    let guard = SubscriptionGuard {
        state,
        code,
        id: subscription.id,
    };
    let mut receiver = subscription.receiver;

    async_stream::stream! {
        let _guard = guard;
        while let Some(payload) = receiver.recv().await {
            yield Ok(to_event(payload));
        }
    }
}

fn to_event(payload: ServerEvent) -> Event {
    let event = Event::default().data(payload.data);
    match payload.event {
        Some(name) => event.event(name),
        None => event,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use futures::StreamExt;

    use super::*;
    use crate::{
        config::AppConfig,
        dao::session_store::MemoryStore,
        dto::room::CreateRoomRequest,
        services::room_service,
        state::AppState,
    };

    #[tokio::test]
    async fn unknown_room_cannot_be_subscribed() {
        let state = AppState::new(AppConfig::default(), Arc::new(MemoryStore::new()));
        let err = subscribe_room(&state, "zzz999", None).await.unwrap_err();
        assert!(matches!(err, ServiceError::Room(ref e) if e.code() == "room_not_found"));
    }

    #[tokio::test]
    async fn dropping_the_stream_unsubscribes() {
        let state = AppState::new(AppConfig::default(), Arc::new(MemoryStore::new()));
        let created = room_service::create_room(
            &state,
            CreateRoomRequest {
                host_nickname: "Alice".into(),
            },
        )
        .await
        .unwrap();

        let (code, subscription) = subscribe_room(&state, &created.room_code, None)
            .await
            .unwrap();
        assert_eq!(state.hub().subscriber_count(code.as_str()), 1);

        let mut stream = Box::pin(event_stream(state.clone(), code.clone(), subscription));
        assert!(stream.next().await.is_some());
        drop(stream);

        assert_eq!(state.hub().subscriber_count(code.as_str()), 0);
    }
}
