use tracing::{debug, warn};

use crate::{
    dto::sse::RoomUpdate,
    state::{RoomHub, room::RoomCode},
};

/// Fan `updates` out to every subscriber of `code`, in order.
///
/// Never fails the caller: serialization errors and dropped subscribers are only logged.
pub fn publish_updates(hub: &RoomHub, code: &RoomCode, updates: &[RoomUpdate]) {
    for update in updates {
        send_room_event(hub, code, update);
    }
}

fn send_room_event(hub: &RoomHub, code: &RoomCode, update: &RoomUpdate) {
    let event = update.event_name();
    match update.to_server_event() {
        Ok(payload) => {
            let delivered = hub.publish(code.as_str(), &payload);
            debug!(room = %code, event, delivered, "room event published");
        }
        Err(err) => warn!(room = %code, event, error = %err, "failed to serialize room event"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{dto::sse::ServerEvent, state::state_machine::RoomPhase};

    #[tokio::test]
    async fn updates_arrive_in_publish_order() {
        let hub = RoomHub::new(8);
        let code = RoomCode::parse("abc123").unwrap();
        let initial = ServerEvent {
            event: None,
            data: "{}".into(),
        };
        let mut sub = hub.subscribe(code.as_str(), None, initial);

        publish_updates(
            &hub,
            &code,
            &[
                RoomUpdate::PhaseChanged {
                    phase: RoomPhase::Voting,
                    previous: RoomPhase::Nominating,
                },
                RoomUpdate::AllVoted { total_votes: 2 },
            ],
        );

        sub.receiver.recv().await.unwrap();
        let first = sub.receiver.recv().await.unwrap();
        let second = sub.receiver.recv().await.unwrap();
        assert_eq!(first.event.as_deref(), Some("phase.changed"));
        assert_eq!(second.event.as_deref(), Some("room.all_voted"));
    }

    #[test]
    fn publishing_without_subscribers_is_a_no_op() {
        let hub = RoomHub::new(8);
        let code = RoomCode::parse("abc123").unwrap();
        publish_updates(&hub, &code, &[RoomUpdate::AllNominated { total_nominations: 2 }]);
        assert_eq!(hub.room_count(), 0);
    }
}
