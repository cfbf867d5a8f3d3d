use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, info, warn};

use crate::{
    error::ServiceError,
    state::{SharedState, room::RoomCode},
};

/// Counts gathered by one sweep.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SweepReport {
    /// Expired room records removed from the store.
    pub purged_rooms: usize,
    /// Idle room gates forgotten.
    pub pruned_gates: usize,
    /// Rooms whose lingering subscribers were disconnected.
    pub closed_streams: usize,
}

/// Periodically purge expired rooms, close their streams and drop idle gates.
///
/// Store failures are logged and retried on the next tick.
pub async fn run(state: SharedState) {
    let mut ticker = interval(state.config().sweep_interval());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // the first tick fires immediately
    ticker.tick().await;

    loop {
        ticker.tick().await;
        match sweep(&state).await {
            Ok(report) if report != SweepReport::default() => {
                info!(
                    purged_rooms = report.purged_rooms,
                    pruned_gates = report.pruned_gates,
                    closed_streams = report.closed_streams,
                    "expiry sweep finished"
                );
            }
            Ok(_) => debug!("expiry sweep found nothing to do"),
            Err(err) => warn!(error = %err, "expiry sweep failed; retrying next tick"),
        }
    }
}

/// Run a single sweep.
pub async fn sweep(state: &SharedState) -> Result<SweepReport, ServiceError> {
    let purged_rooms = state
        .with_store_timeout(state.rooms().purge_expired())
        .await?;

    let mut closed_streams = 0;
    for raw in state.hub().room_codes() {
        let Ok(code) = RoomCode::parse(&raw) else {
            continue;
        };
        if state.close_if_missing(&code).await? {
            closed_streams += 1;
        }
    }

    Ok(SweepReport {
        purged_rooms,
        closed_streams,
        pruned_gates: state.prune_gates(),
    })
}
