//! Scheduled room advancement.
//!
//! Advances the shared room on a fixed interval so playback keeps moving
//! without a client calling `POST /api/room/advance`.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::engine::advancer::RoomAdvancer;

/// Run the room advancement loop until `cancel` is triggered.
///
/// The first tick fires one full `interval` after start.
pub async fn run(advancer: Arc<RoomAdvancer>, interval: Duration, cancel: CancellationToken) {
    tracing::info!(interval_secs = interval.as_secs(), "Room ticker started");

    let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + interval, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Room ticker stopping");
                break;
            }
            _ = ticker.tick() => {
                match advancer.advance().await {
                    Ok(outcome) if outcome.changed() => {
                        tracing::info!(room_id = %outcome.room.id, "Room ticker: advanced");
                    }
                    Ok(_) => tracing::debug!("Room ticker: nothing to do"),
                    Err(e) => tracing::error!(error = %e, "Room ticker: advance failed"),
                }
            }
        }
    }
}
