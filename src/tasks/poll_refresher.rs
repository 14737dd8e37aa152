use crate::coordinator::VoteCoordinator;
use std::sync::Arc;
use std::time::Duration;
use chrono::Utc;
use log::info;
use tokio::time::interval;

/// Re-queries the store on a fixed interval. New votes from other people only
/// show up this way; there is no push channel.
pub async fn refresh_polls_task(coordinator: Arc<VoteCoordinator>, every: Duration) {
    info!("Refreshing polls every {}s", every.as_secs());
    let mut interval = interval(every);

    loop {
        interval.tick().await; // Wait for the next interval tick
        info!("Re-querying polls at {}", Utc::now().to_rfc3339());

        // Failures are already reported by the coordinator
        let polls = coordinator.load_polls().await;
        if !polls.is_empty() {
            info!("Refreshed {} poll(s).", polls.len());
        }
    }
}
