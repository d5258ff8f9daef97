use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::check::run_check;
use crate::notify::Notifier;
use crate::source::FacilityApi;
use crate::thresholds::Thresholds;

pub struct PeriodicCheck<A, N> {
    pub api: Arc<A>,
    pub notifier: Arc<N>,
    pub thresholds: Thresholds,
    pub interval: Duration,
    pub max_message_len: usize,
}

/// Spawn a background task that runs the fuel check now and then once per interval
/// until `shutdown` fires.
pub fn spawn_periodic_check<A, N>(job: PeriodicCheck<A, N>, shutdown: CancellationToken) -> JoinHandle<()>
where
    A: FacilityApi + 'static,
    N: Notifier + 'static,
{
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(job.interval);
        // A slow run pushes the schedule back instead of bursting to catch up.
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = interval.tick() => {},
                () = shutdown.cancelled() => {
                    info!("shutdown requested, exiting periodic fuel check");
                    break;
                }
            }

            if let Err(e) = run_check(
                job.api.as_ref(),
                job.notifier.as_ref(),
                &job.thresholds,
                job.max_message_len,
                Utc::now(),
            )
            .await
            {
                error!(error = %e, "❌ periodic fuel check failed");
            }
        }
    })
}
