mod common;

use common::{FakeApi, RecordingNotifier};
use fuel_alerts::jobs::{PeriodicCheck, spawn_periodic_check};
use fuel_alerts::thresholds::Thresholds;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

const INTERVAL: Duration = Duration::from_secs(60 * 60);

fn job(api: &Arc<FakeApi>, notifier: &Arc<RecordingNotifier>) -> PeriodicCheck<FakeApi, RecordingNotifier> {
    PeriodicCheck {
        api: Arc::clone(api),
        notifier: Arc::clone(notifier),
        thresholds: Thresholds::new(&[24, 48, 72], INTERVAL).unwrap(),
        interval: INTERVAL,
        max_message_len: 2000,
    }
}

#[tokio::test(start_paused = true)]
async fn runs_immediately_then_once_per_interval_until_cancelled() {
    let api = Arc::new(FakeApi::new(Vec::new()));
    let notifier = Arc::new(RecordingNotifier::default());
    let shutdown = CancellationToken::new();

    let handle = spawn_periodic_check(job(&api, &notifier), shutdown.clone());

    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(api.authentication_count(), 1);

    tokio::time::sleep(INTERVAL * 2).await;
    assert_eq!(api.authentication_count(), 3);

    shutdown.cancel();
    handle.await.unwrap();

    tokio::time::sleep(INTERVAL * 3).await;
    assert_eq!(api.authentication_count(), 3);
    assert!(notifier.sent().is_empty());
}

#[tokio::test(start_paused = true)]
async fn failed_run_does_not_stop_the_schedule() {
    let mut api = FakeApi::new(Vec::new());
    api.fail_listing = true;
    let api = Arc::new(api);
    let notifier = Arc::new(RecordingNotifier::default());
    let shutdown = CancellationToken::new();

    let handle = spawn_periodic_check(job(&api, &notifier), shutdown.clone());

    tokio::time::sleep(INTERVAL + Duration::from_secs(1)).await;
    assert_eq!(api.authentication_count(), 2);

    shutdown.cancel();
    handle.await.unwrap();
}
