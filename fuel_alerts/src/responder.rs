//! On-demand status replies under a response deadline.
//!
//! The responder picks one of two branches before doing any I/O:
//!
//! * [`ResponseMode::Synchronous`]: the expected fetch time fits in the deadline, so
//!   the listing is built and returned inline (truncated to one message).
//! * [`ResponseMode::Deferred`]: the fetch is expected to overrun, so the request is
//!   acknowledged at once and the full listing is posted to the notification channel
//!   when ready.
//!
//! A synchronous attempt that still overruns its budget is handed to the deferred
//! branch instead of being dropped.

use crate::notify::Notifier;
use crate::source::FacilityApi;
use crate::status::{StatusReport, build_status_report};
use chrono::Utc;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{error, info, warn};

/// Time kept in reserve for serializing and sending the reply.
const REPLY_MARGIN: Duration = Duration::from_millis(500);

pub const ACK_MESSAGE: &str = "⏳ Fetching fuel status, the full listing will be posted to the alert channel shortly.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseMode {
    Synchronous,
    Deferred,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// The answer itself.
    Immediate(String),
    /// An acknowledgement; the answer follows through the notifier.
    Acknowledged(String),
}

impl Reply {
    pub fn content(&self) -> &str {
        match self {
            Self::Immediate(content) | Self::Acknowledged(content) => content,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ResponderSettings {
    pub deadline: Duration,
    pub initial_estimate: Duration,
    pub max_entries: usize,
    pub max_message_len: usize,
}

/// Exponentially weighted moving average of observed fetch durations.
#[derive(Debug)]
pub struct FetchLatency {
    estimate: Mutex<Duration>,
}

impl FetchLatency {
    pub fn new(initial: Duration) -> Self {
        Self {
            estimate: Mutex::new(initial),
        }
    }

    pub fn estimate(&self) -> Duration {
        *self.estimate.lock()
    }

    /// Weights the newest sample at one quarter.
    pub fn record(&self, observed: Duration) {
        let mut estimate = self.estimate.lock();
        *estimate = (*estimate * 3 + observed) / 4;
    }
}

type ReportTask = JoinHandle<Result<StatusReport, String>>;

pub struct StatusResponder<A, N> {
    api: Arc<A>,
    notifier: Arc<N>,
    latency: FetchLatency,
    settings: ResponderSettings,
}

impl<A, N> StatusResponder<A, N>
where
    A: FacilityApi + 'static,
    N: Notifier + 'static,
{
    pub fn new(api: Arc<A>, notifier: Arc<N>, settings: ResponderSettings) -> Self {
        Self {
            api,
            notifier,
            latency: FetchLatency::new(settings.initial_estimate),
            settings,
        }
    }

    pub fn mode(&self) -> ResponseMode {
        if self.latency.estimate() + REPLY_MARGIN <= self.settings.deadline {
            ResponseMode::Synchronous
        } else {
            ResponseMode::Deferred
        }
    }

    pub async fn respond(self: &Arc<Self>) -> Reply {
        let mode = self.mode();
        info!(?mode, estimate = %humantime::format_duration(self.latency.estimate()), "answering status request");

        let mut task = self.spawn_report();
        if mode == ResponseMode::Deferred {
            self.deliver_later(task);
            return Reply::Acknowledged(ACK_MESSAGE.to_string());
        }

        let budget = self.settings.deadline.saturating_sub(REPLY_MARGIN);
        match tokio::time::timeout(budget, &mut task).await {
            Ok(Ok(Ok(report))) => Reply::Immediate(
                report.render_truncated(self.settings.max_entries, self.settings.max_message_len),
            ),
            Ok(Ok(Err(e))) => Reply::Immediate(failure_message(&e)),
            Ok(Err(e)) => {
                error!(error = ?e, "❌ status report task failed");
                Reply::Immediate(failure_message("internal error"))
            }
            Err(_) => {
                warn!(budget = %humantime::format_duration(budget), "status fetch overran its budget, deferring");
                self.deliver_later(task);
                Reply::Acknowledged(ACK_MESSAGE.to_string())
            }
        }
    }

    /// Builds a report in the background, feeding its duration into the estimate.
    fn spawn_report(self: &Arc<Self>) -> ReportTask {
        let this = Arc::clone(self);
        tokio::spawn(async move {
            let started = Instant::now();
            let result = build_status_report(this.api.as_ref(), Utc::now()).await;
            this.latency.record(started.elapsed());
            result.map_err(|e| {
                error!(error = %e, "❌ failed to build fuel status report");
                e.to_string()
            })
        })
    }

    fn deliver_later(self: &Arc<Self>, task: ReportTask) {
        let this = Arc::clone(self);
        tokio::spawn(async move {
            let messages = match task.await {
                Ok(Ok(report)) => report.render_chunks(this.settings.max_message_len),
                Ok(Err(e)) => vec![failure_message(&e)],
                Err(e) => {
                    error!(error = ?e, "❌ status report task failed");
                    vec![failure_message("internal error")]
                }
            };

            for message in messages {
                if let Err(e) = this.notifier.deliver(&message).await {
                    error!(error = %e, "❌ failed to post deferred status listing");
                    return;
                }
            }
            info!("posted deferred fuel status listing");
        });
    }
}

fn failure_message(reason: &str) -> String {
    format!("❌ Could not fetch fuel status: {reason}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latency_estimate_moves_toward_observations() {
        let latency = FetchLatency::new(Duration::from_secs(2));
        latency.record(Duration::from_secs(6));
        assert_eq!(latency.estimate(), Duration::from_secs(3));
        latency.record(Duration::from_secs(3));
        assert_eq!(latency.estimate(), Duration::from_secs(3));
    }

    #[test]
    fn reply_exposes_content() {
        assert_eq!(Reply::Immediate("a".into()).content(), "a");
        assert_eq!(Reply::Acknowledged("b".into()).content(), "b");
    }
}
