use crate::alerts::AlertBatch;
use crate::notify::{DeliveryError, Notifier};
use crate::thresholds::Bucket;
use tracing::{error, info};

#[derive(Debug, Default)]
pub struct DispatchOutcome {
    pub delivered: Vec<Bucket>,
    pub failed: Vec<(Bucket, DeliveryError)>,
}

impl DispatchOutcome {
    pub fn any_delivered(&self) -> bool {
        !self.delivered.is_empty()
    }

    pub fn attempted(&self) -> usize {
        self.delivered.len() + self.failed.len()
    }
}

/// Sends each non-empty batch as its own unit, in the order given.
///
/// A failed chunk stops the rest of that batch only; later batches are still tried.
pub async fn dispatch<N: Notifier>(notifier: &N, batches: &[AlertBatch], max_len: usize) -> DispatchOutcome {
    let mut outcome = DispatchOutcome::default();

    for batch in batches.iter().filter(|b| !b.is_empty()) {
        match deliver_batch(notifier, batch, max_len).await {
            Ok(()) => {
                info!(bucket = %batch.bucket, count = batch.messages.len(), "delivered fuel alert batch");
                outcome.delivered.push(batch.bucket);
            }
            Err(e) => {
                error!(bucket = %batch.bucket, error = %e, "❌ failed to deliver fuel alert batch");
                outcome.failed.push((batch.bucket, e));
            }
        }
    }

    outcome
}

async fn deliver_batch<N: Notifier>(notifier: &N, batch: &AlertBatch, max_len: usize) -> Result<(), DeliveryError> {
    for chunk in batch.render(max_len) {
        notifier.deliver(&chunk).await?;
    }
    Ok(())
}
