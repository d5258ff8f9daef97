use crate::alerts::build_batches;
use crate::dispatch::{DispatchOutcome, dispatch};
use crate::model::{Facility, NameBook};
use crate::notify::Notifier;
use crate::source::FacilityApi;
use crate::thresholds::Thresholds;
use chrono::{DateTime, Utc};
use shared::esi::{AccessToken, EsiError, SsoError};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum AcquireError {
    #[error("credential failure: {0}")]
    Credential(#[from] SsoError),
    #[error("data fetch failure: {0}")]
    Fetch(#[from] EsiError),
}

#[derive(Debug, Error)]
pub enum CheckError {
    #[error(transparent)]
    Acquire(#[from] AcquireError),
    #[error("{failed} of {attempted} alert batches could not be delivered")]
    Delivery { failed: usize, attempted: usize },
}

/// Everything fetched for one run.
#[derive(Debug)]
pub struct Acquired {
    pub token: AccessToken,
    pub facilities: Vec<Facility>,
}

#[derive(Debug)]
pub struct CheckOutcome {
    pub tracked: usize,
    pub dispatch: DispatchOutcome,
}

impl CheckOutcome {
    pub fn alerts_sent(&self) -> bool {
        self.dispatch.any_delivered()
    }
}

/// Credential, organization, then facility list. Any failure aborts before a single
/// alert is composed.
pub async fn acquire<A: FacilityApi>(api: &A) -> Result<Acquired, AcquireError> {
    let token = api.authenticate().await?;
    let organization_id = api.organization_id(&token).await?;
    let facilities: Vec<Facility> = api
        .facilities(&token, organization_id)
        .await?
        .into_iter()
        .map(Facility::from_dto)
        .collect();

    debug!(organization_id, count = facilities.len(), "acquired facilities");
    Ok(Acquired { token, facilities })
}

pub async fn run_check<A: FacilityApi, N: Notifier>(
    api: &A,
    notifier: &N,
    thresholds: &Thresholds,
    max_message_len: usize,
    now: DateTime<Utc>,
) -> Result<CheckOutcome, CheckError> {
    let Acquired { token, facilities } = acquire(api).await?;
    let tracked = facilities.iter().filter(|f| f.is_tracked()).count();

    let classified = thresholds.classify_all(now, &facilities);
    let alerted: Vec<&Facility> = classified.values().flatten().copied().collect();
    let names = NameBook::resolve(api, &token, alerted).await;
    let batches = build_batches(&classified, &names, now);

    let outcome = dispatch(notifier, &batches, max_message_len).await;
    if !outcome.failed.is_empty() {
        return Err(CheckError::Delivery {
            failed: outcome.failed.len(),
            attempted: outcome.attempted(),
        });
    }

    if outcome.any_delivered() {
        info!(batches = outcome.delivered.len(), tracked, "✅ Fuel alerts sent to Discord.");
    } else {
        info!(tracked, "✅ No alerts needed. All structures have sufficient fuel.");
    }

    Ok(CheckOutcome {
        tracked,
        dispatch: outcome,
    })
}
