//! Windowed threshold classification.
//!
//! A facility lands in bucket `t` only while its remaining fuel is inside
//! `(t - window, t]`, where `window` is the check interval. A check running once per
//! interval therefore sees each downward crossing exactly once, without remembering
//! anything between runs. Running out of fuel is its own terminal bucket with the
//! same window below zero.

use crate::model::Facility;
use chrono::{DateTime, TimeDelta, Utc};
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::time::Duration;
use thiserror::Error;

/// Ordered with `Expired` first, then ascending hours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Bucket {
    Expired,
    Remaining { hours: u32 },
}

impl Bucket {
    pub fn header(&self) -> String {
        match self {
            Self::Expired => "⚠️ Fuel Alert: fuel depleted".to_string(),
            Self::Remaining { hours } => format!("⚠️ Fuel Alert: {hours}h remaining"),
        }
    }
}

impl Display for Bucket {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Expired => write!(f, "expired"),
            Self::Remaining { hours } => write!(f, "{hours}h"),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ThresholdError {
    #[error("at least one threshold is required")]
    Empty,
    #[error("thresholds must be greater than zero hours")]
    Zero,
    #[error("threshold {0}h is listed more than once")]
    Duplicate(u32),
    #[error("alert window must be greater than zero")]
    EmptyWindow,
    #[error("alert window {window} is out of range")]
    WindowOutOfRange { window: String },
    #[error("alert window {window} is wider than the {gap_hours}h gap below the {threshold}h threshold")]
    WindowTooWide {
        window: String,
        threshold: u32,
        gap_hours: u32,
    },
}

pub type Classified<'a> = BTreeMap<Bucket, Vec<&'a Facility>>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Thresholds {
    /// Ascending, distinct, non-zero.
    hours: Vec<u32>,
    window: TimeDelta,
}

impl Thresholds {
    /// Rejects configurations whose windows could overlap, so a facility can never
    /// satisfy two buckets at once.
    pub fn new(hours: &[u32], window: Duration) -> Result<Self, ThresholdError> {
        let mut sorted = hours.to_vec();
        sorted.sort_unstable();

        if sorted.is_empty() {
            return Err(ThresholdError::Empty);
        }
        if sorted[0] == 0 {
            return Err(ThresholdError::Zero);
        }
        if let Some(pair) = sorted.windows(2).find(|pair| pair[0] == pair[1]) {
            return Err(ThresholdError::Duplicate(pair[0]));
        }
        if window.is_zero() {
            return Err(ThresholdError::EmptyWindow);
        }

        let pretty = humantime::format_duration(window).to_string();
        let delta = TimeDelta::from_std(window).map_err(|_| ThresholdError::WindowOutOfRange {
            window: pretty.clone(),
        })?;

        let mut below = 0;
        for &threshold in &sorted {
            let gap_hours = threshold - below;
            if delta > TimeDelta::hours(i64::from(gap_hours)) {
                return Err(ThresholdError::WindowTooWide {
                    window: pretty,
                    threshold,
                    gap_hours,
                });
            }
            below = threshold;
        }

        Ok(Self {
            hours: sorted,
            window: delta,
        })
    }

    pub fn hours(&self) -> &[u32] {
        &self.hours
    }

    pub fn classify(&self, now: DateTime<Utc>, expires_at: DateTime<Utc>) -> Option<Bucket> {
        let left = expires_at - now;

        if left <= TimeDelta::zero() {
            return (left > -self.window).then_some(Bucket::Expired);
        }

        self.hours
            .iter()
            .copied()
            .find(|&hours| {
                let boundary = TimeDelta::hours(i64::from(hours));
                left <= boundary && left > boundary - self.window
            })
            .map(|hours| Bucket::Remaining { hours })
    }

    /// Groups tracked facilities by bucket, keeping input order inside each bucket.
    pub fn classify_all<'a>(&self, now: DateTime<Utc>, facilities: &'a [Facility]) -> Classified<'a> {
        let mut buckets: Classified<'a> = BTreeMap::new();
        for facility in facilities {
            let Some(expires_at) = facility.fuel_expires_at else {
                continue;
            };
            if let Some(bucket) = self.classify(now, expires_at) {
                buckets.entry(bucket).or_default().push(facility);
            }
        }
        buckets
    }
}
