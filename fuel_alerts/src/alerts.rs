use crate::format::{chunk_entries, format_message};
use crate::model::NameBook;
use crate::thresholds::{Bucket, Classified};
use chrono::{DateTime, Utc};

/// All facilities that fell into one bucket this run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertBatch {
    pub bucket: Bucket,
    pub messages: Vec<String>,
}

impl AlertBatch {
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Header line followed by each message, blank-line separated, split to fit
    /// `max_len` when needed.
    pub fn render(&self, max_len: usize) -> Vec<String> {
        chunk_entries(&self.bucket.header(), &self.messages, max_len)
    }
}

/// One batch per non-empty bucket, in bucket order.
pub fn build_batches(classified: &Classified<'_>, names: &NameBook, now: DateTime<Utc>) -> Vec<AlertBatch> {
    classified
        .iter()
        .filter(|(_, facilities)| !facilities.is_empty())
        .map(|(&bucket, facilities)| AlertBatch {
            bucket,
            messages: facilities
                .iter()
                .map(|facility| format_message(facility, names, now))
                .collect(),
        })
        .collect()
}
