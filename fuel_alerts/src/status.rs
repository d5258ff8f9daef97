use crate::check::{AcquireError, Acquired, acquire};
use crate::format::{chunk_entries, format_listing_entry, format_timestamp};
use crate::model::{Facility, NameBook};
use crate::source::FacilityApi;
use chrono::{DateTime, Utc};

/// Every tracked facility, soonest expiry first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusReport {
    pub generated_at: DateTime<Utc>,
    pub entries: Vec<String>,
}

impl StatusReport {
    /// Formats tracked facilities only; ties keep input order.
    pub fn from_facilities(facilities: &[Facility], names: &NameBook, now: DateTime<Utc>) -> Self {
        let mut tracked: Vec<&Facility> = facilities.iter().filter(|f| f.is_tracked()).collect();
        tracked.sort_by_key(|f| f.fuel_expires_at);

        Self {
            generated_at: now,
            entries: tracked
                .into_iter()
                .map(|facility| format_listing_entry(facility, names, now))
                .collect(),
        }
    }

    pub fn header(&self) -> String {
        format!(
            "⛽ Fuel status for {} structure{} ({})",
            self.entries.len(),
            if self.entries.len() == 1 { "" } else { "s" },
            format_timestamp(self.generated_at),
        )
    }

    pub fn render_full(&self) -> String {
        if self.entries.is_empty() {
            return self.empty_message();
        }
        std::iter::once(self.header())
            .chain(self.entries.iter().cloned())
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Single message for a synchronous reply: the first `max_entries` entries that fit
    /// in `max_len`, with a footer counting the rest.
    pub fn render_truncated(&self, max_entries: usize, max_len: usize) -> String {
        if self.entries.is_empty() {
            return self.empty_message();
        }

        let header = self.header();
        let mut shown = self.entries.len().min(max_entries);
        loop {
            let rendered = self.render_first(&header, shown);
            if rendered.chars().count() <= max_len || shown == 0 {
                return rendered;
            }
            shown -= 1;
        }
    }

    /// The full listing split into channel-sized messages.
    pub fn render_chunks(&self, max_len: usize) -> Vec<String> {
        if self.entries.is_empty() {
            return vec![self.empty_message()];
        }
        chunk_entries(&self.header(), &self.entries, max_len)
    }

    fn render_first(&self, header: &str, shown: usize) -> String {
        let mut parts = Vec::with_capacity(shown + 2);
        parts.push(header.to_string());
        parts.extend(self.entries.iter().take(shown).cloned());
        let hidden = self.entries.len() - shown;
        if hidden > 0 {
            parts.push(format!("…and {hidden} more"));
        }
        parts.join("\n\n")
    }

    fn empty_message(&self) -> String {
        format!(
            "⛽ No structures with tracked fuel ({})",
            format_timestamp(self.generated_at)
        )
    }
}

/// Fetches everything fresh; nothing is shared with the scheduled path.
pub async fn build_status_report<A: FacilityApi>(api: &A, now: DateTime<Utc>) -> Result<StatusReport, AcquireError> {
    let Acquired { token, facilities } = acquire(api).await?;
    let tracked: Vec<&Facility> = facilities.iter().filter(|f| f.is_tracked()).collect();
    let names = NameBook::resolve(api, &token, tracked).await;
    Ok(StatusReport::from_facilities(&facilities, &names, now))
}
