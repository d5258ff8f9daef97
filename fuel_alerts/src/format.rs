use crate::model::{Facility, NameBook};
use chrono::{DateTime, TimeDelta, Utc};

const SECONDS_PER_HOUR: i64 = 3600;

/// Renders the alert body for one facility. Same inputs, same bytes.
///
/// ```text
/// **Jita - Keepstar** (Keepstar)
/// System: Jita
/// Fuel remaining: 23h 59m
/// Alerted at: 2024-05-01 13:00 UTC
/// ```
pub fn format_message(facility: &Facility, names: &NameBook, now: DateTime<Utc>) -> String {
    format!(
        "{}\nAlerted at: {}",
        format_listing_entry(facility, names, now),
        format_timestamp(now),
    )
}

/// The alert body without its `Alerted at` line, for listings whose header already
/// carries the timestamp.
pub fn format_listing_entry(facility: &Facility, names: &NameBook, now: DateTime<Utc>) -> String {
    let fuel_line = match facility.fuel_expires_at {
        None => "Fuel remaining: unknown".to_string(),
        Some(expires_at) => {
            let left = expires_at - now;
            if left > TimeDelta::zero() {
                format!("Fuel remaining: {}", format_hours_minutes(left))
            } else {
                format!("Fuel expired: {} ago", format_hours_minutes(-left))
            }
        }
    };

    format!(
        "**{}** ({})\nSystem: {}\n{fuel_line}",
        facility.display_name(),
        names.type_name(facility.type_id),
        names.location(facility.location_id),
    )
}

/// Whole hours and minutes, both floored. Sub-minute remainders are dropped.
pub fn format_hours_minutes(duration: TimeDelta) -> String {
    let total = duration.num_seconds().max(0);
    let hours = total / SECONDS_PER_HOUR;
    let minutes = (total % SECONDS_PER_HOUR) / 60;
    format!("{hours}h {minutes}m")
}

pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d %H:%M UTC").to_string()
}

/// Packs `header` and `entries` into as few messages as possible, separated by blank
/// lines, each at most `max_len` characters. Splits only between entries; a single
/// entry that cannot fit on its own is cut and marked with `…`.
pub fn chunk_entries(header: &str, entries: &[String], max_len: usize) -> Vec<String> {
    const SEPARATOR: &str = "\n\n";

    let mut chunks = Vec::new();
    let mut current = truncate(header, max_len);
    let mut current_len = current.chars().count();

    for entry in entries {
        let entry_len = entry.chars().count();
        if current_len + SEPARATOR.len() + entry_len <= max_len {
            current.push_str(SEPARATOR);
            current.push_str(entry);
            current_len += SEPARATOR.len() + entry_len;
            continue;
        }

        chunks.push(std::mem::take(&mut current));
        current = truncate(entry, max_len);
        current_len = current.chars().count();
    }

    chunks.push(current);
    chunks
}

fn truncate(text: &str, max_len: usize) -> String {
    if text.chars().count() <= max_len {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(max_len.saturating_sub(1)).collect();
    cut.push('…');
    cut
}
