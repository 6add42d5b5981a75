//! Text helpers shared by report builders.

use chrono::{DateTime, Utc};
use homewatch_traits::StatEntry;

fn plural(count: i64, unit: &str) -> String {
    if count == 1 {
        format!("1 {}", unit)
    } else {
        format!("{} {}s", count, unit)
    }
}

/// Human-readable distance from `now` to `at`: "in 3 hours", "2 days ago".
pub fn relative_time(now: DateTime<Utc>, at: DateTime<Utc>) -> String {
    let delta = at.signed_duration_since(now);
    let future = delta.num_seconds() >= 0;
    let magnitude = delta.abs();

    let amount = if magnitude.num_minutes() < 1 {
        return "now".to_string();
    } else if magnitude.num_hours() < 1 {
        plural(magnitude.num_minutes(), "minute")
    } else if magnitude.num_hours() < 48 {
        plural(magnitude.num_hours(), "hour")
    } else {
        plural(magnitude.num_days(), "day")
    };

    if future {
        format!("in {}", amount)
    } else {
        format!("{} ago", amount)
    }
}

/// Titled section of `name: count` lines, largest first, at most `limit` lines.
///
/// Returns `None` when there is nothing to list.
pub fn render_stat_section(title: &str, entries: &[StatEntry], limit: usize) -> Option<String> {
    if entries.is_empty() || limit == 0 {
        return None;
    }

    let mut sorted: Vec<&StatEntry> = entries.iter().collect();
    // Stable sort keeps source order among equal counts.
    sorted.sort_by(|a, b| b.count.cmp(&a.count));

    let mut section = format!("{}:", title);
    for entry in sorted.into_iter().take(limit) {
        section.push_str(&format!("\n- {}: {}", entry.name, entry.count));
    }
    Some(section)
}
