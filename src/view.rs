use chrono::{DateTime, Utc};

use crate::model::NewsItem;

/// Render the upstream publication instant the way the list shows it,
/// e.g. `Tue, Mar 5, '24`. Input that does not parse falls back to the
/// current time rather than erroring.
pub fn format_published(raw: &str) -> String {
    let instant = DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now());
    instant.format("%a, %b %-d, '%y").to_string()
}

pub fn render_item(item: &NewsItem) -> String {
    format!(
        "[{}] {}\n    {} | {}\n    {}",
        item.section,
        item.title,
        format_published(&item.published),
        item.author,
        item.url
    )
}

pub fn render_list(items: &[NewsItem]) -> String {
    items
        .iter()
        .map(render_item)
        .collect::<Vec<_>>()
        .join("\n\n")
}
