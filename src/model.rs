use serde::{Deserialize, Serialize};

/// One technology news article, as handed to the presentation layer.
///
/// All five fields are set when the parser builds the value and are never
/// mutated afterward. Comparison is by value only; there is no separate
/// identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsItem {
    /// Topical category. Empty string tolerated.
    pub section: String,
    /// Headline text.
    pub title: String,
    /// Source-provided publication date, kept as opaque text. Display
    /// formatting is a view concern (see `view::format_published`).
    pub published: String,
    /// First contributor's display name, or `"Author: unknown"` when the
    /// upstream tag list is empty.
    pub author: String,
    /// Absolute external link, handed verbatim to the open-link intent.
    pub url: String,
}
