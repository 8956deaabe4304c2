use serde::Deserialize;
use tracing::warn;

use crate::model::NewsItem;

/// Display name synthesized when a record carries no contributor tag.
pub const UNKNOWN_AUTHOR: &str = "Author: unknown";

// Upstream search envelope: { "response": { "results": [ ... ] } }.
// Records are kept as raw values so that one malformed record can be
// skipped without discarding the rest of the response.
#[derive(Debug, Deserialize)]
struct SearchEnvelope {
    response: SearchResponse,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawResult {
    section_name: String,
    web_title: String,
    web_publication_date: String,
    #[serde(default)]
    tags: Vec<RawTag>,
    web_url: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTag {
    web_title: String,
}

impl RawResult {
    fn into_news_item(self) -> NewsItem {
        let RawResult {
            section_name,
            web_title,
            web_publication_date,
            tags,
            web_url,
        } = self;

        let author = tags
            .into_iter()
            .next()
            .map(|tag| tag.web_title)
            .unwrap_or_else(|| UNKNOWN_AUTHOR.to_string());

        NewsItem {
            section: section_name,
            title: web_title,
            published: web_publication_date,
            author,
            url: web_url,
        }
    }
}

/// Map a raw search response body onto a list of news items.
///
/// This never fails to the caller: a missing or blank body yields an empty
/// list, an unparseable envelope yields an empty list, and a record missing
/// required keys is skipped while the remaining records are still produced.
/// Output order equals the order of the upstream `results` array.
pub fn parse(raw: Option<&str>) -> Vec<NewsItem> {
    let body = match raw {
        Some(text) if !text.trim().is_empty() => text,
        _ => return Vec::new(),
    };

    let envelope: SearchEnvelope = match serde_json::from_str(body) {
        Ok(envelope) => envelope,
        Err(e) => {
            warn!("Discarding unparseable search response: {}", e);
            return Vec::new();
        }
    };

    let mut items = Vec::with_capacity(envelope.response.results.len());
    for (index, record) in envelope.response.results.into_iter().enumerate() {
        match serde_json::from_value::<RawResult>(record) {
            Ok(result) => items.push(result.into_news_item()),
            Err(e) => warn!("Skipping malformed result at index {}: {}", index, e),
        }
    }

    items
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(title: &str, authors: &[&str]) -> serde_json::Value {
        json!({
            "sectionName": "Technology",
            "webTitle": title,
            "webPublicationDate": "2024-03-05T10:30:00Z",
            "tags": authors
                .iter()
                .map(|a| json!({ "webTitle": a }))
                .collect::<Vec<_>>(),
            "webUrl": format!("https://example.com/{}", title),
        })
    }

    fn envelope(results: Vec<serde_json::Value>) -> String {
        json!({ "response": { "results": results } }).to_string()
    }

    #[test]
    fn test_parse_preserves_count_and_order() {
        let body = envelope(vec![
            record("first", &["Alice"]),
            record("second", &["Bob"]),
            record("third", &["Carol"]),
        ]);

        let items = parse(Some(&body));

        assert_eq!(items.len(), 3);
        assert_eq!(items[0].title, "first");
        assert_eq!(items[1].title, "second");
        assert_eq!(items[2].title, "third");
    }

    #[test]
    fn test_parse_maps_all_fields() {
        let body = envelope(vec![record("headline", &["Jane Doe", "Second Tag"])]);

        let items = parse(Some(&body));

        assert_eq!(items.len(), 1);
        let item = &items[0];
        assert_eq!(item.section, "Technology");
        assert_eq!(item.title, "headline");
        assert_eq!(item.published, "2024-03-05T10:30:00Z");
        // Only the first contributor tag is used
        assert_eq!(item.author, "Jane Doe");
        assert_eq!(item.url, "https://example.com/headline");
    }

    #[test]
    fn test_empty_tags_synthesize_unknown_author() {
        let body = envelope(vec![record("untagged", &[])]);

        let items = parse(Some(&body));

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].author, UNKNOWN_AUTHOR);
    }

    #[test]
    fn test_missing_tags_key_synthesizes_unknown_author() {
        let body = envelope(vec![json!({
            "sectionName": "Technology",
            "webTitle": "no tags key",
            "webPublicationDate": "2024-03-05T10:30:00Z",
            "webUrl": "https://example.com/no-tags",
        })]);

        let items = parse(Some(&body));

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].author, UNKNOWN_AUTHOR);
    }

    #[test]
    fn test_none_body_yields_empty_list() {
        assert!(parse(None).is_empty());
    }

    #[test]
    fn test_blank_body_yields_empty_list() {
        assert!(parse(Some("")).is_empty());
        assert!(parse(Some("   \n")).is_empty());
    }

    #[test]
    fn test_unparseable_body_yields_empty_list() {
        assert!(parse(Some("this is not json {{{")).is_empty());
    }

    #[test]
    fn test_missing_envelope_keys_yield_empty_list() {
        assert!(parse(Some(r#"{"unexpected": true}"#)).is_empty());
    }

    #[test]
    fn test_missing_results_array_yields_empty_list() {
        assert!(parse(Some(r#"{"response": {}}"#)).is_empty());
    }

    #[test]
    fn test_empty_results_array_yields_empty_list() {
        let body = envelope(vec![]);
        assert!(parse(Some(&body)).is_empty());
    }

    #[test]
    fn test_malformed_record_is_skipped_not_fatal() {
        let body = envelope(vec![
            record("good", &["Alice"]),
            json!({ "webTitle": "missing everything else" }),
            record("also good", &[]),
        ]);

        let items = parse(Some(&body));

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].title, "good");
        assert_eq!(items[1].title, "also good");
        assert_eq!(items[1].author, UNKNOWN_AUTHOR);
    }
}
