use std::time::Duration;

use reqwest::{Client, StatusCode};
use tracing::{debug, warn};
use url::Url;

use crate::config::{Config, QueryOptions};

/// Connect timeout for the search request.
const CONNECT_TIMEOUT: Duration = Duration::from_millis(15_000);
/// Read timeout for the search response body.
const READ_TIMEOUT: Duration = Duration::from_millis(10_000);

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// The request URL could not be built from the configured endpoint.
    #[error("invalid request URL: {0}")]
    UrlMalformed(#[from] url::ParseError),
    /// The server answered with something other than 200 OK.
    #[error("unexpected HTTP status {0}")]
    HttpStatus(StatusCode),
    /// Transport-level failure during connect or read.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

/// HTTP layer for the content-search API. Builds request URLs from the
/// configured endpoint plus the caller's query options and performs plain
/// GETs with bounded timeouts. No retries here; a failed call is reported
/// to the controller and stays failed until the next trigger.
pub struct NewsFetcher {
    client: Client,
    endpoint: String,
    query: String,
    api_key: String,
}

impl NewsFetcher {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let api_key = config.require_api_key()?;

        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .read_timeout(READ_TIMEOUT)
            .user_agent("TechNews/0.1")
            .build()?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            query: config.query.clone(),
            api_key,
        })
    }

    /// Build the full request URL: the fixed search parameters (contributor
    /// tags, topic query, API key) plus the two caller-controlled options.
    /// Nothing else is appended at this layer.
    pub fn request_url(&self, options: &QueryOptions) -> Result<Url, FetchError> {
        let mut url = Url::parse(&self.endpoint)?;
        url.query_pairs_mut()
            .append_pair("show-tags", "contributor")
            .append_pair("q", &self.query)
            .append_pair("api-key", &self.api_key)
            .append_pair("page-size", &options.page_size)
            .append_pair("orderby", &options.order_by);
        Ok(url)
    }

    /// Perform one GET and return the full response body as text.
    ///
    /// Success is exactly HTTP 200; any other status is an error carrying
    /// the code, with the body left unread. Connection and stream are
    /// released on every exit path by drop.
    pub async fn fetch_raw(&self, url: Url) -> Result<String, FetchError> {
        debug!("GET {}", redacted(&url));

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if status != StatusCode::OK {
            warn!("Search request failed with status {}", status);
            return Err(FetchError::HttpStatus(status));
        }

        let body = response.text().await?;
        Ok(body)
    }
}

// Keeps the api-key query value out of the logs.
fn redacted(url: &Url) -> String {
    let mut shown = url.clone();
    if url.query_pairs().any(|(name, _)| name == "api-key") {
        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(name, value)| {
                if name == "api-key" {
                    (name.into_owned(), "***".to_string())
                } else {
                    (name.into_owned(), value.into_owned())
                }
            })
            .collect();
        shown.query_pairs_mut().clear().extend_pairs(pairs);
    }
    shown.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn test_config(endpoint: &str) -> Config {
        Config::from_str(&format!(
            r#"
            endpoint = "{}"
            query = "technology article"
            page_size = "5"
            order_by = "newest"
            api_key = "test-key"
        "#,
            endpoint
        ))
        .unwrap()
    }

    #[test]
    fn test_request_url_appends_fixed_and_option_parameters() {
        let fetcher = NewsFetcher::new(&test_config("https://example.com/search")).unwrap();
        let url = fetcher.request_url(&QueryOptions::default()).unwrap();

        assert_eq!(url.host_str(), Some("example.com"));
        assert_eq!(url.path(), "/search");

        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("show-tags".to_string(), "contributor".to_string()),
                ("q".to_string(), "technology article".to_string()),
                ("api-key".to_string(), "test-key".to_string()),
                ("page-size".to_string(), "10".to_string()),
                ("orderby".to_string(), "newest".to_string()),
            ]
        );
    }

    #[test]
    fn test_request_url_passes_options_verbatim() {
        let fetcher = NewsFetcher::new(&test_config("https://example.com/search")).unwrap();
        let options = QueryOptions {
            page_size: "25".to_string(),
            order_by: "oldest".to_string(),
        };

        let url = fetcher.request_url(&options).unwrap();
        let query = url.query().unwrap();

        assert!(query.contains("page-size=25"));
        assert!(query.contains("orderby=oldest"));
    }

    #[test]
    fn test_request_url_rejects_malformed_endpoint() {
        let fetcher = NewsFetcher::new(&test_config("not a url")).unwrap();
        let result = fetcher.request_url(&QueryOptions::default());

        assert!(matches!(result, Err(FetchError::UrlMalformed(_))));
    }

    #[test]
    fn test_new_requires_api_key() {
        let config = Config::from_str(r#"endpoint = "https://example.com/search""#).unwrap();
        assert!(NewsFetcher::new(&config).is_err());
    }

    #[test]
    fn test_redacted_masks_api_key_only() {
        let url =
            Url::parse("https://example.com/search?q=tech&api-key=secret&page-size=10").unwrap();
        let shown = redacted(&url);

        assert!(!shown.contains("secret"));
        assert!(shown.contains("api-key=***"));
        assert!(shown.contains("q=tech"));
        assert!(shown.contains("page-size=10"));
    }
}
