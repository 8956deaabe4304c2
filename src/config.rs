use serde::Deserialize;
use std::path::Path;

/// Environment variable that supplies (or overrides) the API key, so the
/// credential never lives in a source literal.
pub const API_KEY_ENV: &str = "GUARDIAN_API_KEY";

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Base content-search endpoint
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Topic query sent with every request
    #[serde(default = "default_query")]
    pub query: String,
    #[serde(default = "default_page_size")]
    pub page_size: String,
    #[serde(default = "default_order_by")]
    pub order_by: String,
    /// Optional in-file key; the environment variable wins when both are set
    #[serde(default)]
    pub api_key: Option<String>,
}

fn default_endpoint() -> String {
    "https://content.guardianapis.com/search".to_string()
}

fn default_query() -> String {
    "technology article".to_string()
}

fn default_page_size() -> String {
    "10".to_string()
}

fn default_order_by() -> String {
    "newest".to_string()
}

/// Query options supplied by the preferences collaborator. Both values are
/// appended to the query string verbatim; a change notification makes the
/// list controller refetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryOptions {
    pub page_size: String,
    pub order_by: String,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            order_by: default_order_by(),
        }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&content)?;
        if let Ok(key) = std::env::var(API_KEY_ENV) {
            config.api_key = Some(key);
        }
        Ok(config)
    }

    /// Parse config from a TOML string (useful for testing)
    pub fn from_str(content: &str) -> anyhow::Result<Self> {
        let config: Config = toml::from_str(content)?;
        Ok(config)
    }

    /// The configured API key, or an error telling the operator where to
    /// put one.
    pub fn require_api_key(&self) -> anyhow::Result<String> {
        self.api_key.clone().ok_or_else(|| {
            anyhow::anyhow!(
                "no API key configured: set {} or add api_key to the config file",
                API_KEY_ENV
            )
        })
    }

    /// Default query options for a fresh start, before any preference
    /// change arrives.
    pub fn options(&self) -> QueryOptions {
        QueryOptions {
            page_size: self.page_size.clone(),
            order_by: self.order_by.clone(),
        }
    }
}
