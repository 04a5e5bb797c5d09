use crate::error::CrawlError;
use crate::retry::{MAX_BACKOFF_BASE, RetryPolicy};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use url::Url;

/// Configuration for a career-site crawl
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlConfig {
    /// URL to start crawling from
    pub start_url: String,

    /// Levels of links followed below the start page
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    /// Job links followed from each page
    #[serde(default = "default_max_breadth")]
    pub max_breadth: usize,

    /// URL for the WebDriver instance
    #[serde(default = "default_webdriver_url")]
    pub webdriver_url: String,

    /// Seconds to wait for a page to become ready
    #[serde(default = "default_page_load_timeout_secs")]
    pub page_load_timeout_secs: u64,

    /// Milliseconds to pause after a page is ready
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,

    /// Only extract postings from pages with an "apply" button or link
    #[serde(default = "default_require_apply_button")]
    pub require_apply_button: bool,

    /// Maximum characters of page text per extraction request
    #[serde(default = "default_max_chunk_chars")]
    pub max_chunk_chars: usize,

    /// Regex patterns for candidate links to drop before classification
    #[serde(default)]
    pub exclude_patterns: Vec<String>,

    /// Retry policy for browser connections and page loads
    #[serde(default = "RetryPolicy::browser")]
    pub browser_retry: RetryPolicy,

    /// Retry policy for language model calls
    #[serde(default = "RetryPolicy::oracle")]
    pub oracle_retry: RetryPolicy,

    /// Language model settings
    #[serde(default)]
    pub oracle: OracleConfig,
}

/// Settings for the OpenAI-compatible language model endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OracleConfig {
    /// API base URL (default: https://api.openai.com)
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Bearer token for the API
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,

    /// Model identifier
    #[serde(default = "default_model")]
    pub model: String,

    /// Sampling temperature, zero for deterministic answers
    #[serde(default)]
    pub temperature: f32,

    /// HTTP timeout in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_max_depth() -> usize {
    3
}

fn default_max_breadth() -> usize {
    3
}

fn default_webdriver_url() -> String {
    "http://localhost:4444".to_string()
}

fn default_page_load_timeout_secs() -> u64 {
    20
}

fn default_settle_delay_ms() -> u64 {
    1000
}

fn default_require_apply_button() -> bool {
    true
}

fn default_max_chunk_chars() -> usize {
    12000
}

fn default_endpoint() -> String {
    "https://api.openai.com".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_request_timeout_secs() -> u64 {
    120
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            api_key: None,
            model: default_model(),
            temperature: 0.0,
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl CrawlConfig {
    /// Create a new configuration with default values
    pub fn new(start_url: &str) -> Self {
        Self {
            start_url: start_url.to_string(),
            max_depth: default_max_depth(),
            max_breadth: default_max_breadth(),
            webdriver_url: default_webdriver_url(),
            page_load_timeout_secs: default_page_load_timeout_secs(),
            settle_delay_ms: default_settle_delay_ms(),
            require_apply_button: default_require_apply_button(),
            max_chunk_chars: default_max_chunk_chars(),
            exclude_patterns: Vec::new(),
            browser_retry: RetryPolicy::browser(),
            oracle_retry: RetryPolicy::oracle(),
            oracle: OracleConfig::default(),
        }
    }

    /// Load configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, CrawlError> {
        let mut file = File::open(path)?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;

        Self::from_json(&contents)
    }

    /// Load configuration from a JSON string
    pub fn from_json(json: &str) -> Result<Self, CrawlError> {
        let config: Self = serde_json::from_str(json)?;
        Ok(config)
    }

    /// Apply environment variable overrides.
    ///
    /// Supported env vars:
    /// - `WEBDRIVER_URL`: WebDriver server address
    /// - `OPENAI_API_KEY`: API key for the language model
    /// - `OPENAI_MODEL`: model identifier
    /// - `OPENAI_BASE_URL`: API base URL
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(val) = non_empty_env("WEBDRIVER_URL") {
            self.webdriver_url = val;
        }
        if let Some(val) = non_empty_env("OPENAI_API_KEY") {
            self.oracle.api_key = Some(val);
        }
        if let Some(val) = non_empty_env("OPENAI_MODEL") {
            self.oracle.model = val;
        }
        if let Some(val) = non_empty_env("OPENAI_BASE_URL") {
            self.oracle.endpoint = val;
        }
        self
    }

    /// Check the configuration before starting a crawl
    pub fn validate(&self) -> Result<(), CrawlError> {
        Url::parse(&self.start_url).map_err(|source| CrawlError::InvalidUrl {
            url: self.start_url.clone(),
            source,
        })?;

        for (name, policy) in [
            ("browser_retry", &self.browser_retry),
            ("oracle_retry", &self.oracle_retry),
        ] {
            if policy.max_attempts == 0 {
                return Err(CrawlError::Config(format!(
                    "{}.max_attempts must be at least 1",
                    name
                )));
            }
            if policy.backoff_base.is_nan()
                || policy.backoff_base <= 0.0
                || policy.backoff_base > MAX_BACKOFF_BASE
            {
                return Err(CrawlError::Config(format!(
                    "{}.backoff_base must be in (0, {}]",
                    name, MAX_BACKOFF_BASE
                )));
            }
        }

        for pattern in &self.exclude_patterns {
            Regex::new(pattern).map_err(|e| {
                CrawlError::Config(format!("invalid exclude pattern {:?}: {}", pattern, e))
            })?;
        }

        Ok(())
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|val| !val.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = CrawlConfig::new("https://example.com/careers");
        assert_eq!(config.max_depth, 3);
        assert_eq!(config.max_breadth, 3);
        assert_eq!(config.webdriver_url, "http://localhost:4444");
        assert_eq!(config.page_load_timeout_secs, 20);
        assert_eq!(config.browser_retry.max_attempts, 3);
        assert_eq!(config.browser_retry.backoff_base, 2.0);
        assert_eq!(config.oracle_retry.max_attempts, 2);
        assert_eq!(config.oracle_retry.backoff_base, 1.0);
        assert_eq!(config.oracle.temperature, 0.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_json_fills_defaults() {
        let config = CrawlConfig::from_json(
            r#"{
                "start_url": "https://example.com/careers",
                "max_depth": 1,
                "oracle": {"model": "gpt-4"},
                "oracle_retry": {"max_attempts": 4, "backoff_base": 1.5}
            }"#,
        )
        .unwrap();

        assert_eq!(config.max_depth, 1);
        assert_eq!(config.max_breadth, 3);
        assert_eq!(config.oracle.model, "gpt-4");
        assert_eq!(config.oracle.endpoint, "https://api.openai.com");
        assert_eq!(config.oracle_retry.max_attempts, 4);
        assert!(config.require_apply_button);
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"start_url": "https://example.com/jobs", "max_breadth": 7}}"#
        )
        .unwrap();

        let config = CrawlConfig::from_file(file.path()).unwrap();
        assert_eq!(config.start_url, "https://example.com/jobs");
        assert_eq!(config.max_breadth, 7);
    }

    #[test]
    fn test_missing_file() {
        let err = CrawlConfig::from_file("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, CrawlError::Io(_)));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let config = CrawlConfig::new("not a url");
        assert!(matches!(
            config.validate(),
            Err(CrawlError::InvalidUrl { .. })
        ));

        let mut config = CrawlConfig::new("https://example.com");
        config.browser_retry.max_attempts = 0;
        assert!(matches!(config.validate(), Err(CrawlError::Config(_))));

        let mut config = CrawlConfig::new("https://example.com");
        config.oracle_retry.backoff_base = 0.0;
        assert!(matches!(config.validate(), Err(CrawlError::Config(_))));

        let mut config = CrawlConfig::new("https://example.com");
        config.browser_retry = RetryPolicy::new(3, 1e20);
        assert!(matches!(config.validate(), Err(CrawlError::Config(_))));

        let mut config = CrawlConfig::new("https://example.com");
        config.exclude_patterns = vec!["[".to_string()];
        assert!(matches!(config.validate(), Err(CrawlError::Config(_))));
    }

    #[test]
    fn test_api_key_is_not_serialized() {
        let mut config = CrawlConfig::new("https://example.com");
        config.oracle.api_key = Some("sk-secret".to_string());
        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("sk-secret"));
    }
}
