#![allow(async_fn_in_trait)]

// Re-export modules
pub mod config;
pub mod crawler;
pub mod driver;
pub mod error;
pub mod export;
pub mod extract;
pub mod filter;
pub mod harvest;
pub mod oracle;
pub mod parsers;
pub mod prioritize;
pub mod results;
pub mod retry;

#[cfg(test)]
mod testing;

// Re-export commonly used types for convenience
pub use config::{CrawlConfig, OracleConfig};
pub use crawler::{Crawler, PageHarvest, VisitOutcome};
pub use error::CrawlError;
pub use results::{CrawlResult, ElementKind, JobPosting, LinkRecord, VisitRecord, VisitState};
pub use retry::RetryPolicy;

use driver::WebDriverBrowser;
use extract::PostingExtractor;
use filter::LinkFilter;
use oracle::{OpenAiOracle, OracleClient};
use parsers::HtmlTextNormalizer;
use std::time::Duration;

/// Main builder for crawling a career site with a WebDriver browser and an
/// OpenAI-compatible language model
pub struct CareerCrawl {
    config: CrawlConfig,
}

impl CareerCrawl {
    /// Create a builder for `start_url`, applying environment overrides
    pub fn new(start_url: &str) -> Self {
        Self {
            config: CrawlConfig::new(start_url).with_env_overrides(),
        }
    }

    /// Create a builder from a complete configuration
    pub fn from_config(config: CrawlConfig) -> Self {
        Self { config }
    }

    /// Levels of job links followed below the start page
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.config.max_depth = max_depth;
        self
    }

    /// Job links followed from each page
    pub fn with_max_breadth(mut self, max_breadth: usize) -> Self {
        self.config.max_breadth = max_breadth;
        self
    }

    /// Use every setting from `config`, keeping this builder's start URL
    pub fn with_config(mut self, config: CrawlConfig) -> Self {
        let start_url = std::mem::take(&mut self.config.start_url);
        self.config = CrawlConfig { start_url, ..config };
        self
    }

    /// Load settings from a JSON file
    pub fn with_config_file(self, path: impl AsRef<std::path::Path>) -> Result<Self, CrawlError> {
        let config = CrawlConfig::from_file(path)?;
        Ok(self.with_config(config))
    }

    /// Load settings from a JSON string
    pub fn with_config_str(self, config_str: &str) -> Result<Self, CrawlError> {
        let config = CrawlConfig::from_json(config_str)?;
        Ok(self.with_config(config))
    }

    pub fn config(&self) -> &CrawlConfig {
        &self.config
    }

    /// Run the crawl to completion.
    ///
    /// Fails only on invalid configuration; pages that cannot be crawled are
    /// recorded in [`CrawlResult::visits`].
    pub async fn run(self) -> Result<CrawlResult, CrawlError> {
        let config = self.config;
        config.validate()?;

        let filter = LinkFilter::new(&config.exclude_patterns)
            .map_err(|e| CrawlError::Config(format!("invalid exclude pattern: {}", e)))?;

        let browser = WebDriverBrowser::new(&config.webdriver_url)
            .with_page_load_timeout(Duration::from_secs(config.page_load_timeout_secs))
            .with_settle_delay(Duration::from_millis(config.settle_delay_ms));

        let oracle =
            OracleClient::new(OpenAiOracle::new(config.oracle.clone())?).with_retry(config.oracle_retry);

        let extractor = PostingExtractor::new(HtmlTextNormalizer)
            .with_max_chunk_chars(config.max_chunk_chars)
            .with_apply_button_required(config.require_apply_button);

        let crawler = Crawler::new(browser, oracle, HtmlTextNormalizer)
            .with_max_depth(config.max_depth)
            .with_max_breadth(config.max_breadth)
            .with_link_filter(filter)
            .with_browser_retry(config.browser_retry)
            .with_posting_extractor(extractor);

        Ok(crawler.crawl(&config.start_url).await)
    }
}
