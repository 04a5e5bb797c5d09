use crate::driver::{PageDriver, PageSession};
use crate::error::CrawlError;
use crate::extract::PostingExtractor;
use crate::filter::{LinkFilter, remove_fragment};
use crate::harvest::harvest_candidates;
use crate::oracle::{OracleClient, TextOracle};
use crate::parsers::TextNormalizer;
use crate::prioritize::{identify_job_links, order_by_likelihood};
use crate::results::{CrawlResult, JobPosting, LinkRecord, VisitRecord, VisitState};
use crate::retry::RetryPolicy;
use std::collections::HashSet;

/// What one successfully visited page produced
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageHarvest {
    /// Job links, most likely first
    pub job_links: Vec<LinkRecord>,
    pub postings: Vec<JobPosting>,
}

/// Result of visiting one node
#[derive(Debug)]
pub enum VisitOutcome {
    Succeeded(PageHarvest),
    Failed(CrawlError),
}

/// Mutable state of one top-level crawl
#[derive(Debug, Default)]
struct CrawlState {
    visited: HashSet<String>,
    result: CrawlResult,
}

impl CrawlState {
    /// Marks `url` visited, returning false when it already was
    fn mark_visited(&mut self, url: &str) -> bool {
        self.visited.insert(url.to_string())
    }

    fn record(&mut self, url: &str, depth_remaining: usize, state: VisitState) {
        self.result.visits.push(VisitRecord {
            url: url.to_string(),
            depth_remaining,
            state,
        });
    }
}

/// Crawl controller over a page driver and a language model
pub struct Crawler<D, O, N> {
    driver: D,
    oracle: OracleClient<O>,
    extractor: PostingExtractor<N>,
    filter: LinkFilter,
    browser_retry: RetryPolicy,
    max_depth: usize,
    max_breadth: usize,
}

impl<D, O, N> Crawler<D, O, N>
where
    D: PageDriver,
    O: TextOracle,
    N: TextNormalizer,
{
    pub fn new(driver: D, oracle: OracleClient<O>, normalizer: N) -> Self {
        Self {
            driver,
            oracle,
            extractor: PostingExtractor::new(normalizer),
            filter: LinkFilter::default(),
            browser_retry: RetryPolicy::browser(),
            max_depth: 3,
            max_breadth: 3,
        }
    }

    /// Levels of job links followed below the start page
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Job links followed from each page
    pub fn with_max_breadth(mut self, max_breadth: usize) -> Self {
        self.max_breadth = max_breadth;
        self
    }

    pub fn with_link_filter(mut self, filter: LinkFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Retry policy for session connects and page loads
    pub fn with_browser_retry(mut self, retry: RetryPolicy) -> Self {
        self.browser_retry = retry;
        self
    }

    pub fn with_posting_extractor(mut self, extractor: PostingExtractor<N>) -> Self {
        self.extractor = extractor;
        self
    }

    /// Crawls depth first from `start_url`.
    ///
    /// Links and postings are concatenated in visit order, each page's own
    /// results before those of its subtree. Never fails: pages that cannot be
    /// visited are logged and recorded as failed visits.
    pub async fn crawl(&self, start_url: &str) -> CrawlResult {
        ::log::info!(
            "Starting crawl at {} (max depth {}, max breadth {})",
            start_url,
            self.max_depth,
            self.max_breadth
        );

        let mut state = CrawlState::default();
        let mut pending = vec![(remove_fragment(start_url), self.max_depth)];

        while let Some((url, depth_remaining)) = pending.pop() {
            if !state.mark_visited(&url) {
                ::log::debug!("Skipping already visited {}", url);
                state.record(&url, depth_remaining, VisitState::Skipped);
                continue;
            }

            ::log::info!("Visiting {} (depth remaining {})", url, depth_remaining);
            let harvest = match self.visit(&url).await {
                VisitOutcome::Succeeded(harvest) => harvest,
                VisitOutcome::Failed(e) => {
                    ::log::error!("Error crawling {}: {:?}", url, e);
                    state.record(&url, depth_remaining, VisitState::Failed);
                    continue;
                }
            };

            ::log::info!(
                "Found {} job links and {} postings on {}",
                harvest.job_links.len(),
                harvest.postings.len(),
                url
            );
            state.record(&url, depth_remaining, VisitState::Succeeded);

            if depth_remaining > 0 {
                // Reversed so the best ranked link is explored first
                for link in harvest.job_links.iter().take(self.max_breadth).rev() {
                    pending.push((link.url.clone(), depth_remaining - 1));
                }
            }

            state.result.links.extend(harvest.job_links);
            state.result.postings.extend(harvest.postings);
        }

        ::log::info!(
            "Crawl complete: {} pages visited, {} failed, {} postings",
            state.result.visited_urls().len(),
            state.result.failed_urls().len(),
            state.result.postings.len()
        );
        state.result
    }

    /// Visits one page in a fresh session, closing it whatever happens
    pub async fn visit(&self, url: &str) -> VisitOutcome {
        let session = match self
            .browser_retry
            .run("WebDriver connection", || self.driver.connect())
            .await
        {
            Ok(session) => session,
            Err(e) => {
                ::log::error!(
                    "Could not open a browser session at {} for {}",
                    self.driver.address(),
                    url
                );
                return VisitOutcome::Failed(e);
            }
        };

        let outcome = match self.scrape_page(&session, url).await {
            Ok(harvest) => VisitOutcome::Succeeded(harvest),
            Err(e) => VisitOutcome::Failed(e),
        };

        if let Err(e) = session.close().await {
            ::log::warn!("Failed to close session for {}: {}", url, e);
        }

        outcome
    }

    /// Harvest, classify, extract, rank
    async fn scrape_page(&self, session: &D::Session, url: &str) -> Result<PageHarvest, CrawlError> {
        self.browser_retry
            .run("Page load", || session.navigate(url))
            .await?;

        let candidates = harvest_candidates(session, &self.filter).await?;
        let job_links = identify_job_links(&self.oracle, candidates).await;

        let html = session.page_source().await?;
        let postings = self.extractor.extract_from_html(&self.oracle, &html).await;

        let job_links = order_by_likelihood(&self.oracle, job_links).await;

        Ok(PageHarvest {
            job_links,
            postings,
        })
    }
}
