pub mod openai;
pub mod prompts;

use crate::error::CrawlError;
use crate::results::{JobPosting, LinkRecord};
use crate::retry::RetryPolicy;
use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

pub use openai::OpenAiOracle;

/// Markdown hyperlinks left behind by HTML conversion
static MARKDOWN_LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[.*?\]\(.*?\)").expect("static regex"));

/// Hosted language model answering prompts deterministically
pub trait TextOracle {
    async fn complete(&self, prompt: &str) -> Result<String, CrawlError>;
}

/// A parsed model answer, or the reason the response was unusable
#[derive(Debug, Clone, PartialEq)]
pub enum OracleOutcome<T> {
    Answer(T),
    Fallback(String),
}

impl<T> OracleOutcome<T> {
    pub fn answer_or(self, default: T) -> T {
        match self {
            OracleOutcome::Answer(value) => value,
            OracleOutcome::Fallback(_) => default,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, OracleOutcome::Fallback(_))
    }
}

/// Parses a YES/empty link classification
pub fn parse_classification(response: &str) -> OracleOutcome<bool> {
    let normalized = response.trim().to_uppercase();
    match normalized.as_str() {
        "YES" => OracleOutcome::Answer(true),
        "" | "NO" => OracleOutcome::Answer(false),
        _ => OracleOutcome::Fallback(format!("unexpected classification {:?}", response.trim())),
    }
}

/// Parses a JSON array of `expected` scores, clamped to 0..=100
pub fn parse_scores(response: &str, expected: usize) -> OracleOutcome<Vec<u8>> {
    let value: Value = match serde_json::from_str(clean_json_response(response)) {
        Ok(value) => value,
        Err(e) => return OracleOutcome::Fallback(format!("scores are not JSON: {}", e)),
    };

    let Value::Array(items) = value else {
        return OracleOutcome::Fallback("scores are not a JSON array".to_string());
    };
    if items.len() != expected {
        return OracleOutcome::Fallback(format!(
            "expected {} scores, got {}",
            expected,
            items.len()
        ));
    }

    let mut scores = Vec::with_capacity(items.len());
    for item in &items {
        match item.as_f64() {
            Some(score) => scores.push(score.clamp(0.0, 100.0).round() as u8),
            None => return OracleOutcome::Fallback(format!("score {} is not a number", item)),
        }
    }
    OracleOutcome::Answer(scores)
}

/// Parses a posting object or a list of posting objects
pub fn parse_postings(response: &str) -> OracleOutcome<Vec<JobPosting>> {
    let value: Value = match serde_json::from_str(clean_json_response(response)) {
        Ok(value) => value,
        Err(e) => return OracleOutcome::Fallback(format!("postings are not JSON: {}", e)),
    };

    let items = match value {
        Value::Object(_) => vec![value],
        Value::Array(items) => items,
        other => {
            return OracleOutcome::Fallback(format!("unexpected postings value {}", other));
        }
    };

    let mut postings = Vec::with_capacity(items.len());
    for item in items {
        if !item.is_object() {
            return OracleOutcome::Fallback(format!("posting {} is not an object", item));
        }
        match serde_json::from_value(item) {
            Ok(posting) => postings.push(posting),
            Err(e) => return OracleOutcome::Fallback(format!("invalid posting: {}", e)),
        }
    }
    OracleOutcome::Answer(postings)
}

/// Strips code fences and a leading `json` tag around a JSON payload
fn clean_json_response(response: &str) -> &str {
    let mut cleaned = response.trim();
    if let Some(rest) = cleaned.strip_prefix("```") {
        cleaned = rest;
    }
    if cleaned.get(..4).is_some_and(|tag| tag.eq_ignore_ascii_case("json")) {
        cleaned = &cleaned[4..];
    }
    if let Some(rest) = cleaned.strip_suffix("```") {
        cleaned = rest;
    }
    cleaned.trim()
}

/// Removes `[label](target)` hyperlink remnants from page text
pub fn strip_markdown_links(text: &str) -> String {
    MARKDOWN_LINK.replace_all(text, "").into_owned()
}

/// Typed queries over a [`TextOracle`]
pub struct OracleClient<O> {
    oracle: O,
    retry: RetryPolicy,
}

impl<O: TextOracle> OracleClient<O> {
    pub fn new(oracle: O) -> Self {
        Self {
            oracle,
            retry: RetryPolicy::oracle(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn oracle(&self) -> &O {
        &self.oracle
    }

    async fn ask(&self, prompt: &str) -> Result<String, CrawlError> {
        ::log::debug!("Prompting language model ({} chars)", prompt.len());
        let response = self
            .retry
            .run("language model call", || self.oracle.complete(prompt))
            .await?;
        ::log::debug!("Language model response => {}", response);
        Ok(response)
    }

    /// Whether `link` likely leads to a job posting. Failures answer `false`.
    pub async fn classify_link(&self, link: &LinkRecord) -> bool {
        if link.url.is_empty() && link.text.trim().is_empty() {
            return false;
        }

        let response = match self.ask(&prompts::classify_link(link)).await {
            Ok(response) => response,
            Err(e) => {
                ::log::error!("Error evaluating link {}: {}", link.url, e);
                return false;
            }
        };

        match parse_classification(&response) {
            OracleOutcome::Answer(is_job) => is_job,
            OracleOutcome::Fallback(reason) => {
                ::log::debug!("Treating {} as not a job link: {}", link.url, reason);
                false
            }
        }
    }

    /// Scores links and sorts them best first.
    ///
    /// Equal scores keep their input order. On any failure the input is
    /// returned unchanged and unscored.
    pub async fn rank_links(&self, mut links: Vec<LinkRecord>) -> Vec<LinkRecord> {
        if links.is_empty() {
            return links;
        }

        let response = match self.ask(&prompts::rank_links(&links)).await {
            Ok(response) => response,
            Err(e) => {
                ::log::error!("Error ordering links: {}", e);
                return links;
            }
        };

        let scores = match parse_scores(&response, links.len()) {
            OracleOutcome::Answer(scores) => scores,
            OracleOutcome::Fallback(reason) => {
                ::log::error!(
                    "Invalid link ordering response, keeping input order: {}",
                    reason
                );
                return links;
            }
        };

        for (link, score) in links.iter_mut().zip(scores) {
            link.relevance_score = Some(score);
        }
        links.sort_by(|a, b| b.relevance_score.cmp(&a.relevance_score));
        links
    }

    /// Extracts postings from each chunk independently, in chunk order.
    ///
    /// A chunk whose call fails or whose response is malformed contributes
    /// nothing; other chunks are unaffected.
    pub async fn extract_postings(&self, chunks: &[String]) -> Vec<JobPosting> {
        ::log::debug!("Processing {} text chunks", chunks.len());
        let mut all_postings = Vec::new();

        for (index, chunk) in chunks.iter().enumerate() {
            let content = strip_markdown_links(chunk);
            let response = match self.ask(&prompts::extract_postings(&content)).await {
                Ok(response) => response,
                Err(e) => {
                    ::log::error!("Error processing chunk {}: {}", index + 1, e);
                    continue;
                }
            };

            match parse_postings(&response) {
                OracleOutcome::Answer(postings) => {
                    ::log::info!(
                        "Extracted {} job postings from chunk {}",
                        postings.len(),
                        index + 1
                    );
                    all_postings.extend(postings);
                }
                OracleOutcome::Fallback(reason) => {
                    ::log::warn!("JSON parsing error in chunk {}: {}", index + 1, reason);
                }
            }
        }

        all_postings
    }
}
