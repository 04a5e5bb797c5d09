use crate::oracle::{OracleClient, TextOracle};
use crate::parsers::html::has_apply_marker;
use crate::parsers::text::split_into_chunks;
use crate::parsers::TextNormalizer;
use crate::results::JobPosting;

/// Extracts postings from text chunks, one language model call per chunk.
///
/// A failing chunk contributes nothing and never loses postings already
/// parsed from the others. Results keep chunk order.
pub async fn extract_job_postings<O: TextOracle>(
    oracle: &OracleClient<O>,
    chunks: &[String],
) -> Vec<JobPosting> {
    if chunks.is_empty() {
        return Vec::new();
    }
    oracle.extract_postings(chunks).await
}

/// Turns a rendered page into job postings
#[derive(Debug, Clone)]
pub struct PostingExtractor<N> {
    normalizer: N,
    max_chunk_chars: usize,
    require_apply_button: bool,
}

impl<N: TextNormalizer> PostingExtractor<N> {
    pub fn new(normalizer: N) -> Self {
        Self {
            normalizer,
            max_chunk_chars: 12000,
            require_apply_button: true,
        }
    }

    pub fn with_max_chunk_chars(mut self, max_chunk_chars: usize) -> Self {
        self.max_chunk_chars = max_chunk_chars;
        self
    }

    /// Skip pages that have no "apply" button or link
    pub fn with_apply_button_required(mut self, required: bool) -> Self {
        self.require_apply_button = required;
        self
    }

    pub async fn extract_from_html<O: TextOracle>(
        &self,
        oracle: &OracleClient<O>,
        html: &str,
    ) -> Vec<JobPosting> {
        if self.require_apply_button && !has_apply_marker(html) {
            ::log::debug!("No apply button found, skipping posting extraction");
            return Vec::new();
        }

        let text = self.normalizer.html_to_text(html);
        let chunks = split_into_chunks(&text, self.max_chunk_chars);
        extract_job_postings(oracle, &chunks).await
    }
}
