use crate::oracle::{OracleClient, TextOracle};
use crate::results::LinkRecord;

/// Keeps the links the language model classifies as job postings.
///
/// Each link is judged on its own; input order is preserved.
pub async fn identify_job_links<O: TextOracle>(
    oracle: &OracleClient<O>,
    links: Vec<LinkRecord>,
) -> Vec<LinkRecord> {
    let mut job_links = Vec::new();
    for link in links {
        if oracle.classify_link(&link).await {
            ::log::debug!("Job link: {}", link.url);
            job_links.push(link);
        }
    }
    job_links
}

/// Scores job links and sorts them most likely first
pub async fn order_by_likelihood<O: TextOracle>(
    oracle: &OracleClient<O>,
    job_links: Vec<LinkRecord>,
) -> Vec<LinkRecord> {
    if job_links.is_empty() {
        return job_links;
    }
    oracle.rank_links(job_links).await
}
