use crate::error::CrawlError;
use crate::results::JobPosting;
use std::collections::HashSet;
use std::io::Write;

/// Drops exact duplicate postings, keeping the first occurrence
pub fn dedup_postings(postings: Vec<JobPosting>) -> Vec<JobPosting> {
    let mut seen = HashSet::new();
    postings
        .into_iter()
        .filter(|posting| seen.insert(posting.clone()))
        .collect()
}

/// Writes postings as CSV with a header row
pub fn write_postings_csv<W: Write>(postings: &[JobPosting], writer: W) -> Result<(), CrawlError> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(true)
        .from_writer(writer);
    for posting in postings {
        wtr.serialize(posting)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Writes postings as a pretty-printed JSON array
pub fn write_postings_json<W: Write>(
    postings: &[JobPosting],
    mut writer: W,
) -> Result<(), CrawlError> {
    serde_json::to_writer_pretty(&mut writer, postings)?;
    writeln!(writer)?;
    Ok(())
}
