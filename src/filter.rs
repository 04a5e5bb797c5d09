use crate::results::LinkRecord;
use regex::Regex;
use std::collections::HashSet;
use url::Url;

/// Strips the fragment component of a URL so `page#a` and `page#b` compare equal
pub fn remove_fragment(href: &str) -> String {
    match Url::parse(href) {
        Ok(mut url) => {
            url.set_fragment(None);
            url.to_string()
        }
        Err(e) => {
            ::log::warn!("Error removing fragment from URL {}: {}", href, e);
            match href.split_once('#') {
                Some((base, _)) => base.to_string(),
                None => href.to_string(),
            }
        }
    }
}

/// Decides which harvested links become classification candidates
#[derive(Debug, Default)]
pub struct LinkFilter {
    exclude_regexes: Vec<Regex>,
}

impl LinkFilter {
    /// Create a filter dropping URLs that match any of `exclude_patterns`
    pub fn new(exclude_patterns: &[String]) -> Result<Self, regex::Error> {
        let mut exclude_regexes = Vec::with_capacity(exclude_patterns.len());
        for pattern in exclude_patterns {
            exclude_regexes.push(Regex::new(pattern)?);
        }

        Ok(Self { exclude_regexes })
    }

    /// Whether a URL is rejected by an exclude pattern
    pub fn is_excluded(&self, url: &str) -> bool {
        self.exclude_regexes.iter().any(|regex| regex.is_match(url))
    }

    /// Computes `all - chrome` by URL after fragment removal.
    ///
    /// The first occurrence of each URL is kept, in harvest order. Links
    /// matching an exclude pattern are dropped.
    pub fn candidates(&self, all: Vec<LinkRecord>, chrome: Vec<LinkRecord>) -> Vec<LinkRecord> {
        let chrome_urls: HashSet<String> = chrome
            .iter()
            .map(|link| remove_fragment(&link.url))
            .collect();

        let mut seen = HashSet::new();
        let mut candidates = Vec::new();

        for mut link in all {
            link.url = remove_fragment(&link.url);

            if chrome_urls.contains(&link.url) {
                ::log::trace!("Excluding navigation link: {}", link.url);
                continue;
            }
            if self.is_excluded(&link.url) {
                ::log::debug!("Exclude pattern rejected: {}", link.url);
                continue;
            }
            if !seen.insert(link.url.clone()) {
                continue;
            }

            candidates.push(link);
        }

        candidates
    }
}
