use crate::driver::PageSession;
use crate::error::CrawlError;
use crate::filter::LinkFilter;
use crate::parsers::text::normalize_whitespace_in_segment;
use crate::results::{ElementKind, LinkRecord};
use url::Url;

/// Landmark regions whose links are site navigation rather than content
const CHROME_REGIONS: [&str; 3] = ["header", "footer", "nav"];

/// Collects every reference-bearing element in the document
pub async fn collect_all_links<S: PageSession>(session: &S) -> Result<Vec<LinkRecord>, CrawlError> {
    collect_links(session, |kind| kind.tag().to_string()).await
}

/// Collects references nested under header, footer and nav regions
pub async fn collect_chrome_links<S: PageSession>(
    session: &S,
) -> Result<Vec<LinkRecord>, CrawlError> {
    collect_links(session, |kind| {
        CHROME_REGIONS
            .iter()
            .map(|region| format!("{} {}", region, kind.tag()))
            .collect::<Vec<_>>()
            .join(", ")
    })
    .await
}

/// Harvests all links, removes navigation chrome and duplicates
pub async fn harvest_candidates<S: PageSession>(
    session: &S,
    filter: &LinkFilter,
) -> Result<Vec<LinkRecord>, CrawlError> {
    let all = collect_all_links(session).await?;
    let chrome = collect_chrome_links(session).await?;
    let total = all.len();

    let candidates = filter.candidates(all, chrome);
    ::log::debug!(
        "Harvested {} links, {} remain after removing navigation chrome",
        total,
        candidates.len()
    );
    Ok(candidates)
}

async fn collect_links<S, F>(session: &S, selector_for: F) -> Result<Vec<LinkRecord>, CrawlError>
where
    S: PageSession,
    F: Fn(ElementKind) -> String,
{
    let current = session.current_url().await?;
    let base = Url::parse(&current).map_err(|source| CrawlError::InvalidUrl {
        url: current.clone(),
        source,
    })?;

    let mut links = Vec::new();
    for kind in ElementKind::ALL {
        let elements = session.find_elements(&selector_for(kind)).await?;

        for element in &elements {
            match read_link(session, element, kind, &base).await {
                Ok(Some(link)) => links.push(link),
                Ok(None) => {}
                Err(e) if e.is_stale() => {
                    ::log::debug!("Skipping stale {} element on {}", kind, base);
                }
                Err(e) => return Err(e),
            }
        }
    }

    Ok(links)
}

/// Reads one element into a link, or `None` when it has no usable reference
async fn read_link<S: PageSession>(
    session: &S,
    element: &S::Element,
    kind: ElementKind,
    base: &Url,
) -> Result<Option<LinkRecord>, CrawlError> {
    let raw = session
        .attribute(element, kind.url_attribute())
        .await?
        .unwrap_or_default();
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }

    let resolved = match base.join(raw) {
        Ok(url) => url.to_string(),
        Err(e) => {
            ::log::debug!("Cannot resolve {} against {}: {}", raw, base, e);
            return Ok(None);
        }
    };

    let text = if kind.has_label() {
        normalize_whitespace_in_segment(&session.text(element).await?)
    } else {
        String::new()
    };

    let mut link = LinkRecord::new(resolved, text, kind);
    if let Some(title) = session.attribute(element, "title").await? {
        if !title.trim().is_empty() {
            link.auxiliary.insert("title".to_string(), title.trim().to_string());
        }
    }

    Ok(Some(link))
}
