use scraper::{Html, Selector};
use std::sync::LazyLock;

/// Elements whose text never reaches the extracted content
const SKIPPED_TAGS: [&str; 2] = ["script", "style"];

static APPLY_CANDIDATES: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("button, a").expect("static selector"));

/// Extracts the visible text of an HTML document, one trimmed line per
/// text fragment, skipping script and style content
pub fn html_to_text(html: &str) -> String {
    let doc = Html::parse_document(html);

    let mut lines = Vec::new();
    for node in doc.root_element().descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };

        let hidden = node.ancestors().any(|ancestor| {
            ancestor
                .value()
                .as_element()
                .is_some_and(|e| SKIPPED_TAGS.contains(&e.name()))
        });
        if hidden {
            continue;
        }

        lines.extend(
            text.lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(str::to_string),
        );
    }

    ::log::debug!("HTML normalizer produced {} lines", lines.len());
    lines.join("\n")
}

/// Whether the page has a button or link mentioning "apply"
///
/// Pages without one are treated as listing pages and are not sent for
/// posting extraction.
pub fn has_apply_marker(html: &str) -> bool {
    let doc = Html::parse_document(html);
    doc.select(&APPLY_CANDIDATES).any(|e| {
        e.text()
            .collect::<String>()
            .to_lowercase()
            .contains("apply")
    })
}
