pub mod html;
pub mod text;


/// Converts rendered HTML into plain text for posting extraction
pub trait TextNormalizer {
    /// Strip script/style content and return non-empty trimmed lines in
    /// document order, joined by newlines
    fn html_to_text(&self, html: &str) -> String;
}

/// [`TextNormalizer`] backed by the `scraper` HTML parser
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlTextNormalizer;

impl TextNormalizer for HtmlTextNormalizer {
    fn html_to_text(&self, html: &str) -> String {
        html::html_to_text(html)
    }
}
