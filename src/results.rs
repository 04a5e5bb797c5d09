use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Kind of element a link was harvested from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementKind {
    Anchor,
    Iframe,
    Script,
    Stylesheet,
    Object,
    Embed,
}

impl ElementKind {
    /// Every reference-bearing element kind, in harvest order
    pub const ALL: [ElementKind; 6] = [
        ElementKind::Anchor,
        ElementKind::Iframe,
        ElementKind::Script,
        ElementKind::Stylesheet,
        ElementKind::Object,
        ElementKind::Embed,
    ];

    /// HTML tag name
    pub fn tag(self) -> &'static str {
        match self {
            ElementKind::Anchor => "a",
            ElementKind::Iframe => "iframe",
            ElementKind::Script => "script",
            ElementKind::Stylesheet => "link",
            ElementKind::Object => "object",
            ElementKind::Embed => "embed",
        }
    }

    /// Attribute holding the element's reference
    pub fn url_attribute(self) -> &'static str {
        match self {
            ElementKind::Anchor | ElementKind::Stylesheet => "href",
            ElementKind::Object => "data",
            ElementKind::Iframe | ElementKind::Script | ElementKind::Embed => "src",
        }
    }

    /// Only anchors carry a visible label worth reading
    pub fn has_label(self) -> bool {
        matches!(self, ElementKind::Anchor)
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// One reference discovered on a page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkRecord {
    /// Absolute URL without fragment
    pub url: String,

    /// Visible label (anchors only, may be empty)
    pub text: String,

    /// Element the reference was read from
    pub element_kind: ElementKind,

    /// Secondary attributes such as `title`
    #[serde(default)]
    pub auxiliary: BTreeMap<String, String>,

    /// Job likelihood in 0..=100, set only by ranking
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relevance_score: Option<u8>,
}

impl LinkRecord {
    pub fn new(url: impl Into<String>, text: impl Into<String>, element_kind: ElementKind) -> Self {
        Self {
            url: url.into(),
            text: text.into(),
            element_kind,
            auxiliary: BTreeMap::new(),
            relevance_score: None,
        }
    }

    pub fn with_auxiliary(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.auxiliary.insert(key.into(), value.into());
        self
    }
}

/// A structured job posting. Missing fields are empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobPosting {
    #[serde(default, deserialize_with = "lenient_string")]
    pub title: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub description: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub salary_range: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub responsibilities: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub location: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub qualification: String,
}

/// Accepts strings, null, scalars and arrays of scalars for a posting field
fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(flatten_value(&value))
}

fn flatten_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.trim().to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(items) => items
            .iter()
            .map(flatten_value)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("\n"),
        Value::Object(_) => value.to_string(),
    }
}

/// Terminal state of one node decision within a crawl
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VisitState {
    /// Already visited in this crawl
    Skipped,
    Succeeded,
    Failed,
}

/// Log entry for one node decision
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisitRecord {
    pub url: String,
    pub depth_remaining: usize,
    pub state: VisitState,
}

/// Aggregated output of one top-level crawl
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CrawlResult {
    /// Ranked job links of every visited page, in visit order
    pub links: Vec<LinkRecord>,

    /// Postings extracted from every visited page, in visit order
    pub postings: Vec<JobPosting>,

    /// Node decisions in the order they were made
    pub visits: Vec<VisitRecord>,
}

impl CrawlResult {
    /// URLs that were actually visited (succeeded or failed)
    pub fn visited_urls(&self) -> Vec<&str> {
        self.visits
            .iter()
            .filter(|v| v.state != VisitState::Skipped)
            .map(|v| v.url.as_str())
            .collect()
    }

    pub fn failed_urls(&self) -> Vec<&str> {
        self.visits
            .iter()
            .filter(|v| v.state == VisitState::Failed)
            .map(|v| v.url.as_str())
            .collect()
    }
}
