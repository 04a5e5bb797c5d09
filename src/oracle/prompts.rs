use crate::results::LinkRecord;

const CLASSIFY_LINK_TEMPLATE: &str = r#"You are a helpful AI assistant. Determine if the following link likely leads to a job posting.
Respond ONLY with 'YES' if it is likely a job, or '' if not.

Here is the link data:
{link}"#;

const RANK_LINKS_TEMPLATE: &str = r#"You are a helpful AI assistant. Evaluate the following list of links extracted from a webpage. For each link, consider its URL, text, element type, and any other info. Assign a score between 0 and 100 indicating how likely the link is to lead to a job posting webpage (100 means very likely, 0 means not likely). Return your answer as a JSON array of integers, where the first number corresponds to the first link, the second number to the second link, and so on. Do not include any additional text in your response.

Links:
{links}"#;

const EXTRACT_POSTINGS_TEMPLATE: &str = r#"You are an expert job posting extractor.

Extract the job posting details from the text below. Only extract the following details:
- Job Title (key: "title")
- Job Description (key: "description")
- Salary Range (key: "salary_range")
- Responsibilities (key: "responsibilities")
- Location (key: "location")
- Qualification (key: "qualification")

For each job posting, if any of the above details are not present, include the key with an empty string as its value.

Strictly ignore any partial job details that exist only in a hyperlink or as a link to another page.
Return only job postings that are fully described in the visible text.

Return the job postings as a valid JSON list of objects with the keys above.
If no job posting is found, return an empty list: [].

Output format: valid JSON only, without triple backticks or any extra text.

Text:
{content}"#;

/// Renders the URL/text/kind/extras block describing one link
pub fn describe_link(link: &LinkRecord) -> String {
    let other_info = serde_json::to_string(&link.auxiliary).unwrap_or_default();
    format!(
        "- URL: \"{}\"\n- Text: \"{}\"\n- Element Type: \"{}\"\n- Other Info: \"{}\"",
        link.url,
        link.text.trim(),
        link.element_kind,
        other_info
    )
}

pub fn classify_link(link: &LinkRecord) -> String {
    CLASSIFY_LINK_TEMPLATE.replace("{link}", &describe_link(link))
}

pub fn rank_links(links: &[LinkRecord]) -> String {
    let listing = links
        .iter()
        .enumerate()
        .map(|(i, link)| format!("Link {}:\n{}\n", i + 1, describe_link(link)))
        .collect::<Vec<_>>()
        .join("\n");
    RANK_LINKS_TEMPLATE.replace("{links}", &listing)
}

pub fn extract_postings(content: &str) -> String {
    EXTRACT_POSTINGS_TEMPLATE.replace("{content}", content)
}
