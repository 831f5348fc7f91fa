//! Answer extraction heuristics.
//!
//! An ordered chain of best-effort heuristics over a rendered page snapshot:
//! embedded base64 payloads, then linked downloadable files, then the last
//! number on the page. Each step runs only when the previous one produced
//! nothing, and each step absorbs its own failures — a malformed payload or
//! an unreadable file contributes no answer rather than an error.

pub mod tables;

use crate::fetch::HttpClient;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use regex::Regex;
use serde_json::Value;
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;

/// Everything the extractor needs from a rendered page: the serialized
/// markup and the hrefs of its live anchor elements.
#[derive(Debug, Clone)]
pub struct PageSnapshot {
    pub html: String,
    pub anchor_hrefs: Vec<String>,
}

/// Outcome of one extraction pass. Both fields are best-effort.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionResult {
    pub submit_url: Option<String>,
    pub answer: Option<Value>,
}

/// Extensions eligible for the downloadable-file heuristic.
const FILE_EXTENSIONS: &[&str] = &[".pdf", ".csv", ".xlsx", ".json"];

/// Timeout for fetching a linked file.
const FILE_FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Runs the heuristic chain against page snapshots.
pub struct Extractor {
    client: HttpClient,
}

impl Extractor {
    pub fn new(client: HttpClient) -> Self {
        Self { client }
    }

    /// Run the full chain: submit-endpoint discovery, then the answer
    /// heuristics in order until one yields a value.
    pub async fn extract(&self, page: &PageSnapshot) -> ExtractionResult {
        let submit_url = find_submit_url(&page.html);

        let mut answer = answer_from_payloads(&decoded_payloads(&page.html));

        if answer.is_none() {
            answer = self.file_answer(&page.anchor_hrefs).await;
        }

        if answer.is_none() {
            answer = last_number(&page.html);
        }

        ExtractionResult { submit_url, answer }
    }

    /// Download the first fetchable linked file and, when it is a PDF, sum
    /// the "value" column of its second page. Any failure along the way —
    /// bad download, unreadable PDF, missing page or column — yields `None`.
    async fn file_answer(&self, hrefs: &[String]) -> Option<Value> {
        let (path, is_pdf) = self.download_candidate(hrefs).await?;
        if !is_pdf {
            return None;
        }
        let doc = tables::PdfPages::open(&path).ok()?;
        let sum = tables::second_page_value_sum(&doc)?;
        serde_json::Number::from_f64(sum).map(Value::Number)
    }

    /// Try each candidate anchor in document order until one downloads.
    ///
    /// The temp file is deliberately left behind — sessions are short-lived
    /// and process-scoped.
    async fn download_candidate(&self, hrefs: &[String]) -> Option<(PathBuf, bool)> {
        for href in hrefs.iter().filter(|h| is_candidate_file(h)) {
            match self.client.get_bytes(href, FILE_FETCH_TIMEOUT).await {
                Ok((200, body)) => {
                    let Some(path) = write_temp_file(&body) else {
                        continue;
                    };
                    debug!(href = %href, path = %path.display(), "downloaded linked file");
                    return Some((path, href.to_lowercase().ends_with(".pdf")));
                }
                Ok((status, _)) => {
                    debug!(href = %href, status, "linked file fetch returned non-200");
                }
                Err(e) => {
                    debug!(href = %href, "linked file fetch failed: {e:#}");
                }
            }
        }
        None
    }
}

fn write_temp_file(body: &[u8]) -> Option<PathBuf> {
    let mut tmp = tempfile::NamedTempFile::new().ok()?;
    tmp.write_all(body).ok()?;
    let (_, path) = tmp.keep().ok()?;
    Some(path)
}

/// True for absolute http(s) URLs ending in a known file extension.
fn is_candidate_file(href: &str) -> bool {
    let lower = href.to_lowercase();
    if !FILE_EXTENSIONS.iter().any(|ext| lower.ends_with(ext)) {
        return false;
    }
    matches!(
        url::Url::parse(href).map(|u| u.scheme().to_string()),
        Ok(scheme) if scheme == "http" || scheme == "https"
    )
}

/// Find the submission endpoint in raw markup.
///
/// First URL containing `/submit` and bounded by a double quote; failing
/// that, any URL with `submit` anywhere in its path or query.
pub fn find_submit_url(html: &str) -> Option<String> {
    let strict = Regex::new(r#"https?://[^"]+/submit[^"]*"#).expect("valid regex");
    if let Some(m) = strict.find(html) {
        return Some(m.as_str().to_string());
    }

    let broad = Regex::new(r#"https?://[^"]*submit[^\s'"<>]*"#).expect("valid regex");
    broad.find(html).map(|m| m.as_str().to_string())
}

/// Collect base64 literals passed to `atob(...)` in any of the three quote
/// styles and decode them, in document order. Literals that are not valid
/// base64 are skipped; decoded bytes are read as UTF-8 lossily.
pub fn decoded_payloads(html: &str) -> Vec<String> {
    let re = Regex::new(
        r#"atob\(\s*`([^`]*)`\s*\)|atob\(\s*"([^"]*)"\s*\)|atob\(\s*'([^']*)'\s*\)"#,
    )
    .expect("valid regex");

    re.captures_iter(html)
        .filter_map(|caps| {
            let literal = caps.get(1).or_else(|| caps.get(2)).or_else(|| caps.get(3))?;
            let bytes = STANDARD.decode(literal.as_str()).ok()?;
            Some(String::from_utf8_lossy(&bytes).into_owned())
        })
        .collect()
}

/// First decoded payload that parses as JSON with an `"answer"` field wins.
pub fn answer_from_payloads(payloads: &[String]) -> Option<Value> {
    payloads.iter().find_map(|text| {
        let parsed: Value = serde_json::from_str(text).ok()?;
        parsed.get("answer").cloned()
    })
}

/// Last numeric substring anywhere in the raw markup.
///
/// Scans the full markup including script and style tags, so asset version
/// numbers or timestamps can win — that is the documented behavior, not a
/// bug to fix. Parsed as a float when it contains a decimal point, as an
/// integer otherwise. No numbers at all leaves the answer absent, which is
/// a legitimate terminal outcome.
pub fn last_number(html: &str) -> Option<Value> {
    let re = Regex::new(r"[-+]?\d*\.\d+|\d+").expect("valid regex");
    let raw = re.find_iter(html).last()?.as_str();

    if raw.contains('.') {
        serde_json::Number::from_f64(raw.parse::<f64>().ok()?).map(Value::Number)
    } else if let Ok(n) = raw.parse::<i64>() {
        Some(Value::from(n))
    } else {
        // Digit runs longer than i64 still count as numbers.
        serde_json::Number::from_f64(raw.parse::<f64>().ok()?).map(Value::Number)
    }
}
