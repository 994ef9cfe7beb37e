//! Heading, commit, and position helpers used by the changelog parser.
//!
//! # Key Functions
//!
//! - [`parse_heading`]: Classify a `##` heading as a version, `Unreleased`, or neither
//! - [`extract_commit_sha`]: Recognize a commit link from its URL or text
//! - [`plain_text`]: Strip inline Markdown down to its text
//! - [`LineIndex`]: Map byte offsets to 1-based line numbers
//!
//! # Example
//!
//! ```rust
//! use relnotes_content::markdown::helpers::parse_heading;
//! use relnotes_core::ReleaseId;
//!
//! let (release, date) = parse_heading("[0.7.4] - 2020-05-20");
//! assert_eq!(release, ReleaseId::Version("0.7.4".parse().unwrap()));
//! assert_eq!(date.unwrap().to_string(), "2020-05-20");
//! ```

use std::sync::LazyLock;

use chrono::NaiveDate;
use pulldown_cmark::{Event, Parser};
use regex::Regex;
use relnotes_core::{ReleaseId, Version};

static UNRELEASED_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\[?\s*unreleased\s*\]?(?:\s|$|[-:(])").expect("Invalid unreleased regex")
});

static VERSION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?:^|[\s\[(])[vV]?(\d+\.\d+\.\d+(?:-[0-9A-Za-z]+(?:[.-][0-9A-Za-z]+)*)?(?:\+[0-9A-Za-z.-]+)?)",
    )
    .expect("Invalid version regex")
});

static DATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d{4}-\d{2}-\d{2})\b").expect("Invalid date regex"));

static COMMIT_URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"/commits?/([0-9a-fA-F]{7,40})(?:[^0-9a-zA-Z]|$)").expect("Invalid commit URL regex")
});

static SHA_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9a-fA-F]{7,40}$").expect("Invalid sha regex"));

/// Classify a `##` heading.
///
/// Returns [`ReleaseId::Unreleased`] for `Unreleased` (any case, optional
/// brackets), [`ReleaseId::Version`] for the first version token in the
/// text, and [`ReleaseId::Unrecognized`] otherwise. An ISO date anywhere in
/// the heading is returned alongside.
///
/// # Example
///
/// ```rust
/// use relnotes_content::markdown::helpers::parse_heading;
/// use relnotes_core::ReleaseId;
///
/// assert_eq!(parse_heading("[Unreleased]").0, ReleaseId::Unreleased);
/// assert_eq!(
///     parse_heading("v0.6.0").0,
///     ReleaseId::Version("0.6.0".parse().unwrap())
/// );
/// assert!(matches!(parse_heading("Notes").0, ReleaseId::Unrecognized(_)));
/// ```
pub fn parse_heading(text: &str) -> (ReleaseId, Option<NaiveDate>) {
    let text = text.trim();
    let date = DATE_RE
        .captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| NaiveDate::parse_from_str(m.as_str(), "%Y-%m-%d").ok());

    if UNRELEASED_RE.is_match(text) {
        return (ReleaseId::Unreleased, date);
    }

    let version = VERSION_RE
        .captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<Version>().ok());

    match version {
        Some(version) => (ReleaseId::Version(version), date),
        None => (ReleaseId::Unrecognized(text.to_string()), date),
    }
}

/// Returns `true` if `s` looks like an abbreviated or full commit hash.
///
/// # Example
///
/// ```rust
/// use relnotes_content::markdown::helpers::is_commit_sha;
///
/// assert!(is_commit_sha("f340b29"));
/// assert!(!is_commit_sha("f340b2"));
/// assert!(!is_commit_sha("release"));
/// ```
pub fn is_commit_sha(s: &str) -> bool {
    SHA_RE.is_match(s)
}

/// Recognize a commit link.
///
/// The hash is taken from a `/commit/<sha>` (or `/commits/<sha>`) URL path
/// first, then from link text that is itself a hash. Returned lowercase.
///
/// # Example
///
/// ```rust
/// use relnotes_content::markdown::helpers::extract_commit_sha;
///
/// let sha = extract_commit_sha(
///     "https://www.github.com/tauri-apps/tauri/commit/f340b2914dc9c3a94ca8606f4663964fa87b95ea",
///     "f340b29",
/// );
/// assert_eq!(sha.as_deref(), Some("f340b2914dc9c3a94ca8606f4663964fa87b95ea"));
///
/// assert_eq!(extract_commit_sha("https://example.com/docs", "the docs"), None);
/// ```
pub fn extract_commit_sha(url: &str, text: &str) -> Option<String> {
    if let Some(m) = COMMIT_URL_RE.captures(url).and_then(|caps| caps.get(1)) {
        return Some(m.as_str().to_lowercase());
    }
    let text = text.trim();
    if is_commit_sha(text) {
        return Some(text.to_lowercase());
    }
    None
}

/// Collapse runs of whitespace into single spaces and trim.
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// The text of inline Markdown, with links, emphasis and code unwrapped.
///
/// ```rust
/// use relnotes_content::markdown::helpers::plain_text;
///
/// assert_eq!(plain_text("[Changelog](https://example.com) for *tauri*"), "Changelog for tauri");
/// ```
pub fn plain_text(markdown: &str) -> String {
    let mut text = String::with_capacity(markdown.len());
    for event in Parser::new(markdown) {
        match event {
            Event::Text(chunk) | Event::Code(chunk) => text.push_str(&chunk),
            Event::SoftBreak | Event::HardBreak => text.push(' '),
            _ => {}
        }
    }
    normalize_whitespace(&text)
}

/// Byte offset to line number lookup for a source document.
#[derive(Debug, Clone)]
pub struct LineIndex {
    starts: Vec<usize>,
}

impl LineIndex {
    /// Index the line starts of `source`.
    pub fn new(source: &str) -> Self {
        let mut starts = vec![0];
        starts.extend(
            source
                .bytes()
                .enumerate()
                .filter(|(_, b)| *b == b'\n')
                .map(|(i, _)| i + 1),
        );
        Self { starts }
    }

    /// 1-based line containing byte `offset`.
    pub fn line_of(&self, offset: usize) -> usize {
        match self.starts.binary_search(&offset) {
            Ok(index) => index + 1,
            Err(index) => index,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
