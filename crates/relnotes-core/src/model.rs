//! The changelog model.
//!
//! A [`Changelog`] is an ordered sequence of [`Section`]s, one per release,
//! each holding the bullet [`Entry`]s written under its `##` heading. The
//! document order is significant: a well-formed changelog lists releases
//! newest first, optionally preceded by an `Unreleased` section.
//!
//! Parsing lives in `relnotes-content`; this module only holds the data and
//! the queries and edits that operate on it.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::version::Version;

// ============================================================================
// ReleaseId
// ============================================================================

/// What a `##` heading identifies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ReleaseId {
    /// Changes not yet part of a release.
    Unreleased,
    /// A released version.
    Version(Version),
    /// Heading text that is neither a version nor `Unreleased`.
    Unrecognized(String),
}

impl ReleaseId {
    /// The version, if this identifies a release.
    pub fn version(&self) -> Option<&Version> {
        match self {
            Self::Version(v) => Some(v),
            _ => None,
        }
    }

    /// Returns `true` for the `Unreleased` section.
    pub fn is_unreleased(&self) -> bool {
        matches!(self, Self::Unreleased)
    }
}

impl fmt::Display for ReleaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unreleased => f.write_str("Unreleased"),
            Self::Version(v) => write!(f, "{v}"),
            Self::Unrecognized(text) => f.write_str(text),
        }
    }
}

// ============================================================================
// Entries
// ============================================================================

/// A hyperlink to a commit found inside an entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitLink {
    /// Commit hash as written (7 to 40 lowercase hex characters)
    pub sha: String,
    /// Link target
    pub url: String,
}

impl CommitLink {
    /// Abbreviated hash, as git prints it.
    pub fn short_sha(&self) -> &str {
        let end = self.sha.len().min(7);
        &self.sha[..end]
    }
}

/// One top-level bullet under a release heading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    /// Plain text of the bullet, formatting stripped, nested bullets excluded
    pub text: String,
    /// `###` heading the bullet sits under, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Plain text of nested bullets, in order
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub details: Vec<String>,
    /// Commit links anywhere in the bullet, nested bullets included
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub commits: Vec<CommitLink>,
    /// Original Markdown of the bullet
    pub raw: String,
    /// 1-based source line
    pub line: usize,
}

impl Entry {
    /// Create an entry from plain text, with a synthesized Markdown bullet.
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            raw: format!("- {text}"),
            text,
            category: None,
            details: Vec::new(),
            commits: Vec::new(),
            line: 0,
        }
    }
}

// ============================================================================
// Section
// ============================================================================

/// One release: a `##` heading and the bullets beneath it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    /// What the heading identifies
    pub release: ReleaseId,
    /// Heading text as written, without the `##`
    pub heading: String,
    /// Release date found in the heading
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    /// Bullets in document order
    pub entries: Vec<Entry>,
    /// 1-based source line of the heading
    pub line: usize,
}

impl Section {
    /// Create an empty section for `release`.
    pub fn new(release: ReleaseId, heading: impl Into<String>) -> Self {
        Self {
            release,
            heading: heading.into(),
            date: None,
            entries: Vec::new(),
            line: 0,
        }
    }

    /// An empty `Unreleased` section.
    pub fn unreleased() -> Self {
        Self::new(ReleaseId::Unreleased, "Unreleased")
    }

    /// The version, if this section is a release.
    pub fn version(&self) -> Option<&Version> {
        self.release.version()
    }

    /// Categories in first-appearance order (`None` for uncategorized bullets).
    pub fn categories(&self) -> Vec<Option<&str>> {
        let mut seen: Vec<Option<&str>> = Vec::new();
        for entry in &self.entries {
            let category = entry.category.as_deref();
            if !seen.contains(&category) {
                seen.push(category);
            }
        }
        seen
    }
}

/// Heading text written for a newly released version.
pub fn release_heading(version: &Version, date: Option<NaiveDate>) -> String {
    match date {
        Some(date) => format!("[{version}] - {}", date.format("%Y-%m-%d")),
        None => format!("[{version}]"),
    }
}

// ============================================================================
// Changelog
// ============================================================================

/// A Markdown link reference definition (`[label]: url`) kept with the document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkReference {
    /// Label between the brackets
    pub label: String,
    /// Link target
    pub url: String,
}

/// A parsed changelog document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Changelog {
    /// Markdown of the first `#` heading
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Markdown between the title and the first release heading
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preamble: Option<String>,
    /// Release sections in document order
    pub sections: Vec<Section>,
    /// Link reference definitions that follow the first release heading
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub references: Vec<LinkReference>,
}

impl Changelog {
    /// Released versions in document order.
    pub fn versions(&self) -> Vec<&Version> {
        self.sections.iter().filter_map(Section::version).collect()
    }

    /// The first released section in document order.
    pub fn latest(&self) -> Option<&Section> {
        self.sections.iter().find(|s| s.version().is_some())
    }

    /// The `Unreleased` section, if any.
    pub fn unreleased(&self) -> Option<&Section> {
        self.sections.iter().find(|s| s.release.is_unreleased())
    }

    /// The section for exactly `version`.
    pub fn find(&self, version: &Version) -> Option<&Section> {
        self.sections.iter().find(|s| s.version() == Some(version))
    }

    /// Parse `version` and look it up.
    pub fn find_str(&self, version: &str) -> Result<&Section> {
        let parsed: Version = version.parse()?;
        self.find(&parsed)
            .ok_or_else(|| Error::version_not_found(&parsed))
    }

    /// Released sections with `from < version <= to`, in document order.
    pub fn range(&self, from: &Version, to: &Version) -> Vec<&Section> {
        self.sections
            .iter()
            .filter(|s| s.version().is_some_and(|v| v > from && v <= to))
            .collect()
    }

    /// Total number of entries across all sections.
    pub fn entry_count(&self) -> usize {
        self.sections.iter().map(|s| s.entries.len()).sum()
    }

    /// Returns `true` if released versions strictly decrease in document order.
    pub fn is_descending(&self) -> bool {
        self.versions().windows(2).all(|pair| pair[0] > pair[1])
    }

    /// Insert an empty `Unreleased` section at the top unless one exists.
    ///
    /// Returns `true` if a section was added.
    pub fn add_unreleased(&mut self) -> bool {
        if self.unreleased().is_some() {
            return false;
        }
        self.sections.insert(0, Section::unreleased());
        true
    }

    /// Turn the `Unreleased` section into a release of `version`.
    pub fn release(&mut self, version: Version, date: Option<NaiveDate>) -> Result<&Section> {
        if self.find(&version).is_some() {
            return Err(Error::DuplicateVersion {
                version: version.to_string(),
            });
        }
        if let Some(latest) = self.latest().and_then(Section::version)
            && version <= *latest
        {
            return Err(Error::VersionNotGreater {
                version: version.to_string(),
                latest: latest.to_string(),
            });
        }

        let index = self
            .sections
            .iter()
            .position(|s| s.release.is_unreleased())
            .ok_or(Error::NoUnreleasedSection)?;

        log::info!(
            "Releasing {} unreleased entries as {version}",
            self.sections[index].entries.len()
        );

        let section = &mut self.sections[index];
        section.heading = release_heading(&version, date);
        section.release = ReleaseId::Version(version);
        section.date = date;
        Ok(&self.sections[index])
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn released(version: &str, entries: &[&str]) -> Section {
        let v: Version = version.parse().unwrap();
        let mut section = Section::new(ReleaseId::Version(v.clone()), format!("[{v}]"));
        section.entries = entries.iter().map(|e| Entry::new(*e)).collect();
        section
    }

    fn sample() -> Changelog {
        let mut unreleased = Section::unreleased();
        unreleased.entries.push(Entry::new("Pending change"));
        Changelog {
            title: Some("Changelog".to_string()),
            preamble: None,
            sections: vec![
                unreleased,
                released("0.7.4", &["Ignore non UTF-8 loopback output"]),
                released("0.7.3", &["Embed assets", "Notification API"]),
                released("0.6.0", &["Initial CLI option"]),
            ],
            references: Vec::new(),
        }
    }

    // ------------------------------------------------------------------------
    // Query tests
    // ------------------------------------------------------------------------

    #[test]
    fn test_versions_in_document_order() {
        let changelog = sample();
        let versions: Vec<String> = changelog.versions().iter().map(|v| v.to_string()).collect();
        assert_eq!(versions, vec!["0.7.4", "0.7.3", "0.6.0"]);
    }

    #[test]
    fn test_latest_skips_unreleased() {
        let changelog = sample();
        assert_eq!(
            changelog.latest().unwrap().version().unwrap().to_string(),
            "0.7.4"
        );
        assert!(changelog.unreleased().is_some());
    }

    #[test]
    fn test_find_str() {
        let changelog = sample();
        assert_eq!(changelog.find_str("v0.7.3").unwrap().entries.len(), 2);
        let err = changelog.find_str("0.5.0").unwrap_err();
        assert!(matches!(err, Error::VersionNotFound { .. }));
        assert!(matches!(
            changelog.find_str("garbage").unwrap_err(),
            Error::InvalidVersion { .. }
        ));
    }

    #[test]
    fn test_range_is_half_open() {
        let changelog = sample();
        let from: Version = "0.6.0".parse().unwrap();
        let to: Version = "0.7.4".parse().unwrap();
        let sections = changelog.range(&from, &to);
        let versions: Vec<String> = sections
            .iter()
            .map(|s| s.version().unwrap().to_string())
            .collect();
        assert_eq!(versions, vec!["0.7.4", "0.7.3"]);
    }

    #[test]
    fn test_entry_count() {
        assert_eq!(sample().entry_count(), 5);
    }

    #[test]
    fn test_is_descending() {
        let mut changelog = sample();
        assert!(changelog.is_descending());
        changelog.sections.swap(1, 2);
        assert!(!changelog.is_descending());
    }

    #[test]
    fn test_is_descending_rejects_duplicates() {
        let changelog = Changelog {
            sections: vec![released("0.7.0", &[]), released("0.7.0", &[])],
            ..Default::default()
        };
        assert!(!changelog.is_descending());
    }

    // ------------------------------------------------------------------------
    // Edit tests
    // ------------------------------------------------------------------------

    #[test]
    fn test_release_promotes_unreleased() {
        let mut changelog = sample();
        let date = NaiveDate::from_ymd_opt(2020, 5, 20).unwrap();
        let section = changelog
            .release("0.7.5".parse().unwrap(), Some(date))
            .unwrap();
        assert_eq!(section.heading, "[0.7.5] - 2020-05-20");
        assert_eq!(section.entries.len(), 1);
        assert!(changelog.unreleased().is_none());
        assert!(changelog.is_descending());
    }

    #[test]
    fn test_release_requires_unreleased() {
        let mut changelog = sample();
        changelog.sections.remove(0);
        let err = changelog.release("0.8.0".parse().unwrap(), None).unwrap_err();
        assert!(matches!(err, Error::NoUnreleasedSection));
    }

    #[test]
    fn test_release_rejects_older_version() {
        let mut changelog = sample();
        let err = changelog.release("0.7.0".parse().unwrap(), None).unwrap_err();
        assert!(matches!(err, Error::VersionNotGreater { .. }));
    }

    #[test]
    fn test_release_rejects_duplicate() {
        let mut changelog = sample();
        let err = changelog.release("0.6.0".parse().unwrap(), None).unwrap_err();
        assert!(matches!(err, Error::DuplicateVersion { .. }));
    }

    #[test]
    fn test_add_unreleased_once() {
        let mut changelog = sample();
        assert!(!changelog.add_unreleased());
        changelog.release("0.8.0".parse().unwrap(), None).unwrap();
        assert!(changelog.add_unreleased());
        assert!(changelog.sections[0].release.is_unreleased());
    }

    #[test]
    fn test_categories_first_appearance() {
        let mut section = released("1.0.0", &["a", "b", "c"]);
        section.entries[0].category = Some("Added".into());
        section.entries[2].category = Some("Fixed".into());
        assert_eq!(
            section.categories(),
            vec![Some("Added"), None, Some("Fixed")]
        );
    }

    #[test]
    fn test_commit_short_sha() {
        let link = CommitLink {
            sha: "f340b2914dc9c3a94ca8606f4663964fa87b95ea".into(),
            url: "https://github.com/o/r/commit/f340b29".into(),
        };
        assert_eq!(link.short_sha(), "f340b29");
    }

    #[test]
    fn test_release_id_serializes_tagged() {
        let json = serde_json::to_string(&ReleaseId::Version("1.0.0".parse().unwrap())).unwrap();
        assert_eq!(json, r#"{"kind":"version","value":"1.0.0"}"#);
        let json = serde_json::to_string(&ReleaseId::Unreleased).unwrap();
        assert_eq!(json, r#"{"kind":"unreleased"}"#);
    }
}
