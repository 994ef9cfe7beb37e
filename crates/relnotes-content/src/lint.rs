//! Structural lint rules for changelogs.
//!
//! The central rule is that released sections appear newest first. The other
//! rules catch the mistakes that tend to break release tooling: duplicated
//! versions, headings that are not versions, a misplaced `Unreleased`
//! section, and empty or unlinked entries.
//!
//! # Example
//!
//! ```rust
//! use relnotes_content::lint::{lint, Rule};
//! use relnotes_content::markdown::parse_changelog;
//! use relnotes_core::LintConfig;
//!
//! let changelog = parse_changelog("# Changelog\n\n## 0.6.0\n\n- a\n\n## 0.7.0\n\n- b\n");
//! let report = lint(&changelog, &LintConfig::default());
//!
//! assert!(!report.is_ok(false));
//! assert_eq!(report.diagnostics()[0].rule, Rule::DescendingOrder);
//! ```

use std::collections::HashMap;
use std::fmt;

use relnotes_core::{Changelog, LintConfig, ReleaseId, Version};
use serde::Serialize;

// ============================================================================
// Diagnostics
// ============================================================================

/// How serious a diagnostic is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Suspicious but well-formed.
    Warning,
    /// Breaks the changelog's structure.
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Warning => f.write_str("warning"),
            Self::Error => f.write_str("error"),
        }
    }
}

/// Lint rule identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Rule {
    /// Released versions must strictly decrease.
    DescendingOrder,
    /// A version may appear only once.
    DuplicateVersion,
    /// `##` headings must be versions or `Unreleased`.
    UnrecognizedHeading,
    /// `Unreleased` must be the first section and appear once.
    UnreleasedPosition,
    /// `Unreleased` present while disallowed by config.
    UnreleasedNotAllowed,
    /// Released section with no entries.
    EmptySection,
    /// Entry without a commit link.
    MissingCommitLink,
    /// Document has no `#` title.
    MissingTitle,
    /// Document has no sections.
    EmptyChangelog,
}

impl Rule {
    /// Stable kebab-case name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DescendingOrder => "descending-order",
            Self::DuplicateVersion => "duplicate-version",
            Self::UnrecognizedHeading => "unrecognized-heading",
            Self::UnreleasedPosition => "unreleased-position",
            Self::UnreleasedNotAllowed => "unreleased-not-allowed",
            Self::EmptySection => "empty-section",
            Self::MissingCommitLink => "missing-commit-link",
            Self::MissingTitle => "missing-title",
            Self::EmptyChangelog => "empty-changelog",
        }
    }

    /// Severity this rule reports at.
    pub fn severity(&self) -> Severity {
        match self {
            Self::EmptySection | Self::MissingCommitLink | Self::MissingTitle => Severity::Warning,
            _ => Severity::Error,
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single lint finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    /// Rule that fired
    pub rule: Rule,
    /// Severity of the rule
    pub severity: Severity,
    /// 1-based source line
    pub line: usize,
    /// Human-readable explanation
    pub message: String,
}

impl Diagnostic {
    fn new(rule: Rule, line: usize, message: impl Into<String>) -> Self {
        Self {
            rule,
            severity: rule.severity(),
            line,
            message: message.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {}[{}]: {}",
            self.line, self.severity, self.rule, self.message
        )
    }
}

/// All findings for one changelog, ordered by line.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LintReport {
    diagnostics: Vec<Diagnostic>,
}

impl LintReport {
    /// Findings ordered by line.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Number of error findings.
    pub fn error_count(&self) -> usize {
        self.count(Severity::Error)
    }

    /// Number of warning findings.
    pub fn warning_count(&self) -> usize {
        self.count(Severity::Warning)
    }

    /// Returns `true` if the changelog passes; warnings fail only when denied.
    pub fn is_ok(&self, deny_warnings: bool) -> bool {
        self.error_count() == 0 && (!deny_warnings || self.warning_count() == 0)
    }

    /// Returns `true` if a specific rule fired.
    pub fn has(&self, rule: Rule) -> bool {
        self.diagnostics.iter().any(|d| d.rule == rule)
    }

    fn count(&self, severity: Severity) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == severity)
            .count()
    }
}

// ============================================================================
// Lint
// ============================================================================

/// Check a changelog against all rules.
pub fn lint(changelog: &Changelog, config: &LintConfig) -> LintReport {
    let mut diagnostics = Vec::new();

    if changelog.title.is_none() {
        diagnostics.push(Diagnostic::new(
            Rule::MissingTitle,
            1,
            "Changelog has no '#' title",
        ));
    }
    if changelog.sections.is_empty() {
        diagnostics.push(Diagnostic::new(
            Rule::EmptyChangelog,
            1,
            "Changelog has no '##' release sections",
        ));
    }

    let mut seen: HashMap<&Version, usize> = HashMap::new();
    let mut previous: Option<(&Version, usize)> = None;
    let mut unreleased_line: Option<usize> = None;

    for (index, section) in changelog.sections.iter().enumerate() {
        match &section.release {
            ReleaseId::Unrecognized(text) => diagnostics.push(Diagnostic::new(
                Rule::UnrecognizedHeading,
                section.line,
                format!("Heading '{text}' is not a version or 'Unreleased'"),
            )),
            ReleaseId::Unreleased => {
                if !config.allow_unreleased {
                    diagnostics.push(Diagnostic::new(
                        Rule::UnreleasedNotAllowed,
                        section.line,
                        "Unreleased section is not allowed",
                    ));
                } else if let Some(first) = unreleased_line {
                    diagnostics.push(Diagnostic::new(
                        Rule::UnreleasedPosition,
                        section.line,
                        format!("Duplicate Unreleased section (first on line {first})"),
                    ));
                } else if index != 0 {
                    diagnostics.push(Diagnostic::new(
                        Rule::UnreleasedPosition,
                        section.line,
                        "Unreleased section must come before all releases",
                    ));
                }
                unreleased_line.get_or_insert(section.line);
            }
            ReleaseId::Version(version) => {
                if let Some(first) = seen.get(version) {
                    diagnostics.push(Diagnostic::new(
                        Rule::DuplicateVersion,
                        section.line,
                        format!("Version {version} already appears on line {first}"),
                    ));
                } else {
                    if let Some((prev, prev_line)) = previous
                        && version >= prev
                    {
                        diagnostics.push(Diagnostic::new(
                            Rule::DescendingOrder,
                            section.line,
                            format!(
                                "Version {version} must be lower than {prev} on line {prev_line}"
                            ),
                        ));
                    }
                    seen.insert(version, section.line);
                }
                previous = Some((version, section.line));

                if config.require_entries && section.entries.is_empty() {
                    diagnostics.push(Diagnostic::new(
                        Rule::EmptySection,
                        section.line,
                        format!("Version {version} has no entries"),
                    ));
                }
            }
        }

        if config.require_commit_links {
            for entry in section.entries.iter().filter(|e| e.commits.is_empty()) {
                diagnostics.push(Diagnostic::new(
                    Rule::MissingCommitLink,
                    entry.line,
                    format!("Entry in '{}' has no commit link", section.heading),
                ));
            }
        }
    }

    diagnostics.sort_by_key(|d| d.line);
    log::debug!("Lint produced {} diagnostics", diagnostics.len());
    LintReport { diagnostics }
}

// ============================================================================
// Tests
// ============================================================================
