//! Changelog rendering.
//!
//! Four output formats share one entry point per scope:
//!
//! - [`Format::Markdown`]: canonical Markdown, bullets reproduced from source
//! - [`Format::Html`]: the Markdown output converted by `pulldown-cmark`
//! - [`Format::Json`]: the model as pretty JSON
//! - [`Format::Text`]: a terse plain-text listing for terminals
//!
//! # Example
//!
//! ```rust
//! use relnotes_content::markdown::parse_changelog;
//! use relnotes_content::render::{render, Format};
//!
//! let changelog = parse_changelog("# Changelog\n\n## [0.6.0]\n\n- First release\n");
//! let text = render(&changelog, Format::Text).unwrap();
//! assert_eq!(text, "0.6.0: 1 entry\n  - First release\n");
//! ```

use std::fmt;
use std::fmt::Write as _;
use std::str::FromStr;

use pulldown_cmark::{html, Options, Parser};
use relnotes_core::{Changelog, Error, ReleaseId, Result, Section};
use serde::{Deserialize, Serialize};

/// Output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    /// Canonical Markdown
    Markdown,
    /// HTML fragment
    Html,
    /// Pretty JSON
    Json,
    /// Plain text listing
    #[default]
    Text,
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Markdown => "markdown",
            Self::Html => "html",
            Self::Json => "json",
            Self::Text => "text",
        };
        f.write_str(name)
    }
}

impl FromStr for Format {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "markdown" | "md" => Ok(Self::Markdown),
            "html" => Ok(Self::Html),
            "json" => Ok(Self::Json),
            "text" | "txt" => Ok(Self::Text),
            other => Err(Error::config(format!(
                "Unknown format '{other}': expected markdown, html, json, or text"
            ))),
        }
    }
}

// ============================================================================
// Entry points
// ============================================================================

/// Render a whole changelog.
pub fn render(changelog: &Changelog, format: Format) -> Result<String> {
    match format {
        Format::Markdown => Ok(to_markdown(changelog)),
        Format::Html => Ok(markdown_to_html(&to_markdown(changelog))),
        Format::Json => Ok(serde_json::to_string_pretty(changelog)?),
        Format::Text => Ok(sections_to_text(changelog.sections.iter())),
    }
}

/// Render a single section.
pub fn render_section(section: &Section, format: Format) -> Result<String> {
    match format {
        Format::Json => Ok(serde_json::to_string_pretty(section)?),
        _ => render_sections(&[section], format),
    }
}

/// Render a list of sections, e.g. the result of a range query.
pub fn render_sections(sections: &[&Section], format: Format) -> Result<String> {
    match format {
        Format::Markdown => Ok(sections_to_markdown(sections)),
        Format::Html => Ok(markdown_to_html(&sections_to_markdown(sections))),
        Format::Json => Ok(serde_json::to_string_pretty(sections)?),
        Format::Text => Ok(sections_to_text(sections.iter().copied())),
    }
}

/// Convert Markdown to an HTML fragment.
pub fn markdown_to_html(markdown: &str) -> String {
    let parser = Parser::new_ext(markdown, Options::ENABLE_STRIKETHROUGH);
    let mut out = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut out, parser);
    out
}

// ============================================================================
// Markdown
// ============================================================================

fn to_markdown(changelog: &Changelog) -> String {
    let mut out = String::new();
    if let Some(title) = &changelog.title {
        let _ = write!(out, "# {title}\n\n");
    }
    if let Some(preamble) = &changelog.preamble {
        let _ = write!(out, "{preamble}\n\n");
    }
    for section in &changelog.sections {
        write_section_markdown(&mut out, section);
    }
    for reference in &changelog.references {
        let _ = writeln!(out, "[{}]: {}", reference.label, reference.url);
    }
    finish(out)
}

fn sections_to_markdown(sections: &[&Section]) -> String {
    let mut out = String::new();
    for section in sections {
        write_section_markdown(&mut out, section);
    }
    finish(out)
}

fn write_section_markdown(out: &mut String, section: &Section) {
    let _ = write!(out, "## {}\n\n", section.heading);
    for category in section.categories() {
        if let Some(name) = category {
            let _ = write!(out, "### {name}\n\n");
        }
        for entry in section
            .entries
            .iter()
            .filter(|e| e.category.as_deref() == category)
        {
            let _ = writeln!(out, "{}", entry.raw);
        }
        out.push('\n');
    }
}

fn finish(out: String) -> String {
    let trimmed = out.trim_end();
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("{trimmed}\n")
    }
}

// ============================================================================
// Text
// ============================================================================

fn sections_to_text<'a>(sections: impl Iterator<Item = &'a Section>) -> String {
    let mut out = String::new();
    for section in sections {
        let label = match &section.release {
            ReleaseId::Version(v) => v.to_string(),
            ReleaseId::Unreleased => "Unreleased".to_string(),
            ReleaseId::Unrecognized(text) => text.clone(),
        };
        let count = section.entries.len();
        let noun = if count == 1 { "entry" } else { "entries" };
        match section.date {
            Some(date) => {
                let _ = writeln!(out, "{label} ({date}): {count} {noun}");
            }
            None => {
                let _ = writeln!(out, "{label}: {count} {noun}");
            }
        }
        for entry in &section.entries {
            let _ = writeln!(out, "  - {}", entry.text);
        }
    }
    out
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::markdown::parse_changelog;

    const SAMPLE: &str = "# Changelog\n\nNotable changes.\n\n## [0.7.4] - 2020-05-20\n\n- Loopback fix\n  - [f340b29](https://github.com/o/r/commit/f340b29) fix\n\n## [0.7.3]\n\n### Added\n\n- Notifications\n\n### Fixed\n\n- Asset embedding\n";

    #[test]
    fn test_format_from_str() {
        assert_eq!("md".parse::<Format>().unwrap(), Format::Markdown);
        assert_eq!("HTML".parse::<Format>().unwrap(), Format::Html);
        assert_eq!("json".parse::<Format>().unwrap(), Format::Json);
        assert_eq!("text".parse::<Format>().unwrap(), Format::Text);
        assert!("yaml".parse::<Format>().is_err());
    }

    #[test]
    fn test_markdown_is_stable() {
        let changelog = parse_changelog(SAMPLE);
        let rendered = render(&changelog, Format::Markdown).unwrap();
        assert_eq!(rendered, SAMPLE);

        let again = render(&parse_changelog(&rendered), Format::Markdown).unwrap();
        assert_eq!(again, rendered);
    }

    #[test]
    fn test_markdown_keeps_link_references() {
        let content = "# Changelog\n\n## [1.0.0]\n\n- a\n\n[1.0.0]: https://h/o/r/releases/tag/v1.0.0\n";
        let rendered = render(&parse_changelog(content), Format::Markdown).unwrap();
        assert_eq!(rendered, content);
    }

    #[test]
    fn test_markdown_groups_categories() {
        let content = "## 1.0.0\n\n### Added\n\n- a\n\n### Fixed\n\n- b\n\n### Added\n\n- c\n";
        let rendered = render(&parse_changelog(content), Format::Markdown).unwrap();
        assert_eq!(
            rendered,
            "## 1.0.0\n\n### Added\n\n- a\n- c\n\n### Fixed\n\n- b\n"
        );
    }

    #[test]
    fn test_html_contains_headings_and_links() {
        let changelog = parse_changelog(SAMPLE);
        let html = render(&changelog, Format::Html).unwrap();
        assert!(html.contains("<h1>Changelog</h1>"));
        assert!(html.contains("<h2>[0.7.4] - 2020-05-20</h2>"));
        assert!(html.contains("href=\"https://github.com/o/r/commit/f340b29\""));
    }

    #[test]
    fn test_json_render() {
        let changelog = parse_changelog(SAMPLE);
        let json = render(&changelog, Format::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["title"], "Changelog");
        assert_eq!(value["sections"][0]["release"]["value"], "0.7.4");
        assert_eq!(value["sections"][0]["date"], "2020-05-20");
        assert_eq!(value["sections"][0]["entries"][0]["commits"][0]["sha"], "f340b29");
    }

    #[test]
    fn test_text_render() {
        let changelog = parse_changelog(SAMPLE);
        let text = render(&changelog, Format::Text).unwrap();
        assert_eq!(
            text,
            "0.7.4 (2020-05-20): 1 entry\n  - Loopback fix\n0.7.3: 2 entries\n  - Notifications\n  - Asset embedding\n"
        );
    }

    #[test]
    fn test_render_section_json_is_object() {
        let changelog = parse_changelog(SAMPLE);
        let json = render_section(changelog.latest().unwrap(), Format::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert!(value.is_object());
        assert_eq!(value["heading"], "[0.7.4] - 2020-05-20");
    }

    #[test]
    fn test_render_sections_markdown() {
        let changelog = parse_changelog(SAMPLE);
        let sections: Vec<&Section> = changelog.sections.iter().collect();
        let md = render_sections(&sections[1..], Format::Markdown).unwrap();
        assert!(md.starts_with("## [0.7.3]\n"));
        assert!(!md.contains("0.7.4"));
    }

    #[test]
    fn test_render_empty_changelog() {
        let changelog = Changelog::default();
        assert_eq!(render(&changelog, Format::Markdown).unwrap(), "");
        assert_eq!(render(&changelog, Format::Text).unwrap(), "");
    }
}
