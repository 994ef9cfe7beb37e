//! Changelog structure parsing.
//!
//! Walks the `pulldown-cmark` event stream of a changelog and builds a
//! [`Changelog`]:
//!
//! - the first `#` heading is the title, Markdown up to the first `##` is the preamble
//! - every `##` heading opens a [`Section`]
//! - `###` and deeper headings set the category of the bullets that follow
//! - top-level bullets are entries, nested bullets are their details
//! - links to commits are collected per entry
//!
//! Parsing never fails. Headings that are not versions become
//! [`ReleaseId::Unrecognized`] and are reported by the linter instead.
//!
//! # Example
//!
//! ```rust
//! use relnotes_content::markdown::parser::parse_changelog;
//!
//! let content = "# Changelog\n\n## [0.7.4]\n\n- Fix loopback output\n\n## [0.7.3]\n\n- Embed assets\n";
//! let changelog = parse_changelog(content);
//!
//! assert_eq!(changelog.title.as_deref(), Some("Changelog"));
//! assert_eq!(changelog.sections.len(), 2);
//! assert_eq!(changelog.sections[0].entries[0].text, "Fix loopback output");
//! assert!(changelog.is_descending());
//! ```

use std::ops::Range;
use std::sync::LazyLock;

use pulldown_cmark::{Event, HeadingLevel, Options, Parser, Tag, TagEnd};
use regex::Regex;
use relnotes_core::{Changelog, CommitLink, Entry, LinkReference, Section};

use super::helpers::{extract_commit_sha, normalize_whitespace, parse_heading, LineIndex};

static LINK_REFERENCE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\[([^\]]+)\]:\s*<?([^\s>]+)>?").expect("Invalid link reference regex")
});

/// Parse changelog Markdown into the model.
pub fn parse_changelog(content: &str) -> Changelog {
    let mut state = ParseState::new(content);
    let parser = Parser::new_ext(content, Options::ENABLE_STRIKETHROUGH).into_offset_iter();
    for (event, range) in parser {
        state.handle(event, range);
    }
    let changelog = state.finish();
    log::debug!(
        "Parsed changelog: {} sections, {} entries",
        changelog.sections.len(),
        changelog.entry_count()
    );
    changelog
}

// ============================================================================
// Parse state
// ============================================================================

struct HeadingCapture {
    level: HeadingLevel,
    text: String,
}

struct EntryCapture {
    entry: Entry,
    /// Indexes into `entry.details` of the nested bullets currently open
    open_details: Vec<usize>,
}

struct LinkCapture {
    url: String,
    text: String,
}

struct ParseState<'a> {
    source: &'a str,
    lines: LineIndex,
    changelog: Changelog,
    heading: Option<HeadingCapture>,
    category: Option<String>,
    list_depth: usize,
    code_block_depth: usize,
    entry: Option<EntryCapture>,
    link: Option<LinkCapture>,
    title_end: Option<usize>,
    first_section_start: Option<usize>,
}

impl<'a> ParseState<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            lines: LineIndex::new(source),
            changelog: Changelog::default(),
            heading: None,
            category: None,
            list_depth: 0,
            code_block_depth: 0,
            entry: None,
            link: None,
            title_end: None,
            first_section_start: None,
        }
    }

    fn handle(&mut self, event: Event<'_>, range: Range<usize>) {
        match event {
            Event::Start(Tag::Heading { level, .. }) => {
                self.heading = Some(HeadingCapture {
                    level,
                    text: String::new(),
                });
            }
            Event::End(TagEnd::Heading(_)) => self.end_heading(range),

            Event::Start(Tag::List(_)) => self.list_depth += 1,
            Event::End(TagEnd::List(_)) => self.list_depth = self.list_depth.saturating_sub(1),

            Event::Start(Tag::Item) => self.start_item(range),
            Event::End(TagEnd::Item) => self.end_item(),

            Event::Start(Tag::Link { dest_url, .. }) => {
                self.link = Some(LinkCapture {
                    url: dest_url.to_string(),
                    text: String::new(),
                });
            }
            Event::End(TagEnd::Link) => self.end_link(),

            Event::Start(Tag::CodeBlock(_)) => self.code_block_depth += 1,
            Event::End(TagEnd::CodeBlock) => {
                self.code_block_depth = self.code_block_depth.saturating_sub(1)
            }

            Event::Text(text) | Event::Code(text) if self.code_block_depth == 0 => {
                self.push_text(&text)
            }
            Event::SoftBreak | Event::HardBreak => self.push_text(" "),
            Event::End(TagEnd::Paragraph) => self.push_text(" "),

            _ => {}
        }
    }

    fn push_text(&mut self, text: &str) {
        if let Some(heading) = &mut self.heading {
            heading.text.push_str(text);
            return;
        }
        if let Some(link) = &mut self.link {
            link.text.push_str(text);
        }
        if let Some(capture) = &mut self.entry {
            match capture.open_details.last() {
                Some(&index) => capture.entry.details[index].push_str(text),
                None => capture.entry.text.push_str(text),
            }
        }
    }

    fn end_heading(&mut self, range: Range<usize>) {
        let Some(heading) = self.heading.take() else {
            return;
        };
        let line = self.lines.line_of(range.start);
        let raw = heading_source(&self.source[range.clone()]);

        match heading.level {
            HeadingLevel::H1 => {
                if self.changelog.title.is_none() && self.first_section_start.is_none() {
                    self.changelog.title = Some(raw);
                    self.title_end = Some(range.end);
                } else {
                    log::debug!("Ignoring extra title on line {line}");
                }
            }
            HeadingLevel::H2 => {
                self.first_section_start.get_or_insert(range.start);
                let (release, date) = parse_heading(&raw);
                self.changelog.sections.push(Section {
                    release,
                    heading: raw,
                    date,
                    entries: Vec::new(),
                    line,
                });
                self.category = None;
            }
            _ => {
                if self.changelog.sections.is_empty() {
                    return;
                }
                self.category = Some(normalize_whitespace(&heading.text));
            }
        }
    }

    fn start_item(&mut self, range: Range<usize>) {
        if self.changelog.sections.is_empty() {
            return;
        }

        if self.list_depth <= 1 {
            let raw = self.source[range.clone()].trim_end().to_string();
            self.entry = Some(EntryCapture {
                entry: Entry {
                    text: String::new(),
                    category: self.category.clone(),
                    details: Vec::new(),
                    commits: Vec::new(),
                    raw,
                    line: self.lines.line_of(range.start),
                },
                open_details: Vec::new(),
            });
        } else if let Some(capture) = &mut self.entry {
            capture.entry.details.push(String::new());
            capture.open_details.push(capture.entry.details.len() - 1);
        }
    }

    fn end_item(&mut self) {
        let Some(capture) = &mut self.entry else {
            return;
        };
        if capture.open_details.pop().is_some() {
            return;
        }

        let Some(EntryCapture { mut entry, .. }) = self.entry.take() else {
            return;
        };
        entry.text = normalize_whitespace(&entry.text);
        entry.details = entry
            .details
            .iter()
            .map(|d| normalize_whitespace(d))
            .filter(|d| !d.is_empty())
            .collect();

        if let Some(section) = self.changelog.sections.last_mut() {
            section.entries.push(entry);
        }
    }

    fn end_link(&mut self) {
        let Some(link) = self.link.take() else {
            return;
        };
        let Some(capture) = &mut self.entry else {
            return;
        };
        if let Some(sha) = extract_commit_sha(&link.url, &link.text) {
            if !capture.entry.commits.iter().any(|c| c.sha == sha) {
                capture.entry.commits.push(CommitLink { sha, url: link.url });
            }
        }
    }

    fn finish(mut self) -> Changelog {
        let start = self.title_end.unwrap_or(0);
        let end = self.first_section_start.unwrap_or(self.source.len());
        if start < end {
            let preamble = self.source[start..end].trim();
            if !preamble.is_empty() {
                self.changelog.preamble = Some(preamble.to_string());
            }
        }
        if let Some(first) = self.first_section_start {
            self.changelog.references = extract_link_references(&self.source[first..]);
        }
        self.changelog
    }
}

/// Heading content as written: marker and closing `#`s removed, inline
/// Markdown (brackets, links) kept.
fn heading_source(raw: &str) -> String {
    let line = raw.lines().next().unwrap_or_default().trim();
    let content = line.trim_start_matches('#').trim();
    let without_closing = content.trim_end_matches('#');
    let content = if without_closing.len() < content.len()
        && (without_closing.is_empty() || without_closing.ends_with(' '))
    {
        without_closing.trim_end()
    } else {
        content
    };
    normalize_whitespace(content)
}

/// Top-level `[label]: url` definitions outside fenced code.
fn extract_link_references(source: &str) -> Vec<LinkReference> {
    let mut references = Vec::new();
    let mut in_fence = false;
    for line in source.lines() {
        let trimmed = line.trim_start();
        if trimmed.starts_with("```") || trimmed.starts_with("~~~") {
            in_fence = !in_fence;
            continue;
        }
        if in_fence || line.len() - trimmed.len() > 3 {
            continue;
        }
        if let Some(caps) = LINK_REFERENCE_RE.captures(trimmed) {
            references.push(LinkReference {
                label: caps[1].to_string(),
                url: caps[2].to_string(),
            });
        }
    }
    references
}

// ============================================================================
// Tests
// ============================================================================
