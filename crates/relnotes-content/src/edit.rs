//! In-place edits of changelog source.
//!
//! Edits rewrite only the lines they own so that prose, comments, and
//! formatting elsewhere in the file survive untouched.

use chrono::NaiveDate;
use relnotes_core::model::release_heading;
use relnotes_core::{Changelog, Error, Result, Version};

use crate::markdown::parse_changelog;

/// Heading inserted when a fresh `Unreleased` section is requested.
pub const UNRELEASED_HEADING: &str = "## [Unreleased]";

/// Result of a release edit.
#[derive(Debug, Clone)]
pub struct ReleaseEdit {
    /// Updated changelog source
    pub source: String,
    /// The updated source, parsed
    pub changelog: Changelog,
    /// 1-based line of the new release heading
    pub line: usize,
}

/// Promote the `Unreleased` section of `source` to `version`.
///
/// The same checks as [`Changelog::release`] apply. Only the heading line is
/// rewritten; with `keep_unreleased` an empty `Unreleased` heading is added
/// above it.
///
/// # Example
///
/// ```rust
/// use relnotes_content::edit::apply_release;
///
/// let source = "# Changelog\n\n## Unreleased\n\n- New thing\n\n## [0.1.0]\n\n- Old thing\n";
/// let edit = apply_release(source, "0.2.0".parse().unwrap(), None, false).unwrap();
/// assert_eq!(
///     edit.source,
///     "# Changelog\n\n## [0.2.0]\n\n- New thing\n\n## [0.1.0]\n\n- Old thing\n"
/// );
/// ```
pub fn apply_release(
    source: &str,
    version: Version,
    date: Option<NaiveDate>,
    keep_unreleased: bool,
) -> Result<ReleaseEdit> {
    let mut changelog = parse_changelog(source);
    let line = changelog
        .unreleased()
        .map(|s| s.line)
        .ok_or(Error::NoUnreleasedSection)?;
    changelog.release(version.clone(), date)?;

    let heading = format!("## {}", release_heading(&version, date));
    let lines: Vec<&str> = source.split_inclusive('\n').collect();
    let index = line - 1;
    let content = |i: usize| lines.get(i).map(|l| l.trim_end_matches(['\r', '\n']));

    // Setext headings carry an underline that has to go with them.
    let atx = content(index).is_some_and(|current| current.trim_start().starts_with('#'));
    let underlined = !atx
        && content(index + 1).is_some_and(|next| {
            let next = next.trim();
            !next.is_empty() && (next.chars().all(|c| c == '-') || next.chars().all(|c| c == '='))
        });
    let replaced = if underlined { 2 } else { 1 };

    // The rewritten heading keeps the terminator of the line it replaces.
    let last = lines.get(index + replaced - 1).copied().unwrap_or_default();
    let ending = &last[last.trim_end_matches(['\r', '\n']).len()..];
    let separator = match ending {
        "" => lines
            .first()
            .filter(|l| l.ends_with("\r\n"))
            .map_or("\n", |_| "\r\n"),
        ending => ending,
    };

    let mut updated = String::with_capacity(source.len() + heading.len() + separator.len() * 2);
    for l in &lines[..index.min(lines.len())] {
        updated.push_str(l);
    }
    if keep_unreleased {
        updated.push_str(UNRELEASED_HEADING);
        updated.push_str(separator);
        updated.push_str(separator);
    }
    updated.push_str(&heading);
    updated.push_str(ending);
    for l in &lines[(index + replaced).min(lines.len())..] {
        updated.push_str(l);
    }

    let changelog = parse_changelog(&updated);
    let new_line = if keep_unreleased { line + 2 } else { line };
    log::info!("Released {version} at line {new_line}");

    Ok(ReleaseEdit {
        source: updated,
        changelog,
        line: new_line,
    })
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const SOURCE: &str = "# Changelog\n\n<!-- keep this comment -->\n\n## [Unreleased]\n\nSome prose about the release.\n\n- New thing\n\n## [0.1.0]\n\n- Old thing\n";

    #[test]
    fn test_release_rewrites_only_heading() {
        let date = NaiveDate::from_ymd_opt(2020, 5, 20);
        let edit = apply_release(SOURCE, "0.2.0".parse().unwrap(), date, false).unwrap();
        assert_eq!(
            edit.source,
            SOURCE.replace("## [Unreleased]", "## [0.2.0] - 2020-05-20")
        );
        assert_eq!(edit.line, 5);
        assert!(edit.changelog.unreleased().is_none());
        assert_eq!(
            edit.changelog.latest().unwrap().date,
            NaiveDate::from_ymd_opt(2020, 5, 20)
        );
    }

    #[test]
    fn test_release_keeps_unreleased() {
        let edit = apply_release(SOURCE, "0.2.0".parse().unwrap(), None, true).unwrap();
        assert!(edit.source.contains("## [Unreleased]\n\n## [0.2.0]\n\nSome prose"));
        assert_eq!(edit.line, 7);
        assert!(edit.changelog.unreleased().unwrap().entries.is_empty());
        assert_eq!(edit.changelog.latest().unwrap().entries.len(), 1);
    }

    #[test]
    fn test_release_setext_heading() {
        let source = "Changelog\n=========\n\nUnreleased\n----------\n\n- x\n";
        let edit = apply_release(source, "1.0.0".parse().unwrap(), None, false).unwrap();
        assert_eq!(edit.source, "Changelog\n=========\n\n## [1.0.0]\n\n- x\n");
    }

    #[test]
    fn test_release_errors() {
        let err = apply_release("## [0.1.0]\n\n- a\n", "0.2.0".parse().unwrap(), None, false)
            .unwrap_err();
        assert!(matches!(err, Error::NoUnreleasedSection));

        let err = apply_release(SOURCE, "0.1.0".parse().unwrap(), None, false).unwrap_err();
        assert!(matches!(err, Error::DuplicateVersion { .. }));

        let err = apply_release(SOURCE, "0.0.9".parse().unwrap(), None, false).unwrap_err();
        assert!(matches!(err, Error::VersionNotGreater { .. }));
    }

    #[test]
    fn test_release_keeps_thematic_break_after_atx_heading() {
        let source = "## Unreleased\n---\n\n- a\n";
        let edit = apply_release(source, "0.1.0".parse().unwrap(), None, false).unwrap();
        assert_eq!(edit.source, "## [0.1.0]\n---\n\n- a\n");
    }

    #[test]
    fn test_release_preserves_crlf_line_endings() {
        let source = "# Changelog\r\n\r\n## Unreleased\r\n\r\n- a\r\n\r\n## [0.1.0]\r\n\r\n- b\r\n";
        let edit = apply_release(source, "0.2.0".parse().unwrap(), None, false).unwrap();
        assert_eq!(edit.source, source.replace("## Unreleased", "## [0.2.0]"));
        assert_eq!(edit.line, 3);

        let edit = apply_release(source, "0.2.0".parse().unwrap(), None, true).unwrap();
        assert_eq!(
            edit.source,
            source.replace("## Unreleased", "## [Unreleased]\r\n\r\n## [0.2.0]")
        );
        assert_eq!(edit.changelog.latest().unwrap().entries.len(), 1);
    }

    #[test]
    fn test_release_setext_heading_crlf() {
        let source = "Unreleased\r\n----------\r\n\r\n- x\r\n";
        let edit = apply_release(source, "1.0.0".parse().unwrap(), None, false).unwrap();
        assert_eq!(edit.source, "## [1.0.0]\r\n\r\n- x\r\n");
    }

    #[test]
    fn test_release_without_trailing_newline() {
        let edit =
            apply_release("## Unreleased\n\n- a", "0.1.0".parse().unwrap(), None, false).unwrap();
        assert_eq!(edit.source, "## [0.1.0]\n\n- a");
    }
}
