//! "Did you mean" suggestions for version lookups.

use relnotes_core::{Changelog, Version};

/// Minimum Jaro-Winkler similarity for a suggestion.
const SIMILARITY_THRESHOLD: f64 = 0.8;

/// The known version closest to `input`, if any is close enough.
///
/// Ties go to the version that appears first, normally the newest.
///
/// # Example
///
/// ```rust
/// use relnotes_content::markdown::parse_changelog;
/// use relnotes_content::suggest::suggest_version;
///
/// let changelog = parse_changelog("## 0.7.4\n\n- a\n\n## 0.6.0\n\n- b\n");
/// let suggestion = suggest_version(&changelog, "0.7.5").unwrap();
/// assert_eq!(suggestion.to_string(), "0.7.4");
/// assert!(suggest_version(&changelog, "banana").is_none());
/// ```
pub fn suggest_version<'a>(changelog: &'a Changelog, input: &str) -> Option<&'a Version> {
    let trimmed = input.trim();
    let wanted = trimmed.strip_prefix(['v', 'V']).unwrap_or(trimmed);

    let mut best: Option<(&Version, f64)> = None;
    for version in changelog.versions() {
        let score = strsim::jaro_winkler(wanted, &version.to_string());
        if score >= SIMILARITY_THRESHOLD && best.is_none_or(|(_, top)| score > top) {
            best = Some((version, score));
        }
    }
    best.map(|(version, _)| version)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::markdown::parse_changelog;

    #[test]
    fn test_suggest_closest() {
        let changelog = parse_changelog("## 0.7.4\n\n## 0.7.3\n\n## 0.6.0\n");
        assert_eq!(
            suggest_version(&changelog, "v0.7.30").unwrap().to_string(),
            "0.7.3"
        );
    }

    #[test]
    fn test_suggest_prefers_newest_on_tie() {
        let changelog = parse_changelog("## 0.7.4\n\n## 0.7.3\n\n## 0.7.2\n");
        assert_eq!(
            suggest_version(&changelog, "0.7.5").unwrap().to_string(),
            "0.7.4"
        );
    }

    #[test]
    fn test_suggest_none_for_empty_changelog() {
        let changelog = parse_changelog("# Changelog\n");
        assert!(suggest_version(&changelog, "0.1.0").is_none());
    }
}
