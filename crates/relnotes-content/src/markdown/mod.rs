//! Changelog Markdown parsing.
//!
//! - [`parser`]: Event-stream parsing into the changelog model
//! - [`helpers`]: Heading classification, commit link detection, line lookup
//!
//! # Example
//!
//! ```rust
//! use relnotes_content::markdown::parse_changelog;
//!
//! let content = "## [Unreleased]\n\n- Pending\n\n## [0.6.0]\n\n- First release\n";
//! let changelog = parse_changelog(content);
//!
//! assert!(changelog.unreleased().is_some());
//! assert_eq!(changelog.latest().unwrap().entries[0].text, "First release");
//! ```

pub mod helpers;
pub mod parser;

// Re-export key types and functions
pub use helpers::{extract_commit_sha, is_commit_sha, parse_heading, plain_text, LineIndex};
pub use parser::parse_changelog;
