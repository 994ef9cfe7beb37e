//! Changelog parsing, linting, editing, and rendering.
//!
//! This crate turns changelog Markdown into the `relnotes-core` model and
//! back. It has no CLI or server logic.
//!
//! # Modules
//!
//! - [`markdown`]: Markdown parsing into the changelog model
//!   - [`markdown::parser`]: Event-stream parser
//!   - [`markdown::helpers`]: Heading, commit, and line helpers
//! - [`lint`]: Structural rules (descending order, duplicates, placement)
//! - [`render`]: Markdown, HTML, JSON, and text output
//! - [`edit`]: Source-preserving edits such as releasing `Unreleased`
//! - [`suggest`]: "Did you mean" version suggestions
//! - [`loader`]: Async file access
//!
//! # Example
//!
//! ```rust
//! use relnotes_content::{lint, parse_changelog, render, Format};
//! use relnotes_core::LintConfig;
//!
//! let content = "# Changelog\n\n## [0.7.4]\n\n- Loopback fix\n\n## [0.7.3]\n\n- Asset embedding\n";
//! let changelog = parse_changelog(content);
//!
//! assert!(lint(&changelog, &LintConfig::default()).is_ok(true));
//! assert_eq!(render(&changelog, Format::Markdown).unwrap(), content);
//! ```

pub mod edit;
pub mod lint;
pub mod loader;
pub mod markdown;
pub mod render;
pub mod suggest;

// Re-export commonly used items
pub use edit::{apply_release, ReleaseEdit};
pub use lint::{lint, Diagnostic, LintReport, Rule, Severity};
pub use loader::{load_changelog, read_source, write_source};
pub use markdown::{extract_commit_sha, parse_changelog, parse_heading, plain_text};
pub use render::{render, render_section, render_sections, Format};
pub use suggest::suggest_version;
