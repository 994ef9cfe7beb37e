//! relnotes core: shared types, errors, and configuration.
//!
//! This crate provides the foundational types used across all relnotes
//! crates. It has no internal relnotes dependencies (dependency level 0).
//!
//! # Modules
//!
//! - [`error`]: Error types and Result alias
//! - [`version`]: Semantic version parsing and precedence
//! - [`model`]: The changelog model and its queries and edits
//! - [`config`]: Configuration file handling

pub mod config;
pub mod error;
pub mod model;
pub mod version;

// Re-export key types at crate root for convenience
pub use config::{ConfigManager, LintConfig, Port, RelnotesConfig, ServeConfig};
pub use error::{Error, Result};
pub use model::{Changelog, CommitLink, Entry, LinkReference, ReleaseId, Section};
pub use version::{Prerelease, Version};
