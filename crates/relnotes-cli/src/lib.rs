//! # relnotes-cli
//!
//! Command-line front end for relnotes: lint, query, render, release, and
//! preview a changelog, plus config file management.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod cli;
pub mod commands;
pub mod config_handlers;
pub mod error;
pub mod logging;

pub use cli::{Cli, Commands, ConfigAction};
pub use commands::{Context, run};
pub use error::{Error, Result};
