//! Command-line argument definitions.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use relnotes_content::Format;
use relnotes_core::Port;

/// relnotes - changelog parsing, linting, and preview
#[derive(Parser, Debug)]
#[command(name = "relnotes", author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true, env = "RELNOTES_CONFIG")]
    pub config: Option<String>,

    /// Changelog file (overrides the configured one)
    #[arg(long, global = true)]
    pub changelog: Option<PathBuf>,

    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check the changelog structure
    Lint {
        /// Fail on warnings too
        #[arg(long)]
        deny_warnings: bool,
    },

    /// List sections with dates and entry counts
    List,

    /// Show one release
    Show {
        /// Version, or "unreleased"
        version: String,

        /// Output format: text, markdown, html, json
        #[arg(short, long, default_value = "text")]
        format: Format,
    },

    /// Show the latest release
    Latest {
        /// Output format: text, markdown, html, json
        #[arg(short, long, default_value = "text")]
        format: Format,
    },

    /// Show releases after FROM up to and including TO
    Range {
        /// Exclusive lower bound
        from: String,

        /// Inclusive upper bound
        to: String,

        /// Output format: text, markdown, html, json
        #[arg(short, long, default_value = "text")]
        format: Format,
    },

    /// Render the whole changelog
    Render {
        /// Output format: text, markdown, html, json
        #[arg(short, long, default_value = "markdown")]
        format: Format,

        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Turn the Unreleased section into a release
    Release {
        /// Version number, or major/minor/patch to bump the latest release
        version: String,

        /// Release date (YYYY-MM-DD)
        #[arg(long, conflicts_with = "today")]
        date: Option<NaiveDate>,

        /// Use today's date
        #[arg(long)]
        today: bool,

        /// Add a fresh, empty Unreleased section
        #[arg(long)]
        keep_unreleased: bool,

        /// Print the result instead of writing the file
        #[arg(long)]
        dry_run: bool,
    },

    /// Preview the changelog in a browser
    Serve {
        /// Host or URL to listen on
        #[arg(long)]
        host: Option<String>,

        /// Port number or "random"
        #[arg(long)]
        port: Option<Port>,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// `config` subcommands.
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show the resolved config file path
    Path,

    /// Get a value by dotted key, e.g. serve.port
    Get {
        /// Dotted key
        key: String,
    },

    /// Set a value by dotted key in the config file
    Set {
        /// Dotted key
        key: String,
        /// New value
        value: String,
    },

    /// Create a default config file
    Init {
        /// Target file (defaults to the platform config path)
        #[arg(long)]
        file: Option<String>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Print the configuration as environment variables
    Export {
        /// Format as docker --env flags
        #[arg(long)]
        docker_env: bool,
    },
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_show_with_format() {
        let cli = Cli::try_parse_from(["relnotes", "show", "0.7.4", "--format", "json"]).unwrap();
        match cli.command {
            Commands::Show { version, format } => {
                assert_eq!(version, "0.7.4");
                assert_eq!(format, Format::Json);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_global_flags_after_subcommand() {
        let cli =
            Cli::try_parse_from(["relnotes", "list", "--changelog", "docs/CHANGES.md", "-vv"])
                .unwrap();
        assert_eq!(cli.changelog, Some(PathBuf::from("docs/CHANGES.md")));
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn test_parse_release_date() {
        let cli = Cli::try_parse_from(["relnotes", "release", "0.8.0", "--date", "2020-05-20"])
            .unwrap();
        match cli.command {
            Commands::Release { date, today, .. } => {
                assert_eq!(date, NaiveDate::from_ymd_opt(2020, 5, 20));
                assert!(!today);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_date_and_today_conflict() {
        let result = Cli::try_parse_from([
            "relnotes", "release", "0.8.0", "--date", "2020-05-20", "--today",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_serve_port() {
        let cli = Cli::try_parse_from(["relnotes", "serve", "--port", "random"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Serve {
                port: Some(Port::Random),
                ..
            }
        ));

        assert!(Cli::try_parse_from(["relnotes", "serve", "--port", "http"]).is_err());
    }

    #[test]
    fn test_bad_format_rejected() {
        assert!(Cli::try_parse_from(["relnotes", "latest", "--format", "yaml"]).is_err());
    }
}
