//! Changelog command handlers.
//!
//! Handlers that produce output build it as a `String` so the dispatcher
//! decides where it goes; only `lint`, `release`, and `serve` print directly.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDate};
use relnotes_content::{
    Format, LintReport, apply_release, lint, load_changelog, parse_changelog, read_source,
    render, render_section, render_sections, suggest_version, write_source,
};
use relnotes_core::{Changelog, Port, ReleaseId, RelnotesConfig, Section, Version};
use relnotes_serve::AppState;

use crate::cli::Commands;
use crate::config_handlers::handle_config_command;
use crate::error::{Error, Result};

/// Everything a command needs besides its own arguments.
#[derive(Debug, Clone)]
pub struct Context {
    /// Loaded configuration
    pub config: RelnotesConfig,
    /// Explicit config file, if one was given
    pub config_path: Option<String>,
    /// Changelog the commands operate on
    pub changelog_path: PathBuf,
}

impl Context {
    /// Build a context; `changelog` overrides the configured file.
    pub fn new(
        config: RelnotesConfig,
        config_path: Option<String>,
        changelog: Option<PathBuf>,
    ) -> Self {
        let changelog_path = changelog.unwrap_or_else(|| PathBuf::from(&config.changelog));
        Self {
            config,
            config_path,
            changelog_path,
        }
    }

    async fn load(&self) -> Result<Changelog> {
        Ok(load_changelog(&self.changelog_path).await?)
    }
}

/// Run one command.
pub async fn run(command: Commands, ctx: &Context) -> Result<()> {
    match command {
        Commands::Lint { deny_warnings } => cmd_lint(ctx, deny_warnings).await,
        Commands::List => emit(&list_output(&ctx.load().await?)),
        Commands::Show { version, format } => {
            emit(&show_output(&ctx.load().await?, &version, format)?)
        }
        Commands::Latest { format } => emit(&latest_output(&ctx.load().await?, format)?),
        Commands::Range { from, to, format } => {
            emit(&range_output(&ctx.load().await?, &from, &to, format)?)
        }
        Commands::Render { format, output } => cmd_render(ctx, format, output.as_deref()).await,
        Commands::Release {
            version,
            date,
            today,
            keep_unreleased,
            dry_run,
        } => {
            let date = if today {
                Some(Local::now().date_naive())
            } else {
                date
            };
            let out = cmd_release(ctx, &version, date, keep_unreleased, dry_run).await?;
            emit(&out)
        }
        Commands::Serve { host, port } => cmd_serve(ctx, host, port).await,
        Commands::Config { action } => {
            Ok(handle_config_command(ctx.config_path.as_deref(), action)?)
        }
    }
}

fn emit(output: &str) -> Result<()> {
    if output.is_empty() {
        return Ok(());
    }
    if output.ends_with('\n') {
        print!("{output}");
    } else {
        println!("{output}");
    }
    Ok(())
}

// ============================================================================
// lint
// ============================================================================

/// Lint the changelog, print findings, and fail if it does not pass.
pub async fn cmd_lint(ctx: &Context, deny_warnings: bool) -> Result<()> {
    let changelog = ctx.load().await?;
    let report = lint(&changelog, &ctx.config.lint);
    print!("{}", lint_output(&ctx.changelog_path, &report));

    let deny = deny_warnings || ctx.config.lint.deny_warnings;
    if report.is_ok(deny) {
        Ok(())
    } else {
        Err(Error::LintFailed {
            errors: report.error_count(),
            warnings: report.warning_count(),
        })
    }
}

/// Findings as `path:line: severity[rule]: message` plus a summary line.
pub fn lint_output(path: &Path, report: &LintReport) -> String {
    let mut out = String::new();
    for diagnostic in report.diagnostics() {
        let _ = writeln!(out, "{}:{diagnostic}", path.display());
    }
    if report.diagnostics().is_empty() {
        let _ = writeln!(out, "{}: ok", path.display());
    } else {
        let _ = writeln!(
            out,
            "{}: {} error(s), {} warning(s)",
            path.display(),
            report.error_count(),
            report.warning_count()
        );
    }
    out
}

// ============================================================================
// Queries
// ============================================================================

/// One line per section: label, date, and entry count.
pub fn list_output(changelog: &Changelog) -> String {
    let mut out = String::new();
    for section in &changelog.sections {
        let date = section
            .date
            .map(|d| d.to_string())
            .unwrap_or_else(|| "-".to_string());
        let count = section.entries.len();
        let noun = if count == 1 { "entry" } else { "entries" };
        let _ = writeln!(out, "{:<14} {date:<10} {count} {noun}", label(section));
    }
    out
}

fn label(section: &Section) -> String {
    match &section.release {
        ReleaseId::Version(v) => v.to_string(),
        ReleaseId::Unreleased => "Unreleased".to_string(),
        ReleaseId::Unrecognized(text) => text.clone(),
    }
}

/// Render one section; `unreleased` selects the Unreleased section.
pub fn show_output(changelog: &Changelog, version: &str, format: Format) -> Result<String> {
    if version.trim().eq_ignore_ascii_case("unreleased") {
        let section = changelog.unreleased().ok_or_else(|| Error::UnknownVersion {
            version: "Unreleased".to_string(),
            suggestion: None,
        })?;
        return Ok(render_section(section, format)?);
    }

    let parsed: Version = version.parse()?;
    match changelog.find(&parsed) {
        Some(section) => Ok(render_section(section, format)?),
        None => Err(Error::UnknownVersion {
            version: parsed.to_string(),
            suggestion: suggest_version(changelog, version).map(ToString::to_string),
        }),
    }
}

/// Render the latest released section.
pub fn latest_output(changelog: &Changelog, format: Format) -> Result<String> {
    let section = changelog.latest().ok_or_else(|| Error::UnknownVersion {
        version: "latest".to_string(),
        suggestion: None,
    })?;
    Ok(render_section(section, format)?)
}

/// Render the sections with `from < version <= to`.
pub fn range_output(changelog: &Changelog, from: &str, to: &str, format: Format) -> Result<String> {
    let from: Version = from.parse()?;
    let to: Version = to.parse()?;
    if from > to {
        return Err(Error::InvalidRange {
            from: from.to_string(),
            to: to.to_string(),
        });
    }

    let sections = changelog.range(&from, &to);
    if sections.is_empty() {
        log::warn!("No releases after {from} up to {to}");
    }
    Ok(render_sections(&sections, format)?)
}

/// Render the whole changelog to stdout or a file.
pub async fn cmd_render(ctx: &Context, format: Format, output: Option<&Path>) -> Result<()> {
    let rendered = render(&ctx.load().await?, format)?;
    match output {
        Some(path) => {
            write_source(path, &rendered).await?;
            println!("Wrote {format} to {}", path.display());
            Ok(())
        }
        None => emit(&rendered),
    }
}

// ============================================================================
// release
// ============================================================================

/// Resolve `major`/`minor`/`patch` against the latest release, or parse a version.
///
/// Bumping with no prior release starts from `0.0.0`.
pub fn release_version(changelog: &Changelog, requested: &str) -> Result<Version> {
    let base = || {
        changelog
            .latest()
            .and_then(Section::version)
            .cloned()
            .unwrap_or_else(|| Version::new(0, 0, 0))
    };
    let version = match requested.trim().to_ascii_lowercase().as_str() {
        "major" => base().bump_major()?,
        "minor" => base().bump_minor()?,
        "patch" => base().bump_patch()?,
        _ => requested.parse()?,
    };
    Ok(version)
}

/// Promote the Unreleased section and write the file.
///
/// Returns the message to print, or the edited changelog when `dry_run`.
pub async fn cmd_release(
    ctx: &Context,
    requested: &str,
    date: Option<NaiveDate>,
    keep_unreleased: bool,
    dry_run: bool,
) -> Result<String> {
    let path = &ctx.changelog_path;
    let source = read_source(path).await?;
    let version = release_version(&parse_changelog(&source), requested)?;
    let edit = apply_release(&source, version.clone(), date, keep_unreleased)?;

    if dry_run {
        log::info!("Dry run, {} left unchanged", path.display());
        return Ok(edit.source);
    }

    write_source(path, &edit.source).await?;
    Ok(format!(
        "Released {version} in {}:{}",
        path.display(),
        edit.line
    ))
}

// ============================================================================
// serve
// ============================================================================

/// Preview the changelog until Ctrl-C.
pub async fn cmd_serve(ctx: &Context, host: Option<String>, port: Option<Port>) -> Result<()> {
    // Fail early on a missing or unreadable file.
    ctx.load().await?;

    let mut serve = ctx.config.serve.clone();
    if let Some(host) = host {
        serve.host = host;
    }
    if let Some(port) = port {
        serve.port = port;
    }

    let (listener, url) = relnotes_serve::bind(&serve).await?;
    println!("Previewing {} at {url}", ctx.changelog_path.display());
    println!("Press Ctrl-C to stop");

    let state = AppState::new(&ctx.changelog_path, ctx.config.lint.clone());
    relnotes_serve::serve_listener(listener, state, async {
        let _ = tokio::signal::ctrl_c().await;
    })
    .await?;
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
