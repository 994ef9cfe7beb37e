//! Configuration file handling.
//!
//! relnotes reads a TOML file whose location is resolved by
//! [`ConfigManager::resolve_config_path`], falls back to defaults when no file
//! exists, and then applies `RELNOTES_*` environment overrides.
//!
//! ```toml
//! changelog = "CHANGELOG.md"
//! log_level = "warn"
//!
//! [lint]
//! allow_unreleased = true
//! require_entries = true
//! require_commit_links = false
//! deny_warnings = false
//!
//! [serve]
//! host = "127.0.0.1"
//! port = "random"
//! ```

use std::env;
use std::ffi::OsString;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{Error, Result};

// ============================================================================
// ConfigManager
// ============================================================================

/// Shared behavior for loading and exporting a project configuration.
pub trait ConfigManager: Default + Serialize + DeserializeOwned {
    /// Project name, used for directory names and the env var prefix.
    fn project_name() -> &'static str;

    /// Environment variable prefix (`relnotes` → `RELNOTES`).
    fn env_prefix() -> String {
        Self::project_name().to_uppercase().replace(['-', ' '], "_")
    }

    /// Config file looked for in the working directory.
    fn local_config_file() -> String {
        format!("{}.toml", Self::project_name())
    }

    /// Platform config location, e.g. `~/.config/relnotes/config.toml`.
    fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(Self::project_name()).join("config.toml"))
    }

    /// Resolve the config file path.
    ///
    /// Checks in order:
    /// 1. The explicit path
    /// 2. `{PREFIX}_CONFIG` environment variable
    /// 3. `{project}.toml` in the working directory, if it exists
    /// 4. [`ConfigManager::default_config_path`]
    fn resolve_config_path(explicit: Option<&str>) -> Option<PathBuf> {
        if let Some(path) = explicit {
            return Some(PathBuf::from(path));
        }
        if let Ok(path) = env::var(format!("{}_CONFIG", Self::env_prefix())) {
            return Some(PathBuf::from(path));
        }
        let local = PathBuf::from(Self::local_config_file());
        if local.exists() {
            return Some(local);
        }
        Self::default_config_path()
    }

    /// Apply environment overrides. The default does nothing.
    fn apply_env_overrides<I>(&mut self, _vars: I) -> Result<()>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        Ok(())
    }

    /// Load the configuration.
    ///
    /// An explicit path that does not exist is an error; otherwise a missing
    /// file means defaults. Environment overrides are applied last.
    fn load(explicit: Option<&str>) -> Result<Self> {
        let mut config = match Self::resolve_config_path(explicit) {
            Some(path) if path.exists() => {
                log::debug!("Loading config from {}", path.display());
                let content =
                    std::fs::read_to_string(&path).map_err(|e| Error::io_with_path(e, &path))?;
                toml::from_str(&content).map_err(|e| {
                    Error::config(format!("Failed to parse {}: {e}", path.display()))
                })?
            }
            Some(path) if explicit.is_some() => {
                return Err(Error::config(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
            _ => {
                log::debug!("No config file found, using defaults");
                Self::default()
            }
        };
        config.apply_env_overrides(prefixed_vars(env::vars_os(), &Self::env_prefix())?)?;
        Ok(config)
    }

    /// Serialize as pretty TOML.
    fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::config(e.to_string()))
    }

    /// The configuration as `(NAME, value)` environment variable pairs.
    fn to_env_vars(&self) -> Result<Vec<(String, String)>>;
}

// ============================================================================
// Port
// ============================================================================

/// Port for the preview server: a fixed value or any free port.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Port {
    /// Pick an available port at startup.
    #[default]
    Random,
    /// Use exactly this port.
    Value(u16),
}

impl fmt::Display for Port {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Random => f.write_str("random"),
            Self::Value(port) => write!(f, "{port}"),
        }
    }
}

impl FromStr for Port {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("random") {
            return Ok(Self::Random);
        }
        s.parse::<u16>()
            .map(Self::Value)
            .map_err(|_| Error::config(format!("Invalid port '{s}': expected \"random\" or 0-65535")))
    }
}

impl Serialize for Port {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Self::Random => serializer.serialize_str("random"),
            Self::Value(port) => serializer.serialize_u16(*port),
        }
    }
}

impl<'de> Deserialize<'de> for Port {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Number(u16),
            Text(String),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Number(port) => Ok(Self::Value(port)),
            Repr::Text(text) => text.parse().map_err(serde::de::Error::custom),
        }
    }
}

// ============================================================================
// RelnotesConfig
// ============================================================================

/// Lint rule switches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LintConfig {
    /// Permit an `Unreleased` section at the top
    pub allow_unreleased: bool,
    /// Warn on released sections with no entries
    pub require_entries: bool,
    /// Warn on entries without a commit link
    pub require_commit_links: bool,
    /// Treat warnings as failures
    pub deny_warnings: bool,
}

impl Default for LintConfig {
    fn default() -> Self {
        Self {
            allow_unreleased: true,
            require_entries: true,
            require_commit_links: false,
            deny_warnings: false,
        }
    }
}

/// Preview server settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServeConfig {
    /// Host or URL to listen on
    pub host: String,
    /// `"random"` or a port number
    pub port: Port,
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: Port::Random,
        }
    }
}

/// Top-level relnotes configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelnotesConfig {
    /// Path of the changelog file
    pub changelog: String,
    /// Default log filter when neither `RUST_LOG` nor `-v`/`-q` is given
    pub log_level: String,
    /// Lint settings
    pub lint: LintConfig,
    /// Preview server settings
    pub serve: ServeConfig,
}

impl Default for RelnotesConfig {
    fn default() -> Self {
        Self {
            changelog: "CHANGELOG.md".to_string(),
            log_level: "warn".to_string(),
            lint: LintConfig::default(),
            serve: ServeConfig::default(),
        }
    }
}

impl ConfigManager for RelnotesConfig {
    fn project_name() -> &'static str {
        "relnotes"
    }

    fn apply_env_overrides<I>(&mut self, vars: I) -> Result<()>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let prefix = format!("{}_", Self::env_prefix());
        for (key, value) in vars {
            let Some(name) = key.strip_prefix(&prefix) else {
                continue;
            };
            match name {
                "CHANGELOG" => self.changelog = value,
                "LOG_LEVEL" => self.log_level = value,
                "SERVE_HOST" => self.serve.host = value,
                "SERVE_PORT" => self.serve.port = value.parse()?,
                "LINT_ALLOW_UNRELEASED" => self.lint.allow_unreleased = parse_bool(&key, &value)?,
                "LINT_REQUIRE_ENTRIES" => self.lint.require_entries = parse_bool(&key, &value)?,
                "LINT_REQUIRE_COMMIT_LINKS" => {
                    self.lint.require_commit_links = parse_bool(&key, &value)?
                }
                "LINT_DENY_WARNINGS" => self.lint.deny_warnings = parse_bool(&key, &value)?,
                _ => continue,
            }
            log::debug!("Config override from {key}");
        }
        Ok(())
    }

    fn to_env_vars(&self) -> Result<Vec<(String, String)>> {
        let prefix = Self::env_prefix();
        let var = |name: &str, value: String| (format!("{prefix}_{name}"), value);
        Ok(vec![
            var("CHANGELOG", self.changelog.clone()),
            var("LOG_LEVEL", self.log_level.clone()),
            var("SERVE_HOST", self.serve.host.clone()),
            var("SERVE_PORT", self.serve.port.to_string()),
            var("LINT_ALLOW_UNRELEASED", self.lint.allow_unreleased.to_string()),
            var("LINT_REQUIRE_ENTRIES", self.lint.require_entries.to_string()),
            var(
                "LINT_REQUIRE_COMMIT_LINKS",
                self.lint.require_commit_links.to_string(),
            ),
            var("LINT_DENY_WARNINGS", self.lint.deny_warnings.to_string()),
        ])
    }
}

/// Environment pairs whose key starts with `prefix`, as UTF-8.
///
/// Unrelated variables are skipped without being decoded, so a non-Unicode
/// value elsewhere in the environment is harmless.
fn prefixed_vars<I>(vars: I, prefix: &str) -> Result<Vec<(String, String)>>
where
    I: IntoIterator<Item = (OsString, OsString)>,
{
    vars.into_iter()
        .filter_map(|(key, value)| {
            let key = key.into_string().ok()?;
            key.starts_with(prefix).then_some((key, value))
        })
        .map(|(key, value)| {
            let value = value
                .into_string()
                .map_err(|_| Error::config(format!("{key} is not valid Unicode")))?;
            Ok((key, value))
        })
        .collect()
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(Error::config(format!("{key}: expected a boolean, got '{other}'"))),
    }
}

// ============================================================================
// Tests
// ============================================================================
