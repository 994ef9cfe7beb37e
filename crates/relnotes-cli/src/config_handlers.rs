//! Handler functions for config CLI commands.
//!
//! Implements the config subcommands (`path`, `get`, `set`, `init`, `export`)
//! generically over any type implementing [`ConfigManager`], plus the TOML
//! dotted-key helpers they rely on.

use std::path::PathBuf;

use relnotes_core::{ConfigManager, Error, RelnotesConfig, Result};

use crate::cli::ConfigAction;

// ============================================================================
// Command dispatch
// ============================================================================

/// Handle a config subcommand using [`RelnotesConfig`].
pub fn handle_config_command(config_path: Option<&str>, action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Path => cmd_config_path::<RelnotesConfig>(config_path),
        ConfigAction::Get { key } => cmd_config_get::<RelnotesConfig>(config_path, &key),
        ConfigAction::Set { key, value } => {
            cmd_config_set::<RelnotesConfig>(config_path, &key, &value)
        }
        ConfigAction::Init { file, force } => {
            let target = file.as_deref().or(config_path);
            cmd_config_init::<RelnotesConfig>(target, force)
        }
        ConfigAction::Export { docker_env } => {
            let config = RelnotesConfig::load(config_path)?;
            cmd_config_export(&config, docker_env)
        }
    }
}

// ============================================================================
// Generic command handlers
// ============================================================================

/// Show the resolved config file path.
pub fn cmd_config_path<C: ConfigManager>(config_path: Option<&str>) -> Result<()> {
    match C::resolve_config_path(config_path) {
        Some(path) => {
            println!("{}", path.display());
            if !path.exists() {
                eprintln!(
                    "(file does not exist; run `{} config init` to create it)",
                    C::project_name()
                );
            }
            Ok(())
        }
        None => Err(Error::config(
            "Could not determine config directory for this platform",
        )),
    }
}

/// Get a configuration value by dotted key.
pub fn cmd_config_get<C: ConfigManager>(config_path: Option<&str>, key: &str) -> Result<()> {
    let config = C::load(config_path)?;
    let value = toml::Value::try_from(&config).map_err(|e| Error::config(e.to_string()))?;
    match get_nested_value(&value, key) {
        Some(val) => {
            println!("{}", format_toml_value(val));
            Ok(())
        }
        None => Err(Error::config(format!(
            "Key '{key}' not found in configuration"
        ))),
    }
}

/// Set a configuration value by dotted key in the config file.
///
/// The edited file must still load as `C`, so a bad value is rejected
/// before anything is written.
pub fn cmd_config_set<C: ConfigManager>(
    config_path: Option<&str>,
    key: &str,
    value: &str,
) -> Result<()> {
    let path = C::resolve_config_path(config_path)
        .ok_or_else(|| Error::config("Could not determine config directory"))?;

    if !path.exists() {
        return Err(Error::config(format!(
            "Config file does not exist at {}. Run `{} config init` first.",
            path.display(),
            C::project_name()
        )));
    }

    let content = std::fs::read_to_string(&path).map_err(|e| Error::io_with_path(e, &path))?;
    let mut doc: toml::Value = toml::from_str(&content)
        .map_err(|e| Error::config(format!("Failed to parse {}: {e}", path.display())))?;

    let defaults: toml::Value = toml::from_str(&C::default().to_toml_string()?)
        .map_err(|e| Error::config(e.to_string()))?;
    let current = get_nested_value(&doc, key).or_else(|| get_nested_value(&defaults, key));

    let mut last_error = None;
    let mut accepted = None;
    for candidate in value_candidates(value, current) {
        let mut edited = doc.clone();
        set_nested_value(&mut edited, key, candidate)?;
        let toml_str =
            toml::to_string_pretty(&edited).map_err(|e| Error::config(e.to_string()))?;
        match toml::from_str::<C>(&toml_str) {
            Ok(_) => {
                accepted = Some(toml_str);
                break;
            }
            Err(e) => last_error = Some(e.to_string()),
        }
    }
    let toml_str = accepted.ok_or_else(|| {
        Error::config(format!(
            "Invalid value for '{key}': {}",
            last_error.unwrap_or_default()
        ))
    })?;
    std::fs::write(&path, toml_str).map_err(|e| Error::io_with_path(e, &path))?;

    println!("Set {key} = {value} in {}", path.display());
    Ok(())
}

/// Create a default configuration file.
pub fn cmd_config_init<C: ConfigManager>(file: Option<&str>, force: bool) -> Result<()> {
    let path = match file {
        Some(p) => PathBuf::from(p),
        None => C::default_config_path()
            .ok_or_else(|| Error::config("Could not determine config directory"))?,
    };

    if path.exists() && !force {
        return Err(Error::config(format!(
            "Config file already exists at {}. Use --force to overwrite.",
            path.display()
        )));
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| Error::io_with_path(e, parent))?;
    }

    let toml_str = C::default().to_toml_string()?;
    std::fs::write(&path, &toml_str).map_err(|e| Error::io_with_path(e, &path))?;

    println!("Config file created at {}", path.display());
    Ok(())
}

/// Export configuration as environment variables.
pub fn cmd_config_export<C: ConfigManager>(config: &C, docker_env: bool) -> Result<()> {
    for line in export_lines(config, docker_env)? {
        println!("{line}");
    }
    Ok(())
}

fn export_lines<C: ConfigManager>(config: &C, docker_env: bool) -> Result<Vec<String>> {
    Ok(config
        .to_env_vars()?
        .into_iter()
        .map(|(key, value)| {
            if docker_env {
                format!("--env {key}={value}")
            } else {
                format!("{key}={value}")
            }
        })
        .collect())
}

// ============================================================================
// TOML dotted-key helpers
// ============================================================================

/// Navigate a dotted key path in a TOML value tree.
pub fn get_nested_value<'a>(value: &'a toml::Value, key: &str) -> Option<&'a toml::Value> {
    key.split('.')
        .try_fold(value, |current, part| current.as_table()?.get(part))
}

/// Set a value at a dotted key path, creating intermediate tables as needed.
pub fn set_nested_value(root: &mut toml::Value, key: &str, value: toml::Value) -> Result<()> {
    let parts: Vec<&str> = key.split('.').collect();
    let Some((last, parents)) = parts.split_last() else {
        return Err(Error::config("Empty key path"));
    };
    if parts.iter().any(|p| p.is_empty()) {
        return Err(Error::config(format!("Invalid key '{key}'")));
    }

    let mut current = root;
    for part in parents {
        let table = current
            .as_table_mut()
            .ok_or_else(|| Error::config("Cannot navigate into a non-table value"))?;
        current = table
            .entry(part.to_string())
            .or_insert(toml::Value::Table(toml::map::Map::new()));
    }

    current
        .as_table_mut()
        .ok_or_else(|| Error::config("Cannot set key on a non-table value"))?
        .insert(last.to_string(), value);
    Ok(())
}

/// Parse a string value into a TOML value, auto-detecting the type.
///
/// Priority: bool → integer → float → string.
pub fn parse_value(s: &str) -> toml::Value {
    match s {
        "true" => return toml::Value::Boolean(true),
        "false" => return toml::Value::Boolean(false),
        _ => {}
    }
    if let Ok(i) = s.parse::<i64>() {
        return toml::Value::Integer(i);
    }
    if let Ok(f) = s.parse::<f64>() {
        return toml::Value::Float(f);
    }
    toml::Value::String(s.to_string())
}

/// Values to try for `raw`, best guess first.
///
/// When the key currently holds a string, the raw text is also tried as a
/// string, so `changelog = 2024` stays a file name.
fn value_candidates(raw: &str, current: Option<&toml::Value>) -> Vec<toml::Value> {
    let guess = parse_value(raw);
    let as_string = toml::Value::String(raw.to_string());
    match current {
        Some(toml::Value::String(_)) if guess != as_string => vec![guess, as_string],
        _ => vec![guess],
    }
}

/// Format a TOML value for display on stdout.
pub fn format_toml_value(value: &toml::Value) -> String {
    match value {
        toml::Value::String(s) => s.clone(),
        toml::Value::Integer(i) => i.to_string(),
        toml::Value::Float(f) => f.to_string(),
        toml::Value::Boolean(b) => b.to_string(),
        toml::Value::Datetime(dt) => dt.to_string(),
        toml::Value::Array(_) | toml::Value::Table(_) => {
            toml::to_string_pretty(value).unwrap_or_else(|_| format!("{value:?}"))
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
