//! Startup file: aliases, variables and colours for the root level.
//!
//! `$NESTSH_RC` names the file, otherwise `~/.nestshrc`. Lines are
//! `alias name=value`, `export NAME=value` or `NAME=value`,
//! `color.<slot>=<colour>` and `alias_cycles=stop|reject`.
use std::env;
use std::fs;
use std::io;
use std::path::PathBuf;

use log::{debug, warn};

use crate::alias::{AliasTable, CyclePolicy};
use crate::colors::{apply_color_setting, Theme};
use crate::env::Environment;
use crate::error::{ErrorKind, ShellError, ShellResult};
use crate::parse::split_words;

/// Settings read from the startup file.
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub aliases: AliasTable,
    /// Variables layered over the process environment.
    pub env: Environment,
    pub theme: Theme,
}

pub fn config_path() -> Option<PathBuf> {
    if let Some(path) = env::var_os("NESTSH_RC") {
        return Some(PathBuf::from(path));
    }
    env::var_os("HOME").map(|home| PathBuf::from(home).join(".nestshrc"))
}

/// Reads the startup file. A missing file yields no aliases or variables.
pub fn load_config(theme: Theme) -> ShellResult<Config> {
    let Some(path) = config_path() else {
        return Ok(Config {
            theme,
            ..Config::default()
        });
    };
    let content = match fs::read_to_string(&path) {
        Ok(content) => content,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            debug!("config event=missing path={}", path.display());
            String::new()
        }
        Err(err) => {
            return Err(ShellError::from(err).with_context(format!("reading {}", path.display())))
        }
    };
    Ok(parse_config(&content, theme))
}

/// Applies each line of `content` on top of `theme`. Bad lines are logged
/// and skipped.
pub fn parse_config(content: &str, theme: Theme) -> Config {
    let mut config = Config {
        theme,
        ..Config::default()
    };
    for (idx, raw) in content.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Err(err) = apply_line(&mut config, line) {
            warn!("config:{}: {}", idx + 1, err.display_simple());
        }
    }
    config
}

fn apply_line(config: &mut Config, line: &str) -> ShellResult<()> {
    if let Some(rest) = line.strip_prefix("alias ") {
        return parse_alias(&mut config.aliases, rest);
    }
    let assignment = line.strip_prefix("export ").unwrap_or(line);
    let Some((key, value)) = assignment.split_once('=') else {
        return Err(config_error("unrecognized directive"));
    };
    let key = key.trim();
    let value = strip_quotes(value.trim());
    if let Some(slot) = key.strip_prefix("color.") {
        return apply_color_setting(&mut config.theme, slot, value);
    }
    if key == "alias_cycles" {
        let policy: CyclePolicy = value.parse()?;
        config.aliases.set_policy(policy);
        return Ok(());
    }
    if !is_valid_var_name(key) {
        return Err(config_error(format!("invalid variable name '{key}'")));
    }
    config.env.set(key, value);
    Ok(())
}

fn parse_alias(aliases: &mut AliasTable, input: &str) -> ShellResult<()> {
    let (name, value) = input
        .split_once('=')
        .ok_or_else(|| config_error("alias missing '='"))?;
    let name = name.trim();
    if name.is_empty() || name.contains(char::is_whitespace) {
        return Err(config_error(format!("invalid alias name '{name}'")));
    }
    let words = split_words(strip_quotes(value.trim()))?;
    aliases.set(name, words)
}

fn config_error(message: impl Into<String>) -> ShellError {
    ShellError::new(ErrorKind::Config, message)
}

fn is_valid_var_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|ch| ch.is_ascii_alphanumeric() || ch == '_')
        }
        _ => false,
    }
}

fn strip_quotes(input: &str) -> &str {
    let bytes = input.as_bytes();
    if bytes.len() >= 2 {
        let first = bytes[0];
        let last = bytes[bytes.len() - 1];
        if (first == b'"' && last == b'"') || (first == b'\'' && last == b'\'') {
            return &input[1..bytes.len() - 1];
        }
    }
    input
}
