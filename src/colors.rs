use crate::error::{ErrorKind, ShellError, ShellResult};

/// Colour slots behind the single-letter theme codes of the expander.
///
/// Slots hold colour names (see `resolve_color`) so they can be overridden
/// from the rc file with `color.<slot>=<value>`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Theme {
    pub bright: String,
    pub normal: String,
    pub default: String,
    pub red: String,
    pub green: String,
    pub yellow: String,
    pub blue: String,
    pub magenta: String,
    pub cyan: String,
    pub white: String,
    pub bright_red: String,
    pub bright_green: String,
    pub bright_yellow: String,
    pub bright_blue: String,
    pub bright_magenta: String,
    pub bright_cyan: String,
    pub bright_white: String,
    pub help_text: String,
}

pub const SLOTS: [&str; 18] = [
    "bright",
    "normal",
    "default",
    "red",
    "green",
    "yellow",
    "blue",
    "magenta",
    "cyan",
    "white",
    "bright_red",
    "bright_green",
    "bright_yellow",
    "bright_blue",
    "bright_magenta",
    "bright_cyan",
    "bright_white",
    "help_text",
];

impl Default for Theme {
    fn default() -> Self {
        Self::ansi()
    }
}

impl Theme {
    pub fn ansi() -> Self {
        Self {
            bright: "bold".to_string(),
            normal: "reset".to_string(),
            default: "default".to_string(),
            red: "red".to_string(),
            green: "green".to_string(),
            yellow: "yellow".to_string(),
            blue: "blue".to_string(),
            magenta: "magenta".to_string(),
            cyan: "cyan".to_string(),
            white: "white".to_string(),
            bright_red: "bright_red".to_string(),
            bright_green: "bright_green".to_string(),
            bright_yellow: "bright_yellow".to_string(),
            bright_blue: "bright_blue".to_string(),
            bright_magenta: "bright_magenta".to_string(),
            bright_cyan: "bright_cyan".to_string(),
            bright_white: "bright_white".to_string(),
            help_text: "green".to_string(),
        }
    }

    /// Every slot empty; output carries no escape sequences.
    pub fn plain() -> Self {
        let mut theme = Self::ansi();
        for slot in SLOTS {
            if let Some(value) = theme.slot_mut(slot) {
                *value = "none".to_string();
            }
        }
        theme
    }

    pub fn slot(&self, name: &str) -> Option<&str> {
        let value = match name {
            "bright" => &self.bright,
            "normal" => &self.normal,
            "default" => &self.default,
            "red" => &self.red,
            "green" => &self.green,
            "yellow" => &self.yellow,
            "blue" => &self.blue,
            "magenta" => &self.magenta,
            "cyan" => &self.cyan,
            "white" => &self.white,
            "bright_red" => &self.bright_red,
            "bright_green" => &self.bright_green,
            "bright_yellow" => &self.bright_yellow,
            "bright_blue" => &self.bright_blue,
            "bright_magenta" => &self.bright_magenta,
            "bright_cyan" => &self.bright_cyan,
            "bright_white" => &self.bright_white,
            "help_text" => &self.help_text,
            _ => return None,
        };
        Some(value)
    }

    fn slot_mut(&mut self, name: &str) -> Option<&mut String> {
        let value = match name {
            "bright" => &mut self.bright,
            "normal" => &mut self.normal,
            "default" => &mut self.default,
            "red" => &mut self.red,
            "green" => &mut self.green,
            "yellow" => &mut self.yellow,
            "blue" => &mut self.blue,
            "magenta" => &mut self.magenta,
            "cyan" => &mut self.cyan,
            "white" => &mut self.white,
            "bright_red" => &mut self.bright_red,
            "bright_green" => &mut self.bright_green,
            "bright_yellow" => &mut self.bright_yellow,
            "bright_blue" => &mut self.bright_blue,
            "bright_magenta" => &mut self.bright_magenta,
            "bright_cyan" => &mut self.bright_cyan,
            "bright_white" => &mut self.bright_white,
            "help_text" => &mut self.help_text,
            _ => return None,
        };
        Some(value)
    }

    /// Escape sequence for a slot, empty for unknown slots.
    pub fn sequence(&self, slot: &str) -> String {
        self.slot(slot).map(resolve_color).unwrap_or_default()
    }
}

pub fn resolve_color(value: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("none") {
        return String::new();
    }
    if let Some(rest) = trimmed.strip_prefix("ansi:") {
        return rest.to_string();
    }
    if trimmed.contains('\x1b') {
        return trimmed.to_string();
    }
    match trimmed.to_lowercase().as_str() {
        "reset" | "normal" => "\x1b[0m",
        "default" => "\x1b[39;49m",
        "black" => "\x1b[30m",
        "red" => "\x1b[31m",
        "green" => "\x1b[32m",
        "yellow" => "\x1b[33m",
        "blue" => "\x1b[34m",
        "magenta" => "\x1b[35m",
        "cyan" => "\x1b[36m",
        "white" => "\x1b[37m",
        "bright_black" | "gray" | "grey" => "\x1b[90m",
        "bright_red" => "\x1b[91m",
        "bright_green" => "\x1b[92m",
        "bright_yellow" => "\x1b[93m",
        "bright_blue" => "\x1b[94m",
        "bright_magenta" => "\x1b[95m",
        "bright_cyan" => "\x1b[96m",
        "bright_white" => "\x1b[97m",
        "bold" => "\x1b[1m",
        "dim" => "\x1b[2m",
        _ => "",
    }
    .to_string()
}

pub fn apply_color_setting(theme: &mut Theme, key: &str, value: &str) -> ShellResult<()> {
    let Some(slot) = theme.slot_mut(key) else {
        return Err(ShellError::new(
            ErrorKind::Config,
            format!("unknown color key '{key}'"),
        )
        .with_context(format!("valid keys: {}", SLOTS.join(", "))));
    };
    *slot = value.to_string();
    Ok(())
}
