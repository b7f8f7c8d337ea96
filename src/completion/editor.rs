//! rustyline helper: completion, hints and hint colouring.
use std::borrow::Cow;

use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::history::SearchDirection;
use rustyline::validate::Validator;
use rustyline::{Context, Helper};

use crate::colors::resolve_color;
use crate::completion::matching::best_suggestion;
use crate::completion::CompletionSnapshot;

pub struct LineHelper {
    snapshot: CompletionSnapshot,
    hint_color: String,
}

impl Default for LineHelper {
    fn default() -> Self {
        Self::new()
    }
}

impl LineHelper {
    pub fn new() -> Self {
        Self {
            snapshot: CompletionSnapshot::default(),
            hint_color: "bright_black".to_string(),
        }
    }

    /// Replaces the candidates with the active level's.
    pub fn update(&mut self, snapshot: &CompletionSnapshot) {
        self.snapshot = snapshot.clone();
    }

    pub fn set_hint_color(&mut self, color: impl Into<String>) {
        self.hint_color = color.into();
    }

    fn candidates_at(&self, line: &str, start: usize) -> Vec<String> {
        if is_command_position(line, start) {
            return self.snapshot.commands.clone();
        }
        match command_for_position(line, start) {
            Some(command) => self.snapshot.arguments_for(&command, ""),
            None => Vec::new(),
        }
    }

    fn completion_hint(&self, line: &str, pos: usize) -> Option<String> {
        let (start, token) = current_token(line, pos);
        if token.is_empty() || token.starts_with('$') {
            return None;
        }
        let candidates = self.candidates_at(line, start);
        let suggestion = best_suggestion(&token, &candidates)?;
        if let Some(remainder) = suggestion.strip_prefix(token.as_str()) {
            if remainder.is_empty() {
                return None;
            }
            return Some(remainder.to_string());
        }
        Some(format!(" -> {suggestion}"))
    }
}

fn history_hint(line: &str, pos: usize, ctx: &Context<'_>) -> Option<String> {
    if line.is_empty() || pos < line.len() {
        return None;
    }
    let history = ctx.history();
    let start = if ctx.history_index() == history.len() {
        ctx.history_index().saturating_sub(1)
    } else {
        ctx.history_index()
    };
    let result = history
        .starts_with(line, start, SearchDirection::Reverse)
        .ok()
        .flatten()?;
    if result.entry == line {
        return None;
    }
    let remainder = result.entry.get(pos..)?;
    if remainder.is_empty() {
        return None;
    }
    Some(remainder.to_string())
}

/// Start offset and text of the word under the cursor.
fn current_token(line: &str, pos: usize) -> (usize, String) {
    let head = &line[..pos];
    let start = head
        .char_indices()
        .rev()
        .find(|(_, ch)| ch.is_whitespace() || *ch == ';')
        .map(|(i, ch)| i + ch.len_utf8())
        .unwrap_or(0);
    (start, head[start..].to_string())
}

fn is_command_position(line: &str, start: usize) -> bool {
    let prefix = line[..start].trim_end();
    prefix.is_empty() || prefix.ends_with(';')
}

fn command_for_position(line: &str, start: usize) -> Option<String> {
    line[..start]
        .rsplit(';')
        .next()?
        .split_whitespace()
        .next()
        .map(str::to_string)
}

fn complete_from_list(prefix: &str, list: &[String], leader: &str, trailer: &str) -> Vec<Pair> {
    list.iter()
        .filter(|item| item.starts_with(prefix))
        .map(|item| Pair {
            display: format!("{leader}{item}{trailer}"),
            replacement: format!("{leader}{item}{trailer}"),
        })
        .collect()
}

impl Helper for LineHelper {}

impl Completer for LineHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> Result<(usize, Vec<Pair>), ReadlineError> {
        let (start, token) = current_token(line, pos);
        if let Some(prefix) = token.strip_prefix("${") {
            return Ok((start, complete_from_list(prefix, &self.snapshot.vars, "${", "}")));
        }
        if let Some(prefix) = token.strip_prefix('$') {
            return Ok((start, complete_from_list(prefix, &self.snapshot.vars, "$", "")));
        }
        let candidates = self.candidates_at(line, start);
        Ok((start, complete_from_list(&token, &candidates, "", "")))
    }
}

impl Hinter for LineHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, ctx: &Context<'_>) -> Option<String> {
        history_hint(line, pos, ctx).or_else(|| self.completion_hint(line, pos))
    }
}

impl Highlighter for LineHelper {
    fn highlight_hint<'h>(&self, hint: &'h str) -> Cow<'h, str> {
        if hint.is_empty() {
            return Cow::Borrowed(hint);
        }
        let color = resolve_color(&self.hint_color);
        if color.is_empty() {
            return Cow::Borrowed(hint);
        }
        Cow::Owned(format!("{color}{hint}\x1b[0m"))
    }
}

// Continuation lines are requested by the session, which knows when a
// quote or escape is still open.
impl Validator for LineHelper {}

#[cfg(test)]
mod tests {
    use super::*;

    fn helper() -> LineHelper {
        let mut snapshot = CompletionSnapshot {
            commands: vec!["echo".into(), "exit".into(), "nest".into(), "help".into()],
            vars: vec!["HOME".into(), "HOST".into(), "PS1".into()],
            ..Default::default()
        };
        snapshot
            .arguments
            .insert("help".into(), vec!["echo".into(), "exit".into()]);
        let mut helper = LineHelper::new();
        LineHelper::update(&mut helper, &snapshot);
        helper
    }

    #[test]
    fn token_under_cursor() {
        assert_eq!(current_token("echo hel", 8), (5, "hel".to_string()));
        assert_eq!(current_token("a;b", 3), (2, "b".to_string()));
        assert_eq!(current_token("", 0), (0, String::new()));
    }

    #[test]
    fn command_and_argument_positions() {
        assert!(is_command_position("ec", 0));
        assert!(is_command_position("x; ec", 3));
        assert!(!is_command_position("help ec", 5));
        assert_eq!(command_for_position("x; help e", 8).as_deref(), Some("help"));
    }

    #[test]
    fn candidates_depend_on_position() {
        let h = helper();
        assert_eq!(h.candidates_at("e", 0).len(), 4);
        assert_eq!(h.candidates_at("help e", 5), ["echo", "exit"]);
        assert!(h.candidates_at("nest e", 5).is_empty());
    }

    #[test]
    fn hints_complete_the_word() {
        let h = helper();
        assert_eq!(h.completion_hint("ne", 2).as_deref(), Some("st"));
        assert_eq!(h.completion_hint("hepl", 4).as_deref(), Some(" -> help"));
        assert_eq!(h.completion_hint("echo", 4), None);
    }

    #[test]
    fn variable_pairs() {
        let h = helper();
        let pairs = complete_from_list("HO", &h.snapshot.vars, "${", "}");
        let names: Vec<&str> = pairs.iter().map(|p| p.replacement.as_str()).collect();
        assert_eq!(names, ["${HOME}", "${HOST}"]);
    }
}
