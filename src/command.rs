//! The contract between the engine and the commands it runs.
//!
//! A `CommandSet` is one interpreter level's vocabulary. Handlers get an
//! `Invocation` (parsed arguments plus the level's state) and answer with an
//! `Outcome`. Leaving or entering a level is an outcome, never an error.
use std::fmt;

use crate::alias::AliasTable;
use crate::completion::matching::best_suggestion;
use crate::env::Environment;
use crate::error::{ShellError, ShellResult};
use crate::parse::usage;
use crate::parse::ParsedArgs;
use crate::signals::Interrupt;
use crate::ui::Ui;

/// A value returned by a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Int(i64),
    Text(String),
}

impl Value {
    /// Integers as-is, numeric text parsed, anything else 0.
    pub fn status(&self) -> i64 {
        match self {
            Value::Int(n) => *n,
            Value::Text(text) => text.trim().parse().unwrap_or(0),
        }
    }

    /// Integer when `text` is numeric.
    pub fn parse(text: &str) -> Self {
        match text.trim().parse() {
            Ok(n) => Value::Int(n),
            Err(_) => Value::Text(text.to_string()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(n) => write!(f, "{}", n),
            Value::Text(text) => f.write_str(text),
        }
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<String> for Value {
    fn from(text: String) -> Self {
        Value::Text(text)
    }
}

impl From<&str> for Value {
    fn from(text: &str) -> Self {
        Value::Text(text.to_string())
    }
}

/// What a handler asks the engine to do next.
pub enum Outcome {
    /// Stay at this level, optionally recording a result.
    Continue(Option<Value>),
    /// Push a new level running this command set.
    EnterLevel(Box<dyn CommandSet>),
    /// Pop this level, handing the value to the parent.
    ExitLevel(Option<Value>),
    /// The command gave up after an interrupt.
    Abort,
}

impl Outcome {
    pub fn done() -> Self {
        Outcome::Continue(None)
    }

    pub fn status(code: i64) -> Self {
        Outcome::Continue(Some(Value::Int(code)))
    }

    pub fn value(value: impl Into<Value>) -> Self {
        Outcome::Continue(Some(value.into()))
    }
}

impl fmt::Debug for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Continue(value) => f.debug_tuple("Continue").field(value).finish(),
            Outcome::EnterLevel(set) => write!(f, "EnterLevel({})", set.name()),
            Outcome::ExitLevel(value) => f.debug_tuple("ExitLevel").field(value).finish(),
            Outcome::Abort => f.write_str("Abort"),
        }
    }
}

/// Name and help text of one command. The help text's first line is its
/// summary; an optional `Usage:` section declares its arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandInfo {
    pub name: &'static str,
    pub help: &'static str,
}

impl CommandInfo {
    pub const fn new(name: &'static str, help: &'static str) -> Self {
        Self { name, help }
    }

    pub fn summary(&self) -> &'static str {
        usage::summary(self.help)
    }
}

/// Everything a handler may touch while it runs.
pub struct Invocation<'a> {
    pub args: ParsedArgs,
    pub env: &'a mut Environment,
    pub aliases: &'a mut AliasTable,
    pub ui: &'a mut Ui,
    /// Commands reachable at this level, the level's own first.
    pub catalog: &'a [CommandInfo],
    pub interrupt: &'a Interrupt,
}

impl Invocation<'_> {
    pub fn name(&self) -> &str {
        self.args.name()
    }

    pub fn argv(&self) -> &[String] {
        self.args.argv()
    }

    /// True once the user asked to abort the running command.
    pub fn interrupted(&self) -> bool {
        self.interrupt.is_raised()
    }

    /// Percent-expands `template` against this level's variables and prints it.
    pub fn printf(&mut self, template: &str) {
        self.ui.printf(template, &*self.env);
    }

    pub fn lookup(&self, name: &str) -> Option<&CommandInfo> {
        self.catalog.iter().find(|info| info.name == name)
    }

    /// Closest known command name to the one typed.
    pub fn suggestion(&self) -> Option<String> {
        let names: Vec<String> = self.catalog.iter().map(|i| i.name.to_string()).collect();
        best_suggestion(self.name(), &names)
    }
}

/// One interpreter level's commands.
pub trait CommandSet {
    fn name(&self) -> &str;

    fn commands(&self) -> &[CommandInfo];

    /// Runs the command named by `inv.name()`, which is one of `commands()`.
    fn run(&mut self, inv: &mut Invocation<'_>) -> ShellResult<Outcome>;

    /// Called for names that match no command.
    fn unknown(&mut self, inv: &mut Invocation<'_>) -> ShellResult<Outcome> {
        let message = match inv.suggestion() {
            Some(hint) => format!("unknown command: {} (did you mean '{}'?)", inv.name(), hint),
            None => format!("unknown command: {}", inv.name()),
        };
        inv.ui.error(&message);
        Ok(Outcome::status(2))
    }

    /// Primary prompt template for a new level running this set.
    fn prompt(&self) -> Option<String> {
        None
    }

    /// A child level exited with `value`.
    fn resume(&mut self, _value: Value, _env: &mut Environment, _ui: &mut Ui) {}

    /// A handler at this level failed.
    fn report_error(&mut self, err: &ShellError, ui: &mut Ui) {
        ui.error(&err.display_simple());
    }

    /// The level is being popped.
    fn finalize(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_coercion() {
        assert_eq!(Value::Int(3).status(), 3);
        assert_eq!(Value::from(" 7 ").status(), 7);
        assert_eq!(Value::from("seven").status(), 0);
        assert_eq!(Value::parse("-4"), Value::Int(-4));
        assert_eq!(Value::parse("x"), Value::Text("x".into()));
        assert_eq!(Value::Int(12).to_string(), "12");
    }

    #[test]
    fn summary_from_help() {
        let info = CommandInfo::new("exit", "Exit this level.\n\nUsage:\n    exit [<value>]\n");
        assert_eq!(info.summary(), "Exit this level.");
    }

    #[test]
    fn outcome_debug_names_level() {
        assert_eq!(format!("{:?}", Outcome::status(1)), "Continue(Some(Int(1)))");
        assert_eq!(format!("{:?}", Outcome::Abort), "Abort");
    }
}
