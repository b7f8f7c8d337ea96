//! Per-level variable environment.
//!
//! Each interpreter level owns one `Environment`; a nested level starts from a
//! copy of its parent's. Nothing in the crate reads the process environment
//! after `Environment::from_process` has taken its snapshot.

use std::collections::{BTreeMap, HashMap};

/// Primary prompt template.
pub const PS1: &str = "PS1";
/// Continuation prompt template.
pub const PS2: &str = "PS2";
/// Nesting depth of the active level.
pub const SHLVL: &str = "SHLVL";
/// Numeric status of the last command.
pub const STATUS: &str = "?";
/// Raw value returned by the last command.
pub const LAST: &str = "_";

/// Read-only variable lookup used by the tokenizer and the prompt expander.
pub trait VarLookup {
    fn lookup(&self, name: &str) -> Option<String>;
}

/// A lookup that knows no variables.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoVars;

impl VarLookup for NoVars {
    fn lookup(&self, _name: &str) -> Option<String> {
        None
    }
}

impl VarLookup for HashMap<String, String> {
    fn lookup(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

impl VarLookup for BTreeMap<String, String> {
    fn lookup(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

/// String-keyed variables visible to one interpreter level.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Environment {
    vars: BTreeMap<String, String>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the process environment, used to seed the root level.
    pub fn from_process() -> Self {
        Self {
            vars: std::env::vars().collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }

    /// Value parsed as an integer, if present and numeric.
    pub fn get_int(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(|v| v.trim().parse().ok())
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(name.into(), value.into());
    }

    /// Sets `name` only when it is not already defined.
    pub fn set_default(&mut self, name: &str, value: impl Into<String>) {
        if !self.vars.contains_key(name) {
            self.vars.insert(name.to_string(), value.into());
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.vars.remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.vars.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.vars.keys().map(String::as_str)
    }

    /// Variables in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// Current `SHLVL`, zero when unset or not numeric.
    pub fn shell_level(&self) -> i64 {
        self.get_int(SHLVL).unwrap_or(0)
    }
}

impl VarLookup for Environment {
    fn lookup(&self, name: &str) -> Option<String> {
        self.vars.get(name).cloned()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Environment {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            vars: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_and_get() {
        let mut env = Environment::new();
        assert_eq!(env.get("KEY"), None);
        env.set("KEY", "VALUE");
        assert_eq!(env.get("KEY"), Some("VALUE"));
        assert_eq!(env.lookup("KEY").as_deref(), Some("VALUE"));
    }

    #[test]
    fn set_default_keeps_existing() {
        let mut env: Environment = [(PS1, "$ ")].into_iter().collect();
        env.set_default(PS1, "> ");
        env.set_default(PS2, "... ");
        assert_eq!(env.get(PS1), Some("$ "));
        assert_eq!(env.get(PS2), Some("... "));
    }

    #[test]
    fn shell_level_tolerates_garbage() {
        let mut env = Environment::new();
        assert_eq!(env.shell_level(), 0);
        env.set(SHLVL, " 3 ");
        assert_eq!(env.shell_level(), 3);
        env.set(SHLVL, "three");
        assert_eq!(env.shell_level(), 0);
    }

    #[test]
    fn clones_are_independent() {
        let mut parent = Environment::new();
        parent.set("X", "1");
        let mut child = parent.clone();
        child.set("X", "2");
        assert_eq!(parent.get("X"), Some("1"));
    }
}
