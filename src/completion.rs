//! Completion sources for the line editor.
//!
//! Every level owns named scopes; `commands` lists what can be typed first,
//! any other scope is keyed by the command whose arguments it completes.
pub mod matching;

#[cfg(feature = "shell")]
pub mod editor;

use std::collections::BTreeMap;

/// Name of the scope completing the first word of a statement.
pub const COMMANDS_SCOPE: &str = "commands";

/// A source of completion candidates.
pub trait CompletionScope {
    /// Candidates starting with `prefix`, in a stable order.
    fn candidates(&self, prefix: &str) -> Vec<String>;
}

/// Fixed list of words.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WordList(Vec<String>);

impl WordList {
    pub fn new<I, T>(words: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let mut words: Vec<String> = words.into_iter().map(Into::into).collect();
        words.sort();
        words.dedup();
        Self(words)
    }

    pub fn words(&self) -> &[String] {
        &self.0
    }
}

impl CompletionScope for WordList {
    fn candidates(&self, prefix: &str) -> Vec<String> {
        self.0
            .iter()
            .filter(|word| word.starts_with(prefix))
            .cloned()
            .collect()
    }
}

/// Everything the line editor needs from the active level, copied out so the
/// editor never borrows the level itself.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompletionSnapshot {
    pub commands: Vec<String>,
    pub vars: Vec<String>,
    pub arguments: BTreeMap<String, Vec<String>>,
}

impl CompletionSnapshot {
    /// Argument words for `command` starting with `prefix`.
    pub fn arguments_for(&self, command: &str, prefix: &str) -> Vec<String> {
        self.arguments
            .get(command)
            .map(|words| {
                words
                    .iter()
                    .filter(|word| word.starts_with(prefix))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn word_list_filters_by_prefix() {
        let list = WordList::new(["set", "sum", "echo", "set"]);
        assert_eq!(list.words(), ["echo", "set", "sum"]);
        assert_eq!(list.candidates("s"), ["set", "sum"]);
        assert_eq!(list.candidates(""), ["echo", "set", "sum"]);
        assert!(list.candidates("x").is_empty());
    }

    #[test]
    fn snapshot_arguments() {
        let mut snapshot = CompletionSnapshot::default();
        snapshot
            .arguments
            .insert("help".into(), vec!["alias".into(), "echo".into(), "exit".into()]);
        assert_eq!(snapshot.arguments_for("help", "e"), ["echo", "exit"]);
        assert!(snapshot.arguments_for("nope", "").is_empty());
    }
}
