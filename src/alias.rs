//! Command aliases.
//!
//! An alias maps a command name to a list of words that replaces it. The
//! replacement may itself start with an alias, so expansion repeats until
//! the first word is not an alias or a replacement head comes around a
//! second time.
use std::collections::BTreeMap;
use std::str::FromStr;

use log::debug;

use crate::error::{ErrorKind, ShellError, ShellResult};
use crate::parse::shell_quote;

/// What to do when alias expansion runs into a loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CyclePolicy {
    /// Stop substituting and dispatch the words reached so far.
    #[default]
    Stop,
    /// Report an error instead of dispatching.
    Reject,
}

impl FromStr for CyclePolicy {
    type Err = ShellError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "stop" => Ok(CyclePolicy::Stop),
            "reject" | "error" => Ok(CyclePolicy::Reject),
            other => Err(ShellError::new(
                ErrorKind::Config,
                format!("invalid alias cycle policy: {}", other),
            )
            .with_context("valid values: stop, reject")),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AliasTable {
    entries: BTreeMap<String, Vec<String>>,
    policy: CyclePolicy,
}

impl AliasTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(policy: CyclePolicy) -> Self {
        Self {
            entries: BTreeMap::new(),
            policy,
        }
    }

    pub fn policy(&self) -> CyclePolicy {
        self.policy
    }

    pub fn set_policy(&mut self, policy: CyclePolicy) {
        self.policy = policy;
    }

    pub fn set(&mut self, name: impl Into<String>, replacement: Vec<String>) -> ShellResult<()> {
        let name = name.into();
        if name.is_empty() {
            return Err(ShellError::new(ErrorKind::Alias, "alias name is empty"));
        }
        if replacement.is_empty() || replacement[0].is_empty() {
            return Err(ShellError::new(
                ErrorKind::Alias,
                format!("alias {}: replacement is empty", name),
            ));
        }
        self.entries.insert(name, replacement);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&[String]> {
        self.entries.get(name).map(Vec::as_slice)
    }

    pub fn remove(&mut self, name: &str) -> Option<Vec<String>> {
        self.entries.remove(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries
            .iter()
            .map(|(name, words)| (name.as_str(), words.as_slice()))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `name='words'` form used when listing aliases.
    pub fn describe(&self, name: &str) -> Option<String> {
        let words = self.entries.get(name)?;
        let quoted: Vec<String> = words.iter().map(|w| shell_quote(w)).collect();
        Some(format!("{}={}", name, shell_quote(&quoted.join(" "))))
    }

    /// Replaces a leading alias in `argv`, repeatedly.
    ///
    /// Each replacement head is substituted at most once per call, which is
    /// what breaks loops like `a -> b`, `b -> a`.
    pub fn expand(&self, mut argv: Vec<String>) -> ShellResult<Vec<String>> {
        let mut seen: Vec<String> = Vec::new();
        while let Some(replacement) = argv.first().and_then(|head| self.entries.get(head)) {
            let head = &replacement[0];
            if seen.contains(head) {
                let stuck = argv[0].clone();
                debug!(
                    "alias event=cycle name={} head={} policy={:?}",
                    stuck, head, self.policy
                );
                if self.policy == CyclePolicy::Reject && *head != stuck {
                    return Err(ShellError::new(
                        ErrorKind::Alias,
                        format!("alias loop: {}", seen.join(" -> ")),
                    ));
                }
                break;
            }
            seen.push(head.clone());
            debug!("alias event=expand name={} head={}", argv[0], head);
            argv.splice(0..1, replacement.iter().cloned());
        }
        Ok(argv)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(text: &str) -> Vec<String> {
        text.split_whitespace().map(str::to_string).collect()
    }

    fn table(pairs: &[(&str, &str)], policy: CyclePolicy) -> AliasTable {
        let mut table = AliasTable::with_policy(policy);
        for (name, value) in pairs {
            table.set(*name, words(value)).unwrap();
        }
        table
    }

    #[test]
    fn leading_alias_is_spliced() {
        let t = table(&[("ll", "list -l")], CyclePolicy::Stop);
        assert_eq!(t.expand(words("ll foo")).unwrap(), words("list -l foo"));
        assert_eq!(t.expand(words("foo ll")).unwrap(), words("foo ll"));
        assert!(t.expand(Vec::new()).unwrap().is_empty());
    }

    #[test]
    fn chains_expand() {
        let t = table(&[("l", "ll"), ("ll", "list -l")], CyclePolicy::Stop);
        assert_eq!(t.expand(words("l x")).unwrap(), words("list -l x"));
    }

    #[test]
    fn cycles_stop() {
        let t = table(&[("a", "b"), ("b", "a")], CyclePolicy::Stop);
        assert_eq!(t.expand(words("a 1")).unwrap(), words("a 1"));
        assert_eq!(t.expand(words("b")).unwrap(), words("b"));
    }

    #[test]
    fn cycles_rejected_when_asked() {
        let t = table(&[("a", "b"), ("b", "a")], CyclePolicy::Reject);
        let err = t.expand(words("a")).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Alias);
        assert_eq!(err.message, "alias loop: b -> a");
    }

    #[test]
    fn self_reference_is_not_a_cycle() {
        for policy in [CyclePolicy::Stop, CyclePolicy::Reject] {
            let t = table(&[("ls", "ls -l")], policy);
            assert_eq!(t.expand(words("ls /")).unwrap(), words("ls -l /"));
        }
    }

    #[test]
    fn empty_replacements_are_refused() {
        let mut t = AliasTable::new();
        assert!(t.set("x", Vec::new()).is_err());
        assert!(t.set("x", vec![String::new()]).is_err());
        assert!(t.set("", words("y")).is_err());
        assert!(t.is_empty());
    }

    #[test]
    fn describe_quotes_words() {
        let mut t = AliasTable::new();
        t.set("greet", vec!["echo".into(), "hi there".into()]).unwrap();
        assert_eq!(t.describe("greet").as_deref(), Some("greet=\"echo \\\"hi there\\\"\""));
        t.set("ll", words("list -l")).unwrap();
        assert_eq!(t.describe("ll").as_deref(), Some("ll=\"list -l\""));
        assert_eq!(t.describe("nope"), None);
    }

    #[test]
    fn policy_names() {
        assert_eq!("Stop".parse::<CyclePolicy>().unwrap(), CyclePolicy::Stop);
        assert_eq!("reject".parse::<CyclePolicy>().unwrap(), CyclePolicy::Reject);
        assert!("maybe".parse::<CyclePolicy>().is_err());
    }
}
