//! Usage grammars taken from command help text.
//!
//! A help text looks like
//!
//! ```text
//! Print help text on the given commands, or all commands.
//!
//! Usage:
//!     help [<name>...]
//! ```
//!
//! The first line is the summary. Each indented line under `Usage:` is one
//! accepted form and starts with the command name. Elements are literal
//! words, `<arg>`, `-f`/`--flag`, `--key=<value>`, `[...]` (optional),
//! `(...)` (group), `|` (alternatives) and `...` (one or more).
//!
//! Options may appear anywhere on the command line and are always optional;
//! `--` ends option processing. Everything else is matched in order with
//! backtracking and must consume the whole command line.
use std::collections::BTreeMap;

use log::debug;

use crate::error::{ErrorKind, ShellError, ShellResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UsageValue {
    Flag(bool),
    Text(Option<String>),
    List(Vec<String>),
}

/// Arguments of one invocation, keyed the way they are written in the
/// grammar (`<name>`, `--flag`, `-f`, `word`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedArgs {
    argv: Vec<String>,
    values: BTreeMap<String, UsageValue>,
}

impl ParsedArgs {
    /// Arguments for a command without a grammar.
    pub fn bare(argv: Vec<String>) -> Self {
        Self {
            argv,
            values: BTreeMap::new(),
        }
    }

    /// The full command line, command name included.
    pub fn argv(&self) -> &[String] {
        &self.argv
    }

    /// Words after the command name.
    pub fn rest(&self) -> &[String] {
        self.argv.get(1..).unwrap_or(&[])
    }

    pub fn name(&self) -> &str {
        self.argv.first().map(String::as_str).unwrap_or("")
    }

    pub fn value(&self, key: &str) -> Option<&UsageValue> {
        self.values.get(key)
    }

    /// Single value of an argument or option.
    pub fn get(&self, key: &str) -> Option<&str> {
        match self.values.get(key) {
            Some(UsageValue::Text(Some(text))) => Some(text),
            Some(UsageValue::List(items)) => items.first().map(String::as_str),
            _ => None,
        }
    }

    /// Every value of a repeated argument.
    pub fn list(&self, key: &str) -> &[String] {
        match self.values.get(key) {
            Some(UsageValue::List(items)) => items,
            Some(UsageValue::Text(Some(text))) => std::slice::from_ref(text),
            _ => &[],
        }
    }

    pub fn flag(&self, key: &str) -> bool {
        matches!(self.values.get(key), Some(UsageValue::Flag(true)))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Pattern {
    Command(String),
    Argument(String),
    Flag(String),
    OptionValue(String),
    Optional(Box<Pattern>),
    Required(Box<Pattern>),
    Repeat(Box<Pattern>),
    Sequence(Vec<Pattern>),
    Either(Vec<Pattern>),
}

type Bindings = BTreeMap<String, UsageValue>;

impl Pattern {
    fn collect_defaults(&self, repeated: bool, out: &mut Bindings) {
        match self {
            Pattern::Command(word) => {
                out.entry(word.clone()).or_insert(UsageValue::Flag(false));
            }
            Pattern::Flag(name) => {
                out.entry(name.clone()).or_insert(UsageValue::Flag(false));
            }
            Pattern::Argument(name) | Pattern::OptionValue(name) => {
                if repeated {
                    out.insert(name.clone(), UsageValue::List(Vec::new()));
                } else {
                    out.entry(name.clone()).or_insert(UsageValue::Text(None));
                }
            }
            Pattern::Optional(inner) | Pattern::Required(inner) => {
                inner.collect_defaults(repeated, out)
            }
            Pattern::Repeat(inner) => inner.collect_defaults(true, out),
            Pattern::Sequence(items) | Pattern::Either(items) => {
                for item in items {
                    item.collect_defaults(repeated, out);
                }
            }
        }
    }

    fn collect_options<'a>(&'a self, out: &mut Vec<&'a Pattern>) {
        match self {
            Pattern::Flag(_) | Pattern::OptionValue(_) => out.push(self),
            Pattern::Optional(inner) | Pattern::Required(inner) | Pattern::Repeat(inner) => {
                inner.collect_options(out)
            }
            Pattern::Sequence(items) | Pattern::Either(items) => {
                for item in items {
                    item.collect_options(out);
                }
            }
            Pattern::Command(_) | Pattern::Argument(_) => {}
        }
    }

    /// Matches `args[pos..]` depth first, trying longer matches before
    /// shorter ones, and hands every end position reached to `then` until it
    /// accepts one. Captures pushed onto `trail` are popped again when the
    /// branch that made them fails.
    fn walk<'a>(&'a self, args: &'a [String], pos: usize, trail: &mut Vec<Capture<'a>>, then: Then<'_, 'a>) -> bool {
        match self {
            Pattern::Command(word) => {
                args.get(pos) == Some(word) && capture(trail, Capture::Word(word), |trail| then(pos + 1, trail))
            }
            Pattern::Argument(name) => match args.get(pos) {
                Some(arg) => capture(trail, Capture::Value(name, arg), |trail| then(pos + 1, trail)),
                None => false,
            },
            Pattern::Flag(_) | Pattern::OptionValue(_) => then(pos, trail),
            Pattern::Optional(inner) => inner.walk(args, pos, trail, then) || then(pos, trail),
            Pattern::Required(inner) => inner.walk(args, pos, trail, then),
            Pattern::Repeat(inner) => inner.walk(args, pos, trail, &mut |end, trail| {
                (end > pos && self.walk(args, end, trail, &mut *then)) || then(end, trail)
            }),
            Pattern::Sequence(items) => walk_sequence(items, args, pos, trail, then),
            Pattern::Either(alternatives) => alternatives
                .iter()
                .any(|alternative| alternative.walk(args, pos, trail, &mut *then)),
        }
    }
}

/// A word matched while walking a grammar.
enum Capture<'a> {
    Word(&'a str),
    Value(&'a str, &'a str),
}

type Then<'t, 'a> = &'t mut dyn FnMut(usize, &mut Vec<Capture<'a>>) -> bool;

fn capture<'a>(
    trail: &mut Vec<Capture<'a>>,
    item: Capture<'a>,
    rest: impl FnOnce(&mut Vec<Capture<'a>>) -> bool,
) -> bool {
    let mark = trail.len();
    trail.push(item);
    let accepted = rest(trail);
    if !accepted {
        trail.truncate(mark);
    }
    accepted
}

fn walk_sequence<'a>(
    items: &'a [Pattern],
    args: &'a [String],
    pos: usize,
    trail: &mut Vec<Capture<'a>>,
    then: Then<'_, 'a>,
) -> bool {
    match items.split_first() {
        None => then(pos, trail),
        Some((first, rest)) => first.walk(args, pos, trail, &mut |end, trail| {
            walk_sequence(rest, args, end, trail, &mut *then)
        }),
    }
}

fn bind(bound: &mut Bindings, name: &str, value: &str) {
    match bound.get_mut(name) {
        Some(UsageValue::List(items)) => items.push(value.to_string()),
        _ => {
            bound.insert(name.to_string(), UsageValue::Text(Some(value.to_string())));
        }
    }
}

fn grammar_error(message: impl Into<String>, line: &str) -> ShellError {
    ShellError::new(ErrorKind::Grammar, message).with_context(format!("in usage line '{}'", line))
}

fn lex_pattern(line: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    for word in line.split_whitespace() {
        let mut current = String::new();
        let mut rest = word;
        while !rest.is_empty() {
            if let Some(tail) = rest.strip_prefix("...") {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
                tokens.push("...".to_string());
                rest = tail;
                continue;
            }
            let mut chars = rest.chars();
            let Some(ch) = chars.next() else { break };
            if matches!(ch, '[' | ']' | '(' | ')' | '|') {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
                tokens.push(ch.to_string());
            } else {
                current.push(ch);
            }
            rest = chars.as_str();
        }
        if !current.is_empty() {
            tokens.push(current);
        }
    }
    tokens
}

struct PatternParser<'a> {
    tokens: Vec<String>,
    pos: usize,
    line: &'a str,
}

impl<'a> PatternParser<'a> {
    fn peek(&self) -> Option<&str> {
        self.tokens.get(self.pos).map(String::as_str)
    }

    fn alternatives(&mut self) -> ShellResult<Pattern> {
        let mut branches = vec![self.sequence()?];
        while self.peek() == Some("|") {
            self.pos += 1;
            branches.push(self.sequence()?);
        }
        Ok(if branches.len() == 1 {
            branches.remove(0)
        } else {
            Pattern::Either(branches)
        })
    }

    fn sequence(&mut self) -> ShellResult<Pattern> {
        let mut items = Vec::new();
        while let Some(token) = self.peek() {
            if matches!(token, "]" | ")" | "|") {
                break;
            }
            let mut item = self.atom()?;
            if self.peek() == Some("...") {
                self.pos += 1;
                item = Pattern::Repeat(Box::new(item));
            }
            items.push(item);
        }
        Ok(Pattern::Sequence(items))
    }

    fn group(&mut self, close: &str) -> ShellResult<Pattern> {
        let inner = self.alternatives()?;
        if self.peek() != Some(close) {
            return Err(grammar_error(format!("missing '{}'", close), self.line));
        }
        self.pos += 1;
        Ok(inner)
    }

    fn atom(&mut self) -> ShellResult<Pattern> {
        let token = self.tokens[self.pos].clone();
        self.pos += 1;
        match token.as_str() {
            "[" => Ok(Pattern::Optional(Box::new(self.group("]")?))),
            "(" => Ok(Pattern::Required(Box::new(self.group(")")?))),
            "..." => Err(grammar_error("'...' must follow an element", self.line)),
            _ if token.starts_with('<') && token.ends_with('>') && token.len() > 2 => {
                Ok(Pattern::Argument(token))
            }
            _ if token.starts_with("--") && token.len() > 2 => match token.split_once('=') {
                Some((key, _)) => Ok(Pattern::OptionValue(key.to_string())),
                None => Ok(Pattern::Flag(token)),
            },
            _ if token.starts_with('-') && token.len() == 2 => Ok(Pattern::Flag(token)),
            _ => Ok(Pattern::Command(token)),
        }
    }
}

fn parse_line(line: &str) -> ShellResult<Pattern> {
    let mut tokens = lex_pattern(line);
    if tokens.is_empty() {
        return Err(grammar_error("empty usage line", line));
    }
    // Leading word is the command name, which dispatch already resolved.
    tokens.remove(0);
    let mut parser = PatternParser {
        tokens,
        pos: 0,
        line,
    };
    let pattern = parser.alternatives()?;
    if let Some(extra) = parser.peek() {
        return Err(grammar_error(format!("unexpected '{}'", extra), line));
    }
    Ok(pattern)
}

/// First non-blank line of a help text.
pub fn summary(help: &str) -> &str {
    help.lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or("")
}

fn usage_lines(help: &str) -> Option<Vec<String>> {
    let mut lines = help.lines();
    let mut found = Vec::new();
    loop {
        let line = lines.next()?;
        let trimmed = line.trim();
        if trimmed
            .get(..6)
            .is_some_and(|head| head.eq_ignore_ascii_case("usage:"))
        {
            let inline = trimmed[6..].trim();
            if !inline.is_empty() {
                found.push(inline.to_string());
            }
            break;
        }
    }
    for line in lines {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            if found.is_empty() {
                continue;
            }
            break;
        }
        if !line.starts_with(char::is_whitespace) && !found.is_empty() {
            break;
        }
        found.push(trimmed.to_string());
    }
    Some(found)
}

/// A compiled usage grammar.
#[derive(Debug, Clone)]
pub struct Usage {
    lines: Vec<String>,
    pattern: Pattern,
    defaults: Bindings,
    flags: Vec<String>,
    valued: Vec<String>,
}

impl Usage {
    /// Compiles the `Usage:` section of `help`, if it has one.
    pub fn from_help(help: &str) -> ShellResult<Option<Usage>> {
        let Some(lines) = usage_lines(help) else {
            return Ok(None);
        };
        if lines.is_empty() {
            return Err(ShellError::new(ErrorKind::Grammar, "empty usage section"));
        }
        let mut forms = Vec::with_capacity(lines.len());
        for line in &lines {
            forms.push(parse_line(line)?);
        }
        let pattern = if forms.len() == 1 {
            forms.remove(0)
        } else {
            Pattern::Either(forms)
        };
        let mut defaults = Bindings::new();
        pattern.collect_defaults(false, &mut defaults);
        let mut options = Vec::new();
        pattern.collect_options(&mut options);
        let mut flags = Vec::new();
        let mut valued = Vec::new();
        for option in options {
            match option {
                Pattern::Flag(name) => flags.push(name.clone()),
                Pattern::OptionValue(name) => valued.push(name.clone()),
                _ => {}
            }
        }
        Ok(Some(Usage {
            lines,
            pattern,
            defaults,
            flags,
            valued,
        }))
    }

    /// The accepted forms, one per line, prefixed with `usage:`.
    pub fn message(&self) -> String {
        let mut out = String::new();
        for (i, line) in self.lines.iter().enumerate() {
            if i == 0 {
                out.push_str("usage: ");
            } else {
                out.push_str("\n       ");
            }
            out.push_str(line);
        }
        out
    }

    fn usage_error(&self) -> ShellError {
        ShellError::new(ErrorKind::Usage, self.message())
    }

    fn split_options(&self, argv: &[String], bound: &mut Bindings) -> ShellResult<Vec<String>> {
        let mut positional = Vec::new();
        let mut iter = argv.iter().skip(1);
        while let Some(arg) = iter.next() {
            if arg == "--" {
                positional.extend(iter.by_ref().cloned());
                break;
            }
            if self.flags.iter().any(|f| f == arg) {
                bound.insert(arg.clone(), UsageValue::Flag(true));
                continue;
            }
            if let Some((key, value)) = arg.split_once('=') {
                if self.valued.iter().any(|v| v == key) {
                    bind(bound, key, value);
                    continue;
                }
            }
            if self.valued.iter().any(|v| v == arg) {
                let value = iter.next().ok_or_else(|| self.usage_error())?;
                bind(bound, arg, value);
                continue;
            }
            if self.is_short_cluster(arg) {
                for ch in arg.chars().skip(1) {
                    bound.insert(format!("-{}", ch), UsageValue::Flag(true));
                }
                continue;
            }
            positional.push(arg.clone());
        }
        Ok(positional)
    }

    fn is_short_cluster(&self, arg: &str) -> bool {
        arg.len() > 2
            && arg.starts_with('-')
            && !arg.starts_with("--")
            && arg
                .chars()
                .skip(1)
                .all(|ch| self.flags.iter().any(|f| *f == format!("-{}", ch)))
    }

    /// Matches `argv` (command name first) against the grammar.
    pub fn apply(&self, argv: &[String]) -> ShellResult<ParsedArgs> {
        let mut bound = self.defaults.clone();
        let positional = self.split_options(argv, &mut bound)?;
        let mut trail = Vec::new();
        let total = positional.len();
        let matched = self
            .pattern
            .walk(&positional, 0, &mut trail, &mut |end, _| end == total)
            .then(|| {
                for item in &trail {
                    match item {
                        Capture::Word(word) => {
                            bound.insert(word.to_string(), UsageValue::Flag(true));
                        }
                        Capture::Value(name, value) => bind(&mut bound, name, value),
                    }
                }
                bound
            });
        match matched {
            Some(values) => Ok(ParsedArgs {
                argv: argv.to_vec(),
                values,
            }),
            None => {
                debug!(
                    "usage event=mismatch name={} args={}",
                    argv.first().map(String::as_str).unwrap_or(""),
                    positional.len()
                );
                Err(self.usage_error())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(line: &str) -> Vec<String> {
        line.split_whitespace().map(str::to_string).collect()
    }

    fn usage(help: &str) -> Usage {
        Usage::from_help(help).unwrap().unwrap()
    }

    const HELP: &str = "Print help text on the given commands, or all commands.

    Usage:
        help [<name>...]
    ";

    #[test]
    fn summary_is_first_line() {
        assert_eq!(
            summary(HELP),
            "Print help text on the given commands, or all commands."
        );
        assert_eq!(summary("\n\n  Exit.  \n"), "Exit.");
        assert_eq!(summary(""), "");
    }

    #[test]
    fn no_usage_section() {
        assert!(Usage::from_help("Exits this level.").unwrap().is_none());
    }

    #[test]
    fn optional_repeated_argument() {
        let usage = usage(HELP);
        let args = usage.apply(&argv("help")).unwrap();
        assert!(args.list("<name>").is_empty());
        assert_eq!(args.name(), "help");
        let args = usage.apply(&argv("help alias exit")).unwrap();
        assert_eq!(args.list("<name>"), ["alias", "exit"]);
        assert_eq!(args.get("<name>"), Some("alias"));
    }

    #[test]
    fn required_argument_missing() {
        let usage = usage("Remove an alias.\n\nUsage:\n    unalias <name>\n");
        let err = usage.apply(&argv("unalias")).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Usage);
        assert_eq!(err.message, "usage: unalias <name>");
        assert!(usage.apply(&argv("unalias a b")).is_err());
        let args = usage.apply(&argv("unalias ll")).unwrap();
        assert_eq!(args.get("<name>"), Some("ll"));
    }

    #[test]
    fn flags_anywhere_and_clusters() {
        let usage = usage("List.\n\nUsage:\n    ls [-l] [-a] [<path>]\n");
        let args = usage.apply(&argv("ls /tmp -l")).unwrap();
        assert!(args.flag("-l"));
        assert!(!args.flag("-a"));
        assert_eq!(args.get("<path>"), Some("/tmp"));
        let args = usage.apply(&argv("ls -la")).unwrap();
        assert!(args.flag("-l") && args.flag("-a"));
        assert_eq!(args.get("<path>"), None);
        let args = usage.apply(&argv("ls -- -l")).unwrap();
        assert!(!args.flag("-l"));
        assert_eq!(args.get("<path>"), Some("-l"));
    }

    #[test]
    fn undeclared_dash_words_are_positional() {
        let usage = usage("Add.\n\nUsage:\n    sum <n>...\n");
        let args = usage.apply(&argv("sum 1 -2 3")).unwrap();
        assert_eq!(args.list("<n>"), ["1", "-2", "3"]);
        assert!(usage.apply(&argv("sum")).is_err());
    }

    #[test]
    fn long_repeats_bind_every_word() {
        let usage = usage("Print.\n\nUsage:\n    echo [<text>...]\n");
        let words: Vec<String> = (0..500).map(|n| n.to_string()).collect();
        let mut line = vec!["echo".to_string()];
        line.extend(words.iter().cloned());
        let args = usage.apply(&line).unwrap();
        assert_eq!(args.list("<text>"), words.as_slice());
    }

    #[test]
    fn adjacent_repeats_backtrack() {
        let usage = usage("Pair.\n\nUsage:\n    pair <a>... <b>...\n");
        let args = usage.apply(&argv("pair 1 2 3")).unwrap();
        assert_eq!(args.list("<a>"), ["1", "2"]);
        assert_eq!(args.list("<b>"), ["3"]);
        assert!(usage.apply(&argv("pair 1")).is_err());
    }

    #[test]
    fn valued_options() {
        let usage = usage("Wait.\n\nUsage:\n    wait [--timeout=<secs>] <job>\n");
        let args = usage.apply(&argv("wait --timeout=5 j1")).unwrap();
        assert_eq!(args.get("--timeout"), Some("5"));
        let args = usage.apply(&argv("wait j1 --timeout 7")).unwrap();
        assert_eq!(args.get("--timeout"), Some("7"));
        assert_eq!(args.get("<job>"), Some("j1"));
        assert!(usage.apply(&argv("wait j1 --timeout")).is_err());
    }

    #[test]
    fn alternatives_and_commands() {
        let usage = usage(
            "Manage breakpoints.

Usage:
    break (set|clear) <where>
    break list
",
        );
        let args = usage.apply(&argv("break clear main.rs:4")).unwrap();
        assert!(args.flag("clear"));
        assert!(!args.flag("set"));
        assert_eq!(args.get("<where>"), Some("main.rs:4"));
        let args = usage.apply(&argv("break list")).unwrap();
        assert!(args.flag("list"));
        let err = usage.apply(&argv("break toggle x")).unwrap_err();
        assert_eq!(
            err.message,
            "usage: break (set|clear) <where>\n       break list"
        );
    }

    #[test]
    fn optional_before_required_backtracks() {
        let usage = usage("Usage: set [<name> [<value>...]]");
        let args = usage.apply(&argv("set")).unwrap();
        assert_eq!(args.get("<name>"), None);
        let args = usage.apply(&argv("set PS1 a b")).unwrap();
        assert_eq!(args.get("<name>"), Some("PS1"));
        assert_eq!(args.list("<value>"), ["a", "b"]);

        let usage = self::usage("Usage: cp [<src>] <dst>");
        let args = usage.apply(&argv("cp x")).unwrap();
        assert_eq!(args.get("<src>"), None);
        assert_eq!(args.get("<dst>"), Some("x"));
    }

    #[test]
    fn malformed_grammar() {
        let err = Usage::from_help("Usage:\n    bad [<x>\n").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Grammar);
        assert!(Usage::from_help("Usage:\n    bad <x>)\n").is_err());
        assert!(Usage::from_help("Usage:\n    bad ...\n").is_err());
    }

    #[test]
    fn bare_args() {
        let args = ParsedArgs::bare(argv("fail now"));
        assert_eq!(args.name(), "fail");
        assert_eq!(args.rest(), ["now"]);
        assert!(!args.flag("--x"));
    }
}
