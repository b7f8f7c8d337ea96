//! Tokenizer for shell input.
//!
//! A transition table over `fsm::Automaton<char, Words>`. Whitespace splits
//! words, `;` and newline end a statement, single quotes are fully literal,
//! double quotes allow `$` expansion, backslash escapes and nested single
//! quoted runs. Closing either kind of quote completes a word, so `""` is a
//! word of its own.
//!
//! Input is pushed incrementally. Whatever is left unprocessed when the
//! caller stops pulling statements stays pending, so a statement that spans
//! several lines is assembled across pushes.
use std::collections::VecDeque;

use log::debug;

use crate::env::{NoVars, VarLookup};
use crate::error::{ErrorKind, ShellError, ShellResult};
use crate::fsm::{Automaton, State, Step, Symbol};
use crate::parse::{is_var_char, resolve_escape};

const GROUND: State = 0;
const ESCAPE: State = 1;
const SINGLE: State = 2;
const DOUBLE: State = 3;
const DOUBLE_ESCAPE: State = 4;
const DOUBLE_SINGLE: State = 5;
const VAR_START: State = 6;
const VAR: State = 7;
const BRACED_VAR: State = 8;
const DOUBLE_VAR_START: State = 9;
const DOUBLE_VAR: State = 10;
const DOUBLE_BRACED_VAR: State = 11;

const VAR_CHARS: &str = "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789_?";

/// Whether the tokenizer can accept a fresh statement or is mid-construct.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feed {
    Complete,
    Continuation,
}

/// Scratch record the tokenizer's actions build into.
#[derive(Debug, Default)]
struct Words {
    word: String,
    name: String,
    args: Vec<String>,
    statement: Option<Vec<String>>,
    joined: bool,
}

impl Words {
    fn flush(&mut self) {
        let word = std::mem::take(&mut self.word);
        self.args.push(word);
    }

    fn clear(&mut self) {
        self.word.clear();
        self.name.clear();
        self.args.clear();
        self.statement = None;
        self.joined = false;
    }
}

type TokStep<'a> = Step<'a, char, Words>;

fn add_text(c: char, step: &mut TokStep) -> ShellResult<()> {
    step.scratch.word.push(c);
    Ok(())
}

fn word_break(_c: char, step: &mut TokStep) -> ShellResult<()> {
    if !step.scratch.word.is_empty() {
        step.scratch.flush();
    }
    Ok(())
}

fn close_quote(_c: char, step: &mut TokStep) -> ShellResult<()> {
    step.scratch.flush();
    Ok(())
}

fn terminate(c: char, step: &mut TokStep) -> ShellResult<()> {
    word_break(c, step)?;
    let words = &mut step.scratch;
    words.statement = Some(std::mem::take(&mut words.args));
    words.joined = false;
    Ok(())
}

fn escape(c: char, step: &mut TokStep) -> ShellResult<()> {
    step.scratch.word.push(resolve_escape(c));
    Ok(())
}

fn join_lines(_c: char, step: &mut TokStep) -> ShellResult<()> {
    step.scratch.joined = true;
    Ok(())
}

fn start_var(_c: char, step: &mut TokStep) -> ShellResult<()> {
    step.scratch.name.clear();
    Ok(())
}

fn var_text(c: char, step: &mut TokStep) -> ShellResult<()> {
    step.scratch.name.push(c);
    Ok(())
}

fn substitute(step: &mut TokStep) {
    let name = std::mem::take(&mut step.scratch.name);
    if name.is_empty() {
        return;
    }
    if let Some(value) = step.vars.lookup(&name) {
        step.scratch.word.push_str(&value);
    }
}

// The character that ended the name belongs to the enclosing state.
fn end_var(c: char, step: &mut TokStep) -> ShellResult<()> {
    step.stack.push(c);
    substitute(step);
    Ok(())
}

fn end_braced(_c: char, step: &mut TokStep) -> ShellResult<()> {
    if step.scratch.name.is_empty() {
        return Err(ShellError::new(ErrorKind::Lexical, "bad substitution: ${}"));
    }
    substitute(step);
    Ok(())
}

fn bad_substitution(_c: char, step: &mut TokStep) -> ShellResult<()> {
    Err(ShellError::new(
        ErrorKind::Lexical,
        format!("bad substitution: unterminated ${{{}", step.scratch.name),
    ))
}

fn build() -> Automaton<char, Words> {
    let mut f = Automaton::new(GROUND);

    // plain words
    f.add_transition(Symbol::Any, GROUND, Some(add_text), None);
    f.add_transitions([' ', '\t'], GROUND, Some(word_break), None);
    f.add_transitions([';', '\n'], GROUND, Some(terminate), None);
    f.add_transition('\\', GROUND, None, Some(ESCAPE));
    f.add_transition('\n', ESCAPE, Some(join_lines), Some(GROUND));
    f.add_transition(Symbol::Any, ESCAPE, Some(escape), Some(GROUND));

    // single quotes are literal
    f.add_transition('\'', GROUND, None, Some(SINGLE));
    f.add_transition('\'', SINGLE, Some(close_quote), Some(GROUND));
    f.add_transition(Symbol::Any, SINGLE, Some(add_text), None);

    // double quotes keep word breaks
    f.add_transition('"', GROUND, None, Some(DOUBLE));
    f.add_transition('"', DOUBLE, Some(close_quote), Some(GROUND));
    f.add_transition(Symbol::Any, DOUBLE, Some(add_text), None);
    f.add_transition('\\', DOUBLE, None, Some(DOUBLE_ESCAPE));
    f.add_transition('\n', DOUBLE_ESCAPE, Some(join_lines), Some(DOUBLE));
    f.add_transition(Symbol::Any, DOUBLE_ESCAPE, Some(escape), Some(DOUBLE));
    f.add_transition('\'', DOUBLE, None, Some(DOUBLE_SINGLE));
    f.add_transition('\'', DOUBLE_SINGLE, None, Some(DOUBLE));
    f.add_transition(Symbol::Any, DOUBLE_SINGLE, Some(add_text), None);

    // variables
    for (outer, start, var, braced) in [
        (GROUND, VAR_START, VAR, BRACED_VAR),
        (DOUBLE, DOUBLE_VAR_START, DOUBLE_VAR, DOUBLE_BRACED_VAR),
    ] {
        f.add_transition('$', outer, Some(start_var), Some(start));
        f.add_transition('{', start, None, Some(braced));
        f.add_transitions(VAR_CHARS.chars(), start, Some(var_text), Some(var));
        f.add_transition(Symbol::Any, start, Some(end_var), Some(outer));
        f.add_transitions(VAR_CHARS.chars(), var, Some(var_text), None);
        f.add_transition(Symbol::Any, var, Some(end_var), Some(outer));
        f.add_transition('}', braced, Some(end_braced), Some(outer));
        f.add_transition('\n', braced, Some(bad_substitution), None);
        f.add_transition(Symbol::Any, braced, Some(var_text), None);
    }
    debug_assert!(VAR_CHARS.chars().all(is_var_char));

    f
}

/// Incremental shell tokenizer.
pub struct Tokenizer {
    fsm: Automaton<char, Words>,
    words: Words,
    pending: VecDeque<(usize, char)>,
    ended_line: bool,
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Tokenizer {
    pub fn new() -> Self {
        Self {
            fsm: build(),
            words: Words::default(),
            pending: VecDeque::new(),
            ended_line: true,
        }
    }

    /// Queues `text` behind whatever is still pending. Two pushes that are not
    /// separated by a newline are joined with a single space, unless a trailing
    /// backslash is waiting for the first character of `text`.
    pub fn push_input(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        if !self.ended_line && !self.is_clear() && !self.awaits_escaped_char() {
            self.pending.push_back((0, ' '));
        }
        self.words.joined = false;
        self.pending.extend(text.char_indices());
        self.ended_line = text.ends_with('\n');
    }

    /// Runs pending input until one non-empty statement is complete.
    ///
    /// Variables are looked up in `vars` as the characters are reached, so a
    /// caller that dispatches each statement before pulling the next one gets
    /// lookups against the level that is active at that point.
    pub fn next_statement(&mut self, vars: &dyn VarLookup) -> ShellResult<Option<Vec<String>>> {
        while let Some((pos, c)) = self.pending.pop_front() {
            let step = self
                .fsm
                .process(c, &mut self.words, vars)
                .and_then(|_| self.fsm.settle(&mut self.words, vars));
            if let Err(err) = step {
                debug!(
                    "tokenizer event=error pos={} state={} dropped={}",
                    pos,
                    self.fsm.state(),
                    self.pending.len()
                );
                self.abandon();
                let err = ShellError {
                    kind: ErrorKind::Lexical,
                    ..err
                };
                return Err(err.with_position(pos));
            }
            if let Some(statement) = self.words.statement.take() {
                if !statement.is_empty() {
                    return Ok(Some(statement));
                }
            }
        }
        Ok(None)
    }

    /// `Continuation` while a quote, escape or variable reference is open.
    pub fn status(&self) -> Feed {
        if self.fsm.is_idle() && !self.words.joined {
            Feed::Complete
        } else {
            Feed::Continuation
        }
    }

    /// Words collected so far for a statement that has not ended yet.
    pub fn partial(&self) -> &[String] {
        &self.words.args
    }

    /// Unprocessed input.
    pub fn pending(&self) -> String {
        self.pending.iter().map(|(_, c)| *c).collect()
    }

    /// Drops pending input and any half-built statement.
    pub fn abandon(&mut self) {
        self.fsm.reset();
        self.words.clear();
        self.pending.clear();
        self.ended_line = true;
    }

    /// Pushes `text` and collects every statement it completes.
    pub fn feed(&mut self, text: &str, vars: &dyn VarLookup) -> ShellResult<(Vec<Vec<String>>, Feed)> {
        self.push_input(text);
        let mut statements = Vec::new();
        while let Some(statement) = self.next_statement(vars)? {
            statements.push(statement);
        }
        Ok((statements, self.status()))
    }

    fn is_clear(&self) -> bool {
        self.fsm.is_idle() && self.words.word.is_empty() && self.words.args.is_empty()
    }

    fn awaits_escaped_char(&self) -> bool {
        self.pending.is_empty() && matches!(self.fsm.state(), ESCAPE | DOUBLE_ESCAPE)
    }

    fn open_construct(&self) -> &'static str {
        match self.fsm.state() {
            ESCAPE | DOUBLE_ESCAPE => "trailing backslash",
            SINGLE | DOUBLE_SINGLE => "unterminated single quote",
            DOUBLE | DOUBLE_VAR_START | DOUBLE_VAR => "unterminated double quote",
            BRACED_VAR | DOUBLE_BRACED_VAR => "unterminated ${",
            _ => "line continues past end of input",
        }
    }
}

fn run_to_end(text: &str, vars: &dyn VarLookup) -> ShellResult<Vec<Vec<String>>> {
    let mut tokenizer = Tokenizer::new();
    let mut input = text.to_string();
    input.push('\n');
    let (statements, status) = tokenizer.feed(&input, vars)?;
    if status == Feed::Continuation {
        return Err(ShellError::new(ErrorKind::Lexical, tokenizer.open_construct())
            .with_position(text.len()));
    }
    Ok(statements)
}

/// Splits one statement into words.
pub fn tokenize(line: &str, vars: &dyn VarLookup) -> ShellResult<Vec<String>> {
    let mut statements = run_to_end(line, vars)?;
    if statements.len() > 1 {
        return Err(ShellError::new(
            ErrorKind::Lexical,
            format!("expected one statement, found {}", statements.len()),
        ));
    }
    Ok(statements.pop().unwrap_or_default())
}

/// Splits text into its non-empty statements.
pub fn split_statements(text: &str, vars: &dyn VarLookup) -> ShellResult<Vec<Vec<String>>> {
    run_to_end(text, vars)
}

/// `tokenize` without variable expansion.
pub fn split_words(text: &str) -> ShellResult<Vec<String>> {
    tokenize(text, &NoVars)
}
