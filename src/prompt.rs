//! Percent-escape expansion for prompts and formatted output.
//!
//! | template | result |
//! |---|---|
//! | `%%` | `%` |
//! | `%{NAME}` | value of `NAME`, or `NAME` itself when unset |
//! | `%[F12]` / `%[12]` | 256-colour foreground |
//! | `%[B12]` | 256-colour background |
//! | `%x` | registered code `x`, else `x` |
//!
//! Each `Expander` owns its own code table and memo of lazily computed
//! values. A template that ends inside an escape keeps the unfinished text.
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use log::warn;

use crate::colors::Theme;
use crate::env::VarLookup;
use crate::error::{ErrorKind, ShellError, ShellResult};
use crate::fsm::{Automaton, State, Step, Symbol};

pub mod codes;
pub mod sysinfo;

pub use codes::{CodeTable, RESERVED};

const GROUND: State = 0;
const PERCENT: State = 1;
const NAME: State = 2;
const COLOR: State = 3;
const FG: State = 4;
const BG: State = 5;

const DIGITS: &str = "0123456789";

/// Start and end of a range the line editor must not count as printable.
pub const START_IGNORE: char = '\x01';
pub const END_IGNORE: char = '\x02';

/// How colour sequences are emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flavor {
    /// Wrapped in `\x01`/`\x02` for prompts handed to a line editor.
    Readline,
    /// Raw sequences for ordinary output.
    Ansi,
}

impl Flavor {
    pub fn wrap(self, sequence: &str) -> String {
        if sequence.is_empty() {
            return String::new();
        }
        match self {
            Flavor::Readline => format!("{START_IGNORE}{sequence}{END_IGNORE}"),
            Flavor::Ansi => sequence.to_string(),
        }
    }
}

/// Value behind a single-letter code.
#[derive(Clone)]
pub enum Expansion {
    Literal(String),
    /// Computed on first use, then remembered by the expander.
    Lazy(Rc<dyn Fn() -> String>),
    /// Computed on every use.
    Live(Rc<dyn Fn(&dyn VarLookup) -> String>),
}

impl fmt::Debug for Expansion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expansion::Literal(text) => f.debug_tuple("Literal").field(text).finish(),
            Expansion::Lazy(_) => f.write_str("Lazy(..)"),
            Expansion::Live(_) => f.write_str("Live(..)"),
        }
    }
}

struct Canvas {
    out: String,
    name: String,
    color: String,
    flavor: Flavor,
    codes: CodeTable,
    cache: HashMap<char, String>,
}

type ExpStep<'a> = Step<'a, char, Canvas>;

fn add_text(c: char, step: &mut ExpStep) -> ShellResult<()> {
    step.scratch.out.push(c);
    Ok(())
}

fn start_name(_c: char, step: &mut ExpStep) -> ShellResult<()> {
    step.scratch.name.clear();
    Ok(())
}

fn name_text(c: char, step: &mut ExpStep) -> ShellResult<()> {
    step.scratch.name.push(c);
    Ok(())
}

fn end_name(_c: char, step: &mut ExpStep) -> ShellResult<()> {
    let name = std::mem::take(&mut step.scratch.name);
    let value = step.vars.lookup(&name).unwrap_or(name);
    step.scratch.out.push_str(&value);
    Ok(())
}

fn start_color(_c: char, step: &mut ExpStep) -> ShellResult<()> {
    step.scratch.color.clear();
    Ok(())
}

fn color_digit(c: char, step: &mut ExpStep) -> ShellResult<()> {
    step.scratch.color.push(c);
    Ok(())
}

fn emit_color(step: &mut ExpStep, layer: u8) {
    let canvas = &mut step.scratch;
    if canvas.color.is_empty() {
        return;
    }
    let sequence = format!("\x1b[{};5;{}m", layer, canvas.color);
    canvas.out.push_str(&canvas.flavor.wrap(&sequence));
}

fn set_fg(_c: char, step: &mut ExpStep) -> ShellResult<()> {
    emit_color(step, 38);
    Ok(())
}

fn set_bg(_c: char, step: &mut ExpStep) -> ShellResult<()> {
    emit_color(step, 48);
    Ok(())
}

fn expand_code(c: char, step: &mut ExpStep) -> ShellResult<()> {
    let canvas = &mut step.scratch;
    if let Some(known) = canvas.cache.get(&c) {
        canvas.out.push_str(known);
        return Ok(());
    }
    match canvas.codes.get(&c) {
        Some(Expansion::Literal(text)) => canvas.out.push_str(text),
        Some(Expansion::Lazy(produce)) => {
            let value = produce();
            canvas.out.push_str(&value);
            canvas.cache.insert(c, value);
        }
        Some(Expansion::Live(produce)) => {
            let value = produce(step.vars);
            canvas.out.push_str(&value);
        }
        None => canvas.out.push(c),
    }
    Ok(())
}

fn malformed(c: char, _step: &mut ExpStep) -> ShellResult<()> {
    warn!("prompt event=malformed symbol={:?}", c);
    Ok(())
}

fn build() -> Automaton<char, Canvas> {
    let mut f = Automaton::new(GROUND);
    f.add_default_transition(Some(malformed), Some(GROUND));
    f.add_transition(Symbol::Any, GROUND, Some(add_text), None);
    f.add_transition('%', GROUND, None, Some(PERCENT));
    f.add_transition('%', PERCENT, Some(add_text), Some(GROUND));
    f.add_transition(Symbol::Any, PERCENT, Some(expand_code), Some(GROUND));
    // %{NAME}
    f.add_transition('{', PERCENT, Some(start_name), Some(NAME));
    f.add_transition('}', NAME, Some(end_name), Some(GROUND));
    f.add_transition(Symbol::Any, NAME, Some(name_text), None);
    // %[F<n>] %[B<n>] %[<n>]
    f.add_transition('[', PERCENT, Some(start_color), Some(COLOR));
    f.add_transition('F', COLOR, None, Some(FG));
    f.add_transition('B', COLOR, None, Some(BG));
    f.add_transitions(DIGITS.chars(), COLOR, Some(color_digit), Some(FG));
    f.add_transition(']', COLOR, None, Some(GROUND));
    f.add_transitions(DIGITS.chars(), FG, Some(color_digit), None);
    f.add_transitions(DIGITS.chars(), BG, Some(color_digit), None);
    f.add_transition(']', FG, Some(set_fg), Some(GROUND));
    f.add_transition(']', BG, Some(set_bg), Some(GROUND));
    f
}

/// Percent-escape template expander.
pub struct Expander {
    fsm: Automaton<char, Canvas>,
    canvas: Canvas,
}

impl Expander {
    pub fn new(theme: &Theme, flavor: Flavor) -> Self {
        Self {
            fsm: build(),
            canvas: Canvas {
                out: String::new(),
                name: String::new(),
                color: String::new(),
                flavor,
                codes: codes::reserved(theme, flavor),
                cache: HashMap::new(),
            },
        }
    }

    pub fn flavor(&self) -> Flavor {
        self.canvas.flavor
    }

    pub fn expand(&mut self, template: &str, vars: &dyn VarLookup) -> String {
        self.fsm.reset();
        self.canvas.out.clear();
        let mut escape_start = 0;
        for (idx, c) in template.char_indices() {
            if self.fsm.is_idle() {
                escape_start = idx;
            }
            if let Err(err) = self.fsm.process(c, &mut self.canvas, vars) {
                warn!("prompt event=error err={}", err.display_simple());
                break;
            }
        }
        if !self.fsm.is_idle() {
            self.canvas.out.push_str(&template[escape_start..]);
            self.fsm.reset();
        }
        std::mem::take(&mut self.canvas.out)
    }

    pub fn is_registered(&self, code: char) -> bool {
        self.canvas.codes.contains_key(&code)
    }

    /// Adds a code. Codes that already have a value are never replaced.
    pub fn register(&mut self, code: char, expansion: Expansion) -> ShellResult<()> {
        if self.is_registered(code) {
            return Err(ShellError::new(
                ErrorKind::Config,
                format!("expansion code '%{}' already exists", code),
            ));
        }
        self.canvas.codes.insert(code, expansion);
        Ok(())
    }

    /// Removes a consumer code. Returns whether anything was removed.
    pub fn unregister(&mut self, code: char) -> bool {
        if codes::is_reserved(code) {
            return false;
        }
        self.canvas.cache.remove(&code);
        self.canvas.codes.remove(&code).is_some()
    }
}
