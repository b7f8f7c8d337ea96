//! The read-tokenize-dispatch loop over a stack of levels.
use log::{debug, info};

use crate::alias::AliasTable;
use crate::command::{CommandSet, Value};
use crate::context::ContextStack;
use crate::dispatch::{dispatch, Dispatch};
use crate::env::{Environment, PS1, PS2, STATUS};
use crate::error::ShellResult;
use crate::io_helpers::LineSource;
use crate::parse::{Feed, Tokenizer};
use crate::signals::Interrupt;
use crate::ui::Ui;

/// State of the session after some input was fed to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Ready for a new statement.
    Ready,
    /// A quote, escape or variable reference is still open.
    More,
    /// The last level exited.
    Ended,
}

pub struct Session {
    stack: ContextStack,
    tokenizer: Tokenizer,
    ui: Ui,
    interrupt: Interrupt,
    trace: bool,
    last_status: i64,
}

impl Session {
    /// Starts a session whose root level runs `root` with the given
    /// variables and aliases.
    pub fn new(root: Box<dyn CommandSet>, env: Environment, aliases: AliasTable, ui: Ui) -> Self {
        let mut stack = ContextStack::new();
        stack.push_root(root, env, aliases);
        if let Some(level) = stack.top_mut() {
            level.env.set_default(PS1, "> ");
            level.env.set_default(PS2, "... ");
        }
        Self {
            stack,
            tokenizer: Tokenizer::new(),
            ui,
            interrupt: Interrupt::new(),
            trace: false,
            last_status: 0,
        }
    }

    /// Logs every dispatched statement at `info`.
    pub fn set_trace(&mut self, trace: bool) {
        self.trace = trace;
    }

    /// Handle for requesting an abort from outside the loop.
    pub fn interrupt(&self) -> Interrupt {
        self.interrupt.clone()
    }

    pub fn stack(&self) -> &ContextStack {
        &self.stack
    }

    pub fn stack_mut(&mut self) -> &mut ContextStack {
        &mut self.stack
    }

    pub fn ui_mut(&mut self) -> &mut Ui {
        &mut self.ui
    }

    pub fn is_finished(&self) -> bool {
        self.stack.is_empty()
    }

    /// `?` of the active level, or the value the last level exited with.
    pub fn exit_status(&self) -> i64 {
        match self.stack.top() {
            Some(level) => level.env.get_int(STATUS).unwrap_or(0),
            None => self
                .stack
                .exit_value()
                .map(Value::status)
                .unwrap_or(self.last_status),
        }
    }

    /// `exit_status` reduced to the 0-255 range a process can report.
    pub fn exit_code(&self) -> i32 {
        (self.exit_status() & 0xff) as i32
    }

    /// Tokenizes `text` and dispatches every statement it completes, each
    /// against the level active when it is reached.
    pub fn feed(&mut self, text: &str) -> Flow {
        if self.stack.is_empty() {
            return Flow::Ended;
        }
        self.tokenizer.push_input(text);
        loop {
            let Some(level) = self.stack.top_mut() else {
                self.tokenizer.abandon();
                return Flow::Ended;
            };
            let argv = match self.tokenizer.next_statement(&level.env) {
                Ok(Some(argv)) => argv,
                Ok(None) => break,
                Err(err) => {
                    level.env.set(STATUS, "2");
                    self.ui.error(&err.display_with_input(text));
                    return Flow::Ready;
                }
            };
            if self.trace {
                info!("trace event=dispatch depth={} argv={:?}", self.stack.depth(), argv);
            }
            // A Ctrl-C at the prompt must not abort the next command.
            self.interrupt.clear();
            let outcome = dispatch(&mut self.stack, &mut self.ui, &self.interrupt, argv);
            if let Some(status) = self.stack.top().and_then(|level| level.env.get_int(STATUS)) {
                self.last_status = status;
            }
            match outcome {
                Dispatch::Ended => {
                    self.tokenizer.abandon();
                    return Flow::Ended;
                }
                Dispatch::Aborted => {
                    let dropped = self.tokenizer.pending();
                    debug!("session event=abort dropped={:?}", dropped);
                    self.tokenizer.abandon();
                    return Flow::Ready;
                }
                _ => {}
            }
        }
        match self.tokenizer.status() {
            Feed::Complete => Flow::Ready,
            Feed::Continuation => Flow::More,
        }
    }

    /// Reads from `source` until every level has exited. End of input exits
    /// the active level.
    pub fn run(&mut self, source: &mut dyn LineSource) -> ShellResult<()> {
        while let Some(level) = self.stack.top() {
            source.refresh(&level.snapshot());
            let continuing = self.tokenizer.status() == Feed::Continuation;
            let template = level
                .env
                .get(if continuing { PS2 } else { PS1 })
                .unwrap_or_default()
                .to_string();
            let prompt = self.ui.prompt(&template, &level.env);
            let line = if continuing {
                source.read_continuation(&prompt)?
            } else {
                source.read_line(&prompt)?
            };
            match line {
                Some(line) => {
                    self.feed(&format!("{}\n", line));
                }
                None => self.end_of_input(continuing, source.interactive()),
            }
        }
        debug!("session event=finished status={}", self.exit_status());
        Ok(())
    }

    fn end_of_input(&mut self, continuing: bool, interactive: bool) {
        if interactive {
            self.ui.write("\n");
        }
        if continuing {
            self.ui.warning("unexpected end of input");
        }
        self.tokenizer.abandon();
        debug!("session event=eof depth={}", self.stack.depth());
        self.stack.pop(None, &mut self.ui);
    }
}
