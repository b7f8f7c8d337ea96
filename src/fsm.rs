//! Table-driven finite state machine.
//!
//! Both the shell tokenizer and the prompt expander are transition tables
//! over this one executor. A table maps `(symbol, state)` to an optional
//! action and an optional next state. Lookup order is: exact symbol, then
//! `Symbol::Any` for the state, then the default transition. Anything else
//! is a grammar error.
//!
//! Actions receive a `Step` giving them the caller's scratch record, the
//! automaton's own scratch stack (symbols pushed there are fed back in by
//! `settle`) and the variables the caller passed in.

use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

use log::debug;

use crate::env::VarLookup;
use crate::error::{ErrorKind, ShellError, ShellResult};

pub type State = u8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Symbol<S> {
    Exact(S),
    /// Matches any symbol for which the state has no exact entry.
    Any,
}

impl<S> From<S> for Symbol<S> {
    fn from(symbol: S) -> Self {
        Symbol::Exact(symbol)
    }
}

/// What an action can touch while it runs.
pub struct Step<'a, S, C> {
    pub scratch: &'a mut C,
    pub stack: &'a mut Vec<S>,
    pub vars: &'a dyn VarLookup,
}

pub type Action<S, C> = fn(S, &mut Step<'_, S, C>) -> ShellResult<()>;

pub struct Transition<S, C> {
    action: Option<Action<S, C>>,
    next: Option<State>,
}

impl<S, C> Clone for Transition<S, C> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S, C> Copy for Transition<S, C> {}

pub struct Automaton<S, C> {
    transitions: HashMap<(Symbol<S>, State), Transition<S, C>>,
    default: Option<Transition<S, C>>,
    initial: State,
    state: State,
    stack: Vec<S>,
}

impl<S, C> Automaton<S, C>
where
    S: Copy + Eq + Hash + Debug,
{
    pub fn new(initial: State) -> Self {
        Self {
            transitions: HashMap::new(),
            default: None,
            initial,
            state: initial,
            stack: Vec::new(),
        }
    }

    pub fn state(&self) -> State {
        self.state
    }

    /// True when sitting in the initial state.
    pub fn is_idle(&self) -> bool {
        self.state == self.initial
    }

    pub fn stack(&self) -> &[S] {
        &self.stack
    }

    pub fn reset(&mut self) {
        self.stack.clear();
        self.state = self.initial;
    }

    pub fn add_transition(
        &mut self,
        symbol: impl Into<Symbol<S>>,
        state: State,
        action: Option<Action<S, C>>,
        next: Option<State>,
    ) {
        self.transitions
            .insert((symbol.into(), state), Transition { action, next });
    }

    pub fn add_transitions(
        &mut self,
        symbols: impl IntoIterator<Item = S>,
        state: State,
        action: Option<Action<S, C>>,
        next: Option<State>,
    ) {
        for symbol in symbols {
            self.add_transition(symbol, state, action, next);
        }
    }

    /// Fallback used when neither an exact nor an `Any` entry exists.
    /// Passing `None` for both clears it.
    pub fn add_default_transition(&mut self, action: Option<Action<S, C>>, next: Option<State>) {
        if action.is_none() && next.is_none() {
            self.default = None;
        } else {
            self.default = Some(Transition { action, next });
        }
    }

    fn transition(&self, symbol: S) -> ShellResult<Transition<S, C>> {
        self.transitions
            .get(&(Symbol::Exact(symbol), self.state))
            .or_else(|| self.transitions.get(&(Symbol::Any, self.state)))
            .or(self.default.as_ref())
            .copied()
            .ok_or_else(|| {
                ShellError::new(
                    ErrorKind::Grammar,
                    format!(
                        "transition {:?} is undefined in state {}",
                        symbol, self.state
                    ),
                )
                .with_context(format!("stack: {:?}", self.stack))
            })
    }

    /// Runs one symbol through the table.
    pub fn process(&mut self, symbol: S, scratch: &mut C, vars: &dyn VarLookup) -> ShellResult<()> {
        let transition = self.transition(symbol)?;
        if let Some(action) = transition.action {
            let mut step = Step {
                scratch,
                stack: &mut self.stack,
                vars,
            };
            action(symbol, &mut step)?;
        }
        if let Some(next) = transition.next {
            self.state = next;
        }
        Ok(())
    }

    /// Re-feeds symbols that actions pushed back, most recent first.
    pub fn settle(&mut self, scratch: &mut C, vars: &dyn VarLookup) -> ShellResult<()> {
        while let Some(symbol) = self.stack.pop() {
            debug!("fsm event=pushback symbol={:?} state={}", symbol, self.state);
            self.process(symbol, scratch, vars)?;
        }
        Ok(())
    }

    pub fn process_all(
        &mut self,
        symbols: impl IntoIterator<Item = S>,
        scratch: &mut C,
        vars: &dyn VarLookup,
    ) -> ShellResult<()> {
        for symbol in symbols {
            self.process(symbol, scratch, vars)?;
            self.settle(scratch, vars)?;
        }
        Ok(())
    }
}

impl<C> Automaton<char, C> {
    pub fn process_str(&mut self, text: &str, scratch: &mut C, vars: &dyn VarLookup) -> ShellResult<()> {
        self.process_all(text.chars(), scratch, vars)
    }
}
