//! Interpreter levels and the stack that nests them.
use std::collections::BTreeMap;

use log::debug;

use crate::alias::AliasTable;
use crate::builtins;
use crate::command::{CommandSet, Value};
use crate::completion::{CompletionScope, CompletionSnapshot, WordList, COMMANDS_SCOPE};
use crate::env::{Environment, PS1, SHLVL};
use crate::ui::Ui;

/// One interpreter level.
pub struct Context {
    commands: Box<dyn CommandSet>,
    pub env: Environment,
    pub aliases: AliasTable,
    depth: usize,
    scopes: BTreeMap<String, Box<dyn CompletionScope>>,
}

impl Context {
    fn new(commands: Box<dyn CommandSet>, env: Environment, aliases: AliasTable, depth: usize) -> Self {
        let names: Vec<String> = commands
            .commands()
            .iter()
            .chain(builtins::INFOS.iter())
            .map(|info| info.name.to_string())
            .collect();
        let mut context = Self {
            commands,
            env,
            aliases,
            depth,
            scopes: BTreeMap::new(),
        };
        context.add_scope(COMMANDS_SCOPE, Box::new(WordList::new(names.clone())));
        context.add_scope("help", Box::new(WordList::new(names)));
        context
    }

    /// Nesting depth, 1 for the root level.
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn commands(&self) -> &dyn CommandSet {
        self.commands.as_ref()
    }

    /// Disjoint borrows of the command set and the state its handlers mutate.
    pub fn parts_mut(&mut self) -> (&mut dyn CommandSet, &mut Environment, &mut AliasTable) {
        (self.commands.as_mut(), &mut self.env, &mut self.aliases)
    }

    /// Installs a completion scope, replacing one of the same name.
    pub fn add_scope(&mut self, name: impl Into<String>, scope: Box<dyn CompletionScope>) {
        self.scopes.insert(name.into(), scope);
    }

    pub fn scope(&self, name: &str) -> Option<&dyn CompletionScope> {
        self.scopes.get(name).map(|scope| scope.as_ref())
    }

    pub fn remove_scope(&mut self, name: &str) -> bool {
        self.scopes.remove(name).is_some()
    }

    /// Candidates the line editor should offer while this level is active.
    /// Aliases are read at call time since handlers may add them.
    pub fn snapshot(&self) -> CompletionSnapshot {
        let mut commands = self
            .scope(COMMANDS_SCOPE)
            .map(|scope| scope.candidates(""))
            .unwrap_or_default();
        commands.extend(self.aliases.names().map(str::to_string));
        commands.sort();
        commands.dedup();
        let arguments = self
            .scopes
            .iter()
            .filter(|(name, _)| name.as_str() != COMMANDS_SCOPE)
            .map(|(name, scope)| (name.clone(), scope.candidates("")))
            .collect();
        CompletionSnapshot {
            commands,
            vars: self.env.names().map(str::to_string).collect(),
            arguments,
        }
    }
}

/// What popping a level left behind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unwind {
    /// The level below is active again.
    Resumed { depth: usize },
    /// The last level is gone; the session is over.
    Exhausted,
}

#[derive(Default)]
pub struct ContextStack {
    levels: Vec<Context>,
    exit_value: Option<Value>,
}

impl ContextStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn depth(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn top(&self) -> Option<&Context> {
        self.levels.last()
    }

    pub fn top_mut(&mut self) -> Option<&mut Context> {
        self.levels.last_mut()
    }

    /// Value the last level exited with, once the stack is exhausted.
    pub fn exit_value(&self) -> Option<&Value> {
        self.exit_value.as_ref()
    }

    /// Pushes the first level with the given starting state. `PS1` from the
    /// command set only fills in a prompt the environment does not define.
    pub fn push_root(&mut self, commands: Box<dyn CommandSet>, env: Environment, aliases: AliasTable) -> usize {
        self.enter(commands, env, aliases, true)
    }

    /// Pushes a level running `commands` on a copy of the active level's
    /// variables and aliases.
    pub fn push(&mut self, commands: Box<dyn CommandSet>) -> usize {
        let (env, aliases) = match self.top() {
            Some(parent) => (parent.env.clone(), parent.aliases.clone()),
            None => (Environment::new(), AliasTable::new()),
        };
        let root = self.is_empty();
        self.enter(commands, env, aliases, root)
    }

    fn enter(&mut self, commands: Box<dyn CommandSet>, mut env: Environment, aliases: AliasTable, root: bool) -> usize {
        let shlvl = env.shell_level().saturating_add(1);
        env.set(SHLVL, shlvl.to_string());
        if let Some(prompt) = commands.prompt() {
            if root {
                env.set_default(PS1, prompt);
            } else {
                env.set(PS1, prompt);
            }
        }
        let depth = self.levels.len() + 1;
        debug!(
            "level event=push depth={} shlvl={} set={}",
            depth,
            shlvl,
            commands.name()
        );
        self.levels.push(Context::new(commands, env, aliases, depth));
        depth
    }

    /// Tears down the active level and hands `value` to the one below.
    pub fn pop(&mut self, value: Option<Value>, ui: &mut Ui) -> Unwind {
        let Some(mut level) = self.levels.pop() else {
            return Unwind::Exhausted;
        };
        level.commands.finalize();
        debug!(
            "level event=pop depth={} set={} value={:?}",
            level.depth,
            level.commands.name(),
            value
        );
        drop(level);
        let Some(parent) = self.levels.last_mut() else {
            self.exit_value = value;
            return Unwind::Exhausted;
        };
        if let Some(value) = value {
            let (commands, env, _) = parent.parts_mut();
            commands.resume(value, env, ui);
        }
        Unwind::Resumed {
            depth: self.levels.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::colors::Theme;
    use crate::command::{CommandInfo, Invocation, Outcome};
    use crate::env::{LAST, STATUS};
    use crate::error::ShellResult;
    use crate::ui::SharedBuffer;

    const INFOS: &[CommandInfo] = &[CommandInfo::new("record", "Records calls.")];

    struct Recorder {
        log: Rc<RefCell<Vec<String>>>,
        prompt: Option<&'static str>,
    }

    impl CommandSet for Recorder {
        fn name(&self) -> &str {
            "record"
        }

        fn commands(&self) -> &[CommandInfo] {
            INFOS
        }

        fn run(&mut self, _inv: &mut Invocation<'_>) -> ShellResult<Outcome> {
            Ok(Outcome::done())
        }

        fn prompt(&self) -> Option<String> {
            self.prompt.map(str::to_string)
        }

        fn resume(&mut self, value: Value, env: &mut Environment, _ui: &mut Ui) {
            env.set(LAST, value.to_string());
            env.set(STATUS, value.status().to_string());
            self.log.borrow_mut().push(format!("resume {}", value));
        }

        fn finalize(&mut self) {
            self.log.borrow_mut().push("finalize".to_string());
        }
    }

    fn record(log: &Rc<RefCell<Vec<String>>>, prompt: Option<&'static str>) -> Box<dyn CommandSet> {
        Box::new(Recorder {
            log: Rc::clone(log),
            prompt,
        })
    }

    fn ui() -> Ui {
        Ui::new(Box::new(SharedBuffer::new()), Box::new(SharedBuffer::new()), Theme::plain())
    }

    #[test]
    fn push_copies_environment_and_bumps_shlvl() {
        let log = Rc::default();
        let mut stack = ContextStack::new();
        let env: Environment = [("SHLVL", "3"), ("X", "1")].into_iter().collect();
        assert_eq!(stack.push_root(record(&log, None), env, AliasTable::new()), 1);
        let before = stack.top().unwrap().env.clone();
        assert_eq!(before.get(SHLVL), Some("4"));

        assert_eq!(stack.push(record(&log, Some("inner> "))), 2);
        let top = stack.top_mut().unwrap();
        assert_eq!(top.env.get(SHLVL), Some("5"));
        assert_eq!(top.env.get(PS1), Some("inner> "));
        top.env.set("X", "changed");

        assert_eq!(stack.pop(None, &mut ui()), Unwind::Resumed { depth: 1 });
        assert_eq!(stack.top().unwrap().env, before);
        assert_eq!(*log.borrow(), ["finalize"]);
    }

    #[test]
    fn shlvl_saturates_at_the_top() {
        let log = Rc::default();
        let mut stack = ContextStack::new();
        let env: Environment = [(SHLVL, "9223372036854775807")].into_iter().collect();
        stack.push_root(record(&log, None), env, AliasTable::new());
        stack.push(record(&log, None));
        assert_eq!(stack.top().unwrap().env.get(SHLVL), Some("9223372036854775807"));
    }

    #[test]
    fn root_prompt_does_not_override_configured_one() {
        let log = Rc::default();
        let mut stack = ContextStack::new();
        let env: Environment = [(PS1, "mine ")].into_iter().collect();
        stack.push_root(record(&log, Some("theirs ")), env, AliasTable::new());
        assert_eq!(stack.top().unwrap().env.get(PS1), Some("mine "));
    }

    #[test]
    fn pop_resumes_parent_with_value() {
        let log = Rc::default();
        let mut stack = ContextStack::new();
        stack.push(record(&log, None));
        stack.push(record(&log, None));
        stack.pop(Some(Value::Int(7)), &mut ui());
        assert_eq!(*log.borrow(), ["finalize", "resume 7"]);
        assert_eq!(stack.top().unwrap().env.get(STATUS), Some("7"));
        assert_eq!(stack.pop(Some(Value::Int(3)), &mut ui()), Unwind::Exhausted);
        assert!(stack.is_empty());
        assert_eq!(stack.exit_value(), Some(&Value::Int(3)));
        assert_eq!(stack.pop(None, &mut ui()), Unwind::Exhausted);
    }

    #[test]
    fn scopes_feed_the_snapshot() {
        let log = Rc::default();
        let mut stack = ContextStack::new();
        let mut aliases = AliasTable::new();
        aliases.set("rc", vec!["record".into()]).unwrap();
        stack.push_root(record(&log, None), Environment::new(), aliases);
        let top = stack.top_mut().unwrap();
        top.add_scope("nest", Box::new(WordList::new(["deep", "shallow"])));
        let snapshot = top.snapshot();
        assert!(snapshot.commands.contains(&"record".to_string()));
        assert!(snapshot.commands.contains(&"exit".to_string()));
        assert!(snapshot.commands.contains(&"rc".to_string()));
        assert_eq!(snapshot.arguments_for("nest", "d"), ["deep"]);
        assert!(snapshot.arguments_for("help", "rec").contains(&"record".to_string()));
        assert_eq!(snapshot.vars, ["SHLVL"]);
        assert!(top.remove_scope("nest"));
        assert!(top.scope("nest").is_none());
    }
}
