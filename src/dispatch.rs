//! Runs one statement against the active level.
use log::{debug, warn};

use crate::builtins;
use crate::command::{CommandInfo, CommandSet, Invocation, Outcome};
use crate::context::{ContextStack, Unwind};
use crate::env::{LAST, STATUS};
use crate::error::ShellResult;
use crate::parse::{ParsedArgs, Usage};
use crate::signals::Interrupt;
use crate::ui::Ui;

/// What a dispatched statement did to the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// Empty statement or comment.
    Skipped,
    Completed,
    /// Usage, alias or handler failure, already reported.
    Failed,
    Entered { depth: usize },
    Exited { depth: usize },
    /// The last level exited.
    Ended,
    /// The command gave up after an interrupt.
    Aborted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Route {
    Level,
    Builtin,
    Unknown,
}

fn is_noop(argv: &[String]) -> bool {
    argv.first()
        .map_or(true, |head| head.is_empty() || head.starts_with('#'))
}

/// The level's commands followed by the builtins it does not override.
fn catalog(own: &[CommandInfo]) -> Vec<CommandInfo> {
    let mut catalog = own.to_vec();
    for info in builtins::INFOS {
        if !own.iter().any(|mine| mine.name == info.name) {
            catalog.push(*info);
        }
    }
    catalog
}

fn route(own: &[CommandInfo], name: &str) -> Route {
    if own.iter().any(|info| info.name == name) {
        Route::Level
    } else if builtins::is_builtin(name) {
        Route::Builtin
    } else {
        Route::Unknown
    }
}

/// Matches `argv` against the command's usage grammar. A grammar that does
/// not parse is logged and the handler gets the raw words.
fn parse_args(info: Option<&CommandInfo>, argv: Vec<String>) -> ShellResult<ParsedArgs> {
    let Some(info) = info else {
        return Ok(ParsedArgs::bare(argv));
    };
    match Usage::from_help(info.help) {
        Ok(Some(usage)) => usage.apply(&argv),
        Ok(None) => Ok(ParsedArgs::bare(argv)),
        Err(err) => {
            warn!("dispatch event=bad_grammar name={} err={}", info.name, err.message);
            Ok(ParsedArgs::bare(argv))
        }
    }
}

/// Expands aliases in `argv`, runs the command it names and applies the
/// outcome to the stack.
pub fn dispatch(stack: &mut ContextStack, ui: &mut Ui, interrupt: &Interrupt, argv: Vec<String>) -> Dispatch {
    let Some(level) = stack.top_mut() else {
        return Dispatch::Ended;
    };
    if is_noop(&argv) {
        return Dispatch::Skipped;
    }
    let argv = match level.aliases.expand(argv) {
        Ok(argv) => argv,
        Err(err) => {
            ui.warning(&err.message);
            level.env.set(STATUS, "2");
            return Dispatch::Failed;
        }
    };
    if is_noop(&argv) {
        return Dispatch::Skipped;
    }

    let (commands, env, aliases) = level.parts_mut();
    let catalog = catalog(commands.commands());
    let name = argv[0].clone();
    let route = route(commands.commands(), &name);
    debug!("dispatch event=run name={} route={:?} args={}", name, route, argv.len() - 1);
    let info = catalog.iter().find(|info| info.name == name);
    let args = match parse_args(info, argv) {
        Ok(args) => args,
        Err(err) => {
            ui.warning(&err.message);
            env.set(STATUS, "2");
            return Dispatch::Failed;
        }
    };

    let result = {
        let mut inv = Invocation {
            args,
            env: &mut *env,
            aliases,
            ui: &mut *ui,
            catalog: &catalog,
            interrupt,
        };
        match route {
            Route::Level => commands.run(&mut inv),
            Route::Builtin => builtins::run(&mut inv),
            Route::Unknown => commands.unknown(&mut inv),
        }
    };
    let outcome = match result {
        Ok(outcome) => outcome,
        Err(err) => {
            debug!("dispatch event=error name={} kind={:?}", name, err.kind);
            commands.report_error(&err, ui);
            env.set(STATUS, "1");
            return Dispatch::Failed;
        }
    };

    match outcome {
        Outcome::Continue(Some(value)) => {
            env.set(STATUS, value.status().to_string());
            env.set(LAST, value.to_string());
            Dispatch::Completed
        }
        Outcome::Continue(None) => {
            env.set(STATUS, "0");
            Dispatch::Completed
        }
        Outcome::EnterLevel(set) => Dispatch::Entered {
            depth: stack.push(set),
        },
        Outcome::ExitLevel(value) => match stack.pop(value, ui) {
            Unwind::Resumed { depth } => Dispatch::Exited { depth },
            Unwind::Exhausted => Dispatch::Ended,
        },
        Outcome::Abort => {
            debug!("dispatch event=abort name={}", name);
            interrupt.clear();
            ui.write("\n");
            Dispatch::Aborted
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alias::{AliasTable, CyclePolicy};
    use crate::colors::Theme;
    use crate::env::{Environment, SHLVL};
    use crate::error::ShellError;
    use crate::ui::SharedBuffer;

    const CALC: &[CommandInfo] = &[
        CommandInfo::new("add", "Add two numbers.\n\nUsage:\n    add <a> <b>\n"),
        CommandInfo::new("boom", "Fail."),
        CommandInfo::new("deeper", "Enter a nested level."),
        CommandInfo::new("spin", "Give up."),
        CommandInfo::new("broken", "Bad grammar.\n\nUsage:\n    broken [<x>\n"),
    ];

    struct Calc;

    impl CommandSet for Calc {
        fn name(&self) -> &str {
            "calc"
        }

        fn commands(&self) -> &[CommandInfo] {
            CALC
        }

        fn run(&mut self, inv: &mut Invocation<'_>) -> ShellResult<Outcome> {
            match inv.name() {
                "add" => {
                    let mut total = 0;
                    for key in ["<a>", "<b>"] {
                        let n: i64 = inv
                            .args
                            .get(key)
                            .unwrap_or("0")
                            .parse()
                            .map_err(|_| ShellError::handler("not a number"))?;
                        total += n;
                    }
                    Ok(Outcome::value(total))
                }
                "boom" => Err(ShellError::handler("kaboom")),
                "deeper" => Ok(Outcome::EnterLevel(Box::new(Calc))),
                "spin" => {
                    inv.interrupt.raise();
                    Ok(Outcome::Abort)
                }
                "broken" => Ok(Outcome::value(inv.argv().len() as i64)),
                _ => Ok(Outcome::done()),
            }
        }
    }

    struct Fixture {
        stack: ContextStack,
        ui: Ui,
        err: SharedBuffer,
        out: SharedBuffer,
        interrupt: Interrupt,
    }

    impl Fixture {
        fn new(policy: CyclePolicy) -> Self {
            let out = SharedBuffer::new();
            let err = SharedBuffer::new();
            let mut stack = ContextStack::new();
            stack.push_root(Box::new(Calc), Environment::new(), AliasTable::with_policy(policy));
            Self {
                stack,
                ui: Ui::new(Box::new(out.clone()), Box::new(err.clone()), Theme::plain()),
                err,
                out,
                interrupt: Interrupt::new(),
            }
        }

        fn run(&mut self, line: &str) -> Dispatch {
            let argv = line.split_whitespace().map(str::to_string).collect();
            dispatch(&mut self.stack, &mut self.ui, &self.interrupt, argv)
        }

        fn var(&self, name: &str) -> Option<String> {
            self.stack.top()?.env.get(name).map(str::to_string)
        }
    }

    #[test]
    fn values_set_status_and_last() {
        let mut f = Fixture::new(CyclePolicy::Stop);
        assert_eq!(f.run("add 2 3"), Dispatch::Completed);
        assert_eq!(f.var(STATUS).as_deref(), Some("5"));
        assert_eq!(f.var(LAST).as_deref(), Some("5"));
        assert_eq!(f.run("echo hi"), Dispatch::Completed);
        assert_eq!(f.var(STATUS).as_deref(), Some("0"));
        assert_eq!(f.out.take(), "hi\n");
    }

    #[test]
    fn noops_leave_everything_alone() {
        let mut f = Fixture::new(CyclePolicy::Stop);
        assert_eq!(f.run(""), Dispatch::Skipped);
        assert_eq!(f.run("# note"), Dispatch::Skipped);
        let argv = vec![String::new(), "x".to_string()];
        assert_eq!(dispatch(&mut f.stack, &mut f.ui, &f.interrupt, argv), Dispatch::Skipped);
        assert_eq!(f.var(STATUS), None);
        assert_eq!(f.stack.depth(), 1);
    }

    #[test]
    fn unknown_commands_suggest() {
        let mut f = Fixture::new(CyclePolicy::Stop);
        assert_eq!(f.run("ad 1 2"), Dispatch::Completed);
        assert_eq!(f.var(STATUS).as_deref(), Some("2"));
        assert_eq!(f.err.take(), "unknown command: ad (did you mean 'add'?)\n");
        assert_eq!(f.stack.depth(), 1);
    }

    #[test]
    fn usage_failure_skips_handler() {
        let mut f = Fixture::new(CyclePolicy::Stop);
        assert_eq!(f.run("add 1"), Dispatch::Failed);
        assert_eq!(f.var(STATUS).as_deref(), Some("2"));
        assert_eq!(f.err.take(), "usage: add <a> <b>\n");
    }

    #[test]
    fn malformed_grammar_passes_raw_words() {
        let mut f = Fixture::new(CyclePolicy::Stop);
        assert_eq!(f.run("broken a b"), Dispatch::Completed);
        assert_eq!(f.var(STATUS).as_deref(), Some("3"));
    }

    #[test]
    fn handler_errors_are_reported() {
        let mut f = Fixture::new(CyclePolicy::Stop);
        assert_eq!(f.run("boom"), Dispatch::Failed);
        assert_eq!(f.var(STATUS).as_deref(), Some("1"));
        assert_eq!(f.err.take(), "Command error: kaboom\n");
        assert_eq!(f.stack.depth(), 1);
    }

    #[test]
    fn aliases_resolve_before_commands() {
        let mut f = Fixture::new(CyclePolicy::Stop);
        f.run("alias plus1=add 1");
        assert_eq!(f.run("plus1 9"), Dispatch::Completed);
        assert_eq!(f.var(STATUS).as_deref(), Some("10"));
    }

    #[test]
    fn alias_cycles_follow_policy() {
        let mut f = Fixture::new(CyclePolicy::Stop);
        f.run("alias a=b");
        f.run("alias b=a");
        assert_eq!(f.run("a"), Dispatch::Completed);
        assert!(f.err.take().starts_with("unknown command: a"));

        let mut f = Fixture::new(CyclePolicy::Reject);
        f.run("alias a=b");
        f.run("alias b=a");
        assert_eq!(f.run("a"), Dispatch::Failed);
        assert_eq!(f.var(STATUS).as_deref(), Some("2"));
        assert_eq!(f.err.take(), "alias loop: b -> a\n");
    }

    #[test]
    fn levels_nest_and_unwind() {
        let mut f = Fixture::new(CyclePolicy::Stop);
        assert_eq!(f.run("deeper"), Dispatch::Entered { depth: 2 });
        assert_eq!(f.var(SHLVL).as_deref(), Some("2"));
        assert_eq!(f.run("exit 4"), Dispatch::Exited { depth: 1 });
        assert_eq!(f.var(SHLVL).as_deref(), Some("1"));
        assert_eq!(f.run("exit"), Dispatch::Ended);
        assert!(f.stack.is_empty());
        assert_eq!(f.run("add 1 1"), Dispatch::Ended);
    }

    #[test]
    fn abort_clears_interrupt() {
        let mut f = Fixture::new(CyclePolicy::Stop);
        assert_eq!(f.run("spin"), Dispatch::Aborted);
        assert!(!f.interrupt.is_raised());
        assert_eq!(f.out.take(), "\n");
        assert_eq!(f.stack.depth(), 1);
    }
}
