//! Embeddable engine for nested interactive command shells.
//!
//! Input is split into statements by a table-driven tokenizer, aliases are
//! expanded, and each statement runs against the command set of the active
//! interpreter level. Commands may push a nested level or exit the current
//! one; the session ends when the last level exits.
//!
//! The `shell` feature adds the rustyline line editor and SIGINT handling.
//! Without it the crate has no terminal dependencies, which is how the fuzz
//! targets link it.

pub mod alias;
pub mod builtins;
pub mod colors;
pub mod command;
pub mod completion;
pub mod config;
pub mod context;
pub mod dispatch;
pub mod env;
pub mod error;
pub mod fsm;
pub mod io_helpers;
pub mod parse;
pub mod prompt;
pub mod session;
pub mod signals;
pub mod ui;

pub use alias::{AliasTable, CyclePolicy};
pub use colors::Theme;
pub use command::{CommandInfo, CommandSet, Invocation, Outcome, Value};
pub use completion::{CompletionScope, CompletionSnapshot, WordList};
pub use config::{load_config, Config};
pub use context::{Context, ContextStack, Unwind};
pub use dispatch::{dispatch, Dispatch};
pub use env::{Environment, NoVars, VarLookup, LAST, PS1, PS2, SHLVL, STATUS};
pub use error::{ErrorKind, ShellError, ShellResult};
pub use fsm::{Automaton, Symbol};
#[cfg(feature = "shell")]
pub use io_helpers::EditorSource;
pub use io_helpers::{LineSource, ScriptSource};
pub use parse::{split_statements, split_words, tokenize, Feed, ParsedArgs, Tokenizer};
pub use prompt::{Expander, Expansion, Flavor};
pub use session::{Flow, Session};
pub use signals::{stdin_is_tty, Interrupt};
pub use ui::{SharedBuffer, Ui};

/// Fuzz helper: incremental tokenizing of arbitrary input, split at every
/// zero byte to exercise continuation joining.
pub fn fuzz_tokenize_bytes(data: &[u8]) {
    let input = String::from_utf8_lossy(data);
    let vars: std::collections::HashMap<String, String> =
        [("X".to_string(), "x y".to_string()), ("?".to_string(), "0".to_string())].into();
    let mut tokenizer = Tokenizer::new();
    for chunk in input.split('\0') {
        if tokenizer.feed(chunk, &vars).is_err() {
            break;
        }
    }
    let _ = split_statements(&input, &vars);
}

/// Fuzz helper: template expansion with both flavours.
pub fn fuzz_expand_bytes(data: &[u8]) {
    let input = String::from_utf8_lossy(data);
    let vars: std::collections::HashMap<String, String> = [("USER".to_string(), "fuzz".to_string())].into();
    for flavor in [Flavor::Ansi, Flavor::Readline] {
        let mut expander = Expander::new(&Theme::ansi(), flavor);
        let _ = expander.expand(&input, &vars);
    }
}
