//! Commands available at every level, after the level's own.
use log::debug;

use crate::command::{CommandInfo, Invocation, Outcome, Value};
use crate::error::{ShellError, ShellResult};
use crate::parse::{shell_quote, split_words};

pub const INFOS: &[CommandInfo] = &[
    CommandInfo::new(
        "help",
        "Print help on the given commands, or list all commands.

        Usage:
            help [<name>...]
        ",
    ),
    CommandInfo::new(
        "alias",
        "List, show or define command aliases.

        A definition is name=value; spaces around the = are allowed. The
        value is split into words like a command line.

        Usage:
            alias [<definition>...]
        ",
    ),
    CommandInfo::new(
        "unalias",
        "Remove a command alias.

        Usage:
            unalias <name>
        ",
    ),
    CommandInfo::new(
        "exit",
        "Leave this level, handing an optional value to the one below.

        Usage:
            exit [<value>]
        ",
    ),
    CommandInfo::new(
        "set",
        "List variables, show one, or set it to the given words.

        Usage:
            set [<name> [<value>...]]
        ",
    ),
    CommandInfo::new(
        "unset",
        "Remove variables.

        Usage:
            unset <name>...
        ",
    ),
    CommandInfo::new(
        "printenv",
        "Print all variables, or the value of one.

        Usage:
            printenv [<name>]
        ",
    ),
    CommandInfo::new(
        "echo",
        "Print the arguments.

        Percent codes are expanded: %%{NAME} prints a variable and
        %%g...%%N prints in green.

        Usage:
            echo [<text>...]
        ",
    ),
];

pub fn is_builtin(name: &str) -> bool {
    INFOS.iter().any(|info| info.name == name)
}

pub fn run(inv: &mut Invocation<'_>) -> ShellResult<Outcome> {
    match inv.name() {
        "help" => help(inv),
        "alias" => alias(inv),
        "unalias" => unalias(inv),
        "exit" => {
            let value = inv.args.get("<value>").map(Value::parse);
            Ok(Outcome::ExitLevel(value))
        }
        "set" => set(inv),
        "unset" => {
            for name in inv.args.list("<name>") {
                inv.env.remove(name);
            }
            Ok(Outcome::done())
        }
        "printenv" => printenv(inv),
        "echo" => {
            let text = inv.args.list("<text>").join(" ");
            inv.printf(&format!("{}\n", text));
            Ok(Outcome::done())
        }
        other => Err(ShellError::handler(format!("{}: not a builtin", other))),
    }
}

fn help(inv: &mut Invocation<'_>) -> ShellResult<Outcome> {
    let names = inv.args.list("<name>").to_vec();
    if names.is_empty() {
        let width = inv.catalog.iter().map(|i| i.name.len()).max().unwrap_or(0);
        let mut listing = String::new();
        for info in inv.catalog {
            listing.push_str(&format!("{:width$}  {}\n", info.name, info.summary()));
        }
        inv.ui.write(&listing);
        return Ok(Outcome::done());
    }
    let mut status = 0;
    for name in &names {
        match inv.lookup(name).copied() {
            Some(info) => inv.ui.print_doc(info.help, &*inv.env),
            None => {
                inv.ui.error(&format!("help: no such command: {}", name));
                status = 1;
            }
        }
    }
    Ok(Outcome::status(status))
}

/// Splits `alias` arguments into a name and replacement words. The first
/// piece of the value is itself split into words.
fn parse_definition(defs: &[String]) -> ShellResult<Option<(String, Vec<String>)>> {
    let Some(first) = defs.first() else {
        return Ok(None);
    };
    let (name, value, rest) = if let Some((name, value)) = first.split_once('=') {
        (name, value, &defs[1..])
    } else if let Some(value) = defs.get(1).and_then(|piece| piece.strip_prefix('=')) {
        (first.as_str(), value, &defs[2..])
    } else {
        return Ok(None);
    };
    let mut words = split_words(value)?;
    words.extend(rest.iter().cloned());
    Ok(Some((name.trim().to_string(), words)))
}

fn alias(inv: &mut Invocation<'_>) -> ShellResult<Outcome> {
    let defs = inv.args.list("<definition>").to_vec();
    if defs.is_empty() {
        let listing: Vec<String> = inv
            .aliases
            .names()
            .filter_map(|name| inv.aliases.describe(name))
            .collect();
        for line in listing {
            inv.ui.print(&line);
        }
        return Ok(Outcome::done());
    }
    match parse_definition(&defs)? {
        Some((name, words)) => {
            debug!("alias event=define name={} words={}", name, words.len());
            inv.aliases.set(name, words)?;
            Ok(Outcome::done())
        }
        None if defs.len() == 1 => match inv.aliases.describe(&defs[0]) {
            Some(line) => {
                inv.ui.print(&line);
                Ok(Outcome::done())
            }
            None => {
                inv.ui.error(&format!("alias: {}: not found", defs[0]));
                Ok(Outcome::status(1))
            }
        },
        None => Err(ShellError::handler(format!(
            "alias: expected name=value, got '{}'",
            defs.join(" ")
        ))),
    }
}

fn unalias(inv: &mut Invocation<'_>) -> ShellResult<Outcome> {
    let name = inv.args.get("<name>").unwrap_or_default().to_string();
    if inv.aliases.remove(&name).is_some() {
        return Ok(Outcome::done());
    }
    inv.ui.error(&format!("unalias: {}: not found", name));
    Ok(Outcome::status(1))
}

fn set(inv: &mut Invocation<'_>) -> ShellResult<Outcome> {
    let Some(name) = inv.args.get("<name>").map(str::to_string) else {
        let listing: Vec<String> = inv
            .env
            .iter()
            .map(|(name, value)| format!("{}={}", name, shell_quote(value)))
            .collect();
        for line in listing {
            inv.ui.print(&line);
        }
        return Ok(Outcome::done());
    };
    let values = inv.args.list("<value>");
    if values.is_empty() {
        return show_variable(inv, &name);
    }
    let value = values.join(" ");
    inv.env.set(name, value);
    Ok(Outcome::done())
}

fn printenv(inv: &mut Invocation<'_>) -> ShellResult<Outcome> {
    match inv.args.get("<name>").map(str::to_string) {
        Some(name) => show_variable(inv, &name),
        None => {
            let listing: Vec<String> = inv
                .env
                .iter()
                .map(|(name, value)| format!("{}={}", name, value))
                .collect();
            for line in listing {
                inv.ui.print(&line);
            }
            Ok(Outcome::done())
        }
    }
}

fn show_variable(inv: &mut Invocation<'_>, name: &str) -> ShellResult<Outcome> {
    match inv.env.get(name).map(str::to_string) {
        Some(value) => {
            inv.ui.print(&value);
            Ok(Outcome::done())
        }
        None => Ok(Outcome::status(1)),
    }
}
