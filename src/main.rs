use std::env;
use std::io;
use std::process;

use log::warn;

use nestsh::{
    load_config, stdin_is_tty, Config, EditorSource, Environment, Expansion, Flow, ScriptSource,
    Session, ShellError, Theme, Ui,
};

mod playground;

use playground::Playground;

#[derive(Debug, Default)]
struct Options {
    command: Option<String>,
    plain: bool,
    no_rc: bool,
    trace: bool,
}

const USAGE: &str = "usage: nestsh [-x] [--plain] [--no-rc] [-c <command>]";

fn parse_options() -> Options {
    let mut options = Options::default();
    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-c" => match args.next() {
                Some(text) => options.command = Some(text),
                None => {
                    eprintln!("error: -c needs a command\n{USAGE}");
                    process::exit(2);
                }
            },
            "--plain" => options.plain = true,
            "--no-rc" => options.no_rc = true,
            "-x" => options.trace = true,
            "-h" | "--help" => {
                println!("{USAGE}");
                process::exit(0);
            }
            other => {
                eprintln!("error: unknown option '{other}'\n{USAGE}");
                process::exit(2);
            }
        }
    }
    options
}

fn init_logging(trace: bool) {
    let env = env_logger::Env::default().filter_or("NESTSH_LOG", if trace { "info" } else { "warn" });
    let _ = env_logger::Builder::from_env(env)
        .format_timestamp_millis()
        .try_init();
}

fn load_settings(options: &Options) -> Config {
    let theme = if options.plain { Theme::plain() } else { Theme::ansi() };
    if options.no_rc {
        return Config {
            theme,
            ..Config::default()
        };
    }
    match load_config(theme.clone()) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("config error: {}", err.display_simple());
            Config {
                theme,
                ..Config::default()
            }
        }
    }
}

fn main() {
    let options = parse_options();
    init_logging(options.trace);
    let config = load_settings(&options);

    let mut vars = Environment::from_process();
    for (name, value) in config.env.iter() {
        vars.set(name, value);
    }
    let mut ui = Ui::stdio(config.theme.clone());
    if let Err(err) = ui.register_expansion('v', Expansion::Literal(env!("CARGO_PKG_VERSION").to_string())) {
        warn!("startup event=register_failed code=v err={}", err.message);
    }
    let mut session = Session::new(Box::new(Playground::root()), vars, config.aliases, ui);
    session.set_trace(options.trace);
    if let Err(err) = session.interrupt().install_sigint() {
        warn!("startup event=sigint_failed err={}", err);
    }

    if let Some(text) = options.command {
        if session.feed(&format!("{text}\n")) == Flow::More {
            session.ui_mut().error("unexpected end of input");
            process::exit(2);
        }
        process::exit(session.exit_code());
    }

    let result = if stdin_is_tty() {
        let hint = if options.plain { "none" } else { "bright_black" };
        match EditorSource::new(hint) {
            Ok(mut source) => {
                let banner = "%Inestsh %v%N: 'help' lists commands, Ctrl-D leaves a level\n";
                let vars = Environment::new();
                session.ui_mut().printf(banner, &vars);
                session.run(&mut source)
            }
            Err(err) => Err(ShellError::from(err)),
        }
    } else {
        let stdin = io::stdin();
        let mut source = ScriptSource::new(stdin.lock());
        session.run(&mut source)
    };
    if let Err(err) = result {
        eprintln!("error: {}", err.display_simple());
        process::exit(1);
    }
    process::exit(session.exit_code());
}
