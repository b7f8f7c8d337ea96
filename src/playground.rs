//! Demo command set: nested levels, results and interruptible work.
use std::thread;
use std::time::{Duration, Instant};

use log::debug;

use nestsh::{CommandInfo, CommandSet, Environment, Invocation, Outcome, ShellError, ShellResult, Ui, Value, LAST, STATUS};

const COMMANDS: &[CommandInfo] = &[
    CommandInfo::new(
        "nest",
        "Enter a nested level. `exit <value>` hands the value back here.

        Usage:
            nest [<label>]
        ",
    ),
    CommandInfo::new(
        "sum",
        "Add integers; the total becomes the last result.

        Usage:
            sum <n>...
        ",
    ),
    CommandInfo::new(
        "sleep",
        "Wait for a while. Ctrl-C cuts it short.

        Usage:
            sleep <seconds>
        ",
    ),
    CommandInfo::new(
        "fail",
        "Fail on purpose.

        Usage:
            fail
        ",
    ),
    CommandInfo::new(
        "depth",
        "Print how many levels deep this one is.

        Usage:
            depth
        ",
    ),
];

const POLL: Duration = Duration::from_millis(20);

pub struct Playground {
    label: String,
    depth: usize,
}

impl Playground {
    pub fn root() -> Self {
        Self {
            label: "playground".to_string(),
            depth: 1,
        }
    }

    fn sleep(&self, inv: &mut Invocation<'_>) -> ShellResult<Outcome> {
        let text = inv.args.get("<seconds>").unwrap_or("0");
        let duration = text
            .parse::<f64>()
            .ok()
            .and_then(|seconds| Duration::try_from_secs_f64(seconds).ok())
            .ok_or_else(|| ShellError::handler(format!("sleep: invalid duration '{}'", text)))?;
        let deadline = Instant::now() + duration;
        while Instant::now() < deadline {
            if inv.interrupted() {
                debug!("playground event=sleep_interrupted label={}", self.label);
                return Ok(Outcome::Abort);
            }
            thread::sleep(POLL.min(deadline.saturating_duration_since(Instant::now())));
        }
        Ok(Outcome::done())
    }
}

impl CommandSet for Playground {
    fn name(&self) -> &str {
        &self.label
    }

    fn commands(&self) -> &[CommandInfo] {
        COMMANDS
    }

    fn run(&mut self, inv: &mut Invocation<'_>) -> ShellResult<Outcome> {
        match inv.name() {
            "nest" => {
                let label = inv.args.get("<label>").unwrap_or("nested").to_string();
                Ok(Outcome::EnterLevel(Box::new(Playground {
                    label,
                    depth: self.depth + 1,
                })))
            }
            "sum" => {
                let mut total: i64 = 0;
                for word in inv.args.list("<n>") {
                    let n: i64 = word
                        .parse()
                        .map_err(|_| ShellError::handler(format!("sum: not an integer: {}", word)))?;
                    total = total
                        .checked_add(n)
                        .ok_or_else(|| ShellError::handler("sum: overflow"))?;
                }
                inv.ui.print(&total.to_string());
                Ok(Outcome::value(total))
            }
            "sleep" => self.sleep(inv),
            "fail" => Err(ShellError::handler("fail: failed as asked").with_context("this command always fails")),
            "depth" => {
                inv.ui.print(&self.depth.to_string());
                Ok(Outcome::value(self.depth as i64))
            }
            other => Err(ShellError::handler(format!("{}: not implemented", other))),
        }
    }

    fn prompt(&self) -> Option<String> {
        if self.depth == 1 {
            return Some("%g%u@%h%N %b%d%N> ".to_string());
        }
        Some(format!("%c{}%N[%L]> ", self.label.replace('%', "%%")))
    }

    fn resume(&mut self, value: Value, env: &mut Environment, ui: &mut Ui) {
        env.set(STATUS, value.status().to_string());
        env.set(LAST, value.to_string());
        ui.print(&format!("{}: nested level exited with {}", self.label, value));
    }

    fn finalize(&mut self) {
        debug!("playground event=finalize label={} depth={}", self.label, self.depth);
    }
}
