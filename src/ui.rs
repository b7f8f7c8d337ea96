//! Output surface shared by the engine and command handlers.
//!
//! Plain text goes to the output stream; `error`/`warning` go to the error
//! stream in the theme's red/yellow. Formatted text is percent-expanded with
//! raw ANSI sequences, prompts with line-editor markers around them.
use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;

use log::warn;

use crate::colors::Theme;
use crate::env::{NoVars, VarLookup};
use crate::error::ShellResult;
use crate::prompt::{Expander, Expansion, Flavor};

pub struct Ui {
    out: Box<dyn Write>,
    err: Box<dyn Write>,
    formatter: Expander,
    prompter: Expander,
    theme: Theme,
}

impl Ui {
    pub fn new(out: Box<dyn Write>, err: Box<dyn Write>, theme: Theme) -> Self {
        Self {
            out,
            err,
            formatter: Expander::new(&theme, Flavor::Ansi),
            prompter: Expander::new(&theme, Flavor::Readline),
            theme,
        }
    }

    pub fn stdio(theme: Theme) -> Self {
        Self::new(Box::new(io::stdout()), Box::new(io::stderr()), theme)
    }

    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    pub fn write(&mut self, text: &str) {
        if let Err(err) = self.out.write_all(text.as_bytes()).and_then(|_| self.out.flush()) {
            warn!("ui event=write_failed stream=out err={}", err);
        }
    }

    fn write_err(&mut self, text: &str) {
        if let Err(err) = self.err.write_all(text.as_bytes()).and_then(|_| self.err.flush()) {
            warn!("ui event=write_failed stream=err err={}", err);
        }
    }

    /// Writes `text` and a newline.
    pub fn print(&mut self, text: &str) {
        self.write(&format!("{}\n", text));
    }

    /// Percent-expands `template` and writes it.
    pub fn printf(&mut self, template: &str, vars: &dyn VarLookup) {
        let text = self.formatter.expand(template, vars);
        self.write(&text);
    }

    /// Percent-expands `template` and returns it.
    pub fn format(&mut self, template: &str, vars: &dyn VarLookup) -> String {
        self.formatter.expand(template, vars)
    }

    pub fn error(&mut self, text: &str) {
        let line = self.formatter.expand(&format!("%r{}%N\n", escape(text)), &NoVars);
        self.write_err(&line);
    }

    pub fn warning(&mut self, text: &str) {
        let line = self.formatter.expand(&format!("%Y{}%N\n", escape(text)), &NoVars);
        self.write_err(&line);
    }

    /// Prints a help text: the summary line highlighted, the rest dedented,
    /// indented by two spaces and percent-expanded.
    pub fn print_doc(&mut self, doc: &str, vars: &dyn VarLookup) {
        let color = self.theme.sequence("help_text");
        let normal = self.theme.sequence("normal");
        let doc = doc.trim_matches('\n');
        let (first, rest) = doc.split_once('\n').unwrap_or((doc, ""));
        let mut text = format!("{}{}{}\n", color, first.trim(), normal);
        let body = self.formatter.expand(&dedent(rest), vars);
        for line in body.lines() {
            if line.is_empty() {
                text.push('\n');
            } else {
                text.push_str("  ");
                text.push_str(line);
                text.push('\n');
            }
        }
        self.write(&text);
    }

    /// Expands a prompt template for a line editor.
    pub fn prompt(&mut self, template: &str, vars: &dyn VarLookup) -> String {
        self.prompter.expand(template, vars)
    }

    /// Adds a percent code to both the output and the prompt tables.
    pub fn register_expansion(&mut self, code: char, expansion: Expansion) -> ShellResult<()> {
        self.formatter.register(code, expansion.clone())?;
        if let Err(err) = self.prompter.register(code, expansion) {
            self.formatter.unregister(code);
            return Err(err);
        }
        Ok(())
    }

    pub fn unregister_expansion(&mut self, code: char) -> bool {
        let removed = self.formatter.unregister(code);
        self.prompter.unregister(code) || removed
    }
}

fn escape(text: &str) -> String {
    text.replace('%', "%%")
}

fn dedent(text: &str) -> String {
    let indent = text
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.len() - line.trim_start().len())
        .min()
        .unwrap_or(0);
    let mut out = String::new();
    for line in text.lines() {
        out.push_str(line.get(indent..).unwrap_or_else(|| line.trim_start()));
        out.push('\n');
    }
    out.trim_end().to_string()
}

/// Clonable in-memory sink, for capturing what a `Ui` writes.
#[derive(Debug, Clone, Default)]
pub struct SharedBuffer(Rc<RefCell<Vec<u8>>>);

impl SharedBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.borrow()).into_owned()
    }

    /// Returns the contents and empties the buffer.
    pub fn take(&self) -> String {
        let bytes = std::mem::take(&mut *self.0.borrow_mut());
        String::from_utf8_lossy(&bytes).into_owned()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn capture(theme: Theme) -> (Ui, SharedBuffer, SharedBuffer) {
        let out = SharedBuffer::new();
        let err = SharedBuffer::new();
        let ui = Ui::new(Box::new(out.clone()), Box::new(err.clone()), theme);
        (ui, out, err)
    }

    #[test]
    fn errors_go_to_error_stream_verbatim() {
        let (mut ui, out, err) = capture(Theme::plain());
        ui.error("100% broken %r");
        ui.warning("careful");
        assert_eq!(out.contents(), "");
        assert_eq!(err.contents(), "100% broken %r\ncareful\n");
    }

    #[test]
    fn errors_are_colored() {
        let (mut ui, _out, err) = capture(Theme::ansi());
        ui.error("bad");
        assert_eq!(err.take(), "\x1b[31mbad\x1b[0m\n");
        ui.warning("hmm");
        assert_eq!(err.take(), "\x1b[93mhmm\x1b[0m\n");
    }

    #[test]
    fn printf_expands() {
        let (mut ui, out, _err) = capture(Theme::plain());
        let vars: HashMap<String, String> = [("X".to_string(), "1".to_string())].into();
        ui.printf("x=%{X}%n", &vars);
        ui.print("plain %{X}");
        assert_eq!(out.contents(), "x=1\nplain %{X}\n");
    }

    #[test]
    fn doc_is_dedented_and_indented() {
        let (mut ui, out, _err) = capture(Theme::plain());
        ui.print_doc(
            "Remove an alias.

        Usage:
            unalias <name>
        ",
            &NoVars,
        );
        assert_eq!(
            out.contents(),
            "Remove an alias.\n\n  Usage:\n      unalias <name>\n"
        );
    }

    #[test]
    fn prompt_uses_readline_markers() {
        let (mut ui, _out, _err) = capture(Theme::ansi());
        assert_eq!(ui.prompt("%g>%N ", &NoVars), "\x01\x1b[32m\x02>\x01\x1b[0m\x02 ");
    }

    #[test]
    fn expansions_register_in_both_tables() {
        let (mut ui, out, _err) = capture(Theme::plain());
        ui.register_expansion('k', Expansion::Literal("K".into())).unwrap();
        assert!(ui.register_expansion('k', Expansion::Literal("J".into())).is_err());
        assert_eq!(ui.prompt("%k", &NoVars), "K");
        ui.printf("%k", &NoVars);
        assert_eq!(out.take(), "K");
        assert!(ui.unregister_expansion('k'));
        assert!(!ui.unregister_expansion('k'));
        assert_eq!(ui.prompt("%k", &NoVars), "k");
    }
}
