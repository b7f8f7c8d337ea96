//! Where input lines come from.
use std::io::{self, BufRead};

use crate::completion::CompletionSnapshot;

/// A stream of input lines. `Ok(None)` means end of input.
pub trait LineSource {
    /// Reads the first line of a statement.
    fn read_line(&mut self, prompt: &str) -> io::Result<Option<String>>;

    /// Reads a line that continues an unfinished statement.
    fn read_continuation(&mut self, prompt: &str) -> io::Result<Option<String>> {
        self.read_line(prompt)
    }

    /// Hands over the active level's completion candidates.
    fn refresh(&mut self, _snapshot: &CompletionSnapshot) {}

    /// Whether a person is typing, so prompts and a final newline make sense.
    fn interactive(&self) -> bool {
        false
    }
}

/// Lines from a reader, without prompts.
pub struct ScriptSource<R> {
    reader: R,
}

impl<R: BufRead> ScriptSource<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }
}

impl ScriptSource<io::Cursor<String>> {
    /// Lines from an in-memory script.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self::new(io::Cursor::new(text.into()))
    }
}

impl<R: BufRead> LineSource for ScriptSource<R> {
    fn read_line(&mut self, _prompt: &str) -> io::Result<Option<String>> {
        let mut line = String::new();
        let bytes = self.reader.read_line(&mut line)?;
        if bytes == 0 {
            return Ok(None);
        }
        let trimmed = line.trim_end_matches(&['\n', '\r'][..]).len();
        line.truncate(trimmed);
        Ok(Some(line))
    }
}

#[cfg(feature = "shell")]
pub use editor::EditorSource;

#[cfg(feature = "shell")]
mod editor {
    use std::env;
    use std::io;
    use std::path::PathBuf;

    use log::{debug, warn};
    use rustyline::error::ReadlineError;
    use rustyline::history::DefaultHistory;
    use rustyline::{Config, EditMode, Editor};

    use super::LineSource;
    use crate::completion::editor::LineHelper;
    use crate::completion::CompletionSnapshot;
    use crate::prompt::{END_IGNORE, START_IGNORE};

    /// Interactive lines through rustyline, with history and completion.
    pub struct EditorSource {
        editor: Editor<LineHelper, DefaultHistory>,
        history_path: PathBuf,
    }

    impl EditorSource {
        pub fn new(hint_color: &str) -> io::Result<Self> {
            let edit_mode = match env::var("NESTSH_EDITMODE").ok().as_deref() {
                Some("vi") | Some("VI") => EditMode::Vi,
                _ => EditMode::Emacs,
            };
            let config = Config::builder()
                .auto_add_history(true)
                .edit_mode(edit_mode)
                .build();
            let mut editor = Editor::with_config(config).map_err(io::Error::other)?;
            let mut helper = LineHelper::new();
            helper.set_hint_color(hint_color);
            editor.set_helper(Some(helper));

            let history_path = env::var("HOME")
                .map(PathBuf::from)
                .unwrap_or_default()
                .join(".nestsh_history");
            if let Err(err) = editor.load_history(&history_path) {
                debug!("history event=load_skipped path={} err={}", history_path.display(), err);
            }
            Ok(Self {
                editor,
                history_path,
            })
        }

        fn read(&mut self, prompt: &str) -> io::Result<Option<String>> {
            // rustyline measures prompts itself and prints the markers verbatim.
            let prompt: String = prompt
                .chars()
                .filter(|ch| *ch != START_IGNORE && *ch != END_IGNORE)
                .collect();
            match self.editor.readline(&prompt) {
                Ok(line) => Ok(Some(line)),
                Err(ReadlineError::Interrupted) => Ok(Some(String::new())),
                Err(ReadlineError::Eof) => Ok(None),
                Err(err) => Err(io::Error::other(err)),
            }
        }
    }

    impl LineSource for EditorSource {
        fn read_line(&mut self, prompt: &str) -> io::Result<Option<String>> {
            self.read(prompt)
        }

        fn read_continuation(&mut self, prompt: &str) -> io::Result<Option<String>> {
            self.read(prompt)
        }

        fn refresh(&mut self, snapshot: &CompletionSnapshot) {
            if let Some(helper) = self.editor.helper_mut() {
                helper.update(snapshot);
            }
        }

        fn interactive(&self) -> bool {
            true
        }
    }

    impl Drop for EditorSource {
        fn drop(&mut self) {
            if let Err(err) = self.editor.save_history(&self.history_path) {
                warn!("history event=save_failed path={} err={}", self.history_path.display(), err);
            }
        }
    }
}
