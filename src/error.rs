//! Error types and reporting for the shell engine.
//!
//! Every fallible operation in the crate returns `ShellError`, which carries:
//! - Error kind (lexical, usage, handler failure, etc.)
//! - Human-readable message
//! - Optional context about what input caused the error
//! - Optional byte position for pointing to the problem location
//!
//! Control flow between interpreter levels is not an error; see `command::Outcome`.

use std::fmt;
use std::io;

/// Categorized error types for better diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed quoting, escape or variable reference in shell input
    Lexical,
    /// A state machine met a symbol its transition table does not cover,
    /// or a usage grammar could not be parsed
    Grammar,
    /// A command's usage grammar rejected the given arguments
    Usage,
    /// A command handler failed
    Handler,
    /// Alias expansion ran into a cycle
    Alias,
    /// Error loading/parsing configuration
    Config,
    /// Reading input or writing output failed
    Io,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ErrorKind::Lexical => write!(f, "Syntax error"),
            ErrorKind::Grammar => write!(f, "Grammar error"),
            ErrorKind::Usage => write!(f, "Usage error"),
            ErrorKind::Handler => write!(f, "Command error"),
            ErrorKind::Alias => write!(f, "Alias error"),
            ErrorKind::Config => write!(f, "Config error"),
            ErrorKind::Io => write!(f, "I/O error"),
        }
    }
}

/// Rich error type with context information
#[derive(Debug, Clone)]
pub struct ShellError {
    pub kind: ErrorKind,
    pub message: String,
    /// Additional context explaining what was being processed
    pub context: Option<String>,
    /// Byte position in input where the error occurred
    pub position: Option<usize>,
}

impl ShellError {
    /// Create a new error with just the kind and message
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        ShellError {
            kind,
            message: message.into(),
            context: None,
            position: None,
        }
    }

    /// Shorthand for a failure raised by a command handler.
    pub fn handler(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Handler, message)
    }

    /// Add context string (e.g., "stack: ['x']")
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    /// Add byte position in input where error occurred
    pub fn with_position(mut self, pos: usize) -> Self {
        self.position = Some(pos);
        self
    }

    /// Format error with a snippet of the input showing where the problem is
    pub fn display_with_input(&self, input: &str) -> String {
        let mut msg = format!("{}: {}", self.kind, self.message);

        match self.position {
            Some(pos) if pos < input.len() && input.is_char_boundary(pos) => {
                let start = floor_boundary(input, pos.saturating_sub(15));
                let end = floor_boundary(input, (pos + 15).min(input.len()));
                let snippet = &input[start..end];

                msg.push_str(&format!("\n  near: '{}'", snippet.replace('\n', "↵")));
                msg.push('\n');

                let offset = input[start..pos].chars().count();
                msg.push_str(&format!("  {}{}", " ".repeat(offset + 9), "^"));
            }
            Some(pos) => {
                msg.push_str(&format!("\n  at position {} (end of input)", pos));
            }
            None => {
                if let Some(context) = &self.context {
                    msg.push_str(&format!("\n  hint: {}", context));
                }
            }
        }

        msg
    }

    /// Simplified display without input context
    pub fn display_simple(&self) -> String {
        let mut msg = format!("{}: {}", self.kind, self.message);
        if let Some(context) = &self.context {
            msg.push_str(&format!("\n  hint: {}", context));
        }
        msg
    }
}

fn floor_boundary(input: &str, mut idx: usize) -> usize {
    while idx > 0 && !input.is_char_boundary(idx) {
        idx -= 1;
    }
    idx
}

impl fmt::Display for ShellError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.display_simple())
    }
}

impl std::error::Error for ShellError {}

impl From<io::Error> for ShellError {
    fn from(err: io::Error) -> Self {
        ShellError::new(ErrorKind::Io, err.to_string())
    }
}

/// Convenience type alias for Results with ShellError
pub type ShellResult<T> = Result<T, ShellError>;
