//! Shell-style lexing and usage grammars.
//!
//! - `tokenizer` turns raw input into statements (lists of words), expanding
//!   `$NAME` / `${NAME}` against the caller's variables as it goes.
//! - `usage` parses a command's help text into a pattern and matches argv
//!   against it.

mod tokenizer;
pub mod usage;

pub use tokenizer::{split_statements, split_words, tokenize, Feed, Tokenizer};
pub use usage::{ParsedArgs, Usage, UsageValue};

/// Characters allowed in an unbraced variable name.
pub fn is_var_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_' || ch == '?'
}

/// Two-character backslash escapes; anything else stands for itself.
pub fn resolve_escape(ch: char) -> char {
    match ch {
        'n' => '\n',
        't' => '\t',
        'r' => '\r',
        'b' => '\u{8}',
        other => other,
    }
}

/// Quotes `token` so that the tokenizer reads it back as one identical word.
pub fn shell_quote(token: &str) -> String {
    if token.is_empty() || token.chars().any(needs_quotes) {
        let mut out = String::from("\"");
        for ch in token.chars() {
            if matches!(ch, '"' | '\\' | '$' | '\'') {
                out.push('\\');
            }
            out.push(ch);
        }
        out.push('"');
        out
    } else {
        token.to_string()
    }
}

fn needs_quotes(ch: char) -> bool {
    ch.is_whitespace() || matches!(ch, '\'' | '"' | '\\' | '$' | '#' | ';')
}
