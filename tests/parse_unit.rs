use std::collections::HashMap;

use nestsh::{split_statements, split_words, tokenize, ErrorKind, Feed, NoVars, Tokenizer};

fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[test]
fn quoted_words_black_box() {
    assert_eq!(tokenize("echo \"a b\" c", &NoVars).unwrap(), ["echo", "a b", "c"]);
    assert_eq!(tokenize("echo 'a $X b'", &NoVars).unwrap(), ["echo", "a $X b"]);
    assert_eq!(tokenize("echo \"a $X b\"", &vars(&[("X", "9")])).unwrap(), ["echo", "a 9 b"]);
    assert_eq!(tokenize("say \"\" x", &NoVars).unwrap(), ["say", "", "x"]);
}

#[test]
fn variables_black_box() {
    let env = vars(&[("HOME", "/home/me"), ("?", "3")]);
    assert_eq!(tokenize("cd $HOME/src", &env).unwrap(), ["cd", "/home/me/src"]);
    assert_eq!(tokenize("echo ${HOME}x $? $MISSING.", &env).unwrap(), ["echo", "/home/mex", "3", "."]);
}

#[test]
fn statements_black_box() {
    let statements = split_statements("a 1; b 2\n\n;c", &NoVars).unwrap();
    assert_eq!(statements, vec![vec!["a", "1"], vec!["b", "2"], vec!["c"]]);
}

#[test]
fn incremental_feed_black_box() {
    let mut tokenizer = Tokenizer::new();
    let (done, status) = tokenizer.feed("echo \"open", &NoVars).unwrap();
    assert!(done.is_empty());
    assert_eq!(status, Feed::Continuation);
    let (done, status) = tokenizer.feed("tail\"\n", &NoVars).unwrap();
    assert_eq!(done, vec![vec!["echo", "open tail"]]);
    assert_eq!(status, Feed::Complete);
}

#[test]
fn errors_black_box() {
    let err = tokenize("echo ${}", &NoVars).unwrap_err();
    assert_eq!(err.kind, ErrorKind::Lexical);
    assert!(split_words("echo 'open").is_err());
    assert!(tokenize("a; b", &NoVars).is_err());
}
