use nestsh::{split_words, tokenize, Expander, Flavor, NoVars, Theme};
use proptest::prelude::*;

fn plain_word() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9_./:=+-]{1,12}"
}

proptest! {
    #[test]
    fn rejoined_words_tokenize_the_same(words in prop::collection::vec(plain_word(), 1..8)) {
        let first = tokenize(&words.join(" "), &NoVars).unwrap();
        prop_assert_eq!(&first, &words);
        let again = tokenize(&first.join("  \t "), &NoVars).unwrap();
        prop_assert_eq!(again, first);
    }

    #[test]
    fn single_quotes_keep_text(text in "[^'\n\r]{0,24}") {
        let words = split_words(&format!("say '{}'", text)).unwrap();
        prop_assert_eq!(words, vec!["say".to_string(), text]);
    }

    #[test]
    fn text_without_percent_is_unchanged(text in "[^%]{0,40}") {
        let mut expander = Expander::new(&Theme::ansi(), Flavor::Ansi);
        prop_assert_eq!(expander.expand(&text, &NoVars), text);
    }

    #[test]
    fn doubled_percent_is_literal(text in "[a-z ]{0,10}") {
        let mut expander = Expander::new(&Theme::plain(), Flavor::Readline);
        let template = format!("{}%%{}", text, text);
        prop_assert_eq!(expander.expand(&template, &NoVars), format!("{}%{}", text, text));
    }

    #[test]
    fn tokenizer_never_panics(input in "\\PC{0,64}") {
        let _ = tokenize(&input, &NoVars);
    }
}
