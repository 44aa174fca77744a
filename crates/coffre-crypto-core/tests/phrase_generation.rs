#![allow(clippy::unwrap_used, clippy::arithmetic_side_effects)]

//! Bulk generation checks for recovery phrases.

use std::collections::HashSet;

use coffre_crypto_core::{generate_phrase, validate_phrase, word_list, PHRASE_WORD_COUNT};

#[test]
fn a_thousand_phrases_all_validate_and_differ() {
    let mut seen = HashSet::new();
    for _ in 0..1000 {
        let phrase = generate_phrase().expect("generation should succeed");
        assert!(validate_phrase(&phrase), "invalid phrase: {phrase}");
        assert!(seen.insert(phrase), "duplicate phrase generated");
    }
}

#[test]
fn generated_words_come_from_the_english_list() {
    let words: HashSet<&str> = word_list().iter().copied().collect();
    for _ in 0..50 {
        let phrase = generate_phrase().expect("generation should succeed");
        let phrase_words: Vec<&str> = phrase.split(' ').collect();
        assert_eq!(phrase_words.len(), PHRASE_WORD_COUNT);
        for word in phrase_words {
            assert!(words.contains(word), "word not in list: {word}");
            assert!(word.bytes().all(|b| b.is_ascii_lowercase()));
        }
    }
}
