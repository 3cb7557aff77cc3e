use ircore::tokenizer::{stem_tokens, tokenize, Analyzer};

#[test]
fn it_normalizes_and_stems() {
    let words = Analyzer::Stemmed.analyze("Running Runners RUN! The café's menu.");
    // Stemming to "run" should appear
    assert!(words.contains(&"run".to_string()));
    // Unicode normalization: café -> cafe
    assert!(words.contains(&"cafe".to_string()));
}

#[test]
fn it_filters_stopwords() {
    let words = Analyzer::Stemmed.analyze("The quick brown fox and the lazy dog");
    assert!(!words.contains(&"the".to_string()));
    assert!(!words.contains(&"and".to_string()));
}

#[test]
fn stem_positions_count_dropped_stopwords() {
    let toks = stem_tokens("the cats");
    assert_eq!(toks, vec![("cat".to_string(), 1)]);
}

#[test]
fn whitespace_analyzer_keeps_punctuation_and_stopwords() {
    let words = Analyzer::Whitespace.analyze("The Cat, the DOG.");
    assert_eq!(words, tokenize("the cat, the dog."));
    assert_eq!(words, vec!["the", "cat,", "the", "dog."]);
}
