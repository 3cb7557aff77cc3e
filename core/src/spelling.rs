//! Edit distance and dictionary-based spelling suggestions.

use crate::tokenizer::tokenize;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Levenshtein distance between `a` and `b`, counted in Unicode scalar values.
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let (m, n) = (a.len(), b.len());
    let width = n + 1;

    // (m + 1) x (n + 1) table, row-major.
    let mut table = vec![0usize; (m + 1) * width];
    for i in 0..=m {
        table[i * width] = i;
    }
    for j in 0..=n {
        table[j] = j;
    }
    for i in 1..=m {
        for j in 1..=n {
            let diagonal = table[(i - 1) * width + (j - 1)];
            table[i * width + j] = if a[i - 1] == b[j - 1] {
                diagonal
            } else {
                let up = table[(i - 1) * width + j];
                let left = table[i * width + (j - 1)];
                1 + diagonal.min(up).min(left)
            };
        }
    }
    table[m * width + n]
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestion {
    pub word: String,
    pub distance: usize,
}

/// Candidates at the minimum distance from `query`, in dictionary order.
///
/// Exact matches are only returned when the dictionary holds nothing else.
pub fn nearest<S: AsRef<str>>(query: &str, dictionary: &[S]) -> Vec<Suggestion> {
    let scored: Vec<(&str, usize)> = dictionary
        .iter()
        .map(|w| (w.as_ref(), levenshtein(query, w.as_ref())))
        .collect();
    let pool: Vec<(&str, usize)> = if scored.iter().any(|(_, d)| *d > 0) {
        scored.into_iter().filter(|(_, d)| *d > 0).collect()
    } else {
        scored
    };
    let Some(best) = pool.iter().map(|(_, d)| *d).min() else {
        return Vec::new();
    };
    pool.into_iter()
        .filter(|(_, d)| *d == best)
        .map(|(w, distance)| Suggestion { word: w.to_string(), distance })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Correction {
    pub position: usize,
    pub word: String,
    pub suggestions: Vec<Suggestion>,
}

/// A lowercased word list that flags unknown tokens and proposes replacements.
#[derive(Debug, Clone, Default)]
pub struct SpellChecker {
    words: Vec<String>,
    known: HashSet<String>,
}

impl SpellChecker {
    pub fn new<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut checker = Self::default();
        for w in words {
            let w = w.as_ref().to_lowercase();
            if checker.known.insert(w.clone()) {
                checker.words.push(w);
            }
        }
        checker
    }

    /// Build from free text, one dictionary entry per distinct whitespace token.
    pub fn from_text(text: &str) -> Self {
        Self::new(tokenize(text))
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn contains(&self, word: &str) -> bool {
        self.known.contains(&word.to_lowercase())
    }

    pub fn suggest(&self, word: &str) -> Vec<Suggestion> {
        nearest(&word.to_lowercase(), &self.words)
    }

    /// One correction per token of `text` that is not in the dictionary.
    pub fn check(&self, text: &str) -> Vec<Correction> {
        tokenize(text)
            .into_iter()
            .enumerate()
            .filter(|(_, w)| !self.known.contains(w))
            .map(|(position, word)| {
                let suggestions = nearest(&word, &self.words);
                Correction { position, word, suggestions }
            })
            .collect()
    }
}
