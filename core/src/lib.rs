//! Classic information-retrieval algorithms for the IR lab.
//!
//! Every algorithm is a pure function over caller-owned data: nothing here keeps
//! state between calls, and only the boundary constructors and parsers can fail.

pub mod boolean;
pub mod config;
pub mod corpus;
pub mod error;
pub mod huffman;
pub mod index;
pub mod pagerank;
pub mod scoring;
pub mod spelling;
pub mod structural;
pub mod tokenizer;

use serde::{Deserialize, Serialize};
use tokenizer::{tokenize, Analyzer};

pub use error::{LabError, Result};
pub use index::{InvertedIndex, Posting};

pub type DocId = u32;
pub type Term = String;

/// A tokenized document. Token order is preserved so lengths and frequencies
/// can be derived without re-reading the text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocId,
    pub tokens: Vec<Term>,
}

impl Document {
    pub fn new(id: DocId, tokens: Vec<Term>) -> Self {
        Self { id, tokens }
    }

    /// Whitespace-split, lowercased document.
    pub fn from_text(id: DocId, text: &str) -> Self {
        Self { id, tokens: tokenize(text) }
    }

    pub fn analyzed(id: DocId, text: &str, analyzer: Analyzer) -> Self {
        Self { id, tokens: analyzer.analyze(text) }
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Number of occurrences of `term` in this document.
    pub fn term_frequency(&self, term: &str) -> usize {
        self.tokens.iter().filter(|t| t.as_str() == term).count()
    }

    pub fn contains(&self, term: &str) -> bool {
        self.tokens.iter().any(|t| t.as_str() == term)
    }
}

/// Builds documents from raw texts, numbering them from zero in input order.
pub fn documents_from_texts<S: AsRef<str>>(texts: &[S]) -> Vec<Document> {
    texts
        .iter()
        .enumerate()
        .map(|(i, text)| Document::from_text(i as DocId, text.as_ref()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_counts_terms() {
        let doc = Document::from_text(3, "The cat sat on the Mat");
        assert_eq!(doc.id, 3);
        assert_eq!(doc.len(), 6);
        assert_eq!(doc.term_frequency("the"), 2);
        assert_eq!(doc.term_frequency("dog"), 0);
        assert!(doc.contains("mat"));
    }

    #[test]
    fn documents_are_numbered_in_order() {
        let docs = documents_from_texts(&["a b", "c"]);
        assert_eq!(docs[0].id, 0);
        assert_eq!(docs[1].id, 1);
        assert_eq!(docs[1].tokens, vec!["c".to_string()]);
    }
}
