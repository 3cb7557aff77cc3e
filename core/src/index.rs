use crate::tokenizer::Analyzer;
use crate::{DocId, Document, Term};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Posting {
    pub doc_id: DocId,
    pub term_frequency: u32,
}

/// In-memory inverted index. Postings for every term are kept in ascending
/// `doc_id` order, so they feed straight into the merges in [`crate::boolean`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InvertedIndex {
    postings: BTreeMap<Term, Vec<Posting>>,
    doc_lengths: BTreeMap<DocId, u32>,
    total_doc_length: u64,
}

impl InvertedIndex {
    pub fn new() -> Self { Self::default() }

    /// Build an index from raw document texts, keyed by document id.
    pub fn build<S: AsRef<str>>(texts: &BTreeMap<DocId, S>) -> Self {
        Self::build_with(texts, Analyzer::Whitespace)
    }

    pub fn build_with<S: AsRef<str>>(texts: &BTreeMap<DocId, S>, analyzer: Analyzer) -> Self {
        let mut index = Self::new();
        for (&doc_id, text) in texts {
            index.add_document(&Document::analyzed(doc_id, text.as_ref(), analyzer));
        }
        tracing::debug!(num_docs = index.num_docs(), num_terms = index.postings.len(), "built inverted index");
        index
    }

    pub fn from_documents(docs: &[Document]) -> Self {
        let mut index = Self::new();
        for doc in docs {
            index.add_document(doc);
        }
        index
    }

    /// Add (or replace) a document. Postings stay sorted whatever order documents arrive in.
    pub fn add_document(&mut self, doc: &Document) {
        if self.doc_lengths.contains_key(&doc.id) {
            self.remove_document(doc.id);
        }
        let len = doc.len() as u32;
        self.doc_lengths.insert(doc.id, len);
        self.total_doc_length += u64::from(len);

        let mut tf_counts: HashMap<&str, u32> = HashMap::new();
        for token in &doc.tokens {
            *tf_counts.entry(token.as_str()).or_insert(0) += 1;
        }
        for (term, term_frequency) in tf_counts {
            let plist = self.postings.entry(term.to_string()).or_default();
            let posting = Posting { doc_id: doc.id, term_frequency };
            match plist.last() {
                Some(last) if last.doc_id > doc.id => {
                    let at = plist.partition_point(|p| p.doc_id < doc.id);
                    plist.insert(at, posting);
                }
                _ => plist.push(posting),
            }
        }
    }

    pub fn remove_document(&mut self, doc_id: DocId) {
        if let Some(len) = self.doc_lengths.remove(&doc_id) {
            self.total_doc_length -= u64::from(len);
            self.postings.retain(|_, plist| {
                plist.retain(|p| p.doc_id != doc_id);
                !plist.is_empty()
            });
        }
    }

    /// Postings for `term`, empty when the term never occurs.
    pub fn postings(&self, term: &str) -> &[Posting] {
        self.postings
            .get(term.to_lowercase().as_str())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn doc_ids(&self, term: &str) -> Vec<DocId> {
        self.postings(term).iter().map(|p| p.doc_id).collect()
    }

    pub fn document_frequency(&self, term: &str) -> usize {
        self.postings(term).len()
    }

    pub fn term_frequency(&self, doc_id: DocId, term: &str) -> u32 {
        let plist = self.postings(term);
        plist
            .binary_search_by_key(&doc_id, |p| p.doc_id)
            .map(|i| plist[i].term_frequency)
            .unwrap_or(0)
    }

    pub fn doc_length(&self, doc_id: DocId) -> Option<u32> {
        self.doc_lengths.get(&doc_id).copied()
    }

    pub fn num_docs(&self) -> usize {
        self.doc_lengths.len()
    }

    pub fn average_doc_length(&self) -> f64 {
        if self.doc_lengths.is_empty() {
            return 0.0;
        }
        self.total_doc_length as f64 / self.doc_lengths.len() as f64
    }

    /// Every indexed document id, ascending. The universe for a leading NOT.
    pub fn all_doc_ids(&self) -> Vec<DocId> {
        self.doc_lengths.keys().copied().collect()
    }

    pub fn terms(&self) -> impl Iterator<Item = &str> + '_ {
        self.postings.keys().map(String::as_str)
    }

    pub fn num_terms(&self) -> usize {
        self.postings.len()
    }
}
