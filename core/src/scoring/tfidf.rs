use super::{document_frequencies, sort_by_score, ScoredDoc};
use crate::{Document, Term};
use std::collections::HashMap;

/// `ln(N / df)`, or `None` when the term occurs nowhere in the collection.
pub fn idf(num_docs: usize, df: usize) -> Option<f64> {
    if df == 0 || num_docs == 0 {
        return None;
    }
    Some((num_docs as f64 / df as f64).ln())
}

/// Length-normalized term frequency. Empty documents have no terms.
pub fn normalized_tf(term: &str, doc: &Document) -> f64 {
    if doc.is_empty() {
        return 0.0;
    }
    doc.term_frequency(term) as f64 / doc.len() as f64
}

/// Σ over query terms of `tf(t, d) / |d| * ln(N / df(t))`, one entry per
/// document in collection order. Repeated query terms count once per occurrence.
pub fn tfidf_scores(query: &[Term], docs: &[Document]) -> Vec<ScoredDoc> {
    let df = document_frequencies(query, docs);
    let idfs: Vec<(&str, f64)> = query
        .iter()
        .filter_map(|t| idf(docs.len(), df[t.as_str()]).map(|w| (t.as_str(), w)))
        .collect();

    docs.iter()
        .map(|doc| {
            let score = idfs.iter().map(|(t, w)| normalized_tf(t, doc) * w).sum();
            ScoredDoc { doc_id: doc.id, score }
        })
        .collect()
}

pub fn rank_tfidf(query: &[Term], docs: &[Document]) -> Vec<ScoredDoc> {
    sort_by_score(tfidf_scores(query, docs))
}

fn log_tf(tf: usize) -> f64 {
    if tf > 0 { 1.0 + (tf as f64).ln() } else { 0.0 }
}

fn l2_normalize(weights: &mut HashMap<&str, f64>) {
    let mut norm = weights.values().map(|w| w * w).sum::<f64>().sqrt();
    if norm == 0.0 { norm = 1.0; }
    for w in weights.values_mut() { *w /= norm; }
}

/// Cosine similarity between log-tf × idf vectors of the query and each document.
/// Scores fall in `[0, 1]`; terms unseen in the collection carry no weight.
pub fn cosine_scores(query: &[Term], docs: &[Document]) -> Vec<ScoredDoc> {
    let n = docs.len();
    let mut df: HashMap<&str, usize> = HashMap::new();
    for doc in docs {
        let mut seen: Vec<&str> = doc.tokens.iter().map(String::as_str).collect();
        seen.sort_unstable();
        seen.dedup();
        for t in seen {
            *df.entry(t).or_insert(0) += 1;
        }
    }

    let mut q_tf: HashMap<&str, usize> = HashMap::new();
    for t in query {
        *q_tf.entry(t.as_str()).or_insert(0) += 1;
    }
    let mut q_weights: HashMap<&str, f64> = q_tf
        .into_iter()
        .filter_map(|(t, tf)| {
            let idf = idf(n, df.get(t).copied().unwrap_or(0))?;
            Some((t, log_tf(tf) * idf))
        })
        .collect();
    l2_normalize(&mut q_weights);

    docs.iter()
        .map(|doc| {
            let mut d_tf: HashMap<&str, usize> = HashMap::new();
            for t in &doc.tokens {
                *d_tf.entry(t.as_str()).or_insert(0) += 1;
            }
            let mut d_weights: HashMap<&str, f64> = d_tf
                .into_iter()
                .map(|(t, tf)| (t, log_tf(tf) * idf(n, df[t]).unwrap_or(0.0)))
                .collect();
            l2_normalize(&mut d_weights);
            let score = q_weights
                .iter()
                .map(|(t, qw)| qw * d_weights.get(t).copied().unwrap_or(0.0))
                .sum();
            ScoredDoc { doc_id: doc.id, score }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::documents_from_texts;
    use crate::tokenizer::tokenize;

    #[test]
    fn formula_matches_hand_computation() {
        let docs = documents_from_texts(&["cat cat dog", "dog bird", "bird bird bird fish"]);
        let scores = tfidf_scores(&tokenize("cat dog"), &docs);
        let expected0 = (2.0 / 3.0) * 3f64.ln() + (1.0 / 3.0) * 1.5f64.ln();
        let expected1 = 0.5 * 1.5f64.ln();
        assert!((scores[0].score - expected0).abs() < 1e-12);
        assert!((scores[1].score - expected1).abs() < 1e-12);
        assert_eq!(scores[2].score, 0.0);
    }

    #[test]
    fn document_without_query_terms_scores_zero() {
        let docs = documents_from_texts(&["alpha beta", "gamma"]);
        let scores = tfidf_scores(&tokenize("alpha"), &docs);
        assert_eq!(scores[1].score, 0.0);
    }

    #[test]
    fn single_document_collection_scores_zero() {
        let docs = documents_from_texts(&["alpha beta alpha"]);
        let scores = tfidf_scores(&tokenize("alpha beta"), &docs);
        assert_eq!(scores[0].score, 0.0);
    }

    #[test]
    fn unseen_term_is_skipped() {
        let docs = documents_from_texts(&["alpha", "beta"]);
        let with = tfidf_scores(&tokenize("alpha zzz"), &docs);
        let without = tfidf_scores(&tokenize("alpha"), &docs);
        assert_eq!(with, without);
        assert!(with.iter().all(|s| s.score.is_finite()));
    }

    #[test]
    fn empty_document_scores_zero() {
        let docs = vec![Document::new(0, vec![]), Document::from_text(1, "x"), Document::from_text(2, "y")];
        let scores = tfidf_scores(&tokenize("x"), &docs);
        assert_eq!(scores[0].score, 0.0);
    }

    #[test]
    fn ranking_is_stable_on_ties() {
        let docs = documents_from_texts(&["b", "a", "c", "a"]);
        let ranked = rank_tfidf(&tokenize("a"), &docs);
        let ids: Vec<_> = ranked.iter().map(|s| s.doc_id).collect();
        assert_eq!(ids, vec![1, 3, 0, 2]);
    }

    #[test]
    fn cosine_of_identical_text_is_one() {
        let docs = documents_from_texts(&["rust systems", "python", "java"]);
        let scores = cosine_scores(&tokenize("rust systems"), &docs);
        assert!((scores[0].score - 1.0).abs() < 1e-9);
        assert_eq!(scores[1].score, 0.0);
    }
}
