//! Okapi BM25.

use super::{document_frequencies, sort_by_score, ScoredDoc};
use crate::config::Bm25Params;
use crate::index::InvertedIndex;
use crate::{Document, Term};
use std::collections::HashMap;

/// `ln((N - df + 0.5) / (df + 0.5))`, floored at zero; `None` for unseen terms.
///
/// The floor only changes the result when `df > N / 2`, where the raw formula
/// goes negative: such terms weigh 0 here instead. Without it they would score
/// documents lower the more often they contain them.
pub fn bm25_idf(num_docs: usize, df: usize) -> Option<f64> {
    if df == 0 {
        return None;
    }
    let n = num_docs as f64;
    let df = df as f64;
    Some(((n - df + 0.5) / (df + 0.5)).ln().max(0.0))
}

/// Contribution of one term to one document.
pub fn term_score(tf: f64, doc_len: f64, avgdl: f64, idf: f64, params: &Bm25Params) -> f64 {
    if tf <= 0.0 {
        return 0.0;
    }
    let length_ratio = if avgdl > 0.0 { doc_len / avgdl } else { 1.0 };
    let k1 = params.k1;
    let b = params.b;
    idf * (tf * (k1 + 1.0)) / (tf + k1 * (1.0 - b + b * length_ratio))
}

/// BM25 score of every document, in collection order.
pub fn bm25_scores(query: &[Term], docs: &[Document], params: &Bm25Params) -> Vec<ScoredDoc> {
    if docs.is_empty() {
        return Vec::new();
    }
    let df = document_frequencies(query, docs);
    let avgdl = docs.iter().map(|d| d.len()).sum::<usize>() as f64 / docs.len() as f64;
    let idfs: Vec<(&str, f64)> = query
        .iter()
        .filter_map(|t| bm25_idf(docs.len(), df[t.as_str()]).map(|w| (t.as_str(), w)))
        .collect();

    docs.iter()
        .map(|doc| {
            let score = idfs
                .iter()
                .map(|(t, idf)| term_score(doc.term_frequency(t) as f64, doc.len() as f64, avgdl, *idf, params))
                .sum();
            ScoredDoc { doc_id: doc.id, score }
        })
        .collect()
}

pub fn rank_bm25(query: &[Term], docs: &[Document], params: &Bm25Params) -> Vec<ScoredDoc> {
    sort_by_score(bm25_scores(query, docs, params))
}

/// BM25 over a prebuilt index. Only documents matching at least one query term
/// are returned, ranked descending with ties in ascending `doc_id` order.
pub fn search_index(index: &InvertedIndex, query: &[Term], params: &Bm25Params) -> Vec<ScoredDoc> {
    let n = index.num_docs();
    if query.is_empty() || n == 0 {
        return Vec::new();
    }
    let avgdl = index.average_doc_length();

    let mut scores: HashMap<u32, f64> = HashMap::new();
    for term in query {
        let postings = index.postings(term);
        let Some(idf) = bm25_idf(n, postings.len()) else { continue };
        for p in postings {
            let dl = index.doc_length(p.doc_id).unwrap_or(0) as f64;
            *scores.entry(p.doc_id).or_insert(0.0) += term_score(f64::from(p.term_frequency), dl, avgdl, idf, params);
        }
    }

    let mut scored: Vec<ScoredDoc> = scores
        .into_iter()
        .map(|(doc_id, score)| ScoredDoc { doc_id, score })
        .collect();
    scored.sort_by_key(|s| s.doc_id);
    sort_by_score(scored)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::documents_from_texts;
    use crate::tokenizer::tokenize;
    use std::collections::BTreeMap;

    fn corpus() -> Vec<Document> {
        documents_from_texts(&[
            "rust programming systems language fast",
            "python programming scripting easy",
            "java enterprise programming verbose",
            "rust memory safety zero cost abstractions",
            "go concurrency simple",
        ])
    }

    #[test]
    fn unseen_terms_contribute_nothing() {
        assert_eq!(bm25_idf(10, 0), None);
        let docs = corpus();
        let scores = bm25_scores(&tokenize("nonexistent"), &docs, &Bm25Params::default());
        assert!(scores.iter().all(|s| s.score == 0.0));
    }

    #[test]
    fn higher_tf_never_scores_lower() {
        let params = Bm25Params::new(1.5, 0.75).unwrap();
        let idf = bm25_idf(10, 2).unwrap();
        let mut prev = 0.0;
        for tf in 1..20 {
            let s = term_score(tf as f64, 10.0, 10.0, idf, &params);
            assert!(s >= prev);
            prev = s;
        }
        // Saturates below idf * (k1 + 1).
        assert!(prev < idf * (params.k1 + 1.0));
    }

    #[test]
    fn monotone_even_for_common_terms() {
        let docs = documents_from_texts(&["x x x y", "x y y y"]);
        let scores = bm25_scores(&tokenize("x"), &docs, &Bm25Params::default());
        assert!(scores[0].score >= scores[1].score);
    }

    #[test]
    fn floor_applies_only_above_half_the_collection() {
        let raw = |n: f64, df: f64| ((n - df + 0.5) / (df + 0.5)).ln();
        assert!(raw(4.0, 3.0) < 0.0);
        assert_eq!(bm25_idf(4, 3), Some(0.0));
        assert!(raw(5.0, 2.0) > 0.0);
        assert_eq!(bm25_idf(5, 2), Some(raw(5.0, 2.0)));
    }

    #[test]
    fn higher_tf_scores_higher_when_idf_is_positive() {
        let docs = documents_from_texts(&["x x x y", "x y y y", "y z", "z w", "w y"]);
        let idf = bm25_idf(docs.len(), 2).unwrap();
        assert!(idf > 0.0);
        let scores = bm25_scores(&tokenize("x"), &docs, &Bm25Params::default());
        assert!(scores[0].score > scores[1].score);
        assert!(scores[1].score > 0.0);
        assert!(scores[2..].iter().all(|s| s.score == 0.0));
    }

    #[test]
    fn longer_documents_are_penalized() {
        let params = Bm25Params::default();
        let idf = bm25_idf(10, 1).unwrap();
        assert!(term_score(2.0, 5.0, 10.0, idf, &params) > term_score(2.0, 20.0, 10.0, idf, &params));
        let flat = Bm25Params::new(1.5, 0.0).unwrap();
        assert_eq!(term_score(2.0, 5.0, 10.0, idf, &flat), term_score(2.0, 20.0, 10.0, idf, &flat));
    }

    #[test]
    fn ranks_matching_documents_first() {
        let ranked = rank_bm25(&tokenize("rust safety"), &corpus(), &Bm25Params::default());
        assert_eq!(ranked[0].doc_id, 3);
        assert_eq!(ranked[1].doc_id, 0);
        assert!(ranked[2..].iter().all(|s| s.score == 0.0));
    }

    #[test]
    fn index_search_agrees_with_collection_scoring() {
        let docs = corpus();
        let texts: BTreeMap<u32, String> = docs.iter().map(|d| (d.id, d.tokens.join(" "))).collect();
        let index = InvertedIndex::build(&texts);
        let params = Bm25Params::default();
        let query = tokenize("rust programming");
        let from_index = search_index(&index, &query, &params);
        let from_docs = bm25_scores(&query, &docs, &params);
        for hit in &from_index {
            let expected = from_docs[hit.doc_id as usize].score;
            assert!((hit.score - expected).abs() < 1e-9);
        }
        assert!(from_index.windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[test]
    fn empty_inputs() {
        assert!(bm25_scores(&tokenize("x"), &[], &Bm25Params::default()).is_empty());
        assert!(search_index(&InvertedIndex::new(), &tokenize("x"), &Bm25Params::default()).is_empty());
    }
}
