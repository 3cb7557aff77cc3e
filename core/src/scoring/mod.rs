//! Ranking functions over an in-memory document collection.

pub mod bm25;
pub mod tfidf;

use crate::config::Bm25Params;
use crate::{DocId, Document, LabError, Result, Term};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoredDoc {
    pub doc_id: DocId,
    pub score: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RankingModel {
    TfIdf,
    #[default]
    Bm25,
    Cosine,
}

impl FromStr for RankingModel {
    type Err = LabError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "tfidf" | "tf-idf" => Ok(RankingModel::TfIdf),
            "bm25" => Ok(RankingModel::Bm25),
            "cosine" => Ok(RankingModel::Cosine),
            other => Err(LabError::UnknownRankingModel(other.to_string())),
        }
    }
}

/// Score every document against `query` with `model` and rank the result.
pub fn rank(model: RankingModel, query: &[Term], docs: &[Document], params: &Bm25Params) -> Vec<ScoredDoc> {
    let scores = match model {
        RankingModel::TfIdf => tfidf::tfidf_scores(query, docs),
        RankingModel::Bm25 => bm25::bm25_scores(query, docs, params),
        RankingModel::Cosine => tfidf::cosine_scores(query, docs),
    };
    sort_by_score(scores)
}

/// Descending by score. The sort is stable, so ties keep collection order.
pub fn sort_by_score(mut scores: Vec<ScoredDoc>) -> Vec<ScoredDoc> {
    scores.sort_by(|a, b| b.score.total_cmp(&a.score));
    scores
}

/// Number of documents containing each distinct query term at least once.
pub(crate) fn document_frequencies<'q>(query: &'q [Term], docs: &[Document]) -> HashMap<&'q str, usize> {
    let mut df = HashMap::with_capacity(query.len());
    for term in query {
        df.entry(term.as_str())
            .or_insert_with(|| docs.iter().filter(|d| d.contains(term)).count());
    }
    df
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::documents_from_texts;
    use crate::tokenizer::tokenize;

    #[test]
    fn ties_keep_collection_order() {
        let ranked = sort_by_score(vec![
            ScoredDoc { doc_id: 0, score: 1.0 },
            ScoredDoc { doc_id: 1, score: 2.0 },
            ScoredDoc { doc_id: 2, score: 1.0 },
            ScoredDoc { doc_id: 3, score: 2.0 },
        ]);
        let ids: Vec<DocId> = ranked.iter().map(|s| s.doc_id).collect();
        assert_eq!(ids, vec![1, 3, 0, 2]);
    }

    #[test]
    fn model_parses() {
        assert_eq!("TF-IDF".parse::<RankingModel>().unwrap(), RankingModel::TfIdf);
        assert_eq!("bm25".parse::<RankingModel>().unwrap(), RankingModel::Bm25);
        assert!("lm".parse::<RankingModel>().is_err());
    }

    #[test]
    fn every_model_prefers_the_matching_document() {
        let docs = documents_from_texts(&[
            "rust systems programming",
            "python scripting",
            "java enterprise",
        ]);
        let query = tokenize("rust");
        for model in [RankingModel::TfIdf, RankingModel::Bm25, RankingModel::Cosine] {
            let ranked = rank(model, &query, &docs, &Bm25Params::default());
            assert_eq!(ranked.len(), 3);
            assert_eq!(ranked[0].doc_id, 0, "{model:?}");
            assert!(ranked[0].score > 0.0, "{model:?}");
        }
    }

    #[test]
    fn document_frequency_counts_documents_not_occurrences() {
        let docs = documents_from_texts(&["a a a", "a b", "c"]);
        let query = tokenize("a b z");
        let df = document_frequencies(&query, &docs);
        assert_eq!(df["a"], 2);
        assert_eq!(df["b"], 1);
        assert_eq!(df["z"], 0);
    }
}
