//! Sorted postings-list merges and a small left-to-right Boolean query evaluator.
//!
//! All merges expect strictly ascending input without duplicates and produce
//! the same. Unsorted input is a caller bug and is not checked.

use crate::index::InvertedIndex;
use crate::tokenizer::Analyzer;
use crate::{DocId, LabError, Result, Term};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BooleanOp {
    And,
    Or,
    Not,
}

impl FromStr for BooleanOp {
    type Err = LabError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "AND" => Ok(BooleanOp::And),
            "OR" => Ok(BooleanOp::Or),
            "NOT" => Ok(BooleanOp::Not),
            _ => Err(LabError::UnknownOperator(s.to_string())),
        }
    }
}

/// Ids present in both lists.
pub fn intersect(a: &[DocId], b: &[DocId]) -> Vec<DocId> {
    let mut out = Vec::with_capacity(a.len().min(b.len()));
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        if a[i] == b[j] {
            out.push(a[i]);
            i += 1;
            j += 1;
        } else if a[i] < b[j] {
            i += 1;
        } else {
            j += 1;
        }
    }
    out
}

/// Ids present in either list, each emitted once.
pub fn union(a: &[DocId], b: &[DocId]) -> Vec<DocId> {
    let mut out = Vec::with_capacity(a.len() + b.len());
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        if a[i] == b[j] {
            out.push(a[i]);
            i += 1;
            j += 1;
        } else if a[i] < b[j] {
            out.push(a[i]);
            i += 1;
        } else {
            out.push(b[j]);
            j += 1;
        }
    }
    out.extend_from_slice(&a[i..]);
    out.extend_from_slice(&b[j..]);
    out
}

/// Ids of `a` that do not appear in `b`.
pub fn difference(a: &[DocId], b: &[DocId]) -> Vec<DocId> {
    let mut out = Vec::with_capacity(a.len());
    let (mut i, mut j) = (0, 0);
    while i < a.len() {
        if j < b.len() && b[j] < a[i] {
            j += 1;
        } else if j < b.len() && b[j] == a[i] {
            i += 1;
            j += 1;
        } else {
            out.push(a[i]);
            i += 1;
        }
    }
    out
}

pub fn merge(op: BooleanOp, a: &[DocId], b: &[DocId]) -> Vec<DocId> {
    match op {
        BooleanOp::And => intersect(a, b),
        BooleanOp::Or => union(a, b),
        BooleanOp::Not => difference(a, b),
    }
}

/// A flat query such as `cat AND dog NOT mouse`, evaluated left to right.
///
/// Operators must be written in upper case; anything else is a term. Two terms
/// with no operator between them are joined with AND.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BooleanQuery {
    first: Term,
    rest: Vec<(BooleanOp, Term)>,
}

impl BooleanQuery {
    pub fn parse(query: &str) -> Result<Self> {
        let mut words = query.split_whitespace();
        let first = match words.next() {
            None => return Err(LabError::EmptyQuery),
            Some(w) if is_operator(w) => {
                return Err(LabError::MalformedQuery(format!("query starts with operator {w}")))
            }
            Some(w) => w.to_lowercase(),
        };

        let mut rest = Vec::new();
        let mut pending: Option<BooleanOp> = None;
        for w in words {
            if is_operator(w) {
                if let Some(prev) = pending {
                    return Err(LabError::MalformedQuery(format!("operator {w} follows {prev:?}")));
                }
                pending = Some(w.parse()?);
            } else {
                rest.push((pending.take().unwrap_or(BooleanOp::And), w.to_lowercase()));
            }
        }
        if let Some(op) = pending {
            return Err(LabError::MalformedQuery(format!("query ends with operator {op:?}")));
        }
        Ok(Self { first, rest })
    }

    pub fn terms(&self) -> impl Iterator<Item = &str> + '_ {
        std::iter::once(self.first.as_str()).chain(self.rest.iter().map(|(_, t)| t.as_str()))
    }

    /// Evaluate against an index built with the whitespace analyzer.
    pub fn evaluate(&self, index: &InvertedIndex) -> Vec<DocId> {
        self.evaluate_with(index, Analyzer::Whitespace)
    }

    /// Evaluate against an index built with `analyzer`. Each term is analyzed
    /// the same way before lookup. Terms the analyzer drops entirely (stopwords)
    /// are skipped, and the first surviving term seeds the result.
    pub fn evaluate_with(&self, index: &InvertedIndex, analyzer: Analyzer) -> Vec<DocId> {
        let clauses = std::iter::once((BooleanOp::Or, &self.first)).chain(self.rest.iter().map(|(op, t)| (*op, t)));
        let mut result: Option<Vec<DocId>> = None;
        for (op, term) in clauses {
            let Some(key) = analyzer.analyze(term).into_iter().next() else { continue };
            let ids = index.doc_ids(&key);
            result = Some(match result {
                None => ids,
                Some(acc) => merge(op, &acc, &ids),
            });
        }
        result.unwrap_or_default()
    }
}

fn is_operator(word: &str) -> bool {
    matches!(word, "AND" | "OR" | "NOT")
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::BTreeMap;

    const CAT: &[DocId] = &[1, 2, 4, 7];
    const DOG: &[DocId] = &[2, 3, 4, 5];

    #[test]
    fn cat_and_dog_example() {
        assert_eq!(merge(BooleanOp::And, CAT, DOG), vec![2, 4]);
        assert_eq!(merge(BooleanOp::Or, CAT, DOG), vec![1, 2, 3, 4, 5, 7]);
        assert_eq!(merge(BooleanOp::Not, CAT, DOG), vec![1, 7]);
    }

    #[test]
    fn empty_inputs() {
        assert!(intersect(CAT, &[]).is_empty());
        assert!(intersect(&[], DOG).is_empty());
        assert_eq!(union(&[], DOG), DOG.to_vec());
        assert_eq!(union(CAT, &[]), CAT.to_vec());
        assert_eq!(difference(CAT, &[]), CAT.to_vec());
        assert!(difference(&[], DOG).is_empty());
    }

    #[test]
    fn difference_skips_trailing_b() {
        assert_eq!(difference(&[1, 3], &[0, 2, 3, 9, 10]), vec![1]);
    }

    #[test]
    fn op_parses_case_insensitively() {
        assert_eq!("and".parse::<BooleanOp>().unwrap(), BooleanOp::And);
        assert!("XOR".parse::<BooleanOp>().is_err());
    }

    fn index() -> InvertedIndex {
        InvertedIndex::build(&BTreeMap::from([
            (1, "cat"),
            (2, "cat dog"),
            (3, "dog"),
            (4, "cat dog mouse"),
            (5, "dog"),
            (7, "cat"),
        ]))
    }

    #[test]
    fn evaluates_left_to_right() {
        let index = index();
        let q = BooleanQuery::parse("cat AND dog NOT mouse").unwrap();
        assert_eq!(q.evaluate(&index), vec![2]);
        let q = BooleanQuery::parse("mouse OR cat NOT dog").unwrap();
        assert_eq!(q.evaluate(&index), vec![1, 7]);
    }

    #[test]
    fn adjacent_terms_imply_and() {
        let q = BooleanQuery::parse("Cat dog").unwrap();
        assert_eq!(q.evaluate(&index()), vec![2, 4]);
        assert_eq!(q.terms().collect::<Vec<_>>(), vec!["cat", "dog"]);
    }

    #[test]
    fn unknown_term_yields_empty() {
        let q = BooleanQuery::parse("unicorn AND cat").unwrap();
        assert!(q.evaluate(&index()).is_empty());
        let q = BooleanQuery::parse("unicorn OR cat").unwrap();
        assert_eq!(q.evaluate(&index()), vec![1, 2, 4, 7]);
    }

    #[test]
    fn or_after_empty_intermediate_result() {
        let index = InvertedIndex::build(&BTreeMap::from([(1, "cat"), (2, "dog")]));
        let q = BooleanQuery::parse("unicorn AND cat OR dog").unwrap();
        let expected = merge(BooleanOp::Or, &merge(BooleanOp::And, &[], &[1]), &[2]);
        assert_eq!(q.evaluate(&index), expected);
        assert_eq!(q.evaluate(&index), vec![2]);
        let q = BooleanQuery::parse("cat NOT cat NOT dog OR dog").unwrap();
        assert_eq!(q.evaluate(&index), vec![2]);
    }

    #[test]
    fn terms_go_through_the_index_analyzer() {
        let texts = BTreeMap::from([(0, "running fast"), (1, "walking slow")]);
        let index = InvertedIndex::build_with(&texts, Analyzer::Stemmed);
        let q = BooleanQuery::parse("running").unwrap();
        assert!(q.evaluate(&index).is_empty());
        assert_eq!(q.evaluate_with(&index, Analyzer::Stemmed), vec![0]);
        let q = BooleanQuery::parse("the OR walks").unwrap();
        assert_eq!(q.evaluate_with(&index, Analyzer::Stemmed), vec![1]);
    }

    #[test]
    fn rejects_malformed_queries() {
        assert_eq!(BooleanQuery::parse("  "), Err(LabError::EmptyQuery));
        assert!(matches!(BooleanQuery::parse("AND cat"), Err(LabError::MalformedQuery(_))));
        assert!(matches!(BooleanQuery::parse("cat OR"), Err(LabError::MalformedQuery(_))));
        assert!(matches!(BooleanQuery::parse("cat AND OR dog"), Err(LabError::MalformedQuery(_))));
    }

    fn sorted_ids() -> impl Strategy<Value = Vec<DocId>> {
        proptest::collection::btree_set(0u32..64, 0..24).prop_map(|s| s.into_iter().collect())
    }

    fn strictly_ascending(v: &[DocId]) -> bool {
        v.windows(2).all(|w| w[0] < w[1])
    }

    proptest! {
        #[test]
        fn merge_laws(a in sorted_ids(), b in sorted_ids()) {
            let and = intersect(&a, &b);
            let or = union(&a, &b);
            let not = difference(&a, &b);

            prop_assert!(and.iter().all(|d| a.contains(d) && b.contains(d)));
            prop_assert!(a.iter().chain(b.iter()).all(|d| or.contains(d)));
            prop_assert_eq!(not.len(), a.len() - and.len());
            prop_assert!(not.iter().all(|d| !b.contains(d)));
            prop_assert!(strictly_ascending(&and));
            prop_assert!(strictly_ascending(&or));
            prop_assert!(strictly_ascending(&not));
        }
    }
}
