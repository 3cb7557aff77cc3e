//! Field-scoped search over structured records, e.g. `title:retrieval author:manning`.

use crate::boolean::{intersect, union};
use crate::index::InvertedIndex;
use crate::tokenizer::tokenize;
use crate::{DocId, Document, LabError, Result, Term};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Field {
    Title,
    Author,
    Body,
}

impl Field {
    pub const ALL: [Field; 3] = [Field::Title, Field::Author, Field::Body];

    pub fn name(self) -> &'static str {
        match self {
            Field::Title => "title",
            Field::Author => "author",
            Field::Body => "body",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Field {
    type Err = LabError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "title" => Ok(Field::Title),
            "author" => Ok(Field::Author),
            "body" => Ok(Field::Body),
            _ => Err(LabError::UnknownField(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub id: DocId,
    pub title: String,
    pub author: String,
    pub body: String,
}

impl Record {
    pub fn field(&self, field: Field) -> &str {
        match field {
            Field::Title => &self.title,
            Field::Author => &self.author,
            Field::Body => &self.body,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldClause {
    /// `None` matches the term in any field.
    pub field: Option<Field>,
    pub term: Term,
}

/// Whitespace-separated clauses, all of which must match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldQuery {
    pub clauses: Vec<FieldClause>,
}

impl FieldQuery {
    pub fn parse(query: &str) -> Result<Self> {
        let mut clauses = Vec::new();
        for word in query.split_whitespace() {
            let clause = match word.split_once(':') {
                Some((name, term)) => {
                    if term.is_empty() {
                        return Err(LabError::MalformedQuery(format!("field {name} has no term")));
                    }
                    FieldClause { field: Some(name.parse()?), term: term.to_lowercase() }
                }
                None => FieldClause { field: None, term: word.to_lowercase() },
            };
            clauses.push(clause);
        }
        if clauses.is_empty() {
            return Err(LabError::EmptyQuery);
        }
        Ok(Self { clauses })
    }
}

/// One inverted index per field.
#[derive(Debug, Clone, Default)]
pub struct FieldIndex {
    fields: BTreeMap<Field, InvertedIndex>,
}

impl FieldIndex {
    pub fn build(records: &[Record]) -> Self {
        let mut fields: BTreeMap<Field, InvertedIndex> =
            Field::ALL.iter().map(|&f| (f, InvertedIndex::new())).collect();
        for record in records {
            for (&field, index) in fields.iter_mut() {
                index.add_document(&Document::new(record.id, tokenize(record.field(field))));
            }
        }
        Self { fields }
    }

    pub fn field(&self, field: Field) -> Option<&InvertedIndex> {
        self.fields.get(&field)
    }

    fn matches(&self, clause: &FieldClause) -> Vec<DocId> {
        match clause.field {
            Some(field) => self.fields.get(&field).map(|idx| idx.doc_ids(&clause.term)).unwrap_or_default(),
            None => self
                .fields
                .values()
                .fold(Vec::new(), |acc, idx| union(&acc, &idx.doc_ids(&clause.term))),
        }
    }

    pub fn search(&self, query: &FieldQuery) -> Vec<DocId> {
        let mut clauses = query.clauses.iter();
        let Some(first) = clauses.next() else {
            return Vec::new();
        };
        clauses.fold(self.matches(first), |acc, clause| intersect(&acc, &self.matches(clause)))
    }
}
