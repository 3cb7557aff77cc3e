//! Loading lab corpora from disk: a directory of `.txt` files or a file with
//! one document per line.

use crate::structural::Record;
use crate::tokenizer::Analyzer;
use crate::{DocId, Document, InvertedIndex};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Raw document texts keyed by id, in the order they were loaded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Corpus {
    pub texts: BTreeMap<DocId, String>,
    /// Source label per document: file path or `path:line`.
    pub sources: BTreeMap<DocId, String>,
}

impl Corpus {
    pub fn from_texts<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut corpus = Self::default();
        for text in texts {
            corpus.push(text.into(), String::new());
        }
        corpus
    }

    /// Load `path`. A directory contributes every `*.txt` file beneath it,
    /// sorted by path; a file contributes every non-empty line.
    pub fn load<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let path = path.as_ref();
        let mut corpus = Self::default();
        if path.is_dir() {
            let mut files: Vec<PathBuf> = WalkDir::new(path)
                .into_iter()
                .filter_map(|e| e.ok())
                .map(|e| e.into_path())
                .filter(|p| p.is_file() && p.extension().and_then(|s| s.to_str()) == Some("txt"))
                .collect();
            files.sort();
            for file in files {
                let text = fs::read_to_string(&file)?;
                corpus.push(text, file.display().to_string());
            }
        } else {
            let content = fs::read_to_string(path)?;
            for (lineno, line) in content.lines().enumerate() {
                if line.trim().is_empty() { continue; }
                corpus.push(line.to_string(), format!("{}:{}", path.display(), lineno + 1));
            }
        }
        tracing::info!(path = %path.display(), num_docs = corpus.len(), "loaded corpus");
        Ok(corpus)
    }

    fn push(&mut self, text: String, source: String) {
        let id = self.texts.len() as DocId;
        self.texts.insert(id, text);
        self.sources.insert(id, source);
    }

    pub fn len(&self) -> usize {
        self.texts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.texts.is_empty()
    }

    pub fn text(&self, id: DocId) -> Option<&str> {
        self.texts.get(&id).map(String::as_str)
    }

    pub fn documents(&self, analyzer: Analyzer) -> Vec<Document> {
        self.texts
            .iter()
            .map(|(&id, text)| Document::analyzed(id, text, analyzer))
            .collect()
    }

    pub fn index(&self, analyzer: Analyzer) -> InvertedIndex {
        InvertedIndex::build_with(&self.texts, analyzer)
    }
}

/// Read records from tab-separated lines: `title<TAB>author<TAB>body`.
/// Lines with fewer than three columns leave the missing fields empty.
pub fn load_records<P: AsRef<Path>>(path: P) -> io::Result<Vec<Record>> {
    let content = fs::read_to_string(path)?;
    Ok(parse_records(&content))
}

pub fn parse_records(content: &str) -> Vec<Record> {
    content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .enumerate()
        .map(|(i, line)| {
            let mut cols = line.splitn(3, '\t');
            let mut next = || cols.next().unwrap_or("").trim().to_string();
            let title = next();
            let author = next();
            let body = next();
            Record { id: i as DocId, title, author, body }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn loads_lines_skipping_blanks() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("docs.txt");
        fs::write(&file, "cat dog\n\n  \nDog bird\n").unwrap();
        let corpus = Corpus::load(&file).unwrap();
        assert_eq!(corpus.len(), 2);
        assert_eq!(corpus.text(1), Some("Dog bird"));
        assert!(corpus.sources[&1].ends_with("docs.txt:4"));
        assert_eq!(corpus.index(Analyzer::Whitespace).doc_ids("dog"), vec![0, 1]);
    }

    #[test]
    fn loads_txt_files_from_directory_in_path_order() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("b.txt"), "second").unwrap();
        fs::write(dir.path().join("a.txt"), "first").unwrap();
        fs::write(dir.path().join("nested/c.txt"), "third").unwrap();
        fs::write(dir.path().join("notes.md"), "ignored").unwrap();
        let corpus = Corpus::load(dir.path()).unwrap();
        let texts: Vec<&str> = corpus.texts.values().map(String::as_str).collect();
        assert_eq!(texts, vec!["first", "second", "third"]);
    }

    #[test]
    fn missing_path_is_an_error() {
        assert!(Corpus::load("/definitely/not/here.txt").is_err());
    }

    #[test]
    fn parses_tab_separated_records() {
        let records = parse_records("IIR\tManning\tboolean retrieval\n\nSearch Engines\tCroft\n");
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].author, "Manning");
        assert_eq!(records[1].id, 1);
        assert_eq!(records[1].body, "");
    }
}
