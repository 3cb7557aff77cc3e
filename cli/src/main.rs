use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use ircore::boolean::BooleanQuery;
use ircore::config::{Bm25Params, PageRankConfig};
use ircore::corpus::{load_records, Corpus};
use ircore::huffman::{encode, CodingScheme};
use ircore::pagerank::{LinkGraph, PageRank};
use ircore::scoring::{rank, RankingModel, ScoredDoc};
use ircore::spelling::{levenshtein, SpellChecker};
use ircore::structural::{FieldIndex, FieldQuery};
use ircore::tokenizer::Analyzer;
use serde::Serialize;
use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "irlab")]
#[command(about = "Run the information-retrieval labs from the command line", long_about = None)]
struct Cli {
    /// Print results as JSON
    #[arg(long, global = true, default_value_t = false)]
    json: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the postings list of a term
    Postings {
        /// Corpus path (directory of .txt files, or one document per line)
        #[arg(long)]
        corpus: PathBuf,
        #[arg(long, default_value = "whitespace")]
        analyzer: Analyzer,
        term: String,
    },
    /// Evaluate a Boolean query such as "cat AND dog NOT mouse"
    Boolean {
        #[arg(long)]
        corpus: PathBuf,
        query: String,
    },
    /// Rank the corpus against a free-text query
    Rank {
        #[arg(long)]
        corpus: PathBuf,
        /// tfidf, bm25 or cosine
        #[arg(long, default_value = "bm25")]
        model: RankingModel,
        #[arg(long, default_value = "whitespace")]
        analyzer: Analyzer,
        #[arg(long, default_value_t = ircore::config::DEFAULT_BM25_K1)]
        k1: f64,
        #[arg(long, default_value_t = ircore::config::DEFAULT_BM25_B)]
        b: f64,
        /// Number of results to print
        #[arg(long, default_value_t = 10)]
        top: usize,
        query: String,
    },
    /// Levenshtein distance between two strings
    Distance { a: String, b: String },
    /// Check words against a dictionary file and suggest corrections
    Spell {
        /// Text file whose whitespace-separated tokens form the dictionary
        #[arg(long)]
        dictionary: PathBuf,
        text: String,
    },
    /// Run PageRank over a link graph given as "0>1,0>2,1>2"
    Pagerank {
        #[arg(long)]
        edges: String,
        /// Number of pages; defaults to the highest page index + 1
        #[arg(long)]
        pages: Option<usize>,
        #[arg(long, default_value_t = ircore::config::DEFAULT_DAMPING)]
        damping: f64,
        /// Take exactly this many steps instead of iterating to convergence
        #[arg(long)]
        steps: Option<usize>,
        #[arg(long, default_value_t = ircore::config::DEFAULT_TOLERANCE)]
        tolerance: f64,
        #[arg(long, default_value_t = ircore::config::DEFAULT_MAX_ITERATIONS)]
        max_iterations: usize,
    },
    /// Build a prefix-free code for a text and encode it
    Huffman {
        #[arg(long, default_value = "huffman")]
        scheme: CodingScheme,
        /// Decode these bits with the table built from TEXT instead of encoding
        #[arg(long)]
        decode: Option<String>,
        text: String,
    },
    /// Field-scoped search over tab-separated title/author/body records
    Fields {
        #[arg(long)]
        records: PathBuf,
        /// e.g. "title:retrieval author:manning"
        query: String,
    },
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).with_writer(std::io::stderr).init();
    let cli = Cli::parse();
    let json = cli.json;

    match cli.command {
        Commands::Postings { corpus, analyzer, term } => postings(&corpus, analyzer, &term, json),
        Commands::Boolean { corpus, query } => boolean(&corpus, &query, json),
        Commands::Rank { corpus, model, analyzer, k1, b, top, query } => {
            let params = Bm25Params::new(k1, b)?;
            rank_corpus(&corpus, model, analyzer, &params, top, &query, json)
        }
        Commands::Distance { a, b } => {
            let distance = levenshtein(&a, &b);
            emit(json, &json!({ "a": a, "b": b, "distance": distance }), || distance.to_string())
        }
        Commands::Spell { dictionary, text } => spell(&dictionary, &text, json),
        Commands::Pagerank { edges, pages, damping, steps, tolerance, max_iterations } => {
            let config = PageRankConfig { damping, tolerance, max_iterations };
            pagerank(&edges, pages, config, steps, json)
        }
        Commands::Huffman { scheme, decode, text } => huffman(&text, scheme, decode.as_deref(), json),
        Commands::Fields { records, query } => fields(&records, &query, json),
    }
}

fn emit<T: Serialize>(json: bool, value: &T, text: impl FnOnce() -> String) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        println!("{}", text());
    }
    Ok(())
}

fn load_corpus(path: &Path) -> Result<Corpus> {
    Corpus::load(path).with_context(|| format!("reading corpus {}", path.display()))
}

fn postings(path: &Path, analyzer: Analyzer, term: &str, json: bool) -> Result<()> {
    let corpus = load_corpus(path)?;
    let index = corpus.index(analyzer);
    let key = analyzer.analyze(term).into_iter().next().unwrap_or_default();
    let postings = index.postings(&key);
    emit(json, &json!({ "term": key, "postings": postings }), || {
        let entries: Vec<String> = postings.iter().map(|p| format!("{}:{}", p.doc_id, p.term_frequency)).collect();
        format!("{key} (df={}) -> [{}]", postings.len(), entries.join(", "))
    })
}

fn boolean(path: &Path, query: &str, json: bool) -> Result<()> {
    let corpus = load_corpus(path)?;
    let parsed = BooleanQuery::parse(query)?;
    let hits = parsed.evaluate(&corpus.index(Analyzer::Whitespace));
    tracing::info!(query, hits = hits.len(), "evaluated boolean query");
    emit(json, &json!({ "query": query, "doc_ids": hits }), || format!("{hits:?}"))
}

fn rank_corpus(
    path: &Path,
    model: RankingModel,
    analyzer: Analyzer,
    params: &Bm25Params,
    top: usize,
    query: &str,
    json: bool,
) -> Result<()> {
    let corpus = load_corpus(path)?;
    let docs = corpus.documents(analyzer);
    let terms = analyzer.analyze(query);
    let ranked: Vec<ScoredDoc> = rank(model, &terms, &docs, params).into_iter().take(top).collect();
    emit(json, &json!({ "query": query, "model": model, "results": ranked }), || {
        ranked
            .iter()
            .map(|hit| {
                let source = corpus.sources.get(&hit.doc_id).map(String::as_str).unwrap_or("");
                format!("{:>4}  {:.6}  {}", hit.doc_id, hit.score, source)
            })
            .collect::<Vec<_>>()
            .join("\n")
    })
}

fn spell(dictionary: &Path, text: &str, json: bool) -> Result<()> {
    let words = fs::read_to_string(dictionary).with_context(|| format!("reading dictionary {}", dictionary.display()))?;
    let checker = SpellChecker::from_text(&words);
    let corrections = checker.check(text);
    emit(json, &corrections, || {
        if corrections.is_empty() {
            return "no misspellings".to_string();
        }
        corrections
            .iter()
            .map(|c| {
                let options: Vec<&str> = c.suggestions.iter().map(|s| s.word.as_str()).collect();
                format!("{} -> {}", c.word, options.join(" | "))
            })
            .collect::<Vec<_>>()
            .join("\n")
    })
}

/// Parse `from>to` pairs separated by commas or whitespace.
fn parse_edges(edges: &str) -> Result<Vec<(usize, usize)>> {
    edges.split(|c: char| c == ',' || c.is_whitespace())
        .filter(|s| !s.is_empty())
        .map(|pair| -> Result<(usize, usize)> {
            let (from, to) = pair.split_once('>').ok_or_else(|| anyhow!("edge {pair:?} is not of the form FROM>TO"))?;
            Ok((from.trim().parse()?, to.trim().parse()?))
        })
        .collect()
}

fn pagerank(edges: &str, pages: Option<usize>, config: PageRankConfig, steps: Option<usize>, json: bool) -> Result<()> {
    let edges = parse_edges(edges)?;
    let pages = match pages {
        Some(n) => n,
        None => edges.iter().map(|&(a, b)| a.max(b) + 1).max().unwrap_or(0),
    };
    if pages == 0 {
        bail!("graph has no pages");
    }
    let graph = LinkGraph::from_edges(pages, &edges)?;
    let mut pr = PageRank::new(&graph, config)?;
    let (iterations, converged) = match steps {
        Some(n) => {
            for _ in 0..n {
                pr.step();
            }
            (n, None)
        }
        None => {
            let report = pr.run();
            (report.iterations, Some(report.converged))
        }
    };
    let total = pr.total();
    emit(
        json,
        &json!({ "iterations": iterations, "converged": converged, "total": total, "ranks": pr.ranks() }),
        || {
            let mut lines: Vec<String> = pr.ranks().iter().enumerate().map(|(i, r)| format!("{i:>4}  {r:.6}")).collect();
            lines.push(format!("sum = {total:.6} after {iterations} iterations"));
            lines.join("\n")
        },
    )
}

fn huffman(text: &str, scheme: CodingScheme, decode: Option<&str>, json: bool) -> Result<()> {
    let encoding = encode(text, scheme);
    if let Some(bits) = decode {
        let decoded = encoding.table.decode(bits)?;
        return emit(json, &json!({ "bits": bits, "text": decoded }), || decoded.clone());
    }
    emit(
        json,
        &json!({
            "codes": encoding.table,
            "bits": encoding.bits,
            "original_bits": encoding.original_bits(),
            "encoded_bits": encoding.encoded_bits(),
        }),
        || {
            let mut lines: Vec<String> = encoding
                .table
                .codes()
                .iter()
                .map(|(c, code)| format!("{c:?} x{}  {code}", encoding.frequencies[c]))
                .collect();
            lines.push(format!("{} ({} of {} bits)", encoding.bits, encoding.encoded_bits(), encoding.original_bits()));
            lines.join("\n")
        },
    )
}

fn fields(path: &Path, query: &str, json: bool) -> Result<()> {
    let records = load_records(path).with_context(|| format!("reading records {}", path.display()))?;
    let index = FieldIndex::build(&records);
    let hits = index.search(&FieldQuery::parse(query)?);
    emit(json, &json!({ "query": query, "doc_ids": hits }), || {
        hits.iter()
            .filter_map(|id| records.iter().find(|r| r.id == *id))
            .map(|r| format!("{:>4}  {} ({})", r.id, r.title, r.author))
            .collect::<Vec<_>>()
            .join("\n")
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_edge_lists() {
        assert_eq!(parse_edges("0>1, 0>2 1>2").unwrap(), vec![(0, 1), (0, 2), (1, 2)]);
        assert!(parse_edges("0-1").is_err());
        assert!(parse_edges("a>1").is_err());
        assert!(parse_edges("").unwrap().is_empty());
    }

    #[test]
    fn cli_parses_rank_flags() {
        let cli = Cli::try_parse_from(["irlab", "--json", "rank", "--corpus", "docs.txt", "--model", "tfidf", "cat dog"]).unwrap();
        assert!(cli.json);
        match cli.command {
            Commands::Rank { model, k1, query, .. } => {
                assert_eq!(model, RankingModel::TfIdf);
                assert_eq!(k1, ircore::config::DEFAULT_BM25_K1);
                assert_eq!(query, "cat dog");
            }
            _ => panic!("expected rank"),
        }
    }

    #[test]
    fn cli_rejects_unknown_scheme() {
        assert!(Cli::try_parse_from(["irlab", "huffman", "--scheme", "lzw", "abc"]).is_err());
    }
}
