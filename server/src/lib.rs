use anyhow::{Context, Result};
use axum::{extract::{Path, Query, State}, http::StatusCode, routing::{get, post}, Json, Router};
use ircore::boolean::{merge, BooleanOp, BooleanQuery};
use ircore::config::{Bm25Params, PageRankConfig};
use ircore::corpus::Corpus;
use ircore::huffman::{encode, CodeTable, CodingScheme};
use ircore::pagerank::{LinkGraph, PageRank};
use ircore::scoring::{bm25, rank, tfidf, sort_by_score, RankingModel, ScoredDoc};
use ircore::spelling::{levenshtein, Correction, SpellChecker};
use ircore::structural::{FieldIndex, FieldQuery, Record};
use ircore::tokenizer::Analyzer;
use ircore::{documents_from_texts, DocId, Document, InvertedIndex, Posting};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Display;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer, AllowOrigin};
use tower_http::trace::TraceLayer;

type ApiError = (StatusCode, String);

fn bad_request(err: impl Display) -> ApiError {
    (StatusCode::BAD_REQUEST, err.to_string())
}

#[derive(Debug, Clone, Default)]
pub struct ServerConfig {
    /// Corpus served by `/search`; the labs endpoints work without one.
    pub corpus: Option<PathBuf>,
    pub analyzer: Analyzer,
    pub bm25: Bm25Params,
}

#[derive(Clone)]
pub struct AppState {
    pub corpus: Arc<Corpus>,
    pub docs: Arc<Vec<Document>>,
    pub index: Arc<InvertedIndex>,
    pub analyzer: Analyzer,
    pub bm25: Bm25Params,
}

impl AppState {
    pub fn new(corpus: Corpus, analyzer: Analyzer, bm25: Bm25Params) -> Self {
        let docs = corpus.documents(analyzer);
        let index = corpus.index(analyzer);
        Self { corpus: Arc::new(corpus), docs: Arc::new(docs), index: Arc::new(index), analyzer, bm25 }
    }
}

pub fn build_app(config: ServerConfig) -> Result<Router> {
    config.bm25.validate()?;
    let corpus = match &config.corpus {
        Some(path) => Corpus::load(path).with_context(|| format!("loading corpus {}", path.display()))?,
        None => Corpus::default(),
    };
    let app_state = AppState::new(corpus, config.analyzer, config.bm25);
    tracing::info!(num_docs = app_state.docs.len(), num_terms = app_state.index.num_terms(), "corpus ready");

    // CORS: read CORS_ALLOW_ORIGIN (comma-separated) or allow Any by default
    let cors = match std::env::var("CORS_ALLOW_ORIGIN") {
        Ok(val) => {
            let origins: Vec<_> = val
                .split(',')
                .filter_map(|s| s.trim().parse().ok())
                .collect();
            if origins.is_empty() {
                CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)
            } else {
                CorsLayer::new().allow_origin(AllowOrigin::list(origins)).allow_methods(Any).allow_headers(Any)
            }
        }
        Err(_) => CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any),
    };

    let app = Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/search", get(search_handler))
        .route("/doc/:doc_id", get(doc_handler))
        .route("/postings/:term", get(postings_handler))
        .route("/boolean", get(boolean_handler))
        .route("/labs/merge", post(merge_lab))
        .route("/labs/tfidf", post(tfidf_lab))
        .route("/labs/bm25", post(bm25_lab))
        .route("/labs/levenshtein", post(levenshtein_lab))
        .route("/labs/spell", post(spell_lab))
        .route("/labs/pagerank/step", post(pagerank_step_lab))
        .route("/labs/pagerank/run", post(pagerank_run_lab))
        .route("/labs/huffman", post(huffman_lab))
        .route("/labs/huffman/decode", post(huffman_decode_lab))
        .route("/labs/fields", post(fields_lab))
        .with_state(app_state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());
    Ok(app)
}

// --- Search over the loaded corpus ---

#[derive(Deserialize)]
pub struct SearchParams {
    pub q: String,
    #[serde(default = "default_k")]
    pub k: usize,
    #[serde(default)]
    pub model: RankingModel,
}
fn default_k() -> usize { 10 }

#[derive(Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub model: RankingModel,
    pub took_s: f64,
    pub total_hits: usize,
    pub results: Vec<SearchHit>,
}

#[derive(Serialize)]
pub struct SearchHit {
    pub doc_id: DocId,
    pub score: f64,
    pub source: Option<String>,
    pub snippet: Option<String>,
}

pub async fn search_handler(State(state): State<AppState>, Query(params): Query<SearchParams>) -> Json<SearchResponse> {
    let start = std::time::Instant::now();
    let terms = state.analyzer.analyze(&params.q);
    let scored: Vec<ScoredDoc> = rank(params.model, &terms, &state.docs, &state.bm25)
        .into_iter()
        .filter(|s| s.score > 0.0)
        .collect();
    let total_hits = scored.len();
    let k = params.k.clamp(1, 100);

    let raw_terms: Vec<String> = params.q.split_whitespace().map(str::to_string).collect();
    let results = scored
        .into_iter()
        .take(k)
        .map(|s| SearchHit {
            doc_id: s.doc_id,
            score: s.score,
            source: state.corpus.sources.get(&s.doc_id).filter(|src| !src.is_empty()).cloned(),
            snippet: state.corpus.text(s.doc_id).and_then(|text| snippet(text, &raw_terms)),
        })
        .collect();

    let elapsed = start.elapsed();
    Json(SearchResponse { query: params.q, model: params.model, took_s: elapsed.as_secs_f64(), total_hits, results })
}

pub async fn doc_handler(State(state): State<AppState>, Path(doc_id): Path<DocId>) -> Result<Json<serde_json::Value>, ApiError> {
    let text = state.corpus.text(doc_id).ok_or((StatusCode::NOT_FOUND, "not found".to_string()))?;
    Ok(Json(serde_json::json!({
        "doc_id": doc_id,
        "source": state.corpus.sources.get(&doc_id),
        "length": state.index.doc_length(doc_id),
        "text": text,
    })))
}

fn case_insensitive(term: &str) -> Option<regex::Regex> {
    regex::RegexBuilder::new(&regex::escape(term)).case_insensitive(true).build().ok()
}

fn snippet(text: &str, raw_terms: &[String]) -> Option<String> {
    if text.is_empty() { return None; }
    // find first match (case-insensitive) of any raw term
    let first_idx = raw_terms
        .iter()
        .filter(|t| !t.trim().is_empty())
        .find_map(|t| case_insensitive(t)?.find(text).map(|m| m.start()));
    let snippet = match first_idx {
        Some(idx) => {
            let mut start = idx.saturating_sub(100);
            while !text.is_char_boundary(start) { start -= 1; }
            let mut end = (idx + 200).min(text.len());
            while !text.is_char_boundary(end) { end += 1; }
            &text[start..end]
        }
        None => {
            let end = text.char_indices().nth(200).map_or(text.len(), |(i, _)| i);
            &text[..end]
        }
    };
    Some(highlight_terms(snippet, raw_terms))
}

fn highlight_terms(snippet: &str, terms: &[String]) -> String {
    // One pass over the snippet so inserted tags are never matched again.
    let mut terms: Vec<&str> = terms.iter().map(|t| t.trim()).filter(|t| !t.is_empty()).collect();
    if terms.is_empty() { return snippet.to_string(); }
    terms.sort_by_key(|t| std::cmp::Reverse(t.len()));
    let alternation = terms.iter().map(|t| regex::escape(t)).collect::<Vec<_>>().join("|");
    match regex::RegexBuilder::new(&alternation).case_insensitive(true).build() {
        Ok(pat) => pat.replace_all(snippet, |caps: &regex::Captures| format!("<em>{}</em>", &caps[0])).into_owned(),
        Err(_) => snippet.to_string(),
    }
}

#[derive(Serialize)]
pub struct PostingsResponse {
    pub term: String,
    pub document_frequency: usize,
    pub postings: Vec<Posting>,
}

pub async fn postings_handler(State(state): State<AppState>, Path(term): Path<String>) -> Json<PostingsResponse> {
    let term = state.analyzer.analyze(&term).into_iter().next().unwrap_or_default();
    let postings = state.index.postings(&term).to_vec();
    Json(PostingsResponse { term, document_frequency: postings.len(), postings })
}

#[derive(Deserialize)]
pub struct BooleanParams {
    pub q: String,
}

#[derive(Serialize, Deserialize)]
pub struct DocIdsResponse {
    pub doc_ids: Vec<DocId>,
}

pub async fn boolean_handler(State(state): State<AppState>, Query(params): Query<BooleanParams>) -> Result<Json<DocIdsResponse>, ApiError> {
    let query = BooleanQuery::parse(&params.q).map_err(bad_request)?;
    Ok(Json(DocIdsResponse { doc_ids: query.evaluate_with(&state.index, state.analyzer) }))
}

// --- Stateless labs: every input arrives in the request body ---

#[derive(Deserialize)]
pub struct MergeRequest {
    pub op: BooleanOp,
    pub a: Vec<DocId>,
    pub b: Vec<DocId>,
}

fn check_ascending(name: &str, ids: &[DocId]) -> Result<(), ApiError> {
    if ids.windows(2).all(|w| w[0] < w[1]) {
        Ok(())
    } else {
        Err(bad_request(format!("postings list {name} must be strictly ascending")))
    }
}

pub async fn merge_lab(Json(req): Json<MergeRequest>) -> Result<Json<DocIdsResponse>, ApiError> {
    check_ascending("a", &req.a)?;
    check_ascending("b", &req.b)?;
    Ok(Json(DocIdsResponse { doc_ids: merge(req.op, &req.a, &req.b) }))
}

#[derive(Deserialize)]
pub struct RankRequest {
    pub query: String,
    pub documents: Vec<String>,
    /// Cosine-normalized log-tf weighting instead of the plain tf/|d| × idf sum.
    #[serde(default)]
    pub cosine: bool,
    pub k1: Option<f64>,
    pub b: Option<f64>,
}

#[derive(Serialize, Deserialize)]
pub struct RankResponse {
    /// Scores in document order.
    pub scores: Vec<ScoredDoc>,
    /// The same scores, best first.
    pub ranking: Vec<ScoredDoc>,
}

impl RankResponse {
    fn from_scores(scores: Vec<ScoredDoc>) -> Self {
        let ranking = sort_by_score(scores.clone());
        Self { scores, ranking }
    }
}

fn request_docs(req: &RankRequest) -> (Vec<String>, Vec<Document>) {
    (ircore::tokenizer::tokenize(&req.query), documents_from_texts(&req.documents))
}

pub async fn tfidf_lab(Json(req): Json<RankRequest>) -> Json<RankResponse> {
    let (query, docs) = request_docs(&req);
    let scores = if req.cosine { tfidf::cosine_scores(&query, &docs) } else { tfidf::tfidf_scores(&query, &docs) };
    Json(RankResponse::from_scores(scores))
}

pub async fn bm25_lab(Json(req): Json<RankRequest>) -> Result<Json<RankResponse>, ApiError> {
    let defaults = Bm25Params::default();
    let params = Bm25Params::new(req.k1.unwrap_or(defaults.k1), req.b.unwrap_or(defaults.b)).map_err(bad_request)?;
    let (query, docs) = request_docs(&req);
    Ok(Json(RankResponse::from_scores(bm25::bm25_scores(&query, &docs, &params))))
}

#[derive(Deserialize)]
pub struct LevenshteinRequest {
    pub a: String,
    pub b: String,
}

#[derive(Serialize, Deserialize)]
pub struct LevenshteinResponse {
    pub distance: usize,
}

pub async fn levenshtein_lab(Json(req): Json<LevenshteinRequest>) -> Json<LevenshteinResponse> {
    Json(LevenshteinResponse { distance: levenshtein(&req.a, &req.b) })
}

#[derive(Deserialize)]
pub struct SpellRequest {
    pub text: String,
    pub dictionary: Vec<String>,
}

#[derive(Serialize, Deserialize)]
pub struct SpellResponse {
    pub corrections: Vec<Correction>,
}

pub async fn spell_lab(Json(req): Json<SpellRequest>) -> Json<SpellResponse> {
    let checker = SpellChecker::new(&req.dictionary);
    Json(SpellResponse { corrections: checker.check(&req.text) })
}

#[derive(Deserialize)]
pub struct PageRankRequest {
    pub adjacency: Vec<Vec<u8>>,
    /// Starting ranks; uniform when omitted.
    pub ranks: Option<Vec<f64>>,
    pub damping: Option<f64>,
    pub tolerance: Option<f64>,
    pub max_iterations: Option<usize>,
    /// Steps taken by `/labs/pagerank/step`.
    #[serde(default = "default_steps")]
    pub steps: usize,
}
fn default_steps() -> usize { 1 }

/// Upper bound on `steps` and `max_iterations` accepted from a request.
pub const MAX_PAGERANK_ITERATIONS: usize = 10_000;

#[derive(Serialize, Deserialize)]
pub struct PageRankResponse {
    pub ranks: Vec<f64>,
    pub total: f64,
    pub iterations: usize,
    pub last_change: f64,
    pub converged: Option<bool>,
}

impl PageRankRequest {
    fn config(&self) -> PageRankConfig {
        let defaults = PageRankConfig::default();
        PageRankConfig {
            damping: self.damping.unwrap_or(defaults.damping),
            tolerance: self.tolerance.unwrap_or(defaults.tolerance),
            max_iterations: self.max_iterations.unwrap_or(defaults.max_iterations),
        }
    }
}

fn pagerank_session<'g>(req: &PageRankRequest, graph: &'g LinkGraph) -> Result<PageRank<'g>, ApiError> {
    if req.steps > MAX_PAGERANK_ITERATIONS {
        return Err(bad_request(format!("steps must be at most {MAX_PAGERANK_ITERATIONS}")));
    }
    let config = req.config();
    if config.max_iterations > MAX_PAGERANK_ITERATIONS {
        return Err(bad_request(format!("max_iterations must be at most {MAX_PAGERANK_ITERATIONS}")));
    }
    let session = match &req.ranks {
        Some(ranks) => PageRank::with_ranks(graph, config, ranks.clone()),
        None => PageRank::new(graph, config),
    };
    session.map_err(bad_request)
}

pub async fn pagerank_step_lab(Json(req): Json<PageRankRequest>) -> Result<Json<PageRankResponse>, ApiError> {
    let graph = LinkGraph::from_adjacency(&req.adjacency).map_err(bad_request)?;
    let mut pr = pagerank_session(&req, &graph)?;
    let mut last_change = 0.0;
    for _ in 0..req.steps {
        last_change = pr.step();
    }
    Ok(Json(PageRankResponse {
        total: pr.total(),
        iterations: pr.iteration(),
        last_change,
        converged: None,
        ranks: pr.into_ranks(),
    }))
}

pub async fn pagerank_run_lab(Json(req): Json<PageRankRequest>) -> Result<Json<PageRankResponse>, ApiError> {
    let graph = LinkGraph::from_adjacency(&req.adjacency).map_err(bad_request)?;
    let mut pr = pagerank_session(&req, &graph)?;
    let report = pr.run();
    Ok(Json(PageRankResponse {
        total: pr.total(),
        iterations: report.iterations,
        last_change: report.last_change,
        converged: Some(report.converged),
        ranks: pr.into_ranks(),
    }))
}

#[derive(Deserialize)]
pub struct HuffmanRequest {
    pub text: String,
    #[serde(default)]
    pub scheme: CodingScheme,
}

#[derive(Serialize, Deserialize)]
pub struct HuffmanResponse {
    pub frequencies: BTreeMap<char, usize>,
    pub codes: CodeTable,
    pub bits: String,
    pub original_bits: usize,
    pub encoded_bits: usize,
}

pub async fn huffman_lab(Json(req): Json<HuffmanRequest>) -> Json<HuffmanResponse> {
    let encoding = encode(&req.text, req.scheme);
    let original_bits = encoding.original_bits();
    let encoded_bits = encoding.encoded_bits();
    Json(HuffmanResponse {
        frequencies: encoding.frequencies,
        codes: encoding.table,
        bits: encoding.bits,
        original_bits,
        encoded_bits,
    })
}

#[derive(Deserialize)]
pub struct DecodeRequest {
    pub codes: BTreeMap<char, String>,
    pub bits: String,
}

#[derive(Serialize, Deserialize)]
pub struct DecodeResponse {
    pub text: String,
}

pub async fn huffman_decode_lab(Json(req): Json<DecodeRequest>) -> Result<Json<DecodeResponse>, ApiError> {
    let table = CodeTable::from_codes(req.codes).map_err(bad_request)?;
    let text = table.decode(&req.bits).map_err(bad_request)?;
    Ok(Json(DecodeResponse { text }))
}

#[derive(Deserialize)]
pub struct FieldsRequest {
    pub records: Vec<Record>,
    pub query: String,
}

pub async fn fields_lab(Json(req): Json<FieldsRequest>) -> Result<Json<DocIdsResponse>, ApiError> {
    let query = FieldQuery::parse(&req.query).map_err(bad_request)?;
    let index = FieldIndex::build(&req.records);
    Ok(Json(DocIdsResponse { doc_ids: index.search(&query) }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snippet_highlights_case_insensitively() {
        let s = snippet("Rust is great. rust systems.", &["RUST".to_string()]).unwrap();
        assert_eq!(s, "<em>Rust</em> is great. <em>rust</em> systems.");
    }

    #[test]
    fn snippet_respects_char_boundaries() {
        let text = format!("{}target{}", "é".repeat(120), "ü".repeat(150));
        let s = snippet(&text, &["target".to_string()]).unwrap();
        assert!(s.contains("<em>target</em>"));
    }

    #[test]
    fn snippet_without_match_takes_prefix() {
        let text = "x".repeat(500);
        assert_eq!(snippet(&text, &["nope".to_string()]).unwrap().len(), 200);
        assert!(snippet("", &["x".to_string()]).is_none());
    }

    #[test]
    fn highlighting_never_rewrites_inserted_tags() {
        let terms = vec!["rust".to_string(), "em".to_string()];
        assert_eq!(highlight_terms("Rust em", &terms), "<em>Rust</em> <em>em</em>");
        let terms = vec!["em".to_string(), "them".to_string()];
        assert_eq!(highlight_terms("them em", &terms), "<em>them</em> <em>em</em>");
        assert_eq!(highlight_terms("plain", &[" ".to_string()]), "plain");
    }

    #[test]
    fn ascending_check() {
        assert!(check_ascending("a", &[1, 2, 5]).is_ok());
        assert!(check_ascending("a", &[]).is_ok());
        assert_eq!(check_ascending("a", &[2, 2]).unwrap_err().0, StatusCode::BAD_REQUEST);
    }
}
