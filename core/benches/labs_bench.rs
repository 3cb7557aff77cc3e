use criterion::{criterion_group, criterion_main, Criterion};
use ircore::config::PageRankConfig;
use ircore::huffman::{encode, CodingScheme};
use ircore::pagerank::{LinkGraph, PageRank};
use ircore::spelling::levenshtein;
use ircore::tokenizer::{stem_tokens, tokenize};

const TEXT: &str = "Information retrieval is finding material of an unstructured nature \
    that satisfies an information need from within large collections stored on computers. \
    Running queries against an inverted index keeps retrieval fast.";

fn bench_tokenize(c: &mut Criterion) {
    c.bench_function("tokenize_whitespace", |b| b.iter(|| tokenize(TEXT)));
    c.bench_function("tokenize_stemmed", |b| b.iter(|| stem_tokens(TEXT)));
}

fn bench_levenshtein(c: &mut Criterion) {
    c.bench_function("levenshtein_words", |b| b.iter(|| levenshtein("retrieval", "retreival")));
}

fn bench_pagerank(c: &mut Criterion) {
    let edges: Vec<(usize, usize)> = (0..64).flat_map(|i| [(i, (i + 1) % 64), (i, (i * 7) % 64)]).collect();
    let graph = LinkGraph::from_edges(64, &edges).expect("valid edges");
    c.bench_function("pagerank_run_64", |b| {
        b.iter(|| PageRank::new(&graph, PageRankConfig::default()).expect("valid config").run())
    });
}

fn bench_huffman(c: &mut Criterion) {
    c.bench_function("huffman_encode", |b| b.iter(|| encode(TEXT, CodingScheme::Huffman)));
}

criterion_group!(benches, bench_tokenize, bench_levenshtein, bench_pagerank, bench_huffman);
criterion_main!(benches);
