use anyhow::Result;
use axum::Router;
use clap::Parser;
use ircore::config::{Bm25Params, DEFAULT_BM25_B, DEFAULT_BM25_K1};
use ircore::tokenizer::Analyzer;
use server::{build_app, ServerConfig};
use std::net::SocketAddr;
use std::path::PathBuf;
use tokio::net::TcpListener;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
struct Args {
    /// Corpus served by /search (directory of .txt files, or one document per line)
    #[arg(long)]
    corpus: Option<PathBuf>,
    /// whitespace or stemmed
    #[arg(long, default_value = "whitespace")]
    analyzer: Analyzer,
    #[arg(long, default_value_t = DEFAULT_BM25_K1)]
    k1: f64,
    #[arg(long, default_value_t = DEFAULT_BM25_B)]
    b: f64,
    /// Host to bind
    #[arg(long, default_value = "0.0.0.0")]
    host: String,
    /// Port to bind
    #[arg(long, default_value_t = 8080)]
    port: u16,
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Args::parse();
    let config = ServerConfig { corpus: args.corpus, analyzer: args.analyzer, bm25: Bm25Params::new(args.k1, args.b)? };
    let app: Router = build_app(config)?;

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "server listening");
    axum::serve(listener, app).await?;
    Ok(())
}
