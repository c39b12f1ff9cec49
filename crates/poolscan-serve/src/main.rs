//! poolscan - multi-pool Monero "blocks found" aggregator.
//!
//! Without `--serve` this runs one scan: load the snapshot, refresh every
//! pool down to its previous top (or the height floor on a first run), and
//! rewrite the snapshot from the merged timeline. With `--serve` it keeps
//! refreshing on a timer and exposes the timeline over HTTP.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::http::Request;
use clap::Parser;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use poolscan_core::{snapshot, SharedState};
use poolscan_ingest::{default_sources, refresh_all};
use poolscan_serve::{background_refresh, router, AppState};

/// Aggregates found blocks across Monero mining pools.
#[derive(Parser, Debug)]
#[command(name = "poolscan")]
#[command(about = "Multi-pool Monero blocks-found aggregator", long_about = None)]
struct Args {
    /// Height floor for a first-ever scan with no snapshot.
    #[arg(long, env = "POOLSCAN_HEIGHT", default_value_t = 2_688_888)]
    height: u64,

    /// Snapshot CSV path.
    #[arg(long, env = "POOLSCAN_OUTPUT", default_value = "blocks.csv")]
    output: PathBuf,

    /// Exclude orphaned blocks from the written snapshot.
    #[arg(long)]
    only_valid: bool,

    /// Run the HTTP API instead of a one-shot scan.
    #[arg(long)]
    serve: bool,

    /// Bind address for serve mode.
    #[arg(long, env = "POOLSCAN_LISTEN", default_value = "0.0.0.0:8080")]
    listen: String,

    /// TLS certificate path (PEM).
    #[arg(long, env = "POOLSCAN_TLS_CERT", requires = "tls_key")]
    tls_cert: Option<PathBuf>,

    /// TLS private key path (PEM).
    #[arg(long, env = "POOLSCAN_TLS_KEY", requires = "tls_cert")]
    tls_key: Option<PathBuf>,

    /// Seconds between background refresh cycles in serve mode.
    #[arg(long, env = "POOLSCAN_REFRESH_SECS", default_value_t = 600)]
    refresh_secs: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let sources = default_sources().context("building the source fleet")?;
    let names: Vec<String> = sources.iter().map(|s| s.name().to_string()).collect();
    let state = Arc::new(SharedState::new(names));

    // Resume from the previous run's snapshot, if there is one.
    let buckets = snapshot::load(&args.output, state.names())
        .with_context(|| format!("loading snapshot {}", args.output.display()))?;
    for (index, blocks) in buckets.into_iter().enumerate() {
        state.seed(index, blocks);
    }
    tracing::info!(
        blocks = state.read_view().total_blocks(),
        "stores seeded"
    );

    if !args.serve {
        refresh_all(&sources, &state, args.height).await;
        let timeline = state.read_view().export();
        snapshot::write(&args.output, &timeline, args.only_valid)
            .with_context(|| format!("writing snapshot {}", args.output.display()))?;
        tracing::info!(
            entries = timeline.len(),
            path = %args.output.display(),
            "snapshot written"
        );
        return Ok(());
    }

    tokio::spawn(background_refresh(
        sources,
        Arc::clone(&state),
        args.height,
        Duration::from_secs(args.refresh_secs),
    ));

    // Build router with middleware
    let app = router(AppState::new(Arc::clone(&state)))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<_>| {
                tracing::span!(
                    Level::INFO,
                    "http_request",
                    method = %request.method(),
                    path = %request.uri().path(),
                    query = request.uri().query().unwrap_or("")
                )
            }),
        )
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );

    let addr: std::net::SocketAddr = args
        .listen
        .parse()
        .with_context(|| format!("parsing listen address {}", args.listen))?;

    match (args.tls_cert, args.tls_key) {
        (Some(cert), Some(key)) => {
            let tls = axum_server::tls_rustls::RustlsConfig::from_pem_file(&cert, &key)
                .await
                .context("loading TLS certificate")?;
            tracing::info!(addr = %addr, "starting server (TLS)");
            axum_server::bind_rustls(addr, tls)
                .serve(app.into_make_service())
                .await?;
        }
        _ => {
            let listener = tokio::net::TcpListener::bind(addr).await?;
            tracing::info!(addr = %addr, "starting server");
            axum::serve(listener, app).await?;
        }
    }

    Ok(())
}
