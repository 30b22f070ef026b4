//! Static-file HTTP server for the browser UI.
//!
//! An axum [`Router`] whose fallback is a [`ServeDir`] rooted at the
//! configured directory, wrapped in a permissive CORS layer and request
//! tracing.  Each accepted connection is served by hyper's HTTP/1 connection
//! builder with keep-alive off and a bounded header read, so idle clients
//! are dropped instead of holding a task forever.
//!
//! The UI talks to the command channel directly; this server never touches
//! the command registry.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use anyhow::Context;
use axum::http::{header, Method};
use axum::Router;
use hyper::server::conn::http1;
use hyper_util::rt::{TokioIo, TokioTimer};
use hyper_util::service::TowerToHyperService;
use tokio::net::TcpListener;
use tokio::time::timeout;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::{debug, error, info, warn, Level};

const ACCEPT_POLL_INTERVAL: Duration = Duration::from_millis(200);

/// How long a client may take to send a complete request head.
pub const HEADER_READ_TIMEOUT: Duration = Duration::from_secs(10);

/// Builds the request router for files under `root`.
///
/// `/` serves `index.html`.  Percent-encoded paths are decoded; any path
/// with a `..` component is a 404.  Methods other than `GET` and `HEAD`
/// get 405, except CORS preflight `OPTIONS`, which the CORS layer answers.
pub fn router(root: &Path) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .fallback_service(ServeDir::new(root))
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
}

fn connection_builder(header_timeout: Duration) -> http1::Builder {
    let mut builder = http1::Builder::new();
    builder
        .timer(TokioTimer::new())
        .header_read_timeout(header_timeout)
        .keep_alive(false);
    builder
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Binds `addr` and serves files from `root` until `running` is cleared.
///
/// # Errors
///
/// Returns an error if the TCP listener cannot be bound.
pub async fn run_static_server(
    addr: SocketAddr,
    root: PathBuf,
    running: Arc<AtomicBool>,
) -> anyhow::Result<()> {
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind HTTP listener on {addr}"))?;

    if !root.is_dir() {
        warn!("static root {} is not a directory; every request will 404", root.display());
    }
    info!("static file server listening on {addr}, serving {}", root.display());
    serve_static(listener, root, running).await;
    Ok(())
}

/// Runs the accept loop on an already-bound listener.
pub async fn serve_static(listener: TcpListener, root: PathBuf, running: Arc<AtomicBool>) {
    serve_static_with_timeout(listener, root, running, HEADER_READ_TIMEOUT).await;
}

/// [`serve_static`] with an explicit request-head deadline.
pub async fn serve_static_with_timeout(
    listener: TcpListener,
    root: PathBuf,
    running: Arc<AtomicBool>,
    header_timeout: Duration,
) {
    let app = router(&root);
    loop {
        if !running.load(Ordering::Relaxed) {
            info!("shutdown flag set; stopping HTTP accept loop");
            break;
        }

        match timeout(ACCEPT_POLL_INTERVAL, listener.accept()).await {
            Ok(Ok((stream, peer_addr))) => {
                info!("http connection from {peer_addr}");
                let service = TowerToHyperService::new(app.clone());
                tokio::spawn(async move {
                    let served = connection_builder(header_timeout)
                        .serve_connection(TokioIo::new(stream), service)
                        .await;
                    if let Err(e) = served {
                        debug!("http {peer_addr}: {e}");
                    }
                });
            }
            Ok(Err(e)) => error!("accept error: {e}"),
            Err(_) => {}
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
