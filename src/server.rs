//! Axum server setup, shared application state, and graceful shutdown.
//!
//! Contains [`AppState`] (the `Arc`-shared state holding the dispatch
//! table, request recorder, counters, and shutdown flag), [`MockServer`]
//! which owns the state together with the config watcher,
//! [`build_router`] for constructing the Axum router with middleware
//! layers, and [`shutdown_signal`] for SIGTERM / Ctrl+C handling.

use std::path::PathBuf;
use std::sync::atomic::AtomicU64;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tower::ServiceBuilder;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use crate::config::model::Config;
use crate::error::MockError;
use crate::handler;
use crate::recorder::RequestRecorder;
use crate::reload::Reloader;
use crate::routes::{DispatchTable, RouteTable};
use crate::watch::{FileWatcher, WatchOptions};

pub const DEFAULT_MAX_BODY: usize = 1_048_576;

#[derive(Debug)]
pub struct Stats {
    pub requests: AtomicU64,
    pub reloads: AtomicU64,
    pub render_failures: AtomicU64,
}

impl Default for Stats {
    fn default() -> Self {
        Self::new()
    }
}

impl Stats {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            requests: AtomicU64::new(0),
            reloads: AtomicU64::new(0),
            render_failures: AtomicU64::new(0),
        }
    }
}

#[derive(Debug)]
pub struct AppState {
    pub table: DispatchTable,
    pub recorder: RequestRecorder,
    pub stats: Stats,
    shutdown: tokio::sync::watch::Sender<bool>,
}

impl AppState {
    #[must_use]
    pub fn new(table: RouteTable) -> Self {
        Self {
            table: DispatchTable::new(table),
            recorder: RequestRecorder::new(),
            stats: Stats::new(),
            shutdown: tokio::sync::watch::channel(false).0,
        }
    }

    /// Abort every simulated delay in flight and any that start later.
    pub fn begin_shutdown(&self) {
        self.shutdown.send_replace(true);
    }

    /// Resolves once [`AppState::begin_shutdown`] has been called.
    pub fn shutting_down(&self) -> impl std::future::Future<Output = ()> + Send + 'static {
        let mut rx = self.shutdown.subscribe();
        async move {
            let _ = rx.wait_for(|stopping| *stopping).await;
        }
    }
}

/// The mock server core: shared state plus the watcher keeping its route
/// table in sync with the config file.
pub struct MockServer {
    state: Arc<AppState>,
    watcher: Option<FileWatcher>,
    config_path: PathBuf,
    reload_interval: Duration,
    addr: String,
    baseline: Option<String>,
}

impl MockServer {
    /// Build the initial route table. No I/O happens here.
    pub fn new(config: &Config) -> Result<Self, MockError> {
        let table = RouteTable::build(config)?;
        Ok(Self {
            state: Arc::new(AppState::new(table)),
            watcher: None,
            config_path: config.path.clone(),
            reload_interval: config.reload_interval(),
            addr: config.addr.clone(),
            baseline: config.fingerprint.clone(),
        })
    }

    /// Start polling the config file and hot-swap the route table on change.
    /// Changes are measured against the content the table was built from,
    /// so an edit landing before the watcher starts is still picked up.
    pub async fn watch_config(&mut self) -> Result<(), MockError> {
        if self.watcher.is_some() {
            return Ok(());
        }
        let reloader = Reloader::new(
            self.config_path.clone(),
            Arc::clone(&self.state),
            self.addr.clone(),
        );
        let options = WatchOptions {
            path: self.config_path.clone(),
            interval: self.reload_interval,
        };
        let watcher = match &self.baseline {
            Some(baseline) => FileWatcher::start_from(options, baseline.clone(), reloader),
            None => FileWatcher::start(options, reloader).await?,
        };
        self.watcher = Some(watcher);
        Ok(())
    }

    #[must_use]
    pub const fn state(&self) -> &Arc<AppState> {
        &self.state
    }

    pub fn router(&self, max_body: usize) -> Router {
        build_router(Arc::clone(&self.state), max_body)
    }

    /// Stop the watcher, abort pending delays, and flush the request logs.
    pub async fn shutdown(mut self) -> Result<(), MockError> {
        self.state.begin_shutdown();
        if let Some(watcher) = self.watcher.take() {
            watcher.stop().await;
        }
        let open = self.state.recorder.open_files().await;
        tracing::info!(files = open, "closing request logs");
        self.state.recorder.close().await
    }
}

pub fn build_router(state: Arc<AppState>, max_body: usize) -> Router {
    Router::new()
        .fallback(handler::mock_handler)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(RequestBodyLimitLayer::new(max_body)),
        )
        .with_state(state)
}

pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("received Ctrl+C"),
        () = terminate => tracing::info!("received SIGTERM"),
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    use super::*;
    use crate::config::model::Route;

    fn state() -> Arc<AppState> {
        let config: Config = serde_json::from_str("{}").unwrap();
        let config = Config {
            routes: vec![
                Route::new("POST /upload"),
                Route::new("/ping"),
                Route {
                    body: "pong".into(),
                    ..Route::new("GET /pong")
                },
            ],
            ..config
        }
        .apply_defaults(Path::new("test.yaml"));
        Arc::new(AppState::new(RouteTable::build(&config).unwrap()))
    }

    #[tokio::test]
    async fn method_less_route_answers_any_method() {
        let router = build_router(state(), DEFAULT_MAX_BODY);
        let resp = router
            .oneshot(
                Request::builder()
                    .method("PUT")
                    .uri("/ping")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn head_gets_get_headers_without_body() {
        let router = build_router(state(), DEFAULT_MAX_BODY);
        let resp = router
            .oneshot(
                Request::builder()
                    .method("HEAD")
                    .uri("/pong")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()["content-type"], "application/json");
        assert_eq!(resp.headers()["content-length"], "4");
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn shutdown_closes_request_logs() {
        let dir = tempfile::tempdir().unwrap();
        let config: Config = serde_json::from_str("{}").unwrap();
        let config = Config {
            record_dir: dir.path().display().to_string(),
            routes: vec![Route {
                record: true,
                ..Route::new("POST /upload")
            }],
            ..config
        }
        .apply_defaults(Path::new("test.yaml"));
        let mock = MockServer::new(&config).unwrap();
        let state = Arc::clone(mock.state());

        mock.router(DEFAULT_MAX_BODY)
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/upload")
                    .body(Body::from("x"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(state.recorder.open_files().await, 1);

        mock.shutdown().await.unwrap();
        assert_eq!(state.recorder.open_files().await, 0);
    }

    #[tokio::test]
    async fn oversized_body_is_rejected() {
        let router = build_router(state(), 16);
        let resp = router
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/upload")
                    .header("content-length", "64")
                    .body(Body::from(vec![b'x'; 64]))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn begin_shutdown_releases_waiters() {
        let state = state();
        let waiter = tokio::spawn(state.shutting_down());
        state.begin_shutdown();
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn requests_are_counted() {
        let state = state();
        let router = build_router(Arc::clone(&state), DEFAULT_MAX_BODY);
        router
            .oneshot(Request::builder().uri("/nothing").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(state.stats.requests.load(std::sync::atomic::Ordering::Relaxed), 1);
    }
}
