//! `mockroute run` — start the mock server.
//!
//! Loads the config file, builds the initial route table, starts the
//! config watcher for live reloads, and serves until SIGTERM / Ctrl+C.
//! On shutdown, pending simulated delays are aborted and every open
//! request log is flushed and closed.

use std::net::SocketAddr;

use crate::cli::RunArgs;
use crate::config::model::parse_listen_addr;
use crate::config::{self, sources::FileSource};
use crate::error::MockError;
use crate::logging;
use crate::server::{self, MockServer};

pub async fn execute(args: RunArgs) -> Result<(), MockError> {
    let log_format = logging::resolve_format(args.pretty, args.json);
    logging::init(&args.log_level, log_format);

    let path = config::resolve_path(args.config.as_deref()).await?;
    let config = FileSource::new(&path).load().await?;

    let addr: SocketAddr = match args.addr.as_deref() {
        Some(addr) => parse_listen_addr(addr)?,
        None => config.listen_addr()?,
    };

    let mut mock = MockServer::new(&config)?;
    mock.watch_config().await?;

    let router = mock.router(args.max_body);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!(
        addr = %addr,
        config = %path.display(),
        routes = config.routes.len(),
        recorded = config.recorded_routes(),
        "mockroute started"
    );

    // Abort in-flight delays as soon as the signal arrives, so graceful
    // shutdown does not wait them out.
    let state = std::sync::Arc::clone(mock.state());
    let graceful_shutdown = async move {
        server::shutdown_signal().await;
        state.begin_shutdown();
    };

    axum::serve(listener, router)
        .with_graceful_shutdown(graceful_shutdown)
        .await?;

    mock.shutdown().await?;
    tracing::info!("mockroute stopped");
    Ok(())
}
