//! Live config reload.
//!
//! [`Reloader`] is the [`WatchHandler`] the server installs on its config
//! file. Each change re-reads the file through the same [`FileSource`] as
//! the initial load, builds a fresh route table off the request path, and
//! swaps it in. A file that fails to load or build leaves the current table
//! serving.

use std::path::PathBuf;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use async_trait::async_trait;

use crate::config::sources::FileSource;
use crate::error::MockError;
use crate::routes::RouteTable;
use crate::server::AppState;
use crate::watch::WatchHandler;

pub struct Reloader {
    source: FileSource,
    state: Arc<AppState>,
    addr: String,
}

impl Reloader {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, state: Arc<AppState>, addr: String) -> Self {
        Self {
            source: FileSource::new(path),
            state,
            addr,
        }
    }
}

#[async_trait]
impl WatchHandler for Reloader {
    async fn on_change(&self) -> Result<(), MockError> {
        tracing::info!(path = %self.source.path().display(), "config change detected, reloading");
        let config = self.source.load().await?;
        let table = RouteTable::build(&config)?;
        let routes = table.len();

        self.state.table.swap(table).await;
        self.state.stats.reloads.fetch_add(1, Ordering::Relaxed);
        tracing::info!(routes, "config reloaded");

        if config.addr != self.addr {
            tracing::warn!(
                current = %self.addr,
                configured = %config.addr,
                "listen address changed; restart to apply"
            );
        }
        Ok(())
    }

    fn on_error(&self, error: &MockError) -> bool {
        if error.is_not_found() {
            tracing::warn!(error = %error, "config file missing, keeping current config");
        } else {
            tracing::error!(error = %error, "config reload failed, keeping current config");
        }
        true
    }
}
