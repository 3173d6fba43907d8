//! Polling file watcher with SHA-256 change detection.
//!
//! [`FileWatcher::start`] fingerprints the watched file, then spawns a
//! background task that re-reads it every `interval`.
//! [`FileWatcher::start_from`] takes the baseline from the caller, which
//! should be the fingerprint of the content it actually loaded:
//!
//! - read failure: [`WatchHandler::on_error`] decides whether to keep
//!   polling (`true`) or stop (`false`);
//! - same fingerprint: nothing happens;
//! - new fingerprint: [`WatchHandler::on_change`] runs. On success the new
//!   fingerprint becomes the baseline; a failure goes through `on_error`
//!   and the baseline is kept, so the change is retried next tick.
//!
//! The task exits when [`FileWatcher::stop`] is called, when the handle
//! is dropped, or when `on_error` returns `false`. It never blocks
//! request serving.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::error::MockError;

#[derive(Debug, Clone)]
pub struct WatchOptions {
    pub path: PathBuf,
    pub interval: Duration,
}

// async_trait keeps the handler usable as a trait object.
#[async_trait]
pub trait WatchHandler: Send + Sync + 'static {
    async fn on_change(&self) -> Result<(), MockError>;

    /// Return `true` to keep polling, `false` to stop the watcher.
    fn on_error(&self, error: &MockError) -> bool;
}

pub struct FileWatcher {
    stop_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

/// Compute a lowercase hex-encoded SHA-256 digest.
#[must_use]
pub fn fingerprint(data: &[u8]) -> String {
    format!("{:x}", Sha256::digest(data))
}

pub async fn fingerprint_file(path: &Path) -> Result<String, MockError> {
    let data = tokio::fs::read(path).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            MockError::ConfigFileNotFound {
                path: path.to_path_buf(),
            }
        } else {
            MockError::Io(e)
        }
    })?;
    Ok(fingerprint(&data))
}

impl FileWatcher {
    /// Fingerprint the file and start polling. Fails if the file cannot be
    /// read up front.
    pub async fn start<H: WatchHandler>(
        options: WatchOptions,
        handler: H,
    ) -> Result<Self, MockError> {
        let baseline = fingerprint_file(&options.path).await?;
        Ok(Self::start_from(options, baseline, handler))
    }

    /// Start polling against a known `baseline`. A file that no longer
    /// matches it triggers `on_change` on the first tick.
    pub fn start_from<H: WatchHandler>(
        options: WatchOptions,
        baseline: String,
        handler: H,
    ) -> Self {
        let (stop_tx, stop_rx) = watch::channel(false);

        tracing::info!(
            path = %options.path.display(),
            interval_ms = u64::try_from(options.interval.as_millis()).unwrap_or(u64::MAX),
            "watching config file"
        );

        let task = tokio::spawn(poll_loop(options, baseline, handler, stop_rx));
        Self { stop_tx, task }
    }

    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.task.is_finished()
    }

    /// Stop polling and wait for the task to exit.
    pub async fn stop(self) {
        let _ = self.stop_tx.send(true);
        if let Err(e) = self.task.await {
            tracing::error!(error = %e, "config watcher task failed");
        }
    }
}

enum Flow {
    Continue,
    Stop,
}

async fn poll_loop<H: WatchHandler>(
    options: WatchOptions,
    mut baseline: String,
    handler: H,
    mut stop: watch::Receiver<bool>,
) {
    let mut interval = tokio::time::interval(options.interval);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval.tick().await; // Skip first immediate tick

    loop {
        tokio::select! {
            _ = interval.tick() => {}
            _ = stop.changed() => {
                tracing::debug!("config watcher shutting down");
                return;
            }
        }

        if let Flow::Stop = poll_once(&options.path, &mut baseline, &handler).await {
            tracing::warn!(path = %options.path.display(), "config watcher stopped");
            return;
        }
    }
}

async fn poll_once<H: WatchHandler>(path: &Path, baseline: &mut String, handler: &H) -> Flow {
    let current = match fingerprint_file(path).await {
        Ok(current) => current,
        Err(e) => return decide(handler, &e),
    };

    if current == *baseline {
        return Flow::Continue;
    }

    tracing::debug!(path = %path.display(), "config file changed");
    match handler.on_change().await {
        Ok(()) => {
            *baseline = current;
            Flow::Continue
        }
        Err(e) => decide(handler, &e),
    }
}

fn decide<H: WatchHandler>(handler: &H, error: &MockError) -> Flow {
    if handler.on_error(error) {
        Flow::Continue
    } else {
        Flow::Stop
    }
}
