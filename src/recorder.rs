//! Append-only request logs.
//!
//! Each recorded request appends a `METHOD URL\n<body>\n\n` block to the
//! file of its route for the current day. Handles are opened lazily in
//! append mode, parent directories created on demand, and cached until
//! [`RequestRecorder::close`]. One mutex covers lookup-or-open and the
//! write, so concurrent requests never interleave inside a block.
//!
//! The cache holds one handle per route log series: when the date in a
//! route's file name moves on, the previous day's handle is flushed and
//! closed before the new file is opened.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::error::MockError;

#[derive(Debug, Clone, Copy)]
pub struct RecordedRequest<'a> {
    pub method: &'a str,
    pub url: &'a str,
    pub body: &'a [u8],
}

impl RecordedRequest<'_> {
    fn to_block(self) -> Vec<u8> {
        let mut block =
            Vec::with_capacity(self.method.len() + self.url.len() + self.body.len() + 4);
        block.extend_from_slice(self.method.as_bytes());
        block.push(b' ');
        block.extend_from_slice(self.url.as_bytes());
        block.push(b'\n');
        block.extend_from_slice(self.body);
        block.extend_from_slice(b"\n\n");
        block
    }
}

/// File name for a route's recordings on `date`: the pattern with `/`
/// turned into `_` and spaces dropped, suffixed with the ISO date.
#[must_use]
pub fn record_file_name(pattern: &str, date: NaiveDate) -> String {
    let sanitized = pattern.replace('/', "_").replace(' ', "");
    format!("{sanitized}-{}.log", date.format("%Y-%m-%d"))
}

/// Cache key shared by every dated file of one route: the path with its
/// `-YYYY-MM-DD.log` suffix removed. Other paths are their own key.
fn series_key(path: &Path) -> PathBuf {
    let prefix = path.file_name().and_then(|n| n.to_str()).and_then(|name| {
        let stem = name.strip_suffix(".log")?;
        let at = stem.len().checked_sub(11)?;
        let date = stem.get(at..)?.strip_prefix('-')?;
        NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()?;
        stem.get(..at)
    });
    match prefix {
        Some(prefix) => path.with_file_name(prefix),
        None => path.to_path_buf(),
    }
}

#[derive(Debug, Default)]
pub struct RequestRecorder {
    files: Mutex<HashMap<PathBuf, (PathBuf, File)>>,
}

impl RequestRecorder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn record(&self, path: &Path, request: RecordedRequest<'_>) -> Result<(), MockError> {
        let key = series_key(path);
        let mut files = self.files.lock().await;

        if files.get(&key).is_some_and(|(current, _)| current != path) {
            if let Some((previous, file)) = files.remove(&key) {
                match finish(file).await {
                    Ok(()) => tracing::debug!(path = %previous.display(), "closed record file"),
                    Err(e) => tracing::warn!(
                        path = %previous.display(),
                        error = %e,
                        "failed to close record file"
                    ),
                }
            }
        }

        let (_, file) = match files.entry(key) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                let file = open_append(path).await?;
                tracing::debug!(path = %path.display(), "opened record file");
                entry.insert((path.to_path_buf(), file))
            }
        };

        file.write_all(&request.to_block()).await?;
        file.flush().await?;
        Ok(())
    }

    pub async fn open_files(&self) -> usize {
        self.files.lock().await.len()
    }

    /// Flush and close every cached handle. Failures are collected and
    /// reported together; every handle is released regardless.
    pub async fn close(&self) -> Result<(), MockError> {
        let files: Vec<(PathBuf, File)> = self.files.lock().await.drain().map(|(_, f)| f).collect();
        let mut errors = Vec::new();

        for (path, file) in files {
            if let Err(e) = finish(file).await {
                errors.push((path, e));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(MockError::RecorderClose { errors })
        }
    }
}

async fn finish(mut file: File) -> std::io::Result<()> {
    file.flush().await?;
    file.sync_all().await
}

async fn open_append(path: &Path) -> Result<File, MockError> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(dir).await?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await?;
    Ok(file)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 9).unwrap()
    }

    #[test]
    fn file_name_is_sanitized_and_dated() {
        assert_eq!(
            record_file_name("POST /orders/{id}", date()),
            "POST_orders_{id}-2024-03-09.log"
        );
        assert_eq!(record_file_name("/", date()), "_-2024-03-09.log");
    }

    #[tokio::test]
    async fn record_appends_blocks_and_creates_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/records").join("orders.log");
        let recorder = RequestRecorder::new();

        let first = RecordedRequest {
            method: "POST",
            url: "/orders?x=1",
            body: br#"{"qty":1}"#,
        };
        let second = RecordedRequest {
            method: "GET",
            url: "/orders",
            body: b"",
        };
        recorder.record(&path, first).await.unwrap();
        recorder.record(&path, second).await.unwrap();
        assert_eq!(recorder.open_files().await, 1);
        recorder.close().await.unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "POST /orders?x=1\n{\"qty\":1}\n\nGET /orders\n\n\n");
        assert_eq!(recorder.open_files().await, 0);
    }

    #[test]
    fn dated_files_of_one_route_share_a_key() {
        let dir = Path::new("rec");
        let day1 = dir.join(record_file_name("POST /orders", date()));
        let day2 = dir.join(record_file_name("POST /orders", date().succ_opt().unwrap()));
        assert_eq!(series_key(&day1), series_key(&day2));
        assert_eq!(series_key(&day1), dir.join("POST_orders"));
        assert_ne!(
            series_key(&day1),
            series_key(&dir.join(record_file_name("GET /orders", date())))
        );
        assert_eq!(series_key(Path::new("plain.log")), Path::new("plain.log"));
        assert_eq!(series_key(Path::new("x-2024-13-40.log")), Path::new("x-2024-13-40.log"));
    }

    #[tokio::test]
    async fn new_day_closes_previous_handle() {
        let dir = tempfile::tempdir().unwrap();
        let day1 = dir.path().join(record_file_name("POST /orders", date()));
        let day2 = dir
            .path()
            .join(record_file_name("POST /orders", date().succ_opt().unwrap()));
        let other = dir.path().join(record_file_name("GET /items", date()));
        let recorder = RequestRecorder::new();
        let request = |url: &'static str| RecordedRequest {
            method: "POST",
            url,
            body: b"",
        };

        recorder.record(&day1, request("/orders/1")).await.unwrap();
        recorder.record(&other, request("/items")).await.unwrap();
        recorder.record(&day2, request("/orders/2")).await.unwrap();
        recorder.record(&day2, request("/orders/3")).await.unwrap();
        assert_eq!(recorder.open_files().await, 2);
        recorder.close().await.unwrap();

        assert_eq!(std::fs::read_to_string(&day1).unwrap(), "POST /orders/1\n\n\n");
        assert_eq!(
            std::fs::read_to_string(&day2).unwrap(),
            "POST /orders/2\n\n\nPOST /orders/3\n\n\n"
        );
    }

    #[tokio::test]
    async fn record_appends_to_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("existing.log");
        std::fs::write(&path, "old\n").unwrap();

        let recorder = RequestRecorder::new();
        let request = RecordedRequest {
            method: "PUT",
            url: "/a",
            body: b"x",
        };
        recorder.record(&path, request).await.unwrap();
        recorder.close().await.unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "old\nPUT /a\nx\n\n");
    }

    #[tokio::test]
    async fn concurrent_records_do_not_interleave() {
        let dir = tempfile::tempdir().unwrap();
        let path = Arc::new(dir.path().join("busy.log"));
        let recorder = Arc::new(RequestRecorder::new());
        let body = "y".repeat(4096);

        let mut tasks = Vec::new();
        for i in 0..32 {
            let recorder = Arc::clone(&recorder);
            let path = Arc::clone(&path);
            let body = body.clone();
            tasks.push(tokio::spawn(async move {
                let url = format!("/busy/{i}");
                let request = RecordedRequest {
                    method: "POST",
                    url: &url,
                    body: body.as_bytes(),
                };
                recorder.record(&path, request).await.unwrap();
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }
        recorder.close().await.unwrap();

        let content = std::fs::read_to_string(path.as_ref()).unwrap();
        let blocks: Vec<&str> = content.split_terminator("\n\n").collect();
        assert_eq!(blocks.len(), 32);
        for block in blocks {
            let (line, rest) = block.split_once('\n').unwrap();
            assert!(line.starts_with("POST /busy/"));
            assert_eq!(rest, body);
        }
    }

    #[tokio::test]
    async fn open_failure_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, "").unwrap();

        let recorder = RequestRecorder::new();
        let request = RecordedRequest {
            method: "GET",
            url: "/",
            body: b"",
        };
        let result = recorder.record(&blocker.join("child.log"), request).await;
        assert!(result.is_err());
        assert_eq!(recorder.open_files().await, 0);
    }
}
