//! Fire-and-forget access log.
//!
//! A middleware turns every finished request into an [`AccessLogEntry`] and
//! hands it to a bounded channel with `try_send`. A background task drains
//! the channel and appends one JSON line per entry to a file. Nothing on the
//! request path waits for the writer; entries that cannot be queued or
//! written are dropped with a warning.

use axum::extract::{ConnectInfo, Request, State};
use axum::http::header;
use axum::middleware::Next;
use axum::response::Response;
use jiff::Timestamp;
use serde::Serialize;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Instant;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessLogEntry {
    pub timestamp: Timestamp,
    pub method: String,
    pub url: String,
    pub status: u16,
    pub duration_ms: u64,
    pub ip: String,
    pub user_agent: String,
    pub referrer: String,
}

/// Sending half of the access log channel.
#[derive(Debug, Clone)]
pub struct AccessLogSink {
    tx: mpsc::Sender<AccessLogEntry>,
}

impl AccessLogSink {
    /// Creates a sink and the receiver feeding the writer.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<AccessLogEntry>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, rx)
    }

    /// Creates a sink whose entries are appended to `path` by a spawned task.
    ///
    /// The task ends once every clone of the sink is dropped.
    pub fn spawn(path: PathBuf, capacity: usize) -> (Self, JoinHandle<()>) {
        let (sink, rx) = Self::channel(capacity);
        let writer = tokio::spawn(run_access_log_writer(rx, path));
        (sink, writer)
    }

    /// Queues an entry without waiting.
    pub fn submit(&self, entry: AccessLogEntry) {
        match self.tx.try_send(entry) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => warn!("access log queue is full, dropping entry"),
            Err(TrySendError::Closed(_)) => debug!("access log writer is gone, dropping entry"),
        }
    }
}

pub async fn run_access_log_writer(mut rx: mpsc::Receiver<AccessLogEntry>, path: PathBuf) {
    let mut file = match OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .await
    {
        Ok(file) => file,
        Err(error) => {
            warn!(%error, path = %path.display(), "cannot open access log, entries will be dropped");
            rx.close();
            return;
        }
    };

    while let Some(entry) = rx.recv().await {
        let mut line = match serde_json::to_vec(&entry) {
            Ok(line) => line,
            Err(error) => {
                warn!(%error, "failed to encode access log entry");
                continue;
            }
        };
        line.push(b'\n');

        if let Err(error) = file.write_all(&line).await {
            warn!(%error, path = %path.display(), "failed to append access log entry");
        }
    }

    if let Err(error) = file.flush().await {
        warn!(%error, path = %path.display(), "failed to flush access log");
    }
}

/// Middleware recording every request once its response is ready.
pub async fn access_log_mw(
    State(sink): State<AccessLogSink>,
    request: Request,
    next: Next,
) -> Response {
    let start = Instant::now();
    let timestamp = Timestamp::now();

    let method = request.method().to_string();
    let url = request
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str().to_owned())
        .unwrap_or_else(|| request.uri().path().to_owned());
    let ip = client_ip(&request)
        .map(|ip| ip.to_string())
        .unwrap_or_default();
    let user_agent = header_string(&request, header::USER_AGENT);
    let referrer = header_string(&request, header::REFERER);

    let response = next.run(request).await;

    sink.submit(AccessLogEntry {
        timestamp,
        method,
        url,
        status: response.status().as_u16(),
        duration_ms: u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
        ip,
        user_agent,
        referrer,
    });

    response
}

/// Peer address of the connection, when the server was started with
/// connect info.
pub fn client_ip<B>(request: &axum::http::Request<B>) -> Option<IpAddr> {
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip())
}

fn header_string(request: &Request, name: header::HeaderName) -> String {
    request
        .headers()
        .get(name)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn entry(status: u16) -> AccessLogEntry {
        AccessLogEntry {
            timestamp: Timestamp::from_second(0).unwrap(),
            method: "GET".to_string(),
            url: "/abcd".to_string(),
            status,
            duration_ms: 1,
            ip: "127.0.0.1".to_string(),
            user_agent: String::new(),
            referrer: String::new(),
        }
    }

    #[test]
    fn entry_serializes_camel_case() {
        let json = serde_json::to_value(entry(302)).unwrap();

        assert_eq!(json["durationMs"], 1);
        assert_eq!(json["userAgent"], "");
        assert_eq!(json["status"], 302);
        assert_eq!(json["timestamp"], "1970-01-01T00:00:00Z");
    }

    #[tokio::test]
    async fn full_queue_drops_instead_of_blocking() {
        let (sink, mut rx) = AccessLogSink::channel(1);

        sink.submit(entry(200));
        sink.submit(entry(404));

        assert_eq!(rx.recv().await.unwrap().status, 200);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn closed_writer_is_ignored() {
        let (sink, rx) = AccessLogSink::channel(4);
        drop(rx);

        sink.submit(entry(200));
    }

    #[tokio::test]
    async fn writer_appends_json_lines() {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        let path = std::env::temp_dir().join(format!("stubby-access-{nanos}.log"));

        let (sink, writer) = AccessLogSink::spawn(path.clone(), 8);
        sink.submit(entry(201));
        sink.submit(entry(410));
        drop(sink);
        writer.await.unwrap();

        let contents = tokio::fs::read_to_string(&path).await.unwrap();
        let statuses: Vec<u64> = contents
            .lines()
            .map(|line| serde_json::from_str::<serde_json::Value>(line).unwrap()["status"]
                .as_u64()
                .unwrap())
            .collect();
        assert_eq!(statuses, vec![201, 410]);

        tokio::fs::remove_file(&path).await.unwrap();
    }

    #[tokio::test]
    async fn unwritable_path_does_not_panic() {
        let path = std::env::temp_dir()
            .join("stubby-missing-dir")
            .join("nested")
            .join("access.log");

        let (sink, writer) = AccessLogSink::spawn(path, 8);
        writer.await.unwrap();
        sink.submit(entry(200));
    }
}
