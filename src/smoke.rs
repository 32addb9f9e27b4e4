// src/smoke.rs
//! One-shot CORS smoke check against a running server

use anyhow::{Context, Result};
use reqwest::Method;
use std::time::Duration;
use tracing::{error, info};

/// Endpoint the check targets when nothing else is configured
pub const DEFAULT_TARGET: &str = "http://localhost:5000/user";

#[derive(Debug, Clone)]
pub struct ProbeConfig {
    pub endpoint: String,
    pub method: Method,
    /// None inherits the transport default
    pub timeout: Option<Duration>,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_TARGET.to_string(),
            method: Method::GET,
            timeout: None,
        }
    }
}

impl ProbeConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            ..Self::default()
        }
    }

    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Terminal result of one probe: either the raw response body or the
/// transport's error, never both.
#[derive(Debug)]
pub enum ProbeOutcome {
    Success(String),
    Failure(reqwest::Error),
}

impl ProbeOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ProbeOutcome::Success(_))
    }
}

/// Send exactly one request and classify the result. Network errors,
/// timeouts and non-success statuses all land in Failure; there is no
/// retry on any path.
pub async fn run(config: &ProbeConfig) -> Result<ProbeOutcome> {
    let mut builder = reqwest::Client::builder();
    if let Some(timeout) = config.timeout {
        builder = builder.timeout(timeout);
    }
    let client = builder.build().context("Failed to create HTTP client")?;

    let outcome = match client
        .request(config.method.clone(), &config.endpoint)
        .send()
        .await
        .and_then(|response| response.error_for_status())
    {
        Ok(response) => match response.text().await {
            Ok(body) => ProbeOutcome::Success(body),
            Err(e) => ProbeOutcome::Failure(e),
        },
        Err(e) => ProbeOutcome::Failure(e),
    };

    Ok(outcome)
}

/// Log the outcome the way the check is meant to be read: a label line,
/// then the payload or the error.
pub fn report(outcome: &ProbeOutcome) {
    match outcome {
        ProbeOutcome::Success(body) => {
            info!("Smoke check succeeded, response follows");
            info!("{}", body);
        }
        ProbeOutcome::Failure(e) => {
            error!("Smoke check failed, error follows");
            error!("{}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    // Minimal one-response-per-connection HTTP fixture that counts hits
    async fn serve(status_line: &'static str, body: &'static str) -> (String, Arc<AtomicUsize>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();

        tokio::spawn(async move {
            loop {
                let (mut stream, _) = match listener.accept().await {
                    Ok(conn) => conn,
                    Err(_) => break,
                };
                counter.fetch_add(1, Ordering::SeqCst);

                let mut buf = [0u8; 1024];
                let _ = stream.read(&mut buf).await;

                let response = format!(
                    "HTTP/1.1 {}\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                    status_line,
                    body.len(),
                    body
                );
                let _ = stream.write_all(response.as_bytes()).await;
            }
        });

        (format!("http://{}", addr), hits)
    }

    async fn refused_endpoint() -> String {
        // Bind to grab a free port, then drop the listener
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_success_passes_body_through() {
        let (endpoint, _hits) = serve("200 OK", r#"{"id": 1, "name": "demo"}"#).await;

        let outcome = run(&ProbeConfig::new(format!("{}/user", endpoint)))
            .await
            .unwrap();

        match outcome {
            ProbeOutcome::Success(body) => assert_eq!(body, r#"{"id": 1, "name": "demo"}"#),
            ProbeOutcome::Failure(e) => panic!("expected success, got {}", e),
        }
    }

    #[tokio::test]
    async fn test_single_dispatch_no_retry() {
        let (endpoint, hits) = serve("200 OK", "{}").await;

        let outcome = run(&ProbeConfig::new(endpoint)).await.unwrap();

        assert!(outcome.is_success());
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_error_status_is_failure_without_retry() {
        let (endpoint, hits) = serve("500 Internal Server Error", "boom").await;

        let outcome = run(&ProbeConfig::new(endpoint)).await.unwrap();

        assert!(!outcome.is_success());
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_refused_connection_is_failure() {
        let endpoint = refused_endpoint().await;

        let outcome = run(&ProbeConfig::new(endpoint)).await.unwrap();

        match outcome {
            ProbeOutcome::Failure(e) => assert!(!e.to_string().is_empty()),
            ProbeOutcome::Success(body) => panic!("expected failure, got body {:?}", body),
        }
    }

    #[tokio::test]
    async fn test_repeated_runs_are_independent() {
        let (endpoint, hits) = serve("200 OK", "ok").await;
        let config = ProbeConfig::new(endpoint);

        let first = run(&config).await.unwrap();
        let second = run(&config).await.unwrap();

        assert!(first.is_success());
        assert!(second.is_success());
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }
}
