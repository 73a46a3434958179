//! HTTP title prober.
//!
//! Issues a single GET per target through an [`HttpTransport`] and
//! classifies the response. There are no retries.

use super::traits::{ProbeOutcome, ProbeStatus, Prober};
use crate::error::{ScanError, ScanResult};
use crate::title::extract_title;
use crate::types::ProbeTarget;
use async_trait::async_trait;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// A response as seen by the prober.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Why a request produced no response.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("connection failed: {0}")]
    Connection(String),
}

/// Performs one GET request.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn get(&self, url: &str) -> Result<HttpResponse, TransportError>;
}

/// Client settings for [`ReqwestTransport`].
#[derive(Debug, Clone)]
pub struct HttpSettings {
    /// Per-request timeout, covering connect, redirects and body.
    pub timeout: Duration,
    /// Verify TLS certificates.
    pub verify_tls: bool,
    pub user_agent: String,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(5),
            verify_tls: false,
            user_agent: concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// [`HttpTransport`] backed by a shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(settings: &HttpSettings) -> ScanResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(settings.timeout)
            .danger_accept_invalid_certs(!settings.verify_tls)
            .user_agent(settings.user_agent.clone())
            .build()
            .map_err(|e| ScanError::HttpClient(e.to_string()))?;
        Ok(Self { client })
    }
}

fn classify(e: reqwest::Error) -> TransportError {
    if e.is_timeout() {
        TransportError::Timeout(e.to_string())
    } else {
        TransportError::Connection(e.to_string())
    }
}

/// Bytes of body kept per response. The title lives in `<head>`.
pub const MAX_BODY_BYTES: usize = 256 * 1024;

/// Append as much of `chunk` as fits under `limit`. Returns true once full.
fn append_capped(body: &mut Vec<u8>, chunk: &[u8], limit: usize) -> bool {
    let room = limit.saturating_sub(body.len());
    body.extend_from_slice(&chunk[..chunk.len().min(room)]);
    body.len() >= limit
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn get(&self, url: &str) -> Result<HttpResponse, TransportError> {
        let mut response = self.client.get(url).send().await.map_err(classify)?;
        let status = response.status().as_u16();

        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await.map_err(classify)? {
            if append_capped(&mut body, &chunk, MAX_BODY_BYTES) {
                break;
            }
        }

        Ok(HttpResponse {
            status,
            body: String::from_utf8_lossy(&body).into_owned(),
        })
    }
}

/// Probes a target over HTTP(S) and records its page title.
pub struct HttpProber<T = ReqwestTransport> {
    transport: T,
}

impl HttpProber<ReqwestTransport> {
    /// Build a prober with a real HTTP client.
    pub fn from_settings(settings: &HttpSettings) -> ScanResult<Self> {
        Ok(Self::new(ReqwestTransport::new(settings)?))
    }
}

impl<T: HttpTransport> HttpProber<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    fn classify(target: &ProbeTarget, result: Result<HttpResponse, TransportError>) -> ProbeOutcome {
        match result {
            Err(TransportError::Timeout(e)) => {
                ProbeOutcome::new(*target, ProbeStatus::Timeout).with_error(e)
            }
            Err(TransportError::Connection(e)) => {
                ProbeOutcome::new(*target, ProbeStatus::ConnectionError).with_error(e)
            }
            Ok(response) if !response.is_success() => {
                ProbeOutcome::new(*target, ProbeStatus::HttpError).with_http_status(response.status)
            }
            Ok(response) => {
                let outcome = match extract_title(&response.body) {
                    Some(title) => ProbeOutcome::success(*target, title),
                    None => ProbeOutcome::new(*target, ProbeStatus::NoTitle),
                };
                outcome.with_http_status(response.status)
            }
        }
    }
}

#[async_trait]
impl<T: HttpTransport> Prober for HttpProber<T> {
    async fn probe(&self, target: &ProbeTarget) -> ProbeOutcome {
        let url = target.url();
        let started = Instant::now();

        let result = self.transport.get(&url).await;
        let outcome = Self::classify(target, result)
            .with_response_time(started.elapsed().as_millis() as u64);

        log_outcome(&outcome);
        outcome
    }
}

/// Emit the one log line every outcome gets.
fn log_outcome(outcome: &ProbeOutcome) {
    match (outcome.status, outcome.title.as_deref()) {
        (ProbeStatus::Success, Some(title)) => {
            info!(url = %outcome.url, title, "Found title for {}: {}", outcome.url, title);
        }
        (ProbeStatus::HttpError, _) => {
            debug!(
                url = %outcome.url,
                status = outcome.http_status.unwrap_or_default(),
                "HTTP error for {}", outcome.url
            );
        }
        (ProbeStatus::NoTitle, _) => debug!(url = %outcome.url, "No title found for {}", outcome.url),
        (status, _) => {
            debug!(
                url = %outcome.url,
                error = outcome.error.as_deref().unwrap_or(""),
                "Failed to fetch {}: {}", outcome.url, status
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Port, Protocol};
    use std::collections::HashMap;
    use std::net::Ipv4Addr;

    /// Transport answering from a fixed table keyed by URL.
    struct ScriptedTransport {
        responses: HashMap<String, Result<HttpResponse, TransportError>>,
    }

    #[async_trait]
    impl HttpTransport for ScriptedTransport {
        async fn get(&self, url: &str) -> Result<HttpResponse, TransportError> {
            self.responses
                .get(url)
                .cloned()
                .unwrap_or_else(|| Err(TransportError::Connection("no route".into())))
        }
    }

    fn prober(entries: &[(&str, Result<HttpResponse, TransportError>)]) -> HttpProber<ScriptedTransport> {
        HttpProber::new(ScriptedTransport {
            responses: entries
                .iter()
                .map(|(url, r)| (url.to_string(), r.clone()))
                .collect(),
        })
    }

    fn target(protocol: Protocol, port: u16) -> ProbeTarget {
        ProbeTarget::new(
            Ipv4Addr::new(192, 168, 0, 10),
            protocol,
            Port::new(port).unwrap(),
        )
    }

    #[tokio::test]
    async fn test_success_trims_title() {
        let p = prober(&[(
            "http://192.168.0.10:80",
            Ok(HttpResponse::new(200, "<title>  Printer  </title>")),
        )]);
        let outcome = p.probe(&target(Protocol::Http, 80)).await;

        assert_eq!(outcome.status, ProbeStatus::Success);
        assert_eq!(outcome.title.as_deref(), Some("Printer"));
        assert_eq!(outcome.url, "http://192.168.0.10:80");
        assert_eq!(outcome.http_status, Some(200));
        assert!(outcome.response_time_ms.is_some());
    }

    #[tokio::test]
    async fn test_non_2xx_is_http_error() {
        let p = prober(&[(
            "https://192.168.0.10:443",
            Ok(HttpResponse::new(403, "<title>Forbidden</title>")),
        )]);
        let outcome = p.probe(&target(Protocol::Https, 443)).await;

        assert_eq!(outcome.status, ProbeStatus::HttpError);
        assert_eq!(outcome.http_status, Some(403));
        assert_eq!(outcome.title, None);
    }

    #[tokio::test]
    async fn test_missing_title_is_no_title() {
        let p = prober(&[(
            "http://192.168.0.10:8080",
            Ok(HttpResponse::new(204, "")),
        )]);
        let outcome = p.probe(&target(Protocol::Http, 8080)).await;
        assert_eq!(outcome.status, ProbeStatus::NoTitle);
    }

    #[tokio::test]
    async fn test_transport_failures_are_distinguished() {
        let p = prober(&[(
            "http://192.168.0.10:80",
            Err(TransportError::Timeout("deadline".into())),
        )]);

        let timed_out = p.probe(&target(Protocol::Http, 80)).await;
        assert_eq!(timed_out.status, ProbeStatus::Timeout);
        assert_eq!(timed_out.error.as_deref(), Some("deadline"));

        let refused = p.probe(&target(Protocol::Http, 81)).await;
        assert_eq!(refused.status, ProbeStatus::ConnectionError);
        assert_eq!(refused.error.as_deref(), Some("no route"));
    }

    #[test]
    fn test_response_success_range() {
        assert!(HttpResponse::new(200, "").is_success());
        assert!(HttpResponse::new(299, "").is_success());
        assert!(!HttpResponse::new(301, "").is_success());
        assert!(!HttpResponse::new(500, "").is_success());
    }

    #[test]
    fn test_reqwest_transport_builds() {
        let settings = HttpSettings {
            timeout: Duration::from_millis(250),
            verify_tls: true,
            ..HttpSettings::default()
        };
        assert!(ReqwestTransport::new(&settings).is_ok());
        assert!(HttpProber::from_settings(&HttpSettings::default()).is_ok());
    }

    #[test]
    fn test_append_capped_stops_at_limit() {
        let mut body = Vec::new();
        assert!(!append_capped(&mut body, b"<title>", 10));
        assert!(append_capped(&mut body, b"Big</title>", 10));
        assert_eq!(body, b"<title>Big");
        assert!(append_capped(&mut body, b"more", 10));
        assert_eq!(body.len(), 10);
    }

    #[tokio::test]
    async fn test_reqwest_transport_caps_large_bodies() {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let page = format!(
            "<html><head><title>Big</title></head><body>{}</body></html>",
            "x".repeat(4 * MAX_BODY_BYTES)
        );

        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut request = [0u8; 1024];
            let _ = stream.read(&mut request).await;
            let head = format!(
                "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                page.len()
            );
            // The client hangs up once it has enough; write errors are expected.
            let _ = stream.write_all(head.as_bytes()).await;
            let _ = stream.write_all(page.as_bytes()).await;
        });

        let transport = ReqwestTransport::new(&HttpSettings::default()).unwrap();
        let response = transport
            .get(&format!("http://127.0.0.1:{port}"))
            .await
            .unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(response.body.len(), MAX_BODY_BYTES);
        assert_eq!(extract_title(&response.body).as_deref(), Some("Big"));
    }

    #[tokio::test]
    async fn test_reqwest_transport_reports_refused_connection() {
        // Bind then drop a listener so the port is known to be closed.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let transport = ReqwestTransport::new(&HttpSettings {
            timeout: Duration::from_secs(2),
            ..HttpSettings::default()
        })
        .unwrap();
        let err = transport
            .get(&format!("http://127.0.0.1:{port}"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            TransportError::Connection(_) | TransportError::Timeout(_)
        ));
    }
}
