use std::future::Future;
use std::time::Duration;

use anyhow::Result;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::menu::MenuRequest;

/// Path of the menu-generation endpoint, appended to the configured base URL.
pub const GENERATE_MENU_PATH: &str = "/generate_menu";

// ── Reply ─────────────────────────────────────────────────────────────────────

/// What came back from the server, before anyone decides what it means.
/// `body` is `None` when the payload was not JSON.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub status: u16,
    pub body: Option<Value>,
}

impl Reply {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// No HTTP response could be obtained at all (refused, DNS, TLS, timeout…).
#[derive(Debug, Clone, Error)]
#[error("{cause}")]
pub struct TransportError {
    pub cause: String,
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        Self { cause: e.to_string() }
    }
}

// ── Backend seam ──────────────────────────────────────────────────────────────

/// Anything that can answer a menu request. The form controller only talks to
/// this, so tests can swap the network out.
pub trait MenuBackend {
    fn generate(
        &self,
        request: &MenuRequest,
    ) -> impl Future<Output = Result<Reply, TransportError>> + Send;
}

// ── HTTP client ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct MenuClient {
    http: reqwest::Client,
    pub endpoint: String,
}

impl MenuClient {
    /// `timeout` of `None` waits for the transport to settle, however long.
    pub fn new(endpoint: String, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(t) = timeout {
            builder = builder.timeout(t);
        }
        Ok(Self {
            http: builder.build()?,
            endpoint,
        })
    }

    pub fn url(&self) -> String {
        format!("{}{GENERATE_MENU_PATH}", self.endpoint.trim_end_matches('/'))
    }
}

impl MenuBackend for MenuClient {
    async fn generate(&self, request: &MenuRequest) -> Result<Reply, TransportError> {
        let url = self.url();
        debug!(%url, ingredients = request.ingredients.len(), "POST menu request");

        let resp = self
            .http
            .post(&url)
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await?;

        let status = resp.status().as_u16();
        let bytes = resp.bytes().await?;
        // Parse regardless of status; a non-JSON body is reported as no body
        let body = serde_json::from_slice::<Value>(&bytes).ok();
        debug!(status, json = body.is_some(), bytes = bytes.len(), "menu reply received");

        Ok(Reply { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::sync::oneshot;

    /// Serve exactly one HTTP response, handing the raw request body back.
    async fn serve_once(status_line: &'static str, body: &'static str) -> (String, oneshot::Receiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = oneshot::channel();

        tokio::spawn(async move {
            let (mut sock, _) = listener.accept().await.unwrap();
            let mut buf = Vec::new();
            let mut chunk = [0u8; 4096];
            let request_body = loop {
                let n = sock.read(&mut chunk).await.unwrap();
                if n == 0 {
                    break String::new();
                }
                buf.extend_from_slice(&chunk[..n]);
                let text = String::from_utf8_lossy(&buf).to_string();
                if let Some(head_end) = text.find("\r\n\r\n") {
                    let head = text[..head_end].to_ascii_lowercase();
                    let len = head
                        .lines()
                        .find_map(|l| l.strip_prefix("content-length:"))
                        .and_then(|v| v.trim().parse::<usize>().ok())
                        .unwrap_or(0);
                    let body_start = head_end + 4;
                    if buf.len() >= body_start + len {
                        break String::from_utf8_lossy(&buf[body_start..body_start + len]).to_string();
                    }
                }
            };
            let response = format!(
                "{status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            sock.write_all(response.as_bytes()).await.unwrap();
            sock.shutdown().await.ok();
            let _ = tx.send(request_body);
        });

        (format!("http://{addr}"), rx)
    }

    fn request() -> MenuRequest {
        MenuRequest {
            ingredients: vec!["egg".to_string(), "rice".to_string()],
            budget: Some(500),
            preference: None,
        }
    }

    #[test]
    fn test_url_joins_endpoint_and_path() {
        let c = MenuClient::new("http://localhost:5000/".to_string(), None).unwrap();
        assert_eq!(c.url(), "http://localhost:5000/generate_menu");
        let c = MenuClient::new("http://host/api".to_string(), None).unwrap();
        assert_eq!(c.url(), "http://host/api/generate_menu");
    }

    #[test]
    fn test_reply_success_range() {
        assert!(Reply { status: 200, body: None }.is_success());
        assert!(Reply { status: 204, body: None }.is_success());
        assert!(!Reply { status: 400, body: None }.is_success());
        assert!(!Reply { status: 503, body: None }.is_success());
    }

    #[tokio::test]
    async fn test_generate_posts_json_and_returns_body() {
        let (base, captured) = serve_once("HTTP/1.1 200 OK", r#"{"total_calories":500,"dishes":[],"notes":"ok"}"#).await;
        let client = MenuClient::new(base, None).unwrap();

        let reply = client.generate(&request()).await.unwrap();
        assert_eq!(reply.status, 200);
        assert_eq!(reply.body, Some(json!({"total_calories": 500, "dishes": [], "notes": "ok"})));

        let sent: Value = serde_json::from_str(&captured.await.unwrap()).unwrap();
        assert_eq!(sent, json!({"ingredients": ["egg", "rice"], "budget": 500, "preference": null}));
    }

    #[tokio::test]
    async fn test_generate_keeps_error_status_and_body() {
        let (base, _captured) = serve_once("HTTP/1.1 400 Bad Request", r#"{"error":"budget too low"}"#).await;
        let client = MenuClient::new(base, None).unwrap();

        let reply = client.generate(&request()).await.unwrap();
        assert_eq!(reply.status, 400);
        assert_eq!(reply.body, Some(json!({"error": "budget too low"})));
    }

    #[tokio::test]
    async fn test_generate_non_json_body_is_none() {
        let (base, _captured) = serve_once("HTTP/1.1 502 Bad Gateway", "<html>oops</html>").await;
        let client = MenuClient::new(base, None).unwrap();

        let reply = client.generate(&request()).await.unwrap();
        assert_eq!(reply.status, 502);
        assert!(reply.body.is_none());
    }

    #[tokio::test]
    async fn test_generate_refused_connection_is_transport_error() {
        // Bind then drop to get a port nobody is listening on
        let addr = {
            let l = TcpListener::bind("127.0.0.1:0").await.unwrap();
            l.local_addr().unwrap()
        };
        let client = MenuClient::new(format!("http://{addr}"), None).unwrap();
        let err = client.generate(&request()).await.unwrap_err();
        assert!(!err.cause.is_empty());
    }
}
