//! Remote assistant endpoint.
//!
//! [`AssistantBackend`] is the seam to the hosted language-model function.
//! [`HttpAssistantBackend`] talks to it over HTTP; tests use
//! [`crate::mock::MockBackend`].

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::ChatConfig;
use crate::error::{ChatError, ChatResult};
use crate::types::{Author, ChatTurn};

/// One prior turn as sent to the backend
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HistoryEntry {
    pub content: String,
    pub author: Author,
}

impl From<&ChatTurn> for HistoryEntry {
    fn from(turn: &ChatTurn) -> Self {
        Self {
            content: turn.content.clone(),
            author: turn.author,
        }
    }
}

/// Request payload, built once per user send
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AssistantRequest {
    pub context: String,
    pub history: Vec<HistoryEntry>,
    pub new_message: String,
}

/// Successful backend reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssistantReply {
    pub content: String,
}

/// Raw backend failure, before classification
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendFailure {
    #[error("backend overloaded")]
    Overloaded,

    #[error("daily quota exceeded")]
    QuotaExceeded,

    #[error("network error: {0}")]
    Network(String),

    #[error("request timed out")]
    Timeout,

    #[error("server error {status}: {body}")]
    Server { status: u16, body: String },

    #[error("request rejected {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("malformed response: {0}")]
    Malformed(String),
}

impl From<BackendFailure> for ChatError {
    fn from(failure: BackendFailure) -> Self {
        match failure {
            BackendFailure::Overloaded => ChatError::Overloaded,
            BackendFailure::QuotaExceeded => ChatError::QuotaExceeded,
            BackendFailure::Network(_) | BackendFailure::Timeout | BackendFailure::Server { .. } => {
                ChatError::Transient(failure.to_string())
            }
            BackendFailure::Rejected { .. } | BackendFailure::Malformed(_) => {
                ChatError::Fatal(failure.to_string())
            }
        }
    }
}

/// A remote assistant that answers one request.
#[async_trait]
pub trait AssistantBackend: Send + Sync {
    async fn complete(&self, request: &AssistantRequest) -> Result<AssistantReply, BackendFailure>;
}

/// Assistant endpoint reached over HTTP
pub struct HttpAssistantBackend {
    endpoint: String,
    api_key: Option<String>,
    client: reqwest::Client,
}

impl HttpAssistantBackend {
    /// Create a backend for an explicit endpoint
    pub fn new(
        endpoint: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> ChatResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ChatError::Client(e.to_string()))?;

        Ok(Self {
            endpoint: endpoint.into(),
            api_key,
            client,
        })
    }

    /// Create a backend from resolved configuration
    pub fn from_config(config: &ChatConfig) -> ChatResult<Self> {
        Self::new(
            config.endpoint.clone(),
            config.api_key.clone(),
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl AssistantBackend for HttpAssistantBackend {
    async fn complete(&self, request: &AssistantRequest) -> Result<AssistantReply, BackendFailure> {
        let mut builder = self
            .client
            .post(&self.endpoint)
            .header("Content-Type", "application/json")
            .json(request);

        if let Some(ref key) = self.api_key {
            builder = builder.header("Authorization", format!("Bearer {}", key));
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                BackendFailure::Timeout
            } else {
                BackendFailure::Network(e.to_string())
            }
        })?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| {
            if e.is_timeout() {
                BackendFailure::Timeout
            } else {
                BackendFailure::Network(e.to_string())
            }
        })?;

        parse_response(status, &body)
    }
}

// Endpoint wire types
#[derive(Debug, Deserialize)]
struct SuccessBody {
    response: Option<String>,
    error: Option<ErrorCode>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<ErrorCode>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ErrorCode {
    Plain(String),
    Nested { code: String },
}

impl ErrorCode {
    fn code(&self) -> &str {
        match self {
            Self::Plain(code) => code,
            Self::Nested { code } => code,
        }
    }
}

/// Turn a raw HTTP status and body into a reply or a failure.
pub fn parse_response(status: u16, body: &str) -> Result<AssistantReply, BackendFailure> {
    if !(200..300).contains(&status) {
        return Err(classify_http_failure(status, body));
    }

    let parsed: SuccessBody =
        serde_json::from_str(body).map_err(|e| BackendFailure::Malformed(e.to_string()))?;

    if let Some(failure) = parsed.error.as_ref().and_then(|e| failure_for_code(e.code())) {
        return Err(failure);
    }

    match parsed.response {
        Some(content) if !content.trim().is_empty() => Ok(AssistantReply { content }),
        _ => Err(BackendFailure::Malformed(
            "response field missing or empty".to_string(),
        )),
    }
}

/// Classify a non-success HTTP response.
///
/// An explicit error code in the body wins; otherwise the status decides.
pub fn classify_http_failure(status: u16, body: &str) -> BackendFailure {
    let code = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.error)
        .and_then(|e| failure_for_code(e.code()));

    if let Some(failure) = code {
        return failure;
    }

    match status {
        503 | 529 => BackendFailure::Overloaded,
        429 => BackendFailure::QuotaExceeded,
        500..=599 => BackendFailure::Server {
            status,
            body: body.to_string(),
        },
        _ => BackendFailure::Rejected {
            status,
            body: body.to_string(),
        },
    }
}

fn failure_for_code(code: &str) -> Option<BackendFailure> {
    match code {
        "overloaded" => Some(BackendFailure::Overloaded),
        "quota_exceeded" => Some(BackendFailure::QuotaExceeded),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_wire_shape() {
        let request = AssistantRequest {
            context: "Project title: Atlas".to_string(),
            history: vec![HistoryEntry {
                content: "Hi".to_string(),
                author: Author::User,
            }],
            new_message: "What is it?".to_string(),
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["newMessage"], "What is it?");
        assert_eq!(json["history"][0]["author"], "user");
        assert_eq!(json["history"][0]["content"], "Hi");
    }

    #[test]
    fn test_parse_success() {
        let reply = parse_response(200, r#"{"response":"Hi there"}"#).unwrap();
        assert_eq!(reply.content, "Hi there");
    }

    #[test]
    fn test_parse_success_without_content_is_malformed() {
        assert!(matches!(
            parse_response(200, r#"{"other":1}"#),
            Err(BackendFailure::Malformed(_))
        ));
        assert!(matches!(
            parse_response(200, "not json"),
            Err(BackendFailure::Malformed(_))
        ));
    }

    #[test]
    fn test_error_code_in_success_status() {
        assert_eq!(
            parse_response(200, r#"{"error":"quota_exceeded"}"#),
            Err(BackendFailure::QuotaExceeded)
        );
    }

    #[test]
    fn test_classify_by_code() {
        assert_eq!(
            classify_http_failure(500, r#"{"error":"overloaded"}"#),
            BackendFailure::Overloaded
        );
        assert_eq!(
            classify_http_failure(403, r#"{"error":{"code":"quota_exceeded"}}"#),
            BackendFailure::QuotaExceeded
        );
    }

    #[test]
    fn test_classify_by_status() {
        assert_eq!(classify_http_failure(529, ""), BackendFailure::Overloaded);
        assert_eq!(classify_http_failure(503, "busy"), BackendFailure::Overloaded);
        assert_eq!(classify_http_failure(429, ""), BackendFailure::QuotaExceeded);
        assert!(matches!(
            classify_http_failure(502, "bad gateway"),
            BackendFailure::Server { status: 502, .. }
        ));
        assert!(matches!(
            classify_http_failure(400, "{}"),
            BackendFailure::Rejected { status: 400, .. }
        ));
    }

    #[test]
    fn test_failure_to_chat_error() {
        assert_eq!(ChatError::from(BackendFailure::Overloaded), ChatError::Overloaded);
        assert_eq!(
            ChatError::from(BackendFailure::QuotaExceeded),
            ChatError::QuotaExceeded
        );
        assert!(matches!(
            ChatError::from(BackendFailure::Timeout),
            ChatError::Transient(_)
        ));
        assert!(matches!(
            ChatError::from(BackendFailure::Malformed("x".into())),
            ChatError::Fatal(_)
        ));
    }

    #[test]
    fn test_http_backend_from_config() {
        let config = ChatConfig::new("https://example.invalid/chat");
        let backend = HttpAssistantBackend::from_config(&config).unwrap();
        assert_eq!(backend.endpoint(), "https://example.invalid/chat");
    }

    fn sample_request() -> AssistantRequest {
        AssistantRequest {
            context: "Project title: Atlas".to_string(),
            history: vec![HistoryEntry {
                content: "Hi".to_string(),
                author: Author::User,
            }],
            new_message: "What is it?".to_string(),
        }
    }

    /// Serve one canned HTTP response on a local port. The handle yields the raw request.
    async fn serve_once(
        status: &'static str,
        body: &'static str,
    ) -> (String, tokio::task::JoinHandle<String>) {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/chat", listener.local_addr().unwrap());

        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut raw = Vec::new();
            let mut buf = [0u8; 4096];
            while !request_complete(&raw) {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                raw.extend_from_slice(&buf[..n]);
            }

            let reply = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            socket.write_all(reply.as_bytes()).await.unwrap();
            let _ = socket.shutdown().await;
            String::from_utf8_lossy(&raw).to_string()
        });

        (url, server)
    }

    fn request_complete(raw: &[u8]) -> bool {
        let text = String::from_utf8_lossy(raw);
        let Some(split) = text.find("\r\n\r\n") else {
            return false;
        };
        let length = text[..split]
            .lines()
            .filter_map(|line| line.split_once(':'))
            .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
            .and_then(|(_, value)| value.trim().parse::<usize>().ok())
            .unwrap_or(0);
        raw.len() >= split + 4 + length
    }

    fn backend_for(url: &str) -> HttpAssistantBackend {
        HttpAssistantBackend::new(url, Some("secret".to_string()), Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_http_round_trip() {
        let (url, server) = serve_once("200 OK", r#"{"response":"Hi there"}"#).await;

        let reply = backend_for(&url).complete(&sample_request()).await.unwrap();
        assert_eq!(reply.content, "Hi there");

        let raw = server.await.unwrap();
        let lowered = raw.to_lowercase();
        assert!(raw.starts_with("POST /chat "));
        assert!(lowered.contains("authorization: bearer secret"));
        assert!(lowered.contains("content-type: application/json"));

        let (_, body) = raw.split_once("\r\n\r\n").unwrap();
        let sent: serde_json::Value = serde_json::from_str(body).unwrap();
        assert_eq!(sent["context"], "Project title: Atlas");
        assert_eq!(sent["newMessage"], "What is it?");
        assert_eq!(sent["history"][0]["author"], "user");
    }

    #[tokio::test]
    async fn test_http_without_key_sends_no_authorization() {
        let (url, server) = serve_once("200 OK", r#"{"response":"ok"}"#).await;

        let backend = HttpAssistantBackend::new(&url, None, Duration::from_secs(5)).unwrap();
        backend.complete(&sample_request()).await.unwrap();

        let raw = server.await.unwrap();
        assert!(!raw.to_lowercase().contains("authorization:"));
    }

    #[tokio::test]
    async fn test_http_overloaded_status() {
        let (url, server) = serve_once("503 Service Unavailable", "busy").await;

        let result = backend_for(&url).complete(&sample_request()).await;
        assert_eq!(result, Err(BackendFailure::Overloaded));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_http_quota_status() {
        let (url, server) = serve_once("429 Too Many Requests", "{}").await;

        let result = backend_for(&url).complete(&sample_request()).await;
        assert_eq!(result, Err(BackendFailure::QuotaExceeded));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_http_refused_connection_is_network() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/chat", listener.local_addr().unwrap());
        drop(listener);

        let result = backend_for(&url).complete(&sample_request()).await;
        assert!(matches!(result, Err(BackendFailure::Network(_))));
    }
}
