//! Generic JSON client implementing the uniform provider request protocol:
//! credential header, fixed per-attempt timeout, a single retry on
//! network-level failure, and typed outcome classification.

use log::{debug, warn};
use reqwest::{Client, Method};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Duration;

use super::error::{ApiError, FailureKind};
use crate::provider::ProviderKind;

/// Per-attempt timeout for provider calls.
pub const TIMEOUT: Duration = Duration::from_millis(10_000);

/// Fixed backoff before the single retry.
pub const RETRY_DELAY: Duration = Duration::from_millis(500);

/// Total attempts per call: the original attempt plus one retry.
pub const MAX_ATTEMPTS: usize = 2;

/// JSON-over-HTTP client bound to one provider's base URL and credential.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    provider: ProviderKind,
    base_url: String,
    api_key: String,
    timeout: Duration,
    retry_delay: Duration,
}

impl ApiClient {
    pub fn new(
        client: Client,
        provider: ProviderKind,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            client,
            provider,
            base_url: base_url.into(),
            api_key: api_key.into(),
            timeout: TIMEOUT,
            retry_delay: RETRY_DELAY,
        }
    }

    /// Overrides the per-attempt timeout and retry backoff.
    pub fn with_timing(mut self, timeout: Duration, retry_delay: Duration) -> Self {
        self.timeout = timeout;
        self.retry_delay = retry_delay;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Performs a POST with a JSON body and decodes the JSON response.
    /// Retries once, and only on network-level failure.
    #[tracing::instrument(skip(self, body))]
    pub async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.request(Method::POST, path, Some(body)).await
    }

    async fn request<B, T>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let mut attempt = 1;
        loop {
            match self.request_once(method.clone(), path, body).await {
                Ok(value) => return Ok(value),
                Err(err) if err.is_network() && attempt < MAX_ATTEMPTS => {
                    warn!(
                        "{}: attempt {}/{} failed ({}), retrying in {}ms...",
                        self.provider,
                        attempt,
                        MAX_ATTEMPTS,
                        err,
                        self.retry_delay.as_millis()
                    );
                    tokio::time::sleep(self.retry_delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// A single attempt: issue the call and classify its outcome.
    async fn request_once<B, T>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        debug!("{} {} {}...", self.provider, method, url);

        let mut request = self
            .client
            .request(method.clone(), &url)
            .timeout(self.timeout)
            .header("X-API-Key", &self.api_key);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = match request.send().await {
            Ok(response) => response,
            // No HTTP response obtained: network-level, eligible for retry.
            Err(source) => return Err(self.error(method, path, self.network(source))),
        };

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(self.error(method, path, FailureKind::Provider { status, body }));
        }

        response.json::<T>().await.map_err(|source| {
            let kind = if source.is_decode() {
                FailureKind::Decode(source)
            } else {
                // Reading the body can still fail at the network level.
                self.network(source)
            };
            self.error(method, path, kind)
        })
    }

    fn network(&self, source: reqwest::Error) -> FailureKind {
        FailureKind::Network {
            source,
            url: self.base_url.clone(),
        }
    }

    fn error(&self, method: Method, path: &str, kind: FailureKind) -> ApiError {
        ApiError {
            provider: self.provider,
            method,
            path: path.to_string(),
            kind,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Instant;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    fn test_client(base_url: &str) -> ApiClient {
        ApiClient::new(
            Client::new(),
            ProviderKind::Transactional,
            base_url,
            "secret",
        )
    }

    #[tokio::test]
    async fn test_post_json_success() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/send")
            .match_header("x-api-key", "secret")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"accepted": true, "id": "m-1"}"#)
            .create_async()
            .await;

        #[derive(serde::Deserialize)]
        struct TestResponse {
            accepted: bool,
            id: String,
        }

        let client = test_client(&server.url());
        let result: TestResponse = client
            .post_json("/send", &json!({"to": "a@example.com"}))
            .await
            .unwrap();

        mock.assert_async().await;
        assert!(result.accepted);
        assert_eq!(result.id, "m-1");
    }

    #[tokio::test]
    async fn test_non_2xx_is_provider_failure_with_one_attempt() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/send")
            .with_status(422)
            .with_body(r#"{"error":"missing subject"}"#)
            .expect(1)
            .create_async()
            .await;

        let client = test_client(&server.url());
        let err = client
            .post_json::<_, serde_json::Value>("/send", &json!({}))
            .await
            .unwrap_err();

        mock.assert_async().await;
        assert!(!err.is_network());
        assert_eq!(err.status().map(|s| s.as_u16()), Some(422));
        assert!(
            err.to_string()
                .contains(r#"422 - {"error":"missing subject"}"#)
        );
    }

    #[tokio::test]
    async fn test_server_error_is_provider_failure_and_not_retried() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/stats")
            .with_status(500)
            .with_body("internal error")
            .expect(1)
            .create_async()
            .await;

        let client = test_client(&server.url());
        let err = client
            .post_json::<_, serde_json::Value>("/stats", &json!({}))
            .await
            .unwrap_err();

        mock.assert_async().await;
        assert!(matches!(err.kind, FailureKind::Provider { .. }));
    }

    #[tokio::test]
    async fn test_decode_failure_is_not_retried() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/send")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body("definitely not json")
            .expect(1)
            .create_async()
            .await;

        #[derive(serde::Deserialize, Debug)]
        #[allow(dead_code)]
        struct TestResponse {
            accepted: bool,
        }

        let client = test_client(&server.url());
        let err = client
            .post_json::<_, TestResponse>("/send", &json!({}))
            .await
            .unwrap_err();

        mock.assert_async().await;
        assert!(matches!(err.kind, FailureKind::Decode(_)));
        assert!(!err.is_network());
    }

    #[tokio::test]
    async fn test_network_failure_retries_once_then_succeeds() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let hits = Arc::new(AtomicUsize::new(0));
        let server_hits = Arc::clone(&hits);

        tokio::spawn(async move {
            // First connection is dropped before any response bytes: the
            // client sees a network-level failure.
            let (stream, _) = listener.accept().await.unwrap();
            server_hits.fetch_add(1, Ordering::SeqCst);
            drop(stream);

            // Second connection gets a real response.
            let (mut stream, _) = listener.accept().await.unwrap();
            server_hits.fetch_add(1, Ordering::SeqCst);
            let mut buf = [0u8; 8192];
            let _ = stream.read(&mut buf).await;
            let body = r#"{"accepted":true}"#;
            let response = format!(
                "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                body.len(),
                body
            );
            stream.write_all(response.as_bytes()).await.unwrap();
        });

        let client = test_client(&format!("http://{}", addr));
        let started = Instant::now();
        let value: serde_json::Value = client.post_json("/send", &json!({})).await.unwrap();

        assert_eq!(value["accepted"], json!(true));
        assert_eq!(hits.load(Ordering::SeqCst), 2);
        // The backoff keeps at least RETRY_DELAY between the two attempts.
        assert!(started.elapsed() >= RETRY_DELAY);
    }

    #[tokio::test]
    async fn test_timeout_on_both_attempts_is_network_failure() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let hits = Arc::new(AtomicUsize::new(0));
        let server_hits = Arc::clone(&hits);

        tokio::spawn(async move {
            // Accept connections but never respond.
            let mut held = Vec::new();
            loop {
                let (stream, _) = listener.accept().await.unwrap();
                server_hits.fetch_add(1, Ordering::SeqCst);
                held.push(stream);
            }
        });

        let client = test_client(&format!("http://{}", addr))
            .with_timing(Duration::from_millis(200), Duration::from_millis(50));
        let err = client
            .post_json::<_, serde_json::Value>("/send", &json!({}))
            .await
            .unwrap_err();

        assert!(err.is_network());
        assert_eq!(err.status(), None);
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_unreachable_host_is_network_failure() {
        let client = ApiClient::new(
            Client::new(),
            ProviderKind::Broadcast,
            "http://gateway-test.invalid",
            "secret",
        )
        .with_timing(Duration::from_millis(500), Duration::from_millis(10));

        let err = client
            .post_json::<_, serde_json::Value>("/send", &json!({}))
            .await
            .unwrap_err();

        assert!(err.is_network());
        assert!(err.to_string().contains("broadcast POST /send"));
        assert!(err.to_string().contains("(url: http://gateway-test.invalid)"));
    }
}
