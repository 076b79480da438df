//! HTTP transport to the support backend.

use futures::StreamExt;
use futures::stream::BoxStream;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::future::Future;
use thiserror::Error;
use tracing::debug;

use crate::config::Config;
use crate::events::ResponseMode;

/// Raw body chunks of a streamed answer, in arrival order
pub type ChunkStream = BoxStream<'static, Result<Vec<u8>, TransportError>>;

/// Anything that stops an answer from reaching the conversation
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("support backend responded with {0}")]
    Status(StatusCode),

    #[error("response has no body to stream")]
    MissingBody,

    #[error("could not read answer: {0}")]
    Decode(String),

    #[error("answer stream interrupted: {0}")]
    Stream(String),
}

/// Request body shared by both endpoints
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    question: &'a str,
}

/// Single-shot response body
#[derive(Debug, Deserialize)]
struct ChatResponse {
    answer: String,
}

/// Source of answers for the driver
pub trait SupportBackend: Send + Sync + 'static {
    /// Fetch the complete answer in one exchange
    fn ask(&self, question: &str) -> impl Future<Output = Result<String, TransportError>> + Send;

    /// Start an exchange whose body is read incrementally
    fn open_stream(
        &self,
        question: &str,
    ) -> impl Future<Output = Result<ChunkStream, TransportError>> + Send;
}

/// reqwest-backed client for the support API
#[derive(Clone)]
pub struct SupportClient {
    client: reqwest::Client,
    chat_url: String,
    stream_url: String,
}

impl SupportClient {
    pub fn new(config: &Config) -> Result<Self, TransportError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.request_timeout() {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            chat_url: config.endpoint_url(ResponseMode::Single),
            stream_url: config.endpoint_url(ResponseMode::Stream),
        })
    }

    async fn post(&self, url: &str, question: &str) -> Result<reqwest::Response, TransportError> {
        let response = self
            .client
            .post(url)
            .header("Content-Type", "application/json")
            .json(&ChatRequest { question })
            .send()
            .await?;

        let status = response.status();
        debug!(%url, %status, "support backend responded");
        if !status.is_success() {
            return Err(TransportError::Status(status));
        }
        Ok(response)
    }
}

impl SupportBackend for SupportClient {
    async fn ask(&self, question: &str) -> Result<String, TransportError> {
        let response = self.post(&self.chat_url, question).await?;
        let body = response.text().await?;
        let parsed: ChatResponse =
            serde_json::from_str(&body).map_err(|e| TransportError::Decode(e.to_string()))?;
        Ok(parsed.answer)
    }

    async fn open_stream(&self, question: &str) -> Result<ChunkStream, TransportError> {
        let response = self.post(&self.stream_url, question).await?;
        if response.status() == StatusCode::NO_CONTENT || response.content_length() == Some(0) {
            return Err(TransportError::MissingBody);
        }

        let chunks = response
            .bytes_stream()
            .map(|chunk| {
                chunk
                    .map(|bytes| bytes.to_vec())
                    .map_err(|e| TransportError::Stream(e.to_string()))
            })
            .boxed();
        Ok(chunks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{StubResponse, StubServer};

    fn client_for(server: &StubServer) -> SupportClient {
        let mut config = Config::default();
        config.api_url = server.base_url();
        SupportClient::new(&config).unwrap()
    }

    #[tokio::test]
    async fn ask_posts_question_and_reads_answer() {
        let server = StubServer::start(StubResponse::json(200, r#"{"answer": "Go to Events > New."}"#)).await;
        let client = client_for(&server);

        let answer = client.ask("How do I create an event?").await.unwrap();
        assert_eq!(answer, "Go to Events > New.");

        // The Json extractor only accepts application/json bodies.
        let request = server.request().await;
        assert_eq!(request.path, "/api/chat");
        assert_eq!(request.body, serde_json::json!({ "question": "How do I create an event?" }));
    }

    #[tokio::test]
    async fn ask_rejects_non_success_status() {
        let server = StubServer::start(StubResponse::json(500, r#"{"detail": "boom"}"#)).await;
        let client = client_for(&server);

        match client.ask("anything").await {
            Err(TransportError::Status(status)) => assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR),
            other => panic!("expected status error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn ask_without_answer_field_is_a_decode_error() {
        let server = StubServer::start(StubResponse::json(200, r#"{"reply": "wrong field"}"#)).await;
        let client = client_for(&server);

        assert!(matches!(client.ask("anything").await, Err(TransportError::Decode(_))));
    }

    #[tokio::test]
    async fn open_stream_yields_body_bytes_in_order() {
        let server = StubServer::start(StubResponse::chunked(vec![
            b"Go ".to_vec(),
            b"to Events".to_vec(),
            b" > New.".to_vec(),
        ]))
        .await;
        let client = client_for(&server);

        let mut stream = client.open_stream("How do I create an event?").await.unwrap();
        let mut body = Vec::new();
        while let Some(chunk) = stream.next().await {
            body.extend(chunk.unwrap());
        }
        assert_eq!(String::from_utf8(body).unwrap(), "Go to Events > New.");
        let request = server.request().await;
        assert_eq!(request.path, "/api/chat/stream");
        assert_eq!(request.body["question"], "How do I create an event?");
    }

    #[tokio::test]
    async fn open_stream_without_body_fails() {
        let server = StubServer::start(StubResponse::no_content()).await;
        let client = client_for(&server);

        assert!(matches!(
            client.open_stream("anything").await,
            Err(TransportError::MissingBody)
        ));
    }

    #[tokio::test]
    async fn unreachable_backend_is_a_request_error() {
        let mut config = Config::default();
        config.api_url = "http://127.0.0.1:9".to_string();
        let client = SupportClient::new(&config).unwrap();

        assert!(matches!(client.ask("anything").await, Err(TransportError::Request(_))));
    }
}
