//! Shared fixtures for unit tests: an axum stub backend and a scripted backend.

use axum::body::Body;
use axum::extract::State;
use axum::http::{header, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use futures::StreamExt;
use serde_json::Value;
use std::collections::VecDeque;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::{mpsc, oneshot};

use crate::client::{ChunkStream, SupportBackend, TransportError};

const CHUNK_DELAY: Duration = Duration::from_millis(10);

/// Canned reply served by [`StubServer`] on both chat endpoints
#[derive(Debug, Clone)]
pub enum StubResponse {
    Json(StatusCode, Value),
    /// Streamed body, one part at a time
    Chunked(Vec<Vec<u8>>),
    NoContent,
}

impl StubResponse {
    pub fn json(status: u16, body: &str) -> Self {
        StubResponse::Json(
            StatusCode::from_u16(status).unwrap(),
            serde_json::from_str(body).unwrap(),
        )
    }

    pub fn chunked(parts: Vec<Vec<u8>>) -> Self {
        StubResponse::Chunked(parts)
    }

    pub fn no_content() -> Self {
        StubResponse::NoContent
    }
}

/// The first request the stub received
#[derive(Debug, Clone, PartialEq)]
pub struct ReceivedRequest {
    pub path: String,
    pub body: Value,
}

#[derive(Clone)]
struct StubState {
    response: Arc<StubResponse>,
    request_tx: Arc<Mutex<Option<oneshot::Sender<ReceivedRequest>>>>,
}

async fn respond(State(state): State<StubState>, uri: Uri, Json(body): Json<Value>) -> Response {
    if let Some(tx) = state.request_tx.lock().unwrap().take() {
        let _ = tx.send(ReceivedRequest {
            path: uri.path().to_string(),
            body,
        });
    }

    match state.response.as_ref() {
        StubResponse::Json(status, body) => (*status, Json(body.clone())).into_response(),
        StubResponse::Chunked(parts) => {
            let stream = futures::stream::iter(parts.clone()).then(|part| async move {
                tokio::time::sleep(CHUNK_DELAY).await;
                Ok::<_, Infallible>(part)
            });
            (
                [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
                Body::from_stream(stream),
            )
                .into_response()
        }
        StubResponse::NoContent => StatusCode::NO_CONTENT.into_response(),
    }
}

/// Support backend stand-in on a random local port
pub struct StubServer {
    addr: SocketAddr,
    request_rx: Mutex<Option<oneshot::Receiver<ReceivedRequest>>>,
}

impl StubServer {
    pub async fn start(response: StubResponse) -> Self {
        let (request_tx, request_rx) = oneshot::channel();
        let state = StubState {
            response: Arc::new(response),
            request_tx: Arc::new(Mutex::new(Some(request_tx))),
        };
        let app = Router::new()
            .route("/api/chat", post(respond))
            .route("/api/chat/stream", post(respond))
            .with_state(state);

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            addr,
            request_rx: Mutex::new(Some(request_rx)),
        }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Path and parsed JSON body of the first request
    pub async fn request(&self) -> ReceivedRequest {
        let rx = self.request_rx.lock().unwrap().take().expect("request already taken");
        rx.await.unwrap()
    }
}

/// One scripted reply of [`ScriptedBackend`]
pub enum Script {
    Answer(String),
    Fail(TransportError),
    /// Chunks are released one by one through the paired sender
    Stream(mpsc::UnboundedReceiver<Result<Vec<u8>, TransportError>>),
    /// Waits for the paired sender before answering
    Gated(oneshot::Receiver<String>),
}

/// In-memory backend returning pre-arranged replies in order
#[derive(Default)]
pub struct ScriptedBackend {
    scripts: Mutex<VecDeque<Script>>,
    questions: Mutex<Vec<String>>,
}

impl ScriptedBackend {
    pub fn new(scripts: Vec<Script>) -> Self {
        Self {
            scripts: Mutex::new(scripts.into()),
            questions: Mutex::new(Vec::new()),
        }
    }

    pub fn questions(&self) -> Vec<String> {
        self.questions.lock().unwrap().clone()
    }

    fn next(&self, question: &str) -> Script {
        self.questions.lock().unwrap().push(question.to_string());
        self.scripts
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Script::Fail(TransportError::Stream("no script left".to_string())))
    }
}

/// Sender half for a [`Script::Stream`]
pub fn chunk_channel() -> (
    mpsc::UnboundedSender<Result<Vec<u8>, TransportError>>,
    Script,
) {
    let (tx, rx) = mpsc::unbounded_channel();
    (tx, Script::Stream(rx))
}

/// A stream script whose chunks are all available up front
pub fn chunks(parts: &[&[u8]]) -> Script {
    let (tx, script) = chunk_channel();
    for part in parts {
        tx.send(Ok(part.to_vec())).unwrap();
    }
    script
}

impl SupportBackend for ScriptedBackend {
    async fn ask(&self, question: &str) -> Result<String, TransportError> {
        match self.next(question) {
            Script::Answer(answer) => Ok(answer),
            Script::Fail(error) => Err(error),
            Script::Gated(gate) => gate
                .await
                .map_err(|_| TransportError::Stream("gate dropped".to_string())),
            Script::Stream(_) => Err(TransportError::Decode("stream scripted for ask".to_string())),
        }
    }

    async fn open_stream(&self, question: &str) -> Result<ChunkStream, TransportError> {
        match self.next(question) {
            Script::Stream(rx) => Ok(futures::stream::unfold(rx, |mut rx| async move {
                rx.recv().await.map(|item| (item, rx))
            })
            .boxed()),
            Script::Answer(answer) => Ok(futures::stream::iter(vec![Ok(answer.into_bytes())]).boxed()),
            Script::Fail(error) => Err(error),
            Script::Gated(gate) => {
                let answer = gate
                    .await
                    .map_err(|_| TransportError::Stream("gate dropped".to_string()))?;
                Ok(futures::stream::iter(vec![Ok(answer.into_bytes())]).boxed())
            }
        }
    }
}
