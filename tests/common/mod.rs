//! Shared helpers: a mock Ollama server and test configuration.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{json, Value};

pub const DIMS: usize = 16;

/// Deterministic bag-of-words vector: each lowercase word adds 1.0 to one
/// bucket, so texts sharing words have positive cosine similarity.
pub fn bow_vector(text: &str) -> Vec<f64> {
    let mut v = vec![0.0; DIMS];
    for word in text
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
    {
        let bucket = word
            .bytes()
            .fold(7usize, |h, b| h.wrapping_mul(31).wrapping_add(b as usize));
        v[bucket % DIMS] += 1.0;
    }
    v
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockMode {
    Healthy,
    ServerError,
    BadRequest,
    Malformed,
    WrongDims,
}

pub struct MockState {
    mode: MockMode,
    pub hits: AtomicUsize,
}

pub struct MockOllama {
    pub url: String,
    pub state: Arc<MockState>,
}

impl MockOllama {
    pub fn hits(&self) -> usize {
        self.state.hits.load(Ordering::SeqCst)
    }
}

async fn embed(State(state): State<Arc<MockState>>, Json(body): Json<Value>) -> Response {
    state.hits.fetch_add(1, Ordering::SeqCst);
    let inputs: Vec<String> = body["input"]
        .as_array()
        .map(|a| {
            a.iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default();

    match state.mode {
        MockMode::Healthy => {
            let embeddings: Vec<Vec<f64>> = inputs.iter().map(|t| bow_vector(t)).collect();
            Json(json!({ "model": body["model"], "embeddings": embeddings })).into_response()
        }
        MockMode::ServerError => (StatusCode::INTERNAL_SERVER_ERROR, "model crashed").into_response(),
        MockMode::BadRequest => (StatusCode::BAD_REQUEST, "model not found").into_response(),
        MockMode::Malformed => Json(json!({ "unexpected": true })).into_response(),
        MockMode::WrongDims => {
            let embeddings: Vec<Vec<f64>> = inputs.iter().map(|_| vec![1.0, 0.0, 0.0]).collect();
            Json(json!({ "embeddings": embeddings })).into_response()
        }
    }
}

/// Start a mock Ollama server on an ephemeral port inside the current runtime.
pub async fn spawn_mock_ollama(mode: MockMode) -> MockOllama {
    let state = Arc::new(MockState {
        mode,
        hits: AtomicUsize::new(0),
    });
    let app = Router::new()
        .route("/api/embed", post(embed))
        .with_state(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    MockOllama {
        url: format!("http://{}", addr),
        state,
    }
}

/// Start a mock server on a dedicated runtime thread, for synchronous tests.
pub fn spawn_mock_ollama_blocking(mode: MockMode) -> MockOllama {
    let (tx, rx) = std::sync::mpsc::channel();
    std::thread::spawn(move || {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async move {
            let mock = spawn_mock_ollama(mode).await;
            tx.send(mock).unwrap();
            std::future::pending::<()>().await;
        });
    });
    rx.recv().unwrap()
}

/// Write a config file under `root/config/cmdcat.toml`.
///
/// `ollama_url = None` configures the disabled provider.
pub fn write_config(root: &Path, ollama_url: Option<&str>) -> PathBuf {
    let config_dir = root.join("config");
    std::fs::create_dir_all(&config_dir).unwrap();

    let embedding = match ollama_url {
        Some(url) => format!(
            r#"[embedding]
provider = "ollama"
model = "mock-embed"
dims = {}
url = "{}"
max_retries = 0
timeout_secs = 5
"#,
            DIMS, url
        ),
        None => "[embedding]\nprovider = \"disabled\"\n".to_string(),
    };

    let content = format!(
        r#"[db]
path = "{}/data/catalog.sqlite"

[retrieval]
default_limit = 5
default_threshold = 0.1

[logging]
filter = "warn"

{}"#,
        root.display(),
        embedding
    );

    let path = config_dir.join("cmdcat.toml");
    std::fs::write(&path, content).unwrap();
    path
}
