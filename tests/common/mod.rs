//! In-process stand-in for the conversion service.
//!
//! Uploaded files are read as `key=value` lines; the keys are the fields.
//! A few magic file contents trigger failure paths:
//! - `reject` -> 400 from both endpoints
//! - `malformed` -> 200 with a non-JSON body from `/api/analyze`

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use axum::Router;
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;

#[derive(Clone, Debug, Default)]
#[allow(dead_code)]
pub struct Received {
    pub endpoint: &'static str,
    pub file_name: Option<String>,
    pub file: Vec<u8>,
    /// Non-file parts, by name.
    pub texts: BTreeMap<String, String>,
}

#[derive(Default)]
struct StubState {
    received: Mutex<Vec<Received>>,
}

pub struct StubServer {
    pub base_url: String,
    state: Arc<StubState>,
    shutdown: Option<tokio::sync::oneshot::Sender<()>>,
    thread: Option<std::thread::JoinHandle<()>>,
}

impl Drop for StubServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(t) = self.thread.take() {
            let _ = t.join();
        }
    }
}

#[allow(dead_code)]
impl StubServer {
    pub fn received(&self) -> Vec<Received> {
        self.state.received.lock().unwrap().clone()
    }

    pub fn last(&self, endpoint: &str) -> Option<Received> {
        self.received()
            .into_iter()
            .rev()
            .find(|r| r.endpoint == endpoint)
    }
}

pub fn spawn_stub() -> Result<StubServer> {
    let state = Arc::new(StubState::default());
    let (addr_tx, addr_rx) = std::sync::mpsc::channel::<Result<SocketAddr, String>>();
    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

    let app = Router::new()
        .route("/api/analyze", post(analyze))
        .route("/api/convert", post(convert))
        .with_state(state.clone());

    let thread = std::thread::spawn(move || {
        let rt = match tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .enable_all()
            .build()
        {
            Ok(rt) => rt,
            Err(err) => {
                let _ = addr_tx.send(Err(err.to_string()));
                return;
            }
        };
        rt.block_on(async move {
            let listener = match tokio::net::TcpListener::bind("127.0.0.1:0").await {
                Ok(l) => l,
                Err(err) => {
                    let _ = addr_tx.send(Err(err.to_string()));
                    return;
                }
            };
            let _ = addr_tx.send(listener.local_addr().map_err(|e| e.to_string()));
            let _ = axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await;
        });
    });

    let addr = addr_rx
        .recv()
        .context("stub server thread exited early")?
        .map_err(anyhow::Error::msg)
        .context("start stub server")?;

    Ok(StubServer {
        base_url: format!("http://{}", addr),
        state,
        shutdown: Some(shutdown_tx),
        thread: Some(thread),
    })
}

/// A base URL nothing listens on.
#[allow(dead_code)]
pub fn dead_url() -> Result<String> {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").context("bind unused port")?;
    let addr = listener.local_addr().context("unused port addr")?;
    drop(listener);
    Ok(format!("http://{}", addr))
}

async fn read_parts(endpoint: &'static str, mut multipart: Multipart) -> Result<Received> {
    let mut rec = Received {
        endpoint,
        ..Default::default()
    };
    while let Some(field) = multipart.next_field().await.context("next field")? {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(|s| s.to_string());
        let bytes = field.bytes().await.context("field bytes")?;
        if name == "file" {
            rec.file_name = file_name;
            rec.file = bytes.to_vec();
        } else {
            rec.texts
                .insert(name, String::from_utf8_lossy(&bytes).into_owned());
        }
    }
    Ok(rec)
}

fn keys(file: &[u8]) -> Vec<String> {
    String::from_utf8_lossy(file)
        .lines()
        .filter_map(|l| l.split_once('='))
        .map(|(k, _)| k.trim().to_string())
        .collect()
}

fn bad_request(msg: &str) -> Response {
    (StatusCode::BAD_REQUEST, msg.to_string()).into_response()
}

async fn analyze(State(state): State<Arc<StubState>>, multipart: Multipart) -> Response {
    let rec = match read_parts("analyze", multipart).await {
        Ok(r) => r,
        Err(err) => return bad_request(&format!("{:#}", err)),
    };
    state.received.lock().unwrap().push(rec.clone());

    match rec.file.as_slice() {
        b"reject" => bad_request("Error analyzing file: unsupported input"),
        b"malformed" => (StatusCode::OK, "fields: a, b").into_response(),
        file => axum::Json(serde_json::json!({
            "fileName": rec.file_name,
            "fields": keys(file),
        }))
        .into_response(),
    }
}

async fn convert(State(state): State<Arc<StubState>>, multipart: Multipart) -> Response {
    let rec = match read_parts("convert", multipart).await {
        Ok(r) => r,
        Err(err) => return bad_request(&format!("{:#}", err)),
    };
    state.received.lock().unwrap().push(rec.clone());

    if rec.file == b"reject" {
        return bad_request("Error converting file: unsupported input");
    }

    let mapping: BTreeMap<String, String> = rec
        .texts
        .get("mapping")
        .and_then(|m| serde_json::from_str(m).ok())
        .unwrap_or_default();

    let mut out = serde_json::Map::new();
    for line in String::from_utf8_lossy(&rec.file).lines() {
        let Some((k, v)) = line.split_once('=') else {
            continue;
        };
        let k = k.trim();
        if !mapping.is_empty() {
            if let Some(target) = mapping.get(k) {
                out.insert(target.clone(), v.trim().into());
            }
        } else {
            out.insert(k.to_string(), v.trim().into());
        }
    }
    let body = serde_json::to_vec_pretty(&out).unwrap_or_default();
    (
        [(axum::http::header::CONTENT_TYPE, "application/json")],
        body,
    )
        .into_response()
}
