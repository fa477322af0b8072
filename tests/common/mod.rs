//! In-process axum backend for client tests.
//!
//! Serves a fixed list of canned responses, in order, on an ephemeral port and
//! records every request it receives.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::net::{SocketAddr, TcpListener as StdListener};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode, Uri, header};
use axum::response::{IntoResponse, Response};

use model_deck::api::ModelApiClient;
use model_deck::config::ApiConfig;

#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: String,
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl Recorded {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn body_json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).unwrap()
    }
}

struct StubState {
    responses: Mutex<VecDeque<(u16, &'static str)>>,
    seen: Mutex<Sender<Recorded>>,
}

pub struct StubServer {
    pub base_url: String,
    requests: Receiver<Recorded>,
}

impl StubServer {
    /// Start a server answering each request with the next `(status, body)`.
    pub fn start(responses: Vec<(u16, &'static str)>) -> Self {
        let (tx, rx) = mpsc::channel();
        let state = Arc::new(StubState {
            responses: Mutex::new(responses.into()),
            seen: Mutex::new(tx),
        });
        let app = Router::new().fallback(record).with_state(state);

        let (addr_tx, addr_rx) = mpsc::channel::<SocketAddr>();
        thread::spawn(move || {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .unwrap();
            runtime.block_on(async move {
                let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
                addr_tx.send(listener.local_addr().unwrap()).unwrap();
                axum::serve(listener, app).await.unwrap();
            });
        });
        let addr = addr_rx.recv_timeout(Duration::from_secs(5)).unwrap();

        Self {
            base_url: format!("http://{addr}"),
            requests: rx,
        }
    }

    pub fn client(&self) -> ModelApiClient {
        ModelApiClient::new(&ApiConfig::new(&self.base_url).unwrap()).unwrap()
    }

    /// Next recorded request (waits briefly for the server thread).
    pub fn next_request(&self) -> Recorded {
        self.requests.recv_timeout(Duration::from_secs(5)).unwrap()
    }

    /// True when no request reached the server.
    pub fn untouched(&self) -> bool {
        self.requests.recv_timeout(Duration::from_millis(200)).is_err()
    }
}

async fn record(
    State(state): State<Arc<StubState>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let recorded = Recorded {
        method: method.to_string(),
        path: uri.path().to_string(),
        headers: headers
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_str().unwrap_or_default().to_string()))
            .collect(),
        body: body.to_vec(),
    };
    state.seen.lock().unwrap().send(recorded).ok();

    let Some((status, body)) = state.responses.lock().unwrap().pop_front() else {
        return (StatusCode::SERVICE_UNAVAILABLE, "no canned response left").into_response();
    };
    let status = StatusCode::from_u16(status).unwrap();
    (status, [(header::CONTENT_TYPE, "application/json")], body).into_response()
}

/// Address where nothing is listening.
pub fn dead_base_url() -> String {
    let listener = StdListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}
