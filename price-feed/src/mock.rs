/// Local JSON-RPC node for client tests
/// Answers every request with one canned reply and records what it received

use axum::{
    extract::{Json, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Router,
};
use ethers::abi::Token;
use rpc_protocol::{encode_hex, RpcError, RpcRequest, RpcResponse};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// What the node answers to every request
#[derive(Clone)]
pub enum MockReply {
    Result(Value),
    Error(RpcError),
    /// Status code and body, sent verbatim
    Raw(u16, String),
    /// Wait before sending the inner reply
    Delayed(Duration, Box<MockReply>),
}

impl MockReply {
    /// ABI-encode `tokens` as the eth_call return data
    pub fn returning(tokens: &[Token]) -> Self {
        MockReply::Result(json!(encode_hex(&ethers::abi::encode(tokens))))
    }
}

struct MockState {
    reply: MockReply,
    requests: Mutex<Vec<RpcRequest>>,
}

pub struct MockNode {
    pub url: String,
    state: Arc<MockState>,
}

impl MockNode {
    /// Requests received so far
    pub fn requests(&self) -> Vec<RpcRequest> {
        self.state.requests.lock().unwrap().clone()
    }
}

pub async fn spawn(reply: MockReply) -> MockNode {
    let state = Arc::new(MockState {
        reply,
        requests: Mutex::new(Vec::new()),
    });

    let app = Router::new()
        .route("/", post(handle))
        .with_state(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    MockNode {
        url: format!("http://{}", addr),
        state,
    }
}

/// URL of a local port nothing listens on
pub async fn unused_local_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

async fn handle(State(state): State<Arc<MockState>>, Json(request): Json<RpcRequest>) -> Response {
    let id = request.id.clone();
    state.requests.lock().unwrap().push(request);

    let mut reply = state.reply.clone();
    while let MockReply::Delayed(delay, inner) = reply {
        tokio::time::sleep(delay).await;
        reply = *inner;
    }

    match reply {
        MockReply::Result(result) => Json(RpcResponse::success(id, result)).into_response(),
        MockReply::Error(error) => Json(RpcResponse::failure(id, error)).into_response(),
        MockReply::Raw(status, body) => (
            StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            body,
        )
            .into_response(),
        MockReply::Delayed(..) => unreachable!(),
    }
}
