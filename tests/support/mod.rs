//! In-process Zilliqa node, signer daemon, metadata host and event feed used
//! by the integration tests.

#![allow(dead_code)]

use std::collections::HashSet;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::ws::{Message, WebSocket, WebSocketUpgrade},
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use parking_lot::Mutex;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::sync::broadcast;

use concert_tickets::config::AppConfig;

pub const ACCOUNT: &str = "0x4baf5fada8e5db92c3d3242618c5b47133ae003c";
pub const CONTRACT: &str = "0x448261915a80cde9bde7c7a791685200d3a0bf4e";
pub const STRANGER: &str = "0x1111111111111111111111111111111111111111";

pub struct MockChain {
    pub addr: SocketAddr,
    state: Arc<ChainState>,
}

struct ChainState {
    contract_state: Mutex<Value>,
    failing_metadata: Mutex<HashSet<String>>,
    garbled_metadata: Mutex<HashSet<String>>,
    connect_reply: Mutex<Result<Value, Value>>,
    metadata_requests: AtomicUsize,
    signer_calls: Mutex<Vec<Value>>,
    reject_calls: AtomicBool,
    emit_events: AtomicBool,
    ws_frames: Mutex<Vec<Value>>,
    open_sockets: AtomicUsize,
    events: broadcast::Sender<String>,
}

impl MockChain {
    pub async fn start() -> Self {
        let (events, _) = broadcast::channel(16);
        let state = Arc::new(ChainState {
            contract_state: Mutex::new(Value::Null),
            failing_metadata: Mutex::new(HashSet::new()),
            garbled_metadata: Mutex::new(HashSet::new()),
            connect_reply: Mutex::new(Ok(json!({
                "connected": true,
                "account": { "base16": ACCOUNT, "bech32": "zil1fwh4ltdguhde9s7nysnp33d5wye6uqpugufkz7" }
            }))),
            metadata_requests: AtomicUsize::new(0),
            signer_calls: Mutex::new(Vec::new()),
            reject_calls: AtomicBool::new(false),
            emit_events: AtomicBool::new(true),
            ws_frames: Mutex::new(Vec::new()),
            open_sockets: AtomicUsize::new(0),
            events,
        });

        let app = Router::new()
            .route("/", post(node_rpc))
            .route("/signer", post(signer_rpc))
            .route("/metadata/{id}", get(metadata))
            .route("/ws", get(event_feed))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let chain = Self { addr, state };
        chain.set_contract_state(100, 40, &[]);
        chain
    }

    pub fn config(&self) -> AppConfig {
        let mut config = AppConfig::default();
        config.network.rpc_endpoint = format!("http://{}/", self.addr);
        config.network.ws_endpoint = format!("ws://{}/ws", self.addr);
        config.network.request_timeout_secs = 5;
        config.transaction.confirmation_timeout_secs = 3;
        config.wallet.signer_endpoint = Some(format!("http://{}/signer", self.addr));
        config
    }

    pub fn base_uri(&self) -> String {
        format!("http://{}/metadata/", self.addr)
    }

    /// Installs a ticket contract state. `owners` pairs token ids with owner
    /// addresses.
    pub fn set_contract_state(&self, supply: u64, issued: u64, owners: &[(&str, &str)]) {
        let token_owners: serde_json::Map<String, Value> = owners
            .iter()
            .map(|(id, owner)| (id.to_string(), json!(owner)))
            .collect();
        *self.state.contract_state.lock() = json!({
            "_balance": "0",
            "contract_owner": STRANGER,
            "token_name": "Project Concert",
            "token_symbol": "PCT",
            "token_price": "5000000",
            "max_token_supply": supply.to_string(),
            "token_id_count": issued.to_string(),
            "base_uri": self.base_uri(),
            "token_owners": token_owners,
        });
    }

    pub fn fail_metadata_for(&self, id: &str) {
        self.state.failing_metadata.lock().insert(id.to_string());
    }

    /// Serves a 200 response whose body is not JSON.
    pub fn garble_metadata_for(&self, id: &str) {
        self.state.garbled_metadata.lock().insert(id.to_string());
    }

    /// Replaces the signer's answer to `wallet_connect`.
    pub fn answer_connect_with(&self, reply: Result<Value, Value>) {
        *self.state.connect_reply.lock() = reply;
    }

    pub fn metadata_requests(&self) -> usize {
        self.state.metadata_requests.load(Ordering::SeqCst)
    }

    pub fn reject_calls(&self) {
        self.state.reject_calls.store(true, Ordering::SeqCst);
    }

    /// Stops the feed from confirming accepted calls.
    pub fn withhold_events(&self) {
        self.state.emit_events.store(false, Ordering::SeqCst);
    }

    pub fn signer_calls(&self) -> Vec<Value> {
        self.state.signer_calls.lock().clone()
    }

    pub fn ws_frames(&self) -> Vec<Value> {
        self.state.ws_frames.lock().clone()
    }

    pub fn open_sockets(&self) -> usize {
        self.state.open_sockets.load(Ordering::SeqCst)
    }

    /// Waits until every event feed connection has been closed.
    pub async fn wait_for_sockets_closed(&self) -> bool {
        for _ in 0..50 {
            if self.open_sockets() == 0 {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        false
    }
}

async fn node_rpc(State(state): State<Arc<ChainState>>, Json(request): Json<Value>) -> Json<Value> {
    let id = request["id"].clone();
    let result = match request["method"].as_str() {
        Some("GetNetworkId") => Ok(json!("333")),
        Some("GetSmartContractState") => {
            let requested = request["params"][0].as_str().unwrap_or_default();
            if requested == CONTRACT.trim_start_matches("0x") {
                Ok(state.contract_state.lock().clone())
            } else {
                Err(json!({ "code": -5, "message": "Address not contract address" }))
            }
        }
        _ => Err(json!({ "code": -32601, "message": "METHOD_NOT_FOUND" })),
    };
    Json(rpc_reply(id, result))
}

async fn signer_rpc(
    State(state): State<Arc<ChainState>>,
    Json(request): Json<Value>,
) -> Json<Value> {
    let id = request["id"].clone();
    let result = match request["method"].as_str() {
        Some("wallet_connect") => state.connect_reply.lock().clone(),
        Some("wallet_call_contract") => {
            let params = request["params"][0].clone();
            state.signer_calls.lock().push(params.clone());
            if state.reject_calls.load(Ordering::SeqCst) {
                Err(json!({ "code": -32000, "message": "user rejected the transaction" }))
            } else {
                if state.emit_events.load(Ordering::SeqCst) {
                    schedule_event(state.clone(), &params);
                }
                Ok(json!({ "tx_id": "f1e2d3c4", "info": "Non-contract txn, sent to shard" }))
            }
        }
        _ => Err(json!({ "code": -32601, "message": "method not found" })),
    };
    Json(rpc_reply(id, result))
}

fn rpc_reply(id: Value, result: Result<Value, Value>) -> Value {
    match result {
        Ok(result) => json!({ "jsonrpc": "2.0", "id": id, "result": result }),
        Err(error) => json!({ "jsonrpc": "2.0", "id": id, "error": error }),
    }
}

/// Emits the event the called transition produces, shortly after the call.
fn schedule_event(state: Arc<ChainState>, params: &Value) {
    let data: Value = params["data"]
        .as_str()
        .and_then(|raw| serde_json::from_str(raw).ok())
        .unwrap_or(Value::Null);
    let event = match data["_tag"].as_str() {
        Some("Mint") => "Mint",
        Some("BatchMint") => "BatchMint",
        Some("BatchBurn") => "Burn",
        _ => return,
    };
    let address = params["toAddr"]
        .as_str()
        .map(|addr| format!("0x{}", addr.to_ascii_lowercase()))
        .unwrap_or_default();
    let notification = json!({
        "type": "Notification",
        "values": [
            { "query": "NewBlock", "value": { "TxBlock": { "header": { "BlockNum": "42" } } } },
            {
                "query": "EventLog",
                "value": [
                    {
                        "address": STRANGER,
                        "event_logs": [{ "_eventname": event, "params": [] }]
                    },
                    {
                        "address": address,
                        "event_logs": [{ "_eventname": event, "params": [] }]
                    }
                ]
            }
        ]
    })
    .to_string();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        let _ = state.events.send(notification);
    });
}

async fn metadata(State(state): State<Arc<ChainState>>, Path(id): Path<String>) -> Response {
    state.metadata_requests.fetch_add(1, Ordering::SeqCst);
    if state.failing_metadata.lock().contains(&id) {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }
    if state.garbled_metadata.lock().contains(&id) {
        return (StatusCode::OK, "<html>not a ticket</html>").into_response();
    }
    Json(json!({
        "name": format!("Ticket #{id}"),
        "resources": [{ "uri": format!("https://img.example/{id}.png") }],
        "attributes": [{ "value": "A" }, { "value": id }, { "value": "7" }]
    }))
    .into_response()
}

async fn event_feed(State(state): State<Arc<ChainState>>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| serve_feed(socket, state))
}

async fn serve_feed(mut socket: WebSocket, state: Arc<ChainState>) {
    state.open_sockets.fetch_add(1, Ordering::SeqCst);
    let mut events = state.events.subscribe();
    loop {
        tokio::select! {
            incoming = socket.recv() => {
                let text = match incoming {
                    Some(Ok(Message::Text(text))) => text.as_str().to_owned(),
                    Some(Ok(Message::Close(_))) | None | Some(Err(_)) => break,
                    Some(Ok(_)) => continue,
                };
                let frame: Value = serde_json::from_str(&text).unwrap_or(Value::Null);
                state.ws_frames.lock().push(frame.clone());
                let reply = match frame["query"].as_str() {
                    Some("EventLog") => frame.to_string(),
                    Some("Unsubscribe") => json!({ "type": "Unsubscribe", "values": ["EventLog"] }).to_string(),
                    _ => continue,
                };
                if socket.send(Message::Text(reply.into())).await.is_err() {
                    break;
                }
            }
            event = events.recv() => {
                let Ok(event) = event else { continue };
                if socket.send(Message::Text(event.into())).await.is_err() {
                    break;
                }
            }
        }
    }
    state.open_sockets.fetch_sub(1, Ordering::SeqCst);
}
