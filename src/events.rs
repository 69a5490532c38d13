//! Event log subscriptions over the node's WebSocket API.
//!
//! One [`EventSubscription`] brackets a single submit/confirm cycle: it is
//! opened (and acknowledged) before the call is submitted, waits for the
//! event the call should emit, then unsubscribes and closes the socket.

use std::time::Duration;

use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::net::TcpStream;
use tokio::time::{timeout, Instant};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};

use crate::address::Address;
use crate::errors::{TicketError, TicketResult};

const EVENT_LOG_QUERY: &str = "EventLog";
const UNSUBSCRIBE_ACK_TIMEOUT: Duration = Duration::from_secs(2);

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Contract events that settle a pending operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ContractEventKind {
    Mint,
    BatchMint,
    Burn,
}

impl ContractEventKind {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "Mint" => Some(Self::Mint),
            "BatchMint" => Some(Self::BatchMint),
            "Burn" => Some(Self::Burn),
            _ => None,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Mint => "Mint",
            Self::BatchMint => "BatchMint",
            Self::Burn => "Burn",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct EventLog {
    #[serde(rename = "_eventname")]
    pub name: String,
    #[serde(default)]
    pub params: Vec<Value>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct EventLogEntry {
    pub address: String,
    #[serde(default)]
    pub event_logs: Vec<EventLog>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ContractEvent {
    pub kind: ContractEventKind,
    pub address: String,
    pub params: Vec<Value>,
}

/// Decoded server frame.
#[derive(Clone, Debug, PartialEq)]
pub enum SubscriptionFrame {
    /// Echo of our `EventLog` query.
    Subscribed,
    Notification(Vec<EventLogEntry>),
    Unsubscribed,
    Ignored,
}

#[derive(Deserialize)]
struct RawFrame {
    #[serde(rename = "type")]
    kind: Option<String>,
    query: Option<String>,
    #[serde(default)]
    values: Vec<Value>,
}

#[derive(Deserialize)]
struct RawNotification {
    query: String,
    #[serde(default)]
    value: Option<Vec<EventLogEntry>>,
}

pub fn parse_frame(text: &str) -> TicketResult<SubscriptionFrame> {
    let frame: RawFrame = serde_json::from_str(text)
        .map_err(|err| TicketError::Subscription(format!("malformed frame: {err}")))?;
    match (frame.kind.as_deref(), frame.query.as_deref()) {
        (Some("Notification"), _) => {
            let mut entries = Vec::new();
            for value in frame.values {
                let notification: RawNotification = match serde_json::from_value(value) {
                    Ok(notification) => notification,
                    Err(err) => {
                        debug!(error = %err, "skipping unrecognised notification");
                        continue;
                    }
                };
                if notification.query == EVENT_LOG_QUERY {
                    entries.extend(notification.value.unwrap_or_default());
                }
            }
            Ok(SubscriptionFrame::Notification(entries))
        }
        (Some("Unsubscribe"), _) => Ok(SubscriptionFrame::Unsubscribed),
        (None, Some(EVENT_LOG_QUERY)) => Ok(SubscriptionFrame::Subscribed),
        _ => Ok(SubscriptionFrame::Ignored),
    }
}

/// Picks the first event of `kind` emitted by `contract`.
pub fn find_event(
    entries: &[EventLogEntry],
    contract: &Address,
    kind: ContractEventKind,
) -> Option<ContractEvent> {
    entries
        .iter()
        .filter(|entry| contract.matches_hex(&entry.address))
        .flat_map(|entry| {
            entry.event_logs.iter().map(move |log| (entry, log))
        })
        .find(|(_, log)| ContractEventKind::from_name(&log.name) == Some(kind))
        .map(|(entry, log)| ContractEvent {
            kind,
            address: entry.address.clone(),
            params: log.params.clone(),
        })
}

#[derive(Clone, Debug)]
pub struct EventSubscriber {
    endpoint: String,
    ack_timeout: Duration,
}

impl EventSubscriber {
    pub fn new(endpoint: impl Into<String>, ack_timeout: Duration) -> Self {
        Self {
            endpoint: endpoint.into(),
            ack_timeout,
        }
    }

    /// Connects and subscribes to event logs of `contract`, returning once
    /// the server acknowledged the subscription.
    pub async fn open(&self, contract: &Address) -> TicketResult<EventSubscription> {
        let (mut socket, _) = connect_async(self.endpoint.as_str())
            .await
            .map_err(|err| {
                warn!(endpoint = %self.endpoint, error = %err, "event channel connect failed");
                TicketError::Subscription(err.to_string())
            })?;

        let query = json!({ "query": EVENT_LOG_QUERY, "addresses": [contract.to_base16()] });
        socket
            .send(Message::Text(query.to_string().into()))
            .await
            .map_err(|err| TicketError::Subscription(err.to_string()))?;

        let deadline = Instant::now() + self.ack_timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            let frame = timeout(remaining, next_frame(&mut socket))
                .await
                .map_err(|_| {
                    TicketError::Subscription("subscription was not acknowledged".into())
                })??;
            if frame == SubscriptionFrame::Subscribed {
                info!(contract = %contract, "event log subscription acknowledged");
                return Ok(EventSubscription {
                    socket,
                    contract: *contract,
                });
            }
            debug!(?frame, "frame received before subscription acknowledgement");
        }
    }
}

pub struct EventSubscription {
    socket: Socket,
    contract: Address,
}

impl EventSubscription {
    /// Waits until the contract emits `kind`, or until `limit` elapses.
    pub async fn wait_for(
        &mut self,
        kind: ContractEventKind,
        limit: Duration,
    ) -> TicketResult<ContractEvent> {
        let wait = wait_for_event(&mut self.socket, self.contract, kind);
        timeout(limit, wait).await.map_err(|_| {
            TicketError::Subscription(format!(
                "no {} event within {}s",
                kind.as_str(),
                limit.as_secs()
            ))
        })?
    }

    /// Unsubscribes and closes the channel. Failures are only logged.
    pub async fn close(mut self) {
        let unsubscribe = json!({ "query": "Unsubscribe", "type": EVENT_LOG_QUERY });
        if let Err(err) = self
            .socket
            .send(Message::Text(unsubscribe.to_string().into()))
            .await
        {
            warn!(error = %err, "failed to send unsubscribe");
            return;
        }
        match timeout(UNSUBSCRIBE_ACK_TIMEOUT, next_frame(&mut self.socket)).await {
            Ok(Ok(SubscriptionFrame::Unsubscribed)) => {
                debug!(contract = %self.contract, "unsubscription acknowledged")
            }
            Ok(Ok(frame)) => debug!(?frame, "unexpected frame while unsubscribing"),
            Ok(Err(err)) => debug!(error = %err, "event channel ended while unsubscribing"),
            Err(_) => debug!("unsubscription not acknowledged in time"),
        }
        if let Err(err) = self.socket.close(None).await {
            debug!(error = %err, "event channel close failed");
        }
    }
}

async fn wait_for_event(
    socket: &mut Socket,
    contract: Address,
    kind: ContractEventKind,
) -> TicketResult<ContractEvent> {
    loop {
        match next_frame(socket).await? {
            SubscriptionFrame::Notification(entries) => {
                if let Some(event) = find_event(&entries, &contract, kind) {
                    info!(contract = %contract, event = kind.as_str(), "contract event observed");
                    return Ok(event);
                }
                debug!(entries = entries.len(), "event log without awaited event");
            }
            frame => debug!(?frame, "event channel lifecycle frame"),
        }
    }
}

async fn next_frame(socket: &mut Socket) -> TicketResult<SubscriptionFrame> {
    while let Some(message) = socket.next().await {
        let message = message.map_err(|err| TicketError::Subscription(err.to_string()))?;
        match message {
            Message::Text(text) => match parse_frame(text.as_str()) {
                Ok(frame) => return Ok(frame),
                Err(err) => warn!(error = %err, "ignoring undecodable frame"),
            },
            Message::Close(_) => break,
            _ => continue,
        }
    }
    Err(TicketError::Subscription(
        "event channel closed by the server".into(),
    ))
}
