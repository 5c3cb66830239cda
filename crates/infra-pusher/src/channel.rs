//! Pusher-backed [`ResultChannel`].
//!
//! One WebSocket connection is opened lazily on the first bind and shared
//! by every later bind. A background task owns the socket: it subscribes
//! channels, answers pings, and fires each callback at most once. A channel
//! is unsubscribed as soon as its last callback has fired.

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use selas_core::domain::JobResult;
use selas_core::port::{ChannelError, ResultCallback, ResultChannel};
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use tokio::time::{timeout, Instant};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, trace, warn};

use crate::messages::{
    parse_frame, ping_frame, pong_frame, subscribe_frame, unsubscribe_frame,
    ConnectionEstablished, ErrorData, CONNECTION_ESTABLISHED, ERROR, PING, PONG,
    PROTOCOL_VERSION, SUBSCRIPTION_SUCCEEDED,
};

pub const DEFAULT_CLUSTER: &str = "eu";

const CLIENT_NAME: &str = "selas-rust";
const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_ACTIVITY_TIMEOUT: Duration = Duration::from_secs(120);

type WsStream = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

/// Pusher application to connect to.
#[derive(Debug, Clone)]
pub struct PusherConfig {
    /// Public application key.
    pub app_key: String,
    /// Cluster name, e.g. `eu` (ignored when `host` is set).
    pub cluster: String,
    /// Full WebSocket base URL overriding the cluster host,
    /// e.g. `ws://127.0.0.1:6001` for a self-hosted server.
    pub host: Option<String>,
}

impl PusherConfig {
    pub fn new(app_key: impl Into<String>) -> Self {
        Self {
            app_key: app_key.into(),
            cluster: DEFAULT_CLUSTER.to_string(),
            host: None,
        }
    }

    pub fn with_cluster(mut self, cluster: impl Into<String>) -> Self {
        self.cluster = cluster.into();
        self
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    /// WebSocket URL of the application endpoint.
    pub fn url(&self) -> String {
        let base = match &self.host {
            Some(host) => host.trim_end_matches('/').to_string(),
            None => format!("wss://ws-{}.pusher.com", self.cluster),
        };
        format!(
            "{}/app/{}?protocol={}&client={}&version={}",
            base,
            self.app_key,
            PROTOCOL_VERSION,
            CLIENT_NAME,
            env!("CARGO_PKG_VERSION")
        )
    }
}

struct BindCommand {
    channel: String,
    event: String,
    callback: ResultCallback,
}

struct Binding {
    event: String,
    callback: ResultCallback,
}

/// Result channel over the Pusher WebSocket protocol.
pub struct PusherChannel {
    config: PusherConfig,
    commands: Mutex<Option<mpsc::UnboundedSender<BindCommand>>>,
}

impl PusherChannel {
    pub fn new(config: PusherConfig) -> Self {
        Self {
            config,
            commands: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &PusherConfig {
        &self.config
    }

    /// Open the socket, wait for the handshake and start the connection task.
    async fn connect(&self) -> Result<mpsc::UnboundedSender<BindCommand>, ChannelError> {
        let (mut ws_stream, _response) = connect_async(self.config.url()).await.map_err(|e| {
            ChannelError::Connection(format!(
                "Failed to connect to Pusher (cluster {}): {e}",
                self.config.cluster
            ))
        })?;

        let established = timeout(HANDSHAKE_TIMEOUT, wait_for_established(&mut ws_stream))
            .await
            .map_err(|_| {
                ChannelError::Connection("Timed out waiting for connection_established".to_string())
            })??;

        let activity_timeout = established
            .activity_timeout
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_ACTIVITY_TIMEOUT);

        info!(
            socket_id = %established.socket_id,
            cluster = %self.config.cluster,
            "Connected to Pusher"
        );

        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(run_connection(ws_stream, rx, activity_timeout));
        Ok(tx)
    }
}

#[async_trait]
impl ResultChannel for PusherChannel {
    async fn bind(
        &self,
        channel: &str,
        event: &str,
        callback: ResultCallback,
    ) -> Result<(), ChannelError> {
        let sender = {
            let mut guard = self.commands.lock().await;
            match guard.as_ref() {
                Some(sender) if !sender.is_closed() => sender.clone(),
                _ => {
                    let sender = self.connect().await?;
                    *guard = Some(sender.clone());
                    sender
                }
            }
        };

        sender
            .send(BindCommand {
                channel: channel.to_string(),
                event: event.to_string(),
                callback,
            })
            .map_err(|_| ChannelError::Closed)
    }
}

async fn wait_for_established(
    ws_stream: &mut WsStream,
) -> Result<ConnectionEstablished, ChannelError> {
    while let Some(message) = ws_stream.next().await {
        let message = message.map_err(|e| ChannelError::Connection(e.to_string()))?;
        match message {
            Message::Text(text) => {
                let frame =
                    parse_frame(&text).map_err(|e| ChannelError::Protocol(e.to_string()))?;
                match frame.event.as_str() {
                    CONNECTION_ESTABLISHED => {
                        return serde_json::from_value(frame.payload())
                            .map_err(|e| ChannelError::Protocol(e.to_string()));
                    }
                    ERROR => {
                        let error: ErrorData =
                            serde_json::from_value(frame.payload()).unwrap_or_default();
                        return Err(ChannelError::Connection(format!(
                            "Pusher refused connection ({}): {}",
                            error.code.map(|c| c.to_string()).unwrap_or_default(),
                            error.message
                        )));
                    }
                    other => trace!(event = %other, "Ignoring frame before handshake"),
                }
            }
            Message::Close(_) => return Err(ChannelError::Closed),
            _ => {}
        }
    }
    Err(ChannelError::Closed)
}

/// Connection task: runs until the socket closes or every sender is dropped.
async fn run_connection(
    ws_stream: WsStream,
    mut commands: mpsc::UnboundedReceiver<BindCommand>,
    activity_timeout: Duration,
) {
    let (mut sink, mut stream) = ws_stream.split();
    let mut bindings: HashMap<String, Vec<Binding>> = HashMap::new();
    let idle = tokio::time::sleep(activity_timeout);
    tokio::pin!(idle);

    loop {
        let outgoing = tokio::select! {
            command = commands.recv() => {
                let Some(command) = command else {
                    debug!("Result channel dropped, closing Pusher connection");
                    let _ = sink.send(Message::Close(None)).await;
                    break;
                };
                register(command, &mut bindings)
            }
            message = stream.next() => {
                idle.as_mut().reset(Instant::now() + activity_timeout);
                match message {
                    Some(Ok(Message::Text(text))) => handle_text(&text, &mut bindings),
                    Some(Ok(Message::Close(frame))) => {
                        info!(?frame, "Pusher connection closed");
                        break;
                    }
                    // Ping/pong frames are answered by tungstenite.
                    Some(Ok(_)) => Vec::new(),
                    Some(Err(e)) => {
                        warn!(error = %e, "Pusher receive error");
                        break;
                    }
                    None => break,
                }
            }
            _ = &mut idle => {
                idle.as_mut().reset(Instant::now() + activity_timeout);
                vec![ping_frame()]
            }
        };

        for frame in outgoing {
            if let Err(e) = sink.send(Message::Text(frame)).await {
                warn!(error = %e, "Pusher send error");
                return;
            }
        }
    }

    let pending: usize = bindings.values().map(Vec::len).sum();
    if pending > 0 {
        warn!(pending, "Pusher connection ended with undelivered results");
    }
}

/// Store a binding; returns the subscribe frame for a new channel.
fn register(command: BindCommand, bindings: &mut HashMap<String, Vec<Binding>>) -> Vec<String> {
    let entry = bindings.entry(command.channel.clone()).or_default();
    let first = entry.is_empty();
    entry.push(Binding {
        event: command.event,
        callback: command.callback,
    });

    if first {
        info!(channel = %command.channel, "Subscribing");
        vec![subscribe_frame(&command.channel)]
    } else {
        Vec::new()
    }
}

/// React to one server frame; returns the frames to send back.
fn handle_text(text: &str, bindings: &mut HashMap<String, Vec<Binding>>) -> Vec<String> {
    let frame = match parse_frame(text) {
        Ok(frame) => frame,
        Err(e) => {
            warn!(error = %e, "Malformed Pusher frame");
            return Vec::new();
        }
    };

    match frame.event.as_str() {
        PING => vec![pong_frame()],
        PONG => Vec::new(),
        ERROR => {
            let error: ErrorData = serde_json::from_value(frame.payload()).unwrap_or_default();
            warn!(code = ?error.code, message = %error.message, "Pusher error");
            Vec::new()
        }
        SUBSCRIPTION_SUCCEEDED => {
            debug!(channel = ?frame.channel, "Subscription succeeded");
            Vec::new()
        }
        event => match frame.channel.as_deref() {
            Some(channel) => deliver(channel, event, frame.payload(), bindings),
            None => {
                trace!(event = %event, "Ignoring frame without channel");
                Vec::new()
            }
        },
    }
}

/// Fire and drop every callback bound to (channel, event).
fn deliver(
    channel: &str,
    event: &str,
    payload: serde_json::Value,
    bindings: &mut HashMap<String, Vec<Binding>>,
) -> Vec<String> {
    let Some(registered) = bindings.remove(channel) else {
        return Vec::new();
    };

    let (matching, remaining): (Vec<Binding>, Vec<Binding>) =
        registered.into_iter().partition(|b| b.event == event);

    if !matching.is_empty() {
        debug!(channel = %channel, event = %event, callbacks = matching.len(), "Delivering result");
    }
    for binding in matching {
        (binding.callback)(JobResult::new(payload.clone()));
    }

    if remaining.is_empty() {
        vec![unsubscribe_frame(channel)]
    } else {
        bindings.insert(channel.to_string(), remaining);
        Vec::new()
    }
}
