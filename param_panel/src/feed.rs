//! Feed client: one WebSocket connection owned by a single task.
//!
//! The task connects once. There is no reconnect; after a close or a transport
//! error every queued request is logged and dropped.

use crate::config::FeedConfig;
use crate::error::FeedError;
use futures_util::{SinkExt, StreamExt};
use panel_protocol::ClientRequest;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::header::SEC_WEBSOCKET_PROTOCOL;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::Message;

pub const COMMAND_CAP: usize = 256;
pub const EVENT_CAP: usize = 256;

type FeedSocket =
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

pub enum FeedCommand {
    Send(ClientRequest),
    Close,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FeedEvent {
    Opened,
    /// Raw text of one inbound message.
    Message(String),
    Error(String),
    Closed,
}

/// Anything that can carry an outbound request towards the feed.
pub trait RequestSink {
    fn send_request(&self, request: ClientRequest);
}

#[derive(Clone)]
pub struct FeedHandle {
    tx: mpsc::Sender<FeedCommand>,
}

impl FeedHandle {
    pub fn close(&self) {
        let _ = self.tx.try_send(FeedCommand::Close);
    }
}

impl RequestSink for FeedHandle {
    fn send_request(&self, request: ClientRequest) {
        if let Err(e) = self.tx.try_send(FeedCommand::Send(request)) {
            tracing::error!("feed client unavailable: {e}");
        }
    }
}

/// Spawns the connection task on the current runtime.
pub fn spawn(config: FeedConfig) -> (FeedHandle, mpsc::Receiver<FeedEvent>) {
    let (cmd_tx, cmd_rx) = mpsc::channel(COMMAND_CAP);
    let (event_tx, event_rx) = mpsc::channel(EVENT_CAP);
    tokio::spawn(run(config, cmd_rx, event_tx));
    (FeedHandle { tx: cmd_tx }, event_rx)
}

pub async fn run(
    config: FeedConfig,
    mut rx: mpsc::Receiver<FeedCommand>,
    events: mpsc::Sender<FeedEvent>,
) {
    let mut socket = match connect(&config).await {
        Ok(socket) => {
            tracing::info!(url = %config.url, "feed connection established");
            emit(&events, FeedEvent::Opened).await;
            Some(socket)
        }
        Err(e) => {
            tracing::error!(url = %config.url, "feed connection failed: {e}");
            emit(&events, FeedEvent::Error(e.to_string())).await;
            None
        }
    };

    loop {
        let Some(ws) = socket.as_mut() else {
            match rx.recv().await {
                Some(FeedCommand::Send(request)) => {
                    tracing::error!(id = ?request.id(), "feed is not open; request dropped");
                }
                Some(FeedCommand::Close) | None => return,
            }
            continue;
        };

        let mut lost = false;
        tokio::select! {
            cmd = rx.recv() => match cmd {
                Some(FeedCommand::Send(request)) => {
                    if let Err(e) = send_json(ws, &request).await {
                        tracing::error!(id = ?request.id(), "feed send failed: {e}");
                        emit(&events, FeedEvent::Error(e.to_string())).await;
                    }
                }
                Some(FeedCommand::Close) | None => {
                    let _ = ws.close(None).await;
                    tracing::info!("feed connection closed");
                    emit(&events, FeedEvent::Closed).await;
                    return;
                }
            },
            incoming = ws.next() => match incoming {
                Some(Ok(Message::Text(text))) => {
                    tracing::debug!(bytes = text.len(), "feed message received");
                    emit(&events, FeedEvent::Message(text.as_str().to_owned())).await;
                }
                Some(Ok(Message::Close(_))) | None => {
                    tracing::info!("feed connection closed by peer");
                    emit(&events, FeedEvent::Closed).await;
                    lost = true;
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    tracing::error!("feed error: {e}");
                    emit(&events, FeedEvent::Error(e.to_string())).await;
                    emit(&events, FeedEvent::Closed).await;
                    lost = true;
                }
            }
        }

        if lost {
            socket = None;
        }
    }
}

async fn connect(config: &FeedConfig) -> Result<FeedSocket, FeedError> {
    let mut request = config.url.as_str().into_client_request()?;
    let protocol = HeaderValue::from_str(&config.subprotocol)
        .map_err(|_| FeedError::InvalidSubprotocol(config.subprotocol.clone()))?;
    request.headers_mut().insert(SEC_WEBSOCKET_PROTOCOL, protocol);

    let (socket, response) = tokio_tungstenite::connect_async(request).await?;
    tracing::debug!(status = %response.status(), "feed handshake complete");
    Ok(socket)
}

async fn send_json(ws: &mut FeedSocket, request: &ClientRequest) -> Result<(), FeedError> {
    let payload = serde_json::to_string(request)?;
    ws.send(Message::Text(payload.into())).await?;
    Ok(())
}

async fn emit(events: &mpsc::Sender<FeedEvent>, event: FeedEvent) {
    let _ = events.send(event).await;
}
