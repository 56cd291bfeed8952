use crate::store::ParameterStore;
use crate::MockFeedError;
use crossbeam_channel::Sender;
use panel_protocol::{ClientRequest, ParameterUpdate, ServerMessage, STATUS_ERROR, SUBPROTOCOL};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tungstenite::http::header::SEC_WEBSOCKET_PROTOCOL;
use tungstenite::http::HeaderValue;
use tungstenite::protocol::Message;

const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(2);
const POLL_TIMEOUT: Duration = Duration::from_millis(30);

type Socket = tungstenite::WebSocket<TcpStream>;

pub struct NetworkThread {
    shutdown: Arc<AtomicBool>,
    join_handle: Mutex<Option<JoinHandle<()>>>,
    listen_addr: SocketAddr,
}

impl NetworkThread {
    pub fn spawn_with_addr(
        addr: &str,
        store: Arc<Mutex<ParameterStore>>,
        updates_tx: Sender<ParameterUpdate>,
    ) -> Result<Self, MockFeedError> {
        let listener = TcpListener::bind(addr).map_err(|source| MockFeedError::Bind {
            addr: addr.to_string(),
            source,
        })?;
        listener.set_nonblocking(true)?;
        let listen_addr = listener.local_addr()?;

        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_for_thread = Arc::clone(&shutdown);
        let join_handle =
            thread::spawn(move || run_server(listener, store, updates_tx, shutdown_for_thread));

        Ok(Self {
            shutdown,
            join_handle: Mutex::new(Some(join_handle)),
            listen_addr,
        })
    }

    pub fn listen_addr(&self) -> SocketAddr {
        self.listen_addr
    }

    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::Relaxed);
        if let Ok(mut h) = self.join_handle.lock() {
            if let Some(h) = h.take() {
                let _ = h.join();
            }
        }
    }
}

impl Drop for NetworkThread {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn run_server(
    listener: TcpListener,
    store: Arc<Mutex<ParameterStore>>,
    updates_tx: Sender<ParameterUpdate>,
    shutdown: Arc<AtomicBool>,
) {
    let mut active: Option<(Socket, SocketAddr)> = None;

    while !shutdown.load(Ordering::Relaxed) {
        // Single-client policy: a new connection replaces the previous one.
        loop {
            match listener.accept() {
                Ok((stream, peer)) => {
                    let Some(ws) = handshake(stream) else { continue };
                    if let Some((mut prev, prev_peer)) = active.take() {
                        tracing::info!(%prev_peer, "replacing client");
                        let _ = prev.close(None);
                    }
                    tracing::info!(%peer, "client connected");
                    active = Some((ws, peer));
                }
                Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => break,
                Err(e) => {
                    tracing::error!("accept failed: {e}");
                    break;
                }
            }
        }

        let Some((ws, peer)) = active.as_mut() else {
            thread::sleep(Duration::from_millis(25));
            continue;
        };

        // One message per pass; the read timeout keeps the loop moving.
        match ws.read() {
            Ok(msg) => {
                if handle_inbound(ws, &store, &updates_tx, msg).is_err() {
                    tracing::info!(%peer, "client disconnected");
                    let _ = ws.close(None);
                    active = None;
                }
            }
            Err(tungstenite::Error::Io(e))
                if e.kind() == std::io::ErrorKind::WouldBlock
                    || e.kind() == std::io::ErrorKind::TimedOut => {}
            Err(e) => {
                tracing::info!(%peer, "client gone: {e}");
                active = None;
            }
        }
    }

    if let Some((mut ws, _)) = active {
        let _ = ws.close(None);
    }
}

fn handshake(stream: TcpStream) -> Option<Socket> {
    let _ = stream.set_nonblocking(false);
    let _ = stream.set_nodelay(true);
    let _ = stream.set_read_timeout(Some(HANDSHAKE_TIMEOUT));
    let _ = stream.set_write_timeout(Some(Duration::from_millis(200)));

    let ws = match tungstenite::accept_hdr(stream, negotiate_subprotocol) {
        Ok(ws) => ws,
        Err(e) => {
            tracing::warn!("ws handshake failed: {e}");
            return None;
        }
    };
    let _ = ws.get_ref().set_read_timeout(Some(POLL_TIMEOUT));
    Some(ws)
}

fn negotiate_subprotocol(req: &Request, mut resp: Response) -> Result<Response, ErrorResponse> {
    let offered = req
        .headers()
        .get(SEC_WEBSOCKET_PROTOCOL)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if offered.split(',').any(|p| p.trim() == SUBPROTOCOL) {
        resp.headers_mut()
            .insert(SEC_WEBSOCKET_PROTOCOL, HeaderValue::from_static(SUBPROTOCOL));
    }
    Ok(resp)
}

fn handle_inbound(
    ws: &mut Socket,
    store: &Mutex<ParameterStore>,
    updates_tx: &Sender<ParameterUpdate>,
    msg: Message,
) -> Result<(), ()> {
    let text = match msg {
        Message::Text(s) => s,
        Message::Close(_) => return Err(()),
        _ => return Ok(()),
    };

    let request: ClientRequest = match serde_json::from_str(text.as_str()) {
        Ok(r) => r,
        Err(e) => {
            return send_server_message(
                ws,
                &ServerMessage::Status {
                    level: STATUS_ERROR,
                    message: format!("invalid request: {e}"),
                },
            );
        }
    };

    let Ok(mut store) = store.lock() else {
        return Err(());
    };
    match request {
        ClientRequest::GetParameters {
            parameter_names,
            id,
        } => {
            let parameters = store.get(&parameter_names);
            drop(store);
            tracing::debug!(count = parameters.len(), ?id, "serving parameters");
            send_server_message(ws, &ServerMessage::ParameterValues { parameters, id })
        }
        ClientRequest::SetParameters { parameters, id } => {
            for update in &parameters {
                store.set(update);
                let _ = updates_tx.try_send(update.clone());
            }
            tracing::debug!(count = parameters.len(), ?id, "parameters updated");
            Ok(())
        }
    }
}

fn send_server_message(ws: &mut Socket, msg: &ServerMessage) -> Result<(), ()> {
    let payload = serde_json::to_string(msg).map_err(|_| ())?;
    ws.send(Message::Text(payload.into())).map_err(|_| ())
}
