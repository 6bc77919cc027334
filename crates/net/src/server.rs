//! Gateway server - platform adapters connect here
//!
//! Adapters forward platform events (commands, reactions, view reports) and
//! execute the rendering directives broadcast back to them. The gateway does
//! not interpret either direction; it is transport only.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::io::{ReadHalf, WriteHalf};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{broadcast, mpsc, RwLock};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::frame::{read_frame, write_frame};
use crate::protocol::Message;

/// Maximum number of connected adapters
const MAX_ADAPTERS: usize = 8;

/// Depth of the per-adapter outgoing queue
const ADAPTER_QUEUE: usize = 64;

/// Depth of the shared inbound event queue
const EVENT_QUEUE: usize = 256;

/// Connected adapter state
struct Adapter {
    name: String,
    tx: mpsc::Sender<Message>,
}

/// Gateway state shared across tasks
#[derive(Default)]
struct GatewayState {
    adapters: HashMap<Uuid, Adapter>,
}

/// An event received from a connected adapter
#[derive(Debug, Clone)]
pub struct AdapterEvent {
    pub adapter_id: Uuid,
    pub message: Message,
}

/// Gateway server handle
pub struct Gateway {
    addr: SocketAddr,
    state: Arc<RwLock<GatewayState>>,
    shutdown_tx: broadcast::Sender<()>,
}

impl Gateway {
    /// Start the gateway on the given port; returns the handle and the
    /// inbound event stream
    pub async fn start(port: u16) -> Result<(Self, mpsc::Receiver<AdapterEvent>)> {
        let addr = SocketAddr::from(([0, 0, 0, 0], port));
        let listener = TcpListener::bind(addr).await?;
        let bound_addr = listener.local_addr()?;

        info!(addr = %bound_addr, "Gateway started");

        let state = Arc::new(RwLock::new(GatewayState::default()));
        let (event_tx, event_rx) = mpsc::channel(EVENT_QUEUE);
        let (shutdown_tx, _) = broadcast::channel(1);

        let accept_state = state.clone();
        let shutdown_rx = shutdown_tx.subscribe();
        tokio::spawn(accept_loop(listener, accept_state, event_tx, shutdown_rx));

        Ok((
            Gateway {
                addr: bound_addr,
                state,
                shutdown_tx,
            },
            event_rx,
        ))
    }

    /// Get the gateway's bound address
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Broadcast a directive to every connected adapter
    pub async fn broadcast(&self, msg: Message) {
        let state = self.state.read().await;
        for (adapter_id, adapter) in &state.adapters {
            if adapter.tx.send(msg.clone()).await.is_err() {
                debug!(adapter_id = %adapter_id, name = %adapter.name, "Failed to queue directive for adapter");
            }
        }
    }

    /// Number of connected adapters
    pub async fn adapter_count(&self) -> usize {
        self.state.read().await.adapters.len()
    }

    /// Shutdown the gateway
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());
        info!("Gateway shutdown initiated");
    }
}

/// Accept incoming adapter connections
async fn accept_loop(
    listener: TcpListener,
    state: Arc<RwLock<GatewayState>>,
    event_tx: mpsc::Sender<AdapterEvent>,
    mut shutdown_rx: broadcast::Receiver<()>,
) {
    loop {
        tokio::select! {
            result = listener.accept() => {
                match result {
                    Ok((stream, addr)) => {
                        debug!(addr = %addr, "New adapter connection");
                        let state = state.clone();
                        let event_tx = event_tx.clone();
                        tokio::spawn(handle_adapter(stream, addr, state, event_tx));
                    }
                    Err(e) => {
                        error!(error = %e, "Accept failed");
                    }
                }
            }
            _ = shutdown_rx.recv() => {
                info!("Accept loop shutting down");
                break;
            }
        }
    }
}

/// Handle a single adapter connection
async fn handle_adapter(
    stream: TcpStream,
    addr: SocketAddr,
    state: Arc<RwLock<GatewayState>>,
    event_tx: mpsc::Sender<AdapterEvent>,
) {
    let (mut reader, mut writer) = tokio::io::split(stream);

    // First frame must be AdapterHello
    let (adapter_id, name) = match handshake(&mut reader, &state).await {
        Ok(hello) => hello,
        Err(e) => {
            warn!(addr = %addr, error = %e, "Adapter handshake failed");
            let reason = e.to_string();
            let _ = write_frame(&mut writer, &Message::HelloRejected { reason }).await;
            return;
        }
    };

    let (msg_tx, msg_rx) = mpsc::channel(ADAPTER_QUEUE);
    {
        let mut s = state.write().await;
        s.adapters.insert(
            adapter_id,
            Adapter {
                name: name.clone(),
                tx: msg_tx.clone(),
            },
        );
    }

    let writer_handle = tokio::spawn(writer_task(writer, msg_rx));

    let _ = msg_tx
        .send(Message::HelloAck {
            service: env!("CARGO_PKG_NAME").to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        })
        .await;

    info!(addr = %addr, adapter_id = %adapter_id, name = %name, "Adapter connected");

    // Read loop: pings answered in place, everything else goes upstream
    loop {
        match read_frame(&mut reader).await {
            Ok(Message::Ping) => {
                let _ = msg_tx.send(Message::Pong).await;
            }
            Ok(message) => {
                let event = AdapterEvent {
                    adapter_id,
                    message,
                };
                if event_tx.send(event).await.is_err() {
                    debug!(adapter_id = %adapter_id, "Event stream closed, dropping adapter");
                    break;
                }
            }
            Err(Error::ConnectionClosed) => {
                debug!(adapter_id = %adapter_id, "Adapter connection closed");
                break;
            }
            Err(e) => {
                warn!(adapter_id = %adapter_id, error = %e, "Read error");
                break;
            }
        }
    }

    writer_handle.abort();
    state.write().await.adapters.remove(&adapter_id);
    info!(adapter_id = %adapter_id, "Adapter disconnected");
}

/// Validate the hello frame and capacity
async fn handshake(
    reader: &mut ReadHalf<TcpStream>,
    state: &Arc<RwLock<GatewayState>>,
) -> Result<(Uuid, String)> {
    let msg = read_frame(reader).await?;

    match msg {
        Message::AdapterHello { adapter_id, name } => {
            let s = state.read().await;
            if s.adapters.len() >= MAX_ADAPTERS {
                return Err(Error::GatewayFull);
            }
            if s.adapters.contains_key(&adapter_id) {
                return Err(Error::Handshake("Adapter already connected".into()));
            }
            Ok((adapter_id, name))
        }
        _ => Err(Error::Protocol("Expected AdapterHello".into())),
    }
}

/// Writer task - sends directives to the adapter
async fn writer_task(mut writer: WriteHalf<TcpStream>, mut rx: mpsc::Receiver<Message>) {
    while let Some(msg) = rx.recv().await {
        if let Err(e) = write_frame(&mut writer, &msg).await {
            debug!(error = %e, "Write failed");
            break;
        }
    }
}
