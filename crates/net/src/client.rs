//! Gateway client for platform adapters
//!
//! An adapter connects, introduces itself, then consumes rendering
//! directives and pushes platform events back. Also used by integration
//! tests as a stand-in adapter.

use std::net::SocketAddr;

use tokio::io::{ReadHalf, WriteHalf};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::frame::{read_frame, write_frame};
use crate::protocol::Message;

/// Depth of the directive and event queues
const QUEUE_DEPTH: usize = 64;

/// Client handle for a connected adapter
pub struct AdapterClient {
    directive_rx: mpsc::Receiver<Message>,
    event_tx: mpsc::Sender<Message>,
}

impl AdapterClient {
    /// Connect to the gateway and complete the hello handshake
    pub async fn connect(addr: SocketAddr, adapter_id: Uuid, name: String) -> Result<Self> {
        info!(addr = %addr, adapter_id = %adapter_id, "Connecting to gateway");

        let stream = TcpStream::connect(addr).await?;
        let (mut reader, mut writer) = tokio::io::split(stream);

        write_frame(&mut writer, &Message::AdapterHello { adapter_id, name }).await?;

        match read_frame(&mut reader).await? {
            Message::HelloAck { service, version } => {
                debug!(service = %service, version = %version, "Gateway accepted adapter");
            }
            Message::HelloRejected { reason } => return Err(Error::Handshake(reason)),
            _ => return Err(Error::Protocol("Expected HelloAck".into())),
        }

        let (directive_tx, directive_rx) = mpsc::channel(QUEUE_DEPTH);
        let (event_tx, event_rx) = mpsc::channel(QUEUE_DEPTH);

        tokio::spawn(connection_task(reader, writer, directive_tx, event_rx));

        Ok(AdapterClient {
            directive_rx,
            event_tx,
        })
    }

    /// Next rendering directive from the service; `None` once disconnected
    pub async fn next_directive(&mut self) -> Option<Message> {
        self.directive_rx.recv().await
    }

    /// Forward a platform event to the service
    pub async fn send(&self, msg: Message) -> Result<()> {
        self.event_tx
            .send(msg)
            .await
            .map_err(|_| Error::NotConnected)
    }
}

/// Pumps frames both ways until either side goes away
async fn connection_task(
    mut reader: ReadHalf<TcpStream>,
    mut writer: WriteHalf<TcpStream>,
    directive_tx: mpsc::Sender<Message>,
    mut event_rx: mpsc::Receiver<Message>,
) {
    loop {
        tokio::select! {
            frame = read_frame(&mut reader) => {
                match frame {
                    Ok(msg) => {
                        if directive_tx.send(msg).await.is_err() {
                            debug!("Directive consumer dropped, closing connection");
                            break;
                        }
                    }
                    Err(Error::ConnectionClosed) => {
                        debug!("Gateway closed the connection");
                        break;
                    }
                    Err(e) => {
                        warn!(error = %e, "Read error");
                        break;
                    }
                }
            }
            event = event_rx.recv() => {
                match event {
                    Some(msg) => {
                        if let Err(e) = write_frame(&mut writer, &msg).await {
                            warn!(error = %e, "Write failed");
                            break;
                        }
                    }
                    None => {
                        debug!("Adapter handle dropped, closing connection");
                        break;
                    }
                }
            }
        }
    }
}
