//! WebSocket transport implementation using `tokio-tungstenite`.
//!
//! The accepted stream is split into sink and stream halves, each behind its
//! own mutex. The relay writes to a connection from whatever task handles
//! the peer, while the connection's own handler task sits in `recv` — with a
//! single lock around the whole stream those two would serialize on each
//! other (the receiver holds the lock across its await).

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use futures_util::stream::{SplitSink, SplitStream};
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tokio_tungstenite::tungstenite::Message;

use crate::{Connection, ConnectionId, Incoming, Transport, TransportError};

/// Counter for generating unique connection IDs.
static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

type WsStream =
    tokio_tungstenite::WebSocketStream<tokio::net::TcpStream>;

/// A WebSocket-based [`Transport`] that listens for incoming connections.
pub struct WebSocketTransport {
    listener: TcpListener,
}

impl WebSocketTransport {
    /// Binds a new WebSocket transport to the given address.
    pub async fn bind(addr: &str) -> Result<Self, TransportError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(TransportError::AcceptFailed)?;
        tracing::info!(addr, "WebSocket transport listening");
        Ok(Self { listener })
    }
}

impl Transport for WebSocketTransport {
    type Connection = WebSocketConnection;
    type Error = TransportError;

    async fn accept(&mut self) -> Result<Self::Connection, Self::Error> {
        let (stream, addr) = self
            .listener
            .accept()
            .await
            .map_err(TransportError::AcceptFailed)?;

        let ws = tokio_tungstenite::accept_async(stream)
            .await
            .map_err(|e| {
                TransportError::AcceptFailed(std::io::Error::new(
                    std::io::ErrorKind::ConnectionRefused,
                    e,
                ))
            })?;

        let id = ConnectionId::new(
            NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed),
        );
        tracing::debug!(%id, %addr, "accepted WebSocket connection");

        use futures_util::StreamExt;
        let (sink, stream) = ws.split();

        Ok(WebSocketConnection {
            id,
            sink: Arc::new(Mutex::new(sink)),
            stream: Arc::new(Mutex::new(stream)),
            open: AtomicBool::new(true),
        })
    }

    fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.listener.local_addr()
    }

    async fn shutdown(&self) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// A single WebSocket connection.
pub struct WebSocketConnection {
    id: ConnectionId,
    sink: Arc<Mutex<SplitSink<WsStream, Message>>>,
    stream: Arc<Mutex<SplitStream<WsStream>>>,
    /// Cleared on close, clean end-of-stream, or a failed write.
    open: AtomicBool,
}

impl WebSocketConnection {
    fn send_failed(&self, e: impl std::error::Error + Send + Sync + 'static) -> TransportError {
        self.open.store(false, Ordering::Relaxed);
        TransportError::SendFailed(std::io::Error::new(
            std::io::ErrorKind::BrokenPipe,
            e,
        ))
    }
}

impl Connection for WebSocketConnection {
    type Error = TransportError;

    async fn send(&self, data: &[u8]) -> Result<(), Self::Error> {
        use futures_util::SinkExt;
        if !self.is_open() {
            return Err(TransportError::ConnectionClosed(self.id.to_string()));
        }
        let msg = Message::Binary(data.to_vec().into());
        self.sink
            .lock()
            .await
            .send(msg)
            .await
            .map_err(|e| self.send_failed(e))
    }

    async fn recv(&self) -> Result<Option<Incoming>, Self::Error> {
        use futures_util::StreamExt;
        loop {
            let msg = self.stream.lock().await.next().await;
            match msg {
                Some(Ok(Message::Binary(data))) => {
                    return Ok(Some(Incoming::Data(data.into())));
                }
                Some(Ok(Message::Text(text))) => {
                    return Ok(Some(Incoming::Data(
                        text.as_bytes().to_vec(),
                    )));
                }
                Some(Ok(Message::Pong(_))) => {
                    return Ok(Some(Incoming::Pong));
                }
                Some(Ok(Message::Close(_))) | None => {
                    self.open.store(false, Ordering::Relaxed);
                    return Ok(None);
                }
                // Ping frames are acknowledged by tungstenite itself.
                Some(Ok(_)) => continue,
                Some(Err(e)) => {
                    self.open.store(false, Ordering::Relaxed);
                    return Err(TransportError::ReceiveFailed(
                        std::io::Error::new(
                            std::io::ErrorKind::ConnectionReset,
                            e,
                        ),
                    ));
                }
            }
        }
    }

    async fn ping(&self) -> Result<(), Self::Error> {
        use futures_util::SinkExt;
        if !self.is_open() {
            return Err(TransportError::ConnectionClosed(self.id.to_string()));
        }
        let msg = Message::Ping(Vec::new().into());
        self.sink
            .lock()
            .await
            .send(msg)
            .await
            .map_err(|e| self.send_failed(e))
    }

    async fn close(&self) -> Result<(), Self::Error> {
        use futures_util::SinkExt;
        // First close wins; later calls are no-ops.
        if self
            .open
            .compare_exchange(true, false, Ordering::Relaxed, Ordering::Relaxed)
            .is_err()
        {
            return Ok(());
        }
        self.sink.lock().await.close().await.map_err(|e| {
            TransportError::SendFailed(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                e,
            ))
        })
    }

    fn is_open(&self) -> bool {
        self.open.load(Ordering::Relaxed)
    }

    fn id(&self) -> ConnectionId {
        self.id
    }
}
