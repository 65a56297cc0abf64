//! TCP front end and the event loop that drives the game session

use crate::error::{SendError, ServerError};
use crate::session::{Session, Transport};
use log::{debug, error, info, warn};
use shared::Message;
use std::collections::HashMap;
use std::io;
use std::net::SocketAddr;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::JoinHandle;

/// Messages sent from connection tasks to the main loop
#[derive(Debug)]
pub enum ServerMessage {
    DataReceived { client_id: u32, data: Vec<u8> },
    Closed { client_id: u32 },
    ReadFailed { client_id: u32, error: io::Error },
    WriteFailed { client_id: u32, error: io::Error },
}

/// Per-connection handles kept by the main loop
struct Connection {
    outbox: mpsc::Sender<String>,
    reader: JoinHandle<()>,
    writer: JoinHandle<()>,
}

/// Transport that hands outgoing text to each connection's writer task.
///
/// Sending never blocks the main loop. Each outbox is bounded: a client that
/// stops reading fills it up and surfaces as `SendError::Full`, a writer that
/// has exited leaves a closed channel behind and surfaces as
/// `SendError::Closed`.
#[derive(Default)]
pub struct ChannelTransport {
    connections: HashMap<u32, Connection>,
}

impl ChannelTransport {
    pub fn new() -> Self {
        Self::default()
    }

    fn register(
        &mut self,
        client_id: u32,
        outbox: mpsc::Sender<String>,
        reader: JoinHandle<()>,
        writer: JoinHandle<()>,
    ) {
        self.connections.insert(
            client_id,
            Connection {
                outbox,
                reader,
                writer,
            },
        );
    }

    pub fn contains(&self, client_id: u32) -> bool {
        self.connections.contains_key(&client_id)
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }
}

impl Transport for ChannelTransport {
    fn send(&mut self, client_id: u32, message: &Message) -> Result<(), SendError> {
        let connection = self
            .connections
            .get(&client_id)
            .ok_or(SendError::Unknown(client_id))?;
        match connection.outbox.try_send(message.to_string()) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => {
                // Peer stopped reading; drop the writer with its backlog
                connection.writer.abort();
                Err(SendError::Full(client_id))
            }
            Err(TrySendError::Closed(_)) => Err(SendError::Closed(client_id)),
        }
    }

    fn close(&mut self, client_id: u32) {
        if let Some(connection) = self.connections.remove(&client_id) {
            // Dropping the outbox lets the writer flush what is queued and
            // shut the socket down; the reader has nothing left to deliver.
            connection.reader.abort();
        }
    }
}

/// Accepts connections and funnels all client events into one session
pub struct Server {
    listener: TcpListener,
    session: Session<ChannelTransport>,
    next_client_id: u32,

    // Communication channel from connection tasks
    server_tx: mpsc::UnboundedSender<ServerMessage>,
    server_rx: mpsc::UnboundedReceiver<ServerMessage>,
}

impl Server {
    pub async fn bind(
        addr: &str,
        session: Session<ChannelTransport>,
    ) -> Result<Self, ServerError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ServerError::Bind {
                addr: addr.to_string(),
                source,
            })?;
        info!("Server listening on {}", listener.local_addr()?);

        let (server_tx, server_rx) = mpsc::unbounded_channel();

        Ok(Server {
            listener,
            session,
            next_client_id: 1,
            server_tx,
            server_rx,
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Main loop: the only place the session is touched
    pub async fn run(mut self) -> Result<(), ServerError> {
        info!("Server started successfully");

        loop {
            tokio::select! {
                accepted = self.listener.accept() => {
                    match accepted {
                        Ok((stream, addr)) => self.admit(stream, addr),
                        Err(e) => error!("Failed to accept connection: {}", e),
                    }
                },

                message = self.server_rx.recv() => {
                    match message {
                        Some(message) => self.handle_message(message),
                        None => {
                            info!("Server shutting down");
                            break;
                        }
                    }
                },
            }
        }

        Ok(())
    }

    /// Spawns the reader and writer tasks for a new connection and hands it
    /// to the session
    fn admit(&mut self, stream: TcpStream, addr: SocketAddr) {
        info!("A new client is connecting from {}", addr);

        let client_id = self.allocate_id();

        let (read_half, write_half) = stream.into_split();
        let (outbox_tx, outbox_rx) = mpsc::channel(self.session.config().outbox_capacity.max(1));

        let reader = tokio::spawn(read_loop(
            client_id,
            read_half,
            self.session.config().read_chunk,
            self.server_tx.clone(),
        ));
        let writer = tokio::spawn(write_loop(
            client_id,
            write_half,
            outbox_rx,
            self.server_tx.clone(),
        ));

        self.session
            .transport_mut()
            .register(client_id, outbox_tx, reader, writer);
        self.session.connect(client_id, addr);
    }

    /// Next free client ID. IDs count up from 1 and wrap around, skipping 0
    /// and any ID that still has a live connection.
    fn allocate_id(&mut self) -> u32 {
        loop {
            let client_id = self.next_client_id;
            self.next_client_id = self.next_client_id.wrapping_add(1).max(1);
            if !self.session.transport().contains(client_id) {
                return client_id;
            }
        }
    }

    fn handle_message(&mut self, message: ServerMessage) {
        match message {
            ServerMessage::DataReceived { client_id, data } => {
                self.session.receive(client_id, &data);
            }
            ServerMessage::Closed { client_id } => {
                debug!("Client {} closed the connection", client_id);
                self.session.disconnect(client_id);
            }
            ServerMessage::ReadFailed { client_id, error } => {
                error!("Read from client {} failed: {}", client_id, error);
                self.session.disconnect(client_id);
            }
            ServerMessage::WriteFailed { client_id, error } => {
                warn!("Write to client {} failed: {}", client_id, error);
                self.session.disconnect(client_id);
            }
        }
    }
}

/// Forwards everything read from one connection until EOF or an error
pub async fn read_loop<R>(
    client_id: u32,
    mut reader: R,
    chunk: usize,
    server_tx: mpsc::UnboundedSender<ServerMessage>,
) where
    R: AsyncRead + Unpin,
{
    let mut buffer = vec![0u8; chunk.max(1)];

    loop {
        let (message, finished) = match reader.read(&mut buffer).await {
            Ok(0) => (ServerMessage::Closed { client_id }, true),
            Ok(len) => (
                ServerMessage::DataReceived {
                    client_id,
                    data: buffer[..len].to_vec(),
                },
                false,
            ),
            Err(error) => (ServerMessage::ReadFailed { client_id, error }, true),
        };

        if server_tx.send(message).is_err() || finished {
            break;
        }
    }
}

/// Writes queued text to one connection until the outbox closes
pub async fn write_loop<W>(
    client_id: u32,
    mut writer: W,
    mut outbox: mpsc::Receiver<String>,
    server_tx: mpsc::UnboundedSender<ServerMessage>,
) where
    W: AsyncWrite + Unpin,
{
    while let Some(text) = outbox.recv().await {
        if let Err(error) = writer.write_all(text.as_bytes()).await {
            if server_tx
                .send(ServerMessage::WriteFailed { client_id, error })
                .is_err()
            {
                debug!("Write failure for client {} after shutdown", client_id);
            }
            return;
        }
    }

    if let Err(e) = writer.shutdown().await {
        debug!("Shutdown of client {} failed: {}", client_id, e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServerConfig;
    use crate::dictionary::WordList;
    use tokio_test::io::Builder;

    fn drain(rx: &mut mpsc::UnboundedReceiver<ServerMessage>) -> Vec<ServerMessage> {
        let mut messages = Vec::new();
        while let Ok(message) = rx.try_recv() {
            messages.push(message);
        }
        messages
    }

    #[tokio::test]
    async fn test_read_loop_forwards_fragments_then_close() {
        let mock = Builder::new().read(b"Al").read(b"ice\r\n").build();
        let (tx, mut rx) = mpsc::unbounded_channel();

        read_loop(7, mock, 64, tx).await;

        let messages = drain(&mut rx);
        assert_eq!(messages.len(), 3);
        match &messages[0] {
            ServerMessage::DataReceived { client_id, data } => {
                assert_eq!(*client_id, 7);
                assert_eq!(data, b"Al");
            }
            other => panic!("Unexpected message: {:?}", other),
        }
        match &messages[1] {
            ServerMessage::DataReceived { data, .. } => assert_eq!(data, b"ice\r\n"),
            other => panic!("Unexpected message: {:?}", other),
        }
        assert!(matches!(
            messages[2],
            ServerMessage::Closed { client_id: 7 }
        ));
    }

    #[tokio::test]
    async fn test_read_loop_respects_chunk_size() {
        let mock = Builder::new().read(b"abcdef").build();
        let (tx, mut rx) = mpsc::unbounded_channel();

        read_loop(1, mock, 4, tx).await;

        let sizes: Vec<usize> = drain(&mut rx)
            .iter()
            .filter_map(|message| match message {
                ServerMessage::DataReceived { data, .. } => Some(data.len()),
                _ => None,
            })
            .collect();
        assert_eq!(sizes, vec![4, 2]);
    }

    #[tokio::test]
    async fn test_read_loop_reports_error() {
        let mock = Builder::new()
            .read(b"c\r\n")
            .read_error(io::Error::new(io::ErrorKind::ConnectionReset, "reset"))
            .build();
        let (tx, mut rx) = mpsc::unbounded_channel();

        read_loop(3, mock, 64, tx).await;

        let messages = drain(&mut rx);
        assert_eq!(messages.len(), 2);
        match &messages[1] {
            ServerMessage::ReadFailed { client_id, error } => {
                assert_eq!(*client_id, 3);
                assert_eq!(error.kind(), io::ErrorKind::ConnectionReset);
            }
            other => panic!("Unexpected message: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_write_loop_writes_in_order() {
        let mock = Builder::new()
            .write(b"Your guess?\r\n")
            .write(b"It's bob's turn\r\n")
            .build();
        let (outbox_tx, outbox_rx) = mpsc::channel(4);
        let (tx, mut rx) = mpsc::unbounded_channel();

        outbox_tx.send(Message::YourGuess.to_string()).await.unwrap();
        outbox_tx
            .send(
                Message::TurnOf {
                    name: "bob".to_string(),
                }
                .to_string(),
            )
            .await
            .unwrap();
        drop(outbox_tx);

        write_loop(1, mock, outbox_rx, tx).await;

        assert!(drain(&mut rx).is_empty());
    }

    #[tokio::test]
    async fn test_write_loop_reports_failure() {
        let mock = Builder::new()
            .write_error(io::Error::new(io::ErrorKind::BrokenPipe, "gone"))
            .build();
        let (outbox_tx, outbox_rx) = mpsc::channel(4);
        let (tx, mut rx) = mpsc::unbounded_channel();

        outbox_tx.send("hello\r\n".to_string()).await.unwrap();
        write_loop(5, mock, outbox_rx, tx).await;

        let messages = drain(&mut rx);
        assert!(matches!(
            messages.as_slice(),
            [ServerMessage::WriteFailed { client_id: 5, .. }]
        ));
    }

    fn idle_task() -> JoinHandle<()> {
        tokio::spawn(async {})
    }

    #[tokio::test]
    async fn test_channel_transport_send_and_close() {
        let mut transport = ChannelTransport::new();
        let (outbox_tx, mut outbox_rx) = mpsc::channel(4);
        transport.register(1, outbox_tx, idle_task(), idle_task());

        assert_eq!(transport.send(1, &Message::Welcome), Ok(()));
        assert_eq!(outbox_rx.try_recv().unwrap(), Message::Welcome.to_string());

        transport.close(1);
        assert!(transport.is_empty());
        assert_eq!(
            transport.send(1, &Message::Welcome),
            Err(SendError::Unknown(1))
        );
        // Outbox sender was dropped with the connection
        assert!(outbox_rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_channel_transport_closed_writer() {
        let mut transport = ChannelTransport::new();
        let (outbox_tx, outbox_rx) = mpsc::channel(4);
        transport.register(2, outbox_tx, idle_task(), idle_task());
        drop(outbox_rx);

        assert_eq!(
            transport.send(2, &Message::Welcome),
            Err(SendError::Closed(2))
        );
        assert_eq!(transport.len(), 1);
    }

    #[tokio::test]
    async fn test_channel_transport_full_outbox() {
        let mut transport = ChannelTransport::new();
        let (outbox_tx, _outbox_rx) = mpsc::channel(2);
        transport.register(3, outbox_tx, idle_task(), idle_task());

        assert_eq!(transport.send(3, &Message::Welcome), Ok(()));
        assert_eq!(transport.send(3, &Message::YourGuess), Ok(()));
        assert_eq!(
            transport.send(3, &Message::YourGuess),
            Err(SendError::Full(3))
        );
    }

    #[tokio::test]
    async fn test_client_that_stops_reading_is_removed() {
        let mut session = Session::new(
            ServerConfig::default(),
            Box::new(WordList::sequential(["cat"])),
            ChannelTransport::new(),
        );
        let addr: SocketAddr = "127.0.0.1:9000".parse().unwrap();

        let (alice_tx, mut alice_rx) = mpsc::channel(64);
        session
            .transport_mut()
            .register(1, alice_tx, idle_task(), idle_task());
        // Bob never drains his outbox
        let (bob_tx, _bob_rx) = mpsc::channel(2);
        session
            .transport_mut()
            .register(2, bob_tx, idle_task(), idle_task());

        session.connect(1, addr);
        session.receive(1, b"Alice\r\n");
        session.connect(2, addr);
        session.receive(2, b"Bob\r\n");

        assert!(session.clients().locate(2).is_none());
        assert!(!session.transport().contains(2));
        assert_eq!(session.clients().active_ids(), vec![1]);
        assert_eq!(session.game().turn.current(), Some(1));

        let mut received = Vec::new();
        while let Ok(text) = alice_rx.try_recv() {
            received.push(text);
        }
        let goodbye = Message::Goodbye {
            name: "Bob".to_string(),
        }
        .to_string();
        assert!(received.contains(&goodbye));
    }

    #[tokio::test]
    async fn test_client_ids_wrap_and_skip_live_connections() {
        let session = Session::new(
            ServerConfig::default(),
            Box::new(WordList::sequential(["cat"])),
            ChannelTransport::new(),
        );
        let mut server = Server::bind("127.0.0.1:0", session).await.unwrap();
        let (outbox_tx, _outbox_rx) = mpsc::channel(4);
        server
            .session
            .transport_mut()
            .register(1, outbox_tx, idle_task(), idle_task());

        server.next_client_id = u32::MAX;
        assert_eq!(server.allocate_id(), u32::MAX);
        // 0 is never handed out and 1 is still connected
        assert_eq!(server.allocate_id(), 2);
        assert_eq!(server.allocate_id(), 3);
    }
}
