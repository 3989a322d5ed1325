//! Cross-process bridge channel.
//!
//! The process that owns the storage runs a [`BridgeServer`]; other
//! processes (or threads) talk to it through [`BridgeClient`]s. Each request
//! carries a oneshot reply slot, so calls are synchronous from the client's
//! point of view.
//!
//! Client calls block the current thread and must not be made from inside
//! an async task; use `spawn_blocking` there.

use std::collections::HashMap;

use tokio::sync::{mpsc, oneshot};

use crate::persistence::{ChannelError, FileKind, PersistenceChannel};

type Reply<T> = oneshot::Sender<Result<T, ChannelError>>;

/// A request relayed over the bridge.
#[derive(Debug)]
pub enum BridgeRequest {
    Exists { kind: FileKind, reply: Reply<bool> },
    Read { kind: FileKind, reply: Reply<Vec<u8>> },
    Write { kind: FileKind, bytes: Vec<u8>, reply: Reply<()> },
}

/// Channel that forwards every operation to a [`BridgeServer`].
#[derive(Debug, Clone)]
pub struct BridgeClient {
    kind: FileKind,
    tx: mpsc::Sender<BridgeRequest>,
}

impl BridgeClient {
    pub fn new(tx: mpsc::Sender<BridgeRequest>, kind: FileKind) -> Self {
        Self { kind, tx }
    }

    fn call<T>(&self, request: impl FnOnce(Reply<T>) -> BridgeRequest) -> Result<T, ChannelError> {
        let (reply, response) = oneshot::channel();
        self.tx
            .blocking_send(request(reply))
            .map_err(|_| ChannelError::Bridge("bridge server is gone".to_string()))?;
        response
            .blocking_recv()
            .map_err(|_| ChannelError::Bridge("bridge server dropped the request".to_string()))?
    }
}

impl PersistenceChannel for BridgeClient {
    fn exists(&self) -> Result<bool, ChannelError> {
        let kind = self.kind;
        self.call(|reply| BridgeRequest::Exists { kind, reply })
    }

    fn read(&self) -> Result<Vec<u8>, ChannelError> {
        let kind = self.kind;
        self.call(|reply| BridgeRequest::Read { kind, reply })
    }

    fn write(&self, bytes: &[u8]) -> Result<(), ChannelError> {
        let kind = self.kind;
        let bytes = bytes.to_vec();
        self.call(|reply| BridgeRequest::Write { kind, bytes, reply })
    }
}

/// Serves bridge requests against locally owned channels.
pub struct BridgeServer {
    channels: HashMap<FileKind, Box<dyn PersistenceChannel>>,
    tx: Option<mpsc::Sender<BridgeRequest>>,
    rx: mpsc::Receiver<BridgeRequest>,
}

impl BridgeServer {
    /// Create a server with a request queue of `buffer` entries.
    pub fn new(buffer: usize) -> Self {
        let (tx, rx) = mpsc::channel(buffer.max(1));
        Self {
            channels: HashMap::new(),
            tx: Some(tx),
            rx,
        }
    }

    /// Serve `kind` from `channel`.
    pub fn register(&mut self, kind: FileKind, channel: impl PersistenceChannel + 'static) {
        self.channels.insert(kind, Box::new(channel));
    }

    /// A client connected to this server.
    ///
    /// Clients must be created before [`BridgeServer::run`] is called.
    pub fn client(&self, kind: FileKind) -> Option<BridgeClient> {
        self.tx.clone().map(|tx| BridgeClient::new(tx, kind))
    }

    /// Serve requests until every client has been dropped.
    pub async fn run(mut self) {
        self.tx = None;
        tracing::info!(kinds = self.channels.len(), "Bridge server started");

        while let Some(request) = self.rx.recv().await {
            self.handle(request);
        }

        tracing::info!("Bridge server stopped, all clients disconnected");
    }

    fn handle(&self, request: BridgeRequest) {
        match request {
            BridgeRequest::Exists { kind, reply } => {
                let _ = reply.send(self.channel(kind).and_then(|c| c.exists()));
            }
            BridgeRequest::Read { kind, reply } => {
                let _ = reply.send(self.channel(kind).and_then(|c| c.read()));
            }
            BridgeRequest::Write { kind, bytes, reply } => {
                tracing::debug!(?kind, bytes = bytes.len(), "Bridge write");
                let _ = reply.send(self.channel(kind).and_then(|c| c.write(&bytes)));
            }
        }
    }

    fn channel(&self, kind: FileKind) -> Result<&dyn PersistenceChannel, ChannelError> {
        self.channels
            .get(&kind)
            .map(|c| c.as_ref())
            .ok_or_else(|| ChannelError::Bridge(format!("no channel registered for {:?}", kind)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryChannel;

    #[test]
    fn test_bridge_round_trip() {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let backing = MemoryChannel::new();

        let mut server = BridgeServer::new(4);
        server.register(FileKind::Config, backing.clone());
        let client = server.client(FileKind::Config).unwrap();
        runtime.spawn(server.run());

        assert!(!client.exists().unwrap());
        assert!(matches!(client.read(), Err(ChannelError::NotFound)));

        client.write(b"{\"k\":1}").unwrap();
        assert!(client.exists().unwrap());
        assert_eq!(client.read().unwrap(), b"{\"k\":1}");
        assert_eq!(backing.writes(), 1);
    }

    #[test]
    fn test_unregistered_kind() {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let server = BridgeServer::new(1);
        let client = server.client(FileKind::Config).unwrap();
        runtime.spawn(server.run());

        assert!(matches!(client.exists(), Err(ChannelError::Bridge(_))));
    }

    #[test]
    fn test_server_gone() {
        let server = BridgeServer::new(1);
        let client = server.client(FileKind::Config).unwrap();
        drop(server);

        assert!(matches!(client.write(b"{}"), Err(ChannelError::Bridge(_))));
    }
}
