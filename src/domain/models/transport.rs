use std::sync::Arc;

use async_trait::async_trait;

use super::ChatError;

pub type TransportBox = Arc<dyn Transport + Send + Sync>;
pub type ChannelBox = Box<dyn DuplexChannel + Send>;

pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InboundFrame {
    Text(String),
    Close,
    /// Binary, ping and pong frames. The chat protocol only speaks text.
    Other,
}

#[async_trait]
pub trait Transport {
    async fn post(&self, url: &str) -> Result<TransportResponse, ChatError>;

    async fn delete(&self, url: &str) -> Result<TransportResponse, ChatError>;

    /// Opens a duplex streaming channel to `path` on `host:port`.
    async fn open_duplex(&self, host: &str, port: u16, path: &str)
        -> Result<ChannelBox, ChatError>;

    /// Releases any pooled connections. The handle is not used afterwards.
    fn close(&self);
}

#[async_trait]
pub trait DuplexChannel {
    async fn send_text(&mut self, text: String) -> Result<(), ChatError>;

    /// Waits for the next inbound frame. `None` means the channel is closed and
    /// no further frames will arrive.
    async fn next_frame(&mut self) -> Option<Result<InboundFrame, ChatError>>;

    async fn close(&mut self) -> Result<(), ChatError>;
}

/// Produces fresh transport handles. A new handle is created whenever the
/// server endpoint changes.
pub trait TransportFactory {
    fn create(&self) -> TransportBox;
}

pub type TransportFactoryBox = Arc<dyn TransportFactory + Send + Sync>;
