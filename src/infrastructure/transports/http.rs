#[cfg(test)]
#[path = "http_test.rs"]
mod tests;

use std::sync::Arc;

use async_trait::async_trait;
use futures::SinkExt;
use futures::StreamExt;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::error::ProtocolError;
use tokio_tungstenite::tungstenite::Error as WsError;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::MaybeTlsStream;
use tokio_tungstenite::WebSocketStream;

use crate::domain::models::ChannelBox;
use crate::domain::models::ChatError;
use crate::domain::models::DuplexChannel;
use crate::domain::models::InboundFrame;
use crate::domain::models::Transport;
use crate::domain::models::TransportBox;
use crate::domain::models::TransportFactory;
use crate::domain::models::TransportResponse;

fn convert_err(err: reqwest::Error) -> ChatError {
    return ChatError::Transport(err.to_string());
}

/// REST over a pooled reqwest client, streaming over a websocket per call to
/// `open_duplex`.
pub struct HttpTransport {
    client: reqwest::Client,
}

impl Default for HttpTransport {
    fn default() -> HttpTransport {
        return HttpTransport {
            client: reqwest::Client::new(),
        };
    }
}

impl HttpTransport {
    async fn read(res: reqwest::Response) -> Result<TransportResponse, ChatError> {
        let status = res.status().as_u16();
        let body = res.text().await.map_err(convert_err)?;

        return Ok(TransportResponse { status, body });
    }
}

#[async_trait]
impl Transport for HttpTransport {
    #[allow(clippy::implicit_return)]
    async fn post(&self, url: &str) -> Result<TransportResponse, ChatError> {
        let res = self.client.post(url).send().await.map_err(convert_err)?;
        return HttpTransport::read(res).await;
    }

    #[allow(clippy::implicit_return)]
    async fn delete(&self, url: &str) -> Result<TransportResponse, ChatError> {
        let res = self.client.delete(url).send().await.map_err(convert_err)?;
        return HttpTransport::read(res).await;
    }

    #[allow(clippy::implicit_return)]
    async fn open_duplex(
        &self,
        host: &str,
        port: u16,
        path: &str,
    ) -> Result<ChannelBox, ChatError> {
        let url = format!("ws://{host}:{port}{path}");
        let (stream, res) = tokio_tungstenite::connect_async(url.as_str())
            .await
            .map_err(ChatError::transport)?;
        tracing::debug!(url = %url, status = res.status().as_u16(), "Websocket opened");

        return Ok(Box::new(WebSocketChannel { stream }));
    }

    fn close(&self) {
        // reqwest releases its pool when the last clone of the client drops.
        tracing::debug!("HTTP transport closed");
    }
}

pub struct WebSocketChannel {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

#[async_trait]
impl DuplexChannel for WebSocketChannel {
    #[allow(clippy::implicit_return)]
    async fn send_text(&mut self, text: String) -> Result<(), ChatError> {
        return self
            .stream
            .send(WsMessage::Text(text))
            .await
            .map_err(ChatError::transport);
    }

    #[allow(clippy::implicit_return)]
    async fn next_frame(&mut self) -> Option<Result<InboundFrame, ChatError>> {
        let msg = match self.stream.next().await? {
            Ok(msg) => msg,
            Err(WsError::ConnectionClosed) | Err(WsError::AlreadyClosed) => return None,
            Err(err) => return Some(Err(ChatError::transport(err))),
        };

        let frame = match msg {
            WsMessage::Text(text) => InboundFrame::Text(text),
            WsMessage::Close(_) => InboundFrame::Close,
            _ => InboundFrame::Other,
        };

        return Some(Ok(frame));
    }

    #[allow(clippy::implicit_return)]
    async fn close(&mut self) -> Result<(), ChatError> {
        // A server that closed first has already been answered by tungstenite,
        // which then refuses to send our own close frame.
        match self.stream.close(None).await {
            Ok(_)
            | Err(WsError::ConnectionClosed)
            | Err(WsError::AlreadyClosed)
            | Err(WsError::Protocol(ProtocolError::SendAfterClosing)) => return Ok(()),
            Err(err) => return Err(ChatError::transport(err)),
        }
    }
}

#[derive(Default)]
pub struct HttpTransportFactory {}

impl TransportFactory for HttpTransportFactory {
    fn create(&self) -> TransportBox {
        tracing::debug!("Creating HTTP transport");
        return Arc::new(HttpTransport::default());
    }
}
