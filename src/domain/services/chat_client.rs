#[cfg(test)]
#[path = "chat_client_test.rs"]
mod tests;

use tokio::sync::broadcast;
use tokio::sync::watch;

use super::Directive;
use super::EventStream;
use super::FrameDecoder;
use super::StateStream;
use crate::domain::models::ChannelBox;
use crate::domain::models::ChatError;
use crate::domain::models::ChatEvent;
use crate::domain::models::ChatRole;
use crate::domain::models::ChatState;
use crate::domain::models::Endpoint;
use crate::domain::models::HistoryLog;
use crate::domain::models::InboundFrame;
use crate::domain::models::Session;
use crate::domain::models::SessionHandshake;
use crate::domain::models::SessionResponse;
use crate::domain::models::TransportBox;
use crate::domain::models::TransportFactoryBox;

pub const STREAMING_PATH: &str = "/api/chat/streaming";

fn session_create_url(endpoint: &str, model_id: &str) -> String {
    return format!("http://{endpoint}/api/models/{model_id}/sessions/");
}

fn session_delete_url(endpoint: &str, session_id: &str) -> String {
    return format!("http://{endpoint}/api/sessions/{session_id}");
}

/// Drives one conversation at a time against a Gemstone server: session
/// lifecycle over REST, then a streaming channel per message whose frames are
/// decoded into `ChatState` updates and `ChatEvent`s.
///
/// Every method takes `&mut self`, so a second `send_message` cannot start
/// while one is still streaming.
pub struct ChatClient {
    endpoint: String,
    factory: TransportFactoryBox,
    transport: TransportBox,
    session: Option<Session>,
    channel: Option<ChannelBox>,
    decoder: FrameDecoder,
    state: StateStream,
    events: EventStream,
}

impl ChatClient {
    pub fn new(endpoint: &str, factory: TransportFactoryBox) -> ChatClient {
        let transport = factory.create();
        tracing::info!(endpoint, "Chat client initialized");

        return ChatClient {
            endpoint: endpoint.to_string(),
            factory,
            transport,
            session: None,
            channel: None,
            decoder: FrameDecoder::default(),
            state: StateStream::default(),
            events: EventStream::default(),
        };
    }

    pub fn endpoint(&self) -> &str {
        return &self.endpoint;
    }

    pub fn session_id(&self) -> Option<&str> {
        return self
            .session
            .as_ref()
            .map(|session| return session.session_id.as_str());
    }

    pub fn session(&self) -> Option<&Session> {
        return self.session.as_ref();
    }

    pub fn state(&self) -> ChatState {
        return self.state.get();
    }

    pub fn subscribe_state(&self) -> watch::Receiver<ChatState> {
        return self.state.subscribe();
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<ChatEvent> {
        return self.events.subscribe();
    }

    fn set_session(&mut self, session: Option<Session>) {
        match &session {
            Some(session) => tracing::info!(session_id = %session.session_id, "Session ID set"),
            None => tracing::info!("Session ID cleared"),
        }
        self.session = session;
    }

    /// Creates a server-side session for `model_id` and holds on to it. A held
    /// session is left untouched if creation fails.
    pub async fn create_session(&mut self, model_id: &str) -> Result<String, ChatError> {
        let url = session_create_url(&self.endpoint, model_id);
        let res = self.transport.post(&url).await?;

        if res.status != 200 {
            tracing::error!(status = res.status, model_id, "Failed to create session");
            return Err(ChatError::Server(res.status));
        }

        let body: SessionResponse =
            serde_json::from_str(&res.body).map_err(|err| return ChatError::Decode(err.to_string()))?;
        tracing::debug!(body = ?body, "Session created");

        self.set_session(Some(Session {
            model_id: body.model_id,
            session_id: body.session_id.to_string(),
            endpoint: self.endpoint.to_string(),
        }));

        return Ok(body.session_id);
    }

    /// Best-effort removal of the held session. The local id is cleared
    /// whether or not the server could be reached.
    pub async fn delete_session(&mut self) {
        let session = match self.session.as_ref() {
            Some(session) => session,
            None => return,
        };

        let url = session_delete_url(&session.endpoint, &session.session_id);
        if let Err(err) = self.transport.delete(&url).await {
            tracing::warn!(
                error = %err,
                session_id = %session.session_id,
                "Failed to delete session"
            );
        }

        self.set_session(None);
    }

    /// Points the client at a new server. The transport handle is rebuilt and
    /// any session held against the old server is forgotten. Callers that want
    /// the old session removed server-side must `delete_session` first, or use
    /// `switch_endpoint`.
    pub fn update_endpoint(&mut self, endpoint: &str) {
        if endpoint == self.endpoint {
            return;
        }

        if let Some(stale) = self.session.take() {
            tracing::warn!(
                session_id = %stale.session_id,
                old_endpoint = %self.endpoint,
                "Dropping session bound to previous endpoint"
            );
        }

        self.endpoint = endpoint.to_string();
        self.transport.close();
        self.transport = self.factory.create();
        tracing::info!(endpoint, "Chat client endpoint updated");
    }

    /// Replaces any held session with a fresh one for `model_id`.
    pub async fn initialize_model(&mut self, model_id: &str) -> Result<String, ChatError> {
        self.delete_session().await;
        return self.create_session(&model_id.to_lowercase()).await;
    }

    /// Moves the conversation to another server: the held session is deleted
    /// on the old server, the endpoint is switched, then a session for
    /// `model_id` is created on the new one. Nothing happens when the endpoint
    /// is unchanged and a session is already held.
    pub async fn switch_endpoint(
        &mut self,
        endpoint: &str,
        model_id: &str,
    ) -> Result<String, ChatError> {
        if endpoint == self.endpoint {
            if let Some(session_id) = self.session_id() {
                return Ok(session_id.to_string());
            }
        }

        self.delete_session().await;
        self.update_endpoint(endpoint);

        return self.create_session(&model_id.to_lowercase()).await;
    }

    fn fail(&self, err: &ChatError) {
        tracing::error!(error = %err, "Chat stream failed");
        self.state.set(ChatState::Error(err.to_string()));
    }

    pub async fn connect(&mut self) -> Result<(), ChatError> {
        if self.session.is_none() {
            let err = ChatError::NoSession;
            self.fail(&err);
            return Err(err);
        }

        if self.channel.is_some() {
            self.disconnect().await;
        }

        self.state.set(ChatState::Connecting);
        self.decoder.reset();

        let endpoint = match Endpoint::parse(&self.endpoint) {
            Ok(endpoint) => endpoint,
            Err(err) => {
                self.fail(&err);
                return Err(err);
            }
        };

        match self
            .transport
            .open_duplex(&endpoint.host, endpoint.port, STREAMING_PATH)
            .await
        {
            Ok(channel) => {
                self.channel = Some(channel);
                self.state.set(ChatState::Connected);
                tracing::info!(endpoint = %self.endpoint, "Streaming channel connected");
                return Ok(());
            }
            Err(err) => {
                self.fail(&err);
                return Err(err);
            }
        }
    }

    /// Closes the channel if open and returns to `Disconnected`. A failing
    /// close moves to `Error` instead.
    pub async fn disconnect(&mut self) {
        self.decoder.reset();

        if let Some(mut channel) = self.channel.take() {
            if let Err(err) = channel.close().await {
                self.state
                    .set(ChatState::Error(format!("Disconnect failed: {err}")));
                return;
            }
            tracing::info!("Streaming channel disconnected");
        }

        self.state.set(ChatState::Disconnected);
    }

    async fn transmit<H: HistoryLog>(&mut self, text: &str, history: &H) -> Result<(), ChatError> {
        let session_id = match &self.session {
            Some(session) => session.session_id.to_string(),
            None => return Err(ChatError::NoSession),
        };

        let handshake = serde_json::to_string(&SessionHandshake { session_id })
            .map_err(ChatError::transport)?;
        let entries = serde_json::to_string(history.entries()).map_err(ChatError::transport)?;

        let channel = match self.channel.as_mut() {
            Some(channel) => channel,
            None => return Err(ChatError::Transport("Not connected".to_string())),
        };

        channel.send_text(handshake).await?;
        channel.send_text(entries).await?;
        channel.send_text(text.to_string()).await?;

        return Ok(());
    }

    /// Applies one frame's directives. Returns `true` once the stream is over.
    async fn apply(&mut self, directives: Vec<Directive>) -> bool {
        for directive in directives {
            match directive {
                Directive::SetState(state) => self.state.set(state),
                Directive::Emit(event) => self.events.emit(event),
                Directive::Finish => {
                    self.disconnect().await;
                    self.events.emit(ChatEvent::MessageComplete);
                    return true;
                }
            }
        }

        return false;
    }

    async fn listen(&mut self) -> Result<(), ChatError> {
        loop {
            let frame = match self.channel.as_mut() {
                Some(channel) => channel.next_frame().await,
                None => return Ok(()),
            };

            match frame {
                Some(Ok(InboundFrame::Text(text))) => {
                    let directives = self.decoder.decode(&text);
                    if self.apply(directives).await {
                        return Ok(());
                    }
                }
                Some(Ok(InboundFrame::Other)) => continue,
                Some(Ok(InboundFrame::Close)) | None => {
                    tracing::info!("Streaming channel closed by server");
                    self.apply(vec![Directive::Finish]).await;
                    return Ok(());
                }
                Some(Err(err)) => {
                    self.fail(&err);
                    self.events.emit(ChatEvent::ErrorOccurred(err.to_string()));
                    return Err(err);
                }
            }
        }
    }

    /// Sends `text` with the full `history` and streams the reply until the
    /// server ends it. The user's turn is appended to `history` once the
    /// request has been transmitted, regardless of how streaming ends.
    pub async fn send_message<H: HistoryLog>(
        &mut self,
        text: &str,
        history: &mut H,
    ) -> Result<(), ChatError> {
        if let Err(err) = self.connect().await {
            tracing::error!(error = %err, "Failed to connect streaming channel");
            return Err(err);
        }

        if let Err(err) = self.transmit(text, history).await {
            self.fail(&err);
            self.events.emit(ChatEvent::ErrorOccurred(err.to_string()));
            self.disconnect().await;
            return Err(err);
        }

        history.append(ChatRole::User, text);

        let res = self.listen().await;
        // The end of stream marker has already disconnected, possibly into an
        // `Error` from a failed close that must not be overwritten.
        if self.channel.is_some() {
            self.disconnect().await;
        }

        return res;
    }

    pub fn close(&self) {
        self.transport.close();
        tracing::info!(endpoint = %self.endpoint, "Chat client closed");
    }
}
