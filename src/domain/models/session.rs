use serde_derive::Deserialize;
use serde_derive::Serialize;

/// Body returned by `POST /api/models/{model_id}/sessions/`.
#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionResponse {
    pub model_id: String,
    pub session_id: String,
    pub message: String,
}

/// First frame sent over the streaming channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionHandshake {
    pub session_id: String,
}

/// A live server-side session. It is only valid against the endpoint it was
/// created on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub model_id: String,
    pub session_id: String,
    pub endpoint: String,
}
