use thiserror::Error;

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ChatError {
    #[error("Invalid server endpoint '{0}', expected host:port")]
    Configuration(String),

    #[error("{0}")]
    Transport(String),

    #[error("No active session")]
    NoSession,

    #[error("Failed to parse tool call: {0}")]
    ToolCall(String),

    #[error("Failed to create session: {0}")]
    Server(u16),

    #[error("Failed to decode server response: {0}")]
    Decode(String),
}

impl ChatError {
    pub fn transport<E: ToString>(err: E) -> ChatError {
        return ChatError::Transport(err.to_string());
    }
}
