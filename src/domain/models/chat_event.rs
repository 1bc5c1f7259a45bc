use serde_json::Value;

#[derive(Clone, Debug, PartialEq)]
pub enum ChatEvent {
    TextReceived { content: String, is_thinking: bool },
    ThinkingStarted,
    ThinkingEnded,
    ToolCallReceived(Value),
    MessageComplete,
    ErrorOccurred(String),
}

impl ChatEvent {
    pub fn text(content: &str, is_thinking: bool) -> ChatEvent {
        return ChatEvent::TextReceived {
            content: content.to_string(),
            is_thinking,
        };
    }
}
