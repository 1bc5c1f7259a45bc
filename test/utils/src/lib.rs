/// Frames for a reply that reasons briefly before answering.
pub fn thinking_stream_fixture() -> Vec<&'static str> {
    return vec!["<think>", "reasoning", "</think>", "hello", "<EOS>"];
}

/// Frames for a reply that requests two tools, one of them malformed.
pub fn tool_call_stream_fixture() -> Vec<&'static str> {
    return vec![
        "Let me check.",
        r#"<tool_call>{"name":"weather","arguments":{"city":"Seoul"}}</tool_call><tool_call>{"name":</tool_call>"#,
        "<EOS>",
    ];
}

pub fn session_response_fixture(model_id: &str, session_id: &str) -> String {
    return serde_json::json!({
        "model_id": model_id,
        "session_id": session_id,
        "message": "ok",
    })
    .to_string();
}
