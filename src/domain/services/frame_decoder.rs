#[cfg(test)]
#[path = "frame_decoder_test.rs"]
mod tests;

use super::thinking_timer::now_millis;
use super::ThinkingTimer;
use crate::domain::models::ChatError;
use crate::domain::models::ChatEvent;
use crate::domain::models::ChatState;

pub const END_OF_STREAM: &str = "<EOS>";
pub const THINK_OPEN: &str = "<think>";
pub const THINK_CLOSE: &str = "</think>";
pub const TOOL_CALL_OPEN: &str = "<tool_call>";
pub const TOOL_CALL_CLOSE: &str = "</tool_call>";

/// What the chat client should do in response to one inbound frame, applied
/// in order.
#[derive(Clone, Debug, PartialEq)]
pub enum Directive {
    SetState(ChatState),
    Emit(ChatEvent),
    /// Close the channel and stop reading. Nothing after this is applied.
    Finish,
}

/// Returns the inner text of every `<tool_call>...</tool_call>` span in
/// `frame`, left to right. Each open marker pairs with the first close marker
/// after it, and an open marker with no close is dropped.
pub fn tool_call_spans(frame: &str) -> Vec<&str> {
    let mut spans = vec![];
    let mut cursor = 0;

    while let Some(open) = frame[cursor..].find(TOOL_CALL_OPEN) {
        let inner_start = cursor + open + TOOL_CALL_OPEN.len();
        let close = match frame[inner_start..].find(TOOL_CALL_CLOSE) {
            Some(close) => close,
            None => {
                tracing::warn!(frame, "Unterminated tool call span");
                break;
            }
        };

        let inner_end = inner_start + close;
        spans.push(&frame[inner_start..inner_end]);
        cursor = inner_end + TOOL_CALL_CLOSE.len();
    }

    return spans;
}

fn parse_tool_call(span: &str) -> ChatEvent {
    match serde_json::from_str(span.trim()) {
        Ok(payload) => return ChatEvent::ToolCallReceived(payload),
        Err(err) => {
            tracing::warn!(span, error = %err, "Failed to parse tool call");
            return ChatEvent::ErrorOccurred(ChatError::ToolCall(err.to_string()).to_string());
        }
    }
}

/// Classifies inbound text frames into state changes and events. The decoder
/// owns the thinking flag, so `ChatState::Thinking` is only produced while it
/// is set.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    timer: ThinkingTimer,
}

impl FrameDecoder {
    pub fn is_thinking(&self) -> bool {
        return self.timer.is_thinking();
    }

    pub fn reset(&mut self) {
        self.timer = ThinkingTimer::default();
    }

    pub fn decode(&mut self, frame: &str) -> Vec<Directive> {
        return self.decode_at(frame, now_millis());
    }

    pub fn decode_at(&mut self, frame: &str, now_ms: i64) -> Vec<Directive> {
        tracing::debug!(frame, "Received frame");

        if frame == END_OF_STREAM {
            return vec![Directive::Finish];
        }

        if frame == THINK_OPEN {
            self.timer.start(now_ms);
            return vec![
                Directive::SetState(ChatState::Thinking(0.0)),
                Directive::Emit(ChatEvent::ThinkingStarted),
            ];
        }

        if frame == THINK_CLOSE {
            self.timer.stop();
            return vec![
                Directive::SetState(ChatState::Responding),
                Directive::Emit(ChatEvent::ThinkingEnded),
            ];
        }

        if frame.contains(TOOL_CALL_OPEN) {
            return tool_call_spans(frame)
                .into_iter()
                .map(|span| return Directive::Emit(parse_tool_call(span)))
                .collect();
        }

        if self.timer.is_thinking() {
            let elapsed = self.timer.lap(now_ms);
            return vec![
                Directive::Emit(ChatEvent::text(frame, true)),
                Directive::SetState(ChatState::Thinking(elapsed)),
            ];
        }

        return vec![
            Directive::SetState(ChatState::Responding),
            Directive::Emit(ChatEvent::text(frame, false)),
        ];
    }
}
