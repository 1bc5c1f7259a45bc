/// The single current state of a conversation. Exactly one variant is current
/// at any time, and `Thinking` is only ever held while the decoder is inside a
/// thinking span.
#[derive(Clone, Debug, PartialEq)]
pub enum ChatState {
    Disconnected,
    Connecting,
    Connected,
    /// Seconds elapsed since the previous thinking chunk (or the `<think>`
    /// marker for the first one).
    Thinking(f32),
    Responding,
    Error(String),
}
