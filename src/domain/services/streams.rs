#[cfg(test)]
#[path = "streams_test.rs"]
mod tests;

use tokio::sync::broadcast;
use tokio::sync::watch;

use crate::domain::models::ChatEvent;
use crate::domain::models::ChatState;

const EVENT_BUFFER: usize = 256;

/// Current-value holder for `ChatState`. Subscribers always observe the most
/// recent state, including ones that subscribe after it was set.
pub struct StateStream {
    tx: watch::Sender<ChatState>,
}

impl Default for StateStream {
    fn default() -> StateStream {
        let (tx, _rx) = watch::channel(ChatState::Disconnected);
        return StateStream { tx };
    }
}

impl StateStream {
    pub fn get(&self) -> ChatState {
        return self.tx.borrow().clone();
    }

    pub fn set(&self, state: ChatState) {
        tracing::debug!(state = ?state, "Chat state changed");
        self.tx.send_replace(state);
    }

    pub fn subscribe(&self) -> watch::Receiver<ChatState> {
        return self.tx.subscribe();
    }
}

/// Fan-out publisher for `ChatEvent`. Nothing is retained, so subscribers only
/// see events published after they subscribed.
pub struct EventStream {
    tx: broadcast::Sender<ChatEvent>,
}

impl Default for EventStream {
    fn default() -> EventStream {
        let (tx, _rx) = broadcast::channel(EVENT_BUFFER);
        return EventStream { tx };
    }
}

impl EventStream {
    pub fn emit(&self, event: ChatEvent) {
        // No subscribers is fine, the event is simply dropped.
        let _ = self.tx.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ChatEvent> {
        return self.tx.subscribe();
    }
}
