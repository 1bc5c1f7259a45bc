use tokio::sync::broadcast::error::TryRecvError;

use super::EventStream;
use super::StateStream;
use crate::domain::models::ChatEvent;
use crate::domain::models::ChatState;

#[test]
fn it_starts_disconnected() {
    let state = StateStream::default();
    assert_eq!(state.get(), ChatState::Disconnected);
}

#[test]
fn it_replays_current_state_to_late_subscribers() {
    let state = StateStream::default();
    state.set(ChatState::Connecting);
    state.set(ChatState::Responding);

    let rx = state.subscribe();
    assert_eq!(*rx.borrow(), ChatState::Responding);
}

#[tokio::test]
async fn it_notifies_state_subscribers() {
    let state = StateStream::default();
    let mut rx = state.subscribe();

    state.set(ChatState::Thinking(0.0));
    rx.changed().await.unwrap();
    assert_eq!(*rx.borrow_and_update(), ChatState::Thinking(0.0));
}

#[test]
fn it_does_not_replay_events_to_late_subscribers() {
    let events = EventStream::default();
    let mut early = events.subscribe();

    events.emit(ChatEvent::ThinkingStarted);
    let mut late = events.subscribe();

    assert_eq!(early.try_recv(), Ok(ChatEvent::ThinkingStarted));
    assert_eq!(late.try_recv(), Err(TryRecvError::Empty));

    events.emit(ChatEvent::MessageComplete);
    assert_eq!(early.try_recv(), Ok(ChatEvent::MessageComplete));
    assert_eq!(late.try_recv(), Ok(ChatEvent::MessageComplete));
}

#[test]
fn it_fans_out_events_in_order() {
    let events = EventStream::default();
    let mut first = events.subscribe();
    let mut second = events.subscribe();

    events.emit(ChatEvent::text("a", false));
    events.emit(ChatEvent::text("b", false));

    for rx in [&mut first, &mut second] {
        assert_eq!(rx.try_recv(), Ok(ChatEvent::text("a", false)));
        assert_eq!(rx.try_recv(), Ok(ChatEvent::text("b", false)));
    }
}

#[test]
fn it_emits_without_subscribers() {
    let events = EventStream::default();
    events.emit(ChatEvent::MessageComplete);
}
