// Event dispatch: kind filtering, registration-order delivery, and
// unsubscription.

use companion_voice::{ClientEvent, EventDispatcher, EventKind, SessionStatus, TextEvent};

fn text(ai_text: &str) -> ClientEvent {
    ClientEvent::Text(TextEvent {
        user_text: None,
        ai_text: ai_text.to_string(),
        is_final: true,
        is_filler: false,
    })
}

#[tokio::test]
async fn events_only_reach_matching_subscribers() {
    let dispatcher = EventDispatcher::new();
    let (_a, mut texts) = dispatcher.subscribe(EventKind::Text);
    let (_b, mut statuses) = dispatcher.subscribe(EventKind::Status);

    dispatcher.emit(text("hello"));
    dispatcher.emit(ClientEvent::Status(SessionStatus::Idle));

    match texts.try_recv() {
        Ok(ClientEvent::Text(event)) => assert_eq!(event.ai_text, "hello"),
        other => panic!("expected text event, got {:?}", other),
    }
    assert!(texts.try_recv().is_err());
    assert!(matches!(
        statuses.try_recv(),
        Ok(ClientEvent::Status(SessionStatus::Idle))
    ));
    assert!(statuses.try_recv().is_err());
}

#[tokio::test]
async fn same_kind_subscribers_all_receive_every_event() {
    let dispatcher = EventDispatcher::new();
    let (_a, mut first) = dispatcher.subscribe(EventKind::Text);
    let (_b, mut second) = dispatcher.subscribe(EventKind::Text);

    dispatcher.emit(text("one"));
    dispatcher.emit(text("two"));

    for rx in [&mut first, &mut second] {
        for expected in ["one", "two"] {
            match rx.try_recv() {
                Ok(ClientEvent::Text(event)) => assert_eq!(event.ai_text, expected),
                other => panic!("expected {:?}, got {:?}", expected, other),
            }
        }
    }
}

#[tokio::test]
async fn unsubscribed_receivers_get_nothing_further() {
    let dispatcher = EventDispatcher::new();
    let (id, mut events) = dispatcher.subscribe(EventKind::Text);

    dispatcher.emit(text("before"));
    assert!(dispatcher.unsubscribe(id));
    dispatcher.emit(text("after"));

    assert!(matches!(events.try_recv(), Ok(ClientEvent::Text(_))));
    // The sender side is gone, so the channel reports disconnection.
    assert!(events.try_recv().is_err());

    // A second removal of the same id is a no-op.
    assert!(!dispatcher.unsubscribe(id));
}

#[tokio::test]
async fn dropped_receivers_are_pruned_on_emit() {
    let dispatcher = EventDispatcher::new();
    let (_dead, rx) = dispatcher.subscribe(EventKind::Text);
    let (_live, mut live) = dispatcher.subscribe(EventKind::Text);
    drop(rx);

    dispatcher.emit(text("still delivered"));

    assert!(matches!(live.try_recv(), Ok(ClientEvent::Text(_))));
}
