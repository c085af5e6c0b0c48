//! Integration tests for events

use mason_events::*;

#[tokio::test]
async fn test_emitter_helpers() {
    let (tx, mut rx) = channel();
    let emitter = Some(tx);

    emitter.emit_error("store unreachable");
    emitter.emit_debug("retrying lookup");

    let event1 = rx.recv().await.unwrap();
    assert!(matches!(
        event1,
        AppEvent::General(GeneralEvent::Error { .. })
    ));

    let event2 = rx.recv().await.unwrap();
    assert!(matches!(
        event2,
        AppEvent::General(GeneralEvent::Debug { .. })
    ));
}

#[tokio::test]
async fn test_dropped_receiver_does_not_panic() {
    let (tx, rx) = channel();
    drop(rx);

    let emitter = Some(tx);
    emitter.emit_operation_started("resolve");
    emitter.emit_operation_completed("resolve", true);
}

#[test]
fn test_lifecycle_event_metadata() {
    let event = AppEvent::Lifecycle(LifecycleEvent::PhaseFailed {
        package: "coin-cbc".into(),
        phase: "build".into(),
        error: "exit status 2".into(),
    });

    let meta = event.meta();
    assert_eq!(meta.level, EventLevel::Error);
    assert_eq!(meta.source, EventSource::Lifecycle);
    assert_eq!(meta.tracing_level(), tracing::Level::ERROR);
}

#[test]
fn test_event_json_shape() {
    let event = AppEvent::Resolver(ResolverEvent::ResolutionCompleted { packages: 4 });
    let json = serde_json::to_string(&event).unwrap();
    assert!(json.contains(r#""domain":"resolver""#));
    assert!(json.contains(r#""kind":"resolution_completed""#));

    let back: AppEvent = serde_json::from_str(&json).unwrap();
    assert!(matches!(
        back,
        AppEvent::Resolver(ResolverEvent::ResolutionCompleted { packages: 4 })
    ));
}
