#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Event system for async communication in mason
//!
//! All user-visible output goes through events - no direct logging or
//! printing happens inside the engine. Events are grouped by functional
//! domain and carry structured metadata for tracing integration.

pub mod events;
pub mod meta;

pub use events::{AppEvent, GeneralEvent, LifecycleEvent, ResolverEvent};
pub use meta::{EventLevel, EventMeta, EventSource};

use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

/// Type alias for event sender
pub type EventSender = UnboundedSender<AppEvent>;

/// Type alias for event receiver
pub type EventReceiver = UnboundedReceiver<AppEvent>;

/// Create a new event channel
#[must_use]
pub fn channel() -> (EventSender, EventReceiver) {
    tokio::sync::mpsc::unbounded_channel()
}

/// The unified trait for emitting events throughout the engine
///
/// Implement `event_sender` on any struct that carries an optional
/// sender; the emit helpers then work uniformly.
pub trait EventEmitter {
    /// Get the event sender for this emitter
    fn event_sender(&self) -> Option<&EventSender>;

    /// Emit an event through this emitter
    fn emit(&self, event: AppEvent) {
        if let Some(sender) = self.event_sender() {
            // A dropped receiver is not an error worth surfacing.
            let _ = sender.send(event);
        }
    }

    /// Emit a debug log event
    fn emit_debug(&self, message: impl Into<String>) {
        self.emit(AppEvent::General(GeneralEvent::debug(message)));
    }

    /// Emit a warning event
    fn emit_warning(&self, message: impl Into<String>) {
        self.emit(AppEvent::General(GeneralEvent::warning(message)));
    }

    /// Emit an error event
    fn emit_error(&self, message: impl Into<String>) {
        self.emit(AppEvent::General(GeneralEvent::error(message)));
    }

    /// Emit an operation started event
    fn emit_operation_started(&self, operation: impl Into<String>) {
        self.emit(AppEvent::General(GeneralEvent::OperationStarted {
            operation: operation.into(),
        }));
    }

    /// Emit an operation completed event
    fn emit_operation_completed(&self, operation: impl Into<String>, success: bool) {
        self.emit(AppEvent::General(GeneralEvent::OperationCompleted {
            operation: operation.into(),
            success,
        }));
    }
}

impl EventEmitter for Option<EventSender> {
    fn event_sender(&self) -> Option<&EventSender> {
        self.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_channel_roundtrip() {
        let (tx, mut rx) = channel();
        let emitter = Some(tx);
        emitter.emit_debug("resolving zlib");

        let event = rx.recv().await.unwrap();
        match event {
            AppEvent::General(GeneralEvent::Debug { message }) => {
                assert_eq!(message, "resolving zlib");
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_emit_without_receiver_is_silent() {
        let (tx, rx) = channel();
        drop(rx);
        let emitter = Some(tx);
        // Must not panic.
        emitter.emit_warning("no one is listening");
    }
}
