#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Event system for async communication in modelsync
//!
//! Components report what they are doing (mirror attempts, gate waits,
//! extraction) as domain events over an unbounded channel. Consumers decide
//! how to render or log them; every event knows its own tracing level and
//! target.

pub mod events;
pub use events::{AppEvent, DownloadEvent, FailureContext, GeneralEvent, MaterializeEvent};

use tokio::sync::mpsc::UnboundedSender;

/// Type alias for event sender using the `AppEvent` system
pub type EventSender = UnboundedSender<AppEvent>;

/// Type alias for event receiver using the `AppEvent` system
pub type EventReceiver = tokio::sync::mpsc::UnboundedReceiver<AppEvent>;

/// Create a new event channel with the `AppEvent` system
#[must_use]
pub fn channel() -> (EventSender, EventReceiver) {
    tokio::sync::mpsc::unbounded_channel()
}

/// The unified trait for emitting events throughout modelsync
///
/// Implemented by raw senders and by every component that optionally carries
/// one, so emission sites never have to check for a missing listener.
pub trait EventEmitter {
    /// Get the event sender for this emitter
    fn event_sender(&self) -> Option<&EventSender>;

    /// Emit an event through this emitter
    fn emit(&self, event: AppEvent) {
        if let Some(sender) = self.event_sender() {
            // Ignore send errors - if receiver is dropped, we just continue
            let _ = sender.send(event);
        }
    }

    /// Emit a warning event with context
    fn emit_warning_with_context(&self, message: impl Into<String>, context: impl Into<String>) {
        self.emit(AppEvent::General(GeneralEvent::warning_with_context(
            message, context,
        )));
    }

    /// Emit a download event
    fn emit_download(&self, event: DownloadEvent) {
        self.emit(AppEvent::Download(event));
    }

    /// Emit a materialize event
    fn emit_materialize(&self, event: MaterializeEvent) {
        self.emit(AppEvent::Materialize(event));
    }
}

/// Implementation of `EventEmitter` for the raw `EventSender`
impl EventEmitter for EventSender {
    fn event_sender(&self) -> Option<&EventSender> {
        Some(self)
    }
}

/// Optional senders emit nothing when absent
impl EventEmitter for Option<EventSender> {
    fn event_sender(&self) -> Option<&EventSender> {
        self.as_ref()
    }
}
