//! Event system for session notifications.
//!
//! ## Learning: Observer Pattern in Rust
//!
//! Rust's ownership model makes traditional observer patterns tricky.
//! We use `tokio::sync::broadcast` for a safe, async-friendly event bus:
//! - Events are values, not callbacks
//! - Subscribers receive copies (Clone)
//! - Sending never blocks and needs no runtime

use std::path::PathBuf;

use tokio::sync::broadcast;

use crate::state::Mode;

/// Events emitted by a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorEvent {
    /// A directory pane was opened
    BufferOpened(PathBuf),
    /// A directory pane was closed
    BufferClosed(PathBuf),
    /// A pane's lines changed
    BufferChanged(PathBuf),
    /// A pane was refreshed from its directory
    BufferReloaded(PathBuf),
    /// Normal/insert mode switched
    ModeChanged(Mode),
    /// A change plan was computed; carries the number of changes
    PlanReady(usize),
}

/// Event bus for broadcasting session events.
///
/// Lagged receivers don't block senders; they skip ahead.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<EditorEvent>,
}

impl EventBus {
    /// Creates a new event bus.
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(256);
        Self { sender }
    }

    /// Emits an event to all subscribers.
    pub fn emit(&self, event: EditorEvent) {
        // No receivers is fine
        let _ = self.sender.send(event);
    }

    /// Subscribes to events emitted from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<EditorEvent> {
        self.sender.subscribe()
    }

    /// Number of live subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.sender.receiver_count())
            .finish()
    }
}

/// Helper for processing events asynchronously.
///
/// ## Example
///
/// ```ignore
/// let mut handler = EventHandler::new(session.subscribe());
///
/// tokio::spawn(async move {
///     while let Some(event) = handler.next().await {
///         if let EditorEvent::BufferChanged(path) = event {
///             // redraw the pane
///         }
///     }
/// });
/// ```
pub struct EventHandler {
    receiver: broadcast::Receiver<EditorEvent>,
}

impl EventHandler {
    /// Creates a new event handler.
    pub fn new(receiver: broadcast::Receiver<EditorEvent>) -> Self {
        Self { receiver }
    }

    /// Waits for the next event.
    pub async fn next(&mut self) -> Option<EditorEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!("Event handler lagged, missed {} events", n);
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}
