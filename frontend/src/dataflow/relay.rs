//! Simplified event streaming Relay implementation
//!
//! Relay provides type-safe event streaming from host callbacks to the
//! tasks that consume them, using simple unbounded channels.

use futures::channel::mpsc::{unbounded, UnboundedSender, UnboundedReceiver};

/// Type-safe event streaming relay.
///
/// Relays carry events from host callbacks (mutation batches, history
/// hooks, timers) into the single task that owns the reaction to them.
///
/// # Event-Source Naming Convention
///
/// Relays follow the `{source}_{event}_relay` naming pattern:
/// - `poll_changed_relay` - Polling noticed a different address
/// - `popstate_fired_relay` - Back/forward navigation happened
/// - `body_mutated_relay` - The document body reported a mutation batch
///
/// # Examples
///
/// ```ignore
/// use crate::dataflow::relay;
///
/// let (popstate_fired_relay, mut popstate_fired_stream) = relay::<()>();
///
/// popstate_fired_relay.send(());
///
/// while let Some(()) = popstate_fired_stream.next().await {
///     log::debug!("popstate");
/// }
/// ```
#[derive(Debug)]
pub struct Relay<T = ()>
where
    T: 'static,
{
    sender: UnboundedSender<T>,
}

/// Error type for Relay operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayError {
    /// The channel has been closed (receiver dropped)
    ChannelClosed,
}

impl<T> Relay<T>
where
    T: 'static,
{
    /// Create a new Relay with an associated receiver stream.
    ///
    /// Returns a tuple of (Relay, UnboundedReceiver) following Rust's
    /// channel patterns. Use the `relay()` function for more convenient creation.
    pub fn new() -> (Self, UnboundedReceiver<T>) {
        let (sender, receiver) = unbounded();
        (Relay { sender }, receiver)
    }

    /// Send an event through the relay.
    ///
    /// If the receiver has been dropped, the event is silently discarded.
    /// A consumer that went away is a consumer that was torn down.
    pub fn send(&self, value: T) {
        let _ = self.sender.unbounded_send(value);
    }

    /// Try to send an event through the relay with explicit error handling.
    pub fn try_send(&self, value: T) -> Result<(), RelayError> {
        self.sender
            .unbounded_send(value)
            .map_err(|_| RelayError::ChannelClosed)
    }

    /// True once the receiving side has been dropped.
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

// Manual impl: the payload type itself need not be `Clone`
impl<T> Clone for Relay<T>
where
    T: 'static,
{
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
        }
    }
}

impl<T> Default for Relay<T>
where
    T: 'static,
{
    /// Create a new Relay with a receiver that is immediately dropped.
    ///
    /// Events sent through a disconnected relay are discarded.
    fn default() -> Self {
        let (relay, _receiver) = Self::new();
        relay
    }
}

/// Creates a new Relay with an associated receiver stream.
pub fn relay<T>() -> (Relay<T>, UnboundedReceiver<T>)
where
    T: 'static,
{
    Relay::new()
}
