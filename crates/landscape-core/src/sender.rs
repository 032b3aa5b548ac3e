// ── Outbound message sender ──
//
// The store hands every locally-authored mutation to a `MessageSender`.
// Encoding and transport belong to whoever sits on the other end; the
// sender is also responsible for never echoing a message back to us.

use tokio::sync::mpsc;
use tracing::{debug, trace};

use crate::message::CollabMessage;

/// Sink for locally-authored messages.
///
/// `send` is synchronous: it is called from inside a mutation and must
/// not block or await.
pub trait MessageSender: Send + Sync {
    fn send(&self, message: CollabMessage);
}

/// Forwards messages to the network layer over an unbounded channel.
#[derive(Debug, Clone)]
pub struct ChannelSender {
    tx: mpsc::UnboundedSender<CollabMessage>,
}

impl ChannelSender {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<CollabMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl MessageSender for ChannelSender {
    fn send(&self, message: CollabMessage) {
        let event = message.event_name();
        if self.tx.send(message).is_err() {
            debug!(event, "network layer gone, dropping outbound message");
        } else {
            trace!(event, "queued outbound message");
        }
    }
}

/// Single-user mode: nothing leaves this client.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineSender;

impl MessageSender for OfflineSender {
    fn send(&self, message: CollabMessage) {
        trace!(event = message.event_name(), "offline, not sending");
    }
}
