// ── In-process message bus ──
//
// Publish/subscribe channel for envelopes the network layer has already
// decoded. Publishing with no subscribers drops the message; slow
// subscribers skip what they lagged behind on.

use std::sync::Arc;

use futures_core::Stream;
use futures_util::StreamExt;
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use tracing::{trace, warn};

use crate::message::Envelope;

/// Default number of envelopes buffered per subscriber.
pub const DEFAULT_BUS_CAPACITY: usize = 256;

#[derive(Debug, Clone)]
pub struct MessageBus {
    tx: broadcast::Sender<Arc<Envelope>>,
}

impl Default for MessageBus {
    fn default() -> Self {
        Self::new(DEFAULT_BUS_CAPACITY)
    }
}

impl MessageBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Publish an envelope. Returns how many subscribers will see it.
    pub fn publish(&self, envelope: Envelope) -> usize {
        let event = envelope.original_message.event_name();
        match self.tx.send(Arc::new(envelope)) {
            Ok(receivers) => {
                trace!(event, receivers, "published envelope");
                receivers
            }
            Err(_) => {
                trace!(event, "no subscribers, envelope dropped");
                0
            }
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Arc<Envelope>> {
        self.tx.subscribe()
    }

    /// Subscribe as a `Stream`, skipping envelopes lost to lag.
    pub fn stream(&self) -> impl Stream<Item = Arc<Envelope>> + Send + 'static {
        BroadcastStream::new(self.tx.subscribe()).filter_map(|item| async move {
            match item {
                Ok(envelope) => Some(envelope),
                Err(err) => {
                    warn!(error = %err, "bus subscriber lagged");
                    None
                }
            }
        })
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::message::CollabMessage;

    #[test]
    fn publish_without_subscribers_drops() {
        let bus = MessageBus::default();
        assert_eq!(bus.publish(Envelope::new("u", CollabMessage::AllHighlightsReset)), 0);
    }

    #[tokio::test]
    async fn subscribers_receive_in_order() {
        let bus = MessageBus::new(8);
        let mut rx = bus.subscribe();
        bus.publish(Envelope::new("a", CollabMessage::AllHighlightsReset));
        bus.publish(Envelope::new("b", CollabMessage::AllHighlightsReset));
        assert_eq!(rx.recv().await.unwrap().user_id, "a");
        assert_eq!(rx.recv().await.unwrap().user_id, "b");
    }

    #[tokio::test]
    async fn stream_yields_published_envelopes() {
        let bus = MessageBus::new(8);
        let stream = bus.stream();
        tokio::pin!(stream);
        bus.publish(Envelope::new("a", CollabMessage::AllHighlightsReset));
        let envelope = stream.next().await.unwrap();
        assert_eq!(envelope.user_id, "a");
    }
}
