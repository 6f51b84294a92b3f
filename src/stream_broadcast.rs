//! Observer fan-out for connection tracing.
//!
//! Every message a connection sends or receives is copied to each live
//! subscriber as a [`StreamMessage`]. Delivery is best-effort over unbounded
//! channels, so a slow observer can never stall the I/O loop; an observer
//! whose receiver was dropped is pruned on the next broadcast.

use std::sync::{Arc, Mutex};

use futures::channel::mpsc::{self, UnboundedReceiver, UnboundedSender};
use futures::Stream;
use serde_json::value::RawValue;

use crate::error::Error;
use crate::rpc::RequestId;

/// A traced protocol message.
#[derive(Clone, Debug)]
pub struct StreamMessage {
    pub direction: StreamMessageDirection,
    pub message: StreamMessageContent,
}

/// Whether the traced message was received or sent by this peer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StreamMessageDirection {
    Incoming,
    Outgoing,
}

/// The traced message itself, with params and results as raw JSON.
#[derive(Clone, Debug)]
pub enum StreamMessageContent {
    Request {
        id: RequestId,
        method: Arc<str>,
        params: Option<Arc<RawValue>>,
    },
    Response {
        id: RequestId,
        result: Result<Option<Arc<RawValue>>, Error>,
    },
    Notification {
        method: Arc<str>,
        params: Option<Arc<RawValue>>,
    },
}

type SubscriberList = Arc<Mutex<Vec<UnboundedSender<StreamMessage>>>>;

/// The subscription end, held by the connection.
#[derive(Debug)]
pub(crate) struct StreamBroadcast {
    subscribers: SubscriberList,
}

impl StreamBroadcast {
    /// Creates a connected sender/subscription pair.
    pub(crate) fn new() -> (StreamSender, StreamBroadcast) {
        let subscribers = SubscriberList::default();
        (
            StreamSender {
                subscribers: subscribers.clone(),
            },
            StreamBroadcast { subscribers },
        )
    }

    pub(crate) fn receiver(&self) -> StreamReceiver {
        let (tx, rx) = mpsc::unbounded();
        self.subscribers.lock().unwrap().push(tx);
        StreamReceiver { rx }
    }
}

/// The broadcasting end, held by the connection's I/O loop.
#[derive(Debug)]
pub(crate) struct StreamSender {
    subscribers: SubscriberList,
}

impl StreamSender {
    pub(crate) fn outgoing(&self, message: StreamMessageContent) {
        self.send(StreamMessage {
            direction: StreamMessageDirection::Outgoing,
            message,
        });
    }

    pub(crate) fn incoming(&self, message: StreamMessageContent) {
        self.send(StreamMessage {
            direction: StreamMessageDirection::Incoming,
            message,
        });
    }

    fn send(&self, message: StreamMessage) {
        let mut subscribers = self.subscribers.lock().unwrap();
        // A failed send means the receiver is gone; drop the subscriber.
        subscribers.retain(|subscriber| subscriber.unbounded_send(message.clone()).is_ok());
    }
}

/// A stream of every message the connection sends and receives.
///
/// Returned by the `subscribe` method on the connection types.
#[derive(Debug)]
pub struct StreamReceiver {
    rx: UnboundedReceiver<StreamMessage>,
}

impl Stream for StreamReceiver {
    type Item = StreamMessage;

    fn poll_next(
        mut self: std::pin::Pin<&mut Self>,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Option<Self::Item>> {
        std::pin::Pin::new(&mut self.rx).poll_next(cx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt as _;

    fn request_content() -> StreamMessageContent {
        StreamMessageContent::Request {
            id: RequestId::Number(0),
            method: "initialize".into(),
            params: None,
        }
    }

    #[test]
    fn dropped_subscribers_are_pruned() {
        let (sender, broadcast) = StreamBroadcast::new();
        let alive = broadcast.receiver();
        let dead = broadcast.receiver();
        drop(dead);

        sender.outgoing(request_content());
        assert_eq!(sender.subscribers.lock().unwrap().len(), 1);
        drop(alive);
    }

    #[tokio::test]
    async fn each_subscriber_sees_each_message() {
        let (sender, broadcast) = StreamBroadcast::new();
        let mut first = broadcast.receiver();
        let mut second = broadcast.receiver();

        sender.incoming(request_content());
        sender.outgoing(request_content());

        for receiver in [&mut first, &mut second] {
            let message = receiver.next().await.unwrap();
            assert_eq!(message.direction, StreamMessageDirection::Incoming);
            let message = receiver.next().await.unwrap();
            assert_eq!(message.direction, StreamMessageDirection::Outgoing);
        }
    }
}
