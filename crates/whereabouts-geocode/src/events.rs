use std::{
    pin::Pin,
    task::{Context, Poll},
};

use futures_lite::{Stream, StreamExt};

/// Events a subscriber may lag behind before the oldest are dropped.
const CAPACITY: usize = 16;

/// Fan-out of one kind of event to every live [`Subscription`].
pub(crate) struct Notifier<T> {
    sender: async_broadcast::Sender<T>,
    /// Kept alive so the channel is never fully closed while the notifier
    /// exists. Without this, new subscriptions would immediately see `None`.
    _keep_alive: async_broadcast::InactiveReceiver<T>,
}

impl<T: Clone> Notifier<T> {
    pub(crate) fn new() -> Self {
        let (mut sender, receiver) = async_broadcast::broadcast(CAPACITY);
        sender.set_overflow(true);
        let keep_alive = receiver.deactivate();
        Self {
            sender,
            _keep_alive: keep_alive,
        }
    }

    /// Deliver `value` to current subscribers. Never blocks.
    pub(crate) fn emit(&self, value: T) {
        let _ = self.sender.try_broadcast(value);
    }

    pub(crate) fn subscribe(&self) -> Subscription<T> {
        Subscription {
            receiver: self.sender.new_receiver(),
        }
    }
}

/// Stream of events emitted after the subscription was created.
///
/// Dropping it unsubscribes.
pub struct Subscription<T> {
    receiver: async_broadcast::Receiver<T>,
}

impl<T: Clone> Subscription<T> {
    /// Take an already delivered event without waiting.
    pub fn try_next(&mut self) -> Option<T> {
        loop {
            match self.receiver.try_recv() {
                Ok(value) => return Some(value),
                Err(async_broadcast::TryRecvError::Overflowed(skipped)) => {
                    tracing::debug!(skipped, "subscriber lagged, events dropped");
                }
                Err(_) => return None,
            }
        }
    }

    /// Wait for the next event, then unsubscribe.
    pub async fn once(mut self) -> Option<T> {
        self.next().await
    }
}

impl<T: Clone> Stream for Subscription<T> {
    type Item = T;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.get_mut().receiver).poll_next(cx)
    }
}
