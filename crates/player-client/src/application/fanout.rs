//! Multi-subscriber event channel.
//!
//! Each [`EventFanout::subscribe`] call returns its own unbounded receiver,
//! and every published event is cloned into every live receiver in publish
//! order.  A subscriber that dropped its receiver is pruned on the next
//! publish.
//!
//! Unlike `tokio::sync::broadcast`, a slow subscriber never loses events;
//! the event rates here (frames aside, which are not fanned out) are low
//! enough that an unbounded queue is the right trade.

use std::sync::Mutex;

use tokio::sync::mpsc;

#[derive(Debug)]
pub struct EventFanout<T> {
    subscribers: Mutex<Vec<mpsc::UnboundedSender<T>>>,
}

impl<T: Clone> EventFanout<T> {
    pub fn new() -> Self {
        Self { subscribers: Mutex::new(Vec::new()) }
    }

    /// Registers a new subscriber.
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<T> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.lock().push(tx);
        rx
    }

    /// Delivers `event` to every live subscriber.
    pub fn publish(&self, event: T) {
        self.lock().retain(|tx| tx.send(event.clone()).is_ok());
    }

    pub fn subscriber_count(&self) -> usize {
        let mut subscribers = self.lock();
        subscribers.retain(|tx| !tx.is_closed());
        subscribers.len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<mpsc::UnboundedSender<T>>> {
        // A panic while holding this lock cannot leave the Vec inconsistent.
        self.subscribers.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<T: Clone> Default for EventFanout<T> {
    fn default() -> Self {
        Self::new()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
