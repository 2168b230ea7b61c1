//! Ordered, multi-subscriber event lists.
//!
//! Each event name owns one [`Listeners`] list. Subscribers run synchronously
//! in subscription order; emission has no return channel. Unsubscribing is
//! optional and only used by overlays tearing down their bindings.

#[cfg(test)]
#[path = "events_test.rs"]
mod events_test;

use std::fmt;

/// Handle returned by [`Listeners::subscribe`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Callback<T> = Box<dyn FnMut(&T)>;

/// An append-ordered list of callbacks for one event payload type.
pub struct Listeners<T> {
    next_id: u64,
    entries: Vec<(SubscriptionId, Callback<T>)>,
}

impl<T> Listeners<T> {
    #[must_use]
    pub fn new() -> Self {
        Self { next_id: 0, entries: Vec::new() }
    }

    /// Append a subscriber. It runs after every subscriber added before it.
    pub fn subscribe<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: FnMut(&T) + 'static,
    {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.entries.push((id, Box::new(callback)));
        id
    }

    /// Remove a subscriber. Returns false if it was not present.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry_id, _)| *entry_id != id);
        self.entries.len() != before
    }

    /// Invoke every subscriber, in order, with `payload`.
    pub fn emit(&mut self, payload: &T) {
        for (_, callback) in &mut self.entries {
            callback(payload);
        }
    }

    /// Drop every subscriber.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<T> Default for Listeners<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Listeners<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listeners").field("len", &self.entries.len()).finish()
    }
}
