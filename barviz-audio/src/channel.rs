//! A small typed publish/subscribe channel.
//!
//! Capture sources publish their frames into a [FrameChannel] and every
//! registered observer gets each frame in publication order.
use crate::SampleFrame;

/// Returned by [Channel::subscribe] to be able to remove the observer again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Observer<T> = Box<dyn FnMut(&T)>;

pub type FrameChannel = Channel<SampleFrame>;

pub struct Channel<T> {
    observers: Vec<(SubscriptionId, Observer<T>)>,
    next_id: u64,
}

impl<T> Channel<T> {
    pub fn new() -> Self {
        Self {
            observers: Vec::new(),
            next_id: 0,
        }
    }

    /// Registers `observer`. The same closure may be registered multiple times,
    /// each registration gets its own id.
    pub fn subscribe(&mut self, observer: impl FnMut(&T) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;

        self.observers.push((id, Box::new(observer)));
        id
    }

    /// Removes exactly the observer registered under `id`.
    ///
    /// Returns `false` if there's no such observer (anymore).
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        match self.observers.iter().position(|(other, _)| *other == id) {
            Some(idx) => {
                drop(self.observers.remove(idx));
                true
            }
            None => false,
        }
    }

    pub fn publish(&mut self, value: &T) {
        for (_, observer) in self.observers.iter_mut() {
            observer(value);
        }
    }

    pub fn len(&self) -> usize {
        self.observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }
}

impl<T> Default for Channel<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for Channel<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Channel")
            .field("observers", &self.observers.len())
            .finish()
    }
}
