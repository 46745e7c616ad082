//! Observer callback lists.

use std::fmt;

/// An ordered list of observers notified with a borrowed event value.
///
/// Subscription is append-only; observers are invoked in subscription
/// order. Managers expose one list per lifecycle event.
pub struct Callbacks<T> {
    listeners: Vec<Box<dyn Fn(&T) + Send>>,
}

impl<T> Default for Callbacks<T> {
    fn default() -> Self {
        Self {
            listeners: Vec::new(),
        }
    }
}

impl<T> fmt::Debug for Callbacks<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callbacks")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl<T> Callbacks<T> {
    /// Create an empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an observer.
    pub fn subscribe(&mut self, listener: impl Fn(&T) + Send + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// Notify every observer, in subscription order.
    pub fn emit(&self, value: &T) {
        for listener in &self.listeners {
            listener(value);
        }
    }

    /// Number of subscribed observers.
    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    /// True when nothing is subscribed.
    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}
