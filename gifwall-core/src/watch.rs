//! Replay-latest watch channel for state propagation.
//!
//! The engine pushes transform and wallpaper-status changes to observers
//! through [`StateChannel`]. Two contracts hold:
//!
//! - late subscribers immediately observe the most recent value, and
//! - publishing a value equal to the current one notifies nobody.
//!
//! Channels are constructed at the process entry point and handed down
//! explicitly; there are no ambient singletons.

use parking_lot::{Condvar, Mutex};
use std::sync::Arc;

struct ChannelInner<T> {
    value: Option<T>,
    version: u64,
}

struct Shared<T> {
    inner: Mutex<ChannelInner<T>>,
    changed: Condvar,
}

/// A single-value publish/subscribe channel with replay-latest semantics.
pub struct StateChannel<T: Clone + PartialEq> {
    shared: Arc<Shared<T>>,
}

impl<T: Clone + PartialEq> StateChannel<T> {
    /// Create a channel with no initial value.
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared {
                inner: Mutex::new(ChannelInner {
                    value: None,
                    version: 0,
                }),
                changed: Condvar::new(),
            }),
        }
    }

    /// Create a channel seeded with an initial value.
    pub fn with_initial(value: T) -> Self {
        let channel = Self::new();
        channel.publish(value);
        channel
    }

    /// Publish a new value.
    ///
    /// Consecutive duplicates are suppressed: if `value` equals the
    /// current one, no subscriber wakes and versions do not move.
    /// Returns true when the value was actually published.
    pub fn publish(&self, value: T) -> bool {
        let mut inner = self.shared.inner.lock();
        if inner.value.as_ref() == Some(&value) {
            return false;
        }
        inner.value = Some(value);
        inner.version += 1;
        self.shared.changed.notify_all();
        true
    }

    /// Get the most recent value, if any was ever published.
    pub fn latest(&self) -> Option<T> {
        self.shared.inner.lock().value.clone()
    }

    /// Create a subscriber.
    ///
    /// A new subscriber sees the current value as unconsumed, so its
    /// first [`Subscriber::try_changed`] returns the replayed latest.
    pub fn subscribe(&self) -> Subscriber<T> {
        Subscriber {
            shared: Arc::clone(&self.shared),
            seen_version: 0,
        }
    }
}

impl<T: Clone + PartialEq> Default for StateChannel<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + PartialEq> Clone for StateChannel<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

/// A consumer handle onto a [`StateChannel`].
pub struct Subscriber<T: Clone + PartialEq> {
    shared: Arc<Shared<T>>,
    seen_version: u64,
}

impl<T: Clone + PartialEq> Subscriber<T> {
    /// Get the most recent value without consuming the change flag.
    pub fn latest(&self) -> Option<T> {
        self.shared.inner.lock().value.clone()
    }

    /// Return the latest value if it changed since the last call.
    pub fn try_changed(&mut self) -> Option<T> {
        let inner = self.shared.inner.lock();
        if inner.version > self.seen_version {
            self.seen_version = inner.version;
            inner.value.clone()
        } else {
            None
        }
    }

    /// Block until a value newer than the last observed one is published.
    pub fn wait_for_change(&mut self) -> T {
        let mut inner = self.shared.inner.lock();
        loop {
            if inner.version > self.seen_version {
                if let Some(value) = inner.value.clone() {
                    self.seen_version = inner.version;
                    return value;
                }
            }
            self.shared.changed.wait(&mut inner);
        }
    }

    /// Like [`wait_for_change`](Subscriber::wait_for_change) but gives up
    /// after `timeout`, returning `None`.
    pub fn wait_for_change_timeout(&mut self, timeout: std::time::Duration) -> Option<T> {
        let deadline = std::time::Instant::now() + timeout;
        let mut inner = self.shared.inner.lock();
        while inner.version <= self.seen_version {
            if self
                .shared
                .changed
                .wait_until(&mut inner, deadline)
                .timed_out()
            {
                return None;
            }
        }
        self.seen_version = inner.version;
        inner.value.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_late_subscriber_replays_latest() {
        let channel = StateChannel::new();
        channel.publish(1);
        channel.publish(2);

        let mut sub = channel.subscribe();
        assert_eq!(sub.try_changed(), Some(2));
        assert_eq!(sub.try_changed(), None);
    }

    #[test]
    fn test_duplicates_suppressed() {
        let channel = StateChannel::with_initial(7);
        let mut sub = channel.subscribe();
        assert_eq!(sub.try_changed(), Some(7));

        assert!(!channel.publish(7));
        assert_eq!(sub.try_changed(), None);

        assert!(channel.publish(8));
        assert_eq!(sub.try_changed(), Some(8));
    }

    #[test]
    fn test_empty_channel() {
        let channel: StateChannel<i32> = StateChannel::new();
        let mut sub = channel.subscribe();
        assert_eq!(channel.latest(), None);
        assert_eq!(sub.try_changed(), None);
    }

    #[test]
    fn test_wait_for_change_cross_thread() {
        let channel = StateChannel::new();
        let mut sub = channel.subscribe();

        let publisher = channel.clone();
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            publisher.publish(42);
        });

        assert_eq!(sub.wait_for_change(), 42);
        handle.join().unwrap();
    }

    #[test]
    fn test_wait_timeout_expires() {
        let channel: StateChannel<i32> = StateChannel::new();
        let mut sub = channel.subscribe();
        assert_eq!(
            sub.wait_for_change_timeout(Duration::from_millis(10)),
            None
        );

        channel.publish(3);
        assert_eq!(
            sub.wait_for_change_timeout(Duration::from_millis(10)),
            Some(3)
        );
    }
}
