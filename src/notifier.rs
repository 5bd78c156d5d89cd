// src/notifier.rs

//! Lifecycle notification fan-out.
//!
//! The notifier owns three listener lists (`connected`, `error`, `closed`)
//! scoped to one channel instance. Listeners are invoked synchronously on
//! the emitting task, in registration order, exactly once per emission.
//! A panicking listener is isolated: delivery continues to the remaining
//! listeners and the channel's own control flow is unaffected.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::Error;

type ConnectedListener = Arc<dyn Fn() + Send + Sync>;
type ErrorListener = Arc<dyn Fn(&Error) + Send + Sync>;
type ClosedListener = Arc<dyn Fn() + Send + Sync>;

/// Acquire a mutex guard, intentionally ignoring poisoning.
///
/// The protected state is an append-only listener list; a panic inside a
/// listener (already isolated by `catch_unwind`) cannot leave it in a
/// partially updated state worth failing over.
fn lock_ignore_poison<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    // ---
    match m.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// Channel-owned broadcaster for lifecycle notifications.
#[derive(Default)]
pub(crate) struct LifecycleNotifier {
    connected: Mutex<Vec<ConnectedListener>>,
    error: Mutex<Vec<ErrorListener>>,
    closed: Mutex<Vec<ClosedListener>>,
}

impl LifecycleNotifier {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn on_connected(&self, listener: impl Fn() + Send + Sync + 'static) {
        lock_ignore_poison(&self.connected).push(Arc::new(listener));
    }

    pub(crate) fn on_error(&self, listener: impl Fn(&Error) + Send + Sync + 'static) {
        lock_ignore_poison(&self.error).push(Arc::new(listener));
    }

    pub(crate) fn on_closed(&self, listener: impl Fn() + Send + Sync + 'static) {
        lock_ignore_poison(&self.closed).push(Arc::new(listener));
    }

    /// Notify all `connected` listeners in registration order.
    pub(crate) fn emit_connected(&self) {
        // ---
        // Snapshot under the lock, invoke outside it, so a listener may
        // register further listeners without deadlocking.
        let listeners = lock_ignore_poison(&self.connected).clone();

        for listener in listeners {
            if catch_unwind(AssertUnwindSafe(|| listener())).is_err() {
                tracing::warn!("connected listener panicked");
            }
        }
    }

    /// Notify all `error` listeners in registration order.
    pub(crate) fn emit_error(&self, err: &Error) {
        // ---
        let listeners = lock_ignore_poison(&self.error).clone();

        for listener in listeners {
            if catch_unwind(AssertUnwindSafe(|| listener(err))).is_err() {
                tracing::warn!("error listener panicked");
            }
        }
    }

    /// Notify all `closed` listeners in registration order.
    pub(crate) fn emit_closed(&self) {
        // ---
        let listeners = lock_ignore_poison(&self.closed).clone();

        for listener in listeners {
            if catch_unwind(AssertUnwindSafe(|| listener())).is_err() {
                tracing::warn!("closed listener panicked");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn listeners_run_in_registration_order() {
        // ---
        let notifier = LifecycleNotifier::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        for tag in ["first", "second", "third"] {
            let order = order.clone();
            notifier.on_connected(move || order.lock().unwrap().push(tag));
        }

        notifier.emit_connected();

        assert_eq!(*order.lock().unwrap(), vec!["first", "second", "third"]);
    }

    #[test]
    fn each_listener_invoked_once_per_emission() {
        // ---
        let notifier = LifecycleNotifier::new();
        let count = Arc::new(AtomicUsize::new(0));

        for _ in 0..3 {
            let count = count.clone();
            notifier.on_closed(move || {
                count.fetch_add(1, Ordering::SeqCst);
            });
        }

        notifier.emit_closed();
        assert_eq!(count.load(Ordering::SeqCst), 3);

        notifier.emit_closed();
        assert_eq!(count.load(Ordering::SeqCst), 6);
    }

    #[test]
    fn panicking_listener_does_not_stop_delivery() {
        // ---
        let notifier = LifecycleNotifier::new();
        let reached = Arc::new(AtomicUsize::new(0));

        notifier.on_error(|_| panic!("listener bug"));
        {
            let reached = reached.clone();
            notifier.on_error(move |_| {
                reached.fetch_add(1, Ordering::SeqCst);
            });
        }

        notifier.emit_error(&Error::ChannelClosed);

        assert_eq!(reached.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn error_listener_sees_the_triggering_error() {
        // ---
        let notifier = LifecycleNotifier::new();
        let seen = Arc::new(Mutex::new(String::new()));

        {
            let seen = seen.clone();
            notifier.on_error(move |err| {
                *seen.lock().unwrap() = err.to_string();
            });
        }

        notifier.emit_error(&Error::Transmit("socket gone".into()));

        assert_eq!(*seen.lock().unwrap(), "transmit failed: socket gone");
    }

    #[test]
    fn listener_may_register_another_listener() {
        // ---
        let notifier = Arc::new(LifecycleNotifier::new());
        let count = Arc::new(AtomicUsize::new(0));

        {
            let notifier = notifier.clone();
            let count = count.clone();
            notifier.clone().on_connected(move || {
                let count = count.clone();
                notifier.on_connected(move || {
                    count.fetch_add(1, Ordering::SeqCst);
                });
            });
        }

        // First emission registers the second listener; second emission runs it.
        notifier.emit_connected();
        assert_eq!(count.load(Ordering::SeqCst), 0);

        notifier.emit_connected();
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }
}
