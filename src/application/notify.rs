use crate::domain::payment::PaymentId;
use crate::error::{CaptureError, Result};
use std::fmt;
use std::sync::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};

/// Callback invoked after a payment's status changed.
pub type StatusChangedListener = Box<
    dyn Fn(PaymentId) -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>>
        + Send
        + Sync,
>;

/// Handle returned by [`StatusChangedBus::subscribe`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// In-process observer registry for payment status changes.
///
/// Owned by the composition root and injected into the reconciler; tests
/// build a fresh bus instead of mutating process-wide state. Subscribers are
/// invoked synchronously in subscription order and must not call back into
/// the bus. Nothing here is persisted.
#[derive(Default)]
pub struct StatusChangedBus {
    listeners: RwLock<Vec<(SubscriptionId, StatusChangedListener)>>,
    next_id: AtomicU64,
}

impl StatusChangedBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, listener: StatusChangedListener) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let mut listeners = self
            .listeners
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        listeners.push((id, listener));
        id
    }

    /// Removes a subscriber. Returns false if the id was never registered or
    /// was already removed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut listeners = self
            .listeners
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let before = listeners.len();
        listeners.retain(|(listener_id, _)| *listener_id != id);
        listeners.len() != before
    }

    pub fn subscriber_count(&self) -> usize {
        self.listeners
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    /// Invokes every current subscriber with `payment_id`, in subscription
    /// order. Every subscriber runs even if an earlier one fails; the first
    /// failure is then surfaced as [`CaptureError::Listener`]. A failure
    /// never undoes state committed before the fan-out.
    pub fn publish(&self, payment_id: PaymentId) -> Result<()> {
        let listeners = self
            .listeners
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let mut first_failure = None;
        for (id, listener) in listeners.iter() {
            if let Err(source) = listener(payment_id) {
                tracing::error!(
                    %payment_id,
                    subscription = id.0,
                    error = %source,
                    "status listener failed"
                );
                if first_failure.is_none() {
                    first_failure = Some(source);
                }
            }
        }

        match first_failure {
            Some(source) => Err(CaptureError::Listener { payment_id, source }),
            None => Ok(()),
        }
    }
}

impl fmt::Debug for StatusChangedBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StatusChangedBus")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn recording(calls: Arc<Mutex<Vec<(&'static str, PaymentId)>>>, tag: &'static str) -> StatusChangedListener {
        Box::new(move |payment_id| {
            calls.lock().unwrap().push((tag, payment_id));
            Ok(())
        })
    }

    #[test]
    fn publishes_in_subscription_order() {
        let bus = StatusChangedBus::new();
        let calls = Arc::new(Mutex::new(Vec::new()));

        bus.subscribe(recording(calls.clone(), "first"));
        bus.subscribe(recording(calls.clone(), "second"));

        bus.publish(PaymentId(42)).unwrap();

        assert_eq!(
            *calls.lock().unwrap(),
            vec![("first", PaymentId(42)), ("second", PaymentId(42))]
        );
    }

    #[test]
    fn unsubscribed_listeners_are_not_invoked() {
        let bus = StatusChangedBus::new();
        let calls = Arc::new(Mutex::new(Vec::new()));

        let id = bus.subscribe(recording(calls.clone(), "gone"));
        bus.subscribe(recording(calls.clone(), "kept"));

        assert!(bus.unsubscribe(id));
        assert!(!bus.unsubscribe(id));
        assert_eq!(bus.subscriber_count(), 1);

        bus.publish(PaymentId(1)).unwrap();
        assert_eq!(*calls.lock().unwrap(), vec![("kept", PaymentId(1))]);
    }

    #[test]
    fn a_failing_listener_does_not_stop_the_fan_out() {
        let bus = StatusChangedBus::new();
        let calls = Arc::new(Mutex::new(Vec::new()));

        bus.subscribe(Box::new(|_| Err("listener exploded".into())));
        bus.subscribe(recording(calls.clone(), "after-failure"));

        let err = bus.publish(PaymentId(9)).unwrap_err();
        assert!(matches!(
            err,
            CaptureError::Listener {
                payment_id: PaymentId(9),
                ..
            }
        ));
        // The listener after the failing one still ran.
        assert_eq!(*calls.lock().unwrap(), vec![("after-failure", PaymentId(9))]);
    }

    #[test]
    fn publish_without_subscribers_is_a_no_op() {
        let bus = StatusChangedBus::new();
        assert!(bus.publish(PaymentId(1)).is_ok());
    }
}
