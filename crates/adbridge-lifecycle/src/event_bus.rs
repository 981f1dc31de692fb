// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Publish/subscribe channel for ad-lifecycle events.
//
// Fan-out is synchronous: `publish` returns after every current subscriber of
// the event's kind has run.  The subscriber table is only locked long enough
// to take a snapshot, so handlers may subscribe, unsubscribe, or call back
// into the controller while an event is being delivered.  A subscriber that
// unsubscribes mid fan-out is not called again, even for the event in flight.

use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use adbridge_core::events::{AdEvent, EventKind, EventPayload};
use adbridge_core::types::AdId;
use tracing::{error, trace};

/// Handler invoked for every event of the subscribed kind.
pub type EventHandler = Arc<dyn Fn(&AdEvent) + Send + Sync>;

/// Handle returned by [`EventBus::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

struct Subscriber {
    id: SubscriptionId,
    active: Arc<AtomicBool>,
    handler: EventHandler,
}

#[derive(Default)]
struct Subscribers {
    next_id: u64,
    by_kind: HashMap<EventKind, Vec<Subscriber>>,
}

/// Typed event bus shared between the controller and its subscribers.
///
/// Cloning is cheap; all clones publish to the same subscriber table.
#[derive(Clone, Default)]
pub struct EventBus {
    inner: Arc<Mutex<Subscribers>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Subscribers> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register `handler` for every future event of `kind`.
    pub fn subscribe<F>(&self, kind: EventKind, handler: F) -> SubscriptionId
    where
        F: Fn(&AdEvent) + Send + Sync + 'static,
    {
        let mut subs = self.lock();
        subs.next_id += 1;
        let id = SubscriptionId(subs.next_id);
        subs.by_kind.entry(kind).or_default().push(Subscriber {
            id,
            active: Arc::new(AtomicBool::new(true)),
            handler: Arc::new(handler),
        });
        trace!(kind = %kind, ?id, "subscribed");
        id
    }

    /// Remove a subscription.  Returns `false` if it was already gone.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subs = self.lock();
        for list in subs.by_kind.values_mut() {
            if let Some(pos) = list.iter().position(|s| s.id == id) {
                let removed = list.remove(pos);
                removed.active.store(false, Ordering::SeqCst);
                return true;
            }
        }
        false
    }

    /// Remove every subscription of `kind`, or of every kind when `None`.
    ///
    /// Returns the number of subscriptions removed.
    pub fn unsubscribe_all(&self, kind: Option<EventKind>) -> usize {
        let mut subs = self.lock();
        let removed: Vec<Subscriber> = match kind {
            Some(kind) => subs.by_kind.remove(&kind).unwrap_or_default(),
            None => subs.by_kind.drain().flat_map(|(_, list)| list).collect(),
        };
        for sub in &removed {
            sub.active.store(false, Ordering::SeqCst);
        }
        removed.len()
    }

    /// Number of subscriptions for `kind`, or across all kinds when `None`.
    pub fn subscriber_count(&self, kind: Option<EventKind>) -> usize {
        let subs = self.lock();
        match kind {
            Some(kind) => subs.by_kind.get(&kind).map_or(0, Vec::len),
            None => subs.by_kind.values().map(Vec::len).sum(),
        }
    }

    /// Build an event and fan it out.  Returns the number of handlers run.
    pub fn publish(&self, kind: EventKind, ad_id: &AdId, payload: EventPayload) -> usize {
        self.emit(&AdEvent::new(kind, ad_id.clone(), payload))
    }

    /// Fan `event` out to the current subscribers of its kind.
    ///
    /// A panicking handler is logged and skipped; the remaining handlers
    /// still run.
    pub fn emit(&self, event: &AdEvent) -> usize {
        let targets: Vec<(SubscriptionId, Arc<AtomicBool>, EventHandler)> = {
            let subs = self.lock();
            match subs.by_kind.get(&event.kind) {
                Some(list) => list
                    .iter()
                    .map(|s| (s.id, Arc::clone(&s.active), Arc::clone(&s.handler)))
                    .collect(),
                None => return 0,
            }
        };

        let mut delivered = 0;
        for (id, active, handler) in targets {
            if !active.load(Ordering::SeqCst) {
                continue;
            }
            match panic::catch_unwind(AssertUnwindSafe(|| handler(event))) {
                Ok(()) => delivered += 1,
                Err(payload) => {
                    let msg = if let Some(s) = payload.downcast_ref::<&str>() {
                        (*s).to_owned()
                    } else if let Some(s) = payload.downcast_ref::<String>() {
                        s.clone()
                    } else {
                        "unknown panic".to_owned()
                    };
                    error!(
                        kind = %event.kind,
                        ad_id = %event.ad_id,
                        subscription = ?id,
                        panic = %msg,
                        "event handler panicked"
                    );
                }
            }
        }
        trace!(kind = %event.kind, ad_id = %event.ad_id, delivered, "event published");
        delivered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use adbridge_core::events::AdEventType;
    use adbridge_core::types::{AdFormat, NativeError};

    const LOADED: EventKind = EventKind::new(AdFormat::Banner, AdEventType::Loaded);
    const FAILED: EventKind = EventKind::new(AdFormat::Banner, AdEventType::FailedToLoad);

    fn recorder(bus: &EventBus, kind: EventKind) -> Arc<Mutex<Vec<String>>> {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        bus.subscribe(kind, move |event| {
            sink.lock().unwrap().push(event.kind.wire_name());
        });
        seen
    }

    #[test]
    fn publish_reaches_only_matching_kind() {
        let bus = EventBus::new();
        let loaded = recorder(&bus, LOADED);
        let failed = recorder(&bus, FAILED);

        assert_eq!(bus.publish(LOADED, &"b1".into(), EventPayload::Empty), 1);
        assert_eq!(*loaded.lock().unwrap(), vec!["onBannerLoaded"]);
        assert!(failed.lock().unwrap().is_empty());
    }

    #[test]
    fn publish_without_subscribers_is_noop() {
        let bus = EventBus::new();
        assert_eq!(bus.publish(LOADED, &"b1".into(), EventPayload::Empty), 0);
    }

    #[test]
    fn panicking_handler_does_not_stop_fan_out() {
        let bus = EventBus::new();
        bus.subscribe(LOADED, |_| panic!("subscriber bug"));
        let after = recorder(&bus, LOADED);

        let delivered = bus.publish(LOADED, &"b1".into(), EventPayload::Empty);
        assert_eq!(delivered, 1);
        assert_eq!(after.lock().unwrap().len(), 1);
    }

    #[test]
    fn unsubscribe_is_idempotent() {
        let bus = EventBus::new();
        let id = bus.subscribe(LOADED, |_| {});
        assert!(bus.unsubscribe(id));
        assert!(!bus.unsubscribe(id));
        assert_eq!(bus.subscriber_count(None), 0);
    }

    #[test]
    fn unsubscribe_all_by_kind_or_everything() {
        let bus = EventBus::new();
        bus.subscribe(LOADED, |_| {});
        bus.subscribe(LOADED, |_| {});
        bus.subscribe(FAILED, |_| {});

        assert_eq!(bus.unsubscribe_all(Some(LOADED)), 2);
        assert_eq!(bus.subscriber_count(Some(LOADED)), 0);
        assert_eq!(bus.subscriber_count(Some(FAILED)), 1);

        assert_eq!(bus.unsubscribe_all(None), 1);
        assert_eq!(bus.subscriber_count(None), 0);
    }

    #[test]
    fn handler_may_unsubscribe_itself_during_fan_out() {
        let bus = EventBus::new();
        let calls = Arc::new(Mutex::new(0));
        let slot: Arc<Mutex<Option<SubscriptionId>>> = Arc::new(Mutex::new(None));

        let (bus2, calls2, slot2) = (bus.clone(), Arc::clone(&calls), Arc::clone(&slot));
        let id = bus.subscribe(LOADED, move |_| {
            *calls2.lock().unwrap() += 1;
            if let Some(id) = *slot2.lock().unwrap() {
                bus2.unsubscribe(id);
            }
        });
        *slot.lock().unwrap() = Some(id);

        bus.publish(LOADED, &"b1".into(), EventPayload::Empty);
        bus.publish(LOADED, &"b1".into(), EventPayload::Empty);
        assert_eq!(*calls.lock().unwrap(), 1);
    }

    #[test]
    fn handler_removed_mid_fan_out_is_skipped() {
        let bus = EventBus::new();
        let second: Arc<Mutex<Option<SubscriptionId>>> = Arc::new(Mutex::new(None));
        let (bus2, second2) = (bus.clone(), Arc::clone(&second));
        bus.subscribe(LOADED, move |_| {
            if let Some(id) = *second2.lock().unwrap() {
                bus2.unsubscribe(id);
            }
        });
        let seen = recorder(&bus, LOADED);
        // The recorder is the second subscription.
        *second.lock().unwrap() = Some(SubscriptionId(2));

        assert_eq!(bus.publish(LOADED, &"b1".into(), EventPayload::Empty), 1);
        assert!(seen.lock().unwrap().is_empty());
    }

    #[test]
    fn delivery_preserves_publish_order() {
        let bus = EventBus::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        for kind in [LOADED, FAILED] {
            let sink = Arc::clone(&seen);
            bus.subscribe(kind, move |event| {
                sink.lock().unwrap().push(event.kind.event);
            });
        }

        bus.publish(
            FAILED,
            &"b1".into(),
            EventPayload::Error(NativeError::new("NO_FILL", "none")),
        );
        bus.publish(LOADED, &"b1".into(), EventPayload::Empty);
        assert_eq!(
            *seen.lock().unwrap(),
            vec![AdEventType::FailedToLoad, AdEventType::Loaded]
        );
    }
}
