// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Criterion benchmarks for the adbridge-lifecycle crate: raw event fan-out,
// and a full native-callback round trip through the controller.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use criterion::{Criterion, black_box, criterion_group, criterion_main};

use adbridge_core::events::{AdEventType, EventKind, EventPayload};
use adbridge_core::types::{AdFormat, AdId, AdInfo};
use adbridge_lifecycle::{AdController, EventBus};
use adbridge_native::mock::{MockBridge, MockCallback};

// ---------------------------------------------------------------------------
// Benchmarks
// ---------------------------------------------------------------------------

/// Publish one event to 16 subscribers of the same kind.
fn bench_publish_fan_out(c: &mut Criterion) {
    let bus = EventBus::new();
    let kind = EventKind::new(AdFormat::Banner, AdEventType::Loaded);
    let counter = Arc::new(AtomicUsize::new(0));
    for _ in 0..16 {
        let counter = Arc::clone(&counter);
        bus.subscribe(kind, move |_| {
            counter.fetch_add(1, Ordering::Relaxed);
        });
    }
    let id = AdId::from("bench-banner");
    let payload = EventPayload::Ad(AdInfo::default());

    c.bench_function("event_bus publish (16 subscribers)", |b| {
        b.iter(|| black_box(bus.publish(kind, &id, payload.clone())));
    });
}

/// Deliver a native `Loaded` callback and let the controller translate,
/// transition and publish it.
fn bench_callback_round_trip(c: &mut Criterion) {
    let engine = MockBridge::new();
    let bus = EventBus::new();
    bus.subscribe(
        EventKind::new(AdFormat::Interstitial, AdEventType::Loaded),
        |event| {
            black_box(event.ad_info());
        },
    );
    let controller = AdController::new(Arc::new(engine.clone()), bus);
    let id = AdId::from("bench-inter");
    if controller
        .create(id.clone(), "bench", AdFormat::Interstitial)
        .is_err()
    {
        return;
    }
    let Some(ad) = engine.last_ad() else {
        return;
    };
    let info = engine.ad_info(ad);

    c.bench_function("controller load + Loaded callback", |b| {
        b.iter(|| {
            let _ = controller.load(&id);
            engine.deliver(ad, MockCallback::Loaded(info.clone()));
        });
    });
}

criterion_group!(benches, bench_publish_fan_out, bench_callback_round_trip);
criterion_main!(benches);
