// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scriptable in-process ad engine.
//
// Stands in for the native SDK in tests and in the demo binary.  Every native
// object it allocates is recorded with call counters, and listener callbacks
// are delivered only when the caller asks for them: either immediately via
// `deliver`, or from the pending queue via `deliver_pending`, which plays the
// role of the native callback-delivery queue.
//
// In autoplay mode `load`, `show` and auto-refresh ticks queue the callbacks a
// well-behaved network would produce.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use adbridge_core::error::{BridgeError, Result};
use adbridge_core::types::{
    AdFormat, AdInfo, BannerSize, InitParams, LogLevel, NativeError, PrivacyFlags,
};
use tracing::debug;
use uuid::Uuid;

use crate::traits::*;

/// Revenue reported by autoplay `RevenuePaid` callbacks, in USD.
pub const AUTOPLAY_REVENUE: f64 = 0.0125;

/// Code run from inside a native call, before it returns.
pub type MockHook = Box<dyn FnOnce() + Send>;

/// A listener callback the mock engine can deliver.
#[derive(Debug, Clone, PartialEq)]
pub enum MockCallback {
    Loaded(AdInfo),
    LoadFailed(NativeError),
    Displayed(AdInfo),
    DisplayFailed(NativeError),
    Hidden(AdInfo),
    Clicked(AdInfo),
    Impression(AdInfo),
    RevenuePaid(AdInfo),
    Rewarded(AdInfo),
    Expanded(AdInfo),
    Collapsed(AdInfo),
}

impl MockCallback {
    fn dispatch(self, listener: &dyn AdListener) {
        match self {
            Self::Loaded(ad) => listener.on_ad_loaded(ad),
            Self::LoadFailed(err) => listener.on_ad_load_failed(err),
            Self::Displayed(ad) => listener.on_ad_displayed(ad),
            Self::DisplayFailed(err) => listener.on_ad_display_failed(err),
            Self::Hidden(ad) => listener.on_ad_hidden(ad),
            Self::Clicked(ad) => listener.on_ad_clicked(ad),
            Self::Impression(ad) => listener.on_ad_impression(ad),
            Self::RevenuePaid(ad) => listener.on_ad_revenue_paid(ad),
            Self::Rewarded(ad) => listener.on_user_rewarded(ad),
            Self::Expanded(ad) => listener.on_ad_expanded(ad),
            Self::Collapsed(ad) => listener.on_ad_collapsed(ad),
        }
    }
}

/// Listener that ignores every callback.
pub struct NullListener;

impl NullListener {
    pub fn shared() -> SharedListener {
        Arc::new(NullListener)
    }
}

impl AdListener for NullListener {
    fn on_ad_loaded(&self, _: AdInfo) {}
    fn on_ad_load_failed(&self, _: NativeError) {}
    fn on_ad_displayed(&self, _: AdInfo) {}
    fn on_ad_display_failed(&self, _: NativeError) {}
    fn on_ad_hidden(&self, _: AdInfo) {}
    fn on_ad_clicked(&self, _: AdInfo) {}
    fn on_ad_impression(&self, _: AdInfo) {}
    fn on_ad_revenue_paid(&self, _: AdInfo) {}
    fn on_user_rewarded(&self, _: AdInfo) {}
    fn on_ad_expanded(&self, _: AdInfo) {}
    fn on_ad_collapsed(&self, _: AdInfo) {}
}

/// Reference to a native object allocated by the mock engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MockAdRef(usize);

/// Call counters recorded for one mock native object.
#[derive(Debug, Clone)]
pub struct MockAdSnapshot {
    pub object_id: Uuid,
    pub format: AdFormat,
    pub placement: String,
    pub size: Option<BannerSize>,
    pub load_calls: u32,
    pub show_calls: u32,
    pub hide_calls: u32,
    pub destroy_calls: u32,
    pub auto_refresh: bool,
    pub ready: bool,
}

struct MockAdEntry {
    snapshot: MockAdSnapshot,
    listener: SharedListener,
}

#[derive(Default)]
struct MockState {
    autoplay: bool,
    initialized: bool,
    init_error: Option<NativeError>,
    init_hook: Option<MockHook>,
    allocation_error: Option<NativeError>,
    show_error: Option<NativeError>,
    show_hook: Option<MockHook>,
    ads: Vec<MockAdEntry>,
    pending: VecDeque<(usize, MockCallback)>,
    sdk_calls: Vec<String>,
    privacy: PrivacyFlags,
}

impl MockState {
    fn ad_info(&self, index: usize, revenue: f64) -> AdInfo {
        let snap = &self.ads[index].snapshot;
        AdInfo {
            placement_name: snap.placement.clone(),
            placement_id: format!("{}-{}", snap.placement, index),
            bidder_name: "mock-bidder".to_owned(),
            external_placement_id: snap.object_id.to_string(),
            revenue,
        }
    }

    fn record(&mut self, call: String) {
        debug!(%call, "mock sdk call");
        self.sdk_calls.push(call);
    }
}

/// In-process engine implementing every native capability trait.
///
/// Cloning is cheap; clones share the same recorded state, so a test can keep
/// one handle while the bridge owns another.
#[derive(Clone, Default)]
pub struct MockBridge {
    state: Arc<Mutex<MockState>>,
}

impl MockBridge {
    /// Engine that only delivers callbacks when told to.
    pub fn new() -> Self {
        Self::default()
    }

    /// Engine that queues success callbacks for every load, show and refresh.
    pub fn autoplay() -> Self {
        let bridge = Self::new();
        bridge.lock().autoplay = true;
        bridge
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Make every subsequent allocation fail (or succeed again with `None`).
    pub fn fail_allocations(&self, error: Option<NativeError>) {
        self.lock().allocation_error = error;
    }

    /// Make the next native `show` call return an error synchronously.
    pub fn fail_next_show(&self, error: NativeError) {
        self.lock().show_error = Some(error);
    }

    /// Run `hook` inside the next native `show` call, while the bridge is
    /// still waiting on it.
    pub fn on_next_show(&self, hook: impl FnOnce() + Send + 'static) {
        self.lock().show_hook = Some(Box::new(hook));
    }

    /// Run `hook` inside the next native `initialize` call, before it
    /// completes.
    pub fn on_next_initialize(&self, hook: impl FnOnce() + Send + 'static) {
        self.lock().init_hook = Some(Box::new(hook));
    }

    /// Make initialization complete with an error.
    pub fn fail_initialization(&self, error: NativeError) {
        self.lock().init_error = Some(error);
    }

    /// All allocated objects, in allocation order.
    pub fn ads(&self) -> Vec<MockAdRef> {
        (0..self.lock().ads.len()).map(MockAdRef).collect()
    }

    pub fn last_ad(&self) -> Option<MockAdRef> {
        self.lock().ads.len().checked_sub(1).map(MockAdRef)
    }

    /// Most recently allocated object for `placement`.
    pub fn find(&self, placement: &str) -> Option<MockAdRef> {
        self.lock()
            .ads
            .iter()
            .rposition(|entry| entry.snapshot.placement == placement)
            .map(MockAdRef)
    }

    pub fn snapshot(&self, ad: MockAdRef) -> Option<MockAdSnapshot> {
        self.lock().ads.get(ad.0).map(|entry| entry.snapshot.clone())
    }

    /// Total number of native releases across all objects.
    pub fn release_count(&self) -> u32 {
        self.lock()
            .ads
            .iter()
            .map(|entry| entry.snapshot.destroy_calls)
            .sum()
    }

    /// Metadata the mock attaches to callbacks for `ad`.
    pub fn ad_info(&self, ad: MockAdRef) -> AdInfo {
        self.lock().ad_info(ad.0, 0.0)
    }

    /// Deliver a callback right now, on the calling thread.
    ///
    /// Destroyed objects still deliver, which is how stale native callbacks
    /// are simulated.
    pub fn deliver(&self, ad: MockAdRef, callback: MockCallback) {
        let listener = {
            let mut state = self.lock();
            let Some(entry) = state.ads.get_mut(ad.0) else {
                return;
            };
            match &callback {
                MockCallback::Loaded(_) => entry.snapshot.ready = true,
                MockCallback::LoadFailed(_) | MockCallback::Displayed(_) => {
                    entry.snapshot.ready = entry.snapshot.format.is_view() && entry.snapshot.ready;
                }
                _ => {}
            }
            Arc::clone(&entry.listener)
        };
        callback.dispatch(listener.as_ref());
    }

    /// Queue a callback for the next `deliver_pending`.
    pub fn enqueue(&self, ad: MockAdRef, callback: MockCallback) {
        self.lock().pending.push_back((ad.0, callback));
    }

    /// Drain the pending queue in order, including callbacks queued while
    /// draining.  Returns the number delivered.
    pub fn deliver_pending(&self) -> usize {
        let mut delivered = 0;
        loop {
            let next = self.lock().pending.pop_front();
            let Some((index, callback)) = next else {
                return delivered;
            };
            self.deliver(MockAdRef(index), callback);
            delivered += 1;
        }
    }

    /// Simulate the user dismissing a fullscreen ad.
    pub fn close(&self, ad: MockAdRef) {
        let info = self.ad_info(ad);
        self.enqueue(ad, MockCallback::Hidden(info));
    }

    /// Simulate one auto-refresh cycle on every view with refresh enabled.
    ///
    /// Returns the number of views that refreshed.
    pub fn refresh_tick(&self) -> usize {
        let mut state = self.lock();
        let due: Vec<usize> = state
            .ads
            .iter()
            .enumerate()
            .filter(|(_, e)| e.snapshot.auto_refresh && e.snapshot.destroy_calls == 0)
            .map(|(i, _)| i)
            .collect();
        for index in &due {
            let info = state.ad_info(*index, 0.0);
            state.ads[*index].snapshot.load_calls += 1;
            state.pending.push_back((*index, MockCallback::Loaded(info)));
        }
        due.len()
    }

    /// SDK-level calls recorded so far, e.g. `set_logging_enabled(true)`.
    pub fn sdk_calls(&self) -> Vec<String> {
        self.lock().sdk_calls.clone()
    }

    pub fn privacy(&self) -> PrivacyFlags {
        self.lock().privacy.clone()
    }

    fn allocate(
        &self,
        format: AdFormat,
        placement: &str,
        size: Option<BannerSize>,
        listener: SharedListener,
    ) -> Result<MockAd> {
        let mut state = self.lock();
        if let Some(err) = state.allocation_error.clone() {
            return Err(BridgeError::NativeAllocationFailed(err));
        }
        let index = state.ads.len();
        state.ads.push(MockAdEntry {
            snapshot: MockAdSnapshot {
                object_id: Uuid::new_v4(),
                format,
                placement: placement.to_owned(),
                size,
                load_calls: 0,
                show_calls: 0,
                hide_calls: 0,
                destroy_calls: 0,
                auto_refresh: false,
                ready: false,
            },
            listener,
        });
        debug!(index, ?format, placement, "mock native ad allocated");
        Ok(MockAd {
            index,
            state: Arc::clone(&self.state),
        })
    }
}

/// Native object handed to the bridge.
struct MockAd {
    index: usize,
    state: Arc<Mutex<MockState>>,
}

impl MockAd {
    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl NativeAd for MockAd {
    fn load(&mut self) -> Result<()> {
        let mut state = self.lock();
        state.ads[self.index].snapshot.load_calls += 1;
        if state.autoplay {
            let info = state.ad_info(self.index, 0.0);
            state.pending.push_back((self.index, MockCallback::Loaded(info)));
        }
        Ok(())
    }

    fn show(&mut self) -> Result<()> {
        let hook = self.lock().show_hook.take();
        if let Some(hook) = hook {
            hook();
        }
        let mut state = self.lock();
        state.ads[self.index].snapshot.show_calls += 1;
        if let Some(err) = state.show_error.take() {
            return Err(BridgeError::NativeOperationFailed(err));
        }
        if state.autoplay {
            let info = state.ad_info(self.index, 0.0);
            let paid = state.ad_info(self.index, AUTOPLAY_REVENUE);
            state.pending.extend([
                (self.index, MockCallback::Displayed(info.clone())),
                (self.index, MockCallback::Impression(info)),
                (self.index, MockCallback::RevenuePaid(paid)),
            ]);
        }
        Ok(())
    }

    fn is_ready(&self) -> bool {
        self.lock().ads[self.index].snapshot.ready
    }

    fn destroy(&mut self) {
        let mut state = self.lock();
        let snap = &mut state.ads[self.index].snapshot;
        snap.destroy_calls += 1;
        snap.auto_refresh = false;
        snap.ready = false;
    }
}

impl NativeAdView for MockAd {
    fn hide(&mut self) -> Result<()> {
        self.lock().ads[self.index].snapshot.hide_calls += 1;
        Ok(())
    }

    fn start_auto_refresh(&mut self) -> Result<()> {
        self.lock().ads[self.index].snapshot.auto_refresh = true;
        Ok(())
    }

    fn stop_auto_refresh(&mut self) -> Result<()> {
        self.lock().ads[self.index].snapshot.auto_refresh = false;
        Ok(())
    }
}

impl PlatformBridge for MockBridge {
    fn platform_name(&self) -> &str {
        "Mock"
    }
}

impl NativeAdEngine for MockBridge {
    fn create_banner(
        &self,
        placement: &str,
        size: BannerSize,
        listener: SharedListener,
    ) -> Result<Box<dyn NativeAdView>> {
        let ad = self.allocate(size.format(), placement, Some(size), listener)?;
        Ok(Box::new(ad))
    }

    fn create_interstitial(
        &self,
        placement: &str,
        listener: SharedListener,
    ) -> Result<Box<dyn NativeAd>> {
        let ad = self.allocate(AdFormat::Interstitial, placement, None, listener)?;
        Ok(Box::new(ad))
    }

    fn create_rewarded(
        &self,
        placement: &str,
        listener: SharedListener,
    ) -> Result<Box<dyn NativeAd>> {
        let ad = self.allocate(AdFormat::Rewarded, placement, None, listener)?;
        Ok(Box::new(ad))
    }
}

impl NativeSdk for MockBridge {
    fn initialize(&self, params: &InitParams, on_complete: InitCallback) {
        let hook = self.lock().init_hook.take();
        if let Some(hook) = hook {
            hook();
        }
        let outcome = {
            let mut state = self.lock();
            state.record(format!("initialize({}, {:?})", params.app_key, params.environment));
            match state.init_error.clone() {
                Some(err) => Err(err),
                None => {
                    state.initialized = true;
                    Ok(())
                }
            }
        };
        on_complete(outcome);
    }

    fn is_initialized(&self) -> bool {
        self.lock().initialized
    }

    fn sdk_version(&self) -> String {
        "mock-1.0.0".to_owned()
    }

    fn set_logging_enabled(&self, enabled: bool) -> Result<()> {
        self.lock().record(format!("set_logging_enabled({enabled})"));
        Ok(())
    }

    fn set_min_log_level(&self, level: LogLevel) -> Result<()> {
        self.lock().record(format!("set_min_log_level({level:?})"));
        Ok(())
    }

    fn set_privacy(&self, privacy: &PrivacyFlags) -> Result<()> {
        let mut state = self.lock();
        state.record("set_privacy".to_owned());
        state.privacy = privacy.clone();
        Ok(())
    }

    fn set_hashed_user_id(&self, hashed_user_id: &str) -> Result<()> {
        self.lock().record(format!("set_hashed_user_id({hashed_user_id})"));
        Ok(())
    }

    fn set_user_key_value(&self, key: &str, value: &str) -> Result<()> {
        self.lock().record(format!("set_user_key_value({key}, {value})"));
        Ok(())
    }

    fn set_app_key_value(&self, key: &str, value: &str) -> Result<()> {
        self.lock().record(format!("set_app_key_value({key}, {value})"));
        Ok(())
    }

    fn set_bidder_key_value(&self, bidder: &str, key: &str, value: &str) -> Result<()> {
        self.lock()
            .record(format!("set_bidder_key_value({bidder}, {key}, {value})"));
        Ok(())
    }

    fn clear_all_key_values(&self) -> Result<()> {
        self.lock().record("clear_all_key_values".to_owned());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder(Mutex<Vec<String>>);

    impl Recorder {
        fn push(&self, what: &str) {
            self.0.lock().unwrap().push(what.to_owned());
        }
    }

    impl AdListener for Recorder {
        fn on_ad_loaded(&self, _ad: AdInfo) {
            self.push("loaded");
        }
        fn on_ad_load_failed(&self, _error: NativeError) {
            self.push("load_failed");
        }
        fn on_ad_displayed(&self, _ad: AdInfo) {
            self.push("displayed");
        }
        fn on_ad_display_failed(&self, _error: NativeError) {
            self.push("display_failed");
        }
        fn on_ad_hidden(&self, _ad: AdInfo) {
            self.push("hidden");
        }
        fn on_ad_clicked(&self, _ad: AdInfo) {
            self.push("clicked");
        }
        fn on_ad_impression(&self, _ad: AdInfo) {
            self.push("impression");
        }
        fn on_ad_revenue_paid(&self, _ad: AdInfo) {
            self.push("revenue");
        }
        fn on_user_rewarded(&self, _ad: AdInfo) {
            self.push("rewarded");
        }
        fn on_ad_expanded(&self, _ad: AdInfo) {
            self.push("expanded");
        }
        fn on_ad_collapsed(&self, _ad: AdInfo) {
            self.push("collapsed");
        }
    }

    #[test]
    fn autoplay_queues_callbacks_until_drained() {
        let bridge = MockBridge::autoplay();
        let recorder = Arc::new(Recorder::default());
        let mut ad = bridge
            .create_interstitial("inter", recorder.clone())
            .expect("allocate");

        ad.load().expect("load");
        assert!(recorder.0.lock().unwrap().is_empty());
        assert_eq!(bridge.deliver_pending(), 1);
        assert!(ad.is_ready());

        ad.show().expect("show");
        assert_eq!(bridge.deliver_pending(), 3);
        assert_eq!(
            *recorder.0.lock().unwrap(),
            vec!["loaded", "displayed", "impression", "revenue"]
        );
    }

    #[test]
    fn allocation_failure_is_reported() {
        let bridge = MockBridge::new();
        bridge.fail_allocations(Some(NativeError::new("INTERNAL", "boom")));
        let result = bridge.create_rewarded("r", Arc::new(Recorder::default()));
        assert!(matches!(result, Err(BridgeError::NativeAllocationFailed(_))));
        assert!(bridge.ads().is_empty());
    }

    #[test]
    fn refresh_tick_only_touches_refreshing_views() {
        let bridge = MockBridge::new();
        let mut banner = bridge
            .create_banner("top", BannerSize::Standard, Arc::new(Recorder::default()))
            .expect("banner");
        bridge
            .create_banner("side", BannerSize::Mrec, Arc::new(Recorder::default()))
            .expect("mrec");

        banner.start_auto_refresh().expect("start");
        assert_eq!(bridge.refresh_tick(), 1);

        banner.destroy();
        assert_eq!(bridge.refresh_tick(), 0);
        assert_eq!(bridge.release_count(), 1);
        let mrec = bridge.find("side").expect("mrec ref");
        assert_eq!(bridge.snapshot(mrec).unwrap().format, AdFormat::Mrec);
    }
}
