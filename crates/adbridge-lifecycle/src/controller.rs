// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Ad lifecycle controller.
//
// Owns the instance registry and drives each instance through its state
// machine:
//
//   fullscreen:  Created → Loading → {Loaded | LoadFailed}
//                Loaded → Showing → Shown → Closed
//                Closed | LoadFailed → Loading
//   view:        as above, but show goes straight to Shown, Shown ⇄ Hidden,
//                and auto-refresh re-enters Loading while not visible.
//
// Locking: the registry mutex is held only for bookkeeping.  State is
// updated under it, the lock is dropped, and only then is the native object
// (behind its own per-instance mutex) or the event bus invoked.  Native
// callbacks re-enter through `CallbackSink`, take the registry lock briefly
// to validate and transition, and publish after releasing it.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use adbridge_core::error::{BridgeError, Result};
use adbridge_core::events::{AdEventType, EventKind, EventPayload};
use adbridge_core::types::{AdFormat, AdId, AdState, BannerSize};
use adbridge_native::traits::{PlatformBridge, SharedListener};
use tracing::{debug, info, instrument, warn};

use crate::event_bus::EventBus;
use crate::handle::{AdHandle, NativeHandle, SharedHandle};
use crate::listener::{CallbackSink, ListenerAdapter, NativeCallback};
use crate::registry::{AdInstance, AdSnapshot, InstanceRegistry};

/// Event to publish once all locks are released.
type Publication = (AdEventType, EventPayload);

struct ControllerCore {
    engine: Arc<dyn PlatformBridge>,
    registry: Mutex<InstanceRegistry>,
    bus: EventBus,
}

/// Lifecycle controller shared by every façade operation.
///
/// Cloning is cheap; all clones drive the same registry.
#[derive(Clone)]
pub struct AdController {
    core: Arc<ControllerCore>,
}

impl AdController {
    pub fn new(engine: Arc<dyn PlatformBridge>, bus: EventBus) -> Self {
        info!(platform = engine.platform_name(), "ad controller ready");
        Self {
            core: Arc::new(ControllerCore {
                engine,
                registry: Mutex::new(InstanceRegistry::new()),
                bus,
            }),
        }
    }

    pub fn bus(&self) -> &EventBus {
        &self.core.bus
    }

    pub fn engine(&self) -> &Arc<dyn PlatformBridge> {
        &self.core.engine
    }

    fn registry(&self) -> MutexGuard<'_, InstanceRegistry> {
        self.core.registry()
    }

    // -- Creation -----------------------------------------------------------

    /// Allocate a native ad object of `format` and register it under `id`.
    ///
    /// Views get the default size for their format (banner 320x50, MREC
    /// 300x250); use [`create_view`](Self::create_view) for leaderboards.
    pub fn create(&self, id: AdId, placement: &str, format: AdFormat) -> Result<()> {
        let size = match format {
            AdFormat::Banner => Some(BannerSize::Standard),
            AdFormat::Mrec => Some(BannerSize::Mrec),
            AdFormat::Interstitial | AdFormat::Rewarded => None,
        };
        self.create_inner(id, placement, format, size)
    }

    /// Allocate an inline view of the given size.
    pub fn create_view(&self, id: AdId, placement: &str, size: BannerSize) -> Result<()> {
        self.create_inner(id, placement, size.format(), Some(size))
    }

    #[instrument(skip(self, id, size), fields(ad_id = %id))]
    fn create_inner(
        &self,
        id: AdId,
        placement: &str,
        format: AdFormat,
        size: Option<BannerSize>,
    ) -> Result<()> {
        let generation = {
            let mut reg = self.registry();
            if reg.contains(&id) {
                return Err(BridgeError::DuplicateId(id));
            }
            reg.reserve_generation()
        };

        let sink: Weak<dyn CallbackSink> = Arc::downgrade(&self.core) as Weak<dyn CallbackSink>;
        let listener: SharedListener =
            Arc::new(ListenerAdapter::new(id.clone(), generation, sink));

        let engine = &self.core.engine;
        let allocated = match format {
            AdFormat::Banner | AdFormat::Mrec => engine
                .create_banner(placement, size.unwrap_or_default(), listener)
                .map(AdHandle::Banner),
            AdFormat::Interstitial => engine
                .create_interstitial(placement, listener)
                .map(AdHandle::Interstitial),
            AdFormat::Rewarded => engine
                .create_rewarded(placement, listener)
                .map(AdHandle::Rewarded),
        };
        let ad = allocated.map_err(|err| {
            warn!(ad_id = %id, placement, error = %err, "native allocation failed");
            allocation_error(err)
        })?;

        let handle = NativeHandle::new(id.clone(), format, ad).into_shared();
        let instance = AdInstance::new(
            id.clone(),
            format,
            placement,
            size,
            generation,
            Arc::clone(&handle),
        );

        let lost_race = {
            let mut reg = self.registry();
            if reg.contains(&id) {
                true
            } else {
                reg.register(instance)?;
                false
            }
        };
        if lost_race {
            warn!(ad_id = %id, "concurrent create won; releasing duplicate native object");
            NativeHandle::lock(&handle).release();
            return Err(BridgeError::DuplicateId(id));
        }

        info!(ad_id = %id, %format, placement, generation, "ad instance created");
        Ok(())
    }

    // -- Load / show --------------------------------------------------------

    /// Request a creative for any format.
    pub fn load(&self, id: &AdId) -> Result<()> {
        self.load_inner(id, None)
    }

    /// Request a creative, rejecting with `InvalidAdType` unless the instance
    /// belongs to the `expected` format family.
    pub fn load_as(&self, id: &AdId, expected: AdFormat) -> Result<()> {
        self.load_inner(id, Some(expected))
    }

    #[instrument(skip(self, id), fields(ad_id = %id))]
    fn load_inner(&self, id: &AdId, expected: Option<AdFormat>) -> Result<()> {
        let (handle, generation, previous) = {
            let mut reg = self.registry();
            let inst = live_instance(&mut reg, id)?;
            check_format(inst, expected)?;
            let previous = inst.state;
            if previous.is_visible() && inst.format.is_fullscreen() {
                return Err(not_ready(inst, "load"));
            }
            if !previous.is_visible() {
                inst.set_state(AdState::Loading);
            }
            (inst.handle(), inst.generation, previous)
        };

        let outcome = NativeHandle::lock(&handle).load();
        if let Err(err) = outcome {
            warn!(ad_id = %id, error = %err, "native load rejected");
            self.restore_state(id, generation, AdState::Loading, previous);
            return Err(err);
        }
        debug!(ad_id = %id, "load requested");
        Ok(())
    }

    /// Present a loaded ad of any format.
    pub fn show(&self, id: &AdId) -> Result<()> {
        self.show_inner(id, None)
    }

    pub fn show_as(&self, id: &AdId, expected: AdFormat) -> Result<()> {
        self.show_inner(id, Some(expected))
    }

    #[instrument(skip(self, id), fields(ad_id = %id))]
    fn show_inner(&self, id: &AdId, expected: Option<AdFormat>) -> Result<()> {
        let (handle, generation, format, previous, next) = {
            let mut reg = self.registry();
            let inst = live_instance(&mut reg, id)?;
            check_format(inst, expected)?;
            let previous = inst.state;
            let showable = match previous {
                AdState::Loaded => true,
                AdState::Hidden => inst.format.is_view(),
                _ => false,
            };
            if !showable {
                return Err(not_ready(inst, "show"));
            }
            let next = if inst.format.is_view() {
                AdState::Shown
            } else {
                AdState::Showing
            };
            inst.reward_granted = false;
            inst.set_state(next);
            (inst.handle(), inst.generation, inst.format, previous, next)
        };

        let outcome = NativeHandle::lock(&handle).show();
        if let Err(err) = outcome {
            warn!(ad_id = %id, error = %err, "native show rejected");
            let current = self.restore_state(id, generation, next, previous);
            match &err {
                BridgeError::NativeOperationFailed(native) if current => {
                    self.core.bus.publish(
                        EventKind::new(format, AdEventType::FailedToShow),
                        id,
                        EventPayload::Error(native.clone()),
                    );
                }
                _ if !current => {
                    debug!(ad_id = %id, generation, "instance gone during show, failure not published");
                }
                _ => {}
            }
            return Err(err);
        }
        debug!(ad_id = %id, "show requested");
        Ok(())
    }

    // -- View-only operations ----------------------------------------------

    /// Take a visible banner/MREC off screen.
    #[instrument(skip(self, id), fields(ad_id = %id))]
    pub fn hide(&self, id: &AdId) -> Result<()> {
        let (handle, generation, format, previous) = {
            let mut reg = self.registry();
            let inst = live_instance(&mut reg, id)?;
            check_format(inst, Some(AdFormat::Banner))?;
            let previous = inst.state;
            if !previous.is_visible() {
                return Err(not_ready(inst, "hide"));
            }
            inst.set_state(AdState::Hidden);
            (inst.handle(), inst.generation, inst.format, previous)
        };

        let outcome = NativeHandle::lock(&handle).hide();
        if let Err(err) = outcome {
            warn!(ad_id = %id, error = %err, "native hide rejected");
            self.restore_state(id, generation, AdState::Hidden, previous);
            return Err(err);
        }
        self.core.bus.publish(
            EventKind::new(format, AdEventType::Hidden),
            id,
            EventPayload::Empty,
        );
        Ok(())
    }

    #[instrument(skip(self, id), fields(ad_id = %id))]
    pub fn start_auto_refresh(&self, id: &AdId) -> Result<()> {
        self.set_auto_refresh(id, true)
    }

    #[instrument(skip(self, id), fields(ad_id = %id))]
    pub fn stop_auto_refresh(&self, id: &AdId) -> Result<()> {
        self.set_auto_refresh(id, false)
    }

    fn set_auto_refresh(&self, id: &AdId, enabled: bool) -> Result<()> {
        let (handle, generation) = {
            let mut reg = self.registry();
            let inst = live_instance(&mut reg, id)?;
            check_format(inst, Some(AdFormat::Banner))?;
            (inst.handle(), inst.generation)
        };

        {
            let mut native = NativeHandle::lock(&handle);
            if enabled {
                native.start_auto_refresh()?;
            } else {
                native.stop_auto_refresh()?;
            }
        }

        let mut reg = self.registry();
        if let Some(inst) = reg.lookup_mut(id).filter(|i| i.generation == generation) {
            inst.auto_refresh_enabled = enabled;
        }
        debug!(ad_id = %id, enabled, "auto-refresh toggled");
        Ok(())
    }

    // -- Destruction --------------------------------------------------------

    /// Release the native object and forget `id`.
    ///
    /// Destroying an id that was already destroyed is a no-op; an id that was
    /// never created is `NotFound`.
    #[instrument(skip(self, id), fields(ad_id = %id))]
    pub fn destroy(&self, id: &AdId) -> Result<()> {
        let instance = {
            let mut reg = self.registry();
            match reg.unregister(id) {
                Some(instance) => instance,
                None if reg.was_retired(id) => {
                    debug!(ad_id = %id, "already destroyed");
                    return Ok(());
                }
                None => return Err(BridgeError::NotFound(id.clone())),
            }
        };
        release_instance(instance);
        info!(ad_id = %id, "ad instance destroyed");
        Ok(())
    }

    /// Destroy every live instance.  Returns how many were released.
    #[instrument(skip(self))]
    pub fn teardown(&self) -> usize {
        let drained = self.registry().drain();
        let count = drained.len();
        for instance in drained {
            release_instance(instance);
        }
        info!(count, "all ad instances torn down");
        count
    }

    // -- Queries ------------------------------------------------------------

    /// `Loaded` for fullscreen ads; `Loaded` or `Shown` for views.  Unknown
    /// ids are simply not ready.
    pub fn is_ready(&self, id: &AdId) -> bool {
        self.registry().lookup(id).is_some_and(instance_ready)
    }

    /// Like [`is_ready`](Self::is_ready), but also `false` when the instance
    /// belongs to another format family.
    pub fn is_ready_as(&self, id: &AdId, expected: AdFormat) -> bool {
        self.registry()
            .lookup(id)
            .is_some_and(|inst| expected.accepts(inst.format) && instance_ready(inst))
    }

    pub fn state(&self, id: &AdId) -> Option<AdState> {
        self.registry().lookup(id).map(|inst| inst.state)
    }

    pub fn instance(&self, id: &AdId) -> Option<AdSnapshot> {
        self.registry().lookup(id).map(AdInstance::snapshot)
    }

    pub fn live_count(&self) -> usize {
        self.registry().live_count()
    }

    pub fn live_instances(&self) -> Vec<AdSnapshot> {
        let mut all: Vec<AdSnapshot> = self
            .registry()
            .all_live()
            .into_iter()
            .map(AdInstance::snapshot)
            .collect();
        all.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        all
    }

    /// Put the state back after a rejected native call, unless a callback
    /// already moved the instance on.
    ///
    /// Returns `false` when the instance was destroyed or re-created in the
    /// meantime, in which case nothing is touched.
    fn restore_state(
        &self,
        id: &AdId,
        generation: u64,
        expected: AdState,
        previous: AdState,
    ) -> bool {
        let mut reg = self.registry();
        let Some(inst) = reg.lookup_mut(id).filter(|i| i.generation == generation) else {
            return false;
        };
        if inst.state == expected {
            inst.set_state(previous);
        }
        true
    }
}

impl ControllerCore {
    fn registry(&self) -> MutexGuard<'_, InstanceRegistry> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl CallbackSink for ControllerCore {
    fn on_native_callback(&self, ad_id: &AdId, generation: u64, callback: NativeCallback) {
        let (format, publication) = {
            let mut reg = self.registry();
            let Some(inst) = reg.lookup_mut(ad_id) else {
                debug!(%ad_id, ?callback, "callback for unknown ad dropped");
                return;
            };
            if inst.generation != generation {
                debug!(
                    %ad_id,
                    generation,
                    current = inst.generation,
                    "stale callback dropped"
                );
                return;
            }
            (inst.format, apply_callback(inst, callback))
        };

        if let Some((event, payload)) = publication {
            self.bus.publish(EventKind::new(format, event), ad_id, payload);
        }
    }
}

/// Transition `inst` for one native callback and decide what to publish.
fn apply_callback(inst: &mut AdInstance, callback: NativeCallback) -> Option<Publication> {
    let view = inst.format.is_view();
    // Views that are on screen or parked keep their state across refresh
    // cycles; only a fresh creative request moves them.
    let refresh_sticky =
        view && matches!(inst.state, AdState::Shown | AdState::Showing | AdState::Hidden);

    match callback {
        NativeCallback::Loaded(info) => {
            if !refresh_sticky {
                inst.set_state(AdState::Loaded);
            }
            Some((AdEventType::Loaded, EventPayload::Ad(info)))
        }
        NativeCallback::LoadFailed(error) => {
            if !refresh_sticky {
                inst.set_state(AdState::LoadFailed);
            }
            Some((AdEventType::FailedToLoad, EventPayload::Error(error)))
        }
        NativeCallback::Displayed(info) => {
            if !view && inst.state == AdState::Showing {
                inst.set_state(AdState::Shown);
            }
            Some((AdEventType::Shown, EventPayload::Ad(info)))
        }
        NativeCallback::DisplayFailed(error) => {
            if !view && inst.state == AdState::Showing {
                inst.set_state(AdState::Loaded);
            }
            Some((AdEventType::FailedToShow, EventPayload::Error(error)))
        }
        NativeCallback::Hidden(info) => {
            if view {
                debug!(ad_id = %inst.id, "native view hidden callback not republished");
                return None;
            }
            inst.set_state(AdState::Closed);
            Some((AdEventType::Closed, EventPayload::Ad(info)))
        }
        NativeCallback::Clicked(info) => Some((AdEventType::Clicked, EventPayload::Ad(info))),
        NativeCallback::Impression(info) => {
            Some((AdEventType::Impression, EventPayload::Ad(info)))
        }
        NativeCallback::RevenuePaid(info) => {
            Some((AdEventType::RevenuePaid, EventPayload::Ad(info)))
        }
        NativeCallback::Rewarded(info) => {
            if inst.format != AdFormat::Rewarded {
                warn!(ad_id = %inst.id, format = %inst.format, "reward for non-rewarded ad dropped");
                return None;
            }
            if !inst.state.is_visible() || inst.reward_granted {
                warn!(
                    ad_id = %inst.id,
                    state = ?inst.state,
                    "duplicate or late reward dropped"
                );
                return None;
            }
            inst.reward_granted = true;
            Some((AdEventType::RewardEarned, EventPayload::Ad(info)))
        }
        NativeCallback::Expanded(info) if view => {
            Some((AdEventType::Expanded, EventPayload::Ad(info)))
        }
        NativeCallback::Collapsed(info) if view => {
            Some((AdEventType::Collapsed, EventPayload::Ad(info)))
        }
        NativeCallback::Expanded(_) | NativeCallback::Collapsed(_) => {
            debug!(ad_id = %inst.id, "expand/collapse for fullscreen ad ignored");
            None
        }
    }
}

fn live_instance<'a>(reg: &'a mut InstanceRegistry, id: &AdId) -> Result<&'a mut AdInstance> {
    reg.lookup_mut(id)
        .ok_or_else(|| BridgeError::NotFound(id.clone()))
}

fn check_format(inst: &AdInstance, expected: Option<AdFormat>) -> Result<()> {
    match expected {
        Some(expected) if !expected.accepts(inst.format) => Err(BridgeError::InvalidAdType {
            id: inst.id.clone(),
            expected,
            actual: inst.format,
        }),
        _ => Ok(()),
    }
}

fn not_ready(inst: &AdInstance, operation: &'static str) -> BridgeError {
    BridgeError::NotReady {
        id: inst.id.clone(),
        operation,
        state: inst.state,
    }
}

fn instance_ready(inst: &AdInstance) -> bool {
    match inst.state {
        AdState::Loaded => true,
        AdState::Shown => inst.format.is_view(),
        _ => false,
    }
}

fn allocation_error(err: BridgeError) -> BridgeError {
    match err {
        BridgeError::NativeOperationFailed(native) => BridgeError::NativeAllocationFailed(native),
        other => other,
    }
}

/// Stop refresh if needed, then release the native object.
fn release_instance(mut instance: AdInstance) {
    let handle: SharedHandle = instance.handle();
    let mut native = NativeHandle::lock(&handle);
    if instance.auto_refresh_enabled {
        if let Err(err) = native.stop_auto_refresh() {
            warn!(ad_id = %instance.id, error = %err, "stopping auto-refresh failed during destroy");
        }
        instance.auto_refresh_enabled = false;
    }
    if !native.release() {
        debug!(ad_id = %instance.id, "native object already released");
    }
    instance.set_state(AdState::Destroyed);
}
