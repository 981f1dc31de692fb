// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Owning wrapper around a native ad object.
//
// View-only operations (hide, auto-refresh) exist only on the `Banner`
// variant, so asking a fullscreen handle to hide is a type error surfaced as
// `InvalidAdType` rather than a silent no-op.  The wrapper also guarantees the
// native object is released at most once.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use adbridge_core::error::{BridgeError, Result};
use adbridge_core::types::{AdFormat, AdId};
use adbridge_native::traits::{NativeAd, NativeAdView};

/// Native object behind one registry entry, tagged by capability set.
pub enum AdHandle {
    /// Banner, MREC and leaderboard views.
    Banner(Box<dyn NativeAdView>),
    Interstitial(Box<dyn NativeAd>),
    Rewarded(Box<dyn NativeAd>),
}

impl AdHandle {
    fn load(&mut self) -> Result<()> {
        match self {
            Self::Banner(view) => view.load(),
            Self::Interstitial(ad) | Self::Rewarded(ad) => ad.load(),
        }
    }

    fn show(&mut self) -> Result<()> {
        match self {
            Self::Banner(view) => view.show(),
            Self::Interstitial(ad) | Self::Rewarded(ad) => ad.show(),
        }
    }

    fn is_ready(&self) -> bool {
        match self {
            Self::Banner(view) => view.is_ready(),
            Self::Interstitial(ad) | Self::Rewarded(ad) => ad.is_ready(),
        }
    }

    fn destroy(&mut self) {
        match self {
            Self::Banner(view) => view.destroy(),
            Self::Interstitial(ad) | Self::Rewarded(ad) => ad.destroy(),
        }
    }

    fn view_mut(&mut self) -> Option<&mut dyn NativeAdView> {
        match self {
            Self::Banner(view) => Some(view.as_mut()),
            _ => None,
        }
    }
}

/// A native object plus its release flag.
pub struct NativeHandle {
    id: AdId,
    format: AdFormat,
    ad: AdHandle,
    released: bool,
}

/// Handle shared between the registry entry and in-flight operations.
///
/// Locked independently of the registry so a slow native call never blocks
/// operations on other instances.
pub type SharedHandle = Arc<Mutex<NativeHandle>>;

impl NativeHandle {
    pub fn new(id: AdId, format: AdFormat, ad: AdHandle) -> Self {
        Self {
            id,
            format,
            ad,
            released: false,
        }
    }

    pub fn into_shared(self) -> SharedHandle {
        Arc::new(Mutex::new(self))
    }

    /// Lock a shared handle, recovering from a poisoned mutex.
    pub fn lock(shared: &SharedHandle) -> MutexGuard<'_, NativeHandle> {
        shared.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn live(&mut self) -> Result<&mut AdHandle> {
        if self.released {
            Err(BridgeError::NotFound(self.id.clone()))
        } else {
            Ok(&mut self.ad)
        }
    }

    fn view(&mut self) -> Result<&mut dyn NativeAdView> {
        let (id, format) = (self.id.clone(), self.format);
        self.live()?
            .view_mut()
            .ok_or(BridgeError::InvalidAdType {
                id,
                expected: AdFormat::Banner,
                actual: format,
            })
    }

    pub fn load(&mut self) -> Result<()> {
        self.live()?.load()
    }

    pub fn show(&mut self) -> Result<()> {
        self.live()?.show()
    }

    pub fn hide(&mut self) -> Result<()> {
        self.view()?.hide()
    }

    pub fn start_auto_refresh(&mut self) -> Result<()> {
        self.view()?.start_auto_refresh()
    }

    pub fn stop_auto_refresh(&mut self) -> Result<()> {
        self.view()?.stop_auto_refresh()
    }

    pub fn is_ready(&self) -> bool {
        !self.released && self.ad.is_ready()
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    /// Release the native object.  Returns `false` if it was already released.
    pub fn release(&mut self) -> bool {
        if self.released {
            return false;
        }
        self.ad.destroy();
        self.released = true;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use adbridge_core::types::BannerSize;
    use adbridge_native::mock::{MockBridge, NullListener};
    use adbridge_native::traits::NativeAdEngine;

    fn silent() -> adbridge_native::traits::SharedListener {
        NullListener::shared()
    }

    #[test]
    fn release_happens_once() {
        let engine = MockBridge::new();
        let ad = engine.create_interstitial("inter", silent()).expect("allocate");
        let mut handle =
            NativeHandle::new("i1".into(), AdFormat::Interstitial, AdHandle::Interstitial(ad));

        assert!(handle.release());
        assert!(!handle.release());
        assert_eq!(engine.release_count(), 1);
        assert!(matches!(handle.load(), Err(BridgeError::NotFound(_))));
    }

    #[test]
    fn fullscreen_handle_rejects_view_operations() {
        let engine = MockBridge::new();
        let ad = engine.create_rewarded("rw", silent()).expect("allocate");
        let mut handle =
            NativeHandle::new("r1".into(), AdFormat::Rewarded, AdHandle::Rewarded(ad));

        let err = handle.hide().unwrap_err();
        assert_eq!(err.code(), "INVALID_AD_TYPE");
        assert!(handle.start_auto_refresh().is_err());
    }

    #[test]
    fn view_handle_forwards_view_operations() {
        let engine = MockBridge::new();
        let view = engine
            .create_banner("home", BannerSize::Standard, silent())
            .expect("allocate");
        let mut handle =
            NativeHandle::new("b1".into(), AdFormat::Banner, AdHandle::Banner(view));

        handle.load().expect("load");
        handle.start_auto_refresh().expect("refresh");
        handle.hide().expect("hide");

        let snap = engine
            .snapshot(engine.last_ad().expect("ad"))
            .expect("snapshot");
        assert_eq!(snap.load_calls, 1);
        assert_eq!(snap.hide_calls, 1);
        assert!(snap.auto_refresh);
    }
}
