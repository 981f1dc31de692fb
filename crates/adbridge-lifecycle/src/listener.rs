// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Per-instance listener handed to the native engine.
//
// The adapter knows only the id and generation it was created for.  It holds
// the controller weakly so a native object that outlives the controller
// cannot keep it alive or call into freed state.

use std::sync::Weak;

use adbridge_core::types::{AdId, AdInfo, NativeError};
use adbridge_native::traits::AdListener;
use tracing::trace;

/// A native listener callback, detached from the trait method it came from.
#[derive(Debug, Clone)]
pub(crate) enum NativeCallback {
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

/// Receiver of translated callbacks.
pub(crate) trait CallbackSink: Send + Sync {
    fn on_native_callback(&self, ad_id: &AdId, generation: u64, callback: NativeCallback);
}

pub(crate) struct ListenerAdapter {
    ad_id: AdId,
    generation: u64,
    sink: Weak<dyn CallbackSink>,
}

impl ListenerAdapter {
    pub(crate) fn new(ad_id: AdId, generation: u64, sink: Weak<dyn CallbackSink>) -> Self {
        Self {
            ad_id,
            generation,
            sink,
        }
    }

    fn forward(&self, callback: NativeCallback) {
        match self.sink.upgrade() {
            Some(sink) => sink.on_native_callback(&self.ad_id, self.generation, callback),
            None => trace!(ad_id = %self.ad_id, ?callback, "controller gone, callback dropped"),
        }
    }
}

impl AdListener for ListenerAdapter {
    fn on_ad_loaded(&self, ad: AdInfo) {
        self.forward(NativeCallback::Loaded(ad));
    }

    fn on_ad_load_failed(&self, error: NativeError) {
        self.forward(NativeCallback::LoadFailed(error));
    }

    fn on_ad_displayed(&self, ad: AdInfo) {
        self.forward(NativeCallback::Displayed(ad));
    }

    fn on_ad_display_failed(&self, error: NativeError) {
        self.forward(NativeCallback::DisplayFailed(error));
    }

    fn on_ad_hidden(&self, ad: AdInfo) {
        self.forward(NativeCallback::Hidden(ad));
    }

    fn on_ad_clicked(&self, ad: AdInfo) {
        self.forward(NativeCallback::Clicked(ad));
    }

    fn on_ad_impression(&self, ad: AdInfo) {
        self.forward(NativeCallback::Impression(ad));
    }

    fn on_ad_revenue_paid(&self, ad: AdInfo) {
        self.forward(NativeCallback::RevenuePaid(ad));
    }

    fn on_user_rewarded(&self, ad: AdInfo) {
        self.forward(NativeCallback::Rewarded(ad));
    }

    fn on_ad_expanded(&self, ad: AdInfo) {
        self.forward(NativeCallback::Expanded(ad));
    }

    fn on_ad_collapsed(&self, ad: AdInfo) {
        self.forward(NativeCallback::Collapsed(ad));
    }
}
