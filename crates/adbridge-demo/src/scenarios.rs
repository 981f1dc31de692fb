// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scripted ad flows.  Each one drives the façade the way a scripting caller
// would, and pumps the mock engine's callback queue between steps to stand
// in for the native SDK's asynchronous delivery.

use adbridge_facade::{AdBridge, AdConfig, FacadeResult};
use adbridge_native::mock::{MockBridge, MockCallback};
use tracing::info;

pub struct Demo {
    pub bridge: AdBridge,
    pub engine: MockBridge,
}

fn config(placement: &str, ad_id: &str, banner_size: Option<&str>) -> AdConfig {
    AdConfig {
        placement: placement.to_owned(),
        ad_id: Some(ad_id.to_owned()),
        banner_size: banner_size.map(str::to_owned),
    }
}

impl Demo {
    fn pump(&self) -> usize {
        self.engine.deliver_pending()
    }

    /// Create → load → show → one refresh cycle → hide → destroy.
    pub async fn banner(&self) -> FacadeResult<()> {
        info!("banner flow");
        self.bridge
            .create_banner(config("home_banner", "b1", None))
            .await?;
        self.bridge.load_banner("b1").await?;
        self.pump();

        self.bridge.show_banner("b1").await?;
        self.bridge.start_auto_refresh("b1").await?;
        self.pump();
        self.engine.refresh_tick();
        self.pump();

        self.bridge.stop_auto_refresh("b1").await?;
        self.bridge.hide_banner("b1").await?;
        self.bridge.destroy_ad("b1").await?;
        Ok(())
    }

    /// MREC view with a click that expands and collapses the creative.
    pub async fn mrec(&self) -> FacadeResult<()> {
        info!("MREC flow");
        self.bridge
            .create_mrec(config("feed_mrec", "m1", Some("MREC")))
            .await?;
        self.bridge.load_banner("m1").await?;
        self.pump();
        self.bridge.show_banner("m1").await?;
        self.pump();

        if let Some(ad) = self.engine.find("feed_mrec") {
            let info = self.engine.ad_info(ad);
            self.engine.enqueue(ad, MockCallback::Clicked(info.clone()));
            self.engine.enqueue(ad, MockCallback::Expanded(info.clone()));
            self.engine.enqueue(ad, MockCallback::Collapsed(info));
            self.pump();
        }

        self.bridge.destroy_ad("m1").await?;
        Ok(())
    }

    /// Load, show, then the user dismisses it.
    pub async fn interstitial(&self) -> FacadeResult<()> {
        info!("interstitial flow");
        self.bridge
            .create_interstitial(config("level_complete", "i1", None))
            .await?;
        self.bridge.load_interstitial("i1").await?;
        self.pump();
        info!(ready = self.bridge.is_interstitial_ready("i1"), "interstitial loaded");

        self.bridge.show_interstitial("i1").await?;
        self.pump();
        if let Some(ad) = self.engine.find("level_complete") {
            self.engine.close(ad);
            self.pump();
        }

        self.bridge.destroy_ad("i1").await?;
        Ok(())
    }

    /// Load, show, grant the reward, then close.
    pub async fn rewarded(&self) -> FacadeResult<()> {
        info!("rewarded flow");
        self.bridge
            .create_rewarded(config("extra_life", "r1", None))
            .await?;
        self.bridge.load_rewarded("r1").await?;
        self.pump();

        self.bridge.show_rewarded("r1").await?;
        self.pump();
        if let Some(ad) = self.engine.find("extra_life") {
            let info = self.engine.ad_info(ad);
            self.engine.enqueue(ad, MockCallback::Rewarded(info));
            self.engine.close(ad);
            self.pump();
        }

        self.bridge.destroy_ad("r1").await?;
        Ok(())
    }
}
