// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Central façade — owns the lifecycle controller and the native engine, and
// provides async methods for the scripting runtime to call.
//
// Every operation that reaches the native engine runs on tokio's blocking
// pool so a slow native call never stalls the caller's task.  When no native
// module is present each operation degrades instead of failing hard:
// `PLATFORM_UNSUPPORTED` for operations, `false` for queries and
// `{success: false, message: "Platform not supported"}` for `initialize`.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use adbridge_core::config::SdkConfig;
use adbridge_core::error::{BridgeError, Result};
use adbridge_core::events::{AdEvent, EventKind};
use adbridge_core::types::{AdFormat, AdId, Environment, LogLevel, PrivacyFlags};
use adbridge_lifecycle::{AdController, AdSnapshot, EventBus, SubscriptionId};
use adbridge_native::traits::PlatformBridge;
use tokio::sync::oneshot;
use tracing::{debug, error, info, instrument, warn};

use crate::request::{AdRequest, InitInput, NormalizedRequest};
use crate::response::{AdCreated, BridgeFailure, FacadeResult, InitResult, OpResult};

/// Shared façade.  Cheap to clone; all clones drive the same ads.
#[derive(Clone)]
pub struct AdBridge {
    platform: Arc<dyn PlatformBridge>,
    controller: AdController,
    settings: Arc<Mutex<SdkConfig>>,
}

impl AdBridge {
    pub fn new(platform: Arc<dyn PlatformBridge>) -> Self {
        Self::with_config(platform, SdkConfig::default())
    }

    /// Façade whose pre-initialization settings start from `config`.
    pub fn with_config(platform: Arc<dyn PlatformBridge>, config: SdkConfig) -> Self {
        let controller = AdController::new(Arc::clone(&platform), EventBus::new());
        info!(
            platform = platform.platform_name(),
            available = platform.is_available(),
            "ad bridge created"
        );
        Self {
            platform,
            controller,
            settings: Arc::new(Mutex::new(config)),
        }
    }

    /// Façade over whatever engine the host installed (or the stub).
    pub fn from_installed() -> Self {
        Self::new(adbridge_native::platform_bridge())
    }

    pub fn is_platform_available(&self) -> bool {
        self.platform.is_available()
    }

    pub fn controller(&self) -> &AdController {
        &self.controller
    }

    /// Current pre-initialization settings.
    pub fn settings(&self) -> SdkConfig {
        self.settings_lock().clone()
    }

    fn settings_lock(&self) -> MutexGuard<'_, SdkConfig> {
        self.settings.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn ensure_platform(&self) -> FacadeResult<()> {
        if self.platform.is_available() {
            Ok(())
        } else {
            debug!("native ad module absent");
            Err(BridgeFailure::platform_unsupported())
        }
    }

    /// Run a controller operation on the blocking pool.
    async fn run<T, F>(&self, op: F) -> FacadeResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&AdController) -> Result<T> + Send + 'static,
    {
        self.ensure_platform()?;
        let controller = self.controller.clone();
        join(tokio::task::spawn_blocking(move || op(&controller)).await)
    }

    /// Run an SDK-level call on the blocking pool.
    async fn sdk<T, F>(&self, op: F) -> FacadeResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&dyn PlatformBridge) -> Result<T> + Send + 'static,
    {
        self.ensure_platform()?;
        let platform = Arc::clone(&self.platform);
        join(tokio::task::spawn_blocking(move || op(platform.as_ref())).await)
    }

    // -- Initialization -----------------------------------------------------

    /// Start the native SDK.  Resolves when the native initialization
    /// callback fires.
    #[instrument(skip(self, input))]
    pub async fn initialize(&self, input: impl Into<InitInput>) -> FacadeResult<InitResult> {
        if !self.platform.is_available() {
            warn!("initialize called without a native ad module");
            return Ok(InitResult::unsupported());
        }

        let config = {
            let mut settings = self.settings_lock();
            match input.into() {
                InitInput::AppKey(app_key) => settings.app_key = app_key,
                InitInput::Config(config) => *settings = config,
            }
            settings.clone()
        };
        let params = config.init_params()?;

        let applied = config.clone();
        self.sdk(move |sdk| {
            sdk.set_logging_enabled(applied.logging_enabled)?;
            sdk.set_min_log_level(applied.min_log_level)?;
            if applied.privacy != PrivacyFlags::default() {
                sdk.set_privacy(&applied.privacy)?;
            }
            Ok(())
        })
        .await?;

        let (tx, rx) = oneshot::channel();
        info!(environment = ?params.environment, "initializing native SDK");
        self.sdk(move |sdk| {
            sdk.initialize(
                &params,
                Box::new(move |outcome| {
                    // The receiver is gone only if the caller stopped waiting.
                    let _ = tx.send(outcome);
                }),
            );
            Ok(())
        })
        .await?;

        match rx.await {
            Ok(Ok(())) => {
                info!(version = %self.platform.sdk_version(), "native SDK initialized");
                Ok(InitResult::initialized())
            }
            Ok(Err(native)) => {
                error!(code = %native.code, message = %native.message, "SDK initialization failed");
                Err(BridgeError::NativeOperationFailed(native).into())
            }
            Err(_) => Err(BridgeFailure::new(
                "NATIVE_OPERATION_FAILED",
                "initialization callback dropped without completing",
            )),
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.platform.is_available() && self.platform.is_initialized()
    }

    pub fn sdk_version(&self) -> String {
        self.platform.sdk_version()
    }

    /// Select the backend used by the next `initialize`.  Unknown names fall
    /// back to production.
    pub fn set_environment(&self, name: &str) -> Environment {
        let environment = Environment::parse(name).unwrap_or_else(|| {
            warn!(environment = name, "unknown environment, defaulting to production");
            Environment::Production
        });
        self.settings_lock().environment = environment;
        debug!(?environment, "environment set");
        environment
    }

    pub async fn set_logging_enabled(&self, enabled: bool) -> FacadeResult<()> {
        self.settings_lock().logging_enabled = enabled;
        self.sdk(move |sdk| sdk.set_logging_enabled(enabled)).await
    }

    /// Accepts VERBOSE/DEBUG/INFO/WARN/ERROR; anything else means DEBUG.
    pub async fn set_min_log_level(&self, name: &str) -> FacadeResult<LogLevel> {
        let level = LogLevel::parse(name).unwrap_or_else(|| {
            warn!(level = name, "unknown log level, defaulting to DEBUG");
            LogLevel::Debug
        });
        self.settings_lock().min_log_level = level;
        self.sdk(move |sdk| sdk.set_min_log_level(level)).await?;
        Ok(level)
    }

    // -- Privacy ------------------------------------------------------------

    async fn update_privacy(&self, change: impl FnOnce(&mut PrivacyFlags)) -> FacadeResult<()> {
        self.ensure_platform()?;
        let flags = {
            let mut settings = self.settings_lock();
            change(&mut settings.privacy);
            settings.privacy.clone()
        };
        self.sdk(move |sdk| sdk.set_privacy(&flags)).await
    }

    pub async fn set_is_user_consent(&self, consent: bool) -> FacadeResult<()> {
        self.update_privacy(|p| p.is_user_consent = Some(consent)).await
    }

    pub async fn set_is_age_restricted_user(&self, restricted: bool) -> FacadeResult<()> {
        self.update_privacy(|p| p.is_age_restricted_user = Some(restricted))
            .await
    }

    pub async fn set_is_do_not_sell(&self, do_not_sell: bool) -> FacadeResult<()> {
        self.update_privacy(|p| p.is_do_not_sell = Some(do_not_sell))
            .await
    }

    pub async fn set_ccpa_privacy_string(&self, value: impl Into<String>) -> FacadeResult<()> {
        let value = value.into();
        self.update_privacy(|p| p.ccpa_privacy_string = Some(value))
            .await
    }

    pub async fn set_gpp_string(&self, value: impl Into<String>) -> FacadeResult<()> {
        let value = value.into();
        self.update_privacy(|p| p.gpp_string = Some(value)).await
    }

    pub async fn set_gpp_sid(&self, section_ids: Vec<u32>) -> FacadeResult<()> {
        self.update_privacy(|p| p.gpp_section_ids = section_ids)
            .await
    }

    pub fn privacy(&self) -> PrivacyFlags {
        self.settings_lock().privacy.clone()
    }

    pub fn ccpa_privacy_string(&self) -> Option<String> {
        self.settings_lock().privacy.ccpa_privacy_string.clone()
    }

    pub fn gpp_string(&self) -> Option<String> {
        self.settings_lock().privacy.gpp_string.clone()
    }

    pub fn gpp_sid(&self) -> Vec<u32> {
        self.settings_lock().privacy.gpp_section_ids.clone()
    }

    // -- Targeting ----------------------------------------------------------

    pub async fn set_hashed_user_id(&self, hashed_user_id: impl Into<String>) -> FacadeResult<()> {
        let hashed = hashed_user_id.into();
        self.ensure_platform()?;
        self.settings_lock().hashed_user_id = Some(hashed.clone());
        self.sdk(move |sdk| sdk.set_hashed_user_id(&hashed)).await
    }

    pub async fn set_user_key_value(&self, key: &str, value: &str) -> FacadeResult<()> {
        let (key, value) = (key.to_owned(), value.to_owned());
        self.sdk(move |sdk| sdk.set_user_key_value(&key, &value))
            .await
    }

    pub async fn set_app_key_value(&self, key: &str, value: &str) -> FacadeResult<()> {
        let (key, value) = (key.to_owned(), value.to_owned());
        self.sdk(move |sdk| sdk.set_app_key_value(&key, &value))
            .await
    }

    pub async fn set_bidder_key_value(
        &self,
        bidder: &str,
        key: &str,
        value: &str,
    ) -> FacadeResult<()> {
        let (bidder, key, value) = (bidder.to_owned(), key.to_owned(), value.to_owned());
        self.sdk(move |sdk| sdk.set_bidder_key_value(&bidder, &key, &value))
            .await
    }

    pub async fn clear_all_key_values(&self) -> FacadeResult<()> {
        self.sdk(|sdk| sdk.clear_all_key_values()).await
    }

    /// Clear every key-value and forget the hashed user id.
    pub async fn clear_all_targeting(&self) -> FacadeResult<()> {
        self.ensure_platform()?;
        self.settings_lock().hashed_user_id = None;
        self.sdk(|sdk| {
            sdk.clear_all_key_values()?;
            sdk.set_hashed_user_id("")
        })
        .await
    }

    // -- Ads (generic) ------------------------------------------------------

    /// Normalize `request` and create an ad of the `format` family.
    #[instrument(skip(self, request))]
    pub async fn create(
        &self,
        format: AdFormat,
        request: impl Into<AdRequest>,
    ) -> FacadeResult<AdCreated> {
        self.ensure_platform()?;
        let NormalizedRequest {
            id,
            placement,
            format,
            size,
        } = request.into().normalize(format)?;

        let (op_id, op_placement) = (id.clone(), placement.clone());
        self.run(move |c| match size {
            Some(size) => c.create_view(op_id, &op_placement, size),
            None => c.create(op_id, &op_placement, format),
        })
        .await?;

        Ok(AdCreated {
            success: true,
            ad_id: id,
            placement,
        })
    }

    pub async fn load(&self, format: AdFormat, id: impl Into<AdId>) -> FacadeResult<OpResult> {
        let id = id.into();
        let op_id = id.clone();
        self.run(move |c| c.load_as(&op_id, format)).await?;
        Ok(OpResult::ok(&id))
    }

    pub async fn show(&self, format: AdFormat, id: impl Into<AdId>) -> FacadeResult<OpResult> {
        let id = id.into();
        let op_id = id.clone();
        self.run(move |c| c.show_as(&op_id, format)).await?;
        Ok(OpResult::ok(&id))
    }

    /// `false` for unknown ids, mismatched formats, or without a platform.
    pub fn is_ready(&self, format: AdFormat, id: impl Into<AdId>) -> bool {
        self.platform.is_available() && self.controller.is_ready_as(&id.into(), format)
    }

    pub async fn destroy_ad(&self, id: impl Into<AdId>) -> FacadeResult<OpResult> {
        let id = id.into();
        let op_id = id.clone();
        self.run(move |c| c.destroy(&op_id)).await?;
        Ok(OpResult::ok(&id))
    }

    /// Snapshot of one live ad, for presentation layers.
    pub fn ad(&self, id: impl Into<AdId>) -> Option<AdSnapshot> {
        self.controller.instance(&id.into())
    }

    // -- Banner / MREC ------------------------------------------------------

    pub async fn create_banner(&self, request: impl Into<AdRequest>) -> FacadeResult<AdCreated> {
        self.create(AdFormat::Banner, request).await
    }

    pub async fn create_mrec(&self, request: impl Into<AdRequest>) -> FacadeResult<AdCreated> {
        self.create(AdFormat::Mrec, request).await
    }

    pub async fn load_banner(&self, id: impl Into<AdId>) -> FacadeResult<OpResult> {
        self.load(AdFormat::Banner, id).await
    }

    pub async fn show_banner(&self, id: impl Into<AdId>) -> FacadeResult<OpResult> {
        self.show(AdFormat::Banner, id).await
    }

    pub async fn hide_banner(&self, id: impl Into<AdId>) -> FacadeResult<OpResult> {
        let id = id.into();
        let op_id = id.clone();
        self.run(move |c| c.hide(&op_id)).await?;
        Ok(OpResult::ok(&id))
    }

    pub async fn start_auto_refresh(&self, id: impl Into<AdId>) -> FacadeResult<OpResult> {
        let id = id.into();
        let op_id = id.clone();
        self.run(move |c| c.start_auto_refresh(&op_id)).await?;
        Ok(OpResult::ok(&id))
    }

    pub async fn stop_auto_refresh(&self, id: impl Into<AdId>) -> FacadeResult<OpResult> {
        let id = id.into();
        let op_id = id.clone();
        self.run(move |c| c.stop_auto_refresh(&op_id)).await?;
        Ok(OpResult::ok(&id))
    }

    pub fn is_banner_ready(&self, id: impl Into<AdId>) -> bool {
        self.is_ready(AdFormat::Banner, id)
    }

    // -- Interstitial -------------------------------------------------------

    pub async fn create_interstitial(
        &self,
        request: impl Into<AdRequest>,
    ) -> FacadeResult<AdCreated> {
        self.create(AdFormat::Interstitial, request).await
    }

    pub async fn load_interstitial(&self, id: impl Into<AdId>) -> FacadeResult<OpResult> {
        self.load(AdFormat::Interstitial, id).await
    }

    pub async fn show_interstitial(&self, id: impl Into<AdId>) -> FacadeResult<OpResult> {
        self.show(AdFormat::Interstitial, id).await
    }

    pub fn is_interstitial_ready(&self, id: impl Into<AdId>) -> bool {
        self.is_ready(AdFormat::Interstitial, id)
    }

    // -- Rewarded -----------------------------------------------------------

    pub async fn create_rewarded(&self, request: impl Into<AdRequest>) -> FacadeResult<AdCreated> {
        self.create(AdFormat::Rewarded, request).await
    }

    pub async fn load_rewarded(&self, id: impl Into<AdId>) -> FacadeResult<OpResult> {
        self.load(AdFormat::Rewarded, id).await
    }

    pub async fn show_rewarded(&self, id: impl Into<AdId>) -> FacadeResult<OpResult> {
        self.show(AdFormat::Rewarded, id).await
    }

    pub fn is_rewarded_ready(&self, id: impl Into<AdId>) -> bool {
        self.is_ready(AdFormat::Rewarded, id)
    }

    // -- Events -------------------------------------------------------------

    pub fn subscribe<F>(&self, kind: EventKind, handler: F) -> SubscriptionId
    where
        F: Fn(&AdEvent) + Send + Sync + 'static,
    {
        self.controller.bus().subscribe(kind, handler)
    }

    /// Subscribe by scripting event name, e.g. `onInterstitialLoaded`.
    pub fn add_event_listener<F>(
        &self,
        event_name: &str,
        handler: F,
    ) -> FacadeResult<SubscriptionId>
    where
        F: Fn(&AdEvent) + Send + Sync + 'static,
    {
        let kind = EventKind::from_wire_name(event_name).ok_or_else(|| {
            BridgeFailure::from(BridgeError::InvalidConfig(format!(
                "unknown event '{event_name}'"
            )))
        })?;
        Ok(self.subscribe(kind, handler))
    }

    /// Subscribe to `kind`, but only for events about `ad_id`.
    pub fn subscribe_ad<F>(
        &self,
        kind: EventKind,
        ad_id: impl Into<AdId>,
        handler: F,
    ) -> SubscriptionId
    where
        F: Fn(&AdEvent) + Send + Sync + 'static,
    {
        let ad_id = ad_id.into();
        self.subscribe(kind, move |event| {
            if event.ad_id == ad_id {
                handler(event);
            }
        })
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.controller.bus().unsubscribe(id)
    }

    pub fn unsubscribe_all(&self, kind: Option<EventKind>) -> usize {
        self.controller.bus().unsubscribe_all(kind)
    }

    // -- Teardown -----------------------------------------------------------

    /// Destroy every live ad, then drop every subscription.  Called when the
    /// owning scripting context goes away.
    #[instrument(skip(self))]
    pub fn shutdown(&self) -> usize {
        let destroyed = self.controller.teardown();
        let dropped = self.controller.bus().unsubscribe_all(None);
        info!(destroyed, dropped, "ad bridge shut down");
        destroyed
    }
}

fn join<T>(
    joined: std::result::Result<Result<T>, tokio::task::JoinError>,
) -> FacadeResult<T> {
    match joined {
        Ok(outcome) => outcome.map_err(BridgeFailure::from),
        Err(err) => {
            error!(error = %err, "bridge task aborted");
            Err(BridgeFailure::new(
                "NATIVE_OPERATION_FAILED",
                format!("bridge task aborted: {err}"),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use adbridge_core::events::AdEventType;
    use adbridge_core::types::{AdState, NativeError};
    use adbridge_native::mock::{MockBridge, MockCallback};
    use adbridge_native::stub::StubBridge;
    use std::time::{Duration, Instant};

    fn mock_bridge(engine: &MockBridge) -> AdBridge {
        AdBridge::new(Arc::new(engine.clone()))
    }

    fn recorder(bridge: &AdBridge) -> Arc<Mutex<Vec<AdEvent>>> {
        let seen = Arc::new(Mutex::new(Vec::new()));
        for kind in EventKind::all() {
            let sink = Arc::clone(&seen);
            bridge.subscribe(kind, move |event| sink.lock().unwrap().push(event.clone()));
        }
        seen
    }

    #[tokio::test]
    async fn native_initialize_does_not_block_the_runtime() {
        let engine = MockBridge::new();
        let (release_tx, release_rx) = std::sync::mpsc::channel::<()>();
        engine.on_next_initialize(move || {
            // Completes only once another task on this runtime has run.
            let _ = release_rx.recv_timeout(Duration::from_secs(5));
        });
        let bridge = mock_bridge(&engine);
        let releaser = tokio::spawn(async move {
            let _ = release_tx.send(());
        });

        let started = Instant::now();
        let init = bridge.initialize("app-key").await.expect("initialize");
        releaser.await.expect("releaser");
        assert!(init.success);
        assert!(started.elapsed() < Duration::from_secs(5));
        assert!(bridge.is_initialized());
    }

    #[tokio::test]
    async fn stub_platform_degrades_everywhere() {
        let bridge = AdBridge::new(Arc::new(StubBridge));
        assert!(!bridge.is_platform_available());

        let init = bridge.initialize("key").await.expect("resolves");
        assert_eq!(init, InitResult::unsupported());
        assert!(!bridge.is_initialized());
        assert_eq!(bridge.sdk_version(), "Unknown");

        let err = bridge.create_banner("home").await.unwrap_err();
        assert_eq!(err.code, "PLATFORM_UNSUPPORTED");
        let err = bridge.load_interstitial("i1").await.unwrap_err();
        assert_eq!(err.code, "PLATFORM_UNSUPPORTED");
        let err = bridge.set_is_user_consent(true).await.unwrap_err();
        assert_eq!(err.code, "PLATFORM_UNSUPPORTED");
        assert!(!bridge.is_rewarded_ready("r1"));
        assert_eq!(bridge.shutdown(), 0);
    }

    #[tokio::test]
    async fn initialize_applies_settings_then_resolves() {
        let engine = MockBridge::new();
        let bridge = mock_bridge(&engine);
        assert_eq!(bridge.set_environment("DEV"), Environment::Development);
        bridge.set_logging_enabled(true).await.expect("logging");

        let result = bridge.initialize("app-key").await.expect("init");
        assert!(result.success);
        assert!(bridge.is_initialized());

        let calls = engine.sdk_calls();
        assert!(calls.contains(&"initialize(app-key, Development)".to_owned()));
        let init_at = calls.iter().position(|c| c.starts_with("initialize")).unwrap();
        let level_at = calls
            .iter()
            .position(|c| c.starts_with("set_min_log_level"))
            .unwrap();
        assert!(level_at < init_at);
    }

    #[tokio::test]
    async fn initialize_accepts_config_object() {
        let engine = MockBridge::new();
        let bridge = mock_bridge(&engine);
        let config = SdkConfig {
            app_key: "cfg-key".into(),
            environment: Environment::Staging,
            ..Default::default()
        };
        bridge.initialize(config).await.expect("init");
        assert!(
            engine
                .sdk_calls()
                .contains(&"initialize(cfg-key, Staging)".to_owned())
        );
    }

    #[tokio::test]
    async fn initialize_failure_rejects_with_native_code() {
        let engine = MockBridge::new();
        engine.fail_initialization(NativeError::new("INVALID_APP_KEY", "bad key"));
        let bridge = mock_bridge(&engine);

        let err = bridge.initialize("bad").await.unwrap_err();
        assert_eq!(err.code, "NATIVE_OPERATION_FAILED");
        assert_eq!(err.native_code.as_deref(), Some("INVALID_APP_KEY"));
        assert!(!bridge.is_initialized());
    }

    #[tokio::test]
    async fn initialize_rejects_empty_key() {
        let bridge = mock_bridge(&MockBridge::new());
        let err = bridge.initialize("").await.unwrap_err();
        assert_eq!(err.code, "INVALID_CONFIG");
    }

    #[tokio::test]
    async fn unknown_settings_fall_back_to_defaults() {
        let bridge = mock_bridge(&MockBridge::new());
        assert_eq!(bridge.set_environment("moon"), Environment::Production);
        let level = bridge.set_min_log_level("chatty").await.expect("level");
        assert_eq!(level, LogLevel::Debug);
        let level = bridge.set_min_log_level("warn").await.expect("level");
        assert_eq!(level, LogLevel::Warn);
    }

    #[tokio::test]
    async fn privacy_setters_accumulate() {
        let engine = MockBridge::new();
        let bridge = mock_bridge(&engine);
        bridge.set_is_user_consent(true).await.expect("consent");
        bridge.set_is_do_not_sell(true).await.expect("dns");
        bridge.set_gpp_string("DBABMA~CPXxRfAPXxRfAAfKABENB").await.expect("gpp");
        bridge.set_gpp_sid(vec![2, 7]).await.expect("sid");
        bridge.set_ccpa_privacy_string("1YNN").await.expect("ccpa");

        let native = engine.privacy();
        assert_eq!(native.is_user_consent, Some(true));
        assert_eq!(native.is_do_not_sell, Some(true));
        assert_eq!(native.gpp_section_ids, vec![2, 7]);
        assert_eq!(bridge.gpp_sid(), vec![2, 7]);
        assert_eq!(bridge.ccpa_privacy_string().as_deref(), Some("1YNN"));
        assert_eq!(bridge.gpp_string(), native.gpp_string);
    }

    #[tokio::test]
    async fn targeting_passthroughs_reach_engine() {
        let engine = MockBridge::new();
        let bridge = mock_bridge(&engine);
        bridge.set_hashed_user_id("abc123").await.expect("uid");
        bridge.set_user_key_value("age", "30").await.expect("user kv");
        bridge.set_app_key_value("build", "beta").await.expect("app kv");
        bridge
            .set_bidder_key_value("meta", "tier", "gold")
            .await
            .expect("bidder kv");
        bridge.clear_all_targeting().await.expect("clear");

        let calls = engine.sdk_calls();
        assert!(calls.contains(&"set_hashed_user_id(abc123)".to_owned()));
        assert!(calls.contains(&"set_user_key_value(age, 30)".to_owned()));
        assert!(calls.contains(&"clear_all_key_values".to_owned()));
        assert_eq!(calls.last().map(String::as_str), Some("set_hashed_user_id()"));
        assert!(bridge.settings().hashed_user_id.is_none());
    }

    #[tokio::test]
    async fn banner_flow_through_facade() {
        let engine = MockBridge::autoplay();
        let bridge = mock_bridge(&engine);
        let events = recorder(&bridge);

        let created = bridge
            .create_banner(crate::request::AdConfig {
                placement: "home_banner".into(),
                ad_id: Some("b1".into()),
                banner_size: None,
            })
            .await
            .expect("create");
        assert_eq!(created.ad_id.as_str(), "b1");
        assert!(created.success);

        bridge.load_banner("b1").await.expect("load");
        engine.deliver_pending();
        assert!(bridge.is_banner_ready("b1"));

        bridge.show_banner("b1").await.expect("show");
        bridge.hide_banner("b1").await.expect("hide");
        bridge.destroy_ad("b1").await.expect("destroy");

        let names: Vec<String> = events
            .lock()
            .unwrap()
            .iter()
            .map(|e| e.kind.wire_name())
            .collect();
        assert_eq!(names, vec!["onBannerLoaded", "onBannerHidden"]);
        assert_eq!(engine.release_count(), 1);
    }

    #[tokio::test]
    async fn bare_placement_generates_id() {
        let bridge = mock_bridge(&MockBridge::new());
        let created = bridge.create_interstitial("inter_main").await.expect("create");
        assert!(!created.ad_id.as_str().is_empty());
        assert_eq!(created.placement, "inter_main");
        assert_eq!(
            bridge.ad(created.ad_id.clone()).map(|a| a.state),
            Some(AdState::Created)
        );
    }

    #[tokio::test]
    async fn failures_map_to_codes() {
        let bridge = mock_bridge(&MockBridge::new());
        let err = bridge.show_interstitial("ghost").await.unwrap_err();
        assert_eq!(err.code, "AD_NOT_FOUND");
        assert!(!bridge.is_interstitial_ready("ghost"));

        bridge
            .create_rewarded(crate::request::AdConfig {
                placement: "rw".into(),
                ad_id: Some("r1".into()),
                banner_size: None,
            })
            .await
            .expect("create");
        let err = bridge.load_interstitial("r1").await.unwrap_err();
        assert_eq!(err.code, "INVALID_AD_TYPE");
        let err = bridge.show_rewarded("r1").await.unwrap_err();
        assert_eq!(err.code, "AD_NOT_READY");
        let err = bridge.create_banner("").await.unwrap_err();
        assert_eq!(err.code, "INVALID_CONFIG");
    }

    #[tokio::test]
    async fn rewarded_listener_by_name_filters_by_ad() {
        let engine = MockBridge::autoplay();
        let bridge = mock_bridge(&engine);
        let rewards = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&rewards);
        bridge
            .add_event_listener("onRewardEarned", move |event| {
                sink.lock().unwrap().push(event.ad_id.to_string());
            })
            .expect("listener");
        let only_r2 = Arc::new(Mutex::new(0));
        let counter = Arc::clone(&only_r2);
        bridge.subscribe_ad(
            EventKind::new(AdFormat::Rewarded, AdEventType::Loaded),
            "r2",
            move |_| *counter.lock().unwrap() += 1,
        );

        for id in ["r1", "r2"] {
            bridge
                .create_rewarded(crate::request::AdConfig {
                    placement: format!("rw_{id}"),
                    ad_id: Some(id.into()),
                    banner_size: None,
                })
                .await
                .expect("create");
            bridge.load_rewarded(id).await.expect("load");
        }
        engine.deliver_pending();
        assert_eq!(*only_r2.lock().unwrap(), 1);

        bridge.show_rewarded("r1").await.expect("show");
        engine.deliver_pending();
        let ad = engine.find("rw_r1").expect("native ad");
        engine.deliver(ad, MockCallback::Rewarded(engine.ad_info(ad)));
        assert_eq!(*rewards.lock().unwrap(), vec!["r1".to_owned()]);

        assert!(bridge.add_event_listener("onNothing", |_| {}).is_err());
    }

    #[tokio::test]
    async fn shutdown_destroys_all_and_clears_subscriptions() {
        let engine = MockBridge::new();
        let bridge = mock_bridge(&engine);
        let _events = recorder(&bridge);
        bridge.create_banner("a").await.expect("a");
        bridge.create_interstitial("b").await.expect("b");
        bridge.create_rewarded("c").await.expect("c");

        assert_eq!(bridge.shutdown(), 3);
        assert_eq!(engine.release_count(), 3);
        assert_eq!(bridge.controller().live_count(), 0);
        assert_eq!(bridge.controller().bus().subscriber_count(None), 0);
    }
}
