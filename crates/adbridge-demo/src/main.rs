// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// AdBridge demo — installs the in-process mock engine as the platform
// bridge, initializes the SDK and runs scripted ad flows, printing every
// published event.

mod cli;
mod scenarios;

use std::process::ExitCode;
use std::sync::Arc;

use adbridge_core::config::SdkConfig;
use adbridge_core::error::Result;
use adbridge_core::events::EventKind;
use adbridge_facade::{AdBridge, FacadeResult};
use adbridge_native::mock::MockBridge;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use cli::{Cli, Scenario};
use scenarios::Demo;

const DEMO_APP_KEY: &str = "demo-app-key";

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load config: {e}");
            return ExitCode::FAILURE;
        }
    };

    let engine = MockBridge::autoplay();
    if !adbridge_native::install_platform_bridge(Arc::new(engine.clone())) {
        error!("platform bridge already installed");
        return ExitCode::FAILURE;
    }
    let bridge = AdBridge::from_installed();
    info!(platform = bridge.is_platform_available(), "AdBridge demo starting");

    match run(&cli, config, Demo { bridge: bridge.clone(), engine }).await {
        Ok(()) => {
            let released = bridge.shutdown();
            info!(released, "demo finished");
            ExitCode::SUCCESS
        }
        Err(failure) => {
            error!(code = %failure.code, native_code = ?failure.native_code, "{}", failure.message);
            bridge.shutdown();
            ExitCode::FAILURE
        }
    }
}

fn setup_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .init();
}

fn load_config(cli: &Cli) -> Result<SdkConfig> {
    let config = match &cli.config {
        Some(path) => SdkConfig::load(path)?,
        None => SdkConfig::default(),
    };
    let mut config = config.with_env_overrides()?;
    if config.app_key.trim().is_empty() {
        config.app_key = DEMO_APP_KEY.to_owned();
    }
    Ok(config)
}

async fn run(cli: &Cli, config: SdkConfig, demo: Demo) -> FacadeResult<()> {
    let json = cli.json;
    for kind in EventKind::all() {
        demo.bridge.subscribe(kind, move |event| {
            if json {
                match serde_json::to_string(event) {
                    Ok(line) => println!("{line}"),
                    Err(e) => error!("Failed to encode event: {e}"),
                }
            } else {
                println!("{:<28} {}", event.kind.wire_name(), event.ad_id);
            }
        });
    }

    let init = demo.bridge.initialize(config).await?;
    info!(version = %demo.bridge.sdk_version(), "{}", init.message);

    if cli.scenario.includes(Scenario::Banner) {
        demo.banner().await?;
    }
    if cli.scenario.includes(Scenario::Mrec) {
        demo.mrec().await?;
    }
    if cli.scenario.includes(Scenario::Interstitial) {
        demo.interstitial().await?;
    }
    if cli.scenario.includes(Scenario::Rewarded) {
        demo.rewarded().await?;
    }
    Ok(())
}
