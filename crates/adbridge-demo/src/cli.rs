// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Command-line arguments for the demo binary.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Drive AdBridge ad flows against the in-process mock engine",
    long_about = None
)]
pub struct Cli {
    /// SDK config file (JSON).  ADBRIDGE_* environment variables override it.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Which ad flow to run
    #[arg(short, long, value_enum, default_value_t = Scenario::All)]
    pub scenario: Scenario,

    /// Print every published event as a JSON line
    #[arg(long)]
    pub json: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Scenario {
    All,
    Banner,
    Mrec,
    Interstitial,
    Rewarded,
}

impl Scenario {
    pub fn includes(&self, other: Scenario) -> bool {
        *self == Scenario::All || *self == other
    }
}
