// Copyright © 2024 PostFlow. All rights reserved.
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! # PostFlow CLI
//!
//! This is the main entry point for the PostFlow command-line interface.
//! It loads the configuration, initializes the logger and hands over to
//! the selected run mode.

use anyhow::Context;
use log::{error, warn};
use postflow::cli;
use postflow::core::config::Config;
use postflow::PostFlowError;

/// Loads settings and runs PostFlow.
///
/// # Errors
///
/// Fails on an unreadable or invalid configuration, a missing
/// `OPENAI_API_KEY`, or (with `--now`) a failed pipeline run.
fn run() -> anyhow::Result<()> {
    let matches = cli::build().get_matches();

    let config_path = Config::default_path();
    let config = Config::load(&config_path);
    cli::init_logger(config.as_ref().ok().and_then(|c| c.log_file.as_deref()));

    let config = config.with_context(|| {
        format!("Failed to load configuration from {}", config_path.display())
    })?;

    cli::execute(&matches, config).context("PostFlow run failed")
}

/// The main entry point for the PostFlow CLI.
fn main() {
    if let Err(err) = run() {
        let expected = err
            .downcast_ref::<PostFlowError>()
            .is_some_and(PostFlowError::is_expected);
        if expected {
            warn!("{err:#}");
        } else {
            error!("{err:#}");
        }
        std::process::exit(1);
    }
}
