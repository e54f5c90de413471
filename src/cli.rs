// Copyright © 2024 PostFlow. All rights reserved.
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Command-line interface for PostFlow
//!
//! This module provides the argument parser, logger set-up and the two run
//! modes: a single immediate run (`--now`) and the daily scheduler.
//!
//! # Examples
//!
//! ```
//! use postflow::cli;
//!
//! let matches = cli::build().get_matches_from(vec!["postflow", "--now"]);
//! assert!(matches.get_flag("now"));
//! ```

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::time::Duration;

use chrono::Local;
use clap::{Arg, ArgAction, ArgMatches, Command};
use env_logger::{Builder, Env, Target};
use log::{debug, error, info, warn};

use crate::core::config::{Config, CONFIG_PATH_ENV};
use crate::core::error::Result;
use crate::scheduler::Scheduler;
use crate::{PostFlow, RunOutcome};

/// The current version of PostFlow, as defined in `Cargo.toml`.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Log filter used when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "info";

const LOG_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Builds and configures the PostFlow command-line interface.
pub fn build() -> Command {
    debug!("Building CLI command structure");

    Command::new("postflow")
        .author("PostFlow Contributors")
        .about("Publishes AI-written blog posts to a static site on a schedule.")
        .long_about(format!(
            "Publishes AI-written blog posts to a static site on a schedule.\n\n\
             Settings are read from the file named by {CONFIG_PATH_ENV} \
             (default postflow.toml). OPENAI_API_KEY must be set."
        ))
        .version(VERSION)
        .arg(
            Arg::new("now")
                .long("now")
                .help("Publish one post immediately and exit")
                .action(ArgAction::SetTrue),
        )
}

/// Initialises the global logger.
///
/// Lines go to stderr and, when `log_file` is given, are appended to that
/// file too. `RUST_LOG` overrides the default `info` filter.
pub fn init_logger(log_file: Option<&Path>) {
    let mut builder =
        Builder::from_env(Env::default().default_filter_or(DEFAULT_LOG_FILTER));
    let _ = builder.format(|buf, record| {
        writeln!(
            buf,
            "{} [{}] {}",
            Local::now().format(LOG_TIMESTAMP_FORMAT),
            record.level(),
            record.args()
        )
    });

    let mut file_error = None;
    if let Some(path) = log_file {
        match open_log_file(path) {
            Ok(file) => {
                let _ = builder.target(Target::Pipe(Box::new(TeeWriter { file })));
            }
            Err(e) => file_error = Some(e),
        }
    }

    if builder.try_init().is_err() {
        return;
    }
    if let (Some(path), Some(e)) = (log_file, file_error) {
        warn!("Cannot open log file {}: {}; logging to stderr only", path.display(), e);
    }
}

fn open_log_file(path: &Path) -> io::Result<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}

/// Copies every write to stderr and a log file.
#[derive(Debug)]
struct TeeWriter {
    file: File,
}

impl Write for TeeWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        io::stderr().write_all(buf)?;
        self.file.write_all(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stderr().flush()?;
        self.file.flush()
    }
}

/// Runs PostFlow in the mode selected by `matches`.
///
/// # Errors
///
/// Returns `MissingCredential` when `OPENAI_API_KEY` is unset, in either
/// mode. With `--now`, also returns any pipeline failure.
pub fn execute(matches: &ArgMatches, config: Config) -> Result<()> {
    let flow = PostFlow::from_config(config)?;

    if matches.get_flag("now") {
        info!("Running a single pipeline pass");
        run_once(&flow)
    } else {
        run_scheduled(&flow)
    }
}

fn run_once(flow: &PostFlow) -> Result<()> {
    match flow.run()? {
        RunOutcome::Published { post, .. } => {
            info!("Blog post published: {}", post.slug);
        }
        RunOutcome::QuotaReached { .. } => {}
    }
    Ok(())
}

fn run_scheduled(flow: &PostFlow) -> Result<()> {
    let config = flow.config();
    let times = config.schedule()?;
    let mut scheduler = Scheduler::new(
        &times,
        Duration::from_secs(config.poll_interval_secs),
        Local::now().naive_local(),
    );

    info!(
        "PostFlow started. Scheduled to run daily at: {}",
        config.schedule_times.join(", ")
    );
    info!("Posts per day limit: {}", config.posts_per_day);

    scheduler.run_forever(|| {
        info!("Starting scheduled blog post generation");
        match flow.run() {
            Ok(RunOutcome::Published { post, .. }) => {
                info!("Blog post published: {}", post.slug);
            }
            Ok(RunOutcome::QuotaReached { .. }) => {}
            Err(e) if e.is_expected() => warn!("Scheduled run skipped: {e}"),
            Err(e) => error!("Scheduled run failed: {e}"),
        }
    })
}
