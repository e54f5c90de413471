// Copyright © 2024 PostFlow. All rights reserved.
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! # Core Traits Module
//!
//! The two seams between the pipeline and the outside world:
//!
//! - [`TextGenerator`]: a text-generation service answering one prompt at a time
//! - [`PublishSync`]: a version-control capability that stages, commits and pushes
//!
//! Both are object safe and mocked in tests.

use std::fmt;
use std::path::PathBuf;

use crate::core::error::Result;

/// One prompt sent to a [`TextGenerator`].
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    /// Instructions that frame the model's role.
    pub system: String,
    /// The actual request.
    pub user: String,
    /// Sampling temperature.
    pub temperature: f32,
    /// Upper bound on generated tokens.
    pub max_tokens: u32,
    /// Ask the service for a JSON object instead of free text.
    pub json_response: bool,
}

impl CompletionRequest {
    /// Creates a free-text request.
    pub fn new(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            user: user.into(),
            temperature: 0.7,
            max_tokens: 1000,
            json_response: false,
        }
    }

    /// Sets the sampling temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Sets the token budget.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Requests a structured JSON object response.
    pub fn with_json_response(mut self, enable: bool) -> Self {
        self.json_response = enable;
        self
    }
}

/// A text-generation service.
#[cfg_attr(test, mockall::automock)]
pub trait TextGenerator {
    /// Sends `request` and returns the raw text of the first answer.
    ///
    /// # Errors
    ///
    /// Returns `GenerationError` when the service cannot be reached or
    /// rejects the request, and `MalformedResponse` when its reply carries
    /// no text.
    fn complete(&self, request: &CompletionRequest) -> Result<String>;
}

/// Result of a [`PublishSync::sync`] attempt.
///
/// None of these outcomes is an error: publication is complete once the
/// ledger is persisted, whatever happens here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Committed and pushed.
    Pushed,
    /// Committed locally; the push failed.
    CommittedLocally {
        /// Why the push failed.
        reason: String,
    },
    /// The working tree had nothing new to commit.
    NothingToCommit,
    /// Syncing is turned off in the configuration.
    Disabled,
    /// No commit was made.
    Skipped {
        /// Why the sync was skipped.
        reason: String,
    },
}

impl SyncOutcome {
    /// Returns `true` when the outcome deserves a warning.
    pub fn is_warning(&self) -> bool {
        matches!(
            self,
            SyncOutcome::CommittedLocally { .. } | SyncOutcome::Skipped { .. }
        )
    }
}

impl fmt::Display for SyncOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncOutcome::Pushed => write!(f, "changes pushed to remote"),
            SyncOutcome::CommittedLocally { reason } => {
                write!(f, "committed locally, push failed: {reason}")
            }
            SyncOutcome::NothingToCommit => write!(f, "nothing to commit"),
            SyncOutcome::Disabled => write!(f, "version-control sync disabled"),
            SyncOutcome::Skipped { reason } => {
                write!(f, "sync skipped: {reason}")
            }
        }
    }
}

/// Publishes changed files to version control.
#[cfg_attr(test, mockall::automock)]
pub trait PublishSync {
    /// Stages `files`, commits them with `message` and pushes.
    fn sync(&self, files: &[PathBuf], message: &str) -> SyncOutcome;
}

/// A [`PublishSync`] that does nothing, used when syncing is disabled.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSync;

impl PublishSync for NoSync {
    fn sync(&self, _files: &[PathBuf], _message: &str) -> SyncOutcome {
        SyncOutcome::Disabled
    }
}
