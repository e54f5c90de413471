// Copyright © 2024 PostFlow. All rights reserved.
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Git-backed [`PublishSync`].
//!
//! Shells out to the `git` executable in the site root. Every failure is
//! reported as a [`SyncOutcome`]; none of them fails the run.

use std::io;
use std::path::PathBuf;
use std::process::{Command, Output};

use crate::core::traits::{PublishSync, SyncOutcome};

/// Commits and pushes published files with the system `git`.
#[derive(Debug, Clone)]
pub struct GitSync {
    repo_root: PathBuf,
    program: String,
}

impl GitSync {
    /// Syncs the working tree at `repo_root`.
    pub fn new(repo_root: impl Into<PathBuf>) -> Self {
        Self {
            repo_root: repo_root.into(),
            program: "git".to_string(),
        }
    }

    /// Uses `program` instead of `git` from `PATH`.
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    fn git(&self, args: &[&str]) -> io::Result<Output> {
        Command::new(&self.program)
            .args(args)
            .current_dir(&self.repo_root)
            .output()
    }
}

fn stderr_of(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).trim().to_string()
}

impl PublishSync for GitSync {
    fn sync(&self, files: &[PathBuf], message: &str) -> SyncOutcome {
        match self.git(&["status", "--porcelain"]) {
            Ok(status) if status.status.success() => {}
            Ok(_) => {
                return SyncOutcome::Skipped {
                    reason: format!(
                        "{} is not a git repository",
                        self.repo_root.display()
                    ),
                }
            }
            Err(e) => {
                return SyncOutcome::Skipped {
                    reason: format!("git not available: {e}"),
                }
            }
        }

        for file in files {
            let path = file.to_string_lossy();
            match self.git(&["add", "--", path.as_ref()]) {
                Ok(out) if out.status.success() => {}
                Ok(out) => log::warn!("git add {} failed: {}", path, stderr_of(&out)),
                Err(e) => log::warn!("git add {} failed: {}", path, e),
            }
        }

        let commit = match self.git(&["commit", "-m", message]) {
            Ok(out) => out,
            Err(e) => {
                return SyncOutcome::Skipped {
                    reason: format!("git commit could not run: {e}"),
                }
            }
        };
        if !commit.status.success() {
            let stdout = String::from_utf8_lossy(&commit.stdout);
            if stdout.contains("nothing to commit")
                || stdout.contains("nothing added to commit")
            {
                return SyncOutcome::NothingToCommit;
            }
            return SyncOutcome::Skipped {
                reason: format!("git commit failed: {}", stderr_of(&commit)),
            };
        }
        log::info!("Git commit created: {message}");

        match self.git(&["push"]) {
            Ok(out) if out.status.success() => SyncOutcome::Pushed,
            Ok(out) => SyncOutcome::CommittedLocally {
                reason: stderr_of(&out),
            },
            Err(e) => SyncOutcome::CommittedLocally {
                reason: e.to_string(),
            },
        }
    }
}
