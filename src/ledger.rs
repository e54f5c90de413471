// Copyright © 2024 PostFlow. All rights reserved.
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! # Post Ledger
//!
//! The record of every published post, kept newest first in one JSON
//! array. It is read in full at the start of a run and written back in
//! full after a publish; entries never change once written.
//!
//! The on-disk field for the publication date is `date`.

use std::collections::HashSet;
use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::core::error::{PostFlowError, Result};
use crate::process::{read_content, write_atomic};

/// One published post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Unique identifier; also the post file name.
    pub slug: String,
    /// Post title.
    pub title: String,
    /// Topic the post was written about.
    #[serde(default)]
    pub topic: String,
    /// Category chosen by the model.
    #[serde(default)]
    pub category: String,
    /// Day of publication.
    #[serde(rename = "date")]
    pub publication_date: NaiveDate,
    /// Meta description of the page.
    #[serde(default)]
    pub meta_description: String,
}

/// Ordered list of [`LedgerEntry`]s, most recent first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ledger {
    entries: Vec<LedgerEntry>,
}

impl Ledger {
    /// Creates a ledger from entries already ordered newest first.
    pub fn new(entries: Vec<LedgerEntry>) -> Self {
        Self { entries }
    }

    /// Loads the ledger at `path`. A missing file is an empty ledger.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            log::debug!("No ledger at {}, starting empty", path.display());
            return Ok(Self::default());
        }

        let raw = read_content(path)?;
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        let entries = serde_json::from_str(&raw).map_err(|e| {
            PostFlowError::ledger_error(
                path.to_path_buf(),
                "failed to parse ledger",
                Some(Box::new(e)),
            )
        })?;
        Ok(Self { entries })
    }

    /// Writes the whole ledger to `path`, pretty-printed.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let mut json = serde_json::to_string_pretty(&self.entries).map_err(|e| {
            PostFlowError::ledger_error(
                path.to_path_buf(),
                "failed to serialise ledger",
                Some(Box::new(e)),
            )
        })?;
        json.push('\n');
        write_atomic(path, &json)
    }

    /// All entries, newest first.
    pub fn entries(&self) -> &[LedgerEntry] {
        &self.entries
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing has been published yet.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The `n` most recent entries.
    pub fn recent(&self, n: usize) -> &[LedgerEntry] {
        &self.entries[..n.min(self.entries.len())]
    }

    /// Returns `true` if a post with `slug` exists.
    pub fn contains_slug(&self, slug: &str) -> bool {
        self.entries.iter().any(|e| e.slug == slug)
    }

    /// Topics already written about.
    pub fn used_topics(&self) -> HashSet<&str> {
        self.entries.iter().map(|e| e.topic.as_str()).collect()
    }

    /// Slugs already taken.
    pub fn used_slugs(&self) -> HashSet<&str> {
        self.entries.iter().map(|e| e.slug.as_str()).collect()
    }

    /// Number of posts published on `date`.
    pub fn count_on(&self, date: NaiveDate) -> usize {
        self.entries
            .iter()
            .filter(|e| e.publication_date == date)
            .count()
    }

    /// Adds `entry` as the newest post.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateSlug` and leaves the ledger unchanged if the slug
    /// is already taken.
    pub fn prepend(&mut self, entry: LedgerEntry) -> Result<()> {
        if self.contains_slug(&entry.slug) {
            return Err(PostFlowError::DuplicateSlug(entry.slug));
        }
        self.entries.insert(0, entry);
        Ok(())
    }
}
