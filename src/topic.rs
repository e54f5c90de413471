// Copyright © 2024 PostFlow. All rights reserved.
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! # Topic Selection
//!
//! Picks the topic of the next post. Configured topics are used first, in
//! random order, skipping any whose text or slug already appears in the
//! ledger. Once they run out, the text-generation service is asked for a
//! new topic, with the most recent topics listed as exclusions.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::content::slugify;
use crate::core::config::Config;
use crate::core::error::{PostFlowError, Result};
use crate::core::traits::TextGenerator;
use crate::generation::prompt::{topic_request, TOPIC_HISTORY_LIMIT};
use crate::ledger::Ledger;

/// Where a selected topic came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopicSource {
    /// The configured topic list.
    Configured,
    /// Generated because the configured list is exhausted.
    Generated,
}

/// A topic chosen for the next post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedTopic {
    /// Topic text.
    pub text: String,
    /// Where it came from.
    pub source: TopicSource,
}

/// Chooses unused topics.
pub struct TopicSelector<'a> {
    config: &'a Config,
    generator: &'a dyn TextGenerator,
}

impl std::fmt::Debug for TopicSelector<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TopicSelector")
            .field("topics", &self.config.topics.len())
            .finish_non_exhaustive()
    }
}

impl<'a> TopicSelector<'a> {
    /// Creates a selector over the configured topics.
    pub fn new(config: &'a Config, generator: &'a dyn TextGenerator) -> Self {
        Self { config, generator }
    }

    /// Configured topics not yet used in `ledger`, in configuration order.
    ///
    /// A topic counts as used when its text or its slug form is in the
    /// ledger.
    pub fn candidates<'l>(&'l self, ledger: &Ledger) -> Vec<&'l str> {
        let used_topics = ledger.used_topics();
        let used_slugs = ledger.used_slugs();
        self.config
            .topics
            .iter()
            .map(|t| t.trim())
            .filter(|t| {
                !t.is_empty()
                    && !used_topics.contains(t)
                    && !used_slugs.contains(slugify(t).as_str())
            })
            .collect()
    }

    /// Returns a topic not previously used.
    ///
    /// # Errors
    ///
    /// Fails only when the configured list is exhausted and the fallback
    /// request fails or returns an empty topic.
    pub fn select<R: Rng + ?Sized>(
        &self,
        ledger: &Ledger,
        rng: &mut R,
    ) -> Result<SelectedTopic> {
        let candidates = self.candidates(ledger);
        log::debug!(
            "{} of {} configured topics unused",
            candidates.len(),
            self.config.topics.len()
        );

        if let Some(topic) = candidates.choose(rng) {
            return Ok(SelectedTopic {
                text: (*topic).to_string(),
                source: TopicSource::Configured,
            });
        }

        log::info!("Configured topics exhausted, generating a new topic");
        let history: Vec<&str> = ledger
            .recent(TOPIC_HISTORY_LIMIT)
            .iter()
            .map(|e| e.topic.as_str())
            .filter(|t| !t.is_empty())
            .collect();
        let reply = self
            .generator
            .complete(&topic_request(self.config, &history))?;
        let text = clean_topic(&reply);
        if text.is_empty() {
            return Err(PostFlowError::malformed_response(
                "topic reply is empty",
                None,
            ));
        }
        Ok(SelectedTopic {
            text,
            source: TopicSource::Generated,
        })
    }
}

/// Strips whitespace and surrounding quotes from a generated topic.
fn clean_topic(reply: &str) -> String {
    reply
        .trim()
        .trim_matches(|c: char| c == '"' || c == '\'' || c.is_whitespace())
        .to_string()
}
