// Copyright © 2024 PostFlow. All rights reserved.
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! # Content Generation
//!
//! Turns a topic into a [`GeneratedPost`] by asking a [`TextGenerator`]
//! for a JSON object and validating it on receipt.
//!
//! Validation is all-or-nothing: a reply that is not JSON, or lacks any
//! of `title`, `meta_description`, `excerpt`, `category` or `content`,
//! fails with a single `MalformedResponse` error. Only `keywords` may be
//! absent, in which case the configured fallback is used. The body itself
//! is not inspected.

/// OpenAI chat-completions client.
pub mod openai;

/// Prompt construction.
pub mod prompt;

use serde::Deserialize;

use crate::core::config::{Config, PathsConfig};
use crate::core::error::{PostFlowError, Result};
use crate::core::traits::TextGenerator;
use crate::ledger::Ledger;
use crate::pages::SitePageDirectory;

/// A post as written by the model, validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedPost {
    /// Page title.
    pub title: String,
    /// Meta description.
    pub meta_description: String,
    /// Comma-separated keywords.
    pub keywords: String,
    /// Teaser shown on the index card.
    pub excerpt: String,
    /// Category label.
    pub category: String,
    /// Body markup.
    pub content: String,
}

#[derive(Debug, Deserialize)]
struct RawPost {
    title: Option<String>,
    meta_description: Option<String>,
    keywords: Option<String>,
    excerpt: Option<String>,
    category: Option<String>,
    content: Option<String>,
}

impl GeneratedPost {
    /// Parses and validates a JSON reply.
    ///
    /// # Errors
    ///
    /// Returns `MalformedResponse` naming every missing required field.
    pub fn from_json(raw: &str, fallback_keywords: &str) -> Result<Self> {
        let parsed: RawPost = serde_json::from_str(raw).map_err(|e| {
            PostFlowError::malformed_response(
                "generated post is not a valid JSON object",
                Some(Box::new(e)),
            )
        })?;

        let mut missing = Vec::new();
        let mut require = |name: &'static str, value: Option<String>| {
            value.unwrap_or_else(|| {
                missing.push(name);
                String::new()
            })
        };
        let title = require("title", parsed.title);
        let meta_description = require("meta_description", parsed.meta_description);
        let excerpt = require("excerpt", parsed.excerpt);
        let category = require("category", parsed.category);
        let content = require("content", parsed.content);

        if !missing.is_empty() {
            return Err(PostFlowError::malformed_response(
                format!("generated post is missing {}", missing.join(", ")),
                None,
            ));
        }

        Ok(Self {
            title,
            meta_description,
            keywords: parsed
                .keywords
                .unwrap_or_else(|| fallback_keywords.to_string()),
            excerpt,
            category,
            content,
        })
    }
}

/// Writes posts through a [`TextGenerator`].
pub struct ContentGenerator<'a> {
    generator: &'a dyn TextGenerator,
    config: &'a Config,
    pages: &'a SitePageDirectory,
}

impl std::fmt::Debug for ContentGenerator<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentGenerator")
            .field("model", &self.config.model)
            .field("pages", &self.pages.len())
            .finish_non_exhaustive()
    }
}

impl<'a> ContentGenerator<'a> {
    /// Creates a content generator.
    pub fn new(
        generator: &'a dyn TextGenerator,
        config: &'a Config,
        pages: &'a SitePageDirectory,
    ) -> Self {
        Self {
            generator,
            config,
            pages,
        }
    }

    /// Writes a post on `topic`, offering the newest ledger entries as
    /// cross-link candidates.
    pub fn generate(&self, topic: &str, ledger: &Ledger) -> Result<GeneratedPost> {
        let paths: &PathsConfig = &self.config.paths;
        let request = prompt::post_request(
            self.config,
            self.pages,
            topic,
            ledger.recent(prompt::CROSS_LINK_LIMIT),
            |slug| format!("../{}", paths.post_url(slug)),
        );
        let raw = self.generator.complete(&request)?;
        GeneratedPost::from_json(&raw, &self.config.fallback_keywords())
    }
}
