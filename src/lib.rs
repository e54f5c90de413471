// Copyright © 2024 PostFlow. All rights reserved.
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! # PostFlow Library
//!
//! PostFlow keeps a static site's blog fresh without anyone writing it.
//! Each run picks an unused topic, asks a text-generation service for a
//! complete post, renders it into the site's page template, adds a card
//! to the blog index, records it in a JSON ledger and optionally commits
//! the result with git.
//!
//! The pipeline is sequential and single-threaded. The two external
//! services sit behind the [`TextGenerator`] and [`PublishSync`] traits so
//! the whole run can be exercised with mocks.

#![doc = include_str!("../README.md")]
#![crate_name = "postflow"]
#![crate_type = "lib"]

use std::fmt;

use chrono::{Local, NaiveDate};
use rand::Rng;

use crate::core::config::Config;
use crate::core::error::Result;
use crate::core::traits::{NoSync, PublishSync, SyncOutcome, TextGenerator};
use crate::generation::openai::OpenAiClient;
use crate::generation::ContentGenerator;
use crate::ledger::Ledger;
use crate::publisher::{PublishedPost, Publisher};
use crate::sync::GitSync;
use crate::template::PageTemplate;
use crate::topic::TopicSelector;

/// Configuration, errors and the service traits.
pub mod core;

/// Provides command-line interface utilities.
pub mod cli;

/// Text helpers: slugs, reading time, link counting.
pub mod content;

/// Prompting and parsing of generated posts.
pub mod generation;

/// The published-post ledger.
pub mod ledger;

/// The site page directory offered as internal link targets.
pub mod pages;

/// File read and write helpers.
pub mod process;

/// Writes post pages, index cards and ledger entries.
pub mod publisher;

/// Time-of-day run slots.
pub mod scheduler;

/// Git-backed publish sync.
pub mod sync;

/// Page template rendering.
pub mod template;

/// Topic selection.
pub mod topic;

pub use crate::core::error::PostFlowError;

/// What a pipeline run did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// A new post was published.
    Published {
        /// The published post.
        post: PublishedPost,
        /// Result of the version-control sync.
        sync: SyncOutcome,
    },
    /// Today's quota was already met; nothing was done.
    QuotaReached {
        /// Posts already published today.
        count: usize,
        /// The daily quota.
        quota: u32,
    },
}

/// The post pipeline.
pub struct PostFlow {
    config: Config,
    generator: Box<dyn TextGenerator>,
    sync: Box<dyn PublishSync>,
}

impl fmt::Debug for PostFlow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PostFlow")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl PostFlow {
    /// Creates a pipeline over the given services.
    pub fn new(
        config: Config,
        generator: Box<dyn TextGenerator>,
        sync: Box<dyn PublishSync>,
    ) -> Self {
        Self {
            config,
            generator,
            sync,
        }
    }

    /// Creates the production pipeline: the OpenAI client, plus git sync
    /// when `git_sync` is enabled.
    ///
    /// # Errors
    ///
    /// Returns `MissingCredential` when `OPENAI_API_KEY` is not set.
    pub fn from_config(config: Config) -> Result<Self> {
        let generator = OpenAiClient::from_env(&config)?;
        let sync: Box<dyn PublishSync> = if config.git_sync {
            Box::new(GitSync::new(config.paths.site_root.clone()))
        } else {
            Box::new(NoSync)
        };
        Ok(Self::new(config, Box::new(generator), sync))
    }

    /// The pipeline's configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Runs the pipeline once for the local date.
    pub fn run(&self) -> Result<RunOutcome> {
        self.run_on(Local::now().date_naive(), &mut rand::thread_rng())
    }

    /// Runs the pipeline once as of `today`, drawing topics with `rng`.
    ///
    /// # Errors
    ///
    /// Any failure before the ledger is saved aborts the run. Sync
    /// problems never do; they are reported in the outcome.
    pub fn run_on<R: Rng + ?Sized>(
        &self,
        today: NaiveDate,
        rng: &mut R,
    ) -> Result<RunOutcome> {
        let config = &self.config;
        let mut ledger = Ledger::load(config.paths.ledger_path())?;

        let count = ledger.count_on(today);
        let quota = config.posts_per_day;
        if count >= quota as usize {
            log::info!("Already published {count}/{quota} posts today, skipping");
            return Ok(RunOutcome::QuotaReached { count, quota });
        }

        let template = PageTemplate::load(config.paths.template_path())?;
        let pages = config.site_pages();

        let topic = TopicSelector::new(config, self.generator.as_ref())
            .select(&ledger, rng)?;
        log::info!("Selected topic: {}", topic.text);

        let post = ContentGenerator::new(self.generator.as_ref(), config, &pages)
            .generate(&topic.text, &ledger)?;
        log::info!("Generated post: {}", post.title);

        let published = Publisher::new(config, &template).publish(
            &post,
            &topic.text,
            &mut ledger,
            today,
        )?;

        let message = format!("blog: add new post: {}", published.title);
        let sync = self.sync.sync(&published.files, &message);
        match sync {
            SyncOutcome::Disabled => log::debug!("Version control: {sync}"),
            _ if sync.is_warning() => log::warn!("Version control: {sync}"),
            _ => log::info!("Version control: {sync}"),
        }

        log::info!(
            "Published {} ({} internal links, {}/{} posts today)",
            published.slug,
            published.internal_links,
            count + 1,
            quota
        );
        Ok(RunOutcome::Published {
            post: published,
            sync,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::PathsConfig;
    use crate::core::traits::{MockPublishSync, MockTextGenerator};
    use crate::ledger::{Ledger, LedgerEntry};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::fs;
    use tempfile::TempDir;

    const TOPIC: &str = "Signs You Need Sewer Line Repair";
    const INDEX: &str = "<main><div class=\"blog__grid\">\n</div></main>";
    const TEMPLATE: &str =
        "<h1>{{TITLE}}</h1><time datetime=\"{{DATE_ISO}}\">{{DATE_DISPLAY}}</time>{{CONTENT}}";

    fn site() -> (TempDir, Config) {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::write(root.join("blog.html"), INDEX).unwrap();
        fs::create_dir_all(root.join("automation")).unwrap();
        fs::write(root.join("automation/post_template.html"), TEMPLATE).unwrap();

        let config = Config {
            site_name: "Acme Plumbing".into(),
            site_phone: "(555) 010-0000".into(),
            site_location: "Springfield".into(),
            topics: vec![TOPIC.into()],
            posts_per_day: 2,
            paths: PathsConfig {
                site_root: root.to_path_buf(),
                ..Default::default()
            },
            ..Default::default()
        };
        (temp_dir, config)
    }

    fn post_json() -> String {
        let body = format!(
            "<p>{}</p><a href=\"../contact.html\">c</a><a href=\"../faq.html\">f</a>\
             <a href=\"../services.html\">s</a>",
            vec!["word"; 400].join(" ")
        );
        serde_json::json!({
            "title": "Signs You Need Sewer Line Repair in Springfield",
            "meta_description": "Warning signs.",
            "keywords": "sewer, repair",
            "excerpt": "Slow drains?",
            "category": "Sewer Lines",
            "content": body,
        })
        .to_string()
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 18).unwrap()
    }

    #[test]
    fn test_end_to_end_single_topic() {
        let (dir, config) = site();
        let mut generator = MockTextGenerator::new();
        let _ = generator
            .expect_complete()
            .withf(|r| r.json_response && r.user.contains(TOPIC))
            .times(1)
            .returning(|_| Ok(post_json()));
        let mut sync = MockPublishSync::new();
        let _ = sync
            .expect_sync()
            .withf(|files, message| {
                files.len() == 3
                    && message
                        == "blog: add new post: Signs You Need Sewer Line Repair in Springfield"
            })
            .times(1)
            .returning(|_, _| SyncOutcome::Pushed);

        let flow = PostFlow::new(config, Box::new(generator), Box::new(sync));
        let outcome = flow.run_on(today(), &mut StdRng::seed_from_u64(3)).unwrap();

        let slug = "signs-you-need-sewer-line-repair-in-springfield";
        assert!(matches!(
            &outcome,
            RunOutcome::Published { post, sync: SyncOutcome::Pushed } if post.slug == slug
        ));

        let page = fs::read_to_string(dir.path().join(format!("posts/{slug}.html"))).unwrap();
        assert!(page.contains("<time datetime=\"2026-10-18\">October 18, 2026</time>"));

        let index = fs::read_to_string(dir.path().join("blog.html")).unwrap();
        assert!(index.contains(&format!("<a href=\"posts/{slug}.html\">")));
        let marker = &flow.config().index_marker;
        let after = index.find(marker.as_str()).unwrap() + marker.len();
        assert!(index[after..].starts_with("\n\n                    <!-- Blog Card:"));
        assert_eq!(index.matches("<!-- Blog Card:").count(), 1);
        assert!(index.ends_with("</div></main>"));

        let ledger = Ledger::load(flow.config().paths.ledger_path()).unwrap();
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.entries()[0].topic, TOPIC);
        assert_eq!(ledger.entries()[0].publication_date, today());
    }

    #[test]
    fn test_quota_full_run_has_no_side_effects() {
        let (dir, config) = site();
        let entry = |slug: &str| LedgerEntry {
            slug: slug.into(),
            title: slug.into(),
            topic: slug.into(),
            category: String::new(),
            publication_date: today(),
            meta_description: String::new(),
        };
        Ledger::new(vec![entry("b"), entry("a")])
            .save(config.paths.ledger_path())
            .unwrap();
        let ledger_before = fs::read(config.paths.ledger_path()).unwrap();

        let mut generator = MockTextGenerator::new();
        let _ = generator.expect_complete().times(0);
        let mut sync = MockPublishSync::new();
        let _ = sync.expect_sync().times(0);

        let flow = PostFlow::new(config, Box::new(generator), Box::new(sync));
        let outcome = flow.run_on(today(), &mut StdRng::seed_from_u64(3)).unwrap();

        assert_eq!(outcome, RunOutcome::QuotaReached { count: 2, quota: 2 });
        assert_eq!(fs::read(flow.config().paths.ledger_path()).unwrap(), ledger_before);
        assert_eq!(fs::read_to_string(dir.path().join("blog.html")).unwrap(), INDEX);
        assert!(!dir.path().join("posts").exists());
    }

    #[test]
    fn test_posts_from_other_days_do_not_count() {
        let (_dir, config) = site();
        let mut old = Ledger::default();
        old.prepend(LedgerEntry {
            slug: "yesterday".into(),
            title: "Yesterday".into(),
            topic: "Old".into(),
            category: String::new(),
            publication_date: today().pred_opt().unwrap(),
            meta_description: String::new(),
        })
        .unwrap();
        old.save(config.paths.ledger_path()).unwrap();

        let mut generator = MockTextGenerator::new();
        let _ = generator
            .expect_complete()
            .times(1)
            .returning(|_| Ok(post_json()));
        let mut sync = MockPublishSync::new();
        let _ = sync
            .expect_sync()
            .returning(|_, _| SyncOutcome::NothingToCommit);

        let config = Config {
            posts_per_day: 1,
            ..config
        };
        let flow = PostFlow::new(config, Box::new(generator), Box::new(sync));
        let outcome = flow.run_on(today(), &mut StdRng::seed_from_u64(3)).unwrap();
        assert!(matches!(outcome, RunOutcome::Published { .. }));
    }

    #[test]
    fn test_generation_failure_writes_nothing() {
        let (dir, config) = site();
        let mut generator = MockTextGenerator::new();
        let _ = generator
            .expect_complete()
            .returning(|_| Ok("not json".to_string()));
        let mut sync = MockPublishSync::new();
        let _ = sync.expect_sync().times(0);

        let flow = PostFlow::new(config, Box::new(generator), Box::new(sync));
        let result = flow.run_on(today(), &mut StdRng::seed_from_u64(3));

        assert!(matches!(result, Err(PostFlowError::MalformedResponse { .. })));
        assert!(!dir.path().join("posts").exists());
        assert!(!flow.config().paths.ledger_path().exists());
    }

    #[test]
    fn test_missing_template_fails_before_generation() {
        let (dir, config) = site();
        fs::remove_file(dir.path().join("automation/post_template.html")).unwrap();
        let mut generator = MockTextGenerator::new();
        let _ = generator.expect_complete().times(0);

        let flow = PostFlow::new(config, Box::new(generator), Box::new(NoSync));
        assert!(matches!(
            flow.run_on(today(), &mut StdRng::seed_from_u64(3)),
            Err(PostFlowError::IOError { .. })
        ));
    }
}
