// Copyright © 2024 PostFlow. All rights reserved.
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! # Publisher
//!
//! Turns a [`GeneratedPost`] into files on disk, in a fixed order:
//!
//! 1. the post page, rendered from the page template,
//! 2. the site index, with a summary card spliced in after the marker,
//! 3. the ledger, with the new entry prepended.
//!
//! A duplicate slug is rejected before anything is written. A later step
//! failing leaves the earlier files in place; there is no rollback.

use std::collections::HashMap;
use std::path::PathBuf;

use chrono::NaiveDate;

use crate::content::{count_internal_links, reading_time, short_title, slugify};
use crate::core::config::Config;
use crate::core::error::{PostFlowError, Result};
use crate::generation::GeneratedPost;
use crate::ledger::{Ledger, LedgerEntry};
use crate::process::{read_content, write_atomic, write_content};
use crate::template::PageTemplate;

/// Placeholders every post template is expected to carry.
pub const PLACEHOLDERS: [&str; 10] = [
    "TITLE",
    "TITLE_SHORT",
    "META_DESCRIPTION",
    "KEYWORDS",
    "DATE_DISPLAY",
    "DATE_ISO",
    "CATEGORY",
    "READING_TIME",
    "CONTENT",
    "SLUG",
];

/// Posts with fewer internal links than this are logged as a warning.
pub const MIN_INTERNAL_LINKS: usize = 3;

/// Icon used for categories missing from [`category_icon`]'s table.
pub const DEFAULT_ICON: &str = "fas fa-wrench";

const DATE_DISPLAY_FORMAT: &str = "%B %d, %Y";
const CARD_DATE_FORMAT: &str = "%b %d, %Y";

/// Files written by a successful publish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedPost {
    /// Slug of the new post.
    pub slug: String,
    /// Title of the new post.
    pub title: String,
    /// Internal links found in the body.
    pub internal_links: usize,
    /// Post page, site index and ledger, in write order.
    pub files: Vec<PathBuf>,
}

/// Font Awesome icon class for `category`, matched case-insensitively.
pub fn category_icon(category: &str) -> &'static str {
    match category.trim().to_lowercase().as_str() {
        "trenchless technology" => "fas fa-hard-hat",
        "maintenance" => "fas fa-wrench",
        "home maintenance" => "fas fa-home",
        "emergency tips" => "fas fa-exclamation-triangle",
        "sewer lines" => "fas fa-water",
        "water heaters" => "fas fa-temperature-high",
        "safety" => "fas fa-shield-alt",
        "plumbing tips" => "fas fa-tools",
        "drain cleaning" => "fas fa-shower",
        "repiping" => "fas fa-random",
        "gas lines" => "fas fa-fire",
        "diy & prevention" => "fas fa-toolbox",
        "our services" => "fas fa-concierge-bell",
        "company news" => "fas fa-newspaper",
        _ => DEFAULT_ICON,
    }
}

/// The summary card inserted into the site index.
pub fn build_card(post: &GeneratedPost, url: &str, date: NaiveDate) -> String {
    let icon = category_icon(&post.category);
    let date = date.format(CARD_DATE_FORMAT);
    format!(
        r#"
                    <!-- Blog Card: {title} -->
                    <div class="blog-card animate-on-scroll fade-up">
                        <div class="blog-card__img">
                            <i class="{icon}"></i>
                        </div>
                        <div class="blog-card__body">
                            <span class="blog-card__meta">{category} &mdash; {date}</span>
                            <h3><a href="{url}">{title}</a></h3>
                            <p>{excerpt}</p>
                            <a href="{url}" class="blog-card__link">Read More <i class="fas fa-arrow-right"></i></a>
                        </div>
                    </div>"#,
        title = post.title,
        category = post.category,
        excerpt = post.excerpt,
    )
}

/// Inserts `card` directly after the first `marker` in `index`.
///
/// Returns `None` when the marker is absent.
pub fn splice_card(index: &str, marker: &str, card: &str) -> Option<String> {
    let at = index.find(marker)? + marker.len();
    let mut updated = String::with_capacity(index.len() + card.len() + 1);
    updated.push_str(&index[..at]);
    updated.push('\n');
    updated.push_str(card);
    updated.push_str(&index[at..]);
    Some(updated)
}

/// Writes posts, index cards and ledger entries.
#[derive(Debug)]
pub struct Publisher<'a> {
    config: &'a Config,
    template: &'a PageTemplate,
}

impl<'a> Publisher<'a> {
    /// Creates a publisher and reports placeholders the template lacks.
    pub fn new(config: &'a Config, template: &'a PageTemplate) -> Self {
        let missing = template.missing(&PLACEHOLDERS);
        if !missing.is_empty() {
            log::warn!(
                "Post template has no placeholder for: {}",
                missing.join(", ")
            );
        }
        Self { config, template }
    }

    /// Renders the post page for `post` under `slug`.
    pub fn render_page(&self, post: &GeneratedPost, slug: &str, date: NaiveDate) -> String {
        let values: HashMap<&str, String> = HashMap::from([
            ("TITLE", post.title.clone()),
            ("TITLE_SHORT", short_title(&post.title)),
            ("META_DESCRIPTION", post.meta_description.clone()),
            ("KEYWORDS", post.keywords.clone()),
            ("DATE_DISPLAY", date.format(DATE_DISPLAY_FORMAT).to_string()),
            ("DATE_ISO", date.to_string()),
            ("CATEGORY", post.category.clone()),
            ("READING_TIME", reading_time(&post.content).to_string()),
            ("CONTENT", post.content.clone()),
            ("SLUG", slug.to_string()),
        ]);
        self.template.render(&values)
    }

    /// Publishes `post`, written about `topic`, dated `date`.
    ///
    /// `ledger` is updated in memory and persisted as the final step.
    ///
    /// # Errors
    ///
    /// - `DuplicateSlug` if the ledger already holds the post's slug;
    ///   nothing is written.
    /// - `IndexMarkerNotFound` if the index lacks the marker; the post
    ///   page has already been written.
    /// - `IOError` or `LedgerError` from the file writes.
    pub fn publish(
        &self,
        post: &GeneratedPost,
        topic: &str,
        ledger: &mut Ledger,
        date: NaiveDate,
    ) -> Result<PublishedPost> {
        let slug = slugify(&post.title);
        if slug.is_empty() {
            return Err(PostFlowError::malformed_response(
                format!("title {:?} yields an empty slug", post.title),
                None,
            ));
        }
        if ledger.contains_slug(&slug) {
            return Err(PostFlowError::DuplicateSlug(slug));
        }

        let internal_links = count_internal_links(&post.content);
        if internal_links < MIN_INTERNAL_LINKS {
            log::warn!(
                "Only {} internal links in '{}'; at least {} expected",
                internal_links,
                post.title,
                MIN_INTERNAL_LINKS
            );
        }

        let paths = &self.config.paths;
        let page_path = paths.post_path(&slug);
        write_content(&page_path, &self.render_page(post, &slug, date))?;
        log::info!("Post page written: {}", page_path.display());

        let index_path = paths.index_path();
        let index = read_content(&index_path)?;
        let card = build_card(post, &paths.post_url(&slug), date);
        let updated = splice_card(&index, &self.config.index_marker, &card)
            .ok_or_else(|| PostFlowError::IndexMarkerNotFound {
                path: index_path.clone(),
                marker: self.config.index_marker.clone(),
            })?;
        write_atomic(&index_path, &updated)?;
        log::info!("Site index updated: {}", index_path.display());

        ledger.prepend(LedgerEntry {
            slug: slug.clone(),
            title: post.title.clone(),
            topic: topic.to_string(),
            category: post.category.clone(),
            publication_date: date,
            meta_description: post.meta_description.clone(),
        })?;
        let ledger_path = paths.ledger_path();
        ledger.save(&ledger_path)?;
        log::debug!("Ledger saved with {} entries", ledger.len());

        Ok(PublishedPost {
            slug,
            title: post.title.clone(),
            internal_links,
            files: vec![page_path, index_path, ledger_path],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::PathsConfig;
    use std::fs;
    use tempfile::TempDir;

    const TEMPLATE: &str = "<title>{{TITLE}}</title><p>{{DATE_DISPLAY}} {{DATE_ISO}} \
        {{READING_TIME}} min</p><main>{{CONTENT}}</main><a href=\"{{SLUG}}\">{{TITLE_SHORT}}</a>\
        {{META_DESCRIPTION}}{{KEYWORDS}}{{CATEGORY}}";

    const INDEX: &str =
        "<html><body><div class=\"blog__grid\">\n<!-- old cards -->\n</div></body></html>";

    fn setup() -> (TempDir, Config) {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::write(root.join("blog.html"), INDEX).unwrap();
        let config = Config {
            paths: PathsConfig {
                site_root: root.to_path_buf(),
                ..Default::default()
            },
            ..Default::default()
        };
        (temp_dir, config)
    }

    fn post(title: &str) -> GeneratedPost {
        GeneratedPost {
            title: title.into(),
            meta_description: "Meta.".into(),
            keywords: "k1, k2".into(),
            excerpt: "An excerpt.".into(),
            category: "Sewer Lines".into(),
            content: "<p>word </p>".repeat(400),
        }
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 18).unwrap()
    }

    #[test]
    fn test_category_icon_lookup() {
        assert_eq!(category_icon("Sewer Lines"), "fas fa-water");
        assert_eq!(category_icon("DIY & PREVENTION"), "fas fa-toolbox");
        assert_eq!(category_icon("Something New"), DEFAULT_ICON);
    }

    #[test]
    fn test_splice_card() {
        let updated = splice_card("a<m>b", "<m>", "CARD").unwrap();
        assert_eq!(updated, "a<m>\nCARDb");
        assert!(splice_card("abc", "<m>", "CARD").is_none());
    }

    #[test]
    fn test_card_contents() {
        let card = build_card(&post("A Title"), "posts/a-title.html", day());
        assert!(card.contains("Sewer Lines &mdash; Oct 18, 2026"));
        assert!(card.contains("<h3><a href=\"posts/a-title.html\">A Title</a></h3>"));
        assert!(card.contains("<i class=\"fas fa-water\"></i>"));
    }

    #[test]
    fn test_render_page() {
        let (_dir, config) = setup();
        let template = PageTemplate::new(TEMPLATE);
        let publisher = Publisher::new(&config, &template);
        let html = publisher.render_page(&post("A Title"), "a-title", day());

        assert!(html.contains("<title>A Title</title>"));
        assert!(html.contains("October 18, 2026 2026-10-18 2 min"));
        assert!(html.contains("href=\"a-title\""));
        assert!(!html.contains("{{"));
    }

    #[test]
    fn test_publish_writes_page_index_and_ledger() {
        let (dir, config) = setup();
        let template = PageTemplate::new(TEMPLATE);
        let publisher = Publisher::new(&config, &template);
        let mut ledger = Ledger::default();

        let published = publisher
            .publish(&post("Fix A Leak"), "Leaks", &mut ledger, day())
            .unwrap();

        assert_eq!(published.slug, "fix-a-leak");
        assert_eq!(published.files.len(), 3);
        assert!(dir.path().join("posts/fix-a-leak.html").exists());
        let index = fs::read_to_string(dir.path().join("blog.html")).unwrap();
        assert!(index.contains("posts/fix-a-leak.html"));

        let saved = Ledger::load(config.paths.ledger_path()).unwrap();
        assert_eq!(saved, ledger);
        assert_eq!(saved.entries()[0].topic, "Leaks");
        assert_eq!(saved.entries()[0].publication_date, day());
    }

    #[test]
    fn test_second_card_lands_before_first() {
        let (dir, config) = setup();
        let template = PageTemplate::new(TEMPLATE);
        let publisher = Publisher::new(&config, &template);
        let mut ledger = Ledger::default();

        let _ = publisher
            .publish(&post("First Post"), "1", &mut ledger, day())
            .unwrap();
        let _ = publisher
            .publish(&post("Second Post"), "2", &mut ledger, day())
            .unwrap();

        let index = fs::read_to_string(dir.path().join("blog.html")).unwrap();
        let first = index.find("posts/first-post.html").unwrap();
        let second = index.find("posts/second-post.html").unwrap();
        let marker = index.find("<div class=\"blog__grid\">").unwrap();
        assert!(marker < second && second < first);
        assert!(first < index.find("<!-- old cards -->").unwrap());
        assert_eq!(ledger.entries()[0].slug, "second-post");
    }

    #[test]
    fn test_duplicate_slug_writes_nothing() {
        let (dir, config) = setup();
        let template = PageTemplate::new(TEMPLATE);
        let publisher = Publisher::new(&config, &template);
        let mut ledger = Ledger::new(vec![LedgerEntry {
            slug: "fix-a-leak".into(),
            title: "Fix a Leak".into(),
            topic: "Leaks".into(),
            category: String::new(),
            publication_date: day(),
            meta_description: String::new(),
        }]);
        let before = ledger.clone();

        let result = publisher.publish(&post("Fix A Leak!"), "Other", &mut ledger, day());

        assert!(matches!(result, Err(PostFlowError::DuplicateSlug(s)) if s == "fix-a-leak"));
        assert_eq!(ledger, before);
        assert!(!dir.path().join("posts").exists());
        assert!(!config.paths.ledger_path().exists());
        assert_eq!(fs::read_to_string(dir.path().join("blog.html")).unwrap(), INDEX);
    }

    #[test]
    fn test_missing_marker_leaves_page_and_skips_ledger() {
        let (dir, config) = setup();
        fs::write(dir.path().join("blog.html"), "<html>no grid</html>").unwrap();
        let template = PageTemplate::new(TEMPLATE);
        let publisher = Publisher::new(&config, &template);
        let mut ledger = Ledger::default();

        let result = publisher.publish(&post("Fix A Leak"), "Leaks", &mut ledger, day());

        assert!(matches!(result, Err(PostFlowError::IndexMarkerNotFound { .. })));
        assert!(dir.path().join("posts/fix-a-leak.html").exists());
        assert!(ledger.is_empty());
        assert!(!config.paths.ledger_path().exists());
    }

    #[test]
    fn test_empty_slug_is_rejected() {
        let (_dir, config) = setup();
        let template = PageTemplate::new(TEMPLATE);
        let publisher = Publisher::new(&config, &template);
        assert!(matches!(
            publisher.publish(&post("!!!"), "t", &mut Ledger::default(), day()),
            Err(PostFlowError::MalformedResponse { .. })
        ));
    }
}
