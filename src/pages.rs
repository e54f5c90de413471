// Copyright © 2024 PostFlow. All rights reserved.
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The site page directory: pages a post may link to, with suggested
//! anchor texts and a hint telling the model when each link fits.
//!
//! Post pages live one directory below the site root, so URLs are
//! relative to that (`../contact.html`).

use serde::{Deserialize, Serialize};

/// One linkable page of the site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SitePage {
    /// Short identifier, e.g. `contact`.
    pub id: String,
    /// URL relative to a post page.
    pub url: String,
    /// Candidate anchor phrases; the first is shown to the model.
    #[serde(default)]
    pub anchors: Vec<String>,
    /// When the page is a good link target.
    #[serde(default)]
    pub use_when: String,
}

impl SitePage {
    fn builtin(id: &str, url: &str, anchors: &[&str], use_when: &str) -> Self {
        Self {
            id: id.to_string(),
            url: url.to_string(),
            anchors: anchors.iter().map(|a| (*a).to_string()).collect(),
            use_when: use_when.to_string(),
        }
    }
}

/// Ordered, read-only set of [`SitePage`]s.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SitePageDirectory {
    pages: Vec<SitePage>,
}

impl SitePageDirectory {
    /// Creates a directory from `pages`, keeping their order.
    pub fn new(pages: Vec<SitePage>) -> Self {
        Self { pages }
    }

    /// Looks a page up by identifier.
    pub fn get(&self, id: &str) -> Option<&SitePage> {
        self.pages.iter().find(|p| p.id == id)
    }

    /// Iterates over the pages in order.
    pub fn iter(&self) -> impl Iterator<Item = &SitePage> {
        self.pages.iter()
    }

    /// Number of pages.
    pub fn len(&self) -> usize {
        self.pages.len()
    }

    /// Returns `true` if there are no pages.
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}

impl Default for SitePageDirectory {
    fn default() -> Self {
        Self::new(vec![
            SitePage::builtin(
                "contact",
                "../contact.html",
                &[
                    "contact us today",
                    "get in touch with our team",
                    "reach out to us",
                    "book a service appointment",
                    "schedule a service",
                ],
                "CTA, booking, getting help, asking questions",
            ),
            SitePage::builtin(
                "services",
                "../services.html",
                &[
                    "view all our services",
                    "explore our full range of services",
                    "our professional services",
                    "see what services we offer",
                ],
                "mentioning multiple services, general service overview",
            ),
            SitePage::builtin(
                "trenchless",
                "../trenchless.html",
                &[
                    "learn more about trenchless technology",
                    "our trenchless sewer repair process",
                    "trenchless pipe replacement",
                    "see how trenchless works",
                ],
                "trenchless, pipe bursting, CIPP, pipe lining, no-dig repair",
            ),
            SitePage::builtin(
                "estimate",
                "../estimate.html",
                &[
                    "get a free estimate",
                    "request your free quote",
                    "use our free estimate calculator",
                    "check pricing for your project",
                ],
                "pricing, cost, quotes, how much does it cost",
            ),
            SitePage::builtin(
                "about",
                "../about.html",
                &[
                    "learn more about our team",
                    "our experienced team",
                    "why homeowners trust us",
                ],
                "company credibility, team expertise, trust, experience",
            ),
            SitePage::builtin(
                "reviews",
                "../reviews.html",
                &[
                    "read what our customers say",
                    "check out our customer reviews",
                ],
                "social proof, customer satisfaction, testimonials, trust",
            ),
            SitePage::builtin(
                "faq",
                "../faq.html",
                &[
                    "check our FAQ page",
                    "find answers to common questions",
                    "read our frequently asked questions",
                ],
                "common questions, general questions",
            ),
            SitePage::builtin(
                "gallery",
                "../gallery.html",
                &[
                    "see our project gallery",
                    "view real project photos",
                    "browse our completed work",
                ],
                "examples of work, before/after, project photos",
            ),
        ])
    }
}
