// Copyright © 2024 PostFlow. All rights reserved.
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! # Content Utilities
//!
//! Small text transforms applied to generated posts:
//!
//! - [`slugify`] derives the URL-safe identifier of a title or topic
//! - [`reading_time`] estimates minutes of reading from body markup
//! - [`short_title`] truncates titles for breadcrumbs
//! - [`count_internal_links`] counts relative links in a body

use deunicode::deunicode;
use regex::Regex;
use std::sync::OnceLock;

/// Average reading speed used by [`reading_time`].
pub const WORDS_PER_MINUTE: usize = 200;

/// Titles longer than this are truncated by [`short_title`].
pub const SHORT_TITLE_CHARS: usize = 50;

/// Prefix of links that stay inside the site, as seen from a post page.
pub const INTERNAL_LINK_PREFIX: &str = "href=\"../";

fn tag_regex() -> &'static Regex {
    static TAG: OnceLock<Regex> = OnceLock::new();
    TAG.get_or_init(|| Regex::new(r"<[^>]+>").unwrap())
}

/// Converts text to a lowercase, hyphen-separated ASCII identifier.
///
/// Non-ASCII characters are transliterated first, so `"Café Pipes"`
/// becomes `"cafe-pipes"`. Every run of other characters collapses into a
/// single hyphen and no hyphen leads or trails. A comma between two
/// digits is a thousands separator and is dropped.
///
/// ```
/// use postflow::content::slugify;
/// assert_eq!(slugify("Signs You Need Sewer Line Repair!"), "signs-you-need-sewer-line-repair");
/// assert_eq!(slugify("Don't Ignore a Leak"), "don-t-ignore-a-leak");
/// ```
pub fn slugify(text: &str) -> String {
    let ascii = deunicode(text).to_lowercase();
    let mut slug = String::with_capacity(ascii.len());
    let mut pending_separator = false;
    let mut chars = ascii.chars().peekable();
    let mut prev = None;

    while let Some(c) = chars.next() {
        let thousands = c == ','
            && prev.is_some_and(|p: char| p.is_ascii_digit())
            && chars.peek().is_some_and(char::is_ascii_digit);
        prev = Some(c);
        if thousands {
            continue;
        }
        if c.is_ascii_alphanumeric() {
            if pending_separator && !slug.is_empty() {
                slug.push('-');
            }
            pending_separator = false;
            slug.push(c);
        } else {
            pending_separator = true;
        }
    }
    slug
}

/// Replaces every markup tag with a space.
pub fn strip_markup(html: &str) -> String {
    tag_regex().replace_all(html, " ").into_owned()
}

/// Counts whitespace-separated words once markup is stripped.
pub fn word_count(html: &str) -> usize {
    strip_markup(html).split_whitespace().count()
}

/// Estimated reading time in whole minutes, never less than one.
///
/// Halves round to even, so 500 words read in 2 minutes and 700 in 4.
pub fn reading_time(html: &str) -> u32 {
    #[allow(clippy::cast_precision_loss)]
    let minutes = (word_count(html) as f64 / WORDS_PER_MINUTE as f64)
        .round_ties_even();
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let minutes = minutes as u32;
    minutes.max(1)
}

/// The first [`SHORT_TITLE_CHARS`] characters of `title`, with `...`
/// appended when anything was cut.
pub fn short_title(title: &str) -> String {
    if title.chars().count() > SHORT_TITLE_CHARS {
        let mut short: String = title.chars().take(SHORT_TITLE_CHARS).collect();
        short.push_str("...");
        short
    } else {
        title.to_string()
    }
}

/// Number of links in `html` pointing at a relative, site-internal URL.
pub fn count_internal_links(html: &str) -> usize {
    html.matches(INTERNAL_LINK_PREFIX).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify_collapses_and_trims_separators() {
        assert_eq!(slugify("  Hello,   World!  "), "hello-world");
        assert_eq!(slugify("--already-slugged--"), "already-slugged");
        assert_eq!(slugify("2024: A Year of Pipes"), "2024-a-year-of-pipes");
        assert_eq!(slugify(""), "");
    }

    #[test]
    fn test_slugify_drops_thousands_separators() {
        assert_eq!(slugify("Save $1,000 on Repairs"), "save-1000-on-repairs");
        assert_eq!(slugify("1,250,000 Gallons"), "1250000-gallons");
        assert_eq!(slugify("Pipes, Drains, and Vents"), "pipes-drains-and-vents");
        assert_eq!(slugify("Top 5, 10 Tips"), "top-5-10-tips");
    }

    #[test]
    fn test_slugify_transliterates() {
        assert_eq!(slugify("Café Crème Brûlée"), "cafe-creme-brulee");
    }

    #[test]
    fn test_reading_time_four_hundred_words() {
        let body = format!("<p>{}</p>", vec!["word"; 400].join(" "));
        assert_eq!(word_count(&body), 400);
        assert_eq!(reading_time(&body), 2);
    }

    #[test]
    fn test_reading_time_minimum_and_rounding() {
        assert_eq!(reading_time(""), 1);
        assert_eq!(reading_time("<p>just a few words</p>"), 1);
        let words = |n| vec!["w"; n].join(" ");
        assert_eq!(reading_time(&words(500)), 2);
        assert_eq!(reading_time(&words(700)), 4);
        assert_eq!(reading_time(&words(1299)), 6);
    }

    #[test]
    fn test_strip_markup_separates_words() {
        assert_eq!(word_count("<h2>Title</h2><p>one<strong>two</strong></p>"), 3);
    }

    #[test]
    fn test_short_title() {
        let exact = "a".repeat(50);
        assert_eq!(short_title(&exact), exact);
        let long = "b".repeat(51);
        assert_eq!(short_title(&long), format!("{}...", "b".repeat(50)));
        assert_eq!(short_title("ééé"), "ééé");
    }

    #[test]
    fn test_count_internal_links() {
        let html = r#"<a href="../contact.html">x</a> <a href="https://a.b">y</a>
            <a href="../posts/p.html">z</a>"#;
        assert_eq!(count_internal_links(html), 2);
    }
}
