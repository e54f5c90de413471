// Copyright © 2024 PostFlow. All rights reserved.
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! # Page Template Module
//!
//! Literal placeholder substitution over an immutable template string.
//!
//! Placeholders look like `{{NAME}}` where `NAME` is upper-case letters,
//! digits and underscores. Rendering is a single pass: substituted values
//! are never scanned again, so a post body that happens to contain
//! `{{SLUG}}` is written out verbatim. Placeholders without a value are
//! left untouched.

use crate::core::error::{PostFlowError, Result};
use regex::{Captures, Regex};
use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::Path;
use std::sync::OnceLock;

fn placeholder_regex() -> &'static Regex {
    static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
    PLACEHOLDER.get_or_init(|| Regex::new(r"\{\{([A-Z0-9_]+)\}\}").unwrap())
}

/// An HTML page template with `{{NAME}}` placeholders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageTemplate {
    source: String,
}

impl PageTemplate {
    /// Wraps a template string.
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
        }
    }

    /// Reads the template at `path`.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let source = fs::read_to_string(path)
            .map_err(|e| PostFlowError::io_error(path.to_path_buf(), e))?;
        Ok(Self::new(source))
    }

    /// Names of all placeholders in the template.
    pub fn placeholders(&self) -> BTreeSet<&str> {
        placeholder_regex()
            .captures_iter(&self.source)
            .filter_map(|c| c.get(1).map(|m| m.as_str()))
            .collect()
    }

    /// Names from `required` that the template does not contain.
    pub fn missing<'a>(&self, required: &[&'a str]) -> Vec<&'a str> {
        let present = self.placeholders();
        required
            .iter()
            .copied()
            .filter(|name| !present.contains(name))
            .collect()
    }

    /// Substitutes `values` into the template.
    pub fn render(&self, values: &HashMap<&str, String>) -> String {
        placeholder_regex()
            .replace_all(&self.source, |caps: &Captures<'_>| {
                values
                    .get(&caps[1])
                    .cloned()
                    .unwrap_or_else(|| caps[0].to_string())
            })
            .into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn values(pairs: &[(&'static str, &str)]) -> HashMap<&'static str, String> {
        pairs.iter().map(|(k, v)| (*k, (*v).to_string())).collect()
    }

    #[test]
    fn test_render_substitutes_every_occurrence() {
        let template =
            PageTemplate::new("<title>{{TITLE}}</title><h1>{{TITLE}}</h1>");
        let html = template.render(&values(&[("TITLE", "Hello")]));
        assert_eq!(html, "<title>Hello</title><h1>Hello</h1>");
    }

    #[test]
    fn test_render_is_single_pass() {
        let template = PageTemplate::new("{{CONTENT}}|{{SLUG}}");
        let html = template.render(&values(&[
            ("CONTENT", "literal {{SLUG}} in body"),
            ("SLUG", "my-post"),
        ]));
        assert_eq!(html, "literal {{SLUG}} in body|my-post");
    }

    #[test]
    fn test_unknown_placeholders_are_kept() {
        let template = PageTemplate::new("{{TITLE}} {{UNKNOWN}} {lower}");
        let html = template.render(&values(&[("TITLE", "T")]));
        assert_eq!(html, "T {{UNKNOWN}} {lower}");
    }

    #[test]
    fn test_title_and_title_short_are_distinct() {
        let template = PageTemplate::new("{{TITLE}}/{{TITLE_SHORT}}");
        let html = template
            .render(&values(&[("TITLE", "Long"), ("TITLE_SHORT", "L...")]));
        assert_eq!(html, "Long/L...");
    }

    #[test]
    fn test_missing_placeholders() {
        let template = PageTemplate::new("{{TITLE}} {{CONTENT}}");
        assert_eq!(
            template.missing(&["TITLE", "SLUG", "CONTENT"]),
            vec!["SLUG"]
        );
    }

    #[test]
    fn test_load_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let result = PageTemplate::load(temp_dir.path().join("nope.html"));
        assert!(matches!(result, Err(PostFlowError::IOError { .. })));
    }
}
