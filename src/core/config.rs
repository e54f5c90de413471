// Copyright © 2024 PostFlow. All rights reserved.
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! # Configuration Module
//!
//! Loads the static settings that drive every pipeline run: site identity,
//! the candidate topic list, the daily quota, the run schedule and the
//! locations of the files the publisher touches.
//!
//! ## Sources
//!
//! - A TOML file, or a JSON file when the path ends in `.json`
//! - Environment variables sharing a prefix (`POSTFLOW_SITE_NAME`, ...)
//! - Programmatic overrides
//!
//! Later sources win. Relative paths in the `[paths]` table are resolved
//! against the directory holding the configuration file.
//!
//! ## Example
//!
//! ```rust,no_run
//! use postflow::core::config::ConfigBuilder;
//!
//! let config = ConfigBuilder::new()
//!     .with_file("postflow.toml")
//!     .with_env_prefix("POSTFLOW_")
//!     .with_override("posts_per_day", 3)
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(config.posts_per_day, 3);
//! ```

use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use toml::Value as TomlValue;

use crate::core::error::{PostFlowError, Result};
use crate::pages::{SitePage, SitePageDirectory};

/// Environment variable naming the configuration file.
pub const CONFIG_PATH_ENV: &str = "POSTFLOW_CONFIG";
/// Configuration file used when [`CONFIG_PATH_ENV`] is unset.
pub const DEFAULT_CONFIG_FILE: &str = "postflow.toml";
/// Prefix for environment overrides.
pub const ENV_PREFIX: &str = "POSTFLOW_";

/// Format of the entries in `schedule_times`.
const TIME_FORMAT: &str = "%H:%M";

/// Process-wide settings, read once at start-up and never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Business name used in prompts and CTAs.
    #[serde(default)]
    pub site_name: String,

    /// Phone number the closing call-to-action must mention.
    #[serde(default)]
    pub site_phone: String,

    /// Town or region used for local SEO.
    #[serde(default)]
    pub site_location: String,

    /// One-line description of the business, e.g. "a licensed plumbing company".
    #[serde(default = "default_business_description")]
    pub business_description: String,

    /// Services the business offers, listed in the content prompt.
    #[serde(default)]
    pub services: Vec<String>,

    /// Trust signals (reviews, years in business, licences).
    #[serde(default)]
    pub highlights: Vec<String>,

    /// Model identifier sent to the text-generation service.
    #[serde(default = "default_model", alias = "openai_model")]
    pub model: String,

    /// Candidate topics, consumed in random order.
    #[serde(default)]
    pub topics: Vec<String>,

    /// Maximum number of posts published per calendar day.
    #[serde(default = "default_posts_per_day")]
    pub posts_per_day: u32,

    /// Daily run times in `HH:MM` (local time).
    #[serde(default = "default_schedule_times")]
    pub schedule_times: Vec<String>,

    /// Categories the model must choose from.
    #[serde(default = "default_categories")]
    pub categories: Vec<String>,

    /// Keywords used when the model omits them.
    #[serde(default)]
    pub fallback_keywords: Option<String>,

    /// Identifier of the page closing CTAs must link to.
    #[serde(default = "default_contact_page")]
    pub contact_page: String,

    /// Text in the site index after which new cards are inserted.
    #[serde(default = "default_index_marker")]
    pub index_marker: String,

    /// Base URL of the OpenAI-compatible API.
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Timeout for a single generation request, in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Sleep between scheduler checks, in seconds.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Commit and push published files.
    #[serde(default = "default_true")]
    pub git_sync: bool,

    /// Optional file mirroring the log output.
    #[serde(default)]
    pub log_file: Option<PathBuf>,

    /// File locations.
    #[serde(default)]
    pub paths: PathsConfig,

    /// Site pages offered as internal link targets. Empty means the
    /// built-in directory.
    #[serde(default)]
    pub pages: Vec<SitePage>,
}

/// Locations of the files the pipeline reads and writes.
///
/// `site_root` is resolved against the configuration file's directory;
/// everything else is resolved against `site_root`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Root of the static site (and of the git working tree).
    #[serde(default = "default_site_root")]
    pub site_root: PathBuf,

    /// Directory receiving generated post pages.
    #[serde(default = "default_posts_dir")]
    pub posts_dir: PathBuf,

    /// The site index document listing post cards.
    #[serde(default = "default_index_file")]
    pub index_file: PathBuf,

    /// The JSON ledger of published posts.
    #[serde(default = "default_ledger_file")]
    pub ledger_file: PathBuf,

    /// The post page template.
    #[serde(default = "default_template_file")]
    pub template_file: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            site_root: default_site_root(),
            posts_dir: default_posts_dir(),
            index_file: default_index_file(),
            ledger_file: default_ledger_file(),
            template_file: default_template_file(),
        }
    }
}

impl PathsConfig {
    /// Directory receiving generated post pages.
    pub fn posts_dir(&self) -> PathBuf {
        self.site_root.join(&self.posts_dir)
    }

    /// Path of the page for `slug`.
    pub fn post_path(&self, slug: &str) -> PathBuf {
        self.posts_dir().join(format!("{slug}.html"))
    }

    /// Site-relative URL of the page for `slug`, as linked from the index.
    pub fn post_url(&self, slug: &str) -> String {
        let dir = self.posts_dir.to_string_lossy().replace('\\', "/");
        format!("{}/{slug}.html", dir.trim_end_matches('/'))
    }

    /// Path of the site index document.
    pub fn index_path(&self) -> PathBuf {
        self.site_root.join(&self.index_file)
    }

    /// Path of the ledger file.
    pub fn ledger_path(&self) -> PathBuf {
        self.site_root.join(&self.ledger_file)
    }

    /// Path of the post template.
    pub fn template_path(&self) -> PathBuf {
        self.site_root.join(&self.template_file)
    }

    fn resolve_against(&mut self, base: &Path) {
        if self.site_root.is_relative() {
            self.site_root = base.join(&self.site_root);
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            site_name: String::new(),
            site_phone: String::new(),
            site_location: String::new(),
            business_description: default_business_description(),
            services: Vec::new(),
            highlights: Vec::new(),
            model: default_model(),
            topics: Vec::new(),
            posts_per_day: default_posts_per_day(),
            schedule_times: default_schedule_times(),
            categories: default_categories(),
            fallback_keywords: None,
            contact_page: default_contact_page(),
            index_marker: default_index_marker(),
            api_base: default_api_base(),
            request_timeout_secs: default_request_timeout_secs(),
            poll_interval_secs: default_poll_interval_secs(),
            git_sync: true,
            log_file: None,
            paths: PathsConfig::default(),
            pages: Vec::new(),
        }
    }
}

impl Config {
    /// Loads the configuration file at `path` with `POSTFLOW_` environment
    /// overrides applied.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        ConfigBuilder::new()
            .with_file(path)
            .with_env_prefix(ENV_PREFIX)
            .build()
    }

    /// Path of the configuration file named by the environment, or the default.
    pub fn default_path() -> PathBuf {
        env::var_os(CONFIG_PATH_ENV)
            .map_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE), PathBuf::from)
    }

    /// Validates identity fields, quota, schedule and page directory.
    pub fn validate(&self) -> Result<()> {
        validate_config(self)
    }

    /// Keywords used when a generated post has none.
    pub fn fallback_keywords(&self) -> String {
        self.fallback_keywords.clone().unwrap_or_else(|| {
            format!("{}, {}", self.site_name, self.site_location)
        })
    }

    /// Parses `schedule_times` into times of day.
    pub fn schedule(&self) -> Result<Vec<NaiveTime>> {
        self.schedule_times
            .iter()
            .map(|raw| {
                NaiveTime::parse_from_str(raw.trim(), TIME_FORMAT).map_err(
                    |e| {
                        PostFlowError::config_error(
                            format!(
                                "Invalid schedule time '{}': {}",
                                raw, e
                            ),
                            None,
                        )
                    },
                )
            })
            .collect()
    }

    /// The site page directory: configured pages, or the built-in set.
    pub fn site_pages(&self) -> SitePageDirectory {
        if self.pages.is_empty() {
            SitePageDirectory::default()
        } else {
            SitePageDirectory::new(self.pages.clone())
        }
    }
}

/// Builds a [`Config`] from a file, environment variables and overrides.
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    config_file: Option<PathBuf>,
    env_prefix: Option<String>,
    overrides: HashMap<String, TomlValue>,
}

impl ConfigBuilder {
    /// Initialises a new `ConfigBuilder` instance with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a configuration file to the builder.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_file = Some(path.as_ref().to_path_buf());
        self
    }

    /// Adds a prefix for environment variables to override configuration values.
    ///
    /// `PREFIX_SITE_NAME` sets `site_name`; a double underscore selects a
    /// table, so `PREFIX_PATHS__SITE_ROOT` sets `paths.site_root`.
    pub fn with_env_prefix<S: Into<String>>(mut self, prefix: S) -> Self {
        self.env_prefix = Some(prefix.into());
        self
    }

    /// Adds a key-value pair to override configuration values.
    pub fn with_override<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<TomlValue>,
    {
        _ = self.overrides.insert(key.into(), value.into());
        self
    }

    /// Builds the final configuration by applying all specified settings
    /// and overrides, then validates it.
    pub fn build(self) -> Result<Config> {
        let (mut config, base) = match &self.config_file {
            Some(path) => {
                let base = path
                    .parent()
                    .filter(|p| !p.as_os_str().is_empty())
                    .map_or_else(|| PathBuf::from("."), Path::to_path_buf);
                (load_from_file(path)?, Some(base))
            }
            None => (Config::default(), None),
        };

        if let Some(prefix) = &self.env_prefix {
            apply_env_overrides(&mut config, prefix)?;
        }

        apply_overrides(&mut config, &self.overrides)?;
        if let Some(base) = base {
            config.paths.resolve_against(&base);
        }
        validate_config(&config)?;

        Ok(config)
    }
}

// Internal helper functions

fn load_from_file(path: &Path) -> Result<Config> {
    let content = fs::read_to_string(path).map_err(|e| {
        PostFlowError::config_error(
            format!("Failed to read config file: {}", e),
            Some(path.to_path_buf()),
        )
    })?;

    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    if is_json {
        serde_json::from_str(&content).map_err(|e| {
            PostFlowError::config_error(
                format!("Failed to parse config file: {}", e),
                Some(path.to_path_buf()),
            )
        })
    } else {
        toml::from_str(&content).map_err(|e| {
            PostFlowError::config_error(
                format!("Failed to parse config file: {}", e),
                Some(path.to_path_buf()),
            )
        })
    }
}

fn apply_env_overrides(config: &mut Config, prefix: &str) -> Result<()> {
    for (key, value) in env::vars() {
        if let Some(stripped) = key.strip_prefix(prefix) {
            let config_key = stripped
                .trim_start_matches('_')
                .to_lowercase()
                .replace("__", ".");
            if !is_known_key(&config_key) {
                log::debug!("Ignoring unknown environment override {key}");
                continue;
            }
            apply_config_value(config, &config_key, &value)?;
        }
    }
    Ok(())
}

fn apply_overrides(
    config: &mut Config,
    overrides: &HashMap<String, TomlValue>,
) -> Result<()> {
    for (key, value) in overrides {
        apply_config_value(config, key, &toml_value_to_string(value))?;
    }
    Ok(())
}

fn toml_value_to_string(value: &TomlValue) -> String {
    match value {
        TomlValue::String(s) => s.clone(),
        TomlValue::Array(items) => items
            .iter()
            .map(toml_value_to_string)
            .collect::<Vec<_>>()
            .join(","),
        other => other.to_string(),
    }
}

const SCALAR_KEYS: &[&str] = &[
    "site_name",
    "site_phone",
    "site_location",
    "business_description",
    "model",
    "posts_per_day",
    "schedule_times",
    "fallback_keywords",
    "contact_page",
    "index_marker",
    "api_base",
    "request_timeout_secs",
    "poll_interval_secs",
    "git_sync",
    "log_file",
    "paths.site_root",
    "paths.posts_dir",
    "paths.index_file",
    "paths.ledger_file",
    "paths.template_file",
];

fn is_known_key(key: &str) -> bool {
    SCALAR_KEYS.contains(&key)
}

fn apply_config_value(
    config: &mut Config,
    key: &str,
    value: &str,
) -> Result<()> {
    let value = value.trim().to_string();
    match key {
        "site_name" => config.site_name = value,
        "site_phone" => config.site_phone = value,
        "site_location" => config.site_location = value,
        "business_description" => config.business_description = value,
        "model" => config.model = value,
        "posts_per_day" => {
            config.posts_per_day = parse_value(key, &value)?;
        }
        "schedule_times" => {
            config.schedule_times = value
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect();
        }
        "fallback_keywords" => config.fallback_keywords = Some(value),
        "contact_page" => config.contact_page = value,
        "index_marker" => config.index_marker = value,
        "api_base" => config.api_base = value,
        "request_timeout_secs" => {
            config.request_timeout_secs = parse_value(key, &value)?;
        }
        "poll_interval_secs" => {
            config.poll_interval_secs = parse_value(key, &value)?;
        }
        "git_sync" => config.git_sync = parse_value(key, &value)?,
        "log_file" => config.log_file = Some(PathBuf::from(value)),
        _ => {
            if let Some(("paths", path_key)) = key.split_once('.') {
                let path = PathBuf::from(value);
                match path_key {
                    "site_root" => config.paths.site_root = path,
                    "posts_dir" => config.paths.posts_dir = path,
                    "index_file" => config.paths.index_file = path,
                    "ledger_file" => config.paths.ledger_file = path,
                    "template_file" => config.paths.template_file = path,
                    _ => {
                        return Err(PostFlowError::config_error(
                            format!("Unknown path key: {}", path_key),
                            None,
                        ))
                    }
                }
            } else {
                return Err(PostFlowError::config_error(
                    format!("Unknown configuration key: {}", key),
                    None,
                ));
            }
        }
    }
    Ok(())
}

fn parse_value<T>(key: &str, value: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value.parse().map_err(|e: T::Err| {
        PostFlowError::config_error(
            format!("Invalid {} value '{}': {}", key, value, e),
            None,
        )
    })
}

fn validate_config(config: &Config) -> Result<()> {
    for (name, value) in [
        ("site_name", &config.site_name),
        ("site_phone", &config.site_phone),
        ("site_location", &config.site_location),
        ("model", &config.model),
        ("index_marker", &config.index_marker),
        ("api_base", &config.api_base),
    ] {
        if value.trim().is_empty() {
            return Err(PostFlowError::config_error(
                format!("{} must not be empty", name),
                None,
            ));
        }
    }

    if config.posts_per_day == 0 {
        return Err(PostFlowError::config_error(
            "posts_per_day must be at least 1",
            None,
        ));
    }

    if config.schedule_times.is_empty() {
        return Err(PostFlowError::config_error(
            "schedule_times must list at least one time",
            None,
        ));
    }
    let _ = config.schedule()?;

    if config.request_timeout_secs == 0 || config.poll_interval_secs == 0 {
        return Err(PostFlowError::config_error(
            "request_timeout_secs and poll_interval_secs must be positive",
            None,
        ));
    }

    if config.site_pages().get(&config.contact_page).is_none() {
        return Err(PostFlowError::config_error(
            format!(
                "contact_page '{}' is not in the site page directory",
                config.contact_page
            ),
            None,
        ));
    }

    Ok(())
}

// Default value functions
fn default_true() -> bool {
    true
}

fn default_business_description() -> String {
    "a licensed local service company".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_posts_per_day() -> u32 {
    2
}

fn default_schedule_times() -> Vec<String> {
    vec!["08:00".to_string(), "18:00".to_string()]
}

fn default_categories() -> Vec<String> {
    [
        "Trenchless Technology",
        "Sewer Lines",
        "Drain Cleaning",
        "Water Heaters",
        "Gas Lines",
        "Emergency Tips",
        "Plumbing Tips",
        "Home Maintenance",
        "Repiping",
        "DIY & Prevention",
        "Our Services",
        "Company News",
    ]
    .iter()
    .map(|s| (*s).to_string())
    .collect()
}

fn default_contact_page() -> String {
    "contact".to_string()
}

fn default_index_marker() -> String {
    r#"<div class="blog__grid">"#.to_string()
}

fn default_api_base() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_request_timeout_secs() -> u64 {
    120
}

fn default_poll_interval_secs() -> u64 {
    30
}

fn default_site_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_posts_dir() -> PathBuf {
    PathBuf::from("posts")
}

fn default_index_file() -> PathBuf {
    PathBuf::from("blog.html")
}

fn default_ledger_file() -> PathBuf {
    PathBuf::from("automation/generated_posts.json")
}

fn default_template_file() -> PathBuf {
    PathBuf::from("automation/post_template.html")
}
