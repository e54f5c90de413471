// Copyright © 2024 PostFlow. All rights reserved.
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! # Error Handling for PostFlow
//!
//! This module defines the error type shared by every stage of the post
//! pipeline. The `thiserror` crate keeps the variants declarative; each
//! variant maps to one failure class of a pipeline run.

use std::path::PathBuf;
use thiserror::Error;

/// A unified result type for the PostFlow library.
pub type Result<T> = std::result::Result<T, PostFlowError>;

/// The main error type for PostFlow, encompassing all potential error cases.
///
/// Every variant is fatal to the pipeline run that produced it. Version
/// control problems are deliberately absent: they are reported through
/// [`SyncOutcome`](crate::core::traits::SyncOutcome) and never abort a run.
#[derive(Error, Debug)]
pub enum PostFlowError {
    /// Error related to configuration loading or validation.
    #[error("Configuration error: {message}.")]
    ConfigError {
        /// Detailed description of the configuration error.
        message: String,
        /// Optional path of the configuration file that caused the error.
        path: Option<PathBuf>,
    },

    /// A required secret is absent from the environment.
    #[error("Missing credential: environment variable `{0}` is not set.")]
    MissingCredential(String),

    /// The text-generation service could not be reached or refused the request.
    #[error("Generation service error: {message}.")]
    GenerationError {
        /// Description of the service failure.
        message: String,
        /// Optional source error providing additional context, if available.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The service answered, but the answer is not a usable post or topic.
    #[error("Malformed generation response: {message}.")]
    MalformedResponse {
        /// Description of what was wrong with the response.
        message: String,
        /// Optional source error providing additional context, if available.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A post with the same slug has already been published.
    #[error("Duplicate slug `{0}`: a post with this identifier already exists.")]
    DuplicateSlug(String),

    /// The site index does not contain the insertion marker.
    #[error("Index marker `{marker}` not found in {path:?}.")]
    IndexMarkerNotFound {
        /// Path of the site index document.
        path: PathBuf,
        /// The marker that was searched for.
        marker: String,
    },

    /// The ledger file could not be parsed or serialised.
    #[error("Ledger error at {path:?}: {message}.")]
    LedgerError {
        /// Path of the ledger file.
        path: PathBuf,
        /// Description of the ledger error.
        message: String,
        /// Optional source error providing additional context, if available.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// IO error encountered during file operations.
    #[error("File IO error at `{path:?}`: {source}")]
    IOError {
        /// Path associated with the IO error.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

impl PostFlowError {
    /// Creates a `ConfigError` with a specific message.
    pub fn config_error<S: Into<String>>(
        message: S,
        path: Option<PathBuf>,
    ) -> Self {
        PostFlowError::ConfigError {
            message: message.into(),
            path,
        }
    }

    /// Creates a `GenerationError` with a message and optional source.
    pub fn generation_error<S: Into<String>>(
        message: S,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        PostFlowError::GenerationError {
            message: message.into(),
            source,
        }
    }

    /// Creates a `MalformedResponse` with a message and optional source.
    pub fn malformed_response<S: Into<String>>(
        message: S,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        PostFlowError::MalformedResponse {
            message: message.into(),
            source,
        }
    }

    /// Creates a `LedgerError` for the given ledger path.
    pub fn ledger_error<S: Into<String>>(
        path: PathBuf,
        message: S,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        PostFlowError::LedgerError {
            path,
            message: message.into(),
            source,
        }
    }

    /// Wraps an IO error as an `IOError` variant with the specified path.
    pub fn io_error(path: PathBuf, source: std::io::Error) -> Self {
        PostFlowError::IOError { path, source }
    }

    /// Returns `true` for failures that are an expected outcome of normal
    /// operation rather than a fault.
    ///
    /// A duplicate slug means another run already published the same
    /// title, so callers log it as a warning instead of an error.
    pub fn is_expected(&self) -> bool {
        matches!(self, PostFlowError::DuplicateSlug(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_slug_is_expected() {
        assert!(PostFlowError::DuplicateSlug("a".into()).is_expected());
        assert!(!PostFlowError::MissingCredential("KEY".into())
            .is_expected());
    }

    #[test]
    fn test_display_messages() {
        let err = PostFlowError::IndexMarkerNotFound {
            path: PathBuf::from("blog.html"),
            marker: "<div>".into(),
        };
        assert_eq!(
            err.to_string(),
            "Index marker `<div>` not found in \"blog.html\"."
        );

        let err = PostFlowError::MissingCredential("OPENAI_API_KEY".into());
        assert!(err.to_string().contains("OPENAI_API_KEY"));
    }
}
