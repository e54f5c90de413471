// Copyright © 2024 PostFlow. All rights reserved.
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! OpenAI chat-completions client.
//!
//! One blocking `POST {api_base}/chat/completions` per call. No retries:
//! a failed request fails the pipeline run and the next scheduled run
//! tries again.

use std::env;
use std::fmt;
use std::time::Duration;

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

use crate::core::config::Config;
use crate::core::error::{PostFlowError, Result};
use crate::core::traits::{CompletionRequest, TextGenerator};

/// Environment variable holding the API key.
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Message role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Framing instructions.
    System,
    /// The request.
    User,
    /// A model answer.
    Assistant,
}

/// A message in the conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Who is speaking.
    pub role: Role,
    /// Message text; absent on some refusals.
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

/// Request body for the chat-completions endpoint
#[derive(Debug, Serialize)]
struct ApiRequest<'a> {
    model: &'a str,
    messages: Vec<Message>,
    temperature: f32,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

/// Client for an OpenAI-compatible chat-completions API.
pub struct OpenAiClient {
    client: Client,
    api_key: String,
    api_base: String,
    model: String,
}

impl fmt::Debug for OpenAiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiClient")
            .field("api_base", &self.api_base)
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

impl OpenAiClient {
    /// Creates a client with the given key, endpoint, model and timeout.
    pub fn new(
        api_key: impl Into<String>,
        api_base: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build().map_err(|e| {
            PostFlowError::generation_error(
                "failed to build HTTP client",
                Some(Box::new(e)),
            )
        })?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            api_base: api_base.into().trim_end_matches('/').to_string(),
            model: model.into(),
        })
    }

    /// Creates a client from `config`, reading the key from [`API_KEY_ENV`].
    ///
    /// # Errors
    ///
    /// Returns `MissingCredential` if the variable is unset or empty.
    pub fn from_env(config: &Config) -> Result<Self> {
        let api_key = env::var(API_KEY_ENV)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| PostFlowError::MissingCredential(API_KEY_ENV.to_string()))?;
        Self::new(
            api_key,
            config.api_base.clone(),
            config.model.clone(),
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.api_base)
    }

    fn build_request<'a>(&'a self, request: &CompletionRequest) -> ApiRequest<'a> {
        ApiRequest {
            model: &self.model,
            messages: vec![
                Message {
                    role: Role::System,
                    content: Some(request.system.clone()),
                },
                Message {
                    role: Role::User,
                    content: Some(request.user.clone()),
                },
            ],
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            response_format: request
                .json_response
                .then_some(ResponseFormat { kind: "json_object" }),
        }
    }
}

impl TextGenerator for OpenAiClient {
    fn complete(&self, request: &CompletionRequest) -> Result<String> {
        let body = self.build_request(request);
        log::debug!(
            "Requesting completion from {} (model {}, max_tokens {})",
            self.api_base,
            self.model,
            request.max_tokens
        );

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .map_err(|e| {
                PostFlowError::generation_error("request failed", Some(Box::new(e)))
            })?;

        let status = response.status();
        let text = response.text().map_err(|e| {
            PostFlowError::generation_error(
                "failed to read response body",
                Some(Box::new(e)),
            )
        })?;

        if !status.is_success() {
            return Err(PostFlowError::generation_error(
                format!("service returned {}: {}", status, error_message(&text)),
                None,
            ));
        }

        extract_text(&text)
    }
}

fn error_message(body: &str) -> String {
    serde_json::from_str::<ApiErrorBody>(body)
        .map(|b| b.error.message)
        .unwrap_or_else(|_| body.chars().take(200).collect())
}

/// Pulls the first answer's text out of a chat-completions response body.
fn extract_text(body: &str) -> Result<String> {
    let response: ApiResponse = serde_json::from_str(body).map_err(|e| {
        PostFlowError::malformed_response(
            "response is not a chat completion",
            Some(Box::new(e)),
        )
    })?;

    response
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .map(|text| text.trim().to_string())
        .ok_or_else(|| {
            PostFlowError::malformed_response("response contains no message text", None)
        })
}
