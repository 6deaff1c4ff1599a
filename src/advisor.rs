//! Advice client: turns a spending digest into a prompt, sends it to a
//! text-generation service and masks rate limits and transient failures with
//! a bounded, fixed-backoff retry loop.
//!
//! The network call sits behind [`GenerativeModel`] and the wait between
//! attempts behind [`Sleeper`], so the retry behaviour can be exercised
//! without a network or a real clock.

use std::time::Duration;

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::{AdvisorError, Result};

pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

pub const QUOTA_MESSAGE: &str = "You've reached the usage limit of the advice service. \
Please try again later or upgrade your API quota.";
pub const MALFORMED_MESSAGE: &str =
    "The advice service returned a response without any text. Please try again.";

// ============================================================================
// Service seam
// ============================================================================

/// One failed call to the text-generation service, already classified.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    #[error("quota exhausted: {0}")]
    QuotaExhausted(String),

    #[error("transient service error: {0}")]
    Transient(String),

    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("{0}")]
    Other(String),
}

/// A single prompt-in, text-out network operation.
pub trait GenerativeModel: Send + Sync {
    fn generate(&self, prompt: &str) -> std::result::Result<String, ServiceError>;

    /// Model name for logging.
    fn name(&self) -> &str;
}

pub trait Sleeper: Send + Sync {
    fn sleep(&self, duration: Duration);
}

/// Blocks the calling thread.
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

// ============================================================================
// Errors + retry policy
// ============================================================================

/// Terminal outcome of a whole advice request (after any retries).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AdviceError {
    #[error("quota still exhausted after {attempts} attempts")]
    QuotaExhausted { attempts: u32 },

    #[error("all {attempts} attempts failed, last error: {last}")]
    RetryExhausted { attempts: u32, last: String },

    #[error("malformed response from advice service: {0}")]
    MalformedResponse(String),

    #[error("advice service error: {0}")]
    Service(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first one. Zero is treated as one.
    pub max_attempts: u32,
    /// Fixed wait between consecutive attempts.
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Duration::from_secs(20),
        }
    }
}

// ============================================================================
// Prompt
// ============================================================================

pub fn build_prompt(summary: &str, context: Option<&str>) -> String {
    let mut prompt = String::from(
        "You are a smart financial advisor AI.\n\n\
         Given the following user's UPI spending breakdown:\n\n",
    );
    prompt.push_str(summary);
    prompt.push_str("\n\n");
    if let Some(ctx) = context.map(str::trim).filter(|c| !c.is_empty()) {
        prompt.push_str("Additional context from the user: ");
        prompt.push_str(ctx);
        prompt.push_str("\n\n");
    }
    prompt.push_str(
        "Please provide:\n\
         - A 2-line budget health overview\n\
         - 2 unnecessary spending patterns with tips to reduce\n\
         - Suggestions for better financial control\n\
         - A brief motivational note on financial discipline\n\n\
         Keep it personal, clear, and concise. Use bullet points if needed. \
         Keep it short and actionable.",
    );
    prompt
}

// ============================================================================
// AdviceClient
// ============================================================================

pub struct AdviceClient {
    model: Box<dyn GenerativeModel>,
    policy: RetryPolicy,
    sleeper: Box<dyn Sleeper>,
}

impl AdviceClient {
    pub fn new(model: Box<dyn GenerativeModel>, policy: RetryPolicy) -> Self {
        Self::with_sleeper(model, policy, Box::new(ThreadSleeper))
    }

    pub fn with_sleeper(
        model: Box<dyn GenerativeModel>,
        policy: RetryPolicy,
        sleeper: Box<dyn Sleeper>,
    ) -> Self {
        Self {
            model,
            policy,
            sleeper,
        }
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Ask for advice, retrying quota and transient failures within the
    /// policy budget. Malformed responses and unclassified errors end the
    /// request on the first occurrence.
    pub fn try_generate(
        &self,
        summary: &str,
        context: Option<&str>,
    ) -> std::result::Result<String, AdviceError> {
        let prompt = build_prompt(summary, context);
        let attempts = self.policy.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;
            tracing::debug!(model = self.model.name(), attempt, "requesting advice");

            let err = match self.model.generate(&prompt) {
                Ok(text) => {
                    tracing::info!(model = self.model.name(), attempt, "advice generated");
                    return Ok(text.trim().to_string());
                }
                Err(e) => e,
            };

            match err {
                ServiceError::QuotaExhausted(_) | ServiceError::Transient(_) => {
                    if attempt >= attempts {
                        tracing::error!(attempts, error = %err, "advice retry budget exhausted");
                        return Err(match err {
                            ServiceError::QuotaExhausted(_) => {
                                AdviceError::QuotaExhausted { attempts }
                            }
                            other => AdviceError::RetryExhausted {
                                attempts,
                                last: other.to_string(),
                            },
                        });
                    }
                    tracing::warn!(
                        attempt,
                        max_attempts = attempts,
                        backoff_secs = self.policy.backoff.as_secs_f64(),
                        error = %err,
                        "advice request failed, backing off"
                    );
                    self.sleeper.sleep(self.policy.backoff);
                }
                ServiceError::MalformedResponse(msg) => {
                    tracing::error!(attempt, message = %msg, "malformed advice response");
                    return Err(AdviceError::MalformedResponse(msg));
                }
                ServiceError::Other(msg) => {
                    tracing::error!(attempt, message = %msg, "advice request failed");
                    return Err(AdviceError::Service(msg));
                }
            }
        }
    }

    /// Like [`try_generate`](Self::try_generate), but every failure is turned
    /// into a message fit to show the user in place of the advice.
    pub fn generate_recommendations(&self, summary: &str, context: Option<&str>) -> String {
        match self.try_generate(summary, context) {
            Ok(text) => text,
            Err(e) => user_message(&e),
        }
    }
}

pub fn user_message(err: &AdviceError) -> String {
    match err {
        AdviceError::QuotaExhausted { .. } => QUOTA_MESSAGE.to_string(),
        AdviceError::MalformedResponse(_) => MALFORMED_MESSAGE.to_string(),
        other => format!("An error occurred while generating recommendations: {other}"),
    }
}

// ============================================================================
// Gemini API
// ============================================================================

/// Connection settings for the Gemini `generateContent` endpoint. Built once
/// at startup and only read afterwards.
#[derive(Clone)]
pub struct AdviceConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub timeout: Duration,
}

impl std::fmt::Debug for AdviceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdviceConfig")
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<RequestContent<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestContent<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: Option<ApiErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: String,
}

/// Text of the first candidate, all parts joined. A body without any text is
/// malformed.
fn extract_text(body: &str) -> std::result::Result<String, ServiceError> {
    let parsed: GenerateResponse = serde_json::from_str(body)
        .map_err(|e| ServiceError::MalformedResponse(format!("undecodable body: {e}")))?;
    let text: String = parsed
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();
    if text.trim().is_empty() {
        return Err(ServiceError::MalformedResponse(
            "no text in first candidate".to_string(),
        ));
    }
    Ok(text)
}

fn classify_status(status: u16, body: &str) -> ServiceError {
    let detail = serde_json::from_str::<ApiErrorResponse>(body)
        .ok()
        .and_then(|e| e.error);
    let (api_status, message) = match detail {
        Some(d) => (d.status, d.message),
        None => (String::new(), body.trim().to_string()),
    };
    let message = format!("HTTP {status}: {message}");

    if status == 429 || api_status == "RESOURCE_EXHAUSTED" {
        ServiceError::QuotaExhausted(message)
    } else if matches!(status, 408 | 500 | 502 | 503 | 504) || api_status == "UNAVAILABLE" {
        ServiceError::Transient(message)
    } else {
        ServiceError::Other(message)
    }
}

fn classify_transport(err: &reqwest::Error) -> ServiceError {
    if err.is_timeout() || err.is_connect() {
        ServiceError::Transient(err.to_string())
    } else {
        ServiceError::Other(err.to_string())
    }
}

/// A 2xx reply whose body cannot be read is a bad answer, not a network hiccup.
fn classify_body_read(success: bool, transport: ServiceError) -> ServiceError {
    if success {
        let detail = match transport {
            ServiceError::QuotaExhausted(m)
            | ServiceError::Transient(m)
            | ServiceError::MalformedResponse(m)
            | ServiceError::Other(m) => m,
        };
        ServiceError::MalformedResponse(format!("unreadable body: {detail}"))
    } else {
        transport
    }
}

pub struct GeminiClient {
    client: Client,
    config: AdviceConfig,
}

impl GeminiClient {
    pub fn new(config: AdviceConfig) -> Result<Self> {
        if config.api_key.trim().is_empty() {
            return Err(AdvisorError::MissingApiKey);
        }
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            self.config.model
        )
    }
}

impl GenerativeModel for GeminiClient {
    fn generate(&self, prompt: &str) -> std::result::Result<String, ServiceError> {
        let request = GenerateRequest {
            contents: vec![RequestContent {
                parts: vec![RequestPart { text: prompt }],
            }],
        };

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.config.api_key)
            .json(&request)
            .send()
            .map_err(|e| classify_transport(&e))?;

        let status = response.status();
        let body = response
            .text()
            .map_err(|e| classify_body_read(status.is_success(), classify_transport(&e)))?;

        if !status.is_success() {
            let err = classify_status(status.as_u16(), &body);
            tracing::warn!(code = status.as_u16(), error = %err, "Gemini API error");
            return Err(err);
        }
        extract_text(&body)
    }

    fn name(&self) -> &str {
        &self.config.model
    }
}

// ============================================================================
// TESTS
// ============================================================================
