//! OpenAI-compatible chat-completions client
use crate::config::SummaryConfig;
use crate::error::RustyTrendsError;
use crate::summary::Prompt;
use crate::summary::SummaryError;
use crate::summary::SummaryGenerator;
use crate::tables::metrics::Corroborator;
use regex::Regex;
use serde::Deserialize;
use serde::Serialize;
use std::sync::LazyLock;
use std::time::Duration;
use tracing::debug;

/// Persona used for corroborating calculations.
const CALCULATION_SYSTEM_PROMPT: &str =
    "You are a mathematical calculation assistant. Provide accurate numerical results only.";
const CALCULATION_TEMPERATURE: f32 = 0.2;
const CALCULATION_MAX_TOKENS: u32 = 500;

static NUMBER_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-?\d+\.?\d*").expect("Hardcode regex pattern"));

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

/// Blocking client for a chat-completions endpoint such as OpenRouter.
#[derive(Clone, Debug)]
pub struct ChatClient {
    endpoint: String,
    model: String,
    api_key: String,
    temperature: f32,
    max_tokens: u32,
    /// Timeout for corroboration calls
    timeout: Duration,
}

impl ChatClient {
    pub fn new(endpoint: &str, model: &str, api_key: &str) -> Self {
        let defaults = SummaryConfig::default();
        ChatClient {
            endpoint: endpoint.to_owned(),
            model: model.to_owned(),
            api_key: api_key.to_owned(),
            temperature: defaults.temperature,
            max_tokens: defaults.max_tokens,
            timeout: defaults.timeout(),
        }
    }

    /// Builds a client from configuration; fails when the API key variable is unset.
    pub fn from_config(config: &SummaryConfig) -> Result<Self, SummaryError> {
        let api_key = config.api_key()?;
        Ok(ChatClient {
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            timeout: config.timeout(),
            ..ChatClient::new(&config.endpoint, &config.model, &api_key)
        })
    }

    fn complete(
        &self,
        system: &str,
        user: &str,
        temperature: f32,
        max_tokens: u32,
        timeout: Duration,
    ) -> Result<String, SummaryError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|error| SummaryError::Network(error.to_string()))?;
        let request = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage { role: "system", content: system },
                ChatMessage { role: "user", content: user },
            ],
            temperature,
            max_tokens,
        };

        debug!(endpoint = self.endpoint.as_str(), model = self.model.as_str(), "Sending chat completion");
        let response = client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .map_err(|error| to_summary_error(error, timeout))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SummaryError::Status {
                code: status.as_u16(),
                body: response.text().unwrap_or_default(),
            });
        }

        let body: ChatResponse = response
            .json()
            .map_err(|error| {
                if error.is_timeout() {
                    SummaryError::Timeout(timeout)
                } else {
                    SummaryError::Malformed(error.to_string())
                }
            })?;
        let content = body
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| SummaryError::Malformed("no choices in response".to_owned()))?
            .message
            .content
            .unwrap_or_default();
        let content = content.trim();
        if content.is_empty() {
            Err(SummaryError::Empty)
        } else {
            Ok(content.to_owned())
        }
    }

    fn calculate(&self, question: &str) -> Result<f64, RustyTrendsError> {
        let answer = self.complete(
            CALCULATION_SYSTEM_PROMPT,
            question,
            CALCULATION_TEMPERATURE,
            CALCULATION_MAX_TOKENS,
            self.timeout,
        )?;
        let number = first_number(&answer)
            .ok_or_else(|| SummaryError::Malformed(format!("no number in '{answer}'")))?;
        Ok(number)
    }
}

fn to_summary_error(error: reqwest::Error, timeout: Duration) -> SummaryError {
    if error.is_timeout() {
        SummaryError::Timeout(timeout)
    } else {
        SummaryError::Network(error.to_string())
    }
}

/// First decimal number appearing in free text.
fn first_number(text: &str) -> Option<f64> {
    NUMBER_PATTERN
        .find(text)
        .and_then(|found| found.as_str().parse::<f64>().ok())
}

impl SummaryGenerator for ChatClient {
    fn generate_summary(&self, prompt: &Prompt, timeout: Duration) -> Result<String, SummaryError> {
        self.complete(&prompt.system, &prompt.user, self.temperature, self.max_tokens, timeout)
    }
}

impl Corroborator for ChatClient {
    fn total(&self, values: &[f64]) -> Result<f64, RustyTrendsError> {
        let values = values.iter().map(f64::to_string).collect::<Vec<_>>().join(", ");
        self.calculate(&format!(
            "Calculate the sum of these numbers: {values}. Return only the numeric result."
        ))
    }

    fn yoy_percent(&self, previous: f64, current: f64) -> Result<f64, RustyTrendsError> {
        self.calculate(&format!(
            "Calculate year-over-year percentage change. Previous year: {previous}, current year: {current}. \
             Formula: ((current - previous) / previous) * 100. Return only the numeric result."
        ))
    }
}
