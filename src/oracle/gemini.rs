//! HTTP move oracle speaking the Gemini `generateContent` API.

use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use serde::{Deserialize, Serialize};

use super::client::{MoveOracle, OracleRequest};
use crate::error::{ChessError, Result};

pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Fixed instruction sent ahead of every position
pub const INSTRUCTION: &str = "You are a chess grandmaster. You will be given a FEN string describing \
the current position. Reply with only the single best move for the side to move, in coordinate \
notation: origin square, destination square and an optional promotion letter (for example e2e4, \
g1f3 or e7e8q). Do not add any other text, explanation or formatting.";

const FALLBACK_ERROR: &str = "Failed to fetch from LLM";

#[derive(Debug, Serialize)]
struct GenerateRequest {
    contents: Vec<RequestContent>,
}

#[derive(Debug, Serialize)]
struct RequestContent {
    parts: Vec<RequestPart>,
}

#[derive(Debug, Serialize)]
struct RequestPart {
    text: String,
}

#[derive(Debug, Default, Deserialize)]
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
struct ErrorEnvelope {
    error: Option<ErrorBody>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

pub fn build_prompt(position: &str) -> String {
    format!("{}\n\nFEN: {}", INSTRUCTION, position)
}

fn request_body(position: &str) -> GenerateRequest {
    GenerateRequest {
        contents: vec![RequestContent {
            parts: vec![RequestPart {
                text: build_prompt(position),
            }],
        }],
    }
}

/// Text of the first part of the first candidate; empty when absent
fn reply_text(response: GenerateResponse) -> String {
    response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .and_then(|c| c.parts.into_iter().next())
        .and_then(|p| p.text)
        .unwrap_or_default()
}

fn unavailable(e: reqwest::Error) -> ChessError {
    ChessError::SuggestionUnavailable(e.to_string())
}

pub struct GeminiOracle {
    http: reqwest::Client,
    base_url: String,
}

impl GeminiOracle {
    pub fn new() -> Self {
        GeminiOracle {
            http: reqwest::Client::new(),
            base_url: GEMINI_BASE_URL.to_string(),
        }
    }

    /// Oracle whose HTTP requests give up after `timeout`
    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build().map_err(unavailable)?;
        Ok(GeminiOracle {
            http,
            base_url: GEMINI_BASE_URL.to_string(),
        })
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base_url, model)
    }
}

impl Default for GeminiOracle {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MoveOracle for GeminiOracle {
    async fn ask(&self, request: &OracleRequest) -> Result<String> {
        debug!("POST {}", self.endpoint(&request.model));

        let response = self
            .http
            .post(self.endpoint(&request.model))
            .query(&[("key", request.credential.as_str())])
            .json(&request_body(&request.position))
            .send()
            .await
            .map_err(unavailable)?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<ErrorEnvelope>()
                .await
                .ok()
                .and_then(|envelope| envelope.error)
                .and_then(|body| body.message)
                .unwrap_or_else(|| FALLBACK_ERROR.to_string());
            return Err(ChessError::SuggestionUnavailable(format!("{} (HTTP {})", message, status)));
        }

        let body: GenerateResponse = response.json().await.map_err(unavailable)?;
        Ok(reply_text(body))
    }
}
