use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Builds the fixed instructional prompt embedding the user's raw spoken
/// feedback. The proxy forwards it to the generation API unchanged.
pub fn build_feedback_prompt(raw_feedback: &str) -> String {
    format!(
        "Act as a senior McKinsey partner. Convert this raw verbal feedback for a case \
         interview into a structured, professional evaluation card (HTML format only, no \
         markdown). Use <h3> for sections (Key Strengths, Areas for Improvement) and \
         <ul><li> for points. Keep it encouraging but sharp. Feedback: \"{raw_feedback}\""
    )
}

/// Removes fenced-code-block delimiters the model sometimes wraps around the
/// generated markup.
pub fn strip_code_fences(markup: &str) -> String {
    markup.replace("```html", "").replace("```", "")
}

#[derive(Debug, Serialize)]
struct FeedbackRequest<'a> {
    prompt: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

/// Every failure mode here is upstream from the session's point of view: the
/// caller shows a retry affordance and leaves the rest of the session alone.
#[derive(Debug, thiserror::Error)]
pub enum FeedbackError {
    #[error("feedback request failed: {0}")]
    Transport(String),
    #[error("feedback endpoint returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("failed to parse feedback response: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("feedback response did not contain generated content")]
    MissingContent,
}

/// Parses the proxied candidate/content/parts response body and returns the
/// generated markup with code fences stripped.
pub fn parse_feedback_body(body: &str) -> Result<String, FeedbackError> {
    let response: GenerateResponse = serde_json::from_str(body)?;
    let part = response
        .candidates
        .into_iter()
        .next()
        .and_then(|candidate| candidate.content)
        .and_then(|content| content.parts.into_iter().next())
        .ok_or(FeedbackError::MissingContent)?;
    Ok(strip_code_fences(&part.text))
}

/// Blocking client for the feedback proxy. Stateless; calling `generate`
/// again with the same text simply redoes the round trip.
#[derive(Debug, Clone)]
pub struct FeedbackClient {
    agent: ureq::Agent,
    endpoint: String,
}

impl FeedbackClient {
    pub fn new(endpoint: impl Into<String>) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(Duration::from_secs(10))
            .timeout_read(Duration::from_secs(60))
            .build();
        Self {
            agent,
            endpoint: endpoint.into(),
        }
    }

    pub fn generate(&self, raw_feedback: &str) -> Result<String, FeedbackError> {
        let prompt = build_feedback_prompt(raw_feedback);
        let response = self
            .agent
            .post(&self.endpoint)
            .send_json(FeedbackRequest { prompt: &prompt });
        match response {
            Ok(response) => {
                let body = response
                    .into_string()
                    .map_err(|err| FeedbackError::Transport(err.to_string()))?;
                parse_feedback_body(&body)
            }
            Err(ureq::Error::Status(status, response)) => {
                let body = response.into_string().unwrap_or_default();
                Err(FeedbackError::Status { status, body })
            }
            Err(err) => Err(FeedbackError::Transport(err.to_string())),
        }
    }
}
