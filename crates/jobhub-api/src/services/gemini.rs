//! Gemini client that rewrites job descriptions.
//!
//! Tries each model in [`MODELS`] in turn and returns the first usable
//! answer.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use jobhub_models::Job;

use crate::error::{ApiError, ApiResult};

/// Models tried in order.
pub const MODELS: &[&str] = &["gemini-2.5-flash", "gemini-2.5-flash-lite"];

/// Gemini API request.
#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct Part {
    text: String,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    #[serde(rename = "responseMimeType")]
    response_mime_type: String,
    temperature: f32,
}

/// Gemini API response.
#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: ResponseContent,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: String,
}

/// Gemini API client for job description enrichment.
#[derive(Clone)]
pub struct GeminiEnricher {
    api_key: String,
    base_url: String,
    client: Client,
}

impl GeminiEnricher {
    pub fn new(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> ApiResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::internal(format!("Failed to build Gemini client: {}", e)))?;

        Ok(Self {
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    /// Write an enhanced description for `job`.
    pub async fn enhance(&self, job: &Job) -> ApiResult<String> {
        let prompt = build_enrichment_prompt(job);
        let mut last_error = None;

        for model in MODELS {
            match self.call_gemini_api(model, &prompt).await {
                Ok(text) => {
                    info!(job_id = %job.id, model = %model, "Generated enhanced description");
                    return Ok(text);
                }
                Err(e) => {
                    warn!(job_id = %job.id, model = %model, "Gemini call failed: {}", e);
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| ApiError::upstream("All Gemini models failed")))
    }

    async fn call_gemini_api(&self, model: &str, prompt: &str) -> ApiResult<String> {
        let url = format!("{}/models/{}:generateContent", self.base_url, model);

        let request = GeminiRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "text/plain".to_string(),
                temperature: 0.4,
            },
        };

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| ApiError::upstream(format!("Gemini API request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(ApiError::upstream(format!(
                "Gemini API returned {}: {}",
                status, error_text
            )));
        }

        let gemini_response: GeminiResponse = response
            .json()
            .await
            .map_err(|e| ApiError::upstream(format!("Failed to parse Gemini response: {}", e)))?;

        let text = gemini_response
            .candidates
            .first()
            .and_then(|c| c.content.parts.first())
            .map(|p| strip_code_fence(&p.text))
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ApiError::upstream("No content in Gemini response"))?;

        Ok(text.to_string())
    }
}

/// Drop a surrounding markdown code fence if the model added one.
fn strip_code_fence(text: &str) -> &str {
    let text = text.trim();
    let Some(inner) = text.strip_prefix("```") else {
        return text;
    };
    // Skip an optional language tag on the opening fence line
    let inner = inner.split_once('\n').map(|(_, rest)| rest).unwrap_or(inner);
    inner.strip_suffix("```").unwrap_or(inner).trim()
}

/// Build the prompt asking for a rewritten job description.
pub fn build_enrichment_prompt(job: &Job) -> String {
    let mut prompt = String::from(
        "You are an editor for a job board. Rewrite the job posting below into a clear, \
         well-structured description for candidates.\n\n",
    );

    prompt.push_str(&format!("Title: {}\n", job.title));
    if !job.company.is_empty() {
        prompt.push_str(&format!("Company: {}\n", job.company));
    }
    if !job.location.is_empty() {
        prompt.push_str(&format!("Location: {}\n", job.location));
    }
    if let Some(job_type) = &job.job_type {
        prompt.push_str(&format!("Type: {}\n", job_type));
    }
    if let Some(salary) = &job.salary {
        prompt.push_str(&format!("Salary: {}\n", salary));
    }
    prompt.push_str("\nOriginal description:\n");
    prompt.push_str(&job.description);

    prompt.push_str(
        "\n\nWrite plain text with short sections: About the role, Responsibilities, \
         Requirements, Benefits. Do not invent salary figures or benefits that are not \
         stated. Return only the description.",
    );
    prompt
}
