use crate::models::RankedCandidate;
use crate::services::{http_client, ProviderError};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::fmt::Write;
use std::time::Duration;

/// Returned in place of a generated summary when generation fails
pub const FALLBACK_SUMMARY: &str =
    "Warehouses are ranked by tier (Gold, then Silver, then Bronze), then by driving time and distance.";

/// Produces a narrative explanation of a ranked list
#[async_trait]
pub trait SummaryGenerator: Send + Sync {
    async fn summarize(&self, ranked: &[RankedCandidate]) -> Result<String, ProviderError>;
}

/// Google Gemini `generateContent` client
pub struct GeminiSummarizer {
    base_url: String,
    api_key: String,
    model: String,
    client: Client,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<GenerateCandidate>,
}

#[derive(Debug, Deserialize)]
struct GenerateCandidate {
    content: Content,
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

impl GeminiSummarizer {
    pub fn new(
        base_url: String,
        api_key: String,
        model: String,
        timeout: Duration,
    ) -> Result<Self, ProviderError> {
        if api_key.is_empty() {
            return Err(ProviderError::MissingCredentials("Gemini API key".into()));
        }

        Ok(Self {
            base_url,
            api_key,
            model,
            client: http_client(timeout)?,
        })
    }
}

/// Build the ranking explanation prompt
pub fn build_prompt(ranked: &[RankedCandidate]) -> String {
    let mut prompt = String::from(
        "You are analyzing warehouse rankings for logistics optimization.\n\
         The warehouses below are already sorted by priority.\n\n",
    );

    let total = ranked.len();
    for (idx, wh) in ranked.iter().enumerate() {
        let _ = writeln!(
            prompt,
            "Rank {} of {}: {} ({}, {}) | Tier: {} | Distance: {:.1} miles | Driving time: {:.0} minutes | Missing fields: {}",
            idx + 1,
            total,
            wh.id,
            wh.fields.city.as_deref().unwrap_or("unknown city"),
            wh.fields.state.as_deref().unwrap_or("unknown state"),
            wh.fields.tier.as_deref().unwrap_or("none"),
            wh.distance_miles,
            wh.duration_minutes,
            wh.missing_fields.len(),
        );
    }

    prompt.push_str(
        "\nExplain briefly (3-5 sentences) why the warehouses are ordered this way. \
         Highlight tier first (Gold > Silver > Bronze), then driving time and distance. \
         Be factual, concise, and businesslike.",
    );
    prompt
}

#[async_trait]
impl SummaryGenerator for GeminiSummarizer {
    async fn summarize(&self, ranked: &[RankedCandidate]) -> Result<String, ProviderError> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        );

        let payload = json!({
            "contents": [{ "parts": [{ "text": build_prompt(ranked) }] }]
        });

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ProviderError::ApiError(format!(
                "Summary generation failed: {}",
                response.status()
            )));
        }

        let body: GenerateResponse = response.json().await?;

        let text = body
            .candidates
            .first()
            .map(|c| {
                c.content
                    .parts
                    .iter()
                    .map(|p| p.text.as_str())
                    .collect::<String>()
            })
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ProviderError::InvalidResponse("Summary response had no text".into()))?;

        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FacilityFields;
    use std::collections::BTreeSet;

    fn ranked(id: &str, tier: &str) -> RankedCandidate {
        RankedCandidate {
            id: id.to_string(),
            fields: FacilityFields {
                city: Some("Newark".to_string()),
                state: Some("NJ".to_string()),
                tier: Some(tier.to_string()),
                ..Default::default()
            },
            created_time: None,
            distance_miles: 12.34,
            duration_minutes: 21.0,
            tier_rank: 0,
            missing_fields: BTreeSet::new(),
            has_missing_fields: false,
        }
    }

    #[test]
    fn test_prompt_lists_every_rank() {
        let prompt = build_prompt(&[ranked("rec1", "Gold"), ranked("rec2", "Silver")]);
        assert!(prompt.contains("Rank 1 of 2: rec1 (Newark, NJ) | Tier: Gold | Distance: 12.3 miles"));
        assert!(prompt.contains("Rank 2 of 2: rec2"));
        assert!(prompt.contains("Gold > Silver > Bronze"));
    }

    #[tokio::test]
    async fn test_extracts_text() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1beta/models/gemini-1.5-flash:generateContent")
            .match_header("x-goog-api-key", "key")
            .with_body(r#"{"candidates": [{"content": {"parts": [{"text": "  Gold first.  "}]}}]}"#)
            .create_async()
            .await;

        let summarizer = GeminiSummarizer::new(
            server.url(),
            "key".into(),
            "gemini-1.5-flash".into(),
            Duration::from_secs(5),
        )
        .unwrap();

        let text = summarizer.summarize(&[ranked("rec1", "Gold")]).await.unwrap();
        assert_eq!(text, "Gold first.");
    }

    #[tokio::test]
    async fn test_empty_candidates_is_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", mockito::Matcher::Any)
            .with_body(r#"{"candidates": []}"#)
            .create_async()
            .await;

        let summarizer = GeminiSummarizer::new(
            server.url(),
            "key".into(),
            "gemini-1.5-flash".into(),
            Duration::from_secs(5),
        )
        .unwrap();

        assert!(summarizer.summarize(&[]).await.is_err());
    }
}
