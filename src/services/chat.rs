use crate::config::{EmbeddingSettings, PersonalizationSettings};
use crate::core::parsing::format_gbp;
use crate::models::{Listing, PreferenceSchema};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur when calling the chat completions provider
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("API returned error: {0}")]
    ApiError(String),

    #[error("Unauthorized: invalid API key")]
    Unauthorized,

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

const SYSTEM_PROMPT: &str = "You are a skilled estate agent rewriting a property description for one buyer. \
Keep every price, address, size and other fact exactly as written and add no new facts. \
Lead with what matches the buyer's priorities, use their own words where it fits, \
and keep a professional tone. Reply with the description only.";

/// Client for an OpenAI-compatible `/chat/completions` endpoint
///
/// Used to polish the deterministic personalized description. Callers keep
/// the deterministic text whenever this fails.
pub struct ChatClient {
    base_url: String,
    api_key: Option<String>,
    model: String,
    max_tokens: u32,
    client: Client,
}

impl ChatClient {
    pub fn new(
        base_url: String,
        api_key: Option<String>,
        model: String,
        max_tokens: u32,
        timeout: Duration,
    ) -> Result<Self, ChatError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            base_url,
            api_key,
            model,
            max_tokens,
            client,
        })
    }

    /// Share the embedding provider's endpoint and key
    pub fn from_settings(
        provider: &EmbeddingSettings,
        settings: &PersonalizationSettings,
    ) -> Result<Self, ChatError> {
        Self::new(
            provider.endpoint.clone(),
            provider.api_key.clone(),
            settings.model.clone(),
            settings.max_tokens,
            Duration::from_secs(settings.timeout_secs),
        )
    }

    /// Rewrite `draft` for the buyer described by `prefs`
    pub async fn rewrite_description(
        &self,
        prefs: &PreferenceSchema,
        listing: &Listing,
        draft: &str,
    ) -> Result<String, ChatError> {
        let url = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));
        let prompt = rewrite_prompt(prefs, listing, draft);

        tracing::debug!("Requesting description rewrite for {} from: {}", listing.id, url);

        let mut request = self.client.post(&url).json(&ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage { role: "system", content: SYSTEM_PROMPT },
                ChatMessage { role: "user", content: &prompt },
            ],
            max_tokens: self.max_tokens,
            temperature: 0.7,
        });
        if let Some(api_key) = &self.api_key {
            request = request.bearer_auth(api_key);
        }

        let response = request.send().await?;

        match response.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => return Err(ChatError::Unauthorized),
            status if !status.is_success() => {
                let body = response.text().await.unwrap_or_default();
                return Err(ChatError::ApiError(format!("{}: {}", status, body)));
            }
            _ => {}
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| ChatError::InvalidResponse(format!("Failed to parse completion: {}", e)))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty())
            .ok_or_else(|| ChatError::InvalidResponse("empty completion".into()))
    }
}

fn rewrite_prompt(prefs: &PreferenceSchema, listing: &Listing, draft: &str) -> String {
    let mut prompt = format!(
        "Listing: {} in {} ({}), {} bedrooms, {} bathrooms, {}.\n\nDescription:\n{}\n\nBuyer preferences:\n",
        listing.property_type,
        listing.area,
        listing.postcode,
        listing.bedrooms,
        listing.bathrooms,
        format_gbp(listing.price),
        draft,
    );
    for line in prefs.summary() {
        prompt.push_str("- ");
        prompt.push_str(&line);
        prompt.push('\n');
    }
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn create_client(base_url: String) -> ChatClient {
        ChatClient::new(
            base_url,
            Some("test-key".to_string()),
            "gpt-4o-mini".to_string(),
            200,
            Duration::from_secs(5),
        )
        .unwrap()
    }

    fn create_listing() -> Listing {
        Listing {
            id: "peckham_1".to_string(),
            area: "Peckham".to_string(),
            postcode: "SE15 4QL".to_string(),
            price: 525_000,
            bedrooms: 2,
            bathrooms: 1,
            size_sqft: None,
            property_type: "flat".to_string(),
            description: "Bright flat. Near Peckham Rye station.".to_string(),
            area_description: String::new(),
            structured_amenities: BTreeSet::new(),
            structured_features: BTreeSet::new(),
            category: None,
        }
    }

    #[tokio::test]
    async fn test_rewrite_returns_first_choice() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/chat/completions")
            .match_header("authorization", "Bearer test-key")
            .match_body(mockito::Matcher::PartialJsonString(r#"{"model":"gpt-4o-mini"}"#.to_string()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"choices":[{"index":0,"message":{"role":"assistant","content":"  Steps from Peckham Rye station.  "}}]}"#)
            .create_async()
            .await;

        let client = create_client(server.url());
        let text = client
            .rewrite_description(&PreferenceSchema::default(), &create_listing(), "Near Peckham Rye station.")
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(text, "Steps from Peckham Rye station.");
    }

    #[tokio::test]
    async fn test_rewrite_unauthorized() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/chat/completions")
            .with_status(403)
            .create_async()
            .await;

        let client = create_client(server.url());
        let result = client
            .rewrite_description(&PreferenceSchema::default(), &create_listing(), "draft")
            .await;
        assert!(matches!(result, Err(ChatError::Unauthorized)));
    }

    #[tokio::test]
    async fn test_rewrite_empty_completion() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"choices":[]}"#)
            .create_async()
            .await;

        let client = create_client(server.url());
        let result = client
            .rewrite_description(&PreferenceSchema::default(), &create_listing(), "draft")
            .await;
        assert!(matches!(result, Err(ChatError::InvalidResponse(_))));
    }

    #[test]
    fn test_prompt_carries_facts_and_preferences() {
        let prefs = PreferenceSchema {
            preferred_areas: vec!["Peckham".to_string()],
            ..Default::default()
        };
        let prompt = rewrite_prompt(&prefs, &create_listing(), "Near Peckham Rye station.");

        assert!(prompt.contains("£525,000"));
        assert!(prompt.contains("SE15 4QL"));
        assert!(prompt.contains("Near Peckham Rye station."));
        assert!(prompt.contains("\n- ") && prompt.contains("Peckham"));
    }
}
