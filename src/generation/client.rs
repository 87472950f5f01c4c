use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

use super::errors::{GenerationError, Result};
use super::parser::parse_cards;
use super::prompts::{response_schema, system_prompt, user_prompt};
use crate::cards::{Card, CardStyle};
use crate::config::AppConfig;
use crate::sources::SourceDocument;

/// Everything needed for one generation call
#[derive(Debug, Clone)]
pub struct GenerationRequest<'a> {
    pub document: &'a SourceDocument,
    pub count: usize,
    pub style: CardStyle,
    /// Fronts already in the target deck, listed in the prompt so the model avoids them
    pub existing_fronts: &'a [String],
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    stream: bool,
    format: serde_json::Value,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    message: Option<ChatResponseMessage>,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Client for a local Ollama server's chat endpoint
pub struct OllamaClient {
    client: Client,
    base_url: String,
    model: String,
}

impl OllamaClient {
    pub fn new(config: &AppConfig) -> Result<Self> {
        let client = Client::builder().timeout(config.ollama_timeout()).build()?;

        Ok(Self {
            client,
            base_url: config.ollama_url.trim_end_matches('/').to_string(),
            model: config.ollama_model.clone(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Whether the server answers at all (used by `antor status`)
    pub fn is_reachable(&self) -> bool {
        self.client
            .get(format!("{}/api/tags", self.base_url))
            .send()
            .map(|r| r.status().is_success())
            .unwrap_or(false)
    }

    /// Ask the model for cards; returns at most `request.count` complete cards.
    pub fn generate(&self, request: &GenerationRequest<'_>) -> Result<Vec<Card>> {
        let url = format!("{}/api/chat", self.base_url);
        let prompt = user_prompt(
            request.document,
            request.count,
            request.style,
            request.existing_fronts,
        );
        let body = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system_prompt(request.style),
                },
                ChatMessage {
                    role: "user",
                    content: &prompt,
                },
            ],
            stream: false,
            format: response_schema(request.style),
        };

        log::info!(
            "Requesting {} {} cards from {} ({})",
            request.count,
            request.style,
            self.model,
            url
        );

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .map_err(|e| GenerationError::Unavailable(format!("{} ({})", e, url)))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().unwrap_or_default();
            log::warn!("Model endpoint returned {}: {}", status, message);
            return Err(GenerationError::Unavailable(format!("HTTP {}: {}", status, message.trim())));
        }

        let chat: ChatResponse = response
            .json()
            .map_err(|e| GenerationError::InvalidResponse(e.to_string()))?;
        let content = chat.message.and_then(|m| m.content).unwrap_or_default();
        if content.trim().is_empty() {
            return Err(GenerationError::EmptyResponse);
        }

        let mut cards = parse_cards(&content, request.style);
        if cards.is_empty() {
            return Err(GenerationError::NoParseableCards {
                snippet: snippet(&content),
            });
        }

        if cards.len() > request.count {
            log::debug!("Model returned {} cards, keeping {}", cards.len(), request.count);
            cards.truncate(request.count);
        }
        log::info!("Parsed {} cards", cards.len());
        Ok(cards)
    }
}

/// First 500 characters on one line, for error messages.
fn snippet(content: &str) -> String {
    crate::text::ellipsize(content, 500).replace('\n', " ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::SourceKind;
    use crate::test_support::{unreachable_url, StubResponse, StubServer};

    fn client_for(url: &str) -> OllamaClient {
        let config = AppConfig {
            ollama_url: url.to_string(),
            ..AppConfig::default()
        };
        OllamaClient::new(&config).unwrap()
    }

    fn topic(body: &str) -> SourceDocument {
        SourceDocument {
            title: body.to_string(),
            body: body.to_string(),
            kind: SourceKind::Topic,
        }
    }

    fn chat_reply(content: &str) -> StubResponse {
        StubResponse::json(serde_json::json!({ "message": { "role": "assistant", "content": content } }).to_string())
    }

    #[test]
    fn test_generate_sends_chat_request_and_caps_count() {
        let cards: Vec<serde_json::Value> = (1..=7)
            .map(|i| serde_json::json!({ "front": format!("Q{}", i), "back": format!("A{}", i) }))
            .collect();
        let server = StubServer::start(vec![chat_reply(&serde_json::Value::from(cards).to_string())]);

        let doc = topic("osmosis");
        let request = GenerationRequest {
            document: &doc,
            count: 5,
            style: CardStyle::Basic,
            existing_fronts: &[],
        };
        let cards = client_for(&server.url).generate(&request).unwrap();

        assert_eq!(cards.len(), 5);
        assert!(cards.iter().all(|c| !c.front().is_empty() && !c.back().is_empty()));

        let sent = server.next_request();
        assert_eq!(sent.request_line, "POST /api/chat HTTP/1.1");
        let body = sent.json();
        assert_eq!(body["model"], "llama3.2");
        assert_eq!(body["stream"], false);
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "Generate exactly 5 flashcards about: osmosis");
        assert_eq!(body["format"]["type"], "array");
    }

    #[test]
    fn test_empty_content() {
        let server = StubServer::start(vec![chat_reply("  ")]);
        let doc = topic("x");
        let request = GenerationRequest {
            document: &doc,
            count: 5,
            style: CardStyle::Basic,
            existing_fronts: &[],
        };
        let err = client_for(&server.url).generate(&request).unwrap_err();
        assert!(matches!(err, GenerationError::EmptyResponse));
    }

    #[test]
    fn test_unparseable_content_carries_snippet() {
        let prose = format!("I'm sorry,\nI can't do that. {}", "blah ".repeat(200));
        let server = StubServer::start(vec![chat_reply(&prose)]);
        let doc = topic("x");
        let request = GenerationRequest {
            document: &doc,
            count: 5,
            style: CardStyle::Eli5,
            existing_fronts: &[],
        };
        match client_for(&server.url).generate(&request).unwrap_err() {
            GenerationError::NoParseableCards { snippet } => {
                assert!(snippet.starts_with("I'm sorry, I can't do that."));
                assert_eq!(snippet.chars().count(), 503);
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_unavailable() {
        let doc = topic("x");
        let request = GenerationRequest {
            document: &doc,
            count: 5,
            style: CardStyle::Basic,
            existing_fronts: &[],
        };
        let err = client_for(&unreachable_url()).generate(&request).unwrap_err();
        assert!(matches!(err, GenerationError::Unavailable(_)));

        let server = StubServer::start(vec![StubResponse::json("{\"error\":\"model not found\"}").with_status(404)]);
        let err = client_for(&server.url).generate(&request).unwrap_err();
        assert!(err.to_string().contains("model not found"));
    }
}
