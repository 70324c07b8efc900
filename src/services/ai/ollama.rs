use anyhow::Context;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{LlmProvider, Message};

/// Self-hosted Ollama server, used when no hosted key is configured.
///
/// Replies are requested in Ollama's JSON mode since every caller here
/// expects a bare JSON object back.
pub struct OllamaProvider {
    url: String,
    model: String,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    stream: bool,
    format: &'static str,
    options: ChatOptions,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatOptions {
    temperature: f32,
}

#[derive(Deserialize)]
struct ChatResponse {
    message: Option<ReplyMessage>,
}

#[derive(Deserialize)]
struct ReplyMessage {
    content: String,
}

impl OllamaProvider {
    pub fn new(url: String, model: String) -> Self {
        Self {
            url: url.trim_end_matches('/').to_string(),
            model,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl LlmProvider for OllamaProvider {
    async fn chat(
        &self,
        system_prompt: &str,
        messages: &[Message],
        temperature: f32,
    ) -> anyhow::Result<String> {
        let request = ChatRequest {
            model: &self.model,
            messages: std::iter::once(ChatMessage {
                role: "system",
                content: system_prompt,
            })
            .chain(messages.iter().map(|m| ChatMessage {
                role: &m.role,
                content: &m.content,
            }))
            .collect(),
            stream: false,
            format: "json",
            options: ChatOptions { temperature },
        };

        let resp = self
            .client
            .post(format!("{}/api/chat", self.url))
            .json(&request)
            .send()
            .await
            .with_context(|| format!("failed to reach Ollama at {}", self.url))?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            anyhow::bail!("Ollama error ({status}) for model {}: {text}", self.model);
        }

        let data: ChatResponse = resp
            .json()
            .await
            .context("failed to parse Ollama chat response")?;

        data.message
            .map(|m| m.content)
            .ok_or_else(|| anyhow::anyhow!("Ollama chat response has no message"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn user(content: &str) -> Vec<Message> {
        vec![Message {
            role: "user".to_string(),
            content: content.to_string(),
        }]
    }

    #[tokio::test]
    async fn test_chat_is_deterministic_and_unstreamed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .and(body_partial_json(json!({
                "model": "llama3.2",
                "stream": false,
                "format": "json",
                "options": { "temperature": 0.0 },
                "messages": [
                    { "role": "system", "content": "You output only JSON." },
                    { "role": "user", "content": "next friday" }
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "model": "llama3.2",
                "message": { "role": "assistant", "content": "{\"start\":\"2025-01-17\",\"end\":\"2025-01-17\"}" },
                "done": true
            })))
            .expect(1)
            .mount(&server)
            .await;

        let provider = OllamaProvider::new(format!("{}/", server.uri()), "llama3.2".into());
        let reply = provider
            .chat("You output only JSON.", &user("next friday"), 0.0)
            .await
            .unwrap();
        assert_eq!(reply, "{\"start\":\"2025-01-17\",\"end\":\"2025-01-17\"}");
    }

    #[tokio::test]
    async fn test_chat_model_not_pulled() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(
                ResponseTemplate::new(404).set_body_json(json!({ "error": "model 'llama3.2' not found" })),
            )
            .mount(&server)
            .await;

        let provider = OllamaProvider::new(server.uri(), "llama3.2".into());
        let err = provider.chat("sys", &user("today"), 0.0).await.unwrap_err();
        assert!(err.to_string().contains("404"));
        assert!(err.to_string().contains("llama3.2"));
    }

    #[tokio::test]
    async fn test_chat_missing_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "done": true })))
            .mount(&server)
            .await;

        let provider = OllamaProvider::new(server.uri(), "llama3.2".into());
        let err = provider.chat("sys", &user("today"), 0.0).await.unwrap_err();
        assert!(err.to_string().contains("no message"));
    }
}
