use crate::config::OracleConfig;
use crate::error::CrawlError;
use crate::oracle::TextOracle;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const SYSTEM_PROMPT: &str = "You are a helpful assistant.";

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Text oracle backed by an OpenAI-compatible `/v1/chat/completions` API
pub struct OpenAiOracle {
    config: OracleConfig,
    client: Client,
}

impl OpenAiOracle {
    pub fn new(config: OracleConfig) -> Result<Self, CrawlError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| CrawlError::OracleUnavailable(format!("HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    pub fn config(&self) -> &OracleConfig {
        &self.config
    }

    fn completions_url(&self) -> String {
        format!(
            "{}/v1/chat/completions",
            self.config.endpoint.trim_end_matches('/')
        )
    }
}

impl TextOracle for OpenAiOracle {
    async fn complete(&self, prompt: &str) -> Result<String, CrawlError> {
        let request = ChatRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            temperature: self.config.temperature,
        };

        let mut builder = self.client.post(self.completions_url()).json(&request);
        if let Some(key) = &self.config.api_key {
            builder = builder.bearer_auth(key);
        }

        let resp = builder
            .send()
            .await
            .map_err(|e| CrawlError::OracleTransport(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(CrawlError::OracleApi { status, body });
        }

        let chat: ChatResponse = resp
            .json()
            .await
            .map_err(|e| CrawlError::OracleUnavailable(format!("unreadable response: {}", e)))?;

        let choice = chat
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| CrawlError::OracleUnavailable("response has no choices".to_string()))?;

        Ok(choice.message.content.unwrap_or_default().trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config_for(server: &MockServer) -> OracleConfig {
        OracleConfig {
            endpoint: format!("{}/", server.uri()),
            api_key: Some("sk-test".to_string()),
            model: "gpt-test".to_string(),
            ..OracleConfig::default()
        }
    }

    #[tokio::test]
    async fn test_complete_returns_first_choice() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .and(body_partial_json(json!({"model": "gpt-test", "temperature": 0.0})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"role": "assistant", "content": "  YES \n"}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let oracle = OpenAiOracle::new(config_for(&server)).unwrap();
        let answer = oracle.complete("Is this a job link?").await.unwrap();
        assert_eq!(answer, "YES");
    }

    #[tokio::test]
    async fn test_server_error_is_transient() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
            .mount(&server)
            .await;

        let oracle = OpenAiOracle::new(config_for(&server)).unwrap();
        let err = oracle.complete("prompt").await.unwrap_err();
        assert!(matches!(err, CrawlError::OracleApi { status: 503, .. }));
        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn test_empty_choices_is_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
            .mount(&server)
            .await;

        let oracle = OpenAiOracle::new(config_for(&server)).unwrap();
        let err = oracle.complete("prompt").await.unwrap_err();
        assert!(matches!(err, CrawlError::OracleUnavailable(_)));
        assert!(!err.is_transient());
    }
}
