//! Ollama prompt generation
//!
//! Asks a remote LLM for a random English word or sentence. Errors never
//! abort the session: they become a notice and a placeholder prompt.

use super::{Prompt, PromptProvider};
use crate::config::Config;
use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

const GENERATION_PROMPT: &str = "Provide a random English word or sentence.";
const TEMPERATURE: f32 = 0.7;

/// Shown when the API answers without any text
pub const MISSING_TEXT: &str = "Generated text could not be retrieved.";
/// Shown when the API call fails
pub const FETCH_FAILED: &str = "Error: Unable to fetch text.";

/// Generation response. Ollama uses `response`, some hosted gateways `text`.
#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(alias = "text")]
    response: Option<String>,
}

#[derive(Debug, Clone)]
pub struct OllamaPrompts {
    url: String,
    model: String,
    api_key: Option<String>,
    timeout: Duration,
}

impl OllamaPrompts {
    pub fn new(config: &Config) -> Self {
        Self {
            url: config.ollama_url.trim_end_matches('/').to_string(),
            model: config.ollama_model.clone(),
            api_key: config.ollama_api_key(),
            timeout: Duration::from_secs(config.ollama_timeout_secs),
        }
    }

    fn request(&self, client: &reqwest::Client) -> reqwest::RequestBuilder {
        let request = client
            .post(format!("{}/api/generate", self.url))
            .json(&serde_json::json!({
                "model": self.model,
                "prompt": GENERATION_PROMPT,
                "stream": false,
                "options": {
                    "temperature": TEMPERATURE
                }
            }))
            .timeout(self.timeout);

        match &self.api_key {
            Some(key) => request.bearer_auth(key),
            None => request,
        }
    }

    async fn generate(&self) -> Result<String> {
        let client = reqwest::Client::new();
        let response = self.request(&client).send().await?.error_for_status()?;
        let body_text = response.text().await?;
        debug!("🧠 Ollama raw body: {}", body_text);

        parse_generated(&body_text)
    }
}

/// Extract the generated text from a response body
fn parse_generated(body: &str) -> Result<String> {
    let parsed: GenerateResponse = serde_json::from_str(body)?;
    let text = parsed
        .response
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| MISSING_TEXT.to_string());
    Ok(text)
}

#[async_trait]
impl PromptProvider for OllamaPrompts {
    async fn next(&self) -> Prompt {
        match self.generate().await {
            Ok(text) => Prompt::new(text),
            Err(e) => {
                warn!("❌ Ollama prompt generation failed: {}", e);
                Prompt {
                    text: FETCH_FAILED.to_string(),
                    notice: Some(format!("Error generating text: {e}")),
                }
            }
        }
    }

    fn name(&self) -> &str {
        "ollama"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_response_field() {
        let text = parse_generated(r#"{"response": "  Butterfly  ", "done": true}"#).unwrap();
        assert_eq!(text, "Butterfly");
    }

    #[test]
    fn test_parse_text_field() {
        let text = parse_generated(r#"{"text": "Rain falls softly."}"#).unwrap();
        assert_eq!(text, "Rain falls softly.");
    }

    #[test]
    fn test_parse_missing_text() {
        assert_eq!(parse_generated(r#"{"done": true}"#).unwrap(), MISSING_TEXT);
        assert_eq!(parse_generated(r#"{"response": "   "}"#).unwrap(), MISSING_TEXT);
    }

    #[test]
    fn test_parse_invalid_body() {
        assert!(parse_generated("<html>bad gateway</html>").is_err());
    }

    fn provider(url: &str, api_key: Option<&str>) -> OllamaPrompts {
        OllamaPrompts {
            url: url.to_string(),
            model: "llama3".to_string(),
            api_key: api_key.map(str::to_string),
            timeout: Duration::from_secs(5),
        }
    }

    #[test]
    fn test_bearer_header_only_with_key() {
        let client = reqwest::Client::new();

        let request = provider("http://localhost:11434", Some("secret"))
            .request(&client)
            .build()
            .unwrap();
        assert_eq!(request.url().path(), "/api/generate");
        assert_eq!(
            request.headers()[reqwest::header::AUTHORIZATION],
            "Bearer secret"
        );

        let request = provider("http://localhost:11434", None)
            .request(&client)
            .build()
            .unwrap();
        assert!(request
            .headers()
            .get(reqwest::header::AUTHORIZATION)
            .is_none());
    }

    #[tokio::test]
    async fn test_generate_against_local_server() {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());

        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut raw = Vec::new();
            let mut chunk = [0u8; 4096];
            // Read headers, then the body announced by Content-Length
            loop {
                let n = socket.read(&mut chunk).await.unwrap();
                raw.extend_from_slice(&chunk[..n]);
                let text = String::from_utf8_lossy(&raw).to_string();
                if let Some(end) = text.find("\r\n\r\n") {
                    let length = text[..end]
                        .lines()
                        .find_map(|l| {
                            let (name, value) = l.split_once(':')?;
                            name.eq_ignore_ascii_case("content-length")
                                .then(|| value.trim().parse::<usize>().ok())?
                        })
                        .unwrap_or(0);
                    if raw.len() >= end + 4 + length || n == 0 {
                        break;
                    }
                }
                if n == 0 {
                    break;
                }
            }

            let body = r#"{"response": "Good morning", "done": true}"#;
            let reply = format!(
                "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                body.len(),
                body
            );
            socket.write_all(reply.as_bytes()).await.unwrap();
            String::from_utf8_lossy(&raw).to_string()
        });

        let prompt = provider(&url, Some("secret")).next().await;
        assert_eq!(prompt.text, "Good morning");
        assert!(prompt.notice.is_none());

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /api/generate"));
        assert!(request
            .to_ascii_lowercase()
            .contains("authorization: bearer secret"));
        assert!(request.contains("\"stream\":false"));
    }

    #[tokio::test]
    async fn test_unreachable_service_degrades_to_placeholder() {
        let config = Config {
            ollama_url: "http://127.0.0.1:9".to_string(),
            ollama_timeout_secs: 1,
            ..Config::default()
        };
        let provider = OllamaPrompts::new(&config);
        let prompt = provider.next().await;
        assert_eq!(prompt.text, FETCH_FAILED);
        assert!(prompt
            .notice
            .as_deref()
            .is_some_and(|n| n.starts_with("Error generating text:")));
    }
}
