use crate::domain::ports::{ConfigProvider, VisionClient, VisionReply};
use crate::utils::error::{NutriError, Result, TransportError};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Serialize;

/// 錯誤訊息中保留的回應內容長度
const ERROR_BODY_LIMIT: usize = 300;

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: Vec<ContentPart<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart<'a> {
    Text { text: &'a str },
    ImageUrl { image_url: ImageUrl<'a> },
}

#[derive(Debug, Serialize)]
struct ImageUrl<'a> {
    url: &'a str,
}

/// OpenAI 相容的 chat completions 視覺服務（預設 DeepSeek）
pub struct ChatCompletionsClient<C: ConfigProvider> {
    config: C,
    client: Client,
}

impl<C: ConfigProvider> ChatCompletionsClient<C> {
    pub fn new(config: C) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| NutriError::ConfigError {
                message: format!("Failed to build HTTP client: {}", e),
            })?;

        Ok(Self { config, client })
    }

    pub fn config(&self) -> &C {
        &self.config
    }

    fn build_request<'a>(&'a self, prompt: &'a str, image_data_url: &'a str) -> ChatRequest<'a> {
        ChatRequest {
            model: self.config.model(),
            messages: vec![ChatMessage {
                role: "user",
                content: vec![
                    ContentPart::Text { text: prompt },
                    ContentPart::ImageUrl {
                        image_url: ImageUrl { url: image_data_url },
                    },
                ],
            }],
            temperature: self.config.temperature(),
            max_tokens: self.config.max_tokens(),
        }
    }
}

fn truncate(body: &str, limit: usize) -> String {
    body.chars().take(limit).collect()
}

#[async_trait]
impl<C: ConfigProvider> VisionClient for ChatCompletionsClient<C> {
    async fn complete(&self, prompt: &str, image_data_url: &str) -> Result<VisionReply> {
        let payload = self.build_request(prompt, image_data_url);

        tracing::debug!(
            "📡 Calling vision service {} (model: {}, prompt {} chars)",
            self.config.vision_endpoint(),
            self.config.model(),
            prompt.len()
        );

        let response = self
            .client
            .post(self.config.vision_endpoint())
            .bearer_auth(self.config.api_key())
            .json(&payload)
            .send()
            .await
            .map_err(TransportError::from)?;

        let status = response.status();
        tracing::debug!("Vision service response status: {}", status);

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let body = truncate(&body, ERROR_BODY_LIMIT);
            tracing::error!("Vision service error {}: {}", status, body);

            let err = if status == StatusCode::TOO_MANY_REQUESTS {
                TransportError::RateLimited {
                    status: status.as_u16(),
                }
            } else {
                TransportError::Status {
                    status: status.as_u16(),
                    body,
                }
            };
            return Err(err.into());
        }

        let body = response.text().await.map_err(TransportError::from)?;
        let envelope: serde_json::Value =
            serde_json::from_str(&body).map_err(|e| NutriError::MalformedResponse {
                message: format!("vision service body is not JSON: {}", e),
            })?;

        let content = envelope
            .pointer("/choices/0/message/content")
            .cloned()
            .unwrap_or(serde_json::Value::Null);

        Ok(VisionReply { content })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    struct TestConfig;

    impl ConfigProvider for TestConfig {
        fn vision_endpoint(&self) -> &str {
            "http://localhost:9/chat/completions"
        }
        fn api_key(&self) -> &str {
            "test-key"
        }
        fn model(&self) -> &str {
            "deepseek-chat"
        }
        fn timeout(&self) -> Duration {
            Duration::from_secs(60)
        }
        fn temperature(&self) -> f32 {
            0.4
        }
        fn max_tokens(&self) -> u32 {
            800
        }
    }

    #[test]
    fn test_request_body_shape() {
        let client = ChatCompletionsClient::new(TestConfig).unwrap();
        let request = client.build_request("describe", "data:image/jpeg;base64,AAAA");
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["model"], "deepseek-chat");
        assert_eq!(json["max_tokens"], 800);
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["messages"][0]["content"][0]["type"], "text");
        assert_eq!(json["messages"][0]["content"][0]["text"], "describe");
        assert_eq!(json["messages"][0]["content"][1]["type"], "image_url");
        assert_eq!(
            json["messages"][0]["content"][1]["image_url"]["url"],
            "data:image/jpeg;base64,AAAA"
        );
        assert!((json["temperature"].as_f64().unwrap() - 0.4).abs() < 1e-6);
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        assert_eq!(truncate("héllo", 2), "hé");
        assert_eq!(truncate("short", 300), "short");
    }
}
