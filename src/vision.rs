//! Client for the vision-analysis endpoint used with uploaded mockups.
//!
//! The endpoint speaks the chat-completions format: one user message carrying
//! the instruction text and the image as a `data:` URL.

use crate::config::VisionConfig;
use crate::error::VisionError;
use crate::prompt::AnalysisScope;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const MAX_TOKENS: u32 = 2000;

#[derive(Debug, Serialize)]
struct AnalysisRequest {
    model: String,
    messages: Vec<RequestMessage>,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct RequestMessage {
    role: &'static str,
    content: Vec<ContentPart>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Serialize)]
struct ImageUrl {
    url: String,
}

#[derive(Debug, Deserialize)]
struct AnalysisResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

/// Sends mockup images for analysis
pub struct VisionClient {
    client: reqwest::Client,
    config: VisionConfig,
}

impl VisionClient {
    pub fn new(config: VisionConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    /// Describes the image in `image` (raw bytes of type `mime`)
    ///
    /// Fails without a request when no API key is configured; never waits
    /// longer than the configured timeout.
    pub async fn analyze(
        &self,
        image: &[u8],
        mime: &str,
        scope: AnalysisScope,
    ) -> Result<String, VisionError> {
        let api_key = match self.config.api_key.as_deref() {
            Some(key) if !key.is_empty() => key,
            _ => return Err(VisionError::CredentialMissing),
        };

        let data_url = format!(
            "data:{};base64,{}",
            mime,
            base64::engine::general_purpose::STANDARD.encode(image)
        );
        let request = AnalysisRequest {
            model: self.config.model.clone(),
            messages: vec![RequestMessage {
                role: "user",
                content: vec![
                    ContentPart::Text {
                        text: scope.instruction().to_string(),
                    },
                    ContentPart::ImageUrl {
                        image_url: ImageUrl { url: data_url },
                    },
                ],
            }],
            max_tokens: MAX_TOKENS,
        };

        let timeout = Duration::from_millis(self.config.timeout_ms);
        ::log::info!("Requesting {:?} analysis from {}", scope, self.config.endpoint);
        match tokio::time::timeout(timeout, self.send(api_key, &request)).await {
            Ok(result) => result,
            Err(_) => {
                ::log::warn!("Image analysis timed out after {} ms", self.config.timeout_ms);
                Err(VisionError::Timeout(self.config.timeout_ms))
            }
        }
    }

    async fn send(&self, api_key: &str, request: &AnalysisRequest) -> Result<String, VisionError> {
        let response = self
            .client
            .post(&self.config.endpoint)
            .header("Authorization", format!("Bearer {}", api_key))
            .json(request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let text = response.text().await.unwrap_or_default();
            ::log::error!("Analysis endpoint returned {}: {}", status, text);
            return Err(VisionError::EndpointFailure(format!("HTTP {}", status)));
        }

        let body: AnalysisResponse = response
            .json()
            .await
            .map_err(|e| VisionError::EndpointFailure(format!("malformed response: {}", e)))?;

        body.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty())
            .ok_or_else(|| VisionError::EndpointFailure("response has no analysis text".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer, api_key: Option<&str>) -> VisionClient {
        VisionClient::new(VisionConfig {
            endpoint: format!("{}/v1/chat/completions", server.uri()),
            model: "vision-test".to_string(),
            api_key: api_key.map(str::to_string),
            timeout_ms: 2_000,
        })
    }

    #[tokio::test]
    async fn test_analysis_text_is_returned() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("Authorization", "Bearer sk-test"))
            .and(body_partial_json(serde_json::json!({"model": "vision-test"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"message": {"role": "assistant", "content": "  A dark hero section.  "}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let text = client(&server, Some("sk-test"))
            .analyze(b"\x89PNG", "image/png", AnalysisScope::Full)
            .await
            .unwrap();
        assert_eq!(text, "A dark hero section.");
    }

    #[tokio::test]
    async fn test_request_carries_image_as_data_url() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(serde_json::json!({
                "messages": [{"role": "user", "content": [
                    {"type": "text", "text": AnalysisScope::Section.instruction()},
                    {"type": "image_url", "image_url": {"url": "data:image/jpeg;base64,AQID"}}
                ]}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"message": {"content": "ok"}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let text = client(&server, Some("sk-test"))
            .analyze(&[1, 2, 3], "image/jpeg", AnalysisScope::Section)
            .await
            .unwrap();
        assert_eq!(text, "ok");
    }

    #[tokio::test]
    async fn test_missing_key_sends_nothing() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let result = client(&server, None)
            .analyze(b"img", "image/png", AnalysisScope::Full)
            .await;
        assert!(matches!(result, Err(VisionError::CredentialMissing)));
    }

    #[tokio::test]
    async fn test_error_status_is_endpoint_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("bad key"))
            .mount(&server)
            .await;

        let result = client(&server, Some("sk-bad"))
            .analyze(b"img", "image/png", AnalysisScope::Full)
            .await;
        match result {
            Err(VisionError::EndpointFailure(msg)) => assert_eq!(msg, "HTTP 401"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_malformed_body_is_endpoint_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let result = client(&server, Some("sk-test"))
            .analyze(b"img", "image/png", AnalysisScope::Full)
            .await;
        assert!(matches!(result, Err(VisionError::EndpointFailure(_))));

        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"choices": []})))
            .mount(&server)
            .await;
        let result = client(&server, Some("sk-test"))
            .analyze(b"img", "image/png", AnalysisScope::Full)
            .await;
        assert!(matches!(result, Err(VisionError::EndpointFailure(_))));
    }

    #[tokio::test]
    async fn test_slow_endpoint_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_delay(Duration::from_secs(5))
                    .set_body_json(serde_json::json!({"choices": [{"message": {"content": "late"}}]})),
            )
            .mount(&server)
            .await;

        let mut vision = client(&server, Some("sk-test"));
        vision.config.timeout_ms = 100;
        let result = vision.analyze(b"img", "image/png", AnalysisScope::Full).await;
        assert!(matches!(result, Err(VisionError::Timeout(100))));
    }
}
