//! Client for the remote text-generation API.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use crate::config::ApiConfig;
use crate::credential::Credential;
use crate::defaults::Defaults;
use crate::error::ApiError;

/// The two operations the editor shortcuts invoke.
#[async_trait]
pub trait TextAssistant: Send + Sync {
    /// Returns the continuation of `text` only, without the original.
    async fn complete(&self, text: &str) -> Result<String, ApiError>;

    /// Returns the corrected version of `text`.
    async fn improve(&self, text: &str) -> Result<String, ApiError>;
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    prompt: String,
    max_tokens: u32,
    n: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct EditRequest<'a> {
    model: &'a str,
    input: &'a str,
    instruction: &'a str,
    n: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    text: String,
}

/// OpenAI-compatible client bound to one credential.
pub struct OpenAiClient {
    credential: Credential,
    base_url: String,
    completion_model: String,
    edit_model: String,
    client: reqwest::Client,
}

impl OpenAiClient {
    pub fn new(credential: Credential, config: &ApiConfig) -> Self {
        Self {
            credential,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            completion_model: config.completion_model.clone(),
            edit_model: config.edit_model.clone(),
            client: reqwest::Client::new(),
        }
    }

    async fn query<B: Serialize + Sync>(&self, endpoint: &str, body: &B) -> Result<String, ApiError> {
        let url = format!("{}/{}", self.base_url, endpoint);
        let response = self
            .client
            .post(&url)
            .bearer_auth(self.credential.expose())
            .json(body)
            .send()
            .await
            .map_err(|e| ApiError::failed(e.to_string()))?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(ApiError::failed(format!("HTTP {status} from {endpoint}")));
        }

        let parsed: ApiResponse = response
            .json()
            .await
            .map_err(|e| ApiError::failed(format!("unexpected response shape: {e}")))?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.text)
            .ok_or_else(|| ApiError::failed("response contained no choices"))
    }
}

#[async_trait]
impl TextAssistant for OpenAiClient {
    async fn complete(&self, text: &str) -> Result<String, ApiError> {
        let body = CompletionRequest {
            model: &self.completion_model,
            prompt: format!("{}\n\n{}", Defaults::COMPLETION_PROMPT, text),
            max_tokens: Defaults::MAX_TOKENS,
            n: Defaults::SAMPLE_COUNT,
            temperature: Defaults::TEMPERATURE,
        };
        self.query("completions", &body).await
    }

    async fn improve(&self, text: &str) -> Result<String, ApiError> {
        let body = EditRequest {
            model: &self.edit_model,
            input: text,
            instruction: Defaults::EDIT_INSTRUCTION,
            n: Defaults::SAMPLE_COUNT,
            temperature: Defaults::TEMPERATURE,
        };
        self.query("edits", &body).await
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::credential::sample_token;

    fn client_for(server: &MockServer, token: &str) -> OpenAiClient {
        let config = ApiConfig { base_url: format!("{}/v1/", server.uri()), ..ApiConfig::default() };
        OpenAiClient::new(Credential::new(token), &config)
    }

    fn choices(text: &str) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(json!({ "choices": [{ "text": text, "index": 0 }] }))
    }

    #[tokio::test]
    async fn improve_posts_edit_request_with_bearer_token() {
        let server = MockServer::start().await;
        let token = sample_token('a');
        Mock::given(method("POST"))
            .and(path("/v1/edits"))
            .and(header("authorization", format!("Bearer {token}").as_str()))
            .and(body_partial_json(json!({
                "model": "code-davinci-edit-001",
                "input": "Ths is a tst.",
                "instruction": Defaults::EDIT_INSTRUCTION,
                "n": 1,
                "temperature": 0.5,
            })))
            .respond_with(choices("This is a test."))
            .expect(1)
            .mount(&server)
            .await;

        let out = client_for(&server, &token).improve("Ths is a tst.").await.unwrap();
        assert_eq!(out, "This is a test.");
    }

    #[tokio::test]
    async fn complete_returns_continuation_only() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/completions"))
            .and(body_partial_json(json!({
                "model": "text-curie-001",
                "max_tokens": 512,
                "n": 1,
                "temperature": 0.5,
            })))
            .respond_with(choices(" and then some."))
            .expect(1)
            .mount(&server)
            .await;

        let out = client_for(&server, "sk-test").complete("It began").await.unwrap();
        assert_eq!(out, " and then some.");

        let requests = server.received_requests().await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
        let prompt = body["prompt"].as_str().unwrap();
        assert!(prompt.starts_with(Defaults::COMPLETION_PROMPT));
        assert!(prompt.ends_with("\n\nIt began"));
    }

    #[tokio::test]
    async fn non_200_is_request_failed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "choices": [{ "text": "x" }] })))
            .mount(&server)
            .await;

        let err = client_for(&server, "sk-bad").improve("text").await.unwrap_err();
        assert_eq!(err.to_string(), "Failed to query API");
        assert!(err.reason().contains("401"));
    }

    #[tokio::test]
    async fn missing_or_empty_choices_is_request_failed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/edits"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "error": "nope" })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v1/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "choices": [] })))
            .mount(&server)
            .await;

        let client = client_for(&server, "sk-test");
        assert!(matches!(client.improve("a").await, Err(ApiError::RequestFailed { .. })));
        assert!(matches!(client.complete("a").await, Err(ApiError::RequestFailed { .. })));
    }

    #[tokio::test]
    async fn unreachable_host_is_request_failed() {
        let config = ApiConfig { base_url: "http://127.0.0.1:9/v1".into(), ..ApiConfig::default() };
        let client = OpenAiClient::new(Credential::new("sk-test"), &config);
        assert!(client.improve("a").await.is_err());
    }
}
