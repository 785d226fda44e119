use std::time::Duration;

use serde::Serialize;
use serde_json::Value;

use crate::stream::GenerateStream;
use crate::types::{
    ChatRequest, ChatResponse, EmbedRequest, EmbedResponse, GenerateRequest, GenerateResponse,
};
use crate::{LocalModelError, Result};

// ─── OllamaClient ─────────────────────────────────────────────────────────

/// HTTP client for an Ollama-style model server.
///
/// Every call is a single `POST` of a JSON body. Responses that carry an
/// `error` field are surfaced as [`LocalModelError::Api`] regardless of the
/// HTTP status.
#[derive(Debug, Clone)]
pub struct OllamaClient {
    http: reqwest::Client,
    base_url: String,
}

impl OllamaClient {
    pub fn new(base_url: impl Into<String>, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(t) = timeout {
            builder = builder.timeout(t);
        }
        Ok(Self {
            http: builder.build()?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Single-shot generation (`stream: false`).
    pub async fn generate(&self, mut request: GenerateRequest) -> Result<GenerateResponse> {
        request.stream = false;
        tracing::debug!(model = %request.model, prompt_chars = request.prompt.len(), "generate");
        let body = self.post_json("/api/generate", &request).await?;
        serde_json::from_value(body.clone())
            .map_err(|_| LocalModelError::UnexpectedResponse(body.to_string()))
    }

    /// Streamed generation. Tokens arrive as [`GenerateResponse`] chunks.
    pub async fn generate_stream(&self, mut request: GenerateRequest) -> Result<GenerateStream> {
        request.stream = true;
        tracing::debug!(model = %request.model, prompt_chars = request.prompt.len(), "generate (stream)");
        let response = self.post("/api/generate", &request).await?;
        Ok(GenerateStream::from_response(response))
    }

    pub async fn chat(&self, mut request: ChatRequest) -> Result<ChatResponse> {
        request.stream = false;
        tracing::debug!(model = %request.model, messages = request.messages.len(), "chat");
        let body = self.post_json("/api/chat", &request).await?;
        let has_content = body
            .get("message")
            .and_then(|m| m.get("content"))
            .is_some_and(Value::is_string);
        if !has_content {
            return Err(LocalModelError::UnexpectedResponse(body.to_string()));
        }
        serde_json::from_value(body.clone())
            .map_err(|_| LocalModelError::UnexpectedResponse(body.to_string()))
    }

    /// Embed `inputs` with `model`, one vector per input, in input order.
    pub async fn embed(&self, model: &str, inputs: &[String]) -> Result<Vec<Vec<f32>>> {
        if inputs.is_empty() {
            return Ok(Vec::new());
        }
        let request = EmbedRequest {
            model: model.to_string(),
            input: inputs.to_vec(),
        };
        let body = self.post_json("/api/embed", &request).await?;
        let parsed: EmbedResponse = serde_json::from_value(body.clone())
            .map_err(|_| LocalModelError::UnexpectedResponse(body.to_string()))?;
        if parsed.embeddings.len() != inputs.len() {
            return Err(LocalModelError::UnexpectedResponse(format!(
                "expected {} embeddings, got {}",
                inputs.len(),
                parsed.embeddings.len()
            )));
        }
        Ok(parsed.embeddings)
    }

    // ─── Internal ─────────────────────────────────────────────────────────

    async fn post<B: Serialize>(&self, path: &str, body: &B) -> Result<reqwest::Response> {
        let url = format!("{}{}", self.base_url, path);
        let response = self.http.post(&url).json(body).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            if let Some(message) = api_error(&body) {
                return Err(LocalModelError::Api(message));
            }
            return Err(LocalModelError::Http {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    async fn post_json<B: Serialize>(&self, path: &str, body: &B) -> Result<Value> {
        let text = self.post(path, body).await?.text().await?;
        let value: Value = serde_json::from_str(&text).map_err(|source| LocalModelError::Parse {
            line: text.clone(),
            source,
        })?;
        if let Some(message) = value.get("error").and_then(Value::as_str) {
            return Err(LocalModelError::Api(message.to_string()));
        }
        Ok(value)
    }
}

fn api_error(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    value.get("error")?.as_str().map(str::to_string)
}

// ─── Tests ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ChatMessage;
    use futures::StreamExt;
    use mockito::Matcher;

    fn client(server: &mockito::ServerGuard) -> OllamaClient {
        OllamaClient::new(server.url(), Some(Duration::from_secs(5))).unwrap()
    }

    #[test]
    fn new_trims_trailing_slash() {
        let c = OllamaClient::new("http://localhost:11434/", None).unwrap();
        assert_eq!(c.base_url(), "http://localhost:11434");
    }

    #[tokio::test]
    async fn generate_sends_non_streaming_request() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/generate")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "model": "qwen3",
                "prompt": "hi",
                "system": "be brief",
                "stream": false
            })))
            .with_status(200)
            .with_body(r#"{"model":"qwen3","response":"  hello  ","done":true}"#)
            .create_async()
            .await;

        let resp = client(&server)
            .generate(GenerateRequest::new("qwen3", "hi").with_system("be brief"))
            .await
            .unwrap();
        assert_eq!(resp.response.trim(), "hello");
        assert!(resp.done);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn generate_surfaces_api_error_field() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/generate")
            .with_status(404)
            .with_body(r#"{"error":"model 'nope' not found"}"#)
            .create_async()
            .await;

        let err = client(&server)
            .generate(GenerateRequest::new("nope", "hi"))
            .await
            .unwrap_err();
        assert!(matches!(err, LocalModelError::Api(ref m) if m.contains("not found")));
    }

    #[tokio::test]
    async fn non_json_error_body_is_http_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/generate")
            .with_status(502)
            .with_body("bad gateway")
            .create_async()
            .await;

        let err = client(&server)
            .generate(GenerateRequest::new("m", "p"))
            .await
            .unwrap_err();
        assert!(matches!(err, LocalModelError::Http { status: 502, .. }));
    }

    #[tokio::test]
    async fn generate_stream_yields_chunks_until_done() {
        let mut server = mockito::Server::new_async().await;
        let body = concat!(
            "{\"response\":\"def \",\"done\":false}\n",
            "\n",
            "{\"response\":\"main\",\"done\":false}\n",
            "{\"response\":\"\",\"done\":true}\n",
            "{\"response\":\"ignored\",\"done\":false}\n",
        );
        server
            .mock("POST", "/api/generate")
            .match_body(Matcher::PartialJson(serde_json::json!({"stream": true})))
            .with_status(200)
            .with_body(body)
            .create_async()
            .await;

        let stream = client(&server)
            .generate_stream(GenerateRequest::new("m", "p"))
            .await
            .unwrap();
        let chunks: Vec<_> = stream.collect().await;
        assert_eq!(chunks.len(), 3);
        let text: String = chunks
            .into_iter()
            .map(|c| c.unwrap().response)
            .collect();
        assert_eq!(text, "def main");
    }

    #[tokio::test]
    async fn chat_returns_message_content() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/chat")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "messages": [
                    {"role": "system", "content": "sys"},
                    {"role": "user", "content": "usr"}
                ],
                "stream": false
            })))
            .with_status(200)
            .with_body(r#"{"message":{"role":"assistant","content":"print(1)"},"done":true}"#)
            .create_async()
            .await;

        let resp = client(&server)
            .chat(ChatRequest::new(
                "m",
                vec![ChatMessage::system("sys"), ChatMessage::user("usr")],
            ))
            .await
            .unwrap();
        assert_eq!(resp.content(), "print(1)");
    }

    #[tokio::test]
    async fn chat_without_message_is_unexpected() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/chat")
            .with_status(200)
            .with_body(r#"{"done":true}"#)
            .create_async()
            .await;

        let err = client(&server)
            .chat(ChatRequest::new("m", vec![ChatMessage::user("x")]))
            .await
            .unwrap_err();
        assert!(matches!(err, LocalModelError::UnexpectedResponse(_)));
    }

    #[tokio::test]
    async fn embed_returns_vectors_in_order() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/embed")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "model": "nomic-embed-text",
                "input": ["a", "b"]
            })))
            .with_status(200)
            .with_body(r#"{"embeddings":[[1.0,0.0],[0.0,1.0]]}"#)
            .create_async()
            .await;

        let vectors = client(&server)
            .embed("nomic-embed-text", &["a".to_string(), "b".to_string()])
            .await
            .unwrap();
        assert_eq!(vectors, vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
    }

    #[tokio::test]
    async fn embed_count_mismatch_is_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/embed")
            .with_status(200)
            .with_body(r#"{"embeddings":[[1.0]]}"#)
            .create_async()
            .await;

        let err = client(&server)
            .embed("m", &["a".to_string(), "b".to_string()])
            .await
            .unwrap_err();
        assert!(err.to_string().contains("expected 2 embeddings"));
    }

    #[tokio::test]
    async fn embed_of_nothing_makes_no_request() {
        let server = mockito::Server::new_async().await;
        let vectors = client(&server).embed("m", &[]).await.unwrap();
        assert!(vectors.is_empty());
    }
}
