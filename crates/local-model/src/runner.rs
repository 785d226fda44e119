use futures::StreamExt;

use crate::stream::GenerateStream;
use crate::{LocalModelError, Result};

/// Tokens that are nothing but a markdown fence or a fence language tag.
///
/// Models asked for "code only" still open with ```` ```python ````; these
/// arrive as standalone tokens and are dropped while streaming.
pub fn is_fence_token(token: &str) -> bool {
    matches!(token.trim(), "```" | "python" | "text" | "json")
}

/// Consume a [`GenerateStream`] and concatenate its tokens.
///
/// Fence tokens are dropped. Lines the decoder could not parse have already
/// been logged by the stream and are skipped here; any other error ends the
/// collection.
pub async fn collect_generation(stream: GenerateStream) -> Result<String> {
    let mut stream = stream;
    let mut buffer = String::new();
    let mut tokens = 0usize;
    let mut skipped = 0usize;

    while let Some(item) = stream.next().await {
        match item {
            Ok(chunk) => {
                tokens += 1;
                if !is_fence_token(&chunk.response) {
                    buffer.push_str(&chunk.response);
                }
                if chunk.done {
                    break;
                }
            }
            Err(LocalModelError::Parse { .. }) => skipped += 1,
            Err(e) => return Err(e),
        }
    }

    tracing::debug!(tokens, skipped, chars = buffer.len(), "generation collected");
    Ok(buffer)
}

// ─── Tests ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::GenerateResponse;
    use tokio::sync::mpsc;

    fn token(text: &str) -> Result<GenerateResponse> {
        Ok(GenerateResponse {
            response: text.to_string(),
            ..Default::default()
        })
    }

    fn done() -> Result<GenerateResponse> {
        Ok(GenerateResponse {
            done: true,
            ..Default::default()
        })
    }

    fn parse_error() -> Result<GenerateResponse> {
        Err(LocalModelError::Parse {
            line: "garbage".into(),
            source: serde_json::from_str::<serde_json::Value>("garbage").unwrap_err(),
        })
    }

    fn mock_stream(items: Vec<Result<GenerateResponse>>) -> GenerateStream {
        let (tx, rx) = mpsc::channel(32);
        tokio::spawn(async move {
            for item in items {
                if tx.send(item).await.is_err() {
                    break;
                }
            }
        });
        GenerateStream::from_channel(rx)
    }

    #[test]
    fn fence_tokens() {
        for t in ["```", " python", "text\n", "json"] {
            assert!(is_fence_token(t), "expected fence: {t:?}");
        }
        for t in ["def", "python3", "```python", " "] {
            assert!(!is_fence_token(t), "expected content: {t:?}");
        }
    }

    #[tokio::test]
    async fn collect_concatenates_tokens() {
        let stream = mock_stream(vec![token("from "), token("fastapi"), done()]);
        assert_eq!(collect_generation(stream).await.unwrap(), "from fastapi");
    }

    #[tokio::test]
    async fn collect_drops_fence_tokens() {
        let stream = mock_stream(vec![
            token("```"),
            token("python"),
            token("\nimport os"),
            token("```"),
            done(),
        ]);
        assert_eq!(collect_generation(stream).await.unwrap(), "\nimport os");
    }

    #[tokio::test]
    async fn collect_skips_parse_errors() {
        let stream = mock_stream(vec![token("a"), parse_error(), token("b"), done()]);
        assert_eq!(collect_generation(stream).await.unwrap(), "ab");
    }

    #[tokio::test]
    async fn collect_stops_at_done() {
        let stream = mock_stream(vec![token("a"), done(), token("late")]);
        assert_eq!(collect_generation(stream).await.unwrap(), "a");
    }

    #[tokio::test]
    async fn collect_propagates_api_error() {
        let stream = mock_stream(vec![
            token("a"),
            Err(LocalModelError::Api("out of memory".into())),
        ]);
        let err = collect_generation(stream).await.unwrap_err();
        assert!(err.to_string().contains("out of memory"));
    }

    #[tokio::test]
    async fn collect_empty_stream_is_empty_text() {
        let (tx, rx) = mpsc::channel::<Result<GenerateResponse>>(1);
        drop(tx);
        let text = collect_generation(GenerateStream::from_channel(rx)).await.unwrap();
        assert!(text.is_empty());
    }
}
