/// Deserialization tests for representative model-server payloads.
#[cfg(test)]
mod unit {
    use crate::types::{
        ChatMessage, ChatRequest, ChatResponse, GenerateRequest, GenerateResponse, Role,
        TranscriptionResponse,
    };

    #[test]
    fn parse_streamed_generate_chunk() {
        let json = r#"{
            "model": "qwen3:14b-q4_K_M",
            "created_at": "2025-05-01T10:00:00Z",
            "response": "import",
            "done": false
        }"#;
        let chunk: GenerateResponse = serde_json::from_str(json).unwrap();
        assert_eq!(chunk.response, "import");
        assert_eq!(chunk.model.as_deref(), Some("qwen3:14b-q4_K_M"));
        assert!(!chunk.done);
    }

    #[test]
    fn parse_final_generate_chunk() {
        let json = r#"{
            "model": "qwen3:14b-q4_K_M",
            "response": "",
            "done": true,
            "done_reason": "stop",
            "context": [1, 2, 3],
            "total_duration": 5043500667,
            "eval_count": 290
        }"#;
        let chunk: GenerateResponse = serde_json::from_str(json).unwrap();
        assert!(chunk.done);
        assert_eq!(chunk.done_reason.as_deref(), Some("stop"));
        assert_eq!(chunk.eval_count, Some(290));
    }

    #[test]
    fn generate_request_omits_missing_system() {
        let req = GenerateRequest::new("m", "p");
        let json = serde_json::to_value(&req).unwrap();
        assert!(json.get("system").is_none());
        assert_eq!(json["stream"], false);
    }

    #[test]
    fn chat_request_serializes_lowercase_roles() {
        let req = ChatRequest::new(
            "m",
            vec![ChatMessage::system("s"), ChatMessage::user("u")],
        );
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["role"], "user");
    }

    #[test]
    fn parse_chat_response() {
        let json = r#"{
            "model": "qwen3",
            "created_at": "2025-05-01T10:00:00Z",
            "message": {"role": "assistant", "content": "app = FastAPI()"},
            "done": true
        }"#;
        let resp: ChatResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.message.role, Role::Assistant);
        assert_eq!(resp.content(), "app = FastAPI()");
    }

    #[test]
    fn transcript_prefers_text_over_segments() {
        let resp: TranscriptionResponse =
            serde_json::from_str(r#"{"text":" hello ","segments":[{"text":"ignored"}]}"#)
                .unwrap();
        assert_eq!(resp.transcript(), "hello");
    }
}
